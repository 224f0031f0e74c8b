// Copyright 2020 Xavier Gillard
//
// Permission is hereby granted, free of charge, to any person obtaining a copy of
// this software and associated documentation files (the "Software"), to deal in
// the Software without restriction, including without limitation the rights to
// use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies of
// the Software, and to permit persons to whom the Software is furnished to do so,
// subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS
// FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR
// COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER
// IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN
// CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! This module provides the feasibility checker: given the path chosen for
//! every demand, it computes the slack of every relaxed constraint and tells
//! whether that routing is feasible for the original problem.

use crate::{ArcId, ConstraintLayout, ConstraintVector, ExtendedGraph};

/// The routing produced by the lagrangian subproblems of one iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    paths   : Vec<Vec<ArcId>>,
    assigned: Vec<Vec<bool>>,
}
impl Assignment {
    /// Creates the assignment from the path of every demand
    pub fn new(graphs: &[ExtendedGraph], paths: Vec<Vec<ArcId>>) -> Self {
        let assigned = graphs.iter().zip(paths.iter())
            .map(|(g, p)| {
                let mut used = vec![false; g.nb_arcs()];
                p.iter().for_each(|a| used[a.id()] = true);
                used
            })
            .collect();
        Assignment { paths, assigned }
    }
    /// The ordered arcs of the path of the d-th demand
    pub fn path(&self, d: usize) -> &[ArcId] {
        &self.paths[d]
    }
    pub fn paths(&self) -> &[Vec<ArcId>] {
        &self.paths
    }
    /// Is the given arc used by the d-th demand ?
    pub fn is_assigned(&self, d: usize, arc: ArcId) -> bool {
        self.assigned[d][arc.id()]
    }
    /// The 0/1 value of every arc variable of the d-th demand
    pub fn values(&self, d: usize) -> Vec<f64> {
        self.assigned[d].iter().map(|x| if *x { 1.0 } else { 0.0 }).collect()
    }
}

/// Checks the relaxed constraints against a routing.
#[derive(Debug, Copy, Clone)]
pub struct FeasibilityChecker {
    epsilon: f64,
}
impl FeasibilityChecker {
    pub fn new(epsilon: f64) -> Self {
        FeasibilityChecker { epsilon }
    }

    /// Computes `rhs - lhs` for every relaxed constraint.
    pub fn slacks(&self, layout: &ConstraintLayout, graphs: &[ExtendedGraph], paths: &[Vec<ArcId>]) -> ConstraintVector {
        let total   = layout.slices().total();
        let classes = layout.nb_classes();
        let mut slacks = ConstraintVector::zeros(layout);

        // ends[c][pos] = number of demands of class c whose window ends at pos
        let mut ends = vec![0.0; classes * total];
        for (d, (graph, path)) in graphs.iter().zip(paths.iter()).enumerate() {
            let class = layout.class_of_demand(d);
            let mut length = 0.0;
            for a in path.iter().copied() {
                let arc = graph.arc(a);
                ends[class * total + layout.slices().position(arc.link, arc.slice)] += 1.0;
                length += arc.length;
            }
            slacks.length[d] = graph.demand().max_length - length;
        }

        // geq[w][pos] = number of demands with a load >= load(w) ending at pos
        let mut geq = ends.clone();
        for w in (0..classes.saturating_sub(1)).rev() {
            for pos in 0..total {
                geq[w * total + pos] += geq[(w + 1) * total + pos];
            }
        }

        // first family
        for d in 0..layout.nb_demands() {
            for w in 0..classes {
                let from = (d * classes + w) * total;
                for (slack, count) in slacks.overlap1[from..from + total].iter_mut().zip(geq[w * total..(w + 1) * total].iter()) {
                    *slack = 1.0 - count;
                }
            }
        }
        for (d, (graph, path)) in graphs.iter().zip(paths.iter()).enumerate() {
            let class = layout.class_of_demand(d);
            let load  = graph.demand().load as isize;
            for a in path.iter().copied() {
                let arc  = graph.arc(a);
                let last = arc.slice as isize;
                // the demand is not one of its own 'others'
                for w in 0..=class {
                    slacks.overlap1[layout.overlap1_index(d, w, arc.link, arc.slice)] += 1.0;
                }
                for w in 0..classes {
                    let width = layout.classes().load(w) as isize;
                    for s in layout.slices().window(arc.link, last - load + 1, last + width - 1) {
                        slacks.overlap1[layout.overlap1_index(d, w, arc.link, s)] -= 1.0;
                    }
                }
            }
        }

        // second family
        for p in 0..layout.nb_pairs() {
            let (w1, w2) = layout.pair(p);
            let members = if w1 == w2 { vec![w1] } else { vec![w1, w2] };
            for link in 0..layout.slices().nb_links() {
                for s in 0..layout.slices().nb_slices(link) {
                    let mut occupancy = 0.0;
                    for c in members.iter().copied() {
                        let width = layout.classes().load(c) as isize;
                        for last in layout.slices().window(link, s as isize, s as isize + width - 1) {
                            occupancy += ends[c * total + layout.slices().position(link, last)];
                        }
                    }
                    slacks.overlap2[layout.overlap2_index(p, link, s)] = 1.0 - occupancy;
                }
            }
        }

        slacks
    }

    /// A routing is feasible iff no relaxed constraint is violated. Each
    /// family is checked against its own slacks.
    pub fn is_feasible(&self, slacks: &ConstraintVector) -> bool {
        let ok = |s: &f64| *s >= -self.epsilon;
        slacks.length.iter().all(ok)
            && slacks.overlap1.iter().all(ok)
            && slacks.overlap2.iter().all(ok)
    }
}


// ############################################################################
// #### TESTS #################################################################
// ############################################################################

#[cfg(test)]
mod test_feasibility {
    use crate::*;

    struct Setup {
        graphs: Vec<ExtendedGraph>,
        layout: ConstraintLayout,
    }
    /// Demands 0 -> 1 on a single link of length 2 with `slices` slices
    fn setup(slices: usize, loads: &[usize]) -> Setup {
        let demands = loads.iter().enumerate().map(|(i, l)| Demand::new(i, 0, 1, *l, 10.0)).collect();
        let instance = Instance::new(2, vec![PhysicalLink::new(0, 0, 1, 2.0, slices)], demands).unwrap();
        let graphs = ExtendedGraphBuilder::new(&instance).build(&instance.pending_demands());
        let layout = ConstraintLayout::new(&instance, instance.demands());
        Setup { graphs, layout }
    }
    fn at(graph: &ExtendedGraph, slice: usize) -> Vec<ArcId> {
        vec![graph.arcs().find(|a| graph.arc(*a).slice == slice).unwrap()]
    }

    #[test]
    fn disjoint_windows_are_feasible() {
        let s = setup(4, &[1, 2]);
        let paths = vec![at(&s.graphs[0], 0), at(&s.graphs[1], 2)];
        let checker = FeasibilityChecker::new(1e-6);
        let slacks = checker.slacks(&s.layout, &s.graphs, &paths);
        assert!(checker.is_feasible(&slacks));
        assert_eq!(vec![8.0, 8.0], slacks.length);
    }
    #[test]
    fn identical_windows_violate_the_first_family() {
        let s = setup(1, &[1, 1]);
        let paths = vec![at(&s.graphs[0], 0), at(&s.graphs[1], 0)];
        let checker = FeasibilityChecker::new(1e-6);
        let slacks = checker.slacks(&s.layout, &s.graphs, &paths);
        assert!(!checker.is_feasible(&slacks));
        assert_eq!(-1.0, slacks.overlap1[s.layout.overlap1_index(0, 0, 0, 0)]);
        assert_eq!(-1.0, slacks.overlap1[s.layout.overlap1_index(1, 0, 0, 0)]);
        assert_eq!(-1.0, slacks.overlap2[s.layout.overlap2_index(0, 0, 0)]);
    }
    #[test]
    fn partially_overlapping_windows_are_detected() {
        // windows [0, 1] and [1, 2]
        let s = setup(3, &[2, 2]);
        let paths = vec![at(&s.graphs[0], 1), at(&s.graphs[1], 2)];
        let checker = FeasibilityChecker::new(1e-6);
        let slacks = checker.slacks(&s.layout, &s.graphs, &paths);
        assert!(!checker.is_feasible(&slacks));
        // slice 1 is covered twice
        assert_eq!(-1.0, slacks.overlap2[s.layout.overlap2_index(0, 0, 1)]);
    }
    #[test]
    fn overlaps_between_different_loads_are_detected() {
        // windows [0, 2] and [2, 2]
        let s = setup(3, &[3, 1]);
        let paths = vec![at(&s.graphs[0], 2), at(&s.graphs[1], 2)];
        let checker = FeasibilityChecker::new(1e-6);
        let slacks = checker.slacks(&s.layout, &s.graphs, &paths);
        assert!(slacks.overlap1.iter().any(|x| *x < 0.0));
        assert!(!checker.is_feasible(&slacks));
    }
    #[test]
    fn adjacent_windows_of_different_loads_are_feasible() {
        // windows [0, 0] and [1, 3]
        let s = setup(4, &[1, 3]);
        let paths = vec![at(&s.graphs[0], 0), at(&s.graphs[1], 3)];
        let checker = FeasibilityChecker::new(1e-6);
        let slacks = checker.slacks(&s.layout, &s.graphs, &paths);
        assert!(checker.is_feasible(&slacks));
    }
    #[test]
    fn too_long_paths_violate_the_length_constraint() {
        let instance = Instance::new(2, vec![PhysicalLink::new(0, 0, 1, 2.0, 1)], vec![Demand::new(0, 0, 1, 1, 1.0)]).unwrap();
        // without preprocessing, the too long arc survives
        let graphs = ExtendedGraphBuilder::new(&instance)
            .with_preprocessing(PreprocessingLevel::None)
            .build(&instance.pending_demands());
        let layout = ConstraintLayout::new(&instance, instance.demands());
        let checker = FeasibilityChecker::new(1e-6);
        let slacks = checker.slacks(&layout, &graphs, &[at(&graphs[0], 0)]);
        assert_eq!(-1.0, slacks.length[0]);
        assert!(!checker.is_feasible(&slacks));
    }
    #[test]
    fn assignment_flags_the_arcs_of_the_paths() {
        let s = setup(2, &[1]);
        let path = at(&s.graphs[0], 1);
        let assignment = Assignment::new(&s.graphs, vec![path.clone()]);
        assert!(assignment.is_assigned(0, path[0]));
        assert_eq!(1.0, assignment.values(0).iter().sum::<f64>());
    }
}
