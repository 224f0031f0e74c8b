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

//! This module provides a greedy primal heuristic: the demands are routed one
//! after the other along a shortest path which avoids the slices taken by the
//! demands routed before them. Arcs that the primal estimate favors are made
//! cheaper, so that the heuristic tends to follow the lagrangian solution.

use fxhash::FxHashSet;

use crate::{dijkstra, ArcId, Direction, HeuristicSolution, HeuristicView, PrimalHeuristic, SliceLayout};

/// Weight added to every arc so that shorter paths win among free ones
const TIE_BREAK: f64 = 1e-6;

/// The greedy shortest path heuristic
#[derive(Debug, Clone)]
pub struct ShortestPathHeuristic {
    epsilon: f64,
}
impl Default for ShortestPathHeuristic {
    fn default() -> Self {
        Self::new(1e-6)
    }
}
impl ShortestPathHeuristic {
    pub fn new(epsilon: f64) -> Self {
        ShortestPathHeuristic { epsilon }
    }

    /// The order in which the demands get routed: largest loads first,
    /// ties broken on the position of the demand in the round.
    fn routing_order(view: &HeuristicView) -> Vec<usize> {
        let mut order: Vec<usize> = (0..view.graphs.len()).collect();
        order.sort_by(|a, b| view.graphs[*b].demand().load.cmp(&view.graphs[*a].demand().load).then(a.cmp(b)));
        order
    }
}

impl PrimalHeuristic for ShortestPathHeuristic {
    fn run(&mut self, view: &HeuristicView) -> Option<HeuristicSolution> {
        let slices   = SliceLayout::new(view.instance);
        let mut used = vec![false; slices.total()];
        let mut paths: Vec<Vec<ArcId>> = vec![vec![]; view.graphs.len()];
        let mut cost = 0.0;

        for d in Self::routing_order(view) {
            let graph  = &view.graphs[d];
            let demand = graph.demand();
            let load   = demand.load as isize;
            let coefficients = view.model.coefficients(d);
            let source = graph.source()?;
            let target = graph.target()?;

            let mut forbidden = FxHashSet::default();
            let mut found = None;
            for _ in 0..=graph.nb_arcs() {
                let weight = |a: ArcId| {
                    let arc = graph.arc(a);
                    let last = arc.slice as isize;
                    let taken = slices.window(arc.link, last - load + 1, last)
                        .any(|s| used[slices.position(arc.link, s)]);
                    if taken || forbidden.contains(&a) {
                        f64::INFINITY
                    } else {
                        let x = view.primal.get(d).and_then(|p| p.get(a.id())).copied().unwrap_or(0.0);
                        (1.0 + coefficients[a.id()].max(0.0)) * (1.0 - x).max(0.0) + TIE_BREAK
                    }
                };
                let tree = dijkstra(graph, source, Direction::Forward, weight, Some(target));
                let path = match tree.path_to(graph, target) {
                    Some(path) => path,
                    None => break,
                };
                let length: f64 = path.iter().map(|a| graph.arc(*a).length).sum();
                if length <= demand.max_length + self.epsilon {
                    found = Some(path);
                    break;
                }
                // too long: give up on its longest arc and try again
                let longest = path.iter().copied()
                    .max_by(|a, b| graph.arc(*a).length.total_cmp(&graph.arc(*b).length))?;
                forbidden.insert(longest);
            }

            let path = match found {
                Some(path) => path,
                None => {
                    log::debug!("shortest path heuristic: no room left for demand {}", demand.id);
                    return None;
                }
            };
            for a in path.iter().copied() {
                let arc  = graph.arc(a);
                let last = arc.slice as isize;
                for s in slices.window(arc.link, last - load + 1, last) {
                    used[slices.position(arc.link, s)] = true;
                }
                cost += coefficients[a.id()];
            }
            paths[d] = path;
        }

        if cost > view.upper_bound {
            return None;
        }
        Some(HeuristicSolution { cost, paths })
    }
}


// ############################################################################
// #### TESTS #################################################################
// ############################################################################

#[cfg(test)]
mod test_shortest_path_heuristic {
    use crate::*;

    struct Round {
        instance: Instance,
        graphs  : Vec<ExtendedGraph>,
        model   : LagrangianCostModel,
        primal  : Vec<Vec<f64>>,
    }
    fn round(instance: Instance) -> Round {
        let graphs = ExtendedGraphBuilder::new(&instance).build(&instance.pending_demands());
        let model  = LagrangianCostModel::new(&instance, &graphs, ObjectiveMetric::SliceOrder, 0.0);
        let primal = graphs.iter().map(|g| vec![0.0; g.nb_arcs()]).collect();
        Round { instance, graphs, model, primal }
    }
    fn view(r: &Round) -> HeuristicView<'_> {
        HeuristicView { instance: &r.instance, graphs: &r.graphs, model: &r.model, primal: &r.primal, upper_bound: f64::INFINITY }
    }

    #[test]
    fn competing_demands_get_disjoint_windows() {
        let r = round(Instance::new(2, vec![PhysicalLink::new(0, 0, 1, 1.0, 4)], vec![
            Demand::new(0, 0, 1, 1, 10.0),
            Demand::new(1, 0, 1, 2, 10.0),
            Demand::new(2, 0, 1, 1, 10.0),
        ]).unwrap());
        let solution = ShortestPathHeuristic::default().run(&view(&r)).unwrap();
        let checker = FeasibilityChecker::new(1e-6);
        let slacks = checker.slacks(r.model.layout(), &r.graphs, &solution.paths);
        assert!(checker.is_feasible(&slacks));
        // the largest demand goes first and takes [0, 1]
        assert_eq!(1, r.graphs[1].arc(solution.paths[1][0]).slice);
    }
    #[test]
    fn the_cost_sums_the_base_coefficients() {
        let r = round(Instance::new(2, vec![PhysicalLink::new(0, 0, 1, 1.0, 2)], vec![
            Demand::new(0, 0, 1, 1, 10.0),
            Demand::new(1, 0, 1, 1, 10.0),
        ]).unwrap());
        let solution = ShortestPathHeuristic::default().run(&view(&r)).unwrap();
        // slices 0 and 1 on a single link: 1 + 2
        assert_eq!(3.0, solution.cost);
    }
    #[test]
    fn no_solution_when_slices_run_out() {
        let r = round(Instance::new(2, vec![PhysicalLink::new(0, 0, 1, 1.0, 1)], vec![
            Demand::new(0, 0, 1, 1, 10.0),
            Demand::new(1, 0, 1, 1, 10.0),
        ]).unwrap());
        assert!(ShortestPathHeuristic::default().run(&view(&r)).is_none());
    }
    #[test]
    fn the_primal_estimate_steers_the_routing() {
        let mut r = round(Instance::new(2, vec![PhysicalLink::new(0, 0, 1, 1.0, 3)], vec![
            Demand::new(0, 0, 1, 1, 10.0),
        ]).unwrap());
        let on_slice_2 = r.graphs[0].arcs().find(|a| r.graphs[0].arc(*a).slice == 2).unwrap();
        r.primal[0][on_slice_2.id()] = 1.0;
        let solution = ShortestPathHeuristic::default().run(&view(&r)).unwrap();
        assert_eq!(vec![on_slice_2], solution.paths[0]);
    }
    #[test]
    fn too_long_paths_are_avoided() {
        // 0 -> 2 directly (length 5) or through 1 (length 2)
        let r = round(Instance::new(3, vec![
            PhysicalLink::new(0, 0, 2, 5.0, 1),
            PhysicalLink::new(1, 0, 1, 1.0, 1),
            PhysicalLink::new(2, 1, 2, 1.0, 1),
        ], vec![Demand::new(0, 0, 2, 1, 3.0)]).unwrap());
        let solution = ShortestPathHeuristic::default().run(&view(&r)).unwrap();
        assert_eq!(2, solution.paths[0].len());
    }
}
