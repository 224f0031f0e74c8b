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

//! This module provides the oracle that solves the lagrangian subproblems:
//! one shortest path per demand in its own extended graph. The subproblems
//! are independent which is why they can be solved by many threads at once.

use parking_lot::Mutex;

use crate::{dijkstra, ArcId, Direction, ExtendedGraph, LagrangianCostModel};

/// The optimal solution of the subproblem of one demand
#[derive(Debug, Clone, PartialEq)]
pub struct SubproblemSolution {
    /// The arcs of the path, from the source to the target
    pub arcs: Vec<ArcId>,
    /// The cost of the path w.r.t. the lagrangian costs
    pub lagrangian_cost: f64,
    /// The cost of the path w.r.t. the base coefficients only
    pub real_cost: f64,
    /// The physical length of the path
    pub length: f64,
}

/// Tells that the target of some demand cannot be reached from its source
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Unreachable {
    /// The position of the demand in the round
    pub demand: usize,
}

/// Solves the shortest path subproblems of all the demands of a round.
///
/// # Note
/// No matter how many threads are used, the solutions are returned in the
/// order of the demands. Hence, every accumulation performed by the caller
/// happens in the same order as with a single thread.
#[derive(Debug, Copy, Clone)]
pub struct ShortestPathOracle {
    nb_threads: usize,
}
impl Default for ShortestPathOracle {
    fn default() -> Self {
        Self::new(1)
    }
}
impl ShortestPathOracle {
    /// Creates an oracle using the given number of threads (zero means one
    /// thread per hardware thread)
    pub fn new(nb_threads: usize) -> Self {
        let nb_threads = if nb_threads == 0 { num_cpus::get() } else { nb_threads };
        ShortestPathOracle { nb_threads }
    }
    pub fn nb_threads(&self) -> usize {
        self.nb_threads
    }

    /// Solves the subproblem of one demand. Returns None when the target
    /// cannot be reached.
    pub fn solve_one(graph: &ExtendedGraph, costs: &[f64], coefficients: &[f64]) -> Option<SubproblemSolution> {
        let source = graph.source()?;
        let target = graph.target()?;
        let tree   = dijkstra(graph, source, Direction::Forward, |a| costs[a.id()], Some(target));
        let arcs   = tree.path_to(graph, target)?;

        let mut solution = SubproblemSolution { arcs: vec![], lagrangian_cost: 0.0, real_cost: 0.0, length: 0.0 };
        for a in arcs.iter().copied() {
            solution.lagrangian_cost += costs[a.id()];
            solution.real_cost       += coefficients[a.id()];
            solution.length          += graph.arc(a).length;
        }
        solution.arcs = arcs;
        Some(solution)
    }

    /// Solves the subproblems of all demands with the current costs of the
    /// model. Fails with the first (lowest) unreachable demand.
    pub fn solve(&self, graphs: &[ExtendedGraph], model: &LagrangianCostModel) -> Result<Vec<SubproblemSolution>, Unreachable> {
        let n = graphs.len();
        let solutions = if self.nb_threads <= 1 || n <= 1 {
            (0..n).map(|d| Self::solve_one(&graphs[d], model.costs(d), model.coefficients(d))).collect::<Vec<_>>()
        } else {
            let next    = Mutex::new(0_usize);
            let results = Mutex::new(vec![None; n]);
            std::thread::scope(|s| {
                for _ in 0..self.nb_threads.min(n) {
                    s.spawn(|| loop {
                        let d = {
                            let mut next = next.lock();
                            if *next >= n {
                                break;
                            }
                            *next += 1;
                            *next - 1
                        };
                        let solution = Self::solve_one(&graphs[d], model.costs(d), model.coefficients(d));
                        results.lock()[d] = solution;
                    });
                }
            });
            results.into_inner()
        };

        let mut out = Vec::with_capacity(n);
        for (demand, solution) in solutions.into_iter().enumerate() {
            match solution {
                Some(s) => out.push(s),
                None    => return Err(Unreachable { demand }),
            }
        }
        Ok(out)
    }
}


// ############################################################################
// #### TESTS #################################################################
// ############################################################################

#[cfg(test)]
mod test_oracle {
    use crate::*;

    /// A ring of 4 nodes where all links have a length 1 and 4 slices
    fn ring(demands: Vec<Demand>) -> Instance {
        Instance::new(4, vec![
            PhysicalLink::new(0, 0, 1, 1.0, 4),
            PhysicalLink::new(1, 1, 2, 1.0, 4),
            PhysicalLink::new(2, 2, 3, 1.0, 4),
            PhysicalLink::new(3, 3, 0, 1.0, 4),
        ], demands).unwrap()
    }

    fn setup(instance: &Instance, metric: ObjectiveMetric) -> (Vec<ExtendedGraph>, LagrangianCostModel) {
        let graphs = ExtendedGraphBuilder::new(instance).build(&instance.pending_demands());
        let model  = LagrangianCostModel::new(instance, &graphs, metric, 0.0);
        (graphs, model)
    }

    #[test]
    fn paths_go_from_source_to_target() {
        let instance = ring(vec![Demand::new(0, 0, 2, 1, 10.0)]);
        let (graphs, model) = setup(&instance, ObjectiveMetric::HopCount);
        let sol = ShortestPathOracle::default().solve(&graphs, &model).unwrap();
        let g = &graphs[0];
        let path = &sol[0].arcs;
        assert_eq!(2, path.len());
        assert_eq!(g.source(), Some(g.arc(path[0]).tail));
        assert_eq!(g.target(), Some(g.arc(path[1]).head));
        assert_eq!(g.arc(path[0]).head, g.arc(path[1]).tail);
        assert_eq!(2.0, sol[0].real_cost);
        assert_eq!(2.0, sol[0].length);
    }
    #[test]
    fn the_path_stays_on_a_single_slice() {
        let instance = ring(vec![Demand::new(0, 0, 2, 2, 10.0)]);
        let (graphs, model) = setup(&instance, ObjectiveMetric::SliceOrder);
        let sol = ShortestPathOracle::default().solve(&graphs, &model).unwrap();
        let g = &graphs[0];
        let slices: Vec<usize> = sol[0].arcs.iter().map(|a| g.arc(*a).slice).collect();
        // the cheapest window is the lowest one: [0, 1]
        assert_eq!(vec![1, 1], slices);
    }
    #[test]
    fn lagrangian_cost_sums_the_current_costs() {
        let instance = ring(vec![Demand::new(0, 0, 1, 1, 10.0)]);
        let (graphs, mut model) = setup(&instance, ObjectiveMetric::HopCount);
        let mut m = model.multipliers().clone();
        m.length[0] = 0.25;
        model.set_multipliers(m);
        model.update_costs(&graphs);
        let sol = ShortestPathOracle::default().solve(&graphs, &model).unwrap();
        assert!((sol[0].lagrangian_cost - 1.25).abs() < 1e-12);
        assert_eq!(1.0, sol[0].real_cost);
    }
    #[test]
    fn unreachable_demands_are_reported() {
        let instance = Instance::new(4, vec![
            PhysicalLink::new(0, 0, 1, 1.0, 1),
            PhysicalLink::new(1, 2, 3, 1.0, 1),
        ], vec![Demand::new(0, 0, 1, 1, 10.0), Demand::new(1, 0, 3, 1, 10.0)]).unwrap();
        let (graphs, model) = setup(&instance, ObjectiveMetric::HopCount);
        let res = ShortestPathOracle::default().solve(&graphs, &model);
        assert_eq!(Err(Unreachable { demand: 1 }), res);
    }
    #[test]
    fn parallel_and_sequential_oracles_agree() {
        let demands = (0..12).map(|i| Demand::new(i, i % 4, (i + 1 + i / 4) % 4, 1 + i % 3, 10.0)).collect();
        let instance = ring(demands);
        let (graphs, model) = setup(&instance, ObjectiveMetric::SliceOrder);
        let seq = ShortestPathOracle::new(1).solve(&graphs, &model).unwrap();
        let par = ShortestPathOracle::new(4).solve(&graphs, &model).unwrap();
        assert_eq!(seq, par);
    }
    #[test]
    fn zero_threads_means_all_hardware_threads() {
        assert_eq!(num_cpus::get(), ShortestPathOracle::new(0).nb_threads());
    }
}
