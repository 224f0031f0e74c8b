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

use lagrsa::*;

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A ring of 5 nodes with 6 slices per link and a couple of chords
fn network(demands: Vec<Demand>) -> Instance {
    Instance::new(5, vec![
        PhysicalLink::new(0, 0, 1, 100.0, 6),
        PhysicalLink::new(1, 1, 2, 120.0, 6),
        PhysicalLink::new(2, 2, 3, 80.0,  6),
        PhysicalLink::new(3, 3, 4, 150.0, 6).with_occupied(&[0, 1]),
        PhysicalLink::new(4, 4, 0, 90.0,  6),
        PhysicalLink::new(5, 0, 2, 210.0, 6),
        PhysicalLink::new(6, 1, 3, 190.0, 6).with_occupied(&[5]),
    ], demands).unwrap()
}

fn demands() -> Vec<Demand> {
    vec![
        Demand::new(0, 0, 3, 2, 400.0),
        Demand::new(1, 1, 4, 1, 400.0),
        Demand::new(2, 2, 0, 2, 300.0),
        Demand::new(3, 4, 2, 1, 400.0),
        Demand::new(4, 3, 1, 3, 400.0),
    ]
}

fn config(method: LagMethod, nb_threads: usize) -> SolverConfig {
    SolverConfigBuilder::default()
        .method(method)
        .max_iterations(150)
        .heuristic_interval(10)
        .nb_threads(nb_threads)
        .build()
        .unwrap()
}

fn run(method: LagMethod, nb_threads: usize) -> (Outcome, Vec<IterationRecord>) {
    let instance = network(demands());
    let mut observer = RecordingObserver::new();
    let mut solver = LagrangianSolver::new(&instance, config(method, nb_threads))
        .with_heuristic(ShortestPathHeuristic::default());
    let outcome = solver.solve_observed(&mut observer);
    (outcome, observer.records)
}

fn assert_monotone_bounds(records: &[IterationRecord]) {
    for pair in records.windows(2) {
        assert!(pair[1].lb >= pair[0].lb, "lb decreased at iteration {}", pair[1].iteration);
        assert!(pair[1].ub <= pair[0].ub, "ub increased at iteration {}", pair[1].iteration);
    }
}

fn assert_valid_routing(instance: &Instance, outcome: &Outcome) {
    assert!(outcome.is_routed());
    let next = instance.apply(outcome);
    assert!(next.pending_demands().is_empty());

    let mut taken = std::collections::HashSet::new();
    for routing in outcome.routing.iter() {
        let path   = routing.path().unwrap();
        let demand = &instance.demands()[path.demand];
        assert!(path.length <= demand.max_length + 1e-6);
        assert_eq!(demand.load, path.last_slice + 1 - path.first_slice);

        let mut node = demand.source;
        for hop in path.hops.iter() {
            let link = instance.link(hop.link);
            node = if link.source == node { link.target } else { assert_eq!(link.target, node); link.source };
            assert_eq!(path.last_slice, hop.slice);
            for s in path.first_slice..=path.last_slice {
                assert!(instance.link(hop.link).is_free(s));
                assert!(taken.insert((hop.link, s)), "slice {s} of link {} is used twice", hop.link);
            }
        }
        assert_eq!(demand.target, node);
    }
}

#[test]
fn subgradient_bounds_are_monotone_and_consistent() {
    init_logs();
    let (outcome, records) = run(LagMethod::Subgradient, 1);
    assert_monotone_bounds(&records);
    assert!(outcome.lower_bound <= outcome.upper_bound + 1e-6);
    assert_eq!(outcome.iterations, records.len());
    assert_eq!(Some(outcome.stop_reason), records.last().unwrap().stop_reason);
    assert!(records[..records.len() - 1].iter().all(|r| r.stop_reason.is_none()));
}

#[test]
fn volume_bounds_are_monotone_and_consistent() {
    init_logs();
    let (outcome, records) = run(LagMethod::Volume, 1);
    assert_monotone_bounds(&records);
    assert!(outcome.lower_bound <= outcome.upper_bound + 1e-6);
    assert!(outcome.iterations <= 150);
}

#[test]
fn routings_found_by_both_methods_are_valid() {
    init_logs();
    let instance = network(demands());
    for method in [LagMethod::Subgradient, LagMethod::Volume] {
        let (outcome, _) = run(method, 1);
        assert_ne!(Status::Infeasible, outcome.status);
        assert_ne!(Status::Unknown, outcome.status);
        assert_valid_routing(&instance, &outcome);
    }
}

#[test]
fn parallel_and_sequential_runs_give_the_same_outcome() {
    init_logs();
    for method in [LagMethod::Subgradient, LagMethod::Volume] {
        let (sequential, seq_records) = run(method, 1);
        let (parallel, par_records)   = run(method, 4);
        assert_eq!(sequential, parallel);
        assert_eq!(seq_records, par_records);
    }
}

#[test]
fn infeasible_rounds_never_yield_a_routing() {
    init_logs();
    // three demands of load 3 through a link that has 6 slices
    let instance = Instance::new(2, vec![PhysicalLink::new(0, 0, 1, 1.0, 6)], vec![
        Demand::new(0, 0, 1, 3, 10.0),
        Demand::new(1, 0, 1, 3, 10.0),
        Demand::new(2, 0, 1, 3, 10.0),
    ]).unwrap();
    for method in [LagMethod::Subgradient, LagMethod::Volume] {
        let config = SolverConfigBuilder::default().method(method).max_iterations(2000).build().unwrap();
        let outcome = LagrangianSolver::new(&instance, config).solve();
        assert_ne!(Status::Optimal, outcome.status);
        assert_ne!(Status::Feasible, outcome.status);
        assert!(!outcome.is_routed());
    }
}

#[test]
fn enabling_the_alternative_stop_never_lengthens_the_run() {
    init_logs();
    let instance = network(demands());
    let base = SolverConfigBuilder::default()
        .max_iterations(300)
        .iterations_without_improvement_threshold(2)
        .build()
        .unwrap();
    let mut with_alt = base.clone();
    with_alt.alternative_stop_enabled = true;
    with_alt.alternative_stop_factor  = 1;

    let without = LagrangianSolver::new(&instance, base).solve();
    let with    = LagrangianSolver::new(&instance, with_alt).solve();
    assert!(with.iterations <= without.iterations);
    assert!(with.lower_bound <= without.lower_bound + 1e-6);
}
