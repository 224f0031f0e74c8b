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

//! This module provides the `LagrangianSolver`: the driver that runs a dual
//! ascent strategy over a routing round until it decides to stop.

use crate::{DualAscentStrategy, IterationObserver, Instance, LagMethod, LogObserver, Outcome, PrimalHeuristic,
    RoutedPath, Solver, SolverConfig, SolverContext, SubgradientSolver, VolumeSolver};

/// Solves the lagrangian dual of the pending demands of an instance.
///
/// # Example
/// ```
/// # use lagrsa::*;
/// let instance = Instance::new(3, vec![
///     PhysicalLink::new(0, 0, 1, 1.0, 2),
///     PhysicalLink::new(1, 1, 2, 1.0, 2),
/// ], vec![Demand::new(0, 0, 2, 1, 10.0)]).unwrap();
///
/// let mut solver = LagrangianSolver::new(&instance, SolverConfig::default());
/// let outcome = solver.solve();
/// assert_eq!(Status::Optimal, outcome.status);
/// assert!(outcome.is_routed());
/// ```
pub struct LagrangianSolver {
    context : SolverContext,
    strategy: Box<dyn DualAscentStrategy>,
}
impl LagrangianSolver {
    /// Creates a solver using the dual ascent method named in the config
    pub fn new(instance: &Instance, config: SolverConfig) -> Self {
        let strategy: Box<dyn DualAscentStrategy> = match config.method {
            LagMethod::Subgradient => Box::new(SubgradientSolver::new()),
            LagMethod::Volume      => Box::new(VolumeSolver::new(config.volume)),
        };
        LagrangianSolver { context: SolverContext::new(instance, config), strategy }
    }
    /// Uses the given primal heuristic to find upper bounds
    pub fn with_heuristic<H: PrimalHeuristic + 'static>(mut self, heuristic: H) -> Self {
        self.context.set_heuristic(Box::new(heuristic));
        self
    }
    /// Uses a custom dual ascent strategy
    pub fn with_strategy<S: DualAscentStrategy + 'static>(mut self, strategy: S) -> Self {
        self.strategy = Box::new(strategy);
        self
    }
    pub fn context(&self) -> &SolverContext {
        &self.context
    }

    /// Runs the dual ascent to completion, notifying the observer at the
    /// end of every iteration.
    pub fn solve_observed(&mut self, observer: &mut dyn IterationObserver) -> Outcome {
        log::info!("{} ascent over {} demands ({} relaxed constraints)",
            self.strategy.name(), self.context.graphs().len(), self.context.nb_constraints());
        self.strategy.initialize(&mut self.context);
        loop {
            self.strategy.iterate(&mut self.context);
            let stop = self.strategy.is_done(&self.context);
            observer.on_iteration(&self.context.record(stop));
            if let Some(reason) = stop {
                let outcome = self.context.outcome(reason);
                log::info!("{:?} after {} iterations ({reason}): lb {}, ub {}",
                    outcome.status, outcome.iterations, outcome.lower_bound, outcome.upper_bound);
                return outcome;
            }
        }
    }
}

impl Solver for LagrangianSolver {
    fn solve(&mut self) -> Outcome {
        self.solve_observed(&mut LogObserver)
    }
    fn best_lower_bound(&self) -> f64 {
        self.context.lower_bound()
    }
    fn best_upper_bound(&self) -> f64 {
        self.context.upper_bound()
    }
    fn best_routing(&self) -> Option<Vec<RoutedPath>> {
        self.context.best_routing()
    }
}


// ############################################################################
// #### TESTS #################################################################
// ############################################################################
