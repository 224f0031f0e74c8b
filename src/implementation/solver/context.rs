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

//! This module provides the `SolverContext`: the state of a round which is
//! shared by all dual ascent strategies. It owns the extended graphs, the
//! cost model and the oracle, and it keeps track of the bounds, of the
//! counters and of the best routing found so far.

use crate::{ArcId, Assignment, ConstraintVector, DemandRouting, ExtendedGraph, ExtendedGraphBuilder,
    FeasibilityChecker, HeuristicView, Hop, Instance, IterationRecord, LagrangianCostModel, Outcome,
    PrimalHeuristic, RoutedPath, ShortestPathOracle, SolverConfig, Status, StopReason};

/// What the lagrangian subproblems yielded during the current iteration
#[derive(Debug, Clone)]
pub struct IterationState {
    /// The path of every demand
    pub assignment: Assignment,
    /// The value of the lagrangian function at the current multipliers
    pub dual: f64,
    /// The cost of the assignment w.r.t. the base coefficients
    pub real_cost: f64,
    /// The slack of every relaxed constraint
    pub slacks: ConstraintVector,
    /// Is the assignment a feasible routing ?
    pub feasible: bool,
}

/// The state shared by the dual ascent strategies
pub struct SolverContext {
    config    : SolverConfig,
    instance  : Instance,
    graphs    : Vec<ExtendedGraph>,
    model     : LagrangianCostModel,
    oracle    : ShortestPathOracle,
    checker   : FeasibilityChecker,
    heuristic : Option<Box<dyn PrimalHeuristic>>,

    iteration : usize,
    lb        : f64,
    ub        : f64,
    initial_ub: f64,
    lambda    : f64,
    step_size : f64,
    /// Non improving iterations since the last lambda update
    it_without_improvement: usize,
    /// Non improving iterations since the last lb improvement
    global_it_without_improvement: usize,
    /// The position of a demand whose subproblem has no solution
    unreachable: Option<usize>,
    current   : Option<IterationState>,
    /// The primal estimate: value of every arc variable of every demand
    primal    : Vec<Vec<f64>>,
    best      : Option<Vec<Vec<ArcId>>>,
}
impl SolverContext {
    /// Builds the extended graphs and the cost model of the pending demands
    /// of the given instance.
    pub fn new(instance: &Instance, config: SolverConfig) -> Self {
        let graphs = ExtendedGraphBuilder::new(instance)
            .with_preprocessing(config.preprocessing)
            .with_epsilon(config.epsilon)
            .build(&instance.pending_demands());
        let model  = LagrangianCostModel::new(instance, &graphs, config.objective, config.initial_multiplier);
        let primal = graphs.iter().map(|g| vec![0.0; g.nb_arcs()]).collect();
        let initial_ub = model.initial_upper_bound();

        SolverContext {
            oracle    : ShortestPathOracle::new(config.nb_threads),
            checker   : FeasibilityChecker::new(config.epsilon),
            lambda    : config.initial_lambda,
            heuristic : None,
            instance  : instance.clone(),
            iteration : 0,
            lb        : f64::NEG_INFINITY,
            ub        : initial_ub,
            step_size : 0.0,
            it_without_improvement       : 0,
            global_it_without_improvement: 0,
            unreachable: None,
            current   : None,
            best      : None,
            config, graphs, model, primal, initial_ub,
        }
    }
    /// Installs the primal heuristic used to improve the upper bound
    pub fn set_heuristic(&mut self, heuristic: Box<dyn PrimalHeuristic>) {
        self.heuristic = Some(heuristic);
    }

    /// Puts the context back in its initial state (multipliers included)
    pub fn reset(&mut self) {
        self.iteration   = 0;
        self.lb          = f64::NEG_INFINITY;
        self.ub          = self.initial_ub;
        self.lambda      = self.config.initial_lambda;
        self.step_size   = 0.0;
        self.it_without_improvement        = 0;
        self.global_it_without_improvement = 0;
        self.unreachable = None;
        self.current     = None;
        self.best        = None;
        self.primal.iter_mut().for_each(|p| p.iter_mut().for_each(|x| *x = 0.0));
        let initial = ConstraintVector::filled(self.model.layout(), self.config.initial_multiplier);
        self.model.set_multipliers(initial);
        self.model.update_costs(&self.graphs);
    }

    // ------------------------------------------------------------------------
    // --- ACCESSORS ----------------------------------------------------------
    // ------------------------------------------------------------------------
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }
    pub fn graphs(&self) -> &[ExtendedGraph] {
        &self.graphs
    }
    pub fn model(&self) -> &LagrangianCostModel {
        &self.model
    }
    pub fn multipliers(&self) -> &ConstraintVector {
        self.model.multipliers()
    }
    pub fn iteration(&self) -> usize {
        self.iteration
    }
    pub fn lower_bound(&self) -> f64 {
        self.lb
    }
    pub fn upper_bound(&self) -> f64 {
        self.ub
    }
    pub fn initial_upper_bound(&self) -> f64 {
        self.initial_ub
    }
    pub fn lambda(&self) -> f64 {
        self.lambda
    }
    pub fn set_lambda(&mut self, lambda: f64) {
        self.lambda = lambda;
    }
    pub fn step_size(&self) -> f64 {
        self.step_size
    }
    pub fn set_step_size(&mut self, step: f64) {
        self.step_size = step;
    }
    pub fn it_without_improvement(&self) -> usize {
        self.it_without_improvement
    }
    pub fn reset_it_without_improvement(&mut self) {
        self.it_without_improvement = 0;
    }
    pub fn global_it_without_improvement(&self) -> usize {
        self.global_it_without_improvement
    }
    /// Returns true iff some demand was found unreachable
    pub fn is_infeasible(&self) -> bool {
        self.unreachable.is_some()
    }
    /// The outcome of the subproblems of the current iteration
    pub fn current(&self) -> Option<&IterationState> {
        self.current.as_ref()
    }
    /// The current primal estimate
    pub fn primal(&self) -> &[Vec<f64>] {
        &self.primal
    }
    /// The number of relaxed constraints
    pub fn nb_constraints(&self) -> usize {
        self.model.layout().nb_constraints()
    }

    // ------------------------------------------------------------------------
    // --- ITERATION STEPS ----------------------------------------------------
    // ------------------------------------------------------------------------
    /// Starts a new iteration and solves the subproblems of all demands with
    /// the current costs. Returns false when some demand is unreachable (in
    /// which case the round is infeasible).
    pub fn solve_subproblems(&mut self) -> bool {
        self.iteration += 1;
        let solutions = match self.oracle.solve(&self.graphs, &self.model) {
            Ok(solutions) => solutions,
            Err(unreachable) => {
                log::warn!("demand {} cannot be routed: the round is infeasible",
                    self.graphs[unreachable.demand].demand().id);
                self.unreachable = Some(unreachable.demand);
                self.current     = None;
                return false;
            }
        };

        let mut dual      = 0.0;
        let mut real_cost = 0.0;
        let mut paths     = Vec::with_capacity(solutions.len());
        for solution in solutions {
            dual      += solution.lagrangian_cost;
            real_cost += solution.real_cost;
            paths.push(solution.arcs);
        }
        dual -= self.model.dual_correction();

        let slacks     = self.checker.slacks(self.model.layout(), &self.graphs, &paths);
        let feasible   = self.checker.is_feasible(&slacks);
        let assignment = Assignment::new(&self.graphs, paths);
        self.current   = Some(IterationState { assignment, dual, real_cost, slacks, feasible });
        true
    }

    /// Uses the given dual value as a lower bound. Returns true iff it
    /// improves the best known lower bound, in which case both no
    /// improvement counters are reset. Otherwise they are incremented.
    pub fn update_lower_bound(&mut self, dual: f64) -> bool {
        if dual > self.lb + self.config.epsilon || !self.lb.is_finite() {
            self.lb = dual;
            self.it_without_improvement        = 0;
            self.global_it_without_improvement = 0;
            true
        } else {
            self.it_without_improvement        += 1;
            self.global_it_without_improvement += 1;
            false
        }
    }

    /// Uses the current assignment as an upper bound if it is feasible and
    /// cheaper than the best known routing.
    pub fn update_upper_bound(&mut self) {
        let candidate = match self.current.as_ref() {
            Some(state) if state.feasible => (state.real_cost, state.assignment.paths().to_vec()),
            _ => return,
        };
        self.improve_upper_bound(candidate.0, candidate.1);
    }

    fn improve_upper_bound(&mut self, cost: f64, paths: Vec<Vec<ArcId>>) -> bool {
        if cost < self.ub - self.config.epsilon || (self.best.is_none() && cost <= self.ub) {
            log::info!("iteration {}: new upper bound {cost}", self.iteration);
            self.ub   = cost;
            self.best = Some(paths);
            true
        } else {
            false
        }
    }

    /// Is the primal heuristic due at the current iteration ?
    pub fn heuristic_due(&self) -> bool {
        self.iteration == 1 || self.iteration % self.config.heuristic_interval.max(1) == 0
    }

    /// Runs the primal heuristic (if any). The routing it returns is only
    /// used as an upper bound after its feasibility has been checked.
    pub fn run_heuristic(&mut self) -> bool {
        let found = match self.heuristic.as_mut() {
            None => None,
            Some(heuristic) => {
                let view = HeuristicView {
                    instance   : &self.instance,
                    graphs     : &self.graphs,
                    model      : &self.model,
                    primal     : &self.primal,
                    upper_bound: self.ub,
                };
                heuristic.run(&view)
            }
        };
        match found {
            Some(solution) if solution.paths.len() == self.graphs.len() => {
                let slacks = self.checker.slacks(self.model.layout(), &self.graphs, &solution.paths);
                if self.checker.is_feasible(&slacks) {
                    let cost: f64 = solution.paths.iter().enumerate()
                        .map(|(d, p)| p.iter().map(|a| self.model.coefficients(d)[a.id()]).sum::<f64>())
                        .sum();
                    self.improve_upper_bound(cost, solution.paths)
                } else {
                    log::debug!("iteration {}: the heuristic routing is infeasible", self.iteration);
                    false
                }
            },
            _ => false,
        }
    }

    /// The primal estimate becomes the current 0/1 assignment
    pub fn set_primal_from_current(&mut self) {
        if let Some(state) = self.current.as_ref() {
            for (d, p) in self.primal.iter_mut().enumerate() {
                *p = state.assignment.values(d);
            }
        }
    }
    /// primal <- alpha * current + (1 - alpha) * primal
    pub fn blend_primal(&mut self, alpha: f64) {
        if let Some(state) = self.current.as_ref() {
            for (d, p) in self.primal.iter_mut().enumerate() {
                for (x, a) in p.iter_mut().enumerate() {
                    let v = if state.assignment.is_assigned(d, ArcId(x)) { 1.0 } else { 0.0 };
                    *a = alpha * v + (1.0 - alpha) * *a;
                }
            }
        }
    }
    /// The cost of the primal estimate w.r.t. the base coefficients
    pub fn primal_cost(&self) -> f64 {
        self.primal.iter().enumerate()
            .map(|(d, p)| p.iter().zip(self.model.coefficients(d).iter()).map(|(x, c)| x * c).sum::<f64>())
            .sum()
    }

    /// Computes the ascent direction `-slack`, projected so that it never
    /// pushes a null multiplier of `at` below zero.
    pub fn projected_direction(&self, at: &ConstraintVector, slacks: &ConstraintVector) -> ConstraintVector {
        let mut direction = slacks.clone();
        for (g, m) in direction.iter_mut().zip(at.iter()) {
            *g = -*g;
            if *m <= 0.0 && *g < 0.0 {
                *g = 0.0;
            }
        }
        direction
    }

    /// Sets the multipliers to `max(0, from + step * direction)` and
    /// recomputes the arc costs accordingly.
    pub fn move_multipliers(&mut self, from: &ConstraintVector, direction: &ConstraintVector, step: f64) {
        let mut next = from.clone();
        for (m, g) in next.iter_mut().zip(direction.iter()) {
            *m = (*m + step * g).max(0.0);
        }
        self.model.set_multipliers(next);
        self.model.update_costs(&self.graphs);
    }

    // ------------------------------------------------------------------------
    // --- TERMINATION --------------------------------------------------------
    // ------------------------------------------------------------------------
    /// The stop criteria which are common to all strategies: infeasibility,
    /// optimality, iteration budget and (when enabled) the alternative stop.
    pub fn common_stop(&self) -> Option<StopReason> {
        if self.unreachable.is_some() {
            return Some(StopReason::Infeasible);
        }
        if self.lb >= self.ub - self.config.epsilon {
            return if self.best.is_some() {
                Some(StopReason::Optimal)
            } else {
                // the dual exceeds the value of every possible routing
                Some(StopReason::Infeasible)
            };
        }
        if self.iteration >= self.config.max_iterations {
            return Some(StopReason::MaxIterations);
        }
        None
    }
    /// The cumulative no improvement stop criterion
    pub fn alternative_stop(&self) -> Option<StopReason> {
        let limit = self.config.alternative_stop_factor * self.config.iterations_without_improvement_threshold;
        if self.config.alternative_stop_enabled && self.global_it_without_improvement >= limit {
            Some(StopReason::AlternativeStop)
        } else {
            None
        }
    }

    /// The diagnostic record of the current iteration
    pub fn record(&self, stop_reason: Option<StopReason>) -> IterationRecord {
        IterationRecord {
            iteration: self.iteration,
            lb       : self.lb,
            ub       : self.ub,
            lambda   : self.lambda,
            step_size: self.step_size,
            feasible : self.current.as_ref().map_or(false, |s| s.feasible),
            stop_reason,
        }
    }

    /// The paths of the best routing found so far
    pub fn best_routing(&self) -> Option<Vec<RoutedPath>> {
        let best = self.best.as_ref()?;
        let paths = self.graphs.iter().zip(best.iter()).enumerate()
            .map(|(d, (graph, path))| {
                let demand = graph.demand();
                let last_slice = path.first().map_or(0, |a| graph.arc(*a).slice);
                RoutedPath {
                    demand     : demand.id,
                    hops       : path.iter().map(|a| Hop { link: graph.arc(*a).link, slice: graph.arc(*a).slice }).collect(),
                    first_slice: (last_slice + 1).saturating_sub(demand.load),
                    last_slice,
                    length     : path.iter().map(|a| graph.arc(*a).length).sum(),
                    cost       : path.iter().map(|a| self.model.coefficients(d)[a.id()]).sum(),
                }
            })
            .collect();
        Some(paths)
    }

    /// The final outcome of the round, given the reason why it stopped
    pub fn outcome(&self, stop_reason: StopReason) -> Outcome {
        let status = match stop_reason {
            StopReason::Optimal    => Status::Optimal,
            StopReason::Infeasible => Status::Infeasible,
            _ if self.best.is_some() => Status::Feasible,
            _ => Status::Unknown,
        };
        let routing = match self.best_routing() {
            Some(paths) => paths.into_iter().map(DemandRouting::Routed).collect(),
            None => self.graphs.iter().map(|g| DemandRouting::Infeasible { demand: g.demand().id }).collect(),
        };
        Outcome {
            status,
            stop_reason,
            lower_bound: self.lb,
            upper_bound: self.ub,
            iterations : self.iteration,
            routing,
        }
    }
}


// ############################################################################
// #### TESTS #################################################################
// ############################################################################
