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

//! This module defines the most basic data types that are used throughout all
//! the code of our library (both at the abstraction and implementation levels).
//! These are also the types your client library is likely to work with.

use std::fmt;

// ----------------------------------------------------------------------------
// --- ERRORS -----------------------------------------------------------------
// ----------------------------------------------------------------------------
/// The errors that can be raised while setting up a lagrangian solver.
///
/// # Note
/// An infeasible round or a degenerate step are *not* errors: they are
/// regular outcomes of the dual ascent and get reported through the `Status`
/// and `StopReason` of the final `Outcome`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// A parameter of the solver is out of its domain or could not be parsed
    #[error("invalid configuration: {0}")]
    ConfigurationInvalid(String),
    /// The topology or the demands do not describe a coherent instance
    #[error("invalid instance: {0}")]
    InvalidInstance(String),
}

impl From<derive_builder::UninitializedFieldError> for Error {
    fn from(e: derive_builder::UninitializedFieldError) -> Self {
        Error::ConfigurationInvalid(e.to_string())
    }
}

// ----------------------------------------------------------------------------
// --- STATUS -----------------------------------------------------------------
// ----------------------------------------------------------------------------
/// The status of a lagrangian solver once it has completed its work.
///
/// There is no `Unbounded` status: every arc coefficient is finite and the
/// dual value never exceeds the cost of a feasible routing, which is itself
/// bounded by the sum of the coefficients. Nor is there an `Error` status:
/// invalid instances and configurations are rejected with an `Error` before
/// any solver gets built, so a running solver cannot fail.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Status {
    /// No feasible routing was found, but the round was not proved infeasible
    Unknown,
    /// A feasible routing is known but its optimality has not been proved
    Feasible,
    /// The best known routing is proved optimal (lb meets ub)
    Optimal,
    /// Some demand cannot be routed at all, or the dual grows past every
    /// feasible primal value
    Infeasible,
}

/// The reason why a dual ascent strategy decided to stop iterating.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum StopReason {
    /// The lower bound has met the upper bound
    Optimal,
    /// The round admits no feasible routing
    Infeasible,
    /// The maximum number of iterations has been reached
    MaxIterations,
    /// The step size fell below the configured minimum (or the subgradient
    /// vanished altogether)
    SmallStep,
    /// The cumulative number of non-improving iterations got too large
    AlternativeStop,
    /// The smoothed direction of the volume algorithm is (almost) null
    SmallModule,
    /// The lower bound barely moved during the last ascent check window
    SmallImprovement,
}
impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let txt = match self {
            StopReason::Optimal          => "Optimal",
            StopReason::Infeasible       => "Infeasible",
            StopReason::MaxIterations    => "Max It",
            StopReason::SmallStep        => "Small Step",
            StopReason::AlternativeStop  => "Alternative stop",
            StopReason::SmallModule      => "Small module",
            StopReason::SmallImprovement => "Small improvement",
        };
        write!(f, "{txt}")
    }
}

// ----------------------------------------------------------------------------
// --- DIAGNOSTICS ------------------------------------------------------------
// ----------------------------------------------------------------------------
/// The record that is emitted at the end of every iteration of a dual ascent.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct IterationRecord {
    /// The (1-based) number of the iteration
    pub iteration: usize,
    /// The best lower bound known after this iteration
    pub lb: f64,
    /// The best upper bound known after this iteration
    pub ub: f64,
    /// The value of the lambda parameter after this iteration
    pub lambda: f64,
    /// The step size computed during this iteration
    pub step_size: f64,
    /// Was the routing of the lagrangian subproblems feasible for the
    /// original problem ?
    pub feasible: bool,
    /// Set on the last iteration only
    pub stop_reason: Option<StopReason>,
}

// ----------------------------------------------------------------------------
// --- ROUTING ----------------------------------------------------------------
// ----------------------------------------------------------------------------
/// One hop of a routed path: the physical link being traversed and the last
/// slice of the window that is occupied on that link.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Hop {
    pub link : usize,
    pub slice: usize,
}

/// The path (and slice window) assigned to one demand.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutedPath {
    /// The identifier of the routed demand
    pub demand: usize,
    /// The ordered hops from the demand source to its target
    pub hops: Vec<Hop>,
    /// The first slice of the window used along the whole path
    pub first_slice: usize,
    /// The last slice of the window used along the whole path
    pub last_slice: usize,
    /// The physical length of the path
    pub length: f64,
    /// The cost of the path in terms of the objective metric
    pub cost: f64,
}

/// What the solver decided for one demand of the round
#[derive(Debug, Clone, PartialEq)]
pub enum DemandRouting {
    Routed(RoutedPath),
    Infeasible { demand: usize },
}
impl DemandRouting {
    /// Returns the routed path if any
    pub fn path(&self) -> Option<&RoutedPath> {
        match self {
            DemandRouting::Routed(p) => Some(p),
            DemandRouting::Infeasible { .. } => None,
        }
    }
}

/// The outcome of a complete run of the lagrangian solver.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub status: Status,
    pub stop_reason: StopReason,
    pub lower_bound: f64,
    pub upper_bound: f64,
    /// The number of iterations that have been performed
    pub iterations: usize,
    /// One entry per demand of the round, in the round order
    pub routing: Vec<DemandRouting>,
}
impl Outcome {
    /// Returns true iff every demand of the round received a path
    pub fn is_routed(&self) -> bool {
        self.routing.iter().all(|r| r.path().is_some())
    }
}


// ############################################################################
// #### TESTS #################################################################
// ############################################################################

#[cfg(test)]
mod test_common {
    use crate::*;

    #[test]
    fn stop_reasons_are_displayed_with_their_conventional_labels() {
        assert_eq!("Optimal",          StopReason::Optimal.to_string());
        assert_eq!("Max It",           StopReason::MaxIterations.to_string());
        assert_eq!("Small Step",       StopReason::SmallStep.to_string());
        assert_eq!("Alternative stop", StopReason::AlternativeStop.to_string());
        assert_eq!("Infeasible",       StopReason::Infeasible.to_string());
    }

    #[test]
    fn an_outcome_is_routed_only_when_all_demands_have_a_path() {
        let path = RoutedPath { demand: 0, hops: vec![Hop{link: 0, slice: 0}], first_slice: 0, last_slice: 0, length: 1.0, cost: 1.0 };
        let mut outcome = Outcome {
            status: Status::Feasible,
            stop_reason: StopReason::MaxIterations,
            lower_bound: 0.0,
            upper_bound: 1.0,
            iterations: 1,
            routing: vec![DemandRouting::Routed(path)],
        };
        assert!(outcome.is_routed());
        outcome.routing.push(DemandRouting::Infeasible { demand: 1 });
        assert!(!outcome.is_routed());
    }

    #[test]
    fn uninitialized_builder_fields_are_configuration_errors() {
        let err: Error = derive_builder::UninitializedFieldError::new("foo").into();
        assert!(matches!(err, Error::ConfigurationInvalid(_)));
    }
}
