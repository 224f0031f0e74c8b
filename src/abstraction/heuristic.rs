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

//! This module defines the `PrimalHeuristic` trait which lets a lagrangian
//! solver find feasible routings (upper bounds) along the way.

use crate::{ArcId, ExtendedGraph, Instance, LagrangianCostModel};

/// Everything a primal heuristic may look at when it is invoked.
#[derive(Clone, Copy)]
pub struct HeuristicView<'a> {
    /// The topology of the round
    pub instance: &'a Instance,
    /// The extended graph of each demand of the round
    pub graphs: &'a [ExtendedGraph],
    /// The cost model (base coefficients and lagrangian costs)
    pub model: &'a LagrangianCostModel,
    /// The current primal estimate: the value (in [0, 1]) of every arc
    /// variable of every demand
    pub primal: &'a [Vec<f64>],
    /// The best upper bound known so far
    pub upper_bound: f64,
}

/// A routing found by a primal heuristic
#[derive(Debug, Clone, PartialEq)]
pub struct HeuristicSolution {
    /// The cost of the routing w.r.t. the base coefficients
    pub cost: f64,
    /// The path of every demand of the round
    pub paths: Vec<Vec<ArcId>>,
}

/// A primal heuristic tries to derive a feasible routing from the current
/// state of the dual ascent. The solver checks the feasibility of whatever
/// routing it is handed before using it as an upper bound.
pub trait PrimalHeuristic {
    fn run(&mut self, view: &HeuristicView) -> Option<HeuristicSolution>;
}
