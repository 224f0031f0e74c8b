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

//! This module defines the `DualAscentStrategy` trait: the abstraction of the
//! methods that iteratively update the lagrangian multipliers.

use crate::{SolverContext, StopReason};

/// A dual ascent strategy updates the lagrangian multipliers of a round until
/// some stopping criterion is met. All the bookkeeping which is common to the
/// different strategies (bounds, counters, best routing, the subproblems and
/// their oracle) lives in the `SolverContext` the strategy is given.
///
/// The protocol is the following: `initialize` is called once, then
/// `iterate` and `is_done` are called alternately until `is_done` returns
/// a stop reason.
pub trait DualAscentStrategy {
    /// A short name identifying the strategy in the logs
    fn name(&self) -> &'static str;
    /// Resets the strategy and the context to their initial state
    fn initialize(&mut self, ctx: &mut SolverContext);
    /// Performs one complete iteration: solve the subproblems, update the
    /// bounds, then move the multipliers and recompute the arc costs
    fn iterate(&mut self, ctx: &mut SolverContext);
    /// Returns the reason why the strategy must stop (if it must)
    fn is_done(&self, ctx: &SolverContext) -> Option<StopReason>;
}
