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

//! This module provides the projected subgradient dual ascent with Polyak
//! steps: `step = lambda * (UB - L(u)) / ||g||^2` where `g` is the
//! (projected) violation of the relaxed constraints.

use crate::{DualAscentStrategy, SolverContext, StopReason};

/// The classic subgradient method. Lambda is halved whenever the lower bound
/// failed to improve for a given number of consecutive iterations, as long as
/// it has not fallen below the configured floor.
#[derive(Debug, Default, Clone)]
pub struct SubgradientSolver {
    /// Set when the projected direction vanished: no constraint is violated
    /// anymore and the multipliers cannot move
    degenerate: bool,
}
impl SubgradientSolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Halves lambda after too many iterations without improvement
    fn update_lambda(&self, ctx: &mut SolverContext) {
        if ctx.it_without_improvement() >= ctx.config().iterations_without_improvement_threshold {
            ctx.reset_it_without_improvement();
            if ctx.lambda() >= ctx.config().min_lambda {
                ctx.set_lambda(ctx.lambda() / 2.0);
                log::debug!("iteration {}: lambda halved to {}", ctx.iteration(), ctx.lambda());
            }
        }
    }
}

impl DualAscentStrategy for SubgradientSolver {
    fn name(&self) -> &'static str {
        "subgradient"
    }

    fn initialize(&mut self, ctx: &mut SolverContext) {
        self.degenerate = false;
        ctx.reset();
    }

    fn iterate(&mut self, ctx: &mut SolverContext) {
        if !ctx.solve_subproblems() {
            return;
        }
        let (dual, slacks) = match ctx.current() {
            Some(state) => (state.dual, state.slacks.clone()),
            None => return,
        };
        ctx.update_lower_bound(dual);
        ctx.update_upper_bound();
        ctx.set_primal_from_current();
        if ctx.heuristic_due() {
            ctx.run_heuristic();
        }
        self.update_lambda(ctx);

        let multipliers = ctx.multipliers().clone();
        let direction   = ctx.projected_direction(&multipliers, &slacks);
        let norm        = direction.norm2();
        if norm <= 0.0 {
            self.degenerate = true;
            ctx.set_step_size(0.0);
            return;
        }
        let step = (ctx.lambda() * (ctx.upper_bound() - dual) / norm).max(0.0);
        ctx.set_step_size(step);
        ctx.move_multipliers(&multipliers, &direction, step);
    }

    fn is_done(&self, ctx: &SolverContext) -> Option<StopReason> {
        if let Some(reason) = ctx.common_stop() {
            return Some(reason);
        }
        if self.degenerate || ctx.step_size() < ctx.config().min_step_size {
            return Some(StopReason::SmallStep);
        }
        ctx.alternative_stop()
    }
}


// ############################################################################
// #### TESTS #################################################################
// ############################################################################
