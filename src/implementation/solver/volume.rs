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

//! This module provides Barahona and Anbil's volume algorithm. It is a
//! stabilized variant of the subgradient method: the multipliers move from a
//! stability center (the multipliers of the best lower bound) along a smoothed
//! direction, and a primal estimate (a convex combination of the subproblem
//! routings) is maintained on the side.

use crate::{ConstraintVector, DualAscentStrategy, SolverContext, StopReason, VolumeParams};

/// The color of a volume iteration, which drives the evolution of lambda
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Color {
    /// The lower bound improved and the direction agrees with the smoothed one
    Green,
    /// The lower bound improved but the direction disagrees with the smoothed one
    Yellow,
    /// The lower bound did not improve
    Red,
}

/// The volume dual ascent
#[derive(Debug, Clone)]
pub struct VolumeSolver {
    params           : VolumeParams,
    center           : Option<ConstraintVector>,
    smoothed         : Option<ConstraintVector>,
    /// Squared norm of the last projected direction
    direction_norm   : f64,
    max_alpha        : f64,
    nb_red           : usize,
    nb_yellow        : usize,
    color            : Color,
    alpha_check_lb   : f64,
    ascent_lb        : f64,
    degenerate       : bool,
    small_improvement: bool,
}
impl VolumeSolver {
    pub fn new(params: VolumeParams) -> Self {
        VolumeSolver {
            params,
            center           : None,
            smoothed         : None,
            direction_norm   : f64::INFINITY,
            max_alpha        : params.max_alpha,
            nb_red           : 0,
            nb_yellow        : 0,
            color            : Color::Green,
            alpha_check_lb   : f64::NEG_INFINITY,
            ascent_lb        : f64::NEG_INFINITY,
            degenerate       : false,
            small_improvement: false,
        }
    }
    /// The color of the last iteration
    pub fn color(&self) -> Color {
        self.color
    }
    /// The current bound on the convex combination factor
    pub fn max_alpha(&self) -> f64 {
        self.max_alpha
    }

    /// Computes the factor alpha that minimizes the norm of
    /// `alpha * v + (1 - alpha) * h` given the dot products `vv`, `hv` and
    /// `hh`, clamped in `]0, max_alpha]`.
    pub fn convex_factor(max_alpha: f64, vv: f64, hv: f64, hh: f64) -> f64 {
        let denominator = vv - 2.0 * hv + hh;
        let mut alpha = if denominator > 0.0 { (hh - hv) / denominator } else { max_alpha };
        if alpha > max_alpha {
            alpha = max_alpha;
        }
        if alpha < 0.0 {
            alpha = max_alpha / 10.0;
        }
        alpha
    }

    fn classify(&mut self, improved: bool, slacks: &ConstraintVector) {
        self.color = if !improved {
            Color::Red
        } else {
            match self.smoothed.as_ref() {
                Some(h) if slacks.dot(h) < 0.0 => Color::Yellow,
                _ => Color::Green,
            }
        };
        match self.color {
            Color::Green  => { self.nb_red = 0; self.nb_yellow = 0; },
            Color::Yellow => { self.nb_red = 0; self.nb_yellow += 1; },
            Color::Red    => { self.nb_red += 1; self.nb_yellow = 0; },
        }
    }

    fn update_lambda(&mut self, ctx: &mut SolverContext) {
        let lambda = ctx.lambda();
        if self.color == Color::Green || self.nb_yellow >= self.params.yellow_limit {
            ctx.set_lambda(self.params.lambda_max.min(lambda * self.params.lambda_grow));
            self.nb_red    = 0;
            self.nb_yellow = 0;
        } else if lambda >= self.params.lambda_min_for_shrink && self.nb_red >= self.params.red_limit {
            ctx.set_lambda(lambda * self.params.lambda_shrink);
            self.nb_red    = 0;
            self.nb_yellow = 0;
            log::debug!("iteration {}: lambda shrunk to {}", ctx.iteration(), ctx.lambda());
        }
    }

    /// Halves max alpha when the lower bound barely moved since the last check
    fn check_alpha(&mut self, lb: f64) {
        if self.max_alpha >= 1e-5 && relative_improvement(lb, self.alpha_check_lb) < 0.01 {
            self.max_alpha /= 2.0;
        }
        self.alpha_check_lb = lb;
    }

    fn check_ascent(&mut self, iteration: usize, lb: f64) {
        let first = self.params.ascent_first_check;
        if iteration < first || (iteration - first) % self.params.ascent_check_interval.max(1) != 0 {
            return;
        }
        if iteration > first && relative_improvement(lb, self.ascent_lb) < self.params.min_relative_ascent {
            self.small_improvement = true;
        }
        self.ascent_lb = lb;
    }

    fn smooth(&mut self, ctx: &mut SolverContext, slacks: ConstraintVector) {
        let max_alpha = self.max_alpha;
        if let Some(h) = self.smoothed.as_mut() {
            let alpha = Self::convex_factor(max_alpha, slacks.norm2(), slacks.dot(h), h.norm2());
            h.blend(alpha, &slacks);
            ctx.blend_primal(alpha);
        } else {
            ctx.set_primal_from_current();
            self.smoothed = Some(slacks);
        }
    }
}

/// The relative improvement of `new` over `old`
fn relative_improvement(new: f64, old: f64) -> f64 {
    if !old.is_finite() {
        f64::INFINITY
    } else {
        (new - old) / old.abs().max(f64::EPSILON)
    }
}

impl DualAscentStrategy for VolumeSolver {
    fn name(&self) -> &'static str {
        "volume"
    }

    fn initialize(&mut self, ctx: &mut SolverContext) {
        *self = VolumeSolver::new(self.params);
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
        let improved = ctx.update_lower_bound(dual);
        ctx.update_upper_bound();
        if improved || self.center.is_none() {
            self.center = Some(ctx.multipliers().clone());
        }
        self.classify(improved, &slacks);

        let iteration = ctx.iteration();
        let lb = ctx.lower_bound();
        if iteration == 1 {
            self.alpha_check_lb = lb;
        } else if iteration % self.params.alpha_check_interval.max(1) == 0 {
            self.check_alpha(lb);
        }
        self.check_ascent(iteration, lb);

        self.smooth(ctx, slacks);
        if ctx.heuristic_due() {
            ctx.run_heuristic();
        }
        self.update_lambda(ctx);

        let (center, smoothed) = match (self.center.as_ref(), self.smoothed.as_ref()) {
            (Some(c), Some(h)) => (c.clone(), h),
            _ => return,
        };
        let direction = ctx.projected_direction(&center, smoothed);
        self.direction_norm = direction.norm2();
        if self.direction_norm <= 0.0 {
            self.degenerate = true;
            ctx.set_step_size(0.0);
            return;
        }
        let step = (ctx.lambda() * (ctx.upper_bound() - ctx.lower_bound()) / self.direction_norm).max(0.0);
        ctx.set_step_size(step);
        ctx.move_multipliers(&center, &direction, step);
    }

    fn is_done(&self, ctx: &SolverContext) -> Option<StopReason> {
        if let Some(reason) = ctx.common_stop() {
            return Some(reason);
        }
        if self.degenerate {
            return Some(StopReason::SmallModule);
        }
        if ctx.iteration() > 1 {
            let module = self.direction_norm / ctx.nb_constraints().max(1) as f64;
            let lb  = ctx.lower_bound();
            let gap = (ctx.primal_cost() - lb).abs() / lb.abs().max(ctx.config().epsilon);
            if module < self.params.min_module && gap < self.params.min_relative_gap {
                return Some(StopReason::SmallModule);
            }
        }
        if self.small_improvement {
            return Some(StopReason::SmallImprovement);
        }
        ctx.alternative_stop()
    }
}


// ############################################################################
// #### TESTS #################################################################
// ############################################################################
