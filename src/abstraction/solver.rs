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

//! This module defines the `Solver` trait.

use crate::{Outcome, RoutedPath};

/// This is the solver abstraction. It is implemented by a structure that
/// solves the lagrangian dual of a routing round and keeps track of the best
/// bounds and of the best routing it came across while doing so.
pub trait Solver {
    /// This method orders the solver to minimize the cost of the routing of
    /// the demands of the round. It returns the outcome of the attempted
    /// minimization. The status of that outcome tells whether the returned
    /// routing was proved optimal, is simply feasible or whether the round
    /// was proved infeasible.
    fn solve(&mut self) -> Outcome;
    /// Returns the best lower bound that has been identified so far.
    /// In case where no bound has been computed, it returns -inf.
    fn best_lower_bound(&self) -> f64;
    /// Returns the tightest upper bound that can be guaranteed so far.
    fn best_upper_bound(&self) -> f64;
    /// Returns the best feasible routing (one path per demand) if any.
    fn best_routing(&self) -> Option<Vec<RoutedPath>>;

    /// Computes the optimality gap: the distance between the bounds relative
    /// to the upper bound, clamped to [0, 1]. Lower bounds are often negative
    /// so the signed difference is used.
    fn gap(&self) -> f64 {
        let ub = self.best_upper_bound();
        let lb = self.best_lower_bound();
        if !ub.is_finite() || !lb.is_finite() {
            1.0
        } else {
            let diff = (ub - lb).max(0.0);
            if diff == 0.0 { 0.0 } else { (diff / ub.abs().max(f64::EPSILON)).min(1.0) }
        }
    }
}


// ############################################################################
// #### TESTS #################################################################
// ############################################################################

#[cfg(test)]
mod test_solver {
    use crate::*;

    struct Bounds(f64, f64);
    impl Solver for Bounds {
        fn solve(&mut self) -> Outcome {
            unimplemented!()
        }
        fn best_lower_bound(&self) -> f64 {
            self.0
        }
        fn best_upper_bound(&self) -> f64 {
            self.1
        }
        fn best_routing(&self) -> Option<Vec<RoutedPath>> {
            None
        }
    }

    #[test]
    fn gap_is_wide_open_when_the_lower_bound_is_negative() {
        assert_eq!(1.0, Bounds(-5.0, 5.0).gap());
    }
    #[test]
    fn gap_is_relative_to_the_upper_bound() {
        assert!((Bounds(8.0, 10.0).gap() - 0.2).abs() < 1e-12);
    }
    #[test]
    fn gap_is_zero_when_bounds_meet() {
        assert_eq!(0.0, Bounds(3.0, 3.0).gap());
        assert_eq!(0.0, Bounds(0.0, 0.0).gap());
    }
    #[test]
    fn gap_is_one_without_finite_bounds() {
        assert_eq!(1.0, Bounds(f64::NEG_INFINITY, 5.0).gap());
        assert_eq!(1.0, Bounds(2.0, f64::INFINITY).gap());
    }
}
