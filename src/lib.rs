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

//! # LAGRSA
//! Lagrsa solves the routing and spectrum allocation (RSA) problem of
//! elastic optical networks by lagrangian decomposition. Every demand of a
//! routing round must be given a path in the physical topology together with
//! a window of contiguous frequency slices which is the same on all the
//! links of that path. Two demands may never share a slice of a link, and
//! the path of a demand may not be longer than its maximum reach.
//!
//! ## How it works
//! Each demand is given its own *extended graph*: a copy of the topology per
//! slice where an arc `(link, s)` stands for "the window of the demand ends
//! at slice `s` on `link`". In such a graph, any path from the source to the
//! target is a valid routing of that demand alone. The constraints that tie
//! the demands together (no overlapping windows) and the reach constraint
//! are relaxed in a lagrangian fashion, which leaves one independent
//! shortest path problem per demand. A dual ascent (the subgradient or the
//! volume algorithm) then adjusts the multipliers of the relaxed
//! constraints to tighten the lower bound, while any feasible routing met
//! along the way provides an upper bound.
//!
//! ## Quick Example
//! ```
//! # use lagrsa::*;
//! // a line of three nodes 0 -- 1 -- 2 with four slices per link
//! let instance = Instance::new(3, vec![
//!     PhysicalLink::new(0, 0, 1, 80.0, 4),
//!     PhysicalLink::new(1, 1, 2, 80.0, 4),
//! ], vec![
//!     Demand::new(0, 0, 2, 2, 500.0),
//!     Demand::new(1, 0, 1, 1, 500.0),
//! ]).unwrap();
//!
//! let config = SolverConfigBuilder::default()
//!     .objective(ObjectiveMetric::SliceOrder)
//!     .max_iterations(500)
//!     .build()
//!     .unwrap();
//!
//! let mut solver = LagrangianSolver::new(&instance, config)
//!     .with_heuristic(ShortestPathHeuristic::default());
//! let outcome = solver.solve();
//!
//! assert!(outcome.lower_bound <= outcome.upper_bound + 1e-6);
//! if outcome.is_routed() {
//!     // the routed demands are committed to the topology of the next round
//!     let next = instance.apply(&outcome);
//!     assert!(next.pending_demands().is_empty());
//! }
//! ```
//!
//! ## Going further
//! The dual ascent is pluggable (see `DualAscentStrategy`), so are the
//! primal heuristics (see `PrimalHeuristic`) and the per iteration
//! diagnostics (see `IterationObserver`).

mod common;
mod topology;
mod config;
mod abstraction;
mod implementation;

pub use common::*;
pub use topology::*;
pub use config::*;
pub use abstraction::*;
pub use implementation::*;
