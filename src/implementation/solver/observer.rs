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

//! This module provides the stock iteration observers.

use crate::{IterationObserver, IterationRecord};

/// Writes one table row per iteration to the `log` facade. Rows are emitted
/// at the debug level; the last one (which carries the stop reason) at the
/// info level.
#[derive(Debug, Default, Copy, Clone)]
pub struct LogObserver;

impl IterationObserver for LogObserver {
    fn on_iteration(&mut self, record: &IterationRecord) {
        if record.iteration == 1 {
            log::debug!("{:>6} | {:>14} | {:>14} | {:>10} | {:>12} | {:>8}", "it", "lb", "ub", "lambda", "step", "feasible");
        }
        log::debug!("{:>6} | {:>14.4} | {:>14.4} | {:>10.6} | {:>12.6e} | {:>8}",
            record.iteration, record.lb, record.ub, record.lambda, record.step_size, record.feasible);
        if let Some(reason) = record.stop_reason {
            log::info!("stopped after {} iterations ({reason}): lb {:.4}, ub {:.4}", record.iteration, record.lb, record.ub);
        }
    }
}

/// Keeps all the records it is notified of
#[derive(Debug, Default, Clone)]
pub struct RecordingObserver {
    pub records: Vec<IterationRecord>,
}
impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }
}
impl IterationObserver for RecordingObserver {
    fn on_iteration(&mut self, record: &IterationRecord) {
        self.records.push(*record);
    }
}


// ############################################################################
// #### TESTS #################################################################
// ############################################################################
