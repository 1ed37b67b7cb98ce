// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

use mist_sched_core::prelude::Cost;
use serde::Deserialize;

/// Derived quantities of a successful schedule, snapshotted off the
/// evaluator so they outlive the next `evaluate` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleMetrics {
    pub schedule_span: Cost,
    pub finish_time_sum: Cost,
    pub processors_cost: Cost,
    pub delay_cost: Cost,
}

/// Objective weights: `alpha·finish_time_sum + beta·delay_cost +
/// gamma·processors_cost`, minimised. Loaded from the `tuning` section of
/// the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Tuning {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            beta: 0.0,
            gamma: 0.0,
        }
    }
}

impl Tuning {
    #[inline]
    pub fn new(alpha: f64, beta: f64, gamma: f64) -> Self {
        Self { alpha, beta, gamma }
    }

    /// Scalar cost of a schedule. Callers must only invoke this with
    /// metrics taken from a `Scheduled` evaluation.
    #[inline]
    pub fn objective(&self, metrics: &ScheduleMetrics) -> f64 {
        self.alpha * metrics.finish_time_sum as f64
            + self.beta * metrics.delay_cost as f64
            + self.gamma * metrics.processors_cost as f64
    }
}

impl std::fmt::Display for Tuning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Tuning(alpha: {}, beta: {}, gamma: {})",
            self.alpha, self.beta, self.gamma
        )
    }
}
