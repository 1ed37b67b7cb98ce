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

use std::time::{Duration, Instant};

/// Wall-clock budget, checked cooperatively at the top of every search
/// iteration.
#[derive(Debug, Clone)]
pub struct Deadline {
    start: Instant,
    limit: Duration,
}

impl Deadline {
    pub fn new(limit: Duration) -> Self {
        Self {
            start: Instant::now(),
            limit,
        }
    }

    pub fn from_secs(secs: u64) -> Self {
        Self::new(Duration::from_secs(secs))
    }

    #[inline]
    pub fn expired(&self) -> bool {
        self.start.elapsed() >= self.limit
    }

    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    #[inline]
    pub fn limit(&self) -> Duration {
        self.limit
    }
}

impl std::fmt::Display for Deadline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Deadline(elapsed: {:?}, limit: {:?})",
            self.elapsed(),
            self.limit
        )
    }
}

/// Counts consecutive improvement opportunities whose gain stayed below a
/// threshold. The run has stagnated once `limit` of them pass in a row.
#[derive(Debug, Clone)]
pub struct StagnationCounter {
    threshold: f64,
    limit: u32,
    consecutive: u32,
}

impl StagnationCounter {
    pub fn new(threshold: f64, limit: u32) -> Self {
        Self {
            threshold,
            limit,
            consecutive: 0,
        }
    }

    /// Record one opportunity; returns true when the run has stagnated.
    pub fn observe(&mut self, improvement: f64) -> bool {
        if improvement < self.threshold {
            self.consecutive += 1;
        } else {
            self.consecutive = 0;
        }
        self.limit > 0 && self.consecutive >= self.limit
    }

    #[inline]
    pub fn consecutive(&self) -> u32 {
        self.consecutive
    }

    pub fn reset(&mut self) {
        self.consecutive = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_deadline_expires_immediately() {
        let d = Deadline::from_secs(0);
        assert!(d.expired());
    }

    #[test]
    fn test_generous_deadline_does_not_expire() {
        let d = Deadline::from_secs(3_600);
        assert!(!d.expired());
        assert_eq!(d.limit(), Duration::from_secs(3_600));
    }

    #[test]
    fn test_stagnation_counts_consecutive_small_improvements() {
        let mut s = StagnationCounter::new(1.0, 3);
        assert!(!s.observe(0.0));
        assert!(!s.observe(0.5));
        assert!(s.observe(0.9));
        assert_eq!(s.consecutive(), 3);
    }

    #[test]
    fn test_large_improvement_resets_the_streak() {
        let mut s = StagnationCounter::new(1.0, 2);
        assert!(!s.observe(0.0));
        assert!(!s.observe(5.0));
        assert_eq!(s.consecutive(), 0);
        assert!(!s.observe(0.0));
        assert!(s.observe(0.0));
    }

    #[test]
    fn test_zero_limit_never_stagnates() {
        let mut s = StagnationCounter::new(1.0, 0);
        for _ in 0..100 {
            assert!(!s.observe(0.0));
        }
    }
}
