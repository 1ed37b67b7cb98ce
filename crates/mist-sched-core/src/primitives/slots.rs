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

use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};

/// An absolute instant on the discrete slot axis.
///
/// Arithmetic is affine: points and spans do not mix freely. A `TimePoint`
/// plus a [`TimeDelta`] is a `TimePoint`; the difference of two points is a
/// `TimeDelta`. Plain `+`/`-` panic on overflow; the evaluator's hot path
/// uses [`TimePoint::checked_add`] instead.
#[repr(transparent)]
#[must_use]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimePoint(i64);

/// A span measured in slots.
#[repr(transparent)]
#[must_use]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimeDelta(i64);

impl TimePoint {
    pub const ZERO: TimePoint = TimePoint(0);

    #[inline]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    #[inline]
    pub const fn value(self) -> i64 {
        self.0
    }

    #[inline]
    pub fn checked_add(self, d: TimeDelta) -> Option<Self> {
        self.0.checked_add(d.0).map(TimePoint)
    }

    #[inline]
    pub fn max(self, other: Self) -> Self {
        if other.0 > self.0 { other } else { self }
    }

    #[inline]
    pub fn min(self, other: Self) -> Self {
        if other.0 < self.0 { other } else { self }
    }
}

impl TimeDelta {
    pub const ZERO: TimeDelta = TimeDelta(0);

    #[inline]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    #[inline]
    pub const fn value(self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(TimeDelta)
    }
}

impl std::fmt::Display for TimePoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TimePoint({})", self.0)
    }
}

impl std::fmt::Display for TimeDelta {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TimeDelta({})", self.0)
    }
}

impl Add<TimeDelta> for TimePoint {
    type Output = TimePoint;

    #[inline]
    fn add(self, rhs: TimeDelta) -> Self::Output {
        TimePoint(
            self.0
                .checked_add(rhs.0)
                .expect("overflow in TimePoint + TimeDelta"),
        )
    }
}

impl AddAssign<TimeDelta> for TimePoint {
    #[inline]
    fn add_assign(&mut self, rhs: TimeDelta) {
        *self = *self + rhs;
    }
}

impl Sub<TimeDelta> for TimePoint {
    type Output = TimePoint;

    #[inline]
    fn sub(self, rhs: TimeDelta) -> Self::Output {
        TimePoint(
            self.0
                .checked_sub(rhs.0)
                .expect("overflow in TimePoint - TimeDelta"),
        )
    }
}

impl Sub for TimePoint {
    type Output = TimeDelta;

    #[inline]
    fn sub(self, rhs: TimePoint) -> Self::Output {
        TimeDelta(
            self.0
                .checked_sub(rhs.0)
                .expect("overflow in TimePoint - TimePoint"),
        )
    }
}

impl Add for TimeDelta {
    type Output = TimeDelta;

    #[inline]
    fn add(self, rhs: TimeDelta) -> Self::Output {
        TimeDelta(
            self.0
                .checked_add(rhs.0)
                .expect("overflow in TimeDelta + TimeDelta"),
        )
    }
}

impl AddAssign for TimeDelta {
    #[inline]
    fn add_assign(&mut self, rhs: TimeDelta) {
        *self = *self + rhs;
    }
}

impl Sub for TimeDelta {
    type Output = TimeDelta;

    #[inline]
    fn sub(self, rhs: TimeDelta) -> Self::Output {
        TimeDelta(
            self.0
                .checked_sub(rhs.0)
                .expect("overflow in TimeDelta - TimeDelta"),
        )
    }
}

impl Sum for TimeDelta {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(TimeDelta::ZERO, |acc, x| acc + x)
    }
}

impl From<i64> for TimePoint {
    #[inline]
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<i64> for TimeDelta {
    #[inline]
    fn from(value: i64) -> Self {
        Self(value)
    }
}
