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

use crate::common::NodeIndex;
use mist_sched_core::prelude::TimeDelta;

/// A directed network link with a fixed communication delay. A bidirectional
/// connection fills both directions of the delay matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    id: String,
    from_id: String,
    to_id: String,
    from: NodeIndex,
    to: NodeIndex,
    delay: TimeDelta,
    bidirectional: bool,
}

impl Connection {
    pub(crate) fn new(
        id: String,
        from_id: String,
        to_id: String,
        from: NodeIndex,
        to: NodeIndex,
        delay: TimeDelta,
        bidirectional: bool,
    ) -> Self {
        Self {
            id,
            from_id,
            to_id,
            from,
            to,
            delay,
            bidirectional,
        }
    }

    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[inline]
    pub fn from_id(&self) -> &str {
        &self.from_id
    }

    #[inline]
    pub fn to_id(&self) -> &str {
        &self.to_id
    }

    #[inline]
    pub fn from(&self) -> NodeIndex {
        self.from
    }

    #[inline]
    pub fn to(&self) -> NodeIndex {
        self.to
    }

    #[inline]
    pub fn delay(&self) -> TimeDelta {
        self.delay
    }

    #[inline]
    pub fn is_bidirectional(&self) -> bool {
        self.bidirectional
    }
}

impl std::fmt::Display for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Connection({}: {} {} {}, delay={})",
            self.id,
            self.from_id,
            if self.bidirectional { "<->" } else { "->" },
            self.to_id,
            self.delay.value()
        )
    }
}
