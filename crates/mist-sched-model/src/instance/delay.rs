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
use crate::instance::connection::Connection;
use mist_sched_core::prelude::TimeDelta;

/// Dense S×S matrix of inter-node communication delays. `None` means there
/// is no route; the diagonal is always `Some(0)`.
///
/// By default only direct links are present. [`DelayMatrix::run_floyd_warshall`]
/// relaxes the matrix to all-pairs shortest paths when multi-hop routing is
/// enabled at load time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelayMatrix {
    n: usize,
    cells: Vec<Option<TimeDelta>>,
}

impl DelayMatrix {
    pub fn new(n: usize) -> Self {
        let mut cells = vec![None; n * n];
        for i in 0..n {
            cells[i * n + i] = Some(TimeDelta::ZERO);
        }
        Self { n, cells }
    }

    pub fn from_connections(n: usize, connections: &[Connection]) -> Self {
        let mut matrix = Self::new(n);
        for conn in connections {
            if conn.from() == conn.to() {
                continue;
            }
            matrix.set(conn.from(), conn.to(), conn.delay());
            if conn.is_bidirectional() {
                matrix.set(conn.to(), conn.from(), conn.delay());
            }
        }
        matrix
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.n
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    #[inline]
    pub fn set(&mut self, from: NodeIndex, to: NodeIndex, delay: TimeDelta) {
        self.cells[from.get() * self.n + to.get()] = Some(delay);
    }

    /// Delay from `from` to `to`; `None` when the nodes are disconnected.
    #[inline]
    pub fn get(&self, from: NodeIndex, to: NodeIndex) -> Option<TimeDelta> {
        self.cells[from.get() * self.n + to.get()]
    }

    /// Relax to all-pairs shortest paths (Floyd–Warshall).
    pub fn run_floyd_warshall(&mut self) {
        let n = self.n;
        for k in 0..n {
            for i in 0..n {
                let Some(ik) = self.cells[i * n + k] else {
                    continue;
                };
                for j in 0..n {
                    let Some(kj) = self.cells[k * n + j] else {
                        continue;
                    };
                    let through = ik + kj;
                    let cell = &mut self.cells[i * n + j];
                    if cell.is_none_or(|direct| through < direct) {
                        *cell = Some(through);
                    }
                }
            }
        }
    }
}

impl std::fmt::Display for DelayMatrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for i in 0..self.n {
            for j in 0..self.n {
                match self.cells[i * self.n + j] {
                    Some(d) => write!(f, "{:>8}", d.value())?,
                    None => write!(f, "{:>8}", "INF")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
