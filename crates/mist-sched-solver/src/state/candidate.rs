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

use mist_sched_model::prelude::NodeIndex;

/// The search's decision variable: one node assignment and one priority per
/// task, indexed densely. `None` is the "unassigned" state a fresh candidate
/// starts in.
///
/// Plain value semantics; the type enforces nothing. The evaluator is the
/// single source of truth for validity.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub assignments: Vec<Option<NodeIndex>>,
    pub priorities: Vec<f64>,
}

impl Candidate {
    pub fn new(task_count: usize) -> Self {
        Self {
            assignments: vec![None; task_count],
            priorities: vec![0.0; task_count],
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }
}

impl std::fmt::Display for Candidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, (assignment, priority)) in
            self.assignments.iter().zip(&self.priorities).enumerate()
        {
            match assignment {
                Some(node) => writeln!(f, "  Task {i}: Node {}, Priority {priority:.4}", node.get())?,
                None => writeln!(f, "  Task {i}: unassigned, Priority {priority:.4}")?,
            }
        }
        Ok(())
    }
}
