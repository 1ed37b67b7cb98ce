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

/// Structural defects detected while building an [`crate::instance::Instance`].
/// These are fatal: no partial instance is ever observable.
#[derive(Debug, Clone, PartialEq)]
pub enum InstanceError {
    DuplicateTaskId(String),
    DuplicateNodeId(String),
    UnknownPrecedenceTask { from: String, to: String, missing: String },
    MistTaskWithoutAllocation(String),
    UnknownFixedAllocationNode { task: String, node: String },
    MistNodeOvercommitted { node: String, first: String, second: String },
    UnknownConnectionNode { connection: String, node: String },
    InvalidComputation { task: String, value: i64 },
    InvalidPeriod { task: String, value: i64 },
    NegativeField { task: String, field: &'static str, value: i64 },
    UtilisationOutOfRange { task: String, utilisation: f64 },
    InvalidUtilisationBudget { node: String, budget: f64 },
}

impl std::fmt::Display for InstanceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use InstanceError::*;
        match self {
            DuplicateTaskId(id) => write!(f, "duplicate task id {id}"),
            DuplicateNodeId(id) => write!(f, "duplicate node id {id}"),
            UnknownPrecedenceTask { from, to, missing } => write!(
                f,
                "precedence {from} -> {to} references unknown task {missing}"
            ),
            MistTaskWithoutAllocation(id) => {
                write!(f, "mist task {id} declares no fixed allocation")
            }
            UnknownFixedAllocationNode { task, node } => {
                write!(f, "task {task} is pinned to unknown node {node}")
            }
            MistNodeOvercommitted { node, first, second } => write!(
                f,
                "mist node {node} is pinned by both {first} and {second}; it can host one task"
            ),
            UnknownConnectionNode { connection, node } => {
                write!(f, "connection {connection} references unknown node {node}")
            }
            InvalidComputation { task, value } => {
                write!(f, "task {task} has non-positive computation cost {value}")
            }
            InvalidPeriod { task, value } => {
                write!(f, "task {task} has non-positive period {value}")
            }
            NegativeField { task, field, value } => {
                write!(f, "task {task} has negative {field} {value}")
            }
            UtilisationOutOfRange { task, utilisation } => write!(
                f,
                "task {task} has utilisation {utilisation:.4} outside [0, 1]"
            ),
            InvalidUtilisationBudget { node, budget } => write!(
                f,
                "node {node} has utilisation budget {budget:.4} outside (0, 1]"
            ),
        }
    }
}

impl std::error::Error for InstanceError {}
