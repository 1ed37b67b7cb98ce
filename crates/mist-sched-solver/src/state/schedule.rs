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

use mist_sched_core::prelude::TimePoint;
use mist_sched_model::prelude::{NodeIndex, TaskIndex};

/// Why a candidate itself (rather than the instance) was unusable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateFault {
    /// Assignment/priority vectors do not match the task count.
    ShapeMismatch { expected: usize, actual: usize },
    /// A task without a fixed allocation carries no node assignment.
    Unassigned { task: TaskIndex },
    /// The assigned dense index does not name a node of the instance.
    NodeOutOfRange { task: TaskIndex, node: NodeIndex },
    /// A task without a fixed allocation was steered onto a Mist node.
    MistWithoutPinning { task: TaskIndex, node: NodeIndex },
    /// A second task reached a Mist node that already holds one.
    MistOccupied { task: TaskIndex, node: NodeIndex },
    /// A start or finish time left the representable slot range.
    TimeOverflow { task: TaskIndex },
}

impl std::fmt::Display for CandidateFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use CandidateFault::*;
        match self {
            ShapeMismatch { expected, actual } => {
                write!(f, "candidate has length {actual}, instance has {expected} tasks")
            }
            Unassigned { task } => write!(f, "task {task} has no node assignment"),
            NodeOutOfRange { task, node } => {
                write!(f, "task {task} assigned to invalid node index {node}")
            }
            MistWithoutPinning { task, node } => {
                write!(f, "task {task} assigned to mist node {node} without a fixed allocation")
            }
            MistOccupied { task, node } => {
                write!(f, "mist node {node} already holds a task; cannot place {task}")
            }
            TimeOverflow { task } => write!(f, "start time of task {task} overflows the slot range"),
        }
    }
}

/// Outcome of one evaluator run. Exactly one variant per infeasibility
/// class, each carrying enough context to explain itself; the search treats
/// everything except `Scheduled` as a rejection, never as an error.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScheduleState {
    NotScheduled,
    Scheduled,
    CandidateError(CandidateFault),
    /// A predecessor reference is unknown or crosses disconnected nodes.
    PrecedencesError { task: TaskIndex, pred: TaskIndex },
    SuccessorsError { task: TaskIndex, succ: TaskIndex },
    /// The precedence graph is not acyclic; `placed` of `total` tasks were
    /// ordered before the ready set ran dry.
    CycleError { placed: usize, total: usize },
    DeadlineMissed {
        task: TaskIndex,
        finish: TimePoint,
        latest: TimePoint,
    },
    UtilizationUnfeasible { node: NodeIndex },
    MemoryUnfeasible { node: NodeIndex },
}

impl ScheduleState {
    #[inline]
    pub fn is_scheduled(&self) -> bool {
        matches!(self, ScheduleState::Scheduled)
    }

    /// Stable one-word tag for CSV records and logs.
    pub fn tag(&self) -> &'static str {
        use ScheduleState::*;
        match self {
            NotScheduled => "NotScheduled",
            Scheduled => "Scheduled",
            CandidateError(_) => "CandidateError",
            PrecedencesError { .. } => "PrecedencesError",
            SuccessorsError { .. } => "SuccessorsError",
            CycleError { .. } => "CycleError",
            DeadlineMissed { .. } => "DeadlineMissed",
            UtilizationUnfeasible { .. } => "UtilizationUnfeasible",
            MemoryUnfeasible { .. } => "MemoryUnfeasible",
        }
    }
}

impl std::fmt::Display for ScheduleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use ScheduleState::*;
        match self {
            NotScheduled => write!(f, "Not scheduled"),
            Scheduled => write!(f, "Scheduled successfully"),
            CandidateError(fault) => write!(f, "Candidate error: {fault}"),
            PrecedencesError { task, pred } => write!(
                f,
                "Precedences error: predecessor {pred} of task {task} is invalid or unreachable"
            ),
            SuccessorsError { task, succ } => {
                write!(f, "Successors error: successor {succ} of task {task} is invalid")
            }
            CycleError { placed, total } => write!(
                f,
                "Cycle error: cycle detected in task graph ({placed} of {total} tasks ordered)"
            ),
            DeadlineMissed { task, finish, latest } => write!(
                f,
                "Deadline missed: task {task} finishes at {} but must finish by {}",
                finish.value(),
                latest.value()
            ),
            UtilizationUnfeasible { node } => {
                write!(f, "Utilization unfeasible: node {node} over-utilized")
            }
            MemoryUnfeasible { node } => {
                write!(f, "Memory unfeasible: node {node} out of memory")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_scheduled_counts_as_scheduled() {
        assert!(ScheduleState::Scheduled.is_scheduled());
        assert!(!ScheduleState::NotScheduled.is_scheduled());
        assert!(
            !ScheduleState::CycleError { placed: 1, total: 2 }.is_scheduled()
        );
    }

    #[test]
    fn test_tags_are_stable() {
        assert_eq!(ScheduleState::Scheduled.tag(), "Scheduled");
        assert_eq!(
            ScheduleState::MemoryUnfeasible { node: NodeIndex(0) }.tag(),
            "MemoryUnfeasible"
        );
    }

    #[test]
    fn test_display_carries_context() {
        let s = ScheduleState::DeadlineMissed {
            task: TaskIndex(3),
            finish: TimePoint::new(12),
            latest: TimePoint::new(10),
        };
        let text = s.to_string();
        assert!(text.contains("TaskIndex(3)"));
        assert!(text.contains("12"));
        assert!(text.contains("10"));

        let c = ScheduleState::CandidateError(CandidateFault::ShapeMismatch {
            expected: 4,
            actual: 2,
        });
        assert!(c.to_string().contains("length 2"));
    }
}
