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

use crate::common::{NodeIndex, TaskIndex};
use mist_sched_core::prelude::{TimeDelta, TimePoint};
use smallvec::SmallVec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    /// Pinned to a single Mist node; the pinning is part of the input.
    Mist,
    Regular,
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskKind::Mist => write!(f, "MIST"),
            TaskKind::Regular => write!(f, "REGULAR"),
        }
    }
}

/// Immutable pinning of a Mist task to the node it must execute on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FixedAllocation {
    node_id: String,
    node: NodeIndex,
}

impl FixedAllocation {
    #[inline]
    pub fn new(node_id: impl Into<String>, node: NodeIndex) -> Self {
        Self {
            node_id: node_id.into(),
            node,
        }
    }

    #[inline]
    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    #[inline]
    pub fn node(&self) -> NodeIndex {
        self.node
    }
}

/// A periodic computational task. Immutable after the instance is built;
/// start/finish times live in the evaluator's scratch, not here.
///
/// Timing is in integer slots: computation cost `C`, period `T`, relative
/// deadline `D` (0 means "no deadline") and activation `a`. The utilisation
/// factor `u = C / T` is precomputed at build time.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    id: String,
    label: String,
    index: TaskIndex,
    kind: TaskKind,
    fixed: Option<FixedAllocation>,

    computation: TimeDelta,
    period: TimeDelta,
    deadline: TimeDelta,
    activation: TimePoint,

    memory: i64,
    utilisation: f64,

    predecessors: SmallVec<[TaskIndex; 4]>,
    successors: SmallVec<[TaskIndex; 4]>,
    predecessor_ids: Vec<String>,
    successor_ids: Vec<String>,
}

impl Task {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        id: String,
        label: String,
        index: TaskIndex,
        kind: TaskKind,
        fixed: Option<FixedAllocation>,
        computation: TimeDelta,
        period: TimeDelta,
        deadline: TimeDelta,
        activation: TimePoint,
        memory: i64,
    ) -> Self {
        let utilisation = computation.value() as f64 / period.value() as f64;
        Self {
            id,
            label,
            index,
            kind,
            fixed,
            computation,
            period,
            deadline,
            activation,
            memory,
            utilisation,
            predecessors: SmallVec::new(),
            successors: SmallVec::new(),
            predecessor_ids: Vec::new(),
            successor_ids: Vec::new(),
        }
    }

    pub(crate) fn add_predecessor(&mut self, id: String, index: TaskIndex) {
        self.predecessor_ids.push(id);
        self.predecessors.push(index);
    }

    pub(crate) fn add_successor(&mut self, id: String, index: TaskIndex) {
        self.successor_ids.push(id);
        self.successors.push(index);
    }

    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[inline]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[inline]
    pub fn index(&self) -> TaskIndex {
        self.index
    }

    #[inline]
    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    #[inline]
    pub fn fixed_allocation(&self) -> Option<&FixedAllocation> {
        self.fixed.as_ref()
    }

    #[inline]
    pub fn has_fixed_allocation(&self) -> bool {
        self.fixed.is_some()
    }

    #[inline]
    pub fn computation(&self) -> TimeDelta {
        self.computation
    }

    #[inline]
    pub fn period(&self) -> TimeDelta {
        self.period
    }

    /// Relative deadline; `TimeDelta::ZERO` means the task has none.
    #[inline]
    pub fn deadline(&self) -> TimeDelta {
        self.deadline
    }

    #[inline]
    pub fn activation(&self) -> TimePoint {
        self.activation
    }

    #[inline]
    pub fn memory(&self) -> i64 {
        self.memory
    }

    #[inline]
    pub fn utilisation(&self) -> f64 {
        self.utilisation
    }

    #[inline]
    pub fn predecessors(&self) -> &[TaskIndex] {
        &self.predecessors
    }

    #[inline]
    pub fn successors(&self) -> &[TaskIndex] {
        &self.successors
    }

    #[inline]
    pub fn predecessor_ids(&self) -> &[String] {
        &self.predecessor_ids
    }

    #[inline]
    pub fn successor_ids(&self) -> &[String] {
        &self.successor_ids
    }
}

impl std::fmt::Display for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Task({}, {}, C={}, T={}, D={}, a={}, M={}, u={:.4})",
            self.id,
            self.kind,
            self.computation.value(),
            self.period.value(),
            self.deadline.value(),
            self.activation.value(),
            self.memory,
            self.utilisation
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(c: i64, t: i64) -> Task {
        Task::new(
            "t0".into(),
            "Task 0".into(),
            TaskIndex(0),
            TaskKind::Regular,
            None,
            TimeDelta::new(c),
            TimeDelta::new(t),
            TimeDelta::ZERO,
            TimePoint::ZERO,
            16,
        )
    }

    #[test]
    fn test_utilisation_is_c_over_t() {
        let t = task(2, 8);
        assert!((t.utilisation() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_precedence_wiring_keeps_ids_and_indices_aligned() {
        let mut t = task(1, 4);
        t.add_predecessor("p".into(), TaskIndex(3));
        t.add_successor("s".into(), TaskIndex(5));
        assert_eq!(t.predecessors(), &[TaskIndex(3)]);
        assert_eq!(t.successors(), &[TaskIndex(5)]);
        assert_eq!(t.predecessor_ids(), &["p".to_string()]);
        assert_eq!(t.successor_ids(), &["s".to_string()]);
    }

    #[test]
    fn test_display_mentions_kind_and_costs() {
        let t = task(2, 8);
        let s = t.to_string();
        assert!(s.contains("REGULAR"));
        assert!(s.contains("C=2"));
        assert!(s.contains("T=8"));
    }
}
