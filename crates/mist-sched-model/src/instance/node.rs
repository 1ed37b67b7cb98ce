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
use mist_sched_core::prelude::Cost;

/// The three node tiers. Mist is the most constrained: a Mist node hosts at
/// most one task, and only through a fixed allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    Mist,
    Edge,
    Cloud,
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeType::Mist => write!(f, "MIST"),
            NodeType::Edge => write!(f, "EDGE"),
            NodeType::Cloud => write!(f, "CLOUD"),
        }
    }
}

/// Immutable descriptor of a compute node. All per-evaluation bookkeeping
/// (placements, remaining memory and utilisation) lives in the evaluator's
/// scratchpad, keyed by this node's dense index.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    id: String,
    label: String,
    index: NodeIndex,
    kind: NodeType,
    memory: i64,
    cost: Cost,
    utilisation_budget: f64,
}

impl Node {
    pub(crate) fn new(
        id: String,
        label: String,
        index: NodeIndex,
        kind: NodeType,
        memory: i64,
        cost: Cost,
        utilisation_budget: f64,
    ) -> Self {
        Self {
            id,
            label,
            index,
            kind,
            memory,
            cost,
            utilisation_budget,
        }
    }

    /// Fixed allocations may target a node declared as Edge/Cloud in the
    /// input; loading promotes it to the Mist tier.
    pub(crate) fn promote_to_mist(&mut self) {
        self.kind = NodeType::Mist;
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
    pub fn index(&self) -> NodeIndex {
        self.index
    }

    #[inline]
    pub fn kind(&self) -> NodeType {
        self.kind
    }

    #[inline]
    pub fn is_mist(&self) -> bool {
        self.kind == NodeType::Mist
    }

    #[inline]
    pub fn memory(&self) -> i64 {
        self.memory
    }

    /// Cost per hosted task, used only by the objective.
    #[inline]
    pub fn cost(&self) -> Cost {
        self.cost
    }

    /// Total CPU utilisation budget, in (0, 1].
    #[inline]
    pub fn utilisation_budget(&self) -> f64 {
        self.utilisation_budget
    }
}

impl std::fmt::Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Node({}, {}, memory={}, cost={}, U={:.2})",
            self.id, self.kind, self.memory, self.cost, self.utilisation_budget
        )
    }
}
