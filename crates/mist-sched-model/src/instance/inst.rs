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
use crate::instance::{connection::Connection, delay::DelayMatrix, node::Node, task::Task};
use mist_sched_core::prelude::TimeDelta;
use std::collections::HashMap;

/// The immutable problem instance: task and node inventories, the network
/// and its delay matrix. Created once by [`crate::instance::InstanceBuilder`]
/// and never mutated; evaluations keep all their bookkeeping outside.
#[derive(Debug, Clone)]
pub struct Instance {
    name: String,
    tasks: Vec<Task>,
    nodes: Vec<Node>,
    connections: Vec<Connection>,
    delays: DelayMatrix,
    task_index_by_id: HashMap<String, TaskIndex>,
    node_index_by_id: HashMap<String, NodeIndex>,
    non_mist_nodes: Vec<NodeIndex>,
}

impl Instance {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        name: String,
        tasks: Vec<Task>,
        nodes: Vec<Node>,
        connections: Vec<Connection>,
        delays: DelayMatrix,
        task_index_by_id: HashMap<String, TaskIndex>,
        node_index_by_id: HashMap<String, NodeIndex>,
        non_mist_nodes: Vec<NodeIndex>,
    ) -> Self {
        Self {
            name,
            tasks,
            nodes,
            connections,
            delays,
            task_index_by_id,
            node_index_by_id,
            non_mist_nodes,
        }
    }

    /// Source file path(s) this instance was loaded from.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn task(&self, index: TaskIndex) -> &Task {
        &self.tasks[index.get()]
    }

    #[inline]
    pub fn node(&self, index: NodeIndex) -> &Node {
        &self.nodes[index.get()]
    }

    #[inline]
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    #[inline]
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    #[inline]
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    #[inline]
    pub fn delays(&self) -> &DelayMatrix {
        &self.delays
    }

    /// Direct-link delay (or multi-hop, when enabled at load time).
    #[inline]
    pub fn delay(&self, from: NodeIndex, to: NodeIndex) -> Option<TimeDelta> {
        self.delays.get(from, to)
    }

    /// Dense indices of the nodes a non-pinned task may be assigned to.
    #[inline]
    pub fn non_mist_nodes(&self) -> &[NodeIndex] {
        &self.non_mist_nodes
    }

    #[inline]
    pub fn task_index(&self, id: &str) -> Option<TaskIndex> {
        self.task_index_by_id.get(id).copied()
    }

    #[inline]
    pub fn node_index(&self, id: &str) -> Option<NodeIndex> {
        self.node_index_by_id.get(id).copied()
    }

    /// Look a task up by id, falling back to its label. Schedule imports
    /// accept either spelling.
    pub fn resolve_task(&self, key: &str) -> Option<TaskIndex> {
        self.task_index(key)
            .or_else(|| self.tasks.iter().find(|t| t.label() == key).map(Task::index))
    }

    /// Look a node up by id, falling back to its label.
    pub fn resolve_node(&self, key: &str) -> Option<NodeIndex> {
        self.node_index(key)
            .or_else(|| self.nodes.iter().find(|n| n.label() == key).map(Node::index))
    }
}

impl std::fmt::Display for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Instance({}, {} tasks, {} nodes, {} connections)",
            self.name,
            self.tasks.len(),
            self.nodes.len(),
            self.connections.len()
        )
    }
}
