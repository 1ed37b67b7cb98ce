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
use crate::instance::{
    connection::Connection,
    delay::DelayMatrix,
    err::InstanceError,
    inst::Instance,
    node::{Node, NodeType},
    task::{FixedAllocation, Task, TaskKind},
};
use mist_sched_core::prelude::{TimeDelta, TimePoint};
use std::collections::{HashMap, HashSet};

/// Raw task fields as the loaders hand them over, before resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskSpec {
    pub id: String,
    pub label: String,
    pub mist: bool,
    pub computation: i64,
    pub period: i64,
    pub deadline: i64,
    pub activation: i64,
    pub memory: i64,
    pub fixed_node_id: Option<String>,
    pub successors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeSpec {
    pub id: String,
    pub label: String,
    pub kind: NodeType,
    pub memory: i64,
    pub cost: i64,
    pub utilisation: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionSpec {
    pub id: String,
    pub from: String,
    pub to: String,
    pub delay: i64,
    pub bidirectional: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrecedenceSpec {
    pub from: String,
    pub to: String,
}

/// Resolves raw specs into an immutable [`Instance`]: dense indices in load
/// order, id → index maps, precedence wiring in both directions, fixed
/// allocations (with node promotion), the non-Mist candidate pool and the
/// delay matrix. Any structural defect aborts the build; no partial instance
/// escapes.
#[derive(Debug, Default)]
pub struct InstanceBuilder {
    name: String,
    tasks: Vec<TaskSpec>,
    nodes: Vec<NodeSpec>,
    connections: Vec<ConnectionSpec>,
    precedences: Vec<PrecedenceSpec>,
    multi_hop: bool,
}

impl InstanceBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn add_task(&mut self, spec: TaskSpec) -> &mut Self {
        self.tasks.push(spec);
        self
    }

    pub fn add_node(&mut self, spec: NodeSpec) -> &mut Self {
        self.nodes.push(spec);
        self
    }

    pub fn add_connection(&mut self, spec: ConnectionSpec) -> &mut Self {
        self.connections.push(spec);
        self
    }

    pub fn add_precedence(&mut self, from: impl Into<String>, to: impl Into<String>) -> &mut Self {
        self.precedences.push(PrecedenceSpec {
            from: from.into(),
            to: to.into(),
        });
        self
    }

    /// Enable all-pairs shortest-path delays instead of direct links only.
    pub fn multi_hop(&mut self, enabled: bool) -> &mut Self {
        self.multi_hop = enabled;
        self
    }

    pub fn build(self) -> Result<Instance, InstanceError> {
        let mut node_index_by_id: HashMap<String, NodeIndex> = HashMap::new();
        let mut nodes: Vec<Node> = Vec::with_capacity(self.nodes.len());

        for (i, spec) in self.nodes.into_iter().enumerate() {
            if spec.utilisation <= 0.0 || spec.utilisation > 1.0 {
                return Err(InstanceError::InvalidUtilisationBudget {
                    node: spec.id,
                    budget: spec.utilisation,
                });
            }
            let index = NodeIndex::new(i);
            if node_index_by_id.insert(spec.id.clone(), index).is_some() {
                return Err(InstanceError::DuplicateNodeId(spec.id));
            }
            nodes.push(Node::new(
                spec.id,
                spec.label,
                index,
                spec.kind,
                spec.memory,
                spec.cost,
                spec.utilisation,
            ));
        }

        let mut task_index_by_id: HashMap<String, TaskIndex> = HashMap::new();
        let mut tasks: Vec<Task> = Vec::with_capacity(self.tasks.len());
        // Successor declarations are folded into the precedence list below.
        let mut edges: Vec<PrecedenceSpec> = self.precedences;
        // node -> id of the task already pinned to it
        let mut pinned_by: HashMap<NodeIndex, String> = HashMap::new();

        for (i, spec) in self.tasks.into_iter().enumerate() {
            let index = TaskIndex::new(i);
            if task_index_by_id.contains_key(&spec.id) {
                return Err(InstanceError::DuplicateTaskId(spec.id));
            }

            if spec.computation <= 0 {
                return Err(InstanceError::InvalidComputation {
                    task: spec.id,
                    value: spec.computation,
                });
            }
            if spec.period <= 0 {
                return Err(InstanceError::InvalidPeriod {
                    task: spec.id,
                    value: spec.period,
                });
            }
            for (field, value) in [
                ("deadline", spec.deadline),
                ("activation", spec.activation),
                ("memory demand", spec.memory),
            ] {
                if value < 0 {
                    return Err(InstanceError::NegativeField {
                        task: spec.id,
                        field,
                        value,
                    });
                }
            }
            let utilisation = spec.computation as f64 / spec.period as f64;
            if utilisation > 1.0 {
                return Err(InstanceError::UtilisationOutOfRange {
                    task: spec.id,
                    utilisation,
                });
            }

            // A declared pinning makes the task Mist even when the flag is
            // absent; a Mist task without a pinning is an input defect.
            let kind = if spec.mist || spec.fixed_node_id.is_some() {
                TaskKind::Mist
            } else {
                TaskKind::Regular
            };

            let fixed = match (kind, spec.fixed_node_id) {
                (TaskKind::Mist, None) => {
                    return Err(InstanceError::MistTaskWithoutAllocation(spec.id));
                }
                (TaskKind::Mist, Some(node_id)) => {
                    let Some(&node) = node_index_by_id.get(&node_id) else {
                        return Err(InstanceError::UnknownFixedAllocationNode {
                            task: spec.id,
                            node: node_id,
                        });
                    };
                    if let Some(first) = pinned_by.get(&node) {
                        return Err(InstanceError::MistNodeOvercommitted {
                            node: node_id,
                            first: first.clone(),
                            second: spec.id,
                        });
                    }
                    pinned_by.insert(node, spec.id.clone());
                    nodes[node.get()].promote_to_mist();
                    Some(FixedAllocation::new(node_id, node))
                }
                (TaskKind::Regular, _) => None,
            };

            for succ in &spec.successors {
                edges.push(PrecedenceSpec {
                    from: spec.id.clone(),
                    to: succ.clone(),
                });
            }

            task_index_by_id.insert(spec.id.clone(), index);
            tasks.push(Task::new(
                spec.id,
                spec.label,
                index,
                kind,
                fixed,
                TimeDelta::new(spec.computation),
                TimeDelta::new(spec.period),
                TimeDelta::new(spec.deadline),
                TimePoint::new(spec.activation),
                spec.memory,
            ));
        }

        // Wire precedences both ways; the same edge declared via `successors`
        // and via the precedence list collapses to one.
        let mut seen: HashSet<(TaskIndex, TaskIndex)> = HashSet::new();
        for edge in edges {
            let resolve = |id: &String| task_index_by_id.get(id).copied();
            let (Some(from), Some(to)) = (resolve(&edge.from), resolve(&edge.to)) else {
                let missing = if resolve(&edge.from).is_none() {
                    edge.from.clone()
                } else {
                    edge.to.clone()
                };
                return Err(InstanceError::UnknownPrecedenceTask {
                    from: edge.from,
                    to: edge.to,
                    missing,
                });
            };
            if !seen.insert((from, to)) {
                continue;
            }
            tasks[from.get()].add_successor(edge.to, to);
            tasks[to.get()].add_predecessor(edge.from, from);
        }

        let mut connections: Vec<Connection> = Vec::with_capacity(self.connections.len());
        for spec in self.connections {
            let Some(&from) = node_index_by_id.get(&spec.from) else {
                return Err(InstanceError::UnknownConnectionNode {
                    connection: spec.id,
                    node: spec.from,
                });
            };
            let Some(&to) = node_index_by_id.get(&spec.to) else {
                return Err(InstanceError::UnknownConnectionNode {
                    connection: spec.id,
                    node: spec.to,
                });
            };
            connections.push(Connection::new(
                spec.id,
                spec.from,
                spec.to,
                from,
                to,
                TimeDelta::new(spec.delay),
                spec.bidirectional,
            ));
        }

        let mut delays = DelayMatrix::from_connections(nodes.len(), &connections);
        if self.multi_hop {
            delays.run_floyd_warshall();
        }

        let non_mist_nodes: Vec<NodeIndex> = nodes
            .iter()
            .filter(|n| !n.is_mist())
            .map(|n| n.index())
            .collect();

        tracing::debug!(
            tasks = tasks.len(),
            nodes = nodes.len(),
            connections = connections.len(),
            multi_hop = self.multi_hop,
            "instance built"
        );

        Ok(Instance::new(
            self.name,
            tasks,
            nodes,
            connections,
            delays,
            task_index_by_id,
            node_index_by_id,
            non_mist_nodes,
        ))
    }
}
