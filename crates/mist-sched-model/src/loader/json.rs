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

use crate::instance::{
    ConnectionSpec, Instance, InstanceBuilder, NodeSpec, NodeType, TaskSpec,
};
use crate::loader::err::LoadError;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct TasksFile {
    #[serde(default)]
    #[allow(dead_code)]
    metadata: Option<serde_json::Value>,
    tasks: Vec<TaskJson>,
    #[serde(default)]
    precedences: Vec<PrecedenceJson>,
}

#[derive(Debug, Deserialize)]
struct TaskJson {
    id: String,
    label: String,
    mist: bool,
    #[serde(rename = "C")]
    c: i64,
    #[serde(rename = "T")]
    t: i64,
    #[serde(rename = "D")]
    d: i64,
    #[serde(rename = "M")]
    m: i64,
    a: i64,
    /// String or null; non-null pins the task to that node.
    #[serde(rename = "processorId", default)]
    processor_id: Option<String>,
    #[serde(default)]
    successors: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct PrecedenceJson {
    from: String,
    to: String,
}

#[derive(Debug, Deserialize)]
struct NetworkFile {
    nodes: Vec<NodeJson>,
    connections: Vec<ConnectionJson>,
}

#[derive(Debug, Deserialize)]
struct NodeJson {
    id: String,
    label: String,
    #[serde(rename = "type")]
    kind: NodeTypeJson,
    memory: i64,
    cost: i64,
    u: f64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
enum NodeTypeJson {
    #[serde(rename = "MIST")]
    Mist,
    #[serde(rename = "EDGE")]
    Edge,
    #[serde(rename = "CLOUD")]
    Cloud,
}

impl From<NodeTypeJson> for NodeType {
    fn from(value: NodeTypeJson) -> Self {
        match value {
            NodeTypeJson::Mist => NodeType::Mist,
            NodeTypeJson::Edge => NodeType::Edge,
            NodeTypeJson::Cloud => NodeType::Cloud,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ConnectionJson {
    id: String,
    from: String,
    to: String,
    delay: i64,
    #[serde(default)]
    bidirectional: bool,
}

/// Build an instance from already-read JSON documents. `name` labels the
/// instance in reports and the result log.
pub fn parse_json_instance(
    tasks_json: &str,
    network_json: &str,
    name: impl Into<String>,
    multi_hop: bool,
) -> Result<Instance, LoadError> {
    let tasks: TasksFile = serde_json::from_str(tasks_json).map_err(|source| LoadError::Json {
        path: "<tasks>".into(),
        source,
    })?;
    let network: NetworkFile =
        serde_json::from_str(network_json).map_err(|source| LoadError::Json {
            path: "<network>".into(),
            source,
        })?;
    build(tasks, network, name.into(), multi_hop)
}

/// Load an instance from a tasks JSON file and a network JSON file.
pub fn load_json_instance(
    tasks_path: impl AsRef<Path>,
    network_path: impl AsRef<Path>,
    multi_hop: bool,
) -> Result<Instance, LoadError> {
    let tasks_path = tasks_path.as_ref();
    let network_path = network_path.as_ref();

    let read = |path: &Path| {
        fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })
    };
    let tasks_raw = read(tasks_path)?;
    let network_raw = read(network_path)?;

    let tasks: TasksFile = serde_json::from_str(&tasks_raw).map_err(|source| LoadError::Json {
        path: tasks_path.to_path_buf(),
        source,
    })?;
    let network: NetworkFile =
        serde_json::from_str(&network_raw).map_err(|source| LoadError::Json {
            path: network_path.to_path_buf(),
            source,
        })?;

    let name = format!("{} + {}", tasks_path.display(), network_path.display());
    build(tasks, network, name, multi_hop)
}

fn build(
    tasks: TasksFile,
    network: NetworkFile,
    name: String,
    multi_hop: bool,
) -> Result<Instance, LoadError> {
    let mut builder = InstanceBuilder::new(name);
    builder.multi_hop(multi_hop);

    for node in network.nodes {
        builder.add_node(NodeSpec {
            id: node.id,
            label: node.label,
            kind: node.kind.into(),
            memory: node.memory,
            cost: node.cost,
            utilisation: node.u,
        });
    }

    for task in tasks.tasks {
        builder.add_task(TaskSpec {
            id: task.id,
            label: task.label,
            mist: task.mist,
            computation: task.c,
            period: task.t,
            deadline: task.d,
            activation: task.a,
            memory: task.m,
            fixed_node_id: task.processor_id,
            successors: task.successors,
        });
    }

    for p in tasks.precedences {
        builder.add_precedence(p.from, p.to);
    }

    for conn in network.connections {
        builder.add_connection(ConnectionSpec {
            id: conn.id,
            from: conn.from,
            to: conn.to,
            delay: conn.delay,
            bidirectional: conn.bidirectional,
        });
    }

    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{NodeIndex, TaskIndex};
    use crate::instance::TaskKind;
    use mist_sched_core::prelude::TimeDelta;

    const TASKS: &str = r#"{
        "metadata": { "generator": "test" },
        "tasks": [
            {
                "id": "t0", "label": "Ingest", "mist": true,
                "C": 2, "T": 10, "D": 8, "M": 4, "a": 0,
                "processorId": "m0",
                "successors": ["t1"]
            },
            {
                "id": "t1", "label": "Aggregate", "mist": false,
                "C": 3, "T": 10, "D": 0, "M": 8, "a": 0,
                "processorId": null
            }
        ],
        "precedences": [ { "from": "t0", "to": "t1" } ]
    }"#;

    const NETWORK: &str = r#"{
        "nodes": [
            { "id": "m0", "label": "Mist 0", "type": "MIST", "memory": 16, "cost": 1, "u": 1.0 },
            { "id": "e0", "label": "Edge 0", "type": "EDGE", "memory": 64, "cost": 2, "u": 1.0 },
            { "id": "c0", "label": "Cloud 0", "type": "CLOUD", "memory": 256, "cost": 5, "u": 0.9 }
        ],
        "connections": [
            { "id": "l0", "from": "m0", "to": "e0", "delay": 3, "bidirectional": true },
            { "id": "l1", "from": "e0", "to": "c0", "delay": 10, "bidirectional": false }
        ]
    }"#;

    #[test]
    fn test_parses_tasks_network_and_precedences() {
        let inst = parse_json_instance(TASKS, NETWORK, "json-test", false).unwrap();
        assert_eq!(inst.task_count(), 2);
        assert_eq!(inst.node_count(), 3);

        let t0 = inst.task(TaskIndex(0));
        assert_eq!(t0.kind(), TaskKind::Mist);
        assert_eq!(t0.fixed_allocation().unwrap().node(), NodeIndex(0));
        // edge declared twice (successors + precedences) collapses to one
        assert_eq!(t0.successors(), &[TaskIndex(1)]);
        assert_eq!(inst.task(TaskIndex(1)).predecessors(), &[TaskIndex(0)]);
    }

    #[test]
    fn test_connection_directions() {
        let inst = parse_json_instance(TASKS, NETWORK, "json-test", false).unwrap();
        let (m0, e0, c0) = (NodeIndex(0), NodeIndex(1), NodeIndex(2));
        assert_eq!(inst.delay(m0, e0), Some(TimeDelta::new(3)));
        assert_eq!(inst.delay(e0, m0), Some(TimeDelta::new(3)));
        assert_eq!(inst.delay(e0, c0), Some(TimeDelta::new(10)));
        assert_eq!(inst.delay(c0, e0), None);
    }

    #[test]
    fn test_non_mist_pool_excludes_mist_nodes() {
        let inst = parse_json_instance(TASKS, NETWORK, "json-test", false).unwrap();
        assert_eq!(inst.non_mist_nodes(), &[NodeIndex(1), NodeIndex(2)]);
    }

    #[test]
    fn test_malformed_json_is_a_typed_error() {
        let err = parse_json_instance("{", NETWORK, "json-test", false).unwrap_err();
        assert!(matches!(err, LoadError::Json { .. }));
    }

    #[test]
    fn test_invalid_node_type_is_rejected() {
        let bad = NETWORK.replace("\"CLOUD\"", "\"FOG\"");
        let err = parse_json_instance(TASKS, &bad, "json-test", false).unwrap_err();
        assert!(matches!(err, LoadError::Json { .. }));
    }
}
