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
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Delay value the generator writes for "no link".
const INFINITE_DELAY_SENTINEL: i64 = 1000;

/// Whitespace-separated, line-oriented record reader. Blank lines are
/// skipped; numeric fields may be written as floats and are truncated.
#[derive(Debug)]
struct RecordScanner<R: BufRead> {
    rdr: R,
    buf: String,
}

impl<R: BufRead> RecordScanner<R> {
    fn new(rdr: R) -> Self {
        Self {
            rdr,
            buf: String::new(),
        }
    }

    fn next_record(&mut self) -> Result<Vec<f64>, LoadError> {
        loop {
            self.buf.clear();
            let n = self
                .rdr
                .read_line(&mut self.buf)
                .map_err(|source| LoadError::Io {
                    path: "<dat>".into(),
                    source,
                })?;
            if n == 0 {
                return Err(LoadError::UnexpectedEof);
            }
            if self.buf.trim().is_empty() {
                continue;
            }
            return self
                .buf
                .split_whitespace()
                .map(|tok| tok.parse::<f64>().map_err(LoadError::from))
                .collect();
        }
    }

    fn next_count(&mut self) -> Result<usize, LoadError> {
        let record = self.next_record()?;
        match record.as_slice() {
            [v] if *v >= 0.0 => Ok(*v as usize),
            _ => Err(LoadError::MalformedRecord {
                line: self.buf.trim().to_string(),
                expected: "a single non-negative count",
            }),
        }
    }
}

/// Build an instance from a `.dat` document held in memory.
pub fn parse_dat_instance(
    input: &str,
    name: impl Into<String>,
    multi_hop: bool,
) -> Result<Instance, LoadError> {
    from_bufread(input.as_bytes(), name.into(), multi_hop)
}

/// Load an instance from a single `.dat` file.
pub fn load_dat_instance(path: impl AsRef<Path>, multi_hop: bool) -> Result<Instance, LoadError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    from_bufread(
        BufReader::new(file),
        path.display().to_string(),
        multi_hop,
    )
}

fn from_bufread<R: BufRead>(rdr: R, name: String, multi_hop: bool) -> Result<Instance, LoadError> {
    let mut sc = RecordScanner::new(rdr);
    let mut builder = InstanceBuilder::new(name);
    builder.multi_hop(multi_hop);

    // node records carry their own numeric ids; remember them for tasks
    // and connections, which refer to nodes by that number.
    let num_nodes = sc.next_count()?;
    let mut node_ids: HashMap<i64, String> = HashMap::with_capacity(num_nodes);
    for _ in 0..num_nodes {
        let record = sc.next_record()?;
        let (number, memory, u, cost) = match record.as_slice() {
            [n, mem, u] => (*n as i64, *mem as i64, *u, 1),
            [n, mem, u, cost] => (*n as i64, *mem as i64, *u, *cost as i64),
            _ => {
                return Err(LoadError::MalformedRecord {
                    line: sc.buf.trim().to_string(),
                    expected: "nodeIndex memory u [cost]",
                });
            }
        };
        let id = number.to_string();
        node_ids.insert(number, id.clone());
        builder.add_node(NodeSpec {
            label: id.clone(),
            id,
            // promoted to Mist later if a task is pinned here
            kind: NodeType::Edge,
            memory,
            cost,
            utilisation: u,
        });
    }

    let last_task_index = sc.next_count()?;
    let task_count = last_task_index + 1;
    let mut task_ids: HashMap<i64, String> = HashMap::with_capacity(task_count);
    let mut pending_precedences: Vec<(i64, i64)> = Vec::new();
    for _ in 0..task_count {
        let record = sc.next_record()?;
        let [number, c, t, d, a, m, allocated] = record.as_slice() else {
            return Err(LoadError::MalformedRecord {
                line: sc.buf.trim().to_string(),
                expected: "taskIndex C T D a M allocatedNode",
            });
        };
        let number = *number as i64;
        let allocated = *allocated as i64;
        let is_mist = allocated != 0;
        let id = number.to_string();
        task_ids.insert(number, id.clone());
        builder.add_task(TaskSpec {
            label: id.clone(),
            id,
            mist: is_mist,
            computation: *c as i64,
            period: *t as i64,
            deadline: *d as i64,
            activation: *a as i64,
            memory: *m as i64,
            fixed_node_id: is_mist.then(|| allocated.to_string()),
            successors: Vec::new(),
        });
    }

    let precedence_count = sc.next_count()?;
    for _ in 0..precedence_count {
        let record = sc.next_record()?;
        let [from, to, exists] = record.as_slice() else {
            return Err(LoadError::MalformedRecord {
                line: sc.buf.trim().to_string(),
                expected: "from to exists",
            });
        };
        if *exists as i64 == 1 {
            pending_precedences.push((*from as i64, *to as i64));
        }
    }

    for (from, to) in pending_precedences {
        // unknown numbers surface as UnknownPrecedenceTask at build time
        let from_id = task_ids.get(&from).cloned().unwrap_or_else(|| from.to_string());
        let to_id = task_ids.get(&to).cloned().unwrap_or_else(|| to.to_string());
        builder.add_precedence(from_id, to_id);
    }

    let connection_count = sc.next_count()?;
    let mut kept = 0usize;
    for _ in 0..connection_count {
        let record = sc.next_record()?;
        let [from, to, delay] = record.as_slice() else {
            return Err(LoadError::MalformedRecord {
                line: sc.buf.trim().to_string(),
                expected: "from to delay",
            });
        };
        let (from, to, delay) = (*from as i64, *to as i64, *delay as i64);
        if from == to || delay == 0 || delay == INFINITE_DELAY_SENTINEL {
            continue;
        }
        let from_id = node_ids.get(&from).cloned().unwrap_or_else(|| from.to_string());
        let to_id = node_ids.get(&to).cloned().unwrap_or_else(|| to.to_string());
        builder.add_connection(ConnectionSpec {
            id: format!("{from_id}_{to_id}"),
            from: from_id,
            to: to_id,
            delay,
            bidirectional: false,
        });
        kept += 1;
    }
    tracing::debug!(declared = connection_count, kept, "dat connections filtered");

    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{NodeIndex, TaskIndex};
    use crate::instance::TaskKind;
    use mist_sched_core::prelude::TimeDelta;

    const SMALL: &str = "\
3
1 64 1.0 2
2 128 0.9
3 32 1.0
2
0 2 10 8 0 4 1
1 3 10 0 0 8 0
2 4 12 0 0 2 0
2
0 1 1
1 2 0
4
1 2 5
2 1 5
1 1 9
2 3 1000
";

    #[test]
    fn test_parses_nodes_with_optional_cost() {
        let inst = parse_dat_instance(SMALL, "small.dat", false).unwrap();
        assert_eq!(inst.node_count(), 3);
        assert_eq!(inst.node(NodeIndex(0)).cost(), 2);
        // cost column missing -> default 1
        assert_eq!(inst.node(NodeIndex(1)).cost(), 1);
    }

    #[test]
    fn test_task_count_is_last_index_plus_one() {
        let inst = parse_dat_instance(SMALL, "small.dat", false).unwrap();
        assert_eq!(inst.task_count(), 3);
    }

    #[test]
    fn test_nonzero_allocated_node_pins_and_promotes() {
        let inst = parse_dat_instance(SMALL, "small.dat", false).unwrap();
        let t0 = inst.task(TaskIndex(0));
        assert_eq!(t0.kind(), TaskKind::Mist);
        assert_eq!(t0.fixed_allocation().unwrap().node(), NodeIndex(0));
        assert!(inst.node(NodeIndex(0)).is_mist());
        assert_eq!(inst.non_mist_nodes(), &[NodeIndex(1), NodeIndex(2)]);
    }

    #[test]
    fn test_precedence_included_only_when_exists_flag_set() {
        let inst = parse_dat_instance(SMALL, "small.dat", false).unwrap();
        assert_eq!(inst.task(TaskIndex(0)).successors(), &[TaskIndex(1)]);
        assert!(inst.task(TaskIndex(1)).successors().is_empty());
    }

    #[test]
    fn test_connection_filters_drop_self_loops_and_sentinels() {
        let inst = parse_dat_instance(SMALL, "small.dat", false).unwrap();
        // 1<->2 kept in both directions as separate rows; 1->1 and the
        // 1000-sentinel row dropped
        assert_eq!(inst.connections().len(), 2);
        assert_eq!(inst.delay(NodeIndex(0), NodeIndex(1)), Some(TimeDelta::new(5)));
        assert_eq!(inst.delay(NodeIndex(1), NodeIndex(0)), Some(TimeDelta::new(5)));
        assert_eq!(inst.delay(NodeIndex(1), NodeIndex(2)), None);
    }

    #[test]
    fn test_truncated_file_reports_eof() {
        let err = parse_dat_instance("2\n1 64 1.0\n", "broken.dat", false).unwrap_err();
        assert!(matches!(err, LoadError::UnexpectedEof));
    }

    #[test]
    fn test_malformed_record_is_typed() {
        let err = parse_dat_instance("1\n1 64\n", "broken.dat", false).unwrap_err();
        assert!(matches!(err, LoadError::MalformedRecord { .. }));
    }
}
