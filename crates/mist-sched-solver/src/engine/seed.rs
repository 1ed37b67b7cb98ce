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

use crate::eval::evaluator::Evaluator;
use mist_sched_core::prelude::TimePoint;
use mist_sched_model::prelude::{NodeIndex, TaskIndex};

/// Import an existing plan from CSV text and install it as the evaluator's
/// current schedule (marked `Scheduled`, deadlines not re-derived).
///
/// Accepted row shapes, headered or headerless:
///   `task,node,start` · `task,node,start,finish` · `node,start[,finish]`
/// In the node-first shapes the 0-based data-row number doubles as the task
/// id, matching `.dat` numbering. Tasks and nodes resolve by id first, then
/// by label. Unknown references and unparsable rows are skipped with a
/// warning. Returns the number of rows installed.
pub fn import_csv_schedule(evaluator: &mut Evaluator<'_>, text: &str) -> usize {
    let instance = evaluator.instance();
    let mut rows: Vec<(TaskIndex, NodeIndex, TimePoint, Option<TimePoint>)> = Vec::new();

    let mut header_checked = false;
    let mut node_first_format = false;
    let mut row_number = 0usize;

    for line in text.lines() {
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if line.trim().is_empty() || fields.len() < 2 {
            continue;
        }

        if !header_checked {
            header_checked = true;
            let lowered: Vec<String> = fields.iter().map(|f| f.to_lowercase()).collect();
            let looks_like_header = lowered.iter().any(|f| {
                f.contains("task")
                    || f.contains("node")
                    || f.contains("server")
                    || f.contains("start")
                    || f.contains("finish")
            });
            if looks_like_header {
                // a header that never names a task column announces the
                // node-first shape
                node_first_format = !lowered.iter().any(|f| f.contains("task"));
                continue;
            }
        }

        let (task_key, node_key, start_field, finish_field);
        let row_task_id = row_number.to_string();
        if fields.len() >= 4 {
            task_key = fields[0].to_string();
            node_key = fields[1];
            start_field = fields[2];
            finish_field = Some(fields[3]);
        } else if fields.len() == 3 {
            let task_known = instance.resolve_task(fields[0]).is_some();
            let node_known = instance.resolve_node(fields[1]).is_some();
            if !node_first_format && task_known && node_known {
                task_key = fields[0].to_string();
                node_key = fields[1];
                start_field = fields[2];
                finish_field = None;
            } else {
                task_key = row_task_id;
                node_key = fields[0];
                start_field = fields[1];
                finish_field = Some(fields[2]);
            }
        } else {
            task_key = row_task_id;
            node_key = fields[0];
            start_field = fields[1];
            finish_field = None;
        }
        row_number += 1;

        let (Some(task), Some(node)) = (
            instance.resolve_task(&task_key),
            instance.resolve_node(node_key),
        ) else {
            tracing::warn!(line, "unknown task or node in schedule CSV; row skipped");
            continue;
        };
        let Ok(start) = start_field.parse::<i64>() else {
            tracing::warn!(line, "unparsable start time in schedule CSV; row skipped");
            continue;
        };
        let finish = match finish_field {
            Some(f) => match f.parse::<i64>() {
                Ok(v) => Some(TimePoint::new(v)),
                Err(_) => {
                    tracing::warn!(line, "unparsable finish time in schedule CSV; row skipped");
                    continue;
                }
            },
            None => None,
        };

        rows.push((task, node, TimePoint::new(start), finish));
    }

    if !rows.is_empty() {
        evaluator.install_schedule(&rows);
    }
    rows.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mist_sched_model::instance::{InstanceBuilder, NodeSpec, NodeType, TaskSpec};
    use mist_sched_model::prelude::Instance;

    fn instance() -> Instance {
        let mut b = InstanceBuilder::new("seed");
        for id in ["n0", "n1"] {
            b.add_node(NodeSpec {
                id: id.into(),
                label: format!("Host {id}"),
                kind: NodeType::Edge,
                memory: 100,
                cost: 1,
                utilisation: 1.0,
            });
        }
        // dat-style numeric ids so row numbers can address tasks
        for (i, c) in [2i64, 3, 1].iter().enumerate() {
            b.add_task(TaskSpec {
                id: i.to_string(),
                label: format!("Job {i}"),
                mist: false,
                computation: *c,
                period: 50,
                deadline: 0,
                activation: 0,
                memory: 1,
                fixed_node_id: None,
                successors: Vec::new(),
            });
        }
        b.build().unwrap()
    }

    #[inline]
    fn tp(v: i64) -> TimePoint {
        TimePoint::new(v)
    }

    #[test]
    fn test_task_node_start_shape_with_header() {
        let instance = instance();
        let mut evaluator = Evaluator::new(&instance);
        let installed = import_csv_schedule(
            &mut evaluator,
            "task,server,start\n0,n0,0\n1,n0,2\n2,n1,0\n",
        );
        assert_eq!(installed, 3);
        assert!(evaluator.is_scheduled());
        assert_eq!(evaluator.task_times(TaskIndex(0)), Some((tp(0), tp(2))));
        assert_eq!(evaluator.task_times(TaskIndex(1)), Some((tp(2), tp(5))));
        assert_eq!(evaluator.placement(TaskIndex(2)), instance.node_index("n1"));
    }

    #[test]
    fn test_four_column_shape_keeps_explicit_finish() {
        let instance = instance();
        let mut evaluator = Evaluator::new(&instance);
        let installed =
            import_csv_schedule(&mut evaluator, "0,n0,0,4\n");
        assert_eq!(installed, 1);
        assert_eq!(evaluator.task_times(TaskIndex(0)), Some((tp(0), tp(4))));
    }

    #[test]
    fn test_node_first_shape_uses_row_number_as_task_id() {
        let instance = instance();
        let mut evaluator = Evaluator::new(&instance);
        let installed = import_csv_schedule(
            &mut evaluator,
            "server,start,finish\nn0,0,2\nn0,2,5\nn1,0,1\n",
        );
        assert_eq!(installed, 3);
        assert_eq!(evaluator.placement(TaskIndex(1)), instance.node_index("n0"));
        assert_eq!(evaluator.task_times(TaskIndex(2)), Some((tp(0), tp(1))));
    }

    #[test]
    fn test_two_column_shape_and_label_resolution() {
        let instance = instance();
        let mut evaluator = Evaluator::new(&instance);
        let installed =
            import_csv_schedule(&mut evaluator, "Host n0,0\nHost n1,3\n");
        assert_eq!(installed, 2);
        assert_eq!(evaluator.placement(TaskIndex(1)), instance.node_index("n1"));
    }

    #[test]
    fn test_unknown_rows_are_skipped_not_fatal() {
        let instance = instance();
        let mut evaluator = Evaluator::new(&instance);
        let installed = import_csv_schedule(
            &mut evaluator,
            "task,server,start\n0,n0,0\nghost,n0,5\n1,nowhere,5\n1,n0,oops\n",
        );
        assert_eq!(installed, 1);
        assert!(evaluator.is_scheduled());
    }

    #[test]
    fn test_empty_input_installs_nothing() {
        let instance = instance();
        let mut evaluator = Evaluator::new(&instance);
        assert_eq!(import_csv_schedule(&mut evaluator, "\n\n"), 0);
        assert!(!evaluator.is_scheduled());
    }
}
