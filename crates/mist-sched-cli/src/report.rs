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

use mist_sched_solver::prelude::{Evaluator, SolverResult};
use serde_json::json;
use std::fmt::Write as _;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Json,
    Csv,
    Tab,
}

/// Render the outcome of a solve for stdout.
pub fn render(result: &SolverResult, evaluator: &Evaluator<'_>, format: ReportFormat) -> String {
    match format {
        ReportFormat::Text => render_text(result, evaluator),
        ReportFormat::Json => render_json(result, evaluator),
        ReportFormat::Csv => render_table(evaluator, ','),
        ReportFormat::Tab => render_table(evaluator, '\t'),
    }
}

fn render_text(result: &SolverResult, evaluator: &Evaluator<'_>) -> String {
    let mut out = result.to_string();
    if !evaluator.is_scheduled() {
        return out;
    }

    let instance = evaluator.instance();
    let _ = writeln!(out, "\nTask placements by node:");
    for node in instance.nodes() {
        let _ = writeln!(out, "  {} ({})", node.label(), node.id());
        for &task_index in evaluator.node_queue(node.index()) {
            let task = instance.task(task_index);
            if let Some((start, finish)) = evaluator.task_times(task_index) {
                let _ = writeln!(
                    out,
                    "    {} [{}, {})",
                    task.label(),
                    start.value(),
                    finish.value()
                );
            }
        }
    }

    let _ = writeln!(out, "\nTask placements by task:");
    for task in instance.tasks() {
        let node_text = evaluator
            .placement(task.index())
            .map_or_else(|| "not placed".to_string(), |n| instance.node(n).id().to_string());
        let times = evaluator
            .task_times(task.index())
            .map_or_else(String::new, |(s, f)| format!(", start {}, finish {}", s.value(), f.value()));
        let _ = writeln!(out, "  {} -> {node_text}{times}", task.id());
    }
    out
}

fn render_json(result: &SolverResult, evaluator: &Evaluator<'_>) -> String {
    let instance = evaluator.instance();

    let tasks: Vec<_> = instance
        .tasks()
        .map(|task| {
            let times = evaluator.task_times(task.index());
            json!({
                "id": task.id(),
                "label": task.label(),
                "kind": task.kind().to_string(),
                "C": task.computation().value(),
                "T": task.period().value(),
                "D": task.deadline().value(),
                "a": task.activation().value(),
                "M": task.memory(),
                "u": task.utilisation(),
                "node": evaluator
                    .placement(task.index())
                    .map(|n| instance.node(n).id().to_string()),
                "start_time": times.map(|(s, _)| s.value()),
                "finish_time": times.map(|(_, f)| f.value()),
            })
        })
        .collect();

    let nodes: Vec<_> = instance
        .nodes()
        .map(|node| {
            let assigned: Vec<_> = evaluator
                .node_queue(node.index())
                .iter()
                .map(|&t| instance.task(t).id().to_string())
                .collect();
            json!({
                "id": node.id(),
                "label": node.label(),
                "type": node.kind().to_string(),
                "memory": node.memory(),
                "cost": node.cost(),
                "u": node.utilisation_budget(),
                "assigned_tasks": assigned,
            })
        })
        .collect();

    let delay_matrix: Vec<Vec<serde_json::Value>> = instance
        .nodes()
        .map(|from| {
            instance
                .nodes()
                .map(|to| match instance.delay(from.index(), to.index()) {
                    Some(delay) => json!(delay.value()),
                    None => json!("INF"),
                })
                .collect()
        })
        .collect();

    let document = json!({
        "instance": instance.name(),
        "result": {
            "status": result.status.to_string(),
            "schedule_state": result.schedule_state.to_string(),
            "method": result.method.to_string(),
            "refinement": result.refinement.map(|r| r.to_string()),
            "runtime_ms": result.runtime.as_millis() as u64,
            "iterations": result.iterations,
            "schedule_span": result.metrics.map(|m| m.schedule_span),
            "finish_time_sum": result.metrics.map(|m| m.finish_time_sum),
            "processors_cost": result.metrics.map(|m| m.processors_cost),
            "delay_cost": result.metrics.map(|m| m.delay_cost),
            "objective_value": result.objective_value(),
            "observations": result.observations,
        },
        "tasks": tasks,
        "nodes": nodes,
        "delay_matrix": delay_matrix,
    });
    serde_json::to_string_pretty(&document).unwrap_or_else(|_| "{}".to_string())
}

/// `task,server,start,finish` placement table; `csv` and `tab` share it.
fn render_table(evaluator: &Evaluator<'_>, separator: char) -> String {
    let instance = evaluator.instance();
    let mut out = format!("task{separator}server{separator}start{separator}finish\n");
    for node in instance.nodes() {
        for &task_index in evaluator.node_queue(node.index()) {
            if let Some((start, finish)) = evaluator.task_times(task_index) {
                let _ = writeln!(
                    out,
                    "{}{separator}{}{separator}{}{separator}{}",
                    instance.task(task_index).id(),
                    node.id(),
                    start.value(),
                    finish.value()
                );
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use mist_sched_model::instance::{InstanceBuilder, NodeSpec, NodeType, TaskSpec};
    use mist_sched_model::prelude::{Instance, NodeIndex};
    use mist_sched_solver::prelude::{Candidate, SolverMethod, SolverStatus, Tuning};

    fn instance() -> Instance {
        let mut b = InstanceBuilder::new("report");
        b.add_node(NodeSpec {
            id: "n0".into(),
            label: "Edge".into(),
            kind: NodeType::Edge,
            memory: 100,
            cost: 1,
            utilisation: 1.0,
        });
        for id in ["a", "b"] {
            b.add_task(TaskSpec {
                id: id.into(),
                label: id.to_uppercase(),
                mist: false,
                computation: 2,
                period: 20,
                deadline: 0,
                activation: 0,
                memory: 5,
                fixed_node_id: None,
                successors: Vec::new(),
            });
        }
        b.add_precedence("a", "b");
        b.build().unwrap()
    }

    fn scheduled<'i>(instance: &'i Instance) -> (SolverResult, Evaluator<'i>) {
        let mut evaluator = Evaluator::new(instance);
        let mut candidate = Candidate::new(2);
        candidate.assignments = vec![Some(NodeIndex(0)); 2];
        candidate.priorities = vec![0.9, 0.1];
        assert!(evaluator.evaluate(&candidate).is_scheduled());

        let mut result = SolverResult::not_started(
            instance.name(),
            SolverMethod::RandomSearch,
            None,
            Tuning::default(),
            2,
        );
        result.status = SolverStatus::Completed;
        result.schedule_state = evaluator.state();
        result.metrics = evaluator.metrics();
        result.best = candidate;
        (result, evaluator)
    }

    #[test]
    fn test_text_report_lists_placements() {
        let instance = instance();
        let (result, evaluator) = scheduled(&instance);
        let text = render(&result, &evaluator, ReportFormat::Text);
        assert!(text.contains("Status: Completed"));
        assert!(text.contains("Task placements by node:"));
        assert!(text.contains("A [0, 2)"));
        assert!(text.contains("b -> n0, start 2, finish 4"));
    }

    #[test]
    fn test_json_report_is_valid_and_complete() {
        let instance = instance();
        let (result, evaluator) = scheduled(&instance);
        let text = render(&result, &evaluator, ReportFormat::Json);
        let doc: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(doc["instance"], "report");
        assert_eq!(doc["result"]["schedule_span"], 4);
        assert_eq!(doc["tasks"][0]["start_time"], 0);
        assert_eq!(doc["nodes"][0]["assigned_tasks"][0], "a");
        assert_eq!(doc["delay_matrix"][0][0], 0);
    }

    #[test]
    fn test_csv_and_tab_tables() {
        let instance = instance();
        let (result, evaluator) = scheduled(&instance);
        let csv = render(&result, &evaluator, ReportFormat::Csv);
        assert!(csv.starts_with("task,server,start,finish\n"));
        assert!(csv.contains("a,n0,0,2\n"));
        assert!(csv.contains("b,n0,2,4\n"));

        let tab = render(&result, &evaluator, ReportFormat::Tab);
        assert!(tab.contains("a\tn0\t0\t2\n"));
    }

    #[test]
    fn test_unscheduled_text_report_has_no_placements() {
        let instance = instance();
        let evaluator = Evaluator::new(&instance);
        let result = SolverResult::not_started(
            instance.name(),
            SolverMethod::RandomSearch,
            None,
            Tuning::default(),
            2,
        );
        let text = render(&result, &evaluator, ReportFormat::Text);
        assert!(!text.contains("Task placements"));
    }
}
