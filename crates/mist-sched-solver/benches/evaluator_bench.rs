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

use criterion::{Criterion, criterion_group, criterion_main};
use mist_sched_model::instance::{ConnectionSpec, InstanceBuilder, NodeSpec, NodeType, TaskSpec};
use mist_sched_model::prelude::{Instance, NodeIndex};
use mist_sched_solver::prelude::{Candidate, Evaluator};
use std::hint::black_box;

/// Layered DAG: `layers` layers of `width` tasks, every task depending on
/// its left neighbour in the previous layer.
fn layered_instance(layers: usize, width: usize, nodes: usize) -> Instance {
    let mut b = InstanceBuilder::new("bench");
    for i in 0..nodes {
        b.add_node(NodeSpec {
            id: format!("n{i}"),
            label: format!("n{i}"),
            kind: NodeType::Edge,
            memory: 1_000_000,
            cost: 1 + (i as i64 % 4),
            utilisation: 1.0,
        });
        for j in 0..nodes {
            if i != j {
                b.add_connection(ConnectionSpec {
                    id: format!("l{i}-{j}"),
                    from: format!("n{i}"),
                    to: format!("n{j}"),
                    delay: 1 + ((i + j) as i64 % 5),
                    bidirectional: false,
                });
            }
        }
    }
    for layer in 0..layers {
        for slot in 0..width {
            let id = format!("t{layer}-{slot}");
            b.add_task(TaskSpec {
                label: id.clone(),
                id,
                mist: false,
                computation: 1 + ((layer + slot) as i64 % 7),
                period: 1_000,
                deadline: 0,
                activation: 0,
                memory: 1,
                fixed_node_id: None,
                successors: Vec::new(),
            });
            if layer > 0 {
                b.add_precedence(
                    format!("t{}-{slot}", layer - 1),
                    format!("t{layer}-{slot}"),
                );
            }
        }
    }
    b.build().unwrap()
}

fn spread_candidate(instance: &Instance) -> Candidate {
    let n = instance.task_count();
    let s = instance.node_count();
    let mut candidate = Candidate::new(n);
    for i in 0..n {
        candidate.assignments[i] = Some(NodeIndex(i % s));
        candidate.priorities[i] = (i % 17) as f64 / 17.0;
    }
    candidate
}

fn bench_evaluate(c: &mut Criterion) {
    let instance = layered_instance(40, 25, 8);
    let candidate = spread_candidate(&instance);
    let mut evaluator = Evaluator::new(&instance);

    c.bench_function("evaluate_1000_tasks", |b| {
        b.iter(|| black_box(evaluator.evaluate(black_box(&candidate))))
    });
}

criterion_group!(benches, bench_evaluate);
criterion_main!(benches);
