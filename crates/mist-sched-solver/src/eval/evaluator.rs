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

use crate::eval::objective::ScheduleMetrics;
use crate::state::candidate::Candidate;
use crate::state::schedule::{CandidateFault, ScheduleState};
use mist_sched_core::prelude::{Cost, TimePoint};
use mist_sched_model::prelude::{Instance, NodeIndex, TaskIndex};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Tolerance for the floating-point utilisation ledger.
const UTILISATION_EPS: f64 = 1e-9;

/// Per-node bookkeeping for one evaluation. Reset at the start of every
/// call; never read across calls.
#[derive(Debug, Clone)]
struct NodeScratch {
    assigned: Vec<TaskIndex>,
    available_memory: i64,
    available_utilisation: f64,
    ready: TimePoint,
    last_slot: TimePoint,
}

impl NodeScratch {
    fn reset(&mut self, memory: i64, utilisation_budget: f64) {
        self.assigned.clear();
        self.available_memory = memory;
        self.available_utilisation = utilisation_budget;
        self.ready = TimePoint::ZERO;
        self.last_slot = TimePoint::ZERO;
    }
}

/// Entry of the ready heap: higher priority pops first, lower dense index
/// wins ties. This makes the topological order strict and deterministic.
#[derive(Debug, Clone, Copy)]
struct ReadyTask {
    priority: f64,
    index: TaskIndex,
}

impl PartialEq for ReadyTask {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ReadyTask {}

impl PartialOrd for ReadyTask {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ReadyTask {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .total_cmp(&other.priority)
            .then_with(|| other.index.cmp(&self.index))
    }
}

/// The deterministic list scheduler: maps `(instance, candidate)` to a
/// concrete schedule or a typed infeasibility.
///
/// The evaluator owns all mutable bookkeeping (the instance stays frozen):
/// per-task start/finish times and placements, per-node scratchpads, and the
/// buffers of the priority-Kahn pass. Buffers are reused across calls, so a
/// long search allocates only when a candidate is cloned.
#[derive(Debug)]
pub struct Evaluator<'i> {
    instance: &'i Instance,
    state: ScheduleState,
    starts: Vec<TimePoint>,
    finishes: Vec<TimePoint>,
    placements: Vec<Option<NodeIndex>>,
    scratch: Vec<NodeScratch>,
    indegree: Vec<usize>,
    topo: Vec<TaskIndex>,
    ready: BinaryHeap<ReadyTask>,
}

impl<'i> Evaluator<'i> {
    pub fn new(instance: &'i Instance) -> Self {
        let n = instance.task_count();
        let s = instance.node_count();
        Self {
            instance,
            state: ScheduleState::NotScheduled,
            starts: vec![TimePoint::ZERO; n],
            finishes: vec![TimePoint::ZERO; n],
            placements: vec![None; n],
            scratch: vec![
                NodeScratch {
                    assigned: Vec::new(),
                    available_memory: 0,
                    available_utilisation: 0.0,
                    ready: TimePoint::ZERO,
                    last_slot: TimePoint::ZERO,
                };
                s
            ],
            indegree: vec![0; n],
            topo: Vec::with_capacity(n),
            ready: BinaryHeap::with_capacity(n),
        }
    }

    #[inline]
    pub fn instance(&self) -> &'i Instance {
        self.instance
    }

    #[inline]
    pub fn state(&self) -> ScheduleState {
        self.state
    }

    #[inline]
    pub fn is_scheduled(&self) -> bool {
        self.state.is_scheduled()
    }

    /// Evaluate a candidate. Any failure short-circuits with the typed
    /// state; on `Scheduled` the per-task times and per-node placements are
    /// valid until the next call.
    pub fn evaluate(&mut self, candidate: &Candidate) -> ScheduleState {
        self.state = match self.try_evaluate(candidate) {
            Ok(()) => ScheduleState::Scheduled,
            Err(state) => state,
        };
        self.state
    }

    fn reset(&mut self) {
        for (scratch, node) in self.scratch.iter_mut().zip(self.instance.nodes()) {
            scratch.reset(node.memory(), node.utilisation_budget());
        }
        self.placements.fill(None);
        self.starts.fill(TimePoint::ZERO);
        self.finishes.fill(TimePoint::ZERO);
        self.topo.clear();
        self.ready.clear();
    }

    fn try_evaluate(&mut self, candidate: &Candidate) -> Result<(), ScheduleState> {
        let n = self.instance.task_count();
        let s = self.instance.node_count();

        if candidate.assignments.len() != n || candidate.priorities.len() != n {
            return Err(ScheduleState::CandidateError(CandidateFault::ShapeMismatch {
                expected: n,
                actual: candidate.assignments.len().min(candidate.priorities.len()),
            }));
        }

        self.reset();

        // Priority-Kahn: seed with every zero-in-degree task.
        for task in self.instance.tasks() {
            let i = task.index();
            for &p in task.predecessors() {
                if p.get() >= n {
                    return Err(ScheduleState::PrecedencesError { task: i, pred: p });
                }
            }
            self.indegree[i.get()] = task.predecessors().len();
            if task.predecessors().is_empty() {
                self.ready.push(ReadyTask {
                    priority: candidate.priorities[i.get()],
                    index: i,
                });
            }
        }

        while let Some(ReadyTask { index: u, .. }) = self.ready.pop() {
            self.topo.push(u);
            for &v in self.instance.task(u).successors() {
                if v.get() >= n {
                    return Err(ScheduleState::SuccessorsError { task: u, succ: v });
                }
                self.indegree[v.get()] -= 1;
                if self.indegree[v.get()] == 0 {
                    self.ready.push(ReadyTask {
                        priority: candidate.priorities[v.get()],
                        index: v,
                    });
                }
            }
        }

        if self.topo.len() != n {
            return Err(ScheduleState::CycleError {
                placed: self.topo.len(),
                total: n,
            });
        }

        // List scheduling over the topological order.
        for position in 0..n {
            let ti = self.topo[position];
            let task = self.instance.task(ti);

            let effective = match task.fixed_allocation() {
                Some(fixed) => fixed.node(),
                None => candidate.assignments[ti.get()].ok_or(ScheduleState::CandidateError(
                    CandidateFault::Unassigned { task: ti },
                ))?,
            };
            if effective.get() >= s {
                return Err(ScheduleState::CandidateError(CandidateFault::NodeOutOfRange {
                    task: ti,
                    node: effective,
                }));
            }

            let node = self.instance.node(effective);
            if node.is_mist() {
                if !task.has_fixed_allocation() {
                    return Err(ScheduleState::CandidateError(
                        CandidateFault::MistWithoutPinning {
                            task: ti,
                            node: effective,
                        },
                    ));
                }
                if !self.scratch[effective.get()].assigned.is_empty() {
                    return Err(ScheduleState::CandidateError(CandidateFault::MistOccupied {
                        task: ti,
                        node: effective,
                    }));
                }
            }

            let overflow = ScheduleState::CandidateError(CandidateFault::TimeOverflow { task: ti });

            let mut earliest = task.activation();
            for &p in task.predecessors() {
                let pred_finish = self.finishes[p.get()];
                // topo order guarantees the predecessor is already placed
                let pred_node = self.placements[p.get()]
                    .ok_or(ScheduleState::PrecedencesError { task: ti, pred: p })?;
                let arrival = if pred_node == effective {
                    pred_finish
                } else {
                    let delay = self
                        .instance
                        .delay(pred_node, effective)
                        .ok_or(ScheduleState::PrecedencesError { task: ti, pred: p })?;
                    pred_finish.checked_add(delay).ok_or(overflow)?
                };
                earliest = earliest.max(arrival);
            }
            earliest = earliest.max(self.scratch[effective.get()].ready);

            let start = earliest;
            let finish = start.checked_add(task.computation()).ok_or(overflow)?;
            self.starts[ti.get()] = start;
            self.finishes[ti.get()] = finish;
            self.placements[ti.get()] = Some(effective);

            if task.deadline().is_positive() {
                let latest = task
                    .activation()
                    .checked_add(task.deadline())
                    .ok_or(overflow)?;
                if finish > latest {
                    return Err(ScheduleState::DeadlineMissed {
                        task: ti,
                        finish,
                        latest,
                    });
                }
            }

            let scratch = &mut self.scratch[effective.get()];
            if !node.is_mist() {
                // the finish slot's end is the next free slot
                scratch.ready = finish;
            }
            scratch.last_slot = scratch.last_slot.max(finish);
            scratch.assigned.push(ti);
            scratch.available_utilisation -= task.utilisation();
            scratch.available_memory -= task.memory();
            if scratch.available_utilisation < -UTILISATION_EPS {
                return Err(ScheduleState::UtilizationUnfeasible { node: effective });
            }
            if scratch.available_memory < 0 {
                return Err(ScheduleState::MemoryUnfeasible { node: effective });
            }
        }

        Ok(())
    }

    // ----- read-out of a `Scheduled` evaluation ---------------------------

    /// Maximum finish time, or `-1` when not scheduled.
    pub fn schedule_span(&self) -> Cost {
        if !self.is_scheduled() {
            return -1;
        }
        self.finishes.iter().map(|f| f.value()).max().unwrap_or(0)
    }

    /// Sum of finish times, or `-1` when not scheduled.
    pub fn finish_time_sum(&self) -> Cost {
        if !self.is_scheduled() {
            return -1;
        }
        self.finishes.iter().map(|f| f.value()).sum()
    }

    /// Per-node cost times hosted-task count, or `-1` when not scheduled.
    pub fn processors_cost(&self) -> Cost {
        if !self.is_scheduled() {
            return -1;
        }
        self.scratch
            .iter()
            .zip(self.instance.nodes())
            .map(|(scratch, node)| node.cost() * scratch.assigned.len() as Cost)
            .sum()
    }

    /// Summed delay over precedence edges whose endpoints landed on
    /// different nodes, or `-1` when not scheduled.
    pub fn delay_cost(&self) -> Cost {
        if !self.is_scheduled() {
            return -1;
        }
        let mut total: Cost = 0;
        for task in self.instance.tasks() {
            let Some(to) = self.placements[task.index().get()] else {
                continue;
            };
            for &p in task.predecessors() {
                let Some(from) = self.placements[p.get()] else {
                    continue;
                };
                if from == to {
                    continue;
                }
                if let Some(delay) = self.instance.delay(from, to) {
                    total += delay.value();
                }
            }
        }
        total
    }

    pub fn metrics(&self) -> Option<ScheduleMetrics> {
        self.is_scheduled().then(|| ScheduleMetrics {
            schedule_span: self.schedule_span(),
            finish_time_sum: self.finish_time_sum(),
            processors_cost: self.processors_cost(),
            delay_cost: self.delay_cost(),
        })
    }

    /// Start and finish of a task; `None` unless the last run scheduled.
    pub fn task_times(&self, task: TaskIndex) -> Option<(TimePoint, TimePoint)> {
        self.is_scheduled()
            .then(|| (self.starts[task.get()], self.finishes[task.get()]))
    }

    pub fn placement(&self, task: TaskIndex) -> Option<NodeIndex> {
        if !self.is_scheduled() {
            return None;
        }
        self.placements[task.get()]
    }

    /// Tasks hosted by a node, in execution order.
    pub fn node_queue(&self, node: NodeIndex) -> &[TaskIndex] {
        &self.scratch[node.get()].assigned
    }

    /// Rebuild a candidate from the schedule currently held: assignments
    /// from the placements, priorities by start-time rank (earlier start →
    /// higher priority). Used to warm-start random search from an imported
    /// plan.
    pub fn candidate_from_schedule(&self) -> Option<Candidate> {
        if !self.is_scheduled() {
            return None;
        }
        let n = self.instance.task_count();
        let mut candidate = Candidate::new(n);
        candidate.assignments.copy_from_slice(&self.placements);

        let mut order: Vec<TaskIndex> = (0..n).map(TaskIndex::new).collect();
        order.sort_by_key(|&t| (self.starts[t.get()], t));
        for (rank, &t) in order.iter().enumerate() {
            candidate.priorities[t.get()] = (n - rank) as f64 / n as f64;
        }
        Some(candidate)
    }

    /// Install an externally supplied schedule without re-deriving times or
    /// checking deadlines. Rows carry `(task, node, start, finish)`; a
    /// missing finish defaults to `start + C`.
    pub fn install_schedule(
        &mut self,
        rows: &[(TaskIndex, NodeIndex, TimePoint, Option<TimePoint>)],
    ) {
        self.reset();
        for &(task, node, start, finish) in rows {
            let finish =
                finish.unwrap_or_else(|| start + self.instance.task(task).computation());
            self.starts[task.get()] = start;
            self.finishes[task.get()] = finish;
            self.placements[task.get()] = Some(node);
            let scratch = &mut self.scratch[node.get()];
            scratch.assigned.push(task);
            scratch.available_memory -= self.instance.task(task).memory();
            scratch.available_utilisation -= self.instance.task(task).utilisation();
            scratch.ready = scratch.ready.max(finish);
            scratch.last_slot = scratch.last_slot.max(finish);
        }
        let starts = &self.starts;
        for scratch in &mut self.scratch {
            scratch.assigned.sort_by_key(|&t| (starts[t.get()], t));
        }
        self.state = ScheduleState::Scheduled;
    }
}
