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

use crate::config::RandomSearchConfig;
use crate::engine::result::{SolverMethod, SolverResult, SolverStatus};
use crate::engine::termination::{Deadline, StagnationCounter};
use crate::eval::evaluator::Evaluator;
use crate::eval::objective::Tuning;
use crate::state::candidate::Candidate;
use rand::Rng;
use rand_distr::{Distribution, Normal};

/// Standard deviation of the Gaussian priority jitter.
pub(crate) const PRIORITY_JITTER_SIGMA: f64 = 0.05;

/// Perturb a candidate in place: every unassigned task receives a node,
/// every assigned non-pinned task is reassigned with probability `rate`,
/// and each priority is jittered with probability `rate`. Pinned tasks keep
/// their fixed node mirrored into the vector.
pub(crate) fn randomize_candidate<R: Rng>(
    evaluator: &Evaluator<'_>,
    candidate: &mut Candidate,
    rate: f64,
    rng: &mut R,
) {
    let instance = evaluator.instance();
    let pool = instance.non_mist_nodes();
    let jitter = Normal::new(0.0, PRIORITY_JITTER_SIGMA).expect("sigma is positive");

    for task in instance.tasks() {
        let i = task.index().get();
        if let Some(fixed) = task.fixed_allocation() {
            candidate.assignments[i] = Some(fixed.node());
        } else if candidate.assignments[i].is_none() {
            candidate.assignments[i] = Some(pool[rng.random_range(0..pool.len())]);
            candidate.priorities[i] = rng.random::<f64>();
            continue;
        } else if rng.random::<f64>() < rate {
            candidate.assignments[i] = Some(pool[rng.random_range(0..pool.len())]);
        }
        if rng.random::<f64>() < rate {
            candidate.priorities[i] =
                (candidate.priorities[i] + jitter.sample(rng)).clamp(0.0, 1.0);
        }
    }
}

#[inline]
pub(crate) fn objective_of(evaluator: &Evaluator<'_>, tuning: &Tuning) -> Option<f64> {
    evaluator.metrics().map(|m| tuning.objective(&m))
}

/// Random search over candidates. Doubles as the feasibility bootstrap for
/// SA and GA when `break_on_first_feasible` is set; `warm_start` resumes
/// from the schedule the evaluator currently holds instead of starting
/// blank.
pub(crate) fn run<R: Rng>(
    evaluator: &mut Evaluator<'_>,
    cfg: &RandomSearchConfig,
    tuning: &Tuning,
    rng: &mut R,
    warm_start: bool,
) -> SolverResult {
    let instance = evaluator.instance();
    let mut result = SolverResult::not_started(
        instance.name(),
        SolverMethod::RandomSearch,
        None,
        *tuning,
        instance.task_count(),
    );

    if instance.non_mist_nodes().is_empty() && instance.task_count() > 0 {
        result.status = SolverStatus::Error;
        result.observations = "no allocable nodes available".into();
        tracing::debug!("{}", result.observations);
        return result;
    }

    let deadline = Deadline::from_secs(cfg.timeout);
    // random search counts every attempted iteration as an improvement
    // opportunity, not only accepted moves
    let mut stagnation = StagnationCounter::new(cfg.stagnation_threshold, cfg.stagnation_limit);

    let mut curr = match warm_start {
        true => evaluator
            .candidate_from_schedule()
            .unwrap_or_else(|| Candidate::new(instance.task_count())),
        false => Candidate::new(instance.task_count()),
    };
    let mut curr_is_evaluated = warm_start && evaluator.is_scheduled();

    let mut best: Option<Candidate> = None;
    let mut best_fitness = f64::INFINITY;
    result.status = SolverStatus::Completed;

    let mut iteration: u64 = 0;
    while iteration < cfg.max_iterations {
        if deadline.expired() {
            result.status = SolverStatus::Timeout;
            result.observations = format!(
                "random search: timeout after {} ms",
                deadline.elapsed().as_millis()
            );
            tracing::debug!("{}", result.observations);
            break;
        }

        // the seed schedule (if any) gets the same treatment as a fresh
        // evaluation, so `break_on_first_feasible` can return it directly
        if curr_is_evaluated && evaluator.is_scheduled() {
            if let Some(fitness) = objective_of(evaluator, tuning) {
                if cfg.break_on_first_feasible {
                    result.status = SolverStatus::Completed;
                    result.observations =
                        format!("feasible candidate after {} iterations", iteration + 1);
                    result.schedule_state = evaluator.state();
                    result.best = curr;
                    result.metrics = evaluator.metrics();
                    result.runtime = deadline.elapsed();
                    result.iterations = iteration + 1;
                    tracing::debug!("{}", result.observations);
                    return result;
                }

                let improvement = if fitness < best_fitness {
                    let gain = if best_fitness.is_finite() {
                        best_fitness - fitness
                    } else {
                        f64::INFINITY
                    };
                    best_fitness = fitness;
                    best = Some(curr.clone());
                    gain
                } else {
                    0.0
                };
                if stagnation.observe(improvement) {
                    result.status = SolverStatus::Stagnation;
                    result.observations = format!(
                        "random search: stagnation after {} iterations without improvement",
                        stagnation.consecutive()
                    );
                    tracing::debug!("{}", result.observations);
                    break;
                }
            }
        }

        randomize_candidate(evaluator, &mut curr, cfg.perturbation_rate, rng);
        evaluator.evaluate(&curr);
        curr_is_evaluated = true;
        iteration += 1;
    }

    result.runtime = deadline.elapsed();
    result.iterations = iteration;

    match best {
        Some(candidate) if evaluator.evaluate(&candidate).is_scheduled() => {
            result.schedule_state = evaluator.state();
            result.metrics = evaluator.metrics();
            result.best = candidate;
        }
        _ => {
            // a timeout or stagnation verdict stays; only a full run that
            // never saw a feasible candidate downgrades to SolutionNotFound
            if result.status == SolverStatus::Completed {
                result.status = SolverStatus::SolutionNotFound;
            }
            if result.observations.is_empty() {
                result.observations =
                    format!("no feasible candidate after {iteration} iterations");
            }
            tracing::debug!("{}", result.observations);
        }
    }

    result
}
