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

use crate::config::SolverConfig;
use crate::engine::random_search::{self, objective_of};
use crate::engine::refinement;
use crate::engine::result::{SolverMethod, SolverResult, SolverStatus};
use crate::engine::termination::{Deadline, StagnationCounter};
use crate::eval::evaluator::Evaluator;
use crate::state::candidate::Candidate;
use rand::Rng;

/// Draw a neighbour of `base`: re-perturb k tasks, k uniform in
/// [1, ⌊0.2·N⌋] (at least 1). Each picked task gets a fresh node from the
/// non-Mist pool (unless pinned) and a fresh uniform priority.
fn neighbour<R: Rng>(evaluator: &Evaluator<'_>, base: &Candidate, rng: &mut R) -> Candidate {
    let instance = evaluator.instance();
    let n = instance.task_count();
    let pool = instance.non_mist_nodes();

    let mut next = base.clone();
    if n == 0 {
        return next;
    }
    let span = (n / 5).max(1);
    let k = 1 + rng.random_range(0..span);
    for _ in 0..k {
        let idx = rng.random_range(0..n);
        let task = instance.task(idx.into());
        if !task.has_fixed_allocation() && !pool.is_empty() {
            next.assignments[idx] = Some(pool[rng.random_range(0..pool.len())]);
        }
        next.priorities[idx] = rng.random::<f64>();
    }
    next
}

/// Simulated annealing with a priority-refinement inner loop on each
/// accepted move. Bootstraps its seed via random search in
/// first-feasible mode.
pub(crate) fn run<R: Rng>(
    evaluator: &mut Evaluator<'_>,
    config: &SolverConfig,
    rng: &mut R,
) -> SolverResult {
    let cfg = &config.simulated_annealing;
    let tuning = &config.tuning;
    let instance = evaluator.instance();
    let mut result = SolverResult::not_started(
        instance.name(),
        SolverMethod::SimulatedAnnealing,
        Some(cfg.refinement_priority_method),
        *tuning,
        instance.task_count(),
    );

    let deadline = Deadline::from_secs(cfg.timeout);

    let mut bootstrap_cfg = config.random_search.clone();
    bootstrap_cfg.break_on_first_feasible = true;
    bootstrap_cfg.max_iterations = cfg.max_init_tries;
    let bootstrap = random_search::run(evaluator, &bootstrap_cfg, tuning, rng, true);
    if !bootstrap.schedule_state.is_scheduled() {
        result.status = SolverStatus::InitializationNotFeasible;
        result.observations = "annealing: no feasible seed found".into();
        tracing::debug!("{}", result.observations);
        return result;
    }

    let mut curr = bootstrap.best;
    evaluator.evaluate(&curr);
    let Some(mut curr_fitness) = objective_of(evaluator, tuning) else {
        result.status = SolverStatus::Error;
        result.observations = "annealing: seed re-evaluation lost feasibility".into();
        return result;
    };
    let mut best = curr.clone();
    let mut best_fitness = curr_fitness;

    // stagnation counts accepted moves, not attempts
    let mut stagnation = StagnationCounter::new(cfg.stagnation_threshold, cfg.stagnation_limit);
    let mut temperature = cfg.initial_temperature;
    result.status = SolverStatus::Completed;

    let mut iteration: u64 = 0;
    while iteration < cfg.max_iterations && temperature > cfg.min_temperature {
        if deadline.expired() {
            result.status = SolverStatus::Timeout;
            result.observations = format!(
                "annealing: timeout after {} ms",
                deadline.elapsed().as_millis()
            );
            tracing::debug!("{}", result.observations);
            break;
        }

        // sample neighbours at this temperature; stop early on a strict
        // improvement, otherwise keep the last feasible one
        let mut chosen: Option<(Candidate, f64)> = None;
        for _ in 0..cfg.max_neighbor_tries {
            let next = neighbour(evaluator, &curr, rng);
            if evaluator.evaluate(&next).is_scheduled() {
                if let Some(fitness) = objective_of(evaluator, tuning) {
                    let improving = fitness < curr_fitness;
                    chosen = Some((next, fitness));
                    if improving {
                        break;
                    }
                }
            }
        }

        let Some((next, next_fitness)) = chosen else {
            // no feasible neighbour at this temperature; keep cooling
            temperature *= cfg.cooling_rate;
            iteration += 1;
            continue;
        };

        let delta = next_fitness - curr_fitness;
        let accept = delta < 0.0 || rng.random::<f64>() < (-delta / temperature).exp();

        if accept {
            curr = next;
            curr_fitness = next_fitness;

            refinement::refine(
                evaluator,
                cfg,
                tuning,
                &mut curr,
                &mut curr_fitness,
                temperature,
                rng,
            );

            let improvement = if curr_fitness < best_fitness {
                let gain = best_fitness - curr_fitness;
                best = curr.clone();
                best_fitness = curr_fitness;
                gain
            } else {
                0.0
            };
            if stagnation.observe(improvement) {
                result.status = SolverStatus::Stagnation;
                result.observations = format!(
                    "annealing: stagnation after {} accepted moves without improvement",
                    stagnation.consecutive()
                );
                tracing::debug!("{}", result.observations);
                break;
            }
        }

        temperature *= cfg.cooling_rate;
        iteration += 1;
    }

    result.runtime = deadline.elapsed();
    result.iterations = iteration;

    if evaluator.evaluate(&best).is_scheduled() {
        result.schedule_state = evaluator.state();
        result.metrics = evaluator.metrics();
        result.best = best;
    } else {
        result.status = SolverStatus::Error;
        result.observations = "annealing: best candidate lost feasibility".into();
        tracing::debug!("{}", result.observations);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::result::RefinementMethod;
    use mist_sched_model::instance::{
        ConnectionSpec, InstanceBuilder, NodeSpec, NodeType, TaskSpec,
    };
    use mist_sched_model::prelude::Instance;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn pipeline_instance() -> Instance {
        let mut b = InstanceBuilder::new("sa-pipeline");
        for (id, kind, cost) in [
            ("e0", NodeType::Edge, 1),
            ("e1", NodeType::Edge, 2),
            ("c0", NodeType::Cloud, 5),
        ] {
            b.add_node(NodeSpec {
                id: id.into(),
                label: id.into(),
                kind,
                memory: 200,
                cost,
                utilisation: 1.0,
            });
        }
        for (from, to) in [("e0", "e1"), ("e1", "c0"), ("e0", "c0")] {
            b.add_connection(ConnectionSpec {
                id: format!("{from}-{to}"),
                from: from.into(),
                to: to.into(),
                delay: 2,
                bidirectional: true,
            });
        }
        for (i, id) in ["a", "b", "c", "d", "e"].iter().enumerate() {
            b.add_task(TaskSpec {
                id: (*id).into(),
                label: (*id).into(),
                mist: false,
                computation: 1 + (i as i64 % 3),
                period: 50,
                deadline: 0,
                activation: 0,
                memory: 5,
                fixed_node_id: None,
                successors: Vec::new(),
            });
        }
        b.add_precedence("a", "c");
        b.add_precedence("b", "c");
        b.add_precedence("c", "e");
        b.build().unwrap()
    }

    fn config(seed_method: RefinementMethod) -> SolverConfig {
        let mut config = SolverConfig::default();
        config.simulated_annealing.max_iterations = 300;
        config.simulated_annealing.max_neighbor_tries = 10;
        config.simulated_annealing.refinement_iterations = 5;
        config.simulated_annealing.stagnation_limit = 0;
        config.simulated_annealing.refinement_priority_method = seed_method;
        config
    }

    #[test]
    fn test_annealing_returns_a_feasible_best() {
        let instance = pipeline_instance();
        let mut evaluator = Evaluator::new(&instance);
        let mut rng = ChaCha8Rng::seed_from_u64(21);
        let result = run(
            &mut evaluator,
            &config(RefinementMethod::NormalPerturbation),
            &mut rng,
        );
        assert_eq!(result.status, SolverStatus::Completed);
        assert!(result.schedule_state.is_scheduled());
        assert!(result.metrics.is_some());
        assert_eq!(result.refinement, Some(RefinementMethod::NormalPerturbation));
    }

    #[test]
    fn test_annealing_never_returns_worse_than_its_seed() {
        let instance = pipeline_instance();
        let tuning = crate::eval::objective::Tuning::default();

        let seed_fitness = {
            let mut evaluator = Evaluator::new(&instance);
            let mut rng = ChaCha8Rng::seed_from_u64(22);
            let mut cfg = SolverConfig::default().random_search;
            cfg.break_on_first_feasible = true;
            let boot = random_search::run(&mut evaluator, &cfg, &tuning, &mut rng, false);
            boot.objective_value().unwrap()
        };

        let mut evaluator = Evaluator::new(&instance);
        let mut rng = ChaCha8Rng::seed_from_u64(22);
        let result = run(
            &mut evaluator,
            &config(RefinementMethod::NormalPerturbation),
            &mut rng,
        );
        assert!(result.objective_value().unwrap() <= seed_fitness);
    }

    #[test]
    fn test_annealing_is_reproducible_for_equal_seeds() {
        let instance = pipeline_instance();
        let run_once = || {
            let mut evaluator = Evaluator::new(&instance);
            let mut rng = ChaCha8Rng::seed_from_u64(23);
            run(&mut evaluator, &config(RefinementMethod::ParticleSwarm), &mut rng)
        };
        let a = run_once();
        let b = run_once();
        assert_eq!(a.best, b.best);
        assert_eq!(a.metrics, b.metrics);
        assert_eq!(a.iterations, b.iterations);
    }

    #[test]
    fn test_unsatisfiable_instance_reports_initialization_failure() {
        let mut b = InstanceBuilder::new("sa-impossible");
        b.add_node(NodeSpec {
            id: "n0".into(),
            label: "n0".into(),
            kind: NodeType::Edge,
            memory: 1,
            cost: 1,
            utilisation: 1.0,
        });
        b.add_task(TaskSpec {
            id: "t".into(),
            label: "t".into(),
            mist: false,
            computation: 1,
            period: 10,
            deadline: 0,
            activation: 0,
            memory: 100,
            fixed_node_id: None,
            successors: Vec::new(),
        });
        let instance = b.build().unwrap();

        let mut evaluator = Evaluator::new(&instance);
        let mut rng = ChaCha8Rng::seed_from_u64(24);
        let mut config = config(RefinementMethod::NormalPerturbation);
        config.simulated_annealing.max_init_tries = 50;
        let result = run(&mut evaluator, &config, &mut rng);
        assert_eq!(result.status, SolverStatus::InitializationNotFeasible);
        assert!(!result.schedule_state.is_scheduled());
    }
}
