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

use crate::config::{GeneticConfig, SolverConfig};
use crate::engine::random_search::{self, PRIORITY_JITTER_SIGMA, objective_of};
use crate::engine::result::{SolverMethod, SolverResult, SolverStatus};
use crate::engine::termination::{Deadline, StagnationCounter};
use crate::eval::evaluator::Evaluator;
use crate::state::candidate::Candidate;
use rand::Rng;
use rand_distr::{Distribution, Normal};

/// Bound on offspring attempts per generation, so a hostile instance
/// cannot spin the fill loop forever.
const FILL_ATTEMPTS_PER_SLOT: usize = 50;

const TOURNAMENT_SIZE: usize = 3;

#[derive(Debug, Clone)]
struct Individual {
    candidate: Candidate,
    fitness: f64,
}

fn tournament_select<'p, R: Rng>(
    population: &'p [Individual],
    rng: &mut R,
) -> &'p Individual {
    let mut best = &population[rng.random_range(0..population.len())];
    for _ in 1..TOURNAMENT_SIZE {
        let contender = &population[rng.random_range(0..population.len())];
        if contender.fitness < best.fitness {
            best = contender;
        }
    }
    best
}

/// Uniform crossover on assignments (fixed allocations always keep their
/// node) and per-gene arithmetic mean on priorities.
fn crossover<R: Rng>(
    evaluator: &Evaluator<'_>,
    p1: &Candidate,
    p2: &Candidate,
    rng: &mut R,
) -> Candidate {
    let mut child = p1.clone();
    for task in evaluator.instance().tasks() {
        let i = task.index().get();
        if let Some(fixed) = task.fixed_allocation() {
            child.assignments[i] = Some(fixed.node());
        } else if rng.random::<f64>() < 0.5 {
            child.assignments[i] = p2.assignments[i];
        }
        child.priorities[i] = 0.5 * p1.priorities[i] + 0.5 * p2.priorities[i];
    }
    child
}

fn mutate<R: Rng>(
    evaluator: &Evaluator<'_>,
    cfg: &GeneticConfig,
    candidate: &mut Candidate,
    rng: &mut R,
) {
    let pool = evaluator.instance().non_mist_nodes();
    let jitter = Normal::new(0.0, PRIORITY_JITTER_SIGMA).expect("sigma is positive");
    for task in evaluator.instance().tasks() {
        let i = task.index().get();
        if rng.random::<f64>() < cfg.mutation_rate
            && !task.has_fixed_allocation()
            && !pool.is_empty()
        {
            candidate.assignments[i] = Some(pool[rng.random_range(0..pool.len())]);
        }
        if rng.random::<f64>() < cfg.mutation_rate {
            candidate.priorities[i] =
                (candidate.priorities[i] + jitter.sample(rng)).clamp(0.0, 1.0);
        }
    }
}

/// Generational GA with elitism and tournament selection. Only feasible
/// offspring enter a generation; the population is bootstrapped with
/// first-feasible random searches.
pub(crate) fn run<R: Rng>(
    evaluator: &mut Evaluator<'_>,
    config: &SolverConfig,
    rng: &mut R,
) -> SolverResult {
    let cfg = &config.genetic_algorithm;
    let tuning = &config.tuning;
    let instance = evaluator.instance();
    let mut result = SolverResult::not_started(
        instance.name(),
        SolverMethod::GeneticAlgorithm,
        None,
        *tuning,
        instance.task_count(),
    );

    let deadline = Deadline::from_secs(cfg.timeout);

    let mut bootstrap_cfg = config.random_search.clone();
    bootstrap_cfg.break_on_first_feasible = true;
    bootstrap_cfg.max_iterations = cfg.max_init_tries;

    let mut population: Vec<Individual> = Vec::with_capacity(cfg.population_size);
    for _ in 0..cfg.population_size {
        // cold start each bootstrap so individuals stay independent
        let boot = random_search::run(evaluator, &bootstrap_cfg, tuning, rng, false);
        if boot.schedule_state.is_scheduled() {
            if let Some(fitness) = boot.objective_value() {
                population.push(Individual {
                    candidate: boot.best,
                    fitness,
                });
            }
        }
    }

    if population.len() < cfg.population_size.div_ceil(2) {
        result.status = SolverStatus::InitializationNotFeasible;
        result.observations = format!(
            "genetic: only {} of {} bootstrap individuals were feasible",
            population.len(),
            cfg.population_size
        );
        tracing::debug!("{}", result.observations);
        return result;
    }

    population.sort_by(|a, b| a.fitness.total_cmp(&b.fitness));
    let mut best = population[0].clone();

    // stagnation counts generations, the GA's accepted moves
    let mut stagnation = StagnationCounter::new(cfg.stagnation_threshold, cfg.stagnation_limit);
    result.status = SolverStatus::Completed;

    let mut generation: u64 = 0;
    while generation < cfg.max_generations {
        if deadline.expired() {
            result.status = SolverStatus::Timeout;
            result.observations = format!(
                "genetic: timeout after {} ms",
                deadline.elapsed().as_millis()
            );
            tracing::debug!("{}", result.observations);
            break;
        }

        let mut next_generation: Vec<Individual> = Vec::with_capacity(cfg.population_size);
        next_generation.extend(
            population
                .iter()
                .take(cfg.elite_count.min(population.len()))
                .cloned(),
        );

        let mut attempts = 0usize;
        let attempt_budget = FILL_ATTEMPTS_PER_SLOT * cfg.population_size.max(1);
        while next_generation.len() < cfg.population_size && attempts < attempt_budget {
            attempts += 1;

            let p1 = tournament_select(&population, rng);
            let p2 = tournament_select(&population, rng);
            let mut child = if rng.random::<f64>() < cfg.crossover_rate {
                crossover(evaluator, &p1.candidate, &p2.candidate, rng)
            } else {
                p1.candidate.clone()
            };
            mutate(evaluator, cfg, &mut child, rng);

            if evaluator.evaluate(&child).is_scheduled() {
                if let Some(fitness) = objective_of(evaluator, tuning) {
                    next_generation.push(Individual {
                        candidate: child,
                        fitness,
                    });
                }
            }
        }

        population = next_generation;
        if population.is_empty() {
            // elite_count 0 and a generation with no feasible offspring
            result.status = SolverStatus::Error;
            result.observations = "genetic: generation emptied out".into();
            tracing::debug!("{}", result.observations);
            break;
        }
        population.sort_by(|a, b| a.fitness.total_cmp(&b.fitness));

        let improvement = if population[0].fitness < best.fitness {
            let gain = best.fitness - population[0].fitness;
            best = population[0].clone();
            gain
        } else {
            0.0
        };
        generation += 1;

        if stagnation.observe(improvement) {
            result.status = SolverStatus::Stagnation;
            result.observations = format!(
                "genetic: stagnation after {} generations without improvement",
                stagnation.consecutive()
            );
            tracing::debug!("{}", result.observations);
            break;
        }
    }

    result.runtime = deadline.elapsed();
    result.iterations = generation;

    if evaluator.evaluate(&best.candidate).is_scheduled() {
        result.schedule_state = evaluator.state();
        result.metrics = evaluator.metrics();
        result.best = best.candidate;
    } else {
        result.status = SolverStatus::Error;
        result.observations = "genetic: best individual lost feasibility".into();
        tracing::debug!("{}", result.observations);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use mist_sched_model::instance::{
        ConnectionSpec, InstanceBuilder, NodeSpec, NodeType, TaskSpec,
    };
    use mist_sched_model::prelude::Instance;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn instance() -> Instance {
        let mut b = InstanceBuilder::new("ga-small");
        for (id, cost) in [("e0", 1), ("e1", 3)] {
            b.add_node(NodeSpec {
                id: id.into(),
                label: id.into(),
                kind: NodeType::Edge,
                memory: 100,
                cost,
                utilisation: 1.0,
            });
        }
        b.add_connection(ConnectionSpec {
            id: "l".into(),
            from: "e0".into(),
            to: "e1".into(),
            delay: 3,
            bidirectional: true,
        });
        for id in ["a", "b", "c", "d"] {
            b.add_task(TaskSpec {
                id: id.into(),
                label: id.into(),
                mist: false,
                computation: 2,
                period: 40,
                deadline: 0,
                activation: 0,
                memory: 5,
                fixed_node_id: None,
                successors: Vec::new(),
            });
        }
        b.add_precedence("a", "b");
        b.add_precedence("b", "d");
        b.build().unwrap()
    }

    fn config() -> SolverConfig {
        let mut config = SolverConfig::default();
        config.genetic_algorithm.population_size = 10;
        config.genetic_algorithm.max_generations = 30;
        config.genetic_algorithm.stagnation_limit = 0;
        config
    }

    #[test]
    fn test_genetic_returns_a_feasible_best() {
        let instance = instance();
        let mut evaluator = Evaluator::new(&instance);
        let mut rng = ChaCha8Rng::seed_from_u64(31);
        let result = run(&mut evaluator, &config(), &mut rng);
        assert_eq!(result.status, SolverStatus::Completed);
        assert!(result.schedule_state.is_scheduled());
        assert_eq!(result.iterations, 30);
        assert!(result.metrics.is_some());
    }

    #[test]
    fn test_genetic_is_reproducible_for_equal_seeds() {
        let instance = instance();
        let run_once = || {
            let mut evaluator = Evaluator::new(&instance);
            let mut rng = ChaCha8Rng::seed_from_u64(32);
            run(&mut evaluator, &config(), &mut rng)
        };
        let a = run_once();
        let b = run_once();
        assert_eq!(a.best, b.best);
        assert_eq!(a.metrics, b.metrics);
    }

    #[test]
    fn test_infeasible_bootstrap_is_reported() {
        let mut b = InstanceBuilder::new("ga-impossible");
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
            memory: 50,
            fixed_node_id: None,
            successors: Vec::new(),
        });
        let instance = b.build().unwrap();
        let mut evaluator = Evaluator::new(&instance);
        let mut rng = ChaCha8Rng::seed_from_u64(33);
        let mut config = config();
        config.genetic_algorithm.max_init_tries = 20;
        let result = run(&mut evaluator, &config, &mut rng);
        assert_eq!(result.status, SolverStatus::InitializationNotFeasible);
    }

    #[test]
    fn test_crossover_respects_fixed_allocations() {
        let mut b = InstanceBuilder::new("ga-pin");
        for (id, kind) in [("m0", NodeType::Mist), ("e0", NodeType::Edge)] {
            b.add_node(NodeSpec {
                id: id.into(),
                label: id.into(),
                kind,
                memory: 100,
                cost: 1,
                utilisation: 1.0,
            });
        }
        b.add_task(TaskSpec {
            id: "pinned".into(),
            label: "pinned".into(),
            mist: true,
            computation: 1,
            period: 10,
            deadline: 0,
            activation: 0,
            memory: 1,
            fixed_node_id: Some("m0".into()),
            successors: Vec::new(),
        });
        let instance = b.build().unwrap();
        let evaluator = Evaluator::new(&instance);
        let mut rng = ChaCha8Rng::seed_from_u64(34);

        let m0 = instance.node_index("m0").unwrap();
        let e0 = instance.node_index("e0").unwrap();
        let mut p1 = Candidate::new(1);
        p1.assignments[0] = Some(e0);
        let p2 = p1.clone();
        for _ in 0..20 {
            let child = crossover(&evaluator, &p1, &p2, &mut rng);
            assert_eq!(child.assignments[0], Some(m0));
        }
    }
}
