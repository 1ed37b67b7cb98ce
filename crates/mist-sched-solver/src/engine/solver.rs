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
use crate::engine::result::{SolverMethod, SolverResult};
use crate::engine::{annealing, genetic, random_search};
use crate::eval::evaluator::Evaluator;
use mist_sched_model::prelude::Instance;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Entry point for one search run. Owns the evaluator, the configuration
/// and the run's RNG; the RNG is seeded once here (from `misc.seed` when
/// pinned) and threaded through every search method.
#[derive(Debug)]
pub struct Solver<'i> {
    evaluator: Evaluator<'i>,
    config: SolverConfig,
    rng: ChaCha8Rng,
}

impl<'i> Solver<'i> {
    pub fn new(instance: &'i Instance, config: SolverConfig) -> Self {
        let rng = match config.misc.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_os_rng(),
        };
        Self {
            evaluator: Evaluator::new(instance),
            config,
            rng,
        }
    }

    /// Replace the run's RNG; tests inject a fixed-seed generator here.
    pub fn with_rng(mut self, rng: ChaCha8Rng) -> Self {
        self.rng = rng;
        self
    }

    #[inline]
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    #[inline]
    pub fn evaluator(&self) -> &Evaluator<'i> {
        &self.evaluator
    }

    /// Mutable access for seeding an imported schedule before `solve`.
    #[inline]
    pub fn evaluator_mut(&mut self) -> &mut Evaluator<'i> {
        &mut self.evaluator
    }

    pub fn solve(&mut self, method: SolverMethod) -> SolverResult {
        tracing::info!(
            instance = self.evaluator.instance().name(),
            %method,
            "starting solve"
        );
        let result = match method {
            SolverMethod::RandomSearch => random_search::run(
                &mut self.evaluator,
                &self.config.random_search,
                &self.config.tuning,
                &mut self.rng,
                true,
            ),
            SolverMethod::SimulatedAnnealing => {
                annealing::run(&mut self.evaluator, &self.config, &mut self.rng)
            }
            SolverMethod::GeneticAlgorithm => {
                genetic::run(&mut self.evaluator, &self.config, &mut self.rng)
            }
        };
        tracing::info!(
            status = %result.status,
            state = result.schedule_state.tag(),
            iterations = result.iterations,
            runtime_ms = result.runtime.as_millis() as u64,
            "solve finished"
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::result::SolverStatus;
    use mist_sched_model::instance::{InstanceBuilder, NodeSpec, NodeType, TaskSpec};
    use mist_sched_model::prelude::Instance;

    fn instance() -> Instance {
        let mut b = InstanceBuilder::new("solver-facade");
        for id in ["n0", "n1"] {
            b.add_node(NodeSpec {
                id: id.into(),
                label: id.into(),
                kind: NodeType::Edge,
                memory: 100,
                cost: 1,
                utilisation: 1.0,
            });
        }
        for id in ["a", "b"] {
            b.add_task(TaskSpec {
                id: id.into(),
                label: id.into(),
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
        b.build().unwrap()
    }

    fn seeded_config() -> SolverConfig {
        let mut config = SolverConfig::default();
        config.misc.seed = Some(99);
        config.random_search.max_iterations = 100;
        config.random_search.stagnation_limit = 0;
        config.simulated_annealing.max_iterations = 100;
        config.simulated_annealing.stagnation_limit = 0;
        config.genetic_algorithm.population_size = 6;
        config.genetic_algorithm.max_generations = 10;
        config.genetic_algorithm.stagnation_limit = 0;
        config
    }

    #[test]
    fn test_every_method_produces_a_feasible_result() {
        let instance = instance();
        for method in [
            SolverMethod::RandomSearch,
            SolverMethod::SimulatedAnnealing,
            SolverMethod::GeneticAlgorithm,
        ] {
            let mut solver = Solver::new(&instance, seeded_config());
            let result = solver.solve(method);
            assert_eq!(result.status, SolverStatus::Completed, "method {method}");
            assert!(result.schedule_state.is_scheduled(), "method {method}");
        }
    }

    #[test]
    fn test_config_seed_makes_runs_reproducible() {
        let instance = instance();
        let a = Solver::new(&instance, seeded_config()).solve(SolverMethod::RandomSearch);
        let b = Solver::new(&instance, seeded_config()).solve(SolverMethod::RandomSearch);
        assert_eq!(a.best, b.best);
        assert_eq!(a.metrics, b.metrics);
    }

    #[test]
    fn test_delay_weight_pulls_chained_tasks_together() {
        use mist_sched_model::instance::ConnectionSpec;

        let mut b = InstanceBuilder::new("beta");
        for id in ["n0", "n1"] {
            b.add_node(NodeSpec {
                id: id.into(),
                label: id.into(),
                kind: NodeType::Edge,
                memory: 100,
                cost: 1,
                utilisation: 1.0,
            });
        }
        b.add_connection(ConnectionSpec {
            id: "l".into(),
            from: "n0".into(),
            to: "n1".into(),
            delay: 25,
            bidirectional: true,
        });
        for id in ["a", "b"] {
            b.add_task(TaskSpec {
                id: id.into(),
                label: id.into(),
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
        let instance = b.build().unwrap();

        let mut config = seeded_config();
        config.tuning.alpha = 0.0;
        config.tuning.beta = 1.0;
        let mut solver = Solver::new(&instance, config);
        let result = solver.solve(SolverMethod::RandomSearch);
        assert_eq!(result.metrics.unwrap().delay_cost, 0);
        assert_eq!(result.best.assignments[0], result.best.assignments[1]);
    }

    #[test]
    fn test_objective_weights_steer_the_search() {
        // n1 is expensive in processors cost only when gamma is weighted
        let mut b = InstanceBuilder::new("weights");
        b.add_node(NodeSpec {
            id: "cheap".into(),
            label: "cheap".into(),
            kind: NodeType::Edge,
            memory: 100,
            cost: 1,
            utilisation: 1.0,
        });
        b.add_node(NodeSpec {
            id: "pricey".into(),
            label: "pricey".into(),
            kind: NodeType::Cloud,
            memory: 100,
            cost: 50,
            utilisation: 1.0,
        });
        b.add_task(TaskSpec {
            id: "t".into(),
            label: "t".into(),
            mist: false,
            computation: 2,
            period: 20,
            deadline: 0,
            activation: 0,
            memory: 5,
            fixed_node_id: None,
            successors: Vec::new(),
        });
        let instance = b.build().unwrap();

        let mut config = seeded_config();
        config.tuning.alpha = 0.0;
        config.tuning.gamma = 1.0;
        let mut solver = Solver::new(&instance, config);
        let result = solver.solve(SolverMethod::RandomSearch);
        assert_eq!(result.metrics.unwrap().processors_cost, 1);
        assert_eq!(
            result.best.assignments[0],
            instance.node_index("cheap")
        );
    }
}
