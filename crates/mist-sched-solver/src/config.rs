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

use crate::engine::result::RefinementMethod;
use crate::eval::objective::Tuning;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Solver configuration: one section per search method plus the objective
/// tuning and miscellanea. Every key has a default; YAML files may set any
/// subset but unknown keys are rejected. `--set section.key=value`
/// overrides land here after the file is read.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolverConfig {
    pub tuning: Tuning,
    pub random_search: RandomSearchConfig,
    pub simulated_annealing: AnnealingConfig,
    pub genetic_algorithm: GeneticConfig,
    pub misc: MiscConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RandomSearchConfig {
    pub max_iterations: u64,
    /// Wall-clock budget in seconds.
    pub timeout: u64,
    pub stagnation_threshold: f64,
    pub stagnation_limit: u32,
    /// Per-task probability of reassignment / priority jitter per iteration.
    pub perturbation_rate: f64,
    /// Stop at the first feasible candidate; used to bootstrap SA and GA.
    pub break_on_first_feasible: bool,
}

impl Default for RandomSearchConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10_000,
            timeout: 60,
            stagnation_threshold: 1.0,
            stagnation_limit: 500,
            perturbation_rate: 0.3,
            break_on_first_feasible: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnnealingConfig {
    pub max_init_tries: u64,
    pub max_iterations: u64,
    pub timeout: u64,
    pub stagnation_threshold: f64,
    pub stagnation_limit: u32,
    pub max_neighbor_tries: u32,
    pub initial_temperature: f64,
    pub cooling_rate: f64,
    pub min_temperature: f64,
    pub refinement_priority_method: RefinementMethod,
    pub refinement_sigma_max: f64,
    pub refinement_sigma_min: f64,
    pub refinement_iterations: u32,
    pub pso_swarm_size: u32,
    pub refinement_pso_velocity_clamp: f64,
    pub refinement_pso_inertia_weight: f64,
    pub refinement_pso_cognitive_coef: f64,
    pub refinement_pso_social_coef: f64,
}

impl Default for AnnealingConfig {
    fn default() -> Self {
        Self {
            max_init_tries: 1_000,
            max_iterations: 5_000,
            timeout: 60,
            stagnation_threshold: 1.0,
            stagnation_limit: 200,
            max_neighbor_tries: 20,
            initial_temperature: 1_000.0,
            cooling_rate: 0.95,
            min_temperature: 1e-3,
            refinement_priority_method: RefinementMethod::NormalPerturbation,
            refinement_sigma_max: 0.2,
            refinement_sigma_min: 0.01,
            refinement_iterations: 30,
            pso_swarm_size: 12,
            refinement_pso_velocity_clamp: 0.5,
            refinement_pso_inertia_weight: 0.7,
            refinement_pso_cognitive_coef: 1.5,
            refinement_pso_social_coef: 1.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneticConfig {
    pub max_init_tries: u64,
    pub population_size: usize,
    pub max_generations: u64,
    pub timeout: u64,
    pub elite_count: usize,
    pub stagnation_threshold: f64,
    pub stagnation_limit: u32,
    pub mutation_rate: f64,
    pub crossover_rate: f64,
}

impl Default for GeneticConfig {
    fn default() -> Self {
        Self {
            max_init_tries: 200,
            population_size: 30,
            max_generations: 200,
            timeout: 60,
            elite_count: 2,
            stagnation_threshold: 1.0,
            stagnation_limit: 50,
            mutation_rate: 0.05,
            crossover_rate: 0.9,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MiscConfig {
    /// Append-only CSV of solve() outcomes; header written on creation.
    pub log_file: Option<PathBuf>,
    /// Pins the search RNG for reproducible runs.
    pub seed: Option<u64>,
    /// Relax the delay matrix to all-pairs shortest paths at load time.
    pub multi_hop: bool,
}

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Yaml { path: PathBuf, source: serde_yaml::Error },
    MissingSeparator(String),
    UnknownKey(String),
    InvalidValue {
        key: String,
        value: String,
        expected: &'static str,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use ConfigError::*;
        match self {
            Io { path, source } => write!(f, "could not read {}: {source}", path.display()),
            Yaml { path, source } => write!(f, "invalid config {}: {source}", path.display()),
            MissingSeparator(s) => write!(f, "invalid override {s:?} (expected key=value)"),
            UnknownKey(key) => write!(f, "unknown config key {key}"),
            InvalidValue { key, value, expected } => {
                write!(f, "invalid value {value:?} for {key} (expected {expected})")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Yaml { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl SolverConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(text).map_err(|source| ConfigError::Yaml {
            path: "<inline>".into(),
            source,
        })
    }

    pub fn from_yaml_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&text).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply one `section.key=value` override on top of the loaded file.
    pub fn apply_override(&mut self, spec: &str) -> Result<(), ConfigError> {
        let Some((key, value)) = spec.split_once('=') else {
            return Err(ConfigError::MissingSeparator(spec.to_string()));
        };

        fn parse<T: FromStr>(key: &str, value: &str, expected: &'static str) -> Result<T, ConfigError> {
            value.parse::<T>().map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                value: value.to_string(),
                expected,
            })
        }

        fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
            match value {
                "true" | "1" => Ok(true),
                "false" | "0" => Ok(false),
                _ => Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    value: value.to_string(),
                    expected: "bool",
                }),
            }
        }

        match key {
            "tuning.alpha" => self.tuning.alpha = parse(key, value, "float")?,
            "tuning.beta" => self.tuning.beta = parse(key, value, "float")?,
            "tuning.gamma" => self.tuning.gamma = parse(key, value, "float")?,

            "simulated_annealing.max_init_tries" => {
                self.simulated_annealing.max_init_tries = parse(key, value, "integer")?;
            }
            "simulated_annealing.max_iterations" => {
                self.simulated_annealing.max_iterations = parse(key, value, "integer")?;
            }
            "simulated_annealing.timeout" => {
                self.simulated_annealing.timeout = parse(key, value, "integer")?;
            }
            "simulated_annealing.stagnation_threshold" => {
                self.simulated_annealing.stagnation_threshold = parse(key, value, "float")?;
            }
            "simulated_annealing.stagnation_limit" => {
                self.simulated_annealing.stagnation_limit = parse(key, value, "integer")?;
            }
            "simulated_annealing.max_neighbor_tries" => {
                self.simulated_annealing.max_neighbor_tries = parse(key, value, "integer")?;
            }
            "simulated_annealing.initial_temperature" => {
                self.simulated_annealing.initial_temperature = parse(key, value, "float")?;
            }
            "simulated_annealing.cooling_rate" => {
                self.simulated_annealing.cooling_rate = parse(key, value, "float")?;
            }
            "simulated_annealing.min_temperature" => {
                self.simulated_annealing.min_temperature = parse(key, value, "float")?;
            }
            "simulated_annealing.refinement_priority_method" => {
                self.simulated_annealing.refinement_priority_method = match value {
                    "NORMAL" => RefinementMethod::NormalPerturbation,
                    "PSO" => RefinementMethod::ParticleSwarm,
                    _ => {
                        return Err(ConfigError::InvalidValue {
                            key: key.to_string(),
                            value: value.to_string(),
                            expected: "NORMAL or PSO",
                        });
                    }
                };
            }
            "simulated_annealing.refinement_sigma_max" => {
                self.simulated_annealing.refinement_sigma_max = parse(key, value, "float")?;
            }
            "simulated_annealing.refinement_sigma_min" => {
                self.simulated_annealing.refinement_sigma_min = parse(key, value, "float")?;
            }
            "simulated_annealing.refinement_iterations" => {
                self.simulated_annealing.refinement_iterations = parse(key, value, "integer")?;
            }
            "simulated_annealing.pso_swarm_size" => {
                self.simulated_annealing.pso_swarm_size = parse(key, value, "integer")?;
            }
            "simulated_annealing.refinement_pso_velocity_clamp" => {
                self.simulated_annealing.refinement_pso_velocity_clamp = parse(key, value, "float")?;
            }
            "simulated_annealing.refinement_pso_inertia_weight" => {
                self.simulated_annealing.refinement_pso_inertia_weight = parse(key, value, "float")?;
            }
            "simulated_annealing.refinement_pso_cognitive_coef" => {
                self.simulated_annealing.refinement_pso_cognitive_coef = parse(key, value, "float")?;
            }
            "simulated_annealing.refinement_pso_social_coef" => {
                self.simulated_annealing.refinement_pso_social_coef = parse(key, value, "float")?;
            }

            "random_search.max_iterations" => {
                self.random_search.max_iterations = parse(key, value, "integer")?;
            }
            "random_search.timeout" => {
                self.random_search.timeout = parse(key, value, "integer")?;
            }
            "random_search.stagnation_threshold" => {
                self.random_search.stagnation_threshold = parse(key, value, "float")?;
            }
            "random_search.stagnation_limit" => {
                self.random_search.stagnation_limit = parse(key, value, "integer")?;
            }
            "random_search.perturbation_rate" => {
                self.random_search.perturbation_rate = parse(key, value, "float")?;
            }
            "random_search.break_on_first_feasible" => {
                self.random_search.break_on_first_feasible = parse_bool(key, value)?;
            }

            "genetic_algorithm.max_init_tries" => {
                self.genetic_algorithm.max_init_tries = parse(key, value, "integer")?;
            }
            "genetic_algorithm.population_size" => {
                self.genetic_algorithm.population_size = parse(key, value, "integer")?;
            }
            "genetic_algorithm.max_generations" => {
                self.genetic_algorithm.max_generations = parse(key, value, "integer")?;
            }
            "genetic_algorithm.timeout" => {
                self.genetic_algorithm.timeout = parse(key, value, "integer")?;
            }
            "genetic_algorithm.elite_count" => {
                self.genetic_algorithm.elite_count = parse(key, value, "integer")?;
            }
            "genetic_algorithm.stagnation_threshold" => {
                self.genetic_algorithm.stagnation_threshold = parse(key, value, "float")?;
            }
            "genetic_algorithm.stagnation_limit" => {
                self.genetic_algorithm.stagnation_limit = parse(key, value, "integer")?;
            }
            "genetic_algorithm.mutation_rate" => {
                self.genetic_algorithm.mutation_rate = parse(key, value, "float")?;
            }
            "genetic_algorithm.crossover_rate" => {
                self.genetic_algorithm.crossover_rate = parse(key, value, "float")?;
            }

            "misc.log_file" => self.misc.log_file = Some(PathBuf::from(value)),
            "misc.seed" => self.misc.seed = Some(parse(key, value, "integer")?),
            "misc.multi_hop" => self.misc.multi_hop = parse_bool(key, value)?,

            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }

        tracing::debug!(key, value, "config override applied");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_documented_values() {
        let cfg = SolverConfig::default();
        assert_eq!(cfg.tuning.alpha, 1.0);
        assert_eq!(cfg.tuning.beta, 0.0);
        assert_eq!(cfg.random_search.max_iterations, 10_000);
        assert_eq!(cfg.simulated_annealing.cooling_rate, 0.95);
        assert_eq!(
            cfg.simulated_annealing.refinement_priority_method,
            RefinementMethod::NormalPerturbation
        );
        assert_eq!(cfg.genetic_algorithm.population_size, 30);
        assert!(cfg.misc.log_file.is_none());
        assert!(!cfg.misc.multi_hop);
    }

    #[test]
    fn test_yaml_sets_a_subset_and_keeps_defaults() {
        let cfg = SolverConfig::from_yaml_str(
            r#"
simulated_annealing:
  cooling_rate: 0.99
  refinement_priority_method: PSO
tuning:
  beta: 2.5
misc:
  log_file: runs.csv
  seed: 7
"#,
        )
        .unwrap();
        assert_eq!(cfg.simulated_annealing.cooling_rate, 0.99);
        assert_eq!(
            cfg.simulated_annealing.refinement_priority_method,
            RefinementMethod::ParticleSwarm
        );
        assert_eq!(cfg.simulated_annealing.max_iterations, 5_000);
        assert_eq!(cfg.tuning.beta, 2.5);
        assert_eq!(cfg.misc.log_file.as_deref(), Some(Path::new("runs.csv")));
        assert_eq!(cfg.misc.seed, Some(7));
    }

    #[test]
    fn test_unknown_yaml_keys_are_rejected() {
        let err = SolverConfig::from_yaml_str("random_search:\n  cooling_rate: 0.5\n").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml { .. }));

        let err = SolverConfig::from_yaml_str("annealing: {}\n").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml { .. }));
    }

    #[test]
    fn test_overrides_apply_with_dotted_keys() {
        let mut cfg = SolverConfig::default();
        cfg.apply_override("simulated_annealing.cooling_rate=0.99").unwrap();
        cfg.apply_override("random_search.break_on_first_feasible=true").unwrap();
        cfg.apply_override("tuning.gamma=3").unwrap();
        cfg.apply_override("misc.seed=42").unwrap();
        cfg.apply_override("simulated_annealing.refinement_priority_method=PSO")
            .unwrap();
        assert_eq!(cfg.simulated_annealing.cooling_rate, 0.99);
        assert!(cfg.random_search.break_on_first_feasible);
        assert_eq!(cfg.tuning.gamma, 3.0);
        assert_eq!(cfg.misc.seed, Some(42));
        assert_eq!(
            cfg.simulated_annealing.refinement_priority_method,
            RefinementMethod::ParticleSwarm
        );
    }

    #[test]
    fn test_override_errors_are_typed() {
        let mut cfg = SolverConfig::default();
        assert!(matches!(
            cfg.apply_override("no-separator").unwrap_err(),
            ConfigError::MissingSeparator(_)
        ));
        assert!(matches!(
            cfg.apply_override("random_search.unknown=1").unwrap_err(),
            ConfigError::UnknownKey(_)
        ));
        assert!(matches!(
            cfg.apply_override("tuning.alpha=lots").unwrap_err(),
            ConfigError::InvalidValue { .. }
        ));
        assert!(matches!(
            cfg.apply_override("simulated_annealing.refinement_priority_method=SWARM")
                .unwrap_err(),
            ConfigError::InvalidValue { .. }
        ));
    }
}
