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

use crate::config::AnnealingConfig;
use crate::engine::random_search::objective_of;
use crate::engine::result::RefinementMethod;
use crate::eval::evaluator::Evaluator;
use crate::eval::objective::Tuning;
use crate::state::candidate::Candidate;
use rand::Rng;
use rand_distr::{Distribution, Normal};

/// Give up a refinement pass after this many consecutive non-improving
/// trials.
const MAX_NON_IMPROVING_TRIALS: u32 = 10;

/// Smallest velocity clamp the PSO variant cools down to.
const MIN_VELOCITY_CLAMP: f64 = 0.1;

/// Sharpen the priorities of an accepted SA move. Node assignments are
/// never touched; priorities only re-order tasks within each node's queue
/// at the next evaluation. `fitness` is updated in place when the pass
/// improves the candidate.
pub(crate) fn refine<R: Rng>(
    evaluator: &mut Evaluator<'_>,
    cfg: &AnnealingConfig,
    tuning: &Tuning,
    candidate: &mut Candidate,
    fitness: &mut f64,
    temperature: f64,
    rng: &mut R,
) {
    match cfg.refinement_priority_method {
        RefinementMethod::NormalPerturbation => {
            refine_normal(evaluator, cfg, tuning, candidate, fitness, temperature, rng);
        }
        RefinementMethod::ParticleSwarm => {
            refine_pso(evaluator, cfg, tuning, candidate, fitness, temperature, rng);
        }
    }
}

/// Hill-climb in priority space with temperature-scaled Gaussian steps:
/// wide early, narrow as the annealer cools.
fn refine_normal<R: Rng>(
    evaluator: &mut Evaluator<'_>,
    cfg: &AnnealingConfig,
    tuning: &Tuning,
    candidate: &mut Candidate,
    fitness: &mut f64,
    temperature: f64,
    rng: &mut R,
) {
    let scale = if cfg.initial_temperature > 0.0 {
        temperature / cfg.initial_temperature
    } else {
        0.0
    };
    let sigma = (cfg.refinement_sigma_max * scale).max(cfg.refinement_sigma_min);
    if sigma <= 0.0 {
        return;
    }
    let noise = Normal::new(0.0, sigma).expect("sigma is positive");

    let mut non_improving = 0u32;
    for _ in 0..cfg.refinement_iterations {
        let mut trial = candidate.clone();
        for priority in &mut trial.priorities {
            *priority = (*priority + noise.sample(rng)).clamp(0.0, 1.0);
        }

        let improved = evaluator.evaluate(&trial).is_scheduled()
            && match objective_of(evaluator, tuning) {
                Some(trial_fitness) if trial_fitness < *fitness => {
                    *candidate = trial;
                    *fitness = trial_fitness;
                    true
                }
                _ => false,
            };

        if improved {
            non_improving = 0;
        } else {
            non_improving += 1;
            if non_improving >= MAX_NON_IMPROVING_TRIALS {
                break;
            }
        }
    }
}

#[derive(Debug, Clone)]
struct Particle {
    position: Vec<f64>,
    velocity: Vec<f64>,
    best_position: Vec<f64>,
    best_fitness: f64,
}

/// One disposable swarm over priority space. Positions live in [0,1]^N,
/// velocities in [-clamp, clamp]^N with the clamp shrinking as the annealer
/// cools. The caller's candidate is only overwritten when the swarm's
/// global best beats it.
fn refine_pso<R: Rng>(
    evaluator: &mut Evaluator<'_>,
    cfg: &AnnealingConfig,
    tuning: &Tuning,
    candidate: &mut Candidate,
    fitness: &mut f64,
    temperature: f64,
    rng: &mut R,
) {
    let n = candidate.priorities.len();
    if n == 0 || cfg.pso_swarm_size == 0 {
        return;
    }

    let scale = if cfg.initial_temperature > 0.0 {
        temperature / cfg.initial_temperature
    } else {
        0.0
    };
    let clamp = (cfg.refinement_pso_velocity_clamp * scale).max(MIN_VELOCITY_CLAMP);

    // the swarm only explores priorities; assignments stay the caller's
    let mut probe = candidate.clone();
    let mut fitness_of = |position: &[f64], evaluator: &mut Evaluator<'_>| -> f64 {
        probe.priorities.copy_from_slice(position);
        if evaluator.evaluate(&probe).is_scheduled() {
            objective_of(evaluator, tuning).unwrap_or(f64::INFINITY)
        } else {
            f64::INFINITY
        }
    };

    let mut swarm: Vec<Particle> = (0..cfg.pso_swarm_size as usize)
        .map(|p| {
            // particle 0 starts at the caller's priorities
            let position: Vec<f64> = if p == 0 {
                candidate.priorities.clone()
            } else {
                (0..n).map(|_| rng.random::<f64>()).collect()
            };
            let velocity: Vec<f64> = (0..n).map(|_| rng.random_range(-1.0..1.0)).collect();
            Particle {
                best_position: position.clone(),
                best_fitness: f64::INFINITY,
                position,
                velocity,
            }
        })
        .collect();

    let mut global_best_position: Vec<f64> = candidate.priorities.clone();
    let mut global_best_fitness = f64::INFINITY;

    for particle in &mut swarm {
        let f = fitness_of(&particle.position, evaluator);
        particle.best_fitness = f;
        if f < global_best_fitness {
            global_best_fitness = f;
            global_best_position.copy_from_slice(&particle.position);
        }
    }

    for _ in 0..cfg.refinement_iterations {
        for particle in &mut swarm {
            for d in 0..n {
                let r1 = rng.random::<f64>();
                let r2 = rng.random::<f64>();
                let cognitive = cfg.refinement_pso_cognitive_coef
                    * r1
                    * (particle.best_position[d] - particle.position[d]);
                let social = cfg.refinement_pso_social_coef
                    * r2
                    * (global_best_position[d] - particle.position[d]);
                let v = cfg.refinement_pso_inertia_weight * particle.velocity[d]
                    + cognitive
                    + social;
                particle.velocity[d] = v.clamp(-clamp, clamp);
                particle.position[d] =
                    (particle.position[d] + particle.velocity[d]).clamp(0.0, 1.0);
            }

            let f = fitness_of(&particle.position, evaluator);
            if f < particle.best_fitness {
                particle.best_fitness = f;
                particle.best_position.copy_from_slice(&particle.position);
            }
            if f < global_best_fitness {
                global_best_fitness = f;
                global_best_position.copy_from_slice(&particle.position);
            }
        }
    }

    if global_best_fitness < *fitness {
        candidate.priorities.copy_from_slice(&global_best_position);
        *fitness = global_best_fitness;
    }
    // leave the evaluator holding the caller's candidate, not a probe
    evaluator.evaluate(candidate);
}
