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

use crate::eval::objective::{ScheduleMetrics, Tuning};
use crate::state::candidate::Candidate;
use crate::state::schedule::ScheduleState;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SolverMethod {
    RandomSearch,
    GeneticAlgorithm,
    SimulatedAnnealing,
}

impl std::fmt::Display for SolverMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SolverMethod::RandomSearch => write!(f, "Random Search"),
            SolverMethod::GeneticAlgorithm => write!(f, "Genetic Algorithm"),
            SolverMethod::SimulatedAnnealing => write!(f, "Simulated Annealing"),
        }
    }
}

/// How SA sharpens priorities after each accepted move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum RefinementMethod {
    #[serde(rename = "NORMAL")]
    NormalPerturbation,
    #[serde(rename = "PSO")]
    ParticleSwarm,
}

impl std::fmt::Display for RefinementMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RefinementMethod::NormalPerturbation => write!(f, "Normal Perturbation"),
            RefinementMethod::ParticleSwarm => write!(f, "Particle Swarm Optimization"),
        }
    }
}

/// Why a search run stopped. Distinct from [`ScheduleState`]: a run that
/// timed out may still carry a perfectly feasible best candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SolverStatus {
    NotStarted,
    Completed,
    Timeout,
    Stagnation,
    SolutionNotFound,
    InitializationNotFeasible,
    Error,
}

impl std::fmt::Display for SolverStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SolverStatus::NotStarted => write!(f, "Not Started"),
            SolverStatus::Completed => write!(f, "Completed"),
            SolverStatus::Timeout => write!(f, "Timeout"),
            SolverStatus::Stagnation => write!(f, "Stagnation"),
            SolverStatus::SolutionNotFound => write!(f, "Solution Not Found"),
            SolverStatus::InitializationNotFeasible => write!(f, "Initialization Not Feasible"),
            SolverStatus::Error => write!(f, "Error"),
        }
    }
}

/// Outcome of one `solve()` invocation: the best candidate found, its
/// terminal schedule state after a final re-evaluation, derived metrics and
/// the run's bookkeeping.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverResult {
    pub status: SolverStatus,
    pub instance_name: String,
    pub method: SolverMethod,
    /// Only SA refines priorities; the others report "N/A".
    pub refinement: Option<RefinementMethod>,
    pub schedule_state: ScheduleState,
    pub best: Candidate,
    pub tuning: Tuning,
    pub runtime: Duration,
    pub iterations: u64,
    pub metrics: Option<ScheduleMetrics>,
    pub observations: String,
}

impl SolverResult {
    pub fn not_started(
        instance_name: impl Into<String>,
        method: SolverMethod,
        refinement: Option<RefinementMethod>,
        tuning: Tuning,
        task_count: usize,
    ) -> Self {
        Self {
            status: SolverStatus::NotStarted,
            instance_name: instance_name.into(),
            method,
            refinement,
            schedule_state: ScheduleState::NotScheduled,
            best: Candidate::new(task_count),
            tuning,
            runtime: Duration::ZERO,
            iterations: 0,
            metrics: None,
            observations: String::new(),
        }
    }

    pub fn objective_value(&self) -> Option<f64> {
        self.metrics.as_ref().map(|m| self.tuning.objective(m))
    }

    pub fn csv_header() -> &'static str {
        "Date/time,Instance name,Alpha,Beta,Gamma,Solver method,Refinement method,\
         Runtime (ms),Iterations,Schedule span,Finish time sum,Processors cost,\
         Delay cost,Objective value,Schedule state\n"
    }

    /// One CSV record for the result log; the caller supplies the timestamp
    /// so records stay reproducible under test.
    pub fn csv_record(&self, timestamp: &str) -> String {
        let refinement = match self.refinement {
            Some(r) => r.to_string(),
            None => "N/A".to_string(),
        };
        let (span, sum, processors, delay) = match &self.metrics {
            Some(m) => (
                m.schedule_span,
                m.finish_time_sum,
                m.processors_cost,
                m.delay_cost,
            ),
            None => (-1, -1, -1, -1),
        };
        let objective = self
            .objective_value()
            .map_or_else(|| "-1".to_string(), |v| format!("{v}"));
        format!(
            "{timestamp},{},{},{},{},{},{refinement},{},{},{span},{sum},{processors},{delay},{objective},{}\n",
            self.instance_name,
            self.tuning.alpha,
            self.tuning.beta,
            self.tuning.gamma,
            self.method,
            self.runtime.as_millis(),
            self.iterations,
            self.schedule_state.tag(),
        )
    }
}

impl std::fmt::Display for SolverResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Solver Results:")?;
        writeln!(f, "  Solver Method: {}", self.method)?;
        if let Some(refinement) = self.refinement {
            writeln!(f, "  Refinement Method: {refinement}")?;
        }
        writeln!(f, "  Instance Name: {}", self.instance_name)?;
        writeln!(f, "  Status: {}", self.status)?;
        writeln!(
            f,
            "  Tuning: alpha={} beta={} gamma={}",
            self.tuning.alpha, self.tuning.beta, self.tuning.gamma
        )?;
        writeln!(f, "  Runtime (ms): {}", self.runtime.as_millis())?;
        writeln!(f, "  Iterations: {}", self.iterations)?;
        writeln!(f, "  Schedule State: {}", self.schedule_state)?;
        if let Some(m) = &self.metrics {
            writeln!(f, "  Schedule Span: {}", m.schedule_span)?;
            writeln!(f, "  Finish Time Sum: {}", m.finish_time_sum)?;
            writeln!(f, "  Processors Cost: {}", m.processors_cost)?;
            writeln!(f, "  Delay Cost: {}", m.delay_cost)?;
            if let Some(objective) = self.objective_value() {
                writeln!(f, "  Objective Value: {objective}")?;
            }
            writeln!(f, "  Best Candidate:")?;
            write!(f, "{}", self.best)?;
        }
        if !self.observations.is_empty() {
            writeln!(f, "  Observations: {}", self.observations)?;
        }
        Ok(())
    }
}
