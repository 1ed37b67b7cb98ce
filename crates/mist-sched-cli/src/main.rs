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

mod report;

use clap::{Parser, ValueEnum};
use mist_sched_model::prelude::{Instance, load_dat_instance, load_json_instance};
use mist_sched_solver::engine::log::ResultLog;
use mist_sched_solver::engine::seed::import_csv_schedule;
use mist_sched_solver::prelude::{Solver, SolverConfig, SolverMethod};
use report::ReportFormat;
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SolverArg {
    Random,
    Genetic,
    Annealing,
}

impl From<SolverArg> for SolverMethod {
    fn from(value: SolverArg) -> Self {
        match value {
            SolverArg::Random => SolverMethod::RandomSearch,
            SolverArg::Genetic => SolverMethod::GeneticAlgorithm,
            SolverArg::Annealing => SolverMethod::SimulatedAnnealing,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputArg {
    Text,
    Json,
    Csv,
    Tab,
}

impl From<OutputArg> for ReportFormat {
    fn from(value: OutputArg) -> Self {
        match value {
            OutputArg::Text => ReportFormat::Text,
            OutputArg::Json => ReportFormat::Json,
            OutputArg::Csv => ReportFormat::Csv,
            OutputArg::Tab => ReportFormat::Tab,
        }
    }
}

/// Assign periodic, precedence-constrained tasks to a mist/edge/cloud
/// network and search for a schedule of minimum weighted cost.
#[derive(Debug, Parser)]
#[command(name = "mist-sched", version)]
struct Cli {
    /// Tasks JSON file; requires --network
    #[arg(short = 't', long, requires = "network", conflicts_with = "dat")]
    tasks: Option<PathBuf>,

    /// Network JSON file; requires --tasks
    #[arg(short = 'n', long, requires = "tasks", conflicts_with = "dat")]
    network: Option<PathBuf>,

    /// Single-file .dat instance
    #[arg(long)]
    dat: Option<PathBuf>,

    /// Read a seed schedule (CSV) from standard input
    #[arg(long)]
    init: bool,

    /// Search method
    #[arg(long, value_enum, default_value = "annealing")]
    solver: SolverArg,

    /// YAML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Report format written to standard output
    #[arg(long, value_enum, default_value = "text")]
    output: OutputArg,

    /// Configuration override, e.g. simulated_annealing.cooling_rate=0.99
    #[arg(long = "set", value_name = "KEY=VALUE")]
    set: Vec<String>,

    /// Verbose diagnostic output
    #[arg(long)]
    dbg: bool,
}

fn load_instance(cli: &Cli, config: &SolverConfig) -> Result<Instance, Box<dyn std::error::Error>> {
    let multi_hop = config.misc.multi_hop;
    match (&cli.tasks, &cli.network, &cli.dat) {
        (Some(tasks), Some(network), None) => {
            Ok(load_json_instance(tasks, network, multi_hop)?)
        }
        (None, None, Some(dat)) => Ok(load_dat_instance(dat, multi_hop)?),
        _ => Err("no instance given; use --tasks with --network, or --dat".into()),
    }
}

fn run(cli: &Cli) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => SolverConfig::from_yaml_path(path)?,
        None => SolverConfig::default(),
    };
    for spec in &cli.set {
        config.apply_override(spec)?;
    }

    let instance = load_instance(cli, &config)?;
    tracing::info!(%instance, "instance loaded");

    let log = config.misc.log_file.clone().map(ResultLog::new);
    let mut solver = Solver::new(&instance, config);

    if cli.init {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        let installed = import_csv_schedule(solver.evaluator_mut(), &text);
        if installed == 0 {
            tracing::warn!("--init given but no schedule rows could be imported");
        } else {
            tracing::info!(rows = installed, "seed schedule imported");
        }
    }

    let result = solver.solve(cli.solver.into());
    print!(
        "{}",
        report::render(&result, solver.evaluator(), cli.output.into())
    );

    if let Some(log) = &log {
        if let Err(e) = log.append(&result) {
            tracing::warn!(path = %log.path().display(), "could not append to result log: {e}");
        }
    }

    Ok(if result.schedule_state.is_scheduled() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.dbg { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
