use std::path::PathBuf;
use std::process;
use std::str::FromStr;

use clap::Parser;
use log::{error, info};

use tplex::cli::Cli;
use tplex::utils::{activate_logging, LogOnErr};
use tplex::{SolveReport, Solver, SolverConfig, TerminationStatus, TpInstance};

fn main() {
    let cli = Cli::parse();
    activate_logging(cli.verbose.log_level_filter());

    match run(cli) {
        Ok(status) => process::exit(status.exit_code()),
        Err(err) => {
            error!("{}", err);
            eprintln!("Program failed: {}", err);
            process::exit(-1);
        }
    }
}

fn run(cli: Cli) -> Result<TerminationStatus, Box<dyn std::error::Error>> {
    // Read the instance, tagging it with the file stem.
    let text = cli.instance.read_to_string()?;
    let mut instance = TpInstance::from_str(&text).log_on_err()?;
    instance.name = cli
        .instance
        .path_ref()
        .and_then(|p| p.file_stem())
        .and_then(|s| s.to_str())
        .unwrap_or("stdin")
        .to_string();
    instance.log_info();

    // Configuration file plus CLI overrides.
    let mut config = match &cli.config {
        Some(path) => SolverConfig::deserialize(path).log_on_err()?,
        None => SolverConfig::default(),
    };
    if let Some(mode) = cli.mode {
        config.alg_mode = mode;
    }
    if let Some(limit) = cli.time_limit {
        config.time_limit_secs = Some(limit);
    }
    info!(
        "Opt. config: algorithm {}, mode {}, W {}, W2 {}, time limit {:?} s, partition factor {}",
        config.algorithm.tag(),
        config.alg_mode,
        config.window_size_factor,
        config.window_size_2_factor,
        config.time_limit_secs,
        config.partition_factor
    );

    // Solve and write the result record.
    let mut solver = Solver::new(instance, config).log_on_err()?;
    let out_path = cli.out.clone().unwrap_or_else(|| {
        PathBuf::from(SolveReport::file_name(
            &solver.instance().name,
            solver.algorithm_tag().as_str(),
        ))
    });
    let report = solver.solve().log_on_err()?;
    report.write(&out_path).log_on_err()?;

    Ok(report.status)
}
