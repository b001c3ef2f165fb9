//! CLI front-end for the benchmark harness: loads a configuration file,
//! builds the problem grid and solver list it describes, and runs them.

use clap::Parser;
use eikonal_march::{Benchmark, BenchmarkConfig, EikonalError};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "fm_benchmark", about = "Runs Eikonal solver benchmarks from a config file")]
struct Cli {
    /// Path to the INI-style benchmark configuration file.
    config: PathBuf,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match run(&cli.config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("fm_benchmark: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(config_path: &PathBuf) -> Result<(), EikonalError> {
    let config = BenchmarkConfig::from_file(config_path)?;
    tracing::info!(ndims = config.ndims, runs = config.runs, "loaded benchmark configuration");

    match config.ndims {
        2 => {
            let mut benchmark = Benchmark::<2>::from_config(&config);
            benchmark.run()?;
        }
        3 => {
            let mut benchmark = Benchmark::<3>::from_config(&config);
            benchmark.run()?;
        }
        other => {
            return Err(EikonalError::Configuration(format!(
                "unsupported dimension count {other}"
            )))
        }
    }
    Ok(())
}
