//! Command-line entry point. Runs the full analysis against the built-in
//! simulated app; an optional argument names a JSON config file.

use std::path::Path;
use std::process::ExitCode;

use fesenda_core::pipeline::{run_pipeline, FesendaConfig};
use fesenda_explore::enforcement::FilePolicyChannel;
use fesenda_explore::sim::{demo_script, SimulatedOracle};
use tracing::error;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => match FesendaConfig::from_file(Path::new(&path)) {
            Ok(config) => config,
            Err(err) => {
                error!("{err}");
                return ExitCode::FAILURE;
            }
        },
        None => FesendaConfig::default(),
    };

    let mut oracle = SimulatedOracle::new(demo_script());
    let mut channel = FilePolicyChannel::new(config.policy_file.clone());
    match run_pipeline(&mut oracle, &mut channel, &config) {
        Ok(summaries) => {
            for summary in &summaries {
                println!("{summary}");
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}
