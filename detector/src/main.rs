//! Memory leak checks for CI.
//!
//! Drives a maestro UI flow and captures a memory graph with `leaks`, or scans
//! a folder of existing graphs, then reports leaks through Danger.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::error;

use leaks_detector::core::types::SourceKind;
use leaks_detector::detect::{DetectArgs, run_detection};
use leaks_detector::exit_codes;
use leaks_detector::io::config::{DetectorConfig, load_config};
use leaks_detector::io::shell::SystemShell;
use leaks_detector::logging;

#[derive(Parser, Debug)]
#[command(
    name = "leaks-detector",
    version,
    about = "Check a process or a folder of memory graphs for leaks and report them through Danger"
)]
struct Cli {
    /// The name of the running process
    #[arg(long)]
    process_name: String,

    /// The testing tools you want to use. Current support types are: maestro, file
    #[arg(short, long, value_enum)]
    executor_type: SourceKind,

    /// The path to the maestro ui testing yaml file
    #[arg(long, value_name = "PATH")]
    maestro_flow_path: Option<PathBuf>,

    /// The path to the Dangerfile
    #[arg(short, long, value_name = "PATH")]
    danger_path: PathBuf,

    /// The path to the Diagnostics folder with the memgraphs
    #[arg(short = 'f', long, value_name = "DIR")]
    diagnostics_folder_path: Option<PathBuf>,

    /// Optional TOML config overriding tool names, paths, and report commands
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,
}

impl Cli {
    fn detect_args(&self) -> DetectArgs {
        DetectArgs {
            process_name: self.process_name.clone(),
            kind: self.executor_type,
            maestro_flow_path: self.maestro_flow_path.clone(),
            danger_path: self.danger_path.clone(),
            diagnostics_folder: self.diagnostics_folder_path.clone(),
        }
    }
}

fn main() {
    logging::init();
    let cli = Cli::parse();
    if let Err(err) = run(&cli) {
        error!("{err:#}");
        std::process::exit(exit_codes::FAILURE);
    }
    std::process::exit(exit_codes::OK);
}

fn run(cli: &Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => DetectorConfig::default(),
    };
    let shell = SystemShell::new(config.command_timeout(), config.output_limit_bytes);
    run_detection(&cli.detect_args(), &config, &shell)?;
    Ok(())
}
