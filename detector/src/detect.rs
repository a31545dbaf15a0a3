//! Orchestration for a `leaks-detector` run.
//!
//! Steps run in a fixed order gated by [`SourceKind::steps`]:
//! simulate the UI flow, capture a graph, then analyze graphs until the
//! source's cursor wraps. Simulation and capture failures are fatal; a failed
//! report submission is not (unless configured), and `leaks` failing without
//! output only stops the chain.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

use crate::core::leak_count::extract_leak_count;
use crate::core::types::{DetectionSummary, GraphOutcome, SourceKind, Step};
use crate::io::config::DetectorConfig;
use crate::io::process::CommandOutput;
use crate::io::report::{ReportEmitter, ReportOutcome};
use crate::io::shell::{Invocation, Shell, ShellFailure};
use crate::io::source::{LeakSource, SourceParams, build_source};

/// Inputs for one detector run, as given on the command line.
#[derive(Debug, Clone)]
pub struct DetectArgs {
    pub process_name: String,
    pub kind: SourceKind,
    pub maestro_flow_path: Option<PathBuf>,
    pub danger_path: PathBuf,
    pub diagnostics_folder: Option<PathBuf>,
}

/// A leak report could not be submitted and `report.required` is set.
#[derive(Debug, Clone, Error)]
#[error("leak report for {} was not submitted: {message}", .graph.display())]
pub struct ReportNotSubmitted {
    pub graph: PathBuf,
    pub message: String,
}

/// How the `leaks` analysis output is read.
///
/// `leaks` exits non-zero whenever it finds leaks, so a failing exit status
/// with output present is the normal "leaks found" result, not a failure.
/// Only a failing exit with empty output means the analysis did not happen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisCapture {
    /// Analysis text to extract the leak count from.
    Report(String),
    /// `leaks` failed and printed nothing on stdout.
    Failed { message: String },
}

impl AnalysisCapture {
    pub fn classify(invocation: &Invocation, output: &CommandOutput) -> Self {
        let stdout = output.stdout_text();
        if !stdout.is_empty() || output.success() {
            return AnalysisCapture::Report(stdout);
        }
        let stderr = output.stderr_text();
        let message = if stderr.trim().is_empty() {
            ShellFailure::new(invocation, output).to_string()
        } else {
            stderr.trim().to_string()
        };
        AnalysisCapture::Failed { message }
    }
}

/// Build the source for `args` and run the pipeline.
///
/// Missing parameters fail here, before any command runs.
pub fn run_detection<S: Shell>(
    args: &DetectArgs,
    config: &DetectorConfig,
    shell: &S,
) -> Result<DetectionSummary> {
    let params = SourceParams {
        maestro_flow_path: args.maestro_flow_path.clone(),
        diagnostics_folder: args.diagnostics_folder.clone(),
        maestro_program: config.maestro_program.clone(),
        leaks_program: config.leaks_program.clone(),
        memgraph_path: config.resolved_memgraph_path(),
    };
    let mut source = build_source(args.kind, params).inspect_err(|err| {
        error!("❌ {err:#}. {}", SourceKind::supported_kinds());
    })?;
    let detector = Detector::new(args, config);
    detector.run(source.as_mut(), shell)
}

/// Pipeline driver over a prepared [`LeakSource`].
#[derive(Debug, Clone)]
pub struct Detector {
    process_name: String,
    leaks_program: String,
    emitter: ReportEmitter,
    report_required: bool,
}

impl Detector {
    pub fn new(args: &DetectArgs, config: &DetectorConfig) -> Self {
        Self {
            process_name: args.process_name.clone(),
            leaks_program: config.leaks_program.clone(),
            emitter: ReportEmitter::new(&args.danger_path, &config.report),
            report_required: config.report.required,
        }
    }

    pub fn emitter(&self) -> &ReportEmitter {
        &self.emitter
    }

    #[instrument(skip_all, fields(kind = %source.kind(), process_name = %self.process_name))]
    pub fn run<S: Shell>(&self, source: &mut dyn LeakSource, shell: &S) -> Result<DetectionSummary> {
        let kind = source.kind();
        let mut summary = DetectionSummary::default();
        info!(
            "Start looking for process with name: {}... 🔎",
            self.process_name
        );

        if kind.runs(Step::Simulate) {
            info!("Start running ui flow... 🎥");
            source.simulate_ui(shell).inspect_err(|err| {
                error!(
                    "❌ Something went wrong when trying to capture ui flow. {}",
                    failure_message(err)
                );
            })?;
        }

        if kind.runs(Step::Capture) {
            source
                .capture_graph(shell, &self.process_name)
                .inspect_err(|err| {
                    error!(
                        err = %format!("{err:#}"),
                        "❌ Can not find any process with name: {}", self.process_name
                    );
                })?;
            info!("Generate memgraph successfully for process 🚀");
        }

        if !kind.runs(Step::Analyze) {
            return Ok(summary);
        }

        loop {
            let graph = source.current_graph_path().to_path_buf();
            let outcome = self.check_graph(shell, &graph).inspect_err(|err| {
                error!(err = %format!("{err:#}"), "❌ Error occurs while checking for leaks");
            })?;
            let aborted = matches!(outcome, GraphOutcome::Aborted { .. });
            summary.record(graph, outcome);
            if aborted {
                break;
            }

            let Some(cursor) = source.cursor_mut() else {
                break;
            };
            if cursor.advance() == 0 {
                debug!("all graphs analyzed");
                break;
            }
        }

        info!(
            graphs = summary.graphs.len(),
            leaking = summary.leaking_graphs(),
            total_leaks = summary.total_leaks(),
            unreported = summary.unreported_graphs(),
            "detection finished"
        );
        Ok(summary)
    }

    /// Analyze one graph and report it when it leaks.
    #[instrument(skip_all, fields(graph = %graph.display()))]
    fn check_graph<S: Shell>(&self, shell: &S, graph: &Path) -> Result<GraphOutcome> {
        info!("Start checking for leaks... ⚙️");
        let invocation = Invocation::new(&self.leaks_program)
            .arg(graph.display().to_string())
            .arg("-q");
        let output = shell
            .run(&invocation)
            .with_context(|| format!("analyze {}", graph.display()))?;

        let text = match AnalysisCapture::classify(&invocation, &output) {
            AnalysisCapture::Report(text) => text,
            AnalysisCapture::Failed { message } => {
                error!("❌ Error: {message} ❌");
                return Ok(GraphOutcome::Aborted { message });
            }
        };

        let count = extract_leak_count(&text);
        if count == 0 {
            info!("Scan successfully. Didnt find any leaks in the memgraph:");
            info!("{} ✅", graph.display());
            return Ok(GraphOutcome::Clean);
        }

        warn!("Found leaks in the memgraph:");
        warn!(" {}! ❌", graph.display());
        info!("Generating reports... ⚙️");
        warn!(leaks = count, "🔎❌❌❌❌ Found {count} Leaks ❌❌❌❌🔎");

        let lines: Vec<&str> = text.split('\n').collect();
        let reported = match self.emitter.emit(shell, &lines)? {
            ReportOutcome::Submitted => true,
            ReportOutcome::Failed(message) => {
                if self.report_required {
                    bail!(ReportNotSubmitted {
                        graph: graph.to_path_buf(),
                        message,
                    });
                }
                false
            }
        };
        Ok(GraphOutcome::Leaking { count, reported })
    }
}

fn failure_message(err: &anyhow::Error) -> String {
    match err.downcast_ref::<ShellFailure>() {
        Some(failure) if !failure.message.trim().is_empty() => failure.message.trim().to_string(),
        _ => format!("{err:#}"),
    }
}
