//! Shared deterministic types for the detector pipeline.
//!
//! These types define stable contracts between the orchestrator and the leak
//! sources. They do not depend on external state or I/O.

use std::fmt;
use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Where the memory graphs come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Drive a maestro UI flow, then capture a fresh graph from the live process.
    Maestro,
    /// Scan a folder of pre-existing `.memgraph` files.
    File,
}

impl SourceKind {
    /// Fixed step list executed for this kind, in order.
    pub fn steps(self) -> &'static [Step] {
        match self {
            SourceKind::Maestro => &[Step::Simulate, Step::Capture, Step::Analyze],
            SourceKind::File => &[Step::Analyze],
        }
    }

    pub fn runs(self, step: Step) -> bool {
        self.steps().contains(&step)
    }

    pub const fn supported_kinds() -> &'static str {
        "Current support types are: maestro, file"
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Maestro => f.write_str("maestro"),
            SourceKind::File => f.write_str("file"),
        }
    }
}

/// One stage of the detection pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Simulate,
    Capture,
    Analyze,
}

/// Result of analyzing a single memory graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphOutcome {
    /// No leaks were found (or no summary line was present).
    Clean,
    /// Leaks were found; `reported` is false when the report commands failed.
    Leaking { count: u64, reported: bool },
    /// `leaks` failed without producing output; the chain stopped here.
    Aborted { message: String },
}

/// Per-graph outcome recorded by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphResult {
    pub graph: PathBuf,
    pub outcome: GraphOutcome,
}

/// Everything one detector run analyzed, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetectionSummary {
    pub graphs: Vec<GraphResult>,
}

impl DetectionSummary {
    pub fn record(&mut self, graph: PathBuf, outcome: GraphOutcome) {
        self.graphs.push(GraphResult { graph, outcome });
    }

    /// Total leaks across every analyzed graph.
    pub fn total_leaks(&self) -> u64 {
        self.graphs
            .iter()
            .map(|result| match result.outcome {
                GraphOutcome::Leaking { count, .. } => count,
                _ => 0,
            })
            .sum()
    }

    pub fn leaking_graphs(&self) -> usize {
        self.graphs
            .iter()
            .filter(|result| matches!(result.outcome, GraphOutcome::Leaking { .. }))
            .count()
    }

    pub fn unreported_graphs(&self) -> usize {
        self.graphs
            .iter()
            .filter(|result| {
                matches!(
                    result.outcome,
                    GraphOutcome::Leaking {
                        reported: false,
                        ..
                    }
                )
            })
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maestro_runs_every_step() {
        assert_eq!(
            SourceKind::Maestro.steps(),
            &[Step::Simulate, Step::Capture, Step::Analyze]
        );
    }

    #[test]
    fn file_only_analyzes() {
        assert!(!SourceKind::File.runs(Step::Simulate));
        assert!(!SourceKind::File.runs(Step::Capture));
        assert!(SourceKind::File.runs(Step::Analyze));
    }

    #[test]
    fn summary_totals_only_leaking_graphs() {
        let mut summary = DetectionSummary::default();
        summary.record("a.memgraph".into(), GraphOutcome::Clean);
        summary.record(
            "b.memgraph".into(),
            GraphOutcome::Leaking {
                count: 3,
                reported: true,
            },
        );
        summary.record(
            "c.memgraph".into(),
            GraphOutcome::Leaking {
                count: 2,
                reported: false,
            },
        );

        assert_eq!(summary.total_leaks(), 5);
        assert_eq!(summary.leaking_graphs(), 2);
        assert_eq!(summary.unreported_graphs(), 1);
    }
}
