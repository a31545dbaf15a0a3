//! Leak sources: where memory graphs come from.
//!
//! A [`LeakSource`] can drive a UI flow, capture a graph from a running
//! process, and name the graph to analyze next. [`MaestroSource`] does all
//! three; [`FolderSource`] only walks pre-existing graphs in a folder.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use thiserror::Error;
use tracing::{info, instrument};

use crate::core::cursor::GraphCursor;
use crate::core::types::SourceKind;
use crate::io::shell::{Invocation, Shell, run_checked};

const MEMGRAPH_MARKER: &str = ".memgraph";

/// A parameter required by the selected source kind was not supplied.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("source kind `{kind}` needs {flag}")]
pub struct ParameterMissing {
    pub kind: SourceKind,
    pub flag: &'static str,
}

/// The diagnostics folder holds no `.memgraph` files.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("no .memgraph files found in {}", .folder.display())]
pub struct NoGraphsFound {
    pub folder: PathBuf,
}

/// Provider of memory graphs for the detection pipeline.
pub trait LeakSource {
    fn kind(&self) -> SourceKind;

    /// Drive the UI flow that should exercise the leaking code paths.
    fn simulate_ui(&self, shell: &dyn Shell) -> Result<()>;

    /// Capture a memory graph from the running process `process_name`.
    fn capture_graph(&self, shell: &dyn Shell, process_name: &str) -> Result<()>;

    /// Graph the next analysis should read.
    fn current_graph_path(&self) -> &Path;

    /// Cursor over several graphs, when the source holds more than one.
    fn cursor_mut(&mut self) -> Option<&mut GraphCursor> {
        None
    }
}

/// Inputs for [`build_source`], collected from CLI flags and config.
#[derive(Debug, Clone, Default)]
pub struct SourceParams {
    pub maestro_flow_path: Option<PathBuf>,
    pub diagnostics_folder: Option<PathBuf>,
    pub maestro_program: String,
    pub leaks_program: String,
    pub memgraph_path: PathBuf,
}

/// Create the source for `kind`, failing fast when a required parameter is absent.
///
/// No command runs here; the folder source only lists its directory.
pub fn build_source(kind: SourceKind, params: SourceParams) -> Result<Box<dyn LeakSource>> {
    match kind {
        SourceKind::Maestro => {
            let Some(flow_path) = params.maestro_flow_path else {
                bail!(ParameterMissing {
                    kind,
                    flag: "--maestro-flow-path",
                });
            };
            Ok(Box::new(MaestroSource {
                flow_path,
                maestro_program: params.maestro_program,
                leaks_program: params.leaks_program,
                memgraph_path: params.memgraph_path,
            }))
        }
        SourceKind::File => {
            let Some(folder) = params.diagnostics_folder else {
                bail!(ParameterMissing {
                    kind,
                    flag: "--diagnostics-folder-path",
                });
            };
            Ok(Box::new(FolderSource::scan(&folder)?))
        }
    }
}

/// UI-driven source: runs a maestro flow, then captures a fresh graph.
#[derive(Debug, Clone)]
pub struct MaestroSource {
    pub flow_path: PathBuf,
    pub maestro_program: String,
    pub leaks_program: String,
    pub memgraph_path: PathBuf,
}

impl MaestroSource {
    fn simulate_invocation(&self) -> Invocation {
        Invocation::new(&self.maestro_program)
            .arg("test")
            .arg(self.flow_path.display().to_string())
    }

    fn capture_invocation(&self, process_name: &str) -> Invocation {
        Invocation::new(&self.leaks_program)
            .arg(process_name)
            .arg(format!("--outputGraph={}", self.memgraph_path.display()))
    }
}

impl LeakSource for MaestroSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Maestro
    }

    #[instrument(skip_all, fields(flow = %self.flow_path.display()))]
    fn simulate_ui(&self, shell: &dyn Shell) -> Result<()> {
        run_checked(shell, &self.simulate_invocation()).context("simulate ui flow")?;
        Ok(())
    }

    #[instrument(skip_all, fields(process_name = %process_name))]
    fn capture_graph(&self, shell: &dyn Shell, process_name: &str) -> Result<()> {
        run_checked(shell, &self.capture_invocation(process_name))
            .with_context(|| format!("capture memory graph for {process_name}"))?;
        Ok(())
    }

    fn current_graph_path(&self) -> &Path {
        &self.memgraph_path
    }
}

/// Folder-scan source: iterates the `.memgraph` files of a diagnostics folder.
#[derive(Debug, Clone)]
pub struct FolderSource {
    cursor: GraphCursor,
}

impl FolderSource {
    /// List `folder` once; later additions to the folder are not seen.
    pub fn scan(folder: &Path) -> Result<Self> {
        let entries = fs::read_dir(folder)
            .with_context(|| format!("read diagnostics folder {}", folder.display()))?;
        let mut graphs = Vec::new();
        for entry in entries {
            let entry = entry.with_context(|| format!("read entry in {}", folder.display()))?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            info!(entry = %name, "found diagnostics entry");
            if name.contains(MEMGRAPH_MARKER) {
                graphs.push(entry.path());
            }
        }
        graphs.sort();
        let Some(cursor) = GraphCursor::new(graphs) else {
            bail!(NoGraphsFound {
                folder: folder.to_path_buf(),
            });
        };
        Ok(Self { cursor })
    }

    pub fn from_graphs(graphs: Vec<PathBuf>) -> Option<Self> {
        GraphCursor::new(graphs).map(|cursor| Self { cursor })
    }

    pub fn graphs(&self) -> &[PathBuf] {
        self.cursor.graphs()
    }
}

impl LeakSource for FolderSource {
    fn kind(&self) -> SourceKind {
        SourceKind::File
    }

    fn simulate_ui(&self, _shell: &dyn Shell) -> Result<()> {
        bail!("folder sources do not drive a UI flow")
    }

    fn capture_graph(&self, _shell: &dyn Shell, _process_name: &str) -> Result<()> {
        bail!("folder sources analyze existing graphs and cannot capture")
    }

    fn current_graph_path(&self) -> &Path {
        self.cursor.current()
    }

    fn cursor_mut(&mut self) -> Option<&mut GraphCursor> {
        Some(&mut self.cursor)
    }
}
