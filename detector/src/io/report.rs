//! Leak report submission through Danger.
//!
//! The analysis lines are dumped to a temporary file next to the Dangerfile so
//! the Dangerfile can read them, the report commands run, and the file is
//! removed again whatever the commands did.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{error, info, instrument, warn};

use crate::io::config::ReportConfig;
use crate::io::shell::{Invocation, Shell, parent_dir, run_checked};

/// How a report submission ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportOutcome {
    Submitted,
    /// A report command failed; the message is the error chain.
    Failed(String),
}

/// Writes the report file and runs the report commands.
#[derive(Debug, Clone)]
pub struct ReportEmitter {
    workdir: PathBuf,
    report_path: PathBuf,
    commands: Vec<Invocation>,
}

impl ReportEmitter {
    /// Emitter working in the directory that holds `danger_path`.
    pub fn new(danger_path: &Path, config: &ReportConfig) -> Self {
        let workdir = parent_dir(danger_path);
        let commands = config
            .commands
            .iter()
            .filter_map(|argv| Invocation::from_argv(argv))
            .map(|invocation| invocation.current_dir(&workdir))
            .collect();
        Self {
            report_path: workdir.join(&config.file_name),
            workdir,
            commands,
        }
    }

    pub fn report_path(&self) -> &Path {
        &self.report_path
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Submit `lines` as a leak report.
    ///
    /// Failing to write the report file is an error; a failing report command
    /// is returned as [`ReportOutcome::Failed`] for the caller to judge. The
    /// report file is removed in both cases.
    #[instrument(skip_all, fields(report = %self.report_path.display(), lines = lines.len()))]
    pub fn emit<S: Shell + ?Sized>(&self, shell: &S, lines: &[&str]) -> Result<ReportOutcome> {
        write_report_lines(&self.report_path, lines)?;

        let outcome = match self.run_commands(shell) {
            Ok(()) => {
                info!("Done ✅");
                ReportOutcome::Submitted
            }
            Err(err) => {
                error!(err = %format!("{err:#}"), "❌ Can not execute Danger");
                ReportOutcome::Failed(format!("{err:#}"))
            }
        };

        self.cleanup();
        Ok(outcome)
    }

    fn run_commands<S: Shell + ?Sized>(&self, shell: &S) -> Result<()> {
        for command in &self.commands {
            run_checked(shell, command).with_context(|| format!("report command `{command}`"))?;
        }
        Ok(())
    }

    fn cleanup(&self) {
        info!("Cleaning... 🧹");
        if let Err(err) = fs::remove_file(&self.report_path) {
            warn!(err = %err, path = %self.report_path.display(), "failed to remove report file");
        }
    }
}

/// Append each line to `path`, wrapped in double quotes.
pub fn write_report_lines(path: &Path, lines: &[&str]) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open report file {}", path.display()))?;
    let mut buf = String::new();
    for line in lines {
        buf.push('"');
        buf.push_str(line);
        buf.push_str("\"\n");
    }
    file.write_all(buf.as_bytes())
        .with_context(|| format!("write report file {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ScriptedShell, failure, success};

    fn emitter(dir: &Path) -> ReportEmitter {
        ReportEmitter::new(&dir.join("Dangerfile.leaksReport"), &ReportConfig::default())
    }

    #[test]
    fn writes_quoted_lines() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("temporary.txt");
        write_report_lines(&path, &["Process 42: 1 leak", "", "ROOT LEAK: <Foo>"]).expect("write");

        let contents = fs::read_to_string(&path).expect("read");
        assert_eq!(contents, "\"Process 42: 1 leak\"\n\"\"\n\"ROOT LEAK: <Foo>\"\n");
    }

    #[test]
    fn emit_runs_commands_in_dangerfile_dir_and_removes_file() {
        let temp = tempfile::tempdir().expect("tempdir");
        let emitter = emitter(temp.path());
        let report_path = emitter.report_path().to_path_buf();
        let shell = ScriptedShell::new(vec![success(""), success("")]).inspect_file(&report_path);

        let outcome = emitter.emit(&shell, &["2 leaks for 64 total leaked bytes"]).expect("emit");

        assert_eq!(outcome, ReportOutcome::Submitted);
        assert_eq!(
            shell.command_lines(),
            vec![
                "yarn --ignore-optional".to_string(),
                "yarn danger ci --id=MEMORY_LEAK_REPORT".to_string(),
            ]
        );
        assert!(
            shell
                .invocations()
                .iter()
                .all(|inv| inv.workdir.as_deref() == Some(temp.path()))
        );
        assert_eq!(
            shell.inspected_contents()[0].as_deref(),
            Some("\"2 leaks for 64 total leaked bytes\"\n")
        );
        assert!(!report_path.exists());
    }

    #[test]
    fn failed_command_is_reported_and_file_still_removed() {
        let temp = tempfile::tempdir().expect("tempdir");
        let emitter = emitter(temp.path());
        let shell = ScriptedShell::new(vec![failure(1, "", "yarn: command not found")]);

        let outcome = emitter.emit(&shell, &["1 leaks for 16 total leaked bytes"]).expect("emit");

        match outcome {
            ReportOutcome::Failed(message) => assert!(message.contains("yarn --ignore-optional")),
            other => panic!("expected failure, got {other:?}"),
        }
        // The danger command never runs once installing dependencies failed.
        assert_eq!(shell.invocations().len(), 1);
        assert!(!emitter.report_path().exists());
    }

    #[test]
    fn bare_dangerfile_name_uses_current_dir() {
        let emitter = ReportEmitter::new(Path::new("Dangerfile"), &ReportConfig::default());
        assert_eq!(emitter.workdir(), Path::new("."));
        assert_eq!(emitter.report_path(), Path::new("./temporary.txt"));
    }
}
