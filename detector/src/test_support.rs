//! Test-only helpers: a scripted shell and canned command outputs.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};

use crate::io::process::CommandOutput;
use crate::io::shell::{Invocation, Shell};

/// Output of a command that exited with `exit_code`.
pub fn output(exit_code: i32, stdout: &str, stderr: &str) -> CommandOutput {
    CommandOutput {
        exit_code: Some(exit_code),
        stdout: stdout.as_bytes().to_vec(),
        stderr: stderr.as_bytes().to_vec(),
        stdout_truncated: 0,
        stderr_truncated: 0,
        timed_out: false,
    }
}

/// Successful command printing `stdout`.
pub fn success(stdout: &str) -> CommandOutput {
    output(0, stdout, "")
}

/// Failed command.
pub fn failure(exit_code: i32, stdout: &str, stderr: &str) -> CommandOutput {
    output(exit_code, stdout, stderr)
}

/// `leaks -q` output for a graph with `count` leaks; `leaks` exits 1 when it
/// finds any.
pub fn leaks_output(count: u64) -> CommandOutput {
    let stdout = format!(
        "Process 4242: 12345 nodes malloced for 2048 KB\nProcess 4242: {count} leaks for {} total leaked bytes.\n",
        count * 64
    );
    output(if count > 0 { 1 } else { 0 }, &stdout, "")
}

/// Shell that replays queued outputs in order and records every invocation.
///
/// Running out of queued outputs is an error, so unexpected commands fail the
/// test instead of silently succeeding.
#[derive(Debug, Default)]
pub struct ScriptedShell {
    outputs: RefCell<VecDeque<Result<CommandOutput, String>>>,
    invocations: RefCell<Vec<Invocation>>,
    inspect_path: Option<PathBuf>,
    inspected: RefCell<Vec<Option<String>>>,
}

impl ScriptedShell {
    pub fn new(outputs: Vec<CommandOutput>) -> Self {
        Self {
            outputs: RefCell::new(outputs.into_iter().map(Ok).collect()),
            ..Self::default()
        }
    }

    /// Queue a spawn error (the program could not be started).
    pub fn then_spawn_error(self, message: &str) -> Self {
        self.outputs.borrow_mut().push_back(Err(message.to_string()));
        self
    }

    /// Snapshot the contents of `path` each time a command runs.
    pub fn inspect_file(mut self, path: &Path) -> Self {
        self.inspect_path = Some(path.to_path_buf());
        self
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.borrow().clone()
    }

    /// Recorded invocations rendered as `program arg1 arg2`.
    pub fn command_lines(&self) -> Vec<String> {
        self.invocations
            .borrow()
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    /// Contents of the inspected file at each command, `None` when absent.
    pub fn inspected_contents(&self) -> Vec<Option<String>> {
        self.inspected.borrow().clone()
    }

    pub fn remaining(&self) -> usize {
        self.outputs.borrow().len()
    }
}

impl Shell for ScriptedShell {
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput> {
        self.invocations.borrow_mut().push(invocation.clone());
        if let Some(path) = &self.inspect_path {
            self.inspected
                .borrow_mut()
                .push(fs::read_to_string(path).ok());
        }
        match self.outputs.borrow_mut().pop_front() {
            Some(Ok(output)) => Ok(output),
            Some(Err(message)) => Err(anyhow!(message)),
            None => Err(anyhow!("unexpected command `{invocation}`")),
        }
    }
}

/// Diagnostics folder populated with empty files named `names`.
pub fn diagnostics_folder(names: &[&str]) -> Result<tempfile::TempDir> {
    let dir = tempfile::tempdir()?;
    for name in names {
        fs::write(dir.path().join(name), b"")?;
    }
    Ok(dir)
}
