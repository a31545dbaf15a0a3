//! Shell abstraction for external tool invocation.
//!
//! The [`Shell`] trait decouples the pipeline from the actual processes
//! (`leaks`, `maestro`, `yarn`). Commands are structured program + argument
//! lists; nothing is passed through `sh -c`. Tests use a scripted shell that
//! returns predetermined outputs without spawning processes.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use anyhow::{Context, Result};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::io::process::{CommandOutput, run_command};

/// A single external command: program, arguments, optional working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub workdir: Option<PathBuf>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            workdir: None,
        }
    }

    /// Build from an argv slice (`["yarn", "--ignore-optional"]`).
    ///
    /// Returns `None` for an empty slice.
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
            workdir: None,
        })
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.workdir = Some(dir.into());
        self
    }

    fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(dir) = &self.workdir {
            cmd.current_dir(dir);
        }
        cmd
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// A spawned command exited unsuccessfully.
///
/// `output` holds the captured stdout and `message` the captured stderr, so
/// callers can inspect what the tool printed before it failed.
#[derive(Debug, Clone, Error)]
#[error("`{command}` failed with exit code {exit_code:?}{}", timeout_note(.timed_out))]
pub struct ShellFailure {
    pub command: String,
    pub exit_code: Option<i32>,
    pub output: String,
    pub message: String,
    pub timed_out: bool,
}

fn timeout_note(timed_out: &bool) -> &'static str {
    if *timed_out { " (timed out)" } else { "" }
}

impl ShellFailure {
    pub fn new(invocation: &Invocation, output: &CommandOutput) -> Self {
        Self {
            command: invocation.to_string(),
            exit_code: output.exit_code,
            output: output.stdout_text(),
            message: output.stderr_text(),
            timed_out: output.timed_out,
        }
    }
}

/// Abstraction over process execution backends.
pub trait Shell {
    /// Run `invocation` to completion and capture its output.
    ///
    /// A non-zero exit is not an error here; only failing to run the command
    /// at all is. Use [`run_checked`] to turn non-zero exits into
    /// [`ShellFailure`].
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput>;
}

impl<S: Shell + ?Sized> Shell for &S {
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput> {
        (**self).run(invocation)
    }
}

/// Shell that spawns real child processes.
#[derive(Debug, Clone)]
pub struct SystemShell {
    pub timeout: Option<Duration>,
    pub output_limit_bytes: usize,
}

impl SystemShell {
    pub fn new(timeout: Option<Duration>, output_limit_bytes: usize) -> Self {
        Self {
            timeout,
            output_limit_bytes,
        }
    }
}

impl Shell for SystemShell {
    #[instrument(skip_all, fields(command = %invocation))]
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput> {
        debug!(workdir = ?invocation.workdir, "running command");
        run_command(
            invocation.to_command(),
            self.timeout,
            self.output_limit_bytes,
        )
        .with_context(|| format!("run `{invocation}`"))
    }
}

/// Run `invocation` and fail with [`ShellFailure`] on a non-zero exit.
pub fn run_checked<S: Shell + ?Sized>(shell: &S, invocation: &Invocation) -> Result<CommandOutput> {
    let output = shell.run(invocation)?;
    if !output.success() {
        return Err(ShellFailure::new(invocation, &output).into());
    }
    Ok(output)
}

/// Directory containing `path`, or `.` for a bare file name.
pub fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedShell {
        output: CommandOutput,
    }

    impl Shell for FixedShell {
        fn run(&self, _invocation: &Invocation) -> Result<CommandOutput> {
            Ok(self.output.clone())
        }
    }

    fn output(exit_code: i32, stdout: &str, stderr: &str) -> CommandOutput {
        CommandOutput {
            exit_code: Some(exit_code),
            stdout: stdout.as_bytes().to_vec(),
            stderr: stderr.as_bytes().to_vec(),
            stdout_truncated: 0,
            stderr_truncated: 0,
            timed_out: false,
        }
    }

    #[test]
    fn invocation_displays_as_argv() {
        let invocation = Invocation::new("leaks")
            .arg("MemoryLeaksCheck")
            .arg("--outputGraph=/tmp/Leaks.memgraph");
        assert_eq!(
            invocation.to_string(),
            "leaks MemoryLeaksCheck --outputGraph=/tmp/Leaks.memgraph"
        );
    }

    #[test]
    fn from_argv_splits_program() {
        let argv = vec!["yarn".to_string(), "--ignore-optional".to_string()];
        let invocation = Invocation::from_argv(&argv).expect("argv");
        assert_eq!(invocation.program, "yarn");
        assert_eq!(invocation.args, vec!["--ignore-optional".to_string()]);
        assert!(Invocation::from_argv(&[]).is_none());
    }

    #[test]
    fn run_checked_passes_success_through() {
        let shell = FixedShell {
            output: output(0, "ok", ""),
        };
        let out = run_checked(&shell, &Invocation::new("maestro")).expect("success");
        assert_eq!(out.stdout_text(), "ok");
    }

    #[test]
    fn run_checked_wraps_failures() {
        let shell = FixedShell {
            output: output(1, "partial", "no such process"),
        };
        let err = run_checked(&shell, &Invocation::new("leaks").arg("Nope")).unwrap_err();
        let failure = err.downcast_ref::<ShellFailure>().expect("shell failure");
        assert_eq!(failure.command, "leaks Nope");
        assert_eq!(failure.exit_code, Some(1));
        assert_eq!(failure.output, "partial");
        assert_eq!(failure.message, "no such process");
        assert!(err.to_string().contains("exit code Some(1)"));
    }

    #[test]
    fn parent_dir_of_bare_name_is_current_dir() {
        assert_eq!(parent_dir(Path::new("Dangerfile")), PathBuf::from("."));
        assert_eq!(
            parent_dir(Path::new("ci/Dangerfile.leaksReport")),
            PathBuf::from("ci")
        );
    }
}
