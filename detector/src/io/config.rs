//! Detector configuration loaded from an optional TOML file (`--config`).

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// Detector configuration (TOML).
///
/// Every field has a default matching the command lines the CI scripts expect,
/// so the file is only needed to point at different binaries or paths.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DetectorConfig {
    /// Program used for both graph capture and analysis.
    pub leaks_program: String,

    /// Program used to drive UI flows.
    pub maestro_program: String,

    /// Where the maestro source writes its captured graph. A leading `~` is
    /// expanded against the home directory.
    pub memgraph_path: String,

    /// Per-command timeout in seconds. Unset means commands may run forever.
    pub command_timeout_secs: Option<u64>,

    /// Bytes of stdout/stderr kept per command.
    pub output_limit_bytes: usize,

    pub report: ReportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ReportConfig {
    /// Temporary report file, written next to the Dangerfile.
    pub file_name: String,

    /// Treat a failed report submission as fatal.
    pub required: bool,

    /// Commands run in order to submit the report.
    pub commands: Vec<Vec<String>>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            file_name: "temporary.txt".to_string(),
            required: false,
            commands: vec![
                vec!["yarn".to_string(), "--ignore-optional".to_string()],
                vec![
                    "yarn".to_string(),
                    "danger".to_string(),
                    "ci".to_string(),
                    "--id=MEMORY_LEAK_REPORT".to_string(),
                ],
            ],
        }
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            leaks_program: "leaks".to_string(),
            maestro_program: "maestro".to_string(),
            memgraph_path: "~/Desktop/Leaks.memgraph".to_string(),
            command_timeout_secs: None,
            output_limit_bytes: 10_000_000,
            report: ReportConfig::default(),
        }
    }
}

impl DetectorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.leaks_program.trim().is_empty() {
            return Err(anyhow!("leaks_program must be non-empty"));
        }
        if self.maestro_program.trim().is_empty() {
            return Err(anyhow!("maestro_program must be non-empty"));
        }
        if self.memgraph_path.trim().is_empty() {
            return Err(anyhow!("memgraph_path must be non-empty"));
        }
        if self.command_timeout_secs == Some(0) {
            return Err(anyhow!("command_timeout_secs must be > 0 when set"));
        }
        if self.output_limit_bytes == 0 {
            return Err(anyhow!("output_limit_bytes must be > 0"));
        }
        let file_name = Path::new(&self.report.file_name);
        if self.report.file_name.trim().is_empty()
            || file_name.file_name() != Some(file_name.as_os_str())
        {
            return Err(anyhow!("report.file_name must be a bare file name"));
        }
        if self
            .report
            .commands
            .iter()
            .any(|cmd| cmd.is_empty() || cmd[0].trim().is_empty())
        {
            return Err(anyhow!("report.commands entries must be non-empty arrays"));
        }
        Ok(())
    }

    pub fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout_secs.map(Duration::from_secs)
    }

    /// `memgraph_path` with `~` expanded.
    pub fn resolved_memgraph_path(&self) -> PathBuf {
        expand_home(&self.memgraph_path, dirs::home_dir().as_deref())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `DetectorConfig::default()`.
pub fn load_config(path: &Path) -> Result<DetectorConfig> {
    if !path.exists() {
        let cfg = DetectorConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: DetectorConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

fn expand_home(raw: &str, home: Option<&Path>) -> PathBuf {
    let Some(home) = home else {
        return PathBuf::from(raw);
    };
    if raw == "~" {
        return home.to_path_buf();
    }
    match raw.strip_prefix("~/") {
        Some(rest) => home.join(rest),
        None => PathBuf::from(raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, DetectorConfig::default());
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("leaks.toml");
        fs::write(
            &path,
            "command_timeout_secs = 600\n\n[report]\nrequired = true\n",
        )
        .expect("write");

        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg.command_timeout(), Some(Duration::from_secs(600)));
        assert!(cfg.report.required);
        assert_eq!(cfg.report.file_name, "temporary.txt");
        assert_eq!(cfg.leaks_program, "leaks");
    }

    #[test]
    fn default_report_commands_match_danger_invocation() {
        let cfg = DetectorConfig::default();
        assert_eq!(
            cfg.report.commands,
            vec![
                vec!["yarn", "--ignore-optional"],
                vec!["yarn", "danger", "ci", "--id=MEMORY_LEAK_REPORT"],
            ]
        );
    }

    #[test]
    fn rejects_nested_report_file() {
        let mut cfg = DetectorConfig::default();
        cfg.report.file_name = "reports/temporary.txt".to_string();
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("report.file_name"));
    }

    #[test]
    fn rejects_empty_report_command() {
        let mut cfg = DetectorConfig::default();
        cfg.report.commands.push(Vec::new());
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_zero_timeout() {
        let cfg = DetectorConfig {
            command_timeout_secs: Some(0),
            ..DetectorConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn expands_leading_tilde() {
        let home = Path::new("/Users/ci");
        assert_eq!(
            expand_home("~/Desktop/Leaks.memgraph", Some(home)),
            PathBuf::from("/Users/ci/Desktop/Leaks.memgraph")
        );
        assert_eq!(
            expand_home("/tmp/Leaks.memgraph", Some(home)),
            PathBuf::from("/tmp/Leaks.memgraph")
        );
        assert_eq!(
            expand_home("~/Leaks.memgraph", None),
            PathBuf::from("~/Leaks.memgraph")
        );
    }
}
