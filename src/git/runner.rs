use std::path::Path;
use std::process::{Command, Output, Stdio};

use crate::error::AuditError;

pub trait CommandRunner {
    /// Run `program` with `args`, with `dir` as the working directory.
    ///
    /// # Errors
    /// Returns an error if the process cannot be spawned or fails during
    /// execution.
    fn run(&self, dir: &Path, program: &str, args: &[&str]) -> std::io::Result<Output>;
}

pub struct DefaultCommandRunner;

impl CommandRunner for DefaultCommandRunner {
    fn run(&self, dir: &Path, program: &str, args: &[&str]) -> std::io::Result<Output> {
        Command::new(program)
            .current_dir(dir)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
    }
}

/// # Errors
/// Returns `ToolMissing` when `git` cannot be resolved on the search path;
/// the caller aborts before any branch processing.
pub fn ensure_git(runner: &dyn CommandRunner, dir: &Path) -> Result<(), AuditError> {
    match runner.run(dir, "git", &["--version"]) {
        Ok(out) if out.status.success() => Ok(()),
        Ok(out) => Err(AuditError::ToolMissing {
            tool: "git",
            detail: String::from_utf8_lossy(&out.stderr).trim().to_string(),
        }),
        Err(source) => Err(AuditError::ToolMissing {
            tool: "git",
            detail: source.to_string(),
        }),
    }
}

/// Probe for the GitHub CLI. Absence only disables pull request lookups.
pub fn hub_available(runner: &dyn CommandRunner, dir: &Path) -> bool {
    runner
        .run(dir, "gh", &["--version"])
        .map(|out| out.status.success())
        .unwrap_or(false)
}
