use std::path::PathBuf;
use std::process::ExitStatus;

#[derive(Debug)]
pub enum AuditError {
    ToolMissing {
        tool: &'static str,
        detail: String,
    },
    CommandIo {
        command: String,
        source: std::io::Error,
    },
    CommandFailure {
        command: String,
        status: ExitStatus,
        stderr: String,
    },
    Json {
        command: String,
        source: serde_json::Error,
    },
    ReportWrite {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl std::fmt::Display for AuditError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ToolMissing { tool, detail } => {
                write!(f, "required tool '{tool}' is not available: {detail}")
            }
            Self::CommandIo { command, source } => {
                write!(f, "failed to launch '{command}': {source}")
            }
            Self::CommandFailure {
                command,
                status,
                stderr,
            } => {
                if stderr.is_empty() {
                    write!(f, "'{command}' failed with status {status}")
                } else {
                    write!(f, "'{command}' failed with status {status}: {stderr}")
                }
            }
            Self::Json { command, source } => {
                write!(f, "failed to parse output of '{command}': {source}")
            }
            Self::ReportWrite { path, source } => {
                write!(f, "failed to write report {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for AuditError {}
