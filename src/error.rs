//! Error types for worker invocation and poll persistence
//!
//! Worker errors are classified by where the failure happened:
//! - Infrastructure: the worker could not be started at all
//! - WorkerReported: the worker ran and emitted an `ERROR:` marker
//! - Protocol: the worker ran but its output could not be interpreted
//! - InvalidInput: the parameters could not be marshalled onto a command line

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Why a worker's output did not follow the `SUCCESS:`/`ERROR:` protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolViolation {
    /// No marker, and the process exited non-zero (or was killed).
    NonZeroExit { code: Option<i32>, stderr: String },
    /// No marker, and the process exited cleanly.
    Unexpected { stdout: String },
    /// A `SUCCESS:` marker whose payload did not decode.
    MalformedPayload { reason: String, payload: String },
}

impl fmt::Display for ProtocolViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolViolation::NonZeroExit { code, stderr } => {
                let code = code.map_or_else(|| "signal".to_string(), |c| c.to_string());
                write!(f, "Script exited with code {}\n{}", code, stderr.trim())
            }
            ProtocolViolation::Unexpected { stdout } => {
                write!(f, "Unexpected script output: {}", stdout.trim())
            }
            ProtocolViolation::MalformedPayload { reason, .. } => {
                write!(f, "Failed to parse script output: {}", reason)
            }
        }
    }
}

/// Error types for a single worker invocation
#[derive(Debug, Error)]
pub enum WorkerError {
    // Infrastructure
    #[error("Worker script not found: {0}")]
    ScriptNotFound(PathBuf),

    #[error("Failed to start worker {worker}: {source}")]
    Spawn {
        worker: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to stage parameter '{name}' in a temp file: {source}")]
    Staging {
        name: String,
        #[source]
        source: std::io::Error,
    },

    // Input
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    // Worker said no
    #[error("Script error: {0}")]
    Reported(String),

    // Output could not be interpreted
    #[error("{0}")]
    Protocol(ProtocolViolation),
}

/// Coarse classification of a [`WorkerError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Infrastructure,
    WorkerReported,
    Protocol,
    InvalidInput,
}

impl WorkerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WorkerError::ScriptNotFound(_)
            | WorkerError::Spawn { .. }
            | WorkerError::Staging { .. } => ErrorKind::Infrastructure,
            WorkerError::InvalidParameter { .. } => ErrorKind::InvalidInput,
            WorkerError::Reported(_) => ErrorKind::WorkerReported,
            WorkerError::Protocol(_) => ErrorKind::Protocol,
        }
    }

    /// Get an operator-facing recovery suggestion
    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            WorkerError::ScriptNotFound(_) => {
                "Check scriptsDir in ~/.claude/poll-monitor.json points at the worker scripts."
            }
            WorkerError::Spawn { .. } => {
                "Check the interpreter is installed and on PATH (cscript.exe on Windows)."
            }
            WorkerError::Staging { .. } => "Check the temp directory is writable.",
            WorkerError::InvalidParameter { .. } => {
                "Pass parameters as strings, numbers or booleans."
            }
            WorkerError::Reported(_) => "Read the worker's message; Outlook may need attention.",
            WorkerError::Protocol(_) => "Run the worker script by hand and inspect its output.",
        }
    }
}

/// Persistence failures. Only surfaced by the `try_*` store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize polls document: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        let spawn = WorkerError::Spawn {
            worker: "searchInbox".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no cscript"),
        };
        assert_eq!(spawn.kind(), ErrorKind::Infrastructure);
        assert_eq!(
            WorkerError::Reported("Outlook closed".into()).kind(),
            ErrorKind::WorkerReported
        );
        assert_eq!(
            WorkerError::Protocol(ProtocolViolation::Unexpected { stdout: String::new() }).kind(),
            ErrorKind::Protocol
        );
    }

    #[test]
    fn test_protocol_messages_carry_diagnostics() {
        let err = WorkerError::Protocol(ProtocolViolation::NonZeroExit {
            code: Some(2),
            stderr: "Microsoft VBScript runtime error\n".into(),
        });
        let msg = err.to_string();
        assert!(msg.contains("code 2"));
        assert!(msg.contains("VBScript runtime error"));

        let killed = ProtocolViolation::NonZeroExit { code: None, stderr: String::new() };
        assert!(killed.to_string().contains("signal"));
    }

    #[test]
    fn test_recovery_suggestion_follows_failure() {
        let missing = WorkerError::ScriptNotFound(PathBuf::from("searchInbox.vbs"));
        assert!(missing.recovery_suggestion().contains("scriptsDir"));
        let spawn = WorkerError::Spawn {
            worker: "searchInbox".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no cscript"),
        };
        assert!(spawn.recovery_suggestion().contains("interpreter"));
        let reported = WorkerError::Reported("Outlook closed".into());
        assert!(reported.recovery_suggestion().contains("Outlook"));
    }

    #[test]
    fn test_reported_message_is_verbatim() {
        let err = WorkerError::Reported("Event not found".into());
        assert_eq!(err.to_string(), "Script error: Event not found");
    }
}
