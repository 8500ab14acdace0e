//! Worker output classification.
//!
//! A well-behaved worker always prints `SUCCESS:<json>` or `ERROR:<text>`
//! before it exits, even when the Outlook operation itself failed. The marker
//! is authoritative; the exit code only matters when neither marker shows up.
//! `ERROR:` anywhere in the output outranks `SUCCESS:`, so a payload that
//! echoes the error marker is reported as a worker error.

use serde_json::Value;

use crate::error::{ProtocolViolation, WorkerError};

pub const SUCCESS_PREFIX: &str = "SUCCESS:";
pub const ERROR_PREFIX: &str = "ERROR:";

/// The three ways a worker invocation can end.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerOutcome {
    Success(Value),
    WorkerError(String),
    ProtocolViolation(ProtocolViolation),
}

impl WorkerOutcome {
    pub fn into_result(self) -> Result<Value, WorkerError> {
        match self {
            WorkerOutcome::Success(value) => Ok(value),
            WorkerOutcome::WorkerError(message) => Err(WorkerError::Reported(message)),
            WorkerOutcome::ProtocolViolation(v) => Err(WorkerError::Protocol(v)),
        }
    }
}

/// Classify one invocation's captured output.
///
/// The first `ERROR:` in `stdout` is checked before any `SUCCESS:`.
pub fn parse_output(stdout: &str, stderr: &str, exit_code: Option<i32>) -> WorkerOutcome {
    if let Some(at) = stdout.find(ERROR_PREFIX) {
        return WorkerOutcome::WorkerError(stdout[at + ERROR_PREFIX.len()..].trim().to_string());
    }

    match stdout.find(SUCCESS_PREFIX) {
        Some(at) => {
            let payload = stdout[at + SUCCESS_PREFIX.len()..].trim();
            match serde_json::from_str(payload) {
                Ok(value) => WorkerOutcome::Success(value),
                Err(e) => WorkerOutcome::ProtocolViolation(ProtocolViolation::MalformedPayload {
                    reason: e.to_string(),
                    payload: payload.to_string(),
                }),
            }
        }
        None if exit_code == Some(0) => {
            WorkerOutcome::ProtocolViolation(ProtocolViolation::Unexpected {
                stdout: stdout.to_string(),
            })
        }
        None => WorkerOutcome::ProtocolViolation(ProtocolViolation::NonZeroExit {
            code: exit_code,
            stderr: stderr.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_payload_decoded() {
        let out = "Microsoft (R) Windows Script Host\r\nSUCCESS: {\"emails\": []}\r\n";
        assert_eq!(
            parse_output(out, "", Some(0)),
            WorkerOutcome::Success(json!({ "emails": [] }))
        );
    }

    #[test]
    fn test_success_wins_over_exit_code() {
        let outcome = parse_output("SUCCESS:[1,2]", "warning", Some(1));
        assert_eq!(outcome, WorkerOutcome::Success(json!([1, 2])));
    }

    #[test]
    fn test_error_message_trimmed() {
        let outcome = parse_output("ERROR:   Event not found  \n", "", Some(0));
        assert_eq!(outcome, WorkerOutcome::WorkerError("Event not found".into()));
    }

    #[test]
    fn test_error_marker_outranks_success() {
        let out = r#"SUCCESS:{"body":"ERROR: printer jam"}"#;
        assert!(matches!(
            parse_output(out, "", Some(0)),
            WorkerOutcome::WorkerError(ref m) if m.starts_with("printer jam")
        ));

        let out = "ERROR: Outlook not running\nSUCCESS:{}";
        assert!(matches!(
            parse_output(out, "", Some(0)),
            WorkerOutcome::WorkerError(ref m) if m.starts_with("Outlook not running")
        ));
    }

    #[test]
    fn test_malformed_success_payload() {
        match parse_output("SUCCESS:{not json", "", Some(0)) {
            WorkerOutcome::ProtocolViolation(ProtocolViolation::MalformedPayload { payload, .. }) => {
                assert_eq!(payload, "{not json");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_no_marker_nonzero_exit() {
        let outcome = parse_output("", "Input Error: Can not find script file", Some(1));
        assert_eq!(
            outcome,
            WorkerOutcome::ProtocolViolation(ProtocolViolation::NonZeroExit {
                code: Some(1),
                stderr: "Input Error: Can not find script file".into(),
            })
        );
        assert!(matches!(
            parse_output("", "", None),
            WorkerOutcome::ProtocolViolation(ProtocolViolation::NonZeroExit { code: None, .. })
        ));
    }

    #[test]
    fn test_no_marker_clean_exit() {
        let outcome = parse_output("hello", "", Some(0));
        assert_eq!(
            outcome,
            WorkerOutcome::ProtocolViolation(ProtocolViolation::Unexpected {
                stdout: "hello".into()
            })
        );
    }

    #[test]
    fn test_into_result() {
        assert!(WorkerOutcome::Success(json!(1)).into_result().is_ok());
        assert!(matches!(
            WorkerOutcome::WorkerError("x".into()).into_result(),
            Err(WorkerError::Reported(_))
        ));
    }
}
