//! `searchInbox` worker: typed query and result decoding.

use serde::Deserialize;

use super::{Worker, WorkerOp, WorkerParams};
use crate::error::{ProtocolViolation, WorkerError};

/// Query for the `searchInbox` worker. Unset fields are omitted from the
/// command line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchInboxQuery {
    pub subject_contains: Option<String>,
    /// Semicolon-separated sender names or addresses
    pub from_addresses: Option<String>,
    pub to_addresses: Option<String>,
    /// Space-separated words, all must match
    pub body_contains: Option<String>,
    /// inbox (default), sent, drafts, or a subfolder name
    pub folder: Option<String>,
    /// MM/DD/YYYY
    pub received_after: Option<String>,
    /// MM/DD/YYYY
    pub received_before: Option<String>,
    pub limit: Option<u32>,
    pub include_body: bool,
}

impl SearchInboxQuery {
    pub fn subject_contains(subject: impl Into<String>) -> Self {
        Self {
            subject_contains: Some(subject.into()),
            ..Self::default()
        }
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn include_body(mut self) -> Self {
        self.include_body = true;
        self
    }

    pub fn to_params(&self) -> WorkerParams {
        WorkerParams::new()
            .with_opt("subjectContains", self.subject_contains.clone())
            .with_opt("fromAddresses", self.from_addresses.clone())
            .with_opt("toAddresses", self.to_addresses.clone())
            .with_opt("bodyContains", self.body_contains.clone())
            .with_opt("folder", self.folder.clone())
            .with_opt("receivedAfter", self.received_after.clone())
            .with_opt("receivedBefore", self.received_before.clone())
            .with_opt("limit", self.limit)
            .with("includeBody", self.include_body)
    }
}

/// One message as reported by `searchInbox`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboxMessage {
    #[serde(default, alias = "entryId")]
    pub id: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub from_email: String,
    #[serde(default)]
    pub from_name: String,
    /// Local time as Outlook renders it, e.g. "2/2/2026 03:17 PM"
    #[serde(default)]
    pub received: String,
    #[serde(default)]
    pub body: String,
}

#[derive(Debug, Deserialize)]
struct SearchInboxResponse {
    #[serde(default)]
    emails: Vec<InboxMessage>,
}

/// Run `searchInbox` and decode the matching messages.
pub fn search_inbox<W: Worker + ?Sized>(
    worker: &W,
    query: &SearchInboxQuery,
) -> Result<Vec<InboxMessage>, WorkerError> {
    let payload = worker.invoke(WorkerOp::SearchInbox, &query.to_params())?;
    let raw = payload.to_string();
    let response: SearchInboxResponse = serde_json::from_value(payload).map_err(|e| {
        WorkerError::Protocol(ProtocolViolation::MalformedPayload {
            reason: e.to_string(),
            payload: raw,
        })
    })?;
    Ok(response.emails)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::ParamValue;
    use serde_json::{json, Value};

    struct Canned(Value);

    impl Worker for Canned {
        fn invoke(&self, op: WorkerOp, _params: &WorkerParams) -> Result<Value, WorkerError> {
            assert_eq!(op, WorkerOp::SearchInbox);
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_query_params() {
        let params = SearchInboxQuery::subject_contains("Availability poll")
            .limit(100)
            .include_body()
            .to_params();
        assert_eq!(
            params.get("subjectContains"),
            Some(&ParamValue::Text("Availability poll".into()))
        );
        assert_eq!(params.get("limit"), Some(&ParamValue::Integer(100)));
        assert_eq!(params.get("includeBody"), Some(&ParamValue::Flag(true)));
        assert!(params.get("folder").is_none());
    }

    #[test]
    fn test_decodes_emails() {
        let worker = Canned(json!({
            "count": 1,
            "emails": [{
                "entryId": "00000000ABC",
                "subject": "RE: Availability poll",
                "fromEmail": "jane.doe@co.com",
                "fromName": "Jane Doe",
                "received": "2/2/2026 03:17 PM",
                "body": "1, 3"
            }]
        }));
        let emails = search_inbox(&worker, &SearchInboxQuery::default()).unwrap();
        assert_eq!(emails.len(), 1);
        assert_eq!(emails[0].id, "00000000ABC");
        assert_eq!(emails[0].from_email, "jane.doe@co.com");
        assert_eq!(emails[0].body, "1, 3");
    }

    #[test]
    fn test_missing_emails_key_is_empty() {
        let worker = Canned(json!({ "count": 0 }));
        assert!(search_inbox(&worker, &SearchInboxQuery::default())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_non_object_payload_is_protocol_error() {
        let worker = Canned(json!("done"));
        let err = search_inbox(&worker, &SearchInboxQuery::default()).unwrap_err();
        assert!(matches!(
            err,
            WorkerError::Protocol(ProtocolViolation::MalformedPayload { .. })
        ));
    }
}
