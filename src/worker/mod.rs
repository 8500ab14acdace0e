//! Outlook worker bridge.
//!
//! Each calendar/mail operation is an external script ("worker") that takes
//! `/name:value` flags on its command line and reports a single result on
//! stdout behind a `SUCCESS:` or `ERROR:` marker. This module holds the typed
//! side of that contract: operation names, parameter lists, and the [`Worker`]
//! seam the reconciler is written against.

pub mod inbox;
pub mod protocol;
pub mod runner;

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::error::WorkerError;

pub use protocol::{parse_output, WorkerOutcome};
pub use runner::ScriptRunner;

/// Anything that can run a worker operation and hand back its decoded payload.
///
/// `ScriptRunner` is the production implementation; tests substitute an
/// in-memory fake.
pub trait Worker {
    fn invoke(&self, op: WorkerOp, params: &WorkerParams) -> Result<Value, WorkerError>;
}

/// The worker scripts the bridge knows how to call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkerOp {
    ListEvents,
    CreateEvent,
    FindFreeSlots,
    GetAttendeeStatus,
    DeleteEvent,
    CancelEvent,
    UpdateEvent,
    GetCalendars,
    GetFreeBusy,
    FindAvailableRooms,
    SendEmail,
    SearchInbox,
    GetEmailContent,
    ResolveRecipient,
    ExpandDistributionList,
    AddAttendee,
    RemoveAttendee,
}

impl WorkerOp {
    pub const ALL: [WorkerOp; 17] = [
        WorkerOp::ListEvents,
        WorkerOp::CreateEvent,
        WorkerOp::FindFreeSlots,
        WorkerOp::GetAttendeeStatus,
        WorkerOp::DeleteEvent,
        WorkerOp::CancelEvent,
        WorkerOp::UpdateEvent,
        WorkerOp::GetCalendars,
        WorkerOp::GetFreeBusy,
        WorkerOp::FindAvailableRooms,
        WorkerOp::SendEmail,
        WorkerOp::SearchInbox,
        WorkerOp::GetEmailContent,
        WorkerOp::ResolveRecipient,
        WorkerOp::ExpandDistributionList,
        WorkerOp::AddAttendee,
        WorkerOp::RemoveAttendee,
    ];

    /// Script base name, as it appears on disk.
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerOp::ListEvents => "listEvents",
            WorkerOp::CreateEvent => "createEvent",
            WorkerOp::FindFreeSlots => "findFreeSlots",
            WorkerOp::GetAttendeeStatus => "getAttendeeStatus",
            WorkerOp::DeleteEvent => "deleteEvent",
            WorkerOp::CancelEvent => "cancelEvent",
            WorkerOp::UpdateEvent => "updateEvent",
            WorkerOp::GetCalendars => "getCalendars",
            WorkerOp::GetFreeBusy => "getFreeBusy",
            WorkerOp::FindAvailableRooms => "findAvailableRooms",
            WorkerOp::SendEmail => "sendEmail",
            WorkerOp::SearchInbox => "searchInbox",
            WorkerOp::GetEmailContent => "getEmailContent",
            WorkerOp::ResolveRecipient => "resolveRecipient",
            WorkerOp::ExpandDistributionList => "expandDistributionList",
            WorkerOp::AddAttendee => "addAttendee",
            WorkerOp::RemoveAttendee => "removeAttendee",
        }
    }
}

impl fmt::Display for WorkerOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkerOp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WorkerOp::ALL
            .iter()
            .copied()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| format!("Unknown worker: {}", s))
    }
}

/// A single parameter value as it will be rendered on the command line.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Flag(bool),
}

impl ParamValue {
    /// Flags count only when set; everything else only when it renders non-empty.
    pub fn is_present(&self) -> bool {
        match self {
            ParamValue::Flag(set) => *set,
            ParamValue::Text(s) => !s.is_empty(),
            ParamValue::Integer(_) | ParamValue::Float(_) => true,
        }
    }

    /// Rendered value. Flags carry no value suffix and render as `None`.
    pub fn render(&self) -> Option<String> {
        match self {
            ParamValue::Flag(_) => None,
            ParamValue::Text(s) => Some(s.clone()),
            ParamValue::Integer(n) => Some(n.to_string()),
            ParamValue::Float(n) => Some(n.to_string()),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::Text(s.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        ParamValue::Text(s)
    }
}

impl From<i64> for ParamValue {
    fn from(n: i64) -> Self {
        ParamValue::Integer(n)
    }
}

impl From<u32> for ParamValue {
    fn from(n: u32) -> Self {
        ParamValue::Integer(i64::from(n))
    }
}

impl From<f64> for ParamValue {
    fn from(n: f64) -> Self {
        ParamValue::Float(n)
    }
}

impl From<bool> for ParamValue {
    fn from(b: bool) -> Self {
        ParamValue::Flag(b)
    }
}

/// Insertion-ordered parameter list for one worker call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkerParams {
    entries: Vec<(String, ParamValue)>,
}

impl WorkerParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter, replacing any earlier value under the same name.
    pub fn with(mut self, name: &str, value: impl Into<ParamValue>) -> Self {
        self.set(name, value);
        self
    }

    /// Add an optional parameter; `None` leaves the list untouched.
    pub fn with_opt<V: Into<ParamValue>>(mut self, name: &str, value: Option<V>) -> Self {
        if let Some(v) = value {
            self.set(name, v);
        }
        self
    }

    pub fn set(&mut self, name: &str, value: impl Into<ParamValue>) {
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| k == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name.to_string(), value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.entries.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Tool arguments arrive as a JSON object and are forwarded verbatim.
impl TryFrom<&serde_json::Map<String, Value>> for WorkerParams {
    type Error = WorkerError;

    fn try_from(args: &serde_json::Map<String, Value>) -> Result<Self, Self::Error> {
        let mut params = WorkerParams::new();
        for (name, value) in args {
            let value = match value {
                Value::Null => continue,
                Value::Bool(b) => ParamValue::Flag(*b),
                Value::String(s) => ParamValue::Text(s.clone()),
                Value::Number(n) => match n.as_i64() {
                    Some(i) => ParamValue::Integer(i),
                    None => ParamValue::Float(n.as_f64().unwrap_or_default()),
                },
                Value::Array(_) | Value::Object(_) => {
                    return Err(WorkerError::InvalidParameter {
                        name: name.clone(),
                        reason: "expected a string, number, or boolean".to_string(),
                    })
                }
            };
            params.set(name, value);
        }
        Ok(params)
    }
}
