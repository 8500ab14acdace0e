//! Persisted poll state (`~/.claude/outlook-polls.json`).
//!
//! Fields this crate does not interpret (slot times, organizer, duration...)
//! are carried through `extra` so a load/save cycle never drops them.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const DOCUMENT_VERSION: &str = "1.0";

fn default_version() -> String {
    DOCUMENT_VERSION.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollsDocument {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub polls: Vec<Poll>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for PollsDocument {
    fn default() -> Self {
        Self {
            version: default_version(),
            polls: Vec::new(),
            extra: Map::new(),
        }
    }
}

impl PollsDocument {
    pub fn active_count(&self) -> usize {
        self.polls.iter().filter(|p| p.status.is_active()).count()
    }
}

/// Poll lifecycle. Anything other than the three known states is kept as-is
/// and treated as inactive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PollStatus {
    #[default]
    Pending,
    Partial,
    Complete,
    #[serde(untagged)]
    Other(String),
}

impl PollStatus {
    /// Pending and partial polls still take replies.
    pub fn is_active(&self) -> bool {
        matches!(self, PollStatus::Pending | PollStatus::Partial)
    }

    /// Status for a poll where `responded` of `total` attendees have replied.
    pub fn derive(responded: usize, total: usize) -> Self {
        if responded == total {
            PollStatus::Complete
        } else if responded > 0 {
            PollStatus::Partial
        } else {
            PollStatus::Pending
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            PollStatus::Pending => "pending",
            PollStatus::Partial => "partial",
            PollStatus::Complete => "complete",
            PollStatus::Other(s) => s,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Poll {
    pub poll_id: String,
    #[serde(default)]
    pub meeting_subject: String,
    /// Subject of the invitation email, possibly with a `[TAG]` prefix
    #[serde(default)]
    pub subject: String,
    /// RFC 3339; replies received before this are ignored
    #[serde(default)]
    pub sent_at: String,
    #[serde(default)]
    pub status: PollStatus,
    #[serde(default)]
    pub proposed_slots: Vec<ProposedSlot>,
    #[serde(default)]
    pub attendees: Vec<Attendee>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposedSlot {
    pub index: usize,
    /// Derived; rebuilt from attendee answers on every pass
    #[serde(default)]
    pub available_count: usize,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attendee {
    pub email: String,
    #[serde(default)]
    pub responded: bool,
    #[serde(default)]
    pub available_slots: Vec<usize>,
    #[serde(default)]
    pub responded_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Attendee {
    pub fn new(email: &str) -> Self {
        Self {
            email: email.to_string(),
            responded: false,
            available_slots: Vec::new(),
            responded_at: None,
            extra: Map::new(),
        }
    }
}

impl Poll {
    pub fn responded_count(&self) -> usize {
        self.attendees.iter().filter(|a| a.responded).count()
    }

    /// Subject used to find replies: the invitation subject minus a leading `[TAG]`.
    pub fn search_subject(&self) -> String {
        static TAG_RE: OnceLock<Regex> = OnceLock::new();
        let re = TAG_RE.get_or_init(|| Regex::new(r"^\[.*?\]\s*").unwrap());
        re.replace(&self.subject, "").into_owned()
    }

    /// Rebuild every slot's `available_count` and the poll status from the
    /// attendee records.
    pub fn recompute(&mut self) {
        for slot in &mut self.proposed_slots {
            slot.available_count = self
                .attendees
                .iter()
                .filter(|a| a.responded && a.available_slots.contains(&slot.index))
                .count();
        }
        self.status = PollStatus::derive(self.responded_count(), self.attendees.len());
    }
}
