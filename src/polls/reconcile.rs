//! Poll reconciliation pass.
//!
//! For each pending/partial poll: search the inbox for replies sent after the
//! poll went out, credit each reply to at most one attendee who has not yet
//! answered, then rebuild slot counts and status. Polls are handled one at a
//! time in document order; a failure on one poll leaves it untouched and the
//! pass moves on.

use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use super::matcher::{find_attendee, MatchMethod};
use super::reply::{parse_timestamp, strip_quoted};
use super::slots::parse_slot_selection;
use super::store::PollStore;
use super::types::{Poll, PollStatus, PollsDocument};
use crate::error::WorkerError;
use crate::worker::inbox::{search_inbox, InboxMessage, SearchInboxQuery};
use crate::worker::Worker;

pub const DEFAULT_SEARCH_LIMIT: u32 = 100;

/// A reply that passed the subject and time filters.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateReply {
    pub sender: String,
    pub body: String,
    pub received: DateTime<FixedOffset>,
}

/// What happened to one candidate reply.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplyDisposition {
    Recorded {
        attendee: usize,
        method: MatchMethod,
        slots: Vec<usize>,
    },
    NoMatchingAttendee,
    AlreadyResponded { attendee: usize },
}

/// Result of reconciling a single poll
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollOutcome {
    pub poll_id: String,
    pub candidates: usize,
    pub updated: usize,
    pub status: PollStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<&'static str>,
}

/// Result of one reconciliation run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    pub active_polls: usize,
    pub polls: Vec<PollOutcome>,
}

impl ReconcileReport {
    pub fn updated(&self) -> usize {
        self.polls.iter().map(|p| p.updated).sum()
    }

    pub fn failures(&self) -> usize {
        self.polls.iter().filter(|p| p.error.is_some()).count()
    }
}

/// Credit `reply` to an attendee of `poll`, if it belongs to one who has not
/// answered yet. Does not touch slot counts or status.
pub fn apply_reply(poll: &mut Poll, reply: &CandidateReply) -> ReplyDisposition {
    let Some((index, method)) = find_attendee(&poll.attendees, &reply.sender) else {
        log::info!("No matching attendee found for sender: {}", reply.sender);
        return ReplyDisposition::NoMatchingAttendee;
    };

    let slot_count = poll.proposed_slots.len();
    let attendee = &mut poll.attendees[index];
    if attendee.responded {
        log::debug!("Attendee {} already responded, skipping", attendee.email);
        return ReplyDisposition::AlreadyResponded { attendee: index };
    }

    if method == MatchMethod::LocalPart {
        log::info!(
            "Matched sender {} to attendee {} by local part",
            reply.sender,
            attendee.email
        );
    }

    let slots = parse_slot_selection(&strip_quoted(&reply.body), slot_count);
    log::info!(
        "Attendee {} available for slots: {}",
        attendee.email,
        describe_slots(&slots)
    );

    attendee.responded = true;
    attendee.available_slots = slots.clone();
    attendee.responded_at = Some(reply.received.to_rfc3339());

    ReplyDisposition::Recorded {
        attendee: index,
        method,
        slots,
    }
}

fn describe_slots(slots: &[usize]) -> String {
    if slots.is_empty() {
        return "none".to_string();
    }
    slots
        .iter()
        .map(|s| (s + 1).to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Turn search results into candidates: parseable received time at or after
/// `sent_at`, oldest first.
pub fn select_candidates(
    messages: Vec<InboxMessage>,
    sent_at: DateTime<FixedOffset>,
) -> Vec<CandidateReply> {
    let mut candidates: Vec<CandidateReply> = messages
        .into_iter()
        .filter_map(|m| {
            let Some(received) = parse_timestamp(&m.received) else {
                log::debug!("Skipping message with unreadable received time: {:?}", m.received);
                return None;
            };
            (received >= sent_at).then(|| CandidateReply {
                sender: m.from_email,
                body: m.body,
                received,
            })
        })
        .collect();
    candidates.sort_by_key(|c| c.received);
    candidates
}

pub struct Reconciler<'a, W: Worker + ?Sized> {
    worker: &'a W,
    search_limit: u32,
}

impl<'a, W: Worker + ?Sized> Reconciler<'a, W> {
    pub fn new(worker: &'a W) -> Self {
        Self {
            worker,
            search_limit: DEFAULT_SEARCH_LIMIT,
        }
    }

    pub fn with_search_limit(mut self, limit: u32) -> Self {
        self.search_limit = limit;
        self
    }

    fn fetch_candidates(
        &self,
        poll: &Poll,
        sent_at: DateTime<FixedOffset>,
    ) -> Result<Vec<CandidateReply>, WorkerError> {
        let query = SearchInboxQuery::subject_contains(poll.search_subject())
            .limit(self.search_limit)
            .include_body();
        let messages = search_inbox(self.worker, &query)?;
        Ok(select_candidates(messages, sent_at))
    }

    /// Reconcile one poll. Returns `None` for polls that no longer take replies.
    pub fn reconcile_poll(&self, poll: &mut Poll) -> Option<PollOutcome> {
        if !poll.status.is_active() {
            return None;
        }

        log::info!("Processing poll: {} ({})", poll.poll_id, poll.meeting_subject);

        let unchanged = |poll: &Poll, error: String, suggestion: Option<&'static str>| {
            PollOutcome {
                poll_id: poll.poll_id.clone(),
                candidates: 0,
                updated: 0,
                status: poll.status.clone(),
                error: Some(error),
                suggestion,
            }
        };

        let Some(sent_at) = parse_timestamp(&poll.sent_at) else {
            let error = format!("Invalid sentAt: {:?}", poll.sent_at);
            log::warn!("Skipping poll {}: {}", poll.poll_id, error);
            return Some(unchanged(&*poll, error, None));
        };

        let candidates = match self.fetch_candidates(poll, sent_at) {
            Ok(c) => c,
            Err(e) => {
                let suggestion = e.recovery_suggestion();
                log::warn!(
                    "Error searching inbox for poll {}: {} ({})",
                    poll.poll_id,
                    e,
                    suggestion
                );
                return Some(unchanged(&*poll, e.to_string(), Some(suggestion)));
            }
        };
        log::info!(
            "Found {} potential responses for poll {}",
            candidates.len(),
            poll.poll_id
        );

        let mut updated = 0;
        for reply in &candidates {
            if let ReplyDisposition::Recorded { .. } = apply_reply(poll, reply) {
                updated += 1;
            }
        }

        poll.recompute();

        match poll.status {
            PollStatus::Complete => log::info!(
                "Poll {} is now complete - all attendees responded",
                poll.poll_id
            ),
            PollStatus::Partial => log::info!(
                "Poll {} has {}/{} responses",
                poll.poll_id,
                poll.responded_count(),
                poll.attendees.len()
            ),
            _ => {}
        }
        if updated > 0 {
            log::info!(
                "Updated {} attendee responses for poll {}",
                updated,
                poll.poll_id
            );
        }

        Some(PollOutcome {
            poll_id: poll.poll_id.clone(),
            candidates: candidates.len(),
            updated,
            status: poll.status.clone(),
            error: None,
            suggestion: None,
        })
    }

    /// Reconcile every active poll in document order.
    pub fn reconcile_document(&self, document: &mut PollsDocument) -> ReconcileReport {
        let mut report = ReconcileReport {
            active_polls: document.active_count(),
            polls: Vec::new(),
        };
        for poll in &mut document.polls {
            if let Some(outcome) = self.reconcile_poll(poll) {
                report.polls.push(outcome);
            }
        }
        report
    }
}

/// One full run: load, reconcile active polls, save.
///
/// The document is only written back when there was something to reconcile.
pub fn run_once<W: Worker + ?Sized>(
    store: &PollStore,
    worker: &W,
    search_limit: u32,
) -> ReconcileReport {
    let mut document = store.load();

    if document.polls.is_empty() {
        log::info!("No polls found");
        return ReconcileReport::default();
    }

    let active = document.active_count();
    if active == 0 {
        log::info!("No active polls to process");
        return ReconcileReport::default();
    }

    log::info!("Processing {} active poll(s)", active);

    let report = Reconciler::new(worker)
        .with_search_limit(search_limit)
        .reconcile_document(&mut document);

    store.save(&document);
    report
}
