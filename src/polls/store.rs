//! Poll state persistence.
//!
//! `load` and `save` never fail from the caller's point of view: a missing
//! or corrupt file reads as an empty document, and a failed write is logged.
//! The `try_*` variants expose the underlying error.

use std::fs;
use std::path::{Path, PathBuf};

use super::types::PollsDocument;
use crate::error::StoreError;

#[derive(Debug, Clone)]
pub struct PollStore {
    path: PathBuf,
}

impl PollStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn try_load(&self) -> Result<PollsDocument, StoreError> {
        if !self.path.exists() {
            return Ok(PollsDocument::default());
        }

        let content = fs::read_to_string(&self.path).map_err(|source| StoreError::Read {
            path: self.path.clone(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    /// Load the document, falling back to an empty one on any error.
    pub fn load(&self) -> PollsDocument {
        match self.try_load() {
            Ok(doc) => doc,
            Err(e) => {
                log::warn!("Error loading polls file: {}", e);
                PollsDocument::default()
            }
        }
    }

    pub fn try_save(&self, document: &PollsDocument) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|source| StoreError::Write {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        let content = serde_json::to_string_pretty(document).map_err(StoreError::Serialize)?;

        fs::write(&self.path, content).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })
    }

    /// Write the document in full. Errors are logged, not returned.
    pub fn save(&self, document: &PollsDocument) {
        match self.try_save(document) {
            Ok(()) => log::info!("Polls file saved successfully"),
            Err(e) => log::error!("Error saving polls file: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polls::types::{Attendee, Poll, PollStatus, ProposedSlot};
    use serde_json::Map;

    fn sample_document() -> PollsDocument {
        let mut responded = Attendee::new("jane.doe@co.com");
        responded.responded = true;
        responded.available_slots = vec![0, 2];
        responded.responded_at = Some("2026-02-02T15:17:00-05:00".into());

        PollsDocument {
            polls: vec![Poll {
                poll_id: "poll-20260202-1".into(),
                meeting_subject: "Quarterly planning".into(),
                subject: "[POLL] Quarterly planning".into(),
                sent_at: "2026-02-02T14:00:00Z".into(),
                status: PollStatus::Partial,
                proposed_slots: (0..3)
                    .map(|index| ProposedSlot {
                        index,
                        available_count: 0,
                        extra: Map::new(),
                    })
                    .collect(),
                attendees: vec![responded, Attendee::new("bob@co.com")],
                extra: Map::new(),
            }],
            ..PollsDocument::default()
        }
    }

    #[test]
    fn test_missing_file_yields_default() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = PollStore::new(dir.path().join("outlook-polls.json"));
        let doc = store.load();
        assert_eq!(doc.version, "1.0");
        assert!(doc.polls.is_empty());
    }

    #[test]
    fn test_corrupt_file_yields_default() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("outlook-polls.json");
        fs::write(&path, "{ \"version\": \"1.0\", \"polls\": [ {").unwrap();

        let store = PollStore::new(&path);
        assert!(matches!(store.try_load(), Err(StoreError::Parse { .. })));
        assert_eq!(store.load(), PollsDocument::default());
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        // Parent directory does not exist yet.
        let store = PollStore::new(dir.path().join(".claude").join("outlook-polls.json"));
        let doc = sample_document();

        store.try_save(&doc).unwrap();
        assert_eq!(store.try_load().unwrap(), doc);
    }

    #[test]
    fn test_derived_fields_recomputable_after_reload() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = PollStore::new(dir.path().join("outlook-polls.json"));
        let mut doc = sample_document();
        doc.polls[0].recompute();
        store.save(&doc);

        let mut reloaded = store.load();
        let expected = reloaded.polls[0].clone();
        reloaded.polls[0].proposed_slots[0].available_count = 0;
        reloaded.polls[0].status = PollStatus::Pending;
        reloaded.polls[0].recompute();
        assert_eq!(reloaded.polls[0], expected);
    }

    #[test]
    fn test_save_failure_is_swallowed() {
        let dir = tempfile::tempdir().expect("tempdir");
        // The target path is an existing directory, so the write fails.
        let store = PollStore::new(dir.path());
        assert!(matches!(
            store.try_save(&PollsDocument::default()),
            Err(StoreError::Write { .. })
        ));
        store.save(&PollsDocument::default());
    }
}
