//! Availability polls: persisted state and the reconciliation job that turns
//! email replies into per-attendee slot selections.

pub mod matcher;
pub mod reconcile;
pub mod reply;
pub mod slots;
pub mod store;
pub mod types;

pub use reconcile::{run_once, ReconcileReport, Reconciler};
pub use store::PollStore;
pub use types::{Attendee, Poll, PollStatus, PollsDocument, ProposedSlot};
