//! Outlook worker bridge and availability-poll reconciliation.

pub mod config;
pub mod error;
pub mod polls;
pub mod worker;
