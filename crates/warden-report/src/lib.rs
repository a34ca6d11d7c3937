//! Warden report — Tamper-evident run reports and ledger submission.
//!
//! Builds a serializable payload from a completed run record plus its
//! trust score, content-hashes it with BLAKE3 for tamper evidence, and
//! dispatches it to the remote ledger as a detached task. Dispatch never
//! blocks the scoring path; a failed submission is logged and dropped.

pub mod client;
pub mod payload;

pub use client::{LedgerClient, LedgerConfig, ReportError};
pub use payload::{ReportAction, ReportId, RunReport, RunSummary};
