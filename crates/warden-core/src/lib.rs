//! warden-core: Shared types, configuration, and error handling for the Warden trust engine.
//!
//! This crate provides the foundational types used across all Warden components:
//! - Canonical lifecycle event types ingested from the host agent runtime
//! - Run record and action log types for per-run aggregation
//! - Trust score and flag types produced by the scoring engine
//! - Configuration management
//! - Common error types

pub mod config;
pub mod error;
pub mod events;
pub mod types;

pub use config::WardenConfig;
pub use error::WardenError;
pub use events::{AgentEvent, EventContext, EventPayload, RunId, SessionKey};
pub use types::{ActionRecord, Dimension, Flag, RunOutcome, RunRecord, Severity, TrustScore};
