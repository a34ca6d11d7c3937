use thiserror::Error;

/// Top-level error type for the Warden engine.
///
/// Nothing in this subsystem is permitted to be fatal to the host; these
/// errors are caught and logged at the engine boundary, never propagated.
#[derive(Error, Debug)]
pub enum WardenError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}
