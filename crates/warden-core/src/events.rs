//! Canonical lifecycle event types ingested from the host agent runtime.
//!
//! Host callback payloads are loosely typed; the ingestion adapter in
//! warden-engine validates and coerces them into these variants exactly
//! once, so the aggregation core never inspects untyped data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Host-assigned session identity. One active run record exists per key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct SessionKey(pub String);

impl SessionKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }
}

impl std::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Host-assigned run identity within a session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct RunId(pub String);

impl RunId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Context bundle carried by every host event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventContext {
    pub agent_id: String,
    pub session_key: SessionKey,
    pub run_id: RunId,
}

/// A canonical lifecycle event observed from the host runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentEvent {
    pub context: EventContext,
    pub timestamp: DateTime<Utc>,
    pub payload: EventPayload,
}

impl AgentEvent {
    pub fn new(context: EventContext, payload: EventPayload) -> Self {
        Self {
            context,
            timestamp: Utc::now(),
            payload,
        }
    }
}

/// The closed set of canonical event kinds, tagged by type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum EventPayload {
    /// A model call was issued.
    ModelCallStart { model: String },
    /// A model call completed with usage accounting.
    ModelCallEnd {
        model: String,
        input_tokens: u64,
        output_tokens: u64,
        cost: f64,
        latency_ms: u64,
        stop_reason: Option<String>,
    },
    /// A tool invocation completed.
    ToolCallEnd {
        tool_name: String,
        parameters: serde_json::Value,
        outcome: ToolOutcome,
        duration_ms: u64,
    },
    /// The run reached its terminal event.
    RunEnd {
        message_history: Vec<HistoryMessage>,
        success: bool,
        error_message: Option<String>,
        duration_ms: u64,
    },
}

/// Result of a completed tool invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ToolOutcome {
    Success { result: serde_json::Value },
    Error { message: String },
}

impl ToolOutcome {
    pub fn is_error(&self) -> bool {
        matches!(self, ToolOutcome::Error { .. })
    }
}

/// One message from the completed conversation history, canonicalized
/// down to the parts the fallback scan cares about.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryMessage {
    pub role: String,
    pub content: Vec<ContentPart>,
}

/// A single content block within a history message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ToolUse { name: String, input: serde_json::Value },
}
