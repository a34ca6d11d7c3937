//! Run record and trust score types for the Warden engine.
//!
//! A run record aggregates everything observed about one agent run:
//! an append-only action log plus monotonically non-decreasing counters.
//! The scoring engine turns a finished record into a `TrustScore`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::events::{RunId, SessionKey};

// ── Run record ────────────────────────────────────────────────────

/// Aggregated state for one in-flight agent run.
///
/// Exactly one record exists per session key at a time. The action log
/// is append-only; counters only ever grow during accumulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub session_key: SessionKey,
    pub run_id: RunId,
    pub agent_id: String,
    pub started_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub actions: Vec<ActionRecord>,
    pub total_tokens: u64,
    pub total_cost: f64,
    /// Tool names in invocation order; duplicates allowed.
    pub tools_used: Vec<String>,
    /// Names of out-of-scope invocations, one entry per violating call.
    pub violations: Vec<String>,
    pub latencies_ms: Vec<u64>,
    pub error_count: u32,
}

impl RunRecord {
    pub fn new(session_key: SessionKey, run_id: RunId, agent_id: String, now: DateTime<Utc>) -> Self {
        Self {
            session_key,
            run_id,
            agent_id,
            started_at: now,
            last_activity: now,
            actions: Vec::new(),
            total_tokens: 0,
            total_cost: 0.0,
            tools_used: Vec::new(),
            violations: Vec::new(),
            latencies_ms: Vec::new(),
            error_count: 0,
        }
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_activity = now;
    }
}

/// One entry in a run's append-only action log.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActionRecord {
    ModelCall {
        model: String,
        input_tokens: u64,
        output_tokens: u64,
        cost: f64,
        latency_ms: u64,
        timestamp: DateTime<Utc>,
    },
    ToolCall {
        tool_name: String,
        params_summary: String,
        outcome_summary: String,
        success: bool,
        duration_ms: u64,
        in_scope: bool,
        timestamp: DateTime<Utc>,
    },
    /// Synthetic entry for a tool observed only in the message history
    /// by the fallback scan. Always zero duration.
    ToolMention {
        tool_name: String,
        in_scope: bool,
        timestamp: DateTime<Utc>,
    },
}

// ── Trust score ───────────────────────────────────────────────────

/// Weighted composite trust score for one completed run.
///
/// All dimension scores and the overall score are integers in [0,100].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrustScore {
    pub reliability: u8,
    pub scope: u8,
    pub cost: u8,
    pub latency: u8,
    pub overall: u8,
    pub flags: Vec<Flag>,
}

impl TrustScore {
    pub fn has_critical(&self) -> bool {
        self.flags.iter().any(|f| f.severity == Severity::Critical)
    }
}

/// A structured, human-actionable explanation attached to a scoring deduction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Flag {
    pub severity: Severity,
    pub dimension: Dimension,
    pub message: String,
    pub remediation: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Reliability,
    Scope,
    Cost,
    Latency,
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Dimension::Reliability => "reliability",
            Dimension::Scope => "scope",
            Dimension::Cost => "cost",
            Dimension::Latency => "latency",
        };
        write!(f, "{s}")
    }
}

/// How a run ended, as reported by the terminal event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOutcome {
    pub success: bool,
    pub error_message: Option<String>,
    pub duration_ms: u64,
}
