//! Run report assembly and BLAKE3 content hashing.
//!
//! The report carries the ordered action log, the trust score block, and
//! aggregate counters. Oversized action summaries are replaced with a size
//! marker instead of being dropped, so the action ordering survives intact.
//! Each report is content-hashed so the downstream ledger can detect
//! tampering; the hash covers all fields except `content_hash` itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use warden_core::types::{ActionRecord, RunRecord, TrustScore};
use warden_core::{RunId, SessionKey};

/// Serialized summaries above this size are replaced with a marker.
pub const MAX_SUMMARY_BYTES: usize = 10_000;

/// Unique identifier for a submitted report.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ReportId(pub Uuid);

impl ReportId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ReportId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ReportId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The payload submitted to the remote ledger for one completed run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunReport {
    pub report_id: ReportId,
    pub agent_id: String,
    pub session_key: SessionKey,
    pub run_id: RunId,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub actions: Vec<ReportAction>,
    pub score: TrustScore,
    pub summary: RunSummary,
    /// BLAKE3 content hash (hex) — set on finalization.
    pub content_hash: Option<String>,
}

/// One action in the report, in original log order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportAction {
    pub kind: ActionKind,
    /// Tool or model identity.
    pub name: String,
    pub input_summary: Option<String>,
    pub output_summary: Option<String>,
    pub status: ActionStatus,
    pub duration_ms: u64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    ModelCall,
    ToolCall,
    ToolMention,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    Ok,
    Error,
    /// Seen only in the message history, never captured live.
    Unobserved,
}

/// Aggregate counters for the completed run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunSummary {
    pub total_tokens: u64,
    pub total_cost: f64,
    pub tool_call_count: usize,
    pub violation_count: usize,
    pub avg_latency_ms: u64,
}

impl RunReport {
    /// Assemble a report from a scored run record and finalize its hash.
    pub fn build(record: &RunRecord, score: &TrustScore, completed_at: DateTime<Utc>) -> Self {
        let actions = record.actions.iter().map(report_action).collect();

        let avg_latency_ms = if record.latencies_ms.is_empty() {
            0
        } else {
            record.latencies_ms.iter().sum::<u64>() / record.latencies_ms.len() as u64
        };

        let mut report = Self {
            report_id: ReportId::new(),
            agent_id: record.agent_id.clone(),
            session_key: record.session_key.clone(),
            run_id: record.run_id.clone(),
            started_at: record.started_at,
            completed_at,
            actions,
            score: score.clone(),
            summary: RunSummary {
                total_tokens: record.total_tokens,
                total_cost: record.total_cost,
                tool_call_count: record.tools_used.len(),
                violation_count: record.violations.len(),
                avg_latency_ms,
            },
            content_hash: None,
        };
        report.content_hash = Some(report.compute_hash());
        report
    }

    /// Compute the BLAKE3 hash of the report's content.
    /// The hash covers all fields except `content_hash` itself.
    pub fn compute_hash(&self) -> String {
        let hashable = HashableReport {
            report_id: &self.report_id,
            agent_id: &self.agent_id,
            session_key: &self.session_key,
            run_id: &self.run_id,
            started_at: &self.started_at,
            completed_at: &self.completed_at,
            actions: &self.actions,
            score: &self.score,
            summary: &self.summary,
        };
        let json = serde_json::to_vec(&hashable).expect("Report serialization should not fail");
        blake3::hash(&json).to_hex().to_string()
    }

    /// Verify that the stored content_hash matches a freshly computed hash.
    pub fn verify_integrity(&self) -> bool {
        match &self.content_hash {
            Some(stored) => stored == &self.compute_hash(),
            None => false,
        }
    }
}

/// Hashable representation of a RunReport (excludes content_hash).
#[derive(Serialize)]
struct HashableReport<'a> {
    report_id: &'a ReportId,
    agent_id: &'a str,
    session_key: &'a SessionKey,
    run_id: &'a RunId,
    started_at: &'a DateTime<Utc>,
    completed_at: &'a DateTime<Utc>,
    actions: &'a [ReportAction],
    score: &'a TrustScore,
    summary: &'a RunSummary,
}

fn report_action(action: &ActionRecord) -> ReportAction {
    match action {
        ActionRecord::ModelCall {
            model,
            latency_ms,
            timestamp,
            ..
        } => ReportAction {
            kind: ActionKind::ModelCall,
            name: model.clone(),
            input_summary: None,
            output_summary: None,
            status: ActionStatus::Ok,
            duration_ms: *latency_ms,
            timestamp: *timestamp,
        },
        ActionRecord::ToolCall {
            tool_name,
            params_summary,
            outcome_summary,
            success,
            duration_ms,
            timestamp,
            ..
        } => ReportAction {
            kind: ActionKind::ToolCall,
            name: tool_name.clone(),
            input_summary: Some(bounded_summary(params_summary)),
            output_summary: Some(bounded_summary(outcome_summary)),
            status: if *success {
                ActionStatus::Ok
            } else {
                ActionStatus::Error
            },
            duration_ms: *duration_ms,
            timestamp: *timestamp,
        },
        ActionRecord::ToolMention {
            tool_name,
            timestamp,
            ..
        } => ReportAction {
            kind: ActionKind::ToolMention,
            name: tool_name.clone(),
            input_summary: None,
            output_summary: None,
            status: ActionStatus::Unobserved,
            duration_ms: 0,
            timestamp: *timestamp,
        },
    }
}

/// Replace an oversized summary with a size marker rather than dropping it.
fn bounded_summary(summary: &str) -> String {
    if summary.len() > MAX_SUMMARY_BYTES {
        format!("[truncated: {} bytes]", summary.len())
    } else {
        summary.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_core::types::{Dimension, Flag, Severity};

    fn sample_record() -> RunRecord {
        let now = Utc::now();
        let mut record = RunRecord::new(
            SessionKey::new("sess-01"),
            RunId::new("run-01"),
            "coder".to_string(),
            now,
        );
        record.actions.push(ActionRecord::ToolCall {
            tool_name: "bash".to_string(),
            params_summary: r#"{"command":"ls"}"#.to_string(),
            outcome_summary: "ok".to_string(),
            success: true,
            duration_ms: 120,
            in_scope: true,
            timestamp: now,
        });
        record.tools_used.push("bash".to_string());
        record.latencies_ms.push(120);
        record.total_tokens = 1020;
        record.total_cost = 0.0042;
        record
    }

    fn sample_score() -> TrustScore {
        TrustScore {
            reliability: 100,
            scope: 100,
            cost: 100,
            latency: 100,
            overall: 100,
            flags: vec![],
        }
    }

    #[test]
    fn build_finalizes_hash() {
        let report = RunReport::build(&sample_record(), &sample_score(), Utc::now());
        assert!(report.content_hash.is_some());
        assert!(report.verify_integrity());
        assert_eq!(report.summary.tool_call_count, 1);
        assert_eq!(report.summary.avg_latency_ms, 120);
    }

    #[test]
    fn tamper_detected() {
        let mut report = RunReport::build(&sample_record(), &sample_score(), Utc::now());
        report.summary.total_cost = 99.0;
        assert!(!report.verify_integrity());
    }

    #[test]
    fn oversized_summary_becomes_marker() {
        let now = Utc::now();
        let mut record = sample_record();
        record.actions.push(ActionRecord::ToolCall {
            tool_name: "read_file".to_string(),
            params_summary: "x".repeat(MAX_SUMMARY_BYTES + 1),
            outcome_summary: "ok".to_string(),
            success: true,
            duration_ms: 5,
            in_scope: true,
            timestamp: now,
        });

        let report = RunReport::build(&record, &sample_score(), now);
        let oversized = &report.actions[1];
        assert_eq!(
            oversized.input_summary.as_deref(),
            Some(format!("[truncated: {} bytes]", MAX_SUMMARY_BYTES + 1).as_str())
        );
        // The action itself is preserved, not dropped.
        assert_eq!(report.actions.len(), 2);
    }

    #[test]
    fn summary_at_budget_passes_through() {
        let s = "y".repeat(MAX_SUMMARY_BYTES);
        assert_eq!(bounded_summary(&s), s);
    }

    #[test]
    fn mention_maps_to_unobserved() {
        let now = Utc::now();
        let mut record = sample_record();
        record.actions.push(ActionRecord::ToolMention {
            tool_name: "web_search".to_string(),
            in_scope: false,
            timestamp: now,
        });

        let report = RunReport::build(&record, &sample_score(), now);
        assert_eq!(report.actions[1].status, ActionStatus::Unobserved);
        assert_eq!(report.actions[1].duration_ms, 0);
    }

    #[test]
    fn report_serializes_flags() {
        let mut score = sample_score();
        score.flags.push(Flag {
            severity: Severity::Warning,
            dimension: Dimension::Cost,
            message: "Total cost $0.7500 exceeded threshold $0.5".to_string(),
            remediation: None,
        });
        let report = RunReport::build(&sample_record(), &score, Utc::now());
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"severity\":\"warning\""));
        assert!(json.contains("content_hash"));
    }
}
