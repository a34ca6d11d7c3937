//! Per-event run record mutation and fallback reconciliation.
//!
//! Real-time capture appends actions as tool and model events arrive.
//! At run end, `scan_history` reconciles against the completed message
//! history: tool names never captured live get a synthetic zero-duration
//! entry, deduplicated by name so the two paths never double-count.

use chrono::{DateTime, Utc};

use warden_core::events::{ContentPart, HistoryMessage, ToolOutcome};
use warden_core::types::{ActionRecord, RunRecord};

/// An empty allow-list admits every tool; otherwise membership is exact.
pub fn scope_allows(allowed: &[String], tool_name: &str) -> bool {
    allowed.is_empty() || allowed.iter().any(|t| t == tool_name)
}

/// Record a completed tool invocation.
pub fn record_tool_call(
    record: &mut RunRecord,
    tool_name: &str,
    parameters: &serde_json::Value,
    outcome: &ToolOutcome,
    duration_ms: u64,
    allowed: &[String],
    now: DateTime<Utc>,
) {
    let in_scope = scope_allows(allowed, tool_name);
    let (success, outcome_summary) = match outcome {
        ToolOutcome::Success { result } => (true, result.to_string()),
        ToolOutcome::Error { message } => (false, message.clone()),
    };

    record.actions.push(ActionRecord::ToolCall {
        tool_name: tool_name.to_string(),
        params_summary: parameters.to_string(),
        outcome_summary,
        success,
        duration_ms,
        in_scope,
        timestamp: now,
    });
    record.tools_used.push(tool_name.to_string());
    record.latencies_ms.push(duration_ms);
    if !success {
        record.error_count += 1;
    }
    if !in_scope {
        record.violations.push(tool_name.to_string());
        // Real-time warning, independent of end-of-run scoring.
        tracing::warn!(
            session = %record.session_key,
            tool = tool_name,
            "Tool invoked outside the configured allow-list"
        );
    }
    record.touch(now);
}

/// Record a completed model call with usage accounting.
pub fn record_model_call(
    record: &mut RunRecord,
    model: &str,
    input_tokens: u64,
    output_tokens: u64,
    cost: f64,
    latency_ms: u64,
    now: DateTime<Utc>,
) {
    record.actions.push(ActionRecord::ModelCall {
        model: model.to_string(),
        input_tokens,
        output_tokens,
        cost,
        latency_ms,
        timestamp: now,
    });
    record.total_tokens += input_tokens + output_tokens;
    record.total_cost += cost;
    record.latencies_ms.push(latency_ms);
    record.touch(now);
}

/// Reconcile the record against the completed message history.
///
/// Every tool name found in a `ToolUse` marker that is not already in
/// `tools_used` gets the same scope check and a synthetic zero-duration
/// action. Dedup is by name within the run, so re-running the scan is
/// idempotent. Returns the number of mentions added.
pub fn scan_history(
    record: &mut RunRecord,
    messages: &[HistoryMessage],
    allowed: &[String],
    now: DateTime<Utc>,
) -> usize {
    let mut added = 0;
    for message in messages {
        for part in &message.content {
            let ContentPart::ToolUse { name, .. } = part else {
                continue;
            };
            if record.tools_used.iter().any(|t| t == name) {
                continue;
            }

            let in_scope = scope_allows(allowed, name);
            record.actions.push(ActionRecord::ToolMention {
                tool_name: name.clone(),
                in_scope,
                timestamp: now,
            });
            record.tools_used.push(name.clone());
            if !in_scope {
                record.violations.push(name.clone());
                tracing::warn!(
                    session = %record.session_key,
                    tool = %name,
                    "History scan found tool outside the configured allow-list"
                );
            }
            added += 1;
        }
    }
    added
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_core::{RunId, SessionKey};

    fn record() -> RunRecord {
        RunRecord::new(
            SessionKey::new("s1"),
            RunId::new("r1"),
            "coder".to_string(),
            Utc::now(),
        )
    }

    fn history(tools: &[&str]) -> Vec<HistoryMessage> {
        vec![HistoryMessage {
            role: "assistant".to_string(),
            content: tools
                .iter()
                .map(|name| ContentPart::ToolUse {
                    name: name.to_string(),
                    input: serde_json::Value::Null,
                })
                .collect(),
        }]
    }

    #[test]
    fn empty_allow_list_admits_everything() {
        assert!(scope_allows(&[], "anything"));
        assert!(scope_allows(&["bash".to_string()], "bash"));
        assert!(!scope_allows(&["bash".to_string()], "web_search"));
    }

    #[test]
    fn tool_call_updates_counters() {
        let mut rec = record();
        let allowed = vec!["bash".to_string()];
        record_tool_call(
            &mut rec,
            "bash",
            &serde_json::json!({"command": "ls"}),
            &ToolOutcome::Success {
                result: serde_json::json!("ok"),
            },
            120,
            &allowed,
            Utc::now(),
        );

        assert_eq!(rec.tools_used, vec!["bash"]);
        assert_eq!(rec.latencies_ms, vec![120]);
        assert!(rec.violations.is_empty());
        assert_eq!(rec.error_count, 0);
        assert_eq!(rec.actions.len(), 1);
    }

    #[test]
    fn failed_tool_call_increments_errors() {
        let mut rec = record();
        record_tool_call(
            &mut rec,
            "bash",
            &serde_json::Value::Null,
            &ToolOutcome::Error {
                message: "timeout".to_string(),
            },
            3000,
            &[],
            Utc::now(),
        );
        assert_eq!(rec.error_count, 1);
    }

    #[test]
    fn out_of_scope_call_recorded_as_violation() {
        let mut rec = record();
        let allowed = vec!["bash".to_string()];
        record_tool_call(
            &mut rec,
            "web_search",
            &serde_json::Value::Null,
            &ToolOutcome::Success {
                result: serde_json::Value::Null,
            },
            50,
            &allowed,
            Utc::now(),
        );
        assert_eq!(rec.violations, vec!["web_search"]);
    }

    #[test]
    fn model_call_accumulates_tokens_and_cost() {
        let mut rec = record();
        record_model_call(&mut rec, "sonnet", 900, 100, 0.003, 1500, Utc::now());
        record_model_call(&mut rec, "sonnet", 500, 50, 0.002, 900, Utc::now());

        assert_eq!(rec.total_tokens, 1550);
        assert!((rec.total_cost - 0.005).abs() < 1e-12);
        assert_eq!(rec.latencies_ms, vec![1500, 900]);
        assert_eq!(rec.actions.len(), 2);
    }

    #[test]
    fn scan_adds_only_unseen_tools() {
        let mut rec = record();
        record_tool_call(
            &mut rec,
            "bash",
            &serde_json::Value::Null,
            &ToolOutcome::Success {
                result: serde_json::Value::Null,
            },
            10,
            &[],
            Utc::now(),
        );

        let added = scan_history(&mut rec, &history(&["bash", "web_search"]), &[], Utc::now());
        assert_eq!(added, 1);
        assert_eq!(rec.tools_used, vec!["bash", "web_search"]);
    }

    #[test]
    fn repeated_scan_is_idempotent() {
        let mut rec = record();
        let msgs = history(&["bash", "bash", "web_search"]);

        let first = scan_history(&mut rec, &msgs, &[], Utc::now());
        let second = scan_history(&mut rec, &msgs, &[], Utc::now());

        assert_eq!(first, 2);
        assert_eq!(second, 0);
        assert_eq!(rec.actions.len(), 2);
        assert_eq!(rec.tools_used, vec!["bash", "web_search"]);
    }

    #[test]
    fn scan_applies_scope_check() {
        let mut rec = record();
        let allowed = vec!["bash".to_string()];
        scan_history(&mut rec, &history(&["web_search"]), &allowed, Utc::now());

        assert_eq!(rec.violations, vec!["web_search"]);
        // Synthetic mentions record no latency sample.
        assert!(rec.latencies_ms.is_empty());
    }
}
