//! Ingestion adapter: host callback payloads → canonical events.
//!
//! The host runtime delivers loosely-typed JSON. This boundary validates
//! and coerces it exactly once; missing fields take defaults and
//! unrecognized event kinds are dropped with a debug log. Malformed
//! input is never surfaced back to the host.

use chrono::{DateTime, Utc};
use serde_json::Value;

use warden_core::events::{
    AgentEvent, ContentPart, EventContext, EventPayload, HistoryMessage, RunId, SessionKey,
    ToolOutcome,
};

/// Coerce one host payload into a canonical event, or None if the
/// event kind is unrecognized.
pub fn canonicalize(raw: &Value) -> Option<AgentEvent> {
    let kind = raw
        .get("event")
        .or_else(|| raw.get("type"))
        .and_then(Value::as_str)?;

    let payload = match kind {
        "model_call_start" => EventPayload::ModelCallStart {
            model: str_field(raw, "model").unwrap_or_else(|| "unknown".to_string()),
        },
        "model_call_end" => EventPayload::ModelCallEnd {
            model: str_field(raw, "model").unwrap_or_else(|| "unknown".to_string()),
            input_tokens: u64_field(raw, "input_tokens"),
            output_tokens: u64_field(raw, "output_tokens"),
            cost: f64_field(raw, "cost"),
            latency_ms: u64_field(raw, "latency_ms"),
            stop_reason: str_field(raw, "stop_reason"),
        },
        "tool_call_end" => {
            let outcome = match str_field(raw, "error") {
                Some(message) => ToolOutcome::Error { message },
                None => ToolOutcome::Success {
                    result: raw.get("result").cloned().unwrap_or(Value::Null),
                },
            };
            EventPayload::ToolCallEnd {
                tool_name: str_field(raw, "tool_name").unwrap_or_else(|| "unknown".to_string()),
                parameters: raw.get("parameters").cloned().unwrap_or(Value::Null),
                outcome,
                duration_ms: u64_field(raw, "duration_ms"),
            }
        }
        "run_end" => EventPayload::RunEnd {
            message_history: parse_history(raw.get("message_history")),
            success: raw.get("success").and_then(Value::as_bool).unwrap_or(false),
            error_message: str_field(raw, "error_message"),
            duration_ms: u64_field(raw, "duration_ms"),
        },
        other => {
            tracing::debug!(event = other, "Ignoring unrecognized host event");
            return None;
        }
    };

    Some(AgentEvent {
        context: parse_context(raw),
        timestamp: parse_timestamp(raw),
        payload,
    })
}

fn parse_context(raw: &Value) -> EventContext {
    let agent_id = str_field(raw, "agent_id").unwrap_or_else(|| "unknown".to_string());
    let session = str_field(raw, "session_key")
        .or_else(|| str_field(raw, "session_id"))
        .unwrap_or_else(|| "default".to_string());
    // A host that does not track run ids gets one run per session.
    let run_id = str_field(raw, "run_id").unwrap_or_else(|| session.clone());

    EventContext {
        agent_id,
        session_key: SessionKey::new(session),
        run_id: RunId::new(run_id),
    }
}

fn parse_timestamp(raw: &Value) -> DateTime<Utc> {
    raw.get("timestamp")
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(Utc::now)
}

/// Canonicalize the host's message history. Content may be a plain string
/// or an array of typed blocks; unknown block types are skipped.
fn parse_history(raw: Option<&Value>) -> Vec<HistoryMessage> {
    let Some(Value::Array(messages)) = raw else {
        return Vec::new();
    };

    messages
        .iter()
        .map(|msg| HistoryMessage {
            role: str_field(msg, "role").unwrap_or_else(|| "unknown".to_string()),
            content: parse_content(msg.get("content")),
        })
        .collect()
}

fn parse_content(raw: Option<&Value>) -> Vec<ContentPart> {
    match raw {
        Some(Value::String(text)) => vec![ContentPart::Text { text: text.clone() }],
        Some(Value::Array(blocks)) => blocks
            .iter()
            .filter_map(|block| match block.get("type").and_then(Value::as_str) {
                Some("text") => Some(ContentPart::Text {
                    text: str_field(block, "text").unwrap_or_default(),
                }),
                Some("tool_use") => Some(ContentPart::ToolUse {
                    name: str_field(block, "name")?,
                    input: block.get("input").cloned().unwrap_or(Value::Null),
                }),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn str_field(raw: &Value, key: &str) -> Option<String> {
    raw.get(key).and_then(Value::as_str).map(str::to_string)
}

fn u64_field(raw: &Value, key: &str) -> u64 {
    raw.get(key).and_then(Value::as_u64).unwrap_or(0)
}

fn f64_field(raw: &Value, key: &str) -> f64 {
    raw.get(key).and_then(Value::as_f64).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tool_call_end_parses_fully() {
        let raw = json!({
            "event": "tool_call_end",
            "agent_id": "coder",
            "session_id": "sess-01",
            "run_id": "run-01",
            "tool_name": "bash",
            "parameters": {"command": "ls"},
            "result": "ok",
            "duration_ms": 150,
        });

        let event = canonicalize(&raw).unwrap();
        assert_eq!(event.context.session_key, SessionKey::new("sess-01"));
        match event.payload {
            EventPayload::ToolCallEnd {
                tool_name,
                outcome,
                duration_ms,
                ..
            } => {
                assert_eq!(tool_name, "bash");
                assert!(!outcome.is_error());
                assert_eq!(duration_ms, 150);
            }
            other => panic!("wrong payload: {other:?}"),
        }
    }

    #[test]
    fn error_field_yields_error_outcome() {
        let raw = json!({
            "event": "tool_call_end",
            "session_id": "s",
            "tool_name": "bash",
            "error": "command not found",
        });

        let event = canonicalize(&raw).unwrap();
        match event.payload {
            EventPayload::ToolCallEnd { outcome, .. } => assert!(outcome.is_error()),
            other => panic!("wrong payload: {other:?}"),
        }
    }

    #[test]
    fn missing_fields_take_defaults() {
        let raw = json!({"event": "model_call_end", "session_id": "s"});

        let event = canonicalize(&raw).unwrap();
        assert_eq!(event.context.agent_id, "unknown");
        // Run id falls back to the session identity.
        assert_eq!(event.context.run_id.0, "s");
        match event.payload {
            EventPayload::ModelCallEnd {
                input_tokens, cost, ..
            } => {
                assert_eq!(input_tokens, 0);
                assert_eq!(cost, 0.0);
            }
            other => panic!("wrong payload: {other:?}"),
        }
    }

    #[test]
    fn unknown_event_kind_is_dropped() {
        assert!(canonicalize(&json!({"event": "heartbeat"})).is_none());
        assert!(canonicalize(&json!({"no_event_field": true})).is_none());
    }

    #[test]
    fn run_end_history_extracts_tool_uses() {
        let raw = json!({
            "event": "run_end",
            "session_id": "s",
            "success": true,
            "duration_ms": 8000,
            "message_history": [
                {"role": "user", "content": "list the files"},
                {"role": "assistant", "content": [
                    {"type": "text", "text": "Running ls"},
                    {"type": "tool_use", "name": "bash", "input": {"command": "ls"}},
                    {"type": "unknown_block"},
                ]},
            ],
        });

        let event = canonicalize(&raw).unwrap();
        match event.payload {
            EventPayload::RunEnd {
                message_history,
                success,
                ..
            } => {
                assert!(success);
                assert_eq!(message_history.len(), 2);
                assert_eq!(message_history[1].content.len(), 2);
                assert!(matches!(
                    message_history[1].content[1],
                    ContentPart::ToolUse { ref name, .. } if name == "bash"
                ));
            }
            other => panic!("wrong payload: {other:?}"),
        }
    }

    #[test]
    fn timestamp_parses_rfc3339() {
        let raw = json!({
            "event": "model_call_start",
            "session_id": "s",
            "model": "sonnet",
            "timestamp": "2026-08-01T12:00:00Z",
        });
        let event = canonicalize(&raw).unwrap();
        assert_eq!(event.timestamp.to_rfc3339(), "2026-08-01T12:00:00+00:00");
    }
}
