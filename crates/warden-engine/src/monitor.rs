//! Monitor loop: event channel plus periodic staleness sweep.
//!
//! Wraps a `TrustEngine` in a spawned tokio task. The host emits events
//! through a non-blocking handle; a maintenance interval reclaims
//! abandoned runs independent of event traffic. Dropping the last handle
//! ends the loop.

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration};

use warden_core::events::AgentEvent;
use warden_core::WardenConfig;

use crate::engine::TrustEngine;

/// Non-blocking sender side of a running monitor.
#[derive(Clone)]
pub struct MonitorHandle {
    tx: mpsc::UnboundedSender<AgentEvent>,
}

impl MonitorHandle {
    /// Enqueue one event. Never blocks; events sent after shutdown are dropped.
    pub fn emit(&self, event: AgentEvent) {
        if self.tx.send(event).is_err() {
            tracing::debug!("Monitor loop stopped, event dropped");
        }
    }
}

/// Spawns and runs the engine loop.
pub struct TrustMonitor;

impl TrustMonitor {
    /// Start the monitor. Returns the event handle and the loop's join handle.
    pub fn spawn(config: WardenConfig) -> (MonitorHandle, JoinHandle<()>) {
        let sweep_every = Duration::from_secs(config.sweep_interval_secs.max(1));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut engine = TrustEngine::new(config);

        let join = tokio::spawn(async move {
            let mut ticker = interval(sweep_every);
            loop {
                tokio::select! {
                    maybe_event = rx.recv() => match maybe_event {
                        Some(event) => {
                            engine.handle_event(event);
                        }
                        None => break,
                    },
                    _ = ticker.tick() => {
                        let evicted = engine.evict_stale(Utc::now());
                        if evicted > 0 {
                            tracing::info!(evicted, "Reclaimed stale runs");
                        }
                    }
                }
            }
            tracing::debug!("Trust monitor stopped");
        });

        (MonitorHandle { tx }, join)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_core::events::{EventContext, EventPayload, ToolOutcome};
    use warden_core::{RunId, SessionKey};

    fn event(session: &str, payload: EventPayload) -> AgentEvent {
        AgentEvent::new(
            EventContext {
                agent_id: "coder".to_string(),
                session_key: SessionKey::new(session),
                run_id: RunId::new("r1"),
            },
            payload,
        )
    }

    #[tokio::test]
    async fn monitor_processes_events_and_stops_on_handle_drop() {
        let (handle, join) = TrustMonitor::spawn(WardenConfig {
            log_to_console: false,
            ..WardenConfig::default()
        });

        handle.emit(event(
            "s1",
            EventPayload::ToolCallEnd {
                tool_name: "bash".to_string(),
                parameters: serde_json::json!({}),
                outcome: ToolOutcome::Success {
                    result: serde_json::Value::Null,
                },
                duration_ms: 50,
            },
        ));
        handle.emit(event(
            "s1",
            EventPayload::RunEnd {
                message_history: vec![],
                success: true,
                error_message: None,
                duration_ms: 1000,
            },
        ));

        drop(handle);
        join.await.unwrap();
    }

    #[tokio::test]
    async fn clone_keeps_loop_alive_until_all_dropped() {
        let (handle, join) = TrustMonitor::spawn(WardenConfig::default());
        let extra = handle.clone();
        drop(handle);

        extra.emit(event(
            "s2",
            EventPayload::ModelCallStart {
                model: "sonnet".to_string(),
            },
        ));

        drop(extra);
        join.await.unwrap();
    }
}
