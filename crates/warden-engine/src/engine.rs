//! The trust engine: event dispatch and run lifecycle.
//!
//! Each event is handled to completion synchronously before the next is
//! processed; the only detached work is report dispatch. Internal
//! failures are caught at the top level and logged, since observability
//! must never destabilize the host it observes.

use chrono::{DateTime, Duration, Utc};

use warden_core::events::{AgentEvent, EventPayload};
use warden_core::types::{RunOutcome, TrustScore};
use warden_core::WardenConfig;
use warden_report::{LedgerClient, LedgerConfig, RunReport};

use crate::registry::RunRegistry;
use crate::{accumulate, ingest, present, score};

/// Stateful run-aggregation and trust-scoring engine.
///
/// Owns the run registry for its lifetime; constructed once per host and
/// torn down at shutdown. No process-wide state.
pub struct TrustEngine {
    config: WardenConfig,
    registry: RunRegistry,
    reporter: Option<LedgerClient>,
}

impl TrustEngine {
    pub fn new(config: WardenConfig) -> Self {
        let reporter = config.endpoint.as_ref().map(|endpoint| {
            LedgerClient::new(LedgerConfig {
                endpoint: endpoint.clone(),
                api_key: config.api_key.clone(),
                verbose: config.verbose,
                ..LedgerConfig::default()
            })
        });

        Self {
            config,
            registry: RunRegistry::new(),
            reporter,
        }
    }

    /// Handle one canonical event to completion.
    ///
    /// Returns the trust score when the event was terminal. Never fails
    /// the caller: an unexpected panic anywhere in aggregation or scoring
    /// is caught here, logged, and swallowed.
    pub fn handle_event(&mut self, event: AgentEvent) -> Option<TrustScore> {
        let session = event.context.session_key.clone();
        let result =
            std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| self.dispatch(event)));
        match result {
            Ok(score) => score,
            Err(_) => {
                tracing::error!(session = %session, "Event handling panicked, event discarded");
                None
            }
        }
    }

    /// Coerce a raw host payload and handle it. Unrecognized or malformed
    /// payloads are dropped silently.
    pub fn handle_raw(&mut self, raw: &serde_json::Value) -> Option<TrustScore> {
        ingest::canonicalize(raw).and_then(|event| self.handle_event(event))
    }

    fn dispatch(&mut self, event: AgentEvent) -> Option<TrustScore> {
        let now = Utc::now();

        match event.payload {
            EventPayload::ModelCallStart { .. } => {
                self.registry.get_or_create(&event.context, now).touch(now);
                None
            }
            EventPayload::ModelCallEnd {
                model,
                input_tokens,
                output_tokens,
                cost,
                latency_ms,
                ..
            } => {
                let record = self.registry.get_or_create(&event.context, now);
                accumulate::record_model_call(
                    record,
                    &model,
                    input_tokens,
                    output_tokens,
                    cost,
                    latency_ms,
                    now,
                );
                None
            }
            EventPayload::ToolCallEnd {
                tool_name,
                parameters,
                outcome,
                duration_ms,
            } => {
                let record = self.registry.get_or_create(&event.context, now);
                accumulate::record_tool_call(
                    record,
                    &tool_name,
                    &parameters,
                    &outcome,
                    duration_ms,
                    &self.config.allowed_tools,
                    now,
                );
                None
            }
            EventPayload::RunEnd {
                message_history,
                success,
                error_message,
                duration_ms,
            } => {
                let outcome = RunOutcome {
                    success,
                    error_message,
                    duration_ms,
                };

                // Lookup-or-create covers the fallback path: a run-end with
                // no prior events still yields a record via the history scan.
                let record = self.registry.get_or_create(&event.context, now);
                accumulate::scan_history(record, &message_history, &self.config.allowed_tools, now);

                let trust = score::score_run(record, &outcome, &self.config);

                if self.config.log_to_console {
                    present::log_score(&record.session_key, &trust);
                }
                if let Some(reporter) = &self.reporter {
                    reporter.dispatch(RunReport::build(record, &trust, now));
                }

                self.registry.remove(&event.context.session_key);
                Some(trust)
            }
        }
    }

    /// Remove runs idle beyond the configured time-to-live.
    /// Called from the periodic maintenance tick.
    pub fn evict_stale(&mut self, now: DateTime<Utc>) -> usize {
        let ttl = Duration::seconds(self.config.run_ttl_secs as i64);
        self.registry.evict_stale(ttl, now)
    }

    pub fn active_runs(&self) -> usize {
        self.registry.len()
    }

    pub fn config(&self) -> &WardenConfig {
        &self.config
    }
}
