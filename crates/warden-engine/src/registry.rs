//! Session-keyed registry of in-flight run records.
//!
//! The registry is exclusively owned by one engine instance and mutated
//! only between events, so it needs no locking. Stale records are
//! reclaimed by a periodic sweep, never reactively on the event path.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use warden_core::events::EventContext;
use warden_core::types::RunRecord;
use warden_core::SessionKey;

/// Mapping from session identity to the single in-flight run record.
#[derive(Debug, Default)]
pub struct RunRegistry {
    runs: HashMap<SessionKey, RunRecord>,
}

impl RunRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the record for this session, creating one if absent.
    ///
    /// A different run id for an already-registered session drops the
    /// prior record wholesale and starts fresh. No merge.
    pub fn get_or_create(&mut self, ctx: &EventContext, now: DateTime<Utc>) -> &mut RunRecord {
        match self.runs.entry(ctx.session_key.clone()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().run_id != ctx.run_id {
                    let old = occupied.insert(RunRecord::new(
                        ctx.session_key.clone(),
                        ctx.run_id.clone(),
                        ctx.agent_id.clone(),
                        now,
                    ));
                    tracing::debug!(
                        session = %ctx.session_key,
                        old_run = %old.run_id,
                        new_run = %ctx.run_id,
                        dropped_actions = old.actions.len(),
                        "Run id changed, superseding prior record"
                    );
                }
                occupied.into_mut()
            }
            Entry::Vacant(vacant) => vacant.insert(RunRecord::new(
                ctx.session_key.clone(),
                ctx.run_id.clone(),
                ctx.agent_id.clone(),
                now,
            )),
        }
    }

    /// Remove every record idle longer than `ttl`. Returns the evicted count.
    pub fn evict_stale(&mut self, ttl: Duration, now: DateTime<Utc>) -> usize {
        let before = self.runs.len();
        self.runs.retain(|key, record| {
            let keep = now - record.last_activity <= ttl;
            if !keep {
                tracing::info!(
                    session = %key,
                    run = %record.run_id,
                    idle_secs = (now - record.last_activity).num_seconds(),
                    "Evicting stale run"
                );
            }
            keep
        });
        before - self.runs.len()
    }

    /// Delete a record after it has been scored and reported.
    pub fn remove(&mut self, session_key: &SessionKey) -> Option<RunRecord> {
        self.runs.remove(session_key)
    }

    pub fn get(&self, session_key: &SessionKey) -> Option<&RunRecord> {
        self.runs.get(session_key)
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }
}
