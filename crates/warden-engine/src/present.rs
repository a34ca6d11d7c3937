//! Local presentation of scores and flags.

use warden_core::types::{Severity, TrustScore};
use warden_core::SessionKey;

/// Render a score with its flags, one line per flag.
pub fn format_score(score: &TrustScore) -> String {
    let mut out = format!(
        "Trust score: {} (reliability {}, scope {}, cost {}, latency {})",
        score.overall, score.reliability, score.scope, score.cost, score.latency
    );
    for flag in &score.flags {
        out.push_str(&format!(
            "\n  [{}] {}: {}",
            severity_label(flag.severity),
            flag.dimension,
            flag.message
        ));
        if let Some(fix) = &flag.remediation {
            out.push_str(&format!(" ({fix})"));
        }
    }
    out
}

fn severity_label(severity: Severity) -> &'static str {
    match severity {
        Severity::Info => "info",
        Severity::Warning => "warn",
        Severity::Critical => "crit",
    }
}

/// Log a completed run's score through tracing.
pub fn log_score(session: &SessionKey, score: &TrustScore) {
    if score.has_critical() {
        tracing::warn!(
            session = %session,
            overall = score.overall,
            flags = score.flags.len(),
            "Run completed with critical flags"
        );
    } else {
        tracing::info!(
            session = %session,
            overall = score.overall,
            flags = score.flags.len(),
            "Run completed"
        );
    }
    for flag in &score.flags {
        tracing::info!(
            severity = severity_label(flag.severity),
            dimension = %flag.dimension,
            "{}",
            flag.message
        );
    }
}
