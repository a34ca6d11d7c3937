//! Trust scoring engine.
//!
//! Pure and deterministic: (run record, outcome, configuration) → score.
//! Four dimension scores in [0,100] combine into a weighted overall
//! score, with explanatory flags attached to every deduction.

use warden_core::types::{Dimension, Flag, RunOutcome, Severity, TrustScore};
use warden_core::{RunRecord, WardenConfig};

const W_RELIABILITY: f64 = 0.30;
const W_SCOPE: f64 = 0.30;
const W_COST: f64 = 0.20;
const W_LATENCY: f64 = 0.20;

/// Score one completed run. Flags are ordered by dimension:
/// reliability, scope, cost, latency.
pub fn score_run(record: &RunRecord, outcome: &RunOutcome, config: &WardenConfig) -> TrustScore {
    let mut flags = Vec::new();

    let reliability = score_reliability(outcome, &mut flags);
    let scope = score_scope(record, &config.allowed_tools, &mut flags);
    let cost = score_cost(record.total_cost, config.cost_threshold, &mut flags);
    let latency = score_latency(
        &record.latencies_ms,
        outcome.duration_ms,
        config.latency_threshold_ms,
        &mut flags,
    );

    let overall = round_half_up(
        f64::from(reliability) * W_RELIABILITY
            + f64::from(scope) * W_SCOPE
            + f64::from(cost) * W_COST
            + f64::from(latency) * W_LATENCY,
    );

    TrustScore {
        reliability,
        scope,
        cost,
        latency,
        overall,
        flags,
    }
}

fn score_reliability(outcome: &RunOutcome, flags: &mut Vec<Flag>) -> u8 {
    if outcome.success {
        return 100;
    }

    let message = match &outcome.error_message {
        Some(err) => format!("Run failed: {err}"),
        None => "Run failed without an error message".to_string(),
    };
    flags.push(Flag {
        severity: Severity::Critical,
        dimension: Dimension::Reliability,
        message,
        remediation: None,
    });
    0
}

fn score_scope(record: &RunRecord, allowed: &[String], flags: &mut Vec<Flag>) -> u8 {
    if allowed.is_empty() || record.violations.is_empty() {
        return 100;
    }

    let tool_count = record.tools_used.len().max(1);
    let violation_rate = record.violations.len() as f64 / tool_count as f64;
    let score = round_half_up(((1.0 - violation_rate) * 100.0).max(0.0));

    // Severity is derived from the aggregate rate and applied identically
    // to every per-tool flag.
    let severity = if violation_rate > 0.5 {
        Severity::Critical
    } else {
        Severity::Warning
    };

    let mut seen: Vec<&str> = Vec::new();
    for name in &record.violations {
        if seen.contains(&name.as_str()) {
            continue;
        }
        seen.push(name);
        flags.push(Flag {
            severity,
            dimension: Dimension::Scope,
            message: format!("Tool '{name}' was invoked outside the allow-list"),
            remediation: Some(format!(
                "Add '{name}' to allowed_tools or remove it from the agent"
            )),
        });
    }

    score
}

fn score_cost(total_cost: f64, threshold: f64, flags: &mut Vec<Flag>) -> u8 {
    if total_cost <= threshold {
        return 100;
    }

    let overage = total_cost / threshold;
    let score = round_half_up((100.0 / overage).max(0.0));
    let severity = if overage > 3.0 {
        Severity::Critical
    } else {
        Severity::Warning
    };
    flags.push(Flag {
        severity,
        dimension: Dimension::Cost,
        message: format!("Total cost ${total_cost:.4} exceeded threshold ${threshold}"),
        remediation: Some("Raise cost_threshold or reduce model usage per run".to_string()),
    });
    score
}

fn score_latency(
    latencies_ms: &[u64],
    run_duration_ms: u64,
    threshold_ms: u64,
    flags: &mut Vec<Flag>,
) -> u8 {
    let slow_count = latencies_ms.iter().filter(|&&l| l > threshold_ms).count();

    let score = if slow_count == 0 {
        100
    } else {
        let sample_count = latencies_ms.len().max(1);
        let slow_rate = slow_count as f64 / sample_count as f64;
        let severity = if slow_rate > 0.5 {
            Severity::Critical
        } else {
            Severity::Warning
        };
        flags.push(Flag {
            severity,
            dimension: Dimension::Latency,
            message: format!(
                "{slow_count}/{} calls exceeded {threshold_ms}ms",
                latencies_ms.len()
            ),
            remediation: None,
        });
        round_half_up(((1.0 - slow_rate) * 100.0).max(0.0))
    };

    // Separate check on overall run duration; both flags may coexist.
    if run_duration_ms > 2 * threshold_ms {
        flags.push(Flag {
            severity: Severity::Warning,
            dimension: Dimension::Latency,
            message: format!(
                "Run duration {run_duration_ms}ms exceeded {}ms",
                2 * threshold_ms
            ),
            remediation: None,
        });
    }

    score
}

fn round_half_up(value: f64) -> u8 {
    (value + 0.5).floor() as u8
}
