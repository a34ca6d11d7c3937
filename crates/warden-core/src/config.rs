//! Configuration for the Warden trust engine.
//!
//! Loaded from `warden.toml` `[warden]` section or `WARDEN__` environment
//! variables. Every field is optional with a stated default, so an empty
//! config yields a working engine with reporting disabled.

use serde::Deserialize;

use crate::error::WardenError;

/// Engine configuration surface.
#[derive(Debug, Clone, Deserialize)]
pub struct WardenConfig {
    /// Remote ledger endpoint. None disables reporting.
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Bearer credential for the ledger endpoint.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Tool allow-list. Empty means unrestricted.
    #[serde(default)]
    pub allowed_tools: Vec<String>,

    /// Cost alert threshold in currency units.
    #[serde(default = "default_cost_threshold")]
    pub cost_threshold: f64,

    /// Latency alert threshold in milliseconds.
    #[serde(default = "default_latency_threshold_ms")]
    pub latency_threshold_ms: u64,

    /// Log score summaries locally on run completion.
    #[serde(default = "default_true")]
    pub log_to_console: bool,

    /// Verbose diagnostics, including report transport failures.
    #[serde(default)]
    pub verbose: bool,

    /// Idle time-to-live in seconds before a run is reclaimed by the sweep.
    #[serde(default = "default_run_ttl_secs")]
    pub run_ttl_secs: u64,

    /// Interval in seconds between staleness sweeps.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

fn default_cost_threshold() -> f64 {
    0.50
}

fn default_latency_threshold_ms() -> u64 {
    30_000
}

fn default_run_ttl_secs() -> u64 {
    600
}

fn default_sweep_interval_secs() -> u64 {
    60
}

fn default_true() -> bool {
    true
}

impl Default for WardenConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            allowed_tools: Vec::new(),
            cost_threshold: default_cost_threshold(),
            latency_threshold_ms: default_latency_threshold_ms(),
            log_to_console: true,
            verbose: false,
            run_ttl_secs: default_run_ttl_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl WardenConfig {
    /// Load configuration from `{file_prefix}.toml` and `WARDEN__` env vars.
    /// A missing file or `[warden]` section falls back to defaults.
    pub fn load(file_prefix: &str) -> Result<Self, WardenError> {
        let cfg = config::Config::builder()
            .add_source(config::File::with_name(file_prefix).required(false))
            .add_source(
                config::Environment::with_prefix("WARDEN")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| WardenError::Config(e.to_string()))?;

        match cfg.get::<WardenConfig>("warden") {
            Ok(c) => Ok(c),
            Err(_) => Ok(WardenConfig::default()),
        }
    }
}
