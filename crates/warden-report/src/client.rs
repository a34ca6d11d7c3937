//! Authenticated ledger submission client.
//!
//! Dispatch is fire-and-forget: the engine hands over a finalized report
//! and regains control immediately. Transport failures are logged and the
//! report is lost. There is no retry policy, so the engine never blocks
//! on or accumulates reporting work.

use std::time::Duration;

use crate::payload::RunReport;

/// Errors from ledger submission.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Ledger transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Ledger rejected report with status {code}: {body}")]
    Status { code: u16, body: String },
}

/// Configuration for connecting to the remote ledger.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    /// Log transport failures at warn instead of debug.
    pub verbose: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8787/api/v1".to_string(),
            api_key: None,
            timeout_secs: 10,
            verbose: false,
        }
    }
}

/// HTTP client for the remote ledger. Clone is cheap (inner Arc).
#[derive(Clone)]
pub struct LedgerClient {
    http: reqwest::Client,
    config: LedgerConfig,
}

impl LedgerClient {
    pub fn new(config: LedgerConfig) -> Self {
        // Fall back to reqwest defaults if builder creation fails for any reason.
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { http, config }
    }

    /// Submit one report and await the outcome.
    pub async fn submit(&self, report: &RunReport) -> Result<(), ReportError> {
        let url = format!("{}/runs", self.config.endpoint.trim_end_matches('/'));

        let mut request = self.http.post(&url).json(report);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ReportError::Status {
                code: status.as_u16(),
                body,
            });
        }

        tracing::debug!(report_id = %report.report_id, "Report accepted by ledger");
        Ok(())
    }

    /// Dispatch a report as a detached task and return immediately.
    ///
    /// The transport outcome is never awaited by the caller. Failures are
    /// caught here and logged; the report is dropped.
    pub fn dispatch(&self, report: RunReport) {
        let client = self.clone();
        let verbose = self.config.verbose;
        tokio::spawn(async move {
            let report_id = report.report_id;
            if let Err(e) = client.submit(&report).await {
                if verbose {
                    tracing::warn!(%report_id, error = %e, "Report submission failed, dropping");
                } else {
                    tracing::debug!(%report_id, error = %e, "Report submission failed, dropping");
                }
            }
        });
    }
}
