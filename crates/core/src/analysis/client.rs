use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use tracing::info;

use super::models::{AnalysisReport, AnalysisRequest, ErrorBody};
use crate::config::AppConfig;

/// Submits lineups to the remote analysis service. One request, no retries.
#[derive(Clone)]
pub struct AnalysisClient {
    client: reqwest::Client,
    endpoint: String,
}

impl AnalysisClient {
    /// Build a client from configuration.
    pub fn new(config: &AppConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("failed to build http client")?;
        Ok(Self {
            client,
            endpoint: format!("{}/analyze", config.api_base_url.trim_end_matches('/')),
        })
    }

    /// URL lineups are posted to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Post the lineup and parse the service's report.
    pub async fn submit(&self, request: &AnalysisRequest) -> Result<AnalysisReport> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .with_context(|| format!("failed to reach {}", self.endpoint))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .context("failed to read analysis response")?;
        if !status.is_success() {
            return Err(describe_failure(status, &body));
        }

        let report: AnalysisReport =
            serde_json::from_slice(&body).context("unexpected analysis response")?;
        info!(rating = report.team_rating, "Analysis received");
        Ok(report)
    }
}

fn describe_failure(status: reqwest::StatusCode, body: &[u8]) -> anyhow::Error {
    match serde_json::from_slice::<ErrorBody>(body) {
        Ok(ErrorBody { error }) => anyhow!("analysis failed: {error}"),
        Err(_) => anyhow!("analysis failed with status {status}"),
    }
}
