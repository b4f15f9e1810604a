//! source.rs — the insight feed seam and its HTTP implementation.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;

use crate::insight::Insight;

#[async_trait]
pub trait InsightSource: Send + Sync {
    async fn fetch_insights(&self) -> Result<Vec<Insight>>;
    fn name(&self) -> &str {
        "insight-source"
    }
}

/// GET `{endpoint}` → JSON array of insights. Consumed by both the critical
/// poller and the badge-count aggregator.
pub struct HttpInsightSource {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpInsightSource {
    pub fn new(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            timeout: Duration::from_secs(5),
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }
}

#[async_trait]
impl InsightSource for HttpInsightSource {
    async fn fetch_insights(&self) -> Result<Vec<Insight>> {
        let resp = self
            .client
            .get(&self.endpoint)
            .timeout(self.timeout)
            .send()
            .await
            .context("fetch insights")?
            .error_for_status()
            .context("insights non-2xx")?;

        let insights: Vec<Insight> = resp.json().await.context("parse insights JSON")?;
        Ok(insights)
    }

    fn name(&self) -> &str {
        "insights-api"
    }
}
