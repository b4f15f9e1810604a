//! Webhook-backed [`Notifier`] port.
//!
//! Desktop/headless builds have no OS notification center, so delivery goes
//! through a configurable JSON webhook instead. With no URL configured the
//! port degrades to a structured log line and a synthetic id, which keeps
//! the dispatch path exercised in local runs.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::info;

use super::{NotificationRequest, Notifier};

pub struct WebhookNotifier {
    webhook_url: Option<String>,
    client: Client,
    timeout: Duration,
}

impl WebhookNotifier {
    pub fn new(client: Client, webhook_url: Option<String>) -> Self {
        Self {
            webhook_url,
            client,
            timeout: Duration::from_secs(5),
        }
    }

    pub fn from_env() -> Self {
        Self::new(Client::new(), std::env::var("NOTIFY_WEBHOOK_URL").ok())
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    fn synthetic_id() -> String {
        format!("local-{}", chrono::Utc::now().timestamp_millis())
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn schedule(&self, req: &NotificationRequest) -> Result<String> {
        let Some(url) = &self.webhook_url else {
            info!(title = %req.title, body = %req.body, "notification (webhook disabled)");
            return Ok(Self::synthetic_id());
        };

        self.client
            .post(url)
            .timeout(self.timeout)
            .json(req)
            .send()
            .await
            .context("webhook post")?
            .error_for_status()
            .context("webhook non-2xx")?;

        Ok(Self::synthetic_id())
    }
}
