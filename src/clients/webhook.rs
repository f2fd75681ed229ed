use anyhow::{Context, Result};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    text: &'a str,
}

/// Team chat channel that receives one-line event messages.
#[async_trait::async_trait]
pub trait ChatWebhook: Send + Sync {
    async fn post(&self, text: &str) -> Result<()>;
}

/// Incoming-webhook client (Slack-compatible `{"text": ...}` body).
#[derive(Clone)]
pub struct SlackWebhook {
    client: Client,
    url: String,
}

impl SlackWebhook {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent("Clozer/1.0")
            .timeout(timeout)
            .build()
            .context("Failed to build webhook HTTP client")?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait::async_trait]
impl ChatWebhook for SlackWebhook {
    async fn post(&self, text: &str) -> Result<()> {
        let response = self
            .client
            .post(&self.url)
            .json(&WebhookPayload { text })
            .send()
            .await
            .context("Webhook request failed")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Webhook returned {status}");
        }

        debug!("Webhook message delivered");
        Ok(())
    }
}
