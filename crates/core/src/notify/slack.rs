//! Slack webhook notification sender.
//!
//! Posts a [`WebhookPayload`] to an incoming webhook URL.

use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use tracing::{debug, info, warn};

use crate::errors::NotificationError;
use crate::payload::WebhookPayload;

/// Slack incoming-webhook notifier.
pub struct SlackNotifier {
    webhook_url: String,
    http: reqwest::Client,
}

impl SlackNotifier {
    /// Create a new Slack notifier targeting the given webhook URL.
    pub fn new(webhook_url: String) -> Self {
        info!("initializing Slack notifier");
        Self {
            webhook_url,
            http: reqwest::Client::new(),
        }
    }

    pub fn webhook_url(&self) -> &str {
        &self.webhook_url
    }

    /// Send `payload` to the configured webhook, once.
    ///
    /// Any status below 300 counts as delivered and is returned to the
    /// caller. Transport failures and statuses of 300 or above are errors.
    pub async fn send(&self, payload: &WebhookPayload) -> Result<StatusCode, NotificationError> {
        let body = serde_json::to_vec(payload)?;
        debug!(len = body.len(), blocks = payload.blocks.len(), "sending Slack message");

        let resp = self
            .http
            .post(&self.webhook_url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(NotificationError::Transport)?;

        let status = resp.status();
        if status.as_u16() >= 300 {
            let body = resp.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Slack webhook returned error");
            return Err(NotificationError::Rejected {
                status: status.to_string(),
                body,
            });
        }

        info!(status = %status, "Slack message sent successfully");
        Ok(status)
    }
}
