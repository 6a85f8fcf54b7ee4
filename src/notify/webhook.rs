// =============================================================================
// Webhook notifier — JSON POST per transition
// =============================================================================
//
// Payload carries the pre-rendered email fields alongside the structured
// event so the receiving relay can either forward the message verbatim or
// build its own.
// =============================================================================

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, instrument};

use super::{Notifier, SignalEvent};

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    from: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    to: Option<&'a str>,
    subject: String,
    body: String,
    event: &'a SignalEvent,
}

#[derive(Clone)]
pub struct WebhookNotifier {
    url: String,
    sender: Option<String>,
    recipient: Option<String>,
    client: reqwest::Client,
}

impl WebhookNotifier {
    pub fn new(
        url: impl Into<String>,
        sender: Option<String>,
        recipient: Option<String>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .context("failed to build webhook HTTP client")?;

        Ok(Self {
            url: url.into(),
            sender,
            recipient,
            client,
        })
    }

    fn payload<'a>(&'a self, event: &'a SignalEvent) -> WebhookPayload<'a> {
        WebhookPayload {
            from: self.sender.as_deref(),
            to: self.recipient.as_deref(),
            subject: event.subject(),
            body: event.body(),
            event,
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    #[instrument(skip(self, event), name = "webhook::notify", fields(id = %event.id))]
    async fn notify(&self, event: &SignalEvent) -> Result<()> {
        let resp = self
            .client
            .post(&self.url)
            .json(&self.payload(event))
            .send()
            .await
            .context("webhook request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("webhook returned {}: {}", status, body);
        }

        debug!(symbol = %event.symbol, signal = %event.signal, "webhook delivered");
        Ok(())
    }
}

impl std::fmt::Debug for WebhookNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The URL often embeds a relay token.
        f.debug_struct("WebhookNotifier")
            .field("url", &"<redacted>")
            .field("sender", &self.sender)
            .field("recipient", &self.recipient)
            .finish()
    }
}
