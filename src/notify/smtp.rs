// =============================================================================
// SMTP notifier — one plain-text email per transition
// =============================================================================
//
// STARTTLS submission (smtp.gmail.com:587 by default) authenticated with the
// sender account.  A new connection is opened per message; flips are rare
// enough that pooling buys nothing.
// =============================================================================

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, instrument};

use super::{Notifier, SignalEvent};

const SMTP_TIMEOUT: Duration = Duration::from_secs(30);

pub struct SmtpNotifier {
    relay: String,
    port: u16,
    from: Mailbox,
    to: Mailbox,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpNotifier {
    /// Validates both addresses and prepares the STARTTLS transport.  No
    /// connection is made until the first message is sent.
    pub fn new(
        relay: &str,
        port: u16,
        from: &str,
        to: &str,
        username: String,
        password: String,
    ) -> Result<Self> {
        let from: Mailbox = from
            .parse()
            .with_context(|| format!("invalid sender address {from:?}"))?;
        let to: Mailbox = to
            .parse()
            .with_context(|| format!("invalid recipient address {to:?}"))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(relay)
            .with_context(|| format!("failed to set up STARTTLS relay {relay}"))?
            .port(port)
            .credentials(Credentials::new(username, password))
            .timeout(Some(SMTP_TIMEOUT))
            .build();

        Ok(Self {
            relay: relay.to_string(),
            port,
            from,
            to,
            transport,
        })
    }

    fn message(&self, event: &SignalEvent) -> Result<Message> {
        Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(event.subject())
            .header(ContentType::TEXT_PLAIN)
            .body(event.body())
            .context("failed to build email")
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    #[instrument(skip(self, event), name = "smtp::notify", fields(id = %event.id))]
    async fn notify(&self, event: &SignalEvent) -> Result<()> {
        let message = self.message(event)?;
        self.transport
            .send(message)
            .await
            .with_context(|| format!("smtp delivery via {}:{} failed", self.relay, self.port))?;

        debug!(symbol = %event.symbol, signal = %event.signal, to = %self.to, "email sent");
        Ok(())
    }
}

impl std::fmt::Debug for SmtpNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpNotifier")
            .field("relay", &self.relay)
            .field("port", &self.port)
            .field("from", &self.from.to_string())
            .field("to", &self.to.to_string())
            .finish_non_exhaustive()
    }
}
