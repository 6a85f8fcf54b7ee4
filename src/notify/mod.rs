// =============================================================================
// Notification — delivering Supertrend flips to the operator
// =============================================================================
//
// The watcher emits one `SignalEvent` per detected transition.  How it reaches
// a human is the notifier's business.  `SmtpNotifier` emails it; the log and
// webhook notifiers cover setups without a mail account.
// =============================================================================

pub mod log;
pub mod smtp;
pub mod webhook;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::market_data::SeriesKey;
use crate::types::Signal;

pub use self::log::LogNotifier;
pub use smtp::SmtpNotifier;
pub use webhook::WebhookNotifier;

/// A detected signal transition.
#[derive(Debug, Clone, Serialize)]
pub struct SignalEvent {
    /// Unique identifier for this event (UUID v4).
    pub id: String,
    pub symbol: String,
    pub timeframe: String,
    pub signal: Signal,
    pub close_price: f64,
    /// Open time of the bar that produced the signal.
    pub bar_time: DateTime<Utc>,
    /// When the watcher detected the transition.
    pub detected_at: DateTime<Utc>,
}

impl SignalEvent {
    pub fn new(key: &SeriesKey, signal: Signal, close_price: f64, bar_time: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            symbol: key.symbol.clone(),
            timeframe: key.interval.clone(),
            signal,
            close_price,
            bar_time,
            detected_at: Utc::now(),
        }
    }

    pub fn subject(&self) -> String {
        format!(
            "{} ({}): Supertrend {} signal!",
            self.symbol, self.timeframe, self.signal
        )
    }

    pub fn body(&self) -> String {
        format!(
            "{} ({}): Supertrend {} signal detected at closing price: ${:.2}",
            self.symbol, self.timeframe, self.signal, self.close_price
        )
    }
}

/// Delivers signal events.  Errors are reported back to the cycle driver,
/// which logs them and carries on with the next series.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, event: &SignalEvent) -> anyhow::Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn event() -> SignalEvent {
        let key = SeriesKey::new("^GSPC", "30m");
        let bar_time = Utc.with_ymd_and_hms(2024, 5, 24, 19, 30, 0).unwrap();
        SignalEvent::new(&key, Signal::Long, 5304.7189, bar_time)
    }

    #[test]
    fn subject_and_body_format() {
        let e = event();
        assert_eq!(e.subject(), "^GSPC (30m): Supertrend LONG signal!");
        assert_eq!(
            e.body(),
            "^GSPC (30m): Supertrend LONG signal detected at closing price: $5304.72"
        );
    }

    #[test]
    fn events_get_distinct_ids() {
        assert_ne!(event().id, event().id);
    }

    #[test]
    fn event_serialises_signal_uppercase() {
        let json = serde_json::to_value(event()).unwrap();
        assert_eq!(json["signal"], "LONG");
        assert_eq!(json["timeframe"], "30m");
    }
}
