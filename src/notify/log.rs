use async_trait::async_trait;
use tracing::info;

use super::{Notifier, SignalEvent};

/// Writes transitions to the log.  Default when no webhook is configured.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, event: &SignalEvent) -> anyhow::Result<()> {
        info!(
            id = %event.id,
            symbol = %event.symbol,
            timeframe = %event.timeframe,
            signal = %event.signal,
            close = event.close_price,
            bar_time = %event.bar_time,
            "{}",
            event.body()
        );
        Ok(())
    }
}
