// =============================================================================
// Signal Watcher — one evaluation cycle over the watchlist
// =============================================================================
//
// Pipeline per (symbol, timeframe), strictly in configuration order:
//   1. Fetch the bar window (fetch failures collapse to an empty series)
//   2. Run the Supertrend pipeline on it
//   3. Feed the newest bar's signal to the transition tracker
//   4. On a flip, hand a SignalEvent to the notifier
//   5. Record a report row
//
// Nothing in a cycle is fatal: a series that fails at any step is logged and
// skipped, and the cycle moves on to the next one.  A skipped series leaves
// its tracker entry untouched.
// =============================================================================

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::indicators::{IndicatorError, Supertrend, SupertrendParams};
use crate::market_data::{Bar, Series, SeriesKey, SeriesProvider};
use crate::notify::{Notifier, SignalEvent};
use crate::signals::{TransitionResult, TransitionTracker};
use crate::types::{NotifyStatus, Signal};

// =============================================================================
// Results
// =============================================================================

/// Signal state of one series after a cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub key: SeriesKey,
    /// Newest bar in the window.
    pub bar: Bar,
    /// Supertrend line at the newest bar.
    pub line: f64,
    pub transition: TransitionResult,
}

impl Evaluation {
    pub fn signal(&self) -> Signal {
        self.transition.signal
    }

    /// Open time of the newest bar.  Timestamps chrono cannot represent fall
    /// back to the current time with a warning.
    pub fn bar_time(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.bar.timestamp, 0).unwrap_or_else(|| {
            warn!(
                key = %self.key,
                timestamp = self.bar.timestamp,
                "bar timestamp out of range, reporting current time"
            );
            Utc::now()
        })
    }
}

/// One console/report line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub key: SeriesKey,
    pub bar_time: DateTime<Utc>,
    pub price: f64,
    pub signal: Signal,
    pub notify: NotifyStatus,
}

/// A series that produced no signal this cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Skipped {
    pub key: SeriesKey,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CycleReport {
    pub rows: Vec<ReportRow>,
    pub skipped: Vec<Skipped>,
}

impl CycleReport {
    pub fn notified(&self) -> usize {
        self.rows.iter().filter(|r| r.notify.was_sent()).count()
    }
}

// =============================================================================
// SignalWatcher
// =============================================================================

/// Owns the indicator and the transition state for the process lifetime.
#[derive(Debug)]
pub struct SignalWatcher {
    indicator: Supertrend,
    tracker: TransitionTracker,
}

impl SignalWatcher {
    pub fn new(params: SupertrendParams) -> Result<Self, IndicatorError> {
        Ok(Self {
            indicator: Supertrend::new(params)?,
            tracker: TransitionTracker::new(),
        })
    }

    #[cfg(test)]
    pub fn tracker(&self) -> &TransitionTracker {
        &self.tracker
    }

    /// Classify the newest bar of `series` and record it with the tracker.
    ///
    /// `InsufficientData` leaves the tracker untouched.
    pub fn evaluate_series(&mut self, series: &Series) -> Result<Evaluation, IndicatorError> {
        let output = self.indicator.compute(series.bars())?;

        let (line, signal, bar) = match (output.classification.last(), series.last()) {
            (Some((line, signal)), Some(bar)) => (line, signal, *bar),
            _ => {
                return Err(IndicatorError::InsufficientData {
                    required: self.indicator.params().min_bars(),
                    got: series.len(),
                })
            }
        };

        debug!(
            key = %series.key(),
            range = ?output.raw.range.last(),
            upper = ?output.bands.upper.last(),
            lower = ?output.bands.lower.last(),
            "final bands at newest bar"
        );

        let transition = self.tracker.evaluate(series.key(), signal);

        Ok(Evaluation {
            key: series.key().clone(),
            bar,
            line,
            transition,
        })
    }

    /// Run one full cycle over `keys`.
    pub async fn run_cycle<P, N>(
        &mut self,
        provider: &P,
        notifier: &N,
        keys: &[SeriesKey],
        range: &str,
    ) -> CycleReport
    where
        P: SeriesProvider + ?Sized,
        N: Notifier + ?Sized,
    {
        let mut report = CycleReport::default();

        for key in keys {
            let series = match provider.fetch(key, range).await {
                Ok(series) => series,
                Err(e) => {
                    warn!(key = %key, error = %e, "fetch failed, treating as no data");
                    Series::empty(key.clone())
                }
            };

            let evaluation = match self.evaluate_series(&series) {
                Ok(ev) => ev,
                Err(e) => {
                    warn!(key = %key, bars = series.len(), error = %e, "supertrend unavailable, skipping");
                    report.skipped.push(Skipped {
                        key: key.clone(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            debug!(
                key = %key,
                close = evaluation.bar.close,
                line = evaluation.line,
                signal = %evaluation.signal(),
                "series evaluated"
            );

            let notify = if evaluation.transition.changed {
                deliver(notifier, &evaluation).await
            } else {
                NotifyStatus::Unchanged
            };

            report.rows.push(ReportRow {
                key: key.clone(),
                bar_time: evaluation.bar_time(),
                price: evaluation.bar.close,
                signal: evaluation.signal(),
                notify,
            });
        }

        info!(
            evaluated = report.rows.len(),
            skipped = report.skipped.len(),
            notified = report.notified(),
            "cycle complete"
        );
        report
    }
}

async fn deliver<N: Notifier + ?Sized>(notifier: &N, evaluation: &Evaluation) -> NotifyStatus {
    let event = SignalEvent::new(
        &evaluation.key,
        evaluation.signal(),
        evaluation.bar.close,
        evaluation.bar_time(),
    );

    info!(
        key = %evaluation.key,
        previous = ?evaluation.transition.previous,
        signal = %event.signal,
        close = event.close_price,
        "supertrend signal changed"
    );

    match notifier.notify(&event).await {
        Ok(()) => NotifyStatus::Sent(event.detected_at.format("%Y-%m-%d %H:%M:%S").to_string()),
        Err(e) => {
            warn!(key = %evaluation.key, error = %e, "notification failed");
            NotifyStatus::Failed(e.to_string())
        }
    }
}
