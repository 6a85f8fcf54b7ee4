use chrono::DateTime;
use serde::{Deserialize, Serialize};
use tracing::debug;

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

/// A single OHLC bar.  `timestamp` is the bar open time in UNIX seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Bar {
    pub fn new(timestamp: i64, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
        }
    }

    /// Midpoint of the bar's range, `(high + low) / 2`.
    pub fn midpoint(&self) -> f64 {
        (self.high + self.low) / 2.0
    }

    /// `high - low`.
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    /// Finite prices and a timestamp chrono can represent.
    fn is_usable(&self) -> bool {
        self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite()
            && DateTime::from_timestamp(self.timestamp, 0).is_some()
    }
}

/// Composite key that identifies one watched series.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct SeriesKey {
    pub symbol: String,
    pub interval: String,
}

impl SeriesKey {
    pub fn new(symbol: impl Into<String>, interval: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            interval: interval.into(),
        }
    }
}

impl std::fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.symbol, self.interval)
    }
}

// ---------------------------------------------------------------------------
// Series -- ordered, de-duplicated bar window
// ---------------------------------------------------------------------------

/// Ordered bar window for one `(symbol, interval)` pair.
///
/// Construction normalises whatever the provider returned: bars with
/// non-finite prices or unrepresentable timestamps are dropped, the rest are
/// sorted by timestamp and duplicate timestamps collapse to the last one
/// received.  The result is strictly ascending and immutable.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    key: SeriesKey,
    bars: Vec<Bar>,
}

impl Series {
    pub fn new(key: SeriesKey, bars: impl IntoIterator<Item = Bar>) -> Self {
        let received: Vec<Bar> = bars.into_iter().collect();
        let total = received.len();

        let mut bars: Vec<Bar> = received.into_iter().filter(Bar::is_usable).collect();
        let dropped = total - bars.len();

        // Stable sort keeps arrival order among equal timestamps, so the
        // dedup below can keep the latest arrival.
        bars.sort_by_key(|b| b.timestamp);
        let mut deduped: Vec<Bar> = Vec::with_capacity(bars.len());
        for bar in bars {
            match deduped.last_mut() {
                Some(last) if last.timestamp == bar.timestamp => *last = bar,
                _ => deduped.push(bar),
            }
        }

        if dropped > 0 {
            debug!(key = %key, dropped, "dropped bars with non-finite prices or bad timestamps");
        }

        Self { key, bars: deduped }
    }

    /// Series with no bars.  Fetch failures collapse to this.
    pub fn empty(key: SeriesKey) -> Self {
        Self { key, bars: Vec::new() }
    }

    pub fn key(&self) -> &SeriesKey {
        &self.key
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    #[cfg(test)]
    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
