// =============================================================================
// Transition Tracker — last-known Supertrend signal per watched series
// =============================================================================
//
// The only mutable state in the signal pipeline.  One tracker is owned by the
// cycle driver and handed around by `&mut`, so every read-modify-write happens
// inside a single sequential pass.  State lives for the process lifetime; a
// restart starts with no prior signals and therefore reports every series as
// changed on its first evaluation.

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use crate::market_data::SeriesKey;
use crate::types::Signal;

/// Outcome of feeding one new signal into the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TransitionResult {
    pub changed: bool,
    pub signal: Signal,
    /// Signal recorded before this evaluation, if any.
    pub previous: Option<Signal>,
}

#[derive(Debug, Default)]
pub struct TransitionTracker {
    last: HashMap<SeriesKey, Signal>,
}

impl TransitionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `signal` for `key` and report whether it differs from the last
    /// one seen.  A key with no history always counts as changed.
    pub fn evaluate(&mut self, key: &SeriesKey, signal: Signal) -> TransitionResult {
        let previous = self.last.get(key).copied();
        let changed = previous != Some(signal);

        if changed {
            self.last.insert(key.clone(), signal);
            debug!(key = %key, ?previous, %signal, "signal transition recorded");
        }

        TransitionResult {
            changed,
            signal,
            previous,
        }
    }

    #[cfg(test)]
    pub fn last_signal(&self, key: &SeriesKey) -> Option<Signal> {
        self.last.get(key).copied()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.last.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.last.is_empty()
    }
}
