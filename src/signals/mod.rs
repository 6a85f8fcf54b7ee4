// =============================================================================
// Signals Module
// =============================================================================
//
// Per-series signal state: remembers the last Supertrend signal and reports
// flips.

pub mod transition;

pub use transition::{TransitionResult, TransitionTracker};
