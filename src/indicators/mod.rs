// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free Supertrend pipeline:
//   range measure -> basic bands -> stabilised bands -> line + signal
//
// Warm-up values are never materialised; see `offset_series`.

pub mod atr;
pub mod bands;
pub mod error;
pub mod offset_series;
pub mod supertrend;

pub use error::IndicatorError;
pub use supertrend::{Supertrend, SupertrendParams};
