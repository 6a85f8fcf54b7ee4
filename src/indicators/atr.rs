// =============================================================================
// Range Measure — simple-average high/low range (ATR proxy)
// =============================================================================
//
// The watcher uses a simplified Average True Range: the plain mean of the bar
// range over a trailing window, without the previous-close gap terms.
//
//   RM_i = (1 / period) * Σ_{j = i-period+1 .. i} (H_j - L_j)
//
// RM is defined from bar `period - 1` onward.
//
// Default period: 10
// =============================================================================

use crate::market_data::Bar;

use super::offset_series::OffsetSeries;

/// Compute the trailing mean of `high - low` for every bar that has a full
/// `period`-bar window behind it.
///
/// The result starts at bar `period - 1`.  A window shorter than `period`
/// yields an empty series starting at the same offset.
///
/// # Panics
/// When `period` is zero.  Callers validate parameters first.
pub fn calculate_range_sma(bars: &[Bar], period: usize) -> OffsetSeries {
    assert!(period > 0, "range measure period must be positive");

    // Each window is summed directly rather than with a running sum, so a
    // long window never accumulates subtraction error.
    let values = bars
        .windows(period)
        .map(|w| w.iter().map(Bar::range).sum::<f64>() / period as f64)
        .collect();

    OffsetSeries::new("range measure", period - 1, values)
}
