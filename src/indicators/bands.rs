// =============================================================================
// Basic Supertrend Bands
// =============================================================================
//
//   mid_i         = (H_i + L_i) / 2
//   basic_upper_i = mid_i + multiplier * RM_i
//   basic_lower_i = mid_i - multiplier * RM_i
//
// where RM is the range measure from `atr.rs`.  Both bands share the range
// measure's warm-up: they exist from bar `period - 1`.
// =============================================================================

use crate::market_data::Bar;

use super::atr::calculate_range_sma;
use super::offset_series::OffsetSeries;

/// Raw (unstabilised) band pair plus the range measure they came from.
#[derive(Debug, Clone, PartialEq)]
pub struct RawBands {
    pub range: OffsetSeries,
    pub upper: OffsetSeries,
    pub lower: OffsetSeries,
}

/// Compute the raw upper/lower bands for `bars`.
///
/// Pure function of the window.  `period` must be positive; `multiplier` is
/// applied as-is.
pub fn calculate_raw_bands(bars: &[Bar], period: usize, multiplier: f64) -> RawBands {
    let range = calculate_range_sma(bars, period);

    let (upper, lower): (Vec<f64>, Vec<f64>) = range
        .iter()
        .map(|(i, rm)| {
            let mid = bars[i].midpoint();
            let offset = multiplier * rm;
            (mid + offset, mid - offset)
        })
        .unzip();

    RawBands {
        upper: OffsetSeries::new("basic upper band", range.start(), upper),
        lower: OffsetSeries::new("basic lower band", range.start(), lower),
        range,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(high: f64, low: f64, close: f64) -> Bar {
        Bar::new(0, close, high, low, close)
    }

    #[test]
    fn bands_straddle_midpoint() {
        let bars: Vec<Bar> = (0..5).map(|i| bar(102.0 + i as f64, 98.0 + i as f64, 100.0)).collect();
        let raw = calculate_raw_bands(&bars, 3, 2.0);

        assert_eq!(raw.upper.start(), 2);
        assert_eq!(raw.lower.defined(), raw.range.defined());
        for i in raw.upper.defined() {
            let mid = bars[i].midpoint();
            // Every bar has range 4, so RM = 4 and the offset is 8.
            assert!((raw.upper[i] - (mid + 8.0)).abs() < 1e-12);
            assert!((raw.lower[i] - (mid - 8.0)).abs() < 1e-12);
        }
    }

    #[test]
    fn zero_range_collapses_bands() {
        let bars = vec![bar(100.0, 100.0, 100.0); 10];
        let raw = calculate_raw_bands(&bars, 10, 3.0);
        assert_eq!(raw.upper.values(), &[100.0]);
        assert_eq!(raw.lower.values(), &[100.0]);
    }

    #[test]
    fn upper_never_below_lower() {
        let bars: Vec<Bar> = (0..30)
            .map(|i| {
                let base = 100.0 + (i as f64 * 0.7).sin() * 5.0;
                bar(base + 1.5, base - 1.0, base)
            })
            .collect();
        let raw = calculate_raw_bands(&bars, 10, 3.0);
        for i in raw.upper.defined() {
            assert!(raw.upper[i] >= raw.lower[i]);
        }
    }

    #[test]
    #[should_panic(expected = "basic upper band is undefined")]
    fn reading_warm_up_band_panics() {
        let bars = vec![bar(101.0, 99.0, 100.0); 12];
        let raw = calculate_raw_bands(&bars, 10, 3.0);
        let _ = raw.upper[3];
    }
}
