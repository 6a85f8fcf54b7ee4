// =============================================================================
// Supertrend — band stabilisation and signal classification
// =============================================================================
//
// Final bands are seeded at bar `period` from the basic bands of the first
// `period` bars, then evolve strictly left to right:
//
//   FU_i = min(BU_i, FU_{i-1})   if C_{i-1} <= FU_{i-1}   else BU_i
//   FL_i = max(BL_i, FL_{i-1})   if C_{i-1} >= FL_{i-1}   else BL_i
//
// so the upper band only ratchets down while price holds under it and the
// lower band only ratchets up while price holds over it.
//
// Classification per bar:
//
//   line_i   = FU_i if C_i <= FU_i else FL_i
//   signal_i = LONG if C_i > line_i else SHORT      (ties are SHORT)
//
// Defaults: period 10, multiplier 3.
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::market_data::Bar;
use crate::types::Signal;

use super::bands::{calculate_raw_bands, RawBands};
use super::error::{IndicatorError, Result};
use super::offset_series::OffsetSeries;

fn default_period() -> usize {
    10
}

fn default_multiplier() -> f64 {
    3.0
}

// =============================================================================
// Parameters
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SupertrendParams {
    /// Range-measure look-back and seed position.
    #[serde(default = "default_period")]
    pub period: usize,

    /// Band distance from the bar midpoint, in range-measure units.
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
}

impl Default for SupertrendParams {
    fn default() -> Self {
        Self {
            period: default_period(),
            multiplier: default_multiplier(),
        }
    }
}

impl SupertrendParams {
    #[cfg(test)]
    pub fn new(period: usize, multiplier: f64) -> Result<Self> {
        let params = Self { period, multiplier };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        if self.period == 0 {
            return Err(IndicatorError::InvalidParameter {
                name: "period",
                reason: "must be at least 1".to_string(),
            });
        }
        if !self.multiplier.is_finite() || self.multiplier <= 0.0 {
            return Err(IndicatorError::InvalidParameter {
                name: "multiplier",
                reason: format!("must be finite and positive, got {}", self.multiplier),
            });
        }
        Ok(())
    }

    /// Bars needed before the newest bar carries a signal.
    pub fn min_bars(&self) -> usize {
        self.period + 1
    }
}

// =============================================================================
// Band stabiliser
// =============================================================================

/// Stabilised band pair, defined from bar `period` onward.
#[derive(Debug, Clone, PartialEq)]
pub struct FinalBands {
    pub upper: OffsetSeries,
    pub lower: OffsetSeries,
}

/// Fold the raw bands into final bands.
///
/// The seed is the mean of the raw band over bars `0..period` (bar `period`
/// itself excluded), taken over the bars in that range where the raw band is
/// defined.  With the SMA range measure only bar `period - 1` qualifies, so
/// the seed equals that bar's raw band.
///
/// Returns `InsufficientData` when `closes` has `period` bars or fewer.
///
/// # Panics
/// If `raw` does not cover every bar of `closes` from `period - 1` on.
pub fn stabilize_bands(raw: &RawBands, closes: &[f64], period: usize) -> Result<FinalBands> {
    if period == 0 {
        return Err(IndicatorError::InvalidParameter {
            name: "period",
            reason: "must be at least 1".to_string(),
        });
    }
    let n = closes.len();
    if n <= period {
        return Err(IndicatorError::InsufficientData {
            required: period + 1,
            got: n,
        });
    }

    let seed = (seed_mean(&raw.upper, period), seed_mean(&raw.lower, period));

    let evolved = (period + 1..n).scan(seed, |prev, i| {
        let (prev_upper, prev_lower) = *prev;
        let prev_close = closes[i - 1];

        let upper = if prev_close <= prev_upper {
            raw.upper[i].min(prev_upper)
        } else {
            raw.upper[i]
        };
        let lower = if prev_close >= prev_lower {
            raw.lower[i].max(prev_lower)
        } else {
            raw.lower[i]
        };

        *prev = (upper, lower);
        Some(*prev)
    });

    let (upper, lower): (Vec<f64>, Vec<f64>) = std::iter::once(seed).chain(evolved).unzip();

    Ok(FinalBands {
        upper: OffsetSeries::new("final upper band", period, upper),
        lower: OffsetSeries::new("final lower band", period, lower),
    })
}

fn seed_mean(band: &OffsetSeries, period: usize) -> f64 {
    let seed_bars = band.start()..period;
    assert!(
        !seed_bars.is_empty(),
        "{period}-bar seed window has no defined raw band values"
    );
    let count = seed_bars.len() as f64;
    seed_bars.map(|i| band[i]).sum::<f64>() / count
}

// =============================================================================
// Signal classifier
// =============================================================================

/// Indicator line and signal for every bar carrying final bands.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub line: OffsetSeries,
    signals: Vec<Signal>,
}

impl Classification {
    #[cfg(test)]
    pub fn signal_at(&self, index: usize) -> Option<Signal> {
        index
            .checked_sub(self.line.start())
            .and_then(|k| self.signals.get(k))
            .copied()
    }

    pub fn last(&self) -> Option<(f64, Signal)> {
        Some((self.line.last()?, *self.signals.last()?))
    }

    /// `(bar_index, line, signal)` for every classified bar.
    #[cfg(test)]
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64, Signal)> + '_ {
        self.line
            .iter()
            .zip(self.signals.iter())
            .map(|((i, line), &signal)| (i, line, signal))
    }
}

/// Classify every bar that has final bands.
pub fn classify(bands: &FinalBands, closes: &[f64]) -> Classification {
    let (line, signals): (Vec<f64>, Vec<Signal>) = bands
        .upper
        .iter()
        .map(|(i, upper)| {
            let close = closes[i];
            let line = if close <= upper { upper } else { bands.lower[i] };
            let signal = if close > line { Signal::Long } else { Signal::Short };
            (line, signal)
        })
        .unzip();

    Classification {
        line: OffsetSeries::new("supertrend line", bands.upper.start(), line),
        signals,
    }
}

// =============================================================================
// Full pipeline
// =============================================================================

/// Every intermediate of one Supertrend pass over a bar window.
#[derive(Debug, Clone, PartialEq)]
pub struct SupertrendOutput {
    pub raw: RawBands,
    pub bands: FinalBands,
    pub classification: Classification,
}

/// Supertrend indicator over a bar window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Supertrend {
    params: SupertrendParams,
}

impl Supertrend {
    pub fn new(params: SupertrendParams) -> Result<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &SupertrendParams {
        &self.params
    }

    pub fn compute(&self, bars: &[Bar]) -> Result<SupertrendOutput> {
        let SupertrendParams { period, multiplier } = self.params;
        if bars.len() < self.params.min_bars() {
            return Err(IndicatorError::InsufficientData {
                required: self.params.min_bars(),
                got: bars.len(),
            });
        }

        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let raw = calculate_raw_bands(bars, period, multiplier);
        let bands = stabilize_bands(&raw, &closes, period)?;
        let classification = classify(&bands, &closes);

        Ok(SupertrendOutput {
            raw,
            bands,
            classification,
        })
    }
}

impl Default for Supertrend {
    fn default() -> Self {
        Self {
            params: SupertrendParams::default(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const EPS: f64 = 1e-9;

    fn bar(high: f64, low: f64, close: f64) -> Bar {
        Bar::new(0, close, high, low, close)
    }

    /// Ten flat bars at 100 followed by closes 100, 105, 110, 115, 120 with a
    /// one-point wick either side.
    fn flat_then_rising() -> Vec<Bar> {
        let mut bars = vec![bar(100.0, 100.0, 100.0); 10];
        for close in [100.0, 105.0, 110.0, 115.0, 120.0] {
            bars.push(bar(close + 1.0, close - 1.0, close));
        }
        bars
    }

    #[test]
    fn params_validation() {
        assert!(SupertrendParams::new(10, 3.0).is_ok());
        assert!(matches!(
            SupertrendParams::new(0, 3.0),
            Err(IndicatorError::InvalidParameter { name: "period", .. })
        ));
        assert!(SupertrendParams::new(10, 0.0).is_err());
        assert!(SupertrendParams::new(10, f64::NAN).is_err());
        assert_eq!(SupertrendParams::default().min_bars(), 11);
    }

    #[test]
    fn params_deserialise_with_defaults() {
        let p: SupertrendParams = serde_json::from_str("{}").unwrap();
        assert_eq!(p, SupertrendParams::default());
        let p: SupertrendParams = serde_json::from_str(r#"{ "period": 7 }"#).unwrap();
        assert_eq!(p.period, 7);
        assert!((p.multiplier - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn seed_is_last_warm_up_raw_band() {
        let bars = flat_then_rising();
        let out = Supertrend::default().compute(&bars).unwrap();
        assert_eq!(out.bands.upper.start(), 10);
        assert!((out.bands.upper[10] - out.raw.upper[9]).abs() < EPS);
        assert!((out.bands.lower[10] - out.raw.lower[9]).abs() < EPS);
        assert!((out.bands.upper[10] - 100.0).abs() < EPS);
    }

    #[test]
    fn flat_then_rising_scenario() {
        let bars = flat_then_rising();
        let out = Supertrend::default().compute(&bars).unwrap();
        let fu = &out.bands.upper;
        let fl = &out.bands.lower;

        // Bar 11: price held under the seed, so the upper band ratchets to
        // min(106.2, 100) and stays at the seed.
        assert!((out.raw.upper[11] - 106.2).abs() < EPS);
        assert!((fu[11] - 100.0).abs() < EPS);
        assert!(fu[11] <= fu[10]);
        assert!((fl[11] - 103.8).abs() < EPS);

        // Bar 12: bar 11 closed above the upper band, so it resets to raw.
        assert!((fu[12] - out.raw.upper[12]).abs() < EPS);
        // Bar 13: bar 12 closed under it again, so it ratchets.
        assert!((fu[13] - fu[12]).abs() < EPS);

        let signals: Vec<Signal> = out.classification.iter().map(|(_, _, s)| s).collect();
        assert_eq!(
            signals,
            vec![Signal::Short, Signal::Long, Signal::Short, Signal::Long, Signal::Short]
        );

        // First LONG is the first bar whose close exceeds the seeded upper band.
        let first_long = out
            .classification
            .iter()
            .find(|&(_, _, s)| s == Signal::Long)
            .map(|(i, _, _)| i);
        let first_above_seed = (10..bars.len()).find(|&i| bars[i].close > fu[10]);
        assert_eq!(first_long, Some(11));
        assert_eq!(first_long, first_above_seed);
    }

    #[test]
    fn tie_with_line_is_short() {
        // Bar 10 closes exactly on the seeded upper band.
        let bars = flat_then_rising();
        let out = Supertrend::default().compute(&bars).unwrap();
        let (line, signal) = (out.classification.line[10], out.classification.signal_at(10));
        assert!((line - bars[10].close).abs() < EPS);
        assert_eq!(signal, Some(Signal::Short));
    }

    #[test]
    fn classifier_uses_upper_when_close_below() {
        let bands = FinalBands {
            upper: OffsetSeries::new("u", 1, vec![110.0, 110.0, 110.0]),
            lower: OffsetSeries::new("l", 1, vec![90.0, 90.0, 90.0]),
        };
        let closes = [100.0, 105.0, 115.0, 89.0];
        let c = classify(&bands, &closes);
        let rows: Vec<(usize, f64, Signal)> = c.iter().collect();
        assert_eq!(rows[0], (1, 110.0, Signal::Short));
        assert_eq!(rows[1], (2, 90.0, Signal::Long));
        assert_eq!(rows[2], (3, 110.0, Signal::Short));
        assert_eq!(c.last(), Some((110.0, Signal::Short)));
    }

    #[test]
    fn insufficient_data_for_short_window() {
        let bars = vec![bar(101.0, 99.0, 100.0); 5];
        let err = Supertrend::default().compute(&bars).unwrap_err();
        assert_eq!(err, IndicatorError::InsufficientData { required: 11, got: 5 });

        // Exactly `period` bars is still not enough.
        let bars = vec![bar(101.0, 99.0, 100.0); 10];
        assert!(Supertrend::default().compute(&bars).is_err());

        // `period + 1` yields exactly one classified bar.
        let bars = vec![bar(101.0, 99.0, 100.0); 11];
        let out = Supertrend::default().compute(&bars).unwrap();
        assert_eq!(out.classification.iter().count(), 1);
    }

    #[test]
    fn stabilizer_rejects_short_close_series() {
        let bars = vec![bar(101.0, 99.0, 100.0); 4];
        let raw = calculate_raw_bands(&bars, 3, 3.0);
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        assert!(stabilize_bands(&raw, &closes[..3], 3).is_err());
        assert!(stabilize_bands(&raw, &closes, 3).is_ok());
    }

    #[test]
    #[should_panic(expected = "undefined")]
    fn stabilizer_panics_when_raw_bands_do_not_cover_closes() {
        let bars = vec![bar(101.0, 99.0, 100.0); 12];
        let raw = calculate_raw_bands(&bars[..11], 10, 3.0);
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let _ = stabilize_bands(&raw, &closes, 10);
    }

    /// A gap over the ratcheted upper band keeps the old upper band (the
    /// previous close sat under it) while the lower band jumps to the new raw
    /// value, so the pair crosses.  Band ordering only holds while each bar's
    /// move stays within the band distance.
    #[test]
    fn gap_up_crosses_final_bands() {
        let bars = vec![
            bar(100.0, 100.0, 100.0),
            bar(100.0, 100.0, 100.0),
            bar(201.0, 199.0, 200.0),
        ];
        let out = with_period(1).compute(&bars).unwrap();

        assert_eq!(out.bands.upper.iter().collect::<Vec<_>>(), vec![(1, 100.0), (2, 100.0)]);
        assert_eq!(out.bands.lower.iter().collect::<Vec<_>>(), vec![(1, 100.0), (2, 194.0)]);
        assert!(out.bands.lower[2] > out.bands.upper[2]);
        assert_eq!(out.classification.last(), Some((194.0, Signal::Long)));
    }

    #[test]
    fn compute_is_deterministic() {
        let bars: Vec<Bar> = (0..60)
            .map(|i| {
                let base = 100.0 + (i as f64 * 0.3).sin() * 8.0;
                bar(base + 1.2, base - 0.9, base + 0.4)
            })
            .collect();
        let st = Supertrend::default();
        assert_eq!(st.compute(&bars).unwrap(), st.compute(&bars).unwrap());
    }

    // -------------------------------------------------------------------------
    // Properties
    // -------------------------------------------------------------------------

    /// Bars with a constant range `r` whose midpoint moves at most `r` from the
    /// previous close, i.e. no gaps larger than one bar range.
    fn smooth_bars() -> impl Strategy<Value = Vec<Bar>> {
        (0.5f64..5.0, prop::collection::vec((-1.0f64..1.0, -0.5f64..0.5), 12..80)).prop_map(
            |(r, steps)| {
                let mut prev_close = 100.0;
                steps
                    .into_iter()
                    .enumerate()
                    .map(|(i, (drift, pos))| {
                        let mid = prev_close + drift * r;
                        let close = mid + pos * r;
                        prev_close = close;
                        Bar::new(i as i64, mid, mid + r / 2.0, mid - r / 2.0, close)
                    })
                    .collect()
            },
        )
    }

    proptest! {
        #[test]
        fn final_bands_never_cross(bars in smooth_bars(), period in 1usize..11, multiplier in 1.0f64..5.0) {
            prop_assume!(bars.len() > period);
            let st = Supertrend::new(SupertrendParams::new(period, multiplier).unwrap()).unwrap();
            let out = st.compute(&bars).unwrap();
            for i in out.bands.upper.defined() {
                prop_assert!(out.bands.upper[i] >= out.bands.lower[i] - EPS,
                    "bar {}: upper {} < lower {}", i, out.bands.upper[i], out.bands.lower[i]);
            }
        }

        #[test]
        fn bands_tighten_monotonically(bars in smooth_bars(), period in 1usize..11) {
            prop_assume!(bars.len() > period);
            let out = with_period(period).compute(&bars).unwrap();
            let (fu, fl) = (&out.bands.upper, &out.bands.lower);
            for i in fu.start() + 1..fu.end() {
                if bars[i - 1].close <= fu[i - 1] {
                    prop_assert!(fu[i] <= fu[i - 1]);
                }
                if bars[i - 1].close >= fl[i - 1] {
                    prop_assert!(fl[i] >= fl[i - 1]);
                }
            }
        }

        #[test]
        fn signal_matches_close_against_line(bars in smooth_bars()) {
            let out = Supertrend::default().compute(&bars).unwrap();
            for (i, line, signal) in out.classification.iter() {
                let expected = if bars[i].close > line { Signal::Long } else { Signal::Short };
                prop_assert_eq!(signal, expected);
            }
        }
    }

    fn with_period(period: usize) -> Supertrend {
        Supertrend::new(SupertrendParams::new(period, 3.0).unwrap()).unwrap()
    }
}
