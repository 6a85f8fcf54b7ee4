// =============================================================================
// OffsetSeries — an indicator output that only exists after its warm-up
// =============================================================================
//
// Indicator values are aligned with the bar window they were computed from:
// value `k` of the backing vector belongs to bar `start + k`.  Bars before
// `start` have no value.  Reading one of those is a caller bug, so indexing
// panics instead of handing back a sentinel.

use std::ops::{Index, Range};

/// Bar-aligned indicator values defined on `start..start + len`.
#[derive(Debug, Clone, PartialEq)]
pub struct OffsetSeries {
    name: &'static str,
    start: usize,
    values: Vec<f64>,
}

impl OffsetSeries {
    pub fn new(name: &'static str, start: usize, values: Vec<f64>) -> Self {
        Self { name, start, values }
    }

    /// First bar index carrying a value.
    pub fn start(&self) -> usize {
        self.start
    }

    /// One past the last bar index carrying a value.
    pub fn end(&self) -> usize {
        self.start + self.values.len()
    }

    pub fn defined(&self) -> Range<usize> {
        self.start..self.end()
    }

    /// Value at bar `index`, or `None` inside the warm-up / past the end.
    #[cfg(test)]
    pub fn get(&self, index: usize) -> Option<f64> {
        index
            .checked_sub(self.start)
            .and_then(|k| self.values.get(k))
            .copied()
    }

    pub fn last(&self) -> Option<f64> {
        self.values.last().copied()
    }

    /// Defined values only, without their bar indices.
    #[cfg(test)]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// `(bar_index, value)` pairs over the defined range.
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.defined().zip(self.values.iter().copied())
    }
}

impl Index<usize> for OffsetSeries {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        match index.checked_sub(self.start).and_then(|k| self.values.get(k)) {
            Some(v) => v,
            None => panic!(
                "{} is undefined at bar {index} (defined for bars {}..{})",
                self.name,
                self.start,
                self.end()
            ),
        }
    }
}
