//! Running minimum and maximum over histogram error bands.
//!
//! Used to pick a common drawing range for several histograms: each call
//! widens the current range with `content - error` and `content + error` of
//! the bins inside the requested range.

use hepcube_core::Histogram1D;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Lower and upper extent seen so far.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MinMax {
    /// Smallest `content - error` seen.
    pub min: f64,
    /// Largest `content + error` seen.
    pub max: f64,
}

impl Default for MinMax {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl MinMax {
    /// Identity of the fold: any bin widens it.
    pub const EMPTY: Self = Self {
        min: f64::INFINITY,
        max: f64::NEG_INFINITY,
    };

    /// Creates a range from explicit bounds.
    #[must_use]
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Returns true if nothing has been folded in yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.min > self.max
    }

    /// Widens the range to include `[low, high]`.
    #[must_use]
    pub fn including(self, low: f64, high: f64) -> Self {
        Self {
            min: self.min.min(low),
            max: self.max.max(high),
        }
    }

    /// Union of two ranges.
    #[must_use]
    pub fn merge(self, other: MinMax) -> Self {
        self.including(other.min, other.max)
    }
}

/// Widens `current` with the error band of bins `low_bin..=high_bin`.
///
/// `high_bin` past the last bin is clamped. An empty or inverted range
/// returns `current` unchanged.
#[must_use]
pub fn fold_min_max(
    histogram: &Histogram1D,
    low_bin: usize,
    high_bin: usize,
    current: MinMax,
) -> MinMax {
    if histogram.n_bins() == 0 {
        return current;
    }
    let high_bin = high_bin.min(histogram.n_bins() - 1);
    if low_bin > high_bin {
        return current;
    }
    histogram.bins()[low_bin..=high_bin]
        .iter()
        .fold(current, |range, value| range.including(value.lower(), value.upper()))
}

/// Widens `current` with every bin of `histogram`.
#[must_use]
pub fn fold_min_max_all(histogram: &Histogram1D, current: MinMax) -> MinMax {
    fold_min_max(histogram, 0, usize::MAX, current)
}

/// Widens `current` with the bins covering the value range `[low, high]`.
///
/// The range is translated into bins with
/// [`AxisBinning::bin_range_for_values`](hepcube_core::AxisBinning::bin_range_for_values),
/// so a range given by bin edges selects only the bins inside it.
#[must_use]
pub fn fold_min_max_values(
    histogram: &Histogram1D,
    low: f64,
    high: f64,
    current: MinMax,
) -> MinMax {
    match histogram.axis().bin_range_for_values(low, high) {
        Some(range) => fold_min_max(histogram, range.low, range.high, current),
        None => current,
    }
}
