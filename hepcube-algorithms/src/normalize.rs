//! Row and column normalization of 2-D histograms.
//!
//! A row is a fixed y bin with x varying; a column is a fixed x bin with y
//! varying. Each line with a non-zero content sum is scaled so its contents
//! add up to the target; errors scale by the same factor. Lines summing to
//! zero are left untouched.

use hepcube_core::Histogram2D;
use log::trace;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Which lines of the matrix are normalized.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum NormalizationDirection {
    /// Every fixed-y line.
    #[default]
    Rows,
    /// Every fixed-x line.
    Columns,
}

/// Scales every row of `histogram` to sum to `target`.
pub fn normalize_rows(histogram: &mut Histogram2D, target: f64) {
    for iy in 0..histogram.ny() {
        let sum = histogram.row_sum(iy);
        if sum == 0.0 {
            trace!("{}: row {iy} is empty, not normalized", histogram.name());
            continue;
        }
        let factor = target / sum;
        for ix in 0..histogram.nx() {
            scale_bin(histogram, ix, iy, factor);
        }
    }
}

/// Scales every column of `histogram` to sum to `target`.
pub fn normalize_columns(histogram: &mut Histogram2D, target: f64) {
    for ix in 0..histogram.nx() {
        let sum = histogram.column_sum(ix);
        if sum == 0.0 {
            trace!("{}: column {ix} is empty, not normalized", histogram.name());
            continue;
        }
        let factor = target / sum;
        for iy in 0..histogram.ny() {
            scale_bin(histogram, ix, iy, factor);
        }
    }
}

/// Normalizes rows or columns depending on `direction`.
pub fn normalize_matrix(
    histogram: &mut Histogram2D,
    target: f64,
    direction: NormalizationDirection,
) {
    match direction {
        NormalizationDirection::Rows => normalize_rows(histogram, target),
        NormalizationDirection::Columns => normalize_columns(histogram, target),
    }
}

fn scale_bin(histogram: &mut Histogram2D, ix: usize, iy: usize, factor: f64) {
    if let Some(value) = histogram.bin_mut(ix, iy) {
        *value = value.scaled(factor);
    }
}
