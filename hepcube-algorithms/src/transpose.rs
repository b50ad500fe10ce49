//! Axis swap for 2-D histograms.

use hepcube_core::{AxisBinning, Histogram2D};

/// Suffix appended to the name of every transposed histogram.
pub const TRANSPOSED_SUFFIX: &str = "_transposed";

/// Uniform binning with the bin count and outer edges of `axis`.
fn uniform_like(axis: &AxisBinning) -> AxisBinning {
    // Cannot fail for a valid axis.
    AxisBinning::uniform(axis.n_bins(), axis.min(), axis.max())
        .and_then(|uniform| uniform.with_tolerance(axis.tolerance()))
        .unwrap_or_else(|_| axis.clone())
}

/// Swaps the x and y axes of `histogram`.
///
/// The new axes are uniform with the bin count and outer edges of the old
/// ones, so non-uniform edges are not preserved. Content and error of
/// `(ix, iy)` land in `(iy, ix)`. The output is named `<name>_transposed`.
#[must_use]
pub fn transpose(histogram: &Histogram2D) -> Histogram2D {
    let x_axis = uniform_like(histogram.y_axis());
    let y_axis = uniform_like(histogram.x_axis());
    let mut transposed = Histogram2D::new(
        format!("{}{TRANSPOSED_SUFFIX}", histogram.name()),
        x_axis,
        y_axis,
    );
    for ix in 0..histogram.nx() {
        for iy in 0..histogram.ny() {
            if let (Some(value), Some(slot)) = (histogram.bin(ix, iy), transposed.bin_mut(iy, ix)) {
                *slot = value;
            }
        }
    }
    transposed
}

#[cfg(test)]
mod tests {
    use super::*;
    use hepcube_core::BinValue;

    #[test]
    fn test_transpose_swaps_indices() {
        let x = AxisBinning::uniform(3, 0.0, 3.0).unwrap();
        let y = AxisBinning::uniform(2, -1.0, 1.0).unwrap();
        let mut hist = Histogram2D::new("corr", x, y);
        hist.set_bin(2, 0, BinValue::new(7.0, 0.5)).unwrap();

        let transposed = transpose(&hist);
        assert_eq!(transposed.name(), "corr_transposed");
        assert_eq!((transposed.nx(), transposed.ny()), (2, 3));
        assert_eq!(transposed.bin(0, 2), Some(BinValue::new(7.0, 0.5)));
        assert!((transposed.x_axis().min() + 1.0).abs() < 1e-12);
        assert!((transposed.y_axis().max() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_non_uniform_axis_becomes_uniform() {
        let x = AxisBinning::new(vec![0.0, 1.0, 4.0]).unwrap();
        let y = AxisBinning::uniform(1, 0.0, 1.0).unwrap();
        let hist = Histogram2D::new("corr", x, y);
        let transposed = transpose(&hist);
        assert_eq!(transposed.y_axis().edges(), &[0.0, 2.0, 4.0]);
    }
}
