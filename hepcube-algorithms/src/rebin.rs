//! Rebinning of 1-D and 2-D histograms onto coarser edges.
//!
//! The new edges must be a subset of the old ones (within the source axis
//! tolerance). Every source bin is moved whole into the new bin containing
//! its center; contents add and errors add in quadrature.
//!
//! The plain functions never fail: on an edge mismatch they log a warning
//! and hand back an unchanged copy of the input. The `try_*` forms report
//! the mismatch as [`Error::IncompatibleEdges`] instead.

use hepcube_core::{AxisBinning, BinValue, Error, Histogram1D, Histogram2D, Result};
use log::warn;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Suffix appended to the name of every rebinned histogram.
pub const REBINNED_SUFFIX: &str = "_rebinned";

/// Area handling for [`rebin_2d`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RebinOptions {
    /// Multiply each source bin by its area before accumulating
    /// (the input is a density).
    pub undo_bin_area: bool,
    /// Divide each output bin by its area after accumulating.
    pub normalize_bin_area: bool,
}

impl RebinOptions {
    /// Options for rebinning a density into a density.
    #[must_use]
    pub fn density() -> Self {
        Self {
            undo_bin_area: true,
            normalize_bin_area: true,
        }
    }

    /// Sets whether the source bin area is undone before accumulating.
    #[must_use]
    pub fn with_undo_bin_area(mut self, undo: bool) -> Self {
        self.undo_bin_area = undo;
        self
    }

    /// Sets whether the output is divided by the new bin area.
    #[must_use]
    pub fn with_normalize_bin_area(mut self, normalize: bool) -> Self {
        self.normalize_bin_area = normalize;
        self
    }
}

fn check_edges(histogram: &str, axis: char, source: &AxisBinning, edges: &[f64]) -> Result<()> {
    match source.first_incompatible_edge(edges) {
        Some(edge) => Err(Error::IncompatibleEdges {
            histogram: histogram.to_string(),
            axis,
            edge,
        }),
        None => Ok(()),
    }
}

fn target_axis(source: &AxisBinning, edges: &[f64]) -> Result<AxisBinning> {
    AxisBinning::new(edges.to_vec())?.with_tolerance(source.tolerance())
}

/// Rebins a bin-width-normalized 1-D histogram onto `new_edges`.
///
/// Each source bin is multiplied by its width, moved into the new bin that
/// contains its center, and the result is divided by the new width. The
/// output is named `<name>_rebinned`.
///
/// # Errors
/// Returns [`Error::IncompatibleEdges`] if a new edge is not an edge of the
/// source axis, or [`Error::InvalidBinning`] if `new_edges` is malformed.
pub fn try_rebin_asymmetric(histogram: &Histogram1D, new_edges: &[f64]) -> Result<Histogram1D> {
    let source = histogram.axis();
    check_edges(histogram.name(), 'x', source, new_edges)?;
    let axis = target_axis(source, new_edges)?;

    let mut bins = vec![BinValue::ZERO; axis.n_bins()];
    for (old_bin, value) in histogram.bins().iter().enumerate() {
        let Some(new_bin) = axis.bin_of(source.center(old_bin)) else {
            continue;
        };
        bins[new_bin].add_quadrature(value.scaled(source.width(old_bin)));
    }
    for (value, width) in bins.iter_mut().zip(axis.widths()) {
        *value = value.scaled(1.0 / width);
    }

    Histogram1D::from_bins(
        format!("{}{REBINNED_SUFFIX}", histogram.name()),
        axis,
        bins,
    )
}

/// Rebins a 1-D histogram, or returns an unchanged copy if the edges do not
/// line up.
///
/// See [`try_rebin_asymmetric`].
#[must_use]
pub fn rebin_asymmetric(histogram: &Histogram1D, new_edges: &[f64]) -> Histogram1D {
    try_rebin_asymmetric(histogram, new_edges).unwrap_or_else(|err| {
        warn!("cannot rebin histogram {}: {err}", histogram.name());
        histogram.clone()
    })
}

/// Rebins a 2-D histogram onto `new_x` by `new_y`.
///
/// The x edges are checked before the y edges. Source bins whose center
/// falls outside the new axes are dropped. The output is named
/// `<name>_rebinned`.
///
/// # Errors
/// Returns [`Error::IncompatibleEdges`] naming the first offending axis and
/// edge, or [`Error::InvalidBinning`] if the new edges are malformed.
pub fn try_rebin_2d(
    histogram: &Histogram2D,
    new_x: &[f64],
    new_y: &[f64],
    options: RebinOptions,
) -> Result<Histogram2D> {
    let (source_x, source_y) = (histogram.x_axis(), histogram.y_axis());
    check_edges(histogram.name(), 'x', source_x, new_x)?;
    check_edges(histogram.name(), 'y', source_y, new_y)?;
    let x_axis = target_axis(source_x, new_x)?;
    let y_axis = target_axis(source_y, new_y)?;

    let mut rebinned = Histogram2D::new(
        format!("{}{REBINNED_SUFFIX}", histogram.name()),
        x_axis,
        y_axis,
    );
    for ix in 0..histogram.nx() {
        let x = source_x.center(ix);
        for iy in 0..histogram.ny() {
            let y = source_y.center(iy);
            let (Some(new_ix), Some(new_iy)) =
                (rebinned.x_axis().bin_of(x), rebinned.y_axis().bin_of(y))
            else {
                continue;
            };
            let area = if options.undo_bin_area {
                source_x.width(ix) * source_y.width(iy)
            } else {
                1.0
            };
            let value = histogram.bin(ix, iy).unwrap_or_default().scaled(area);
            if let Some(slot) = rebinned.bin_mut(new_ix, new_iy) {
                slot.add_quadrature(value);
            }
        }
    }

    if options.normalize_bin_area {
        rebinned.normalize_to_bin_area();
    }
    Ok(rebinned)
}

/// Rebins a 2-D histogram, or returns an unchanged copy if the edges do not
/// line up.
///
/// See [`try_rebin_2d`].
#[must_use]
pub fn rebin_2d(
    histogram: &Histogram2D,
    new_x: &[f64],
    new_y: &[f64],
    options: RebinOptions,
) -> Histogram2D {
    try_rebin_2d(histogram, new_x, new_y, options).unwrap_or_else(|err| {
        warn!("cannot rebin histogram {}: {err}", histogram.name());
        histogram.clone()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn uniform_1d(contents: &[f64]) -> Histogram1D {
        #[allow(clippy::cast_precision_loss)]
        let axis = AxisBinning::uniform(contents.len(), 0.0, contents.len() as f64).unwrap();
        let bins = contents.iter().map(|&c| BinValue::new(c, 1.0)).collect();
        Histogram1D::from_bins("spectrum", axis, bins).unwrap()
    }

    #[test]
    fn test_rebin_merges_pairs() {
        let hist = uniform_1d(&[2.0, 2.0, 2.0, 2.0]);
        let rebinned = try_rebin_asymmetric(&hist, &[0.0, 2.0, 4.0]).unwrap();
        assert_eq!(rebinned.name(), "spectrum_rebinned");
        assert_eq!(rebinned.n_bins(), 2);
        assert_abs_diff_eq!(rebinned.content(0), 2.0);
        assert_abs_diff_eq!(rebinned.error(0), 2.0_f64.sqrt() / 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(rebinned.integral_with_width(), hist.integral_with_width());
    }

    #[test]
    fn test_rebin_with_edge_not_in_source_is_unchanged() {
        let hist = uniform_1d(&[1.0, 2.0, 3.0, 4.0]);
        let err = try_rebin_asymmetric(&hist, &[0.0, 2.5, 4.0]).unwrap_err();
        assert_eq!(
            err,
            Error::IncompatibleEdges {
                histogram: "spectrum".to_string(),
                axis: 'x',
                edge: 2.5,
            }
        );

        let copy = rebin_asymmetric(&hist, &[0.0, 2.5, 4.0]);
        assert_eq!(copy, hist);
    }

    #[test]
    fn test_rebin_accepts_edges_within_tolerance() {
        let hist = uniform_1d(&[1.0, 1.0]);
        let rebinned = try_rebin_asymmetric(&hist, &[0.000_05, 2.0]).unwrap();
        assert_eq!(rebinned.n_bins(), 1);
    }

    #[test]
    fn test_rebin_2d_conserves_counts() {
        let x = AxisBinning::uniform(4, 0.0, 4.0).unwrap();
        let y = AxisBinning::uniform(2, 0.0, 2.0).unwrap();
        let mut hist = Histogram2D::new("map", x, y);
        for ix in 0..4 {
            for iy in 0..2 {
                hist.set_bin(ix, iy, BinValue::new(1.0, 1.0)).unwrap();
            }
        }

        let rebinned =
            try_rebin_2d(&hist, &[0.0, 2.0, 4.0], &[0.0, 2.0], RebinOptions::default()).unwrap();
        assert_eq!(rebinned.name(), "map_rebinned");
        assert_eq!((rebinned.nx(), rebinned.ny()), (2, 1));
        assert_abs_diff_eq!(rebinned.content(0, 0), 4.0);
        assert_abs_diff_eq!(rebinned.error(0, 0), 2.0);
        assert_abs_diff_eq!(rebinned.integral(), hist.integral());
    }

    #[test]
    fn test_rebin_2d_density_round_trip() {
        let x = AxisBinning::new(vec![0.0, 1.0, 3.0]).unwrap();
        let y = AxisBinning::new(vec![0.0, 0.5, 1.0]).unwrap();
        let mut hist = Histogram2D::new("density", x, y);
        for ix in 0..2 {
            for iy in 0..2 {
                hist.set_bin(ix, iy, BinValue::new(2.0, 0.0)).unwrap();
            }
        }

        let rebinned = try_rebin_2d(&hist, &[0.0, 3.0], &[0.0, 1.0], RebinOptions::density())
            .unwrap();
        assert_abs_diff_eq!(rebinned.content(0, 0), 2.0);
        assert_abs_diff_eq!(rebinned.integral_with_area(), hist.integral_with_area());
    }

    #[test]
    fn test_rebin_2d_checks_x_first() {
        let x = AxisBinning::uniform(2, 0.0, 2.0).unwrap();
        let y = AxisBinning::uniform(2, 0.0, 2.0).unwrap();
        let hist = Histogram2D::new("map", x, y);
        let err = try_rebin_2d(&hist, &[0.0, 1.5], &[0.0, 0.7], RebinOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::IncompatibleEdges { axis: 'x', .. }));
        let err = try_rebin_2d(&hist, &[0.0, 2.0], &[0.0, 0.7], RebinOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::IncompatibleEdges { axis: 'y', .. }));
        assert_eq!(
            rebin_2d(&hist, &[0.0, 2.0], &[0.0, 0.7], RebinOptions::default()),
            hist
        );
    }

    #[test]
    fn test_rebin_2d_drops_bins_outside_new_axes() {
        let x = AxisBinning::uniform(4, 0.0, 4.0).unwrap();
        let y = AxisBinning::uniform(1, 0.0, 1.0).unwrap();
        let mut hist = Histogram2D::new("map", x, y);
        for ix in 0..4 {
            hist.set_bin(ix, 0, BinValue::new(1.0, 1.0)).unwrap();
        }
        let rebinned =
            try_rebin_2d(&hist, &[1.0, 3.0], &[0.0, 1.0], RebinOptions::default()).unwrap();
        assert_abs_diff_eq!(rebinned.integral(), 2.0);
    }
}
