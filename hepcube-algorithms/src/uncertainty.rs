//! Conversion between absolute and relative bin uncertainties.

use hepcube_core::{BinValue, Error, Histogram1D, Result};

/// Replaces every bin by its relative uncertainty `error / content`.
///
/// With `center_at_one` each bin becomes `1 ± relative`; otherwise the
/// relative uncertainty becomes the content and the error is zero. Bins with
/// zero content get a relative uncertainty of zero.
pub fn to_relative_uncertainty(histogram: &mut Histogram1D, center_at_one: bool) {
    for value in histogram.bins_mut() {
        let relative = if value.content == 0.0 {
            0.0
        } else {
            value.error / value.content
        };
        *value = if center_at_one {
            BinValue::new(1.0, relative)
        } else {
            BinValue::new(relative, 0.0)
        };
    }
}

/// Turns a relative-uncertainty histogram back into absolute values using
/// the contents of `scale`.
///
/// `center_at_one` must match the form produced by
/// [`to_relative_uncertainty`]: the relative uncertainty is read from the
/// error when set and from the content otherwise.
///
/// # Errors
/// Returns [`Error::BinningMismatch`] if the histograms have different bin counts.
pub fn to_absolute_uncertainty(
    histogram: &mut Histogram1D,
    scale: &Histogram1D,
    center_at_one: bool,
) -> Result<()> {
    if histogram.n_bins() != scale.n_bins() {
        return Err(Error::BinningMismatch(format!(
            "{} has {} bins but scale histogram {} has {}",
            histogram.name(),
            histogram.n_bins(),
            scale.name(),
            scale.n_bins()
        )));
    }
    for (value, reference) in histogram.bins_mut().iter_mut().zip(scale.bins()) {
        let relative = if center_at_one {
            value.error
        } else {
            value.content
        };
        *value = BinValue::new(reference.content, reference.content * relative);
    }
    Ok(())
}
