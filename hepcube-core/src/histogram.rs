//! Dense one- and two-dimensional histograms.
//!
//! These are the value objects produced by cube projections and consumed by
//! the rebinning and normalization algorithms. Each histogram owns its axes
//! and has no link back to the cube it came from.

use crate::axis::AxisBinning;
use crate::bin::BinValue;
use crate::error::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One-dimensional histogram with per-bin uncertainties.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawHistogram1D"))]
pub struct Histogram1D {
    name: String,
    axis: AxisBinning,
    bins: Vec<BinValue>,
}

#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct RawHistogram1D {
    name: String,
    axis: AxisBinning,
    bins: Vec<BinValue>,
}

#[cfg(feature = "serde")]
impl TryFrom<RawHistogram1D> for Histogram1D {
    type Error = Error;

    fn try_from(raw: RawHistogram1D) -> Result<Self> {
        Histogram1D::from_bins(raw.name, raw.axis, raw.bins)
    }
}

impl Histogram1D {
    /// Creates an empty histogram.
    #[must_use]
    pub fn new(name: impl Into<String>, axis: AxisBinning) -> Self {
        let bins = vec![BinValue::ZERO; axis.n_bins()];
        Self {
            name: name.into(),
            axis,
            bins,
        }
    }

    /// Creates a histogram from existing bin values.
    ///
    /// # Errors
    /// Returns [`Error::BinningMismatch`] if the number of values differs
    /// from the number of bins.
    pub fn from_bins(
        name: impl Into<String>,
        axis: AxisBinning,
        bins: Vec<BinValue>,
    ) -> Result<Self> {
        if bins.len() != axis.n_bins() {
            return Err(Error::BinningMismatch(format!(
                "{} values for {} bins",
                bins.len(),
                axis.n_bins()
            )));
        }
        Ok(Self {
            name: name.into(),
            axis,
            bins,
        })
    }

    /// Histogram name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Renames the histogram.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Returns the histogram under a new name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// The x-axis binning.
    #[must_use]
    pub fn axis(&self) -> &AxisBinning {
        &self.axis
    }

    /// Number of bins.
    #[must_use]
    pub fn n_bins(&self) -> usize {
        self.bins.len()
    }

    /// All bins in axis order.
    #[must_use]
    pub fn bins(&self) -> &[BinValue] {
        &self.bins
    }

    /// Mutable access to all bins.
    pub fn bins_mut(&mut self) -> &mut [BinValue] {
        &mut self.bins
    }

    /// Value of bin `bin`, or `None` outside the axis.
    #[must_use]
    pub fn bin(&self, bin: usize) -> Option<BinValue> {
        self.bins.get(bin).copied()
    }

    /// Content of bin `bin` (zero outside the axis).
    #[must_use]
    pub fn content(&self, bin: usize) -> f64 {
        self.bins.get(bin).map_or(0.0, |value| value.content)
    }

    /// Error of bin `bin` (zero outside the axis).
    #[must_use]
    pub fn error(&self, bin: usize) -> f64 {
        self.bins.get(bin).map_or(0.0, |value| value.error)
    }

    /// Overwrites bin `bin`.
    ///
    /// # Errors
    /// Returns [`Error::BinOutOfRange`] if `bin` is outside the axis.
    pub fn set_bin(&mut self, bin: usize, value: BinValue) -> Result<()> {
        let bins = self.bins.len();
        let slot = self.bins.get_mut(bin).ok_or(Error::BinOutOfRange {
            axis: 0,
            index: bin,
            bins,
        })?;
        *slot = value;
        Ok(())
    }

    /// Adds `weight` at `value`; the error grows by `|weight|` in quadrature.
    ///
    /// Returns the bin that was filled, or `None` if `value` is outside the axis.
    pub fn fill(&mut self, value: f64, weight: f64) -> Option<usize> {
        let bin = self.axis.bin_of(value)?;
        self.bins[bin].add_quadrature(BinValue::new(weight, weight.abs()));
        Some(bin)
    }

    /// Sum of bin contents.
    #[must_use]
    pub fn integral(&self) -> f64 {
        self.bins.iter().map(|value| value.content).sum()
    }

    /// Sum of bin contents multiplied by bin widths.
    #[must_use]
    pub fn integral_with_width(&self) -> f64 {
        self.bins
            .iter()
            .zip(self.axis.widths())
            .map(|(value, width)| value.content * width)
            .sum()
    }

    /// Multiplies all contents and errors by `factor`.
    pub fn scale(&mut self, factor: f64) {
        for value in &mut self.bins {
            *value = value.scaled(factor);
        }
    }

    /// Divides every bin by its width, turning counts into a density.
    pub fn normalize_to_bin_width(&mut self) {
        for (value, width) in self.bins.iter_mut().zip(self.axis.widths()) {
            *value = value.scaled(1.0 / width);
        }
    }
}

/// Two-dimensional histogram with per-bin uncertainties.
///
/// Bins are stored row-major: the bin at `(ix, iy)` lives at `iy * nx + ix`,
/// so a row is a fixed `y` with varying `x`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawHistogram2D"))]
pub struct Histogram2D {
    name: String,
    x_axis: AxisBinning,
    y_axis: AxisBinning,
    bins: Vec<BinValue>,
}

#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct RawHistogram2D {
    name: String,
    x_axis: AxisBinning,
    y_axis: AxisBinning,
    bins: Vec<BinValue>,
}

#[cfg(feature = "serde")]
impl TryFrom<RawHistogram2D> for Histogram2D {
    type Error = Error;

    fn try_from(raw: RawHistogram2D) -> Result<Self> {
        Histogram2D::from_bins(raw.name, raw.x_axis, raw.y_axis, raw.bins)
    }
}

impl Histogram2D {
    /// Creates an empty histogram.
    #[must_use]
    pub fn new(name: impl Into<String>, x_axis: AxisBinning, y_axis: AxisBinning) -> Self {
        let bins = vec![BinValue::ZERO; x_axis.n_bins() * y_axis.n_bins()];
        Self {
            name: name.into(),
            x_axis,
            y_axis,
            bins,
        }
    }

    /// Creates a histogram from row-major bin values.
    ///
    /// # Errors
    /// Returns [`Error::BinningMismatch`] if the number of values differs
    /// from `nx * ny`.
    pub fn from_bins(
        name: impl Into<String>,
        x_axis: AxisBinning,
        y_axis: AxisBinning,
        bins: Vec<BinValue>,
    ) -> Result<Self> {
        let expected = x_axis.n_bins() * y_axis.n_bins();
        if bins.len() != expected {
            return Err(Error::BinningMismatch(format!(
                "{} values for {}x{} bins",
                bins.len(),
                x_axis.n_bins(),
                y_axis.n_bins()
            )));
        }
        Ok(Self {
            name: name.into(),
            x_axis,
            y_axis,
            bins,
        })
    }

    /// Histogram name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Renames the histogram.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Returns the histogram under a new name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// The x-axis binning.
    #[must_use]
    pub fn x_axis(&self) -> &AxisBinning {
        &self.x_axis
    }

    /// The y-axis binning.
    #[must_use]
    pub fn y_axis(&self) -> &AxisBinning {
        &self.y_axis
    }

    /// Number of x bins.
    #[must_use]
    pub fn nx(&self) -> usize {
        self.x_axis.n_bins()
    }

    /// Number of y bins.
    #[must_use]
    pub fn ny(&self) -> usize {
        self.y_axis.n_bins()
    }

    /// All bins, row-major.
    #[must_use]
    pub fn bins(&self) -> &[BinValue] {
        &self.bins
    }

    #[inline]
    fn index(&self, ix: usize, iy: usize) -> Option<usize> {
        (ix < self.nx() && iy < self.ny()).then(|| iy * self.nx() + ix)
    }

    /// Value of bin `(ix, iy)`, or `None` outside the axes.
    #[must_use]
    pub fn bin(&self, ix: usize, iy: usize) -> Option<BinValue> {
        self.index(ix, iy).map(|index| self.bins[index])
    }

    /// Mutable access to bin `(ix, iy)`.
    pub fn bin_mut(&mut self, ix: usize, iy: usize) -> Option<&mut BinValue> {
        self.index(ix, iy).map(move |index| &mut self.bins[index])
    }

    /// Content of bin `(ix, iy)` (zero outside the axes).
    #[must_use]
    pub fn content(&self, ix: usize, iy: usize) -> f64 {
        self.bin(ix, iy).map_or(0.0, |value| value.content)
    }

    /// Error of bin `(ix, iy)` (zero outside the axes).
    #[must_use]
    pub fn error(&self, ix: usize, iy: usize) -> f64 {
        self.bin(ix, iy).map_or(0.0, |value| value.error)
    }

    /// Overwrites bin `(ix, iy)`.
    ///
    /// # Errors
    /// Returns [`Error::BinOutOfRange`] if the bin is outside the axes.
    pub fn set_bin(&mut self, ix: usize, iy: usize, value: BinValue) -> Result<()> {
        if ix >= self.nx() {
            return Err(Error::BinOutOfRange {
                axis: 0,
                index: ix,
                bins: self.nx(),
            });
        }
        if iy >= self.ny() {
            return Err(Error::BinOutOfRange {
                axis: 1,
                index: iy,
                bins: self.ny(),
            });
        }
        let nx = self.nx();
        self.bins[iy * nx + ix] = value;
        Ok(())
    }

    /// Adds `weight` at `(x, y)`; the error grows by `|weight|` in quadrature.
    ///
    /// Returns the filled `(ix, iy)`, or `None` if the point is outside the axes.
    pub fn fill(&mut self, x: f64, y: f64, weight: f64) -> Option<(usize, usize)> {
        let ix = self.x_axis.bin_of(x)?;
        let iy = self.y_axis.bin_of(y)?;
        let nx = self.nx();
        self.bins[iy * nx + ix].add_quadrature(BinValue::new(weight, weight.abs()));
        Some((ix, iy))
    }

    /// Sum of contents in row `iy` (fixed y, all x).
    #[must_use]
    pub fn row_sum(&self, iy: usize) -> f64 {
        (0..self.nx()).map(|ix| self.content(ix, iy)).sum()
    }

    /// Sum of contents in column `ix` (fixed x, all y).
    #[must_use]
    pub fn column_sum(&self, ix: usize) -> f64 {
        (0..self.ny()).map(|iy| self.content(ix, iy)).sum()
    }

    /// Sum of all bin contents.
    #[must_use]
    pub fn integral(&self) -> f64 {
        self.bins.iter().map(|value| value.content).sum()
    }

    /// Sum of bin contents multiplied by bin areas.
    #[must_use]
    pub fn integral_with_area(&self) -> f64 {
        let mut total = 0.0;
        for (iy, height) in self.y_axis.widths().enumerate() {
            for (ix, width) in self.x_axis.widths().enumerate() {
                total += self.content(ix, iy) * width * height;
            }
        }
        total
    }

    /// Multiplies all contents and errors by `factor`.
    pub fn scale(&mut self, factor: f64) {
        for value in &mut self.bins {
            *value = value.scaled(factor);
        }
    }

    /// Divides every bin by its area, turning counts into a density.
    pub fn normalize_to_bin_area(&mut self) {
        let nx = self.nx();
        for (iy, height) in self.y_axis.widths().enumerate() {
            for (ix, width) in self.x_axis.widths().enumerate() {
                let slot = &mut self.bins[iy * nx + ix];
                *slot = slot.scaled(1.0 / (width * height));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_fill_and_integral_1d() {
        let axis = AxisBinning::new(vec![0.0, 1.0, 3.0]).unwrap();
        let mut hist = Histogram1D::new("h", axis);
        assert_eq!(hist.fill(0.5, 2.0), Some(0));
        assert_eq!(hist.fill(2.0, 1.0), Some(1));
        assert_eq!(hist.fill(2.5, 1.0), Some(1));
        assert_eq!(hist.fill(3.0, 1.0), None);

        assert_abs_diff_eq!(hist.integral(), 4.0);
        assert_abs_diff_eq!(hist.integral_with_width(), 2.0 + 2.0 * 2.0);
        assert_abs_diff_eq!(hist.error(1), 2.0_f64.sqrt());

        hist.normalize_to_bin_width();
        assert_abs_diff_eq!(hist.content(1), 1.0);
        assert_abs_diff_eq!(hist.integral_with_width(), 4.0);
    }

    #[test]
    fn test_from_bins_length_checked() {
        let axis = AxisBinning::uniform(3, 0.0, 3.0).unwrap();
        assert!(Histogram1D::from_bins("h", axis.clone(), vec![BinValue::ZERO; 2]).is_err());
        assert!(Histogram2D::from_bins("h", axis.clone(), axis, vec![BinValue::ZERO; 8]).is_err());
    }

    #[test]
    fn test_histogram_2d_layout() {
        let x = AxisBinning::uniform(3, 0.0, 3.0).unwrap();
        let y = AxisBinning::uniform(2, 0.0, 2.0).unwrap();
        let mut hist = Histogram2D::new("h2", x, y);
        hist.set_bin(2, 1, BinValue::new(5.0, 1.0)).unwrap();
        assert_eq!(hist.bins()[5], BinValue::new(5.0, 1.0));
        assert_eq!(hist.fill(0.5, 1.5, 1.0), Some((0, 1)));
        assert_abs_diff_eq!(hist.row_sum(1), 6.0);
        assert_abs_diff_eq!(hist.column_sum(2), 5.0);
        assert!(hist.set_bin(3, 0, BinValue::ZERO).is_err());
        assert!(hist.bin(0, 2).is_none());
    }

    #[test]
    fn test_normalize_to_bin_area() {
        let x = AxisBinning::new(vec![0.0, 2.0]).unwrap();
        let y = AxisBinning::new(vec![0.0, 1.0]).unwrap();
        let mut hist = Histogram2D::new("h2", x, y);
        hist.set_bin(0, 0, BinValue::new(4.0, 2.0)).unwrap();
        hist.normalize_to_bin_area();
        assert_abs_diff_eq!(hist.content(0, 0), 2.0);
        assert_abs_diff_eq!(hist.error(0, 0), 1.0);
        assert_abs_diff_eq!(hist.integral_with_area(), 4.0);
    }
}
