//! Sparse N-dimensional histogram and its projections.
//!
//! A [`DataCube`] stores only the cells that were filled, keyed by the
//! linearized bin index (axis 0 varies fastest). Cells live in an ordered map
//! so every projection visits them in the same order and produces
//! bit-identical sums run to run.
//!
//! Projections marginalize the cube onto one or two kept axes. Contents are
//! summed and uncertainties combined in quadrature. Which bins take part is
//! decided by a [`Restrictions`] value passed to each call (directly or via a
//! [`CubeView`]); the cube never stores restriction state.

use std::collections::BTreeMap;

use log::debug;

use crate::axis::{AxisBinning, AxisRange};
use crate::bin::BinValue;
use crate::error::{Error, Result};
use crate::histogram::{Histogram1D, Histogram2D};
use crate::restriction::Restrictions;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Accumulated weight and variance of one filled cell.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
struct Cell {
    sum: f64,
    variance: f64,
}

impl Cell {
    fn value(self) -> BinValue {
        BinValue::new(self.sum, self.variance.sqrt())
    }
}

/// Sparse multi-dimensional histogram.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawCube"))]
pub struct DataCube {
    name: String,
    axes: Vec<AxisBinning>,
    #[cfg_attr(feature = "serde", serde(skip))]
    strides: Vec<u64>,
    cells: BTreeMap<u64, Cell>,
}

#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct RawCube {
    name: String,
    axes: Vec<AxisBinning>,
    #[serde(default)]
    cells: BTreeMap<u64, Cell>,
}

#[cfg(feature = "serde")]
impl TryFrom<RawCube> for DataCube {
    type Error = Error;

    fn try_from(raw: RawCube) -> Result<Self> {
        let mut cube = DataCube::new(raw.name, raw.axes)?;
        let total = cube.total_bins();
        if let Some(key) = raw.cells.keys().find(|key| **key >= total) {
            return Err(Error::InvalidBinning(format!(
                "cell index {key} outside a cube of {total} bins"
            )));
        }
        cube.cells = raw.cells;
        Ok(cube)
    }
}

/// Result of a projection: one or two kept axes.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Projection {
    /// Projection onto a single axis.
    OneD(Histogram1D),
    /// Projection onto two axes.
    TwoD(Histogram2D),
}

impl Projection {
    /// Name of the projected histogram.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Projection::OneD(hist) => hist.name(),
            Projection::TwoD(hist) => hist.name(),
        }
    }

    /// Number of kept axes.
    #[must_use]
    pub fn dimensions(&self) -> usize {
        match self {
            Projection::OneD(_) => 1,
            Projection::TwoD(_) => 2,
        }
    }

    /// Borrows the 1-D histogram, if this is one.
    #[must_use]
    pub fn as_1d(&self) -> Option<&Histogram1D> {
        match self {
            Projection::OneD(hist) => Some(hist),
            Projection::TwoD(_) => None,
        }
    }

    /// Borrows the 2-D histogram, if this is one.
    #[must_use]
    pub fn as_2d(&self) -> Option<&Histogram2D> {
        match self {
            Projection::TwoD(hist) => Some(hist),
            Projection::OneD(_) => None,
        }
    }

    /// Takes the 1-D histogram, if this is one.
    #[must_use]
    pub fn into_1d(self) -> Option<Histogram1D> {
        match self {
            Projection::OneD(hist) => Some(hist),
            Projection::TwoD(_) => None,
        }
    }

    /// Takes the 2-D histogram, if this is one.
    #[must_use]
    pub fn into_2d(self) -> Option<Histogram2D> {
        match self {
            Projection::TwoD(hist) => Some(hist),
            Projection::OneD(_) => None,
        }
    }
}

impl DataCube {
    /// Creates an empty cube over `axes`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidBinning`] if no axis is given or the total
    /// number of bins does not fit in a 64-bit index.
    pub fn new(name: impl Into<String>, axes: Vec<AxisBinning>) -> Result<Self> {
        if axes.is_empty() {
            return Err(Error::InvalidBinning(
                "a data cube needs at least one axis".to_string(),
            ));
        }
        let mut strides = Vec::with_capacity(axes.len());
        let mut stride: u64 = 1;
        for axis in &axes {
            strides.push(stride);
            stride = u64::try_from(axis.n_bins())
                .ok()
                .and_then(|bins| stride.checked_mul(bins))
                .ok_or_else(|| {
                    Error::InvalidBinning("cube has too many bins to index".to_string())
                })?;
        }
        Ok(Self {
            name: name.into(),
            axes,
            strides,
            cells: BTreeMap::new(),
        })
    }

    /// Cube name, used as the base of every projection name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of axes.
    #[must_use]
    pub fn dimensions(&self) -> usize {
        self.axes.len()
    }

    /// All axes.
    #[must_use]
    pub fn axes(&self) -> &[AxisBinning] {
        &self.axes
    }

    /// Axis `axis`, or `None` if the cube has fewer dimensions.
    #[must_use]
    pub fn axis(&self, axis: usize) -> Option<&AxisBinning> {
        self.axes.get(axis)
    }

    /// Number of cells holding a value.
    #[must_use]
    pub fn filled_cells(&self) -> usize {
        self.cells.len()
    }

    /// Total number of bins (filled or not).
    #[must_use]
    pub fn total_bins(&self) -> u64 {
        let last = self.axes.len() - 1;
        self.strides[last] * self.axes[last].n_bins() as u64
    }

    /// Sum of all cell contents.
    #[must_use]
    pub fn integral(&self) -> f64 {
        self.cells.values().map(|cell| cell.sum).sum()
    }

    fn key_for_bins(&self, bins: &[usize]) -> Result<u64> {
        if bins.len() != self.axes.len() {
            return Err(Error::DimensionMismatch {
                expected: self.axes.len(),
                got: bins.len(),
            });
        }
        let mut key = 0;
        for (axis, (&bin, binning)) in bins.iter().zip(&self.axes).enumerate() {
            if bin >= binning.n_bins() {
                return Err(Error::BinOutOfRange {
                    axis,
                    index: bin,
                    bins: binning.n_bins(),
                });
            }
            key += bin as u64 * self.strides[axis];
        }
        Ok(key)
    }

    #[inline]
    #[allow(clippy::cast_possible_truncation)]
    fn bin_on_axis(&self, key: u64, axis: usize) -> usize {
        ((key / self.strides[axis]) % self.axes[axis].n_bins() as u64) as usize
    }

    /// Adds `weight` at the point `coords`.
    ///
    /// Returns `Ok(false)` without changing the cube if any coordinate falls
    /// outside its axis.
    ///
    /// # Errors
    /// Returns [`Error::DimensionMismatch`] if `coords` has the wrong length.
    pub fn fill(&mut self, coords: &[f64], weight: f64) -> Result<bool> {
        if coords.len() != self.axes.len() {
            return Err(Error::DimensionMismatch {
                expected: self.axes.len(),
                got: coords.len(),
            });
        }
        let mut bins = Vec::with_capacity(coords.len());
        for (value, axis) in coords.iter().zip(&self.axes) {
            match axis.bin_of(*value) {
                Some(bin) => bins.push(bin),
                None => return Ok(false),
            }
        }
        self.fill_bins(&bins, weight)?;
        Ok(true)
    }

    /// Adds `weight` to the cell at bin indices `bins`.
    ///
    /// # Errors
    /// Returns an error if `bins` has the wrong length or an index is out of range.
    pub fn fill_bins(&mut self, bins: &[usize], weight: f64) -> Result<()> {
        let key = self.key_for_bins(bins)?;
        let cell = self.cells.entry(key).or_default();
        cell.sum += weight;
        cell.variance += weight * weight;
        Ok(())
    }

    /// Overwrites the cell at `bins` with a content and error.
    ///
    /// # Errors
    /// Returns an error if `bins` has the wrong length or an index is out of range.
    pub fn set_bin(&mut self, bins: &[usize], value: BinValue) -> Result<()> {
        let key = self.key_for_bins(bins)?;
        self.cells.insert(
            key,
            Cell {
                sum: value.content,
                variance: value.error * value.error,
            },
        );
        Ok(())
    }

    /// Value at `bins`, or `None` if the cell was never filled or the
    /// indices are invalid.
    #[must_use]
    pub fn cell(&self, bins: &[usize]) -> Option<BinValue> {
        let key = self.key_for_bins(bins).ok()?;
        self.cells.get(&key).map(|cell| cell.value())
    }

    /// Iterates over filled cells as `(bin indices, value)`.
    pub fn iter_cells(&self) -> impl Iterator<Item = (Vec<usize>, BinValue)> + '_ {
        self.cells.iter().map(|(&key, cell)| {
            let bins = (0..self.axes.len())
                .map(|axis| self.bin_on_axis(key, axis))
                .collect();
            (bins, cell.value())
        })
    }

    /// Translates a physical interval on `axis` into a bin range.
    ///
    /// Both ends must be edges of the axis.
    #[must_use]
    pub fn range_for_borders(&self, axis: usize, low: f64, high: f64) -> Option<AxisRange> {
        self.axis(axis)?.bins_between(low, high)
    }

    /// Name of the projection produced under `restrictions`.
    #[must_use]
    pub fn projection_name(&self, restrictions: &Restrictions) -> String {
        format!("{}{}", self.name, restrictions.signature())
    }

    /// Starts a restricted view of the cube.
    #[must_use]
    pub fn view(&self) -> CubeView<'_> {
        CubeView {
            cube: self,
            restrictions: Restrictions::none(),
        }
    }

    /// Projects onto one or two axes.
    ///
    /// Returns `None` if `keep_axes` does not name one or two distinct
    /// existing axes, or if a restriction cannot be applied.
    #[must_use]
    pub fn project(
        &self,
        keep_axes: &[usize],
        restrictions: &Restrictions,
        normalize_to_bin_width: bool,
    ) -> Option<Projection> {
        match *keep_axes {
            [axis] => self
                .project_1d(axis, restrictions, normalize_to_bin_width)
                .map(Projection::OneD),
            [x_axis, y_axis] => self
                .project_2d(x_axis, y_axis, restrictions, normalize_to_bin_width)
                .map(Projection::TwoD),
            _ => {
                debug!(
                    "cube {}: cannot project onto {} axes",
                    self.name,
                    keep_axes.len()
                );
                None
            }
        }
    }

    /// Projects onto `axis`.
    ///
    /// If `normalize_to_bin_width` is set every bin is divided by its width.
    #[must_use]
    pub fn project_1d(
        &self,
        axis: usize,
        restrictions: &Restrictions,
        normalize_to_bin_width: bool,
    ) -> Option<Histogram1D> {
        let binning = self.kept_axis(axis)?;
        let active = self.active_ranges(restrictions)?;
        let totals = self.marginalize(&[axis], &active);

        let bins = totals.into_iter().map(Cell::value).collect();
        let mut hist =
            Histogram1D::from_bins(self.projection_name(restrictions), binning.clone(), bins)
                .ok()?;
        if normalize_to_bin_width {
            hist.normalize_to_bin_width();
        }
        Some(hist)
    }

    /// Projects onto `x_axis` (histogram x) and `y_axis` (histogram y).
    ///
    /// If `normalize_to_bin_width` is set every bin is divided by its area.
    #[must_use]
    pub fn project_2d(
        &self,
        x_axis: usize,
        y_axis: usize,
        restrictions: &Restrictions,
        normalize_to_bin_width: bool,
    ) -> Option<Histogram2D> {
        if x_axis == y_axis {
            debug!("cube {}: both projection axes are {x_axis}", self.name);
            return None;
        }
        let x_binning = self.kept_axis(x_axis)?;
        let y_binning = self.kept_axis(y_axis)?;
        let active = self.active_ranges(restrictions)?;
        let totals = self.marginalize(&[x_axis, y_axis], &active);

        let bins = totals.into_iter().map(Cell::value).collect();
        let mut hist = Histogram2D::from_bins(
            self.projection_name(restrictions),
            x_binning.clone(),
            y_binning.clone(),
            bins,
        )
        .ok()?;
        if normalize_to_bin_width {
            hist.normalize_to_bin_area();
        }
        Some(hist)
    }

    fn kept_axis(&self, axis: usize) -> Option<&AxisBinning> {
        let binning = self.axes.get(axis);
        if binning.is_none() {
            debug!(
                "cube {}: axis {axis} requested but the cube has {} axes",
                self.name,
                self.axes.len()
            );
        }
        binning
    }

    fn active_ranges(&self, restrictions: &Restrictions) -> Option<Vec<Option<AxisRange>>> {
        let active = restrictions.resolve(&self.axes);
        if active.is_none() {
            debug!(
                "cube {}: restrictions{} cannot be applied",
                self.name,
                restrictions.signature()
            );
        }
        active
    }

    /// Sums every cell inside `active` onto the dense grid spanned by `keep`
    /// (first kept axis fastest).
    fn marginalize(&self, keep: &[usize], active: &[Option<AxisRange>]) -> Vec<Cell> {
        let size = keep.iter().map(|&axis| self.axes[axis].n_bins()).product();
        let mut totals = vec![Cell::default(); size];

        'cells: for (&key, cell) in &self.cells {
            for (axis, range) in active.iter().enumerate() {
                if let Some(range) = range {
                    if !range.contains(self.bin_on_axis(key, axis)) {
                        continue 'cells;
                    }
                }
            }

            let mut index = 0;
            let mut stride = 1;
            for &axis in keep {
                index += self.bin_on_axis(key, axis) * stride;
                stride *= self.axes[axis].n_bins();
            }
            totals[index].sum += cell.sum;
            totals[index].variance += cell.variance;
        }
        totals
    }
}

/// A cube together with the restrictions of one request.
///
/// The view borrows the cube immutably; its restrictions disappear with it.
#[derive(Debug, Clone)]
pub struct CubeView<'a> {
    cube: &'a DataCube,
    restrictions: Restrictions,
}

impl<'a> CubeView<'a> {
    /// Restricts `axis` to bins `low..=high`.
    #[must_use]
    pub fn restrict(mut self, axis: usize, low: usize, high: usize) -> Self {
        self.restrictions.push(axis, AxisRange::new(low, high));
        self
    }

    /// Restricts `axis` to `range`.
    #[must_use]
    pub fn restrict_range(mut self, axis: usize, range: AxisRange) -> Self {
        self.restrictions.push(axis, range);
        self
    }

    /// Restricts `axis` to the bins spanned by the physical interval
    /// `[low, high]`; `None` unless both ends are edges of the axis.
    #[must_use]
    pub fn restrict_borders(self, axis: usize, low: f64, high: f64) -> Option<Self> {
        let range = self.cube.range_for_borders(axis, low, high)?;
        Some(self.restrict_range(axis, range))
    }

    /// The underlying cube.
    #[must_use]
    pub fn cube(&self) -> &'a DataCube {
        self.cube
    }

    /// Restrictions collected so far.
    #[must_use]
    pub fn restrictions(&self) -> &Restrictions {
        &self.restrictions
    }

    /// Name the projections of this view will get.
    #[must_use]
    pub fn projection_name(&self) -> String {
        self.cube.projection_name(&self.restrictions)
    }

    /// See [`DataCube::project`].
    #[must_use]
    pub fn project(&self, keep_axes: &[usize], normalize_to_bin_width: bool) -> Option<Projection> {
        self.cube
            .project(keep_axes, &self.restrictions, normalize_to_bin_width)
    }

    /// See [`DataCube::project_1d`].
    #[must_use]
    pub fn project_1d(&self, axis: usize, normalize_to_bin_width: bool) -> Option<Histogram1D> {
        self.cube
            .project_1d(axis, &self.restrictions, normalize_to_bin_width)
    }

    /// See [`DataCube::project_2d`].
    #[must_use]
    pub fn project_2d(
        &self,
        x_axis: usize,
        y_axis: usize,
        normalize_to_bin_width: bool,
    ) -> Option<Histogram2D> {
        self.cube
            .project_2d(x_axis, y_axis, &self.restrictions, normalize_to_bin_width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn cube() -> DataCube {
        DataCube::new(
            "jets",
            vec![
                AxisBinning::new(vec![0.0, 1.0, 2.0, 4.0]).unwrap(),
                AxisBinning::uniform(2, 0.0, 2.0).unwrap(),
                AxisBinning::uniform(3, 0.0, 3.0).unwrap(),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_new_rejects_zero_axes() {
        assert!(DataCube::new("empty", Vec::new()).is_err());
    }

    #[test]
    fn test_fill_and_cell_lookup() {
        let mut cube = cube();
        assert!(cube.fill(&[0.5, 1.5, 2.5], 2.0).unwrap());
        assert!(cube.fill(&[0.5, 1.5, 2.5], 1.0).unwrap());
        assert!(!cube.fill(&[4.0, 0.5, 0.5], 1.0).unwrap());
        assert!(cube.fill(&[0.5, 0.5], 1.0).is_err());

        let value = cube.cell(&[0, 1, 2]).unwrap();
        assert_abs_diff_eq!(value.content, 3.0);
        assert_abs_diff_eq!(value.error, 5.0_f64.sqrt());
        assert_eq!(cube.filled_cells(), 1);
        assert_eq!(cube.total_bins(), 18);
        assert!(cube.cell(&[1, 1, 2]).is_none());
        assert!(cube.cell(&[9, 0, 0]).is_none());
    }

    #[test]
    fn test_iter_cells_decodes_indices() {
        let mut cube = cube();
        cube.fill_bins(&[2, 1, 0], 1.0).unwrap();
        let cells: Vec<_> = cube.iter_cells().collect();
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].0, vec![2, 1, 0]);
    }

    #[test]
    fn test_project_1d_sums_in_quadrature() {
        let mut cube = cube();
        cube.set_bin(&[1, 0, 0], BinValue::new(3.0, 3.0)).unwrap();
        cube.set_bin(&[1, 1, 2], BinValue::new(1.0, 4.0)).unwrap();
        cube.set_bin(&[0, 1, 1], BinValue::new(2.0, 1.0)).unwrap();

        let hist = cube.project_1d(0, &Restrictions::none(), false).unwrap();
        assert_eq!(hist.name(), "jets");
        assert_abs_diff_eq!(hist.content(0), 2.0);
        assert_abs_diff_eq!(hist.content(1), 4.0);
        assert_abs_diff_eq!(hist.error(1), 5.0);
        assert_abs_diff_eq!(hist.content(2), 0.0);
    }

    #[test]
    fn test_project_respects_restrictions_and_names() {
        let mut cube = cube();
        cube.set_bin(&[0, 0, 0], BinValue::new(1.0, 1.0)).unwrap();
        cube.set_bin(&[0, 1, 1], BinValue::new(2.0, 1.0)).unwrap();
        cube.set_bin(&[2, 1, 2], BinValue::new(4.0, 2.0)).unwrap();

        let view = cube.view().restrict(1, 1, 1).restrict(2, 1, 2);
        let hist = view.project_1d(0, false).unwrap();
        assert_eq!(hist.name(), "jets_1=1-1_2=1-2");
        assert_abs_diff_eq!(hist.content(0), 2.0);
        assert_abs_diff_eq!(hist.content(2), 4.0);
        assert_abs_diff_eq!(hist.integral(), 6.0);

        // The cube itself is untouched by the view.
        let full = cube.project_1d(0, &Restrictions::none(), false).unwrap();
        assert_abs_diff_eq!(full.integral(), 7.0);
    }

    #[test]
    fn test_restriction_on_kept_axis_keeps_full_axis() {
        let mut cube = cube();
        cube.set_bin(&[0, 0, 0], BinValue::new(1.0, 1.0)).unwrap();
        cube.set_bin(&[1, 1, 2], BinValue::new(2.0, 1.0)).unwrap();
        cube.set_bin(&[2, 0, 1], BinValue::new(4.0, 2.0)).unwrap();

        let restrictions = Restrictions::none().with(0, 1, 1);
        let hist = cube.project_1d(0, &restrictions, false).unwrap();
        assert_eq!(hist.name(), "jets_0=1-1");
        assert_eq!(hist.n_bins(), 3);
        assert_eq!(hist.axis(), &cube.axes()[0]);
        assert_abs_diff_eq!(hist.content(0), 0.0);
        assert_abs_diff_eq!(hist.content(1), 2.0);
        assert_abs_diff_eq!(hist.content(2), 0.0);
        assert_abs_diff_eq!(hist.integral(), 2.0);
    }

    #[test]
    fn test_project_normalizes_by_width() {
        let mut cube = cube();
        cube.set_bin(&[2, 0, 0], BinValue::new(4.0, 2.0)).unwrap();
        let hist = cube.project_1d(0, &Restrictions::none(), true).unwrap();
        assert_abs_diff_eq!(hist.content(2), 2.0);
        assert_abs_diff_eq!(hist.error(2), 1.0);
    }

    #[test]
    fn test_project_2d() {
        let mut cube = cube();
        cube.set_bin(&[2, 1, 0], BinValue::new(4.0, 2.0)).unwrap();
        cube.set_bin(&[2, 1, 1], BinValue::new(2.0, 0.0)).unwrap();
        cube.set_bin(&[0, 0, 2], BinValue::new(1.0, 1.0)).unwrap();

        let hist = cube.project_2d(0, 1, &Restrictions::none(), false).unwrap();
        assert_eq!(hist.nx(), 3);
        assert_eq!(hist.ny(), 2);
        assert_abs_diff_eq!(hist.content(2, 1), 6.0);
        assert_abs_diff_eq!(hist.error(2, 1), 2.0);
        assert_abs_diff_eq!(hist.content(0, 0), 1.0);

        let density = cube.project_2d(0, 1, &Restrictions::none(), true).unwrap();
        assert_abs_diff_eq!(density.content(2, 1), 3.0);
    }

    #[test]
    fn test_project_missing_axis_is_none() {
        let cube = cube();
        assert!(cube.project_1d(3, &Restrictions::none(), false).is_none());
        assert!(cube.project_2d(0, 0, &Restrictions::none(), false).is_none());
        assert!(cube.project(&[], &Restrictions::none(), false).is_none());
        assert!(cube.project(&[0, 1, 2], &Restrictions::none(), false).is_none());
        assert!(cube
            .project_1d(0, &Restrictions::none().with(5, 0, 0), false)
            .is_none());
    }

    #[test]
    fn test_range_for_borders() {
        let cube = cube();
        assert_eq!(cube.range_for_borders(0, 1.0, 4.0), Some(AxisRange::new(1, 2)));
        assert_eq!(cube.range_for_borders(0, 1.5, 4.0), None);
        assert_eq!(cube.range_for_borders(7, 0.0, 1.0), None);
    }
}
