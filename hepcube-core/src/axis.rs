//! Bin-edge index for a single histogram dimension.
//!
//! An [`AxisBinning`] holds `n + 1` strictly increasing edges describing `n`
//! half-open bins `[edge[i], edge[i + 1])`. Values below the first edge or at
//! or above the last edge belong to no bin.
//!
//! Every edge comparison (border lookup, edge lookup, rebin compatibility)
//! goes through the single tolerance stored on the binning, so components
//! that need to agree on "the same edge" always do.

use std::fmt;

use crate::error::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Absolute tolerance used when comparing bin edges.
///
/// Large enough to absorb round-trip error of edges persisted as `f32`.
pub const DEFAULT_EDGE_TOLERANCE: f64 = 1e-4;

/// Offset applied when a value range is translated into bins, so that
/// a value sitting exactly on an edge selects the bin inside the range.
pub const VALUE_RANGE_NUDGE: f64 = 1e-5;

/// Inclusive range of bin indices on one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AxisRange {
    /// First bin included.
    pub low: usize,
    /// Last bin included.
    pub high: usize,
}

impl AxisRange {
    /// Creates a new inclusive range.
    #[inline]
    #[must_use]
    pub fn new(low: usize, high: usize) -> Self {
        Self { low, high }
    }

    /// Range covering a single bin.
    #[inline]
    #[must_use]
    pub fn single(bin: usize) -> Self {
        Self::new(bin, bin)
    }

    /// Range covering every bin of an axis with `n_bins` bins.
    #[inline]
    #[must_use]
    pub fn full(n_bins: usize) -> Self {
        Self::new(0, n_bins.saturating_sub(1))
    }

    /// Returns true if `bin` lies inside the range.
    #[inline]
    #[must_use]
    pub fn contains(&self, bin: usize) -> bool {
        self.low <= bin && bin <= self.high
    }

    /// Number of bins covered (zero for an inverted range).
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        if self.high < self.low {
            0
        } else {
            self.high - self.low + 1
        }
    }

    /// Returns true if the range covers no bins.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fits the range onto an axis with `n_bins` bins.
    ///
    /// The upper end is clamped to the last bin. Returns `None` if the range
    /// is inverted or starts past the last bin.
    #[must_use]
    pub fn clamped(&self, n_bins: usize) -> Option<Self> {
        if self.low > self.high || self.low >= n_bins {
            return None;
        }
        Some(Self::new(self.low, self.high.min(n_bins - 1)))
    }
}

impl fmt::Display for AxisRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.low, self.high)
    }
}

/// Immutable ordered bin edges for one dimension.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawBinning"))]
pub struct AxisBinning {
    edges: Vec<f64>,
    tolerance: f64,
}

/// Unvalidated form used when deserializing, so that edges read from a file
/// pass through the same checks as edges built in code.
#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct RawBinning {
    edges: Vec<f64>,
    #[serde(default = "default_tolerance")]
    tolerance: f64,
}

#[cfg(feature = "serde")]
fn default_tolerance() -> f64 {
    DEFAULT_EDGE_TOLERANCE
}

#[cfg(feature = "serde")]
impl TryFrom<RawBinning> for AxisBinning {
    type Error = Error;

    fn try_from(raw: RawBinning) -> Result<Self> {
        AxisBinning::new(raw.edges)?.with_tolerance(raw.tolerance)
    }
}

impl AxisBinning {
    /// Creates a binning from explicit edges.
    ///
    /// # Errors
    /// Returns [`Error::InvalidBinning`] if fewer than two edges are given,
    /// an edge is not finite, or the edges are not strictly increasing.
    pub fn new(edges: Vec<f64>) -> Result<Self> {
        if edges.len() < 2 {
            return Err(Error::InvalidBinning(format!(
                "at least two edges are required, got {}",
                edges.len()
            )));
        }
        if let Some(bad) = edges.iter().find(|edge| !edge.is_finite()) {
            return Err(Error::InvalidBinning(format!("edge {bad} is not finite")));
        }
        if let Some(pair) = edges.windows(2).find(|pair| pair[1] <= pair[0]) {
            return Err(Error::InvalidBinning(format!(
                "edges must be strictly increasing, found {} followed by {}",
                pair[0], pair[1]
            )));
        }
        Ok(Self {
            edges,
            tolerance: DEFAULT_EDGE_TOLERANCE,
        })
    }

    /// Creates `n_bins` equal-width bins spanning `[low, high)`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidBinning`] if `n_bins` is zero or the range is
    /// empty or not finite.
    #[allow(clippy::cast_precision_loss)]
    pub fn uniform(n_bins: usize, low: f64, high: f64) -> Result<Self> {
        if n_bins == 0 {
            return Err(Error::InvalidBinning(
                "uniform binning needs at least one bin".to_string(),
            ));
        }
        if !(low.is_finite() && high.is_finite()) || high <= low {
            return Err(Error::InvalidBinning(format!(
                "invalid uniform range [{low}, {high})"
            )));
        }
        let width = (high - low) / n_bins as f64;
        let mut edges: Vec<f64> = (0..n_bins).map(|i| low + width * i as f64).collect();
        edges.push(high);
        Self::new(edges)
    }

    /// Returns the binning with a different edge-comparison tolerance.
    ///
    /// # Errors
    /// Returns [`Error::InvalidBinning`] if the tolerance is negative or not finite.
    pub fn with_tolerance(mut self, tolerance: f64) -> Result<Self> {
        if !tolerance.is_finite() || tolerance < 0.0 {
            return Err(Error::InvalidBinning(format!(
                "edge tolerance must be finite and non-negative, got {tolerance}"
            )));
        }
        self.tolerance = tolerance;
        Ok(self)
    }

    /// Number of bins.
    #[inline]
    #[must_use]
    pub fn n_bins(&self) -> usize {
        self.edges.len() - 1
    }

    /// All edges, lowest first.
    #[inline]
    #[must_use]
    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    /// Tolerance used for edge comparisons.
    #[inline]
    #[must_use]
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Lowest edge.
    #[inline]
    #[must_use]
    pub fn min(&self) -> f64 {
        self.edges[0]
    }

    /// Highest edge.
    #[inline]
    #[must_use]
    pub fn max(&self) -> f64 {
        self.edges[self.edges.len() - 1]
    }

    /// Lower edge of bin `bin`.
    ///
    /// # Panics
    /// Panics if `bin >= n_bins()`.
    #[inline]
    #[must_use]
    pub fn low_edge(&self, bin: usize) -> f64 {
        assert!(bin < self.n_bins(), "bin {bin} out of range");
        self.edges[bin]
    }

    /// Upper edge of bin `bin`.
    ///
    /// # Panics
    /// Panics if `bin >= n_bins()`.
    #[inline]
    #[must_use]
    pub fn high_edge(&self, bin: usize) -> f64 {
        assert!(bin < self.n_bins(), "bin {bin} out of range");
        self.edges[bin + 1]
    }

    /// `(low, high)` borders of bin `bin`.
    ///
    /// # Panics
    /// Panics if `bin >= n_bins()`.
    #[inline]
    #[must_use]
    pub fn borders(&self, bin: usize) -> (f64, f64) {
        (self.low_edge(bin), self.high_edge(bin))
    }

    /// Width of bin `bin`.
    ///
    /// # Panics
    /// Panics if `bin >= n_bins()`.
    #[inline]
    #[must_use]
    pub fn width(&self, bin: usize) -> f64 {
        self.high_edge(bin) - self.low_edge(bin)
    }

    /// Center of bin `bin`.
    ///
    /// # Panics
    /// Panics if `bin >= n_bins()`.
    #[inline]
    #[must_use]
    pub fn center(&self, bin: usize) -> f64 {
        0.5 * (self.low_edge(bin) + self.high_edge(bin))
    }

    /// Iterator over bin widths.
    pub fn widths(&self) -> impl Iterator<Item = f64> + '_ {
        self.edges.windows(2).map(|pair| pair[1] - pair[0])
    }

    /// Iterator over bin centers.
    pub fn centers(&self) -> impl Iterator<Item = f64> + '_ {
        self.edges.windows(2).map(|pair| 0.5 * (pair[0] + pair[1]))
    }

    /// Finds the bin containing `value`.
    ///
    /// Returns `None` below the first edge, at or above the last edge, and for NaN.
    #[must_use]
    pub fn bin_of(&self, value: f64) -> Option<usize> {
        // Negated comparison so that NaN falls through to `None`.
        if !(value >= self.min()) || value >= self.max() {
            return None;
        }
        Some(self.edges.partition_point(|edge| *edge <= value) - 1)
    }

    /// Finds the bin whose own borders match `(low, high)` within tolerance.
    #[must_use]
    pub fn find_index_by_borders(&self, low: f64, high: f64) -> Option<usize> {
        self.edges.windows(2).position(|pair| {
            (pair[0] - low).abs() < self.tolerance && (pair[1] - high).abs() < self.tolerance
        })
    }

    /// Finds the index of the edge equal to `value` within tolerance.
    #[must_use]
    pub fn edge_index(&self, value: f64) -> Option<usize> {
        self.edges
            .iter()
            .position(|edge| (edge - value).abs() < self.tolerance)
    }

    /// Returns the first candidate value that is not an edge of this binning.
    #[must_use]
    pub fn first_incompatible_edge(&self, candidate_edges: &[f64]) -> Option<f64> {
        candidate_edges
            .iter()
            .copied()
            .find(|value| self.edge_index(*value).is_none())
    }

    /// Returns true if every candidate value is an edge of this binning.
    #[must_use]
    pub fn edges_compatible_with(&self, candidate_edges: &[f64]) -> bool {
        self.first_incompatible_edge(candidate_edges).is_none()
    }

    /// Translates a physical interval whose ends are edges of this binning
    /// into the inclusive range of bins it spans.
    ///
    /// Returns `None` if either end is not an edge or the interval is empty.
    #[must_use]
    pub fn bins_between(&self, low: f64, high: f64) -> Option<AxisRange> {
        let first_edge = self.edge_index(low)?;
        let last_edge = self.edge_index(high)?;
        if last_edge <= first_edge {
            return None;
        }
        Some(AxisRange::new(first_edge, last_edge - 1))
    }

    /// Bins touched by the value range `[low, high]`.
    ///
    /// The ends are nudged inwards by [`VALUE_RANGE_NUDGE`] so that a range
    /// given by bin edges selects only the bins inside it. Ends outside the
    /// axis are clamped to the first and last bin.
    #[must_use]
    pub fn bin_range_for_values(&self, low: f64, high: f64) -> Option<AxisRange> {
        let low = low + VALUE_RANGE_NUDGE;
        let high = high - VALUE_RANGE_NUDGE;
        if high < low || high < self.min() || low >= self.max() {
            return None;
        }
        let first = self.bin_of(low).unwrap_or(0);
        let last = self.bin_of(high).unwrap_or(self.n_bins() - 1);
        Some(AxisRange::new(first, last))
    }

    /// Returns true if all bins have the same width within tolerance.
    #[must_use]
    pub fn is_uniform(&self) -> bool {
        let first = self.width(0);
        self.widths()
            .all(|width| (width - first).abs() < self.tolerance)
    }

    /// Returns true if both binnings have the same edges within tolerance.
    #[must_use]
    pub fn same_edges_as(&self, other: &AxisBinning) -> bool {
        self.edges.len() == other.edges.len()
            && self
                .edges
                .iter()
                .zip(&other.edges)
                .all(|(a, b)| (a - b).abs() < self.tolerance)
    }
}
