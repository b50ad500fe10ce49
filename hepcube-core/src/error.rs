//! Error types for hepcube-core.

use thiserror::Error;

/// Result type alias for hepcube operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for hepcube operations.
///
/// Only malformed binnings are fatal. Lookups that simply find nothing
/// (a value outside the axis, a projection onto a missing axis) are
/// reported as `None` by the calling API instead of an error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Bin edges that cannot form a binning.
    #[error("invalid binning: {0}")]
    InvalidBinning(String),

    /// Coordinate tuple length does not match the cube dimensionality.
    #[error("dimension mismatch: expected {expected} coordinates, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Two histograms that should share a binning do not.
    #[error("binning mismatch: {0}")]
    BinningMismatch(String),

    /// A requested edge is not an edge of the source binning.
    #[error("bin edge {edge} on {axis}-axis is not a bin edge of histogram {histogram}")]
    IncompatibleEdges {
        histogram: String,
        axis: char,
        edge: f64,
    },

    /// Bin index outside the axis.
    #[error("bin index {index} out of range for axis {axis} with {bins} bins")]
    BinOutOfRange { axis: usize, index: usize, bins: usize },
}
