//! hepcube-algorithms: Transformations of projected histograms.
//!
//! This crate provides the histogram algorithms used after projection:
//! - **Rebin** - asymmetric 1-D and area-aware 2-D rebinning
//! - **Normalize** - row/column normalization of matrices
//! - **Transpose** - x/y axis swap
//! - **Range** - min/max folding over error bands
//! - **Projection cache** - memoized and batched cube projections
//!
#![warn(missing_docs)]

mod fluctuation;
mod normalize;
mod projection;
mod range;
mod rebin;
mod transpose;
mod uncertainty;

pub use fluctuation::suppress_single_bin_fluctuations;
pub use normalize::{normalize_columns, normalize_matrix, normalize_rows, NormalizationDirection};
pub use projection::{project_all, CacheStatistics, ProjectionCache, ProjectionRequest};
pub use range::{fold_min_max, fold_min_max_all, fold_min_max_values, MinMax};
pub use rebin::{
    rebin_2d, rebin_asymmetric, try_rebin_2d, try_rebin_asymmetric, RebinOptions, REBINNED_SUFFIX,
};
pub use transpose::{transpose, TRANSPOSED_SUFFIX};
pub use uncertainty::{to_absolute_uncertainty, to_relative_uncertainty};
