//! hepcube-core: binning, histograms and the sparse data cube.
//!
//! This crate provides the value types shared by every other hepcube crate:
//! axis binnings, dense 1-D/2-D histograms, and the N-dimensional
//! [`DataCube`] with its restricted projections.
//!

pub mod axis;
pub mod bin;
pub mod cube;
pub mod error;
pub mod histogram;
pub mod restriction;

pub use axis::{AxisBinning, AxisRange, DEFAULT_EDGE_TOLERANCE, VALUE_RANGE_NUDGE};
pub use bin::BinValue;
pub use cube::{CubeView, DataCube, Projection};
pub use error::{Error, Result};
pub use histogram::{Histogram1D, Histogram2D};
pub use restriction::{Restriction, Restrictions};
