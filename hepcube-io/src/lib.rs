//! hepcube-io: File I/O for hepcube.
//!
//! This crate reads and writes cubes and histograms as JSON, stores derived
//! histograms in folder hierarchies (directories of JSON files, or HDF5 with
//! the `hdf5` feature), and loads named binnings from configuration files.
//!

mod config;
mod error;
#[cfg(feature = "hdf5")]
pub mod hdf5;
mod json;
mod store;

pub use config::BinningConfig;
pub use error::{Error, Result};
pub use json::{
    read_cube_json, read_histogram1d_json, read_histogram2d_json, write_cube_json,
    write_histogram_json,
};
#[cfg(feature = "hdf5")]
pub use crate::hdf5::Hdf5HistogramStore;
pub use store::{DirectoryStore, HistogramSink, WriteMode};
