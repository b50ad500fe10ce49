//! JSON files for cubes and histograms.
//!
//! Cubes are stored with their axes and the filled cells only. Histograms
//! are stored dense. Everything read back is validated as if it had been
//! built in code.

use crate::Result;
use hepcube_core::{DataCube, Histogram1D, Histogram2D};
use log::debug;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

fn read_json<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T> {
    let file = File::open(path.as_ref())?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

fn write_json<T: Serialize + ?Sized, P: AsRef<Path>>(path: P, value: &T) -> Result<()> {
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush()?;
    Ok(())
}

/// Reads a cube written by [`write_cube_json`].
///
/// # Errors
/// Returns an error if the file cannot be read, is not valid JSON, or
/// describes an invalid cube.
pub fn read_cube_json<P: AsRef<Path>>(path: P) -> Result<DataCube> {
    let cube: DataCube = read_json(&path)?;
    debug!(
        "read cube {} ({} axes, {} filled cells) from {}",
        cube.name(),
        cube.dimensions(),
        cube.filled_cells(),
        path.as_ref().display()
    );
    Ok(cube)
}

/// Writes a cube as JSON.
///
/// # Errors
/// Returns an error if the file cannot be written.
pub fn write_cube_json<P: AsRef<Path>>(path: P, cube: &DataCube) -> Result<()> {
    write_json(path, cube)
}

/// Reads a 1-D histogram.
///
/// # Errors
/// Returns an error if the file cannot be read or the bin count does not
/// match the axis.
pub fn read_histogram1d_json<P: AsRef<Path>>(path: P) -> Result<Histogram1D> {
    read_json(path)
}

/// Reads a 2-D histogram.
///
/// # Errors
/// Returns an error if the file cannot be read or the bin count does not
/// match the axes.
pub fn read_histogram2d_json<P: AsRef<Path>>(path: P) -> Result<Histogram2D> {
    read_json(path)
}

/// Writes a 1-D or 2-D histogram as JSON.
///
/// # Errors
/// Returns an error if the file cannot be written.
pub fn write_histogram_json<T: Serialize, P: AsRef<Path>>(path: P, histogram: &T) -> Result<()> {
    write_json(path, histogram)
}
