//! HDF5 histogram store.
//!
//! Layout: one group per folder, one group per histogram inside it. A
//! histogram group carries a `dimensions` attribute, the `x_edges` (and for
//! 2-D `y_edges`) datasets, and `content`/`error` datasets shaped like the
//! histogram (`(nx,)` or `(ny, nx)`).

use crate::store::{check_component, HistogramSink, WriteMode};
use crate::{Error, Result};
use hdf5::types::{H5Type, VarLenUnicode};
use hdf5::{Dataset, File, Group};
use hepcube_core::{AxisBinning, BinValue, Histogram1D, Histogram2D};
use log::debug;
use ndarray::{ArrayView1, ArrayView2};
use std::path::Path;
use std::str::FromStr;

const FORMAT_VERSION: &str = "0.1";

/// Histogram store backed by a single HDF5 file.
pub struct Hdf5HistogramStore {
    file: File,
    written: usize,
}

impl Hdf5HistogramStore {
    /// Opens the store at `path`.
    ///
    /// [`WriteMode::Recreate`] truncates an existing file; [`WriteMode::Update`]
    /// keeps it and replaces histograms that are written again.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created or opened.
    pub fn open<P: AsRef<Path>>(path: P, mode: WriteMode) -> Result<Self> {
        let file = match mode {
            WriteMode::Recreate => File::create(path)?,
            WriteMode::Update => File::append(path)?,
        };
        if file.attr("hepcube_format_version").is_err() {
            set_attr_str(&file, "hepcube_format_version", FORMAT_VERSION)?;
        }
        Ok(Self { file, written: 0 })
    }

    /// Number of histograms written through this handle.
    #[must_use]
    pub fn written(&self) -> usize {
        self.written
    }

    /// Reads the 1-D histogram `name` from `folder`.
    ///
    /// # Errors
    /// Returns an error if the group is missing or not a valid 1-D histogram.
    pub fn read_1d(&self, folder: &str, name: &str) -> Result<Histogram1D> {
        let group = self.file.group(folder)?.group(name)?;
        expect_dimensions(&group, 1)?;
        let axis = read_axis(&group, "x_edges")?;
        let bins = read_bins(&group, axis.n_bins())?;
        Ok(Histogram1D::from_bins(name, axis, bins)?)
    }

    /// Reads the 2-D histogram `name` from `folder`.
    ///
    /// # Errors
    /// Returns an error if the group is missing or not a valid 2-D histogram.
    pub fn read_2d(&self, folder: &str, name: &str) -> Result<Histogram2D> {
        let group = self.file.group(folder)?.group(name)?;
        expect_dimensions(&group, 2)?;
        let x_axis = read_axis(&group, "x_edges")?;
        let y_axis = read_axis(&group, "y_edges")?;
        let bins = read_bins(&group, x_axis.n_bins() * y_axis.n_bins())?;
        Ok(Histogram2D::from_bins(name, x_axis, y_axis, bins)?)
    }

    fn histogram_group(&mut self, folder: &str, name: &str, dimensions: u32) -> Result<Group> {
        check_component("folder", folder)?;
        check_component("histogram", name)?;
        let folder_group = if self.file.link_exists(folder) {
            self.file.group(folder)?
        } else {
            self.file.create_group(folder)?
        };
        if folder_group.link_exists(name) {
            debug!("replacing {folder}/{name}");
            folder_group.unlink(name)?;
        }
        let group = folder_group.create_group(name)?;
        group
            .new_attr::<u32>()
            .create("dimensions")?
            .write_scalar(&dimensions)?;
        self.written += 1;
        Ok(group)
    }
}

impl HistogramSink for Hdf5HistogramStore {
    fn put_1d(&mut self, folder: &str, histogram: &Histogram1D) -> Result<()> {
        let group = self.histogram_group(folder, histogram.name(), 1)?;
        write_edges(&group, "x_edges", histogram.axis())?;

        let n = histogram.n_bins();
        let (content, error) = split_bins(histogram.bins());
        create_fixed_dataset::<f64, _>(&group, "content", (n,))?
            .write(ArrayView1::from(content.as_slice()))?;
        create_fixed_dataset::<f64, _>(&group, "error", (n,))?
            .write(ArrayView1::from(error.as_slice()))?;
        Ok(())
    }

    fn put_2d(&mut self, folder: &str, histogram: &Histogram2D) -> Result<()> {
        let group = self.histogram_group(folder, histogram.name(), 2)?;
        write_edges(&group, "x_edges", histogram.x_axis())?;
        write_edges(&group, "y_edges", histogram.y_axis())?;

        let shape = (histogram.ny(), histogram.nx());
        let (content, error) = split_bins(histogram.bins());
        let content_view = ArrayView2::from_shape(shape, content.as_slice())
            .map_err(|e| Error::InvalidFormat(format!("content shape mismatch: {e}")))?;
        let error_view = ArrayView2::from_shape(shape, error.as_slice())
            .map_err(|e| Error::InvalidFormat(format!("error shape mismatch: {e}")))?;
        create_fixed_dataset::<f64, _>(&group, "content", shape)?.write(content_view)?;
        create_fixed_dataset::<f64, _>(&group, "error", shape)?.write(error_view)?;
        Ok(())
    }
}

fn split_bins(bins: &[BinValue]) -> (Vec<f64>, Vec<f64>) {
    bins.iter().map(|value| (value.content, value.error)).unzip()
}

fn write_edges(group: &Group, name: &str, axis: &AxisBinning) -> Result<()> {
    let dataset = create_fixed_dataset::<f64, _>(group, name, (axis.edges().len(),))?;
    dataset.write(ArrayView1::from(axis.edges()))?;
    dataset
        .new_attr::<f64>()
        .create("tolerance")?
        .write_scalar(&axis.tolerance())?;
    Ok(())
}

fn read_axis(group: &Group, name: &str) -> Result<AxisBinning> {
    let dataset = group.dataset(name)?;
    let edges = dataset.read_raw::<f64>()?;
    let axis = AxisBinning::new(edges)?;
    match dataset.attr("tolerance") {
        Ok(attr) => Ok(axis.with_tolerance(attr.read_scalar::<f64>()?)?),
        Err(_) => Ok(axis),
    }
}

fn read_bins(group: &Group, expected: usize) -> Result<Vec<BinValue>> {
    let content = group.dataset("content")?.read_raw::<f64>()?;
    let error = group.dataset("error")?.read_raw::<f64>()?;
    if content.len() != expected || error.len() != expected {
        return Err(Error::InvalidFormat(format!(
            "expected {expected} bins, found {} contents and {} errors",
            content.len(),
            error.len()
        )));
    }
    Ok(content
        .into_iter()
        .zip(error)
        .map(|(content, error)| BinValue::new(content, error))
        .collect())
}

fn expect_dimensions(group: &Group, expected: u32) -> Result<()> {
    let dimensions = group.attr("dimensions")?.read_scalar::<u32>()?;
    if dimensions != expected {
        return Err(Error::InvalidFormat(format!(
            "histogram {} has {dimensions} dimensions, expected {expected}",
            group.name()
        )));
    }
    Ok(())
}

fn create_fixed_dataset<T: H5Type, S>(group: &Group, name: &str, shape: S) -> Result<Dataset>
where
    S: Into<hdf5::Extents>,
{
    Ok(group.new_dataset::<T>().shape(shape).create(name)?)
}

fn set_attr_str(file: &File, name: &str, value: &str) -> Result<()> {
    let value = VarLenUnicode::from_str(value)
        .map_err(|e| Error::InvalidFormat(format!("invalid utf-8 attribute: {e}")))?;
    file.new_attr::<VarLenUnicode>()
        .create(name)?
        .write_scalar(&value)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn histogram_2d() -> Histogram2D {
        let x = AxisBinning::new(vec![0.0, 1.0, 3.0, 4.0]).unwrap();
        let y = AxisBinning::uniform(2, -1.0, 1.0).unwrap();
        let mut hist = Histogram2D::new("deltaPhiDeltaEta_1=0-2", x, y);
        hist.set_bin(2, 1, BinValue::new(5.0, 1.5)).unwrap();
        hist.set_bin(0, 0, BinValue::new(1.0, 0.5)).unwrap();
        hist
    }

    #[test]
    fn test_hdf5_histogram_roundtrip() {
        let tmp = NamedTempFile::new().unwrap();
        let axis = AxisBinning::new(vec![0.7, 1.0, 2.0, 8.0]).unwrap();
        let h1 = Histogram1D::from_bins(
            "trackPt_0=0-0",
            axis,
            vec![
                BinValue::new(1.0, 0.1),
                BinValue::new(2.0, 0.2),
                BinValue::new(3.0, 0.3),
            ],
        )
        .unwrap();
        let h2 = histogram_2d();

        {
            let mut store = Hdf5HistogramStore::open(tmp.path(), WriteMode::Recreate).unwrap();
            store.put_1d("trackPt", &h1).unwrap();
            store.put_2d("deltaPhiDeltaEta", &h2).unwrap();
            assert_eq!(store.written(), 2);
        }

        let store = Hdf5HistogramStore::open(tmp.path(), WriteMode::Update).unwrap();
        assert_eq!(store.read_1d("trackPt", h1.name()).unwrap(), h1);
        assert_eq!(store.read_2d("deltaPhiDeltaEta", h2.name()).unwrap(), h2);
        assert!(store.read_2d("trackPt", h1.name()).is_err());
    }

    #[test]
    fn test_hdf5_update_replaces_histogram() {
        let tmp = NamedTempFile::new().unwrap();
        let mut h2 = histogram_2d();
        {
            let mut store = Hdf5HistogramStore::open(tmp.path(), WriteMode::Recreate).unwrap();
            store.put_2d("deltaPhiDeltaEta", &h2).unwrap();
        }
        h2.scale(2.0);
        {
            let mut store = Hdf5HistogramStore::open(tmp.path(), WriteMode::Update).unwrap();
            store.put_2d("deltaPhiDeltaEta", &h2).unwrap();
        }
        let store = Hdf5HistogramStore::open(tmp.path(), WriteMode::Update).unwrap();
        let read = store.read_2d("deltaPhiDeltaEta", h2.name()).unwrap();
        assert_eq!(read.content(2, 1), 10.0);
    }
}
