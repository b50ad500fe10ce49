//! Hierarchical histogram stores.
//!
//! Derived histograms are written into folders named after the quantity
//! they describe, each histogram under its own derived name
//! (`<folder>/<name>`). The [`HistogramSink`] trait hides whether the store
//! is a directory tree of JSON files or an HDF5 file.

use crate::json::write_histogram_json;
use crate::{Error, Result};
use hepcube_core::{Histogram1D, Histogram2D, Projection};
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

/// How a store treats existing content when it is opened.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WriteMode {
    /// Remove everything already in the store.
    #[default]
    Recreate,
    /// Keep existing content; histograms with the same name are replaced.
    Update,
}

/// Destination for derived histograms.
pub trait HistogramSink {
    /// Stores a 1-D histogram in `folder`.
    ///
    /// # Errors
    /// Returns an error if the histogram cannot be written.
    fn put_1d(&mut self, folder: &str, histogram: &Histogram1D) -> Result<()>;

    /// Stores a 2-D histogram in `folder`.
    ///
    /// # Errors
    /// Returns an error if the histogram cannot be written.
    fn put_2d(&mut self, folder: &str, histogram: &Histogram2D) -> Result<()>;

    /// Stores a projection of either dimension in `folder`.
    ///
    /// # Errors
    /// Returns an error if the histogram cannot be written.
    fn put_projection(&mut self, folder: &str, projection: &Projection) -> Result<()> {
        match projection {
            Projection::OneD(histogram) => self.put_1d(folder, histogram),
            Projection::TwoD(histogram) => self.put_2d(folder, histogram),
        }
    }
}

/// Rejects names that are not a single plain path component.
pub(crate) fn check_component(kind: &str, value: &str) -> Result<()> {
    let bad = value.is_empty()
        || value == "."
        || value == ".."
        || value.contains(['/', '\\'])
        || value.contains('\0');
    if bad {
        return Err(Error::InvalidFormat(format!("invalid {kind} name {value:?}")));
    }
    Ok(())
}

/// Store writing `<root>/<folder>/<name>.json`.
#[derive(Debug)]
pub struct DirectoryStore {
    root: PathBuf,
    written: usize,
}

impl DirectoryStore {
    /// Opens a store rooted at `root`, creating the directory if needed.
    ///
    /// # Errors
    /// Returns an error if the directory cannot be created or cleared.
    pub fn open<P: AsRef<Path>>(root: P, mode: WriteMode) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if mode == WriteMode::Recreate && root.exists() {
            info!("recreating histogram store {}", root.display());
            fs::remove_dir_all(&root)?;
        }
        fs::create_dir_all(&root)?;
        Ok(Self { root, written: 0 })
    }

    /// Root directory of the store.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of histograms written through this handle.
    #[must_use]
    pub fn written(&self) -> usize {
        self.written
    }

    /// Path a histogram named `name` in `folder` is stored at.
    ///
    /// # Errors
    /// Returns [`Error::InvalidFormat`] if either name is not a plain path component.
    pub fn path_for(&self, folder: &str, name: &str) -> Result<PathBuf> {
        check_component("folder", folder)?;
        check_component("histogram", name)?;
        Ok(self.root.join(folder).join(format!("{name}.json")))
    }

    fn put<T: serde::Serialize>(&mut self, folder: &str, name: &str, histogram: &T) -> Result<()> {
        let path = self.path_for(folder, name)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        debug!("writing {}", path.display());
        write_histogram_json(&path, histogram)?;
        self.written += 1;
        Ok(())
    }
}

impl HistogramSink for DirectoryStore {
    fn put_1d(&mut self, folder: &str, histogram: &Histogram1D) -> Result<()> {
        self.put(folder, histogram.name(), histogram)
    }

    fn put_2d(&mut self, folder: &str, histogram: &Histogram2D) -> Result<()> {
        self.put(folder, histogram.name(), histogram)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json::{read_histogram1d_json, read_histogram2d_json};
    use hepcube_core::AxisBinning;
    use tempfile::tempdir;

    fn histograms() -> (Histogram1D, Histogram2D) {
        let axis = AxisBinning::uniform(2, 0.0, 2.0).unwrap();
        (
            Histogram1D::new("trackPt_0=1-1", axis.clone()),
            Histogram2D::new("trackDeltaPhiDeltaEta_0=1-1", axis.clone(), axis),
        )
    }

    #[test]
    fn test_layout_folder_and_name() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("store");
        let (h1, h2) = histograms();

        let mut store = DirectoryStore::open(&root, WriteMode::Recreate).unwrap();
        store.put_1d("trackPt", &h1).unwrap();
        store
            .put_projection("trackDeltaPhiDeltaEta", &Projection::TwoD(h2.clone()))
            .unwrap();
        assert_eq!(store.written(), 2);

        let path = root.join("trackPt").join("trackPt_0=1-1.json");
        assert_eq!(read_histogram1d_json(path).unwrap(), h1);
        let path = root
            .join("trackDeltaPhiDeltaEta")
            .join("trackDeltaPhiDeltaEta_0=1-1.json");
        assert_eq!(read_histogram2d_json(path).unwrap(), h2);
    }

    #[test]
    fn test_update_keeps_and_recreate_clears() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("store");
        let (h1, _) = histograms();

        let mut store = DirectoryStore::open(&root, WriteMode::Recreate).unwrap();
        store.put_1d("trackPt", &h1).unwrap();
        let path = store.path_for("trackPt", h1.name()).unwrap();

        DirectoryStore::open(&root, WriteMode::Update).unwrap();
        assert!(path.exists());
        DirectoryStore::open(&root, WriteMode::Recreate).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_rejects_path_escapes() {
        let dir = tempdir().unwrap();
        let store = DirectoryStore::open(dir.path(), WriteMode::Update).unwrap();
        assert!(store.path_for("..", "h").is_err());
        assert!(store.path_for("a/b", "h").is_err());
        assert!(store.path_for("a", "").is_err());
    }
}
