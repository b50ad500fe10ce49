//! Named bin-edge sets loaded from JSON.
//!
//! ```json
//! {
//!   "edge_tolerance": 0.0001,
//!   "binnings": {
//!     "track_pt": [0.7, 1.0, 2.0, 3.0, 4.0, 8.0],
//!     "centrality": [0.0, 10.0, 30.0, 50.0, 90.0]
//!   }
//! }
//! ```

use crate::{Error, Result};
use hepcube_core::{AxisBinning, DEFAULT_EDGE_TOLERANCE};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

fn default_tolerance() -> f64 {
    DEFAULT_EDGE_TOLERANCE
}

/// Edge lists shared by rebin and restriction requests.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BinningConfig {
    /// Tolerance given to every binning built from this file.
    #[serde(default = "default_tolerance")]
    pub edge_tolerance: f64,
    /// Edge lists by name.
    #[serde(default)]
    pub binnings: BTreeMap<String, Vec<f64>>,
}

impl Default for BinningConfig {
    fn default() -> Self {
        Self {
            edge_tolerance: DEFAULT_EDGE_TOLERANCE,
            binnings: BTreeMap::new(),
        }
    }
}

impl BinningConfig {
    /// Loads a configuration file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or if any edge
    /// list does not form a valid binning.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let config: Self = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    /// Parses a configuration from a JSON string.
    ///
    /// # Errors
    /// Returns an error if the JSON is malformed or an edge list is invalid.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Adds or replaces an edge list.
    #[must_use]
    pub fn with_binning(mut self, name: impl Into<String>, edges: Vec<f64>) -> Self {
        self.binnings.insert(name.into(), edges);
        self
    }

    /// Checks every edge list.
    ///
    /// # Errors
    /// Returns the first invalid binning, naming it.
    pub fn validate(&self) -> Result<()> {
        for name in self.binnings.keys() {
            self.binning(name)?;
        }
        Ok(())
    }

    /// Raw edges of the binning `name`.
    #[must_use]
    pub fn edges(&self, name: &str) -> Option<&[f64]> {
        self.binnings.get(name).map(Vec::as_slice)
    }

    /// Builds the binning `name` with the configured tolerance.
    ///
    /// # Errors
    /// Returns [`Error::InvalidFormat`] if no binning has that name, or a core
    /// error if its edges are invalid.
    pub fn binning(&self, name: &str) -> Result<AxisBinning> {
        let edges = self
            .edges(name)
            .ok_or_else(|| Error::InvalidFormat(format!("no binning named {name}")))?;
        Ok(AxisBinning::new(edges.to_vec())?.with_tolerance(self.edge_tolerance)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_from_file() {
        let mut tmp = NamedTempFile::new().unwrap();
        write!(
            tmp,
            r#"{{"edge_tolerance": 0.001, "binnings": {{"pt": [0.7, 1.0, 2.0]}}}}"#
        )
        .unwrap();
        let config = BinningConfig::from_file(tmp.path()).unwrap();
        let axis = config.binning("pt").unwrap();
        assert_eq!(axis.n_bins(), 2);
        assert!((axis.tolerance() - 0.001).abs() < 1e-15);
        assert!(config.binning("eta").is_err());
    }

    #[test]
    fn test_defaults_and_validation() {
        let config = BinningConfig::from_json(r#"{"binnings": {"c": [0.0, 10.0]}}"#).unwrap();
        assert!((config.edge_tolerance - DEFAULT_EDGE_TOLERANCE).abs() < f64::EPSILON);
        assert!(BinningConfig::from_json(r#"{"binnings": {"bad": [1.0, 0.0]}}"#).is_err());
        let built = BinningConfig::default().with_binning("x", vec![0.0, 1.0]);
        assert_eq!(built.edges("x"), Some(&[0.0, 1.0][..]));
    }
}
