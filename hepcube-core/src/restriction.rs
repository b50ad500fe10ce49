//! Per-axis bin restrictions applied when projecting a cube.
//!
//! Restrictions are plain values handed to each projection call. The cube
//! itself never remembers a restriction, so one request cannot leak its
//! ranges into the next.

use crate::axis::{AxisBinning, AxisRange};
use crate::cube::DataCube;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One restricted axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Restriction {
    /// Axis index in the cube.
    pub axis: usize,
    /// Inclusive bin range kept on that axis.
    pub range: AxisRange,
}

/// Ordered list of axis restrictions.
///
/// An axis without an entry is unrestricted. If the same axis appears more
/// than once the last entry selects the bins, but every entry is part of
/// the derived histogram name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Restrictions {
    entries: Vec<Restriction>,
}

impl Restrictions {
    /// No restriction on any axis.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Adds a restriction to bins `low..=high` of `axis`.
    #[must_use]
    pub fn with(self, axis: usize, low: usize, high: usize) -> Self {
        self.with_range(axis, AxisRange::new(low, high))
    }

    /// Adds a restriction given as an [`AxisRange`].
    #[must_use]
    pub fn with_range(mut self, axis: usize, range: AxisRange) -> Self {
        self.push(axis, range);
        self
    }

    /// Restricts `axis` of `cube` to the bins spanned by the physical
    /// interval `[low, high]`.
    ///
    /// Returns `None` unless both ends are edges of the axis.
    #[must_use]
    pub fn by_borders(cube: &DataCube, axis: usize, low: f64, high: f64) -> Option<Self> {
        let range = cube.range_for_borders(axis, low, high)?;
        Some(Self::none().with_range(axis, range))
    }

    /// Appends a restriction in place.
    pub fn push(&mut self, axis: usize, range: AxisRange) {
        self.entries.push(Restriction { axis, range });
    }

    /// Restrictions in the order they were added.
    #[must_use]
    pub fn entries(&self) -> &[Restriction] {
        &self.entries
    }

    /// Returns true if no axis is restricted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Name suffix `_<axis>=<low>-<high>` for every entry, in order.
    #[must_use]
    pub fn signature(&self) -> String {
        self.entries
            .iter()
            .map(|entry| format!("_{}={}", entry.axis, entry.range))
            .collect()
    }

    /// Resolves the active range of every axis of `axes`.
    ///
    /// Ranges are clamped to the axis. Returns `None` if an entry names an
    /// axis that does not exist or a range that selects no bin.
    #[must_use]
    pub fn resolve(&self, axes: &[AxisBinning]) -> Option<Vec<Option<AxisRange>>> {
        let mut active = vec![None; axes.len()];
        for entry in &self.entries {
            let axis = axes.get(entry.axis)?;
            active[entry.axis] = Some(entry.range.clamped(axis.n_bins())?);
        }
        Some(active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn axes() -> Vec<AxisBinning> {
        vec![
            AxisBinning::uniform(4, 0.0, 4.0).unwrap(),
            AxisBinning::uniform(2, 0.0, 2.0).unwrap(),
        ]
    }

    #[test]
    fn test_signature_keeps_order() {
        let restrictions = Restrictions::none().with(3, 1, 2).with(0, 0, 0);
        assert_eq!(restrictions.signature(), "_3=1-2_0=0-0");
        assert_eq!(Restrictions::none().signature(), "");
    }

    #[test]
    fn test_resolve_last_entry_wins() {
        let restrictions = Restrictions::none().with(0, 0, 1).with(0, 2, 9);
        let active = restrictions.resolve(&axes()).unwrap();
        assert_eq!(active[0], Some(AxisRange::new(2, 3)));
        assert_eq!(active[1], None);
    }

    #[test]
    fn test_resolve_rejects_missing_axis_and_empty_range() {
        assert!(Restrictions::none().with(2, 0, 0).resolve(&axes()).is_none());
        assert!(Restrictions::none().with(1, 2, 2).resolve(&axes()).is_none());
        assert!(Restrictions::none().with(0, 3, 1).resolve(&axes()).is_none());
    }

    #[test]
    fn test_by_borders() {
        let cube = DataCube::new("c", axes()).unwrap();
        let restrictions = Restrictions::by_borders(&cube, 0, 1.0, 3.0).unwrap();
        assert_eq!(restrictions.signature(), "_0=1-2");
        assert!(Restrictions::by_borders(&cube, 0, 1.5, 3.0).is_none());
    }

    #[test]
    fn test_first_bin_is_a_real_restriction() {
        let active = Restrictions::none().with(0, 0, 0).resolve(&axes()).unwrap();
        assert_eq!(active[0], Some(AxisRange::single(0)));
    }
}
