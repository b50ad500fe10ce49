//! Projection requests and an explicit projection cache.
//!
//! Plotting code asks for the same projection of the same cube many times.
//! [`ProjectionCache`] memoizes results under a key built from the cube
//! name, the restriction signature, the kept axes and the normalization
//! flag, so a cached result can never be confused with a projection under
//! different restrictions.

use std::collections::HashMap;

use hepcube_core::{DataCube, Projection, Restrictions};
use log::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One projection to run on a cube.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ProjectionRequest {
    /// One or two axes kept in the output.
    pub keep_axes: Vec<usize>,
    /// Bin ranges selected on any axis.
    pub restrictions: Restrictions,
    /// Divide the output by bin width (1-D) or area (2-D).
    pub normalize_to_bin_width: bool,
}

impl ProjectionRequest {
    /// Projection onto a single axis without restrictions.
    #[must_use]
    pub fn onto(axis: usize) -> Self {
        Self {
            keep_axes: vec![axis],
            ..Self::default()
        }
    }

    /// Projection onto two axes without restrictions.
    #[must_use]
    pub fn onto_pair(x_axis: usize, y_axis: usize) -> Self {
        Self {
            keep_axes: vec![x_axis, y_axis],
            ..Self::default()
        }
    }

    /// Adds a restriction of `axis` to bins `low..=high`.
    #[must_use]
    pub fn restrict(mut self, axis: usize, low: usize, high: usize) -> Self {
        self.restrictions = self.restrictions.with(axis, low, high);
        self
    }

    /// Replaces all restrictions.
    #[must_use]
    pub fn with_restrictions(mut self, restrictions: Restrictions) -> Self {
        self.restrictions = restrictions;
        self
    }

    /// Sets bin-width normalization.
    #[must_use]
    pub fn with_normalization(mut self, normalize: bool) -> Self {
        self.normalize_to_bin_width = normalize;
        self
    }

    /// Name suffix of the projected histogram.
    #[must_use]
    pub fn signature(&self) -> String {
        self.restrictions.signature()
    }

    /// Runs the request on `cube`.
    #[must_use]
    pub fn run(&self, cube: &DataCube) -> Option<Projection> {
        cube.project(
            &self.keep_axes,
            &self.restrictions,
            self.normalize_to_bin_width,
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct CacheKey {
    cube: String,
    signature: String,
    keep_axes: Vec<usize>,
    normalize: bool,
}

impl CacheKey {
    fn new(cube: &DataCube, request: &ProjectionRequest) -> Self {
        Self {
            cube: cube.name().to_string(),
            signature: request.signature(),
            keep_axes: request.keep_axes.clone(),
            normalize: request.normalize_to_bin_width,
        }
    }
}

/// Hit and miss counts of a [`ProjectionCache`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStatistics {
    /// Requests answered from the cache.
    pub hits: usize,
    /// Requests that ran a projection.
    pub misses: usize,
}

/// Memoized projections, keyed on the full request.
///
/// Failed projections are cached too, so a bad request is only logged once.
#[derive(Debug, Default)]
pub struct ProjectionCache {
    entries: HashMap<CacheKey, Option<Projection>>,
    stats: CacheStatistics,
}

impl ProjectionCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the projection for `request`, computing it on first use.
    pub fn get_or_project(
        &mut self,
        cube: &DataCube,
        request: &ProjectionRequest,
    ) -> Option<&Projection> {
        let key = CacheKey::new(cube, request);
        if self.entries.contains_key(&key) {
            self.stats.hits += 1;
        } else {
            self.stats.misses += 1;
            debug!(
                "projecting {}{} onto {:?}",
                cube.name(),
                key.signature,
                request.keep_axes
            );
            let projection = request.run(cube);
            self.entries.insert(key.clone(), projection);
        }
        self.entries.get(&key).and_then(Option::as_ref)
    }

    /// Hit and miss counts so far.
    #[must_use]
    pub fn statistics(&self) -> CacheStatistics {
        self.stats
    }

    /// Number of cached requests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every cached projection and resets the statistics.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.stats = CacheStatistics::default();
    }
}

/// Runs every request on `cube` in order.
#[must_use]
pub fn project_all(cube: &DataCube, requests: &[ProjectionRequest]) -> Vec<Option<Projection>> {
    requests.iter().map(|request| request.run(cube)).collect()
}
