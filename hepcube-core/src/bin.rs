//! Bin content with its statistical uncertainty.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Content of a single bin and its uncertainty (one standard deviation).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BinValue {
    /// Bin content (sum of weights, or a density after normalization).
    pub content: f64,
    /// Uncertainty of the content.
    pub error: f64,
}

impl BinValue {
    /// An empty bin.
    pub const ZERO: Self = Self {
        content: 0.0,
        error: 0.0,
    };

    /// Creates a new bin value.
    #[inline]
    #[must_use]
    pub fn new(content: f64, error: f64) -> Self {
        Self { content, error }
    }

    /// Adds another value, summing contents and combining errors in quadrature.
    #[inline]
    pub fn add_quadrature(&mut self, other: BinValue) {
        self.content += other.content;
        self.error = self.error.hypot(other.error);
    }

    /// Returns the value with both content and error multiplied by `factor`.
    #[inline]
    #[must_use]
    pub fn scaled(self, factor: f64) -> Self {
        Self {
            content: self.content * factor,
            error: self.error * factor,
        }
    }

    /// Lower end of the one-sigma band.
    #[inline]
    #[must_use]
    pub fn lower(self) -> f64 {
        self.content - self.error
    }

    /// Upper end of the one-sigma band.
    #[inline]
    #[must_use]
    pub fn upper(self) -> f64 {
        self.content + self.error
    }

    /// Returns true if both content and error are zero.
    #[inline]
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.content == 0.0 && self.error == 0.0
    }
}
