//! Box constraints for real-valued genotypes.

use rand::distributions::{Distribution, Uniform};
use rand::RngCore;

/// Error returned when invalid bounds are provided.
///
/// # Examples
/// ```
/// use swell::ops::GeneBounds;
/// let err = GeneBounds::new(vec![0.0, 0.0], vec![1.0]).unwrap_err();
/// assert!(err.to_string().contains("dimension mismatch"));
/// ```
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BoundsError {
    /// The lower and upper vectors have different lengths.
    #[error("dimension mismatch: expected {expected} bounds entries but found {found}")]
    DimensionMismatch {
        /// Number of lower bounds.
        expected: usize,
        /// Number of upper bounds.
        found: usize,
    },
    /// One of the dimensions has an invalid lower/upper pairing.
    #[error("invalid bounds for dimension {dimension} (lower: {lower}, upper: {upper})")]
    InvalidRange {
        /// Index of the problematic dimension.
        dimension: usize,
        /// Offending lower bound.
        lower: f64,
        /// Offending upper bound.
        upper: f64,
    },
}

/// Per-gene legal ranges `[lower, upper]`.
///
/// # Examples
/// ```
/// use swell::ops::GeneBounds;
/// let bounds = GeneBounds::new(vec![-1.0, 0.0], vec![1.0, 0.5]).unwrap();
/// assert_eq!(bounds.clamped(vec![-2.0, 0.7]), vec![-1.0, 0.5]);
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct GeneBounds {
    lower: Vec<f64>,
    upper: Vec<f64>,
}

impl GeneBounds {
    /// Validates and stores the bounds.
    ///
    /// # Errors
    /// Returns [`BoundsError`] when the vectors differ in length, when any
    /// bound is not finite, or when a lower bound exceeds its upper bound.
    pub fn new(lower: Vec<f64>, upper: Vec<f64>) -> Result<Self, BoundsError> {
        if lower.len() != upper.len() {
            return Err(BoundsError::DimensionMismatch {
                expected: lower.len(),
                found: upper.len(),
            });
        }
        for (dimension, (&lo, &hi)) in lower.iter().zip(upper.iter()).enumerate() {
            if !(lo.is_finite() && hi.is_finite()) || lo > hi {
                return Err(BoundsError::InvalidRange {
                    dimension,
                    lower: lo,
                    upper: hi,
                });
            }
        }
        Ok(Self { lower, upper })
    }

    /// Same `[lower, upper]` range for every dimension.
    ///
    /// # Errors
    /// Returns [`BoundsError::InvalidRange`] when `lower > upper`.
    pub fn uniform(dimensions: usize, lower: f64, upper: f64) -> Result<Self, BoundsError> {
        Self::new(vec![lower; dimensions], vec![upper; dimensions])
    }

    /// Number of genes covered by the bounds.
    #[must_use]
    pub fn dimensions(&self) -> usize {
        self.lower.len()
    }

    /// Lower bounds.
    #[must_use]
    pub fn lower(&self) -> &[f64] {
        &self.lower
    }

    /// Upper bounds.
    #[must_use]
    pub fn upper(&self) -> &[f64] {
        &self.upper
    }

    /// Width of every range.
    #[must_use]
    pub fn spans(&self) -> Vec<f64> {
        self.lower
            .iter()
            .zip(self.upper.iter())
            .map(|(lo, hi)| hi - lo)
            .collect()
    }

    /// Indicates whether every gene lies inside its range.
    #[must_use]
    pub fn contains(&self, genes: &[f64]) -> bool {
        genes.len() == self.dimensions()
            && genes
                .iter()
                .zip(self.lower.iter().zip(self.upper.iter()))
                .all(|(value, (lo, hi))| (*lo..=*hi).contains(value))
    }

    /// Clamps every gene into its range. Extra genes are left untouched.
    pub fn clamp(&self, genes: &mut [f64]) {
        for (value, (&lo, &hi)) in genes
            .iter_mut()
            .zip(self.lower.iter().zip(self.upper.iter()))
        {
            *value = if value.is_nan() { lo } else { value.clamp(lo, hi) };
        }
    }

    /// Returns a clamped copy of `genes`.
    #[must_use]
    pub fn clamped(&self, mut genes: Vec<f64>) -> Vec<f64> {
        self.clamp(&mut genes);
        genes
    }

    /// Draws a uniformly random point inside the bounds.
    pub fn sample(&self, rng: &mut dyn RngCore) -> Vec<f64> {
        self.lower
            .iter()
            .zip(self.upper.iter())
            .map(|(&lo, &hi)| Uniform::new_inclusive(lo, hi).sample(rng))
            .collect()
    }
}
