//! Objective function abstractions.
//!
//! The optimizer treats the objective function as an opaque oracle: it hands
//! over a genotype and receives one error value per criterion, lower being
//! better. Closures implement [`ObjectiveFunction`] directly.

use crate::core::Genotype;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// Convenience alias used by the objective traits.
pub type ObjectiveResult<T> = Result<T, ObjectiveError>;

/// Errors reported by objective functions.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ObjectiveError {
    /// The genotype has the wrong number of parameters.
    #[error("candidate has {found} parameters but the objective expects {expected}")]
    DimensionMismatch {
        /// Number of parameters expected by the objective.
        expected: usize,
        /// Number of parameters provided by the candidate.
        found: usize,
    },
    /// The forecast oracle has no output for the requested parameters.
    #[error("no forecast available for parameters {0:?}")]
    MissingForecast(Vec<f64>),
    /// The number of forecast series differs from the number of observed stations.
    #[error("model produced {found} station series but {expected} observations were provided")]
    StationCountMismatch {
        /// Number of observed stations.
        expected: usize,
        /// Number of forecast series.
        found: usize,
    },
    /// An observed station series holds no samples.
    #[error("observation series for station {station} is empty")]
    EmptyObservation {
        /// Index of the station.
        station: usize,
    },
    /// A reference run scored zero error, so ratios against it are undefined.
    #[error("reference error for station {station} is zero")]
    ZeroReference {
        /// Index of the station.
        station: usize,
    },
    /// Any other evaluation failure.
    #[error("objective evaluation failed: {0}")]
    Failed(String),
}

/// Maps a genotype to its objective vector.
///
/// # Examples
/// ```
/// use swell::ops::{ObjectiveFunction, ObjectiveResult};
///
/// let objectives = |genes: &Vec<f64>| -> ObjectiveResult<Vec<f64>> {
///     Ok(vec![genes[0], 1.0 - genes[0]])
/// };
/// assert_eq!(objectives.objectives(&vec![0.25]).unwrap(), vec![0.25, 0.75]);
/// ```
pub trait ObjectiveFunction<G>: Send + Sync {
    /// Evaluates `genotype`.
    ///
    /// # Errors
    /// Implementations return [`ObjectiveError`] when the genotype cannot be
    /// ranked.
    fn objectives(&self, genotype: &G) -> ObjectiveResult<Vec<f64>>;
}

impl<G, F> ObjectiveFunction<G> for F
where
    F: Fn(&G) -> ObjectiveResult<Vec<f64>> + Send + Sync,
{
    fn objectives(&self, genotype: &G) -> ObjectiveResult<Vec<f64>> {
        self(genotype)
    }
}

/// Objective function evaluated asynchronously, for oracles backed by I/O.
#[async_trait]
pub trait AsyncObjectiveFunction<G: Sync>: Send + Sync {
    /// Evaluates `genotype` asynchronously.
    async fn objectives_async(&self, genotype: &G) -> ObjectiveResult<Vec<f64>>;
}

/// Caches the results of an objective function per distinct genotype.
///
/// Genotypes are keyed on the bit patterns of [`Genotype::genes`], so two
/// genotypes with identical components share one evaluation. Failures are not
/// cached.
///
/// # Examples
/// ```
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use swell::ops::{Memoized, ObjectiveFunction, ObjectiveResult};
///
/// static CALLS: AtomicUsize = AtomicUsize::new(0);
/// let memoized = Memoized::new(|genes: &Vec<f64>| -> ObjectiveResult<Vec<f64>> {
///     CALLS.fetch_add(1, Ordering::SeqCst);
///     Ok(genes.clone())
/// });
/// memoized.objectives(&vec![1.0]).unwrap();
/// memoized.objectives(&vec![1.0]).unwrap();
/// assert_eq!(CALLS.load(Ordering::SeqCst), 1);
/// ```
#[derive(Debug)]
pub struct Memoized<F> {
    inner: F,
    cache: Mutex<HashMap<Vec<u64>, Vec<f64>>>,
}

impl<F> Memoized<F> {
    /// Wraps `inner` with an empty cache.
    #[must_use]
    pub fn new(inner: F) -> Self {
        Self {
            inner,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Number of distinct genotypes evaluated so far.
    #[must_use]
    pub fn cached(&self) -> usize {
        self.cache.lock().map_or(0, |cache| cache.len())
    }
}

impl<G, F> ObjectiveFunction<G> for Memoized<F>
where
    G: Genotype,
    F: ObjectiveFunction<G>,
{
    fn objectives(&self, genotype: &G) -> ObjectiveResult<Vec<f64>> {
        let key: Vec<u64> = genotype.genes().iter().map(|gene| gene.to_bits()).collect();
        if let Ok(cache) = self.cache.lock() {
            if let Some(hit) = cache.get(&key) {
                return Ok(hit.clone());
            }
        }
        let objectives = self.inner.objectives(genotype)?;
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(key, objectives.clone());
        }
        Ok(objectives)
    }
}
