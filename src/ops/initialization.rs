//! Stratified initial populations.

use crate::ops::GeneBounds;
use rand::seq::SliceRandom;
use rand::{Rng, RngCore};

/// Builds the generation-zero genotypes.
///
/// # Examples
/// ```
/// use swell::ops::InitialPopulation;
/// use rand::RngCore;
///
/// let zeros = |size: usize, _rng: &mut dyn RngCore| vec![vec![0.0]; size];
/// assert_eq!(zeros.initial_population(3, &mut rand::thread_rng()).len(), 3);
/// ```
pub trait InitialPopulation<G>: Send + Sync {
    /// Returns exactly `size` genotypes.
    fn initial_population(&self, size: usize, rng: &mut dyn RngCore) -> Vec<G>;
}

impl<G, F> InitialPopulation<G> for F
where
    F: Fn(usize, &mut dyn RngCore) -> Vec<G> + Send + Sync,
{
    fn initial_population(&self, size: usize, rng: &mut dyn RngCore) -> Vec<G> {
        self(size, rng)
    }
}

/// Latin hypercube samples of `size` points in the unit cube of dimension
/// `dimensions`.
///
/// Each axis is split into `size` equal strata and every stratum receives
/// exactly one point; strata are paired across axes by independent random
/// permutations.
pub fn latin_hypercube_unit(size: usize, dimensions: usize, rng: &mut dyn RngCore) -> Vec<Vec<f64>> {
    let mut points = vec![Vec::with_capacity(dimensions); size];
    if size == 0 {
        return points;
    }
    #[allow(clippy::cast_precision_loss)]
    let strata = size as f64;
    let mut order: Vec<usize> = (0..size).collect();
    for _ in 0..dimensions {
        order.shuffle(rng);
        for (point, &stratum) in points.iter_mut().zip(order.iter()) {
            let offset: f64 = rng.gen();
            #[allow(clippy::cast_precision_loss)]
            point.push((stratum as f64 + offset) / strata);
        }
    }
    points
}

/// Latin hypercube initializer over real-valued bounds.
#[derive(Debug, Clone)]
pub struct LatinHypercube {
    bounds: GeneBounds,
}

impl LatinHypercube {
    /// Creates an initializer that samples inside `bounds`.
    #[must_use]
    pub fn new(bounds: GeneBounds) -> Self {
        Self { bounds }
    }
}

impl InitialPopulation<Vec<f64>> for LatinHypercube {
    fn initial_population(&self, size: usize, rng: &mut dyn RngCore) -> Vec<Vec<f64>> {
        let spans = self.bounds.spans();
        latin_hypercube_unit(size, self.bounds.dimensions(), rng)
            .into_iter()
            .map(|unit| {
                let genes = unit
                    .iter()
                    .zip(self.bounds.lower().iter().zip(spans.iter()))
                    .map(|(u, (lower, span))| lower + u * span)
                    .collect();
                self.bounds.clamped(genes)
            })
            .collect()
    }
}
