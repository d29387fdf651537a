//! Mutation operators that perturb a genotype.

use crate::ops::{GeneBounds, OperatorError};
use rand::RngCore;
use rand_distr::{Distribution, Normal};

/// Produces a perturbed copy of a genotype.
///
/// `rates` holds one perturbation scale per gene (the engine's
/// `mutation_value_rate`). Implementations return a new value and never edit
/// the parent.
///
/// # Examples
/// ```
/// use swell::ops::MutationOperator;
/// use rand::RngCore;
///
/// let shift = |genes: &Vec<f64>, rates: &[f64], _rng: &mut dyn RngCore| -> Vec<f64> {
///     genes.iter().zip(rates).map(|(gene, rate)| gene + rate).collect()
/// };
/// let child = shift.mutate(&vec![0.0, 1.0], &[0.5, 0.5], &mut rand::thread_rng());
/// assert_eq!(child, vec![0.5, 1.5]);
/// ```
pub trait MutationOperator<G>: Send + Sync {
    /// Returns a mutated copy of `genotype`.
    fn mutate(&self, genotype: &G, rates: &[f64], rng: &mut dyn RngCore) -> G;
}

impl<G, F> MutationOperator<G> for F
where
    F: Fn(&G, &[f64], &mut dyn RngCore) -> G + Send + Sync,
{
    fn mutate(&self, genotype: &G, rates: &[f64], rng: &mut dyn RngCore) -> G {
        self(genotype, rates, rng)
    }
}

/// Adds `N(0, rate_i)` noise to every gene and clamps the result.
///
/// Genes without a matching rate are copied unchanged.
#[derive(Debug, Clone)]
pub struct GaussianMutation {
    bounds: GeneBounds,
}

impl GaussianMutation {
    /// Creates a Gaussian mutation operator confined to `bounds`.
    #[must_use]
    pub fn new(bounds: GeneBounds) -> Self {
        Self { bounds }
    }

    /// Bounds the offspring are clamped to.
    #[must_use]
    pub fn bounds(&self) -> &GeneBounds {
        &self.bounds
    }
}

impl MutationOperator<Vec<f64>> for GaussianMutation {
    fn mutate(&self, genotype: &Vec<f64>, rates: &[f64], rng: &mut dyn RngCore) -> Vec<f64> {
        let child = genotype
            .iter()
            .enumerate()
            .map(|(idx, &gene)| match rates.get(idx) {
                Some(&rate) => gene + gaussian(rate, rng),
                None => gene,
            })
            .collect();
        self.bounds.clamped(child)
    }
}

/// Checks that every per-gene perturbation scale is finite and non-negative.
///
/// # Errors
/// Returns [`OperatorError::InvalidParameter`] naming the first bad rate.
pub fn validate_rates(rates: &[f64]) -> Result<(), OperatorError> {
    for &rate in rates {
        if !(rate.is_finite() && rate >= 0.0) {
            return Err(OperatorError::InvalidParameter {
                operator: "mutation",
                parameter: "mutation_value_rate",
                value: rate,
            });
        }
    }
    Ok(())
}

/// One sample of `N(0, sigma)`; zero for degenerate scales.
pub(crate) fn gaussian(sigma: f64, rng: &mut dyn RngCore) -> f64 {
    match Normal::new(0.0, sigma) {
        Ok(normal) if sigma > 0.0 => normal.sample(rng),
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn gaussian_mutation_stays_within_bounds() {
        let operator = GaussianMutation::new(GeneBounds::uniform(1, 0.0, 1.0).unwrap());
        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..100 {
            let child = operator.mutate(&vec![0.5], &[5.0], &mut rng);
            assert!((0.0..=1.0).contains(&child[0]));
        }
    }

    #[test]
    fn zero_rate_leaves_gene_untouched() {
        let operator = GaussianMutation::new(GeneBounds::uniform(2, -1.0, 1.0).unwrap());
        let mut rng = StdRng::seed_from_u64(4);
        let child = operator.mutate(&vec![0.25, 0.75], &[0.0], &mut rng);
        assert_eq!(child, vec![0.25, 0.75]);
    }

    #[test]
    fn parent_is_not_modified() {
        let operator = GaussianMutation::new(GeneBounds::uniform(1, -10.0, 10.0).unwrap());
        let parent = vec![1.0];
        let mut rng = StdRng::seed_from_u64(8);
        let child = operator.mutate(&parent, &[1.0], &mut rng);
        assert_eq!(parent, vec![1.0]);
        assert_ne!(child, parent);
    }

    #[test]
    fn negative_rates_are_rejected() {
        assert!(validate_rates(&[0.1, -0.1]).is_err());
        assert!(validate_rates(&[0.1, 0.0]).is_ok());
    }
}
