//! Crossover operators that recombine two parent genotypes.

use crate::ops::{GeneBounds, OperatorError};
use rand::{Rng, RngCore};

/// Produces two offspring genotypes from two parents.
///
/// Closures with the matching signature implement the trait.
///
/// # Examples
/// ```
/// use swell::ops::CrossoverOperator;
/// use rand::RngCore;
///
/// let swap = |a: &Vec<f64>, b: &Vec<f64>, _rng: &mut dyn RngCore| (b.clone(), a.clone());
/// let (child_a, child_b) = swap.crossover(&vec![0.0], &vec![1.0], &mut rand::thread_rng());
/// assert_eq!((child_a, child_b), (vec![1.0], vec![0.0]));
/// ```
pub trait CrossoverOperator<G>: Send + Sync {
    /// Recombines `parent_a` and `parent_b` into two new genotypes.
    fn crossover(&self, parent_a: &G, parent_b: &G, rng: &mut dyn RngCore) -> (G, G);
}

impl<G, F> CrossoverOperator<G> for F
where
    F: Fn(&G, &G, &mut dyn RngCore) -> (G, G) + Send + Sync,
{
    fn crossover(&self, parent_a: &G, parent_b: &G, rng: &mut dyn RngCore) -> (G, G) {
        self(parent_a, parent_b, rng)
    }
}

/// Whole arithmetic crossover: `child_a = w·a + (1-w)·b`,
/// `child_b = (1-w)·a + w·b` with one uniform weight `w` per mating.
///
/// Children are convex combinations of their parents, so they never leave the
/// box spanned by them.
#[derive(Debug, Clone, Default)]
pub struct ArithmeticCrossover;

impl CrossoverOperator<Vec<f64>> for ArithmeticCrossover {
    fn crossover(
        &self,
        parent_a: &Vec<f64>,
        parent_b: &Vec<f64>,
        rng: &mut dyn RngCore,
    ) -> (Vec<f64>, Vec<f64>) {
        let weight: f64 = rng.gen();
        let (child_a, child_b) = parent_a
            .iter()
            .zip(parent_b.iter())
            .map(|(&a, &b)| {
                (
                    weight * a + (1.0 - weight) * b,
                    (1.0 - weight) * a + weight * b,
                )
            })
            .unzip();
        (child_a, child_b)
    }
}

/// Simulated Binary Crossover (SBX) following Deb & Agrawal, clamped to the
/// provided bounds.
#[derive(Debug, Clone)]
pub struct SimulatedBinaryCrossover {
    distribution_index: f64,
    bounds: GeneBounds,
}

impl SimulatedBinaryCrossover {
    /// Creates a new SBX operator.
    ///
    /// # Errors
    /// Returns [`OperatorError::InvalidDistributionIndex`] when the
    /// distribution index is non-positive or not finite.
    pub fn new(distribution_index: f64, bounds: GeneBounds) -> Result<Self, OperatorError> {
        if !(distribution_index.is_finite() && distribution_index > 0.0) {
            return Err(OperatorError::InvalidDistributionIndex {
                operator: "sbx",
                value: distribution_index,
            });
        }
        Ok(Self {
            distribution_index,
            bounds,
        })
    }

    fn crossover_gene(&self, value_a: f64, value_b: f64, rng: &mut dyn RngCore) -> (f64, f64) {
        if (value_a - value_b).abs() < f64::EPSILON {
            return (value_a, value_b);
        }
        let u: f64 = rng.gen();
        let beta = if u <= 0.5 {
            (2.0 * u).powf(1.0 / (self.distribution_index + 1.0))
        } else {
            (2.0 * (1.0 - u)).powf(-1.0 / (self.distribution_index + 1.0))
        };
        let child1 = 0.5 * ((1.0 + beta) * value_a + (1.0 - beta) * value_b);
        let child2 = 0.5 * ((1.0 - beta) * value_a + (1.0 + beta) * value_b);
        (child1, child2)
    }
}

impl CrossoverOperator<Vec<f64>> for SimulatedBinaryCrossover {
    fn crossover(
        &self,
        parent_a: &Vec<f64>,
        parent_b: &Vec<f64>,
        rng: &mut dyn RngCore,
    ) -> (Vec<f64>, Vec<f64>) {
        let mut child_a = Vec::with_capacity(parent_a.len());
        let mut child_b = Vec::with_capacity(parent_b.len());
        for (&value_a, &value_b) in parent_a.iter().zip(parent_b.iter()) {
            let (gene_a, gene_b) = self.crossover_gene(value_a, value_b, rng);
            child_a.push(gene_a);
            child_b.push(gene_b);
        }
        (self.bounds.clamped(child_a), self.bounds.clamped(child_b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn arithmetic_children_lie_between_parents() {
        let mut rng = StdRng::seed_from_u64(11);
        let parent_a = vec![0.0, 4.0];
        let parent_b = vec![2.0, -4.0];
        for _ in 0..20 {
            let (child_a, child_b) = ArithmeticCrossover.crossover(&parent_a, &parent_b, &mut rng);
            for child in [child_a, child_b] {
                assert!((0.0..=2.0).contains(&child[0]));
                assert!((-4.0..=4.0).contains(&child[1]));
            }
        }
    }

    #[test]
    fn arithmetic_preserves_gene_sums() {
        let mut rng = StdRng::seed_from_u64(5);
        let (child_a, child_b) = ArithmeticCrossover.crossover(&vec![1.0], &vec![3.0], &mut rng);
        assert!((child_a[0] + child_b[0] - 4.0).abs() < 1e-12);
    }

    #[test]
    fn sbx_respects_identical_parents() {
        let bounds = GeneBounds::uniform(2, 0.0, 5.0).unwrap();
        let operator = SimulatedBinaryCrossover::new(15.0, bounds).unwrap();
        let parent = vec![1.0, 2.0];
        let mut rng = StdRng::seed_from_u64(1);
        let (child_a, child_b) = operator.crossover(&parent, &parent, &mut rng);
        assert_eq!(child_a, parent);
        assert_eq!(child_b, parent);
    }

    #[test]
    fn sbx_children_stay_in_bounds() {
        let bounds = GeneBounds::uniform(1, 0.0, 1.0).unwrap();
        let operator = SimulatedBinaryCrossover::new(2.0, bounds.clone()).unwrap();
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..50 {
            let (child_a, child_b) = operator.crossover(&vec![0.01], &vec![0.99], &mut rng);
            assert!(bounds.contains(&child_a));
            assert!(bounds.contains(&child_b));
        }
    }

    #[test]
    fn sbx_rejects_bad_index() {
        let bounds = GeneBounds::uniform(1, 0.0, 1.0).unwrap();
        assert!(SimulatedBinaryCrossover::new(0.0, bounds).is_err());
    }
}
