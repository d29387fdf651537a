//! Mating selection over fitness values where lower is better.

use rand::{Rng, RngCore};

/// Picks parents given the total fitness of the candidates.
///
/// # Examples
/// ```
/// use swell::ops::SelectionOperator;
///
/// struct BestOnly;
///
/// impl SelectionOperator for BestOnly {
///     fn select_index(&self, fitness: &[f64], _rng: &mut dyn rand::RngCore) -> Option<usize> {
///         fitness
///             .iter()
///             .enumerate()
///             .min_by(|(_, a), (_, b)| a.total_cmp(b))
///             .map(|(idx, _)| idx)
///     }
/// }
///
/// let pool = BestOnly.mating_pool(&[0.4, 0.1, 0.3], 2, &mut rand::thread_rng()).unwrap();
/// assert_eq!(pool, vec![1, 1]);
/// ```
pub trait SelectionOperator: Send + Sync {
    /// Returns the index of the chosen candidate, or `None` when `fitness`
    /// is empty.
    fn select_index(&self, fitness: &[f64], rng: &mut dyn RngCore) -> Option<usize>;

    /// Fills a mating pool of `size` indices.
    fn mating_pool(
        &self,
        fitness: &[f64],
        size: usize,
        rng: &mut dyn RngCore,
    ) -> Option<Vec<usize>> {
        (0..size).map(|_| self.select_index(fitness, rng)).collect()
    }
}

/// Binary tournament: two distinct candidates drawn uniformly, the one with
/// lower fitness wins. Ties go to the first draw.
#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryTournament;

impl SelectionOperator for BinaryTournament {
    fn select_index(&self, fitness: &[f64], rng: &mut dyn RngCore) -> Option<usize> {
        match fitness.len() {
            0 => None,
            1 => Some(0),
            len => {
                let idx_a = rng.gen_range(0..len);
                let mut idx_b = rng.gen_range(0..len - 1);
                if idx_b >= idx_a {
                    idx_b += 1;
                }
                if fitness[idx_b] < fitness[idx_a] {
                    Some(idx_b)
                } else {
                    Some(idx_a)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn empty_pool_selects_nothing() {
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(BinaryTournament.select_index(&[], &mut rng), None);
        assert_eq!(BinaryTournament.mating_pool(&[], 3, &mut rng), None);
    }

    #[test]
    fn single_candidate_always_wins() {
        let mut rng = StdRng::seed_from_u64(0);
        let pool = BinaryTournament.mating_pool(&[7.0], 4, &mut rng).unwrap();
        assert_eq!(pool, vec![0, 0, 0, 0]);
    }

    #[test]
    fn worst_of_two_never_wins() {
        let mut rng = StdRng::seed_from_u64(21);
        let pool = BinaryTournament
            .mating_pool(&[0.0, 1.0], 50, &mut rng)
            .unwrap();
        assert!(pool.iter().all(|&idx| idx == 0));
    }

    #[test]
    fn worst_candidate_is_never_selected() {
        let mut rng = StdRng::seed_from_u64(13);
        let fitness = [0.3, 0.1, 2.0, 0.2];
        let pool = BinaryTournament.mating_pool(&fitness, 200, &mut rng).unwrap();
        assert!(!pool.contains(&2));
        assert!(pool.contains(&1));
    }
}
