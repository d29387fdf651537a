//! Fixed-capacity archive and environmental selection.

use super::fitness::{distance_matrix, sorted_neighbours};
use super::Spea2Error;
use crate::core::{by_fitness, Individual};
use std::cmp::Ordering;

/// Elite set carried between generations.
///
/// After every call to [`Archive::select`] the archive holds exactly
/// [`Archive::capacity`] members. Member order carries no meaning.
#[derive(Debug, Clone)]
pub struct Archive<G> {
    capacity: usize,
    members: Vec<Individual<G>>,
}

impl<G> Archive<G> {
    /// Creates an empty archive.
    ///
    /// # Errors
    /// Returns [`Spea2Error::InvalidArchiveSize`] when `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self, Spea2Error> {
        if capacity == 0 {
            return Err(Spea2Error::InvalidArchiveSize(capacity));
        }
        Ok(Self {
            capacity,
            members: Vec::with_capacity(capacity),
        })
    }

    /// Number of members kept by every selection.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Current number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Indicates whether the archive holds no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Current members.
    #[must_use]
    pub fn members(&self) -> &[Individual<G>] {
        &self.members
    }

    /// Member with the lowest total fitness.
    #[must_use]
    pub fn best(&self) -> Option<&Individual<G>> {
        self.members.iter().min_by(|lhs, rhs| by_fitness(lhs, rhs))
    }

    /// Removes and returns every member, leaving the archive empty.
    pub fn take_members(&mut self) -> Vec<Individual<G>> {
        std::mem::take(&mut self.members)
    }

    /// Replaces the members with the environmental selection of `candidates`.
    ///
    /// `candidates` must carry fitness assigned over the same set.
    ///
    /// # Errors
    /// Returns [`Spea2Error::InsufficientCandidates`] when fewer candidates
    /// than [`Archive::capacity`] are available. The archive is left empty in
    /// that case.
    pub fn select(&mut self, candidates: Vec<Individual<G>>) -> Result<(), Spea2Error> {
        self.members.clear();
        self.members = environmental_selection(candidates, self.capacity)?;
        Ok(())
    }
}

/// Picks exactly `size` members out of `candidates`.
///
/// Nondominated candidates always enter first. A short front is padded with
/// the dominated candidates of lowest fitness, keeping input order on ties. An
/// oversized front is reduced with [`truncate`].
///
/// # Errors
/// Returns [`Spea2Error::InvalidArchiveSize`] for a zero `size` and
/// [`Spea2Error::InsufficientCandidates`] when `candidates` holds fewer than
/// `size` members.
///
/// # Examples
/// ```
/// use swell::Individual;
/// use swell::spea2::{assign_fitness, environmental_selection};
///
/// let mut candidates: Vec<Individual<Vec<f64>>> = [[0.0, 2.0], [2.0, 0.0], [3.0, 3.0], [4.0, 4.0]]
///     .iter()
///     .map(|point| Individual::with_objectives(point.to_vec(), point.to_vec()))
///     .collect();
/// assign_fitness(&mut candidates);
/// let archive = environmental_selection(candidates, 3).unwrap();
/// assert_eq!(archive.len(), 3);
/// assert_eq!(archive[2].genotype(), &vec![3.0, 3.0]);
/// ```
pub fn environmental_selection<G>(
    candidates: Vec<Individual<G>>,
    size: usize,
) -> Result<Vec<Individual<G>>, Spea2Error> {
    if size == 0 {
        return Err(Spea2Error::InvalidArchiveSize(size));
    }
    let available = candidates.len();
    if available < size {
        return Err(Spea2Error::InsufficientCandidates {
            required: size,
            available,
        });
    }
    let (mut front, mut dominated): (Vec<_>, Vec<_>) = candidates
        .into_iter()
        .partition(Individual::is_nondominated);
    match front.len().cmp(&size) {
        Ordering::Equal => Ok(front),
        Ordering::Less => {
            dominated.sort_by(by_fitness);
            let missing = size - front.len();
            front.extend(dominated.into_iter().take(missing));
            Ok(front)
        }
        Ordering::Greater => Ok(truncate(front, size)),
    }
}

/// Removes the most crowded member until `size` members remain.
///
/// Each step removes exactly one member: the one whose ascending list of
/// distances to the remaining members is lexicographically smallest. Exact
/// ties remove the earliest member.
#[must_use]
pub fn truncate<G>(members: Vec<Individual<G>>, size: usize) -> Vec<Individual<G>> {
    if members.len() <= size {
        return members;
    }
    let objectives: Vec<&[f64]> = members
        .iter()
        .map(Individual::evaluated_objectives)
        .collect();
    let distances = distance_matrix(&objectives);
    let mut alive: Vec<usize> = (0..members.len()).collect();
    while alive.len() > size {
        let Some(position) = most_crowded(&distances, &alive) else {
            break;
        };
        alive.remove(position);
    }
    let mut keep = vec![false; members.len()];
    for idx in alive {
        keep[idx] = true;
    }
    members
        .into_iter()
        .zip(keep)
        .filter_map(|(member, kept)| kept.then_some(member))
        .collect()
}

/// Position in `alive` of the member with the lexicographically smallest
/// sorted neighbour distances.
fn most_crowded(distances: &[Vec<f64>], alive: &[usize]) -> Option<usize> {
    let neighbours: Vec<Vec<f64>> = alive
        .iter()
        .map(|&idx| sorted_neighbours(distances, idx, alive))
        .collect();
    (0..alive.len()).min_by(|&lhs, &rhs| lexicographic(&neighbours[lhs], &neighbours[rhs]))
}

fn lexicographic(lhs: &[f64], rhs: &[f64]) -> Ordering {
    lhs.iter()
        .zip(rhs.iter())
        .map(|(a, b)| a.total_cmp(b))
        .find(|ordering| ordering.is_ne())
        .unwrap_or_else(|| lhs.len().cmp(&rhs.len()))
}
