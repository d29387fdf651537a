//! Strength, raw fitness and density assignment.
//!
//! For a combined set `S` of population and archive members:
//!
//! * `strength(i)` counts the members `i` dominates,
//! * `raw_fitness(i)` sums the strengths of the members dominating `i`,
//! * `density(i) = 1 / (σ_k + 2)` with `σ_k` the objective-space distance to
//!   the k-th nearest other member and `k = floor(sqrt(|S|))`,
//! * `fitness(i) = raw_fitness(i) + density(i)`.
//!
//! Density stays inside `(0, 0.5]`, so it only orders members that share the
//! same raw fitness.

use crate::core::{dominates, objective_distance, Individual};

/// Neighbour rank `k = floor(sqrt(size))` used by the density estimate.
///
/// # Examples
/// ```
/// assert_eq!(swell::spea2::density_neighbour(25), 5);
/// assert_eq!(swell::spea2::density_neighbour(24), 4);
/// ```
#[must_use]
pub fn density_neighbour(size: usize) -> usize {
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    {
        (size as f64).sqrt().floor() as usize
    }
}

/// Symmetric matrix of Euclidean distances between objective vectors.
pub(crate) fn distance_matrix(objectives: &[&[f64]]) -> Vec<Vec<f64>> {
    let size = objectives.len();
    let mut distances = vec![vec![0.0; size]; size];
    for i in 0..size {
        for j in (i + 1)..size {
            let distance = objective_distance(objectives[i], objectives[j]);
            distances[i][j] = distance;
            distances[j][i] = distance;
        }
    }
    distances
}

/// Distances from `idx` to every other listed member, nearest first.
pub(crate) fn sorted_neighbours(distances: &[Vec<f64>], idx: usize, members: &[usize]) -> Vec<f64> {
    let mut row: Vec<f64> = members
        .iter()
        .filter(|&&other| other != idx)
        .map(|&other| distances[idx][other])
        .collect();
    row.sort_by(f64::total_cmp);
    row
}

/// Assigns strength, raw fitness, density and total fitness to every member.
///
/// # Panics
/// Panics when a member has not been evaluated or when objective vectors
/// differ in length.
///
/// # Examples
/// ```
/// use swell::Individual;
/// use swell::spea2::assign_fitness;
///
/// let mut set = vec![
///     Individual::with_objectives(vec![0.0], vec![0.0, 0.0]),
///     Individual::with_objectives(vec![1.0], vec![1.0, 1.0]),
/// ];
/// assign_fitness(&mut set);
/// assert_eq!(set[0].strength(), 1);
/// assert_eq!(set[0].raw_fitness(), 0.0);
/// assert_eq!(set[1].raw_fitness(), 1.0);
/// assert!(set[0].fitness() < set[1].fitness());
/// ```
pub fn assign_fitness<G>(individuals: &mut [Individual<G>]) {
    let size = individuals.len();
    if size == 0 {
        return;
    }
    let objectives: Vec<&[f64]> = individuals
        .iter()
        .map(Individual::evaluated_objectives)
        .collect();

    let mut strength = vec![0_usize; size];
    let mut dominators: Vec<Vec<usize>> = vec![Vec::new(); size];
    for i in 0..size {
        for j in (i + 1)..size {
            if dominates(objectives[i], objectives[j]) {
                strength[i] += 1;
                dominators[j].push(i);
            } else if dominates(objectives[j], objectives[i]) {
                strength[j] += 1;
                dominators[i].push(j);
            }
        }
    }
    #[allow(clippy::cast_precision_loss)]
    let raw_fitness: Vec<f64> = dominators
        .iter()
        .map(|list| list.iter().map(|&dominator| strength[dominator] as f64).sum())
        .collect();

    let k = density_neighbour(size);
    let distances = distance_matrix(&objectives);
    let everyone: Vec<usize> = (0..size).collect();
    let density: Vec<f64> = (0..size)
        .map(|idx| {
            let neighbours = sorted_neighbours(&distances, idx, &everyone);
            let kth = k.min(neighbours.len()).saturating_sub(1);
            let sigma = neighbours.get(kth).copied().unwrap_or(0.0);
            1.0 / (sigma + 2.0)
        })
        .collect();

    for (idx, individual) in individuals.iter_mut().enumerate() {
        individual.assign_fitness(strength[idx], raw_fitness[idx], density[idx]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(points: &[[f64; 2]]) -> Vec<Individual<Vec<f64>>> {
        points
            .iter()
            .map(|point| Individual::with_objectives(point.to_vec(), point.to_vec()))
            .collect()
    }

    #[test]
    fn nondominated_members_have_zero_raw_fitness() {
        let mut members = set(&[[0.0, 1.0], [1.0, 0.0], [1.0, 1.0], [2.0, 2.0]]);
        assign_fitness(&mut members);
        assert_eq!(members[0].raw_fitness(), 0.0);
        assert_eq!(members[1].raw_fitness(), 0.0);
        // [1,1] is dominated by both front members, each dominating two points.
        assert_eq!(members[2].raw_fitness(), 4.0);
        // [2,2] is dominated by everyone: 2 + 2 + 1.
        assert_eq!(members[3].raw_fitness(), 5.0);
        for (idx, member) in members.iter().enumerate() {
            let dominated = members
                .iter()
                .enumerate()
                .any(|(other, candidate)| other != idx && candidate.dominates(member));
            assert_eq!(member.is_nondominated(), !dominated);
        }
    }

    #[test]
    fn strength_counts_dominated_members() {
        let mut members = set(&[[0.0, 0.0], [1.0, 1.0], [2.0, 2.0]]);
        assign_fitness(&mut members);
        let strengths: Vec<usize> = members.iter().map(Individual::strength).collect();
        assert_eq!(strengths, vec![2, 1, 0]);
    }

    #[test]
    fn density_uses_kth_neighbour() {
        // Four members, k = 2: the second nearest neighbour distance counts.
        let mut members = set(&[[0.0, 0.0], [0.0, 1.0], [0.0, 3.0], [0.0, 6.0]]);
        assign_fitness(&mut members);
        assert!((members[0].density() - 1.0 / (3.0 + 2.0)).abs() < 1e-12);
        assert!((members[1].density() - 1.0 / (2.0 + 2.0)).abs() < 1e-12);
        assert!((members[3].density() - 1.0 / (5.0 + 2.0)).abs() < 1e-12);
    }

    #[test]
    fn density_never_overturns_raw_fitness() {
        let mut members = set(&[[0.0, 10.0], [10.0, 0.0], [0.5, 10.5], [100.0, 100.0]]);
        assign_fitness(&mut members);
        for member in &members {
            assert!(member.density() > 0.0 && member.density() <= 0.5);
        }
        assert!(members[0].fitness() < members[2].fitness());
        assert!(members[2].fitness() < members[3].fitness());
    }

    #[test]
    fn identical_objectives_share_fitness() {
        let mut members = set(&[[1.0, 1.0], [1.0, 1.0], [0.0, 2.0], [2.0, 0.0]]);
        assign_fitness(&mut members);
        assert_eq!(members[0].raw_fitness(), members[1].raw_fitness());
        assert_eq!(members[0].fitness(), members[1].fitness());
    }

    #[test]
    fn lone_member_gets_half_density() {
        let mut members = set(&[[3.0, 4.0]]);
        assign_fitness(&mut members);
        assert_eq!(members[0].fitness(), 0.5);
    }

    #[test]
    fn empty_set_is_a_no_op() {
        let mut members: Vec<Individual<Vec<f64>>> = Vec::new();
        assign_fitness(&mut members);
        assert!(members.is_empty());
    }
}
