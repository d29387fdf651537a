//! Core SPEA2 primitives.
//!
//! This module provides the genotype abstraction together with the
//! [`Individual`] and [`Population`] containers that the optimizer moves
//! between generations. Individuals never change their genotype or objectives
//! after creation; variation always produces a new value.

pub mod experiment;

use std::cmp::Ordering;

/// Candidate parameter vector handled by the optimizer.
///
/// Implementors expose their components as plain floats so the engine can
/// report them and evaluators can key caches on them. [`Genotype::repaired`]
/// moves a value back into its legal domain after crossover or mutation.
///
/// # Examples
/// ```
/// use swell::Genotype;
/// let genes = vec![0.5, 1.5];
/// assert_eq!(genes.genes(), vec![0.5, 1.5]);
/// assert_eq!(genes.clone().repaired(), genes);
/// ```
pub trait Genotype: Clone + std::fmt::Debug {
    /// Returns the components of the genotype in declaration order.
    fn genes(&self) -> Vec<f64>;

    /// Returns a copy of the genotype with every component inside its legal
    /// range. The default implementation assumes the value is unconstrained.
    #[must_use]
    fn repaired(self) -> Self {
        self
    }
}

impl Genotype for Vec<f64> {
    fn genes(&self) -> Vec<f64> {
        self.clone()
    }
}

/// Returns `true` when `candidate` Pareto-dominates `other`.
///
/// Every objective of `candidate` must be less than or equal to the matching
/// objective of `other`, and at least one must be strictly less.
///
/// # Panics
/// Panics when the objective vectors have different lengths, which means the
/// objective function is misconfigured.
///
/// # Examples
/// ```
/// assert!(swell::dominates(&[0.0, 0.5], &[0.1, 0.5]));
/// assert!(!swell::dominates(&[0.1, 0.5], &[0.1, 0.5]));
/// ```
#[must_use]
pub fn dominates(candidate: &[f64], other: &[f64]) -> bool {
    assert_eq!(
        candidate.len(),
        other.len(),
        "objective vectors must have the same length"
    );
    let mut strictly_better = false;
    for (&a, &b) in candidate.iter().zip(other.iter()) {
        if a > b {
            return false;
        }
        if a < b {
            strictly_better = true;
        }
    }
    strictly_better
}

/// Euclidean distance between two objective vectors.
pub(crate) fn objective_distance(a: &[f64], b: &[f64]) -> f64 {
    assert_eq!(a.len(), b.len(), "objective vectors must have the same length");
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

/// A genotype together with its cached objectives and SPEA2 fitness terms.
///
/// # Examples
/// ```
/// use swell::Individual;
/// let individual = Individual::with_objectives(vec![0.0, 1.0], vec![0.2, 0.8]);
/// assert_eq!(individual.objectives(), Some(&[0.2, 0.8][..]));
/// assert!(!individual.dominates(&individual));
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Individual<G> {
    genotype: G,
    objectives: Option<Vec<f64>>,
    strength: usize,
    raw_fitness: f64,
    density: f64,
    fitness: f64,
}

impl<G> Individual<G> {
    /// Creates an individual that has not been evaluated yet.
    #[must_use]
    pub fn new(genotype: G) -> Self {
        Self {
            genotype,
            objectives: None,
            strength: 0,
            raw_fitness: 0.0,
            density: 0.0,
            fitness: 0.0,
        }
    }

    /// Creates an individual whose objectives are already known.
    #[must_use]
    pub fn with_objectives(genotype: G, objectives: Vec<f64>) -> Self {
        Self {
            objectives: Some(objectives),
            ..Self::new(genotype)
        }
    }

    /// Returns the genotype.
    #[must_use]
    pub fn genotype(&self) -> &G {
        &self.genotype
    }

    /// Consumes the individual and returns its genotype.
    #[must_use]
    pub fn into_genotype(self) -> G {
        self.genotype
    }

    /// Returns the cached objective vector, if the individual was evaluated.
    #[must_use]
    pub fn objectives(&self) -> Option<&[f64]> {
        self.objectives.as_deref()
    }

    /// Indicates whether the objectives have been computed.
    #[must_use]
    pub fn is_evaluated(&self) -> bool {
        self.objectives.is_some()
    }

    /// Number of members of the last evaluated set this individual dominates.
    #[must_use]
    pub fn strength(&self) -> usize {
        self.strength
    }

    /// Sum of the strengths of every individual dominating this one.
    #[must_use]
    pub fn raw_fitness(&self) -> f64 {
        self.raw_fitness
    }

    /// Crowding estimate in `(0, 0.5]`.
    #[must_use]
    pub fn density(&self) -> f64 {
        self.density
    }

    /// Total fitness, `raw_fitness + density`. Lower is better.
    #[must_use]
    pub fn fitness(&self) -> f64 {
        self.fitness
    }

    /// Indicates whether no member of the last evaluated set dominated this
    /// individual.
    #[must_use]
    pub fn is_nondominated(&self) -> bool {
        self.raw_fitness == 0.0
    }

    /// Pareto dominance between two evaluated individuals.
    ///
    /// # Panics
    /// Panics when either individual has not been evaluated or when their
    /// objective vectors differ in length.
    #[must_use]
    pub fn dominates(&self, other: &Self) -> bool {
        dominates(self.evaluated_objectives(), other.evaluated_objectives())
    }

    pub(crate) fn evaluated_objectives(&self) -> &[f64] {
        self.objectives
            .as_deref()
            .unwrap_or_else(|| panic!("individual compared before evaluation"))
    }

    pub(crate) fn set_objectives(&mut self, objectives: Vec<f64>) {
        debug_assert!(self.objectives.is_none(), "objectives are computed once");
        self.objectives = Some(objectives);
    }

    pub(crate) fn assign_fitness(&mut self, strength: usize, raw_fitness: f64, density: f64) {
        self.strength = strength;
        self.raw_fitness = raw_fitness;
        self.density = density;
        self.fitness = raw_fitness + density;
    }
}

/// Ascending fitness order used by every SPEA2 sort.
pub(crate) fn by_fitness<G>(lhs: &Individual<G>, rhs: &Individual<G>) -> Ordering {
    lhs.fitness.total_cmp(&rhs.fitness)
}

/// Ordered collection of [`Individual`] values.
///
/// # Examples
/// ```
/// use swell::{Individual, Population};
/// let mut population = Population::empty();
/// population.push(Individual::with_objectives(vec![0.0], vec![1.0, 2.0]));
/// population.push(Individual::with_objectives(vec![1.0], vec![2.0, 3.0]));
/// assert_eq!(population.nondominated().count(), 1);
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Population<G> {
    individuals: Vec<Individual<G>>,
}

impl<G> Population<G> {
    /// Creates an empty population.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            individuals: Vec::new(),
        }
    }

    /// Wraps unevaluated genotypes into a population.
    #[must_use]
    pub fn from_genotypes(genotypes: Vec<G>) -> Self {
        Self {
            individuals: genotypes.into_iter().map(Individual::new).collect(),
        }
    }

    /// Returns the number of individuals.
    #[must_use]
    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    /// Indicates whether the population is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    /// Adds an individual.
    pub fn push(&mut self, individual: Individual<G>) {
        self.individuals.push(individual);
    }

    /// Returns the underlying individuals.
    #[must_use]
    pub fn individuals(&self) -> &[Individual<G>] {
        &self.individuals
    }

    pub(crate) fn individuals_mut(&mut self) -> &mut [Individual<G>] {
        &mut self.individuals
    }

    /// Consumes the population and returns its individuals.
    #[must_use]
    pub fn into_individuals(self) -> Vec<Individual<G>> {
        self.individuals
    }

    /// Individuals not dominated by any other evaluated member.
    ///
    /// # Panics
    /// Panics when a member has not been evaluated.
    pub fn nondominated(&self) -> impl Iterator<Item = &Individual<G>> {
        self.individuals.iter().filter(move |candidate| {
            !self
                .individuals
                .iter()
                .any(|other| other.dominates(candidate))
        })
    }

    /// Returns the individual with the lowest total fitness.
    #[must_use]
    pub fn best_individual(&self) -> Option<&Individual<G>> {
        self.individuals.iter().min_by(|lhs, rhs| by_fitness(lhs, rhs))
    }

    /// Sorts the individuals by ascending total fitness. The sort is stable.
    pub fn sort(&mut self) {
        self.individuals.sort_by(by_fitness);
    }
}

impl<G> Default for Population<G> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<G> From<Vec<Individual<G>>> for Population<G> {
    fn from(individuals: Vec<Individual<G>>) -> Self {
        Self { individuals }
    }
}

impl<G> FromIterator<Individual<G>> for Population<G> {
    fn from_iter<I: IntoIterator<Item = Individual<G>>>(iter: I) -> Self {
        Self {
            individuals: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evaluated(objectives: &[f64]) -> Individual<Vec<f64>> {
        Individual::with_objectives(objectives.to_vec(), objectives.to_vec())
    }

    #[test]
    fn dominance_is_irreflexive_and_asymmetric() {
        let a = evaluated(&[0.1, 0.2]);
        let b = evaluated(&[0.2, 0.2]);
        assert!(!a.dominates(&a));
        assert!(a.dominates(&b));
        assert!(!b.dominates(&a));
    }

    #[test]
    fn incomparable_vectors_do_not_dominate() {
        assert!(!dominates(&[0.0, 1.0], &[1.0, 0.0]));
        assert!(!dominates(&[1.0, 0.0], &[0.0, 1.0]));
    }

    #[test]
    #[should_panic(expected = "same length")]
    fn mismatched_objective_lengths_panic() {
        let _ = dominates(&[0.0, 1.0], &[0.0]);
    }

    #[test]
    #[should_panic(expected = "before evaluation")]
    fn unevaluated_comparison_panics() {
        let a = Individual::new(vec![0.0]);
        let b = evaluated(&[0.0]);
        let _ = a.dominates(&b);
    }

    #[test]
    fn assign_fitness_sums_terms() {
        let mut individual = evaluated(&[1.0]);
        individual.assign_fitness(3, 2.0, 0.25);
        assert_eq!(individual.strength(), 3);
        assert!((individual.fitness() - 2.25).abs() < f64::EPSILON);
        assert!(!individual.is_nondominated());
    }

    #[test]
    fn population_best_and_sort_use_fitness() {
        let mut population: Population<Vec<f64>> = (0..4)
            .map(|idx| {
                let mut individual = evaluated(&[f64::from(idx)]);
                individual.assign_fitness(0, f64::from(3 - idx), 0.1);
                individual
            })
            .collect();
        let best = population.best_individual().unwrap();
        assert_eq!(best.genotype(), &vec![3.0]);
        population.sort();
        let order: Vec<f64> = population
            .individuals()
            .iter()
            .map(Individual::fitness)
            .collect();
        assert!(order.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[test]
    fn distance_is_euclidean() {
        assert!((objective_distance(&[0.0, 0.0], &[3.0, 4.0]) - 5.0).abs() < 1e-12);
    }
}
