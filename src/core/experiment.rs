//! Per-generation records produced by the SPEA2 engine.
//!
//! The engine appends one [`GenerationSnapshot`] per generation. Snapshots are
//! never modified afterwards, which keeps [`History`] usable for post-hoc
//! analysis of convergence and population spread.

use crate::core::{by_fitness, Individual};

/// Every archive member of every generation, in the order they were recorded.
pub type ArchiveHistory<G> = Vec<Individual<G>>;

/// State of the search at the end of one generation.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSnapshot<G> {
    /// Zero-based generation counter.
    pub generation: usize,
    /// Evaluated population with the fitness assigned in this generation.
    pub population: Vec<Individual<G>>,
    /// Archive selected at the end of this generation.
    pub archive: Vec<Individual<G>>,
    /// Population variance of each objective.
    pub objective_variance: Vec<f64>,
}

impl<G> GenerationSnapshot<G> {
    /// Archive member with the lowest total fitness.
    #[must_use]
    pub fn best(&self) -> Option<&Individual<G>> {
        self.archive.iter().min_by(|lhs, rhs| by_fitness(lhs, rhs))
    }

    /// Mean of [`Self::objective_variance`], a single spread indicator.
    #[must_use]
    pub fn pop_variance(&self) -> f64 {
        if self.objective_variance.is_empty() {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let count = self.objective_variance.len() as f64;
        self.objective_variance.iter().sum::<f64>() / count
    }
}

/// Append-only sequence of generation snapshots.
///
/// # Examples
/// ```
/// use swell::History;
/// let history: History<Vec<f64>> = History::new();
/// assert!(history.is_empty());
/// assert!(history.last().is_none());
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct History<G> {
    generations: Vec<GenerationSnapshot<G>>,
}

impl<G> History<G> {
    /// Creates an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self {
            generations: Vec::new(),
        }
    }

    pub(crate) fn record(&mut self, snapshot: GenerationSnapshot<G>) {
        self.generations.push(snapshot);
    }

    /// Number of recorded generations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.generations.len()
    }

    /// Indicates whether nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.generations.is_empty()
    }

    /// Recorded snapshots, oldest first.
    #[must_use]
    pub fn generations(&self) -> &[GenerationSnapshot<G>] {
        &self.generations
    }

    /// Snapshot of the final generation.
    #[must_use]
    pub fn final_generation(&self) -> Option<&GenerationSnapshot<G>> {
        self.generations.last()
    }

    /// Best-ranked individual of the final archive.
    #[must_use]
    pub fn last(&self) -> Option<&Individual<G>> {
        self.final_generation().and_then(GenerationSnapshot::best)
    }

    /// Spread indicator of every generation, oldest first.
    #[must_use]
    pub fn pop_variances(&self) -> Vec<f64> {
        self.generations
            .iter()
            .map(GenerationSnapshot::pop_variance)
            .collect()
    }
}

impl<G: Clone> History<G> {
    /// Flattens every recorded archive into a single list.
    #[must_use]
    pub fn archive_history(&self) -> ArchiveHistory<G> {
        self.generations
            .iter()
            .flat_map(|snapshot| snapshot.archive.iter().cloned())
            .collect()
    }
}

impl<G> Default for History<G> {
    fn default() -> Self {
        Self::new()
    }
}

/// Population variance of every objective across `individuals`.
///
/// Individuals without objectives are ignored.
pub(crate) fn objective_variance<G>(individuals: &[Individual<G>]) -> Vec<f64> {
    let evaluated: Vec<&[f64]> = individuals
        .iter()
        .filter_map(Individual::objectives)
        .collect();
    let Some(first) = evaluated.first() else {
        return Vec::new();
    };
    let dimensions = first.len();
    #[allow(clippy::cast_precision_loss)]
    let size = evaluated.len() as f64;
    let mut means = vec![0.0; dimensions];
    for objectives in &evaluated {
        for (mean, value) in means.iter_mut().zip(objectives.iter()) {
            *mean += *value;
        }
    }
    for mean in &mut means {
        *mean /= size;
    }
    let mut variances = vec![0.0; dimensions];
    for objectives in &evaluated {
        for (dimension, value) in objectives.iter().enumerate() {
            let diff = value - means[dimension];
            variances[dimension] += diff * diff / size;
        }
    }
    variances
}
