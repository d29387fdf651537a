//! Batch evaluation of whole populations.
//!
//! The engine hands every unevaluated genotype of a generation to a
//! [`BatchEvaluator`] in one call and waits for all results before assigning
//! fitness. Backends decide how the work is spread: [`SequentialEvaluator`]
//! runs in the caller's thread, [`ParallelEvaluator`] uses the rayon pool and
//! [`AsyncBatchEvaluator`] drives bounded Tokio tasks.

mod asynchronous;

pub use asynchronous::{AsyncBatchEvaluator, AsyncEvaluatorError};

use crate::ops::{ObjectiveError, ObjectiveFunction};
use rayon::prelude::*;

/// Result type produced by [`BatchEvaluator`] implementations.
pub type EvaluationResult<T> = Result<T, EvaluationError>;

/// Errors reported by evaluation backends.
#[derive(Debug, thiserror::Error)]
pub enum EvaluationError {
    /// The objective function rejected a genotype.
    #[error(transparent)]
    Objective(#[from] ObjectiveError),
    /// Tokio runtime failed to initialize.
    #[error("failed to initialize Tokio runtime: {0}")]
    Runtime(#[source] std::io::Error),
    /// A spawned task failed or panicked before producing objectives.
    #[error("Tokio task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Evaluates a batch of genotypes, returning objectives in input order.
pub trait BatchEvaluator<G> {
    /// Evaluates every genotype in `genotypes`.
    ///
    /// # Errors
    /// Returns [`EvaluationError`] as soon as any genotype fails; no partial
    /// results are returned.
    fn evaluate_batch(&mut self, genotypes: &[G]) -> EvaluationResult<Vec<Vec<f64>>>;
}

/// Evaluates genotypes one after another in the calling thread.
///
/// # Examples
/// ```
/// use swell::evaluation::{BatchEvaluator, SequentialEvaluator};
/// use swell::ops::ObjectiveResult;
///
/// let mut evaluator = SequentialEvaluator::new(|genes: &Vec<f64>| -> ObjectiveResult<Vec<f64>> {
///     Ok(vec![genes[0] * 2.0])
/// });
/// let scores = evaluator.evaluate_batch(&[vec![1.0], vec![2.0]]).unwrap();
/// assert_eq!(scores, vec![vec![2.0], vec![4.0]]);
/// ```
#[derive(Debug, Clone)]
pub struct SequentialEvaluator<F> {
    objectives: F,
}

impl<F> SequentialEvaluator<F> {
    /// Wraps an objective function.
    #[must_use]
    pub fn new(objectives: F) -> Self {
        Self { objectives }
    }
}

impl<G, F> BatchEvaluator<G> for SequentialEvaluator<F>
where
    F: ObjectiveFunction<G>,
{
    fn evaluate_batch(&mut self, genotypes: &[G]) -> EvaluationResult<Vec<Vec<f64>>> {
        let mut results = Vec::with_capacity(genotypes.len());
        for genotype in genotypes {
            results.push(self.objectives.objectives(genotype)?);
        }
        Ok(results)
    }
}

/// Evaluates genotypes on the global rayon thread pool.
///
/// Results keep the input order, so runs stay reproducible as long as the
/// objective function is deterministic.
#[derive(Debug, Clone)]
pub struct ParallelEvaluator<F> {
    objectives: F,
}

impl<F> ParallelEvaluator<F> {
    /// Wraps an objective function that is safe to call from several threads.
    #[must_use]
    pub fn new(objectives: F) -> Self {
        Self { objectives }
    }
}

impl<G, F> BatchEvaluator<G> for ParallelEvaluator<F>
where
    G: Sync,
    F: ObjectiveFunction<G>,
{
    fn evaluate_batch(&mut self, genotypes: &[G]) -> EvaluationResult<Vec<Vec<f64>>> {
        let objectives = &self.objectives;
        let results = genotypes
            .par_iter()
            .map(|genotype| objectives.objectives(genotype))
            .collect::<Result<Vec<_>, ObjectiveError>>()?;
        Ok(results)
    }
}
