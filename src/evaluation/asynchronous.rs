use super::{BatchEvaluator, EvaluationError, EvaluationResult};
use crate::ops::{AsyncObjectiveFunction, ObjectiveResult};
use std::sync::Arc;
use std::thread;
use tokio::runtime::{Builder, Runtime};
use tokio::task::JoinHandle;

/// Errors that can occur while building an [`AsyncBatchEvaluator`].
#[derive(Debug, thiserror::Error)]
pub enum AsyncEvaluatorError {
    /// The requested concurrency level was zero.
    #[error("max concurrency must be at least one for async evaluation")]
    InvalidConcurrency,
    /// Tokio runtime initialization failed.
    #[error("failed to initialize Tokio runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

/// Evaluates [`AsyncObjectiveFunction`] implementations in Tokio tasks with a
/// bounded number in flight.
pub struct AsyncBatchEvaluator<P> {
    objectives: Arc<P>,
    runtime: Runtime,
    max_tasks: usize,
}

impl<P> AsyncBatchEvaluator<P> {
    /// Creates an evaluator whose concurrency matches the available
    /// parallelism of the machine.
    ///
    /// # Errors
    /// Returns [`AsyncEvaluatorError::Runtime`] when the Tokio runtime cannot
    /// be initialized.
    pub fn new(objectives: P) -> Result<Self, AsyncEvaluatorError> {
        let parallelism = thread::available_parallelism()
            .map(std::num::NonZeroUsize::get)
            .unwrap_or(1);
        Self::with_max_concurrency(objectives, parallelism)
    }

    /// Creates an evaluator with at most `max_tasks` evaluations in flight.
    ///
    /// # Errors
    /// Returns [`AsyncEvaluatorError::InvalidConcurrency`] when `max_tasks` is
    /// zero or [`AsyncEvaluatorError::Runtime`] if the runtime fails to start.
    pub fn with_max_concurrency(objectives: P, max_tasks: usize) -> Result<Self, AsyncEvaluatorError> {
        if max_tasks == 0 {
            return Err(AsyncEvaluatorError::InvalidConcurrency);
        }
        let runtime = Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(AsyncEvaluatorError::Runtime)?;
        Ok(Self {
            objectives: Arc::new(objectives),
            runtime,
            max_tasks,
        })
    }

    /// Maximum number of evaluations in flight.
    #[must_use]
    pub fn max_tasks(&self) -> usize {
        self.max_tasks
    }
}

type Pending = Vec<JoinHandle<ObjectiveResult<(usize, Vec<f64>)>>>;

impl<P> AsyncBatchEvaluator<P> {
    async fn evaluate_all<G>(&self, genotypes: &[G]) -> EvaluationResult<Vec<Vec<f64>>>
    where
        G: Clone + Send + Sync + 'static,
        P: AsyncObjectiveFunction<G> + 'static,
    {
        let mut pending: Pending = Vec::new();
        let mut results = vec![Vec::new(); genotypes.len()];
        for (idx, genotype) in genotypes.iter().enumerate() {
            let objectives = Arc::clone(&self.objectives);
            let genotype = genotype.clone();
            pending.push(tokio::spawn(async move {
                let scores = objectives.objectives_async(&genotype).await?;
                Ok((idx, scores))
            }));
            if pending.len() >= self.max_tasks {
                Self::resolve_handles(&mut pending, &mut results).await?;
            }
        }
        Self::resolve_handles(&mut pending, &mut results).await?;
        tracing::debug!(evaluated = genotypes.len(), "async batch complete");
        Ok(results)
    }

    async fn resolve_handles(pending: &mut Pending, results: &mut [Vec<f64>]) -> EvaluationResult<()> {
        while let Some(handle) = pending.pop() {
            let outcome = handle
                .await
                .map_err(EvaluationError::Task)
                .and_then(|scored| scored.map_err(EvaluationError::from));
            match outcome {
                Ok((idx, scores)) => results[idx] = scores,
                Err(err) => {
                    for straggler in pending.drain(..) {
                        straggler.abort();
                    }
                    return Err(err);
                }
            }
        }
        Ok(())
    }
}

impl<G, P> BatchEvaluator<G> for AsyncBatchEvaluator<P>
where
    G: Clone + Send + Sync + 'static,
    P: AsyncObjectiveFunction<G> + 'static,
{
    fn evaluate_batch(&mut self, genotypes: &[G]) -> EvaluationResult<Vec<Vec<f64>>> {
        self.runtime.block_on(self.evaluate_all(genotypes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::ObjectiveError;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    struct DelayedSum {
        calls: Arc<Mutex<Vec<usize>>>,
    }

    #[async_trait]
    impl AsyncObjectiveFunction<Vec<f64>> for DelayedSum {
        async fn objectives_async(&self, genotype: &Vec<f64>) -> ObjectiveResult<Vec<f64>> {
            tokio::time::sleep(Duration::from_millis(5)).await;
            if genotype.iter().any(|gene| gene.is_nan()) {
                return Err(ObjectiveError::Failed("nan gene".into()));
            }
            self.calls.lock().expect("lock poisoned").push(genotype.len());
            Ok(vec![genotype.iter().sum(), genotype.iter().product()])
        }
    }

    #[test]
    fn async_batch_preserves_order() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let problem = DelayedSum {
            calls: Arc::clone(&calls),
        };
        let mut evaluator = AsyncBatchEvaluator::with_max_concurrency(problem, 2).unwrap();
        let batch = vec![vec![1.0, 1.0], vec![2.0, 2.0], vec![3.0, 3.0]];
        let scores = evaluator.evaluate_batch(&batch).unwrap();
        assert_eq!(scores, vec![vec![2.0, 1.0], vec![4.0, 4.0], vec![6.0, 9.0]]);
        assert_eq!(calls.lock().unwrap().len(), 3);
    }

    #[test]
    fn async_failures_surface() {
        let problem = DelayedSum {
            calls: Arc::new(Mutex::new(Vec::new())),
        };
        let mut evaluator = AsyncBatchEvaluator::with_max_concurrency(problem, 4).unwrap();
        let err = evaluator.evaluate_batch(&[vec![f64::NAN]]).unwrap_err();
        assert!(matches!(err, EvaluationError::Objective(_)));
    }

    struct Sleeper {
        finished: Arc<Mutex<usize>>,
    }

    #[async_trait]
    impl AsyncObjectiveFunction<Vec<f64>> for Sleeper {
        async fn objectives_async(&self, genotype: &Vec<f64>) -> ObjectiveResult<Vec<f64>> {
            if genotype[0] < 0.0 {
                return Err(ObjectiveError::Failed("negative delay".into()));
            }
            tokio::time::sleep(Duration::from_millis(genotype[0] as u64)).await;
            *self.finished.lock().expect("lock poisoned") += 1;
            Ok(vec![genotype[0]])
        }
    }

    #[test]
    fn failure_aborts_tasks_still_in_flight() {
        let finished = Arc::new(Mutex::new(0));
        let problem = Sleeper {
            finished: Arc::clone(&finished),
        };
        let mut evaluator = AsyncBatchEvaluator::with_max_concurrency(problem, 4).unwrap();
        let batch = vec![vec![300.0], vec![300.0], vec![-1.0]];
        let err = evaluator.evaluate_batch(&batch).unwrap_err();
        assert!(matches!(err, EvaluationError::Objective(_)));
        std::thread::sleep(Duration::from_millis(600));
        assert_eq!(*finished.lock().unwrap(), 0);
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let problem = DelayedSum {
            calls: Arc::new(Mutex::new(Vec::new())),
        };
        assert!(matches!(
            AsyncBatchEvaluator::with_max_concurrency(problem, 0),
            Err(AsyncEvaluatorError::InvalidConcurrency)
        ));
    }
}
