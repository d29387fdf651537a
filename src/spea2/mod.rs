//! SPEA2 engine.
//!
//! [`Spea2`] drives the generational loop: evaluate the population, assign
//! fitness over population and archive together, refill the archive by
//! environmental selection, record a [`GenerationSnapshot`] and breed the next
//! population from the archive. The engine is generic over the genotype; the
//! caller supplies the initializer, objectives and variation operators.

mod archive;
mod fitness;

pub use archive::{environmental_selection, truncate, Archive};
pub use fitness::{assign_fitness, density_neighbour};

use crate::core::experiment::{objective_variance, ArchiveHistory, GenerationSnapshot, History};
use crate::core::{Genotype, Individual, Population};
use crate::evaluation::{BatchEvaluator, EvaluationError, ParallelEvaluator, SequentialEvaluator};
use crate::ops::{
    validate_rates, BinaryTournament, CrossoverOperator, InitialPopulation, MutationOperator,
    ObjectiveFunction, OperatorError, SelectionOperator,
};
use rand::Rng;
use tracing::{debug, info, instrument};

/// Run configuration.
///
/// The default mirrors the long exploratory calibration run: 150
/// generations of 20 individuals with an archive of 5.
///
/// # Examples
/// ```
/// let params = swell::Spea2Params {
///     max_gens: 3,
///     ..swell::Spea2Params::default()
/// };
/// assert!(params.validate().is_ok());
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Spea2Params {
    /// Number of generations to run; also the number of recorded snapshots.
    pub max_gens: usize,
    /// Individuals per generation.
    pub pop_size: usize,
    /// Members kept in the archive after every selection.
    pub archive_size: usize,
    /// Probability that a parent pair is recombined rather than copied.
    pub crossover_rate: f64,
    /// Probability that a child is mutated.
    pub mutation_rate: f64,
    /// Perturbation scales handed to the mutation operator.
    pub mutation_value_rate: Vec<f64>,
}

impl Default for Spea2Params {
    fn default() -> Self {
        Self {
            max_gens: 150,
            pop_size: 20,
            archive_size: 5,
            crossover_rate: 0.8,
            mutation_rate: 0.7,
            mutation_value_rate: vec![0.1, 0.001, 0.0005],
        }
    }
}

impl Spea2Params {
    /// Checks every field.
    ///
    /// # Errors
    /// Returns the [`Spea2Error`] describing the first invalid field.
    pub fn validate(&self) -> Result<(), Spea2Error> {
        if self.pop_size == 0 {
            return Err(Spea2Error::InvalidPopulationSize(self.pop_size));
        }
        if self.archive_size == 0 {
            return Err(Spea2Error::InvalidArchiveSize(self.archive_size));
        }
        if self.max_gens == 0 {
            return Err(Spea2Error::InvalidGenerationCount(self.max_gens));
        }
        check_rate("crossover_rate", self.crossover_rate)?;
        check_rate("mutation_rate", self.mutation_rate)?;
        if self.mutation_value_rate.is_empty() {
            return Err(Spea2Error::EmptyMutationRates);
        }
        validate_rates(&self.mutation_value_rate)?;
        Ok(())
    }
}

fn check_rate(parameter: &'static str, value: f64) -> Result<(), Spea2Error> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(Spea2Error::InvalidRate { parameter, value })
    }
}

/// Errors produced by the [`Spea2`] engine.
#[derive(Debug, thiserror::Error)]
pub enum Spea2Error {
    /// Population size must be greater than zero.
    #[error("population size must be greater than zero (received {0})")]
    InvalidPopulationSize(usize),
    /// Archive size must be greater than zero.
    #[error("archive size must be greater than zero (received {0})")]
    InvalidArchiveSize(usize),
    /// Number of generations must be at least one.
    #[error("number of generations must be positive (received {0})")]
    InvalidGenerationCount(usize),
    /// A probability fell outside `[0, 1]`.
    #[error("{parameter} must be within [0, 1] (received {value})")]
    InvalidRate {
        /// Name of the offending field.
        parameter: &'static str,
        /// Offending value.
        value: f64,
    },
    /// No perturbation scale was configured.
    #[error("mutation_value_rate must hold at least one value")]
    EmptyMutationRates,
    /// An operator parameter failed validation.
    #[error(transparent)]
    Operator(#[from] OperatorError),
    /// A required component was not supplied to the builder.
    #[error("{0} must be configured before building the engine")]
    MissingComponent(&'static str),
    /// The initializer did not honour the requested size.
    #[error("initializer produced {found} genotypes but {expected} were requested")]
    InitialPopulationSize {
        /// Requested population size.
        expected: usize,
        /// Number of genotypes returned.
        found: usize,
    },
    /// The evaluator or objective function failed.
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
    /// The evaluator returned the wrong number of objective vectors.
    #[error("evaluator returned {found} objective vectors for {expected} genotypes")]
    EvaluationCountMismatch {
        /// Number of genotypes submitted.
        expected: usize,
        /// Number of results returned.
        found: usize,
    },
    /// An objective vector was empty.
    #[error("objective function returned an empty objective vector")]
    EmptyObjectives,
    /// An objective value was NaN or infinite.
    #[error("objective function returned a non-finite value ({0})")]
    NonFiniteObjective(f64),
    /// Objective vectors differed in length between evaluations.
    #[error("objective function returned {found} objectives but earlier evaluations had {expected}")]
    ObjectiveCountMismatch {
        /// Length observed first.
        expected: usize,
        /// Length of the offending vector.
        found: usize,
    },
    /// Environmental selection ran out of candidates.
    #[error("archive needs {required} members but only {available} candidates exist")]
    InsufficientCandidates {
        /// Archive capacity.
        required: usize,
        /// Candidates available.
        available: usize,
    },
    /// Mating selection could not pick parents.
    #[error("mating selection failed on an empty archive")]
    SelectionFailed,
}

/// Builder used to configure a [`Spea2`] engine.
pub struct Spea2Builder<G> {
    params: Spea2Params,
    initializer: Option<Box<dyn InitialPopulation<G>>>,
    evaluator: Option<Box<dyn BatchEvaluator<G>>>,
    crossover: Option<Box<dyn CrossoverOperator<G>>>,
    mutation: Option<Box<dyn MutationOperator<G>>>,
    selection: Box<dyn SelectionOperator>,
}

impl<G: Genotype> Spea2Builder<G> {
    /// Replaces the whole configuration.
    #[must_use]
    pub fn params(mut self, params: Spea2Params) -> Self {
        self.params = params;
        self
    }

    /// Configures the number of generations.
    #[must_use]
    pub fn max_gens(mut self, max_gens: usize) -> Self {
        self.params.max_gens = max_gens;
        self
    }

    /// Configures the population size.
    #[must_use]
    pub fn pop_size(mut self, pop_size: usize) -> Self {
        self.params.pop_size = pop_size;
        self
    }

    /// Configures the archive size.
    #[must_use]
    pub fn archive_size(mut self, archive_size: usize) -> Self {
        self.params.archive_size = archive_size;
        self
    }

    /// Configures the crossover probability.
    #[must_use]
    pub fn crossover_rate(mut self, rate: f64) -> Self {
        self.params.crossover_rate = rate;
        self
    }

    /// Configures the mutation probability.
    #[must_use]
    pub fn mutation_rate(mut self, rate: f64) -> Self {
        self.params.mutation_rate = rate;
        self
    }

    /// Configures the perturbation scales passed to the mutation operator.
    #[must_use]
    pub fn mutation_value_rate(mut self, rates: Vec<f64>) -> Self {
        self.params.mutation_value_rate = rates;
        self
    }

    /// Sets the generation-zero sampler.
    #[must_use]
    pub fn initializer(mut self, initializer: impl InitialPopulation<G> + 'static) -> Self {
        self.initializer = Some(Box::new(initializer));
        self
    }

    /// Evaluates `objectives` one genotype at a time.
    #[must_use]
    pub fn objectives(mut self, objectives: impl ObjectiveFunction<G> + 'static) -> Self {
        self.evaluator = Some(Box::new(SequentialEvaluator::new(objectives)));
        self
    }

    /// Evaluates `objectives` on the rayon thread pool.
    #[must_use]
    pub fn parallel_objectives(mut self, objectives: impl ObjectiveFunction<G> + 'static) -> Self
    where
        G: Sync,
    {
        self.evaluator = Some(Box::new(ParallelEvaluator::new(objectives)));
        self
    }

    /// Uses a custom batch evaluator, such as
    /// [`crate::evaluation::AsyncBatchEvaluator`].
    #[must_use]
    pub fn evaluator(mut self, evaluator: impl BatchEvaluator<G> + 'static) -> Self {
        self.evaluator = Some(Box::new(evaluator));
        self
    }

    /// Sets the crossover operator.
    #[must_use]
    pub fn crossover(mut self, operator: impl CrossoverOperator<G> + 'static) -> Self {
        self.crossover = Some(Box::new(operator));
        self
    }

    /// Sets the mutation operator.
    #[must_use]
    pub fn mutation(mut self, operator: impl MutationOperator<G> + 'static) -> Self {
        self.mutation = Some(Box::new(operator));
        self
    }

    /// Replaces the default [`BinaryTournament`] mating selection.
    #[must_use]
    pub fn selection(mut self, operator: impl SelectionOperator + 'static) -> Self {
        self.selection = Box::new(operator);
        self
    }

    /// Finalizes the builder into a [`Spea2`] engine.
    ///
    /// # Errors
    /// Returns [`Spea2Error`] when the configuration is invalid or a
    /// component is missing.
    pub fn build(self) -> Result<Spea2<G>, Spea2Error> {
        self.params.validate()?;
        Ok(Spea2 {
            params: self.params,
            initializer: self
                .initializer
                .ok_or(Spea2Error::MissingComponent("initializer"))?,
            evaluator: self
                .evaluator
                .ok_or(Spea2Error::MissingComponent("objectives"))?,
            crossover: self
                .crossover
                .ok_or(Spea2Error::MissingComponent("crossover"))?,
            mutation: self
                .mutation
                .ok_or(Spea2Error::MissingComponent("mutation"))?,
            selection: self.selection,
            objective_count: None,
        })
    }
}

/// Strength Pareto Evolutionary Algorithm 2.
///
/// # Examples
/// ```
/// use swell::functions::schaffer_n1;
/// use swell::ops::{GeneBounds, GaussianMutation, LatinHypercube, SimulatedBinaryCrossover};
/// use swell::Spea2;
/// use rand::SeedableRng;
///
/// let bounds = GeneBounds::uniform(1, -10.0, 10.0).unwrap();
/// let mut engine = Spea2::builder()
///     .max_gens(5)
///     .pop_size(12)
///     .archive_size(4)
///     .initializer(LatinHypercube::new(bounds.clone()))
///     .objectives(schaffer_n1)
///     .crossover(SimulatedBinaryCrossover::new(15.0, bounds.clone()).unwrap())
///     .mutation(GaussianMutation::new(bounds))
///     .build()
///     .unwrap();
/// let mut rng = rand::rngs::StdRng::seed_from_u64(7);
/// let (history, archive_history) = engine.solve(&mut rng).unwrap();
/// assert_eq!(history.len(), 5);
/// assert_eq!(archive_history.len(), 5 * 4);
/// assert!(history.last().is_some());
/// ```
pub struct Spea2<G> {
    params: Spea2Params,
    initializer: Box<dyn InitialPopulation<G>>,
    evaluator: Box<dyn BatchEvaluator<G>>,
    crossover: Box<dyn CrossoverOperator<G>>,
    mutation: Box<dyn MutationOperator<G>>,
    selection: Box<dyn SelectionOperator>,
    objective_count: Option<usize>,
}

impl<G: Genotype> Spea2<G> {
    /// Creates a builder starting from [`Spea2Params::default`].
    #[must_use]
    pub fn builder() -> Spea2Builder<G> {
        Spea2Builder {
            params: Spea2Params::default(),
            initializer: None,
            evaluator: None,
            crossover: None,
            mutation: None,
            selection: Box::new(BinaryTournament),
        }
    }

    /// Active configuration.
    #[must_use]
    pub fn params(&self) -> &Spea2Params {
        &self.params
    }

    /// Runs [`Spea2Params::max_gens`] generations.
    ///
    /// Returns the per-generation history together with every archive member
    /// of every generation.
    ///
    /// # Errors
    /// Returns [`Spea2Error`] when evaluation fails, when objective vectors
    /// are inconsistent or when an operator misbehaves. No partial history is
    /// returned.
    #[instrument(
        level = "info",
        skip_all,
        fields(
            max_gens = self.params.max_gens,
            pop_size = self.params.pop_size,
            archive_size = self.params.archive_size
        )
    )]
    pub fn solve<R: Rng>(
        &mut self,
        rng: &mut R,
    ) -> Result<(History<G>, ArchiveHistory<G>), Spea2Error> {
        self.objective_count = None;
        let mut population = self.initial_population(rng)?;
        let mut archive = Archive::new(self.params.archive_size)?;
        let mut history = History::new();
        let mut archive_history = Vec::with_capacity(self.params.max_gens * self.params.archive_size);

        for generation in 0..self.params.max_gens {
            self.evaluate(&mut population)?;
            let mut combined = population.into_individuals();
            let population_len = combined.len();
            combined.extend(archive.take_members());
            assign_fitness(&mut combined);
            let evaluated = combined[..population_len].to_vec();
            archive.select(combined)?;

            let snapshot = GenerationSnapshot {
                generation,
                objective_variance: objective_variance(&evaluated),
                population: evaluated,
                archive: archive.members().to_vec(),
            };
            debug!(
                generation,
                best_fitness = snapshot.best().map(Individual::fitness),
                pop_variance = snapshot.pop_variance(),
                "generation complete"
            );
            archive_history.extend(archive.members().iter().cloned());
            history.record(snapshot);

            if generation + 1 == self.params.max_gens {
                break;
            }
            population = self.breed(&archive, rng)?;
        }

        info!(
            generations = history.len(),
            best_fitness = history.last().map(Individual::fitness),
            "optimization finished"
        );
        Ok((history, archive_history))
    }

    fn initial_population<R: Rng>(&self, rng: &mut R) -> Result<Population<G>, Spea2Error> {
        let genotypes = self
            .initializer
            .initial_population(self.params.pop_size, rng);
        if genotypes.len() != self.params.pop_size {
            return Err(Spea2Error::InitialPopulationSize {
                expected: self.params.pop_size,
                found: genotypes.len(),
            });
        }
        Ok(Population::from_genotypes(
            genotypes.into_iter().map(Genotype::repaired).collect(),
        ))
    }

    fn evaluate(&mut self, population: &mut Population<G>) -> Result<(), Spea2Error> {
        let pending: Vec<usize> = population
            .individuals()
            .iter()
            .enumerate()
            .filter(|(_, individual)| !individual.is_evaluated())
            .map(|(idx, _)| idx)
            .collect();
        if pending.is_empty() {
            return Ok(());
        }
        let genotypes: Vec<G> = pending
            .iter()
            .map(|&idx| population.individuals()[idx].genotype().clone())
            .collect();
        let results = self.evaluator.evaluate_batch(&genotypes)?;
        if results.len() != genotypes.len() {
            return Err(Spea2Error::EvaluationCountMismatch {
                expected: genotypes.len(),
                found: results.len(),
            });
        }
        for (idx, objectives) in pending.into_iter().zip(results) {
            self.check_objectives(&objectives)?;
            population.individuals_mut()[idx].set_objectives(objectives);
        }
        debug!(evaluated = genotypes.len(), "batch evaluated");
        Ok(())
    }

    fn check_objectives(&mut self, objectives: &[f64]) -> Result<(), Spea2Error> {
        if objectives.is_empty() {
            return Err(Spea2Error::EmptyObjectives);
        }
        if let Some(&value) = objectives.iter().find(|value| !value.is_finite()) {
            return Err(Spea2Error::NonFiniteObjective(value));
        }
        match self.objective_count {
            None => {
                self.objective_count = Some(objectives.len());
                Ok(())
            }
            Some(expected) if expected != objectives.len() => {
                Err(Spea2Error::ObjectiveCountMismatch {
                    expected,
                    found: objectives.len(),
                })
            }
            Some(_) => Ok(()),
        }
    }

    fn breed<R: Rng>(&self, archive: &Archive<G>, rng: &mut R) -> Result<Population<G>, Spea2Error> {
        let members = archive.members();
        let fitness: Vec<f64> = members.iter().map(Individual::fitness).collect();
        let pool = self
            .selection
            .mating_pool(&fitness, self.params.pop_size, rng)
            .ok_or(Spea2Error::SelectionFailed)?;
        let mut offspring = Vec::with_capacity(self.params.pop_size);
        for pair in pool.chunks(2) {
            let parent_a = members[pair[0]].genotype();
            // An odd pool pairs its last parent with the first one.
            let parent_b = members[pair.get(1).copied().unwrap_or(pool[0])].genotype();
            let (child_a, child_b) = if rng.gen::<f64>() < self.params.crossover_rate {
                self.crossover.crossover(parent_a, parent_b, rng)
            } else {
                (parent_a.clone(), parent_b.clone())
            };
            for child in [child_a, child_b] {
                if offspring.len() == self.params.pop_size {
                    break;
                }
                let child = if rng.gen::<f64>() < self.params.mutation_rate {
                    self.mutation
                        .mutate(&child, &self.params.mutation_value_rate, rng)
                } else {
                    child
                };
                offspring.push(Individual::new(child.repaired()));
            }
        }
        Ok(Population::from(offspring))
    }
}

/// Runs SPEA2 once with the given components and sequential evaluation.
///
/// # Errors
/// Returns [`Spea2Error`] for an invalid configuration or a failed run.
///
/// # Examples
/// ```
/// use swell::functions::zdt1;
/// use swell::ops::{ArithmeticCrossover, GaussianMutation, GeneBounds, LatinHypercube};
/// use swell::{solve, Spea2Params};
/// use rand::SeedableRng;
///
/// let bounds = GeneBounds::uniform(4, 0.0, 1.0).unwrap();
/// let params = Spea2Params { max_gens: 4, pop_size: 10, archive_size: 4, ..Spea2Params::default() };
/// let mut rng = rand::rngs::StdRng::seed_from_u64(3);
/// let (history, _) = solve(
///     params,
///     LatinHypercube::new(bounds.clone()),
///     zdt1,
///     ArithmeticCrossover,
///     GaussianMutation::new(bounds),
///     &mut rng,
/// )
/// .unwrap();
/// assert_eq!(history.final_generation().unwrap().archive.len(), 4);
/// ```
pub fn solve<G, R>(
    params: Spea2Params,
    init_population: impl InitialPopulation<G> + 'static,
    objectives: impl ObjectiveFunction<G> + 'static,
    crossover: impl CrossoverOperator<G> + 'static,
    mutation: impl MutationOperator<G> + 'static,
    rng: &mut R,
) -> Result<(History<G>, ArchiveHistory<G>), Spea2Error>
where
    G: Genotype,
    R: Rng,
{
    Spea2::builder()
        .params(params)
        .initializer(init_population)
        .objectives(objectives)
        .crossover(crossover)
        .mutation(mutation)
        .build()?
        .solve(rng)
}
