//! Genetic operators and objective abstractions.
//!
//! This module groups the traits through which callers plug their own
//! problem into the SPEA2 engine, plus ready-made real-vector
//! implementations. Each sub-module focuses on one part of the workflow.

pub mod bounds;
pub mod crossover;
pub mod initialization;
pub mod mutation;
pub mod objective;
pub mod selection;

pub use bounds::{BoundsError, GeneBounds};
pub use crossover::{ArithmeticCrossover, CrossoverOperator, SimulatedBinaryCrossover};
pub use initialization::{latin_hypercube_unit, InitialPopulation, LatinHypercube};
pub use mutation::{validate_rates, GaussianMutation, MutationOperator};
pub use objective::{
    AsyncObjectiveFunction, Memoized, ObjectiveError, ObjectiveFunction, ObjectiveResult,
};
pub use selection::{BinaryTournament, SelectionOperator};

/// Errors raised while validating operator parameters.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OperatorError {
    /// Distribution index must be positive and finite.
    #[error("{operator} distribution index must be positive (received {value})")]
    InvalidDistributionIndex {
        /// Operator reporting the error.
        operator: &'static str,
        /// Offending value.
        value: f64,
    },
    /// A probability fell outside `[0, 1]`.
    #[error("{operator} probability must be within [0, 1] (received {value})")]
    InvalidProbability {
        /// Operator reporting the error.
        operator: &'static str,
        /// Offending value.
        value: f64,
    },
    /// Operator specific parameter failed validation.
    #[error("{operator} parameter {parameter} was invalid (received {value})")]
    InvalidParameter {
        /// Operator reporting the error.
        operator: &'static str,
        /// Name of the parameter.
        parameter: &'static str,
        /// Offending value.
        value: f64,
    },
    /// Bounds supplied to the operator were inconsistent.
    #[error(transparent)]
    Bounds(#[from] BoundsError),
}
