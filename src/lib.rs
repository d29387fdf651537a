#![warn(missing_docs)]

/*! Multi-objective calibration with the Strength Pareto Evolutionary
Algorithm 2 (SPEA2), built for tuning SWAN wave-model parameters against
buoy observations.

The engine is generic: any [`Genotype`] works as long as the caller
provides an initializer, an objective function and variation operators.
The [`swan`] module supplies those pieces for the `drf`/`cfw`/`stpm`
parameter space, and [`sweep`] runs many independent calibrations in
parallel.

```
use swell::ops::{GaussianMutation, GeneBounds, LatinHypercube, SimulatedBinaryCrossover};
use swell::Spea2;
use rand::SeedableRng;

let bounds = GeneBounds::uniform(2, 0.0, 1.0).unwrap();
let mut engine = Spea2::builder()
    .max_gens(3)
    .pop_size(20)
    .archive_size(5)
    .initializer(LatinHypercube::new(bounds.clone()))
    .objectives(|genes: &Vec<f64>| -> swell::ops::ObjectiveResult<Vec<f64>> {
        Ok(vec![genes[0], genes[1]])
    })
    .crossover(SimulatedBinaryCrossover::new(15.0, bounds.clone()).unwrap())
    .mutation(GaussianMutation::new(bounds))
    .build()
    .unwrap();
let (history, _) = engine.solve(&mut rand::rngs::StdRng::seed_from_u64(1)).unwrap();
assert_eq!(history.len(), 3);
assert!(history.generations().iter().all(|snapshot| snapshot.archive.len() == 5));
```
!*/

pub mod core;
pub mod evaluation;
pub mod functions;
pub mod ops;
pub mod spea2;
pub mod swan;
pub mod sweep;

pub use crate::core::experiment::{ArchiveHistory, GenerationSnapshot, History};
pub use crate::core::{dominates, Genotype, Individual, Population};
pub use evaluation::{BatchEvaluator, EvaluationError};
pub use spea2::{solve, Archive, Spea2, Spea2Builder, Spea2Error, Spea2Params};
