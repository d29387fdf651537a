//! SWAN wave-model calibration domain.
//!
//! A candidate is a [`SwanParams`] triple: the wind drag coefficient `drf`,
//! the bottom friction coefficient `cfw` and the whitecapping steepness
//! `stpm`. `drf` is continuous, the other two only take the values the model
//! was run with. The forecast model itself is opaque: a [`ForecastModel`]
//! returns one significant-wave-height series per station, and
//! [`StationRmse`] turns those into one error objective per station.

use crate::core::Genotype;
use crate::ops::mutation::gaussian;
use crate::ops::{
    latin_hypercube_unit, CrossoverOperator, InitialPopulation, MutationOperator, ObjectiveError,
    ObjectiveFunction, ObjectiveResult,
};
use rand::{Rng, RngCore};
use std::collections::HashMap;

/// Legal range of the wind drag coefficient.
pub const DRF_RANGE: (f64, f64) = (0.0, 5.0);

/// Bottom friction values available to the model.
pub const CFW_CANDIDATES: [f64; 10] = [
    0.005, 0.01, 0.015, 0.02, 0.025, 0.03, 0.035, 0.04, 0.045, 0.05,
];

/// Whitecapping steepness values available to the model.
pub const STPM_CANDIDATES: [f64; 4] = [0.001, 0.002, 0.003, 0.004];

/// Index of the candidate closest to `value`. Ties go to the earlier
/// candidate; `None` for an empty candidate list.
///
/// # Examples
/// ```
/// use swell::swan::{nearest_index, STPM_CANDIDATES};
/// assert_eq!(nearest_index(&STPM_CANDIDATES, 0.0026), Some(2));
/// assert_eq!(nearest_index(&[], 1.0), None);
/// ```
#[must_use]
pub fn nearest_index(candidates: &[f64], value: f64) -> Option<usize> {
    candidates
        .iter()
        .enumerate()
        .min_by(|(_, lhs), (_, rhs)| (*lhs - value).abs().total_cmp(&(*rhs - value).abs()))
        .map(|(idx, _)| idx)
}

fn snap(candidates: &[f64], value: f64) -> f64 {
    nearest_index(candidates, value).map_or(value, |idx| candidates[idx])
}

fn clamp_drf(value: f64) -> f64 {
    if value.is_nan() {
        DRF_RANGE.0
    } else {
        value.clamp(DRF_RANGE.0, DRF_RANGE.1)
    }
}

/// One SWAN parameter set.
///
/// # Examples
/// ```
/// use swell::swan::SwanParams;
/// use swell::Genotype;
///
/// let params = SwanParams::new(7.5, 0.0212, 0.0031);
/// assert_eq!(params.genes(), vec![5.0, 0.02, 0.003]);
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwanParams {
    /// Wind drag coefficient.
    pub drf: f64,
    /// Bottom friction coefficient.
    pub cfw: f64,
    /// Whitecapping steepness.
    pub stpm: f64,
}

impl SwanParams {
    /// Creates a parameter set moved into the legal domain.
    #[must_use]
    pub fn new(drf: f64, cfw: f64, stpm: f64) -> Self {
        Self { drf, cfw, stpm }.repaired()
    }

    /// Uniform `drf` with `cfw` and `stpm` picked uniformly from their
    /// candidates.
    pub fn random(rng: &mut dyn RngCore) -> Self {
        let cfw = CFW_CANDIDATES[rng.gen_range(0..CFW_CANDIDATES.len())];
        let stpm = STPM_CANDIDATES[rng.gen_range(0..STPM_CANDIDATES.len())];
        Self {
            drf: rng.gen_range(DRF_RANGE.0..=DRF_RANGE.1),
            cfw,
            stpm,
        }
    }

    /// Parameters as `[drf, cfw, stpm]`.
    #[must_use]
    pub fn params_list(&self) -> [f64; 3] {
        [self.drf, self.cfw, self.stpm]
    }

    fn from_list(genes: [f64; 3]) -> Self {
        Self::new(genes[0], genes[1], genes[2])
    }
}

impl Default for SwanParams {
    /// Stock SWAN settings, the baseline calibrated runs are compared with.
    fn default() -> Self {
        Self {
            drf: 1.0,
            cfw: 0.015,
            stpm: 0.003,
        }
    }
}

impl Genotype for SwanParams {
    fn genes(&self) -> Vec<f64> {
        self.params_list().to_vec()
    }

    fn repaired(self) -> Self {
        Self {
            drf: clamp_drf(self.drf),
            cfw: snap(&CFW_CANDIDATES, self.cfw),
            stpm: snap(&STPM_CANDIDATES, self.stpm),
        }
    }
}

/// Blends each parameter with its own uniform weight.
#[derive(Debug, Clone, Copy, Default)]
pub struct SwanCrossover;

impl CrossoverOperator<SwanParams> for SwanCrossover {
    fn crossover(
        &self,
        parent_a: &SwanParams,
        parent_b: &SwanParams,
        rng: &mut dyn RngCore,
    ) -> (SwanParams, SwanParams) {
        let genes_a = parent_a.params_list();
        let genes_b = parent_b.params_list();
        let mut child_a = [0.0; 3];
        let mut child_b = [0.0; 3];
        for idx in 0..3 {
            let weight: f64 = rng.gen();
            child_a[idx] = weight * genes_a[idx] + (1.0 - weight) * genes_b[idx];
            child_b[idx] = (1.0 - weight) * genes_a[idx] + weight * genes_b[idx];
        }
        (SwanParams::from_list(child_a), SwanParams::from_list(child_b))
    }
}

/// Gaussian perturbation with scales `[drf, cfw, stpm]` taken from the
/// mutation rates, followed by repair.
#[derive(Debug, Clone, Copy, Default)]
pub struct SwanMutation;

impl MutationOperator<SwanParams> for SwanMutation {
    fn mutate(&self, genotype: &SwanParams, rates: &[f64], rng: &mut dyn RngCore) -> SwanParams {
        let mut genes = genotype.params_list();
        for (gene, &rate) in genes.iter_mut().zip(rates.iter()) {
            *gene += gaussian(rate, rng);
        }
        SwanParams::from_list(genes)
    }
}

/// Latin hypercube sampling over the SWAN domain.
///
/// `drf` strata are continuous; for `cfw` and `stpm` each stratum maps onto
/// the candidate covering it.
#[derive(Debug, Clone, Copy, Default)]
pub struct SwanLatinHypercube;

fn stratum_value(candidates: &[f64], unit: f64) -> f64 {
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    let idx = (unit * candidates.len() as f64).floor() as usize;
    candidates[idx.min(candidates.len() - 1)]
}

impl InitialPopulation<SwanParams> for SwanLatinHypercube {
    fn initial_population(&self, size: usize, rng: &mut dyn RngCore) -> Vec<SwanParams> {
        latin_hypercube_unit(size, 3, rng)
            .into_iter()
            .map(|unit| {
                SwanParams {
                    drf: DRF_RANGE.0 + unit[0] * (DRF_RANGE.1 - DRF_RANGE.0),
                    cfw: stratum_value(&CFW_CANDIDATES, unit[1]),
                    stpm: stratum_value(&STPM_CANDIDATES, unit[2]),
                }
                .repaired()
            })
            .collect()
    }
}

/// Oracle producing forecast series for a parameter set.
///
/// The returned vector holds one significant-wave-height series per
/// station, in the station order used for the observations.
pub trait ForecastModel: Send + Sync {
    /// Forecasts for `params`.
    ///
    /// # Errors
    /// Returns [`ObjectiveError`] when no forecast can be produced.
    fn forecasts(&self, params: &SwanParams) -> ObjectiveResult<Vec<Vec<f64>>>;
}

impl<F> ForecastModel for F
where
    F: Fn(&SwanParams) -> ObjectiveResult<Vec<Vec<f64>>> + Send + Sync,
{
    fn forecasts(&self, params: &SwanParams) -> ObjectiveResult<Vec<Vec<f64>>> {
        self(params)
    }
}

/// Precomputed model runs on a regular parameter grid.
///
/// Lookups resolve each parameter to the closest grid value, so any point of
/// the domain maps onto a stored run.
///
/// # Examples
/// ```
/// use swell::swan::{ForecastGrid, ForecastModel, SwanParams};
///
/// let mut grid = ForecastGrid::new(vec![0.0, 1.0], vec![0.01, 0.02], vec![0.001]);
/// grid.insert(&SwanParams::new(1.0, 0.02, 0.001), vec![vec![0.5, 0.7]]).unwrap();
/// let series = grid.forecasts(&SwanParams::new(0.9, 0.019, 0.001)).unwrap();
/// assert_eq!(series, vec![vec![0.5, 0.7]]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ForecastGrid {
    drf_grid: Vec<f64>,
    cfw_grid: Vec<f64>,
    stpm_grid: Vec<f64>,
    cells: HashMap<[usize; 3], Vec<Vec<f64>>>,
}

impl ForecastGrid {
    /// Creates an empty grid over the given axis values.
    #[must_use]
    pub fn new(drf_grid: Vec<f64>, cfw_grid: Vec<f64>, stpm_grid: Vec<f64>) -> Self {
        Self {
            drf_grid,
            cfw_grid,
            stpm_grid,
            cells: HashMap::new(),
        }
    }

    /// Stores the station series of the grid cell closest to `params`,
    /// returning the series previously stored there.
    ///
    /// # Errors
    /// Returns [`ObjectiveError::Failed`] when an axis of the grid is empty.
    pub fn insert(
        &mut self,
        params: &SwanParams,
        series: Vec<Vec<f64>>,
    ) -> ObjectiveResult<Option<Vec<Vec<f64>>>> {
        let cell = self
            .closest_cell(params)
            .ok_or_else(|| ObjectiveError::Failed("forecast grid has an empty axis".into()))?;
        Ok(self.cells.insert(cell, series))
    }

    /// Grid point closest to `params`.
    #[must_use]
    pub fn closest_params(&self, params: &SwanParams) -> Option<SwanParams> {
        let [drf, cfw, stpm] = self.closest_cell(params)?;
        Some(SwanParams {
            drf: self.drf_grid[drf],
            cfw: self.cfw_grid[cfw],
            stpm: self.stpm_grid[stpm],
        })
    }

    /// Number of stored runs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Indicates whether no run has been stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    fn closest_cell(&self, params: &SwanParams) -> Option<[usize; 3]> {
        Some([
            nearest_index(&self.drf_grid, params.drf)?,
            nearest_index(&self.cfw_grid, params.cfw)?,
            nearest_index(&self.stpm_grid, params.stpm)?,
        ])
    }
}

impl ForecastModel for ForecastGrid {
    fn forecasts(&self, params: &SwanParams) -> ObjectiveResult<Vec<Vec<f64>>> {
        self.closest_cell(params)
            .and_then(|cell| self.cells.get(&cell))
            .cloned()
            .ok_or_else(|| ObjectiveError::MissingForecast(params.genes()))
    }
}

/// Root mean squared error between a forecast and an observed series.
///
/// Pairs are taken up to the shorter series; the sum is divided by the
/// number of observations.
///
/// # Examples
/// ```
/// let error = swell::swan::rmse(&[1.0, 2.0], &[1.0, 4.0]);
/// assert!((error - 2.0_f64.sqrt()).abs() < 1e-12);
/// ```
#[must_use]
pub fn rmse(predicted: &[f64], observed: &[f64]) -> f64 {
    if observed.is_empty() {
        return 0.0;
    }
    let squared: f64 = predicted
        .iter()
        .zip(observed.iter())
        .map(|(pred, obs)| (pred - obs) * (pred - obs))
        .sum();
    #[allow(clippy::cast_precision_loss)]
    let count = observed.len() as f64;
    (squared / count).sqrt()
}

/// Per-station ratio of `metrics` to a `reference` run.
///
/// # Errors
/// Returns [`ObjectiveError::StationCountMismatch`] when the slices differ in
/// length and [`ObjectiveError::ZeroReference`] when a reference error is zero.
pub fn relative_errors(metrics: &[f64], reference: &[f64]) -> ObjectiveResult<Vec<f64>> {
    if metrics.len() != reference.len() {
        return Err(ObjectiveError::StationCountMismatch {
            expected: reference.len(),
            found: metrics.len(),
        });
    }
    if let Some(station) = reference.iter().position(|baseline| *baseline == 0.0) {
        return Err(ObjectiveError::ZeroReference { station });
    }
    Ok(metrics
        .iter()
        .zip(reference.iter())
        .map(|(metric, baseline)| metric / baseline)
        .collect())
}

/// One RMSE objective per observed station.
pub struct StationRmse<M> {
    model: M,
    observations: Vec<Vec<f64>>,
}

impl<M: ForecastModel> StationRmse<M> {
    /// Pairs a forecast model with the observed series of each station.
    ///
    /// # Errors
    /// Returns [`ObjectiveError::EmptyObservation`] when a station has no
    /// samples.
    pub fn new(model: M, observations: Vec<Vec<f64>>) -> ObjectiveResult<Self> {
        if let Some(station) = observations.iter().position(Vec::is_empty) {
            return Err(ObjectiveError::EmptyObservation { station });
        }
        Ok(Self {
            model,
            observations,
        })
    }

    /// Observed series, one per station.
    #[must_use]
    pub fn observations(&self) -> &[Vec<f64>] {
        &self.observations
    }

    /// Wrapped forecast model.
    #[must_use]
    pub fn model(&self) -> &M {
        &self.model
    }

    /// RMSE of every station for `params`.
    ///
    /// # Errors
    /// Propagates model failures and reports
    /// [`ObjectiveError::StationCountMismatch`] when the model returns a
    /// different number of stations.
    pub fn station_errors(&self, params: &SwanParams) -> ObjectiveResult<Vec<f64>> {
        let forecasts = self.model.forecasts(params)?;
        if forecasts.len() != self.observations.len() {
            return Err(ObjectiveError::StationCountMismatch {
                expected: self.observations.len(),
                found: forecasts.len(),
            });
        }
        Ok(forecasts
            .iter()
            .zip(self.observations.iter())
            .map(|(forecast, observed)| rmse(forecast, observed))
            .collect())
    }
}

impl<M: ForecastModel> ObjectiveFunction<SwanParams> for StationRmse<M> {
    fn objectives(&self, genotype: &SwanParams) -> ObjectiveResult<Vec<f64>> {
        self.station_errors(genotype)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn is_legal(params: &SwanParams) -> bool {
        (DRF_RANGE.0..=DRF_RANGE.1).contains(&params.drf)
            && CFW_CANDIDATES.contains(&params.cfw)
            && STPM_CANDIDATES.contains(&params.stpm)
    }

    #[test]
    fn repair_clamps_and_snaps() {
        let params = SwanParams {
            drf: -1.0,
            cfw: 0.0274,
            stpm: 0.009,
        }
        .repaired();
        assert_eq!(params, SwanParams { drf: 0.0, cfw: 0.025, stpm: 0.004 });
        assert_eq!(SwanParams::new(f64::NAN, 0.0, 0.0).drf, 0.0);
    }

    #[test]
    fn default_params_are_legal() {
        let params = SwanParams::default();
        assert!(is_legal(&params));
        assert_eq!(params, params.repaired());
    }

    #[test]
    fn random_params_are_legal() {
        let mut rng = StdRng::seed_from_u64(3);
        assert!((0..50).all(|_| is_legal(&SwanParams::random(&mut rng))));
    }

    #[test]
    fn hypercube_spreads_drf_and_uses_candidates() {
        let mut rng = StdRng::seed_from_u64(9);
        let population = SwanLatinHypercube.initial_population(10, &mut rng);
        assert_eq!(population.len(), 10);
        assert!(population.iter().all(is_legal));
        let mut strata: Vec<usize> = population
            .iter()
            .map(|params| (params.drf / 0.5).floor() as usize)
            .collect();
        strata.sort_unstable();
        assert_eq!(strata, (0..10).collect::<Vec<_>>());
        // Ten strata over ten bottom-friction values: each one once.
        let mut cfw: Vec<f64> = population.iter().map(|params| params.cfw).collect();
        cfw.sort_by(f64::total_cmp);
        assert_eq!(cfw, CFW_CANDIDATES.to_vec());
    }

    #[test]
    fn variation_keeps_children_legal() {
        let mut rng = StdRng::seed_from_u64(21);
        let parent_a = SwanParams::new(0.5, 0.005, 0.001);
        let parent_b = SwanParams::new(4.5, 0.05, 0.004);
        for _ in 0..100 {
            let (child_a, child_b) = SwanCrossover.crossover(&parent_a, &parent_b, &mut rng);
            assert!(is_legal(&child_a) && is_legal(&child_b));
            assert!(child_a.drf >= 0.5 && child_a.drf <= 4.5);
            let mutant = SwanMutation.mutate(&child_a, &[2.0, 0.02, 0.002], &mut rng);
            assert!(is_legal(&mutant));
        }
    }

    #[test]
    fn mutation_without_rates_only_repairs() {
        let mut rng = StdRng::seed_from_u64(1);
        let params = SwanParams::new(1.25, 0.03, 0.002);
        assert_eq!(SwanMutation.mutate(&params, &[], &mut rng), params);
        assert_eq!(SwanMutation.mutate(&params, &[0.0, 0.0, 0.0], &mut rng), params);
    }

    #[test]
    fn rmse_divides_by_observation_count() {
        assert_eq!(rmse(&[3.0, 3.0], &[1.0, 1.0]), 2.0);
        assert_eq!(rmse(&[1.0], &[]), 0.0);
        // Extra forecast samples are ignored.
        assert_eq!(rmse(&[2.0, 2.0, 100.0], &[0.0, 0.0]), 2.0);
    }

    #[test]
    fn relative_errors_need_matching_stations() {
        assert_eq!(relative_errors(&[1.0, 3.0], &[2.0, 3.0]).unwrap(), vec![0.5, 1.0]);
        assert!(matches!(
            relative_errors(&[1.0], &[1.0, 2.0]),
            Err(ObjectiveError::StationCountMismatch { expected: 2, found: 1 })
        ));
    }

    #[test]
    fn zero_reference_error_is_rejected() {
        assert!(matches!(
            relative_errors(&[0.4, 0.0], &[0.8, 0.0]),
            Err(ObjectiveError::ZeroReference { station: 1 })
        ));
    }

    #[test]
    fn station_rmse_scores_each_station() {
        let model = |params: &SwanParams| -> ObjectiveResult<Vec<Vec<f64>>> {
            Ok(vec![vec![params.drf; 2], vec![params.drf * 2.0; 2]])
        };
        let objective = StationRmse::new(model, vec![vec![1.0, 1.0], vec![0.0, 0.0]]).unwrap();
        let errors = objective.objectives(&SwanParams::new(2.0, 0.01, 0.001)).unwrap();
        assert_eq!(errors, vec![1.0, 4.0]);
    }

    #[test]
    fn station_rmse_rejects_bad_inputs() {
        let model = |_: &SwanParams| -> ObjectiveResult<Vec<Vec<f64>>> { Ok(vec![vec![1.0]]) };
        assert!(matches!(
            StationRmse::new(model, vec![vec![1.0], vec![]]),
            Err(ObjectiveError::EmptyObservation { station: 1 })
        ));
        let objective = StationRmse::new(model, vec![vec![1.0], vec![2.0]]).unwrap();
        assert!(matches!(
            objective.objectives(&SwanParams::new(1.0, 0.01, 0.001)),
            Err(ObjectiveError::StationCountMismatch { expected: 2, found: 1 })
        ));
    }

    #[test]
    fn grid_lookup_uses_closest_cell() {
        let mut grid = ForecastGrid::new(vec![0.0, 2.5, 5.0], CFW_CANDIDATES.to_vec(), STPM_CANDIDATES.to_vec());
        let stored = SwanParams::new(2.5, 0.02, 0.002);
        assert!(grid.insert(&stored, vec![vec![1.0]]).unwrap().is_none());
        assert_eq!(grid.len(), 1);
        assert_eq!(grid.closest_params(&SwanParams::new(2.1, 0.02, 0.002)), Some(stored));
        assert_eq!(
            grid.forecasts(&SwanParams::new(3.0, 0.02, 0.002)).unwrap(),
            vec![vec![1.0]]
        );
        assert!(matches!(
            grid.forecasts(&SwanParams::new(5.0, 0.02, 0.002)),
            Err(ObjectiveError::MissingForecast(_))
        ));
    }

    #[test]
    fn empty_grid_axis_cannot_store() {
        let mut grid = ForecastGrid::new(vec![], vec![0.01], vec![0.001]);
        assert!(grid.insert(&SwanParams::new(1.0, 0.01, 0.001), vec![]).is_err());
        assert!(grid.is_empty());
    }
}
