use rand::rngs::StdRng;
use rand::SeedableRng;
use swell::ops::ObjectiveFunction;
use swell::swan::{
    relative_errors, ForecastGrid, ForecastModel, StationRmse, SwanCrossover, SwanLatinHypercube,
    SwanMutation, SwanParams, CFW_CANDIDATES, STPM_CANDIDATES,
};
use swell::sweep::{run_sweep, sweep_runs, RunPreset};
use swell::{EvaluationError, Genotype, Spea2, Spea2Error, Spea2Params};

const STATIONS: usize = 3;
const STEPS: usize = 24;

fn synthetic_series(params: &SwanParams, station: usize) -> Vec<f64> {
    (0..STEPS)
        .map(|step| {
            let base = 1.0 + 0.5 * (step as f64 / 4.0 + station as f64).sin();
            base * (0.6 + 0.2 * params.drf) + 8.0 * params.cfw - 50.0 * params.stpm
        })
        .collect()
}

fn truth() -> SwanParams {
    SwanParams::new(2.0, 0.025, 0.002)
}

fn observations() -> Vec<Vec<f64>> {
    (0..STATIONS)
        .map(|station| synthetic_series(&truth(), station))
        .collect()
}

fn grid() -> ForecastGrid {
    let drf_grid: Vec<f64> = (0..=10).map(|step| f64::from(step) * 0.5).collect();
    let mut grid = ForecastGrid::new(
        drf_grid.clone(),
        CFW_CANDIDATES.to_vec(),
        STPM_CANDIDATES.to_vec(),
    );
    for &drf in &drf_grid {
        for &cfw in &CFW_CANDIDATES {
            for &stpm in &STPM_CANDIDATES {
                let params = SwanParams { drf, cfw, stpm };
                let series = (0..STATIONS)
                    .map(|station| synthetic_series(&params, station))
                    .collect();
                grid.insert(&params, series).unwrap();
            }
        }
    }
    grid
}

fn calibrate(
    params: Spea2Params,
    objective: StationRmse<impl ForecastModel + 'static>,
    seed: u64,
) -> Result<SwanParams, Spea2Error> {
    let mut engine = Spea2::builder()
        .params(params)
        .initializer(SwanLatinHypercube)
        .parallel_objectives(objective)
        .crossover(SwanCrossover)
        .mutation(SwanMutation)
        .build()?;
    let (history, _) = engine.solve(&mut StdRng::seed_from_u64(seed))?;
    let best = history.last().map(|member| *member.genotype());
    best.ok_or(Spea2Error::SelectionFailed)
}

#[test]
fn calibration_beats_a_poor_reference() {
    let model = grid();
    assert_eq!(model.len(), 11 * CFW_CANDIDATES.len() * STPM_CANDIDATES.len());
    let objective = StationRmse::new(model.clone(), observations()).unwrap();
    let reference = objective
        .objectives(&SwanParams::new(5.0, 0.05, 0.004))
        .unwrap();

    let params = Spea2Params {
        max_gens: 10,
        pop_size: 20,
        archive_size: 5,
        ..Spea2Params::default()
    };
    let best = calibrate(params, objective, 31).unwrap();
    assert_eq!(best, best.repaired());

    let check = StationRmse::new(model, observations()).unwrap();
    let errors = check.objectives(&best).unwrap();
    let relative = relative_errors(&errors, &reference).unwrap();
    assert_eq!(relative.len(), STATIONS);
    assert!(
        relative.iter().all(|ratio| *ratio < 1.0),
        "calibrated {best:?} did not improve on the reference: {relative:?}"
    );
}

#[test]
fn exact_truth_scores_zero() {
    let objective = StationRmse::new(grid(), observations()).unwrap();
    let errors = objective.objectives(&truth()).unwrap();
    assert!(errors.iter().all(|error| error.abs() < 1e-12));
}

#[test]
fn station_subsets_sweep_in_parallel() {
    let model = grid();
    let subsets = vec![vec![0], vec![0, 1], vec![0, 1, 2]];
    let runs = sweep_runs(&subsets, 2, 7);
    let worker = |run: &swell::sweep::SweepRun<Vec<usize>>, rng: &mut StdRng| {
        let stations = run.config.clone();
        let lookup = model.clone();
        let subset_model = move |params: &SwanParams| {
            lookup.forecasts(params).map(|series| {
                stations
                    .iter()
                    .map(|&station| series[station].clone())
                    .collect::<Vec<_>>()
            })
        };
        let observed: Vec<Vec<f64>> = run
            .config
            .iter()
            .map(|&station| observations()[station].clone())
            .collect();
        let objective =
            StationRmse::new(subset_model, observed).map_err(EvaluationError::from)?;
        let mut engine = Spea2::builder()
            .params(RunPreset::Quality.params())
            .initializer(SwanLatinHypercube)
            .objectives(objective)
            .crossover(SwanCrossover)
            .mutation(SwanMutation)
            .build()?;
        let (history, _) = engine.solve(rng)?;
        Ok::<_, Spea2Error>(history.last().map(|member| *member.genotype()))
    };
    let first = run_sweep(&runs, worker);
    let second = run_sweep(&runs, worker);
    assert_eq!(first.len(), 6);
    for (lhs, rhs) in first.iter().zip(second.iter()) {
        let lhs = lhs.as_ref().unwrap().unwrap();
        let rhs = rhs.as_ref().unwrap().unwrap();
        assert_eq!(lhs, rhs);
        assert_eq!(lhs, lhs.repaired());
    }
}
