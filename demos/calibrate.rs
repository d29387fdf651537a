//! Calibrates SWAN parameters against synthetic buoy records.
//!
//! Usage: `cargo run --example calibrate -- [robust|quality|tradeoff|manual|luck] [seed]`
//! Set `RUST_LOG=swell=debug` to follow every generation.

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::error::Error;
use swell::ops::{Memoized, ObjectiveFunction};
use swell::swan::{
    relative_errors, ForecastGrid, StationRmse, SwanCrossover, SwanLatinHypercube, SwanMutation,
    SwanParams, CFW_CANDIDATES, STPM_CANDIDATES,
};
use swell::sweep::RunPreset;
use swell::Spea2;
use tracing_subscriber::EnvFilter;

type DemoResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

const STATIONS: usize = 4;
const STEPS: usize = 96;

/// Stand-in for precomputed SWAN runs: wave height responds to each
/// parameter with a station-specific tidal phase.
fn hindcast(params: &SwanParams, station: usize) -> Vec<f64> {
    (0..STEPS)
        .map(|step| {
            let phase = step as f64 / 6.0 + station as f64 * 0.7;
            let height = 1.2 + 0.6 * phase.sin() + 0.2 * (phase * 0.3).cos();
            height * (0.7 + 0.15 * params.drf) + 6.0 * params.cfw - 40.0 * params.stpm
        })
        .collect()
}

fn build_grid() -> DemoResult<ForecastGrid> {
    let drf_grid: Vec<f64> = (0..=20).map(|step| f64::from(step) * 0.25).collect();
    let mut grid = ForecastGrid::new(
        drf_grid.clone(),
        CFW_CANDIDATES.to_vec(),
        STPM_CANDIDATES.to_vec(),
    );
    for &drf in &drf_grid {
        for &cfw in &CFW_CANDIDATES {
            for &stpm in &STPM_CANDIDATES {
                let params = SwanParams { drf, cfw, stpm };
                let series = (0..STATIONS).map(|station| hindcast(&params, station)).collect();
                grid.insert(&params, series)?;
            }
        }
    }
    Ok(grid)
}

fn main() -> DemoResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let preset: RunPreset = args.next().as_deref().unwrap_or("manual").parse()?;
    let seed: u64 = args.next().as_deref().unwrap_or("42").parse()?;

    let truth = SwanParams::new(2.3, 0.035, 0.002);
    let observations: Vec<Vec<f64>> = (0..STATIONS)
        .map(|station| hindcast(&truth, station))
        .collect();
    let grid = build_grid()?;
    println!("forecast grid holds {} runs", grid.len());

    let baseline = StationRmse::new(grid.clone(), observations.clone())?
        .objectives(&SwanParams::default())?;
    let objective = Memoized::new(StationRmse::new(grid, observations)?);

    let params = preset.params();
    println!("preset {preset}: {params:?}");
    let mut engine = Spea2::builder()
        .params(params)
        .initializer(SwanLatinHypercube)
        .parallel_objectives(objective)
        .crossover(SwanCrossover)
        .mutation(SwanMutation)
        .build()?;
    let (history, archive_history) = engine.solve(&mut StdRng::seed_from_u64(seed))?;

    for snapshot in history.generations() {
        let best = snapshot.best().map(|member| member.fitness()).unwrap_or_default();
        println!(
            "generation {:>3}: best fitness {:.4}, population variance {:.5}",
            snapshot.generation,
            best,
            snapshot.pop_variance()
        );
    }

    let best = history.last().ok_or("the run produced no archive")?;
    let errors = best.objectives().ok_or("best individual was never evaluated")?;
    let relative = relative_errors(errors, &baseline)?;
    println!("visited {} archive members", archive_history.len());
    println!("calibrated parameters: {:?} (truth {:?})", best.genotype(), truth);
    for (station, ratio) in relative.iter().enumerate() {
        println!("station {}: RMSE at {:.1}% of the default settings", station + 1, ratio * 100.0);
    }
    Ok(())
}
