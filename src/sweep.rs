//! Named run presets and parallel robustness sweeps.
//!
//! A sweep repeats independent optimizations, for instance over several
//! station subsets, to judge how stable the calibrated parameters are. Runs
//! share nothing: each gets its own configuration and its own seeded RNG, so
//! results do not depend on how rayon schedules them.

use crate::spea2::Spea2Params;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;
use tracing::debug;

/// Tuned hyper-parameters, with the archive expressed relative to the
/// population.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct PresetConfig {
    /// Number of generations.
    pub max_gens: usize,
    /// Individuals per generation.
    pub pop_size: usize,
    /// Archive size as a fraction of `pop_size`.
    pub archive_size_rate: f64,
    /// Crossover probability.
    pub crossover_rate: f64,
    /// Mutation probability.
    pub mutation_rate: f64,
    /// Perturbation scales for `[drf, cfw, stpm]`.
    pub mutation_value_rate: [f64; 3],
}

impl PresetConfig {
    /// `archive_size_rate × pop_size`, rounded half to even, and never below
    /// one.
    #[must_use]
    pub fn archive_size(&self) -> usize {
        #[allow(
            clippy::cast_precision_loss,
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss
        )]
        let size = (self.archive_size_rate * self.pop_size as f64)
            .round_ties_even()
            .max(1.0) as usize;
        size
    }

    /// Engine configuration for this preset.
    #[must_use]
    pub fn params(&self) -> Spea2Params {
        Spea2Params {
            max_gens: self.max_gens,
            pop_size: self.pop_size,
            archive_size: self.archive_size(),
            crossover_rate: self.crossover_rate,
            mutation_rate: self.mutation_rate,
            mutation_value_rate: self.mutation_value_rate.to_vec(),
        }
    }
}

/// Hyper-parameter sets found by meta-optimization of the calibration.
///
/// # Examples
/// ```
/// use swell::sweep::RunPreset;
///
/// let preset: RunPreset = "tradeoff".parse().unwrap();
/// let params = preset.params();
/// assert_eq!(params.pop_size, 17);
/// assert_eq!(params.archive_size, 6);
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunPreset {
    /// Best robustness across station subsets.
    Robust,
    /// Best calibration quality.
    Quality,
    /// Compromise between quality and robustness.
    Tradeoff,
    /// Hand-picked settings.
    Manual,
    /// Long run used to measure run-to-run variation.
    Luck,
}

impl RunPreset {
    /// Every preset, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::Robust,
        Self::Quality,
        Self::Tradeoff,
        Self::Manual,
        Self::Luck,
    ];

    /// Lower-case name accepted by [`FromStr`].
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Robust => "robust",
            Self::Quality => "quality",
            Self::Tradeoff => "tradeoff",
            Self::Manual => "manual",
            Self::Luck => "luck",
        }
    }

    /// Hyper-parameters of the preset.
    #[must_use]
    pub fn config(self) -> PresetConfig {
        match self {
            Self::Robust => PresetConfig {
                max_gens: 3,
                pop_size: 19,
                archive_size_rate: 0.351_626_547_672_253_3,
                crossover_rate: 0.719_407_516_083_400_3,
                mutation_rate: 0.157_180_219_551_971_23,
                mutation_value_rate: [
                    0.185_305_721_166_660_33,
                    0.008_275_074_614_718_868,
                    0.000_917_588_547_202_427,
                ],
            },
            Self::Quality => PresetConfig {
                max_gens: 4,
                pop_size: 9,
                archive_size_rate: 0.181_923_299_839_577_56,
                crossover_rate: 0.827_515_116_121_138_8,
                mutation_rate: 0.226_635_819_000_443_13,
                mutation_value_rate: [
                    0.224_716_449_905_160_82,
                    0.004_027_729_364_749_993,
                    0.000_297_583_624_177_003,
                ],
            },
            Self::Tradeoff => PresetConfig {
                max_gens: 9,
                pop_size: 17,
                archive_size_rate: 0.351_578_325_689_157_76,
                crossover_rate: 0.374_077_320_454_183_57,
                mutation_rate: 0.269_666_095_276_609_6,
                mutation_value_rate: [
                    0.216_743_971_438_023_46,
                    0.017_216_450_597_376_923,
                    0.000_830_668_613_660_803_1,
                ],
            },
            Self::Manual => PresetConfig {
                max_gens: 30,
                pop_size: 20,
                archive_size_rate: 0.3,
                crossover_rate: 0.3,
                mutation_rate: 0.5,
                mutation_value_rate: [0.1, 0.01, 0.001],
            },
            Self::Luck => PresetConfig {
                max_gens: 100,
                pop_size: 20,
                archive_size_rate: 0.25,
                crossover_rate: 0.8,
                mutation_rate: 0.7,
                mutation_value_rate: [0.1, 0.001, 0.0005],
            },
        }
    }

    /// Engine configuration of the preset.
    #[must_use]
    pub fn params(self) -> Spea2Params {
        self.config().params()
    }
}

impl Display for RunPreset {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing an unknown preset name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown run preset `{0}` (expected robust, quality, tradeoff, manual or luck)")]
pub struct UnknownPreset(pub String);

impl FromStr for RunPreset {
    type Err = UnknownPreset;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|preset| preset.name() == wanted)
            .ok_or_else(|| UnknownPreset(value.to_owned()))
    }
}

/// One independent run of a sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepRun<C> {
    /// Position of the run in the sweep.
    pub id: usize,
    /// Seed of the run's private RNG.
    pub seed: u64,
    /// Run-specific input, such as the station subset.
    pub config: C,
}

/// Expands `configs` into `repeats` rounds of runs.
///
/// Run `id`s count up across rounds (`round × configs.len() + index`) and
/// seeds are `base_seed + id`.
///
/// # Examples
/// ```
/// let runs = swell::sweep::sweep_runs(&["a", "b"], 2, 100);
/// assert_eq!(runs.len(), 4);
/// assert_eq!((runs[3].id, runs[3].seed, runs[3].config), (3, 103, "b"));
/// ```
#[must_use]
pub fn sweep_runs<C: Clone>(configs: &[C], repeats: usize, base_seed: u64) -> Vec<SweepRun<C>> {
    (0..repeats)
        .flat_map(|round| {
            configs.iter().enumerate().map(move |(idx, config)| {
                let id = round * configs.len() + idx;
                SweepRun {
                    id,
                    seed: base_seed.wrapping_add(id as u64),
                    config: config.clone(),
                }
            })
        })
        .collect()
}

/// Executes every run on the rayon pool and returns the outcomes in run
/// order.
///
/// The worker receives the run and an RNG seeded from [`SweepRun::seed`].
/// A failed run does not stop the others.
pub fn run_sweep<C, T, E, W>(runs: &[SweepRun<C>], worker: W) -> Vec<Result<T, E>>
where
    C: Sync,
    T: Send,
    E: Send + Display,
    W: Fn(&SweepRun<C>, &mut StdRng) -> Result<T, E> + Sync,
{
    runs.par_iter()
        .map(|run| {
            let mut rng = StdRng::seed_from_u64(run.seed);
            let outcome = worker(run, &mut rng);
            match &outcome {
                Ok(_) => debug!(run = run.id, seed = run.seed, "sweep run finished"),
                Err(err) => debug!(run = run.id, seed = run.seed, error = %err, "sweep run failed"),
            }
            outcome
        })
        .collect()
}
