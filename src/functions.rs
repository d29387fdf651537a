//! Multi-objective test problems.
//!
//! These make it easy to try the optimizer before wiring a real model:
//! ```
//! use swell::ops::ObjectiveFunction;
//! let objectives = swell::functions::schaffer_n1.objectives(&vec![1.0]).unwrap();
//! assert_eq!(objectives, vec![1.0, 1.0]);
//! ```
//! Every function has the signature expected by
//! [`crate::ops::ObjectiveFunction`] for `Vec<f64>` genotypes, and all
//! objectives are minimized.
#![allow(clippy::ptr_arg)]

use crate::ops::{ObjectiveError, ObjectiveResult};

fn require_dimensions(x: &[f64], expected: usize) -> ObjectiveResult<()> {
    if x.len() < expected {
        return Err(ObjectiveError::DimensionMismatch {
            expected,
            found: x.len(),
        });
    }
    Ok(())
}

/// Schaffer's first problem, `(x², (x - 2)²)`, using the first gene.
///
/// The Pareto set is `x ∈ [0, 2]`.
///
/// # Errors
/// Returns [`ObjectiveError::DimensionMismatch`] for an empty genotype.
pub fn schaffer_n1(x: &Vec<f64>) -> ObjectiveResult<Vec<f64>> {
    require_dimensions(x, 1)?;
    Ok(vec![x[0] * x[0], (x[0] - 2.0) * (x[0] - 2.0)])
}

/// ZDT1 with genes in `[0, 1]`; the front is `f2 = 1 - sqrt(f1)` where every
/// gene but the first is zero.
///
/// # Errors
/// Returns [`ObjectiveError::DimensionMismatch`] for fewer than two genes.
pub fn zdt1(x: &Vec<f64>) -> ObjectiveResult<Vec<f64>> {
    require_dimensions(x, 2)?;
    let f1 = x[0];
    #[allow(clippy::cast_precision_loss)]
    let tail = (x.len() - 1) as f64;
    let g = 1.0 + 9.0 * x[1..].iter().sum::<f64>() / tail;
    let f2 = g * (1.0 - (f1 / g).sqrt());
    Ok(vec![f1, f2])
}

/// Binh and Korn's problem on `x ∈ [0, 5]`, `y ∈ [0, 3]`.
///
/// # Errors
/// Returns [`ObjectiveError::DimensionMismatch`] for fewer than two genes.
pub fn binh_korn(x: &Vec<f64>) -> ObjectiveResult<Vec<f64>> {
    require_dimensions(x, 2)?;
    let (a, b) = (x[0], x[1]);
    Ok(vec![
        4.0 * a * a + 4.0 * b * b,
        (a - 5.0) * (a - 5.0) + (b - 5.0) * (b - 5.0),
    ])
}
