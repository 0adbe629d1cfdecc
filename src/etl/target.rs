// src/etl/target.rs

//! Box-Cox transform of the price target.
//!
//! The inverse is what turns a model output back into euros, and a wrong
//! inverse produces plausible-looking wrong prices, so both directions share
//! one formula pair and the round trip is tested directly.

use crate::errors::{EtlError, Result};

/// Search interval for the maximum-likelihood lambda.
const LAMBDA_BOUNDS: (f64, f64) = (-5.0, 5.0);
const LAMBDA_TOLERANCE: f64 = 1e-10;

/// Box-Cox of a single strictly positive value.
pub fn box_cox(x: f64, lambda: f64) -> Result<f64> {
    if !(x.is_finite() && x > 0.0) {
        return Err(EtlError::Domain(format!(
            "Box-Cox needs strictly positive finite values, got {x}"
        )));
    }

    let ln_x = x.ln();
    Ok(if lambda == 0.0 {
        ln_x
    } else {
        (lambda * ln_x).exp_m1() / lambda
    })
}

/// Exact inverse of [`box_cox`].
pub fn inv_box_cox(y: f64, lambda: f64) -> Result<f64> {
    if lambda == 0.0 {
        return Ok(y.exp());
    }

    let base = lambda * y + 1.0;
    if !(base > 0.0) {
        return Err(EtlError::Domain(format!(
            "{y} has no Box-Cox preimage for lambda {lambda}"
        )));
    }
    Ok(((lambda * y).ln_1p() / lambda).exp())
}

/// Forward transform of a column with a fixed lambda.
pub fn forward(column: &[f64], lambda: f64) -> Result<Vec<f64>> {
    column.iter().map(|&x| box_cox(x, lambda)).collect()
}

/// Inverse transform of a column with a fixed lambda.
pub fn inverse(column: &[f64], lambda: f64) -> Result<Vec<f64>> {
    column.iter().map(|&y| inv_box_cox(y, lambda)).collect()
}

/// Estimates lambda by maximum likelihood and returns the transformed column
/// together with it.
pub fn fit(column: &[f64]) -> Result<(Vec<f64>, f64)> {
    if column.len() < 2 {
        return Err(EtlError::Domain(
            "need at least two values to fit a Box-Cox lambda".into(),
        ));
    }
    if let Some(bad) = column.iter().find(|x| !(x.is_finite() && **x > 0.0)) {
        return Err(EtlError::Domain(format!(
            "Box-Cox needs strictly positive finite values, got {bad}"
        )));
    }

    if column.iter().all(|x| *x == column[0]) {
        return Err(EtlError::Domain(
            "cannot fit a Box-Cox lambda on constant data".into(),
        ));
    }

    let logs: Vec<f64> = column.iter().map(|x| x.ln()).collect();
    let lambda = golden_section_max(
        |lambda| log_likelihood(&logs, lambda),
        LAMBDA_BOUNDS,
        LAMBDA_TOLERANCE,
    );
    Ok((forward(column, lambda)?, lambda))
}

/// Box-Cox profile log-likelihood, up to a constant, from `ln(x)` values.
fn log_likelihood(logs: &[f64], lambda: f64) -> f64 {
    let n = logs.len() as f64;
    let transformed: Vec<f64> = logs
        .iter()
        .map(|&l| {
            if lambda == 0.0 {
                l
            } else {
                (lambda * l).exp_m1() / lambda
            }
        })
        .collect();

    (lambda - 1.0) * logs.iter().sum::<f64>() - n / 2.0 * variance(&transformed).ln()
}

fn variance(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n
}

fn golden_section_max<F: Fn(f64) -> f64>(f: F, (mut lo, mut hi): (f64, f64), tol: f64) -> f64 {
    let inv_phi = (5f64.sqrt() - 1.0) / 2.0;
    let mut a = hi - inv_phi * (hi - lo);
    let mut b = lo + inv_phi * (hi - lo);
    let (mut fa, mut fb) = (f(a), f(b));

    while hi - lo > tol {
        if fa > fb {
            hi = b;
            b = a;
            fb = fa;
            a = hi - inv_phi * (hi - lo);
            fa = f(a);
        } else {
            lo = a;
            a = b;
            fa = fb;
            b = lo + inv_phi * (hi - lo);
            fb = f(b);
        }
    }

    (lo + hi) / 2.0
}
