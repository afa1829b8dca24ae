use std::f64::consts::{PI, TAU};

use rand::Rng;

use crate::error::{Result, SimError};

// ---------------------------------------------------------------------------
// Angles
// ---------------------------------------------------------------------------

/// Wrap an angle (rad) into the half-open interval (-pi, pi].
pub fn wrap_to_pi(angle: f64) -> f64 {
    if angle > -PI && angle <= PI {
        return angle;
    }
    let wrapped = PI - (PI - angle).rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative remainders
    if wrapped <= -PI {
        wrapped + TAU
    } else {
        wrapped
    }
}

// ---------------------------------------------------------------------------
// Sampling helpers
// ---------------------------------------------------------------------------

/// Draw `n` uniform samples in `[-max_magnitude, max_magnitude]` using the
/// thread-local RNG. Returns the bound alongside the samples.
pub fn bounded_random_vector(max_magnitude: f64, n: usize) -> Result<(f64, Vec<f64>)> {
    bounded_random_vector_with(&mut rand::thread_rng(), max_magnitude, n)
}

/// Same as [`bounded_random_vector`] with a caller-supplied RNG.
pub fn bounded_random_vector_with<R: Rng + ?Sized>(
    rng: &mut R,
    max_magnitude: f64,
    n: usize,
) -> Result<(f64, Vec<f64>)> {
    if !(max_magnitude > 0.0) || !max_magnitude.is_finite() {
        return Err(SimError::config(format!(
            "max magnitude must be positive and finite, got {max_magnitude}"
        )));
    }
    let bound = max_magnitude.abs();
    let values = (0..n).map(|_| rng.gen_range(-bound..=bound)).collect();
    Ok((bound, values))
}

/// `n` evenly spaced points over `[start, end]`, endpoints included exactly.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            let mut out: Vec<f64> = (0..n).map(|i| start + step * i as f64).collect();
            out[n - 1] = end;
            out
        }
    }
}
