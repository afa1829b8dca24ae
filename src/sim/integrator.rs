use log::debug;
use nalgebra::SVector;

use crate::error::{Result, SimError};

// ---------------------------------------------------------------------------
// Solver configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    pub rtol: f64,
    pub atol: f64,
    pub max_steps: usize, // accepted + rejected steps per solve
}

impl Tolerances {
    pub fn new(rtol: f64, atol: f64) -> Self {
        Self { rtol, atol, ..Self::default() }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.rtol > 0.0 && self.rtol.is_finite()) || !(self.atol > 0.0 && self.atol.is_finite()) {
            return Err(SimError::config(format!(
                "tolerances must be positive and finite (rtol = {}, atol = {})",
                self.rtol, self.atol
            )));
        }
        if self.max_steps == 0 {
            return Err(SimError::config("max_steps must be at least 1"));
        }
        Ok(())
    }
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            rtol: 1e-6,
            atol: 1e-6,
            max_steps: 1_000_000,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SolverStats {
    pub accepted: usize,
    pub rejected: usize,
    pub evaluations: usize,
}

/// Solution sampled at the requested output times.
#[derive(Debug, Clone)]
pub struct Solution<const D: usize> {
    pub t: Vec<f64>,
    pub y: Vec<SVector<f64, D>>,
    pub stats: SolverStats,
}

// ---------------------------------------------------------------------------
// Dormand-Prince 5(4) tableau
// ---------------------------------------------------------------------------

const C: [f64; 6] = [0.0, 1.0 / 5.0, 3.0 / 10.0, 4.0 / 5.0, 8.0 / 9.0, 1.0];

const A2: [f64; 1] = [1.0 / 5.0];
const A3: [f64; 2] = [3.0 / 40.0, 9.0 / 40.0];
const A4: [f64; 3] = [44.0 / 45.0, -56.0 / 15.0, 32.0 / 9.0];
const A5: [f64; 4] = [19372.0 / 6561.0, -25360.0 / 2187.0, 64448.0 / 6561.0, -212.0 / 729.0];
const A6: [f64; 5] = [
    9017.0 / 3168.0,
    -355.0 / 33.0,
    46732.0 / 5247.0,
    49.0 / 176.0,
    -5103.0 / 18656.0,
];

// 5th-order weights (k2 weight is zero)
const B: [f64; 6] = [
    35.0 / 384.0,
    0.0,
    500.0 / 1113.0,
    125.0 / 192.0,
    -2187.0 / 6784.0,
    11.0 / 84.0,
];

// 5th minus embedded 4th-order weights, including the FSAL stage k7
const E: [f64; 7] = [
    71.0 / 57600.0,
    0.0,
    -71.0 / 16695.0,
    71.0 / 1920.0,
    -17253.0 / 339200.0,
    22.0 / 525.0,
    -1.0 / 40.0,
];

// Quartic continuous extension: row i holds the coefficients of stage k(i+1)
// in theta, theta^2, theta^3, theta^4 (Dormand & Prince dense output)
const P: [[f64; 4]; 7] = [
    [
        1.0,
        -8048581381.0 / 2820520608.0,
        8663915743.0 / 2820520608.0,
        -12715105075.0 / 11282082432.0,
    ],
    [0.0, 0.0, 0.0, 0.0],
    [
        0.0,
        131558114200.0 / 32700410799.0,
        -68118460800.0 / 10900136933.0,
        87487479700.0 / 32700410799.0,
    ],
    [
        0.0,
        -1754552775.0 / 470086768.0,
        14199869525.0 / 1410260304.0,
        -10690763975.0 / 1880347072.0,
    ],
    [
        0.0,
        127303824393.0 / 49829197408.0,
        -318862633887.0 / 49829197408.0,
        701980252875.0 / 199316789632.0,
    ],
    [
        0.0,
        -282668133.0 / 205662961.0,
        2019193451.0 / 616988883.0,
        -1453857185.0 / 822651844.0,
    ],
    [
        0.0,
        40617522.0 / 29380423.0,
        -110615467.0 / 29380423.0,
        69997945.0 / 29380423.0,
    ],
];

const SAFETY: f64 = 0.9;
const MIN_FACTOR: f64 = 0.2;
const MAX_FACTOR: f64 = 10.0;
const ERROR_EXPONENT: f64 = -1.0 / 5.0;

// ---------------------------------------------------------------------------
// Adaptive solve with dense output
// ---------------------------------------------------------------------------

/// Integrate `dy/dt = f(t, y)` from `t0` to `t1` and report the solution at
/// each time in `t_eval` (sorted, inside `[t0, t1]`).
///
/// Step size is chosen adaptively; `f` may be called many more times than
/// there are output samples, at stage times inside each step. Output between
/// accepted steps comes from the fourth-order continuous extension of the
/// pair, built from the seven stages of the step that covers it.
pub fn solve<const D: usize, F>(
    mut f: F,
    t0: f64,
    t1: f64,
    y0: SVector<f64, D>,
    t_eval: &[f64],
    tol: &Tolerances,
) -> Result<Solution<D>>
where
    F: FnMut(f64, &SVector<f64, D>) -> Result<SVector<f64, D>>,
{
    tol.validate()?;
    if !(t0.is_finite() && t1.is_finite()) || t1 < t0 {
        return Err(SimError::config(format!("invalid integration span [{t0}, {t1}]")));
    }
    if t_eval.windows(2).any(|w| w[1] < w[0]) {
        return Err(SimError::config("output times must be sorted"));
    }
    if let Some(te) = t_eval.iter().find(|&&te| !(te >= t0 && te <= t1)) {
        return Err(SimError::config(format!(
            "output time {te} outside integration span [{t0}, {t1}]"
        )));
    }

    let mut stats = SolverStats::default();
    let mut out_t = Vec::with_capacity(t_eval.len());
    let mut out_y = Vec::with_capacity(t_eval.len());
    let mut next = 0;

    while next < t_eval.len() && t_eval[next] <= t0 {
        out_t.push(t_eval[next]);
        out_y.push(y0);
        next += 1;
    }
    if t1 == t0 {
        return Ok(Solution { t: out_t, y: out_y, stats });
    }

    let mut t = t0;
    let mut y = y0;
    let mut k1 = rhs(&mut f, &mut stats, t, &y)?;
    let mut h = initial_step(&mut f, &mut stats, t0, t1, &y0, &k1, tol)?;
    let mut last_rejected = false;

    while t < t1 {
        if stats.accepted + stats.rejected >= tol.max_steps {
            return Err(SimError::Integration {
                t,
                reason: format!("step budget of {} exhausted", tol.max_steps),
            });
        }
        let min_step = 10.0 * f64::EPSILON * t.abs().max(t1.abs());
        if h < min_step {
            return Err(SimError::Integration {
                t,
                reason: format!("step size {h:.3e} below minimum {min_step:.3e}"),
            });
        }

        let (h_step, t_new) = if h >= t1 - t { (t1 - t, t1) } else { (h, t + h) };

        let k2 = rhs(&mut f, &mut stats, t + C[1] * h_step, &(y + k1 * (A2[0] * h_step)))?;
        let k3 = rhs(
            &mut f,
            &mut stats,
            t + C[2] * h_step,
            &(y + (k1 * A3[0] + k2 * A3[1]) * h_step),
        )?;
        let k4 = rhs(
            &mut f,
            &mut stats,
            t + C[3] * h_step,
            &(y + (k1 * A4[0] + k2 * A4[1] + k3 * A4[2]) * h_step),
        )?;
        let k5 = rhs(
            &mut f,
            &mut stats,
            t + C[4] * h_step,
            &(y + (k1 * A5[0] + k2 * A5[1] + k3 * A5[2] + k4 * A5[3]) * h_step),
        )?;
        let k6 = rhs(
            &mut f,
            &mut stats,
            t + C[5] * h_step,
            &(y + (k1 * A6[0] + k2 * A6[1] + k3 * A6[2] + k4 * A6[3] + k5 * A6[4]) * h_step),
        )?;

        let y_new = y + (k1 * B[0] + k3 * B[2] + k4 * B[3] + k5 * B[4] + k6 * B[5]) * h_step;
        let k7 = rhs(&mut f, &mut stats, t_new, &y_new)?;

        let err_vec = (k1 * E[0] + k3 * E[2] + k4 * E[3] + k5 * E[4] + k6 * E[5] + k7 * E[6])
            * h_step;
        let err = rms_scaled(&err_vec, &y, &y_new, tol);

        if err <= 1.0 {
            let mut factor = if err == 0.0 {
                MAX_FACTOR
            } else {
                (SAFETY * err.powf(ERROR_EXPONENT)).min(MAX_FACTOR)
            };
            if last_rejected {
                factor = factor.min(1.0);
            }

            let stages = [k1, k2, k3, k4, k5, k6, k7];
            while next < t_eval.len() && t_eval[next] <= t_new {
                let te = t_eval[next];
                let ye = if te == t_new {
                    y_new
                } else {
                    dense_output(&y, &stages, h_step, (te - t) / h_step)
                };
                out_t.push(te);
                out_y.push(ye);
                next += 1;
            }

            t = t_new;
            y = y_new;
            k1 = k7;
            h = h_step * factor;
            stats.accepted += 1;
            last_rejected = false;
        } else {
            let factor = if err.is_finite() {
                (SAFETY * err.powf(ERROR_EXPONENT)).max(MIN_FACTOR)
            } else {
                MIN_FACTOR
            };
            h = h_step * factor;
            stats.rejected += 1;
            last_rejected = true;
        }
    }

    debug!(
        "solve [{t0:.3}, {t1:.3}]: {} accepted, {} rejected, {} evaluations, {} outputs",
        stats.accepted,
        stats.rejected,
        stats.evaluations,
        out_t.len()
    );

    Ok(Solution { t: out_t, y: out_y, stats })
}

/// Evaluate the right-hand side, rejecting non-finite derivatives.
fn rhs<const D: usize, F>(
    f: &mut F,
    stats: &mut SolverStats,
    t: f64,
    y: &SVector<f64, D>,
) -> Result<SVector<f64, D>>
where
    F: FnMut(f64, &SVector<f64, D>) -> Result<SVector<f64, D>>,
{
    stats.evaluations += 1;
    let dydt = f(t, y)?;
    if dydt.iter().any(|v| !v.is_finite()) {
        return Err(SimError::Integration {
            t,
            reason: "non-finite derivative".into(),
        });
    }
    Ok(dydt)
}

/// RMS of `v` scaled by the mixed absolute/relative tolerance.
fn rms_scaled<const D: usize>(
    v: &SVector<f64, D>,
    y_old: &SVector<f64, D>,
    y_new: &SVector<f64, D>,
    tol: &Tolerances,
) -> f64 {
    if D == 0 {
        return 0.0;
    }
    let sum: f64 = (0..D)
        .map(|i| {
            let scale = tol.atol + tol.rtol * y_old[i].abs().max(y_new[i].abs());
            (v[i] / scale).powi(2)
        })
        .sum();
    (sum / D as f64).sqrt()
}

/// Starting step estimate (Hairer, Norsett & Wanner, II.4).
fn initial_step<const D: usize, F>(
    f: &mut F,
    stats: &mut SolverStats,
    t0: f64,
    t1: f64,
    y0: &SVector<f64, D>,
    f0: &SVector<f64, D>,
    tol: &Tolerances,
) -> Result<f64>
where
    F: FnMut(f64, &SVector<f64, D>) -> Result<SVector<f64, D>>,
{
    let span = t1 - t0;
    let d0 = rms_scaled(y0, y0, y0, tol);
    let d1 = rms_scaled(f0, y0, y0, tol);
    let h0 = if d0 < 1e-5 || d1 < 1e-5 { 1e-6 } else { 0.01 * d0 / d1 };
    let h0 = h0.min(span);

    let y1 = y0 + f0 * h0;
    let f1 = rhs(f, stats, t0 + h0, &y1)?;
    let d2 = rms_scaled(&(f1 - f0), y0, y0, tol) / h0;

    let h1 = if d1 <= 1e-15 && d2 <= 1e-15 {
        (h0 * 1e-3).max(1e-6)
    } else {
        (0.01 / d1.max(d2)).powf(1.0 / 5.0)
    };
    Ok((100.0 * h0).min(h1).min(span))
}

/// Solution at `t + theta * h` inside one accepted step, `theta` in [0, 1].
fn dense_output<const D: usize>(
    y0: &SVector<f64, D>,
    stages: &[SVector<f64, D>; 7],
    h: f64,
    theta: f64,
) -> SVector<f64, D> {
    let powers = [theta, theta * theta, theta.powi(3), theta.powi(4)];
    let mut y = *y0;
    for (k, row) in stages.iter().zip(&P) {
        let weight: f64 = row.iter().zip(&powers).map(|(p, x)| p * x).sum();
        if weight != 0.0 {
            y += k * (weight * h);
        }
    }
    y
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{Vector1, Vector2};

    #[test]
    fn exponential_decay_matches_closed_form() {
        let t_eval: Vec<f64> = (0..=10).map(|i| i as f64 * 0.5).collect();
        let sol = solve(
            |_t, y: &Vector1<f64>| Ok(-*y),
            0.0,
            5.0,
            Vector1::new(1.0),
            &t_eval,
            &Tolerances::new(1e-9, 1e-12),
        )
        .unwrap();
        assert_eq!(sol.t, t_eval);
        for (t, y) in sol.t.iter().zip(&sol.y) {
            assert_relative_eq!(y[0], (-t).exp(), max_relative = 1e-6);
        }
    }

    #[test]
    fn harmonic_oscillator_dense_output() {
        let t_eval: Vec<f64> = (0..=200).map(|i| i as f64 * 0.05).collect();
        let sol = solve(
            |_t, y: &Vector2<f64>| Ok(Vector2::new(y[1], -y[0])),
            0.0,
            10.0,
            Vector2::new(1.0, 0.0),
            &t_eval,
            &Tolerances::default(),
        )
        .unwrap();
        for (t, y) in sol.t.iter().zip(&sol.y) {
            assert!((y[0] - t.cos()).abs() < 1e-4, "x({t}) = {}", y[0]);
        }
        // Far fewer accepted steps than output samples
        assert!(sol.stats.accepted < t_eval.len());
        assert!(sol.stats.evaluations >= 6 * sol.stats.accepted);
    }

    #[test]
    fn interior_samples_are_exact_for_quartic_solutions() {
        // y = t^4: the continuous extension integrates cubic forcing exactly,
        // so samples between step endpoints carry only round-off
        let t_eval: Vec<f64> = (0..=40).map(|i| i as f64 * 0.05).collect();
        let sol = solve(
            |t, _y: &Vector1<f64>| Ok(Vector1::new(4.0 * t * t * t)),
            0.0,
            2.0,
            Vector1::new(0.0),
            &t_eval,
            &Tolerances::default(),
        )
        .unwrap();
        assert!(sol.stats.accepted < t_eval.len());
        for (t, y) in sol.t.iter().zip(&sol.y) {
            assert_relative_eq!(y[0], t.powi(4), epsilon = 1e-10, max_relative = 1e-12);
        }
    }

    #[test]
    fn rhs_is_called_at_stage_times() {
        let mut seen = Vec::new();
        solve(
            |t, _y: &Vector1<f64>| {
                seen.push(t);
                Ok(Vector1::new(1.0))
            },
            0.0,
            1.0,
            Vector1::new(0.0),
            &[1.0],
            &Tolerances::default(),
        )
        .unwrap();
        assert!(seen.iter().any(|&t| t > 0.0 && t < 1.0));
        assert!(seen.iter().all(|&t| (0.0..=1.0).contains(&t)));
    }

    #[test]
    fn errors_from_rhs_propagate() {
        let res = solve(
            |t, _y: &Vector1<f64>| {
                if t > 0.5 {
                    Err(SimError::NotAttached)
                } else {
                    Ok(Vector1::new(1.0))
                }
            },
            0.0,
            1.0,
            Vector1::new(0.0),
            &[1.0],
            &Tolerances::default(),
        );
        assert!(matches!(res, Err(SimError::NotAttached)));
    }

    #[test]
    fn non_finite_derivative_is_an_integration_failure() {
        let res = solve(
            |_t, y: &Vector1<f64>| Ok(Vector1::new(1.0 / (y[0] - 0.5))),
            0.0,
            1.0,
            Vector1::new(0.5),
            &[1.0],
            &Tolerances::default(),
        );
        assert!(matches!(res, Err(SimError::Integration { .. })));
    }

    #[test]
    fn step_budget_is_enforced() {
        let tol = Tolerances { max_steps: 3, ..Tolerances::new(1e-12, 1e-12) };
        let res = solve(
            |t, _y: &Vector1<f64>| Ok(Vector1::new((50.0 * t).sin())),
            0.0,
            100.0,
            Vector1::new(0.0),
            &[100.0],
            &tol,
        );
        assert!(matches!(res, Err(SimError::Integration { .. })));
    }

    #[test]
    fn rejects_output_times_outside_span() {
        let res = solve(
            |_t, y: &Vector1<f64>| Ok(*y),
            0.0,
            1.0,
            Vector1::new(1.0),
            &[0.5, 2.0],
            &Tolerances::default(),
        );
        assert!(matches!(res, Err(SimError::Configuration(_))));
    }

    #[test]
    fn empty_span_returns_initial_value() {
        let sol = solve(
            |_t, y: &Vector1<f64>| Ok(*y),
            2.0,
            2.0,
            Vector1::new(3.0),
            &[2.0],
            &Tolerances::default(),
        )
        .unwrap();
        assert_eq!(sol.y, vec![Vector1::new(3.0)]);
        assert_eq!(sol.stats, SolverStats::default());
    }
}
