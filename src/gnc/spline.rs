use crate::error::{Result, SimError};

// ---------------------------------------------------------------------------
// Not-a-knot cubic spline
// ---------------------------------------------------------------------------

/// Piecewise cubic interpolant with not-a-knot end conditions.
///
/// Degenerate sizes: one knot gives a constant, two a straight line, three a
/// single parabola. Outside `[x_first, x_last]` the end polynomials are
/// extrapolated.
#[derive(Debug, Clone)]
pub struct CubicSpline {
    knots: Vec<f64>,
    // Per-interval coefficients of c0 + c1*dt + c2*dt^2 + c3*dt^3, dt = x - knot[i]
    coeffs: Vec<[f64; 4]>,
}

impl CubicSpline {
    /// Fit through `(knots[i], values[i])`. Knots must be strictly increasing.
    pub fn fit(knots: &[f64], values: &[f64]) -> Result<Self> {
        if knots.len() != values.len() {
            return Err(SimError::config(format!(
                "spline needs one value per knot ({} knots, {} values)",
                knots.len(),
                values.len()
            )));
        }
        if knots.is_empty() {
            return Err(SimError::config("spline needs at least one knot"));
        }
        if knots.windows(2).any(|w| !(w[1] > w[0])) {
            return Err(SimError::config("spline knots must be strictly increasing"));
        }

        if knots.len() == 1 {
            return Ok(Self {
                knots: knots.to_vec(),
                coeffs: vec![[values[0], 0.0, 0.0, 0.0]],
            });
        }

        let slopes = knot_slopes(knots, values);
        let coeffs = knots
            .windows(2)
            .enumerate()
            .map(|(i, w)| {
                let h = w[1] - w[0];
                let dd = (values[i + 1] - values[i]) / h;
                let (s0, s1) = (slopes[i], slopes[i + 1]);
                [
                    values[i],
                    s0,
                    (3.0 * dd - 2.0 * s0 - s1) / h,
                    (s0 + s1 - 2.0 * dd) / (h * h),
                ]
            })
            .collect();

        Ok(Self { knots: knots.to_vec(), coeffs })
    }

    pub fn knots(&self) -> &[f64] {
        &self.knots
    }

    /// Evaluate at `x`, extrapolating past either end.
    pub fn eval(&self, x: f64) -> f64 {
        let last = self.coeffs.len() - 1;
        let i = self
            .knots
            .partition_point(|&k| k <= x)
            .saturating_sub(1)
            .min(last);
        let dt = x - self.knots[i];
        let [c0, c1, c2, c3] = self.coeffs[i];
        c0 + dt * (c1 + dt * (c2 + dt * c3))
    }
}

/// First derivatives of the interpolant at each knot.
///
/// The not-a-knot system is tridiagonal. Folding the two end rows into their
/// neighbours leaves a strictly diagonally dominant system over the interior
/// slopes, solved in one forward and one backward sweep.
fn knot_slopes(x: &[f64], y: &[f64]) -> Vec<f64> {
    let n = x.len();
    let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();
    let dd: Vec<f64> = (0..n - 1).map(|i| (y[i + 1] - y[i]) / h[i]).collect();

    match n {
        2 => vec![dd[0], dd[0]],
        3 => {
            // Not-a-knot on three points is the interpolating parabola
            let curv = (dd[1] - dd[0]) / (x[2] - x[0]);
            x.iter()
                .map(|&xi| dd[0] + curv * (2.0 * xi - x[0] - x[1]))
                .collect()
        }
        _ => {
            // End rows: h1*s0 + d0*s1 = r0 and dn*s[n-2] + h[n-3]*s[n-1] = rn
            let d0 = x[2] - x[0];
            let r0 = ((h[0] + 2.0 * d0) * h[1] * dd[0] + h[0] * h[0] * dd[1]) / d0;
            let dn = x[n - 1] - x[n - 3];
            let rn = (h[n - 2] * h[n - 2] * dd[n - 3]
                + (2.0 * dn + h[n - 2]) * h[n - 3] * dd[n - 2])
                / dn;

            // Interior rows i = 1..n-1 (second-derivative continuity), stored at i - 1
            let m = n - 2;
            let lower: Vec<f64> = (1..n - 1).map(|i| h[i]).collect();
            let mut diag: Vec<f64> = (1..n - 1).map(|i| 2.0 * (h[i - 1] + h[i])).collect();
            let upper: Vec<f64> = (1..n - 1).map(|i| h[i - 1]).collect();
            let mut rhs: Vec<f64> = (1..n - 1)
                .map(|i| 3.0 * (h[i] * dd[i - 1] + h[i - 1] * dd[i]))
                .collect();

            // Eliminate s0 from the first interior row and s[n-1] from the last
            diag[0] -= d0;
            rhs[0] -= r0;
            diag[m - 1] -= dn;
            rhs[m - 1] -= rn;

            for i in 1..m {
                let w = lower[i] / diag[i - 1];
                diag[i] -= w * upper[i - 1];
                rhs[i] -= w * rhs[i - 1];
            }
            let mut slopes = vec![0.0; n];
            slopes[m] = rhs[m - 1] / diag[m - 1];
            for i in (0..m - 1).rev() {
                slopes[i + 1] = (rhs[i] - upper[i] * slopes[i + 2]) / diag[i];
            }

            slopes[0] = (r0 - d0 * slopes[1]) / h[1];
            slopes[n - 1] = (rn - dn * slopes[n - 2]) / h[n - 3];
            slopes
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn passes_through_knots() {
        let x = [0.0, 1.0, 2.5, 3.0, 4.7, 6.0];
        let y = [0.1, -0.2, 0.05, 0.17, -0.1, 0.0];
        let s = CubicSpline::fit(&x, &y).unwrap();
        for (xi, yi) in x.iter().zip(&y) {
            assert_abs_diff_eq!(s.eval(*xi), *yi, epsilon = 1e-9);
        }
    }

    #[test]
    fn reproduces_a_cubic_exactly() {
        let f = |x: f64| 0.5 * x * x * x - 2.0 * x * x + x - 3.0;
        let x: Vec<f64> = (0..7).map(|i| i as f64 * 0.8).collect();
        let y: Vec<f64> = x.iter().map(|&xi| f(xi)).collect();
        let s = CubicSpline::fit(&x, &y).unwrap();
        for &probe in &[0.3, 1.9, 2.2, 4.1, 4.75] {
            assert_abs_diff_eq!(s.eval(probe), f(probe), epsilon = 1e-9);
        }
    }

    #[test]
    fn reproduces_a_cubic_on_uneven_knots() {
        let f = |x: f64| 0.5 * x * x * x - 2.0 * x * x + x - 3.0;
        for n in 4..=7 {
            let x = &[0.0, 0.3, 1.1, 1.5, 2.9, 3.0, 4.2][..n];
            let y: Vec<f64> = x.iter().map(|&xi| f(xi)).collect();
            let s = CubicSpline::fit(x, &y).unwrap();
            for &probe in &[-1.0, 0.1, 0.7, 1.3, 2.0, 3.5, 5.0] {
                assert_abs_diff_eq!(s.eval(probe), f(probe), epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn many_knots_fit_without_a_dense_system() {
        // 100k knots: a dense n x n matrix would need 80 GB
        let x: Vec<f64> = (0..100_000).map(|i| i as f64 * 0.01).collect();
        let y: Vec<f64> = x.iter().map(|xi| xi.sin()).collect();
        let s = CubicSpline::fit(&x, &y).unwrap();
        for i in (0..x.len() - 1).step_by(997) {
            assert_abs_diff_eq!(s.eval(x[i]), y[i], epsilon = 1e-12);
            let mid = x[i] + 0.005;
            assert_abs_diff_eq!(s.eval(mid), mid.sin(), epsilon = 1e-9);
        }
    }

    #[test]
    fn three_points_give_a_parabola() {
        let f = |x: f64| 2.0 * x * x - x + 1.0;
        let x = [0.0, 1.0, 3.0];
        let y = x.map(f);
        let s = CubicSpline::fit(&x, &y).unwrap();
        assert_abs_diff_eq!(s.eval(2.0), f(2.0), epsilon = 1e-12);
        assert_abs_diff_eq!(s.eval(0.5), f(0.5), epsilon = 1e-12);
    }

    #[test]
    fn two_points_give_a_line() {
        let s = CubicSpline::fit(&[0.0, 10.0], &[1.0, -1.0]).unwrap();
        assert_abs_diff_eq!(s.eval(5.0), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(s.eval(15.0), -2.0, epsilon = 1e-12);
    }

    #[test]
    fn single_knot_is_constant() {
        let s = CubicSpline::fit(&[0.0], &[0.42]).unwrap();
        assert_eq!(s.eval(-100.0), 0.42);
        assert_eq!(s.eval(0.0), 0.42);
        assert_eq!(s.eval(1e9), 0.42);
    }

    #[test]
    fn extrapolates_with_end_polynomials() {
        let f = |x: f64| x * x * x;
        let x: Vec<f64> = (0..5).map(f64::from).collect();
        let y: Vec<f64> = x.iter().map(|&xi| f(xi)).collect();
        let s = CubicSpline::fit(&x, &y).unwrap();
        assert_abs_diff_eq!(s.eval(-1.0), -1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(s.eval(5.0), 125.0, epsilon = 1e-9);
    }

    #[test]
    fn rejects_bad_knots() {
        assert!(CubicSpline::fit(&[], &[]).is_err());
        assert!(CubicSpline::fit(&[0.0, 0.0], &[1.0, 2.0]).is_err());
        assert!(CubicSpline::fit(&[0.0, 1.0], &[1.0]).is_err());
    }
}
