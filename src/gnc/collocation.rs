use std::sync::OnceLock;

use log::debug;

use super::spline::CubicSpline;
use crate::error::{Result, SimError};
use crate::math::linspace;

// ---------------------------------------------------------------------------
// Collocation control: values pinned at evenly spaced time knots
// ---------------------------------------------------------------------------

/// How the control signal is reconstructed between knots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpolation {
    /// Value of the nearest knot (first one on ties).
    Nearest,
    /// Not-a-knot cubic spline through all knot values.
    Spline,
}

/// Collocation values plus the lazily built knot grid and spline.
///
/// The knot grid spans `[0, t_max]` of the attached scenario, so both caches
/// are only valid for one attachment. [`Collocation::invalidate`] drops them.
#[derive(Debug, Clone)]
pub struct Collocation {
    values: Vec<f64>,
    interpolation: Interpolation,
    knots: OnceLock<Vec<f64>>,
    spline: OnceLock<CubicSpline>,
}

impl Collocation {
    pub fn new(values: Vec<f64>, interpolation: Interpolation) -> Result<Self> {
        if values.is_empty() {
            return Err(SimError::config("collocation needs at least one value"));
        }
        if let Some(v) = values.iter().find(|v| !v.is_finite()) {
            return Err(SimError::config(format!("collocation value {v} is not finite")));
        }
        Ok(Self {
            values,
            interpolation,
            knots: OnceLock::new(),
            spline: OnceLock::new(),
        })
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn interpolation(&self) -> Interpolation {
        self.interpolation
    }

    /// Knot grid of the current attachment, once the first evaluation built it.
    pub fn knots(&self) -> Option<&[f64]> {
        self.knots.get().map(Vec::as_slice)
    }

    // The grid is fixed by the first call; invalidate() before using another t_max
    fn grid(&self, t_max: f64) -> &[f64] {
        self.knots.get_or_init(|| {
            debug!("collocation: building {} knots over [0, {t_max:.3}]", self.values.len());
            linspace(0.0, t_max, self.values.len())
        })
    }

    /// Whether the knot grid / spline have been built for the current attachment.
    pub fn is_cached(&self) -> (bool, bool) {
        (self.knots.get().is_some(), self.spline.get().is_some())
    }

    /// Raw (unclamped) control at time `t`. Defined for any real `t`.
    pub fn evaluate(&self, t: f64, t_max: f64) -> Result<f64> {
        match self.interpolation {
            Interpolation::Nearest => Ok(self.values[nearest_knot(self.grid(t_max), t)]),
            Interpolation::Spline => Ok(self.spline(t_max)?.eval(t)),
        }
    }

    fn spline(&self, t_max: f64) -> Result<&CubicSpline> {
        if let Some(s) = self.spline.get() {
            return Ok(s);
        }
        let fitted = CubicSpline::fit(self.grid(t_max), &self.values)?;
        debug!("collocation: fitted spline through {} knots", self.values.len());
        Ok(self.spline.get_or_init(|| fitted))
    }

    /// Drop cached knots and spline so they are rebuilt for a new scenario.
    pub(crate) fn invalidate(&mut self) {
        self.knots = OnceLock::new();
        self.spline = OnceLock::new();
    }
}

/// Index of the knot closest to `t`; the first one wins a tie.
fn nearest_knot(knots: &[f64], t: f64) -> usize {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (i, k) in knots.iter().enumerate() {
        let d = (k - t).abs();
        if d < best_dist {
            best = i;
            best_dist = d;
        }
    }
    best
}
