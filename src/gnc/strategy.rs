use std::sync::{Arc, Weak};

use log::debug;
use rand::Rng;

use super::collocation::{Collocation, Interpolation};
use super::homing::homing_command;
use crate::dynamics::state::Observation;
use crate::error::{Result, SimError};
use crate::math::{bounded_random_vector, bounded_random_vector_with};
use crate::vehicle::Scenario;

/// Turn-rate bound (rad/s) of the zero strategy a new parafoil starts with.
pub const DEFAULT_MAX_TURN_RATE: f64 = 0.1;

// ---------------------------------------------------------------------------
// Control laws
// ---------------------------------------------------------------------------

/// The closed set of guidance laws a strategy can run.
#[derive(Debug, Clone)]
pub enum ControlLaw {
    /// No control authority used: always commands 0.
    Zero,
    /// Collocation values held or splined over the scenario duration.
    Collocation(Collocation),
    /// Proportional homing toward the origin.
    Homing,
}

// ---------------------------------------------------------------------------
// Control strategy: law + magnitude bound + link to the owning parafoil
// ---------------------------------------------------------------------------

/// Maps an [`Observation`] to a commanded turn rate in
/// `[-max_magnitude, max_magnitude]`.
///
/// A strategy only sees its parafoil's immutable [`Scenario`] through a weak
/// handle set by `Parafoil::set_strategy`. Evaluating it before that (or after
/// the parafoil is dropped) fails with [`SimError::NotAttached`].
#[derive(Debug, Clone)]
pub struct ControlStrategy {
    max_magnitude: f64,
    law: ControlLaw,
    scenario: Weak<Scenario>,
}

impl ControlStrategy {
    fn new(max_magnitude: f64, law: ControlLaw) -> Result<Self> {
        if !(max_magnitude > 0.0) || !max_magnitude.is_finite() {
            return Err(SimError::config(format!(
                "max control magnitude must be positive and finite, got {max_magnitude}"
            )));
        }
        Ok(Self { max_magnitude, law, scenario: Weak::new() })
    }

    pub fn zero(max_magnitude: f64) -> Result<Self> {
        Self::new(max_magnitude, ControlLaw::Zero)
    }

    pub fn homing(max_magnitude: f64) -> Result<Self> {
        Self::new(max_magnitude, ControlLaw::Homing)
    }

    /// Nearest-knot hold over explicit collocation values.
    pub fn collocation(max_magnitude: f64, values: Vec<f64>) -> Result<Self> {
        let c = Collocation::new(values, Interpolation::Nearest)?;
        Self::new(max_magnitude, ControlLaw::Collocation(c))
    }

    /// Cubic spline through explicit collocation values.
    pub fn fitted_collocation(max_magnitude: f64, values: Vec<f64>) -> Result<Self> {
        let c = Collocation::new(values, Interpolation::Spline)?;
        Self::new(max_magnitude, ControlLaw::Collocation(c))
    }

    /// `n` random collocation values in `[-max_magnitude, max_magnitude]`, held.
    pub fn random_collocation(max_magnitude: f64, n: usize) -> Result<Self> {
        let (bound, values) = bounded_random_vector(max_magnitude, n)?;
        Self::collocation(bound, values)
    }

    pub fn random_collocation_with<R: Rng + ?Sized>(
        rng: &mut R,
        max_magnitude: f64,
        n: usize,
    ) -> Result<Self> {
        let (bound, values) = bounded_random_vector_with(rng, max_magnitude, n)?;
        Self::collocation(bound, values)
    }

    /// `n` random collocation values in `[-max_magnitude, max_magnitude]`, splined.
    pub fn random_fitted_collocation(max_magnitude: f64, n: usize) -> Result<Self> {
        let (bound, values) = bounded_random_vector(max_magnitude, n)?;
        Self::fitted_collocation(bound, values)
    }

    pub fn random_fitted_collocation_with<R: Rng + ?Sized>(
        rng: &mut R,
        max_magnitude: f64,
        n: usize,
    ) -> Result<Self> {
        let (bound, values) = bounded_random_vector_with(rng, max_magnitude, n)?;
        Self::fitted_collocation(bound, values)
    }

    /// The zero strategy installed on every new parafoil.
    pub(crate) fn stock() -> Self {
        Self {
            max_magnitude: DEFAULT_MAX_TURN_RATE,
            law: ControlLaw::Zero,
            scenario: Weak::new(),
        }
    }

    pub fn max_magnitude(&self) -> f64 {
        self.max_magnitude
    }

    pub fn law(&self) -> &ControlLaw {
        &self.law
    }

    /// Human-readable name for logging/display.
    pub fn name(&self) -> &str {
        match &self.law {
            ControlLaw::Zero => "zero",
            ControlLaw::Homing => "homing",
            ControlLaw::Collocation(c) => match c.interpolation() {
                Interpolation::Nearest => "collocation",
                Interpolation::Spline => "fitted-collocation",
            },
        }
    }

    pub fn is_attached(&self) -> bool {
        self.scenario.strong_count() > 0
    }

    /// Bind to a parafoil's scenario. Caches derived from a different
    /// scenario are dropped.
    pub(crate) fn attach(&mut self, scenario: &Arc<Scenario>) {
        let same = self
            .scenario
            .upgrade()
            .is_some_and(|current| Arc::ptr_eq(&current, scenario));
        if !same {
            if let ControlLaw::Collocation(c) = &mut self.law {
                c.invalidate();
            }
            debug!("strategy '{}' attached (t_max = {:.3} s)", self.name(), scenario.t_max());
        }
        self.scenario = Arc::downgrade(scenario);
    }

    pub(crate) fn detach(&mut self) {
        self.scenario = Weak::new();
    }

    /// Clamped turn-rate command (rad/s) for an observation.
    pub fn control(&self, obs: &Observation) -> Result<f64> {
        let scenario = self.scenario.upgrade().ok_or(SimError::NotAttached)?;
        let raw = self.raw_control(obs, &scenario)?;
        Ok(raw.clamp(-self.max_magnitude, self.max_magnitude))
    }

    fn raw_control(&self, obs: &Observation, scenario: &Scenario) -> Result<f64> {
        match &self.law {
            ControlLaw::Zero => Ok(0.0),
            ControlLaw::Collocation(c) => c.evaluate(obs.t, scenario.t_max()),
            ControlLaw::Homing => Ok(homing_command(obs, scenario.airspeed(), self.max_magnitude)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamics::state;
    use crate::vehicle::presets;
    use nalgebra::Vector2;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn scenario() -> Arc<Scenario> {
        Arc::new(presets::demo_drop().validate().unwrap())
    }

    fn obs_at(t: f64, s: &Scenario) -> Observation {
        Observation::new(t, &s.initial_state(), s.t_max(), Vector2::zeros())
    }

    #[test]
    fn unattached_strategy_fails_fast() {
        let s = ControlStrategy::zero(0.2).unwrap();
        let sc = scenario();
        assert!(matches!(s.control(&obs_at(0.0, &sc)), Err(SimError::NotAttached)));
    }

    #[test]
    fn dropped_scenario_detaches() {
        let mut s = ControlStrategy::zero(0.2).unwrap();
        let sc = scenario();
        s.attach(&sc);
        assert!(s.is_attached());
        let probe = obs_at(0.0, &sc);
        drop(sc);
        assert!(!s.is_attached());
        assert!(matches!(s.control(&probe), Err(SimError::NotAttached)));
    }

    #[test]
    fn rejects_non_positive_bound() {
        assert!(ControlStrategy::zero(0.0).is_err());
        assert!(ControlStrategy::homing(-1.0).is_err());
        assert!(ControlStrategy::collocation(f64::NAN, vec![0.0]).is_err());
        assert!(ControlStrategy::random_collocation(0.0, 4).is_err());
    }

    #[test]
    fn output_is_clamped_for_every_law() {
        let sc = scenario();
        let mut rng = StdRng::seed_from_u64(3);
        let strategies = vec![
            ControlStrategy::zero(0.05).unwrap(),
            ControlStrategy::collocation(0.05, vec![1.0, -1.0, 2.0]).unwrap(),
            ControlStrategy::fitted_collocation(0.05, vec![1.0, -3.0, 2.0, 5.0]).unwrap(),
            ControlStrategy::random_fitted_collocation_with(&mut rng, 0.05, 8).unwrap(),
            ControlStrategy::homing(0.05).unwrap(),
        ];
        for mut s in strategies {
            s.attach(&sc);
            for i in -10..=60 {
                let t = i as f64 * 4.0;
                let x = sc.params().x0 * (1.0 - t / 400.0);
                let o = Observation::new(t, &state::state(x, -x, 3.0), sc.t_max(), Vector2::zeros());
                let u = s.control(&o).unwrap();
                assert!(u.abs() <= 0.05, "{} gave {u} at t={t}", s.name());
            }
        }
    }

    #[test]
    fn homing_far_from_target_saturates() {
        let sc = scenario();
        let mut s = ControlStrategy::homing(10.0_f64.to_radians()).unwrap();
        s.attach(&sc);
        // 636 m away at 9 m/s needs ~71 s; 171 s remain
        let u = s.control(&obs_at(0.0, &sc)).unwrap();
        assert_eq!(u, 10.0_f64.to_radians());
    }

    #[test]
    fn single_knot_is_constant_for_both_collocations() {
        let sc = scenario();
        for mut s in [
            ControlStrategy::collocation(0.3, vec![0.12]).unwrap(),
            ControlStrategy::fitted_collocation(0.3, vec![0.12]).unwrap(),
        ] {
            s.attach(&sc);
            for &t in &[-50.0, 0.0, 33.3, sc.t_max(), 1e4] {
                assert_eq!(s.control(&obs_at(t, &sc)).unwrap(), 0.12);
            }
        }
    }

    #[test]
    fn random_collocation_values_within_bound() {
        let mut rng = StdRng::seed_from_u64(11);
        let s = ControlStrategy::random_collocation_with(&mut rng, 0.4, 25).unwrap();
        match s.law() {
            ControlLaw::Collocation(c) => {
                assert_eq!(c.len(), 25);
                assert!(c.values().iter().all(|v| v.abs() <= 0.4));
            }
            other => panic!("unexpected law {other:?}"),
        }
        assert_eq!(s.name(), "collocation");
    }

    #[test]
    fn reattaching_to_another_scenario_rebuilds_knots() {
        let short = Arc::new(presets::short_hop().validate().unwrap());
        let long = scenario();
        let mut s = ControlStrategy::collocation(1.0, vec![0.0, 0.5]).unwrap();

        s.attach(&short);
        // Knot 1 sits at t_max(short) = 60 s
        assert_eq!(s.control(&obs_at(55.0, &short)).unwrap(), 0.5);

        s.attach(&long);
        // Grid now spans [0, 171.4]; 55 s is closest to the first knot
        assert_eq!(s.control(&obs_at(55.0, &long)).unwrap(), 0.0);
    }

    #[test]
    fn reattaching_to_same_scenario_keeps_cache() {
        let sc = scenario();
        let mut s = ControlStrategy::fitted_collocation(1.0, vec![0.0, 0.2, 0.1, 0.4]).unwrap();
        s.attach(&sc);
        s.control(&obs_at(10.0, &sc)).unwrap();
        s.attach(&sc);
        match s.law() {
            ControlLaw::Collocation(c) => assert_eq!(c.is_cached(), (true, true)),
            other => panic!("unexpected law {other:?}"),
        }
    }
}
