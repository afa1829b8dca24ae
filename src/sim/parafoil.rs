use std::sync::Arc;

use log::info;

use super::integrator::{self, Tolerances};
use super::trajectory::Trajectory;
use crate::dynamics::state::{Deriv, Observation, State, OMEGA, X, Y};
use crate::error::{Result, SimError};
use crate::gnc::ControlStrategy;
use crate::math::linspace;
use crate::physics::wind::{CalmWind, WindField};
use crate::vehicle::{Scenario, ScenarioParams};

// ---------------------------------------------------------------------------
// Parafoil model: scenario + guidance + wind + integration state
// ---------------------------------------------------------------------------

/// Planar parafoil descending at constant airspeed and sink rate.
///
/// Equations of motion:
///   dx/dt     = v cos(omega) + wind_x
///   dy/dt     = v sin(omega) + wind_y
///   domega/dt = u   (commanded turn rate from the control strategy)
///
/// Only [`Parafoil::step`], [`Parafoil::simulate`] and [`Parafoil::reset`]
/// move `(t, state)`.
pub struct Parafoil {
    scenario: Arc<Scenario>,
    strategy: ControlStrategy,
    wind: Box<dyn WindField>,
    tolerances: Tolerances,
    t: f64,
    state: State,
}

impl Parafoil {
    /// Build from raw parameters. Fails on vz <= 0, h0 <= 0 or non-finite input.
    pub fn new(params: ScenarioParams) -> Result<Self> {
        Ok(Self::from_scenario(params.validate()?))
    }

    pub fn from_scenario(scenario: Scenario) -> Self {
        let scenario = Arc::new(scenario);
        let mut strategy = ControlStrategy::stock();
        strategy.attach(&scenario);
        let state = scenario.initial_state();
        Self {
            scenario,
            strategy,
            wind: Box::new(CalmWind),
            tolerances: Tolerances::default(),
            t: 0.0,
            state,
        }
    }

    pub fn with_strategy(mut self, strategy: ControlStrategy) -> Self {
        self.set_strategy(strategy);
        self
    }

    pub fn with_wind(mut self, wind: impl WindField + 'static) -> Self {
        self.wind = Box::new(wind);
        self
    }

    pub fn with_tolerances(mut self, tolerances: Tolerances) -> Result<Self> {
        tolerances.validate()?;
        self.tolerances = tolerances;
        Ok(self)
    }

    /// Install a new strategy and return the previous one, detached.
    pub fn set_strategy(&mut self, mut strategy: ControlStrategy) -> ControlStrategy {
        strategy.attach(&self.scenario);
        let mut previous = std::mem::replace(&mut self.strategy, strategy);
        previous.detach();
        previous
    }

    pub fn set_wind(&mut self, wind: Box<dyn WindField>) {
        self.wind = wind;
    }

    pub fn strategy(&self) -> &ControlStrategy {
        &self.strategy
    }

    pub fn wind(&self) -> &dyn WindField {
        self.wind.as_ref()
    }

    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    pub fn tolerances(&self) -> &Tolerances {
        &self.tolerances
    }

    pub fn t_max(&self) -> f64 {
        self.scenario.t_max()
    }

    pub fn time(&self) -> f64 {
        self.t
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn initial_state(&self) -> State {
        self.scenario.initial_state()
    }

    /// Altitude at the current time.
    pub fn height(&self) -> f64 {
        self.scenario.altitude(self.t)
    }

    // -----------------------------------------------------------------------
    // Right-hand side
    // -----------------------------------------------------------------------

    /// What the control strategy sees at `(t, state)`.
    pub fn observe(&self, t: f64, state: &State) -> Observation {
        let wind = self.wind_at(t, state);
        Observation::new(t, state, self.scenario.t_max(), wind)
    }

    /// Clamped turn-rate command at `(t, state)`.
    pub fn control_at(&self, t: f64, state: &State) -> Result<f64> {
        self.strategy.control(&self.observe(t, state))
    }

    /// State derivative at `(t, state)`. Does not touch the model's own state.
    pub fn ode_function(&self, t: f64, state: &State) -> Result<Deriv> {
        let v = self.scenario.airspeed();
        let wind = self.wind_at(t, state);
        let obs = Observation::new(t, state, self.scenario.t_max(), wind);
        let u = self.strategy.control(&obs)?;
        let omega = state[OMEGA];
        Ok(Deriv::new(
            v * omega.cos() + wind.x,
            v * omega.sin() + wind.y,
            u,
        ))
    }

    /// Derivative at the current `(t, state)`.
    pub fn derivative(&self) -> Result<Deriv> {
        self.ode_function(self.t, &self.state)
    }

    /// Control at the current `(t, state)`.
    pub fn control(&self) -> Result<f64> {
        self.control_at(self.t, &self.state)
    }

    fn wind_at(&self, t: f64, state: &State) -> nalgebra::Vector2<f64> {
        self.wind
            .wind_vector(t, self.scenario.altitude(t), state[X], state[Y])
    }

    // -----------------------------------------------------------------------
    // Integration
    // -----------------------------------------------------------------------

    /// Back to t = 0 and the initial state.
    pub fn reset(&mut self) {
        self.t = 0.0;
        self.state = self.scenario.initial_state();
    }

    /// Advance `(t, state)` by exactly `dt` seconds.
    pub fn step(&mut self, dt: f64) -> Result<()> {
        if !(dt > 0.0) || !dt.is_finite() {
            return Err(SimError::config(format!("step dt must be positive and finite, got {dt}")));
        }
        let t_end = self.t + dt;
        let sol = integrator::solve(
            |t, y| self.ode_function(t, y),
            self.t,
            t_end,
            self.state,
            &[t_end],
            &self.tolerances,
        )?;
        let y = sol.y.last().copied().ok_or_else(|| SimError::Integration {
            t: self.t,
            reason: "solver returned no sample".into(),
        })?;
        self.t = t_end;
        self.state = y;
        Ok(())
    }

    /// Integrate the whole descent `[0, t_max]` and record `n` evenly spaced
    /// samples. The model is reset before and after, whatever the outcome.
    pub fn simulate(&mut self, n: usize) -> Result<Trajectory> {
        self.reset();
        info!(
            "simulate: {} samples over [0, {:.3}] s with '{}' strategy, '{}' wind",
            n,
            self.t_max(),
            self.strategy.name(),
            self.wind.name()
        );
        let result = self.record(n);
        self.reset();
        if let Ok(traj) = &result {
            if let Some((t, last)) = traj.last() {
                info!(
                    "simulate: touchdown t = {:.3} s at ({:.2}, {:.2}) m",
                    t, last.state[X], last.state[Y]
                );
            }
        }
        result
    }

    fn record(&mut self, n: usize) -> Result<Trajectory> {
        let t_eval = linspace(0.0, self.t_max(), n);
        let sol = integrator::solve(
            |t, y| self.ode_function(t, y),
            0.0,
            self.t_max(),
            self.initial_state(),
            &t_eval,
            &self.tolerances,
        )?;

        let mut traj = Trajectory::with_capacity(sol.t.len());
        for (ti, yi) in sol.t.iter().zip(&sol.y) {
            self.t = *ti;
            self.state = *yi;
            traj.append(self.t, self.state, self.derivative()?, self.height(), self.control()?);
        }
        Ok(traj)
    }
}
