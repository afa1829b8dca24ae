use serde::{Deserialize, Serialize};

use crate::dynamics::state::{self, State};
use crate::error::{Result, SimError};

// ---------------------------------------------------------------------------
// Scenario parameters (raw construction input)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScenarioParams {
    pub x0: f64,     // m
    pub y0: f64,     // m
    pub v: f64,      // m/s, constant horizontal airspeed
    pub vz: f64,     // m/s, constant sink rate (positive = down)
    pub h0: f64,     // m, release altitude
    pub omega0: f64, // rad, initial heading
}

impl ScenarioParams {
    /// Validate and derive the fixed scenario duration.
    pub fn validate(self) -> Result<Scenario> {
        let fields = [
            ("x0", self.x0),
            ("y0", self.y0),
            ("v", self.v),
            ("vz", self.vz),
            ("h0", self.h0),
            ("omega0", self.omega0),
        ];
        if let Some((name, value)) = fields.iter().find(|(_, v)| !v.is_finite()) {
            return Err(SimError::config(format!("{name} must be finite, got {value}")));
        }
        if self.vz <= 0.0 {
            return Err(SimError::config(format!(
                "sink rate vz must be positive, got {}",
                self.vz
            )));
        }
        if self.h0 <= 0.0 {
            return Err(SimError::config(format!(
                "release altitude h0 must be positive, got {}",
                self.h0
            )));
        }
        Ok(Scenario { params: self, t_max: self.h0 / self.vz })
    }
}

impl Default for ScenarioParams {
    fn default() -> Self {
        presets::demo_drop()
    }
}

// ---------------------------------------------------------------------------
// Validated scenario
// ---------------------------------------------------------------------------

/// Scenario parameters that passed validation, with the derived duration.
/// Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    params: ScenarioParams,
    t_max: f64,
}

impl Scenario {
    pub fn params(&self) -> &ScenarioParams {
        &self.params
    }

    /// Time to touchdown: h0 / vz.
    pub fn t_max(&self) -> f64 {
        self.t_max
    }

    pub fn airspeed(&self) -> f64 {
        self.params.v
    }

    /// Altitude above ground at time `t` (negative past touchdown).
    pub fn altitude(&self, t: f64) -> f64 {
        self.params.h0 - self.params.vz * t
    }

    pub fn initial_state(&self) -> State {
        state::state(self.params.x0, self.params.y0, self.params.omega0)
    }
}

// ---------------------------------------------------------------------------
// Scenario builder
// ---------------------------------------------------------------------------

pub struct ScenarioBuilder {
    params: ScenarioParams,
}

impl ScenarioBuilder {
    pub fn new() -> Self {
        Self { params: presets::demo_drop() }
    }

    pub fn position(mut self, x0: f64, y0: f64) -> Self {
        self.params.x0 = x0;
        self.params.y0 = y0;
        self
    }
    pub fn airspeed(mut self, v: f64) -> Self { self.params.v = v; self }
    pub fn sink_rate(mut self, vz: f64) -> Self { self.params.vz = vz; self }
    pub fn altitude(mut self, h0: f64) -> Self { self.params.h0 = h0; self }
    pub fn heading(mut self, omega0: f64) -> Self { self.params.omega0 = omega0; self }

    pub fn params(self) -> ScenarioParams {
        self.params
    }

    pub fn build(self) -> Result<Scenario> {
        self.params.validate()
    }
}

impl Default for ScenarioBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Preset scenarios
// ---------------------------------------------------------------------------

pub mod presets {
    use super::ScenarioParams;

    /// Reference drop: released 1200 m up, 636 m from the target, heading -15 deg.
    pub fn demo_drop() -> ScenarioParams {
        ScenarioParams {
            x0: 450.0,
            y0: 450.0,
            v: 9.0,
            vz: 7.0,
            h0: 1200.0,
            omega0: (-15.0_f64).to_radians(),
        }
    }

    /// Low release close to the target, useful for short runs.
    pub fn short_hop() -> ScenarioParams {
        ScenarioParams {
            x0: -80.0,
            y0: 60.0,
            v: 8.0,
            vz: 5.0,
            h0: 300.0,
            omega0: 0.0,
        }
    }
}
