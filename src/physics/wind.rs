use nalgebra::Vector2;

// ---------------------------------------------------------------------------
// Wind field interface
// ---------------------------------------------------------------------------

/// Horizontal wind model queried by the equations of motion.
///
/// Implementations must be pure functions of their inputs: the solver may
/// call them repeatedly, at the same or out-of-order times.
pub trait WindField {
    /// Wind vector [wind_x, wind_y] in m/s at time `t`, `altitude` and (x, y).
    fn wind_vector(&self, t: f64, altitude: f64, x: f64, y: f64) -> Vector2<f64>;

    /// Human-readable name for logging/display.
    fn name(&self) -> &str {
        "unnamed"
    }
}

/// No wind anywhere. Installed by default.
#[derive(Debug, Clone, Copy, Default)]
pub struct CalmWind;

impl WindField for CalmWind {
    fn wind_vector(&self, _t: f64, _altitude: f64, _x: f64, _y: f64) -> Vector2<f64> {
        Vector2::zeros()
    }

    fn name(&self) -> &str {
        "calm"
    }
}

/// Constant wind, identical at every time, altitude and position.
#[derive(Debug, Clone, Copy)]
pub struct SteadyWind {
    pub velocity: Vector2<f64>, // m/s [x, y]
}

impl SteadyWind {
    pub fn new(wind_x: f64, wind_y: f64) -> Self {
        Self { velocity: Vector2::new(wind_x, wind_y) }
    }
}

impl WindField for SteadyWind {
    fn wind_vector(&self, _t: f64, _altitude: f64, _x: f64, _y: f64) -> Vector2<f64> {
        self.velocity
    }

    fn name(&self) -> &str {
        "steady"
    }
}
