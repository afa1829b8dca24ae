use nalgebra::{Vector2, Vector3};

// ---------------------------------------------------------------------------
// 4-DOF planar state: horizontal position and heading
// ---------------------------------------------------------------------------

/// Integrated state `[x, y, omega]`: position (m) and heading (rad).
///
/// Altitude is not integrated; it follows from the constant sink rate.
pub type State = Vector3<f64>;

/// Time derivative of [`State`]: `[dx/dt, dy/dt, domega/dt]`.
pub type Deriv = Vector3<f64>;

pub const X: usize = 0;
pub const Y: usize = 1;
pub const OMEGA: usize = 2;

/// Build a state vector from its components.
pub fn state(x: f64, y: f64, omega: f64) -> State {
    Vector3::new(x, y, omega)
}

// ---------------------------------------------------------------------------
// Observation: everything a control strategy is allowed to see
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub t: f64,              // s
    pub x: f64,              // m
    pub y: f64,              // m
    pub omega: f64,          // rad, unwrapped heading as integrated
    pub time_remaining: f64, // s, t_max - t (negative past touchdown)
    pub wind_x: f64,         // m/s
    pub wind_y: f64,         // m/s
}

impl Observation {
    pub fn new(t: f64, state: &State, t_max: f64, wind: Vector2<f64>) -> Self {
        Self {
            t,
            x: state[X],
            y: state[Y],
            omega: state[OMEGA],
            time_remaining: t_max - t,
            wind_x: wind.x,
            wind_y: wind.y,
        }
    }

    /// Horizontal distance to the target at the origin.
    pub fn distance_to_target(&self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Flat 7-tuple `(t, x, y, omega, time_remaining, wind_x, wind_y)`.
    pub fn to_array(&self) -> [f64; 7] {
        [
            self.t,
            self.x,
            self.y,
            self.omega,
            self.time_remaining,
            self.wind_x,
            self.wind_y,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observation_from_state() {
        let s = state(3.0, 4.0, 0.5);
        let obs = Observation::new(10.0, &s, 30.0, Vector2::new(1.0, -2.0));
        assert_eq!(obs.time_remaining, 20.0);
        assert_eq!(obs.distance_to_target(), 5.0);
        assert_eq!(obs.to_array(), [10.0, 3.0, 4.0, 0.5, 20.0, 1.0, -2.0]);
    }
}
