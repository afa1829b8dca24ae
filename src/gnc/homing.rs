use crate::dynamics::state::Observation;
use crate::math::wrap_to_pi;

// ---------------------------------------------------------------------------
// Homing guidance: steer toward the target at the origin
// ---------------------------------------------------------------------------

/// Margin on the straight-line closing time before the law starts steering.
pub const CLOSING_MARGIN: f64 = 1.1;

/// Raw homing turn-rate command (rad/s), before the outer clamp.
///
/// While there is comfortably more time left than needed to fly straight to
/// the target at `airspeed`, command a full-rate turn to loiter. Otherwise
/// command the bearing error to the origin.
pub fn homing_command(obs: &Observation, airspeed: f64, max_rate: f64) -> f64 {
    let closing_time = obs.distance_to_target() / airspeed;
    if obs.time_remaining >= CLOSING_MARGIN * closing_time {
        max_rate
    } else {
        bearing_error(obs)
    }
}

/// Wrapped angle from the current heading to the bearing of the origin.
pub fn bearing_error(obs: &Observation) -> f64 {
    let bearing = (-obs.y).atan2(-obs.x);
    wrap_to_pi(bearing - wrap_to_pi(obs.omega))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

    fn obs(x: f64, y: f64, omega: f64, time_remaining: f64) -> Observation {
        Observation {
            t: 0.0,
            x,
            y,
            omega,
            time_remaining,
            wind_x: 0.0,
            wind_y: 0.0,
        }
    }

    #[test]
    fn loiters_when_time_is_plentiful() {
        // 100 m at 10 m/s needs 10 s; 60 s remain
        assert_eq!(homing_command(&obs(100.0, 0.0, 0.0, 60.0), 10.0, 0.2), 0.2);
    }

    #[test]
    fn steers_toward_origin_when_time_is_short() {
        // Target due west, flying north: turn left by +90 deg
        let u = homing_command(&obs(100.0, 0.0, FRAC_PI_2, 5.0), 10.0, 0.2);
        assert_abs_diff_eq!(u, FRAC_PI_2, epsilon = 1e-12);
    }

    #[test]
    fn boundary_counts_as_plentiful() {
        let exact = CLOSING_MARGIN * (100.0 / 10.0);
        let u = homing_command(&obs(100.0, 0.0, 0.0, exact), 10.0, 0.3);
        assert_eq!(u, 0.3);
    }

    #[test]
    fn bearing_error_uses_wrapped_heading() {
        // Heading wound up by two full turns behaves like the plain heading
        let a = bearing_error(&obs(1.0, 1.0, PI + 4.0 * PI, 0.0));
        let b = bearing_error(&obs(1.0, 1.0, PI, 0.0));
        assert_abs_diff_eq!(a, b, epsilon = 1e-9);
        assert_abs_diff_eq!(b, -3.0 * FRAC_PI_4 - PI + 2.0 * PI, epsilon = 1e-9);
    }
}
