use nalgebra::Vector2;

use parafoil_sim::dynamics::state::{X, Y};
use parafoil_sim::physics::WindField;
use parafoil_sim::sim::Parafoil;
use parafoil_sim::vehicle::presets;
use parafoil_sim::ControlStrategy;

/// Wind that veers from westerly aloft to southerly near the ground.
struct VeeringWind {
    speed: f64,
    release_altitude: f64,
}

impl WindField for VeeringWind {
    fn wind_vector(&self, _t: f64, altitude: f64, _x: f64, _y: f64) -> Vector2<f64> {
        let frac = (altitude / self.release_altitude).clamp(0.0, 1.0);
        let direction = std::f64::consts::FRAC_PI_2 * (1.0 - frac);
        Vector2::new(direction.cos(), direction.sin()) * self.speed
    }

    fn name(&self) -> &str {
        "veering"
    }
}

fn main() -> anyhow::Result<()> {
    let params = presets::demo_drop();
    let wind = VeeringWind { speed: 2.0, release_altitude: params.h0 };

    let mut parafoil = Parafoil::new(params)?
        .with_wind(wind)
        .with_strategy(ControlStrategy::homing(10.0_f64.to_radians())?);

    println!("Simulating with {} wind...", parafoil.wind().name());
    let trajectory = parafoil.simulate(500)?;

    if let Some((t, last)) = trajectory.last() {
        let miss = last.state[X].hypot(last.state[Y]);
        println!("Touchdown: t = {t:.1} s at ({:.1}, {:.1}) m", last.state[X], last.state[Y]);
        println!("Miss distance: {miss:.1} m");
    }
    println!("Trajectory points: {}", trajectory.len());
    Ok(())
}
