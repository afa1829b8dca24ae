//! Planar 4-DOF parafoil descent under a pluggable guidance law.
//!
//! A [`sim::Parafoil`] owns the scenario, the active [`gnc::ControlStrategy`]
//! and a [`physics::WindField`]. `simulate` integrates the descent with an
//! adaptive Dormand-Prince solver and records a [`sim::Trajectory`].

pub mod dynamics;
pub mod error;
pub mod gnc;
pub mod io;
pub mod math;
pub mod physics;
pub mod sim;
pub mod vehicle;

pub use error::{Result, SimError};
pub use gnc::ControlStrategy;
pub use sim::{Parafoil, Trajectory};
pub use vehicle::{presets, ScenarioParams};
