pub mod collocation;
pub mod homing;
pub mod spline;
pub mod strategy;

pub use collocation::{Collocation, Interpolation};
pub use homing::homing_command;
pub use spline::CubicSpline;
pub use strategy::{ControlLaw, ControlStrategy, DEFAULT_MAX_TURN_RATE};
