pub mod wind;

pub use wind::{CalmWind, SteadyWind, WindField};
