pub mod scenario;

pub use scenario::{presets, Scenario, ScenarioBuilder, ScenarioParams};
