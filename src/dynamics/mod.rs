pub mod state;

pub use state::{Deriv, Observation, State};
