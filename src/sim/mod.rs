pub mod integrator;
pub mod parafoil;
pub mod trajectory;

pub use integrator::{solve, Solution, SolverStats, Tolerances};
pub use parafoil::Parafoil;
pub use trajectory::{Sample, Trajectory};
