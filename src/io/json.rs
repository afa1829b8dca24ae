use std::io::{BufReader, Write};

use serde::{Deserialize, Serialize};

use crate::dynamics::state::{X, Y};
use crate::error::Result;
use crate::sim::Trajectory;
use crate::vehicle::ScenarioParams;

/// Summary statistics computed from a descent trajectory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightSummary {
    pub strategy: String,
    pub samples: usize,
    pub flight_time: f64,      // s
    pub landing_x: f64,        // m
    pub landing_y: f64,        // m
    pub initial_distance: f64, // m, to the target at the origin
    pub miss_distance: f64,    // m, at touchdown
    pub max_turn_rate: f64,    // rad/s, largest |u| recorded
}

impl FlightSummary {
    /// Compute summary from trajectory data. `None` for an empty trajectory.
    pub fn from_trajectory(strategy: &str, trajectory: &Trajectory) -> Option<Self> {
        let (_, first) = trajectory.first()?;
        let (t_last, last) = trajectory.last()?;

        let max_turn_rate = trajectory
            .iter()
            .map(|(_, s)| s.control.abs())
            .fold(0.0_f64, f64::max);

        Some(FlightSummary {
            strategy: strategy.to_string(),
            samples: trajectory.len(),
            flight_time: t_last,
            landing_x: last.state[X],
            landing_y: last.state[Y],
            initial_distance: first.state[X].hypot(first.state[Y]),
            miss_distance: last.state[X].hypot(last.state[Y]),
            max_turn_rate,
        })
    }
}

#[derive(Serialize)]
struct SummaryDocument<'a> {
    scenario: &'a ScenarioParams,
    performance: &'a FlightSummary,
}

/// Write scenario and flight summary as pretty JSON to a writer.
pub fn write_summary<W: Write>(
    writer: &mut W,
    scenario: &ScenarioParams,
    summary: &FlightSummary,
) -> Result<()> {
    let doc = SummaryDocument { scenario, performance: summary };
    serde_json::to_writer_pretty(&mut *writer, &doc)?;
    writeln!(writer)?;
    Ok(())
}

/// Write flight summary JSON to a file.
pub fn write_summary_file(
    path: &str,
    scenario: &ScenarioParams,
    summary: &FlightSummary,
) -> Result<()> {
    let mut file = std::fs::File::create(path)?;
    write_summary(&mut file, scenario, summary)
}

/// Load scenario parameters from a JSON file. Validation happens when the
/// parafoil is built.
pub fn read_scenario_file(path: &str) -> Result<ScenarioParams> {
    let file = std::fs::File::open(path)?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamics::state::state;
    use crate::vehicle::presets;

    fn simple_trajectory() -> Trajectory {
        let mut traj = Trajectory::new();
        traj.append(0.0, state(30.0, 40.0, 0.0), state(5.0, 0.0, 0.1), 100.0, 0.1);
        traj.append(10.0, state(6.0, 8.0, 1.0), state(3.0, 4.0, -0.3), 50.0, -0.3);
        traj.append(20.0, state(3.0, 4.0, 2.0), state(0.0, 5.0, 0.2), 0.0, 0.2);
        traj
    }

    #[test]
    fn summary_computes_miss_distance() {
        let s = FlightSummary::from_trajectory("homing", &simple_trajectory()).unwrap();
        assert_eq!(s.samples, 3);
        assert_eq!(s.flight_time, 20.0);
        assert_eq!(s.initial_distance, 50.0);
        assert_eq!(s.miss_distance, 5.0);
        assert_eq!(s.max_turn_rate, 0.3);
    }

    #[test]
    fn empty_trajectory_has_no_summary() {
        assert!(FlightSummary::from_trajectory("zero", &Trajectory::new()).is_none());
    }

    #[test]
    fn json_output_is_valid() {
        let summary = FlightSummary::from_trajectory("homing", &simple_trajectory()).unwrap();
        let mut buf = Vec::new();
        write_summary(&mut buf, &presets::demo_drop(), &summary).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value["scenario"]["h0"], 1200.0);
        assert_eq!(value["performance"]["strategy"], "homing");
        assert_eq!(value["performance"]["miss_distance"], 5.0);
    }
}
