use std::io::{self, Write};

use crate::sim::trajectory::{Trajectory, COLUMNS};

/// Write trajectory data to CSV format.
///
/// Columns: t, x, y, omega, dx, dy, domega, height, u
///
/// Values use the shortest representation that parses back to the same
/// `f64`, so the export is lossless.
pub fn write_trajectory<W: Write>(writer: &mut W, trajectory: &Trajectory) -> io::Result<()> {
    writeln!(writer, "{}", COLUMNS.join(","))?;

    for row in trajectory.rows() {
        let fields: Vec<String> = row.iter().map(|v| v.to_string()).collect();
        writeln!(writer, "{}", fields.join(","))?;
    }

    Ok(())
}

/// Write trajectory to a CSV file at the given path.
pub fn write_trajectory_file(path: &str, trajectory: &Trajectory) -> io::Result<()> {
    let mut file = io::BufWriter::new(std::fs::File::create(path)?);
    write_trajectory(&mut file, trajectory)?;
    file.flush()
}
