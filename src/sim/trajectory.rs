use std::collections::HashMap;

use crate::dynamics::state::{Deriv, State, OMEGA, X, Y};
use crate::error::{Result, SimError};

/// Column names of the flat export, in row order.
pub const COLUMNS: [&str; 9] = ["t", "x", "y", "omega", "dx", "dy", "domega", "height", "u"];

// ---------------------------------------------------------------------------
// One recorded instant
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub state: State,
    pub deriv: Deriv,
    pub altitude: f64, // m
    pub control: f64,  // rad/s, applied turn rate
}

// ---------------------------------------------------------------------------
// Trajectory: time-keyed samples in insertion order
// ---------------------------------------------------------------------------

/// Time history produced by `Parafoil::simulate`.
///
/// Lookup is by exact time key, no interpolation. Appending an existing key
/// replaces that sample in place.
#[derive(Debug, Clone, Default)]
pub struct Trajectory {
    times: Vec<f64>,
    samples: Vec<Sample>,
    index: HashMap<u64, usize>,
}

impl Trajectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(n: usize) -> Self {
        Self {
            times: Vec::with_capacity(n),
            samples: Vec::with_capacity(n),
            index: HashMap::with_capacity(n),
        }
    }

    pub fn append(&mut self, t: f64, state: State, deriv: Deriv, altitude: f64, control: f64) {
        let sample = Sample { state, deriv, altitude, control };
        match self.index.get(&key(t)) {
            Some(&i) => self.samples[i] = sample,
            None => {
                self.index.insert(key(t), self.times.len());
                self.times.push(t);
                self.samples.push(sample);
            }
        }
    }

    /// Sample recorded at exactly `t`.
    pub fn query(&self, t: f64) -> Result<&Sample> {
        self.index
            .get(&key(t))
            .map(|&i| &self.samples[i])
            .ok_or(SimError::Lookup { t })
    }

    /// Recorded time keys in insertion order.
    pub fn time_range(&self) -> impl Iterator<Item = f64> + '_ {
        self.times.iter().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, &Sample)> + '_ {
        self.times.iter().copied().zip(self.samples.iter())
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn first(&self) -> Option<(f64, &Sample)> {
        self.iter().next()
    }

    pub fn last(&self) -> Option<(f64, &Sample)> {
        self.times.last().copied().zip(self.samples.last())
    }

    /// Flat rows `(t, x, y, omega, dx, dy, domega, height, u)`, see [`COLUMNS`].
    pub fn rows(&self) -> impl Iterator<Item = [f64; 9]> + '_ {
        self.iter().map(|(t, s)| {
            [
                t,
                s.state[X],
                s.state[Y],
                s.state[OMEGA],
                s.deriv[X],
                s.deriv[Y],
                s.deriv[OMEGA],
                s.altitude,
                s.control,
            ]
        })
    }
}

/// Hash key for a time value; +0.0 and -0.0 map to the same sample.
fn key(t: f64) -> u64 {
    if t == 0.0 {
        0.0_f64.to_bits()
    } else {
        t.to_bits()
    }
}
