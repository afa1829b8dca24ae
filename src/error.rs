use thiserror::Error;

/// Errors raised by the simulation core and its export layer.
#[derive(Debug, Error)]
pub enum SimError {
    /// Invalid scenario, strategy or solver parameters. Raised at construction.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A control strategy was evaluated before being attached to a parafoil.
    #[error("control strategy is not attached to a parafoil")]
    NotAttached,

    /// Trajectory queried at a time that was never recorded.
    #[error("no trajectory sample recorded at t = {t}")]
    Lookup { t: f64 },

    /// The adaptive solver could not advance within tolerance.
    #[error("integration failed at t = {t}: {reason}")]
    Integration { t: f64, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SimError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        SimError::Configuration(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, SimError>;
