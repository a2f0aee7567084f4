//! Error types for definition building and simulation runs.

use thiserror::Error;

/// Configuration error with field path and constraint description.
///
/// Raised while building calendars, appliances and archetypes, always before
/// any randomized work starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"archetypes[0].appliances[1].power_w"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Prefixes the field path with an enclosing path segment.
    ///
    /// ```
    /// use ramp_sim::error::ConfigError;
    ///
    /// let err = ConfigError::new("power_w", "must be > 0").within("appliances[2]");
    /// assert_eq!(err.field, "appliances[2].power_w");
    /// ```
    pub fn within(mut self, parent: &str) -> Self {
        self.field = if self.field.is_empty() {
            parent.to_string()
        } else {
            format!("{parent}.{}", self.field)
        };
        self
    }
}

/// Failure of a simulation run.
///
/// No partial result is ever returned alongside one of these.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// An internal consistency check failed after validation had passed.
    #[error("simulation invariant violated: {0}")]
    Invariant(String),
    #[error("simulation cancelled")]
    Cancelled,
}
