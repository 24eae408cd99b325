//! Error Types for Level-Engine Configuration Failures
//!
//! The error surface of this crate is deliberately narrow. Per-cycle numeric
//! conditions (negative diffs after a bad calibration, saturated processed
//! values from a shorted channel) are absorbed by the classification logic
//! and never surface as errors. What remains is configuration consistency:
//! the sensor count is fixed for the life of the process, and every array
//! that crosses a component boundary — stored offsets, a raw snapshot, a
//! scale table — must match it exactly. A mismatch at startup is fatal; the
//! engine must not run on partially-initialized offsets.
//!
//! Errors follow the same constraints as the rest of the crate: `Copy`,
//! inline fields only, no heap, small enough to return from hot paths.

use thiserror_no_std::Error;

/// Result type for configuration and calibration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration consistency errors - fatal at startup.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// An array's length disagrees with the configured sensor count.
    #[error("expected {expected} sensor values, got {actual}")]
    SensorCountMismatch {
        /// Sensor count fixed by the configuration
        expected: usize,
        /// Length of the offending array
        actual: usize,
    },

    /// The configuration names no sensors at all.
    #[error("sensor array is empty")]
    NoSensors,

    /// More sensors than the crate's fixed capacity bound.
    #[error("{requested} sensors exceeds supported maximum {max}")]
    TooManySensors {
        /// Requested sensor count
        requested: usize,
        /// Compile-time capacity bound ([`crate::MAX_SENSORS`])
        max: usize,
    },

    /// Tank capacity must be a positive height.
    #[error("tank capacity must be positive")]
    ZeroCapacity,
}

#[cfg(feature = "defmt")]
impl defmt::Format for ConfigError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::SensorCountMismatch { expected, actual } => {
                defmt::write!(fmt, "expected {} sensor values, got {}", expected, actual)
            }
            Self::NoSensors => defmt::write!(fmt, "sensor array is empty"),
            Self::TooManySensors { requested, max } => {
                defmt::write!(fmt, "{} sensors exceeds supported maximum {}", requested, max)
            }
            Self::ZeroCapacity => defmt::write!(fmt, "tank capacity must be positive"),
        }
    }
}
