//! Empty-Offset Calibration State
//!
//! Each sensor has one signed offset: the raw count it reports while known
//! to be dry. Offsets are loaded from persistent storage at startup and
//! replaced only as a whole array, in one step, when a recalibration capture
//! fires - never element by element, and never from raw readings taken in
//! different scan cycles.
//!
//! Requesting a recalibration is side-effect free; it just arms a flag. The
//! scan-cycle controller applies the capture at the next cycle boundary so
//! the new offsets and the snapshot they came from are the same raw data.

use crate::config::MAX_SENSORS;
use crate::errors::{ConfigError, ConfigResult};
use heapless::Vec;

/// Per-sensor empty offsets plus the pending-recalibration flag.
#[derive(Debug, Clone)]
pub struct Calibration {
    offsets: Vec<i32, MAX_SENSORS>,
    pending: bool,
}

impl Calibration {
    /// Adopt offsets loaded from persistent storage.
    ///
    /// The stored array must have exactly one offset per configured sensor;
    /// anything else is a fatal configuration error - the engine must not
    /// run with partially-initialized offsets.
    pub fn from_stored(offsets: &[i32], sensor_count: usize) -> ConfigResult<Self> {
        if offsets.len() != sensor_count {
            return Err(ConfigError::SensorCountMismatch {
                expected: sensor_count,
                actual: offsets.len(),
            });
        }
        let offsets = Vec::from_slice(offsets).map_err(|()| ConfigError::TooManySensors {
            requested: sensor_count,
            max: MAX_SENSORS,
        })?;
        Ok(Self {
            offsets,
            pending: false,
        })
    }

    /// Start from all-zero offsets (uncalibrated array).
    pub fn zeroed(sensor_count: usize) -> ConfigResult<Self> {
        if sensor_count == 0 {
            return Err(ConfigError::NoSensors);
        }
        if sensor_count > MAX_SENSORS {
            return Err(ConfigError::TooManySensors {
                requested: sensor_count,
                max: MAX_SENSORS,
            });
        }
        let zeros = [0i32; MAX_SENSORS];
        Self::from_stored(&zeros[..sensor_count], sensor_count)
    }

    /// Current empty offsets, one per sensor.
    pub fn offsets(&self) -> &[i32] {
        &self.offsets
    }

    /// Arm the pending-recalibration flag. No hardware access here; the
    /// capture happens at the next scan-cycle boundary.
    pub fn request_recalibration(&mut self) {
        self.pending = true;
    }

    /// Whether a recalibration capture is armed.
    pub fn recalibration_pending(&self) -> bool {
        self.pending
    }

    /// Capture `current_raw` as the new empty offsets if a recalibration is
    /// pending.
    ///
    /// Returns `Ok(true)` when the offsets were replaced (the caller is then
    /// responsible for persisting them) and `Ok(false)` when nothing was
    /// armed. A length mismatch fails without touching the prior offsets and
    /// leaves the request armed for a well-formed later cycle.
    pub fn apply_recalibration(&mut self, current_raw: &[i32]) -> ConfigResult<bool> {
        if !self.pending {
            return Ok(false);
        }
        if current_raw.len() != self.offsets.len() {
            return Err(ConfigError::SensorCountMismatch {
                expected: self.offsets.len(),
                actual: current_raw.len(),
            });
        }
        let replacement = Vec::from_slice(current_raw).map_err(|()| {
            ConfigError::TooManySensors {
                requested: current_raw.len(),
                max: MAX_SENSORS,
            }
        })?;
        self.offsets = replacement;
        self.pending = false;
        Ok(true)
    }
}
