//! Tank and Sensor-Array Configuration
//!
//! A [`TankConfig`] fixes everything about the measurement geometry at
//! construction time: how many ring sensors surround the vessel, the
//! per-sensor scale factors that normalize each sensor's dynamic range, the
//! height one interior sensor band spans, the submersion threshold, and the
//! tank's capacity. Nothing here changes at runtime - sensor-count
//! reconfiguration is explicitly out of scope.
//!
//! The endpoint sensors (first and last index) physically cover half the
//! vertical span of an interior sensor, which is why capacity works out to
//! `(count - 1) * sensor_height` for a uniformly-spaced array.
//!
//! Two reference geometries from shipped hardware are provided as named
//! constructors: the 12-sensor ring array and the 2-band / 153 mm column.

use crate::errors::{ConfigError, ConfigResult};
use crate::fixed::{Q24F8, Q8F8};
use heapless::Vec;

/// Largest supported sensor array.
///
/// Bounds every per-sensor vector in the crate; the biggest reference
/// hardware is the 12-sensor ring array, so 16 leaves headroom without
/// bloating snapshots.
pub const MAX_SENSORS: usize = 16;

/// Measured Q8.8 scale table for the 12-sensor ring array.
///
/// The outermost rings sit closer to the vessel ends and read high, so they
/// are scaled up slightly to match the interior rings' full-scale counts.
const RING12_SCALES: [i16; 12] = [
    0x01D0, 0x0100, 0x0100, 0x0100, 0x0100, 0x0100, 0x0100, 0x0100, 0x0100, 0x0100, 0x0100,
    0x01C0,
];

/// Immutable sensor-array and tank geometry.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TankConfig {
    scales: Vec<Q8F8, MAX_SENSORS>,
    sensor_height: Q24F8,
    submersion_limit: i32,
    max_height_mm: i32,
    slope: Q8F8,
    offset: Q24F8,
}

impl TankConfig {
    /// Build a configuration from per-sensor scale factors.
    ///
    /// The number of scale factors *is* the sensor count and is fixed for
    /// the life of the process. `sensor_height` is the span of one interior
    /// band; `submersion_limit` is the processed-count threshold above which
    /// a sensor reads as wet; `max_height_mm` is tank capacity.
    pub fn new(
        scales: &[Q8F8],
        sensor_height: Q24F8,
        submersion_limit: i32,
        max_height_mm: i32,
    ) -> ConfigResult<Self> {
        if scales.is_empty() {
            return Err(ConfigError::NoSensors);
        }
        if max_height_mm <= 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        let scales = Vec::from_slice(scales).map_err(|()| ConfigError::TooManySensors {
            requested: scales.len(),
            max: MAX_SENSORS,
        })?;
        Ok(Self {
            scales,
            sensor_height,
            submersion_limit,
            max_height_mm,
            slope: Q8F8::ONE,
            offset: Q24F8::ZERO,
        })
    }

    /// Configuration with identity scaling on every sensor.
    pub fn uniform(
        count: usize,
        sensor_height: Q24F8,
        submersion_limit: i32,
        max_height_mm: i32,
    ) -> ConfigResult<Self> {
        if count == 0 {
            return Err(ConfigError::NoSensors);
        }
        if count > MAX_SENSORS {
            return Err(ConfigError::TooManySensors {
                requested: count,
                max: MAX_SENSORS,
            });
        }
        let mut scales: Vec<Q8F8, MAX_SENSORS> = Vec::new();
        for _ in 0..count {
            // Capacity checked above.
            let _ = scales.push(Q8F8::ONE);
        }
        Self::new(&scales, sensor_height, submersion_limit, max_height_mm)
    }

    /// The 12-sensor ring array with its measured scale table.
    pub fn ring_array_12(
        sensor_height: Q24F8,
        submersion_limit: i32,
        max_height_mm: i32,
    ) -> ConfigResult<Self> {
        let mut scales: Vec<Q8F8, MAX_SENSORS> = Vec::new();
        for bits in RING12_SCALES {
            let _ = scales.push(Q8F8::from_bits(bits));
        }
        Self::new(&scales, sensor_height, submersion_limit, max_height_mm)
    }

    /// The 2-band, 153 mm column. Both bands are endpoints, so one band
    /// spans the full 153 mm and the level reads empty, half, or full.
    pub fn two_band_153mm(submersion_limit: i32) -> ConfigResult<Self> {
        Self::uniform(2, Q24F8::from_int(153), submersion_limit, 153)
    }

    /// Apply a slope/offset trim to the aggregated level.
    ///
    /// Defaults to the identity (`1.0` slope, zero offset). The trim runs
    /// after aggregation and before boundary rounding, so a trimmed level
    /// still snaps to capacity when the array reads full.
    pub fn with_trim(mut self, slope: Q8F8, offset: Q24F8) -> Self {
        self.slope = slope;
        self.offset = offset;
        self
    }

    /// Number of sensors in the array.
    pub fn sensor_count(&self) -> usize {
        self.scales.len()
    }

    /// Per-sensor Q8.8 scale factors, one per sensor.
    pub fn scales(&self) -> &[Q8F8] {
        &self.scales
    }

    /// Height spanned by one interior sensor band.
    pub fn sensor_height(&self) -> Q24F8 {
        self.sensor_height
    }

    /// Processed-count threshold above which a sensor is submerged.
    pub fn submersion_limit(&self) -> i32 {
        self.submersion_limit
    }

    /// Tank capacity in whole millimetres.
    pub fn max_height_mm(&self) -> i32 {
        self.max_height_mm
    }

    /// Level trim slope (Q8.8, `1.0` = identity).
    pub fn slope(&self) -> Q8F8 {
        self.slope
    }

    /// Level trim offset.
    pub fn offset(&self) -> Q24F8 {
        self.offset
    }
}
