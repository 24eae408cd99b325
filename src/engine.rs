//! Level Engine - Normalization, Submersion Classification, Aggregation
//!
//! ## Overview
//!
//! [`LevelEngine`] turns one scan cycle's raw counts into a [`Snapshot`]:
//!
//! ```text
//! raw[i] ──► diff[i] = raw[i] - empty_offset[i]
//!        ──► processed[i] = (diff[i] * scale[i]) >> 8
//!        ──► submerged iff processed[i] > submersion_limit
//!        ──► weighted count (endpoints 1, interior 2)
//!        ──► level height, boundary rounding, percent of capacity
//! ```
//!
//! ## Weighting
//!
//! The first and last sensor bands physically cover half the vertical span
//! of an interior band, so weights are counted in half-heights: an endpoint
//! contributes 1, an interior sensor 2, and each weight unit is worth
//! `sensor_height / 2` of liquid. Keeping the unit at a half-height keeps
//! every intermediate value integral.
//!
//! A single-sensor array is its own first *and* last index; the endpoint
//! rule applies and such an array can only ever report zero or half a
//! sensor height. That is a boundary limitation of the geometry, preserved
//! rather than special-cased.
//!
//! ## Boundary rounding
//!
//! Fixed-point truncation can leave an all-wet array a hair under capacity,
//! so any level within a quarter sensor-height of capacity snaps to exactly
//! `max_height_mm`. The same rule caps a level that aggregates past
//! capacity, which keeps the never-exceeds-capacity invariant.
//!
//! No clamping happens earlier than that: a hardware fault producing huge
//! raw counts simply saturates and reads as "submerged", and a negative
//! diff from drift or mis-calibration reads as "dry". Neither is an error.

use crate::calibration::Calibration;
use crate::config::{TankConfig, MAX_SENSORS};
use crate::errors::{ConfigError, ConfigResult};
use crate::fixed::Q24F8;
use heapless::Vec;

/// One scan cycle's derived state, republished as a single value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Snapshot {
    /// Raw counts as read from the sensing hardware.
    pub raw: Vec<i32, MAX_SENSORS>,
    /// Raw counts minus the empty offsets (signed; may be negative).
    pub diff: Vec<i32, MAX_SENSORS>,
    /// Diff counts rescaled per sensor, in raw-count units.
    pub processed: Vec<i32, MAX_SENSORS>,
    /// Weighted count of submerged sensors, in half-height units.
    pub submerged_count: u8,
    /// Liquid level above the tank floor.
    pub level_height: Q24F8,
    /// Level as a percentage of tank capacity.
    pub level_percent: Q24F8,
}

#[cfg(feature = "defmt")]
impl defmt::Format for Snapshot {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(
            fmt,
            "Snapshot {{ submerged: {}, height: {} mm, percent: {} }}",
            self.submerged_count,
            self.level_height,
            self.level_percent
        );
    }
}

/// Owns the configuration and calibration, computes snapshots.
#[derive(Debug, Clone)]
pub struct LevelEngine {
    config: TankConfig,
    calibration: Calibration,
    latest: Option<Snapshot>,
}

impl LevelEngine {
    /// Build an engine from a validated configuration and calibration.
    ///
    /// The calibration must already match the configuration's sensor count;
    /// [`Calibration::from_stored`] enforces that at load time.
    pub fn new(config: TankConfig, calibration: Calibration) -> Self {
        Self {
            config,
            calibration,
            latest: None,
        }
    }

    /// The immutable array configuration.
    pub fn config(&self) -> &TankConfig {
        &self.config
    }

    /// Current empty offsets, one per sensor.
    pub fn offsets(&self) -> &[i32] {
        self.calibration.offsets()
    }

    /// Arm a recalibration capture for the next cycle boundary.
    pub fn request_recalibration(&mut self) {
        self.calibration.request_recalibration();
    }

    /// Whether a recalibration capture is armed.
    pub fn recalibration_pending(&self) -> bool {
        self.calibration.recalibration_pending()
    }

    /// Apply an armed recalibration using this cycle's raw snapshot.
    ///
    /// Returns `Ok(true)` when new offsets were captured and must be
    /// persisted by the caller.
    pub fn apply_pending_recalibration(&mut self, current_raw: &[i32]) -> ConfigResult<bool> {
        self.calibration.apply_recalibration(current_raw)
    }

    /// The most recently computed snapshot, if any cycle has completed.
    pub fn latest(&self) -> Option<&Snapshot> {
        self.latest.as_ref()
    }

    /// Compute the snapshot for one completed scan cycle.
    ///
    /// `raw` must hold exactly one count per configured sensor. On error the
    /// previous snapshot is left in place.
    pub fn process(&mut self, raw: &[i32]) -> ConfigResult<&Snapshot> {
        let count = self.config.sensor_count();
        if raw.len() != count {
            return Err(ConfigError::SensorCountMismatch {
                expected: count,
                actual: raw.len(),
            });
        }

        let raw_values = Vec::from_slice(raw).map_err(|()| ConfigError::TooManySensors {
            requested: raw.len(),
            max: MAX_SENSORS,
        })?;

        let mut diff: Vec<i32, MAX_SENSORS> = Vec::new();
        let mut processed: Vec<i32, MAX_SENSORS> = Vec::new();
        let mut submerged_count: u8 = 0;

        for (index, (&sample, &offset)) in
            raw.iter().zip(self.calibration.offsets()).enumerate()
        {
            let delta = sample.wrapping_sub(offset);
            let normalized = self.config.scales()[index].apply(delta);
            // Lengths match the configured count, which is capped at
            // MAX_SENSORS by construction.
            let _ = diff.push(delta);
            let _ = processed.push(normalized);
            if normalized > self.config.submersion_limit() {
                submerged_count += weight_of(index, count);
            }
        }

        let level_height = self.aggregate(submerged_count);
        let level_percent = level_height.percent_of(self.config.max_height_mm());

        Ok(self.latest.insert(Snapshot {
            raw: raw_values,
            diff,
            processed,
            submerged_count,
            level_height,
            level_percent,
        }))
    }

    /// Weighted count to physical height, trimmed and boundary-rounded.
    fn aggregate(&self, submerged_count: u8) -> Q24F8 {
        let half_height = self.config.sensor_height().halved();
        let mut level = half_height.saturating_mul_int(submerged_count as i32);
        level = level.scaled_by(self.config.slope()) + self.config.offset();

        let full = Q24F8::from_int(self.config.max_height_mm());
        if level > full - self.config.sensor_height().quartered() {
            level = full;
        }
        level
    }
}

/// Contribution of one submerged sensor, in half-height units.
///
/// Endpoints span half the height of interior bands. With a single sensor
/// the endpoint rule wins.
fn weight_of(index: usize, count: usize) -> u8 {
    if index == 0 || index + 1 == count {
        1
    } else {
        2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed::Q8F8;

    fn engine(count: usize, height_mm: i32, limit: i32, max_mm: i32) -> LevelEngine {
        let config =
            TankConfig::uniform(count, Q24F8::from_int(height_mm), limit, max_mm).unwrap();
        let calibration = Calibration::zeroed(count).unwrap();
        LevelEngine::new(config, calibration)
    }

    #[test]
    fn identity_scale_and_zero_offset_pass_raw_through() {
        let mut engine = engine(4, 50, 500, 150);
        let snapshot = engine.process(&[12, -7, 0, 300]).unwrap();
        assert_eq!(snapshot.processed, snapshot.raw);
        assert_eq!(snapshot.diff, snapshot.raw);
    }

    #[test]
    fn negative_diff_reads_dry_not_error() {
        let config = TankConfig::uniform(2, Q24F8::from_int(100), 500, 100).unwrap();
        let calibration = Calibration::from_stored(&[600, 600], 2).unwrap();
        let mut engine = LevelEngine::new(config, calibration);
        let snapshot = engine.process(&[40, 550]).unwrap();
        assert_eq!(snapshot.diff.as_slice(), &[-560, -50]);
        assert_eq!(snapshot.submerged_count, 0);
        assert_eq!(snapshot.level_height, Q24F8::ZERO);
    }

    #[test]
    fn all_dry_reports_zero() {
        let mut engine = engine(4, 50, 500, 150);
        let snapshot = engine.process(&[0, 0, 0, 0]).unwrap();
        assert_eq!(snapshot.submerged_count, 0);
        assert_eq!(snapshot.level_height, Q24F8::ZERO);
        assert_eq!(snapshot.level_percent, Q24F8::ZERO);
    }

    #[test]
    fn all_wet_reports_exact_capacity() {
        let mut engine = engine(4, 50, 500, 150);
        let snapshot = engine.process(&[501, 501, 501, 501]).unwrap();
        assert_eq!(snapshot.submerged_count, 6);
        assert_eq!(snapshot.level_height, Q24F8::from_int(150));
        assert_eq!(snapshot.level_percent, Q24F8::from_int(100));
    }

    #[test]
    fn snap_compensates_halving_truncation() {
        // An odd-bit sensor height loses a bit in the halving; the snap
        // still lands the all-wet reading on capacity exactly.
        let config = TankConfig::uniform(5, Q24F8::from_bits(15357), 500, 240).unwrap();
        let mut engine = LevelEngine::new(config, Calibration::zeroed(5).unwrap());
        let snapshot = engine.process(&[9000; 5]).unwrap();
        assert_eq!(snapshot.submerged_count, 8);
        // 8 * (15357 >> 1) = 61424 bits, 16 bits shy of 240 mm
        assert_eq!(snapshot.level_height, Q24F8::from_int(240));
        assert_eq!(snapshot.level_percent, Q24F8::from_int(100));
    }

    #[test]
    fn overshooting_aggregate_is_capped_at_capacity() {
        // Capacity configured below what the stack can aggregate to.
        let mut engine = engine(4, 50, 500, 120);
        let snapshot = engine.process(&[501, 501, 501, 501]).unwrap();
        assert_eq!(snapshot.level_height, Q24F8::from_int(120));
    }

    #[test]
    fn endpoint_weighs_half_of_interior() {
        let mut engine = engine(4, 50, 500, 150);
        // Only sensor 0 (endpoint): half a sensor height.
        let snapshot = engine.process(&[501, 0, 0, 0]).unwrap();
        assert_eq!(snapshot.submerged_count, 1);
        assert_eq!(snapshot.level_height, Q24F8::from_int(25));
        // Only sensor 1 (interior): a full sensor height.
        let snapshot = engine.process(&[0, 501, 0, 0]).unwrap();
        assert_eq!(snapshot.submerged_count, 2);
        assert_eq!(snapshot.level_height, Q24F8::from_int(50));
    }

    #[test]
    fn single_sensor_reports_at_most_half_height() {
        // One sensor is both first and last; the endpoint rule applies.
        let mut engine = engine(1, 100, 500, 100);
        let snapshot = engine.process(&[501]).unwrap();
        assert_eq!(snapshot.submerged_count, 1);
        assert_eq!(snapshot.level_height, Q24F8::from_int(50));
        assert_eq!(snapshot.level_percent, Q24F8::from_int(50));
    }

    #[test]
    fn threshold_is_strict() {
        let mut engine = engine(2, 100, 500, 100);
        let snapshot = engine.process(&[500, 501]).unwrap();
        // Exactly at the limit stays dry; one past it is wet.
        assert_eq!(snapshot.submerged_count, 1);
    }

    #[test]
    fn two_sensor_reference_scenario() {
        // 2 sensors, 100.0 mm unit height, limit 500, 100 mm capacity.
        let config =
            TankConfig::uniform(2, Q24F8::from_bits(25600), 500, 100).unwrap();
        let mut engine = LevelEngine::new(config, Calibration::zeroed(2).unwrap());

        let snapshot = engine.process(&[0, 0]).unwrap();
        assert_eq!(snapshot.processed.as_slice(), &[0, 0]);
        assert_eq!(snapshot.level_height, Q24F8::ZERO);
        assert_eq!(snapshot.level_percent, Q24F8::ZERO);

        let snapshot = engine.process(&[1000, 1000]).unwrap();
        assert_eq!(snapshot.processed.as_slice(), &[1000, 1000]);
        assert_eq!(snapshot.submerged_count, 2);
        assert_eq!(snapshot.level_height.to_bits(), 25600);
        assert_eq!(snapshot.level_percent, Q24F8::from_int(100));
    }

    #[test]
    fn per_sensor_scale_normalizes_dynamic_range() {
        // A sensor reading at half range with a 2.0 scale matches its peers.
        let scales = [Q8F8::from_bits(0x0200), Q8F8::ONE];
        let config = TankConfig::new(&scales, Q24F8::from_int(100), 500, 100).unwrap();
        let mut engine = LevelEngine::new(config, Calibration::zeroed(2).unwrap());
        let snapshot = engine.process(&[300, 600]).unwrap();
        assert_eq!(snapshot.processed.as_slice(), &[600, 600]);
        assert_eq!(snapshot.submerged_count, 2);
    }

    #[test]
    fn trim_rescales_before_snap() {
        let config = TankConfig::uniform(4, Q24F8::from_int(50), 500, 300)
            .unwrap()
            .with_trim(Q8F8::from_bits(0x0200), Q24F8::from_int(10));
        let mut engine = LevelEngine::new(config, Calibration::zeroed(4).unwrap());
        // One endpoint wet: 25 mm aggregated, doubled plus 10 mm offset.
        let snapshot = engine.process(&[501, 0, 0, 0]).unwrap();
        assert_eq!(snapshot.level_height, Q24F8::from_int(60));
    }

    #[test]
    fn recalibration_zeroes_diff_for_identical_raw() {
        let mut engine = engine(3, 50, 100, 100);
        let first = engine.process(&[400, 380, 420]).unwrap().clone();
        assert_eq!(first.submerged_count, 4);

        engine.request_recalibration();
        assert!(engine.apply_pending_recalibration(&[400, 380, 420]).unwrap());
        let second = engine.process(&[400, 380, 420]).unwrap();
        assert_eq!(second.diff.as_slice(), &[0, 0, 0]);
        assert_eq!(second.submerged_count, 0);
        assert_eq!(second.level_height, Q24F8::ZERO);
    }

    #[test]
    fn raising_one_sensor_never_lowers_the_level() {
        let mut engine = engine(4, 50, 500, 150);
        let below = engine.process(&[501, 400, 0, 0]).unwrap().level_height;
        let above = engine.process(&[501, 600, 0, 0]).unwrap().level_height;
        assert!(above >= below);
    }

    #[test]
    fn mismatched_raw_length_keeps_previous_snapshot() {
        let mut engine = engine(3, 50, 500, 100);
        engine.process(&[501, 501, 501]).unwrap();
        let err = engine.process(&[501, 501]).unwrap_err();
        assert_eq!(
            err,
            ConfigError::SensorCountMismatch {
                expected: 3,
                actual: 2,
            }
        );
        assert_eq!(engine.latest().unwrap().submerged_count, 4);
    }
}
