//! Hardware and Transport Ports
//!
//! These traits are the seams between the level engine and everything it
//! deliberately does not own: the capacitive-sensing peripheral, persistent
//! calibration storage, and whatever consumes the published snapshots. The
//! engine stays independent of concrete hardware, and tests drive full scan
//! cycles with scripted implementations.
//!
//! The contracts are intentionally poll-shaped and infallible: the sensing
//! hardware is the ground truth for timing, so a scan that never completes
//! is the driver layer's problem (watchdog territory), not something the
//! core recovers from.

use crate::config::MAX_SENSORS;
use crate::engine::Snapshot;
use heapless::Vec;

/// Offsets as loaded from or handed to persistent storage.
pub type StoredOffsets = Vec<i32, MAX_SENSORS>;

/// Capacitive-sensing peripheral: scan status and per-channel raw counts.
///
/// The controller calls these exactly once per cycle, in order: completion
/// check, then one `read_raw` per channel, then `start_scan` for the next
/// cycle so acquisition overlaps with processing.
pub trait SensorSource {
    /// Whether the scan started last cycle has completed.
    fn is_scan_complete(&self) -> bool;

    /// Raw count for one sensor channel from the completed scan.
    fn read_raw(&mut self, index: usize) -> i32;

    /// Kick off the next hardware scan.
    fn start_scan(&mut self);
}

/// Persistent storage for empty-state calibration offsets.
pub trait CalibrationStore {
    /// Load the stored offsets. Called once at startup; the returned length
    /// must match the configured sensor count or startup fails.
    fn load(&mut self) -> StoredOffsets;

    /// Persist a freshly-captured offset array. Called only when a
    /// recalibration is applied.
    fn store(&mut self, offsets: &[i32]);
}

/// Consumer of per-cycle snapshots (display, logging, telemetry).
///
/// Publish failures are the reporter's own concern; nothing is propagated
/// back into the scan cycle.
pub trait Reporter {
    /// Hand over the latest complete snapshot.
    fn publish(&mut self, snapshot: &Snapshot);
}
