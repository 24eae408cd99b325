//! Scan-Cycle Controller
//!
//! ## Overview
//!
//! One cooperative step per external tick drives the whole measurement
//! loop. Each completed hardware scan moves through a fixed sequence:
//!
//! ```text
//! Idle ──► Collecting ──► Calibrating? ──► Processing ──► Publishing ──► Idle
//!  ▲          │                                │
//!  │          └── next scan started here ──────┘
//!  └── scan not complete: WouldBlock
//! ```
//!
//! No transition is ever skipped. The next scan is requested immediately
//! after the raw channels are read, so hardware acquisition overlaps with
//! normalization and aggregation instead of serializing behind them. A
//! pending calibration capture is applied *before* processing, from the same
//! raw snapshot the cycle computes with - offsets and the values they
//! baseline always come from one scan.
//!
//! ## Polling model
//!
//! [`ScanController::poll`] follows the `nb` convention: `WouldBlock` while
//! the hardware scan is still in flight, a published [`Snapshot`] once a
//! cycle completes. There are no timeouts and no cancellation here; the
//! sensing hardware is the ground truth for timing, and a scanner that
//! never completes leaves the controller idling by contract. Watchdogs
//! belong to the driver layer.

use crate::calibration::Calibration;
use crate::config::{TankConfig, MAX_SENSORS};
use crate::engine::{LevelEngine, Snapshot};
use crate::errors::ConfigError;
use crate::ports::{CalibrationStore, Reporter, SensorSource};
use heapless::Vec;

/// Drives one sensor array through repeated scan cycles.
#[derive(Debug)]
pub struct ScanController<S, C, R>
where
    S: SensorSource,
    C: CalibrationStore,
    R: Reporter,
{
    source: S,
    store: C,
    reporter: R,
    engine: LevelEngine,
}

impl<S, C, R> ScanController<S, C, R>
where
    S: SensorSource,
    C: CalibrationStore,
    R: Reporter,
{
    /// Load calibration from the store, validate it against the
    /// configuration, and start the first hardware scan.
    ///
    /// Fails fast on a sensor-count mismatch between the configuration and
    /// the stored offsets; the controller never runs on
    /// partially-initialized calibration.
    pub fn new(
        mut source: S,
        mut store: C,
        reporter: R,
        config: TankConfig,
    ) -> Result<Self, ConfigError> {
        let stored = store.load();
        let calibration = Calibration::from_stored(&stored, config.sensor_count())?;
        #[cfg(feature = "log")]
        log::info!(
            "level controller up: {} sensors, capacity {} mm",
            config.sensor_count(),
            config.max_height_mm()
        );
        source.start_scan();
        Ok(Self {
            source,
            store,
            reporter,
            engine: LevelEngine::new(config, calibration),
        })
    }

    /// Run one cooperative scheduling step.
    ///
    /// Returns `WouldBlock` while the scan is in flight. When a scan has
    /// completed, runs the full cycle (collect, recalibrate if armed,
    /// process, publish) and returns the freshly published snapshot.
    pub fn poll(&mut self) -> nb::Result<&Snapshot, ConfigError> {
        if !self.source.is_scan_complete() {
            return Err(nb::Error::WouldBlock);
        }

        // Collecting: pull every channel of the completed scan.
        let count = self.engine.config().sensor_count();
        let mut raw: Vec<i32, MAX_SENSORS> = Vec::new();
        for index in 0..count {
            // Capacity bounded by TankConfig at construction.
            let _ = raw.push(self.source.read_raw(index));
        }

        // Acquisition of the next cycle overlaps with everything below.
        self.source.start_scan();

        // Calibrating: capture this cycle's raw counts as the new empty
        // offsets if a request is armed, and persist them.
        match self.engine.apply_pending_recalibration(&raw) {
            Ok(true) => {
                self.store.store(self.engine.offsets());
                #[cfg(feature = "log")]
                log::info!("empty-offset recalibration captured and persisted");
            }
            Ok(false) => {}
            Err(error) => return Err(nb::Error::Other(error)),
        }

        // Processing.
        let snapshot = self.engine.process(&raw).map_err(nb::Error::Other)?;

        // Publishing: reporter failures are not ours to handle.
        self.reporter.publish(snapshot);
        #[cfg(feature = "log")]
        log::debug!(
            "cycle complete: {} mm ({} %)",
            snapshot.level_height,
            snapshot.level_percent
        );
        Ok(snapshot)
    }

    /// Arm a recalibration capture for the next cycle boundary.
    pub fn request_recalibration(&mut self) {
        self.engine.request_recalibration();
    }

    /// The engine and its latest snapshot.
    pub fn engine(&self) -> &LevelEngine {
        &self.engine
    }

    /// The most recently published snapshot, if any cycle has completed.
    pub fn latest(&self) -> Option<&Snapshot> {
        self.engine.latest()
    }
}
