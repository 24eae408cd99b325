//! Liquid-level estimation from stacked capacitive ring sensors
//!
//! Converts per-sensor raw capacitance counts into a calibrated fill level,
//! as both a physical height and a percentage of tank capacity. Designed
//! for small fixed sensor arrays on edge devices.
//!
//! Key constraints:
//! - Integer fixed-point throughout (Q8.8 scales, Q24.8 levels), no floats
//! - No heap allocation in the processing path
//! - Single-threaded, poll-driven; one cooperative step per external tick
//!
//! ```
//! use levelsense::{Calibration, LevelEngine, TankConfig, Q24F8};
//!
//! // Four ring sensors, 50 mm per interior band, 150 mm tank.
//! let config = TankConfig::uniform(4, Q24F8::from_int(50), 500, 150)?;
//! let calibration = Calibration::zeroed(4)?;
//! let mut engine = LevelEngine::new(config, calibration);
//!
//! // Bottom two sensors submerged: an endpoint plus an interior band.
//! let snapshot = engine.process(&[900, 850, 120, 90])?;
//! assert_eq!(snapshot.level_height.to_int(), 75);
//! assert_eq!(snapshot.level_percent.to_int(), 50);
//! # Ok::<(), levelsense::ConfigError>(())
//! ```
//!
//! Hardware access goes through the [`ports`] traits; see
//! [`ScanController`] for the full poll-driven scan cycle against a real
//! (or scripted) sensing peripheral.

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod calibration;
pub mod config;
pub mod controller;
pub mod engine;
pub mod errors;
pub mod fixed;
pub mod ports;

// Public API
pub use calibration::Calibration;
pub use config::{TankConfig, MAX_SENSORS};
pub use controller::ScanController;
pub use engine::{LevelEngine, Snapshot};
pub use errors::{ConfigError, ConfigResult};
pub use fixed::{Q24F8, Q8F8};
pub use ports::{CalibrationStore, Reporter, SensorSource, StoredOffsets};

/// Crate version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
