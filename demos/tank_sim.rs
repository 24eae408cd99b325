//! Simulated tank fill and drain
//!
//! Drives a `ScanController` against a software model of the 12-sensor ring
//! array: each cycle the simulated liquid rises (then falls), submerged
//! rings report high capacitance counts, and the controller publishes the
//! level it reconstructs from them.
//!
//! Run with:
//! ```bash
//! cargo run --example tank_sim
//! ```

use levelsense::{
    CalibrationStore, Q24F8, Reporter, ScanController, SensorSource, Snapshot, StoredOffsets,
    TankConfig,
};

/// Dry baseline counts for each simulated ring.
const DRY_COUNT: i32 = 5400;
/// Extra counts a submerged ring reports over its dry baseline.
const WET_DELTA: i32 = 1900;
/// Height of one interior ring band in mm.
const RING_HEIGHT_MM: i32 = 25;
/// Tank capacity: 11 full band spans across 12 rings.
const CAPACITY_MM: i32 = 275;

/// Software stand-in for the capacitive sensing peripheral.
///
/// A scan is always "complete" one poll after it was started; raw counts
/// are derived from the liquid height at scan time.
struct SimulatedScanner {
    liquid_mm: i32,
    rising: bool,
    scanning: bool,
    frame: [i32; 12],
}

impl SimulatedScanner {
    fn new() -> Self {
        Self {
            liquid_mm: 0,
            rising: true,
            scanning: false,
            frame: [DRY_COUNT; 12],
        }
    }

    /// Move the liquid one step and capture the counts it produces.
    fn capture(&mut self) {
        if self.rising {
            self.liquid_mm += 20;
            if self.liquid_mm >= CAPACITY_MM {
                self.liquid_mm = CAPACITY_MM;
                self.rising = false;
            }
        } else {
            self.liquid_mm -= 20;
            if self.liquid_mm <= 0 {
                self.liquid_mm = 0;
                self.rising = true;
            }
        }

        // Ring i's band is centred (i * 25) mm above the tank floor.
        for (index, count) in self.frame.iter_mut().enumerate() {
            let band_mm = index as i32 * RING_HEIGHT_MM;
            *count = if self.liquid_mm > band_mm {
                DRY_COUNT + WET_DELTA
            } else {
                DRY_COUNT
            };
        }
    }
}

impl SensorSource for SimulatedScanner {
    fn is_scan_complete(&self) -> bool {
        self.scanning
    }

    fn read_raw(&mut self, index: usize) -> i32 {
        self.frame[index]
    }

    fn start_scan(&mut self) {
        self.capture();
        self.scanning = true;
    }
}

/// Calibration "EEPROM" preloaded with the dry baseline.
struct FlashStore;

impl CalibrationStore for FlashStore {
    fn load(&mut self) -> StoredOffsets {
        let mut offsets = StoredOffsets::new();
        for _ in 0..12 {
            let _ = offsets.push(DRY_COUNT);
        }
        offsets
    }

    fn store(&mut self, offsets: &[i32]) {
        println!("  [store] persisted offsets: {offsets:?}");
    }
}

/// Prints each published snapshot as one log line.
struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn publish(&mut self, snapshot: &Snapshot) {
        let bar_len = (snapshot.level_percent.to_int().clamp(0, 100) / 5) as usize;
        println!(
            "  level {:>7} mm  {:>6} %  |{:<20}|  weighted count {}",
            format!("{}", snapshot.level_height),
            format!("{}", snapshot.level_percent),
            "#".repeat(bar_len),
            snapshot.submerged_count,
        );
    }
}

fn main() {
    println!("Tank simulation: 12-ring array, {CAPACITY_MM} mm capacity\n");

    let config = TankConfig::ring_array_12(Q24F8::from_int(RING_HEIGHT_MM), 500, CAPACITY_MM)
        .expect("reference configuration is valid");

    let mut controller =
        ScanController::new(SimulatedScanner::new(), FlashStore, ConsoleReporter, config)
            .expect("dry-baseline calibration matches the array");

    for cycle in 0..40 {
        // The tank drains back to empty around cycle 27; capture the dry
        // baseline right there, the way a maintenance button would.
        if cycle == 27 {
            println!("  [cal] requesting empty-offset recalibration");
            controller.request_recalibration();
        }
        match controller.poll() {
            Ok(_) => {}
            Err(nb::Error::WouldBlock) => println!("  (scan in flight)"),
            Err(nb::Error::Other(e)) => {
                eprintln!("cycle failed: {e}");
                return;
            }
        }
    }
}
