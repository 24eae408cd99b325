//! Scripted port implementations for integration tests
//!
//! Each mock wraps its state in `Rc<RefCell<_>>` so a test can keep a handle
//! to the state after moving the mock into a `ScanController`, then assert
//! on call ordering, persisted offsets, and published snapshots.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use levelsense::{CalibrationStore, Reporter, SensorSource, Snapshot, StoredOffsets};

/// What a mock observed, in call order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    ReadRaw,
    StartScan,
}

#[derive(Debug, Default)]
pub struct SourceState {
    /// Raw frames still waiting to be scanned, oldest first.
    pub frames: VecDeque<Vec<i32>>,
    /// The completed scan currently readable, if any.
    pub current: Option<Vec<i32>>,
    pub scans_started: usize,
    pub calls: Vec<Call>,
}

/// Sensor source that serves pre-scripted scan frames.
///
/// `start_scan` "completes" instantly by moving the next frame into place;
/// once the script runs dry the source reports busy forever, modelling a
/// stalled scanner.
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    pub state: Rc<RefCell<SourceState>>,
}

impl ScriptedSource {
    pub fn new(frames: &[&[i32]]) -> Self {
        let state = SourceState {
            frames: frames.iter().map(|f| f.to_vec()).collect(),
            ..SourceState::default()
        };
        Self {
            state: Rc::new(RefCell::new(state)),
        }
    }
}

impl SensorSource for ScriptedSource {
    fn is_scan_complete(&self) -> bool {
        self.state.borrow().current.is_some()
    }

    fn read_raw(&mut self, index: usize) -> i32 {
        let mut state = self.state.borrow_mut();
        state.calls.push(Call::ReadRaw);
        state
            .current
            .as_ref()
            .expect("read_raw called without a completed scan")[index]
    }

    fn start_scan(&mut self) {
        let mut state = self.state.borrow_mut();
        state.calls.push(Call::StartScan);
        state.scans_started += 1;
        state.current = state.frames.pop_front();
    }
}

#[derive(Debug, Default)]
pub struct StoreState {
    pub offsets: Vec<i32>,
    pub loads: usize,
    /// Every offset array handed to `store`, in order.
    pub stored: Vec<Vec<i32>>,
}

/// In-memory calibration store that records every persist call.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    pub state: Rc<RefCell<StoreState>>,
}

impl MemoryStore {
    pub fn with_offsets(offsets: &[i32]) -> Self {
        let state = StoreState {
            offsets: offsets.to_vec(),
            ..StoreState::default()
        };
        Self {
            state: Rc::new(RefCell::new(state)),
        }
    }
}

impl CalibrationStore for MemoryStore {
    fn load(&mut self) -> StoredOffsets {
        let mut state = self.state.borrow_mut();
        state.loads += 1;
        StoredOffsets::from_slice(&state.offsets).expect("scripted offsets exceed MAX_SENSORS")
    }

    fn store(&mut self, offsets: &[i32]) {
        let mut state = self.state.borrow_mut();
        state.offsets = offsets.to_vec();
        state.stored.push(offsets.to_vec());
    }
}

/// Reporter that keeps every published snapshot.
#[derive(Debug, Clone, Default)]
pub struct RecordingReporter {
    pub published: Rc<RefCell<Vec<Snapshot>>>,
}

impl Reporter for RecordingReporter {
    fn publish(&mut self, snapshot: &Snapshot) {
        self.published.borrow_mut().push(snapshot.clone());
    }
}
