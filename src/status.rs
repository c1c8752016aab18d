//! Lock-free engine status shared between the audio thread and observers.
//!
//! The audio thread publishes with relaxed stores once per block; readers
//! (editor, host tooling, tests) poll without ever blocking it.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

#[derive(Default)]
pub struct EngineStatus {
    silent_blocks: AtomicU32,
    gate_engaged: AtomicBool,
    resynth_count: AtomicU32,
    active_taps: AtomicU32,
}

impl EngineStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_silent_blocks(&self, val: u32) {
        self.silent_blocks.store(val, Ordering::Relaxed);
    }

    pub fn set_gate_engaged(&self, val: bool) {
        self.gate_engaged.store(val, Ordering::Relaxed);
    }

    pub fn set_resynth_count(&self, val: u32) {
        self.resynth_count.store(val, Ordering::Relaxed);
    }

    pub fn set_active_taps(&self, val: u32) {
        self.active_taps.store(val, Ordering::Relaxed);
    }

    pub fn get_silent_blocks(&self) -> u32 {
        self.silent_blocks.load(Ordering::Relaxed)
    }

    pub fn get_gate_engaged(&self) -> bool {
        self.gate_engaged.load(Ordering::Relaxed)
    }

    pub fn get_resynth_count(&self) -> u32 {
        self.resynth_count.load(Ordering::Relaxed)
    }

    pub fn get_active_taps(&self) -> u32 {
        self.active_taps.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.set_silent_blocks(0);
        self.set_gate_engaged(false);
    }
}
