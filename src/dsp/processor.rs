//! Block processor: the host-facing FIR core.
//!
//! Ties together the coefficient cache, the dual FIR engine, the
//! double-precision working buffer and the silence gate. One instance serves
//! one plugin instance and is driven from a single thread.
//!
//! Per block:
//! 1. refresh kernels if the design tuple changed
//! 2. widen input into the working buffer
//! 3. update the silence gate; if engaged, return without touching output
//! 4. run high-pass then low-pass (each bypassable)
//! 5. narrow the result back into the host buffer

use super::bridge::{SilenceGate, WorkingBuffer};
use super::coeff_cache::{CoefficientCache, KernelUpdate};
use super::fir::{Bypass, DualFirEngine};
use crate::settings::FilterSettings;
use crate::status::EngineStatus;
use std::sync::Arc;

/// What happened to a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockOutcome {
    /// Filter cascade ran and output was written.
    Filtered,
    /// Prolonged silence: the cascade was skipped and output left as it was.
    Gated,
    /// `prepare` has not succeeded yet; the block passes through untouched.
    Unprepared,
}

pub struct FirProcessor {
    cache: CoefficientCache,
    engine: DualFirEngine,
    working: WorkingBuffer,
    gate: SilenceGate,
    bypass: Bypass,
    status: Arc<EngineStatus>,
    prepared: bool,
}

impl FirProcessor {
    pub fn new() -> Self {
        Self::with_status(Arc::new(EngineStatus::new()))
    }

    pub fn with_status(status: Arc<EngineStatus>) -> Self {
        Self {
            cache: CoefficientCache::new(0.0),
            engine: DualFirEngine::new(),
            working: WorkingBuffer::new(),
            gate: SilenceGate::new(),
            bypass: Bypass::default(),
            status,
            prepared: false,
        }
    }

    /// Size every buffer for a new stream configuration and reset all state.
    ///
    /// Allocates. Must not run concurrently with [`Self::process`].
    pub fn prepare(
        &mut self,
        sample_rate: f64,
        max_block_size: usize,
        num_channels: usize,
    ) -> anyhow::Result<()> {
        self.prepared = false;
        if !(sample_rate > 0.0) {
            anyhow::bail!("invalid sample rate {}", sample_rate);
        }
        if num_channels == 0 {
            anyhow::bail!("cannot prepare for zero channels");
        }

        self.working.allocate(num_channels, max_block_size)?;
        self.engine.prepare(num_channels)?;
        self.cache.set_sample_rate(sample_rate);
        self.gate.reset();
        self.status.reset();
        self.prepared = true;
        Ok(())
    }

    /// Apply a restored parameter snapshot and resynthesize immediately
    /// instead of waiting for the next block.
    ///
    /// Before a successful [`Self::prepare`] there is no sample rate to design
    /// against: only the bypass flags are taken and synthesis waits for the
    /// first processed block.
    pub fn restore(&mut self, settings: &FilterSettings) -> KernelUpdate {
        self.bypass = settings.bypass();
        if !self.prepared {
            log::debug!("restore before prepare, kernel synthesis deferred");
            return KernelUpdate::default();
        }
        self.cache.invalidate();
        let update = self.cache.maybe_update(&settings.design());
        self.publish_kernels();
        update
    }

    /// The settings the current kernels were built from, for serialization.
    pub fn current_settings(&self) -> Option<FilterSettings> {
        self.cache
            .last_params()
            .map(|design| FilterSettings::from_parts(design, self.bypass))
    }

    /// Filter one host block in place.
    ///
    /// `buffer` holds one slice per channel, each at most the prepared
    /// maximum block size long. Never allocates.
    pub fn process(&mut self, buffer: &mut [&mut [f32]], settings: &FilterSettings) -> BlockOutcome {
        if !self.prepared {
            return BlockOutcome::Unprepared;
        }

        if self.cache.maybe_update(&settings.design()).any() {
            self.publish_kernels();
        }
        self.bypass = settings.bypass();

        let num_samples = self.working.upsample(buffer);

        let gated = self.gate.observe(self.working.peak(num_samples));
        self.status.set_silent_blocks(self.gate.silent_blocks());
        self.status.set_gate_engaged(gated);
        if gated {
            return BlockOutcome::Gated;
        }

        #[cfg(debug_assertions)]
        assert_no_alloc::assert_no_alloc(|| {
            self.engine.process_block(
                self.working.channels_mut(),
                num_samples,
                &self.cache,
                self.bypass,
            );
        });
        #[cfg(not(debug_assertions))]
        self.engine.process_block(
            self.working.channels_mut(),
            num_samples,
            &self.cache,
            self.bypass,
        );

        self.working.downsample(buffer, num_samples);
        BlockOutcome::Filtered
    }

    /// Clear filter history, the working buffer and the silence counter.
    /// Kernels are kept. Does not allocate.
    pub fn reset(&mut self) {
        self.engine.reset();
        self.working.clear();
        self.gate.reset();
        self.status.reset();
    }

    fn publish_kernels(&self) {
        self.status.set_resynth_count(self.cache.resynth_count());
        self.status
            .set_active_taps(self.cache.high_pass().len() as u32);
    }

    pub fn kernels(&self) -> &CoefficientCache {
        &self.cache
    }

    pub fn status(&self) -> &Arc<EngineStatus> {
        &self.status
    }

    pub fn is_prepared(&self) -> bool {
        self.prepared
    }

    pub fn silent_blocks(&self) -> u32 {
        self.gate.silent_blocks()
    }
}

impl Default for FirProcessor {
    fn default() -> Self {
        Self::new()
    }
}
