//! Precision bridge and silence gate.
//!
//! The host hands us single-precision blocks; filtering runs on a
//! double-precision working copy that is widened on the way in and narrowed
//! on the way out.

use anyhow::Context;

/// Peak magnitude below which a block counts as silent (about -120 dBFS).
pub const SILENCE_THRESHOLD: f64 = 1e-6;

/// Consecutive silent blocks tolerated before filtering is skipped.
pub const SILENT_BLOCKS_BEFORE_GATE: u32 = 100;

/// Double-precision multichannel scratch buffer.
pub struct WorkingBuffer {
    channels: Vec<Vec<f64>>,
    max_block_size: usize,
}

impl WorkingBuffer {
    pub fn new() -> Self {
        Self {
            channels: Vec::new(),
            max_block_size: 0,
        }
    }

    /// Reallocate for a new layout and zero everything. Allocates.
    pub fn allocate(&mut self, num_channels: usize, max_block_size: usize) -> anyhow::Result<()> {
        let mut channels = Vec::new();
        channels
            .try_reserve_exact(num_channels)
            .context("failed to allocate working buffer channels")?;
        for ch in 0..num_channels {
            let mut samples = Vec::new();
            samples
                .try_reserve_exact(max_block_size)
                .with_context(|| format!("failed to allocate working buffer channel {}", ch))?;
            samples.resize(max_block_size, 0.0);
            channels.push(samples);
        }
        self.channels = channels;
        self.max_block_size = max_block_size;
        Ok(())
    }

    pub fn clear(&mut self) {
        for channel in &mut self.channels {
            channel.fill(0.0);
        }
    }

    /// Widen `input` into the buffer, sample for sample. Returns the number of
    /// samples per channel that were copied.
    ///
    /// Working channels the host did not supply are zeroed for the block so
    /// nothing from an earlier, wider layout leaks into the peak or the filters.
    pub fn upsample(&mut self, input: &[&mut [f32]]) -> usize {
        let num_samples = input
            .iter()
            .map(|ch| ch.len())
            .max()
            .unwrap_or(0)
            .min(self.max_block_size);

        for (index, dst) in self.channels.iter_mut().enumerate() {
            let dst = &mut dst[..num_samples];
            match input.get(index) {
                Some(src) => {
                    let len = num_samples.min(src.len());
                    for (d, &s) in dst[..len].iter_mut().zip(src[..len].iter()) {
                        *d = s as f64;
                    }
                    dst[len..].fill(0.0);
                }
                None => dst.fill(0.0),
            }
        }
        num_samples
    }

    /// Narrow the first `num_samples` of every channel back into `output`.
    pub fn downsample(&self, output: &mut [&mut [f32]], num_samples: usize) {
        for (src, dst) in self.channels.iter().zip(output.iter_mut()) {
            let len = num_samples.min(dst.len());
            for (d, &s) in dst[..len].iter_mut().zip(src[..len].iter()) {
                *d = s as f32;
            }
        }
    }

    /// Largest absolute sample among the first `num_samples` of each channel.
    pub fn peak(&self, num_samples: usize) -> f64 {
        self.channels
            .iter()
            .flat_map(|ch| ch[..num_samples.min(ch.len())].iter())
            .fold(0.0f64, |peak, &s| peak.max(s.abs()))
    }

    pub fn channels_mut(&mut self) -> &mut [Vec<f64>] {
        &mut self.channels
    }

    pub fn channel(&self, index: usize) -> &[f64] {
        &self.channels[index]
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    pub fn max_block_size(&self) -> usize {
        self.max_block_size
    }
}

impl Default for WorkingBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Counts silent blocks and decides when filtering can be skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilenceGate {
    silent_blocks: u32,
}

impl SilenceGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the peak of the current block. Returns `true` when filtering
    /// should be skipped for it.
    #[inline]
    pub fn observe(&mut self, peak: f64) -> bool {
        if peak < SILENCE_THRESHOLD {
            self.silent_blocks = self.silent_blocks.saturating_add(1);
        } else {
            self.silent_blocks = 0;
        }
        self.is_engaged()
    }

    #[inline]
    pub fn is_engaged(&self) -> bool {
        self.silent_blocks > SILENT_BLOCKS_BEFORE_GATE
    }

    pub fn silent_blocks(&self) -> u32 {
        self.silent_blocks
    }

    pub fn reset(&mut self) {
        self.silent_blocks = 0;
    }
}
