//! Dual FIR Processing Engine
//!
//! Two cascaded direct-form FIR stages (high-pass, then low-pass) running on
//! the double-precision working buffer. Each stage keeps one delay line per
//! channel; channels never mix.
//!
//! # Design Notes
//! - Delay lines always hold `MAX_TAPS` samples of history, so an order change
//!   only changes how much of it the next convolution reads.
//! - No allocation after `prepare`.

use super::coeff_cache::CoefficientCache;
use super::kernel::MAX_TAPS;
use anyhow::Context;

/// Ring of past input samples for one channel of one stage.
#[derive(Clone)]
pub struct DelayLine {
    buf: [f64; MAX_TAPS],
    pos: usize,
}

impl DelayLine {
    pub fn new() -> Self {
        Self {
            buf: [0.0; MAX_TAPS],
            pos: 0,
        }
    }

    /// Push one input sample and return the causal convolution with `taps`.
    #[inline]
    pub fn process(&mut self, input: f64, taps: &[f64]) -> f64 {
        debug_assert!(taps.len() <= MAX_TAPS);
        self.buf[self.pos] = input;

        // Walk the ring backwards in two contiguous runs, newest sample first,
        // so the inner loops carry no modulo.
        let head = (self.pos + 1).min(taps.len());
        let mut acc = 0.0f64;
        for (k, &h) in taps[..head].iter().enumerate() {
            acc += h * self.buf[self.pos - k];
        }
        for (k, &h) in taps.iter().enumerate().skip(head) {
            acc += h * self.buf[self.pos + MAX_TAPS - k];
        }

        self.pos += 1;
        if self.pos == MAX_TAPS {
            self.pos = 0;
        }
        acc
    }

    pub fn reset(&mut self) {
        self.buf.fill(0.0);
        self.pos = 0;
    }
}

impl Default for DelayLine {
    fn default() -> Self {
        Self::new()
    }
}

/// Lifecycle of a stage between preparations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageState {
    /// Prepared or reset, no samples convolved yet.
    Idle,
    /// Delay lines carry history from earlier blocks.
    Running,
}

/// One FIR filter applied independently to every channel.
pub struct FirStage {
    lines: Vec<DelayLine>,
    state: StageState,
}

impl FirStage {
    pub fn new() -> Self {
        Self {
            lines: Vec::new(),
            state: StageState::Idle,
        }
    }

    /// Size the per-channel delay lines. Allocates.
    pub fn prepare(&mut self, num_channels: usize) -> anyhow::Result<()> {
        let mut lines = Vec::new();
        lines
            .try_reserve_exact(num_channels)
            .context("failed to allocate FIR delay lines")?;
        lines.resize_with(num_channels, DelayLine::new);
        self.lines = lines;
        self.state = StageState::Idle;
        Ok(())
    }

    /// Filter `channels[..][..num_samples]` in place with `taps`.
    pub fn process(&mut self, channels: &mut [Vec<f64>], num_samples: usize, taps: &[f64]) {
        for (line, channel) in self.lines.iter_mut().zip(channels.iter_mut()) {
            let len = num_samples.min(channel.len());
            for sample in channel[..len].iter_mut() {
                *sample = line.process(*sample, taps);
            }
        }
        if num_samples > 0 {
            self.state = StageState::Running;
        }
    }

    pub fn reset(&mut self) {
        for line in &mut self.lines {
            line.reset();
        }
        self.state = StageState::Idle;
    }

    pub fn state(&self) -> StageState {
        self.state
    }

    pub fn num_channels(&self) -> usize {
        self.lines.len()
    }
}

impl Default for FirStage {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-stage bypass switches for one block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Bypass {
    pub high_pass: bool,
    pub low_pass: bool,
}

/// High-pass stage followed by low-pass stage.
pub struct DualFirEngine {
    high_pass: FirStage,
    low_pass: FirStage,
}

impl DualFirEngine {
    pub fn new() -> Self {
        Self {
            high_pass: FirStage::new(),
            low_pass: FirStage::new(),
        }
    }

    pub fn prepare(&mut self, num_channels: usize) -> anyhow::Result<()> {
        self.high_pass.prepare(num_channels)?;
        self.low_pass.prepare(num_channels)?;
        Ok(())
    }

    /// Run the cascade over one block.
    ///
    /// The low-pass stage always sees whatever the high-pass stage produced, so
    /// bypassing one stage never isolates the other from its input. A bypassed
    /// stage does not advance its delay lines.
    pub fn process_block(
        &mut self,
        channels: &mut [Vec<f64>],
        num_samples: usize,
        kernels: &CoefficientCache,
        bypass: Bypass,
    ) {
        if !bypass.high_pass {
            self.high_pass
                .process(channels, num_samples, kernels.high_pass().coeffs());
        }
        if !bypass.low_pass {
            self.low_pass
                .process(channels, num_samples, kernels.low_pass().coeffs());
        }
    }

    pub fn reset(&mut self) {
        self.high_pass.reset();
        self.low_pass.reset();
    }

    pub fn high_pass_state(&self) -> StageState {
        self.high_pass.state()
    }

    pub fn low_pass_state(&self) -> StageState {
        self.low_pass.state()
    }
}

impl Default for DualFirEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::coeff_cache::DesignParams;
    use crate::dsp::window::WindowKind;

    fn direct_convolution(input: &[f64], taps: &[f64]) -> Vec<f64> {
        (0..input.len())
            .map(|n| {
                taps.iter()
                    .enumerate()
                    .filter(|(k, _)| *k <= n)
                    .map(|(k, h)| h * input[n - k])
                    .sum()
            })
            .collect()
    }

    #[test]
    fn test_delay_line_matches_direct_convolution() {
        let taps: Vec<f64> = (0..37).map(|i| ((i as f64) * 0.37).sin()).collect();
        let input: Vec<f64> = (0..700).map(|i| ((i as f64) * 0.11).cos()).collect();

        let mut line = DelayLine::new();
        let out: Vec<f64> = input.iter().map(|&x| line.process(x, &taps)).collect();
        let expected = direct_convolution(&input, &taps);

        // 700 samples wraps the ring more than twice
        for (a, b) in out.iter().zip(expected.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn test_full_length_kernel_wraps_correctly() {
        let taps = vec![1.0 / MAX_TAPS as f64; MAX_TAPS];
        let mut line = DelayLine::new();
        let mut last = 0.0;
        for _ in 0..(3 * MAX_TAPS) {
            last = line.process(1.0, &taps);
        }
        assert!((last - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_stage_state_transitions() {
        let mut stage = FirStage::new();
        stage.prepare(2).unwrap();
        assert_eq!(stage.state(), StageState::Idle);

        let mut block = vec![vec![0.5; 16]; 2];
        stage.process(&mut block, 16, &[0.5, 0.5]);
        assert_eq!(stage.state(), StageState::Running);

        stage.reset();
        assert_eq!(stage.state(), StageState::Idle);
    }

    #[test]
    fn test_channels_are_independent() {
        let mut stage = FirStage::new();
        stage.prepare(2).unwrap();

        let mut block = vec![vec![0.0; 8], vec![0.0; 8]];
        block[0][0] = 1.0;
        stage.process(&mut block, 8, &[1.0, 0.5, 0.25]);

        assert_eq!(&block[0][..4], &[1.0, 0.5, 0.25, 0.0]);
        assert!(block[1].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_history_carries_across_blocks() {
        let taps = [0.25, 0.25, 0.25, 0.25];
        let mut stage = FirStage::new();
        stage.prepare(1).unwrap();

        let mut first = vec![vec![1.0, 1.0]];
        stage.process(&mut first, 2, &taps);
        let mut second = vec![vec![1.0, 1.0]];
        stage.process(&mut second, 2, &taps);

        assert_eq!(first[0], vec![0.25, 0.5]);
        assert_eq!(second[0], vec![0.75, 1.0]);
    }

    #[test]
    fn test_bypass_both_leaves_block_untouched() {
        let mut cache = CoefficientCache::new(48000.0);
        cache.maybe_update(&DesignParams {
            hp_cutoff_hz: 100.0,
            lp_cutoff_hz: 8000.0,
            order: 50,
            window: WindowKind::Blackman,
            kaiser_alpha: 2.5,
        });
        let mut engine = DualFirEngine::new();
        engine.prepare(2).unwrap();

        let original: Vec<Vec<f64>> = (0..2)
            .map(|c| (0..64).map(|i| ((i + c) as f64 * 0.3).sin()).collect())
            .collect();
        let mut block = original.clone();
        engine.process_block(
            &mut block,
            64,
            &cache,
            Bypass {
                high_pass: true,
                low_pass: true,
            },
        );

        assert_eq!(block, original);
        assert_eq!(engine.high_pass_state(), StageState::Idle);
        assert_eq!(engine.low_pass_state(), StageState::Idle);
    }

    #[test]
    fn test_cascade_order_high_pass_first() {
        let mut cache = CoefficientCache::new(48000.0);
        cache.maybe_update(&DesignParams {
            hp_cutoff_hz: 300.0,
            lp_cutoff_hz: 5000.0,
            order: 20,
            window: WindowKind::Hamming,
            kaiser_alpha: 0.0,
        });
        let mut engine = DualFirEngine::new();
        engine.prepare(1).unwrap();

        let mut impulse = vec![vec![0.0; 64]];
        impulse[0][0] = 1.0;
        engine.process_block(&mut impulse, 64, &cache, Bypass::default());

        let mut unit = vec![0.0; 64];
        unit[0] = 1.0;
        let hp_out = direct_convolution(&unit, cache.high_pass().coeffs());
        let expected = direct_convolution(&hp_out, cache.low_pass().coeffs());
        for (a, b) in impulse[0].iter().zip(expected.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }
}
