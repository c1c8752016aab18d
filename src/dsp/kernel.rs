//! Windowed-Sinc Kernel Synthesis
//!
//! Builds linear-phase FIR impulse responses for the high-pass and low-pass
//! stages. Kernels live in fixed-capacity storage so a redesign on the audio
//! thread only overwrites memory that already exists.
//!
//! # Design Notes
//! - Output is deliberately NOT normalised to unit passband gain; the raw
//!   windowed sinc is what the filter has always applied.
//! - Synthesis is a pure function of its inputs.

use super::window::{self, WindowKind};
use std::f64::consts::PI;

/// Upper bound on kernel length (filter order 250).
pub const MAX_TAPS: usize = 251;

/// Tolerance used both to detect the center tap and to guard the sinc
/// denominator against a near-zero distance.
pub const CENTER_TAP_EPSILON: f64 = 1e-9;

/// Which prototype to synthesize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    HighPass,
    LowPass,
}

/// Inputs to one kernel design.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KernelDesign {
    pub cutoff_hz: f64,
    pub sample_rate: f64,
    pub taps: usize,
    pub window: WindowKind,
    pub alpha: f64,
    pub kind: FilterKind,
}

/// Fixed-capacity impulse response.
#[derive(Clone)]
pub struct Kernel {
    coeffs: [f64; MAX_TAPS],
    len: usize,
}

impl Kernel {
    /// A single unit tap: passes the signal through unchanged.
    pub fn identity() -> Self {
        let mut coeffs = [0.0; MAX_TAPS];
        coeffs[0] = 1.0;
        Self { coeffs, len: 1 }
    }

    pub fn from_design(design: &KernelDesign) -> Self {
        let mut kernel = Self::identity();
        kernel.synthesize(design);
        kernel
    }

    /// Number of active taps.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn coeffs(&self) -> &[f64] {
        &self.coeffs[..self.len]
    }

    /// Overwrite this kernel in place with a fresh design.
    ///
    /// Panics if `design.taps` exceeds [`MAX_TAPS`]; the order parameter range
    /// makes that a programming error rather than a runtime condition.
    pub fn synthesize(&mut self, design: &KernelDesign) {
        assert!(
            design.taps >= 2 && design.taps <= MAX_TAPS,
            "kernel length {} outside 2..={}",
            design.taps,
            MAX_TAPS
        );

        let m = design.taps;
        let wc = 2.0 * PI * design.cutoff_hz / design.sample_rate;
        let delay = (m - 1) as f64 / 2.0;

        for n in 0..m {
            let w = window::evaluate(design.window, n, m, design.alpha);
            self.coeffs[n] = ideal_tap(design.kind, wc, n as f64 - delay) * w;
        }
        // Stale taps beyond the active length stay zeroed
        self.coeffs[m..].fill(0.0);
        self.len = m;
    }
}

impl Default for Kernel {
    fn default() -> Self {
        Self::identity()
    }
}

impl std::fmt::Debug for Kernel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Kernel")
            .field("len", &self.len)
            .field("coeffs", &self.coeffs())
            .finish()
    }
}

/// Ideal (unwindowed) coefficient at signed distance `offset` from the center.
#[inline]
fn ideal_tap(kind: FilterKind, wc: f64, offset: f64) -> f64 {
    if offset.abs() < CENTER_TAP_EPSILON {
        let lp = wc / PI;
        return match kind {
            FilterKind::LowPass => lp,
            FilterKind::HighPass => 1.0 - lp,
        };
    }

    let lp = (wc * offset).sin() / (PI * offset);
    match kind {
        FilterKind::LowPass => lp,
        FilterKind::HighPass => -lp,
    }
}

/// Allocating convenience wrapper around [`Kernel::synthesize`].
pub fn synthesize(
    cutoff_hz: f64,
    sample_rate: f64,
    taps: usize,
    window: WindowKind,
    alpha: f64,
    kind: FilterKind,
) -> Vec<f64> {
    Kernel::from_design(&KernelDesign {
        cutoff_hz,
        sample_rate,
        taps,
        window,
        alpha,
        kind,
    })
    .coeffs()
    .to_vec()
}
