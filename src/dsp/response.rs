//! Frequency response of designed kernels.
//!
//! Not used on the audio thread. Feeds displays and the offline renderer's
//! summary, and lets tests check what a kernel actually does in frequency.

use rustfft::{num_complex::Complex, FftPlanner};
use std::f64::consts::PI;

/// Magnitude response in dB over `fft_size / 2 + 1` bins from DC to Nyquist.
///
/// The kernel is zero-padded to `fft_size`, which must be at least its length.
pub fn magnitude_db(kernel: &[f64], fft_size: usize) -> Vec<f64> {
    assert!(
        fft_size >= kernel.len() && fft_size > 0,
        "fft size {} shorter than kernel {}",
        fft_size,
        kernel.len()
    );

    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(fft_size);

    let mut spectrum: Vec<Complex<f64>> = kernel
        .iter()
        .map(|&h| Complex::new(h, 0.0))
        .chain(std::iter::repeat(Complex::new(0.0, 0.0)))
        .take(fft_size)
        .collect();
    fft.process(&mut spectrum);

    spectrum[..=fft_size / 2]
        .iter()
        .map(|c| gain_to_db(c.norm()))
        .collect()
}

/// First frequency where the magnitude response crosses `level_db`, scanning
/// up from DC. Interpolates linearly between FFT bins. `None` if it never does.
pub fn crossing_hz(kernel: &[f64], sample_rate: f64, fft_size: usize, level_db: f64) -> Option<f64> {
    let db = magnitude_db(kernel, fft_size);
    let bin_hz = sample_rate / fft_size as f64;

    db.windows(2).enumerate().find_map(|(bin, pair)| {
        let (a, b) = (pair[0] - level_db, pair[1] - level_db);
        if a == 0.0 {
            return Some(bin as f64 * bin_hz);
        }
        if a.signum() != b.signum() {
            let frac = a / (a - b);
            return Some((bin as f64 + frac) * bin_hz);
        }
        None
    })
}

/// Linear gain of `kernel` at a single frequency, evaluated directly.
pub fn gain_at(kernel: &[f64], freq_hz: f64, sample_rate: f64) -> f64 {
    let w = 2.0 * PI * freq_hz / sample_rate;
    let (re, im) = kernel
        .iter()
        .enumerate()
        .fold((0.0f64, 0.0f64), |(re, im), (n, &h)| {
            let phase = w * n as f64;
            (re + h * phase.cos(), im - h * phase.sin())
        });
    (re * re + im * im).sqrt()
}

#[inline]
pub fn gain_to_db(gain: f64) -> f64 {
    20.0 * gain.max(1e-12).log10()
}
