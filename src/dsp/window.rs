//! Window Functions for FIR Design
//!
//! Tapering weights applied to the ideal sinc response before it is truncated
//! to `M` taps. All windows are symmetric over `0..M` and evaluated per tap so
//! the kernel synthesizer can fold the weight into a single pass.

use nih_plug::prelude::Enum;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Window selection exposed to the host. The discriminant order is the
/// parameter index order and must not change (saved sessions store it).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Enum)]
#[repr(usize)]
pub enum WindowKind {
    #[default]
    Blackman,
    Hamming,
    Hann,
    Kaiser,
    Rectangular,
}

impl WindowKind {
    pub fn all() -> [WindowKind; 5] {
        [
            WindowKind::Blackman,
            WindowKind::Hamming,
            WindowKind::Hann,
            WindowKind::Kaiser,
            WindowKind::Rectangular,
        ]
    }

    /// Display name, as the host shows it.
    pub fn name(self) -> &'static str {
        Self::variants()[self.to_index()]
    }
}

/// Weight of tap `n` in a window of `len` taps.
///
/// `alpha` is only read by the Kaiser window. Requires `len >= 2`; the order
/// parameter range guarantees this.
#[inline]
pub fn evaluate(kind: WindowKind, n: usize, len: usize, alpha: f64) -> f64 {
    debug_assert!(len >= 2, "window length must be at least 2");
    let span = (len - 1) as f64;
    let n = n as f64;

    match kind {
        WindowKind::Blackman => {
            0.42 - 0.5 * (2.0 * PI * n / span).cos() + 0.08 * (4.0 * PI * n / span).cos()
        }
        WindowKind::Hamming => 0.54 - 0.46 * (2.0 * PI * n / span).cos(),
        WindowKind::Hann => 0.5 * (1.0 - (2.0 * PI * n / span).cos()),
        WindowKind::Kaiser => {
            let r = 2.0 * n / span - 1.0;
            // Endpoints can land a hair below zero after rounding
            let arg = PI * alpha * (1.0 - r * r).max(0.0).sqrt();
            bessel_i0(arg) / bessel_i0(PI * alpha)
        }
        WindowKind::Rectangular => 1.0,
    }
}

/// Zeroth-order modified Bessel function of the first kind.
///
/// Power series `I0(x) = sum_k ((x/2)^k / k!)^2`. Arguments stay within
/// `[0, 10*pi]` for the alpha range, which converges in well under 100 terms.
pub fn bessel_i0(x: f64) -> f64 {
    const MAX_TERMS: usize = 200;

    let half_x_sq = 0.25 * x * x;
    let mut sum = 1.0;
    let mut term = 1.0;

    for k in 1..=MAX_TERMS {
        let k = k as f64;
        term *= half_x_sq / (k * k);
        sum += term;
        if term < 1e-16 * sum {
            break;
        }
    }

    sum
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rectangular_is_unity() {
        for len in [2usize, 11, 101, 251] {
            for n in 0..len {
                assert_eq!(evaluate(WindowKind::Rectangular, n, len, 3.0), 1.0);
            }
        }
    }

    #[test]
    fn test_kaiser_alpha_zero_is_rectangular() {
        let len = 51;
        for n in 0..len {
            let w = evaluate(WindowKind::Kaiser, n, len, 0.0);
            assert!((w - 1.0).abs() < 1e-15, "tap {} weight {}", n, w);
        }
    }

    #[test]
    fn test_bessel_known_values() {
        assert_eq!(bessel_i0(0.0), 1.0);
        // Reference values from Abramowitz & Stegun table 9.8
        assert!((bessel_i0(1.0) - 1.266_065_877_752_008).abs() < 1e-12);
        assert!((bessel_i0(5.0) - 27.239_871_823_604_44).abs() < 1e-9);
        let big = bessel_i0(10.0 * PI);
        assert!(big.is_finite() && big > 1e12);
    }

    #[test]
    fn test_cosine_windows_endpoints_and_center() {
        let len = 101;
        let center = 50;

        let hann_edge = evaluate(WindowKind::Hann, 0, len, 0.0);
        assert!(hann_edge.abs() < 1e-15);
        assert!((evaluate(WindowKind::Hann, center, len, 0.0) - 1.0).abs() < 1e-15);

        assert!((evaluate(WindowKind::Hamming, 0, len, 0.0) - 0.08).abs() < 1e-12);
        assert!((evaluate(WindowKind::Hamming, center, len, 0.0) - 1.0).abs() < 1e-12);

        assert!(evaluate(WindowKind::Blackman, 0, len, 0.0).abs() < 1e-12);
        assert!((evaluate(WindowKind::Blackman, center, len, 0.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_windows_are_symmetric() {
        let len = 64;
        for kind in WindowKind::all() {
            for n in 0..len / 2 {
                let a = evaluate(kind, n, len, 4.0);
                let b = evaluate(kind, len - 1 - n, len, 4.0);
                assert!((a - b).abs() < 1e-12, "{} asymmetric at {}", kind.name(), n);
            }
        }
    }

    #[test]
    fn test_kaiser_tapers_with_alpha() {
        let len = 101;
        let edge_soft = evaluate(WindowKind::Kaiser, 0, len, 1.0);
        let edge_hard = evaluate(WindowKind::Kaiser, 0, len, 8.0);
        assert!(edge_hard < edge_soft);
        assert!((evaluate(WindowKind::Kaiser, 50, len, 8.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_index_mapping() {
        for (i, kind) in WindowKind::all().iter().enumerate() {
            assert_eq!(kind.to_index(), i);
            assert_eq!(WindowKind::from_index(i), *kind);
        }
        assert_eq!(WindowKind::variants().len(), WindowKind::all().len());
        assert_eq!(WindowKind::Kaiser.name(), "Kaiser");
        assert_eq!(WindowKind::default(), WindowKind::Blackman);
    }

    #[test]
    fn test_serialized_names() {
        assert_eq!(serde_json::to_string(&WindowKind::Hann).unwrap(), "\"Hann\"");
        let kind: WindowKind = serde_json::from_str("\"Rectangular\"").unwrap();
        assert_eq!(kind, WindowKind::Rectangular);
    }
}
