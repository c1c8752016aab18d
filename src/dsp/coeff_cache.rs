//! Coefficient Cache (Dirty Tracker)
//!
//! Keeps the last design tuple and both kernels. Resynthesis happens only when
//! the tuple differs from the previous one by exact comparison, and always
//! rebuilds both kernels together.
//!
//! Exact equality means a host that jitters a smoothed value by one ulp will
//! trigger a redesign. That is accepted: cost is bounded by `MAX_TAPS`.

use super::kernel::{FilterKind, Kernel, KernelDesign};
use super::window::WindowKind;

/// The design-relevant slice of the filter settings.
///
/// Values stay in the host's single precision so that repeated reads of an
/// unchanged parameter compare equal bit for bit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DesignParams {
    pub hp_cutoff_hz: f32,
    pub lp_cutoff_hz: f32,
    pub order: usize,
    pub window: WindowKind,
    pub kaiser_alpha: f32,
}

impl DesignParams {
    #[inline]
    pub fn taps(&self) -> usize {
        self.order + 1
    }

    fn kernel_design(&self, kind: FilterKind, sample_rate: f64) -> KernelDesign {
        let cutoff = match kind {
            FilterKind::HighPass => self.hp_cutoff_hz,
            FilterKind::LowPass => self.lp_cutoff_hz,
        };
        KernelDesign {
            cutoff_hz: cutoff as f64,
            sample_rate,
            taps: self.taps(),
            window: self.window,
            alpha: self.kaiser_alpha as f64,
            kind,
        }
    }
}

/// Which kernels were rebuilt by an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KernelUpdate {
    pub high_pass: bool,
    pub low_pass: bool,
}

impl KernelUpdate {
    #[inline]
    pub fn any(&self) -> bool {
        self.high_pass || self.low_pass
    }
}

pub struct CoefficientCache {
    last: Option<DesignParams>,
    sample_rate: f64,
    high_pass: Kernel,
    low_pass: Kernel,
    resynth_count: u32,
}

impl CoefficientCache {
    pub fn new(sample_rate: f64) -> Self {
        Self {
            last: None,
            sample_rate,
            high_pass: Kernel::identity(),
            low_pass: Kernel::identity(),
            resynth_count: 0,
        }
    }

    /// Change the design sample rate. The next update always resynthesizes.
    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
        self.invalidate();
    }

    /// Forget the last tuple so the next update rebuilds both kernels.
    pub fn invalidate(&mut self) {
        self.last = None;
    }

    /// Rebuild both kernels if `params` differs from the cached tuple.
    pub fn maybe_update(&mut self, params: &DesignParams) -> KernelUpdate {
        if self.last.as_ref() == Some(params) {
            return KernelUpdate::default();
        }

        self.high_pass
            .synthesize(&params.kernel_design(FilterKind::HighPass, self.sample_rate));
        self.low_pass
            .synthesize(&params.kernel_design(FilterKind::LowPass, self.sample_rate));
        self.last = Some(*params);
        self.resynth_count = self.resynth_count.wrapping_add(1);

        KernelUpdate {
            high_pass: true,
            low_pass: true,
        }
    }

    pub fn last_params(&self) -> Option<&DesignParams> {
        self.last.as_ref()
    }

    pub fn high_pass(&self) -> &Kernel {
        &self.high_pass
    }

    pub fn low_pass(&self) -> &Kernel {
        &self.low_pass
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Number of times both kernels have been rebuilt.
    pub fn resynth_count(&self) -> u32 {
        self.resynth_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> DesignParams {
        DesignParams {
            hp_cutoff_hz: 100.0,
            lp_cutoff_hz: 8000.0,
            order: 100,
            window: WindowKind::Hann,
            kaiser_alpha: 2.5,
        }
    }

    #[test]
    fn test_first_update_synthesizes() {
        let mut cache = CoefficientCache::new(48000.0);
        let update = cache.maybe_update(&params());
        assert!(update.high_pass && update.low_pass);
        assert_eq!(cache.high_pass().len(), 101);
        assert_eq!(cache.low_pass().len(), 101);
    }

    #[test]
    fn test_identical_params_skip_resynthesis() {
        let mut cache = CoefficientCache::new(48000.0);
        cache.maybe_update(&params());
        for _ in 0..10 {
            assert!(!cache.maybe_update(&params()).any());
        }
        assert_eq!(cache.resynth_count(), 1);
    }

    #[test]
    fn test_any_field_change_rebuilds_both() {
        let mut cache = CoefficientCache::new(48000.0);
        cache.maybe_update(&params());
        let lp_before = cache.low_pass().coeffs().to_vec();

        let mut changed = params();
        changed.hp_cutoff_hz = 200.0;
        let update = cache.maybe_update(&changed);
        assert!(update.high_pass && update.low_pass);
        // Low-pass design inputs did not change, so the rebuild is identical
        assert_eq!(cache.low_pass().coeffs(), lp_before.as_slice());
    }

    #[test]
    fn test_alpha_change_rebuilds_without_kaiser() {
        let mut cache = CoefficientCache::new(48000.0);
        cache.maybe_update(&params());
        let hp_before = cache.high_pass().coeffs().to_vec();

        let mut changed = params();
        changed.kaiser_alpha = 7.0;
        assert!(cache.maybe_update(&changed).any());
        assert_eq!(cache.resynth_count(), 2);
        assert_eq!(cache.high_pass().coeffs(), hp_before.as_slice());
    }

    #[test]
    fn test_sample_rate_change_invalidates() {
        let mut cache = CoefficientCache::new(48000.0);
        cache.maybe_update(&params());
        let lp_48k = cache.low_pass().coeffs().to_vec();

        cache.set_sample_rate(96000.0);
        assert!(cache.maybe_update(&params()).any());
        assert_ne!(cache.low_pass().coeffs(), lp_48k.as_slice());
    }
}
