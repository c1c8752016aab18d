pub mod dsp;
pub mod settings;
pub mod status;

use crate::dsp::FirProcessor;
use crate::settings::{
    FilterSettings, SettingsSource, CUTOFF_MAX_HZ, CUTOFF_MIN_HZ, DEFAULT_HP_CUTOFF_HZ,
    DEFAULT_KAISER_ALPHA, DEFAULT_LP_CUTOFF_HZ, DEFAULT_ORDER, KAISER_ALPHA_MAX, ORDER_MAX,
    ORDER_MIN, ORDER_STEP,
};
use assert_no_alloc::permit_alloc;
use log::{error, info};
use nih_plug::prelude::*;
use std::sync::Arc;

pub use crate::dsp::WindowKind;

// -----------------------------------------------------------------------------
// PARAMETERS
// -----------------------------------------------------------------------------
#[derive(Params)]
pub struct FilterParams {
    #[id = "hp_cutoff"]
    pub hp_cutoff: FloatParam,

    #[id = "lp_cutoff"]
    pub lp_cutoff: FloatParam,

    /// Stored as a float so the host enforces the step of 10
    #[id = "filter_order"]
    pub filter_order: FloatParam,

    #[id = "window"]
    pub window: EnumParam<WindowKind>,

    #[id = "kaiser_alpha"]
    pub kaiser_alpha: FloatParam,

    #[id = "bypass_hp"]
    pub bypass_hp: BoolParam,

    #[id = "bypass_lp"]
    pub bypass_lp: BoolParam,
}

// Helper to format cutoffs for the DAW display
fn format_hz(v: f32) -> String {
    format!("{:.0} Hz", v)
}

fn format_taps(v: f32) -> String {
    format!("{} taps", v.round() as usize + 1)
}

fn format_alpha(v: f32) -> String {
    format!("\u{3b1} = {:.1}", v)
}

fn cutoff_param(name: &str, default: f32) -> FloatParam {
    FloatParam::new(
        name,
        default,
        FloatRange::Skewed {
            min: CUTOFF_MIN_HZ,
            max: CUTOFF_MAX_HZ,
            factor: FloatRange::skew_factor(-1.0),
        },
    )
    .with_step_size(1.0)
    .with_value_to_string(Arc::new(format_hz))
}

impl Default for FilterParams {
    fn default() -> Self {
        Self {
            hp_cutoff: cutoff_param("High Pass Cutoff Frequency", DEFAULT_HP_CUTOFF_HZ),
            lp_cutoff: cutoff_param("Low Pass Cutoff Frequency", DEFAULT_LP_CUTOFF_HZ),

            filter_order: FloatParam::new(
                "Filter Order",
                DEFAULT_ORDER as f32,
                FloatRange::Linear {
                    min: ORDER_MIN as f32,
                    max: ORDER_MAX as f32,
                },
            )
            .with_step_size(ORDER_STEP as f32)
            .with_value_to_string(Arc::new(format_taps)),

            window: EnumParam::new("Windowing Function", WindowKind::default()),

            kaiser_alpha: FloatParam::new(
                "Kaiser Alpha",
                DEFAULT_KAISER_ALPHA,
                FloatRange::Linear {
                    min: 0.0,
                    max: KAISER_ALPHA_MAX,
                },
            )
            .with_step_size(0.1)
            .with_value_to_string(Arc::new(format_alpha)),

            bypass_hp: BoolParam::new("Bypass HP", false),
            bypass_lp: BoolParam::new("Bypass LP", false),
        }
    }
}

impl SettingsSource for FilterParams {
    // No smoothers: every read returns the raw value, which keeps the
    // coefficient cache's exact comparison stable between blocks.
    fn snapshot(&self) -> FilterSettings {
        let order = self.filter_order.value().round() as usize;
        FilterSettings {
            hp_cutoff_hz: self.hp_cutoff.value(),
            lp_cutoff_hz: self.lp_cutoff.value(),
            order: order.clamp(ORDER_MIN, ORDER_MAX),
            window: self.window.value(),
            kaiser_alpha: self.kaiser_alpha.value(),
            bypass_hp: self.bypass_hp.value(),
            bypass_lp: self.bypass_lp.value(),
        }
    }
}

// -----------------------------------------------------------------------------
// PLUGIN STRUCT
// -----------------------------------------------------------------------------
pub struct FirFilterPlugin {
    params: Arc<FilterParams>,
    processor: FirProcessor,
}

impl Default for FirFilterPlugin {
    fn default() -> Self {
        Self {
            params: Arc::new(FilterParams::default()),
            processor: FirProcessor::new(),
        }
    }
}

impl Plugin for FirFilterPlugin {
    const NAME: &'static str = "FIR Filter";
    const VENDOR: &'static str = "FIR Filter Project";
    const URL: &'static str = "";
    const EMAIL: &'static str = "";
    const VERSION: &'static str = env!("CARGO_PKG_VERSION");

    const AUDIO_IO_LAYOUTS: &'static [AudioIOLayout] = &[
        AudioIOLayout {
            main_input_channels: NonZeroU32::new(2),
            main_output_channels: NonZeroU32::new(2),
            ..AudioIOLayout::const_default()
        },
        AudioIOLayout {
            main_input_channels: NonZeroU32::new(1),
            main_output_channels: NonZeroU32::new(1),
            ..AudioIOLayout::const_default()
        },
    ];

    const MIDI_INPUT: MidiConfig = MidiConfig::None;
    const SAMPLE_ACCURATE_AUTOMATION: bool = false;

    type SysExMessage = ();
    type BackgroundTask = ();

    fn params(&self) -> Arc<dyn Params> {
        self.params.clone()
    }

    // Also runs after the host restores saved state, which is where the
    // restored parameters get their kernels.
    fn initialize(
        &mut self,
        audio_io_layout: &AudioIOLayout,
        buffer_config: &BufferConfig,
        _context: &mut impl InitContext<Self>,
    ) -> bool {
        let num_channels = audio_io_layout
            .main_output_channels
            .map(NonZeroU32::get)
            .unwrap_or(0) as usize;
        let sample_rate = buffer_config.sample_rate as f64;
        let max_block_size = buffer_config.max_buffer_size as usize;

        let prepared = permit_alloc(|| {
            self.processor
                .prepare(sample_rate, max_block_size, num_channels)
        });
        if let Err(err) = prepared {
            error!("FIR Filter failed to prepare: {:#}", err);
            return false;
        }

        let settings = self.params.snapshot();
        self.processor.restore(&settings);
        info!(
            "FIR Filter prepared: {} Hz, {} channels, max block {}, {} taps ({})",
            sample_rate,
            num_channels,
            max_block_size,
            settings.order + 1,
            settings.window.name()
        );
        true
    }

    fn process(
        &mut self,
        buffer: &mut Buffer,
        _aux: &mut AuxiliaryBuffers,
        _context: &mut impl ProcessContext<Self>,
    ) -> ProcessStatus {
        std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let settings = self.params.snapshot();
            self.processor.process(buffer.as_slice(), &settings);
        }))
        .unwrap_or(());
        ProcessStatus::Normal
    }

    fn reset(&mut self) {
        self.processor.reset();
    }
}

impl ClapPlugin for FirFilterPlugin {
    const CLAP_ID: &'static str = "org.fir-filter.dual-fir";
    const CLAP_DESCRIPTION: Option<&'static str> =
        Some("Linear-phase windowed-sinc high-pass and low-pass filter");
    const CLAP_MANUAL_URL: Option<&'static str> = None;
    const CLAP_SUPPORT_URL: Option<&'static str> = None;
    const CLAP_FEATURES: &'static [ClapFeature] = &[
        ClapFeature::AudioEffect,
        ClapFeature::Filter,
        ClapFeature::Mono,
        ClapFeature::Stereo,
    ];
}

impl Vst3Plugin for FirFilterPlugin {
    const VST3_CLASS_ID: [u8; 16] = *b"FirFilterDualHPL";
    const VST3_SUBCATEGORIES: &'static [Vst3SubCategory] =
        &[Vst3SubCategory::Fx, Vst3SubCategory::Filter];
}

nih_export_clap!(FirFilterPlugin);
nih_export_vst3!(FirFilterPlugin);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_defaults_match_settings_defaults() {
        let params = FilterParams::default();
        assert_eq!(params.snapshot(), FilterSettings::default());
    }

    #[test]
    fn test_display_strings() {
        assert_eq!(format_taps(100.0), "101 taps");
        assert_eq!(format_hz(8000.4), "8000 Hz");
        assert_eq!(format_alpha(2.5), "\u{3b1} = 2.5");
    }
}
