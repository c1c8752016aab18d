use crate::dsp::coeff_cache::DesignParams;
use crate::dsp::fir::Bypass;
use crate::dsp::window::WindowKind;
use serde::{Deserialize, Serialize};

// =============================================================================
// PARAMETER RANGES
// =============================================================================

pub const CUTOFF_MIN_HZ: f32 = 10.0;
pub const CUTOFF_MAX_HZ: f32 = 20000.0;
pub const ORDER_MIN: usize = 10;
pub const ORDER_MAX: usize = 250;
pub const ORDER_STEP: usize = 10;
pub const KAISER_ALPHA_MAX: f32 = 10.0;

pub const DEFAULT_HP_CUTOFF_HZ: f32 = CUTOFF_MIN_HZ;
pub const DEFAULT_LP_CUTOFF_HZ: f32 = CUTOFF_MAX_HZ;
pub const DEFAULT_ORDER: usize = ORDER_MIN;
pub const DEFAULT_KAISER_ALPHA: f32 = 2.5;

// =============================================================================
// SNAPSHOT
// =============================================================================

/// One coherent read of every filter parameter.
///
/// Taken once per block from the parameter store. Fields are read
/// individually, so a snapshot may mix values from before and after a
/// concurrent edit; the design tolerates that.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSettings {
    pub hp_cutoff_hz: f32,
    pub lp_cutoff_hz: f32,
    pub order: usize,
    pub window: WindowKind,
    pub kaiser_alpha: f32,
    pub bypass_hp: bool,
    pub bypass_lp: bool,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            hp_cutoff_hz: DEFAULT_HP_CUTOFF_HZ,
            lp_cutoff_hz: DEFAULT_LP_CUTOFF_HZ,
            order: DEFAULT_ORDER,
            window: WindowKind::default(),
            kaiser_alpha: DEFAULT_KAISER_ALPHA,
            bypass_hp: false,
            bypass_lp: false,
        }
    }
}

impl FilterSettings {
    /// The fields that feed kernel synthesis.
    pub fn design(&self) -> DesignParams {
        DesignParams {
            hp_cutoff_hz: self.hp_cutoff_hz,
            lp_cutoff_hz: self.lp_cutoff_hz,
            order: self.order,
            window: self.window,
            kaiser_alpha: self.kaiser_alpha,
        }
    }

    pub fn bypass(&self) -> Bypass {
        Bypass {
            high_pass: self.bypass_hp,
            low_pass: self.bypass_lp,
        }
    }

    pub fn from_parts(design: &DesignParams, bypass: Bypass) -> Self {
        Self {
            hp_cutoff_hz: design.hp_cutoff_hz,
            lp_cutoff_hz: design.lp_cutoff_hz,
            order: design.order,
            window: design.window,
            kaiser_alpha: design.kaiser_alpha,
            bypass_hp: bypass.high_pass,
            bypass_lp: bypass.low_pass,
        }
    }

    /// Whether every field lies inside the host parameter ranges. The audio
    /// path never checks this; it is for data arriving from outside a host.
    pub fn is_in_range(&self) -> bool {
        let cutoff_ok = |hz: f32| (CUTOFF_MIN_HZ..=CUTOFF_MAX_HZ).contains(&hz);
        cutoff_ok(self.hp_cutoff_hz)
            && cutoff_ok(self.lp_cutoff_hz)
            && (ORDER_MIN..=ORDER_MAX).contains(&self.order)
            && (0.0..=KAISER_ALPHA_MAX).contains(&self.kaiser_alpha)
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a saved snapshot. Missing fields take their defaults; values
    /// outside the parameter ranges are rejected.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let settings: FilterSettings = serde_json::from_str(json)?;
        if !settings.is_in_range() {
            anyhow::bail!("filter settings out of range: {:?}", settings);
        }
        Ok(settings)
    }
}

/// Read-only access to the current parameter values.
pub trait SettingsSource {
    fn snapshot(&self) -> FilterSettings;
}

impl SettingsSource for FilterSettings {
    fn snapshot(&self) -> FilterSettings {
        *self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_parameter_layout() {
        let s = FilterSettings::default();
        assert_eq!(s.hp_cutoff_hz, 10.0);
        assert_eq!(s.lp_cutoff_hz, 20000.0);
        assert_eq!(s.order, 10);
        assert_eq!(s.window, WindowKind::Blackman);
        assert_eq!(s.kaiser_alpha, 2.5);
        assert!(!s.bypass_hp && !s.bypass_lp);
        assert!(s.is_in_range());
    }

    #[test]
    fn test_json_restores_snapshot() {
        let s = FilterSettings {
            hp_cutoff_hz: 120.0,
            lp_cutoff_hz: 9000.0,
            order: 180,
            window: WindowKind::Kaiser,
            kaiser_alpha: 6.3,
            bypass_hp: true,
            bypass_lp: false,
        };
        let json = s.to_json().unwrap();
        assert!(json.contains("\"Kaiser\""));
        assert_eq!(FilterSettings::from_json(&json).unwrap(), s);
    }

    #[test]
    fn test_json_partial_uses_defaults() {
        let s = FilterSettings::from_json(r#"{ "order": 100, "window": "Hann" }"#).unwrap();
        assert_eq!(s.order, 100);
        assert_eq!(s.window, WindowKind::Hann);
        assert_eq!(s.lp_cutoff_hz, DEFAULT_LP_CUTOFF_HZ);
    }

    #[test]
    fn test_json_rejects_out_of_range() {
        assert!(FilterSettings::from_json(r#"{ "order": 400 }"#).is_err());
        assert!(FilterSettings::from_json(r#"{ "hp_cutoff_hz": 5.0 }"#).is_err());
        assert!(FilterSettings::from_json("not json").is_err());
    }

    #[test]
    fn test_design_and_bypass_split() {
        let s = FilterSettings {
            bypass_lp: true,
            ..FilterSettings::default()
        };
        assert_eq!(FilterSettings::from_parts(&s.design(), s.bypass()), s);
        assert!(s.bypass().low_pass && !s.bypass().high_pass);
    }
}
