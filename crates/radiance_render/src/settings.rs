//! Pass Settings
//!
//! Pure-data configuration for the HDR chain and IBL precomputation. All
//! structs derive `serde` so applications can load them from a config file.
//!
//! ```rust,ignore
//! use radiance_render::settings::{ToneMappingOperator, ToneMappingSettings};
//!
//! let tone = ToneMappingSettings {
//!     operator: ToneMappingOperator::ReinhardExtended,
//!     ..Default::default()
//! };
//! ```

use serde::{Deserialize, Serialize};

// ============================================================================
// Eye adaptation
// ============================================================================

/// Temporal eye-adaptation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaptationSettings {
    /// Decay time constant `s` in seconds. Zero or less snaps to every sample.
    pub time_constant: f32,
}

impl Default for AdaptationSettings {
    fn default() -> Self {
        Self { time_constant: 0.5 }
    }
}

// ============================================================================
// Tone mapping
// ============================================================================

/// Curve applied to the exposed HDR color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ToneMappingOperator {
    /// Filmic curve normalized by the white point.
    #[default]
    Uncharted2,
    /// Extended Reinhard using the scene's min/max luminance as black/white points.
    ReinhardExtended,
}

impl ToneMappingOperator {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Uncharted2 => "Uncharted 2",
            Self::ReinhardExtended => "Reinhard Extended",
        }
    }

    #[must_use]
    pub const fn all() -> &'static [ToneMappingOperator] {
        &[Self::Uncharted2, Self::ReinhardExtended]
    }

    /// Value of the `tone_operator` uniform.
    #[must_use]
    pub fn shader_index(self) -> u32 {
        match self {
            Self::Uncharted2 => 0,
            Self::ReinhardExtended => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToneMappingSettings {
    pub operator: ToneMappingOperator,
    /// Middle-gray key the adapted luminance is exposed to.
    pub key_value: f32,
    /// Linear white point of the filmic curve.
    pub white_point: f32,
}

impl Default for ToneMappingSettings {
    fn default() -> Self {
        Self {
            operator: ToneMappingOperator::Uncharted2,
            key_value: 0.18,
            white_point: 11.2,
        }
    }
}

// ============================================================================
// Image-based lighting
// ============================================================================

/// Sizes and sample counts of the precomputed IBL assets.
///
/// | Field                 | Default                      |
/// |-----------------------|------------------------------|
/// | `environment_size`    | 512                          |
/// | `irradiance_size`     | 32                           |
/// | `prefiltered_size`    | 128                          |
/// | `brdf_lut_size`       | 128                          |
/// | `roughness_levels`    | 0, 0.25, 0.5, 0.75, 1        |
/// | `prefilter_samples`   | 1024                         |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IblSettings {
    pub environment_size: u32,
    pub irradiance_size: u32,
    pub prefiltered_size: u32,
    pub brdf_lut_size: u32,
    /// One prefiltered mip per entry, finest first.
    pub roughness_levels: Vec<f32>,
    /// GGX samples per prefiltered texel.
    pub prefilter_samples: u32,
}

impl Default for IblSettings {
    fn default() -> Self {
        Self {
            environment_size: 512,
            irradiance_size: 32,
            prefiltered_size: 128,
            brdf_lut_size: 128,
            roughness_levels: vec![0.0, 0.25, 0.5, 0.75, 1.0],
            prefilter_samples: 1024,
        }
    }
}

impl IblSettings {
    /// Number of prefiltered mips, limited by the base size.
    #[must_use]
    pub fn prefiltered_mip_count(&self) -> u32 {
        let levels = u32::try_from(self.roughness_levels.len()).unwrap_or(u32::MAX);
        levels
            .min(radiance_core::resources::full_mip_count(self.prefiltered_size))
            .max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        assert!((AdaptationSettings::default().time_constant - 0.5).abs() < f32::EPSILON);
        let tone = ToneMappingSettings::default();
        assert_eq!(tone.operator, ToneMappingOperator::Uncharted2);
        assert!((tone.key_value - 0.18).abs() < f32::EPSILON);
        assert_eq!(IblSettings::default().prefiltered_mip_count(), 5);
    }

    #[test]
    fn prefiltered_mips_clamp_to_base_size() {
        let ibl = IblSettings {
            prefiltered_size: 4,
            ..Default::default()
        };
        assert_eq!(ibl.prefiltered_mip_count(), 3);
    }

    #[test]
    fn settings_deserialize_with_partial_fields() {
        let tone: ToneMappingSettings =
            serde_json::from_str(r#"{ "operator": "ReinhardExtended" }"#).unwrap();
        assert_eq!(tone.operator, ToneMappingOperator::ReinhardExtended);
        assert!((tone.white_point - 11.2).abs() < f32::EPSILON);

        let ibl: IblSettings = serde_json::from_str(r#"{ "environment_size": 256 }"#).unwrap();
        assert_eq!(ibl.environment_size, 256);
        assert_eq!(ibl.roughness_levels.len(), 5);
    }

    #[test]
    fn operator_indices_match_shader() {
        let indices: Vec<u32> = ToneMappingOperator::all().iter().map(|o| o.shader_index()).collect();
        assert_eq!(indices, vec![0, 1]);
    }
}
