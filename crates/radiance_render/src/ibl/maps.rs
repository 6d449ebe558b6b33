use radiance_core::{GpuTexture, ResourceRegistry};

pub const ENVIRONMENT_KEY: &str = "environment";
pub const IRRADIANCE_KEY: &str = "irradiance";
pub const PREFILTERED_KEY: &str = "prefiltered";
pub const BRDF_LUT_KEY: &str = "brdf";

/// The four precomputed IBL textures. Handles are shared; publishing them
/// into a registry does not copy GPU memory.
#[derive(Debug, Clone)]
pub struct IblMaps {
    pub environment: GpuTexture,
    pub irradiance: GpuTexture,
    pub prefiltered: GpuTexture,
    pub brdf_lut: GpuTexture,
}

impl IblMaps {
    /// Highest mip index of the prefiltered cubemap (roughness 1).
    #[must_use]
    pub fn prefiltered_max_mip(&self) -> f32 {
        self.prefiltered.mip_level_count().saturating_sub(1) as f32
    }

    /// Stores every map under its well-known key, replacing earlier assets.
    pub fn publish(&self, registry: &mut ResourceRegistry<GpuTexture>) {
        for (key, texture) in [
            (ENVIRONMENT_KEY, &self.environment),
            (IRRADIANCE_KEY, &self.irradiance),
            (PREFILTERED_KEY, &self.prefiltered),
            (BRDF_LUT_KEY, &self.brdf_lut),
        ] {
            if let Some(old) = registry.replace(key, texture.clone()) {
                log::debug!("Replaced IBL asset '{key}' (was {})", old.label());
            }
        }
    }

    /// Looks the four maps up by key.
    pub fn from_registry(registry: &ResourceRegistry<GpuTexture>) -> radiance_core::Result<Self> {
        Ok(Self {
            environment: registry.get_cloned(ENVIRONMENT_KEY)?,
            irradiance: registry.get_cloned(IRRADIANCE_KEY)?,
            prefiltered: registry.get_cloned(PREFILTERED_KEY)?,
            brdf_lut: registry.get_cloned(BRDF_LUT_KEY)?,
        })
    }
}
