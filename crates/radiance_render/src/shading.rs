//! Shading inputs for the forward sphere pass: shading mode, point lights,
//! material and the GPU uniform blocks built from them.

use bytemuck::Zeroable;
use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// Maximum number of point lights the forward program reads.
pub const MAX_LIGHTS: usize = 10;

/// Forward program variant. Debug modes output one BRDF term and bypass
/// tone mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ShadingMode {
    /// Full lighting with ambient and image-based lighting.
    #[default]
    Default,
    Fresnel,
    NormalDistribution,
    Geometry,
}

impl ShadingMode {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Default => "Default",
            Self::Fresnel => "Fresnel",
            Self::NormalDistribution => "Normal Distribution",
            Self::Geometry => "Geometry",
        }
    }

    #[must_use]
    pub const fn all() -> &'static [ShadingMode] {
        &[Self::Default, Self::Fresnel, Self::NormalDistribution, Self::Geometry]
    }

    /// Value of the `SHADING_MODE` constant in the forward program.
    #[must_use]
    pub fn index(self) -> u32 {
        match self {
            Self::Default => 0,
            Self::Fresnel => 1,
            Self::NormalDistribution => 2,
            Self::Geometry => 3,
        }
    }

    /// Whether the pass goes through the HDR frame and tone mapping.
    #[must_use]
    pub fn uses_hdr(self) -> bool {
        self == Self::Default
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointLight {
    pub position: Vec3,
    pub color: Vec3,
    pub intensity: f32,
}

impl PointLight {
    #[must_use]
    pub fn new(position: Vec3, color: Vec3, intensity: f32) -> Self {
        Self {
            position,
            color,
            intensity,
        }
    }

    /// Inverse-square falloff, capped at 1 inside unit distance.
    #[must_use]
    pub fn attenuation(&self, point: Vec3) -> f32 {
        let d2 = self.position.distance_squared(point);
        if d2 <= 0.0 { 1.0 } else { (1.0 / d2).clamp(0.0, 1.0) }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Material {
    pub color: Vec3,
    pub metalness: f32,
    pub roughness: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            color: Vec3::new(1.0, 0.71, 0.29),
            metalness: 1.0,
            roughness: 0.01,
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuPointLight {
    pub position: [f32; 4],
    // rgb color, w intensity
    pub color: [f32; 4],
}

impl From<&PointLight> for GpuPointLight {
    fn from(light: &PointLight) -> Self {
        Self {
            position: light.position.extend(1.0).to_array(),
            color: light.color.extend(light.intensity).to_array(),
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FrameUniforms {
    pub view_projection: [[f32; 4]; 4],
    pub camera_position: [f32; 4],
    pub light_count: u32,
    pub prefiltered_max_mip: f32,
    pub _pad: [u32; 2],
    pub ambient: [f32; 4],
    pub lights: [GpuPointLight; MAX_LIGHTS],
}

impl FrameUniforms {
    /// Packs the camera and up to [`MAX_LIGHTS`] lights; extra lights are dropped.
    #[must_use]
    pub fn new(
        view_projection: Mat4,
        camera_position: Vec3,
        lights: &[PointLight],
        ambient: f32,
        prefiltered_max_mip: f32,
    ) -> Self {
        if lights.len() > MAX_LIGHTS {
            log::warn!("{} point lights given, only the first {MAX_LIGHTS} are shaded", lights.len());
        }
        let mut packed = [GpuPointLight::zeroed(); MAX_LIGHTS];
        for (slot, light) in packed.iter_mut().zip(lights) {
            *slot = light.into();
        }
        Self {
            view_projection: view_projection.to_cols_array_2d(),
            camera_position: camera_position.extend(1.0).to_array(),
            light_count: lights.len().min(MAX_LIGHTS) as u32,
            prefiltered_max_mip,
            _pad: [0; 2],
            ambient: [ambient, ambient, ambient, 1.0],
            lights: packed,
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ObjectUniforms {
    pub world: [[f32; 4]; 4],
    pub color: [f32; 3],
    pub roughness: f32,
    pub metalness: f32,
    pub _pad: [f32; 3],
}

impl ObjectUniforms {
    #[must_use]
    pub fn new(world: Mat4, material: &Material) -> Self {
        Self {
            world: world.to_cols_array_2d(),
            color: material.color.to_array(),
            roughness: material.roughness,
            metalness: material.metalness,
            _pad: [0.0; 3],
        }
    }
}
