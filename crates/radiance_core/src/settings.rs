//! Renderer Settings
//!
//! Configuration consumed once when the [`WgpuContext`](crate::WgpuContext) and
//! the renderer are created.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use radiance_core::RendererSettings;
//!
//! let settings = RendererSettings {
//!     width: 1920,
//!     height: 1080,
//!     ..Default::default()
//! };
//! ```

/// Smallest side length the renderer accepts on resize.
pub const MIN_TARGET_SIZE: u32 = 8;

/// Global configuration for context and renderer initialization.
///
/// # Fields
///
/// | Field                | Description                                  | Default            |
/// |----------------------|----------------------------------------------|--------------------|
/// | `width` / `height`   | Initial render resolution                    | 1280 × 720         |
/// | `power_preference`   | GPU adapter selection strategy               | `HighPerformance`  |
/// | `hdr_format`         | Live HDR frame format                        | `Rgba16Float`      |
/// | `display_format`     | Final 8-bit display target format            | `Rgba8UnormSrgb`   |
/// | `clear_color`        | HDR frame and display clear color            | 0.25 gray          |
/// | `prefer_float32_filtering` | Request `FLOAT32_FILTERABLE` if present | `true`            |
#[derive(Debug, Clone)]
pub struct RendererSettings {
    // === Resolution ===
    /// Initial render width in pixels.
    pub width: u32,
    /// Initial render height in pixels.
    pub height: u32,

    // === GPU / Adapter Configuration ===
    /// GPU adapter selection preference.
    ///
    /// - `HighPerformance`: Prefer discrete / dedicated GPU
    /// - `LowPower`: Prefer integrated GPU
    pub power_preference: wgpu::PowerPreference,

    /// Request the `FLOAT32_FILTERABLE` feature when the adapter offers it.
    ///
    /// With it, IBL intermediates and the equirectangular source stay in
    /// 32-bit float. Without it they fall back to `Rgba16Float`, which is
    /// always filterable.
    pub prefer_float32_filtering: bool,

    /// Extra wgpu limits the device must satisfy.
    pub required_limits: wgpu::Limits,

    // === Target Formats ===
    /// Format of the live HDR frame the scene renders into.
    pub hdr_format: wgpu::TextureFormat,

    /// Format of the final display target (8 bits per channel).
    pub display_format: wgpu::TextureFormat,

    // === Rendering Defaults ===
    /// Clear color for the HDR frame and the display target.
    pub clear_color: wgpu::Color,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            power_preference: wgpu::PowerPreference::HighPerformance,
            prefer_float32_filtering: true,
            required_limits: wgpu::Limits::default(),
            hdr_format: wgpu::TextureFormat::Rgba16Float,
            display_format: wgpu::TextureFormat::Rgba8UnormSrgb,
            clear_color: wgpu::Color {
                r: 0.25,
                g: 0.25,
                b: 0.25,
                a: 1.0,
            },
        }
    }
}

impl RendererSettings {
    /// Clamps a requested resolution to the smallest supported target.
    #[inline]
    #[must_use]
    pub fn clamp_size(width: u32, height: u32) -> (u32, u32) {
        (width.max(MIN_TARGET_SIZE), height.max(MIN_TARGET_SIZE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let s = RendererSettings::default();
        assert_eq!((s.width, s.height), (1280, 720));
        assert_eq!(s.hdr_format, wgpu::TextureFormat::Rgba16Float);
        assert!((s.clear_color.r - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn clamp_size_enforces_minimum() {
        assert_eq!(RendererSettings::clamp_size(0, 3), (8, 8));
        assert_eq!(RendererSettings::clamp_size(640, 2), (640, 8));
        assert_eq!(RendererSettings::clamp_size(640, 480), (640, 480));
    }
}
