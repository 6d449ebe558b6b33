//! # Radiance
//!
//! HDR forward rendering on wgpu with eye-adapted tone mapping and
//! image-based lighting precomputation.
//!
//! The engine is split into two crates, re-exported here:
//!
//! - [`radiance_core`]: GPU context, shared texture handles, keyed registries,
//!   read-back and errors
//! - [`radiance_render`]: luminance pyramid and reduction, eye adaptation, tone
//!   mapping, IBL generation and the frame renderer
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use radiance::prelude::*;
//!
//! let settings = RendererSettings::default();
//! let ctx = WgpuContext::new_headless_blocking(&settings)?;
//!
//! let mut ibl = CubemapGenerator::new(&ctx, IblSettings::default())?;
//! let maps = ibl.generate_all(&ctx, &HdrImage::uniform(64, 32, [1.0, 1.0, 1.0]))?;
//!
//! let mut renderer = Renderer::new(
//!     &ctx,
//!     settings,
//!     &AdaptationSettings::default(),
//!     &ToneMappingSettings::default(),
//!     SceneSettings::default(),
//!     maps,
//! )?;
//! let display = renderer.create_display_target(&ctx)?;
//! renderer.render(&ctx, &display.render_target_view()?)?;
//! ```

pub use radiance_core;
pub use radiance_render;

pub use radiance_core::{GpuTexture, RadianceError, RendererSettings, Result, WgpuContext};
pub use radiance_render::{Renderer, SceneSettings};

pub mod prelude {
    pub use radiance_core::{
        GpuTexture, RadianceError, RendererSettings, ResourceKind, ResourceRegistry, Result,
        TextureShape, TextureSpec, Timer, WgpuContext, read_texture,
    };
    pub use radiance_render::{
        AdaptationSettings, AdaptationState, CubeFace, CubemapGenerator, EyeAdaptation, FrameReport,
        HdrImage, HdrPipeline, IblMaps, IblSettings, LuminancePyramid, LuminanceReducer, Material,
        OrbitCamera, PointLight, ReductionOp, Renderer, SceneSettings, ShadingMode,
        ToneMappingOperator, ToneMappingSettings,
    };
}
