//! Per-frame orchestration.
//!
//! [`Renderer`] is constructed explicitly and owns every per-frame resource.
//! One frame in the default shading mode:
//!
//! 1. clear the HDR frame, draw the skybox, draw the sphere
//! 2. brightness and downsample passes, copy the 1×1 average to staging
//! 3. submit, blocking read-back, adaptation update
//! 4. clear the display target and tone map into it
//!
//! Debug shading modes skip the HDR chain: the skybox clears and fills the
//! display target, then the sphere is drawn over it.

use serde::{Deserialize, Serialize};

use radiance_core::{GpuTexture, RendererSettings, ResourceKind, ResourceRegistry, Result, TextureSpec, WgpuContext};

use crate::hdr::HdrPipeline;
use crate::ibl::IblMaps;
use crate::scene::{ForwardPass, OrbitCamera, SkyboxPass};
use crate::settings::{AdaptationSettings, ToneMappingSettings};
use crate::shading::{FrameUniforms, Material, ObjectUniforms, PointLight, ShadingMode};

/// Scene-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneSettings {
    pub shading_mode: ShadingMode,
    pub material: Material,
    pub lights: Vec<PointLight>,
    /// Uniform ambient term, multiplied by the albedo.
    pub ambient: f32,
}

impl Default for SceneSettings {
    fn default() -> Self {
        Self {
            shading_mode: ShadingMode::Default,
            material: Material::default(),
            lights: vec![PointLight::new(
                glam::Vec3::new(5.0, 5.0, 5.0),
                glam::Vec3::ONE,
                1.0,
            )],
            ambient: 0.2,
        }
    }
}

/// What one call to [`Renderer::render`] produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    pub shading_mode: ShadingMode,
    /// Adapted luminance after this frame, `None` in debug modes or before
    /// the first successful read-back.
    pub adapted_luminance: Option<f32>,
}

pub struct Renderer {
    settings: RendererSettings,
    hdr: HdrPipeline,
    forward: ForwardPass,
    skybox: SkyboxPass,
    ibl: IblMaps,
    textures: ResourceRegistry<GpuTexture>,
    pub camera: OrbitCamera,
    pub scene: SceneSettings,
}

impl Renderer {
    pub fn new(
        ctx: &WgpuContext,
        settings: RendererSettings,
        adaptation: &AdaptationSettings,
        tone_mapping: &ToneMappingSettings,
        scene: SceneSettings,
        ibl: IblMaps,
    ) -> Result<Self> {
        let hdr = HdrPipeline::new(ctx, &settings, adaptation, tone_mapping)?;
        let size = hdr.size().unwrap_or((settings.width, settings.height));
        let forward = ForwardPass::new(ctx, settings.hdr_format, settings.display_format, size, &ibl)?;
        let skybox = SkyboxPass::new(ctx, &[settings.hdr_format, settings.display_format])?;

        let mut textures = ResourceRegistry::new(ResourceKind::Texture);
        ibl.publish(&mut textures);

        log::info!("Renderer ready at {}x{}", size.0, size.1);
        Ok(Self {
            settings,
            hdr,
            forward,
            skybox,
            ibl,
            textures,
            camera: OrbitCamera::default(),
            scene,
        })
    }

    /// Current render size.
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        self.hdr.size().unwrap_or((self.settings.width, self.settings.height))
    }

    #[must_use]
    pub fn hdr(&self) -> &HdrPipeline {
        &self.hdr
    }

    pub fn hdr_mut(&mut self) -> &mut HdrPipeline {
        &mut self.hdr
    }

    #[must_use]
    pub fn ibl(&self) -> &IblMaps {
        &self.ibl
    }

    /// Textures published by the renderer, keyed by name.
    #[must_use]
    pub fn textures(&self) -> &ResourceRegistry<GpuTexture> {
        &self.textures
    }

    /// Swaps in regenerated IBL assets.
    pub fn set_ibl(&mut self, ctx: &WgpuContext, ibl: IblMaps) {
        self.forward.set_ibl(ctx, &ibl);
        ibl.publish(&mut self.textures);
        self.ibl = ibl;
    }

    /// Rebuilds every size-dependent target. Each side is clamped to at
    /// least 8 pixels. Display targets created for the old size must be
    /// recreated by the caller.
    pub fn resize(&mut self, ctx: &WgpuContext, width: u32, height: u32) -> Result<()> {
        let (width, height) = RendererSettings::clamp_size(width, height);
        self.hdr.resize(ctx, width, height)?;
        self.forward.resize(ctx, (width, height))?;
        self.settings.width = width;
        self.settings.height = height;
        log::info!("Resized renderer to {width}x{height}");
        Ok(())
    }

    /// 8-bit target matching the current size and display format.
    pub fn create_display_target(&self, ctx: &WgpuContext) -> Result<GpuTexture> {
        let (width, height) = self.size();
        GpuTexture::new(
            ctx,
            TextureSpec::render_target("Display Target", width, height, self.settings.display_format),
        )
    }

    fn upload_scene(&self, ctx: &WgpuContext) {
        let (width, height) = self.size();
        let aspect = width as f32 / height as f32;

        let frame = FrameUniforms::new(
            self.camera.view_projection(aspect),
            self.camera.position(),
            &self.scene.lights,
            self.scene.ambient,
            self.ibl.prefiltered_max_mip(),
        );
        let object = ObjectUniforms::new(glam::Mat4::IDENTITY, &self.scene.material);
        self.forward.update(&ctx.queue, &frame, &object);
        self.skybox.update(&ctx.queue, self.camera.rotation_view_projection(aspect));
    }

    /// Renders one frame into `target`, measuring `dt` with the wall clock.
    pub fn render(&mut self, ctx: &WgpuContext, target: &wgpu::TextureView) -> Result<FrameReport> {
        self.render_frame(ctx, target, None)
    }

    /// Renders one frame with an explicit adaptation step.
    pub fn render_with_dt(&mut self, ctx: &WgpuContext, target: &wgpu::TextureView, dt: f32) -> Result<FrameReport> {
        self.render_frame(ctx, target, Some(dt))
    }

    fn render_frame(&mut self, ctx: &WgpuContext, target: &wgpu::TextureView, dt: Option<f32>) -> Result<FrameReport> {
        self.upload_scene(ctx);
        let mode = self.scene.shading_mode;

        if !mode.uses_hdr() {
            let mut encoder = ctx.create_encoder("Debug Shading Encoder");
            self.skybox.encode(
                ctx,
                &mut encoder,
                target,
                self.settings.display_format,
                &self.ibl.environment,
                Some(self.hdr.clear_color()),
            )?;
            self.forward.encode(&mut encoder, target, mode, None)?;
            ctx.submit(encoder);
            return Ok(FrameReport {
                shading_mode: mode,
                adapted_luminance: None,
            });
        }

        let mut encoder = ctx.create_encoder("Scene Encoder");
        self.hdr.encode_clear(&mut encoder)?;
        let frame_view = self.hdr.frame()?.render_target_view()?;
        self.skybox.encode(
            ctx,
            &mut encoder,
            &frame_view,
            self.settings.hdr_format,
            &self.ibl.environment,
            None,
        )?;
        self.forward.encode(&mut encoder, &frame_view, mode, None)?;
        ctx.submit(encoder);

        let adapted_luminance = self.hdr.process(ctx, target, dt)?;
        Ok(FrameReport {
            shading_mode: mode,
            adapted_luminance,
        })
    }
}
