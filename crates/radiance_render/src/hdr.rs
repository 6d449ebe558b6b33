//! HDR frame pipeline
//!
//! Owns the live HDR frame target, the reduction pyramid built for it, the
//! reducer, the adaptation filter and the tone-map pass, and sequences them:
//!
//! ```text
//! encode_reduction → submit → adapt (blocking read) → encode_tone_map
//! ```
//!
//! Resizing tears down the frame and the pyramid before rebuilding them and
//! resets adaptation.

use radiance_core::{GpuTexture, RendererSettings, Result, TextureSpec, Timer, WgpuContext};

use crate::adaptation::EyeAdaptation;
use crate::fullscreen::clear_attachment;
use crate::pyramid::LuminancePyramid;
use crate::reduction::LuminanceReducer;
use crate::settings::{AdaptationSettings, ToneMappingSettings};
use crate::tone_mapping::ToneMapPass;

pub struct HdrPipeline {
    frame: Option<GpuTexture>,
    pyramid: Option<LuminancePyramid>,
    reducer: LuminanceReducer,
    adaptation: EyeAdaptation,
    tone_map: ToneMapPass,
    timer: Timer,
    hdr_format: wgpu::TextureFormat,
    clear_color: wgpu::Color,
    pub tone_mapping: ToneMappingSettings,
}

impl HdrPipeline {
    pub fn new(
        ctx: &WgpuContext,
        settings: &RendererSettings,
        adaptation: &AdaptationSettings,
        tone_mapping: &ToneMappingSettings,
    ) -> Result<Self> {
        ctx.require_render_targets(&[settings.hdr_format, settings.display_format])?;
        let mut pipeline = Self {
            frame: None,
            pyramid: None,
            reducer: LuminanceReducer::new(ctx)?,
            adaptation: EyeAdaptation::new(adaptation),
            tone_map: ToneMapPass::new(&ctx.device, settings.display_format, tone_mapping),
            timer: Timer::new(),
            hdr_format: settings.hdr_format,
            clear_color: settings.clear_color,
            tone_mapping: *tone_mapping,
        };
        pipeline.resize(ctx, settings.width, settings.height)?;
        Ok(pipeline)
    }

    /// Rebuilds the frame and pyramid for a new size. Sides below the
    /// minimum are clamped. On error the pipeline is left without targets.
    pub fn resize(&mut self, ctx: &WgpuContext, width: u32, height: u32) -> Result<()> {
        let (width, height) = RendererSettings::clamp_size(width, height);

        // Release the old chain before allocating the new one.
        self.pyramid = None;
        self.frame = None;

        let frame = GpuTexture::new(ctx, TextureSpec::render_target("HDR Frame", width, height, self.hdr_format))?;
        let pyramid = LuminancePyramid::build(ctx, width, height)?;
        self.frame = Some(frame);
        self.pyramid = Some(pyramid);

        self.adaptation.reset();
        self.timer.restart();
        Ok(())
    }

    #[must_use]
    pub fn size(&self) -> Option<(u32, u32)> {
        self.frame.as_ref().map(|f| (f.width(), f.height()))
    }

    /// The frame scene passes render into.
    pub fn frame(&self) -> Result<&GpuTexture> {
        self.frame.as_ref().ok_or_else(|| missing("HDR Frame"))
    }

    pub fn pyramid(&self) -> Result<&LuminancePyramid> {
        self.pyramid.as_ref().ok_or_else(|| missing("Luminance Pyramid"))
    }

    #[must_use]
    pub fn adaptation(&self) -> &EyeAdaptation {
        &self.adaptation
    }

    pub fn adaptation_mut(&mut self) -> &mut EyeAdaptation {
        &mut self.adaptation
    }

    #[must_use]
    pub fn tone_map_pass(&self) -> &ToneMapPass {
        &self.tone_map
    }

    #[must_use]
    pub fn clear_color(&self) -> wgpu::Color {
        self.clear_color
    }

    /// Color used by [`Self::encode_clear`] and the tone-map target clear.
    pub fn set_clear_color(&mut self, color: wgpu::Color) {
        self.clear_color = color;
    }

    /// Clears the HDR frame.
    pub fn encode_clear(&self, encoder: &mut wgpu::CommandEncoder) -> Result<()> {
        let view = self.frame()?.render_target_view()?;
        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("HDR Clear Pass"),
            color_attachments: &[clear_attachment(&view, self.clear_color)],
            ..Default::default()
        });
        Ok(())
    }

    /// Records the full reduction of the current frame.
    pub fn encode_reduction(&self, ctx: &WgpuContext, encoder: &mut wgpu::CommandEncoder) -> Result<()> {
        self.reducer.encode(ctx, encoder, self.frame()?, self.pyramid()?)
    }

    /// Reads back the reduced average and advances adaptation by the wall
    /// time since the previous call. The encoder holding the reduction must
    /// already be submitted.
    pub fn adapt(&mut self, ctx: &WgpuContext) -> Result<Option<f32>> {
        let dt = self.timer.tick();
        self.adapt_with_dt(ctx, dt)
    }

    /// Like [`Self::adapt`] with an explicit step.
    ///
    /// A failed read-back skips this frame's update and keeps the previous
    /// adapted value; other errors propagate.
    pub fn adapt_with_dt(&mut self, ctx: &WgpuContext, dt: f32) -> Result<Option<f32>> {
        let sample = self.reducer.read_average(ctx);
        self.adaptation.update_from_readback(sample, dt)
    }

    /// Uploads the adapted luminance and records the tone-map pass into `target`.
    pub fn encode_tone_map(
        &mut self,
        ctx: &WgpuContext,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
    ) -> Result<()> {
        let adapted = self.adaptation.adapted().unwrap_or(self.tone_mapping.key_value);
        self.tone_map.update(&ctx.queue, &self.tone_mapping, adapted);

        let frame = self.frame.as_ref().ok_or_else(|| missing("HDR Frame"))?;
        let pyramid = self.pyramid.as_ref().ok_or_else(|| missing("Luminance Pyramid"))?;
        self.tone_map.encode(ctx, encoder, frame, pyramid, target, self.clear_color);
        Ok(())
    }

    /// Reduction, read-back, adaptation and tone mapping for an already
    /// rendered frame. Returns the adapted luminance.
    pub fn process(&mut self, ctx: &WgpuContext, target: &wgpu::TextureView, dt: Option<f32>) -> Result<Option<f32>> {
        let mut encoder = ctx.create_encoder("HDR Reduction Encoder");
        self.encode_reduction(ctx, &mut encoder)?;
        ctx.submit(encoder);

        let adapted = match dt {
            Some(dt) => self.adapt_with_dt(ctx, dt)?,
            None => self.adapt(ctx)?,
        };

        let mut encoder = ctx.create_encoder("Tone Map Encoder");
        self.encode_tone_map(ctx, &mut encoder, target)?;
        ctx.submit(encoder);
        Ok(adapted)
    }
}

fn missing(key: &str) -> radiance_core::RadianceError {
    radiance_core::RadianceError::MissingResource {
        kind: radiance_core::ResourceKind::Texture,
        key: key.to_owned(),
    }
}
