//! Luminance Reduction Engine
//!
//! Reduces the HDR frame to a single (average, minimum, maximum) luminance
//! triplet through the [`LuminancePyramid`]:
//!
//! 1. The brightness program renders the frame's luminance into all three
//!    targets of the finest level at once (MRT).
//! 2. For every coarser level, the downsample program reads the 2×2 block
//!    of the finer level below and reduces it with one [`ReductionOp`] per
//!    channel, with the viewport set to the level's `2^i` size.
//! 3. The 1×1 average is copied into a staging buffer for a blocking read.
//!
//! All passes are recorded into the caller's encoder; ordering on the queue
//! is the only synchronization between levels.

use radiance_core::{GpuTexture, Result, StagingReadback, TexelData, WgpuContext, read_texture};

use crate::fullscreen::{
    clear_attachment, create_fullscreen_pipeline, create_pipeline_layout, draw_fullscreen,
    linear_clamp_sampler, sampler_entry, texture_entry,
};
use crate::pyramid::{LUMINANCE_FORMAT, LuminancePyramid, ScaledFrame};
use crate::shaders::Program;

/// Rec. 709 luminance weights, matching the WGSL programs.
pub const LUMA_WEIGHTS: [f32; 3] = [0.2126, 0.7152, 0.0722];

/// Relative luminance of a linear RGB color.
#[inline]
#[must_use]
pub fn luminance(rgb: [f32; 3]) -> f32 {
    rgb[0] * LUMA_WEIGHTS[0] + rgb[1] * LUMA_WEIGHTS[1] + rgb[2] * LUMA_WEIGHTS[2]
}

/// Operator applied to each 2×2 block when stepping to a coarser level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReductionOp {
    Average,
    Minimum,
    Maximum,
}

impl ReductionOp {
    pub const ALL: [ReductionOp; 3] = [Self::Average, Self::Minimum, Self::Maximum];

    #[must_use]
    pub fn apply(self, block: [f32; 4]) -> f32 {
        match self {
            Self::Average => (block[0] + block[1] + block[2] + block[3]) * 0.25,
            Self::Minimum => block[0].min(block[1]).min(block[2]).min(block[3]),
            Self::Maximum => block[0].max(block[1]).max(block[2]).max(block[3]),
        }
    }
}

/// Reduced luminance of one pyramid level texel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelStats {
    pub avg: f32,
    pub min: f32,
    pub max: f32,
}

impl LevelStats {
    #[must_use]
    pub fn uniform(value: f32) -> Self {
        Self {
            avg: value,
            min: value,
            max: value,
        }
    }

    /// Reduces a 2×2 block of finer texels.
    #[must_use]
    pub fn reduce(block: [LevelStats; 4]) -> Self {
        Self {
            avg: ReductionOp::Average.apply(block.map(|s| s.avg)),
            min: ReductionOp::Minimum.apply(block.map(|s| s.min)),
            max: ReductionOp::Maximum.apply(block.map(|s| s.max)),
        }
    }
}

/// Reduces a square `size × size` grid (size a power of two) down to 1×1
/// on the host, following the same 2×2 steps as the GPU passes.
#[must_use]
pub fn reduce_on_host(luminances: &[f32], size: usize) -> LevelStats {
    let mut level: Vec<LevelStats> = luminances.iter().map(|&l| LevelStats::uniform(l)).collect();
    let mut side = size;
    while side > 1 {
        let half = side / 2;
        let mut next = Vec::with_capacity(half * half);
        for y in 0..half {
            for x in 0..half {
                let at = |dx: usize, dy: usize| level[(2 * y + dy) * side + 2 * x + dx];
                next.push(LevelStats::reduce([at(0, 0), at(1, 0), at(0, 1), at(1, 1)]));
            }
        }
        level = next;
        side = half;
    }
    level.first().copied().unwrap_or(LevelStats::uniform(0.0))
}

/// GPU state of the reduction passes.
pub struct LuminanceReducer {
    brightness_layout: wgpu::BindGroupLayout,
    brightness_pipeline: wgpu::RenderPipeline,
    downsample_layout: wgpu::BindGroupLayout,
    downsample_pipeline: wgpu::RenderPipeline,
    sampler: wgpu::Sampler,
    staging: StagingReadback,
}

impl LuminanceReducer {
    pub fn new(ctx: &WgpuContext) -> Result<Self> {
        ctx.require_render_targets(&[LUMINANCE_FORMAT])?;
        let device = &ctx.device;
        let targets = [LUMINANCE_FORMAT; 3];

        let brightness_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Brightness Layout"),
            entries: &[
                texture_entry(0, wgpu::TextureViewDimension::D2, true),
                sampler_entry(1),
            ],
        });
        let brightness_module = Program::Brightness.create_module(device);
        let brightness_pipeline = create_fullscreen_pipeline(
            device,
            "Brightness Pipeline",
            &brightness_module,
            &create_pipeline_layout(device, "Brightness Pipeline Layout", &[&brightness_layout]),
            Program::Brightness.fragment_entry(),
            &targets,
        );

        // R32Float is not filterable; the downsample program only uses textureLoad.
        let downsample_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Downsample Layout"),
            entries: &[
                texture_entry(0, wgpu::TextureViewDimension::D2, false),
                texture_entry(1, wgpu::TextureViewDimension::D2, false),
                texture_entry(2, wgpu::TextureViewDimension::D2, false),
            ],
        });
        let downsample_module = Program::Downsample.create_module(device);
        let downsample_pipeline = create_fullscreen_pipeline(
            device,
            "Downsample Pipeline",
            &downsample_module,
            &create_pipeline_layout(device, "Downsample Pipeline Layout", &[&downsample_layout]),
            Program::Downsample.fragment_entry(),
            &targets,
        );

        let staging = StagingReadback::new(ctx, "Average Luminance Staging", 1, 1, LUMINANCE_FORMAT)?;

        Ok(Self {
            brightness_layout,
            brightness_pipeline,
            downsample_layout,
            downsample_pipeline,
            sampler: linear_clamp_sampler(device, "Brightness Sampler"),
            staging,
        })
    }

    /// Records every reduction pass for `frame` and the copy of the 1×1
    /// average into the staging buffer.
    pub fn encode(
        &self,
        ctx: &WgpuContext,
        encoder: &mut wgpu::CommandEncoder,
        frame: &GpuTexture,
        pyramid: &LuminancePyramid,
    ) -> Result<()> {
        let finest = pyramid.finest();
        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Brightness BindGroup"),
            layout: &self.brightness_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(frame.shader_view()),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });
        Self::draw_level(encoder, "Brightness Pass", finest, &self.brightness_pipeline, &bind_group)?;

        for level in (0..pyramid.finest_level()).rev() {
            let (Some(target), Some(finer)) = (pyramid.level(level), pyramid.level(level + 1)) else {
                continue;
            };
            let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Downsample BindGroup"),
                layout: &self.downsample_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(finer.avg.shader_view()),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(finer.min.shader_view()),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::TextureView(finer.max.shader_view()),
                    },
                ],
            });
            Self::draw_level(encoder, "Downsample Pass", target, &self.downsample_pipeline, &bind_group)?;
        }

        self.staging.encode_copy(encoder, &pyramid.result().avg, 0, 0);
        log::debug!("Encoded luminance reduction over {} levels", pyramid.level_count());
        Ok(())
    }

    fn draw_level(
        encoder: &mut wgpu::CommandEncoder,
        label: &str,
        target: &ScaledFrame,
        pipeline: &wgpu::RenderPipeline,
        bind_group: &wgpu::BindGroup,
    ) -> Result<()> {
        let views = [
            target.avg.render_target_view()?,
            target.min.render_target_view()?,
            target.max.render_target_view()?,
        ];
        let attachments: Vec<_> = views
            .iter()
            .map(|view| clear_attachment(view, wgpu::Color::BLACK))
            .collect();

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(label),
            color_attachments: &attachments,
            ..Default::default()
        });
        let size = target.size() as f32;
        pass.set_viewport(0.0, 0.0, size, size, 0.0, 1.0);
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, bind_group, &[]);
        draw_fullscreen(&mut pass);
        Ok(())
    }

    /// Blocks until the last encoded copy is readable and returns the 1×1
    /// average luminance.
    pub fn read_average(&self, ctx: &WgpuContext) -> Result<f32> {
        let data = self.staging.read(ctx)?;
        Ok(data.texel(0, 0)[0])
    }
}

/// Reads every texel of one level's three targets. Blocking; for tools and tests.
pub fn read_level(ctx: &WgpuContext, level: &ScaledFrame) -> Result<[TexelData; 3]> {
    Ok([
        read_texture(ctx, &level.avg, 0, 0)?,
        read_texture(ctx, &level.min, 0, 0)?,
        read_texture(ctx, &level.max, 0, 0)?,
    ])
}
