//! Mip chain generation by repeated linear blits.

use rustc_hash::FxHashMap;

use radiance_core::{GpuTexture, RadianceError, Result, WgpuContext};

use crate::fullscreen::{
    clear_attachment, create_fullscreen_pipeline, create_pipeline_layout, draw_fullscreen,
    linear_clamp_sampler, sampler_entry, texture_entry,
};
use crate::shaders::Program;

/// Fills mips `1..` of every layer by blitting each level from its parent.
///
/// wgpu has no automatic mip generation. Each (layer, mip) pair is viewed as
/// a plain 2D texture, so cubemaps and 2D textures share one pipeline per
/// format.
pub struct MipmapGenerator {
    layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    sampler: wgpu::Sampler,
    shader: wgpu::ShaderModule,
    pipelines: FxHashMap<wgpu::TextureFormat, wgpu::RenderPipeline>,
}

impl MipmapGenerator {
    pub fn new(device: &wgpu::Device) -> Self {
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Mipmap Layout"),
            entries: &[
                // Cube faces are bound as single-layer D2 views.
                texture_entry(0, wgpu::TextureViewDimension::D2, true),
                sampler_entry(1),
            ],
        });
        let pipeline_layout = create_pipeline_layout(device, "Mipmap Pipeline Layout", &[&layout]);

        Self {
            layout,
            pipeline_layout,
            sampler: linear_clamp_sampler(device, "Mipmap Sampler"),
            shader: Program::MipmapBlit.create_module(device),
            pipelines: FxHashMap::default(),
        }
    }

    fn pipeline(&mut self, device: &wgpu::Device, format: wgpu::TextureFormat) -> wgpu::RenderPipeline {
        self.pipelines
            .entry(format)
            .or_insert_with(|| {
                create_fullscreen_pipeline(
                    device,
                    &format!("Mipmap Pipeline {format:?}"),
                    &self.shader,
                    &self.pipeline_layout,
                    Program::MipmapBlit.fragment_entry(),
                    &[format],
                )
            })
            .clone()
    }

    /// Number of cached per-format pipelines.
    #[must_use]
    pub fn pipeline_count(&self) -> usize {
        self.pipelines.len()
    }

    /// Records blits for every layer and every mip below the first.
    pub fn generate(&mut self, ctx: &WgpuContext, encoder: &mut wgpu::CommandEncoder, texture: &GpuTexture) -> Result<()> {
        let mip_count = texture.mip_level_count();
        if mip_count < 2 {
            return Ok(());
        }
        if !ctx.is_filterable(texture.format()) {
            return Err(RadianceError::UnsupportedFormat {
                format: texture.format(),
                usage: "filtering",
            });
        }
        ctx.require_render_targets(&[texture.format()])?;

        let pipeline = self.pipeline(&ctx.device, texture.format());

        for layer in 0..texture.layer_count() {
            for mip in 0..mip_count - 1 {
                let src_view = texture.texture().create_view(&wgpu::TextureViewDescriptor {
                    label: Some("Mipmap Src"),
                    format: None,
                    dimension: Some(wgpu::TextureViewDimension::D2),
                    usage: Some(wgpu::TextureUsages::TEXTURE_BINDING),
                    aspect: wgpu::TextureAspect::All,
                    base_mip_level: mip,
                    mip_level_count: Some(1),
                    base_array_layer: layer,
                    array_layer_count: Some(1),
                });
                let dst_view = texture.target_view(layer, mip + 1)?;

                let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("Mipmap BG"),
                    layout: &self.layout,
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: wgpu::BindingResource::TextureView(&src_view),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: wgpu::BindingResource::Sampler(&self.sampler),
                        },
                    ],
                });

                let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Mipmap Pass"),
                    color_attachments: &[clear_attachment(&dst_view, wgpu::Color::BLACK)],
                    ..Default::default()
                });
                pass.set_pipeline(&pipeline);
                pass.set_bind_group(0, &bind_group, &[]);
                draw_fullscreen(&mut pass);
            }
        }

        log::debug!(
            "Generated {} mips for '{}' across {} layers",
            mip_count - 1,
            texture.label(),
            texture.layer_count()
        );
        Ok(())
    }
}
