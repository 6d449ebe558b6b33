//! Environment background pass.
//!
//! Drawn into the HDR frame before geometry in the default shading mode, and
//! straight into the display target in the debug modes.

use glam::Mat4;
use rustc_hash::FxHashMap;
use wgpu::util::DeviceExt;

use radiance_core::{GpuTexture, RadianceError, ResourceKind, Result, WgpuContext};

use crate::fullscreen::{
    clear_attachment, create_fullscreen_pipeline, create_pipeline_layout, draw_fullscreen,
    linear_clamp_sampler, load_attachment, sampler_entry, texture_entry, uniform_entry,
};
use crate::shaders::Program;

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SkyUniforms {
    pub inv_view_projection: [[f32; 4]; 4],
}

/// Full-screen pass drawing the environment cubemap behind the scene, with
/// one pipeline per target format.
pub struct SkyboxPass {
    layout: wgpu::BindGroupLayout,
    pipelines: FxHashMap<wgpu::TextureFormat, wgpu::RenderPipeline>,
    sampler: wgpu::Sampler,
    uniform_buffer: wgpu::Buffer,
}

impl SkyboxPass {
    pub fn new(ctx: &WgpuContext, target_formats: &[wgpu::TextureFormat]) -> Result<Self> {
        ctx.require_render_targets(target_formats)?;
        let device = &ctx.device;
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Skybox Layout"),
            entries: &[
                uniform_entry(0, wgpu::ShaderStages::FRAGMENT),
                texture_entry(1, wgpu::TextureViewDimension::Cube, true),
                sampler_entry(2),
            ],
        });
        let module = Program::Skybox.create_module(device);
        let pipeline_layout = create_pipeline_layout(device, "Skybox Pipeline Layout", &[&layout]);
        let pipelines = target_formats
            .iter()
            .map(|&format| {
                let pipeline = create_fullscreen_pipeline(
                    device,
                    &format!("Skybox Pipeline {format:?}"),
                    &module,
                    &pipeline_layout,
                    Program::Skybox.fragment_entry(),
                    &[format],
                );
                (format, pipeline)
            })
            .collect();
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Skybox Uniforms"),
            contents: bytemuck::bytes_of(&SkyUniforms {
                inv_view_projection: Mat4::IDENTITY.to_cols_array_2d(),
            }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        Ok(Self {
            layout,
            pipelines,
            sampler: linear_clamp_sampler(device, "Skybox Sampler"),
            uniform_buffer,
        })
    }

    /// `rotation_view_projection` must not contain the camera translation.
    pub fn update(&self, queue: &wgpu::Queue, rotation_view_projection: Mat4) {
        let uniforms = SkyUniforms {
            inv_view_projection: rotation_view_projection.inverse().to_cols_array_2d(),
        };
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));
    }

    /// Draws the environment into `target` of `format`. `clear` clears the
    /// target first; otherwise its contents are kept.
    pub fn encode(
        &self,
        ctx: &WgpuContext,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        format: wgpu::TextureFormat,
        environment: &GpuTexture,
        clear: Option<wgpu::Color>,
    ) -> Result<()> {
        let pipeline = self.pipelines.get(&format).ok_or_else(|| RadianceError::MissingResource {
            kind: ResourceKind::Shader,
            key: format!("{} ({format:?})", Program::Skybox.label()),
        })?;
        let color = match clear {
            Some(color) => clear_attachment(target, color),
            None => load_attachment(target),
        };

        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Skybox BindGroup"),
            layout: &self.layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(environment.shader_view()),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Skybox Pass"),
            color_attachments: &[color],
            ..Default::default()
        });
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        draw_fullscreen(&mut pass);
        Ok(())
    }
}
