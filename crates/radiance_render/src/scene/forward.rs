//! Forward PBR pass for the sphere.
//!
//! One pipeline per [`ShadingMode`], all compiled up front. The default mode
//! writes the HDR frame; debug modes write the display target directly.

use glam::Mat4;
use rustc_hash::FxHashMap;
use wgpu::util::DeviceExt;

use radiance_core::{GpuTexture, RadianceError, ResourceKind, Result, TextureSpec, WgpuContext};

use super::sphere::{SphereBuffers, SphereMesh, SphereOptions, SphereVertex};
use crate::fullscreen::{
    clear_attachment, create_pipeline_layout, linear_clamp_sampler, load_attachment, sampler_entry,
    texture_entry, uniform_entry,
};
use crate::ibl::IblMaps;
use crate::shaders::Program;
use crate::shading::{FrameUniforms, Material, ObjectUniforms, ShadingMode};

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

pub struct ForwardPass {
    pipelines: FxHashMap<ShadingMode, wgpu::RenderPipeline>,
    ibl_layout: wgpu::BindGroupLayout,
    frame_buffer: wgpu::Buffer,
    object_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    object_bind_group: wgpu::BindGroup,
    ibl_bind_group: wgpu::BindGroup,
    ibl_sampler: wgpu::Sampler,
    sphere: SphereBuffers,
    depth: GpuTexture,
}

impl ForwardPass {
    pub fn new(
        ctx: &WgpuContext,
        hdr_format: wgpu::TextureFormat,
        display_format: wgpu::TextureFormat,
        size: (u32, u32),
        ibl: &IblMaps,
    ) -> Result<Self> {
        ctx.require_render_targets(&[hdr_format, display_format, DEPTH_FORMAT])?;
        let device = &ctx.device;
        let vertex_and_fragment = wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT;

        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Forward Frame Layout"),
            entries: &[uniform_entry(0, vertex_and_fragment)],
        });
        let object_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Forward Object Layout"),
            entries: &[uniform_entry(0, vertex_and_fragment)],
        });
        let ibl_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Forward IBL Layout"),
            entries: &[
                texture_entry(0, wgpu::TextureViewDimension::Cube, true),
                texture_entry(1, wgpu::TextureViewDimension::Cube, true),
                texture_entry(2, wgpu::TextureViewDimension::D2, true),
                sampler_entry(3),
            ],
        });
        let pipeline_layout = create_pipeline_layout(
            device,
            "Forward Pipeline Layout",
            &[&frame_layout, &object_layout, &ibl_layout],
        );

        let mut pipelines = FxHashMap::default();
        for &mode in ShadingMode::all() {
            let format = if mode.uses_hdr() { hdr_format } else { display_format };
            pipelines.insert(mode, Self::create_pipeline(device, &pipeline_layout, mode, format));
        }

        let frame_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Forward Frame Uniforms"),
            size: std::mem::size_of::<FrameUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let object_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Forward Object Uniforms"),
            contents: bytemuck::bytes_of(&ObjectUniforms::new(Mat4::IDENTITY, &Material::default())),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let frame_bind_group = uniform_bind_group(device, "Forward Frame BindGroup", &frame_layout, &frame_buffer);
        let object_bind_group = uniform_bind_group(device, "Forward Object BindGroup", &object_layout, &object_buffer);

        let ibl_sampler = linear_clamp_sampler(device, "IBL Sampler");
        let ibl_bind_group = Self::create_ibl_bind_group(device, &ibl_layout, &ibl_sampler, ibl);

        let sphere = SphereBuffers::new(device, &SphereMesh::new(&SphereOptions::default()));
        let depth = Self::create_depth(ctx, size)?;

        Ok(Self {
            pipelines,
            ibl_layout,
            frame_buffer,
            object_buffer,
            frame_bind_group,
            object_bind_group,
            ibl_bind_group,
            ibl_sampler,
            sphere,
            depth,
        })
    }

    fn create_pipeline(
        device: &wgpu::Device,
        layout: &wgpu::PipelineLayout,
        mode: ShadingMode,
        format: wgpu::TextureFormat,
    ) -> wgpu::RenderPipeline {
        let program = Program::Pbr(mode);
        let module = program.create_module(device);
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&format!("Forward Pipeline ({})", mode.name())),
            layout: Some(layout),
            vertex: wgpu::VertexState {
                module: &module,
                entry_point: Some(program.vertex_entry()),
                buffers: &[SphereVertex::layout()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &module,
                entry_point: Some(program.fragment_entry()),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: Some(true),
                depth_compare: Some(wgpu::CompareFunction::Less),
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        })
    }

    fn create_ibl_bind_group(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
        ibl: &IblMaps,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Forward IBL BindGroup"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(ibl.irradiance.shader_view()),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(ibl.prefiltered.shader_view()),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(ibl.brdf_lut.shader_view()),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        })
    }

    fn create_depth(ctx: &WgpuContext, (width, height): (u32, u32)) -> Result<GpuTexture> {
        let mut spec = TextureSpec::render_target("Forward Depth", width, height, DEPTH_FORMAT);
        spec.usage = wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING;
        GpuTexture::new(ctx, spec)
    }

    /// Rebinds the lighting maps after the IBL assets were regenerated.
    pub fn set_ibl(&mut self, ctx: &WgpuContext, ibl: &IblMaps) {
        self.ibl_bind_group = Self::create_ibl_bind_group(&ctx.device, &self.ibl_layout, &self.ibl_sampler, ibl);
    }

    pub fn resize(&mut self, ctx: &WgpuContext, size: (u32, u32)) -> Result<()> {
        self.depth = Self::create_depth(ctx, size)?;
        Ok(())
    }

    pub fn update(&self, queue: &wgpu::Queue, frame: &FrameUniforms, object: &ObjectUniforms) {
        queue.write_buffer(&self.frame_buffer, 0, bytemuck::bytes_of(frame));
        queue.write_buffer(&self.object_buffer, 0, bytemuck::bytes_of(object));
    }

    /// Draws the sphere into `target`. `clear` clears the color target first;
    /// depth is always cleared.
    pub fn encode(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        mode: ShadingMode,
        clear: Option<wgpu::Color>,
    ) -> Result<()> {
        let pipeline = self.pipelines.get(&mode).ok_or_else(|| RadianceError::MissingResource {
            kind: ResourceKind::Shader,
            key: Program::Pbr(mode).label().into_owned(),
        })?;
        let depth_view = self.depth.render_target_view()?;
        let color = match clear {
            Some(color) => clear_attachment(target, color),
            None => load_attachment(target),
        };

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Forward Pass"),
            color_attachments: &[color],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            ..Default::default()
        });
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, &self.frame_bind_group, &[]);
        pass.set_bind_group(1, &self.object_bind_group, &[]);
        pass.set_bind_group(2, &self.ibl_bind_group, &[]);
        pass.set_vertex_buffer(0, self.sphere.vertex_buffer.slice(..));
        pass.set_index_buffer(self.sphere.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..self.sphere.index_count, 0, 0..1);
        Ok(())
    }
}

fn uniform_bind_group(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::BindGroupLayout,
    buffer: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: buffer.as_entire_binding(),
        }],
    })
}
