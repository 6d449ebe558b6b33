//! Tone-Mapping Compositor
//!
//! One full-screen draw combining the HDR frame, the 1×1 luminance triplet
//! of the reduction pyramid and the adapted luminance into the display
//! target. Must be encoded after the reduction passes of the same frame.

use radiance_core::{GpuTexture, WgpuContext};
use wgpu::util::DeviceExt;

use crate::fullscreen::{
    clear_attachment, create_fullscreen_pipeline, create_pipeline_layout, draw_fullscreen,
    linear_clamp_sampler, sampler_entry, texture_entry, uniform_entry,
};
use crate::pyramid::LuminancePyramid;
use crate::settings::ToneMappingSettings;
use crate::shaders::Program;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ToneMapUniforms {
    pub adapted_luminance: f32,
    pub key_value: f32,
    pub white_point: f32,
    // 0: Uncharted2, 1: ReinhardExtended
    pub tone_operator: u32,
}

impl ToneMapUniforms {
    #[must_use]
    pub fn new(settings: &ToneMappingSettings, adapted_luminance: f32) -> Self {
        Self {
            adapted_luminance,
            key_value: settings.key_value,
            white_point: settings.white_point,
            tone_operator: settings.operator.shader_index(),
        }
    }

    /// Linear scale applied to the HDR color before the curve.
    #[must_use]
    pub fn exposure(&self) -> f32 {
        self.key_value / self.adapted_luminance.max(1e-4)
    }
}

pub struct ToneMapPass {
    layout: wgpu::BindGroupLayout,
    pipeline: wgpu::RenderPipeline,
    sampler: wgpu::Sampler,
    uniform_buffer: wgpu::Buffer,
    uniforms: ToneMapUniforms,
}

impl ToneMapPass {
    pub fn new(device: &wgpu::Device, output_format: wgpu::TextureFormat, settings: &ToneMappingSettings) -> Self {
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Tone Map Layout"),
            entries: &[
                texture_entry(0, wgpu::TextureViewDimension::D2, true),
                sampler_entry(1),
                texture_entry(2, wgpu::TextureViewDimension::D2, false),
                texture_entry(3, wgpu::TextureViewDimension::D2, false),
                texture_entry(4, wgpu::TextureViewDimension::D2, false),
                uniform_entry(5, wgpu::ShaderStages::FRAGMENT),
            ],
        });

        let module = Program::ToneMapping.create_module(device);
        let pipeline = create_fullscreen_pipeline(
            device,
            "Tone Map Pipeline",
            &module,
            &create_pipeline_layout(device, "Tone Map Pipeline Layout", &[&layout]),
            Program::ToneMapping.fragment_entry(),
            &[output_format],
        );

        let uniforms = ToneMapUniforms::new(settings, 1.0);
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("ToneMap Uniforms"),
            contents: bytemuck::bytes_of(&uniforms),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        Self {
            layout,
            pipeline,
            sampler: linear_clamp_sampler(device, "ToneMap Sampler"),
            uniform_buffer,
            uniforms,
        }
    }

    #[must_use]
    pub fn uniforms(&self) -> &ToneMapUniforms {
        &self.uniforms
    }

    /// Uploads the adapted luminance and current settings.
    pub fn update(&mut self, queue: &wgpu::Queue, settings: &ToneMappingSettings, adapted_luminance: f32) {
        self.uniforms = ToneMapUniforms::new(settings, adapted_luminance);
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&self.uniforms));
    }

    /// Clears `target` to `clear` and draws the tone-mapped frame into it.
    pub fn encode(
        &self,
        ctx: &WgpuContext,
        encoder: &mut wgpu::CommandEncoder,
        frame: &GpuTexture,
        pyramid: &LuminancePyramid,
        target: &wgpu::TextureView,
        clear: wgpu::Color,
    ) {
        let result = pyramid.result();
        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("ToneMap BindGroup"),
            layout: &self.layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(frame.shader_view()),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(result.avg.shader_view()),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(result.min.shader_view()),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::TextureView(result.max.shader_view()),
                },
                wgpu::BindGroupEntry {
                    binding: 5,
                    resource: self.uniform_buffer.as_entire_binding(),
                },
            ],
        });

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Final ToneMap Pass"),
            color_attachments: &[clear_attachment(target, clear)],
            ..Default::default()
        });
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        draw_fullscreen(&mut pass);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::ToneMappingOperator;

    #[test]
    fn uniforms_are_one_vec4() {
        assert_eq!(std::mem::size_of::<ToneMapUniforms>(), 16);
    }

    #[test]
    fn exposure_keys_adapted_luminance_to_middle_gray() {
        let settings = ToneMappingSettings::default();
        let uniforms = ToneMapUniforms::new(&settings, 0.36);
        assert!((uniforms.exposure() - 0.5).abs() < 1e-6);
        assert!(ToneMapUniforms::new(&settings, 0.0).exposure().is_finite());
    }

    #[test]
    fn operator_is_encoded() {
        let settings = ToneMappingSettings {
            operator: ToneMappingOperator::ReinhardExtended,
            ..Default::default()
        };
        assert_eq!(ToneMapUniforms::new(&settings, 1.0).tone_operator, 1);
    }
}
