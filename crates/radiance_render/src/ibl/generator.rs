//! Cubemap/IBL precomputation.
//!
//! Four generation steps, each drawing the full-screen quad once per face
//! (and per mip for the prefiltered map):
//!
//! | Step                 | Output                         | Default size |
//! |----------------------|--------------------------------|--------------|
//! | environment capture  | mipped cubemap                 | 512²         |
//! | irradiance           | cubemap, one mip               | 32²          |
//! | specular prefilter   | cubemap, one mip per roughness | 128²         |
//! | BRDF integration     | 2D lookup table                | 128²         |
//!
//! Capture and irradiance render into a scratch 2D target and copy it into
//! the face; the prefilter renders directly into per-face, per-mip views.
//! Every step records into its own encoder and submits before returning.
//! Textures built by a failing step are dropped on the error path.

use wgpu::util::DeviceExt;

use radiance_core::resources::{CUBE_FACE_COUNT, full_mip_count};
use radiance_core::{GpuTexture, Result, TextureSpec, WgpuContext};

use super::cube_face::CubeFace;
use super::maps::IblMaps;
use super::source::HdrImage;
use crate::fullscreen::{
    clear_attachment, create_fullscreen_pipeline, create_pipeline_layout, draw_fullscreen,
    linear_clamp_sampler, sampler_entry, texture_entry, uniform_entry,
};
use crate::mipmap::MipmapGenerator;
use crate::pyramid::MipChain;
use crate::settings::IblSettings;
use crate::shaders::Program;

/// Format of the BRDF lookup table (always filterable).
pub const BRDF_LUT_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

/// Per-draw parameters of the cube-face programs.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FaceUniforms {
    pub inv_view_projection: [[f32; 4]; 4],
    pub roughness: f32,
    pub sample_count: u32,
    pub source_resolution: f32,
    pub _pad: f32,
}

impl FaceUniforms {
    #[must_use]
    pub fn new(face: CubeFace, roughness: f32, sample_count: u32, source_resolution: u32) -> Self {
        Self {
            inv_view_projection: face.view_projection().inverse().to_cols_array_2d(),
            roughness,
            sample_count,
            source_resolution: source_resolution as f32,
            _pad: 0.0,
        }
    }
}

/// Generates IBL assets. Calls take `&mut self` and submit before
/// returning, so generation steps never overlap.
pub struct CubemapGenerator {
    settings: IblSettings,
    format: wgpu::TextureFormat,
    capture_layout: wgpu::BindGroupLayout,
    capture_pipeline: wgpu::RenderPipeline,
    convolve_layout: wgpu::BindGroupLayout,
    irradiance_pipeline: wgpu::RenderPipeline,
    prefilter_pipeline: wgpu::RenderPipeline,
    brdf_pipeline: wgpu::RenderPipeline,
    equirect_sampler: wgpu::Sampler,
    cube_sampler: wgpu::Sampler,
    mipmaps: MipmapGenerator,
}

impl CubemapGenerator {
    pub fn new(ctx: &WgpuContext, settings: IblSettings) -> Result<Self> {
        let device = &ctx.device;
        let format = ctx.ibl_format();
        ctx.require_render_targets(&[format, BRDF_LUT_FORMAT])?;

        let capture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Equirect Capture Layout"),
            entries: &[
                uniform_entry(0, wgpu::ShaderStages::FRAGMENT),
                texture_entry(1, wgpu::TextureViewDimension::D2, true),
                sampler_entry(2),
            ],
        });
        let convolve_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Cube Convolution Layout"),
            entries: &[
                uniform_entry(0, wgpu::ShaderStages::FRAGMENT),
                texture_entry(1, wgpu::TextureViewDimension::Cube, true),
                sampler_entry(2),
            ],
        });

        let build = |program: Program, layout: &wgpu::BindGroupLayout, target: wgpu::TextureFormat| {
            let label = program.label();
            let module = program.create_module(device);
            let bind_layouts = [layout];
            let layouts: &[&wgpu::BindGroupLayout] = if program == Program::Brdf { &[] } else { &bind_layouts };
            create_fullscreen_pipeline(
                device,
                &format!("{label} Pipeline"),
                &module,
                &create_pipeline_layout(device, &format!("{label} Pipeline Layout"), layouts),
                program.fragment_entry(),
                &[target],
            )
        };

        let capture_pipeline = build(Program::EquirectCapture, &capture_layout, format);
        let irradiance_pipeline = build(Program::Irradiance, &convolve_layout, format);
        let prefilter_pipeline = build(Program::Prefilter, &convolve_layout, format);
        let brdf_pipeline = build(Program::Brdf, &convolve_layout, BRDF_LUT_FORMAT);

        // Longitude wraps, latitude clamps at the poles.
        let equirect_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Equirect Sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Linear,
            ..Default::default()
        });

        Ok(Self {
            settings,
            format,
            capture_layout,
            capture_pipeline,
            convolve_layout,
            irradiance_pipeline,
            prefilter_pipeline,
            brdf_pipeline,
            equirect_sampler,
            cube_sampler: linear_clamp_sampler(device, "Cube Sampler"),
            mipmaps: MipmapGenerator::new(device),
        })
    }

    #[must_use]
    pub fn settings(&self) -> &IblSettings {
        &self.settings
    }

    /// Format of the environment, irradiance and prefiltered cubemaps.
    #[must_use]
    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    fn face_bind_group(
        ctx: &WgpuContext,
        layout: &wgpu::BindGroupLayout,
        uniforms: &FaceUniforms,
        source: &wgpu::TextureView,
        sampler: &wgpu::Sampler,
    ) -> wgpu::BindGroup {
        let buffer = ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Face Uniforms"),
            contents: bytemuck::bytes_of(uniforms),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Face BindGroup"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(source),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        })
    }

    fn draw_face(
        encoder: &mut wgpu::CommandEncoder,
        label: &str,
        target: &wgpu::TextureView,
        pipeline: &wgpu::RenderPipeline,
        bind_group: Option<&wgpu::BindGroup>,
    ) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(label),
            color_attachments: &[clear_attachment(target, wgpu::Color::BLACK)],
            ..Default::default()
        });
        pass.set_pipeline(pipeline);
        if let Some(bind_group) = bind_group {
            pass.set_bind_group(0, bind_group, &[]);
        }
        draw_fullscreen(&mut pass);
    }

    fn copy_to_face(encoder: &mut wgpu::CommandEncoder, scratch: &GpuTexture, cube: &GpuTexture, face: CubeFace) {
        encoder.copy_texture_to_texture(
            wgpu::TexelCopyTextureInfo {
                texture: scratch.texture(),
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyTextureInfo {
                texture: cube.texture(),
                mip_level: 0,
                origin: wgpu::Origin3d {
                    x: 0,
                    y: 0,
                    z: face.index(),
                },
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::Extent3d {
                width: scratch.width(),
                height: scratch.height(),
                depth_or_array_layers: 1,
            },
        );
    }

    /// Renders `source` onto the six faces of a new mipped cubemap and fills
    /// its mip chain.
    pub fn capture_environment(&mut self, ctx: &WgpuContext, source: &GpuTexture) -> Result<GpuTexture> {
        let size = self.settings.environment_size;
        let environment = GpuTexture::new(
            ctx,
            TextureSpec::cubemap("Environment Cubemap", size, self.format, full_mip_count(size)),
        )?;
        let scratch = GpuTexture::new(ctx, TextureSpec::render_target("Capture Face", size, size, self.format))?;
        let scratch_view = scratch.render_target_view()?;

        let mut encoder = ctx.create_encoder("Environment Capture Encoder");
        for face in CubeFace::ALL {
            let uniforms = FaceUniforms::new(face, 0.0, 0, source.width());
            let bind_group = Self::face_bind_group(
                ctx,
                &self.capture_layout,
                &uniforms,
                source.shader_view(),
                &self.equirect_sampler,
            );
            Self::draw_face(&mut encoder, "Environment Capture Pass", &scratch_view, &self.capture_pipeline, Some(&bind_group));
            Self::copy_to_face(&mut encoder, &scratch, &environment, face);
        }
        self.mipmaps.generate(ctx, &mut encoder, &environment)?;
        ctx.submit(encoder);

        log::info!(
            "Captured environment cubemap {size}x{size}, {} mips",
            environment.mip_level_count()
        );
        Ok(environment)
    }

    /// Cosine-weighted hemispherical convolution of `environment`.
    pub fn convolve_irradiance(&mut self, ctx: &WgpuContext, environment: &GpuTexture) -> Result<GpuTexture> {
        let size = self.settings.irradiance_size;
        let irradiance = GpuTexture::new(ctx, TextureSpec::cubemap("Irradiance Cubemap", size, self.format, 1))?;
        let scratch = GpuTexture::new(ctx, TextureSpec::render_target("Irradiance Face", size, size, self.format))?;
        let scratch_view = scratch.render_target_view()?;

        let mut encoder = ctx.create_encoder("Irradiance Encoder");
        for face in CubeFace::ALL {
            let uniforms = FaceUniforms::new(face, 0.0, 0, environment.width());
            let bind_group = Self::face_bind_group(
                ctx,
                &self.convolve_layout,
                &uniforms,
                environment.shader_view(),
                &self.cube_sampler,
            );
            Self::draw_face(&mut encoder, "Irradiance Pass", &scratch_view, &self.irradiance_pipeline, Some(&bind_group));
            Self::copy_to_face(&mut encoder, &scratch, &irradiance, face);
        }
        ctx.submit(encoder);

        log::info!("Convolved irradiance cubemap {size}x{size}");
        Ok(irradiance)
    }

    /// GGX-prefiltered specular cubemap, one roughness level per mip.
    pub fn prefilter_specular(&mut self, ctx: &WgpuContext, environment: &GpuTexture) -> Result<GpuTexture> {
        let chain = MipChain::new(self.settings.prefiltered_size, self.settings.prefiltered_mip_count());
        let prefiltered = GpuTexture::new(
            ctx,
            TextureSpec::cubemap("Prefiltered Cubemap", chain.base, self.format, chain.count),
        )?;

        let mut encoder = ctx.create_encoder("Prefilter Encoder");
        for mip in 0..chain.count {
            // Missing entries spread evenly up to fully rough.
            let roughness = self.settings.roughness_levels.get(mip as usize).copied().unwrap_or_else(|| {
                if chain.count > 1 { mip as f32 / (chain.count - 1) as f32 } else { 0.0 }
            });
            for face in CubeFace::ALL {
                let target = prefiltered.target_view(face.index(), mip)?;
                let uniforms = FaceUniforms::new(face, roughness, self.settings.prefilter_samples, environment.width());
                let bind_group = Self::face_bind_group(
                    ctx,
                    &self.convolve_layout,
                    &uniforms,
                    environment.shader_view(),
                    &self.cube_sampler,
                );
                Self::draw_face(&mut encoder, "Prefilter Pass", &target, &self.prefilter_pipeline, Some(&bind_group));
            }
            log::debug!("Prefiltered mip {mip} ({0}x{0}) at roughness {roughness}", chain.extent(mip));
        }
        ctx.submit(encoder);

        log::info!(
            "Prefiltered specular cubemap {0}x{0}, {1} roughness mips over {CUBE_FACE_COUNT} faces",
            chain.base,
            chain.count
        );
        Ok(prefiltered)
    }

    /// Split-sum BRDF table: x is N·V, y is roughness with row 0 at 0.
    pub fn integrate_brdf(&mut self, ctx: &WgpuContext) -> Result<GpuTexture> {
        let size = self.settings.brdf_lut_size;
        let lut = GpuTexture::new(ctx, TextureSpec::render_target("BRDF LUT", size, size, BRDF_LUT_FORMAT))?;
        let view = lut.render_target_view()?;

        let mut encoder = ctx.create_encoder("BRDF LUT Encoder");
        Self::draw_face(&mut encoder, "BRDF Integration Pass", &view, &self.brdf_pipeline, None);
        ctx.submit(encoder);

        log::info!("Integrated BRDF LUT {size}x{size}");
        Ok(lut)
    }

    /// Runs every step for an equirectangular source.
    pub fn generate_all(&mut self, ctx: &WgpuContext, source: &HdrImage) -> Result<IblMaps> {
        let equirect = source.upload(ctx)?;
        let environment = self.capture_environment(ctx, &equirect)?;
        let irradiance = self.convolve_irradiance(ctx, &environment)?;
        let prefiltered = self.prefilter_specular(ctx, &environment)?;
        let brdf_lut = self.integrate_brdf(ctx)?;
        Ok(IblMaps {
            environment,
            irradiance,
            prefiltered,
            brdf_lut,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn face_uniforms_match_wgsl_layout() {
        assert_eq!(std::mem::size_of::<FaceUniforms>(), 80);
    }

    #[test]
    fn face_uniforms_invert_view_projection() {
        let u = FaceUniforms::new(CubeFace::NegativeZ, 0.5, 64, 512);
        let inv = glam::Mat4::from_cols_array_2d(&u.inv_view_projection);
        let identity = inv * CubeFace::NegativeZ.view_projection();
        assert!(identity.abs_diff_eq(glam::Mat4::IDENTITY, 1e-4));
        assert_eq!(u.source_resolution, 512.0);
    }
}
