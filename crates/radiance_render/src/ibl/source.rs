//! Equirectangular HDR source image.

use half::f16;

use radiance_core::{GpuTexture, RadianceError, Result, TextureSpec, WgpuContext};

/// Linear RGBA float image in longitude/latitude layout, row 0 at +Y.
#[derive(Debug, Clone, PartialEq)]
pub struct HdrImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<[f32; 4]>,
}

impl HdrImage {
    pub fn new(width: u32, height: u32, pixels: Vec<[f32; 4]>) -> Result<Self> {
        let image = Self { width, height, pixels };
        image.validate()?;
        Ok(image)
    }

    /// Constant-radiance environment.
    #[must_use]
    pub fn uniform(width: u32, height: u32, color: [f32; 3]) -> Self {
        let texel = [color[0], color[1], color[2], 1.0];
        Self {
            width,
            height,
            pixels: vec![texel; width as usize * height as usize],
        }
    }

    /// Builds an image from tightly packed RGB floats.
    pub fn from_rgb(width: u32, height: u32, rgb: &[f32]) -> Result<Self> {
        let pixels = rgb.chunks_exact(3).map(|c| [c[0], c[1], c[2], 1.0]).collect();
        Self::new(width, height, pixels)
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(RadianceError::ImageDecodeError(format!(
                "empty HDR image {}x{}",
                self.width, self.height
            )));
        }
        let expected = self.width as usize * self.height as usize;
        if self.pixels.len() != expected {
            return Err(RadianceError::ImageDecodeError(format!(
                "HDR image {}x{} has {} pixels, expected {expected}",
                self.width,
                self.height,
                self.pixels.len()
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> [f32; 4] {
        self.pixels[(y * self.width + x) as usize]
    }

    fn to_bytes(&self, format: wgpu::TextureFormat) -> Vec<u8> {
        match format {
            wgpu::TextureFormat::Rgba16Float => self
                .pixels
                .iter()
                .flatten()
                .flat_map(|&v| f16::from_f32(v).to_le_bytes())
                .collect(),
            _ => bytemuck::cast_slice(&self.pixels).to_vec(),
        }
    }

    /// Creates the 2D sampling source for environment capture, in 32-bit
    /// float when the device filters it and 16-bit float otherwise.
    pub fn upload(&self, ctx: &WgpuContext) -> Result<GpuTexture> {
        self.validate()?;
        let format = ctx.ibl_format();
        let texture = GpuTexture::new(
            ctx,
            TextureSpec::sampled("Equirect Source", self.width, self.height, format),
        )?;

        let bytes = self.to_bytes(format);
        let bytes_per_texel = format.block_copy_size(None).unwrap_or(16);
        ctx.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: texture.texture(),
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &bytes,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(self.width * bytes_per_texel),
                rows_per_image: Some(self.height),
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );

        log::info!("Uploaded equirect source {}x{} as {:?}", self.width, self.height, format);
        Ok(texture)
    }
}
