//! GPU → CPU texture read-back.
//!
//! Copies land in a `MAP_READ` staging buffer whose rows are padded to
//! [`wgpu::COPY_BYTES_PER_ROW_ALIGNMENT`]. Reading blocks the calling thread
//! until the queue has executed the copy.

use half::f16;

use crate::context::WgpuContext;
use crate::errors::{RadianceError, Result};
use crate::resources::GpuTexture;

/// Rounds a row size up to the copy alignment.
#[inline]
#[must_use]
pub fn padded_bytes_per_row(unpadded: u32) -> u32 {
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unpadded.div_ceil(align) * align
}

/// Decoded texels of one texture layer/mip, row-major.
#[derive(Debug, Clone)]
pub struct TexelData {
    pub width: u32,
    pub height: u32,
    pub channels: u32,
    pub values: Vec<f32>,
}

impl TexelData {
    /// Channel values of texel (x, y).
    #[must_use]
    pub fn texel(&self, x: u32, y: u32) -> &[f32] {
        let start = ((y * self.width + x) * self.channels) as usize;
        &self.values[start..start + self.channels as usize]
    }

    /// Smallest and largest value of channel `c` over all texels.
    #[must_use]
    pub fn channel_range(&self, c: u32) -> (f32, f32) {
        self.values
            .iter()
            .skip(c as usize)
            .step_by(self.channels as usize)
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)))
    }
}

fn texel_layout(format: wgpu::TextureFormat) -> Result<(u32, u32)> {
    // (bytes per texel, channels)
    match format {
        wgpu::TextureFormat::R32Float => Ok((4, 1)),
        wgpu::TextureFormat::Rgba16Float => Ok((8, 4)),
        wgpu::TextureFormat::Rgba32Float => Ok((16, 4)),
        wgpu::TextureFormat::Rgba8Unorm | wgpu::TextureFormat::Rgba8UnormSrgb => Ok((4, 4)),
        other => Err(RadianceError::UnsupportedFormat {
            format: other,
            usage: "read-back",
        }),
    }
}

/// Reusable staging buffer sized for one layer/mip of a texture.
pub struct StagingReadback {
    buffer: wgpu::Buffer,
    format: wgpu::TextureFormat,
    width: u32,
    height: u32,
    padded_row: u32,
}

impl StagingReadback {
    pub fn new(
        ctx: &WgpuContext,
        label: &str,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
    ) -> Result<Self> {
        let (bytes_per_texel, _) = texel_layout(format)?;
        let padded_row = padded_bytes_per_row(width * bytes_per_texel);
        let buffer = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: u64::from(padded_row) * u64::from(height),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });
        Ok(Self {
            buffer,
            format,
            width,
            height,
            padded_row,
        })
    }

    /// Records a copy of `texture` (layer, mip) into the staging buffer.
    pub fn encode_copy(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        texture: &GpuTexture,
        layer: u32,
        mip: u32,
    ) {
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: texture.texture(),
                mip_level: mip,
                origin: wgpu::Origin3d {
                    x: 0,
                    y: 0,
                    z: layer,
                },
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &self.buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(self.padded_row),
                    rows_per_image: Some(self.height),
                },
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );
    }

    /// Maps the buffer, decodes every texel and unmaps. Blocks until done.
    pub fn read(&self, ctx: &WgpuContext) -> Result<TexelData> {
        let (bytes_per_texel, channels) = texel_layout(self.format)?;
        let slice = self.buffer.slice(..);

        let (tx, rx) = flume::bounded(1);
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        ctx.device
            .poll(wgpu::PollType::wait_indefinitely())
            .map_err(|e| RadianceError::ReadbackFailed(e.to_string()))?;
        rx.recv()
            .map_err(|e| RadianceError::ReadbackFailed(e.to_string()))??;

        let mut values = Vec::with_capacity((self.width * self.height * channels) as usize);
        {
            let mapped = slice.get_mapped_range();
            let row_bytes = (self.width * bytes_per_texel) as usize;
            for row in mapped.chunks(self.padded_row as usize).take(self.height as usize) {
                decode_row(self.format, &row[..row_bytes], &mut values);
            }
        }
        self.buffer.unmap();

        Ok(TexelData {
            width: self.width,
            height: self.height,
            channels,
            values,
        })
    }
}

fn decode_row(format: wgpu::TextureFormat, row: &[u8], out: &mut Vec<f32>) {
    match format {
        wgpu::TextureFormat::Rgba16Float => out.extend(
            row.chunks_exact(2)
                .map(|b| f16::from_le_bytes([b[0], b[1]]).to_f32()),
        ),
        wgpu::TextureFormat::Rgba8Unorm | wgpu::TextureFormat::Rgba8UnormSrgb => {
            out.extend(row.iter().map(|&b| f32::from(b) / 255.0));
        }
        _ => out.extend(
            row.chunks_exact(4)
                .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]])),
        ),
    }
}

/// One-shot blocking read of a texture layer/mip.
pub fn read_texture(ctx: &WgpuContext, texture: &GpuTexture, layer: u32, mip: u32) -> Result<TexelData> {
    let width = texture.mip_width(mip);
    let height = (texture.height() >> mip).max(1);
    let staging = StagingReadback::new(ctx, "Texture Readback", width, height, texture.format())?;

    let mut encoder = ctx.create_encoder("Texture Readback");
    staging.encode_copy(&mut encoder, texture, layer, mip);
    ctx.submit(encoder);

    staging.read(ctx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_padded_to_copy_alignment() {
        assert_eq!(padded_bytes_per_row(4), 256);
        assert_eq!(padded_bytes_per_row(256), 256);
        assert_eq!(padded_bytes_per_row(257), 512);
        assert_eq!(padded_bytes_per_row(1280 * 4), 5120);
    }

    #[test]
    fn decode_half_and_unorm_rows() {
        let mut out = Vec::new();
        let bytes: Vec<u8> = [0.5_f32, 2.0, -1.0, 1.0]
            .iter()
            .flat_map(|v| f16::from_f32(*v).to_le_bytes())
            .collect();
        decode_row(wgpu::TextureFormat::Rgba16Float, &bytes, &mut out);
        assert_eq!(out, vec![0.5, 2.0, -1.0, 1.0]);

        out.clear();
        decode_row(wgpu::TextureFormat::Rgba8Unorm, &[0, 255, 51, 255], &mut out);
        assert!((out[2] - 0.2).abs() < 1e-6);
    }

    #[test]
    fn channel_range_scans_one_channel() {
        let data = TexelData {
            width: 2,
            height: 1,
            channels: 4,
            values: vec![0.1, 5.0, 0.0, 1.0, 0.3, -2.0, 0.0, 1.0],
        };
        assert_eq!(data.channel_range(1), (-2.0, 5.0));
        assert_eq!(data.texel(1, 0)[0], 0.3);
    }

    #[test]
    fn unsupported_formats_are_rejected() {
        assert!(texel_layout(wgpu::TextureFormat::Depth32Float).is_err());
    }
}
