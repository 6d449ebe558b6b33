//! wgpu Context
//!
//! The [`WgpuContext`] holds core GPU handles: adapter, device and queue.
//! It is created headless; window surfaces belong to the caller, who may
//! build a context from existing handles with [`WgpuContext::from_parts`].

use crate::errors::{RadianceError, Result};
use crate::settings::RendererSettings;

/// Core wgpu context holding GPU handles.
///
/// All GPU work is recorded and submitted from one logical thread through
/// this context; command order on the single queue is the only
/// synchronization the passes rely on.
pub struct WgpuContext {
    /// The adapter the device was created from (used for format queries)
    pub adapter: wgpu::Adapter,
    /// The wgpu device for resource creation
    pub device: wgpu::Device,
    /// The command queue for submitting work
    pub queue: wgpu::Queue,
}

impl WgpuContext {
    /// Creates a context without a presentation surface.
    pub async fn new_headless(settings: &RendererSettings) -> Result<Self> {
        let instance = wgpu::Instance::default();

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: settings.power_preference,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| RadianceError::AdapterRequestFailed(e.to_string()))?;

        let mut required_features = wgpu::Features::empty();
        if settings.prefer_float32_filtering
            && adapter.features().contains(wgpu::Features::FLOAT32_FILTERABLE)
        {
            required_features |= wgpu::Features::FLOAT32_FILTERABLE;
        }

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Radiance Device"),
                required_features,
                required_limits: settings.required_limits.clone(),
                memory_hints: wgpu::MemoryHints::Performance,
                ..Default::default()
            })
            .await?;

        let info = adapter.get_info();
        log::info!(
            "GPU context ready: {} ({:?}), float32 filtering: {}",
            info.name,
            info.backend,
            required_features.contains(wgpu::Features::FLOAT32_FILTERABLE)
        );

        Ok(Self {
            adapter,
            device,
            queue,
        })
    }

    /// Blocking convenience wrapper around [`Self::new_headless`].
    pub fn new_headless_blocking(settings: &RendererSettings) -> Result<Self> {
        pollster::block_on(Self::new_headless(settings))
    }

    /// Wraps handles created by an external window/surface bootstrap.
    #[must_use]
    pub fn from_parts(adapter: wgpu::Adapter, device: wgpu::Device, queue: wgpu::Queue) -> Self {
        Self {
            adapter,
            device,
            queue,
        }
    }

    /// Returns the device limits.
    #[inline]
    #[must_use]
    pub fn limits(&self) -> wgpu::Limits {
        self.device.limits()
    }

    /// Whether `format` can be sampled through a filtering sampler.
    #[must_use]
    pub fn is_filterable(&self, format: wgpu::TextureFormat) -> bool {
        matches!(
            format.sample_type(None, Some(self.device.features())),
            Some(wgpu::TextureSampleType::Float { filterable: true })
        )
    }

    /// Whether the adapter allows `usage` for `format`.
    #[must_use]
    pub fn supports_usage(&self, format: wgpu::TextureFormat, usage: wgpu::TextureUsages) -> bool {
        self.adapter
            .get_texture_format_features(format)
            .allowed_usages
            .contains(usage)
    }

    /// Fails with [`RadianceError::UnsupportedFormat`] naming the first of
    /// `formats` that cannot be a color attachment.
    ///
    /// Pipeline constructors call this before creating pipelines, since wgpu
    /// reports an unrenderable target only through its validation handler.
    pub fn require_render_targets(&self, formats: &[wgpu::TextureFormat]) -> Result<()> {
        require_usage(formats, "render attachment", |format| {
            self.supports_usage(format, wgpu::TextureUsages::RENDER_ATTACHMENT)
        })
    }

    /// Four-channel float format for IBL intermediates and HDR sources.
    ///
    /// `Rgba32Float` when the device filters and renders 32-bit floats,
    /// otherwise `Rgba16Float`.
    #[must_use]
    pub fn ibl_format(&self) -> wgpu::TextureFormat {
        let wide = wgpu::TextureFormat::Rgba32Float;
        if self.is_filterable(wide) && self.supports_usage(wide, wgpu::TextureUsages::RENDER_ATTACHMENT) {
            wgpu::TextureFormat::Rgba32Float
        } else {
            wgpu::TextureFormat::Rgba16Float
        }
    }

    /// Submits a single encoder.
    pub fn submit(&self, encoder: wgpu::CommandEncoder) -> wgpu::SubmissionIndex {
        self.queue.submit(std::iter::once(encoder.finish()))
    }

    /// Creates a labelled command encoder.
    #[must_use]
    pub fn create_encoder(&self, label: &str) -> wgpu::CommandEncoder {
        self.device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some(label) })
    }
}

/// Checks every format against `supported`; the first failure becomes an
/// [`RadianceError::UnsupportedFormat`] for `usage`.
pub fn require_usage(
    formats: &[wgpu::TextureFormat],
    usage: &'static str,
    supported: impl Fn(wgpu::TextureFormat) -> bool,
) -> Result<()> {
    match formats.iter().copied().find(|&format| !supported(format)) {
        Some(format) => Err(RadianceError::UnsupportedFormat { format, usage }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_unsupported_format_is_reported() {
        let formats = [
            wgpu::TextureFormat::Rgba16Float,
            wgpu::TextureFormat::R32Float,
            wgpu::TextureFormat::Rgba32Float,
        ];
        let err = require_usage(&formats, "render attachment", |f| f == wgpu::TextureFormat::Rgba16Float)
            .unwrap_err();
        assert!(matches!(
            err,
            RadianceError::UnsupportedFormat {
                format: wgpu::TextureFormat::R32Float,
                usage: "render attachment"
            }
        ));
    }

    #[test]
    fn all_supported_is_ok() {
        assert!(require_usage(&[wgpu::TextureFormat::R32Float], "render attachment", |_| true).is_ok());
        assert!(require_usage(&[], "render attachment", |_| false).is_ok());
    }
}
