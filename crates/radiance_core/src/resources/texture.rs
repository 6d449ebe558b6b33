//! GPU texture handles.
//!
//! [`GpuTexture`] is a reference-counted handle over a `wgpu::Texture` and its
//! views. Cloning a handle shares the texture; the GPU allocation is released
//! when the last clone drops. Render-target views for individual cube faces
//! and mip levels are created lazily on first request and cached.
//!
//! A texture may not be both a color attachment and a bound sampling source
//! inside one pass; passes that need both read from one texture and write
//! another.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::context::WgpuContext;
use crate::errors::{RadianceError, Result};

static NEXT_TEXTURE_ID: AtomicU64 = AtomicU64::new(1);

/// Number of array layers of a cubemap.
pub const CUBE_FACE_COUNT: u32 = 6;

/// Length of the full mip chain for a texture whose largest side is `size`.
#[inline]
#[must_use]
pub fn full_mip_count(size: u32) -> u32 {
    if size == 0 { 0 } else { size.ilog2() + 1 }
}

/// Side length of mip `level` of a chain starting at `base`.
#[inline]
#[must_use]
pub fn mip_extent(base: u32, level: u32) -> u32 {
    base.checked_shr(level).unwrap_or(0).max(1)
}

/// Shape of a texture allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureShape {
    /// Single-layer 2D texture
    D2,
    /// Six-layer texture viewed as a cube
    Cube,
}

/// Description of a texture before it reaches the device.
#[derive(Debug, Clone)]
pub struct TextureSpec {
    pub label: String,
    pub width: u32,
    pub height: u32,
    pub format: wgpu::TextureFormat,
    pub shape: TextureShape,
    pub mip_level_count: u32,
    pub usage: wgpu::TextureUsages,
}

impl TextureSpec {
    /// 2D texture writable as a color attachment and readable by shaders.
    #[must_use]
    pub fn render_target(label: &str, width: u32, height: u32, format: wgpu::TextureFormat) -> Self {
        Self {
            label: label.to_owned(),
            width,
            height,
            format,
            shape: TextureShape::D2,
            mip_level_count: 1,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC,
        }
    }

    /// 2D texture filled from host memory and sampled by shaders.
    #[must_use]
    pub fn sampled(label: &str, width: u32, height: u32, format: wgpu::TextureFormat) -> Self {
        Self {
            label: label.to_owned(),
            width,
            height,
            format,
            shape: TextureShape::D2,
            mip_level_count: 1,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        }
    }

    /// Square cubemap whose faces are written by render passes or copies.
    #[must_use]
    pub fn cubemap(label: &str, size: u32, format: wgpu::TextureFormat, mip_level_count: u32) -> Self {
        Self {
            label: label.to_owned(),
            width: size,
            height: size,
            format,
            shape: TextureShape::Cube,
            mip_level_count,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_DST
                | wgpu::TextureUsages::COPY_SRC,
        }
    }

    #[must_use]
    pub fn with_usage(mut self, usage: wgpu::TextureUsages) -> Self {
        self.usage |= usage;
        self
    }

    /// Requests every mip level down to 1×1.
    #[must_use]
    pub fn with_full_mip_chain(mut self) -> Self {
        self.mip_level_count = full_mip_count(self.width.max(self.height));
        self
    }

    #[must_use]
    pub fn layer_count(&self) -> u32 {
        match self.shape {
            TextureShape::D2 => 1,
            TextureShape::Cube => CUBE_FACE_COUNT,
        }
    }

    /// Checks the descriptor against device limits.
    pub fn validate(&self, limits: &wgpu::Limits) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(RadianceError::invalid_texture(
                &self.label,
                format!("zero extent {}x{}", self.width, self.height),
            ));
        }
        let max_side = limits.max_texture_dimension_2d;
        if self.width > max_side || self.height > max_side {
            return Err(RadianceError::invalid_texture(
                &self.label,
                format!("extent {}x{} exceeds limit {max_side}", self.width, self.height),
            ));
        }
        if self.shape == TextureShape::Cube && self.width != self.height {
            return Err(RadianceError::invalid_texture(&self.label, "cubemap faces must be square"));
        }
        let max_mips = full_mip_count(self.width.max(self.height));
        if self.mip_level_count == 0 || self.mip_level_count > max_mips {
            return Err(RadianceError::invalid_texture(
                &self.label,
                format!("mip count {} outside 1..={max_mips}", self.mip_level_count),
            ));
        }
        Ok(())
    }
}

struct TextureInner {
    id: u64,
    spec: TextureSpec,
    texture: wgpu::Texture,
    shader_view: wgpu::TextureView,
    target_views: Mutex<FxHashMap<(u32, u32), wgpu::TextureView>>,
}

/// Shared handle to a GPU texture and its views.
#[derive(Clone)]
pub struct GpuTexture {
    inner: Arc<TextureInner>,
}

impl std::fmt::Debug for GpuTexture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpuTexture")
            .field("id", &self.inner.id)
            .field("label", &self.inner.spec.label)
            .field("size", &(self.inner.spec.width, self.inner.spec.height))
            .field("format", &self.inner.spec.format)
            .field("shape", &self.inner.spec.shape)
            .field("mips", &self.inner.spec.mip_level_count)
            .finish()
    }
}

impl GpuTexture {
    /// Validates `spec` and allocates the texture.
    pub fn new(ctx: &WgpuContext, spec: TextureSpec) -> Result<Self> {
        spec.validate(&ctx.limits())?;

        let required = spec.usage
            & (wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::STORAGE_BINDING);
        if !required.is_empty() && !ctx.supports_usage(spec.format, required) {
            return Err(RadianceError::UnsupportedFormat {
                format: spec.format,
                usage: "render attachment",
            });
        }

        let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(&spec.label),
            size: wgpu::Extent3d {
                width: spec.width,
                height: spec.height,
                depth_or_array_layers: spec.layer_count(),
            },
            mip_level_count: spec.mip_level_count,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: spec.format,
            usage: spec.usage,
            view_formats: &[],
        });

        let dimension = match spec.shape {
            TextureShape::D2 => wgpu::TextureViewDimension::D2,
            TextureShape::Cube => wgpu::TextureViewDimension::Cube,
        };
        let shader_view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some(&format!("{} SRV", spec.label)),
            dimension: Some(dimension),
            usage: Some(wgpu::TextureUsages::TEXTURE_BINDING),
            ..Default::default()
        });

        log::debug!(
            "Created texture '{}' {}x{} {:?} layers={} mips={}",
            spec.label,
            spec.width,
            spec.height,
            spec.format,
            spec.layer_count(),
            spec.mip_level_count
        );

        Ok(Self {
            inner: Arc::new(TextureInner {
                id: NEXT_TEXTURE_ID.fetch_add(1, Ordering::Relaxed),
                spec,
                texture,
                shader_view,
                target_views: Mutex::new(FxHashMap::default()),
            }),
        })
    }

    /// Unique id of the underlying allocation (shared by all clones).
    #[inline]
    #[must_use]
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    #[inline]
    #[must_use]
    pub fn label(&self) -> &str {
        &self.inner.spec.label
    }

    #[inline]
    #[must_use]
    pub fn width(&self) -> u32 {
        self.inner.spec.width
    }

    #[inline]
    #[must_use]
    pub fn height(&self) -> u32 {
        self.inner.spec.height
    }

    #[inline]
    #[must_use]
    pub fn format(&self) -> wgpu::TextureFormat {
        self.inner.spec.format
    }

    #[inline]
    #[must_use]
    pub fn shape(&self) -> TextureShape {
        self.inner.spec.shape
    }

    #[inline]
    #[must_use]
    pub fn mip_level_count(&self) -> u32 {
        self.inner.spec.mip_level_count
    }

    #[inline]
    #[must_use]
    pub fn layer_count(&self) -> u32 {
        self.inner.spec.layer_count()
    }

    /// Side length of mip `level` along x.
    #[inline]
    #[must_use]
    pub fn mip_width(&self, level: u32) -> u32 {
        mip_extent(self.inner.spec.width, level)
    }

    #[inline]
    #[must_use]
    pub fn texture(&self) -> &wgpu::Texture {
        &self.inner.texture
    }

    /// Read-only view over every layer and mip (2D or cube).
    #[inline]
    #[must_use]
    pub fn shader_view(&self) -> &wgpu::TextureView {
        &self.inner.shader_view
    }

    /// Render-target view of mip 0, layer 0.
    pub fn render_target_view(&self) -> Result<wgpu::TextureView> {
        self.target_view(0, 0)
    }

    /// Single-layer, single-mip 2D view usable as a color attachment.
    ///
    /// For cubemaps `layer` is the face index in +X, −X, +Y, −Y, +Z, −Z order.
    pub fn target_view(&self, layer: u32, mip: u32) -> Result<wgpu::TextureView> {
        let spec = &self.inner.spec;
        if !spec.usage.contains(wgpu::TextureUsages::RENDER_ATTACHMENT) {
            return Err(RadianceError::invalid_texture(&spec.label, "not created as a render target"));
        }
        if layer >= spec.layer_count() || mip >= spec.mip_level_count {
            return Err(RadianceError::invalid_texture(
                &spec.label,
                format!("no layer {layer} mip {mip}"),
            ));
        }

        let mut views = self.inner.target_views.lock();
        let view = views.entry((layer, mip)).or_insert_with(|| {
            self.inner.texture.create_view(&wgpu::TextureViewDescriptor {
                label: Some(&format!("{} RTV layer {layer} mip {mip}", spec.label)),
                format: None,
                dimension: Some(wgpu::TextureViewDimension::D2),
                usage: Some(wgpu::TextureUsages::RENDER_ATTACHMENT),
                aspect: wgpu::TextureAspect::All,
                base_mip_level: mip,
                mip_level_count: Some(1),
                base_array_layer: layer,
                array_layer_count: Some(1),
            })
        });
        Ok(view.clone())
    }

    /// Number of lazily created target views currently cached.
    #[must_use]
    pub fn cached_view_count(&self) -> usize {
        self.inner.target_views.lock().len()
    }

    /// Whether two handles refer to the same allocation.
    #[inline]
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Number of live handles sharing this allocation.
    #[inline]
    #[must_use]
    pub fn handle_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }
}
