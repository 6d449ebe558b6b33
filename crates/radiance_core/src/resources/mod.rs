//! GPU resource handles and keyed registries.

pub mod registry;
pub mod texture;

pub use registry::ResourceRegistry;
pub use texture::{
    CUBE_FACE_COUNT, GpuTexture, TextureShape, TextureSpec, full_mip_count, mip_extent,
};
