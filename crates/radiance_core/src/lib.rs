//! Core layer of the Radiance engine: GPU context, shared resource handles,
//! string-keyed registries, read-back and the error taxonomy.

pub mod context;
pub mod errors;
pub mod readback;
pub mod resources;
pub mod settings;
pub mod time;

pub use context::WgpuContext;
pub use errors::{RadianceError, ResourceKind, Result};
pub use readback::{StagingReadback, TexelData, read_texture};
pub use resources::{GpuTexture, ResourceRegistry, TextureShape, TextureSpec};
pub use settings::RendererSettings;
pub use time::Timer;
