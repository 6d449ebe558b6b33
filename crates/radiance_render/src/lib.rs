//! Rendering layer of the Radiance engine.
//!
//! - [`pyramid`] and [`reduction`]: hierarchical avg/min/max luminance reduction
//! - [`adaptation`]: temporal eye adaptation over the reduced average
//! - [`tone_mapping`]: the final HDR → display composite
//! - [`hdr`]: the frame target and the above chained per frame
//! - [`ibl`]: environment capture, irradiance, prefiltered specular, BRDF LUT
//! - [`scene`] and [`renderer`]: sphere, skybox, camera and frame orchestration

pub mod adaptation;
pub mod fullscreen;
pub mod hdr;
pub mod ibl;
pub mod mipmap;
pub mod pyramid;
pub mod reduction;
pub mod renderer;
pub mod scene;
pub mod settings;
pub mod shaders;
pub mod shading;
pub mod tone_mapping;

pub use adaptation::{AdaptationState, EyeAdaptation, blend_factor};
pub use hdr::HdrPipeline;
pub use ibl::{CubeFace, CubemapGenerator, HdrImage, IblMaps};
pub use mipmap::MipmapGenerator;
pub use pyramid::{LUMINANCE_FORMAT, LuminancePyramid, MipChain, ScaledFrame};
pub use reduction::{LevelStats, LuminanceReducer, ReductionOp};
pub use renderer::{FrameReport, Renderer, SceneSettings};
pub use scene::OrbitCamera;
pub use settings::{AdaptationSettings, IblSettings, ToneMappingOperator, ToneMappingSettings};
pub use shaders::Program;
pub use shading::{Material, PointLight, ShadingMode};
pub use tone_mapping::{ToneMapPass, ToneMapUniforms};
