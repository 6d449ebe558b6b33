//! Image-based lighting: environment capture, irradiance convolution,
//! specular prefiltering and BRDF integration.

pub mod cube_face;
pub mod generator;
pub mod maps;
pub mod source;

pub use cube_face::CubeFace;
pub use generator::{BRDF_LUT_FORMAT, CubemapGenerator, FaceUniforms};
pub use maps::{BRDF_LUT_KEY, ENVIRONMENT_KEY, IRRADIANCE_KEY, IblMaps, PREFILTERED_KEY};
pub use source::HdrImage;
