//! Scene glue around the HDR chain: orbit camera, sphere geometry, the
//! forward PBR pass and the skybox.

pub mod camera;
pub mod forward;
pub mod skybox;
pub mod sphere;

pub use camera::OrbitCamera;
pub use forward::{DEPTH_FORMAT, ForwardPass};
pub use skybox::SkyboxPass;
pub use sphere::{SphereMesh, SphereOptions, SphereVertex};
