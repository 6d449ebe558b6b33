//! Cubemap face orientation.
//!
//! Faces are array layers in +X, −X, +Y, −Y, +Z, −Z order. Each face looks
//! along its axis with a 90° left-handed perspective so the six frusta tile
//! the sphere. Up is +Y except for the ±Y faces, which use −Z (+Y face) and
//! +Z (−Y face). With these choices a face rendered through the full-screen
//! quad lands in the texel layout wgpu samples cube textures with.

use std::f32::consts::FRAC_PI_2;

use glam::{Mat4, Vec2, Vec3, Vec4, Vec4Swizzles};

const NEAR: f32 = 0.1;
const FAR: f32 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CubeFace {
    PositiveX,
    NegativeX,
    PositiveY,
    NegativeY,
    PositiveZ,
    NegativeZ,
}

impl CubeFace {
    pub const ALL: [CubeFace; 6] = [
        Self::PositiveX,
        Self::NegativeX,
        Self::PositiveY,
        Self::NegativeY,
        Self::PositiveZ,
        Self::NegativeZ,
    ];

    /// Array layer of this face.
    #[must_use]
    pub fn index(self) -> u32 {
        match self {
            Self::PositiveX => 0,
            Self::NegativeX => 1,
            Self::PositiveY => 2,
            Self::NegativeY => 3,
            Self::PositiveZ => 4,
            Self::NegativeZ => 5,
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::PositiveX => "X+",
            Self::NegativeX => "X-",
            Self::PositiveY => "Y+",
            Self::NegativeY => "Y-",
            Self::PositiveZ => "Z+",
            Self::NegativeZ => "Z-",
        }
    }

    #[must_use]
    pub fn look_direction(self) -> Vec3 {
        match self {
            Self::PositiveX => Vec3::X,
            Self::NegativeX => Vec3::NEG_X,
            Self::PositiveY => Vec3::Y,
            Self::NegativeY => Vec3::NEG_Y,
            Self::PositiveZ => Vec3::Z,
            Self::NegativeZ => Vec3::NEG_Z,
        }
    }

    #[must_use]
    pub fn up(self) -> Vec3 {
        match self {
            Self::PositiveY => Vec3::NEG_Z,
            Self::NegativeY => Vec3::Z,
            _ => Vec3::Y,
        }
    }

    #[must_use]
    pub fn view(self) -> Mat4 {
        Mat4::look_to_lh(Vec3::ZERO, self.look_direction(), self.up())
    }

    #[must_use]
    pub fn projection() -> Mat4 {
        Mat4::perspective_lh(FRAC_PI_2, 1.0, NEAR, FAR)
    }

    #[must_use]
    pub fn view_projection(self) -> Mat4 {
        Self::projection() * self.view()
    }

    /// Face whose axis has the largest component of `dir`. Ties go to the
    /// earlier face in array order.
    #[must_use]
    pub fn from_direction(dir: Vec3) -> Self {
        let a = dir.abs();
        if a.x >= a.y && a.x >= a.z {
            if dir.x >= 0.0 { Self::PositiveX } else { Self::NegativeX }
        } else if a.y >= a.z {
            if dir.y >= 0.0 { Self::PositiveY } else { Self::NegativeY }
        } else if dir.z >= 0.0 {
            Self::PositiveZ
        } else {
            Self::NegativeZ
        }
    }

    /// World direction through texel coordinate (`u`, `v`) in `[0, 1]`,
    /// with `v = 0` at the top row.
    #[must_use]
    pub fn texel_direction(self, u: f32, v: f32) -> Vec3 {
        let ndc = Vec4::new(u * 2.0 - 1.0, 1.0 - v * 2.0, 1.0, 1.0);
        let far = self.view_projection().inverse() * ndc;
        (far.xyz() / far.w).normalize()
    }

    /// NDC position of `dir` on this face, or `None` if it lies behind it.
    #[must_use]
    pub fn project(self, dir: Vec3) -> Option<Vec2> {
        let clip = self.view_projection() * dir.extend(1.0);
        if clip.w <= 0.0 {
            return None;
        }
        Some(clip.xy() / clip.w)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-4;

    #[test]
    fn face_centers_look_along_axes() {
        for face in CubeFace::ALL {
            let center = face.texel_direction(0.5, 0.5);
            assert!((center - face.look_direction()).length() < EPS, "{}", face.name());
        }
    }

    #[test]
    fn positive_x_matches_cube_sampling_layout() {
        // Top-left texel of +X points toward +Y and +Z.
        let d = CubeFace::PositiveX.texel_direction(0.0, 0.0);
        let expected = Vec3::new(1.0, 1.0, 1.0).normalize();
        assert!((d - expected).length() < EPS);
    }

    #[test]
    fn positive_y_matches_cube_sampling_layout() {
        // Top-left texel of +Y points toward −X and −Z.
        let d = CubeFace::PositiveY.texel_direction(0.0, 0.0);
        let expected = Vec3::new(-1.0, 1.0, -1.0).normalize();
        assert!((d - expected).length() < EPS);
    }

    #[test]
    fn up_vectors_are_never_parallel_to_view() {
        for face in CubeFace::ALL {
            assert!(face.up().cross(face.look_direction()).length() > 0.5);
        }
    }

    #[test]
    fn indices_follow_array_order() {
        for (i, face) in CubeFace::ALL.iter().enumerate() {
            assert_eq!(face.index() as usize, i);
        }
    }
}
