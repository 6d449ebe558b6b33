//! Cube Face Tests
//!
//! Tests for:
//! - Face order and per-face view directions
//! - Every direction maps to a face that sees it inside [-1, 1]
//! - Shared edges between neighbouring faces agree on direction

use glam::Vec3;

use radiance::radiance_render::CubeFace;

const EPSILON: f32 = 1e-4;

fn approx_vec(a: Vec3, b: Vec3) -> bool {
    a.abs_diff_eq(b, EPSILON)
}

fn sample_directions() -> Vec<Vec3> {
    let mut dirs = Vec::new();
    for i in 0..12 {
        for j in 1..12 {
            let phi = i as f32 / 12.0 * std::f32::consts::TAU;
            let theta = j as f32 / 12.0 * std::f32::consts::PI;
            dirs.push(Vec3::new(theta.sin() * phi.cos(), theta.cos(), theta.sin() * phi.sin()));
        }
    }
    dirs.extend([Vec3::X, Vec3::NEG_X, Vec3::Y, Vec3::NEG_Y, Vec3::Z, Vec3::NEG_Z]);
    dirs
}

// ============================================================================
// Face Layout
// ============================================================================

#[test]
fn faces_follow_layer_order() {
    let names: Vec<&str> = CubeFace::ALL.iter().map(|f| f.name()).collect();
    assert_eq!(names, vec!["X+", "X-", "Y+", "Y-", "Z+", "Z-"]);
    for (i, face) in CubeFace::ALL.iter().enumerate() {
        assert_eq!(face.index() as usize, i);
    }
}

#[test]
fn face_centers_point_along_axes() {
    let axes = [Vec3::X, Vec3::NEG_X, Vec3::Y, Vec3::NEG_Y, Vec3::Z, Vec3::NEG_Z];
    for (face, axis) in CubeFace::ALL.into_iter().zip(axes) {
        assert!(approx_vec(face.texel_direction(0.5, 0.5), axis), "{}", face.name());
        assert!(approx_vec(face.look_direction(), axis));
    }
}

#[test]
fn top_left_corners() {
    let corner = |face: CubeFace| face.texel_direction(0.0, 0.0) * 3.0_f32.sqrt();
    assert!(approx_vec(corner(CubeFace::PositiveX), Vec3::new(1.0, 1.0, 1.0)));
    assert!(approx_vec(corner(CubeFace::PositiveY), Vec3::new(-1.0, 1.0, -1.0)));
}

// ============================================================================
// Coverage
// ============================================================================

#[test]
fn every_direction_projects_inside_its_face() {
    for dir in sample_directions() {
        let face = CubeFace::from_direction(dir);
        let ndc = face
            .project(dir)
            .unwrap_or_else(|| panic!("{dir} is behind {}", face.name()));
        assert!(ndc.x.abs() <= 1.0 + EPSILON && ndc.y.abs() <= 1.0 + EPSILON, "{dir} -> {ndc}");
    }
}

#[test]
fn opposite_face_does_not_see_axis() {
    assert!(CubeFace::NegativeX.project(Vec3::X).is_none());
    assert!(CubeFace::PositiveZ.project(Vec3::NEG_Z).is_none());
}

#[test]
fn texel_directions_round_trip_through_projection() {
    for face in CubeFace::ALL {
        for (u, v) in [(0.1, 0.2), (0.5, 0.9), (0.75, 0.25)] {
            let dir = face.texel_direction(u, v);
            assert_eq!(CubeFace::from_direction(dir), face);
            let ndc = face.project(dir).expect("texel direction is in front");
            assert!((ndc.x - (u * 2.0 - 1.0)).abs() < EPSILON);
            assert!((ndc.y - (1.0 - v * 2.0)).abs() < EPSILON);
        }
    }
}

// ============================================================================
// Boundary Consistency
// ============================================================================

#[test]
fn shared_edges_meet() {
    // Right edge of +Z is the left edge of +X.
    for v in [0.1, 0.5, 0.9] {
        let a = CubeFace::PositiveZ.texel_direction(1.0, v);
        let b = CubeFace::PositiveX.texel_direction(0.0, v);
        assert!(approx_vec(a, b), "{a} vs {b}");
    }
    // Top edge of +Z is the bottom edge of +Y.
    for u in [0.1, 0.5, 0.9] {
        let a = CubeFace::PositiveZ.texel_direction(u, 0.0);
        let b = CubeFace::PositiveY.texel_direction(u, 1.0);
        assert!(approx_vec(a, b), "{a} vs {b}");
    }
}
