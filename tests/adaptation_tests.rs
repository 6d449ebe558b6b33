//! Eye Adaptation Tests
//!
//! Tests for:
//! - First sample snaps, later samples blend exponentially
//! - Convergence towards a constant scene luminance
//! - Reset after resize, invalid samples and degenerate time constants

use radiance::radiance_render::{AdaptationSettings, AdaptationState, EyeAdaptation, blend_factor};

const EPSILON: f32 = 1e-5;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn adaptation(time_constant: f32) -> EyeAdaptation {
    EyeAdaptation::new(&AdaptationSettings { time_constant })
}

// ============================================================================
// Blend Factor
// ============================================================================

#[test]
fn blend_factor_matches_exponential_decay() {
    assert!(approx(blend_factor(0.5, 0.5), 1.0 - (-1.0_f32).exp()));
    assert!(approx(blend_factor(0.0, 0.5), 0.0));
    assert!(blend_factor(100.0, 0.5) > 0.9999);
}

#[test]
fn zero_time_constant_snaps() {
    assert_eq!(blend_factor(0.016, 0.0), 1.0);
    let mut eye = adaptation(0.0);
    eye.update(0.2, 0.016);
    assert!(approx(eye.update(4.0, 0.016), 4.0));
}

// ============================================================================
// Update Sequence
// ============================================================================

#[test]
fn first_sample_is_taken_as_is() {
    let mut eye = adaptation(0.5);
    assert_eq!(eye.state(), AdaptationState::Uninitialized);
    assert!(approx(eye.update(0.5, 10.0), 0.5));
    assert_eq!(eye.adapted(), Some(0.5));
}

#[test]
fn step_towards_brighter_scene() {
    let mut eye = adaptation(0.5);
    eye.update(0.5, 0.5);
    let adapted = eye.update(2.0, 0.5);
    let expected = 0.5 + 1.5 * (1.0 - (-1.0_f32).exp());
    assert!(approx(adapted, expected), "Expected {expected}, got {adapted}");
    assert!((adapted - 1.448).abs() < 1e-3);
}

#[test]
fn converges_within_one_percent_after_five_time_constants() {
    let s = 0.5;
    let dt = 1.0 / 60.0;
    let mut eye = adaptation(s);
    eye.update(0.05, dt);

    let target = 3.0;
    let steps = (5.0 * s / dt).ceil() as u32;
    let mut adapted = 0.0;
    for _ in 0..steps {
        adapted = eye.update(target, dt);
    }
    assert!((adapted - target).abs() / target < 0.01, "adapted {adapted}");
}

#[test]
fn adaptation_never_overshoots() {
    let mut eye = adaptation(0.25);
    eye.update(1.0, 0.1);
    let mut previous = 1.0;
    for _ in 0..50 {
        let adapted = eye.update(0.1, 0.1);
        assert!(adapted <= previous && adapted >= 0.1);
        previous = adapted;
    }
}

#[test]
fn zero_dt_keeps_value() {
    let mut eye = adaptation(0.5);
    eye.update(1.0, 0.1);
    assert!(approx(eye.update(5.0, 0.0), 1.0));
}

// ============================================================================
// Reset & Invalid Input
// ============================================================================

#[test]
fn reset_makes_next_sample_snap() {
    let mut eye = adaptation(0.5);
    eye.update(1.0, 0.1);
    eye.update(1.0, 0.1);
    eye.reset();
    assert_eq!(eye.adapted(), None);
    assert!(approx(eye.update(7.0, 0.1), 7.0));
}

#[test]
fn invalid_samples_are_ignored() {
    let mut eye = adaptation(0.5);
    assert!(approx(eye.update(f32::NAN, 0.1), 0.0));
    assert_eq!(eye.state(), AdaptationState::Uninitialized);

    eye.update(0.8, 0.1);
    assert!(approx(eye.update(f32::INFINITY, 0.1), 0.8));
    assert!(approx(eye.update(-1.0, 0.1), 0.8));
}

#[test]
fn default_time_constant_is_half_a_second() {
    assert!(approx(EyeAdaptation::default().time_constant(), 0.5));
}
