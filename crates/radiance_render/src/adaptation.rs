//! Temporal Eye-Adaptation Filter
//!
//! First-order low-pass over the per-frame average luminance:
//!
//! ```text
//! adapted += (observed - adapted) * (1 - exp(-dt / s))
//! ```
//!
//! `dt` is measured, so convergence does not depend on frame rate. The first
//! sample after construction or [`EyeAdaptation::reset`] is adopted as is.

use radiance_core::Result;

use crate::settings::AdaptationSettings;

/// Smoothing factor for a step of `dt` seconds with time constant `s`.
///
/// Returns 1 (snap) for `s <= 0` and 0 for a non-positive or NaN `dt`.
#[inline]
#[must_use]
pub fn blend_factor(dt: f32, time_constant: f32) -> f32 {
    if time_constant <= 0.0 {
        return 1.0;
    }
    if dt.is_nan() || dt <= 0.0 {
        return 0.0;
    }
    1.0 - (-dt / time_constant).exp()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AdaptationState {
    /// No sample seen since construction or the last reset.
    Uninitialized,
    Tracking { adapted: f32 },
}

#[derive(Debug, Clone)]
pub struct EyeAdaptation {
    state: AdaptationState,
    time_constant: f32,
}

impl EyeAdaptation {
    #[must_use]
    pub fn new(settings: &AdaptationSettings) -> Self {
        Self {
            state: AdaptationState::Uninitialized,
            time_constant: settings.time_constant,
        }
    }

    #[must_use]
    pub fn state(&self) -> AdaptationState {
        self.state
    }

    #[must_use]
    pub fn time_constant(&self) -> f32 {
        self.time_constant
    }

    pub fn set_time_constant(&mut self, time_constant: f32) {
        self.time_constant = time_constant;
    }

    /// Current adapted luminance, if any sample has been seen.
    #[must_use]
    pub fn adapted(&self) -> Option<f32> {
        match self.state {
            AdaptationState::Uninitialized => None,
            AdaptationState::Tracking { adapted } => Some(adapted),
        }
    }

    /// Next sample replaces rather than blends.
    pub fn reset(&mut self) {
        self.state = AdaptationState::Uninitialized;
    }

    /// Feeds one observed average luminance taken `dt` seconds after the
    /// previous one and returns the adapted value.
    ///
    /// Non-finite or negative observations are ignored.
    pub fn update(&mut self, observed: f32, dt: f32) -> f32 {
        if !observed.is_finite() || observed < 0.0 {
            log::warn!("Ignoring invalid luminance sample {observed}");
            return self.adapted().unwrap_or(0.0);
        }

        let adapted = match self.state {
            AdaptationState::Uninitialized => observed,
            AdaptationState::Tracking { adapted } => {
                adapted + (observed - adapted) * blend_factor(dt, self.time_constant)
            }
        };
        self.state = AdaptationState::Tracking { adapted };
        adapted
    }

    /// Feeds the result of a luminance read-back.
    ///
    /// A soft failure skips this step and keeps the previous value; any other
    /// error is returned.
    pub fn update_from_readback(&mut self, sample: Result<f32>, dt: f32) -> Result<Option<f32>> {
        match sample {
            Ok(observed) => {
                let adapted = self.update(observed, dt);
                log::debug!("Average luminance {observed:.4}, adapted {adapted:.4} (dt {dt:.4}s)");
            }
            Err(err) if err.is_soft() => {
                log::warn!("Skipping eye adaptation this frame: {err}");
            }
            Err(err) => return Err(err),
        }
        Ok(self.adapted())
    }
}

impl Default for EyeAdaptation {
    fn default() -> Self {
        Self::new(&AdaptationSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use radiance_core::{RadianceError, ResourceKind};

    use super::*;

    #[test]
    fn blend_factor_edges() {
        assert_eq!(blend_factor(0.0, 0.5), 0.0);
        assert_eq!(blend_factor(-1.0, 0.5), 0.0);
        assert_eq!(blend_factor(f32::NAN, 0.5), 0.0);
        assert_eq!(blend_factor(0.1, 0.0), 1.0);
        assert!((blend_factor(0.5, 0.5) - (1.0 - (-1.0_f32).exp())).abs() < 1e-6);
    }

    #[test]
    fn first_sample_is_adopted() {
        let mut eye = EyeAdaptation::default();
        assert_eq!(eye.adapted(), None);
        assert_eq!(eye.update(3.0, 10.0), 3.0);
        assert_eq!(eye.state(), AdaptationState::Tracking { adapted: 3.0 });
    }

    #[test]
    fn zero_dt_holds_value() {
        let mut eye = EyeAdaptation::default();
        eye.update(1.0, 0.0);
        assert_eq!(eye.update(5.0, 0.0), 1.0);
    }

    #[test]
    fn invalid_samples_are_ignored() {
        let mut eye = EyeAdaptation::default();
        eye.update(0.4, 0.0);
        assert_eq!(eye.update(f32::INFINITY, 0.1), 0.4);
        assert_eq!(eye.update(-1.0, 0.1), 0.4);
    }

    #[test]
    fn reset_readopts() {
        let mut eye = EyeAdaptation::default();
        eye.update(1.0, 0.0);
        eye.update(2.0, 0.1);
        eye.reset();
        assert_eq!(eye.update(7.5, 0.1), 7.5);
    }

    #[test]
    fn failed_readback_keeps_adapted_value() {
        let mut eye = EyeAdaptation::default();
        eye.update(0.6, 0.0);
        let kept = eye
            .update_from_readback(Err(RadianceError::ReadbackFailed("map failed".into())), 0.5)
            .unwrap();
        assert_eq!(kept, Some(0.6));

        let mut fresh = EyeAdaptation::default();
        let none = fresh
            .update_from_readback(Err(RadianceError::ReadbackFailed("map failed".into())), 0.5)
            .unwrap();
        assert_eq!(none, None);
        assert_eq!(fresh.state(), AdaptationState::Uninitialized);
    }

    #[test]
    fn hard_errors_propagate() {
        let mut eye = EyeAdaptation::default();
        eye.update(0.6, 0.0);
        let err = eye
            .update_from_readback(
                Err(RadianceError::MissingResource {
                    kind: ResourceKind::Buffer,
                    key: "staging".into(),
                }),
                0.5,
            )
            .unwrap_err();
        assert!(matches!(err, RadianceError::MissingResource { .. }));
        assert_eq!(eye.adapted(), Some(0.6));
    }

    #[test]
    fn successful_readback_blends() {
        let mut eye = EyeAdaptation::default();
        eye.update(0.5, 0.0);
        let adapted = eye.update_from_readback(Ok(2.0), 0.5).unwrap().unwrap();
        assert!((adapted - (0.5 + 1.5 * (1.0 - (-1.0_f32).exp()))).abs() < 1e-5);
    }
}
