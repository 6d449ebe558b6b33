//! Wall-clock delta for adaptation.

use std::time::{Duration, Instant};

/// Monotonic frame timer.
///
/// Each [`tick`](Self::tick) measures the wall-clock time since the previous
/// tick. Eye adaptation integrates over this delta, so the filter stays
/// frame-rate independent.
pub struct Timer {
    last_update: Instant,
    /// Time since last tick
    pub delta: Duration,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    /// Creates a new timer starting from now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            last_update: Instant::now(),
            delta: Duration::ZERO,
        }
    }

    /// Advances the timer and returns the delta in seconds.
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        self.delta = now - self.last_update;
        self.last_update = now;
        self.dt_seconds()
    }

    /// Restarts delta measurement from now.
    pub fn restart(&mut self) {
        self.last_update = Instant::now();
        self.delta = Duration::ZERO;
    }

    #[must_use]
    pub fn dt_seconds(&self) -> f32 {
        self.delta.as_secs_f32()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_measures_time_since_previous_tick() {
        let mut timer = Timer::new();
        let first = timer.tick();
        std::thread::sleep(Duration::from_millis(2));
        let second = timer.tick();
        assert!(first >= 0.0);
        assert!(second > 0.0);
        assert_eq!(timer.dt_seconds(), timer.delta.as_secs_f32());
    }

    #[test]
    fn restart_clears_delta() {
        let mut timer = Timer::new();
        std::thread::sleep(Duration::from_millis(1));
        timer.tick();
        timer.restart();
        assert_eq!(timer.dt_seconds(), 0.0);
    }
}
