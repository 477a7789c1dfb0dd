//! Frame timing: real elapsed time in, fixed simulation steps out.

use std::time::Instant;

/// Milliseconds per simulation step at the default 60 Hz.
const DEFAULT_STEP_MS: f32 = 1000.0 / 60.0;

/// A monotonic clock reporting the time since it was last asked.
///
/// [`delta_time`](Clock::delta_time) is the wall-clock gap between queries
/// in milliseconds; [`physics_time_step`](Clock::physics_time_step) is the
/// fixed step the simulation should be advanced by, however many times it
/// takes to consume the delta.
pub struct Clock {
    step_ms: f32,
    previous: Option<Instant>,
    running_ms: f32,
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock {
    /// A stopped clock with the default ~16.67 ms simulation step.
    #[must_use]
    pub fn new() -> Self {
        Self::with_step(DEFAULT_STEP_MS)
    }

    /// A stopped clock with a custom simulation step in milliseconds.
    #[must_use]
    pub fn with_step(step_ms: f32) -> Self {
        Self {
            step_ms,
            previous: None,
            running_ms: 0.0,
        }
    }

    /// Start measuring. A second call while running is ignored.
    pub fn start(&mut self) {
        if self.previous.is_none() {
            self.previous = Some(Instant::now());
            self.running_ms = 0.0;
        }
    }

    /// Stop measuring; [`delta_time`](Self::delta_time) reports zero until
    /// restarted.
    pub fn stop(&mut self) {
        self.previous = None;
    }

    /// Whether the clock is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.previous.is_some()
    }

    /// Milliseconds since the previous query (or since start for the
    /// first). Zero while stopped.
    pub fn delta_time(&mut self) -> f32 {
        let Some(previous) = self.previous else {
            return 0.0;
        };
        let now = Instant::now();
        let delta = now.duration_since(previous).as_secs_f32() * 1000.0;
        self.previous = Some(now);
        self.running_ms += delta;
        delta
    }

    /// Total milliseconds measured since start.
    pub fn elapsed_time(&mut self) -> f32 {
        let _ = self.delta_time();
        self.running_ms
    }

    /// The fixed simulation step in milliseconds.
    #[must_use]
    pub fn physics_time_step(&self) -> f32 {
        self.step_ms
    }
}
