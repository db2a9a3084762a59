//! Frame timing.

use std::time::Instant;

/// Tracks wall-clock application time and the per-frame delta.
pub struct Timer {
    start: Instant,
    last_frame: Instant,
    delta: f32,
    elapsed: f32,
}

impl Timer {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last_frame: now,
            delta: 0.0,
            elapsed: 0.0,
        }
    }

    /// Call once at the top of each frame.
    pub fn update(&mut self) {
        let now = Instant::now();
        self.delta = (now - self.last_frame).as_secs_f32();
        self.elapsed = (now - self.start).as_secs_f32();
        self.last_frame = now;
    }

    /// Seconds since startup, as of the last update.
    pub fn t(&self) -> f32 {
        self.elapsed
    }

    /// Seconds between the last two updates.
    pub fn dt(&self) -> f32 {
        self.delta
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}
