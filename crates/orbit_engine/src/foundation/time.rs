//! Time management utilities

use std::time::Instant;

/// High-precision timer for frame and animation timing
pub struct Timer {
    last_tick: Option<Instant>,
    delta_time: f32,
    total_time: f32,
    tick_count: u64,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    /// Create a new timer; the first `update` only establishes the reference point
    pub fn new() -> Self {
        Self {
            last_tick: None,
            delta_time: 0.0,
            total_time: 0.0,
            tick_count: 0,
        }
    }

    /// Update the timer, returning the seconds elapsed since the previous update
    ///
    /// Returns `None` on the very first update, when there is no previous tick.
    pub fn update(&mut self) -> Option<f32> {
        let now = Instant::now();
        let delta = self.last_tick.map(|last| now.duration_since(last).as_secs_f32());
        self.last_tick = Some(now);
        self.tick_count += 1;

        if let Some(delta) = delta {
            self.delta_time = delta;
            self.total_time += delta;
        }
        delta
    }

    /// Get the time between the last two updates in seconds
    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    /// Get the total time accumulated between updates
    pub fn total_time(&self) -> f32 {
        self.total_time
    }

    /// Get the number of updates
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Get the average rate of updates per second
    pub fn average_rate(&self) -> f32 {
        if self.total_time > 0.0 && self.tick_count > 1 {
            (self.tick_count - 1) as f32 / self.total_time
        } else {
            0.0
        }
    }
}
