//! Game clock with a variable frame delta

use std::time::{Duration, Instant};

/// Tracks frame time in milliseconds and counts whole elapsed seconds.
///
/// The delta is not accumulated into fixed steps; systems integrate with
/// whatever the last frame took, so simulation results depend on frame rate.
/// Long frames are passed through unchanged.
pub struct GameClock {
    /// Total elapsed game time in seconds
    pub total_time: f64,
    /// Time since last frame in milliseconds
    pub delta_millis: f32,
    /// Frames counted in the current one-second window
    pub frames_this_second: u32,
    /// Accumulated seconds toward the next one-second tick
    seconds_accumulator: f32,
    /// Last tick instant
    last_instant: Instant,
    /// Whether this is the first tick
    first_tick: bool,
}

impl Default for GameClock {
    fn default() -> Self {
        Self {
            total_time: 0.0,
            delta_millis: 0.0,
            frames_this_second: 0,
            seconds_accumulator: 0.0,
            last_instant: Instant::now(),
            first_tick: true,
        }
    }
}

impl GameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the clock from the wall clock. Call once per frame.
    pub fn tick(&mut self) {
        let now = Instant::now();

        if self.first_tick {
            self.first_tick = false;
            self.last_instant = now;
            self.delta_millis = 0.0;
            return;
        }

        let elapsed = now.duration_since(self.last_instant);
        self.last_instant = now;
        self.advance(elapsed);
    }

    /// Advance the clock by an explicit duration (headless runs and tests)
    pub fn advance(&mut self, elapsed: Duration) {
        self.delta_millis = elapsed.as_secs_f32() * 1000.0;
        self.total_time += f64::from(self.delta_millis) / 1000.0;
        self.seconds_accumulator += self.delta_millis / 1000.0;
        self.frames_this_second += 1;
    }

    /// Returns true once per elapsed second, consuming that second.
    ///
    /// The frame counter is reset along with it, so callers can read
    /// `frames_this_second` just before calling this for an FPS figure.
    pub fn take_elapsed_second(&mut self) -> bool {
        if self.seconds_accumulator > 1.0 {
            self.seconds_accumulator -= 1.0;
            self.frames_this_second = 0;
            true
        } else {
            false
        }
    }
}
