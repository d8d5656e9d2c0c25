//! Frame timing utilities

use std::time::{Duration, Instant};

/// Largest delta a [`FrameClock`] reports, so a stall does not explode the simulation
pub const DEFAULT_MAX_DELTA: f32 = 0.25;

/// Measures wall-clock delta time between host-loop iterations
pub struct FrameClock {
    last_tick: Instant,
    max_delta: f32,
    frame_count: u64,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock {
    /// Create a clock starting now
    pub fn new() -> Self {
        Self::with_max_delta(DEFAULT_MAX_DELTA)
    }

    /// Create a clock with a custom delta clamp. Non-positive clamps fall back to the default.
    pub fn with_max_delta(max_delta: f32) -> Self {
        let max_delta = if max_delta > 0.0 && max_delta.is_finite() {
            max_delta
        } else {
            log::warn!("[FrameClock] Invalid max delta {max_delta}, using {DEFAULT_MAX_DELTA}");
            DEFAULT_MAX_DELTA
        };
        Self {
            last_tick: Instant::now(),
            max_delta,
            frame_count: 0,
        }
    }

    /// Advance one frame and return the clamped delta in seconds
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let delta = now.duration_since(self.last_tick).as_secs_f32();
        self.last_tick = now;
        self.frame_count += 1;
        delta.min(self.max_delta)
    }

    /// Number of ticks so far
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

/// Accumulating stopwatch for profiling sections of a frame
#[derive(Debug, Default)]
pub struct Stopwatch {
    started: Option<Instant>,
    accumulated: Duration,
}

impl Stopwatch {
    /// Create a stopped stopwatch
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or keep running)
    pub fn start(&mut self) {
        if self.started.is_none() {
            self.started = Some(Instant::now());
        }
    }

    /// Stop and fold the running interval into the total
    pub fn stop(&mut self) {
        if let Some(start) = self.started.take() {
            self.accumulated += start.elapsed();
        }
    }

    /// Reset to zero and stop
    pub fn reset(&mut self) {
        self.started = None;
        self.accumulated = Duration::ZERO;
    }

    /// Total elapsed time including the running interval
    pub fn elapsed(&self) -> Duration {
        self.accumulated + self.started.map_or(Duration::ZERO, |s| s.elapsed())
    }

    /// Whether the stopwatch is running
    pub fn is_running(&self) -> bool {
        self.started.is_some()
    }
}
