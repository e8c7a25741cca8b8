//! Frame timing for the experiments.
//!
//! Every kernel integrates with `delta()`, so this is the single place where
//! pausing, slow motion and long-frame clamping happen.
//!
//! # Example
//!
//! ```ignore
//! use plasma_lab::time::Time;
//!
//! let mut time = Time::new();
//!
//! // In the redraw handler:
//! time.update();
//!
//! log::debug!("t={:.2}s dt={:.4}s fps={:.1}", time.elapsed(), time.delta(), time.fps());
//! ```

use std::time::{Duration, Instant};

/// Longest raw frame the simulation will integrate in one step.
///
/// A stalled frame (window drag, breakpoint) would otherwise fling every
/// particle through the bounds.
pub const MAX_FRAME_DELTA: f32 = 1.0 / 30.0;

/// Time tracking for simulations and rendering.
#[derive(Debug)]
pub struct Time {
    last_frame: Instant,
    /// Scaled simulation time in seconds. Stops while paused.
    elapsed_secs: f32,
    /// Scaled step of the last frame in seconds.
    delta_secs: f32,
    frame_count: u64,
    fps: f32,
    fps_frame_count: u64,
    fps_update_time: Instant,
    fps_update_interval: Duration,
    paused: bool,
    /// Fixed delta time for deterministic updates (optional).
    fixed_delta: Option<f32>,
    /// Time scale multiplier (1.0 = normal speed).
    time_scale: f32,
    max_delta: f32,
}

impl Time {
    /// Create a new time tracker starting from now.
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            last_frame: now,
            elapsed_secs: 0.0,
            delta_secs: 0.0,
            frame_count: 0,
            fps: 0.0,
            fps_frame_count: 0,
            fps_update_time: now,
            fps_update_interval: Duration::from_millis(500),
            paused: false,
            fixed_delta: None,
            time_scale: 1.0,
            max_delta: MAX_FRAME_DELTA,
        }
    }

    /// Sample the wall clock and advance. Call once per frame.
    ///
    /// Returns `(elapsed_time, delta_time)` for convenience.
    pub fn update(&mut self) -> (f32, f32) {
        let now = Instant::now();
        let raw_delta = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;

        let fps_elapsed = now.duration_since(self.fps_update_time);
        if fps_elapsed >= self.fps_update_interval {
            let frames_since = self.frame_count - self.fps_frame_count;
            self.fps = frames_since as f32 / fps_elapsed.as_secs_f32();
            self.fps_frame_count = self.frame_count;
            self.fps_update_time = now;
        }

        self.advance(raw_delta)
    }

    /// Advance by an explicit raw frame duration.
    ///
    /// This is what [`update`](Self::update) does after reading the clock;
    /// tests and headless runs call it directly.
    pub fn advance(&mut self, raw_delta: f32) -> (f32, f32) {
        self.frame_count += 1;

        if self.paused {
            self.delta_secs = 0.0;
            return (self.elapsed_secs, self.delta_secs);
        }

        let raw = self.fixed_delta.unwrap_or(raw_delta).clamp(0.0, self.max_delta);
        self.delta_secs = raw * self.time_scale;
        self.elapsed_secs += self.delta_secs;

        (self.elapsed_secs, self.delta_secs)
    }

    /// Scaled simulation time in seconds since start.
    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed_secs
    }

    /// Time since last frame in seconds (delta time).
    #[inline]
    pub fn delta(&self) -> f32 {
        self.delta_secs
    }

    /// Total frames since start, paused ones included.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    #[inline]
    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// While paused, `delta()` returns 0 and `elapsed()` stops increasing.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        if self.paused {
            self.last_frame = Instant::now();
            self.paused = false;
        }
    }

    pub fn toggle_pause(&mut self) {
        if self.paused {
            self.resume();
        } else {
            self.pause();
        }
    }

    /// Set a fixed delta time for deterministic updates.
    ///
    /// Pass `None` to use real frame timing.
    pub fn set_fixed_delta(&mut self, delta: Option<f32>) {
        self.fixed_delta = delta;
    }

    /// Set time scale multiplier.
    ///
    /// - `1.0` = normal speed
    /// - `0.5` = half speed (slow motion)
    /// - `2.0` = double speed
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = scale.max(0.0);
    }

    /// Raise or lower the long-frame clamp.
    pub fn set_max_delta(&mut self, max_delta: f32) {
        self.max_delta = max_delta.max(0.0);
    }

    /// Reset the clock. Pause state and time scale are kept.
    pub fn reset(&mut self) {
        let now = Instant::now();
        self.last_frame = now;
        self.elapsed_secs = 0.0;
        self.delta_secs = 0.0;
        self.frame_count = 0;
        self.fps = 0.0;
        self.fps_frame_count = 0;
        self.fps_update_time = now;
    }
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_time_new() {
        let time = Time::new();
        assert_eq!(time.frame(), 0);
        assert!(!time.is_paused());
        assert_eq!(time.time_scale(), 1.0);
    }

    #[test]
    fn test_time_update() {
        let mut time = Time::new();
        thread::sleep(Duration::from_millis(10));
        let (elapsed, delta) = time.update();

        assert!(elapsed > 0.0);
        assert!(delta > 0.0);
        assert_eq!(time.frame(), 1);
    }

    #[test]
    fn test_long_frame_is_clamped() {
        let mut time = Time::new();
        let (_, delta) = time.advance(0.5);
        assert!((delta - MAX_FRAME_DELTA).abs() < 1e-6);
    }

    #[test]
    fn test_clamp_applies_before_scale() {
        let mut time = Time::new();
        time.set_time_scale(2.0);
        let (_, delta) = time.advance(1.0);
        assert!((delta - MAX_FRAME_DELTA * 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_time_pause() {
        let mut time = Time::new();
        time.advance(0.01);

        time.pause();
        assert!(time.is_paused());

        let elapsed_before = time.elapsed();
        time.advance(0.01);

        assert_eq!(time.elapsed(), elapsed_before);
        assert_eq!(time.delta(), 0.0);
        assert_eq!(time.frame(), 2);
    }

    #[test]
    fn test_elapsed_accumulates_scaled_steps() {
        let mut time = Time::new();
        time.set_time_scale(0.5);
        time.advance(0.02);
        time.advance(0.02);
        assert!((time.elapsed() - 0.02).abs() < 1e-6);
    }

    #[test]
    fn test_time_scale() {
        let mut time = Time::new();
        time.set_time_scale(2.0);
        assert_eq!(time.time_scale(), 2.0);

        // Negative scale should clamp to 0
        time.set_time_scale(-1.0);
        assert_eq!(time.time_scale(), 0.0);
    }

    #[test]
    fn test_fixed_delta() {
        let mut time = Time::new();
        time.set_fixed_delta(Some(1.0 / 60.0));

        thread::sleep(Duration::from_millis(50));
        time.update();

        let expected = 1.0 / 60.0;
        assert!((time.delta() - expected).abs() < 0.0001);
    }
}
