//! Tick timing: measured frame deltas and a once-per-second FPS counter.

use crate::constants::FPS_UPDATE_INTERVAL;
use std::time::{Duration, Instant};

/// Measures the time between consecutive ticks.
#[derive(Debug, Default)]
pub struct FrameClock {
    last_tick: Option<Instant>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seconds since the previous tick, and remembers `now` for the next one.
    /// The very first tick reports zero, which skips physics for it.
    pub fn delta(&mut self, now: Instant) -> f32 {
        let delta = match self.last_tick {
            Some(last) => now.saturating_duration_since(last).as_secs_f32(),
            None => 0.0,
        };
        self.last_tick = Some(now);
        delta
    }

    pub fn last_tick(&self) -> Option<Instant> {
        self.last_tick
    }
}

/// Counts frames and emits the count once per interval.
#[derive(Debug)]
pub struct FpsCounter {
    frames: u32,
    window_start: Option<Instant>,
    interval: Duration,
    last_fps: f32,
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self::with_interval(FPS_UPDATE_INTERVAL)
    }
}

impl FpsCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_interval(interval: Duration) -> Self {
        Self {
            frames: 0,
            window_start: None,
            interval,
            last_fps: 0.0,
        }
    }

    /// Records one frame. Returns a fresh observation when an interval has
    /// elapsed since the last one.
    pub fn record_frame(&mut self, now: Instant) -> Option<f32> {
        let start = *self.window_start.get_or_insert(now);
        self.frames += 1;
        if now.saturating_duration_since(start) >= self.interval {
            self.last_fps = self.frames as f32;
            self.frames = 0;
            self.window_start = Some(now);
            log::debug!("FPS: {:.1}", self.last_fps);
            return Some(self.last_fps);
        }
        None
    }

    /// The most recent observation, 0 until the first interval completes.
    pub fn fps(&self) -> f32 {
        self.last_fps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_delta_is_zero_then_measured() {
        let start = Instant::now();
        let mut clock = FrameClock::new();
        assert_eq!(clock.delta(start), 0.0);
        let d = clock.delta(start + Duration::from_millis(16));
        assert!((d - 0.016).abs() < 1e-6);
        assert_eq!(clock.last_tick(), Some(start + Duration::from_millis(16)));
    }

    #[test]
    fn fps_reported_once_per_second() {
        let start = Instant::now();
        let mut fps = FpsCounter::new();
        let mut reports = Vec::new();
        // 60 frames per second for just over two seconds.
        for i in 0..=125u64 {
            let now = start + Duration::from_micros(i * 16_667);
            if let Some(observed) = fps.record_frame(now) {
                reports.push(observed);
            }
        }
        assert_eq!(reports.len(), 2);
        assert!(reports.iter().all(|&r| (60.0..=61.0).contains(&r)));
        assert_eq!(fps.fps(), reports[1]);
    }
}
