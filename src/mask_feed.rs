//! Local mask producer: animated black-and-white test patterns published to
//! a [`MaskSlot`] from a background thread at a fixed frame rate.
//!
//! Stands in for an external video source; the simulation only ever sees the
//! frames through the slot.

use crate::constants::BYTES_PER_PIXEL;
use crate::error::MaskError;
use crate::mask::{Mask, MaskSlot};
use glam::Vec2;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    Circle,
    Square,
    Cross,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedPreset {
    /// 640x480 circle drifting slowly, 30 fps.
    MaskStream,
    /// 320x240 small square, 30 fps.
    TestPattern,
    /// 1280x720 large circle, 60 fps.
    HighRes,
    /// 320x240 cross, 30 fps.
    Cross,
}

impl FeedPreset {
    pub const ALL: [FeedPreset; 4] = [
        FeedPreset::MaskStream,
        FeedPreset::TestPattern,
        FeedPreset::HighRes,
        FeedPreset::Cross,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FeedPreset::MaskStream => "Mask Stream",
            FeedPreset::TestPattern => "Test Pattern",
            FeedPreset::HighRes => "High-Res Stream",
            FeedPreset::Cross => "Cross Pattern",
        }
    }

    pub fn dimensions(self) -> (u32, u32) {
        match self {
            FeedPreset::MaskStream => (640, 480),
            FeedPreset::TestPattern | FeedPreset::Cross => (320, 240),
            FeedPreset::HighRes => (1280, 720),
        }
    }

    pub fn frame_rate(self) -> u32 {
        match self {
            FeedPreset::HighRes => 60,
            _ => 30,
        }
    }

    pub fn pattern(self) -> PatternKind {
        match self {
            FeedPreset::MaskStream | FeedPreset::HighRes => PatternKind::Circle,
            FeedPreset::TestPattern => PatternKind::Square,
            FeedPreset::Cross => PatternKind::Cross,
        }
    }

    /// Shape centre (in pixels) and size at `t` seconds.
    fn shape_at(self, t: f32) -> (Vec2, f32) {
        let (w, h) = self.dimensions();
        let (w, h) = (w as f32, h as f32);
        match self {
            FeedPreset::MaskStream => (
                Vec2::new(((t * 1.0).sin() * 0.3 + 0.5) * w, ((t * 0.7).cos() * 0.3 + 0.5) * h),
                60.0 + (t * 2.0).sin() * 20.0,
            ),
            FeedPreset::TestPattern | FeedPreset::Cross => (
                Vec2::new(((t * 2.0).sin() * 0.4 + 0.5) * w, ((t * 1.5).cos() * 0.4 + 0.5) * h),
                if self == FeedPreset::Cross { 80.0 } else { 40.0 },
            ),
            FeedPreset::HighRes => (
                Vec2::new(((t * 0.8).sin() * 0.4 + 0.5) * w, ((t * 1.2).cos() * 0.4 + 0.5) * h),
                100.0 + (t * 3.0).sin() * 30.0,
            ),
        }
    }
}

/// Renders one frame of `preset` at `t` seconds: black background, white shape.
pub fn render_pattern(preset: FeedPreset, t: f32) -> Result<Mask, MaskError> {
    let (width, height) = preset.dimensions();
    let (center, size) = preset.shape_at(t);
    let kind = preset.pattern();

    let mut data = vec![0u8; width as usize * height as usize * BYTES_PER_PIXEL];
    for (i, px) in data.chunks_exact_mut(BYTES_PER_PIXEL).enumerate() {
        let x = (i % width as usize) as f32 + 0.5;
        let y = (i / width as usize) as f32 + 0.5;
        let value = if covers(kind, center, size, Vec2::new(x, y)) { 255 } else { 0 };
        px.copy_from_slice(&[value, value, value, 255]);
    }

    Mask::from_rgba(data, width, height)
}

fn covers(kind: PatternKind, center: Vec2, size: f32, p: Vec2) -> bool {
    let d = p - center;
    match kind {
        PatternKind::Circle => d.length_squared() <= size * size,
        PatternKind::Square => d.x.abs() <= size / 2.0 && d.y.abs() <= size / 2.0,
        PatternKind::Cross => {
            let vertical = d.x.abs() <= size / 8.0 && d.y.abs() <= size / 2.0;
            let horizontal = d.x.abs() <= size / 2.0 && d.y.abs() <= size / 8.0;
            vertical || horizontal
        }
    }
}

/// A running producer thread. Dropping it stops the thread and waits for it,
/// so no frame is published after the feed is gone.
pub struct MaskFeed {
    preset: FeedPreset,
    running: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl MaskFeed {
    pub fn spawn(preset: FeedPreset, slot: MaskSlot) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let worker_flag = Arc::clone(&running);
        let interval = Duration::from_secs_f64(1.0 / preset.frame_rate() as f64);

        log::info!(
            "Starting mask feed '{}' ({}x{} @ {} fps)",
            preset.name(),
            preset.dimensions().0,
            preset.dimensions().1,
            preset.frame_rate()
        );

        let worker = thread::spawn(move || {
            let start = Instant::now();
            let mut next_frame = start;
            let mut frames: u64 = 0;
            while worker_flag.load(Ordering::Relaxed) {
                let t = start.elapsed().as_secs_f32();
                match render_pattern(preset, t) {
                    Ok(mask) => slot.publish(mask),
                    Err(e) => log::warn!("Mask feed '{}' produced a bad frame: {}", preset.name(), e),
                }
                frames += 1;
                if frames % (preset.frame_rate() as u64 * 2) == 0 {
                    log::debug!("Mask feed '{}': sent frame {}", preset.name(), frames);
                }

                next_frame += interval;
                let now = Instant::now();
                if next_frame > now {
                    thread::sleep(next_frame - now);
                } else {
                    // Fell behind; don't try to catch up with a burst.
                    next_frame = now;
                }
            }
        });

        Self {
            preset,
            running,
            worker: Some(worker),
        }
    }

    pub fn preset(&self) -> FeedPreset {
        self.preset
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// Stops the producer and joins it. Idempotent.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::warn!("Mask feed '{}' worker panicked", self.preset.name());
            } else {
                log::info!("Stopped mask feed '{}'", self.preset.name());
            }
        }
    }
}

impl Drop for MaskFeed {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn circle_starts_centred_horizontally() {
        // At t = 0: x = 0.5 * w, y = (cos 0 * 0.3 + 0.5) * h = 0.8 * h, radius 60.
        let mask = render_pattern(FeedPreset::MaskStream, 0.0).unwrap();
        assert_eq!((mask.width(), mask.height()), (640, 480));
        assert_eq!(mask.is_obstacle(320.0, 384.0), 1);
        assert_eq!(mask.is_obstacle(320.0 + 55.0, 384.0), 1);
        assert_eq!(mask.is_obstacle(320.0 + 65.0, 384.0), 0);
        assert_eq!(mask.is_obstacle(10.0, 10.0), 0);
    }

    #[test]
    fn square_and_cross_shapes() {
        let square = render_pattern(FeedPreset::TestPattern, 0.0).unwrap();
        // Centre (160, 216), size 40.
        assert_eq!(square.is_obstacle(160.0, 216.0), 1);
        assert_eq!(square.is_obstacle(178.0, 198.0), 1);
        assert_eq!(square.is_obstacle(185.0, 216.0), 0);

        let cross = render_pattern(FeedPreset::Cross, 0.0).unwrap();
        // Centre (160, 216), arm length 80, arm width 20.
        assert_eq!(cross.is_obstacle(195.0, 216.0), 1);
        assert_eq!(cross.is_obstacle(160.0, 180.0), 1);
        assert_eq!(cross.is_obstacle(190.0, 190.0), 0);
    }

    #[test]
    fn pattern_moves_over_time() {
        let a = render_pattern(FeedPreset::HighRes, 0.0).unwrap();
        let b = render_pattern(FeedPreset::HighRes, 1.0).unwrap();
        assert_ne!(a, b);
        assert_eq!(render_pattern(FeedPreset::HighRes, 1.0).unwrap(), b);
    }

    #[test]
    fn feed_publishes_and_stops() {
        let slot = MaskSlot::new();
        let mut feed = MaskFeed::spawn(FeedPreset::TestPattern, slot.clone());

        let deadline = Instant::now() + Duration::from_secs(2);
        while slot.snapshot().is_none() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert!(slot.snapshot().is_some());

        feed.stop();
        assert!(!feed.is_running());
        slot.clear();
        thread::sleep(Duration::from_millis(80));
        assert!(slot.snapshot().is_none());
    }
}
