//! Fixed-rate tick scheduler for runs without a window.

use crate::constants::HEADLESS_TICK_INTERVAL;
use crate::render_loop::RenderLoop;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// Clonable cancellation flag. Once cancelled, the driver runs no further tick.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Summary of a finished headless run.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunSummary {
    pub ticks: u64,
    pub advanced_ticks: u64,
    pub last_fps: f32,
}

pub struct HeadlessDriver {
    interval: Duration,
    cancel: CancelToken,
}

impl Default for HeadlessDriver {
    fn default() -> Self {
        Self::new(HEADLESS_TICK_INTERVAL)
    }
}

impl HeadlessDriver {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            cancel: CancelToken::new(),
        }
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Ticks `render_loop` every interval until cancelled or until
    /// `max_ticks` ticks have run.
    pub fn run(&self, render_loop: &mut RenderLoop, max_ticks: Option<u64>) -> RunSummary {
        let mut summary = RunSummary::default();
        let mut next_tick = Instant::now();

        loop {
            // Checked right before every tick so a cancel always wins.
            if self.cancel.is_cancelled() || max_ticks.is_some_and(|max| summary.ticks >= max) {
                break;
            }

            let report = render_loop.tick(Instant::now());
            summary.ticks += 1;
            if report.advanced {
                summary.advanced_ticks += 1;
            }
            if let Some(fps) = report.fps {
                summary.last_fps = fps;
                log::info!("FPS: {:.1} ({} agents)", fps, render_loop.population().len());
            }

            next_tick += self.interval;
            let now = Instant::now();
            if next_tick > now {
                thread::sleep(next_tick - now);
            } else {
                next_tick = now;
            }
        }

        log::info!(
            "Headless run finished after {} ticks ({} with physics)",
            summary.ticks,
            summary.advanced_ticks
        );
        summary
    }
}
