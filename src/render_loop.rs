//! The per-tick driver: timing, FPS, drawing and (when running) physics.
//!
//! [`RenderLoop::tick`] is a plain function of the current instant. Whatever
//! schedules it (the window's redraw requests or the headless timer) only
//! has to call it once per frame.

use crate::canvas::Canvas;
use crate::clock::{FpsCounter, FrameClock};
use crate::config::{ConfigChange, ConfigUpdate, SimulationConfig};
use crate::constants::MASK_OVERLAY_ALPHA;
use crate::error::MaskError;
use crate::mask::MaskSlot;
use crate::simulation::{Population, SimRng};
use crate::sprite::draw_agent;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Paused,
    Running,
}

/// What happened during one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    pub delta_secs: f32,
    /// Physics ran this tick.
    pub advanced: bool,
    pub drew_overlay: bool,
    /// Set on the tick that completed an FPS interval.
    pub fps: Option<f32>,
}

pub struct RenderLoop {
    config: SimulationConfig,
    population: Population,
    masks: MaskSlot,
    canvas: Canvas,
    clock: FrameClock,
    fps: FpsCounter,
    state: RunState,
}

impl RenderLoop {
    /// Builds the loop in the paused state with a freshly generated population.
    pub fn new(config: SimulationConfig, width: u32, height: u32, rng: SimRng, masks: MaskSlot) -> Self {
        let config = config.sanitized();
        let canvas = Canvas::new(width.max(1), height.max(1));
        let mut population = Population::new(canvas.size(), rng);
        population.resize(config.agent_count, config.agent_size);

        Self {
            config,
            population,
            masks,
            canvas,
            clock: FrameClock::new(),
            fps: FpsCounter::new(),
            state: RunState::Paused,
        }
    }

    pub fn tick(&mut self, now: Instant) -> TickReport {
        // --- Timing ---
        let delta_secs = self.clock.delta(now);
        let fps = self.fps.record_frame(now);

        // One mask for the whole tick, even if a producer swaps it meanwhile.
        let mask = self.masks.snapshot();

        // --- Background & Overlay ---
        self.canvas.clear(self.config.background_color);
        let drew_overlay = match (&mask, self.config.show_mask_overlay) {
            (Some(mask), true) => {
                self.canvas.draw_mask_overlay(mask, MASK_OVERLAY_ALPHA);
                true
            }
            _ => false,
        };

        // --- Physics ---
        let advanced = self.state == RunState::Running
            && self.population.advance(
                delta_secs,
                mask.as_deref(),
                &self.config,
                self.canvas.size(),
            );

        // --- Agents (drawn even while paused) ---
        let palette = self.config.palette();
        for agent in self.population.agents() {
            draw_agent(&mut self.canvas, agent, &palette);
        }

        TickReport {
            delta_secs,
            advanced,
            drew_overlay,
            fps,
        }
    }

    /// Applies a partial config between ticks, regenerating the population
    /// when the count or base size changed.
    pub fn set_config(&mut self, update: &ConfigUpdate) -> ConfigChange {
        let change = self.config.apply(update);
        log::info!("Config updated: {:?}", update);
        if change.regenerate_population {
            self.population
                .resize(self.config.agent_count, self.config.agent_size);
        }
        change
    }

    pub fn set_running(&mut self, running: bool) {
        let next = if running {
            RunState::Running
        } else {
            RunState::Paused
        };
        if next != self.state {
            log::info!("Simulation {}", if running { "running" } else { "paused" });
        }
        self.state = next;
    }

    pub fn toggle_running(&mut self) {
        self.set_running(self.state == RunState::Paused);
    }

    pub fn is_running(&self) -> bool {
        self.state == RunState::Running
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Resizes the drawing surface. Agents keep their positions; the next
    /// physics step bounces any that ended up outside.
    pub fn resize_canvas(&mut self, width: u32, height: u32) {
        let (width, height) = (width.max(1), height.max(1));
        if width == self.canvas.width() && height == self.canvas.height() {
            return;
        }
        self.canvas.resize(width, height);
        self.population.set_bounds(self.canvas.size());
        log::info!("Canvas resized to {}x{}", width, height);
    }

    /// Replaces the mask with a raw RGBA frame; a malformed frame is rejected
    /// and the previous mask stays active.
    pub fn set_mask(&self, data: Vec<u8>, width: u32, height: u32) -> Result<(), MaskError> {
        self.masks.publish_rgba(data, width, height)
    }

    pub fn mask_slot(&self) -> &MaskSlot {
        &self.masks
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn fps(&self) -> f32 {
        self.fps.fps()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mask::Mask;
    use rand::SeedableRng;
    use std::time::Duration;

    fn small_loop() -> RenderLoop {
        let config = SimulationConfig {
            agent_count: 10,
            ..SimulationConfig::default()
        };
        RenderLoop::new(config, 320, 240, SimRng::seed_from_u64(5), MaskSlot::new())
    }

    #[test]
    fn starts_paused_and_still_draws() {
        let mut sim = small_loop();
        let start = Instant::now();
        sim.tick(start);
        let before = sim.population().agents().to_vec();

        let report = sim.tick(start + Duration::from_millis(16));
        assert!(!report.advanced);
        assert_eq!(sim.population().agents(), before.as_slice());

        let background = sim.config().background_color.to_rgba();
        let drawn = sim.canvas().pixels().chunks(4).filter(|p| *p != background).count();
        assert!(drawn > 0);
    }

    #[test]
    fn first_tick_never_advances() {
        let mut sim = small_loop();
        sim.set_running(true);
        let report = sim.tick(Instant::now());
        assert_eq!(report.delta_secs, 0.0);
        assert!(!report.advanced);
    }

    #[test]
    fn running_ticks_advance_within_window() {
        let mut sim = small_loop();
        sim.set_running(true);
        let start = Instant::now();
        sim.tick(start);
        assert!(sim.tick(start + Duration::from_millis(16)).advanced);
        // A stall after e.g. a hidden window.
        assert!(!sim.tick(start + Duration::from_millis(616)).advanced);
        assert!(sim.tick(start + Duration::from_millis(632)).advanced);
    }

    #[test]
    fn overlay_only_with_mask_and_flag() {
        let mut sim = small_loop();
        let start = Instant::now();
        assert!(!sim.tick(start).drew_overlay);

        sim.set_config(&ConfigUpdate {
            show_mask_overlay: Some(true),
            ..Default::default()
        });
        assert!(!sim.tick(start).drew_overlay);

        sim.mask_slot()
            .publish(Mask::filled(32, 24, [255, 255, 255, 255]).unwrap());
        assert!(sim.tick(start).drew_overlay);
    }

    #[test]
    fn config_change_regenerates_only_when_needed() {
        let mut sim = small_loop();
        let before = sim.population().agents().to_vec();

        sim.set_config(&ConfigUpdate {
            max_speed: Some(4.0),
            ..Default::default()
        });
        assert_eq!(sim.population().agents(), before.as_slice());

        let change = sim.set_config(&ConfigUpdate {
            agent_count: Some(25),
            ..Default::default()
        });
        assert!(change.regenerate_population);
        assert_eq!(sim.population().len(), 25);
    }

    #[test]
    fn bad_mask_keeps_previous() {
        let sim = small_loop();
        sim.set_mask(vec![0; 4 * 4 * 4], 4, 4).unwrap();
        let before = sim.mask_slot().snapshot().unwrap();
        assert!(sim.set_mask(vec![0; 10], 4, 4).is_err());
        assert!(std::sync::Arc::ptr_eq(&before, &sim.mask_slot().snapshot().unwrap()));
    }

    #[test]
    fn toggle_and_resize() {
        let mut sim = small_loop();
        sim.toggle_running();
        assert_eq!(sim.state(), RunState::Running);
        sim.toggle_running();
        assert!(!sim.is_running());

        sim.resize_canvas(0, 100);
        assert_eq!((sim.canvas().width(), sim.canvas().height()), (1, 100));
        assert_eq!(sim.population().bounds(), sim.canvas().size());
    }
}
