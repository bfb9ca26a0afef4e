// --- File: simulation.rs ---
use crate::config::SimulationConfig;
use crate::constants::*;
use crate::mask::Mask;
use crate::steering::{is_valid_delta, step_agent, wander_force};
use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::f32::consts::TAU;

pub type SimRng = StdRng;

// --- Core Data Structures ---

#[derive(Debug, Clone, PartialEq)]
pub struct Agent {
    pub id: usize,
    pub position: Vec2,
    pub velocity: Vec2,
    pub angle: f32, // last heading, used for drawing
    pub wiggle_phase: f32,
    pub size: f32,
}

/// The agent arena. Agents live in one contiguous array, mutated in place
/// every tick; an agent's id is its index.
pub struct Population {
    agents: Vec<Agent>,
    rng: SimRng,
    bounds: Vec2,
    // Reused each tick so the parallel step doesn't need the generator.
    wander_buffer: Vec<Vec2>,
}

impl Population {
    /// An empty population; call [`Population::resize`] to fill it.
    pub fn new(bounds: Vec2, rng: SimRng) -> Self {
        Self {
            agents: Vec::new(),
            rng,
            bounds,
            wander_buffer: Vec::new(),
        }
    }

    pub fn with_seed(bounds: Vec2, seed: u64) -> Self {
        Self::new(bounds, SimRng::seed_from_u64(seed))
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn bounds(&self) -> Vec2 {
        self.bounds
    }

    /// Updates the canvas size used for placement. Existing agents are not
    /// moved; the next bounce pulls them back inside.
    pub fn set_bounds(&mut self, bounds: Vec2) {
        self.bounds = bounds;
    }

    /// Throws away every agent and creates `count` fresh ones.
    pub fn resize(&mut self, count: usize, base_size: f32) {
        let bounds = self.bounds;
        self.agents.clear();
        self.agents.reserve(count);
        for id in 0..count {
            self.agents
                .push(Self::create_agent(&mut self.rng, id, bounds, base_size));
        }
        log::info!(
            "Population regenerated: {} agents, base size {:.1}, canvas {}x{}",
            count,
            base_size,
            bounds.x,
            bounds.y
        );
    }

    fn create_agent(rng: &mut SimRng, id: usize, bounds: Vec2, base_size: f32) -> Agent {
        let position = Vec2::new(random_below(rng, bounds.x), random_below(rng, bounds.y));
        let velocity = Vec2::new(
            rng.gen_range(-INITIAL_VELOCITY_RANGE..=INITIAL_VELOCITY_RANGE),
            rng.gen_range(-INITIAL_VELOCITY_RANGE..=INITIAL_VELOCITY_RANGE),
        );
        let angle = rng.gen_range(0.0..TAU);
        let wiggle_phase = rng.gen_range(0.0..TAU);
        let size = base_size + rng.gen_range(0.0..1.0) * base_size * SIZE_JITTER_FACTOR;

        Agent {
            id,
            position,
            velocity,
            angle,
            wiggle_phase,
            size,
        }
    }

    /// Steps every agent once. Returns `false` (and changes nothing) when the
    /// delta is outside the valid window.
    pub fn advance(
        &mut self,
        delta_secs: f32,
        mask: Option<&Mask>,
        config: &SimulationConfig,
        bounds: Vec2,
    ) -> bool {
        if !is_valid_delta(delta_secs) {
            log::debug!("Skipping physics for delta {:.4}s", delta_secs);
            return false;
        }
        self.bounds = bounds;
        if self.is_empty() {
            return true;
        }

        // Draw the noise in agent order so results don't depend on scheduling.
        let rng = &mut self.rng;
        self.wander_buffer.clear();
        self.wander_buffer.extend(
            (0..self.agents.len()).map(|_| wander_force(&mut *rng, config.wander_amount)),
        );

        self.agents
            .par_iter_mut()
            .zip(self.wander_buffer.par_iter())
            .for_each(|(agent, &wander)| {
                step_agent(agent, delta_secs, mask, config, bounds, wander);
            });
        true
    }
}

fn random_below(rng: &mut SimRng, max: f32) -> f32 {
    if max > 0.0 {
        rng.gen_range(0.0..max)
    } else {
        0.0
    }
}


// --- End of File: simulation.rs ---
