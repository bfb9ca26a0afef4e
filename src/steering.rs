// --- File: steering.rs ---
// Per-agent physics: mask avoidance, wander noise, integration and wall bounce.
use crate::config::SimulationConfig;
use crate::constants::*;
use crate::mask::Mask;
use crate::simulation::Agent;
use crate::utils::{clamp_to_range, limit};
use glam::Vec2;
use rand::Rng;
use std::f32::consts::TAU;

/// True when a measured tick delta is usable for physics: strictly positive
/// and below [`MAX_VALID_DELTA_SECS`].
pub fn is_valid_delta(delta_secs: f32) -> bool {
    delta_secs > 0.0 && delta_secs < MAX_VALID_DELTA_SECS
}

/// Unsummed result of the ring of obstacle probes around one position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObstacleProbe {
    /// Sum of unit vectors pointing from each obstructed sample back to the agent.
    pub raw_force: Vec2,
    /// How many of the samples landed on an obstacle.
    pub hits: usize,
}

/// Casts [`AVOIDANCE_SAMPLE_COUNT`] probes at [`AVOIDANCE_SAMPLE_RADIUS`],
/// evenly spaced starting at angle 0.
///
/// Obstacle strength is binary, so every obstructed sample contributes a
/// full unit vector. Without a mask nothing is an obstacle.
pub fn probe_obstacles(position: Vec2, mask: Option<&Mask>) -> ObstacleProbe {
    let Some(mask) = mask else {
        return ObstacleProbe {
            raw_force: Vec2::ZERO,
            hits: 0,
        };
    };

    let mut raw_force = Vec2::ZERO;
    let mut hits = 0;
    for i in 0..AVOIDANCE_SAMPLE_COUNT {
        let angle = (i as f32 / AVOIDANCE_SAMPLE_COUNT as f32) * TAU;
        let sample = position + Vec2::from_angle(angle) * AVOIDANCE_SAMPLE_RADIUS;

        let strength = mask.is_obstacle(sample.x, sample.y);
        if strength > 0 {
            hits += 1;
            let away = position - sample;
            let distance = away.length();
            if distance > 0.0 {
                raw_force += (away / distance) * strength as f32;
            }
        }
    }
    ObstacleProbe { raw_force, hits }
}

/// Avoidance force clamped to `max_force`. Strength is applied by the caller,
/// after this clamp.
pub fn avoidance_force(position: Vec2, mask: Option<&Mask>, max_force: f32) -> Vec2 {
    limit(probe_obstacles(position, mask).raw_force, max_force)
}

/// Uncorrelated per-tick noise, each component uniform in `[-0.5, 0.5) * amount`.
pub fn wander_force<R: Rng + ?Sized>(rng: &mut R, wander_amount: f32) -> Vec2 {
    Vec2::new(
        rng.gen_range(-0.5f32..0.5) * wander_amount,
        rng.gen_range(-0.5f32..0.5) * wander_amount,
    )
}

/// Advances one agent by `delta_secs`.
///
/// `wander` is drawn by the caller so that agents can be stepped in any order
/// (or in parallel) without sharing a generator. Invalid deltas leave the agent
/// untouched.
pub fn step_agent(
    agent: &mut Agent,
    delta_secs: f32,
    mask: Option<&Mask>,
    config: &SimulationConfig,
    bounds: Vec2,
    wander: Vec2,
) {
    if !is_valid_delta(delta_secs) {
        return;
    }

    // --- Forces ---
    let avoidance = avoidance_force(agent.position, mask, config.max_force);
    let total_force = avoidance * config.avoidance_strength + wander;

    // --- Integration ---
    let mut velocity = limit(agent.velocity + total_force * delta_secs, config.max_speed);
    let mut position = agent.position + velocity * delta_secs * POSITION_SCALE;

    // --- Wall Bounce (per axis) ---
    let size = agent.size;
    if position.x <= size || position.x >= bounds.x - size {
        velocity.x *= -config.bounce_force;
        position.x = clamp_to_range(position.x, size, bounds.x - size);
    }
    if position.y <= size || position.y >= bounds.y - size {
        velocity.y *= -config.bounce_force;
        position.y = clamp_to_range(position.y, size, bounds.y - size);
    }

    agent.position = position;
    agent.velocity = velocity;
    // Keep the last heading while stopped so the sprite doesn't snap to 0.
    if velocity != Vec2::ZERO {
        agent.angle = velocity.y.atan2(velocity.x);
    }
    agent.wiggle_phase += delta_secs * WIGGLE_RATE;
}


// --- End of File: steering.rs ---
