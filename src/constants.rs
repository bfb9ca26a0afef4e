// --- File: constants.rs ---
use std::time::Duration;

// --- Window / Canvas ---
pub const WINDOW_WIDTH: u32 = 1200;
pub const WINDOW_HEIGHT: u32 = 800;

// --- Mask Sampling ---
// A pixel is an obstacle when (R+G+B)/3 is strictly above this.
pub const OBSTACLE_BRIGHTNESS_THRESHOLD: u32 = 128;
pub const BYTES_PER_PIXEL: usize = 4;

// --- Steering ---
pub const AVOIDANCE_SAMPLE_RADIUS: f32 = 30.0;
pub const AVOIDANCE_SAMPLE_COUNT: usize = 8;
// Logical reference rate the position integration is normalized to.
pub const POSITION_SCALE: f32 = 60.0;
pub const WIGGLE_RATE: f32 = 8.0;
// Ticks with a delta at or above this are skipped (e.g. after the window was hidden).
pub const MAX_VALID_DELTA_SECS: f32 = 0.1;

// --- Population ---
pub const SIZE_JITTER_FACTOR: f32 = 0.3;
pub const INITIAL_VELOCITY_RANGE: f32 = 1.0;
pub const MAX_AGENT_COUNT: usize = 20_000;
pub const AGENT_COUNT_STEP: usize = 50;
pub const AGENT_SIZE_STEP: f32 = 1.0;
pub const WANDER_STEP: f32 = 0.1;

// --- Render Loop ---
pub const MASK_OVERLAY_ALPHA: f32 = 0.3;
pub const FPS_UPDATE_INTERVAL: Duration = Duration::from_secs(1);
pub const HEADLESS_TICK_INTERVAL: Duration = Duration::from_micros(16_667);

// --- Safe minimums for runtime-adjustable values ---
pub const MIN_MAX_SPEED: f32 = 0.001;
pub const MIN_MAX_FORCE: f32 = 0.001;
pub const MIN_AGENT_SIZE: f32 = 1.0;

// --- End of File: constants.rs ---
