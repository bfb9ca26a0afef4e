//! Cockroach-like agents wandering a canvas and steering away from the bright
//! regions of a binary obstacle mask.

pub mod canvas;
pub mod clock;
pub mod config;
pub mod constants;
pub mod error;
pub mod headless;
pub mod mask;
pub mod mask_feed;
pub mod render_loop;
pub mod renderer;
pub mod simulation;
pub mod sprite;
pub mod steering;
pub mod utils;
