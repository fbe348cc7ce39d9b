//! Neon Breakout - A ball-and-paddle block breaker
//!
//! Core modules:
//! - `sim`: Deterministic simulation (physics, collisions, particles, levels)
//! - `render`: Draw-call sink the host implements
//! - `audio`: Sound cues derived from simulation events
//! - `tuning`: Data-driven game balance
//! - `settings`: Player preferences
//! - `highscores`: Ranked score list kept by the host

pub mod audio;
pub mod highscores;
pub mod render;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use highscores::HighScores;
pub use settings::{QualityPreset, Settings};
pub use tuning::Tuning;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (120 Hz for smooth physics)
    pub const SIM_DT: f32 = 1.0 / 120.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Longest frame the fixed-step driver will account for
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Play-field dimensions (y grows downward)
    pub const FIELD_WIDTH: f32 = 800.0;
    pub const FIELD_HEIGHT: f32 = 600.0;

    /// Paddle defaults
    pub const PADDLE_WIDTH: f32 = 100.0;
    pub const PADDLE_HEIGHT: f32 = 20.0;
    /// Gap between paddle bottom and field bottom
    pub const PADDLE_BOTTOM_GAP: f32 = 10.0;
    pub const PADDLE_MIN_WIDTH: f32 = 50.0;
    pub const PADDLE_MAX_WIDTH: f32 = 200.0;
    pub const PADDLE_MAX_SPEED: f32 = 1000.0;
    pub const PADDLE_ACCELERATION: f32 = 2000.0;
    pub const PADDLE_DECELERATION: f32 = 3000.0;

    /// Ball defaults
    pub const BALL_RADIUS: f32 = 8.0;
    pub const BALL_INITIAL_SPEED: f32 = 300.0;
    /// Launch speed gained per level
    pub const BALL_SPEED_INCREASE: f32 = 20.0;
    pub const BALL_MAX_SPEED: f32 = 600.0;
    /// Max launch deviation from vertical (radians)
    pub const BALL_LAUNCH_SPREAD: f32 = 0.25;
    /// Paddle reflection cap, measured from vertical
    pub const PADDLE_MAX_BOUNCE_ANGLE: f32 = std::f32::consts::FRAC_PI_3;

    /// Block layout
    pub const BLOCK_WIDTH: f32 = 60.0;
    pub const BLOCK_HEIGHT: f32 = 20.0;
    pub const BLOCK_PADDING: f32 = 10.0;
    pub const BLOCK_TOP_OFFSET: f32 = 50.0;

    /// Session rules
    pub const INITIAL_LIVES: u32 = 3;
    pub const EXTRA_LIFE_SCORE: u64 = 10_000;
    /// Pause between a cleared level and the next one
    pub const BREATHER_SECS: f32 = 2.0;

    /// Power-ups
    pub const POWER_UP_SIZE: f32 = 20.0;
    pub const POWER_UP_FALL_SPEED: f32 = 150.0;
    pub const POWER_UP_DROP_CHANCE: f32 = 0.1;

    /// Default particle pool capacity
    pub const MAX_PARTICLES: usize = 100;
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}
