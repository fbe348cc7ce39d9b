//! Data-driven game balance
//!
//! Every gameplay number the simulation reads comes from here. Missing
//! fields in a JSON file fall back to the defaults in [`crate::consts`].

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Tunable gameplay parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Field ===
    pub field_width: f32,
    pub field_height: f32,

    // === Paddle ===
    pub paddle_width: f32,
    pub paddle_height: f32,
    /// Gap between paddle bottom and field bottom
    pub paddle_bottom_gap: f32,
    pub paddle_min_width: f32,
    pub paddle_max_width: f32,
    pub paddle_max_speed: f32,
    pub paddle_acceleration: f32,
    pub paddle_deceleration: f32,
    /// Max bounce deviation from vertical (radians)
    pub paddle_max_bounce_angle: f32,
    /// Trail particles behind a fast paddle
    pub paddle_trails: bool,

    // === Ball ===
    pub ball_radius: f32,
    pub ball_initial_speed: f32,
    pub ball_speed_increase: f32,
    pub ball_max_speed: f32,
    /// Max launch deviation from vertical (radians)
    pub ball_launch_spread: f32,

    // === Blocks ===
    pub block_width: f32,
    pub block_height: f32,
    pub block_padding: f32,
    pub block_top_offset: f32,

    // === Session ===
    pub initial_lives: u32,
    /// Extra life every this many points (0 disables)
    pub extra_life_score: u64,
    pub breather_secs: f32,

    // === Power-ups ===
    pub power_up_size: f32,
    pub power_up_fall_speed: f32,
    /// Chance in [0, 1] that a destroyed block drops a power-up
    pub power_up_drop_chance: f32,

    // === Effects ===
    pub particle_capacity: usize,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            field_width: FIELD_WIDTH,
            field_height: FIELD_HEIGHT,

            paddle_width: PADDLE_WIDTH,
            paddle_height: PADDLE_HEIGHT,
            paddle_bottom_gap: PADDLE_BOTTOM_GAP,
            paddle_min_width: PADDLE_MIN_WIDTH,
            paddle_max_width: PADDLE_MAX_WIDTH,
            paddle_max_speed: PADDLE_MAX_SPEED,
            paddle_acceleration: PADDLE_ACCELERATION,
            paddle_deceleration: PADDLE_DECELERATION,
            paddle_max_bounce_angle: PADDLE_MAX_BOUNCE_ANGLE,
            paddle_trails: true,

            ball_radius: BALL_RADIUS,
            ball_initial_speed: BALL_INITIAL_SPEED,
            ball_speed_increase: BALL_SPEED_INCREASE,
            ball_max_speed: BALL_MAX_SPEED,
            ball_launch_spread: BALL_LAUNCH_SPREAD,

            block_width: BLOCK_WIDTH,
            block_height: BLOCK_HEIGHT,
            block_padding: BLOCK_PADDING,
            block_top_offset: BLOCK_TOP_OFFSET,

            initial_lives: INITIAL_LIVES,
            extra_life_score: EXTRA_LIFE_SCORE,
            breather_secs: BREATHER_SECS,

            power_up_size: POWER_UP_SIZE,
            power_up_fall_speed: POWER_UP_FALL_SPEED,
            power_up_drop_chance: POWER_UP_DROP_CHANCE,

            particle_capacity: MAX_PARTICLES,
        }
    }
}

impl Tuning {
    /// Top edge of the paddle
    pub fn paddle_y(&self) -> f32 {
        self.field_height - self.paddle_height - self.paddle_bottom_gap
    }

    /// Launch speed for a 1-based level, capped at the max speed
    pub fn level_ball_speed(&self, level: u32) -> f32 {
        let bonus = level.saturating_sub(1) as f32 * self.ball_speed_increase;
        (self.ball_initial_speed + bonus).min(self.ball_max_speed)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load from a JSON file, falling back to defaults if it is unreadable
    pub fn load_from(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let json = match std::fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) => {
                log::warn!("Tuning file {} unreadable ({}), using defaults", path.display(), e);
                return Self::default();
            }
        };
        match Self::from_json(&json) {
            Ok(tuning) => {
                log::info!("Loaded tuning from {}", path.display());
                tuning
            }
            Err(e) => {
                log::warn!("Tuning file {} invalid ({}), using defaults", path.display(), e);
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_place_paddle_above_bottom() {
        let tuning = Tuning::default();
        assert_eq!(tuning.paddle_y(), 570.0);
    }

    #[test]
    fn test_level_speed_ramps_and_caps() {
        let tuning = Tuning::default();
        assert_eq!(tuning.level_ball_speed(1), 300.0);
        assert_eq!(tuning.level_ball_speed(2), 320.0);
        assert_eq!(tuning.level_ball_speed(16), 600.0);
        assert_eq!(tuning.level_ball_speed(100), 600.0);
        // Level 0 is treated like level 1
        assert_eq!(tuning.level_ball_speed(0), 300.0);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let tuning = Tuning::from_json(r#"{ "initial_lives": 5, "power_up_drop_chance": 0.5 }"#)
            .expect("valid json");
        assert_eq!(tuning.initial_lives, 5);
        assert_eq!(tuning.power_up_drop_chance, 0.5);
        assert_eq!(tuning.field_width, 800.0);
        assert_eq!(tuning.particle_capacity, 100);
    }

    #[test]
    fn test_json_round_trip() {
        let tuning = Tuning {
            ball_max_speed: 750.0,
            paddle_trails: false,
            ..Tuning::default()
        };
        let json = tuning.to_json().expect("serializes");
        assert_eq!(Tuning::from_json(&json).expect("parses"), tuning);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let tuning = Tuning::load_from("/nonexistent/neon-breakout/tuning.json");
        assert_eq!(tuning, Tuning::default());
    }
}
