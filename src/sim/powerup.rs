//! Falling power-ups and the effects they apply when caught

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::geometry::Rect;
use super::state::{Ball, GameState};

/// Power-up types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerUpKind {
    /// Mirror every ball in play
    BallSplit,
    PaddleShrink,
    PaddleExtend,
    /// Every ball 50% faster
    BallSpeedUp,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 4] = [
        PowerUpKind::BallSplit,
        PowerUpKind::PaddleShrink,
        PowerUpKind::PaddleExtend,
        PowerUpKind::BallSpeedUp,
    ];

    /// Score for catching this power-up
    pub fn points(&self) -> u64 {
        match self {
            PowerUpKind::BallSplit => 300,
            PowerUpKind::PaddleShrink => 150,
            PowerUpKind::PaddleExtend => 200,
            PowerUpKind::BallSpeedUp => 250,
        }
    }

    pub fn color(&self) -> u32 {
        match self {
            PowerUpKind::BallSplit => 0x4169E1,
            PowerUpKind::PaddleShrink => 0xFF4444,
            PowerUpKind::PaddleExtend => 0x44FF44,
            PowerUpKind::BallSpeedUp => 0xFFFF44,
        }
    }

    /// Uniformly random kind
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }

    /// Apply this power-up's gameplay effect
    pub fn apply(self, state: &mut GameState) {
        match self {
            PowerUpKind::BallSplit => split_balls(state),
            PowerUpKind::PaddleShrink => scale_paddle(state, 0.67),
            PowerUpKind::PaddleExtend => scale_paddle(state, 1.33),
            PowerUpKind::BallSpeedUp => speed_up_balls(state, 1.5),
        }
    }
}

/// Add a horizontally mirrored clone of every ball in flight
fn split_balls(state: &mut GameState) {
    let sources: Vec<(Vec2, Vec2, f32)> = state
        .balls
        .iter()
        .filter(|b| b.launched)
        .map(|b| (b.pos, b.vel, b.radius))
        .collect();

    for (pos, vel, radius) in sources {
        let id = state.next_entity_id();
        let mirrored = Vec2::new(-vel.x, vel.y);
        state.balls.push(Ball::in_flight(id, pos, mirrored, radius));
    }
}

fn scale_paddle(state: &mut GameState, factor: f32) {
    let width = state.paddle.width * factor;
    state.paddle.set_width(width, state.tuning.field_width);
}

fn speed_up_balls(state: &mut GameState, factor: f32) {
    for ball in &mut state.balls {
        ball.vel *= factor;
    }
}

/// What happened to a power-up during one update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerUpStep {
    Falling,
    /// Overlapped the paddle this step
    Caught,
    /// Left the bottom of the field
    Missed,
    /// Already collected
    Inactive,
}

/// A falling power-up
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerUp {
    pub id: u32,
    pub kind: PowerUpKind,
    pub rect: Rect,
    pub fall_speed: f32,
    /// Terminal: caught or missed, removed on the next sweep
    pub collected: bool,
}

impl PowerUp {
    pub fn new(id: u32, kind: PowerUpKind, center: Vec2, size: f32, fall_speed: f32) -> Self {
        Self {
            id,
            kind,
            rect: Rect::from_center(center, size, size),
            fall_speed,
            collected: false,
        }
    }

    /// Fall, then check the paddle and the bottom edge
    pub fn update(&mut self, dt: f32, paddle: &Rect, field_height: f32) -> PowerUpStep {
        if self.collected {
            return PowerUpStep::Inactive;
        }

        self.rect.y += self.fall_speed * dt;

        if self.rect.intersects(paddle) {
            self.collected = true;
            return PowerUpStep::Caught;
        }
        if self.rect.y > field_height {
            self.collected = true;
            return PowerUpStep::Missed;
        }
        PowerUpStep::Falling
    }
}
