//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering, audio or platform dependencies

pub mod collision;
pub mod geometry;
pub mod level;
pub mod particles;
pub mod powerup;
pub mod state;
pub mod tick;

pub use collision::{Axis, BlockImpact, ball_block_collision, paddle_bounce, reflect_velocity};
pub use geometry::Rect;
pub use level::{BuiltLevel, LevelError, LevelGrid, LevelPattern, build_level, default_catalog};
pub use particles::{EffectKind, EmitterConfig, EmitterId, ParticlePool, ParticleSystem};
pub use powerup::{PowerUp, PowerUpKind};
pub use state::{Ball, Block, BlockHit, BlockKind, GameEvent, GamePhase, GameState, Paddle};
pub use tick::{FixedStep, Steer, TickInput, tick};
