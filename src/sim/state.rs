//! Game state and core simulation types
//!
//! Everything the simulation mutates lives in [`GameState`]; the tick
//! functions take it by `&mut` and report what happened as [`GameEvent`]s.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::geometry::Rect;
use super::level::{self, LevelError, LevelPattern};
use super::particles::{EffectKind, ParticleSystem};
use super::powerup::{PowerUp, PowerUpKind};
use crate::tuning::Tuning;

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Ball attached to paddle, waiting for launch input
    Serve,
    /// Active gameplay
    Playing,
    /// Pause between a cleared level and the next one
    Breather,
    /// Game is paused
    Paused,
    /// Run ended
    GameOver,
}

/// Something that happened during a tick, for the host to react to
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum GameEvent {
    LevelStarted { level: u32, repaired: usize },
    BallLaunched,
    WallBounce,
    PaddleBounce,
    /// Block survived the hit (or is unbreakable)
    BlockHit { kind: BlockKind },
    BlockDestroyed { id: u32, kind: BlockKind, points: u64 },
    PowerUpSpawned { kind: PowerUpKind },
    PowerUpCollected { kind: PowerUpKind, points: u64 },
    /// Power-up fell off the field without effect
    PowerUpMissed { kind: PowerUpKind },
    BallLost,
    LifeLost { lives_left: u32 },
    ExtraLife { lives: u32 },
    LevelCleared { level: u32 },
    GameOver { score: u64, level: u32 },
    Paused,
    Resumed,
}

/// A ball entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ball {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    /// False while the ball rides on the paddle
    pub launched: bool,
}

impl Ball {
    /// A ball waiting on the paddle
    pub fn attached(id: u32, radius: f32, paddle: &Paddle) -> Self {
        let mut ball = Self {
            id,
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            radius,
            launched: false,
        };
        ball.follow(paddle);
        ball
    }

    /// A ball already in flight
    pub fn in_flight(id: u32, pos: Vec2, vel: Vec2, radius: f32) -> Self {
        Self {
            id,
            pos,
            vel,
            radius,
            launched: true,
        }
    }

    /// Keep an unlaunched ball centered just above the paddle
    pub fn follow(&mut self, paddle: &Paddle) {
        if !self.launched {
            self.pos = Vec2::new(paddle.center_x(), paddle.y - self.radius - 1.0);
        }
    }

    /// Launch upward, deviating `angle` radians from vertical
    pub fn launch(&mut self, speed: f32, angle: f32) {
        if !self.launched {
            self.vel = Vec2::new(angle.sin() * speed, -angle.cos() * speed);
            self.launched = true;
        }
    }

    #[inline]
    pub fn speed(&self) -> f32 {
        self.vel.length()
    }
}

/// The player's paddle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paddle {
    /// Left edge
    pub x: f32,
    /// Top edge (fixed)
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Signed horizontal speed (pixels/s)
    pub speed: f32,
    pub base_width: f32,
    pub min_width: f32,
    pub max_width: f32,
    pub max_speed: f32,
    pub acceleration: f32,
    pub deceleration: f32,
}

impl Paddle {
    pub fn new(tuning: &Tuning) -> Self {
        let mut paddle = Self {
            x: 0.0,
            y: tuning.paddle_y(),
            width: tuning.paddle_width,
            height: tuning.paddle_height,
            speed: 0.0,
            base_width: tuning.paddle_width,
            min_width: tuning.paddle_min_width,
            max_width: tuning.paddle_max_width,
            max_speed: tuning.paddle_max_speed,
            acceleration: tuning.paddle_acceleration,
            deceleration: tuning.paddle_deceleration,
        };
        paddle.reset(tuning.field_width);
        paddle
    }

    /// Center on the field, stop, and restore the base width
    pub fn reset(&mut self, field_width: f32) {
        self.width = self.base_width.clamp(self.min_width, self.max_width);
        self.x = field_width / 2.0 - self.width / 2.0;
        self.speed = 0.0;
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    #[inline]
    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }

    /// Resize around the current center, clamped to [min_width, max_width]
    pub fn set_width(&mut self, width: f32, field_width: f32) {
        let center = self.center_x();
        self.width = width.clamp(self.min_width, self.max_width);
        self.x = center - self.width / 2.0;
        self.clamp_to_field(field_width);
    }

    /// Accelerate in `direction` (-1 left, +1 right)
    pub fn push(&mut self, direction: f32, dt: f32) {
        self.speed = (self.speed + direction * self.acceleration * dt)
            .clamp(-self.max_speed, self.max_speed);
    }

    /// Friction toward standstill
    pub fn coast(&mut self, dt: f32) {
        let step = self.deceleration * dt;
        if self.speed > 0.0 {
            self.speed = (self.speed - step).max(0.0);
        } else if self.speed < 0.0 {
            self.speed = (self.speed + step).min(0.0);
        }
    }

    /// Move by current speed; stop dead at the field edges
    pub fn integrate(&mut self, dt: f32, field_width: f32) {
        self.x += self.speed * dt;
        self.clamp_to_field(field_width);
    }

    /// Chase a target center x using acceleration, snapping instead of overshooting
    pub fn steer_toward(&mut self, target_x: f32, dt: f32, field_width: f32) {
        let half = self.width / 2.0;
        let target = target_x.clamp(half, (field_width - half).max(half));
        let delta = target - self.center_x();

        if delta.abs() < 0.5 {
            self.x = target - half;
            self.speed = 0.0;
            return;
        }

        self.push(delta.signum(), dt);
        let step = self.speed * dt;
        if step.signum() == delta.signum() && step.abs() >= delta.abs() {
            self.x = target - half;
            self.speed = 0.0;
        } else {
            self.integrate(dt, field_width);
        }
    }

    fn clamp_to_field(&mut self, field_width: f32) {
        if self.x < 0.0 {
            self.x = 0.0;
            self.speed = 0.0;
        }
        if self.x + self.width > field_width {
            self.x = field_width - self.width;
            self.speed = 0.0;
        }
    }
}

/// Mixed into the run seed for the cosmetic RNG stream
const FX_SEED_SALT: u64 = 0x9E37_79B9_7F4A_7C15;

/// Neon palette Normal blocks pick from
pub const NEON_PALETTE: [u32; 10] = [
    0xFF00FF, 0x00FF00, 0x00FFFF, 0xFF0066, 0xFF3300, 0xFF66FF, 0x33FF33, 0x3366FF, 0xFFFF00,
    0xFF3399,
];

/// Block types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BlockKind {
    #[default]
    Normal,
    Hard,
    /// Cannot be destroyed, doesn't count for level clear
    Unbreakable,
}

impl BlockKind {
    /// Starting health; `None` means infinite
    pub fn initial_health(&self) -> Option<u8> {
        match self {
            BlockKind::Normal => Some(1),
            BlockKind::Hard => Some(2),
            BlockKind::Unbreakable => None,
        }
    }

    /// Score for destroying a block of this kind
    pub fn points(&self) -> u64 {
        match self {
            BlockKind::Normal => 10,
            BlockKind::Hard => 20,
            BlockKind::Unbreakable => 0,
        }
    }

    #[inline]
    pub fn is_destructible(&self) -> bool {
        *self != BlockKind::Unbreakable
    }

    /// Pick the display color for a new block
    pub fn pick_color<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        match self {
            BlockKind::Normal => NEON_PALETTE[rng.random_range(0..NEON_PALETTE.len())],
            BlockKind::Hard => 0xFF3300,
            BlockKind::Unbreakable => 0xFFFFFF,
        }
    }
}

/// Outcome of a ball striking a block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockHit {
    /// Unbreakable: no damage
    Immune,
    Damaged { remaining: u8 },
    Destroyed,
    /// Block was already destroyed
    Ignored,
}

/// A block entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub id: u32,
    pub kind: BlockKind,
    pub rect: Rect,
    /// Remaining health (unused for Unbreakable)
    pub health: u8,
    pub max_health: u8,
    pub color: u32,
    pub destroyed: bool,
}

impl Block {
    pub fn new(id: u32, kind: BlockKind, rect: Rect, color: u32) -> Self {
        let health = kind.initial_health().unwrap_or(u8::MAX);
        Self {
            id,
            kind,
            rect,
            health,
            max_health: health,
            color,
            destroyed: false,
        }
    }

    /// Apply one ball impact
    pub fn hit(&mut self) -> BlockHit {
        if self.destroyed {
            return BlockHit::Ignored;
        }
        if !self.kind.is_destructible() {
            return BlockHit::Immune;
        }
        self.health = self.health.saturating_sub(1);
        if self.health == 0 {
            self.destroyed = true;
            BlockHit::Destroyed
        } else {
            BlockHit::Damaged {
                remaining: self.health,
            }
        }
    }

    /// Returns true if this block must be destroyed to clear the level
    pub fn counts_for_clear(&self) -> bool {
        self.kind.is_destructible() && !self.destroyed
    }

    /// Damage fraction for display (0 = pristine)
    pub fn damage(&self) -> f32 {
        if !self.kind.is_destructible() || self.max_health == 0 {
            return 0.0;
        }
        1.0 - self.health as f32 / self.max_health as f32
    }
}

/// Complete game state
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    /// Gameplay randomness: launch angles, drops, block colors
    pub rng: Pcg32,
    /// Cosmetic randomness for particle effects, kept apart from `rng`
    pub fx_rng: Pcg32,
    pub tuning: Tuning,
    /// Level catalog, cycled by level number
    pub levels: Vec<LevelPattern>,
    /// Current level (1-based)
    pub level: u32,
    pub lives: u32,
    pub score: u64,
    /// Score at which the next extra life is awarded
    next_extra_life: u64,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub phase: GamePhase,
    /// Phase to return to when a pause ends
    pub(crate) resume_phase: Option<GamePhase>,
    /// Seconds left in the breather phase
    pub breather_timer: f32,
    pub paddle: Paddle,
    /// Active balls (sorted by id for determinism)
    pub balls: Vec<Ball>,
    /// Active blocks (sorted by id for determinism)
    pub blocks: Vec<Block>,
    /// Falling power-ups (sorted by id for determinism)
    pub power_ups: Vec<PowerUp>,
    /// Visual particles (not gameplay-affecting)
    pub particles: ParticleSystem,
    /// Unbreakable blocks demoted when the current level was built
    pub repaired: usize,
    /// Countdown until the next paddle trail puff
    pub(crate) trail_timer: f32,
    /// Next entity ID
    next_id: u32,
}

impl GameState {
    /// Create a new game with default tuning and the built-in levels
    pub fn new(seed: u64) -> Self {
        let tuning = Tuning::default();
        let mut state = Self::blank(seed, tuning, level::default_catalog());
        if let Err(e) = state.start_level() {
            log::error!("Built-in level failed to load: {}", e);
        }
        state
    }

    /// Create a new game, failing if the first level is malformed
    pub fn try_new(
        seed: u64,
        tuning: Tuning,
        levels: Vec<LevelPattern>,
    ) -> Result<Self, LevelError> {
        let mut state = Self::blank(seed, tuning, levels);
        state.start_level()?;
        Ok(state)
    }

    fn blank(seed: u64, tuning: Tuning, levels: Vec<LevelPattern>) -> Self {
        let paddle = Paddle::new(&tuning);
        let particles = ParticleSystem::with_capacity(tuning.particle_capacity);
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            fx_rng: Pcg32::seed_from_u64(seed ^ FX_SEED_SALT),
            level: 1,
            lives: tuning.initial_lives,
            score: 0,
            next_extra_life: tuning.extra_life_score,
            time_ticks: 0,
            phase: GamePhase::Serve,
            resume_phase: None,
            breather_timer: 0.0,
            paddle,
            balls: Vec::new(),
            blocks: Vec::new(),
            power_ups: Vec::new(),
            particles,
            repaired: 0,
            trail_timer: 0.0,
            next_id: 1,
            tuning,
            levels,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Build the current level and serve a fresh ball
    ///
    /// Returns the number of Unbreakable blocks the reachability repair demoted.
    pub fn start_level(&mut self) -> Result<usize, LevelError> {
        if self.levels.is_empty() {
            return Err(LevelError::NoLevels);
        }
        let index = (self.level as usize - 1) % self.levels.len();
        let built = level::build_level(
            self.levels[index].rows.as_slice(),
            &self.tuning,
            &mut self.rng,
            self.next_id,
        )?;
        self.next_id += built.blocks.len() as u32;

        log::info!(
            "Level {} ({}): {} blocks, {} repaired",
            self.level,
            self.levels[index].name,
            built.blocks.len(),
            built.repaired
        );

        self.blocks = built.blocks;
        self.repaired = built.repaired;
        self.power_ups.clear();
        self.balls.clear();
        self.paddle.reset(self.tuning.field_width);
        self.spawn_ball_attached();
        self.phase = GamePhase::Serve;
        self.resume_phase = None;
        self.breather_timer = 0.0;
        Ok(built.repaired)
    }

    /// Start over from level 1 with a full set of lives
    pub fn restart(&mut self) -> Result<usize, LevelError> {
        self.level = 1;
        self.lives = self.tuning.initial_lives;
        self.score = 0;
        self.next_extra_life = self.tuning.extra_life_score;
        self.particles.clear();
        self.start_level()
    }

    /// Spawn a ball attached to the paddle
    pub fn spawn_ball_attached(&mut self) {
        let id = self.next_entity_id();
        let ball = Ball::attached(id, self.tuning.ball_radius, &self.paddle);
        self.balls.push(ball);
    }

    /// Launch speed (and minimum speed) for the current level
    pub fn level_ball_speed(&self) -> f32 {
        self.tuning.level_ball_speed(self.level)
    }

    /// Destructible blocks still standing
    pub fn remaining_blocks(&self) -> usize {
        self.blocks.iter().filter(|b| b.counts_for_clear()).count()
    }

    /// Add points, awarding extra lives at each threshold crossed
    pub fn add_score(&mut self, points: u64, events: &mut Vec<GameEvent>) {
        self.score += points;
        if self.tuning.extra_life_score == 0 {
            return;
        }
        while self.score >= self.next_extra_life {
            self.lives += 1;
            self.next_extra_life += self.tuning.extra_life_score;
            events.push(GameEvent::ExtraLife { lives: self.lives });
        }
    }

    /// Fire a visual effect with the cosmetic RNG
    pub fn emit_effect(&mut self, kind: EffectKind, origin: Vec2, color: u32) {
        let config = kind.config();
        self.particles
            .create_emitter(&config, origin, color, &mut self.fx_rng);
    }

    /// Roll the drop chance and spawn a power-up at `center`
    pub fn maybe_drop_power_up(&mut self, center: Vec2) -> Option<PowerUpKind> {
        if self.rng.random::<f32>() >= self.tuning.power_up_drop_chance {
            return None;
        }
        let kind = PowerUpKind::random(&mut self.rng);
        self.spawn_power_up(kind, center);
        Some(kind)
    }

    /// Spawn a falling power-up centered on `center`
    pub fn spawn_power_up(&mut self, kind: PowerUpKind, center: Vec2) {
        let id = self.next_entity_id();
        self.power_ups.push(PowerUp::new(
            id,
            kind,
            center,
            self.tuning.power_up_size,
            self.tuning.power_up_fall_speed,
        ));
    }

    /// Ensure entities are sorted by ID for deterministic iteration
    pub fn normalize_order(&mut self) {
        self.balls.sort_by_key(|b| b.id);
        self.blocks.sort_by_key(|b| b.id);
        self.power_ups.sort_by_key(|p| p.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_game_serves_attached_ball() {
        let state = GameState::new(12345);
        assert_eq!(state.phase, GamePhase::Serve);
        assert_eq!(state.lives, 3);
        assert_eq!(state.balls.len(), 1);
        let ball = &state.balls[0];
        assert!(!ball.launched);
        assert!((ball.pos.x - state.paddle.center_x()).abs() < 1e-4);
        assert!(ball.pos.y < state.paddle.y);
        assert!(state.remaining_blocks() > 0);
    }

    #[test]
    fn test_block_hit_lifecycle() {
        let rect = Rect::new(0.0, 0.0, 60.0, 20.0);
        let mut hard = Block::new(1, BlockKind::Hard, rect, 0xFF3300);
        assert_eq!(hard.hit(), BlockHit::Damaged { remaining: 1 });
        assert!((hard.damage() - 0.5).abs() < 1e-6);
        assert_eq!(hard.hit(), BlockHit::Destroyed);
        assert!(hard.destroyed);
        // Further hits on a destroyed block are no-ops
        assert_eq!(hard.hit(), BlockHit::Ignored);

        let mut wall = Block::new(2, BlockKind::Unbreakable, rect, 0xFFFFFF);
        for _ in 0..300 {
            assert_eq!(wall.hit(), BlockHit::Immune);
        }
        assert!(!wall.counts_for_clear());
    }

    #[test]
    fn test_paddle_clamps_and_stops_at_edges() {
        let tuning = Tuning::default();
        let mut paddle = Paddle::new(&tuning);
        for _ in 0..200 {
            paddle.push(-1.0, 1.0 / 60.0);
            paddle.integrate(1.0 / 60.0, tuning.field_width);
        }
        assert_eq!(paddle.x, 0.0);
        assert_eq!(paddle.speed, 0.0);
    }

    #[test]
    fn test_paddle_coasts_to_rest() {
        let tuning = Tuning::default();
        let mut paddle = Paddle::new(&tuning);
        paddle.speed = 500.0;
        paddle.coast(0.1);
        assert!((paddle.speed - 200.0).abs() < 1e-3);
        paddle.coast(0.1);
        assert_eq!(paddle.speed, 0.0);
    }

    #[test]
    fn test_paddle_speed_capped() {
        let tuning = Tuning::default();
        let mut paddle = Paddle::new(&tuning);
        for _ in 0..100 {
            paddle.push(1.0, 0.1);
        }
        assert_eq!(paddle.speed, tuning.paddle_max_speed);
    }

    #[test]
    fn test_paddle_steer_reaches_target() {
        let tuning = Tuning::default();
        let mut paddle = Paddle::new(&tuning);
        for _ in 0..120 {
            paddle.steer_toward(650.0, 1.0 / 60.0, tuning.field_width);
        }
        assert!((paddle.center_x() - 650.0).abs() < 1e-3);
        assert_eq!(paddle.speed, 0.0);

        // Targets beyond the field are clamped internally
        for _ in 0..120 {
            paddle.steer_toward(5000.0, 1.0 / 60.0, tuning.field_width);
        }
        assert!((paddle.x + paddle.width - tuning.field_width).abs() < 1e-3);
    }

    #[test]
    fn test_extra_life_awarded_once_per_threshold() {
        let mut state = GameState::new(1);
        let mut events = Vec::new();
        state.add_score(9_990, &mut events);
        assert!(events.is_empty());
        state.add_score(20, &mut events);
        assert_eq!(state.lives, 4);
        assert_eq!(events, vec![GameEvent::ExtraLife { lives: 4 }]);
        state.add_score(10, &mut events);
        assert_eq!(state.lives, 4);
    }

    #[test]
    fn test_empty_catalog_is_an_error() {
        let result = GameState::try_new(1, Tuning::default(), Vec::new());
        assert!(matches!(result, Err(LevelError::NoLevels)));
    }
}
