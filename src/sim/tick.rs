//! Fixed timestep simulation tick
//!
//! Core game loop that advances simulation deterministically.

use glam::Vec2;

use super::collision::{
    ball_below_field, ball_block_collision, ball_touches_paddle, ball_wall_collision, clamp_speed,
    paddle_bounce,
};
use super::geometry::random_between;
use super::particles::EffectKind;
use super::powerup::PowerUpStep;
use super::state::{Ball, Block, BlockHit, GameEvent, GamePhase, GameState, Paddle};
use crate::consts::{MAX_FRAME_DT, MAX_SUBSTEPS, SIM_DT};
use crate::tuning::Tuning;

const BALL_COLOR: u32 = 0xFFFFFF;
const TRAIL_COLOR: u32 = 0x00FFFF;
/// Paddle speed above which it leaves a trail
const TRAIL_MIN_SPEED: f32 = 100.0;
const TRAIL_INTERVAL: f32 = 0.1;

/// Discrete paddle steering when no pointer target is given
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Steer {
    #[default]
    None,
    Left,
    Right,
}

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Target paddle center x (from mouse/touch position), clamped internally
    pub target_x: Option<f32>,
    /// Keyboard steering, used when `target_x` is `None`
    pub steer: Steer,
    /// Launch ball (click/tap/space)
    pub launch: bool,
    /// Pause toggle
    pub pause: bool,
    /// Start a fresh run
    pub restart: bool,
}

/// Advance the game state by one timestep
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) -> Vec<GameEvent> {
    let mut events = Vec::new();

    if input.restart {
        match state.restart() {
            Ok(repaired) => events.push(GameEvent::LevelStarted {
                level: state.level,
                repaired,
            }),
            Err(e) => log::error!("Restart failed: {}", e),
        }
    }

    // Handle pause toggle
    if input.pause {
        match state.phase {
            GamePhase::Playing | GamePhase::Serve | GamePhase::Breather => {
                state.resume_phase = Some(state.phase);
                state.phase = GamePhase::Paused;
                events.push(GameEvent::Paused);
                return events;
            }
            GamePhase::Paused => {
                state.phase = state.resume_phase.take().unwrap_or(GamePhase::Playing);
                events.push(GameEvent::Resumed);
            }
            GamePhase::GameOver => {}
        }
    }

    // Don't tick if paused or game over
    if matches!(state.phase, GamePhase::Paused | GamePhase::GameOver) || dt <= 0.0 {
        return events;
    }

    state.time_ticks += 1;

    update_paddle(state, input, dt);
    emit_paddle_trail(state, dt);

    match state.phase {
        GamePhase::Serve => {
            for ball in &mut state.balls {
                ball.follow(&state.paddle);
            }
            if input.launch {
                launch_balls(state, &mut events);
            }
        }
        GamePhase::Breather => update_breather(state, dt, &mut events),
        GamePhase::Playing => update_balls(state, dt, &mut events),
        GamePhase::Paused | GamePhase::GameOver => {}
    }

    if matches!(state.phase, GamePhase::Serve | GamePhase::Playing) {
        update_power_ups(state, dt, &mut events);
    }

    state.particles.update(dt);

    if state.phase == GamePhase::Playing && state.remaining_blocks() == 0 {
        clear_level(state, &mut events);
    }

    state.normalize_order();
    events
}

fn update_paddle(state: &mut GameState, input: &TickInput, dt: f32) {
    let field_width = state.tuning.field_width;
    let paddle = &mut state.paddle;

    if let Some(target_x) = input.target_x {
        paddle.steer_toward(target_x, dt, field_width);
        return;
    }

    match input.steer {
        Steer::Left => paddle.push(-1.0, dt),
        Steer::Right => paddle.push(1.0, dt),
        Steer::None => paddle.coast(dt),
    }
    paddle.integrate(dt, field_width);
}

/// Puff a trail particle off the trailing edge of a fast paddle
fn emit_paddle_trail(state: &mut GameState, dt: f32) {
    state.trail_timer -= dt;
    if !state.tuning.paddle_trails
        || state.paddle.speed.abs() <= TRAIL_MIN_SPEED
        || state.trail_timer > 0.0
    {
        return;
    }
    state.trail_timer = TRAIL_INTERVAL;

    let paddle = &state.paddle;
    let edge_x = if paddle.speed > 0.0 {
        paddle.x
    } else {
        paddle.x + paddle.width
    };
    let origin = Vec2::new(edge_x, paddle.y + paddle.height / 2.0);
    state.emit_effect(EffectKind::Trail, origin, TRAIL_COLOR);
}

fn launch_balls(state: &mut GameState, events: &mut Vec<GameEvent>) {
    let speed = state.level_ball_speed();
    let spread = state.tuning.ball_launch_spread;

    for i in 0..state.balls.len() {
        if state.balls[i].launched {
            continue;
        }
        let angle = random_between(&mut state.rng, -spread, spread);
        state.balls[i].launch(speed, angle);
        events.push(GameEvent::BallLaunched);
    }
    state.phase = GamePhase::Playing;
}

fn update_breather(state: &mut GameState, dt: f32, events: &mut Vec<GameEvent>) {
    state.breather_timer -= dt;
    if state.breather_timer > 0.0 {
        return;
    }

    match state.start_level() {
        Ok(repaired) => events.push(GameEvent::LevelStarted {
            level: state.level,
            repaired,
        }),
        Err(e) => {
            log::error!("Level {} failed to load: {}", state.level, e);
            end_game(state, events);
        }
    }
}

/// Everything that happened to one ball during its step
#[derive(Debug, Default)]
struct BallStep {
    wall: bool,
    paddle: bool,
    lost: bool,
    /// Index into `blocks` and the hit outcome
    block: Option<(usize, BlockHit)>,
}

/// Move one ball and resolve its collisions
///
/// Each ball resolves at most one block per step; destroyed blocks are
/// skipped since they leave the field at the end of the tick.
fn step_ball(
    ball: &mut Ball,
    paddle: &Paddle,
    blocks: &mut [Block],
    tuning: &Tuning,
    min_speed: f32,
    dt: f32,
) -> BallStep {
    let mut step = BallStep::default();

    if !ball.launched {
        ball.follow(paddle);
        return step;
    }

    ball.vel = clamp_speed(ball.vel, min_speed, tuning.ball_max_speed);
    ball.pos += ball.vel * dt;

    let (pos, vel, contacts) =
        ball_wall_collision(ball.pos, ball.vel, ball.radius, tuning.field_width);
    ball.pos = pos;
    ball.vel = vel;
    step.wall = !contacts.is_empty();

    if ball_below_field(ball.pos, ball.radius, tuning.field_height) {
        step.lost = true;
        return step;
    }

    // Only balls moving down bounce, so one contact never flips twice
    if ball.vel.y > 0.0 && ball_touches_paddle(ball.pos, ball.radius, &paddle.rect()) {
        ball.vel = paddle_bounce(
            ball.pos.x,
            paddle.center_x(),
            paddle.width,
            ball.speed(),
            tuning.paddle_max_bounce_angle,
        );
        ball.pos.y = paddle.y - ball.radius;
        step.paddle = true;
    }

    for (index, block) in blocks.iter_mut().enumerate() {
        if block.destroyed {
            continue;
        }
        if let Some(impact) = ball_block_collision(ball.pos, ball.vel, ball.radius, &block.rect) {
            ball.pos = impact.position;
            ball.vel = impact.velocity;
            step.block = Some((index, block.hit()));
            break;
        }
    }

    step
}

fn update_balls(state: &mut GameState, dt: f32, events: &mut Vec<GameEvent>) {
    let min_speed = state.level_ball_speed();
    let mut lost = Vec::new();

    for i in 0..state.balls.len() {
        let step = step_ball(
            &mut state.balls[i],
            &state.paddle,
            &mut state.blocks,
            &state.tuning,
            min_speed,
            dt,
        );
        let ball_pos = state.balls[i].pos;

        if step.wall {
            events.push(GameEvent::WallBounce);
            state.emit_effect(EffectKind::Sparkle, ball_pos, BALL_COLOR);
        }
        if step.paddle {
            events.push(GameEvent::PaddleBounce);
        }
        if let Some((index, hit)) = step.block {
            resolve_block_hit(state, index, hit, events);
        }
        if step.lost {
            lost.push(state.balls[i].id);
            events.push(GameEvent::BallLost);
            let origin = Vec2::new(ball_pos.x, state.tuning.field_height);
            state.emit_effect(EffectKind::Explosion, origin, BALL_COLOR);
        }
    }

    if !lost.is_empty() {
        state.balls.retain(|b| !lost.contains(&b.id));
    }
    state.blocks.retain(|b| !b.destroyed);

    if state.balls.is_empty() {
        lose_life(state, events);
    }
}

fn resolve_block_hit(
    state: &mut GameState,
    index: usize,
    hit: BlockHit,
    events: &mut Vec<GameEvent>,
) {
    let block = &state.blocks[index];
    let (id, kind, color, center) = (block.id, block.kind, block.color, block.rect.center());

    match hit {
        // Unbreakable blocks only make a sound
        BlockHit::Immune => events.push(GameEvent::BlockHit { kind }),
        BlockHit::Damaged { .. } => {
            events.push(GameEvent::BlockHit { kind });
            state.emit_effect(EffectKind::Hit, center, color);
        }
        BlockHit::Destroyed => {
            let points = kind.points();
            events.push(GameEvent::BlockDestroyed { id, kind, points });
            state.add_score(points, events);
            state.emit_effect(EffectKind::Explosion, center, color);
            if let Some(kind) = state.maybe_drop_power_up(center) {
                events.push(GameEvent::PowerUpSpawned { kind });
            }
        }
        BlockHit::Ignored => {}
    }
}

fn lose_life(state: &mut GameState, events: &mut Vec<GameEvent>) {
    state.lives = state.lives.saturating_sub(1);
    events.push(GameEvent::LifeLost {
        lives_left: state.lives,
    });

    if state.lives == 0 {
        end_game(state, events);
        return;
    }

    state.power_ups.clear();
    state.paddle.reset(state.tuning.field_width);
    state.spawn_ball_attached();
    state.phase = GamePhase::Serve;
}

fn end_game(state: &mut GameState, events: &mut Vec<GameEvent>) {
    log::info!("Game over: score {} on level {}", state.score, state.level);
    state.phase = GamePhase::GameOver;
    events.push(GameEvent::GameOver {
        score: state.score,
        level: state.level,
    });
}

fn update_power_ups(state: &mut GameState, dt: f32, events: &mut Vec<GameEvent>) {
    let field_height = state.tuning.field_height;

    for i in 0..state.power_ups.len() {
        let paddle = state.paddle.rect();
        let step = state.power_ups[i].update(dt, &paddle, field_height);
        let kind = state.power_ups[i].kind;

        match step {
            PowerUpStep::Caught => {
                log::debug!("Power-up {:?} caught", kind);
                kind.apply(state);
                let points = kind.points();
                events.push(GameEvent::PowerUpCollected { kind, points });
                state.add_score(points, events);
                let center = state.power_ups[i].rect.center();
                state.emit_effect(EffectKind::Sparkle, center, kind.color());
            }
            PowerUpStep::Missed => events.push(GameEvent::PowerUpMissed { kind }),
            PowerUpStep::Falling | PowerUpStep::Inactive => {}
        }
    }

    state.power_ups.retain(|p| !p.collected);
}

fn clear_level(state: &mut GameState, events: &mut Vec<GameEvent>) {
    log::info!("Level {} cleared, score {}", state.level, state.score);
    events.push(GameEvent::LevelCleared { level: state.level });

    state.level += 1;
    state.phase = GamePhase::Breather;
    state.breather_timer = state.tuning.breather_secs;
    state.balls.clear();
    state.power_ups.clear();
}

/// Fixed-timestep driver
///
/// Accumulates variable frame time and runs [`tick`] in `SIM_DT` steps.
/// One-shot commands are held until the next substep consumes them.
#[derive(Debug, Clone, Default)]
pub struct FixedStep {
    accumulator: f32,
    pending: TickInput,
}

impl FixedStep {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one frame of input and elapsed time
    pub fn advance(
        &mut self,
        state: &mut GameState,
        input: &TickInput,
        frame_dt: f32,
    ) -> Vec<GameEvent> {
        self.pending.target_x = input.target_x;
        self.pending.steer = input.steer;
        self.pending.launch |= input.launch;
        self.pending.pause |= input.pause;
        self.pending.restart |= input.restart;

        self.accumulator += frame_dt.clamp(0.0, MAX_FRAME_DT);

        let mut events = Vec::new();
        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            events.extend(tick(state, &self.pending, SIM_DT));
            self.accumulator -= SIM_DT;
            substeps += 1;

            // Clear one-shot inputs after processing
            self.pending.launch = false;
            self.pending.pause = false;
            self.pending.restart = false;
        }

        // Drop backlog the substep cap could not absorb
        if substeps == MAX_SUBSTEPS {
            self.accumulator = self.accumulator.min(SIM_DT);
        }
        events
    }
}
