//! Neon Breakout entry point
//!
//! Headless native driver: plays the game with a simple autopilot through
//! the fixed-step loop, logging sound cues and recording the final score.

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::Parser;
use glam::Vec2;
use neon_breakout::audio::{AudioSink, SoundEffect, play_events};
use neon_breakout::highscores::MAX_HIGH_SCORES;
use neon_breakout::render::{RenderSink, render};
use neon_breakout::sim::{
    Block, FixedStep, GameEvent, GamePhase, GameState, PowerUpKind, Rect, TickInput,
    default_catalog,
};
use neon_breakout::{HighScores, QualityPreset, Settings, Tuning};

/// Simulated display refresh
const FRAME_DT: f32 = 1.0 / 60.0;

#[derive(Parser, Debug)]
#[command(name = "neon-breakout")]
#[command(about = "Headless Neon Breakout run driven by an autopilot")]
struct Options {
    /// Run seed
    #[arg(long, default_value_t = 12345)]
    seed: u64,
    /// Simulated play time in seconds
    #[arg(long, default_value_t = 120.0)]
    seconds: f32,
    /// Quality preset (low, medium, high)
    #[arg(long, value_parser = parse_quality)]
    quality: Option<QualityPreset>,
    /// Tuning JSON file
    #[arg(long)]
    tuning: Option<PathBuf>,
    /// Settings JSON file, saved back on exit
    #[arg(long)]
    settings: Option<PathBuf>,
    /// High-score JSON file
    #[arg(long)]
    scores: Option<PathBuf>,
}

fn parse_quality(value: &str) -> Result<QualityPreset, String> {
    QualityPreset::parse(value)
        .ok_or_else(|| format!("unknown quality '{}', expected low, medium or high", value))
}

/// Sound cues go to the log
struct LogAudio;

impl AudioSink for LogAudio {
    fn play(&mut self, effect: SoundEffect, volume: f32) {
        log::trace!("sound {} at {:.2}", effect.name(), volume);
    }
}

/// Counts draw calls per frame
#[derive(Default)]
struct DrawStats {
    blocks: usize,
    balls: usize,
    particles: usize,
    power_ups: usize,
}

impl RenderSink for DrawStats {
    fn block(&mut self, _block: &Block, _color: [f32; 4]) {
        self.blocks += 1;
    }
    fn paddle(&mut self, _rect: Rect, _color: [f32; 4]) {}
    fn ball(&mut self, _center: Vec2, _radius: f32, _color: [f32; 4]) {
        self.balls += 1;
    }
    fn particle(&mut self, _center: Vec2, _size: f32, _color: [f32; 4]) {
        self.particles += 1;
    }
    fn power_up(&mut self, _rect: Rect, _kind: PowerUpKind, _color: [f32; 4]) {
        self.power_ups += 1;
    }
}

/// Follow the lowest falling ball, or grab a power-up while it is safe
fn autopilot(state: &GameState) -> TickInput {
    let paddle_y = state.paddle.y;
    let danger = state
        .balls
        .iter()
        .filter(|b| b.launched && b.vel.y > 0.0)
        .max_by(|a, b| a.pos.y.total_cmp(&b.pos.y));

    let target_x = match danger {
        Some(ball) if ball.pos.y > paddle_y * 0.5 => Some(ball.pos.x),
        _ => state
            .power_ups
            .iter()
            .max_by(|a, b| a.rect.y.total_cmp(&b.rect.y))
            .map(|p| p.rect.center().x)
            .or_else(|| danger.map(|b| b.pos.x)),
    };

    TickInput {
        target_x,
        launch: state.phase == GamePhase::Serve,
        ..Default::default()
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn main() {
    env_logger::init();
    let options = Options::parse();
    log::info!("Neon Breakout (headless) starting with seed {}", options.seed);

    let mut settings = options
        .settings
        .as_deref()
        .map(|path| Settings::load_from(path))
        .unwrap_or_default();
    if let Some(preset) = options.quality {
        settings.apply_preset(preset);
    }

    let mut tuning = options
        .tuning
        .as_deref()
        .map(|path| Tuning::load_from(path))
        .unwrap_or_default();
    settings.apply_to(&mut tuning);

    let mut state = match GameState::try_new(options.seed, tuning, default_catalog()) {
        Ok(state) => state,
        Err(e) => {
            log::error!("Could not build the first level: {}", e);
            std::process::exit(1);
        }
    };

    log::info!(
        "Quality {}: {} particle slots",
        settings.quality.as_str(),
        state.particles.pool().capacity()
    );

    let mut driver = FixedStep::new();
    let mut audio = LogAudio;
    let frames = (options.seconds / FRAME_DT) as u64;
    let mut final_score = None;

    for frame in 0..frames {
        let input = autopilot(&state);
        let events = driver.advance(&mut state, &input, FRAME_DT);
        play_events(&events, &mut audio, settings.sfx_gain());

        for event in &events {
            match event {
                GameEvent::LevelStarted { level, repaired } => {
                    log::info!("Level {} started ({} walls opened)", level, repaired)
                }
                GameEvent::PowerUpCollected { kind, points } => {
                    log::debug!("Collected {:?} (+{})", kind, points)
                }
                GameEvent::GameOver { score, .. } => final_score = Some(*score),
                _ => {}
            }
        }

        // Once a second, report what a renderer would draw
        if frame % 60 == 0 {
            let mut stats = DrawStats::default();
            render(&state, &mut stats);
            log::debug!(
                "level {} score {} lives {}: {} blocks, {} balls, {} particles, {} power-ups",
                state.level,
                state.score,
                state.lives,
                stats.blocks,
                stats.balls,
                stats.particles,
                stats.power_ups
            );
        }

        if final_score.is_some() {
            break;
        }
    }

    let score = final_score.unwrap_or(state.score);
    log::info!("Finished on level {} with score {}", state.level, score);

    if let Some(path) = options.scores.as_deref() {
        let mut scores = HighScores::load_from(path);
        match scores.add_score(score, state.level, now_ms()) {
            Some(rank) => log::info!("New high score, rank {}", rank),
            None => log::info!("Score did not make the top {}", MAX_HIGH_SCORES),
        }
        if let Err(e) = scores.save_to(path) {
            log::warn!("Could not save high scores: {}", e);
        }
    }

    if let Some(path) = options.settings.as_deref() {
        if let Err(e) = settings.save_to(path) {
            log::warn!("Could not save settings: {}", e);
        }
    }
}
