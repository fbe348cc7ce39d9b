//! Draw-call sink for hosts
//!
//! The core has no drawing surface. [`render`] walks the state back to front
//! (blocks, paddle, balls, particles, power-ups) and hands each entity to a
//! host-implemented [`RenderSink`] with a resolved RGBA color.

use glam::Vec2;

use crate::sim::{Block, GameState, PowerUpKind, Rect};

const PADDLE_COLOR: u32 = 0x87CEEB;

/// Host-provided draw primitives
pub trait RenderSink {
    fn block(&mut self, block: &Block, color: [f32; 4]);
    fn paddle(&mut self, rect: Rect, color: [f32; 4]);
    fn ball(&mut self, center: Vec2, radius: f32, color: [f32; 4]);
    fn particle(&mut self, center: Vec2, size: f32, color: [f32; 4]);
    fn power_up(&mut self, rect: Rect, kind: PowerUpKind, color: [f32; 4]);
}

/// Convert 0xRRGGBB to linear-ish RGBA floats
pub fn rgba(hex: u32, alpha: f32) -> [f32; 4] {
    let channel = |shift: u32| ((hex >> shift) & 0xFF) as f32 / 255.0;
    [channel(16), channel(8), channel(0), alpha.clamp(0.0, 1.0)]
}

/// Interpolate color based on velocity (slow=blue, medium=green, fast=red/orange)
pub fn velocity_color(speed: f32, min_speed: f32, max_speed: f32) -> [f32; 4] {
    let range = (max_speed - min_speed).max(f32::EPSILON);
    let t = ((speed - min_speed) / range).clamp(0.0, 1.0);

    // Color gradient: blue (slow) -> cyan -> green -> yellow -> orange -> red (fast)
    let (r, g, b) = if t < 0.25 {
        let u = t / 0.25;
        (0.2, 0.4 + 0.4 * u, 1.0)
    } else if t < 0.5 {
        let u = (t - 0.25) / 0.25;
        (0.2, 0.8, 1.0 - 0.6 * u)
    } else if t < 0.75 {
        let u = (t - 0.5) / 0.25;
        (0.2 + 0.8 * u, 0.8, 0.4 - 0.2 * u)
    } else {
        let u = (t - 0.75) / 0.25;
        (1.0, 0.8 - 0.5 * u, 0.2)
    };

    [r, g, b, 1.0]
}

/// Draw the whole field into `sink`
pub fn render<S: RenderSink + ?Sized>(state: &GameState, sink: &mut S) {
    for block in state.blocks.iter().filter(|b| !b.destroyed) {
        // Damaged blocks fade
        let alpha = 1.0 - block.damage() * 0.4;
        sink.block(block, rgba(block.color, alpha));
    }

    sink.paddle(state.paddle.rect(), rgba(PADDLE_COLOR, 1.0));

    let min_speed = state.level_ball_speed();
    for ball in &state.balls {
        let color = if ball.launched {
            velocity_color(ball.speed(), min_speed, state.tuning.ball_max_speed)
        } else {
            rgba(PADDLE_COLOR, 1.0)
        };
        sink.ball(ball.pos, ball.radius, color);
    }

    for particle in state.particles.iter() {
        sink.particle(particle.pos, particle.size, rgba(particle.color, particle.opacity()));
    }

    for power_up in state.power_ups.iter().filter(|p| !p.collected) {
        sink.power_up(power_up.rect, power_up.kind, rgba(power_up.kind.color(), 1.0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::EffectKind;

    #[derive(Debug, PartialEq)]
    enum Call {
        Block(u32),
        Paddle,
        Ball(u32),
        Particle(f32),
        PowerUp(PowerUpKind),
    }

    #[derive(Default)]
    struct Recorder {
        calls: Vec<Call>,
    }

    impl RenderSink for Recorder {
        fn block(&mut self, block: &Block, _color: [f32; 4]) {
            self.calls.push(Call::Block(block.id));
        }
        fn paddle(&mut self, _rect: Rect, _color: [f32; 4]) {
            self.calls.push(Call::Paddle);
        }
        fn ball(&mut self, _center: Vec2, radius: f32, _color: [f32; 4]) {
            self.calls.push(Call::Ball(radius as u32));
        }
        fn particle(&mut self, _center: Vec2, _size: f32, color: [f32; 4]) {
            self.calls.push(Call::Particle(color[3]));
        }
        fn power_up(&mut self, _rect: Rect, kind: PowerUpKind, _color: [f32; 4]) {
            self.calls.push(Call::PowerUp(kind));
        }
    }

    fn rank(call: &Call) -> u8 {
        match call {
            Call::Block(_) => 0,
            Call::Paddle => 1,
            Call::Ball(_) => 2,
            Call::Particle(_) => 3,
            Call::PowerUp(_) => 4,
        }
    }

    #[test]
    fn test_render_order_back_to_front() {
        let mut state = GameState::new(11);
        state.spawn_power_up(PowerUpKind::BallSplit, Vec2::new(100.0, 300.0));
        state.emit_effect(EffectKind::Hit, Vec2::new(200.0, 200.0), 0xFF00FF);

        let mut sink = Recorder::default();
        render(&state, &mut sink);

        let blocks = sink.calls.iter().filter(|c| matches!(c, Call::Block(_))).count();
        assert_eq!(blocks, state.blocks.len());
        assert!(sink.calls.contains(&Call::Paddle));
        assert!(sink.calls.contains(&Call::Ball(8)));
        assert!(sink.calls.contains(&Call::PowerUp(PowerUpKind::BallSplit)));
        assert!(sink.calls.windows(2).all(|w| rank(&w[0]) <= rank(&w[1])));
    }

    #[test]
    fn test_fresh_particles_are_opaque() {
        let mut state = GameState::new(11);
        state.emit_effect(EffectKind::Sparkle, Vec2::new(200.0, 200.0), 0xFFFFFF);
        let mut sink = Recorder::default();
        render(&state, &mut sink);
        let particles: Vec<&Call> = sink
            .calls
            .iter()
            .filter(|c| matches!(c, Call::Particle(_)))
            .collect();
        assert_eq!(particles.len(), 10);
        assert!(particles.iter().all(|c| **c == Call::Particle(1.0)));
    }

    #[test]
    fn test_rgba_and_velocity_color() {
        assert_eq!(rgba(0xFF0000, 0.5), [1.0, 0.0, 0.0, 0.5]);
        assert_eq!(velocity_color(300.0, 300.0, 600.0), [0.2, 0.4, 1.0, 1.0]);
        let fast = velocity_color(600.0, 300.0, 600.0);
        assert_eq!(fast[0], 1.0);
    }
}
