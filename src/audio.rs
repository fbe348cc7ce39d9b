//! Sound cues derived from simulation events
//!
//! The core never touches an audio device. Hosts implement [`AudioSink`]
//! and feed each tick's events through [`play_events`].

use crate::sim::GameEvent;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundEffect {
    /// Ball hits paddle
    PaddleHit,
    /// Ball hits wall or ceiling
    WallHit,
    /// Ball hits block (doesn't break)
    BlockHit,
    /// Block breaks
    BlockBreak,
    /// Power-up caught
    PowerUp,
    /// Ball launched from the paddle
    Launch,
    /// Last ball fell out
    LifeLost,
    ExtraLife,
    /// Level cleared
    LevelClear,
    /// Game over
    GameOver,
}

impl SoundEffect {
    /// Asset-style name for hosts that key sounds by string
    pub fn name(&self) -> &'static str {
        match self {
            SoundEffect::PaddleHit => "paddle",
            SoundEffect::WallHit => "wall",
            SoundEffect::BlockHit => "hit",
            SoundEffect::BlockBreak => "break",
            SoundEffect::PowerUp => "powerup",
            SoundEffect::Launch => "gameStart",
            SoundEffect::LifeLost => "lifeLost",
            SoundEffect::ExtraLife => "extraLife",
            SoundEffect::LevelClear => "levelComplete",
            SoundEffect::GameOver => "gameOver",
        }
    }
}

/// Host-side sound output
pub trait AudioSink {
    /// Play `effect` at `volume` in [0, 1]
    fn play(&mut self, effect: SoundEffect, volume: f32);
}

/// Sound for an event, if it has one
pub fn sound_for(event: &GameEvent) -> Option<SoundEffect> {
    match event {
        GameEvent::PaddleBounce => Some(SoundEffect::PaddleHit),
        GameEvent::WallBounce => Some(SoundEffect::WallHit),
        GameEvent::BlockHit { .. } => Some(SoundEffect::BlockHit),
        GameEvent::BlockDestroyed { .. } => Some(SoundEffect::BlockBreak),
        GameEvent::PowerUpCollected { .. } => Some(SoundEffect::PowerUp),
        GameEvent::BallLaunched => Some(SoundEffect::Launch),
        GameEvent::LifeLost { lives_left } if *lives_left > 0 => Some(SoundEffect::LifeLost),
        GameEvent::ExtraLife { .. } => Some(SoundEffect::ExtraLife),
        GameEvent::LevelCleared { .. } => Some(SoundEffect::LevelClear),
        GameEvent::GameOver { .. } => Some(SoundEffect::GameOver),
        _ => None,
    }
}

/// Forward one tick's events to the sink
///
/// Repeats of the same sound within a tick are collapsed so a multi-ball
/// volley doesn't stack identical cues.
pub fn play_events<S: AudioSink + ?Sized>(events: &[GameEvent], sink: &mut S, volume: f32) {
    if volume <= 0.0 {
        return;
    }
    let mut played: Vec<SoundEffect> = Vec::new();
    for effect in events.iter().filter_map(sound_for) {
        if !played.contains(&effect) {
            sink.play(effect, volume);
            played.push(effect);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::BlockKind;

    #[derive(Default)]
    struct Recorder(Vec<(SoundEffect, f32)>);

    impl AudioSink for Recorder {
        fn play(&mut self, effect: SoundEffect, volume: f32) {
            self.0.push((effect, volume));
        }
    }

    #[test]
    fn test_event_mapping() {
        assert_eq!(sound_for(&GameEvent::PaddleBounce), Some(SoundEffect::PaddleHit));
        assert_eq!(
            sound_for(&GameEvent::BlockHit {
                kind: BlockKind::Unbreakable
            }),
            Some(SoundEffect::BlockHit)
        );
        assert_eq!(sound_for(&GameEvent::LifeLost { lives_left: 2 }), Some(SoundEffect::LifeLost));
        // The game-over cue replaces the final life-lost cue
        assert_eq!(sound_for(&GameEvent::LifeLost { lives_left: 0 }), None);
        assert_eq!(sound_for(&GameEvent::Paused), None);
    }

    #[test]
    fn test_play_events_dedupes_and_scales() {
        let events = vec![
            GameEvent::WallBounce,
            GameEvent::BallLost,
            GameEvent::WallBounce,
            GameEvent::LevelCleared { level: 1 },
        ];
        let mut sink = Recorder::default();
        play_events(&events, &mut sink, 0.5);
        assert_eq!(
            sink.0,
            vec![(SoundEffect::WallHit, 0.5), (SoundEffect::LevelClear, 0.5)]
        );

        let mut muted = Recorder::default();
        play_events(&events, &mut muted, 0.0);
        assert!(muted.0.is_empty());
    }
}
