//! Particle pool and emitters for transient visual effects
//!
//! The pool owns a fixed number of particle slots and never grows. When every
//! slot is busy, `acquire` reclaims the oldest live particle. Emitters only
//! hold generation-checked handles, so a reclaimed slot can never be touched
//! through a stale handle.

use glam::Vec2;
use rand::Rng;

use super::geometry::{random_between, random_velocity};

/// Handle to a pool slot, valid until that slot is recycled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParticleHandle {
    index: usize,
    generation: u32,
}

/// A particle for visual effects
#[derive(Debug, Clone)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: f32,
    /// 0xRRGGBB
    pub color: u32,
    /// Seconds the particle lives
    pub lifetime: f32,
    /// Seconds since spawn
    pub age: f32,
    pub alive: bool,
    generation: u32,
}

impl Particle {
    fn dead() -> Self {
        Self {
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            size: 0.0,
            color: 0,
            lifetime: 0.0,
            age: 0.0,
            alive: false,
            generation: 0,
        }
    }

    /// Fraction of lifetime used, 0 at spawn and 1 at expiry
    pub fn life_fraction(&self) -> f32 {
        if self.lifetime <= 0.0 {
            1.0
        } else {
            (self.age / self.lifetime).clamp(0.0, 1.0)
        }
    }

    /// Draw opacity (fades linearly to zero)
    pub fn opacity(&self) -> f32 {
        1.0 - self.life_fraction()
    }

    /// Age and move the particle. Returns false once it has expired.
    fn advance(&mut self, dt: f32) -> bool {
        self.age += dt;
        if self.age >= self.lifetime {
            return false;
        }

        self.pos += self.vel * dt;

        // Cosmetic damping grows with age
        let damping = 1.0 - self.life_fraction() * 0.1;
        self.size *= damping;
        self.vel *= damping;
        true
    }
}

/// Fixed-capacity particle pool
#[derive(Debug, Clone)]
pub struct ParticlePool {
    slots: Vec<Particle>,
    /// Indices of dead slots
    free: Vec<usize>,
    active: usize,
}

impl ParticlePool {
    /// Create a pool with `capacity` slots (at least one)
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: vec![Particle::dead(); capacity],
            // Reversed so slot 0 is handed out first
            free: (0..capacity).rev().collect(),
            active: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of live particles
    pub fn active_count(&self) -> usize {
        self.active
    }

    /// Take a slot and initialize it
    ///
    /// Never fails: with no free slot the oldest live particle is reclaimed.
    pub fn acquire(
        &mut self,
        pos: Vec2,
        color: u32,
        vel: Vec2,
        size: f32,
        lifetime: f32,
    ) -> ParticleHandle {
        let index = match self.free.pop() {
            Some(index) => {
                self.active += 1;
                index
            }
            // Free list empty means every slot is live
            None => self.oldest_active().unwrap_or(0),
        };

        let slot = &mut self.slots[index];
        let generation = slot.generation.wrapping_add(1);
        *slot = Particle {
            pos,
            vel,
            size,
            color,
            lifetime,
            age: 0.0,
            alive: true,
            generation,
        };

        ParticleHandle { index, generation }
    }

    /// Return a slot to the free list. Stale or dead handles are ignored.
    pub fn release(&mut self, handle: ParticleHandle) -> bool {
        if !self.is_live(handle) {
            return false;
        }
        self.kill(handle.index);
        true
    }

    /// Check that a handle still refers to a live particle
    pub fn is_live(&self, handle: ParticleHandle) -> bool {
        self.slots
            .get(handle.index)
            .is_some_and(|p| p.alive && p.generation == handle.generation)
    }

    pub fn get(&self, handle: ParticleHandle) -> Option<&Particle> {
        self.is_live(handle).then(|| &self.slots[handle.index])
    }

    /// Age every live particle, releasing the expired ones
    pub fn update(&mut self, dt: f32) {
        for index in 0..self.slots.len() {
            if self.slots[index].alive && !self.slots[index].advance(dt) {
                self.kill(index);
            }
        }
    }

    /// Live particles in slot order
    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.slots.iter().filter(|p| p.alive)
    }

    /// Kill every particle
    pub fn clear(&mut self) {
        for index in 0..self.slots.len() {
            if self.slots[index].alive {
                self.kill(index);
            }
        }
    }

    fn kill(&mut self, index: usize) {
        self.slots[index].alive = false;
        self.free.push(index);
        self.active -= 1;
    }

    fn oldest_active(&self) -> Option<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, p)| p.alive)
            .max_by(|(ia, a), (ib, b)| a.age.total_cmp(&b.age).then(ib.cmp(ia)))
            .map(|(i, _)| i)
    }
}

/// Parameters for one burst of particles
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmitterConfig {
    pub particle_count: usize,
    pub min_speed: f32,
    pub max_speed: f32,
    pub min_size: f32,
    pub max_size: f32,
    /// Seconds each particle lives
    pub lifetime: f32,
    /// Forced removal after this many seconds, if set
    pub duration: Option<f32>,
}

/// Built-in effect presets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectKind {
    Explosion,
    Sparkle,
    Hit,
    Trail,
}

impl EffectKind {
    pub fn config(&self) -> EmitterConfig {
        match self {
            EffectKind::Explosion => EmitterConfig {
                particle_count: 30,
                min_speed: 100.0,
                max_speed: 300.0,
                min_size: 2.0,
                max_size: 6.0,
                lifetime: 1.0,
                duration: Some(1.0),
            },
            EffectKind::Sparkle => EmitterConfig {
                particle_count: 10,
                min_speed: 50.0,
                max_speed: 150.0,
                min_size: 1.0,
                max_size: 3.0,
                lifetime: 0.5,
                duration: Some(0.5),
            },
            EffectKind::Hit => EmitterConfig {
                particle_count: 5,
                min_speed: 50.0,
                max_speed: 100.0,
                min_size: 1.0,
                max_size: 2.0,
                lifetime: 0.3,
                duration: Some(0.3),
            },
            EffectKind::Trail => EmitterConfig {
                particle_count: 1,
                min_speed: 0.0,
                max_speed: 0.0,
                min_size: 2.0,
                max_size: 3.0,
                lifetime: 0.3,
                duration: Some(0.2),
            },
        }
    }
}

/// Identifies an emitter within its [`ParticleSystem`]
pub type EmitterId = u32;

/// Particles spawned together as one effect
#[derive(Debug, Clone)]
struct Emitter {
    id: EmitterId,
    particles: Vec<ParticleHandle>,
    age: f32,
    duration: Option<f32>,
}

/// Pool plus the set of active emitters
#[derive(Debug, Clone)]
pub struct ParticleSystem {
    pool: ParticlePool,
    emitters: Vec<Emitter>,
    next_emitter_id: EmitterId,
}

impl ParticleSystem {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            pool: ParticlePool::with_capacity(capacity),
            emitters: Vec::new(),
            next_emitter_id: 1,
        }
    }

    pub fn pool(&self) -> &ParticlePool {
        &self.pool
    }

    /// Spawn a radial burst at `origin`
    pub fn create_emitter<R: Rng + ?Sized>(
        &mut self,
        config: &EmitterConfig,
        origin: Vec2,
        color: u32,
        rng: &mut R,
    ) -> EmitterId {
        let mut particles = Vec::with_capacity(config.particle_count);
        for _ in 0..config.particle_count {
            let speed = random_between(rng, config.min_speed, config.max_speed);
            let size = random_between(rng, config.min_size, config.max_size);
            let vel = random_velocity(rng, speed);
            particles.push(self.pool.acquire(origin, color, vel, size, config.lifetime));
        }

        let id = self.next_emitter_id;
        self.next_emitter_id = self.next_emitter_id.wrapping_add(1);
        self.emitters.push(Emitter {
            id,
            particles,
            age: 0.0,
            duration: config.duration,
        });
        id
    }

    /// Kill an emitter's particles immediately. Unknown ids are ignored.
    pub fn remove_emitter(&mut self, id: EmitterId) -> bool {
        let Some(pos) = self.emitters.iter().position(|e| e.id == id) else {
            return false;
        };
        let emitter = self.emitters.remove(pos);
        for handle in emitter.particles {
            self.pool.release(handle);
        }
        true
    }

    /// Advance particles, retire expired emitters and prune empty ones
    pub fn update(&mut self, dt: f32) {
        self.pool.update(dt);

        let pool = &mut self.pool;
        self.emitters.retain_mut(|emitter| {
            emitter.age += dt;
            if emitter.duration.is_some_and(|d| emitter.age >= d) {
                for &handle in &emitter.particles {
                    pool.release(handle);
                }
                return false;
            }
            emitter.particles.retain(|&h| pool.is_live(h));
            !emitter.particles.is_empty()
        });
    }

    pub fn emitter_count(&self) -> usize {
        self.emitters.len()
    }

    /// Live particles still owned by an emitter
    pub fn live_particles(&self, id: EmitterId) -> Option<usize> {
        self.emitters
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.particles.iter().filter(|&&h| self.pool.is_live(h)).count())
    }

    pub fn active_particles(&self) -> usize {
        self.pool.active_count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.pool.iter()
    }

    pub fn clear(&mut self) {
        self.pool.clear();
        self.emitters.clear();
    }
}
