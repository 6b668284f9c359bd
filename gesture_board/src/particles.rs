//! Decorative particle field.
//!
//! Particles rise from just below the bottom edge and fade out.  New ones are
//! spawned at random while a hand is on screen; the population is capped.

use rand::Rng;

use crate::config::ParticleConfig;

/// Spawn line below the visible area, in pixels.
const SPAWN_BELOW: f32 = 10.0;

#[derive(Clone, Debug, PartialEq)]
pub struct Particle {
    pub x:       f32,
    pub y:       f32,
    pub size:    f32,
    /// Pixels risen per frame.
    pub speed_y: f32,
    pub opacity: f32,
}

#[derive(Debug)]
pub struct ParticleField {
    particles: Vec<Particle>,
    cfg:       ParticleConfig,
    width:     f32,
    height:    f32,
}

impl ParticleField {
    pub fn new(cfg: ParticleConfig, width: usize, height: usize) -> Self {
        ParticleField {
            particles: Vec::with_capacity(cfg.max),
            cfg,
            width:  width as f32,
            height: height as f32,
        }
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        self.width  = width as f32;
        self.height = height as f32;
    }

    /// One display frame: maybe spawn, then rise and fade everything.
    /// Particles whose opacity reaches zero are dropped in the same step.
    pub fn tick<R: Rng>(&mut self, spawning: bool, rng: &mut R) {
        if spawning
            && self.particles.len() < self.cfg.max
            && rng.gen::<f32>() < self.cfg.spawn_probability
        {
            let p = self.spawn(rng);
            self.particles.push(p);
        }

        let fade = self.cfg.fade_per_frame;
        self.particles.retain_mut(|p| {
            p.y -= p.speed_y;
            p.opacity -= fade;
            p.opacity > 0.0
        });
    }

    fn spawn<R: Rng>(&self, rng: &mut R) -> Particle {
        let [s0, s1] = self.cfg.size_range;
        let [v0, v1] = self.cfg.speed_range;
        Particle {
            x:       rng.gen::<f32>() * self.width,
            y:       self.height + SPAWN_BELOW,
            size:    lerp(s0, s1, rng.gen()),
            speed_y: lerp(v0, v1, rng.gen()),
            opacity: 1.0,
        }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
