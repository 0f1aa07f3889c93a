//! Cosmetic particle bursts
//!
//! Particles never feed back into gameplay. They draw from the cosmetic RNG
//! so adding or removing effects cannot change the question sequence.

use glam::Vec2;
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Palette shared with the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticleColor {
    Orange,
    Red,
    Yellow,
    Green,
    Blue,
    Purple,
    White,
}

impl ParticleColor {
    pub fn rgb(&self) -> (u8, u8, u8) {
        match self {
            ParticleColor::Orange => (255, 150, 60),
            ParticleColor::Red => (240, 60, 60),
            ParticleColor::Yellow => (255, 220, 50),
            ParticleColor::Green => (60, 220, 120),
            ParticleColor::Blue => (60, 140, 255),
            ParticleColor::Purple => (190, 80, 255),
            ParticleColor::White => (255, 255, 255),
        }
    }
}

const CONFETTI: [ParticleColor; 6] = [
    ParticleColor::Yellow,
    ParticleColor::Green,
    ParticleColor::Blue,
    ParticleColor::Orange,
    ParticleColor::Purple,
    ParticleColor::White,
];

/// A particle for visual effects
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub color: ParticleColor,
    /// Seconds left
    pub life: f32,
    /// Seconds at spawn
    pub max_life: f32,
    pub size: f32,
}

impl Particle {
    /// Remaining life in 0..=1
    pub fn life_fraction(&self) -> f32 {
        if self.max_life <= 0.0 {
            return 0.0;
        }
        (self.life / self.max_life).clamp(0.0, 1.0)
    }

    pub fn is_alive(&self) -> bool {
        self.life > 0.0
    }

    pub fn update(&mut self, dt: f32) {
        self.pos += self.vel * dt;
        self.vel.y += PARTICLE_GRAVITY * dt;
        self.life -= dt;
    }
}

/// Burst presets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Burst {
    /// Correct meteor destroyed
    Correct,
    /// Wrong meteor destroyed
    Wrong,
    /// Tier cleared
    Celebration,
}

impl Burst {
    pub fn count(&self) -> usize {
        match self {
            Burst::Correct => CORRECT_BURST,
            Burst::Wrong => WRONG_BURST,
            Burst::Celebration => CELEBRATION_BURST,
        }
    }

    /// Top speed in pixels per frame at 60 FPS
    fn power(&self) -> f32 {
        match self {
            Burst::Correct => 6.0,
            Burst::Wrong => 5.0,
            Burst::Celebration => 8.0,
        }
    }

    fn color<R: Rng>(&self, rng: &mut R) -> ParticleColor {
        match self {
            Burst::Correct => ParticleColor::Orange,
            Burst::Wrong => ParticleColor::Red,
            Burst::Celebration => *CONFETTI.choose(rng).unwrap_or(&ParticleColor::White),
        }
    }
}

/// Spawn a burst at `origin`, truncated so the pool never exceeds `cap`
///
/// Returns how many particles were added.
pub fn spawn_burst<R: Rng>(
    particles: &mut Vec<Particle>,
    rng: &mut R,
    origin: Vec2,
    burst: Burst,
    cap: usize,
) -> usize {
    let room = cap.saturating_sub(particles.len());
    let count = burst.count().min(room);
    if count < burst.count() {
        log::debug!("Particle cap reached, burst {:?} truncated to {}", burst, count);
    }

    let max_speed = burst.power() * FPS;
    for _ in 0..count {
        let angle = rng.random_range(0.0..std::f32::consts::TAU);
        let speed = rng.random_range(FPS..=max_speed);
        let life = rng.random_range(18..=32) as f32 / FPS;
        particles.push(Particle {
            pos: origin,
            vel: Vec2::new(angle.cos(), angle.sin()) * speed,
            color: burst.color(rng),
            life,
            max_life: life,
            size: rng.random_range(2..=4) as f32,
        });
    }
    count
}

/// Age every particle and drop the dead ones
pub fn step_particles(particles: &mut Vec<Particle>, dt: f32) {
    for particle in particles.iter_mut() {
        particle.update(dt);
    }
    particles.retain(Particle::is_alive);
}
