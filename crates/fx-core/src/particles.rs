//! Drifting particle field with pointer attraction, scroll bias and a
//! sinusoidal flow term. The pool is fixed at construction and wraps
//! toroidally at the canvas edges.
//!
//! Link generation is an O(n²) pair scan, which is why the count is capped.

use crate::constants::{
    MIN_DISTANCE, PARTICLE_ATTRACT_GAIN, PARTICLE_ATTRACT_RADIUS, PARTICLE_COUNT,
    PARTICLE_COUNT_MAX, PARTICLE_DAMPING, PARTICLE_DRIFT_Y, PARTICLE_FLOW_FREQ,
    PARTICLE_FLOW_GAIN, PARTICLE_LINK_ALPHA, PARTICLE_LINK_DISTANCE, PARTICLE_SCROLL_BIAS,
    PARTICLE_SCROLL_DECAY, PARTICLE_SCROLL_SAMPLE_GAIN, PARTICLE_SPEED,
};
use crate::error::{FxError, FxResult};
use glam::Vec2;
use rand::Rng;
use std::f32::consts::PI;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Palette {
    Blue,
    Cyan,
    #[default]
    Mixed,
}

impl Palette {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "blue" => Some(Palette::Blue),
            "cyan" => Some(Palette::Cyan),
            "mixed" => Some(Palette::Mixed),
            _ => None,
        }
    }

    fn hue<R: Rng>(self, rng: &mut R) -> f32 {
        match self {
            Palette::Blue => 220.0,
            Palette::Cyan => 200.0,
            Palette::Mixed => 200.0 + rng.gen::<f32>() * 40.0,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ParticleConfig {
    pub count: usize,
    pub speed: f32,
    pub palette: Palette,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            count: PARTICLE_COUNT,
            speed: PARTICLE_SPEED,
            palette: Palette::Mixed,
        }
    }
}

impl ParticleConfig {
    /// Bring page-supplied values into range: the count is capped at
    /// `PARTICLE_COUNT_MAX` and a non-finite speed falls back to the default.
    pub fn clamped(self) -> Self {
        Self {
            count: self.count.min(PARTICLE_COUNT_MAX),
            speed: if self.speed.is_finite() {
                self.speed
            } else {
                PARTICLE_SPEED
            },
            ..self
        }
    }

    pub fn validate(self) -> FxResult<Self> {
        if self.count > PARTICLE_COUNT_MAX {
            return Err(FxError::TooManyParticles {
                requested: self.count,
                max: PARTICLE_COUNT_MAX,
            });
        }
        Ok(self)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle {
    pub position: Vec2,
    pub velocity: Vec2,
    pub size: f32,
    pub opacity: f32,
    pub hue: f32,
}

/// A line to draw between two nearby particles.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Link {
    pub a: usize,
    pub b: usize,
    pub alpha: f32,
}

pub struct ParticleField {
    particles: Vec<Particle>,
    size: Vec2,
    pointer: Option<Vec2>,
    scroll_velocity: f32,
    last_scroll: f64,
}

#[inline]
fn flow(p: Vec2) -> Vec2 {
    let angle = (p.x * PARTICLE_FLOW_FREQ).sin() * (p.y * PARTICLE_FLOW_FREQ).cos() * PI;
    Vec2::new(angle.cos(), angle.sin()) * PARTICLE_FLOW_GAIN
}

/// Wrap a coordinate that left `[0, extent]` to the opposite edge.
#[inline]
fn wrap(v: f32, extent: f32) -> f32 {
    if v < 0.0 {
        extent
    } else if v > extent {
        0.0
    } else {
        v
    }
}

impl ParticleField {
    pub fn new<R: Rng>(config: ParticleConfig, width: f32, height: f32, rng: &mut R) -> FxResult<Self> {
        let config = config.validate()?;
        let particles = (0..config.count)
            .map(|_| Particle {
                position: Vec2::new(rng.gen::<f32>() * width, rng.gen::<f32>() * height),
                velocity: Vec2::new(
                    (rng.gen::<f32>() - 0.5) * config.speed,
                    (rng.gen::<f32>() - 0.5) * config.speed + PARTICLE_DRIFT_Y,
                ),
                size: rng.gen::<f32>() * 3.0 + 1.0,
                opacity: rng.gen::<f32>() * 0.5 + 0.2,
                hue: config.palette.hue(rng),
            })
            .collect();
        Ok(Self {
            particles,
            size: Vec2::new(width, height),
            pointer: None,
            scroll_velocity: 0.0,
            last_scroll: 0.0,
        })
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }

    /// Canvas resized; particles are kept and wrap into the new bounds.
    pub fn resize(&mut self, width: f32, height: f32) {
        self.size = Vec2::new(width.max(0.0), height.max(0.0));
    }

    pub fn set_pointer(&mut self, pointer: Option<Vec2>) {
        self.pointer = pointer;
    }

    pub fn on_scroll(&mut self, scroll_y: f64) {
        self.scroll_velocity = ((scroll_y - self.last_scroll) as f32) * PARTICLE_SCROLL_SAMPLE_GAIN;
        self.last_scroll = scroll_y;
    }

    /// Adopt the current scroll offset without producing a bias.
    pub fn sync_scroll(&mut self, scroll_y: f64) {
        self.last_scroll = scroll_y;
    }

    pub fn scroll_velocity(&self) -> f32 {
        self.scroll_velocity
    }

    /// Advance every particle by one frame.
    pub fn step(&mut self) {
        let scroll_vel = self.scroll_velocity;
        self.scroll_velocity *= PARTICLE_SCROLL_DECAY;
        let pointer = self.pointer;
        let Vec2 { x: w, y: h } = self.size;
        for p in &mut self.particles {
            if let Some(m) = pointer {
                let d = m - p.position;
                let dist = d.length();
                if dist < PARTICLE_ATTRACT_RADIUS && dist > MIN_DISTANCE {
                    let force = (PARTICLE_ATTRACT_RADIUS - dist) / PARTICLE_ATTRACT_RADIUS;
                    p.velocity += d / dist * force * PARTICLE_ATTRACT_GAIN;
                }
            }
            p.velocity.y -= scroll_vel * PARTICLE_SCROLL_BIAS;
            p.velocity += flow(p.position);

            p.position += p.velocity;
            p.velocity *= PARTICLE_DAMPING;

            p.position.x = wrap(p.position.x, w);
            p.position.y = wrap(p.position.y, h);
        }
    }

    /// Pairs closer than the link distance, each pair once.
    pub fn links(&self, out: &mut Vec<Link>) {
        out.clear();
        let n = self.particles.len();
        for i in 0..n {
            let a = self.particles[i].position;
            for j in (i + 1)..n {
                let dist = a.distance(self.particles[j].position);
                if dist < PARTICLE_LINK_DISTANCE {
                    out.push(Link {
                        a: i,
                        b: j,
                        alpha: (1.0 - dist / PARTICLE_LINK_DISTANCE) * PARTICLE_LINK_ALPHA,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn field(count: usize) -> ParticleField {
        let mut rng = StdRng::seed_from_u64(7);
        let cfg = ParticleConfig {
            count,
            ..ParticleConfig::default()
        };
        ParticleField::new(cfg, 800.0, 600.0, &mut rng).unwrap()
    }

    #[test]
    fn rejects_oversized_pool() {
        let mut rng = StdRng::seed_from_u64(1);
        let cfg = ParticleConfig {
            count: PARTICLE_COUNT_MAX + 1,
            ..ParticleConfig::default()
        };
        assert!(ParticleField::new(cfg, 100.0, 100.0, &mut rng).is_err());
    }

    #[test]
    fn initial_attributes_in_range() {
        let f = field(PARTICLE_COUNT);
        assert_eq!(f.particles().len(), PARTICLE_COUNT);
        for p in f.particles() {
            assert!(p.position.x >= 0.0 && p.position.x <= 800.0);
            assert!(p.size >= 1.0 && p.size <= 4.0);
            assert!(p.opacity >= 0.2 && p.opacity <= 0.7);
            assert!(p.hue >= 200.0 && p.hue <= 240.0);
        }
    }

    #[test]
    fn pool_size_is_stable_across_frames() {
        let mut f = field(50);
        f.set_pointer(Some(Vec2::new(400.0, 300.0)));
        f.on_scroll(120.0);
        for _ in 0..500 {
            f.step();
        }
        assert_eq!(f.particles().len(), 50);
        for p in f.particles() {
            assert!(p.position.x >= 0.0 && p.position.x <= 800.0);
            assert!(p.position.y >= 0.0 && p.position.y <= 600.0);
        }
    }

    #[test]
    fn pointer_on_particle_does_not_divide_by_zero() {
        let mut f = field(1);
        let at = f.particles()[0].position;
        f.set_pointer(Some(at));
        f.step();
        assert!(f.particles()[0].velocity.is_finite());
    }

    #[test]
    fn scroll_bias_decays() {
        let mut f = field(1);
        f.on_scroll(100.0);
        assert_eq!(f.scroll_velocity(), 10.0);
        f.step();
        assert!((f.scroll_velocity() - 9.5).abs() < 1e-5);
    }

    #[test]
    fn synced_scroll_has_no_bias() {
        let mut f = field(1);
        f.sync_scroll(3000.0);
        f.on_scroll(3010.0);
        assert_eq!(f.scroll_velocity(), 1.0);
    }

    #[test]
    fn links_are_unique_pairs() {
        let mut f = field(2);
        f.particles_mut()[0].position = Vec2::new(10.0, 10.0);
        f.particles_mut()[1].position = Vec2::new(60.0, 10.0);
        let mut links = Vec::new();
        f.links(&mut links);
        assert_eq!(links.len(), 1);
        assert!((links[0].alpha - 0.075).abs() < 1e-6);
    }
}
