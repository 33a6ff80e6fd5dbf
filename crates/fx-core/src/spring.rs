//! Damped spring integrator with a guaranteed settle.
//!
//! Every animated scalar channel (one per axis of a magnetic element, each
//! cursor follower axis, stat-card offsets) uses this one primitive; presets in
//! `constants` carry the per-effect tuning.

use crate::anim::{Activity, Animate, LoopState};
use crate::constants::{FRAME_DT_SEC, SPRING_SETTLE_EPS, SPRING_VELOCITY_EPS};
use crate::error::{FxError, FxResult};
use glam::Vec2;

// Largest (rate * h) allowed per substep; keeps semi-implicit Euler stable for
// stiff or heavily damped light springs.
const MAX_RATE_PER_SUBSTEP: f32 = 0.5;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpringConfig {
    stiffness: f32,
    damping: f32,
    mass: f32,
    substeps: u32,
}

impl SpringConfig {
    /// Rejects configurations that could never settle.
    pub fn new(stiffness: f32, damping: f32, mass: f32) -> FxResult<Self> {
        let finite = stiffness.is_finite() && damping.is_finite() && mass.is_finite();
        if !finite || stiffness <= 0.0 || mass <= 0.0 {
            return Err(FxError::InvalidSpring(format!(
                "stiffness={stiffness} mass={mass} must be positive"
            )));
        }
        if damping <= 0.0 {
            return Err(FxError::InvalidSpring(format!(
                "damping={damping} must be positive or the spring never settles"
            )));
        }
        let omega = (stiffness / mass).sqrt();
        let rate = (damping / mass).max(omega);
        let substeps = ((rate * FRAME_DT_SEC) / MAX_RATE_PER_SUBSTEP).ceil().max(1.0) as u32;
        Ok(Self {
            stiffness,
            damping,
            mass,
            substeps,
        })
    }

    /// Build from one of the `(stiffness, damping, mass)` presets.
    pub fn preset(p: (f32, f32, f32)) -> Self {
        // Presets are compile-time constants with positive values.
        Self::new(p.0, p.1, p.2).unwrap_or(Self {
            stiffness: p.0.abs().max(1.0),
            damping: p.1.abs().max(1.0),
            mass: p.2.abs().max(0.1),
            substeps: 8,
        })
    }

    pub fn stiffness(&self) -> f32 {
        self.stiffness
    }
    pub fn damping(&self) -> f32 {
        self.damping
    }
    pub fn mass(&self) -> f32 {
        self.mass
    }
}

#[derive(Clone, Debug)]
pub struct Spring {
    pub value: f32,
    pub velocity: f32,
    target: f32,
    config: SpringConfig,
    state: LoopState,
}

impl Spring {
    pub fn new(initial: f32, config: SpringConfig) -> Self {
        Self {
            value: initial,
            velocity: 0.0,
            target: initial,
            config,
            state: LoopState::Idle,
        }
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn is_running(&self) -> bool {
        self.state == LoopState::Running
    }

    /// Retarget without touching velocity. Returns true if the spring went
    /// from idle to running and the caller has to schedule a frame.
    pub fn set_target(&mut self, target: f32) -> bool {
        self.target = target;
        if self.state == LoopState::Idle && !self.is_at_rest() {
            self.state = LoopState::Running;
            return true;
        }
        false
    }

    /// Jump straight to a value with no animation.
    pub fn snap_to(&mut self, value: f32) {
        self.value = value;
        self.target = value;
        self.velocity = 0.0;
        self.state = LoopState::Idle;
    }

    fn is_at_rest(&self) -> bool {
        (self.value - self.target).abs() < SPRING_SETTLE_EPS
            && self.velocity.abs() < SPRING_VELOCITY_EPS
    }
}

impl Animate for Spring {
    fn step(&mut self) -> Activity {
        if self.state == LoopState::Idle {
            return Activity::Settled;
        }
        let SpringConfig {
            stiffness,
            damping,
            mass,
            substeps,
        } = self.config;
        let h = FRAME_DT_SEC / substeps as f32;
        for _ in 0..substeps {
            let accel = (-stiffness * (self.value - self.target) - damping * self.velocity) / mass;
            self.velocity += accel * h;
            self.value += self.velocity * h;
        }
        if self.is_at_rest() {
            self.snap_to(self.target);
            Activity::Settled
        } else {
            Activity::Continue
        }
    }
}

/// Two independent spring channels driven together.
#[derive(Clone, Debug)]
pub struct Spring2 {
    pub x: Spring,
    pub y: Spring,
}

impl Spring2 {
    pub fn new(initial: Vec2, config: SpringConfig) -> Self {
        Self {
            x: Spring::new(initial.x, config),
            y: Spring::new(initial.y, config),
        }
    }

    pub fn value(&self) -> Vec2 {
        Vec2::new(self.x.value, self.y.value)
    }

    pub fn set_target(&mut self, target: Vec2) -> bool {
        let wx = self.x.set_target(target.x);
        let wy = self.y.set_target(target.y);
        wx || wy
    }

    pub fn snap_to(&mut self, value: Vec2) {
        self.x.snap_to(value.x);
        self.y.snap_to(value.y);
    }

    pub fn is_running(&self) -> bool {
        self.x.is_running() || self.y.is_running()
    }
}

impl Animate for Spring2 {
    fn step(&mut self) -> Activity {
        let ax = self.x.step();
        let ay = self.y.step();
        ax.and(ay)
    }
}

/// Run a spring to rest, returning the number of frames it took.
pub fn frames_to_settle<A: Animate>(model: &mut A, max_frames: usize) -> Option<usize> {
    (1..=max_frames).find(|_| model.step().is_settled())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::SPRING_MAGNETIC;

    #[test]
    fn zero_damping_is_rejected() {
        assert!(SpringConfig::new(100.0, 0.0, 1.0).is_err());
        assert!(SpringConfig::new(0.0, 10.0, 1.0).is_err());
        assert!(SpringConfig::new(100.0, 10.0, -1.0).is_err());
        assert!(SpringConfig::new(f32::NAN, 10.0, 1.0).is_err());
    }

    #[test]
    fn idle_spring_does_not_wake_for_same_target() {
        let mut s = Spring::new(5.0, SpringConfig::preset(SPRING_MAGNETIC));
        assert!(!s.set_target(5.0));
        assert_eq!(s.step(), Activity::Settled);
    }

    #[test]
    fn settles_exactly_on_target() {
        let mut s = Spring::new(0.0, SpringConfig::preset(SPRING_MAGNETIC));
        assert!(s.set_target(40.0));
        let frames = frames_to_settle(&mut s, 2_000).expect("spring settles");
        assert!(frames > 1);
        assert_eq!(s.value, 40.0);
        assert_eq!(s.velocity, 0.0);
        assert!(!s.is_running());
    }

    #[test]
    fn retarget_in_flight_keeps_velocity() {
        let mut s = Spring::new(0.0, SpringConfig::preset(SPRING_MAGNETIC));
        s.set_target(100.0);
        for _ in 0..3 {
            s.step();
        }
        let v = s.velocity;
        assert!(v > 0.0);
        assert!(!s.set_target(-100.0), "already running, no new frame request");
        assert_eq!(s.velocity, v);
    }

    #[test]
    fn heavily_damped_light_spring_stays_stable() {
        let cfg = SpringConfig::new(30.0, 30.0, 0.1).unwrap();
        let mut s = Spring::new(0.0, cfg);
        s.set_target(100.0);
        for _ in 0..20 {
            s.step();
            assert!(s.value.is_finite());
            assert!(s.value <= 100.5, "overdamped spring must not overshoot");
        }
    }
}
