//! Scroll velocity estimators.
//!
//! Both estimators are lazy: a scroll sample wakes them and they decay back to
//! exactly zero on their own, after which no more frames are requested.

use crate::anim::{Activity, Animate, LoopState};
use crate::constants::{
    FRAME_MS, GLASS_RAW_DECAY, GLASS_SMOOTH_KEEP, GLASS_STOP_EPS, GLASS_VELOCITY_NORM,
};

/// Two-stage smoothed scroll speed normalised to [0, 1].
///
/// The raw sample is `|Δscroll| / Δt` scaled to a 60 fps frame. Each frame the
/// smoothed value chases the raw sample (fast attack) while the raw sample
/// itself decays independently.
#[derive(Clone, Debug)]
pub struct ScrollVelocity {
    raw: f32,
    smooth: f32,
    last_offset: f64,
    last_time_ms: f64,
    state: LoopState,
}

impl ScrollVelocity {
    pub fn new(offset: f64, now_ms: f64) -> Self {
        Self {
            raw: 0.0,
            smooth: 0.0,
            last_offset: offset,
            last_time_ms: now_ms,
            state: LoopState::Idle,
        }
    }

    /// Record a scroll sample. Returns true when the decay loop has to start.
    pub fn on_scroll(&mut self, offset: f64, now_ms: f64) -> bool {
        let dt = now_ms - self.last_time_ms;
        if dt > 0.0 {
            let delta = (offset - self.last_offset).abs();
            self.raw = ((delta / dt) * FRAME_MS) as f32;
        }
        self.last_offset = offset;
        self.last_time_ms = now_ms;
        match self.state {
            LoopState::Idle => {
                self.state = LoopState::Running;
                true
            }
            LoopState::Running => false,
        }
    }

    pub fn normalized(&self) -> f32 {
        (self.smooth / GLASS_VELOCITY_NORM).clamp(0.0, 1.0)
    }

    pub fn is_running(&self) -> bool {
        self.state == LoopState::Running
    }

    pub fn reset(&mut self) {
        self.raw = 0.0;
        self.smooth = 0.0;
        self.state = LoopState::Idle;
    }
}

impl Animate for ScrollVelocity {
    fn step(&mut self) -> Activity {
        if self.state == LoopState::Idle {
            return Activity::Settled;
        }
        self.smooth = self.smooth * GLASS_SMOOTH_KEEP + self.raw * (1.0 - GLASS_SMOOTH_KEEP);
        self.raw *= GLASS_RAW_DECAY;
        if self.smooth.abs() < GLASS_STOP_EPS && self.raw.abs() < GLASS_STOP_EPS {
            self.reset();
            return Activity::Settled;
        }
        Activity::Continue
    }
}

/// Signed value that decays geometrically every frame and stops at zero.
#[derive(Clone, Copy, Debug)]
pub struct Decay {
    pub value: f32,
    factor: f32,
    eps: f32,
}

impl Decay {
    pub fn new(factor: f32, eps: f32) -> Self {
        Self {
            value: 0.0,
            factor: factor.clamp(0.0, 0.999),
            eps,
        }
    }

    /// Overwrite with a fresh sample. Returns true if it was at rest before.
    pub fn kick(&mut self, value: f32) -> bool {
        let was_idle = self.value == 0.0;
        self.value = value;
        was_idle && value != 0.0
    }
}

impl Animate for Decay {
    fn step(&mut self) -> Activity {
        self.value *= self.factor;
        if self.value.abs() < self.eps {
            self.value = 0.0;
            Activity::Settled
        } else {
            Activity::Continue
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_scroll_wakes_loop_once() {
        let mut v = ScrollVelocity::new(0.0, 0.0);
        assert!(v.on_scroll(100.0, 16.0));
        assert!(!v.on_scroll(200.0, 32.0));
        assert!(v.is_running());
    }

    #[test]
    fn raw_sample_is_normalised_to_frame() {
        let mut v = ScrollVelocity::new(0.0, 0.0);
        // 150px over 16ms is 150px/frame, which saturates.
        v.on_scroll(150.0, 16.0);
        for _ in 0..30 {
            v.step();
        }
        assert!(v.normalized() > 0.5);
    }

    #[test]
    fn zero_dt_sample_keeps_previous_raw() {
        let mut v = ScrollVelocity::new(0.0, 10.0);
        v.on_scroll(50.0, 10.0);
        v.step();
        assert_eq!(v.normalized(), 0.0);
    }

    #[test]
    fn idle_estimator_reports_settled() {
        let mut v = ScrollVelocity::new(0.0, 0.0);
        assert_eq!(v.step(), Activity::Settled);
    }

    #[test]
    fn decay_reaches_exact_zero() {
        let mut d = Decay::new(0.85, 0.01);
        assert!(d.kick(-40.0));
        let mut frames = 0;
        while d.step() == Activity::Continue {
            frames += 1;
            assert!(frames < 200);
        }
        assert_eq!(d.value, 0.0);
    }
}
