//! Trigger-once numeric counter.

use crate::capability::CapabilitySnapshot;
use crate::constants::{
    COUNTER_DURATION_MS, COUNTER_EASE_KNEE, COUNTER_MAX_DECIMALS, COUNTER_OVERSHOOT,
};
use std::f64::consts::PI;

/// Cubic ease-out up to the knee, then a small sine overshoot that returns to
/// exactly 1 at `t = 1`.
pub fn ease_with_overshoot(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    let eased = if t < COUNTER_EASE_KNEE {
        1.0 - (1.0 - t / COUNTER_EASE_KNEE).powi(3)
    } else {
        let tail = (t - COUNTER_EASE_KNEE) / (1.0 - COUNTER_EASE_KNEE);
        1.0 + (tail * PI).sin() * COUNTER_OVERSHOOT
    };
    eased.min(1.0 + COUNTER_OVERSHOOT)
}

/// Round to at most `COUNTER_MAX_DECIMALS` places.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let scale = 10f64.powi(decimals.min(COUNTER_MAX_DECIMALS) as i32);
    (value * scale).round() / scale
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Phase {
    Waiting,
    Running { start_ms: f64 },
    Done,
}

#[derive(Clone, Debug)]
pub struct Counter {
    end: f64,
    duration_ms: f64,
    decimals: u32,
    instant: bool,
    phase: Phase,
}

impl Counter {
    pub fn new(snapshot: &CapabilitySnapshot, end: f64, duration_ms: Option<f64>, decimals: u32) -> Self {
        let duration_ms = duration_ms
            .filter(|d| d.is_finite() && *d > 0.0)
            .unwrap_or(COUNTER_DURATION_MS);
        Self {
            end: if end.is_finite() { end } else { 0.0 },
            duration_ms,
            decimals: decimals.min(COUNTER_MAX_DECIMALS),
            instant: snapshot.reduced_motion,
            phase: Phase::Waiting,
        }
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    pub fn decimals(&self) -> u32 {
        self.decimals
    }

    pub fn is_armed(&self) -> bool {
        self.phase != Phase::Waiting
    }

    pub fn is_done(&self) -> bool {
        self.phase == Phase::Done
    }

    /// Arm on first visibility. Later calls are no-ops. Returns true when a
    /// frame loop has to be started.
    pub fn trigger(&mut self, now_ms: f64) -> bool {
        if self.phase != Phase::Waiting {
            return false;
        }
        if self.instant {
            self.phase = Phase::Done;
            return false;
        }
        self.phase = Phase::Running { start_ms: now_ms };
        true
    }

    /// Displayed value at `now_ms`. Exactly `end` once the duration elapsed.
    pub fn sample(&mut self, now_ms: f64) -> f64 {
        match self.phase {
            Phase::Waiting => 0.0,
            Phase::Done => self.end,
            Phase::Running { start_ms } => {
                let t = (now_ms - start_ms) / self.duration_ms;
                if t >= 1.0 {
                    self.phase = Phase::Done;
                    return self.end;
                }
                round_to(self.end * ease_with_overshoot(t.max(0.0)), self.decimals)
            }
        }
    }

    pub fn format(&self, value: f64) -> String {
        format!("{:.*}", self.decimals as usize, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::CapabilitySignals;

    #[test]
    fn ease_hits_knee_and_end() {
        assert_eq!(ease_with_overshoot(0.0), 0.0);
        assert!((ease_with_overshoot(COUNTER_EASE_KNEE) - 1.0).abs() < 1e-9);
        assert!((ease_with_overshoot(1.0) - 1.0).abs() < 1e-9);
        let peak = ease_with_overshoot(0.925);
        assert!(peak > 1.0 && peak <= 1.0 + COUNTER_OVERSHOOT);
    }

    #[test]
    fn trigger_is_idempotent() {
        let mut c = Counter::new(&CapabilitySnapshot::neutral(), 100.0, Some(1000.0), 0);
        assert!(c.trigger(0.0));
        assert!(!c.trigger(500.0));
        let mid = c.sample(500.0);
        assert!(mid > 0.0 && mid < 100.0);
        assert_eq!(c.sample(1000.0), 100.0);
        assert!(c.is_done());
        assert!(!c.trigger(2000.0));
        assert_eq!(c.sample(2000.0), 100.0);
    }

    #[test]
    fn reduced_motion_lands_immediately() {
        let snap = CapabilitySnapshot::from_signals(CapabilitySignals {
            is_touch: false,
            reduced_motion: true,
            core_count: Some(8),
        });
        let mut c = Counter::new(&snap, 42.5, None, 1);
        assert!(!c.trigger(0.0));
        assert_eq!(c.sample(0.0), 42.5);
        assert_eq!(c.format(42.5), "42.5");
    }

    #[test]
    fn huge_decimals_are_capped() {
        let c = Counter::new(&CapabilitySnapshot::neutral(), 1.0, None, 400);
        assert_eq!(c.decimals(), COUNTER_MAX_DECIMALS);
        assert_eq!(round_to(1.23456789, 400), 1.234568);
    }

    #[test]
    fn untriggered_counter_reads_zero() {
        let mut c = Counter::new(&CapabilitySnapshot::neutral(), 9.0, Some(-5.0), 0);
        assert_eq!(c.sample(10_000.0), 0.0);
        assert!(!c.is_armed());
    }
}
