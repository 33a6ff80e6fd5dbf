//! Idle/running state shared by every self-terminating frame loop.
//!
//! A loop starts idle. A stimulus (new target, scroll sample) wakes it and the
//! caller schedules exactly one animation frame. Each frame the model reports
//! whether it still has work; once it settles the loop goes back to idle and
//! nothing is scheduled until the next stimulus.

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LoopState {
    #[default]
    Idle,
    Running,
}

/// Result of advancing a model by one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Activity {
    Continue,
    Settled,
}

impl Activity {
    #[inline]
    pub fn is_settled(self) -> bool {
        matches!(self, Activity::Settled)
    }

    /// Combine two models driven from the same frame.
    #[inline]
    pub fn and(self, other: Activity) -> Activity {
        if self.is_settled() && other.is_settled() {
            Activity::Settled
        } else {
            Activity::Continue
        }
    }
}

/// Browser events an effect may subscribe to. Effects report the set they
/// need up front so the host attaches nothing for a static variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    PointerMove,
    PointerLeave,
    PointerOver,
    Scroll,
    Resize,
}

/// Anything that can be advanced one animation frame at a time.
pub trait Animate {
    fn step(&mut self) -> Activity;
}

/// Tracks whether a frame is already scheduled.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameGate {
    state: LoopState,
}

impl FrameGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when the caller must request a frame (idle -> running).
    #[inline]
    pub fn wake(&mut self) -> bool {
        match self.state {
            LoopState::Idle => {
                self.state = LoopState::Running;
                true
            }
            LoopState::Running => false,
        }
    }

    #[inline]
    pub fn settle(&mut self) {
        self.state = LoopState::Idle;
    }

    /// Feed a frame result; returns true when another frame is needed.
    #[inline]
    pub fn after_frame(&mut self, activity: Activity) -> bool {
        match activity {
            Activity::Continue => true,
            Activity::Settled => {
                self.settle();
                false
            }
        }
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.state == LoopState::Running
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wake_only_schedules_once() {
        let mut gate = FrameGate::new();
        assert!(gate.wake());
        assert!(!gate.wake());
        assert!(gate.after_frame(Activity::Continue));
        assert!(!gate.after_frame(Activity::Settled));
        assert!(!gate.is_running());
        assert!(gate.wake());
    }

    #[test]
    fn activity_and_requires_both_settled() {
        assert_eq!(Activity::Settled.and(Activity::Continue), Activity::Continue);
        assert_eq!(Activity::Settled.and(Activity::Settled), Activity::Settled);
    }
}
