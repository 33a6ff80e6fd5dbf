//! Device capability snapshot and performance tier derivation.
//!
//! The web frontend fills in the raw signals (media queries, core count) and
//! every effect reads the resulting snapshot. Snapshots are immutable; a media
//! query change produces a whole new one.

/// Coarse performance classification gating how much animation work runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Tier {
    Low,
    Mid,
    High,
}

impl Tier {
    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Low => "low",
            Tier::Mid => "mid",
            Tier::High => "high",
        }
    }
}

/// Raw signals read from the host environment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CapabilitySignals {
    /// `(hover: none) and (pointer: coarse)` matched.
    pub is_touch: bool,
    /// `(prefers-reduced-motion: reduce)` matched.
    pub reduced_motion: bool,
    /// `navigator.hardwareConcurrency`, if the host reported one.
    pub core_count: Option<u32>,
}

pub const DEFAULT_CORE_COUNT: u32 = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CapabilitySnapshot {
    pub is_touch: bool,
    pub reduced_motion: bool,
    pub core_count: u32,
    pub is_low_end: bool,
    pub tier: Tier,
}

impl CapabilitySnapshot {
    pub fn from_signals(signals: CapabilitySignals) -> Self {
        // A reported 0 is treated the same as "unknown".
        let core_count = signals
            .core_count
            .filter(|&c| c > 0)
            .unwrap_or(DEFAULT_CORE_COUNT);
        let is_low_end = core_count < 4 || (signals.is_touch && core_count < 6);
        let tier = derive_tier(signals.reduced_motion, is_low_end, signals.is_touch);
        Self {
            is_touch: signals.is_touch,
            reduced_motion: signals.reduced_motion,
            core_count,
            is_low_end,
            tier,
        }
    }

    /// Snapshot used when no window/navigator is available.
    pub fn neutral() -> Self {
        Self::from_signals(CapabilitySignals {
            is_touch: false,
            reduced_motion: false,
            core_count: None,
        })
    }

    /// Pointer-driven effects must skip listener registration entirely when
    /// this returns false.
    pub fn allows_pointer_tracking(&self) -> bool {
        !self.is_touch && !self.reduced_motion
    }

    pub fn allows_motion(&self) -> bool {
        !self.reduced_motion
    }
}

impl Default for CapabilitySnapshot {
    fn default() -> Self {
        Self::neutral()
    }
}

#[inline]
pub fn derive_tier(reduced_motion: bool, is_low_end: bool, is_touch: bool) -> Tier {
    if reduced_motion || is_low_end {
        Tier::Low
    } else if is_touch {
        Tier::Mid
    } else {
        Tier::High
    }
}

/// Choice between the animated and the static rendering of an effect.
///
/// Picked once from the snapshot at mount time and never re-evaluated by the
/// effect itself; a capability change tears the effect down and remounts it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Variant {
    Reduced,
    Live,
}

impl Variant {
    pub fn for_pointer_effect(snapshot: &CapabilitySnapshot) -> Self {
        if snapshot.allows_pointer_tracking() {
            Variant::Live
        } else {
            Variant::Reduced
        }
    }

    pub fn for_motion_effect(snapshot: &CapabilitySnapshot) -> Self {
        if snapshot.allows_motion() {
            Variant::Live
        } else {
            Variant::Reduced
        }
    }

    pub fn is_live(self) -> bool {
        matches!(self, Variant::Live)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(is_touch: bool, reduced_motion: bool, cores: Option<u32>) -> CapabilitySnapshot {
        CapabilitySnapshot::from_signals(CapabilitySignals {
            is_touch,
            reduced_motion,
            core_count: cores,
        })
    }

    #[test]
    fn neutral_snapshot_is_high_tier_desktop() {
        let s = CapabilitySnapshot::neutral();
        assert!(!s.is_touch);
        assert!(!s.reduced_motion);
        assert_eq!(s.core_count, 4);
        assert_eq!(s.tier, Tier::High);
    }

    #[test]
    fn reduced_motion_forces_low() {
        assert_eq!(snap(false, true, Some(16)).tier, Tier::Low);
    }

    #[test]
    fn touch_with_few_cores_is_low() {
        let s = snap(true, false, Some(2));
        assert!(s.is_low_end);
        assert_eq!(s.tier, Tier::Low);
        assert_eq!(snap(true, false, Some(5)).tier, Tier::Low);
    }

    #[test]
    fn touch_with_many_cores_is_mid() {
        assert_eq!(snap(true, false, Some(8)).tier, Tier::Mid);
    }

    #[test]
    fn desktop_with_three_cores_is_low() {
        assert_eq!(snap(false, false, Some(3)).tier, Tier::Low);
    }

    #[test]
    fn zero_cores_falls_back_to_default() {
        assert_eq!(snap(false, false, Some(0)).core_count, DEFAULT_CORE_COUNT);
    }

    #[test]
    fn variant_follows_pointer_capability() {
        assert_eq!(Variant::for_pointer_effect(&snap(true, false, Some(8))), Variant::Reduced);
        assert_eq!(Variant::for_pointer_effect(&snap(false, true, Some(8))), Variant::Reduced);
        assert_eq!(Variant::for_pointer_effect(&snap(false, false, Some(8))), Variant::Live);
        assert_eq!(Variant::for_motion_effect(&snap(true, false, Some(8))), Variant::Live);
    }
}
