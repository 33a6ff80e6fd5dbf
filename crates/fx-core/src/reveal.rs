//! Time-driven reveal sequencers.
//!
//! Both sequencers are advanced with the animation-frame timestamp instead of
//! owning timers, so cancelling the frame loop is all teardown needs.

use crate::capability::CapabilitySnapshot;
use crate::constants::{
    MIN_DISTANCE, REVEAL_CHAOS, REVEAL_MIN_SEC, REVEAL_STEP_SEC, WAVE_BASE_DELAY_MS,
    WAVE_DURATION_MS, WAVE_FAILSAFE_MS, WAVE_LIVE_DELAY_MS, WAVE_SPREAD,
};
use crate::registry::ElementId;
use fnv::FnvHashSet;
use glam::Vec2;
use rand::Rng;
use smallvec::SmallVec;

/// Ids activated so far. Only grows; a fresh wave starts a fresh set.
#[derive(Clone, Debug, Default)]
pub struct ActivationSet {
    ids: FnvHashSet<ElementId>,
}

impl ActivationSet {
    fn insert(&mut self, id: ElementId) -> bool {
        self.ids.insert(id)
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WavePhase {
    #[default]
    Dormant,
    Activating,
    Live,
}

impl WavePhase {
    pub fn as_str(self) -> &'static str {
        match self {
            WavePhase::Dormant => "dormant",
            WavePhase::Activating => "activating",
            WavePhase::Live => "live",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WaveTiming {
    pub duration_ms: f64,
    pub spread: f64,
    pub base_delay_ms: f64,
    pub failsafe_ms: f64,
    pub live_delay_ms: f64,
}

impl Default for WaveTiming {
    fn default() -> Self {
        Self {
            duration_ms: WAVE_DURATION_MS,
            spread: WAVE_SPREAD,
            base_delay_ms: WAVE_BASE_DELAY_MS,
            failsafe_ms: WAVE_FAILSAFE_MS,
            live_delay_ms: WAVE_LIVE_DELAY_MS,
        }
    }
}

impl WaveTiming {
    /// `dist/max * duration * spread + base`.
    pub fn delay_for(&self, dist: f32, max_dist: f32) -> f64 {
        let norm = if max_dist > MIN_DISTANCE {
            (dist / max_dist) as f64
        } else {
            0.0
        };
        norm * self.duration_ms * self.spread + self.base_delay_ms
    }
}

/// Radial activation: anchors closer to the center activate first.
#[derive(Clone, Debug)]
pub struct ActivationWave {
    /// Sorted by ascending delay.
    schedule: Vec<(ElementId, f64)>,
    timing: WaveTiming,
    activated: ActivationSet,
    next: usize,
    start_ms: Option<f64>,
    phase: WavePhase,
    instant: bool,
}

impl ActivationWave {
    pub fn new(snapshot: &CapabilitySnapshot, center: Vec2, anchors: &[(ElementId, Vec2)]) -> Self {
        Self::with_timing(snapshot, center, anchors, WaveTiming::default())
    }

    pub fn with_timing(
        snapshot: &CapabilitySnapshot,
        center: Vec2,
        anchors: &[(ElementId, Vec2)],
        timing: WaveTiming,
    ) -> Self {
        let max_dist = anchors
            .iter()
            .map(|(_, p)| p.distance(center))
            .fold(0.0f32, f32::max);
        let mut schedule: Vec<(ElementId, f64)> = anchors
            .iter()
            .map(|(id, p)| (*id, timing.delay_for(p.distance(center), max_dist)))
            .collect();
        schedule.sort_by(|a, b| a.1.total_cmp(&b.1));
        Self {
            schedule,
            timing,
            activated: ActivationSet::default(),
            next: 0,
            start_ms: None,
            phase: WavePhase::Dormant,
            instant: snapshot.reduced_motion,
        }
    }

    pub fn phase(&self) -> WavePhase {
        self.phase
    }

    pub fn activated(&self) -> &ActivationSet {
        &self.activated
    }

    pub fn is_activated(&self, id: ElementId) -> bool {
        self.activated.contains(id)
    }

    /// Scheduled delay per id, in activation order.
    pub fn schedule(&self) -> &[(ElementId, f64)] {
        &self.schedule
    }

    /// All anchors active and the phase settled; the driving loop can stop.
    pub fn is_complete(&self) -> bool {
        self.phase == WavePhase::Live && self.next == self.schedule.len()
    }

    /// Start on first visibility. Later calls are no-ops. Returns true when
    /// a frame loop has to be started.
    pub fn start(&mut self, now_ms: f64) -> bool {
        if self.start_ms.is_some() {
            return false;
        }
        self.start_ms = Some(now_ms);
        if self.instant {
            self.activate_until(self.schedule.len());
            self.phase = WavePhase::Live;
            log::debug!("[wave] reduced motion, {} anchors live", self.activated.len());
            return false;
        }
        self.phase = WavePhase::Activating;
        true
    }

    /// Activate everything whose delay has elapsed. Returns the newly
    /// activated ids in activation order.
    pub fn advance(&mut self, now_ms: f64) -> SmallVec<[ElementId; 8]> {
        let mut fresh = SmallVec::new();
        let Some(start) = self.start_ms else {
            return fresh;
        };
        let elapsed = now_ms - start;
        let due = if elapsed >= self.timing.failsafe_ms {
            if self.next < self.schedule.len() {
                log::warn!(
                    "[wave] failsafe forcing {} anchors",
                    self.schedule.len() - self.next
                );
            }
            self.schedule.len()
        } else {
            self.next
                + self.schedule[self.next..]
                    .iter()
                    .take_while(|(_, delay)| *delay <= elapsed)
                    .count()
        };
        for &(id, _) in &self.schedule[self.next..due] {
            if self.activated.insert(id) {
                fresh.push(id);
            }
        }
        self.next = due;
        if self.phase == WavePhase::Activating && elapsed >= self.timing.live_delay_ms {
            self.phase = WavePhase::Live;
        }
        fresh
    }

    fn activate_until(&mut self, end: usize) {
        for &(id, _) in &self.schedule[self.next..end] {
            self.activated.insert(id);
        }
        self.next = end;
    }
}

/// Chaos-to-order stagger: early items jitter widely, later ones settle into
/// a regular cadence. Delays are in seconds.
pub fn stagger_delays<R: Rng>(count: usize, rng: &mut R) -> Vec<f32> {
    let n = count.max(1) as f32;
    (0..count)
        .map(|i| {
            let i = i as f32;
            let r: f32 = rng.gen();
            let chaos = (r - 0.3) * REVEAL_CHAOS * (1.0 - i / n);
            (REVEAL_STEP_SEC * i + chaos).max(REVEAL_MIN_SEC)
        })
        .collect()
}

/// Delay for an item that follows its primary, e.g. a caption under a title.
pub fn secondary_delay<R: Rng>(primary_sec: f32, rng: &mut R) -> f32 {
    primary_sec + 0.2 + 0.3 * rng.gen::<f32>()
}

/// Trigger-once staggered reveal over a fixed list of items.
#[derive(Clone, Debug)]
pub struct StaggeredReveal {
    delays_ms: Vec<f64>,
    shown: Vec<bool>,
    start_ms: Option<f64>,
    instant: bool,
}

impl StaggeredReveal {
    pub fn new<R: Rng>(snapshot: &CapabilitySnapshot, count: usize, rng: &mut R) -> Self {
        Self::from_delays(snapshot, &stagger_delays(count, rng))
    }

    pub fn from_delays(snapshot: &CapabilitySnapshot, delays_sec: &[f32]) -> Self {
        Self {
            delays_ms: delays_sec.iter().map(|s| *s as f64 * 1000.0).collect(),
            shown: vec![false; delays_sec.len()],
            start_ms: None,
            instant: snapshot.reduced_motion,
        }
    }

    /// Returns true when a frame loop has to be started.
    pub fn trigger(&mut self, now_ms: f64) -> bool {
        if self.start_ms.is_some() {
            return false;
        }
        self.start_ms = Some(now_ms);
        if self.instant {
            self.shown.iter_mut().for_each(|s| *s = true);
            return false;
        }
        !self.shown.is_empty()
    }

    /// Newly revealed indices.
    pub fn advance(&mut self, now_ms: f64) -> SmallVec<[usize; 8]> {
        let mut fresh = SmallVec::new();
        let Some(start) = self.start_ms else {
            return fresh;
        };
        let elapsed = now_ms - start;
        for (i, (delay, shown)) in self.delays_ms.iter().zip(self.shown.iter_mut()).enumerate() {
            if !*shown && *delay <= elapsed {
                *shown = true;
                fresh.push(i);
            }
        }
        fresh
    }

    pub fn is_shown(&self, index: usize) -> bool {
        self.shown.get(index).copied().unwrap_or(false)
    }

    pub fn is_complete(&self) -> bool {
        self.start_ms.is_some() && self.shown.iter().all(|s| *s)
    }
}
