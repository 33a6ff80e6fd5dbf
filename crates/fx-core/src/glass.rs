//! Adaptive glass publisher.
//!
//! The one writer of the document-level `--glass-*` and `--perf-*` style
//! variables. Stylesheets read them passively. Event handlers only record
//! samples; all reads of document geometry and all writes happen in `frame`.

use crate::anim::{Animate, EventKind, FrameGate};
use crate::capability::{CapabilitySnapshot, Tier};
use crate::pointer::PointerSample;
use crate::scroll::scroll_depth;
use crate::velocity::ScrollVelocity;
use glam::Vec2;

pub const VAR_SCROLL_DEPTH: &str = "--glass-scroll-depth";
pub const VAR_SCROLL_VELOCITY: &str = "--glass-scroll-velocity";
pub const VAR_MOUSE_X: &str = "--glass-mouse-x";
pub const VAR_MOUSE_Y: &str = "--glass-mouse-y";
pub const VAR_FOCUS_INTENSITY: &str = "--glass-focus-intensity";

pub const NEUTRAL_VARS: [(&str, &str); 5] = [
    (VAR_SCROLL_DEPTH, "0"),
    (VAR_SCROLL_VELOCITY, "0"),
    (VAR_MOUSE_X, "0.5"),
    (VAR_MOUSE_Y, "0.5"),
    (VAR_FOCUS_INTENSITY, "0"),
];

const LOW_TIER_VARS: [(&str, &str); 8] = [
    ("--perf-blur", "0px"),
    ("--perf-blur-heavy", "0px"),
    ("--perf-blur-light", "0px"),
    ("--perf-saturate", ""),
    ("--perf-brightness", ""),
    ("--perf-backdrop", "none"),
    ("--perf-backdrop-light", "none"),
    ("--perf-glass-bg", "rgba(5, 20, 45, 0.88)"),
];

const MID_TIER_VARS: [(&str, &str); 8] = [
    ("--perf-blur", "10px"),
    ("--perf-blur-heavy", "14px"),
    ("--perf-blur-light", "6px"),
    ("--perf-saturate", ""),
    ("--perf-brightness", ""),
    ("--perf-backdrop", "blur(10px)"),
    ("--perf-backdrop-light", "blur(6px)"),
    ("--perf-glass-bg", "rgba(5, 20, 45, 0.65)"),
];

/// Performance variables for a tier. `High` keeps stylesheet defaults.
pub fn tier_vars(tier: Tier) -> &'static [(&'static str, &'static str)] {
    match tier {
        Tier::Low => &LOW_TIER_VARS,
        Tier::Mid => &MID_TIER_VARS,
        Tier::High => &[],
    }
}

/// Write target for style variables.
pub trait StyleSink {
    fn set_var(&mut self, name: &str, value: &str);

    /// Drop a variable so the stylesheet default applies again.
    fn remove_var(&mut self, name: &str) {
        self.set_var(name, "");
    }
}

/// Document metrics read at the start of a frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DocMetrics {
    pub scroll_y: f64,
    pub scroll_height: f64,
    pub viewport_h: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    /// Reduced motion: neutral values written once, nothing else ever.
    Frozen,
    Live { track_pointer: bool },
    TornDown,
}

pub struct AdaptiveGlass<S: StyleSink> {
    sink: S,
    mode: Mode,
    /// Tier variables written at init, removed again on teardown.
    tier_vars: &'static [(&'static str, &'static str)],
    velocity: ScrollVelocity,
    gate: FrameGate,
    scroll_dirty: bool,
    pending_pointer: Option<PointerSample>,
}

#[inline]
fn fmt4(v: f32) -> String {
    format!("{v:.4}")
}

impl<S: StyleSink> AdaptiveGlass<S> {
    /// Write tier variables and neutral defaults, then pick the live or frozen
    /// mode from the snapshot.
    pub fn init(mut sink: S, snapshot: &CapabilitySnapshot, metrics: DocMetrics, now_ms: f64) -> Self {
        let written = tier_vars(snapshot.tier);
        for (name, value) in written {
            sink.set_var(name, value);
        }
        for (name, value) in NEUTRAL_VARS {
            sink.set_var(name, value);
        }
        let mode = if snapshot.reduced_motion {
            Mode::Frozen
        } else {
            let depth = scroll_depth(metrics.scroll_y, metrics.scroll_height, metrics.viewport_h);
            sink.set_var(VAR_SCROLL_DEPTH, &fmt4(depth));
            Mode::Live {
                track_pointer: !snapshot.is_touch,
            }
        };
        log::info!("[glass] init tier={} mode={:?}", snapshot.tier.as_str(), mode);
        Self {
            sink,
            mode,
            tier_vars: written,
            velocity: ScrollVelocity::new(metrics.scroll_y, now_ms),
            gate: FrameGate::new(),
            scroll_dirty: false,
            pending_pointer: None,
        }
    }

    pub fn events(&self) -> &'static [EventKind] {
        match self.mode {
            Mode::Live {
                track_pointer: true,
            } => &[EventKind::Scroll, EventKind::PointerMove],
            Mode::Live {
                track_pointer: false,
            } => &[EventKind::Scroll],
            Mode::Frozen | Mode::TornDown => &[],
        }
    }

    pub fn is_frozen(&self) -> bool {
        self.mode == Mode::Frozen
    }

    /// Record a scroll sample. Returns true when a frame must be requested.
    pub fn on_scroll(&mut self, scroll_y: f64, now_ms: f64) -> bool {
        if !matches!(self.mode, Mode::Live { .. }) {
            return false;
        }
        self.velocity.on_scroll(scroll_y, now_ms);
        self.scroll_dirty = true;
        self.gate.wake()
    }

    /// Record a pointer sample. Returns true when a frame must be requested.
    pub fn on_pointer(&mut self, sample: PointerSample) -> bool {
        if self.mode
            != (Mode::Live {
                track_pointer: true,
            })
        {
            return false;
        }
        self.pending_pointer = Some(sample);
        self.gate.wake()
    }

    /// Whether the next frame needs document metrics.
    pub fn needs_metrics(&self) -> bool {
        self.scroll_dirty
    }

    /// Apply pending samples and advance the velocity decay. `focus` maps a
    /// client-space pointer position to a [0, 1] intensity. Returns true when
    /// another frame is needed.
    pub fn frame(&mut self, metrics: Option<DocMetrics>, focus: &mut dyn FnMut(Vec2) -> f32) -> bool {
        if !matches!(self.mode, Mode::Live { .. }) {
            self.gate.settle();
            return false;
        }
        if self.scroll_dirty {
            if let Some(m) = metrics {
                let depth = scroll_depth(m.scroll_y, m.scroll_height, m.viewport_h);
                self.sink.set_var(VAR_SCROLL_DEPTH, &fmt4(depth));
            }
            self.scroll_dirty = false;
        }
        if let Some(p) = self.pending_pointer.take() {
            self.sink.set_var(VAR_MOUSE_X, &fmt4(p.u));
            self.sink.set_var(VAR_MOUSE_Y, &fmt4(p.v));
            let intensity = focus(p.position()).clamp(0.0, 1.0);
            self.sink.set_var(VAR_FOCUS_INTENSITY, &fmt4(intensity));
        }
        let activity = self.velocity.step();
        if activity.is_settled() {
            self.sink.set_var(VAR_SCROLL_VELOCITY, "0");
        } else {
            self.sink
                .set_var(VAR_SCROLL_VELOCITY, &fmt4(self.velocity.normalized()));
        }
        self.gate.after_frame(activity)
    }

    /// Stop all updates. The velocity variable returns to neutral and the
    /// tier variables are removed, so the next mount starts from the
    /// stylesheet defaults.
    pub fn teardown(&mut self) {
        if matches!(self.mode, Mode::Live { .. }) {
            self.velocity.reset();
            self.sink.set_var(VAR_SCROLL_VELOCITY, "0");
        }
        for (name, _) in std::mem::take(&mut self.tier_vars) {
            self.sink.remove_var(name);
        }
        self.gate.settle();
        self.pending_pointer = None;
        self.mode = Mode::TornDown;
        log::info!("[glass] teardown");
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::CapabilitySignals;
    use fnv::FnvHashMap;

    #[derive(Default)]
    struct MapSink {
        vars: FnvHashMap<String, String>,
        writes: usize,
    }

    impl StyleSink for MapSink {
        fn set_var(&mut self, name: &str, value: &str) {
            self.vars.insert(name.to_string(), value.to_string());
            self.writes += 1;
        }

        fn remove_var(&mut self, name: &str) {
            self.vars.remove(name);
            self.writes += 1;
        }
    }

    fn metrics(scroll_y: f64) -> DocMetrics {
        DocMetrics {
            scroll_y,
            scroll_height: 2800.0,
            viewport_h: 800.0,
        }
    }

    fn snapshot(touch: bool, reduced: bool, cores: u32) -> CapabilitySnapshot {
        CapabilitySnapshot::from_signals(CapabilitySignals {
            is_touch: touch,
            reduced_motion: reduced,
            core_count: Some(cores),
        })
    }

    #[test]
    fn reduced_motion_freezes_neutral_values() {
        let mut g = AdaptiveGlass::init(MapSink::default(), &snapshot(false, true, 8), metrics(500.0), 0.0);
        assert!(g.events().is_empty());
        let writes = g.sink().writes;
        assert!(!g.on_scroll(900.0, 16.0));
        assert!(!g.frame(Some(metrics(900.0)), &mut |_| 1.0));
        assert_eq!(g.sink().writes, writes);
        assert_eq!(g.sink().vars[VAR_SCROLL_DEPTH], "0");
        assert_eq!(g.sink().vars["--perf-backdrop"], "none");
    }

    #[test]
    fn touch_skips_pointer_listener() {
        let g = AdaptiveGlass::init(MapSink::default(), &snapshot(true, false, 8), metrics(0.0), 0.0);
        assert_eq!(g.events(), &[EventKind::Scroll]);
        assert_eq!(g.sink().vars["--perf-blur"], "10px");
    }

    #[test]
    fn scroll_wakes_once_and_decays_to_zero() {
        let mut g = AdaptiveGlass::init(MapSink::default(), &snapshot(false, false, 8), metrics(0.0), 0.0);
        assert!(g.on_scroll(200.0, 16.0));
        assert!(!g.on_scroll(400.0, 32.0));
        let mut frames = 0;
        while g.frame(Some(metrics(1000.0)), &mut |_| 0.0) {
            frames += 1;
            assert!(frames < 1_000);
        }
        assert_eq!(g.sink().vars[VAR_SCROLL_VELOCITY], "0");
        assert_eq!(g.sink().vars[VAR_SCROLL_DEPTH], "0.5000");
    }

    #[test]
    fn pointer_writes_happen_in_frame() {
        let mut g = AdaptiveGlass::init(MapSink::default(), &snapshot(false, false, 8), metrics(0.0), 0.0);
        let sample = PointerSample::from_client(250.0, 100.0, 1000.0, 800.0);
        assert!(g.on_pointer(sample));
        assert_eq!(g.sink().vars[VAR_MOUSE_X], "0.5");
        g.frame(None, &mut |_| 0.75);
        assert_eq!(g.sink().vars[VAR_MOUSE_X], "0.2500");
        assert_eq!(g.sink().vars[VAR_MOUSE_Y], "0.1250");
        assert_eq!(g.sink().vars[VAR_FOCUS_INTENSITY], "0.7500");
    }

    #[test]
    fn teardown_stops_everything() {
        let mut g = AdaptiveGlass::init(MapSink::default(), &snapshot(false, false, 8), metrics(0.0), 0.0);
        g.on_scroll(300.0, 16.0);
        g.teardown();
        assert!(g.events().is_empty());
        assert!(!g.on_scroll(600.0, 32.0));
        assert_eq!(g.sink().vars[VAR_SCROLL_VELOCITY], "0");
    }

    #[test]
    fn teardown_removes_tier_vars() {
        let mut g = AdaptiveGlass::init(MapSink::default(), &snapshot(true, false, 8), metrics(0.0), 0.0);
        assert_eq!(g.sink().vars["--perf-blur"], "10px");
        g.teardown();
        assert!(g.sink().vars.keys().all(|k| !k.starts_with("--perf-")));
        let writes = g.sink().writes;
        g.teardown();
        assert_eq!(g.sink().writes, writes);
    }
}
