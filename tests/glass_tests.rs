// Host-side tests for the adaptive glass publisher.

use fx_core::glass::{
    tier_vars, AdaptiveGlass, DocMetrics, StyleSink, VAR_FOCUS_INTENSITY, VAR_MOUSE_X,
    VAR_SCROLL_DEPTH, VAR_SCROLL_VELOCITY,
};
use fx_core::pointer::PointerSample;
use fx_core::{CapabilitySignals, CapabilitySnapshot, EventKind, Tier};
use std::collections::HashMap;

#[derive(Default)]
struct RecordingSink {
    vars: HashMap<String, String>,
    log: Vec<(String, String)>,
}

impl StyleSink for RecordingSink {
    fn set_var(&mut self, name: &str, value: &str) {
        self.vars.insert(name.to_owned(), value.to_owned());
        self.log.push((name.to_owned(), value.to_owned()));
    }

    fn remove_var(&mut self, name: &str) {
        self.vars.remove(name);
        self.log.push((name.to_owned(), String::new()));
    }
}

fn snapshot(is_touch: bool, cores: u32) -> CapabilitySnapshot {
    CapabilitySnapshot::from_signals(CapabilitySignals {
        is_touch,
        reduced_motion: false,
        core_count: Some(cores),
    })
}

fn reduced(cores: u32) -> CapabilitySnapshot {
    CapabilitySnapshot::from_signals(CapabilitySignals {
        is_touch: false,
        reduced_motion: true,
        core_count: Some(cores),
    })
}

fn metrics(scroll_y: f64) -> DocMetrics {
    DocMetrics {
        scroll_y,
        scroll_height: 3_000.0,
        viewport_h: 1_000.0,
    }
}

#[test]
fn high_tier_writes_no_perf_vars() {
    assert!(tier_vars(Tier::High).is_empty());
    let g = AdaptiveGlass::init(RecordingSink::default(), &snapshot(false, 8), metrics(0.0), 0.0);
    assert!(g.sink().log.iter().all(|(name, _)| !name.starts_with("--perf-")));
    assert_eq!(g.events(), &[EventKind::Scroll, EventKind::PointerMove]);
}

#[test]
fn low_tier_disables_blur() {
    let g = AdaptiveGlass::init(RecordingSink::default(), &snapshot(false, 2), metrics(0.0), 0.0);
    assert_eq!(g.sink().vars["--perf-blur"], "0px");
    assert_eq!(g.sink().vars["--perf-glass-bg"], "rgba(5, 20, 45, 0.88)");
}

#[test]
fn scroll_session_publishes_depth_then_rests_at_zero() {
    let mut g = AdaptiveGlass::init(RecordingSink::default(), &snapshot(false, 8), metrics(0.0), 0.0);
    assert!(g.on_scroll(120.0, 16.0));
    assert!(g.needs_metrics());
    let mut frames = 0;
    let mut peak = 0.0f32;
    while g.frame(Some(metrics(1_500.0)), &mut |_| 0.0) {
        let v: f32 = g.sink().vars[VAR_SCROLL_VELOCITY].parse().unwrap();
        peak = peak.max(v);
        frames += 1;
        assert!(frames < 1_000);
    }
    assert!(peak > 0.0 && peak <= 1.0);
    assert_eq!(g.sink().vars[VAR_SCROLL_DEPTH], "0.7500");
    assert_eq!(g.sink().vars[VAR_SCROLL_VELOCITY], "0");
    // At rest, a new sample wakes it again.
    assert!(g.on_scroll(1_600.0, 5_000.0));
}

#[test]
fn touch_ignores_pointer_samples() {
    let mut g = AdaptiveGlass::init(RecordingSink::default(), &snapshot(true, 8), metrics(0.0), 0.0);
    assert!(!g.on_pointer(PointerSample::from_client(10.0, 10.0, 100.0, 100.0)));
    g.frame(None, &mut |_| 1.0);
    assert_eq!(g.sink().vars[VAR_MOUSE_X], "0.5");
    assert_eq!(g.sink().vars[VAR_FOCUS_INTENSITY], "0");
}

#[test]
fn teardown_is_final() {
    let mut g = AdaptiveGlass::init(RecordingSink::default(), &snapshot(false, 8), metrics(0.0), 0.0);
    g.on_scroll(500.0, 16.0);
    g.frame(Some(metrics(500.0)), &mut |_| 0.0);
    g.teardown();
    assert_eq!(g.sink().vars[VAR_SCROLL_VELOCITY], "0");
    let writes = g.sink().log.len();
    assert!(!g.on_scroll(900.0, 32.0));
    assert!(!g.frame(Some(metrics(900.0)), &mut |_| 0.0));
    assert_eq!(g.sink().log.len(), writes);
    assert!(g.events().is_empty());
}

#[test]
fn remount_from_low_to_high_restores_stylesheet_defaults() {
    let mut low = AdaptiveGlass::init(RecordingSink::default(), &reduced(8), metrics(0.0), 0.0);
    assert_eq!(low.sink().vars["--perf-blur"], "0px");
    assert_eq!(low.sink().vars["--perf-backdrop"], "none");
    low.teardown();
    let sink = low.into_sink();

    let high = AdaptiveGlass::init(sink, &snapshot(false, 8), metrics(0.0), 0.0);
    for (name, _) in tier_vars(Tier::Low) {
        assert!(!high.sink().vars.contains_key(*name), "{name} left behind");
    }
    assert_eq!(high.sink().vars[VAR_SCROLL_VELOCITY], "0");
}

#[test]
fn remount_from_mid_to_low_overwrites_every_perf_var() {
    let mut mid = AdaptiveGlass::init(RecordingSink::default(), &snapshot(true, 8), metrics(0.0), 0.0);
    mid.teardown();
    let low = AdaptiveGlass::init(mid.into_sink(), &snapshot(false, 2), metrics(0.0), 0.0);
    assert_eq!(low.sink().vars["--perf-blur"], "0px");
    assert_eq!(low.sink().vars["--perf-glass-bg"], "rgba(5, 20, 45, 0.88)");
}
