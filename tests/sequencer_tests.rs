// Host-side tests for the visibility-triggered sequencers.

use fx_core::counter::Counter;
use fx_core::reveal::{secondary_delay, stagger_delays, ActivationWave, StaggeredReveal, WavePhase, WaveTiming};
use fx_core::{CapabilitySignals, CapabilitySnapshot, ElementRegistry};
use glam::Vec2;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn desktop() -> CapabilitySnapshot {
    CapabilitySnapshot::from_signals(CapabilitySignals {
        is_touch: false,
        reduced_motion: false,
        core_count: Some(8),
    })
}

fn reduced() -> CapabilitySnapshot {
    CapabilitySnapshot::from_signals(CapabilitySignals {
        is_touch: false,
        reduced_motion: true,
        core_count: Some(8),
    })
}

#[test]
fn counter_lands_exactly_on_end() {
    let mut c = Counter::new(&desktop(), 500.0, Some(2500.0), 0);
    assert_eq!(c.sample(0.0), 0.0);
    assert!(c.trigger(1_000.0));
    let mut prev = 0.0;
    for step in 0..=100 {
        let t = step as f64 * 25.0;
        let v = c.sample(1_000.0 + t);
        assert!(v <= 510.0, "overshoot too large at {t}: {v}");
        // Rising phase ends at the overshoot peak.
        if t <= 2_300.0 {
            assert!(v >= prev, "decreased at {t}: {prev} -> {v}");
        }
        prev = v;
    }
    assert_eq!(c.sample(3_500.0), 500.0);
    assert!(c.is_done());
    assert_eq!(c.sample(9_000.0), 500.0);
}

#[test]
fn counter_triggers_once() {
    let mut c = Counter::new(&desktop(), 42.5, None, 1);
    assert!(c.trigger(0.0));
    assert!(!c.trigger(500.0));
    let v = c.sample(2_400.0);
    assert_eq!(c.format(v), "42.5");
}

#[test]
fn oversized_decimals_still_count_to_a_finite_value() {
    let mut c = Counter::new(&desktop(), 500.0, Some(2500.0), 400);
    assert!(c.trigger(0.0));
    let mid = c.sample(1_250.0);
    assert!(mid.is_finite() && mid > 0.0 && mid < 510.0);
    let v = c.sample(2_500.0);
    assert_eq!(c.format(v), "500.000000");
}

#[test]
fn reduced_counter_shows_end_immediately() {
    let mut c = Counter::new(&reduced(), 1200.0, Some(2500.0), 0);
    assert!(!c.trigger(0.0));
    assert!(c.is_done());
    assert_eq!(c.sample(0.0), 1200.0);
}

fn three_anchors() -> (ElementRegistry<&'static str>, Vec<(fx_core::ElementId, Vec2)>) {
    let mut reg = ElementRegistry::new();
    let far = reg.insert("far");
    let near = reg.insert("near");
    let mid = reg.insert("mid");
    let positions = vec![
        (far, Vec2::new(100.0, 0.0)),
        (near, Vec2::new(10.0, 0.0)),
        (mid, Vec2::new(0.0, 50.0)),
    ];
    (reg, positions)
}

#[test]
fn wave_activates_nearest_first() {
    let (reg, positions) = three_anchors();
    let mut wave = ActivationWave::new(&desktop(), Vec2::ZERO, &positions);
    assert_eq!(wave.phase(), WavePhase::Dormant);
    assert!(wave.advance(5_000.0).is_empty());
    assert!(wave.start(0.0));
    assert!(!wave.start(10.0));

    let order: Vec<&str> = wave.schedule().iter().map(|(id, _)| reg.get(*id).copied().unwrap()).collect();
    assert_eq!(order, ["near", "mid", "far"]);

    // Delays: 0.1 -> 305ms, 0.5 -> 725ms, 1.0 -> 1250ms.
    assert_eq!(wave.advance(310.0).len(), 1);
    assert_eq!(wave.phase(), WavePhase::Activating);
    assert_eq!(wave.advance(730.0).len(), 1);
    assert!(wave.advance(1_000.0).is_empty());
    assert_eq!(wave.advance(1_260.0).len(), 1);
    assert_eq!(wave.activated().len(), 3);
    assert!(!wave.is_complete());
    wave.advance(2_200.0);
    assert_eq!(wave.phase(), WavePhase::Live);
    assert!(wave.is_complete());
}

#[test]
fn wave_failsafe_forces_stragglers() {
    let (_, positions) = three_anchors();
    let timing = WaveTiming {
        duration_ms: 10_000.0,
        ..WaveTiming::default()
    };
    let mut wave = ActivationWave::with_timing(&desktop(), Vec2::ZERO, &positions, timing);
    wave.start(0.0);
    wave.advance(2_999.0);
    assert!(wave.activated().len() < 3);
    wave.advance(3_000.0);
    assert_eq!(wave.activated().len(), 3);
}

#[test]
fn reduced_wave_is_live_at_once() {
    let (_, positions) = three_anchors();
    let mut wave = ActivationWave::new(&reduced(), Vec2::ZERO, &positions);
    assert!(!wave.start(0.0));
    assert_eq!(wave.phase(), WavePhase::Live);
    assert_eq!(wave.activated().len(), 3);
    assert!(wave.is_complete());
}

#[test]
fn stagger_delays_have_a_floor_and_settle_into_order() {
    let mut rng = StdRng::seed_from_u64(7);
    let delays = stagger_delays(12, &mut rng);
    assert_eq!(delays.len(), 12);
    assert!(delays.iter().all(|d| *d >= 0.15));
    // The jitter term vanishes toward the end of the list.
    assert!(delays[11] > delays[0]);
    let s = secondary_delay(0.5, &mut rng);
    assert!((0.7..1.0).contains(&s));
}

#[test]
fn staggered_reveal_shows_by_delay() {
    let mut reveal = StaggeredReveal::from_delays(&desktop(), &[0.2, 0.5, 0.3]);
    assert!(reveal.advance(10_000.0).is_empty());
    assert!(reveal.trigger(1_000.0));
    assert_eq!(reveal.advance(1_250.0).as_slice(), &[0]);
    assert_eq!(reveal.advance(1_350.0).as_slice(), &[2]);
    assert!(!reveal.is_complete());
    assert_eq!(reveal.advance(1_500.0).as_slice(), &[1]);
    assert!(reveal.is_complete());
}

#[test]
fn reduced_reveal_shows_everything_on_trigger() {
    let mut rng = StdRng::seed_from_u64(1);
    let mut reveal = StaggeredReveal::new(&reduced(), 4, &mut rng);
    assert!(!reveal.trigger(0.0));
    assert!((0..4).all(|i| reveal.is_shown(i)));
    assert!(reveal.is_complete());
}
