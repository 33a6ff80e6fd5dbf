//! Visibility-triggered sequencers: counters, activation waves and staggered
//! reveals. Each host is armed once by the observer and then advanced with
//! the frame timestamp until it completes.

use crate::dom;
use crate::field_lines::{parse_anchors, set_paths};
use crate::frame::FrameLoop;
use crate::visibility::VisibilityObserver;
use crate::Effect;
use fx_core::counter::Counter;
use fx_core::field::circuit_traces;
use fx_core::reveal::{secondary_delay, stagger_delays, ActivationWave, StaggeredReveal};
use fx_core::{CapabilitySnapshot, ElementId, ElementRegistry};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::cell::RefCell;
use std::rc::Rc;
use web_sys as web;

const VIEW_MARGIN: &str = "-100px";

struct CounterHost {
    el: web::HtmlElement,
    counter: Counter,
    prefix: String,
    suffix: String,
}

impl CounterHost {
    fn write(&self, value: f64) {
        let text = format!("{}{}{}", self.prefix, self.counter.format(value), self.suffix);
        self.el.set_text_content(Some(&text));
    }
}

struct WaveHost {
    container: web::Element,
    anchors: ElementRegistry<web::Element>,
    /// Anchor ids in DOM order, matching the circuit's `data-anchors`.
    order: Vec<ElementId>,
    wave: Option<ActivationWave>,
    snapshot: CapabilitySnapshot,
    phase_written: Option<&'static str>,
}

impl WaveHost {
    /// Build the schedule from geometry read at trigger time.
    fn arm(&mut self, now_ms: f64) {
        let Some(center) = dom::rect_of(&self.container).map(|r| r.center()) else {
            return;
        };
        let positions: Vec<_> = self
            .anchors
            .iter()
            .filter_map(|(id, el)| dom::rect_of(el).map(|r| (id, r.center())))
            .collect();
        let mut wave = ActivationWave::new(&self.snapshot, center, &positions);
        wave.start(now_ms);
        self.wave = Some(wave);
    }

    fn write_traces(&self, document: &web::Document, wave: &ActivationWave) {
        let Ok(Some(svg)) = self.container.query_selector("svg[data-circuit]") else {
            return;
        };
        let points = svg
            .get_attribute("data-anchors")
            .map(|a| parse_anchors(&a))
            .unwrap_or_default();
        let active: Vec<bool> = self.order.iter().map(|id| wave.is_activated(*id)).collect();
        let traces = circuit_traces(&points, &active);
        if let Err(e) = set_paths(document, &svg, "circuit-trace", &traces) {
            log::warn!("[wave] traces: {e:?}");
        }
    }

    /// Returns true once the wave is complete.
    fn frame(&mut self, document: &web::Document, now_ms: f64) -> bool {
        let Some(mut wave) = self.wave.take() else {
            return true;
        };
        let fresh = wave.advance(now_ms);
        for id in &fresh {
            if let Some(el) = self.anchors.get(*id) {
                _ = el.class_list().add_1("activated");
            }
        }
        // Reduced motion activates everything inside `start`.
        let first_frame = self.phase_written.is_none();
        if !fresh.is_empty() || first_frame {
            if first_frame {
                for (id, el) in self.anchors.iter() {
                    if wave.is_activated(id) {
                        _ = el.class_list().add_1("activated");
                    }
                }
            }
            self.write_traces(document, &wave);
        }
        let phase = wave.phase().as_str();
        if self.phase_written != Some(phase) {
            _ = self.container.set_attribute("data-wave-phase", phase);
            self.phase_written = Some(phase);
        }
        let done = wave.is_complete();
        self.wave = Some(wave);
        done
    }
}

struct RevealHost {
    items: Vec<web::Element>,
    reveal: StaggeredReveal,
    painted: bool,
}

enum Sequence {
    Counter(CounterHost),
    Wave(WaveHost),
    Reveal(RevealHost),
}

#[derive(Default)]
struct SeqState {
    hosts: ElementRegistry<Sequence>,
    targets: Vec<(web::Element, ElementId)>,
    running: Vec<ElementId>,
}

impl SeqState {
    fn id_for(&self, target: &web::Node) -> Option<ElementId> {
        self.targets
            .iter()
            .find(|(el, _)| el.is_same_node(Some(target)))
            .map(|(_, id)| *id)
    }
}

struct SequencerEffect {
    _observer: VisibilityObserver,
    _frames: FrameLoop,
    _state: Rc<RefCell<SeqState>>,
}

impl Effect for SequencerEffect {
    fn name(&self) -> &'static str {
        "sequencers"
    }
}

fn trigger(seq: &mut Sequence, now_ms: f64) {
    match seq {
        Sequence::Counter(c) => {
            c.counter.trigger(now_ms);
        }
        Sequence::Wave(w) => w.arm(now_ms),
        Sequence::Reveal(r) => {
            r.reveal.trigger(now_ms);
        }
    }
}

/// Advance one host; true when it has nothing left to do.
fn advance(seq: &mut Sequence, document: &web::Document, now_ms: f64) -> bool {
    match seq {
        Sequence::Counter(c) => {
            let value = c.counter.sample(now_ms);
            c.write(value);
            c.counter.is_done()
        }
        Sequence::Wave(w) => w.frame(document, now_ms),
        Sequence::Reveal(r) => {
            let fresh = r.reveal.advance(now_ms);
            for (i, el) in r.items.iter().enumerate() {
                // Reduced motion shows everything inside `trigger`.
                let pending = !r.painted && r.reveal.is_shown(i);
                if pending || fresh.contains(&i) {
                    _ = el.class_list().add_1("revealed");
                }
            }
            r.painted = true;
            r.reveal.is_complete()
        }
    }
}

fn collect_counters(
    document: &web::Document,
    snapshot: &CapabilitySnapshot,
) -> Vec<(web::Element, Sequence)> {
    dom::query_all::<web::HtmlElement>(document, "[data-counter]")
        .into_iter()
        .filter_map(|el| {
            let end: f64 = dom::data_attr(&el, "data-end")?;
            let counter = Counter::new(
                snapshot,
                end,
                dom::data_attr(&el, "data-duration"),
                dom::data_attr(&el, "data-decimals").unwrap_or(0),
            );
            let host = CounterHost {
                prefix: el.get_attribute("data-prefix").unwrap_or_default(),
                suffix: el.get_attribute("data-suffix").unwrap_or_default(),
                el: el.clone(),
                counter,
            };
            host.write(0.0);
            Some((el.into(), Sequence::Counter(host)))
        })
        .collect()
}

fn collect_waves(
    document: &web::Document,
    snapshot: &CapabilitySnapshot,
) -> Vec<(web::Element, Sequence)> {
    dom::query_all::<web::Element>(document, "[data-wave]")
        .into_iter()
        .filter_map(|container| {
            let mut anchors = ElementRegistry::new();
            let order: Vec<ElementId> =
                dom::query_within::<web::Element>(&container, "[data-wave-anchor]")
                    .into_iter()
                    .map(|el| anchors.insert(el))
                    .collect();
            if order.is_empty() {
                return None;
            }
            _ = container.set_attribute("data-wave-phase", "dormant");
            let host = WaveHost {
                container: container.clone(),
                anchors,
                order,
                wave: None,
                snapshot: *snapshot,
                phase_written: None,
            };
            Some((container, Sequence::Wave(host)))
        })
        .collect()
}

fn collect_reveals(
    document: &web::Document,
    snapshot: &CapabilitySnapshot,
    rng: &mut StdRng,
) -> Vec<(web::Element, Sequence)> {
    dom::query_all::<web::Element>(document, "[data-reveal]")
        .into_iter()
        .filter_map(|container| {
            let primaries: Vec<web::Element> =
                dom::query_within(&container, "[data-reveal-item]");
            if primaries.is_empty() {
                return None;
            }
            let base = stagger_delays(primaries.len(), rng);
            let mut items = Vec::with_capacity(primaries.len());
            let mut delays = Vec::with_capacity(primaries.len());
            for (el, delay) in primaries.into_iter().zip(base) {
                let secondaries: Vec<web::Element> =
                    dom::query_within(&el, "[data-reveal-secondary]");
                items.push(el);
                delays.push(delay);
                for child in secondaries {
                    items.push(child);
                    delays.push(secondary_delay(delay, rng));
                }
            }
            let reveal = StaggeredReveal::from_delays(snapshot, &delays);
            Some((container, Sequence::Reveal(RevealHost {
                items,
                reveal,
                painted: false,
            })))
        })
        .collect()
}

pub fn mount(
    document: &web::Document,
    snapshot: &CapabilitySnapshot,
) -> anyhow::Result<Option<Box<dyn Effect>>> {
    let mut rng = StdRng::from_entropy();
    let mut found = collect_counters(document, snapshot);
    found.extend(collect_waves(document, snapshot));
    found.extend(collect_reveals(document, snapshot, &mut rng));
    if found.is_empty() {
        return Ok(None);
    }

    let mut state = SeqState::default();
    for (el, seq) in found {
        let id = state.hosts.insert(seq);
        state.targets.push((el, id));
    }
    log::info!("[sequencers] {} hosts", state.hosts.len());
    let state = Rc::new(RefCell::new(state));

    let frames = {
        let state = state.clone();
        let document = document.clone();
        FrameLoop::new(move |tick| {
            let mut st = state.borrow_mut();
            let SeqState { hosts, running, .. } = &mut *st;
            running.retain(|id| match hosts.get_mut(*id) {
                Some(seq) => !advance(seq, &document, tick.now_ms),
                None => false,
            });
            !running.is_empty()
        })
    };

    let observer = {
        let state = state.clone();
        let handle = frames.handle();
        VisibilityObserver::new(VIEW_MARGIN, move |target, time| {
            let target: &web::Node = target;
            let mut st = state.borrow_mut();
            let Some(id) = st.id_for(target) else {
                return;
            };
            let SeqState { hosts, running, .. } = &mut *st;
            if running.contains(&id) {
                return;
            }
            if let Some(seq) = hosts.get_mut(id) {
                trigger(seq, time);
                running.push(id);
                handle.request();
            }
        })?
    };
    for (el, _) in &state.borrow().targets {
        observer.observe(el);
    }

    Ok(Some(Box::new(SequencerEffect {
        _observer: observer,
        _frames: frames,
        _state: state,
    })))
}
