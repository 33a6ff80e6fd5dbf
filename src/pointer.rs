//! Pointer-driven effects: magnetic elements, ambient cards, glow keys and
//! the custom cursor.
//!
//! Handlers read the pointer and the element rect they need, update the
//! model and wake the frame loop. Style writes only happen inside frames.

use crate::dom;
use crate::frame::{self, FrameLoop};
use crate::listener::EventListener;
use crate::Effect;
use fx_core::constants::{GLOW_MAX_DISTANCE_PX, SPRING_STAT_CARD};
use fx_core::pointer::{
    field_pull, glow_intensity, AmbientCard, CursorFollower, CursorState, MagneticElement,
    PointerThrottle,
};
use fx_core::{CapabilitySnapshot, ElementId, ElementRegistry, EventKind, SpringConfig, Variant};
use glam::Vec2;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use web_sys as web;

/// Owns the listeners and loop of one mounted pointer effect. Dropping it
/// detaches the listeners before cancelling the loop, then clears the styles
/// it wrote.
struct PointerEffect<S> {
    name: &'static str,
    _listeners: Vec<EventListener>,
    _frames: FrameLoop,
    _state: Rc<RefCell<S>>,
    _styles: dom::OwnedStyles,
}

impl<S> Effect for PointerEffect<S> {
    fn name(&self) -> &'static str {
        self.name
    }
}

fn boxed<S: 'static>(
    name: &'static str,
    listeners: Vec<EventListener>,
    frames: FrameLoop,
    state: Rc<RefCell<S>>,
    styles: dom::OwnedStyles,
) -> Option<Box<dyn Effect>> {
    if listeners.is_empty() {
        return None;
    }
    Some(Box::new(PointerEffect {
        name,
        _listeners: listeners,
        _frames: frames,
        _state: state,
        _styles: styles,
    }))
}

// ---------------- Magnetic ----------------

struct Magnet {
    el: web::HtmlElement,
    model: MagneticElement,
}

/// `[data-magnetic]` elements lean toward the pointer. `[data-stat-magnet]`
/// cards inside a `[data-stat-field]` are pulled in field-percent space
/// toward their `data-anchor`.
pub fn mount_magnetic(
    document: &web::Document,
    snapshot: &CapabilitySnapshot,
) -> anyhow::Result<Option<Box<dyn Effect>>> {
    let elements: Vec<web::HtmlElement> =
        dom::query_all(document, "[data-magnetic], [data-stat-magnet]");
    if elements.is_empty() {
        return Ok(None);
    }
    let registry: Rc<RefCell<ElementRegistry<Magnet>>> =
        Rc::new(RefCell::new(ElementRegistry::new()));

    let frames = {
        let registry = registry.clone();
        FrameLoop::new(move |tick| {
            let mut reg = registry.borrow_mut();
            let mut more = false;
            for (_, m) in reg.iter_mut() {
                if !m.model.is_running() {
                    continue;
                }
                let activity = frame::advance(&mut m.model, tick.steps);
                let o = m.model.offset();
                dom::set_style(
                    &m.el,
                    "transform",
                    &format!("translate3d({:.2}px, {:.2}px, 0)", o.x, o.y),
                );
                more |= !activity.is_settled();
            }
            more
        })
    };

    let mut listeners = Vec::new();
    for el in elements {
        let field = el.has_attribute("data-stat-magnet");
        let model = if field {
            MagneticElement::with_config(snapshot, None, SpringConfig::preset(SPRING_STAT_CARD))
        } else {
            MagneticElement::new(snapshot, dom::data_attr(&el, "data-strength"))
        };
        let events = model.events();
        if events.is_empty() {
            continue;
        }
        let host: web::Element = if field {
            match el.closest("[data-stat-field]") {
                Ok(Some(container)) => container,
                _ => {
                    log::warn!("[magnetic] stat card outside [data-stat-field]");
                    continue;
                }
            }
        } else {
            el.clone().into()
        };
        let anchor = dom::data_pair(&el, "data-anchor").map(|(x, y)| Vec2::new(x, y));
        if field && anchor.is_none() {
            log::warn!("[magnetic] stat card without data-anchor");
            continue;
        }
        let id = registry.borrow_mut().insert(Magnet { el, model });

        for &kind in events {
            let registry = registry.clone();
            let handle = frames.handle();
            let listener = match kind {
                EventKind::PointerMove => {
                    let host_rect = host.clone();
                    let mut throttle = PointerThrottle::default();
                    EventListener::on(&host, kind, move |ev| {
                        if !throttle.accept(ev.time_stamp()) {
                            return;
                        }
                        let Some(p) = dom::client_point(&ev) else {
                            return;
                        };
                        let rect = dom::rect_of(&host_rect);
                        let mut reg = registry.borrow_mut();
                        let Some(m) = reg.get_mut(id) else {
                            return;
                        };
                        let wake = match anchor {
                            Some(anchor) => match rect.filter(|r| !r.is_empty()) {
                                Some(r) => {
                                    let pct = Vec2::new(
                                        (p.x - r.left) / r.width * 100.0,
                                        (p.y - r.top) / r.height * 100.0,
                                    );
                                    m.model.pull_to(field_pull(anchor, pct))
                                }
                                None => false,
                            },
                            None => m.model.on_pointer(rect, p),
                        };
                        if wake {
                            handle.request();
                        }
                    })?
                }
                EventKind::PointerLeave => EventListener::on(&host, kind, move |_| {
                    let wake = registry
                        .borrow_mut()
                        .get_mut(id)
                        .map(|m| m.model.on_leave())
                        .unwrap_or(false);
                    if wake {
                        handle.request();
                    }
                })?,
                _ => continue,
            };
            listeners.push(listener);
        }
    }
    log::info!("[magnetic] {} elements live", registry.borrow().len());
    let styles = dom::OwnedStyles::new(
        registry.borrow().iter().map(|(_, m)| m.el.clone()).collect(),
        &["transform"],
    );
    Ok(boxed("magnetic", listeners, frames, registry, styles))
}

// ---------------- Ambient cards ----------------

struct Card {
    el: web::HtmlElement,
    model: AmbientCard,
}

#[derive(Default)]
struct CardState {
    cards: ElementRegistry<Card>,
    dirty: Vec<ElementId>,
}

/// `[data-ambient]` cards publish `--light-x`, `--light-y` (percent) and
/// `--glow-opacity` for a CSS radial highlight.
pub fn mount_ambient(
    document: &web::Document,
    snapshot: &CapabilitySnapshot,
) -> anyhow::Result<Option<Box<dyn Effect>>> {
    let elements: Vec<web::HtmlElement> = dom::query_all(document, "[data-ambient]");
    if elements.is_empty() || !Variant::for_pointer_effect(snapshot).is_live() {
        return Ok(None);
    }
    let state = Rc::new(RefCell::new(CardState::default()));
    let frames = {
        let state = state.clone();
        FrameLoop::new(move |_tick| {
            let mut st = state.borrow_mut();
            let dirty = std::mem::take(&mut st.dirty);
            for id in dirty {
                let Some(card) = st.cards.get(id) else {
                    continue;
                };
                let light = card.model.light();
                dom::set_style(&card.el, "--light-x", &format!("{:.1}%", light.x));
                dom::set_style(&card.el, "--light-y", &format!("{:.1}%", light.y));
                dom::set_style(
                    &card.el,
                    "--glow-opacity",
                    &format!("{}", card.model.glow_opacity()),
                );
            }
            false
        })
    };

    let mut listeners = Vec::new();
    for el in elements {
        let model = AmbientCard::new(snapshot);
        let events = model.events();
        let id = state.borrow_mut().cards.insert(Card {
            el: el.clone(),
            model,
        });
        for &kind in events {
            let state = state.clone();
            let handle = frames.handle();
            let el_rect = el.clone();
            let mut throttle = PointerThrottle::default();
            let listener = EventListener::on(&el, kind, move |ev| {
                let mut st = state.borrow_mut();
                let changed = match kind {
                    EventKind::PointerMove => {
                        if !throttle.accept(ev.time_stamp()) {
                            return;
                        }
                        let Some(p) = dom::client_point(&ev) else {
                            return;
                        };
                        let rect = dom::rect_of(&el_rect);
                        st.cards
                            .get_mut(id)
                            .map(|c| c.model.on_pointer(rect, p))
                            .unwrap_or(false)
                    }
                    EventKind::PointerLeave => st
                        .cards
                        .get_mut(id)
                        .map(|c| c.model.on_leave())
                        .unwrap_or(false),
                    _ => false,
                };
                if changed {
                    if !st.dirty.contains(&id) {
                        st.dirty.push(id);
                    }
                    handle.request();
                }
            })?;
            listeners.push(listener);
        }
    }
    let styles = dom::OwnedStyles::new(
        state.borrow().cards.iter().map(|(_, c)| c.el.clone()).collect(),
        &["--light-x", "--light-y", "--glow-opacity"],
    );
    Ok(boxed("ambient", listeners, frames, state, styles))
}

// ---------------- Glow keys ----------------

struct GlowKey {
    el: web::HtmlElement,
    max_distance: f32,
    last: f32,
}

#[derive(Default)]
struct GlowState {
    keys: Vec<GlowKey>,
    pointer: Option<Vec2>,
}

/// `[data-glow-key]` elements glow by pointer proximity, writing `--glow`
/// and toggling the `glowing` class.
pub fn mount_glow_keys(
    document: &web::Document,
    snapshot: &CapabilitySnapshot,
) -> anyhow::Result<Option<Box<dyn Effect>>> {
    let elements: Vec<web::HtmlElement> = dom::query_all(document, "[data-glow-key]");
    if elements.is_empty() || !Variant::for_pointer_effect(snapshot).is_live() {
        return Ok(None);
    }
    let root = document
        .document_element()
        .ok_or_else(|| anyhow::anyhow!("no document element"))?;
    let keys = elements
        .into_iter()
        .map(|el| GlowKey {
            max_distance: dom::data_attr(&el, "data-max-distance").unwrap_or(GLOW_MAX_DISTANCE_PX),
            el,
            last: 0.0,
        })
        .collect();
    let state = Rc::new(RefCell::new(GlowState {
        keys,
        pointer: None,
    }));

    let frames = {
        let state = state.clone();
        FrameLoop::new(move |_tick| {
            let mut st = state.borrow_mut();
            let pointer = st.pointer;
            // Read every rect before writing any style.
            let next: Vec<f32> = st
                .keys
                .iter()
                .map(|k| match (pointer, dom::rect_of(&k.el)) {
                    (Some(p), Some(r)) => glow_intensity(&r, p, k.max_distance),
                    _ => 0.0,
                })
                .collect();
            for (key, glow) in st.keys.iter_mut().zip(next) {
                if glow == key.last {
                    continue;
                }
                key.last = glow;
                dom::set_style(&key.el, "--glow", &format!("{glow:.3}"));
                _ = key.el.class_list().toggle_with_force("glowing", glow > 0.0);
            }
            false
        })
    };

    let mut listeners = Vec::with_capacity(2);
    {
        let state = state.clone();
        let handle = frames.handle();
        let mut throttle = PointerThrottle::default();
        listeners.push(EventListener::on(&root, EventKind::PointerMove, move |ev| {
            if !throttle.accept(ev.time_stamp()) {
                return;
            }
            if let Some(p) = dom::client_point(&ev) {
                state.borrow_mut().pointer = Some(p);
                handle.request();
            }
        })?);
    }
    {
        let state = state.clone();
        let handle = frames.handle();
        listeners.push(EventListener::on(&root, EventKind::PointerLeave, move |_| {
            state.borrow_mut().pointer = None;
            handle.request();
        })?);
    }
    let styles = dom::OwnedStyles::new(
        state.borrow().keys.iter().map(|k| k.el.clone()).collect(),
        &["--glow"],
    )
    .with_classes(&["glowing"]);
    Ok(boxed("glow-keys", listeners, frames, state, styles))
}

// ---------------- Cursor ----------------

struct CursorParts {
    dot: web::HtmlElement,
    ring: web::HtmlElement,
    model: CursorFollower,
    state_dirty: bool,
}

fn cursor_state_for(target: Option<web::EventTarget>) -> CursorState {
    let Some(el) = target.and_then(|t| t.dyn_into::<web::Element>().ok()) else {
        return CursorState::Default;
    };
    let has = |sel: &str| matches!(el.closest(sel), Ok(Some(_)));
    CursorState::infer(
        has("[data-cursor-hidden]"),
        has("[data-cursor-action]"),
        has("a, button, [role='button']"),
        has("input, textarea, [contenteditable='true']"),
    )
}

fn write_cursor_state(parts: &CursorParts) {
    let value = parts.model.state.as_str();
    _ = parts.dot.set_attribute("data-cursor-state", value);
    _ = parts.ring.set_attribute("data-cursor-state", value);
}

/// `[data-cursor-dot]` and `[data-cursor-ring]` follow the pointer on two
/// springs. The static variant just marks both hidden.
pub fn mount_cursor(
    document: &web::Document,
    snapshot: &CapabilitySnapshot,
) -> anyhow::Result<Option<Box<dyn Effect>>> {
    let dot = dom::query_all::<web::HtmlElement>(document, "[data-cursor-dot]")
        .into_iter()
        .next();
    let ring = dom::query_all::<web::HtmlElement>(document, "[data-cursor-ring]")
        .into_iter()
        .next();
    let (Some(dot), Some(ring)) = (dot, ring) else {
        return Ok(None);
    };
    let model = CursorFollower::new(snapshot);
    let events = model.events();
    let mut parts = CursorParts {
        dot,
        ring,
        model,
        state_dirty: false,
    };
    // Written on every mount so a state left by the previous variant goes.
    if events.is_empty() {
        parts.model.state = CursorState::Hidden;
    }
    write_cursor_state(&parts);
    if events.is_empty() {
        return Ok(None);
    }
    let styles =
        dom::OwnedStyles::new(vec![parts.dot.clone(), parts.ring.clone()], &["transform"]);
    let window = web::window().ok_or_else(|| anyhow::anyhow!("no window"))?;
    let state = Rc::new(RefCell::new(parts));

    let frames = {
        let state = state.clone();
        FrameLoop::new(move |tick| {
            let mut parts = state.borrow_mut();
            if std::mem::take(&mut parts.state_dirty) {
                write_cursor_state(&parts);
            }
            let activity = frame::advance(&mut parts.model, tick.steps);
            let (d, r) = (parts.model.dot(), parts.model.ring());
            dom::set_style(
                &parts.dot,
                "transform",
                &format!("translate3d({:.1}px, {:.1}px, 0) translate(-50%, -50%)", d.x, d.y),
            );
            dom::set_style(
                &parts.ring,
                "transform",
                &format!("translate3d({:.1}px, {:.1}px, 0) translate(-50%, -50%)", r.x, r.y),
            );
            !activity.is_settled()
        })
    };

    let mut listeners = Vec::with_capacity(events.len());
    for &kind in events {
        let state = state.clone();
        let handle = frames.handle();
        let listener = match kind {
            EventKind::PointerMove => {
                let mut throttle = PointerThrottle::default();
                EventListener::on(&window, kind, move |ev| {
                    if !throttle.accept(ev.time_stamp()) {
                        return;
                    }
                    let Some(p) = dom::client_point(&ev) else {
                        return;
                    };
                    if state.borrow_mut().model.on_pointer(p) {
                        handle.request();
                    }
                })?
            }
            EventKind::PointerOver => EventListener::on(document, kind, move |ev| {
                let next = cursor_state_for(ev.target());
                let mut parts = state.borrow_mut();
                if parts.model.state != next {
                    parts.model.state = next;
                    parts.state_dirty = true;
                    handle.request();
                }
            })?,
            _ => continue,
        };
        listeners.push(listener);
    }
    Ok(boxed("cursor", listeners, frames, state, styles))
}
