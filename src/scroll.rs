//! Scroll-linked effects. Scroll handlers only mark state dirty or feed a
//! velocity sample; rects are read and styles written in the next frame.

use crate::dom;
use crate::frame::{self, FrameLoop};
use crate::listener::EventListener;
use crate::Effect;
use fx_core::constants::{SKEW_MAX_DEG, STRETCH_MAX};
use fx_core::scroll::{Keyframes, ParallaxTrack, ScrollOffset, ScrollVisual, VelocitySkew};
use fx_core::CapabilitySnapshot;
use std::cell::RefCell;
use std::rc::Rc;
use web_sys as web;

struct ScrollEffect<S> {
    name: &'static str,
    _listeners: Vec<EventListener>,
    _frames: FrameLoop,
    _state: Rc<RefCell<S>>,
    _styles: dom::OwnedStyles,
}

impl<S> Effect for ScrollEffect<S> {
    fn name(&self) -> &'static str {
        self.name
    }
}

// ---------------- Parallax ----------------

struct ParallaxItem {
    el: web::HtmlElement,
    track: ParallaxTrack,
}

fn parallax_track(el: &web::Element, snapshot: &CapabilitySnapshot) -> ParallaxTrack {
    let offset = match el.get_attribute("data-parallax-offset").as_deref() {
        Some("hero") => ScrollOffset::StartStartToEndStart,
        _ => ScrollOffset::StartEndToEndStart,
    };
    let mut track = if el.has_attribute("data-parallax-header") {
        let amplitude = dom::data_attr(el, "data-parallax-header").unwrap_or(40.0);
        ParallaxTrack::header(snapshot, amplitude)
    } else {
        ParallaxTrack::new(snapshot, offset)
    };
    track.offset = offset;
    if let Some((from, to)) = dom::data_pair(el, "data-parallax") {
        track.translate_y = Some(Keyframes::linear(from, to));
    }
    if let Some((from, to)) = dom::data_pair(el, "data-parallax-scale") {
        track.scale = Some(Keyframes::linear(from, to));
    }
    if let Some((from, to)) = dom::data_pair(el, "data-parallax-blur") {
        track.blur = Some(Keyframes::linear(from, to));
    }
    if el.has_attribute("data-parallax-fade") && track.opacity.is_none() {
        track.opacity = Keyframes::new(&[0.0, 0.2, 0.8, 1.0], &[0.0, 1.0, 1.0, 0.0]).ok();
    }
    track
}

fn write_visual(el: &web::HtmlElement, v: &ScrollVisual) {
    dom::set_style(
        el,
        "transform",
        &format!("translate3d(0, {:.2}px, 0) scale({:.4})", v.translate_y, v.scale),
    );
    dom::set_style(el, "opacity", &format!("{:.3}", v.opacity));
    if v.blur_px > 0.0 {
        dom::set_style(el, "filter", &format!("blur({:.2}px)", v.blur_px));
    } else {
        _ = el.style().remove_property("filter");
    }
}

/// `[data-parallax="from,to"]` elements, with optional
/// `data-parallax-offset="hero"`, `data-parallax-scale`, `data-parallax-blur`,
/// `data-parallax-fade` and `data-parallax-header="amplitude"`.
pub fn mount_parallax(
    document: &web::Document,
    snapshot: &CapabilitySnapshot,
) -> anyhow::Result<Option<Box<dyn Effect>>> {
    let elements: Vec<web::HtmlElement> = dom::query_all(
        document,
        "[data-parallax], [data-parallax-header]",
    );
    let items: Vec<ParallaxItem> = elements
        .into_iter()
        .map(|el| ParallaxItem {
            track: parallax_track(&el, snapshot),
            el,
        })
        .collect();
    let Some(events) = items.first().map(|i| i.track.events()) else {
        return Ok(None);
    };
    if events.is_empty() {
        return Ok(None);
    }
    let window = web::window().ok_or_else(|| anyhow::anyhow!("no window"))?;
    let state = Rc::new(RefCell::new(items));

    let frames = {
        let state = state.clone();
        let window = window.clone();
        FrameLoop::new(move |_tick| {
            let mut items = state.borrow_mut();
            let vh = dom::viewport_size(&window).y;
            // Read phase.
            let rects: Vec<_> = items.iter().map(|i| dom::rect_of(&i.el)).collect();
            // Write phase.
            for (item, rect) in items.iter_mut().zip(rects) {
                let Some(r) = rect else {
                    continue;
                };
                if let Some(visual) = item.track.update(r.top, r.height, vh) {
                    write_visual(&item.el, &visual);
                }
            }
            false
        })
    };
    frames.request();

    let mut listeners = Vec::with_capacity(events.len());
    for &kind in events {
        let handle = frames.handle();
        listeners.push(EventListener::on(&window, kind, move |_| handle.request())?);
    }
    log::info!("[parallax] {} elements", state.borrow().len());
    let styles = dom::OwnedStyles::new(
        state.borrow().iter().map(|i| i.el.clone()).collect(),
        &["transform", "opacity", "filter"],
    );
    Ok(Some(Box::new(ScrollEffect {
        name: "parallax",
        _listeners: listeners,
        _frames: frames,
        _state: state,
        _styles: styles,
    })))
}

// ---------------- Velocity text ----------------

struct SkewItem {
    el: web::HtmlElement,
    model: VelocitySkew,
}

/// `[data-velocity-text]` headlines skew and stretch with scroll speed.
pub fn mount_velocity_text(
    document: &web::Document,
    snapshot: &CapabilitySnapshot,
) -> anyhow::Result<Option<Box<dyn Effect>>> {
    let window = web::window().ok_or_else(|| anyhow::anyhow!("no window"))?;
    let scroll_y = window.scroll_y().unwrap_or(0.0);
    let items: Vec<SkewItem> = dom::query_all::<web::HtmlElement>(document, "[data-velocity-text]")
        .into_iter()
        .map(|el| SkewItem {
            model: VelocitySkew::with_limits(
                snapshot,
                scroll_y,
                dom::data_attr(&el, "data-max-skew").unwrap_or(SKEW_MAX_DEG),
                dom::data_attr(&el, "data-max-scale").unwrap_or(STRETCH_MAX),
            ),
            el,
        })
        .collect();
    let Some(events) = items.first().map(|i| i.model.events()) else {
        return Ok(None);
    };
    if events.is_empty() {
        return Ok(None);
    }
    let state = Rc::new(RefCell::new(items));

    let frames = {
        let state = state.clone();
        FrameLoop::new(move |tick| {
            let mut items = state.borrow_mut();
            let mut more = false;
            for item in items.iter_mut() {
                let activity = frame::advance(&mut item.model, tick.steps);
                dom::set_style(
                    &item.el,
                    "transform",
                    &format!(
                        "skewX({:.2}deg) scaleX({:.4})",
                        item.model.skew_deg(),
                        item.model.scale_x()
                    ),
                );
                more |= !activity.is_settled();
            }
            more
        })
    };

    let mut listeners = Vec::with_capacity(events.len());
    for &kind in events {
        let state = state.clone();
        let handle = frames.handle();
        let w = window.clone();
        listeners.push(EventListener::on(&window, kind, move |_| {
            let y = w.scroll_y().unwrap_or(0.0);
            let mut wake = false;
            for item in state.borrow_mut().iter_mut() {
                wake |= item.model.on_scroll(y);
            }
            if wake {
                handle.request();
            }
        })?);
    }
    let styles = dom::OwnedStyles::new(
        state.borrow().iter().map(|i| i.el.clone()).collect(),
        &["transform"],
    );
    Ok(Some(Box::new(ScrollEffect {
        name: "velocity-text",
        _listeners: listeners,
        _frames: frames,
        _state: state,
        _styles: styles,
    })))
}

