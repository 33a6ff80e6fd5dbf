//! SVG field-line illustrations.
//!
//! `<svg data-field data-anchors="16,28 72,22 44,68">` with two to four
//! anchors gets one `<path>` per default field line. The reduced variant draws them once; the live variant
//! tracks entrance/idle/active in `data-fx-state` and, on high-tier desktop,
//! warps the curves around the pointer.

use crate::dom;
use crate::frame::FrameLoop;
use crate::listener::EventListener;
use crate::visibility::VisibilityObserver;
use crate::Effect;
use fx_core::field::{FieldLines, Illustration};
use fx_core::pointer::PointerThrottle;
use fx_core::{CapabilitySnapshot, EventKind, Variant};
use glam::Vec2;
use std::cell::RefCell;
use std::rc::Rc;
use web_sys as web;

const SVG_NS: &str = "http://www.w3.org/2000/svg";

pub fn parse_anchors(raw: &str) -> Vec<Vec2> {
    raw.split_whitespace()
        .filter_map(dom::parse_pair)
        .map(|(x, y)| Vec2::new(x, y))
        .collect()
}

/// Make `svg` hold exactly `paths.len()` `<path class=…>` children and set
/// their `d` attributes, reusing existing nodes.
pub fn set_paths(
    document: &web::Document,
    svg: &web::Element,
    class: &str,
    paths: &[String],
) -> anyhow::Result<()> {
    let mut existing: Vec<web::Element> = dom::query_within(svg, &format!("path.{class}"));
    while existing.len() > paths.len() {
        if let Some(extra) = existing.pop() {
            extra.remove();
        }
    }
    while existing.len() < paths.len() {
        let path = document
            .create_element_ns(Some(SVG_NS), "path")
            .map_err(|e| anyhow::anyhow!("{:?}", e))?;
        _ = path.set_attribute("class", class);
        svg.append_child(&path)
            .map_err(|e| anyhow::anyhow!("{:?}", e))?;
        existing.push(path);
    }
    for (el, d) in existing.iter().zip(paths) {
        _ = el.set_attribute("d", d);
    }
    Ok(())
}

struct Field {
    svg: web::Element,
    lines: FieldLines,
    illustration: Illustration,
    pointer: Option<Vec2>,
    state_dirty: bool,
}

impl Field {
    fn draw(&self, document: &web::Document) {
        let paths: Vec<String> = self
            .lines
            .curves(self.pointer)
            .iter()
            .map(|c| c.to_svg_path())
            .collect();
        if let Err(e) = set_paths(document, &self.svg, "field-line", &paths) {
            log::warn!("[field] draw failed: {e:?}");
        }
    }

    fn write_state(&self) {
        _ = self
            .svg
            .set_attribute("data-fx-state", self.illustration.render_key());
    }
}

struct FieldEffect {
    _observer: VisibilityObserver,
    _listeners: Vec<EventListener>,
    _frames: FrameLoop,
    _state: Rc<RefCell<Vec<Field>>>,
}

impl Effect for FieldEffect {
    fn name(&self) -> &'static str {
        "field-lines"
    }
}

fn pointer_in_viewbox(svg: &web::Element, client: Vec2) -> Option<Vec2> {
    let r = dom::rect_of(svg).filter(|r| !r.is_empty())?;
    Some(Vec2::new(
        (client.x - r.left) / r.width * 100.0,
        (client.y - r.top) / r.height * 100.0,
    ))
}

pub fn mount(
    document: &web::Document,
    snapshot: &CapabilitySnapshot,
) -> anyhow::Result<Option<Box<dyn Effect>>> {
    let distort = FieldLines::distortion_enabled(snapshot);
    let mut fields = Vec::new();
    for svg in dom::query_all::<web::Element>(document, "svg[data-field]") {
        let anchors = svg
            .get_attribute("data-anchors")
            .map(|a| parse_anchors(&a))
            .unwrap_or_default();
        let lines = match FieldLines::with_default_lines(&anchors, distort) {
            Ok(lines) => lines,
            Err(e) => {
                log::warn!("[field] skipping svg: {e}");
                continue;
            }
        };
        let field = Field {
            svg,
            lines,
            illustration: Illustration::new(snapshot),
            pointer: None,
            state_dirty: false,
        };
        field.draw(document);
        field.write_state();
        fields.push(field);
    }
    let live = Variant::for_motion_effect(snapshot).is_live();
    if fields.is_empty() || !live {
        return Ok(None);
    }

    let state = Rc::new(RefCell::new(fields));
    let frames = {
        let state = state.clone();
        let document = document.clone();
        FrameLoop::new(move |_tick| {
            for field in state.borrow_mut().iter_mut() {
                if std::mem::take(&mut field.state_dirty) {
                    field.write_state();
                    field.draw(&document);
                }
            }
            false
        })
    };

    let observer = {
        let state = state.clone();
        let handle = frames.handle();
        VisibilityObserver::new("0px", move |target, _time| {
            let target: &web::Node = target;
            let mut fields = state.borrow_mut();
            if let Some(f) = fields.iter_mut().find(|f| f.svg.is_same_node(Some(target))) {
                f.illustration.entered();
                f.state_dirty = true;
                handle.request();
            }
        })?
    };

    let mut listeners = Vec::new();
    let svgs: Vec<web::Element> = state.borrow().iter().map(|f| f.svg.clone()).collect();
    for (index, svg) in svgs.into_iter().enumerate() {
        observer.observe(&svg);
        if !snapshot.allows_pointer_tracking() {
            continue;
        }
        {
            let state = state.clone();
            let handle = frames.handle();
            let host = svg.clone();
            let mut throttle = PointerThrottle::default();
            listeners.push(EventListener::on(&svg, EventKind::PointerMove, move |ev| {
                if !throttle.accept(ev.time_stamp()) {
                    return;
                }
                let mut fields = state.borrow_mut();
                let Some(f) = fields.get_mut(index) else {
                    return;
                };
                f.illustration.set_active(true);
                if distort {
                    f.pointer = dom::client_point(&ev).and_then(|p| pointer_in_viewbox(&host, p));
                }
                f.state_dirty = true;
                handle.request();
            })?);
        }
        {
            let state = state.clone();
            let handle = frames.handle();
            listeners.push(EventListener::on(&svg, EventKind::PointerLeave, move |_| {
                if let Some(f) = state.borrow_mut().get_mut(index) {
                    f.illustration.set_active(false);
                    f.pointer = None;
                    f.state_dirty = true;
                    handle.request();
                }
            })?);
        }
    }

    Ok(Some(Box::new(FieldEffect {
        _observer: observer,
        _listeners: listeners,
        _frames: frames,
        _state: state,
    })))
}
