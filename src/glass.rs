use crate::dom::{self, RootStyle};
use crate::frame::FrameLoop;
use crate::listener::EventListener;
use crate::Effect;
use fx_core::constants::FOCUS_MAX_DISTANCE_PX;
use fx_core::glass::{AdaptiveGlass, DocMetrics};
use fx_core::pointer::{proximity_to_rect, PointerSample, PointerThrottle};
use fx_core::{CapabilitySnapshot, EventKind};
use glam::Vec2;
use std::cell::RefCell;
use std::rc::Rc;
use web_sys as web;

pub struct GlassEffect {
    state: Rc<RefCell<AdaptiveGlass<RootStyle>>>,
    _listeners: Vec<EventListener>,
    frames: FrameLoop,
}

impl Effect for GlassEffect {
    fn name(&self) -> &'static str {
        "glass"
    }
}

impl Drop for GlassEffect {
    fn drop(&mut self) {
        self.frames.cancel();
        self.state.borrow_mut().teardown();
    }
}

fn focus_intensity(targets: &[web::Element], pointer: Vec2) -> f32 {
    targets
        .iter()
        .filter_map(dom::rect_of)
        .filter(|r| !r.is_empty())
        .map(|r| proximity_to_rect(&r, pointer, FOCUS_MAX_DISTANCE_PX))
        .fold(0.0, f32::max)
}

pub fn mount(
    document: &web::Document,
    snapshot: &CapabilitySnapshot,
) -> anyhow::Result<Option<Box<dyn Effect>>> {
    let window = web::window().ok_or_else(|| anyhow::anyhow!("no window"))?;
    let sink = RootStyle::from_document(document)
        .ok_or_else(|| anyhow::anyhow!("no <html> element"))?;
    let metrics = dom::doc_metrics(&window, document).unwrap_or(DocMetrics {
        scroll_y: 0.0,
        scroll_height: 0.0,
        viewport_h: 0.0,
    });
    let glass = AdaptiveGlass::init(sink, snapshot, metrics, dom::now_ms(&window));
    let events = glass.events();
    let state = Rc::new(RefCell::new(glass));

    let focus_targets: Vec<web::Element> = dom::query_all(document, "[data-focus]");
    let frames = {
        let state = state.clone();
        let window = window.clone();
        let document = document.clone();
        FrameLoop::new(move |_tick| {
            let mut glass = state.borrow_mut();
            let metrics = if glass.needs_metrics() {
                dom::doc_metrics(&window, &document)
            } else {
                None
            };
            glass.frame(metrics, &mut |p| focus_intensity(&focus_targets, p))
        })
    };

    let mut listeners = Vec::with_capacity(events.len());
    for &kind in events {
        let state = state.clone();
        let handle = frames.handle();
        let listener = match kind {
            EventKind::Scroll => {
                let w = window.clone();
                EventListener::on(&window, kind, move |ev| {
                    let y = w.scroll_y().unwrap_or(0.0);
                    if state.borrow_mut().on_scroll(y, ev.time_stamp()) {
                        handle.request();
                    }
                })?
            }
            EventKind::PointerMove => {
                let w = window.clone();
                let mut throttle = PointerThrottle::default();
                EventListener::on(&window, kind, move |ev| {
                    if !throttle.accept(ev.time_stamp()) {
                        return;
                    }
                    let Some(p) = dom::client_point(&ev) else {
                        return;
                    };
                    let vp = dom::viewport_size(&w);
                    let sample = PointerSample::from_client(p.x, p.y, vp.x, vp.y);
                    if state.borrow_mut().on_pointer(sample) {
                        handle.request();
                    }
                })?
            }
            _ => continue,
        };
        listeners.push(listener);
    }

    Ok(Some(Box::new(GlassEffect {
        state,
        _listeners: listeners,
        frames,
    })))
}
