use crate::listener::EventListener;
use fx_core::{CapabilitySignals, CapabilitySnapshot};
use std::rc::Rc;
use web_sys as web;

pub const TOUCH_QUERY: &str = "(hover: none) and (pointer: coarse)";
pub const REDUCED_MOTION_QUERY: &str = "(prefers-reduced-motion: reduce)";

fn media(window: &web::Window, query: &str) -> Option<web::MediaQueryList> {
    window.match_media(query).ok().flatten()
}

pub fn read_signals(window: &web::Window) -> CapabilitySignals {
    let matches = |q: &str| media(window, q).map(|m| m.matches()).unwrap_or(false);
    let cores = window.navigator().hardware_concurrency();
    CapabilitySignals {
        is_touch: matches(TOUCH_QUERY),
        reduced_motion: matches(REDUCED_MOTION_QUERY),
        core_count: (cores.is_finite() && cores >= 1.0).then_some(cores as u32),
    }
}

/// Current snapshot, neutral outside a browser window.
pub fn snapshot() -> CapabilitySnapshot {
    web::window()
        .map(|w| CapabilitySnapshot::from_signals(read_signals(&w)))
        .unwrap_or_else(CapabilitySnapshot::neutral)
}

/// Media-query change listeners. Each change calls `on_change` once.
pub struct CapabilityWatch {
    _listeners: Vec<EventListener>,
}

impl CapabilityWatch {
    pub fn new(window: &web::Window, on_change: impl Fn() + 'static) -> anyhow::Result<Self> {
        let on_change: Rc<dyn Fn()> = Rc::new(on_change);
        let mut listeners = Vec::with_capacity(2);
        for query in [TOUCH_QUERY, REDUCED_MOTION_QUERY] {
            let Some(mql) = media(window, query) else {
                log::warn!("[probe] matchMedia unavailable for {query}");
                continue;
            };
            let cb = on_change.clone();
            listeners.push(EventListener::new(&mql, "change", move |_| cb())?);
        }
        Ok(Self {
            _listeners: listeners,
        })
    }
}
