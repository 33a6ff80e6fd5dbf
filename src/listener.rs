use fx_core::EventKind;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys as web;

pub fn event_name(kind: EventKind) -> &'static str {
    match kind {
        EventKind::PointerMove => "mousemove",
        EventKind::PointerLeave => "mouseleave",
        EventKind::PointerOver => "mouseover",
        EventKind::Scroll => "scroll",
        EventKind::Resize => "resize",
    }
}

/// Passive DOM listener removed again when dropped.
pub struct EventListener {
    target: web::EventTarget,
    name: &'static str,
    closure: Closure<dyn FnMut(web::Event)>,
}

impl EventListener {
    pub fn new(
        target: &web::EventTarget,
        name: &'static str,
        handler: impl FnMut(web::Event) + 'static,
    ) -> anyhow::Result<Self> {
        let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(web::Event)>);
        let opts = web::AddEventListenerOptions::new();
        opts.set_passive(true);
        target
            .add_event_listener_with_callback_and_add_event_listener_options(
                name,
                closure.as_ref().unchecked_ref(),
                &opts,
            )
            .map_err(|e| anyhow::anyhow!("add {name} listener: {:?}", e))?;
        Ok(Self {
            target: target.clone(),
            name,
            closure,
        })
    }

    pub fn on(
        target: &web::EventTarget,
        kind: EventKind,
        handler: impl FnMut(web::Event) + 'static,
    ) -> anyhow::Result<Self> {
        Self::new(target, event_name(kind), handler)
    }
}

impl Drop for EventListener {
    fn drop(&mut self) {
        _ = self
            .target
            .remove_event_listener_with_callback(self.name, self.closure.as_ref().unchecked_ref());
    }
}
