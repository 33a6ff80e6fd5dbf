use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys as web;

type ObserverCallback = Closure<dyn FnMut(js_sys::Array, web::IntersectionObserver)>;

/// Trigger-once viewport observer: each observed element is reported the
/// first time it intersects and is unobserved right after.
pub struct VisibilityObserver {
    observer: web::IntersectionObserver,
    _callback: ObserverCallback,
}

impl VisibilityObserver {
    pub fn new(
        root_margin: &str,
        mut on_visible: impl FnMut(&web::Element, f64) + 'static,
    ) -> anyhow::Result<Self> {
        let callback: ObserverCallback = Closure::wrap(Box::new(
            move |entries: js_sys::Array, observer: web::IntersectionObserver| {
                for entry in entries.iter() {
                    let Ok(entry) = entry.dyn_into::<web::IntersectionObserverEntry>() else {
                        continue;
                    };
                    if !entry.is_intersecting() {
                        continue;
                    }
                    let target = entry.target();
                    observer.unobserve(&target);
                    on_visible(&target, entry.time());
                }
            },
        )
            as Box<dyn FnMut(js_sys::Array, web::IntersectionObserver)>);
        let opts = web::IntersectionObserverInit::new();
        opts.set_root_margin(root_margin);
        let observer =
            web::IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &opts)
                .map_err(|e| anyhow::anyhow!("IntersectionObserver: {:?}", e))?;
        Ok(Self {
            observer,
            _callback: callback,
        })
    }

    pub fn observe(&self, el: &web::Element) {
        self.observer.observe(el);
    }
}

impl Drop for VisibilityObserver {
    fn drop(&mut self) {
        self.observer.disconnect();
    }
}
