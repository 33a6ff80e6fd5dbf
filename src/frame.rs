use fx_core::constants::FRAME_DT_SEC;
use fx_core::{Activity, Animate};
use instant::Instant;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::time::Duration;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys as web;

const MAX_CATCH_UP_STEPS: u32 = 4; // after a long frame, integrate at most this many fixed steps

#[derive(Clone, Copy, Debug)]
pub struct FrameTick {
    /// rAF timestamp in ms.
    pub now_ms: f64,
    /// Fixed integration steps owed since the previous frame.
    pub steps: u32,
}

fn catch_up_steps(elapsed: Duration) -> u32 {
    let frames = (elapsed.as_secs_f32() / FRAME_DT_SEC).round() as u32;
    frames.clamp(1, MAX_CATCH_UP_STEPS)
}

/// Step a model up to `steps` times, stopping early once it settles.
pub fn advance<A: Animate>(model: &mut A, steps: u32) -> Activity {
    let mut activity = Activity::Settled;
    for _ in 0..steps.max(1) {
        activity = model.step();
        if activity.is_settled() {
            break;
        }
    }
    activity
}

struct LoopInner {
    raf_id: Cell<Option<i32>>,
    last: Cell<Option<Instant>>,
    tick: RefCell<Option<Closure<dyn FnMut(f64)>>>,
}

impl LoopInner {
    fn schedule(&self) {
        if self.raf_id.get().is_some() {
            return;
        }
        let Some(window) = web::window() else {
            return;
        };
        let tick = self.tick.borrow();
        let Some(cb) = tick.as_ref() else {
            return;
        };
        match window.request_animation_frame(cb.as_ref().unchecked_ref()) {
            Ok(id) => self.raf_id.set(Some(id)),
            Err(e) => log::warn!("[frame] requestAnimationFrame failed: {:?}", e),
        }
    }

    fn cancel(&self) {
        if let Some(id) = self.raf_id.take() {
            if let Some(w) = web::window() {
                _ = w.cancel_animation_frame(id);
            }
        }
        self.last.set(None);
    }
}

/// Self-terminating requestAnimationFrame loop.
///
/// Idle until `request` is called. Each frame runs the callback; returning
/// true schedules the next frame, false lets the loop go idle. Dropping the
/// loop cancels any pending frame.
pub struct FrameLoop {
    inner: Rc<LoopInner>,
}

/// Non-owning handle for event handlers that need to wake the loop.
#[derive(Clone)]
pub struct FrameHandle {
    inner: Weak<LoopInner>,
}

impl FrameHandle {
    pub fn request(&self) {
        if let Some(inner) = self.inner.upgrade() {
            inner.schedule();
        }
    }
}

impl FrameLoop {
    pub fn new(mut on_frame: impl FnMut(FrameTick) -> bool + 'static) -> Self {
        let inner = Rc::new(LoopInner {
            raf_id: Cell::new(None),
            last: Cell::new(None),
            tick: RefCell::new(None),
        });
        let weak = Rc::downgrade(&inner);
        let closure = Closure::wrap(Box::new(move |ts: f64| {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            inner.raf_id.set(None);
            let now = Instant::now();
            let steps = inner
                .last
                .get()
                .map(|last| catch_up_steps(now.duration_since(last)))
                .unwrap_or(1);
            inner.last.set(Some(now));
            if on_frame(FrameTick { now_ms: ts, steps }) {
                inner.schedule();
            } else {
                inner.last.set(None);
            }
        }) as Box<dyn FnMut(f64)>);
        *inner.tick.borrow_mut() = Some(closure);
        Self { inner }
    }

    pub fn handle(&self) -> FrameHandle {
        FrameHandle {
            inner: Rc::downgrade(&self.inner),
        }
    }

    pub fn request(&self) {
        self.inner.schedule();
    }

    pub fn cancel(&self) {
        self.inner.cancel();
    }
}

impl Drop for FrameLoop {
    fn drop(&mut self) {
        self.inner.cancel();
        self.inner.tick.borrow_mut().take();
    }
}
