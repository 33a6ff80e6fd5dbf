use crate::dom;
use crate::frame::FrameLoop;
use crate::listener::EventListener;
use crate::Effect;
use fx_core::constants::PARTICLE_TRAIL_FILL;
use fx_core::particles::{Link, Palette, ParticleConfig, ParticleField};
use fx_core::pointer::PointerThrottle;
use fx_core::{CapabilitySnapshot, EventKind, Tier};
use glam::Vec2;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::cell::RefCell;
use std::f64::consts::TAU;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use web_sys as web;

struct Canvas {
    el: web::HtmlCanvasElement,
    ctx: web::CanvasRenderingContext2d,
    field: ParticleField,
    links: Vec<Link>,
    dpr: f64,
}

impl Canvas {
    fn resize(&mut self) {
        if let Some((css, dpr)) = dom::sync_canvas_backing_size(&self.el) {
            self.dpr = dpr;
            self.field.resize(css.x, css.y);
        }
    }

    fn draw(&mut self) {
        let ctx = &self.ctx;
        let size = self.field.size();
        _ = ctx.set_transform(self.dpr, 0.0, 0.0, self.dpr, 0.0, 0.0);
        ctx.set_fill_style_str(PARTICLE_TRAIL_FILL);
        ctx.fill_rect(0.0, 0.0, size.x as f64, size.y as f64);

        for p in self.field.particles() {
            let (x, y) = (p.position.x as f64, p.position.y as f64);
            let r = (p.size * 2.0) as f64;
            let Ok(g) = ctx.create_radial_gradient(x, y, 0.0, x, y, r) else {
                continue;
            };
            _ = g.add_color_stop(
                0.0,
                &format!("hsla({:.0}, 80%, 60%, {:.3})", p.hue, p.opacity),
            );
            _ = g.add_color_stop(1.0, &format!("hsla({:.0}, 80%, 60%, 0)", p.hue));
            ctx.set_fill_style_canvas_gradient(&g);
            ctx.begin_path();
            _ = ctx.arc(x, y, r, 0.0, TAU);
            ctx.fill();
        }

        self.field.links(&mut self.links);
        ctx.set_line_width(0.5);
        let particles = self.field.particles();
        for link in &self.links {
            let (a, b) = (particles[link.a].position, particles[link.b].position);
            ctx.set_stroke_style_str(&format!("rgba(100, 180, 255, {:.3})", link.alpha));
            ctx.begin_path();
            ctx.move_to(a.x as f64, a.y as f64);
            ctx.line_to(b.x as f64, b.y as f64);
            ctx.stroke();
        }
    }
}

struct ParticlesEffect {
    _listeners: Vec<EventListener>,
    frames: FrameLoop,
    _state: Rc<RefCell<Vec<Canvas>>>,
}

impl Effect for ParticlesEffect {
    fn name(&self) -> &'static str {
        "particles"
    }
}

impl Drop for ParticlesEffect {
    fn drop(&mut self) {
        self.frames.cancel();
    }
}

fn context_2d(canvas: &web::HtmlCanvasElement) -> anyhow::Result<web::CanvasRenderingContext2d> {
    canvas
        .get_context("2d")
        .map_err(|e| anyhow::anyhow!("{:?}", e))?
        .ok_or_else(|| anyhow::anyhow!("2d context unavailable"))?
        .dyn_into::<web::CanvasRenderingContext2d>()
        .map_err(|e| anyhow::anyhow!(format!("{:?}", e)))
}

/// Per-canvas overrides, clamped into range. Halved on the low tier.
fn canvas_config(el: &web::Element, snapshot: &CapabilitySnapshot) -> ParticleConfig {
    let defaults = ParticleConfig::default();
    let requested = ParticleConfig {
        count: dom::data_attr(el, "data-particle-count").unwrap_or(defaults.count),
        speed: dom::data_attr(el, "data-speed").unwrap_or(defaults.speed),
        palette: el
            .get_attribute("data-palette")
            .and_then(|p| Palette::parse(&p))
            .unwrap_or(defaults.palette),
    };
    let mut config = requested.clamped();
    if config.count != requested.count {
        log::warn!(
            "[particles] data-particle-count={} capped at {}",
            requested.count,
            config.count
        );
    }
    if snapshot.tier == Tier::Low {
        config.count /= 2;
    }
    config
}

/// `<canvas data-particles>` with optional `data-particle-count`,
/// `data-palette` and `data-speed`. Not mounted under reduced motion; the
/// count is halved on the low tier.
pub fn mount(
    document: &web::Document,
    snapshot: &CapabilitySnapshot,
) -> anyhow::Result<Option<Box<dyn Effect>>> {
    let elements: Vec<web::HtmlCanvasElement> = dom::query_all(document, "canvas[data-particles]");
    if elements.is_empty() || !snapshot.allows_motion() {
        return Ok(None);
    }
    let window = web::window().ok_or_else(|| anyhow::anyhow!("no window"))?;
    let mut rng = StdRng::from_entropy();
    let scroll_y = window.scroll_y().unwrap_or(0.0);

    let mut canvases = Vec::with_capacity(elements.len());
    for el in elements {
        let config = canvas_config(&el, snapshot);
        let ctx = match context_2d(&el) {
            Ok(ctx) => ctx,
            Err(e) => {
                log::warn!("[particles] skipping canvas: {e:?}");
                continue;
            }
        };
        let (css, dpr) = dom::sync_canvas_backing_size(&el).unwrap_or((Vec2::ONE, 1.0));
        let mut field = match ParticleField::new(config, css.x, css.y, &mut rng) {
            Ok(field) => field,
            Err(e) => {
                log::warn!("[particles] skipping canvas: {e}");
                continue;
            }
        };
        field.sync_scroll(scroll_y);
        canvases.push(Canvas {
            el,
            ctx,
            field,
            links: Vec::new(),
            dpr,
        });
    }
    if canvases.is_empty() {
        return Ok(None);
    }
    log::info!(
        "[particles] {} canvases, {} particles",
        canvases.len(),
        canvases.iter().map(|c| c.field.particles().len()).sum::<usize>()
    );
    let state = Rc::new(RefCell::new(canvases));

    let frames = {
        let state = state.clone();
        FrameLoop::new(move |tick| {
            for canvas in state.borrow_mut().iter_mut() {
                for _ in 0..tick.steps {
                    canvas.field.step();
                }
                canvas.draw();
            }
            true
        })
    };

    let mut listeners = Vec::with_capacity(3);
    {
        let state = state.clone();
        let w = window.clone();
        listeners.push(EventListener::on(&window, EventKind::Scroll, move |_| {
            let y = w.scroll_y().unwrap_or(0.0);
            for c in state.borrow_mut().iter_mut() {
                c.field.on_scroll(y);
            }
        })?);
    }
    {
        let state = state.clone();
        listeners.push(EventListener::on(&window, EventKind::Resize, move |_| {
            for c in state.borrow_mut().iter_mut() {
                c.resize();
            }
        })?);
    }
    if snapshot.allows_pointer_tracking() {
        let state = state.clone();
        let mut throttle = PointerThrottle::default();
        listeners.push(EventListener::on(&window, EventKind::PointerMove, move |ev| {
            if !throttle.accept(ev.time_stamp()) {
                return;
            }
            let Some(p) = dom::client_point(&ev) else {
                return;
            };
            for c in state.borrow_mut().iter_mut() {
                let local = dom::rect_of(&c.el).map(|r| Vec2::new(p.x - r.left, p.y - r.top));
                c.field.set_pointer(local);
            }
        })?);
    }
    frames.request();

    Ok(Some(Box::new(ParticlesEffect {
        _listeners: listeners,
        frames,
        _state: state,
    })))
}
