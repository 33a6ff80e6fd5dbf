use fx_core::glass::{DocMetrics, StyleSink};
use fx_core::pointer::Rect;
use glam::Vec2;
use std::str::FromStr;
use wasm_bindgen::JsCast;
use web_sys as web;

#[inline]
pub fn window_document() -> Option<web::Document> {
    web::window().and_then(|w| w.document())
}

/// Milliseconds on the same clock as event and animation-frame timestamps.
#[inline]
pub fn now_ms(window: &web::Window) -> f64 {
    window.performance().map(|p| p.now()).unwrap_or(0.0)
}

fn collect<T: JsCast>(list: web::NodeList) -> Vec<T> {
    (0..list.length())
        .filter_map(|i| list.item(i))
        .filter_map(|node| node.dyn_into::<T>().ok())
        .collect()
}

pub fn query_all<T: JsCast>(document: &web::Document, selector: &str) -> Vec<T> {
    match document.query_selector_all(selector) {
        Ok(list) => collect(list),
        Err(e) => {
            log::warn!("bad selector {selector}: {:?}", e);
            Vec::new()
        }
    }
}

pub fn query_within<T: JsCast>(root: &web::Element, selector: &str) -> Vec<T> {
    root.query_selector_all(selector)
        .map(collect)
        .unwrap_or_default()
}

/// Fresh client rect, or `None` once the element left the document.
#[inline]
pub fn rect_of(el: &web::Element) -> Option<Rect> {
    if !el.is_connected() {
        return None;
    }
    let r = el.get_bounding_client_rect();
    Some(Rect::new(
        r.left() as f32,
        r.top() as f32,
        r.width() as f32,
        r.height() as f32,
    ))
}

pub fn data_attr<T: FromStr>(el: &web::Element, name: &str) -> Option<T> {
    el.get_attribute(name)?.trim().parse().ok()
}

/// `"x,y"` or `"x y"` pair.
pub fn parse_pair(raw: &str) -> Option<(f32, f32)> {
    let mut parts = raw
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty());
    let a = parts.next()?.parse().ok()?;
    let b = parts.next()?.parse().ok()?;
    Some((a, b))
}

pub fn data_pair(el: &web::Element, name: &str) -> Option<(f32, f32)> {
    parse_pair(&el.get_attribute(name)?)
}

#[inline]
pub fn client_point(ev: &web::Event) -> Option<Vec2> {
    let ev = ev.dyn_ref::<web::MouseEvent>()?;
    Some(Vec2::new(ev.client_x() as f32, ev.client_y() as f32))
}

pub fn viewport_size(window: &web::Window) -> Vec2 {
    let w = window
        .inner_width()
        .ok()
        .and_then(|v| v.as_f64())
        .unwrap_or(0.0);
    let h = window
        .inner_height()
        .ok()
        .and_then(|v| v.as_f64())
        .unwrap_or(0.0);
    Vec2::new(w as f32, h as f32)
}

pub fn doc_metrics(window: &web::Window, document: &web::Document) -> Option<DocMetrics> {
    let root = document.document_element()?;
    Some(DocMetrics {
        scroll_y: window.scroll_y().ok()?,
        scroll_height: root.scroll_height() as f64,
        viewport_h: viewport_size(window).y as f64,
    })
}

#[inline]
pub fn set_style(el: &web::HtmlElement, property: &str, value: &str) {
    _ = el.style().set_property(property, value);
}

/// Inline properties and classes an effect writes on its elements. Dropping
/// the guard removes them, so a remount into another variant starts clean.
pub struct OwnedStyles {
    elements: Vec<web::HtmlElement>,
    properties: &'static [&'static str],
    classes: &'static [&'static str],
}

impl OwnedStyles {
    pub fn new(elements: Vec<web::HtmlElement>, properties: &'static [&'static str]) -> Self {
        Self {
            elements,
            properties,
            classes: &[],
        }
    }

    pub fn with_classes(mut self, classes: &'static [&'static str]) -> Self {
        self.classes = classes;
        self
    }

    pub fn clear(&self) {
        for el in &self.elements {
            let style = el.style();
            for property in self.properties {
                _ = style.remove_property(property);
            }
            for class in self.classes {
                _ = el.class_list().remove_1(class);
            }
        }
    }
}

impl Drop for OwnedStyles {
    fn drop(&mut self) {
        self.clear();
    }
}

/// Style variables on `<html>`.
pub struct RootStyle {
    style: web::CssStyleDeclaration,
}

impl RootStyle {
    pub fn from_document(document: &web::Document) -> Option<Self> {
        let root = document
            .document_element()?
            .dyn_into::<web::HtmlElement>()
            .ok()?;
        Some(Self {
            style: root.style(),
        })
    }
}

impl StyleSink for RootStyle {
    fn set_var(&mut self, name: &str, value: &str) {
        if value.is_empty() {
            _ = self.style.remove_property(name);
        } else {
            _ = self.style.set_property(name, value);
        }
    }

    fn remove_var(&mut self, name: &str) {
        _ = self.style.remove_property(name);
    }
}

/// Match the canvas backing store to its CSS size times the device pixel
/// ratio. Returns the CSS size and the ratio.
pub fn sync_canvas_backing_size(canvas: &web::HtmlCanvasElement) -> Option<(Vec2, f64)> {
    let w = web::window()?;
    let dpr = w.device_pixel_ratio();
    let rect = canvas.get_bounding_client_rect();
    let w_px = (rect.width() * dpr) as u32;
    let h_px = (rect.height() * dpr) as u32;
    canvas.set_width(w_px.max(1));
    canvas.set_height(h_px.max(1));
    Some((Vec2::new(rect.width() as f32, rect.height() as f32), dpr))
}
