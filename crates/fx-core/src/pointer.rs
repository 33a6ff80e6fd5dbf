//! Pointer proximity, light placement and magnetic displacement.

use crate::anim::{Activity, Animate, EventKind};
use crate::capability::{CapabilitySnapshot, Variant};
use crate::constants::{
    AMBIENT_GLOW_HOVER, AMBIENT_GLOW_IDLE, FIELD_WARP_RADIUS, FIELD_WARP_STRENGTH,
    MAGNETIC_STRENGTH, MIN_DISTANCE, POINTER_THROTTLE_MS, SPRING_CURSOR_DOT, SPRING_CURSOR_RING,
    SPRING_MAGNETIC,
};
use crate::spring::{Spring2, SpringConfig};
use glam::Vec2;

/// Element geometry in client pixels, re-read on every event that needs it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.left + self.width * 0.5, self.top + self.height * 0.5)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    #[inline]
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.left
            && p.x <= self.left + self.width
            && p.y >= self.top
            && p.y <= self.top + self.height
    }
}

/// Latest pointer position in client pixels plus viewport-normalised forms.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerSample {
    pub x: f32,
    pub y: f32,
    /// -1..1 across the viewport.
    pub normalized_x: f32,
    pub normalized_y: f32,
    /// 0..1 across the viewport.
    pub u: f32,
    pub v: f32,
}

impl PointerSample {
    pub fn from_client(x: f32, y: f32, viewport_w: f32, viewport_h: f32) -> Self {
        let (u, v) = if viewport_w > 0.0 && viewport_h > 0.0 {
            ((x / viewport_w).clamp(0.0, 1.0), (y / viewport_h).clamp(0.0, 1.0))
        } else {
            (0.5, 0.5)
        };
        Self {
            x,
            y,
            normalized_x: u * 2.0 - 1.0,
            normalized_y: v * 2.0 - 1.0,
            u,
            v,
        }
    }

    #[inline]
    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

/// Timestamp throttle capping accepted pointer samples at ~60 Hz.
#[derive(Clone, Copy, Debug)]
pub struct PointerThrottle {
    last_ms: Option<f64>,
    interval_ms: f64,
}

impl Default for PointerThrottle {
    fn default() -> Self {
        Self::new(POINTER_THROTTLE_MS)
    }
}

impl PointerThrottle {
    pub fn new(interval_ms: f64) -> Self {
        Self {
            last_ms: None,
            interval_ms,
        }
    }

    pub fn accept(&mut self, now_ms: f64) -> bool {
        match self.last_ms {
            Some(last) if now_ms - last < self.interval_ms => false,
            _ => {
                self.last_ms = Some(now_ms);
                true
            }
        }
    }
}

/// `max(0, 1 - distance / max_distance)`, exactly 0 at the radius and 1 at
/// the center.
#[inline]
pub fn proximity(distance: f32, max_distance: f32) -> f32 {
    if !(max_distance > 0.0) || !distance.is_finite() {
        return 0.0;
    }
    (1.0 - distance.max(0.0) / max_distance).clamp(0.0, 1.0)
}

#[inline]
pub fn proximity_to_rect(rect: &Rect, pointer: Vec2, max_distance: f32) -> f32 {
    proximity(pointer.distance(rect.center()), max_distance)
}

/// Pointer position across the element in percent (0..100), used to place a
/// radial highlight. `None` for a collapsed element.
#[inline]
pub fn light_position(rect: &Rect, pointer: Vec2) -> Option<Vec2> {
    if rect.is_empty() {
        return None;
    }
    Some(Vec2::new(
        (pointer.x - rect.left) / rect.width * 100.0,
        (pointer.y - rect.top) / rect.height * 100.0,
    ))
}

/// Glow strength of a key under a page-wide pointer, rounded to 3 decimals
/// so unchanged frames produce identical style strings.
#[inline]
pub fn glow_intensity(rect: &Rect, pointer: Vec2, max_distance: f32) -> f32 {
    (proximity_to_rect(rect, pointer, max_distance) * 1000.0).round() / 1000.0
}

/// `(pointer - center) * strength`.
#[inline]
pub fn magnetic_offset(rect: &Rect, pointer: Vec2, strength: f32) -> Vec2 {
    (pointer - rect.center()) * strength
}

/// Pull of an anchor toward the pointer in field (percent) space: unit
/// direction times `(1 - dist/radius) * strength` inside the radius, zero
/// outside and at the exact center.
#[inline]
pub fn field_pull(anchor: Vec2, pointer: Vec2) -> Vec2 {
    let d = pointer - anchor;
    let dist = d.length();
    if dist < MIN_DISTANCE || dist >= FIELD_WARP_RADIUS {
        return Vec2::ZERO;
    }
    d / dist * (1.0 - dist / FIELD_WARP_RADIUS) * FIELD_WARP_STRENGTH
}

/// Element that leans toward the pointer and springs back when it leaves.
#[derive(Clone, Debug)]
pub struct MagneticElement {
    spring: Spring2,
    strength: f32,
    variant: Variant,
}

impl MagneticElement {
    pub fn new(snapshot: &CapabilitySnapshot, strength: Option<f32>) -> Self {
        Self::with_config(snapshot, strength, SpringConfig::preset(SPRING_MAGNETIC))
    }

    pub fn with_config(
        snapshot: &CapabilitySnapshot,
        strength: Option<f32>,
        config: SpringConfig,
    ) -> Self {
        Self {
            spring: Spring2::new(Vec2::ZERO, config),
            strength: strength.unwrap_or(MAGNETIC_STRENGTH),
            variant: Variant::for_pointer_effect(snapshot),
        }
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn events(&self) -> &'static [EventKind] {
        match self.variant {
            Variant::Live => &[EventKind::PointerMove, EventKind::PointerLeave],
            Variant::Reduced => &[],
        }
    }

    /// Returns true when a frame must be scheduled. A missing rect (element
    /// gone mid-callback) is a no-op.
    pub fn on_pointer(&mut self, rect: Option<Rect>, pointer: Vec2) -> bool {
        if !self.variant.is_live() {
            return false;
        }
        match rect {
            Some(r) if !r.is_empty() => self
                .spring
                .set_target(magnetic_offset(&r, pointer, self.strength)),
            _ => false,
        }
    }

    /// Directly set the pull target, for effects that compute it themselves.
    pub fn pull_to(&mut self, target: Vec2) -> bool {
        if !self.variant.is_live() {
            return false;
        }
        self.spring.set_target(target)
    }

    pub fn on_leave(&mut self) -> bool {
        self.pull_to(Vec2::ZERO)
    }

    pub fn offset(&self) -> Vec2 {
        self.spring.value()
    }

    pub fn is_running(&self) -> bool {
        self.spring.is_running()
    }
}

impl Animate for MagneticElement {
    fn step(&mut self) -> Activity {
        self.spring.step()
    }
}

/// Card with a pointer-following ambient highlight.
#[derive(Clone, Copy, Debug)]
pub struct AmbientCard {
    light: Vec2,
    hovered: bool,
    variant: Variant,
}

impl AmbientCard {
    pub fn new(snapshot: &CapabilitySnapshot) -> Self {
        Self {
            light: Vec2::splat(50.0),
            hovered: false,
            variant: Variant::for_pointer_effect(snapshot),
        }
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn events(&self) -> &'static [EventKind] {
        match self.variant {
            Variant::Live => &[EventKind::PointerMove, EventKind::PointerLeave],
            Variant::Reduced => &[],
        }
    }

    /// Returns true when the published values changed.
    pub fn on_pointer(&mut self, rect: Option<Rect>, pointer: Vec2) -> bool {
        if !self.variant.is_live() {
            return false;
        }
        let Some(rect) = rect else {
            return false;
        };
        let Some(light) = light_position(&rect, pointer) else {
            return false;
        };
        let hovered = rect.contains(pointer);
        let changed = light != self.light || hovered != self.hovered;
        self.light = light;
        self.hovered = hovered;
        changed
    }

    /// Pointer left the card: drop back to the idle glow.
    pub fn on_leave(&mut self) -> bool {
        if !self.variant.is_live() {
            return false;
        }
        std::mem::replace(&mut self.hovered, false)
    }

    pub fn light(&self) -> Vec2 {
        self.light
    }

    pub fn glow_opacity(&self) -> f32 {
        if self.hovered {
            AMBIENT_GLOW_HOVER
        } else {
            AMBIENT_GLOW_IDLE
        }
    }
}

/// Visual state of the custom cursor, inferred from what it is over.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CursorState {
    #[default]
    Default,
    Hover,
    Text,
    Action,
    Hidden,
}

impl CursorState {
    /// Precedence: hidden, action, hover, text.
    pub fn infer(hidden: bool, action: bool, interactive: bool, text: bool) -> Self {
        if hidden {
            CursorState::Hidden
        } else if action {
            CursorState::Action
        } else if interactive {
            CursorState::Hover
        } else if text {
            CursorState::Text
        } else {
            CursorState::Default
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CursorState::Default => "default",
            CursorState::Hover => "hover",
            CursorState::Text => "text",
            CursorState::Action => "action",
            CursorState::Hidden => "hidden",
        }
    }
}

/// Dot + ring cursor followers on two spring presets.
#[derive(Clone, Debug)]
pub struct CursorFollower {
    dot: Spring2,
    ring: Spring2,
    pub state: CursorState,
    variant: Variant,
}

impl CursorFollower {
    pub fn new(snapshot: &CapabilitySnapshot) -> Self {
        let offscreen = Vec2::splat(-100.0);
        Self {
            dot: Spring2::new(offscreen, SpringConfig::preset(SPRING_CURSOR_DOT)),
            ring: Spring2::new(offscreen, SpringConfig::preset(SPRING_CURSOR_RING)),
            state: CursorState::Default,
            variant: Variant::for_pointer_effect(snapshot),
        }
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn events(&self) -> &'static [EventKind] {
        match self.variant {
            Variant::Live => &[EventKind::PointerMove, EventKind::PointerOver],
            Variant::Reduced => &[],
        }
    }

    pub fn on_pointer(&mut self, pointer: Vec2) -> bool {
        if !self.variant.is_live() {
            return false;
        }
        let a = self.dot.set_target(pointer);
        let b = self.ring.set_target(pointer);
        a || b
    }

    pub fn dot(&self) -> Vec2 {
        self.dot.value()
    }

    pub fn ring(&self) -> Vec2 {
        self.ring.value()
    }
}

impl Animate for CursorFollower {
    fn step(&mut self) -> Activity {
        let a = self.dot.step();
        let b = self.ring.step();
        a.and(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::CapabilitySignals;

    fn desktop() -> CapabilitySnapshot {
        CapabilitySnapshot::neutral()
    }

    fn touch() -> CapabilitySnapshot {
        CapabilitySnapshot::from_signals(CapabilitySignals {
            is_touch: true,
            reduced_motion: false,
            core_count: Some(8),
        })
    }

    #[test]
    fn proximity_boundaries() {
        assert_eq!(proximity(0.0, 250.0), 1.0);
        assert_eq!(proximity(250.0, 250.0), 0.0);
        assert_eq!(proximity(400.0, 250.0), 0.0);
        assert_eq!(proximity(10.0, 0.0), 0.0);
        assert!((proximity(125.0, 250.0) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn pointer_at_center_is_full_proximity() {
        let r = Rect::new(100.0, 100.0, 50.0, 50.0);
        assert_eq!(proximity_to_rect(&r, r.center(), 300.0), 1.0);
    }

    #[test]
    fn light_position_is_percent() {
        let r = Rect::new(0.0, 0.0, 200.0, 100.0);
        assert_eq!(light_position(&r, Vec2::new(50.0, 75.0)), Some(Vec2::new(25.0, 75.0)));
        assert_eq!(light_position(&Rect::new(0.0, 0.0, 0.0, 10.0), Vec2::ZERO), None);
    }

    #[test]
    fn throttle_rejects_fast_events() {
        let mut t = PointerThrottle::default();
        assert!(t.accept(0.0));
        assert!(!t.accept(10.0));
        assert!(t.accept(16.0));
        assert!(!t.accept(31.9));
        assert!(t.accept(32.0));
    }

    #[test]
    fn field_pull_guards_zero_distance() {
        let a = Vec2::new(50.0, 50.0);
        assert_eq!(field_pull(a, a), Vec2::ZERO);
        assert_eq!(field_pull(a, Vec2::new(50.0, 85.0)), Vec2::ZERO);
        let p = field_pull(a, Vec2::new(50.0, 60.0));
        assert!(p.y > 0.0 && p.x == 0.0);
    }

    #[test]
    fn magnetic_element_pulls_and_releases() {
        let mut m = MagneticElement::new(&desktop(), Some(0.5));
        let r = Rect::new(0.0, 0.0, 100.0, 100.0);
        assert!(m.on_pointer(Some(r), Vec2::new(100.0, 50.0)));
        for _ in 0..600 {
            if m.step().is_settled() {
                break;
            }
        }
        assert_eq!(m.offset(), Vec2::new(25.0, 0.0));
        assert!(m.on_leave());
        for _ in 0..600 {
            if m.step().is_settled() {
                break;
            }
        }
        assert_eq!(m.offset(), Vec2::ZERO);
    }

    #[test]
    fn missing_rect_is_noop() {
        let mut m = MagneticElement::new(&desktop(), None);
        assert!(!m.on_pointer(None, Vec2::new(10.0, 10.0)));
        assert_eq!(m.offset(), Vec2::ZERO);
    }

    #[test]
    fn touch_variants_subscribe_to_nothing() {
        let snap = touch();
        assert!(MagneticElement::new(&snap, None).events().is_empty());
        assert!(AmbientCard::new(&snap).events().is_empty());
        assert!(CursorFollower::new(&snap).events().is_empty());
    }

    #[test]
    fn ambient_card_tracks_hover() {
        let mut c = AmbientCard::new(&desktop());
        let r = Rect::new(0.0, 0.0, 100.0, 100.0);
        assert!(c.on_pointer(Some(r), Vec2::new(10.0, 90.0)));
        assert_eq!(c.glow_opacity(), AMBIENT_GLOW_HOVER);
        c.on_pointer(Some(r), Vec2::new(300.0, 300.0));
        assert_eq!(c.glow_opacity(), AMBIENT_GLOW_IDLE);
        c.on_pointer(Some(r), Vec2::new(50.0, 50.0));
        assert!(c.on_leave());
        assert!(!c.on_leave());
        assert_eq!(c.glow_opacity(), AMBIENT_GLOW_IDLE);
    }

    #[test]
    fn cursor_state_priority() {
        assert_eq!(CursorState::infer(true, true, true, true), CursorState::Hidden);
        assert_eq!(CursorState::infer(false, false, true, true), CursorState::Hover);
        assert_eq!(CursorState::infer(false, false, false, true), CursorState::Text);
        assert_eq!(CursorState::infer(false, false, false, false), CursorState::Default);
    }
}
