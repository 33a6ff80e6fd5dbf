//! Field-line geometry for stat and illustration visuals.
//!
//! Coordinates are in a 0..100 viewBox. Paths are quadratic Béziers whose
//! control point sits off the chord's midpoint along its perpendicular, and
//! can be pushed away from the pointer when it comes close.

use crate::capability::{CapabilitySnapshot, Tier, Variant};
use crate::constants::{FIELD_WARP_RADIUS, FIELD_WARP_STRENGTH, MIN_DISTANCE};
use crate::error::{FxError, FxResult};
use glam::Vec2;
use smallvec::SmallVec;
use std::fmt::Write as _;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FieldLine {
    pub from: usize,
    pub to: usize,
    pub curve: f32,
}

const fn line(from: usize, to: usize, curve: f32) -> FieldLine {
    FieldLine { from, to, curve }
}

/// Three-anchor loop drawn twice with opposing curvature.
pub const DEFAULT_FIELD_LINES: [FieldLine; 6] = [
    line(0, 1, 0.25),
    line(1, 2, 0.22),
    line(2, 0, 0.28),
    line(0, 1, -0.18),
    line(1, 2, -0.15),
    line(2, 0, -0.2),
];

const OUTER_CURVES: [f32; 4] = [0.25, 0.22, 0.28, 0.24];
const INNER_CURVES: [f32; 4] = [-0.18, -0.15, -0.2, -0.17];

/// Default lines for `n` anchors: consecutive pairs, closed into a loop from
/// three anchors up, drawn once per curvature pass. Matches
/// `DEFAULT_FIELD_LINES` for three anchors; empty outside 2..=4.
pub fn default_field_lines(n: usize) -> SmallVec<[FieldLine; 8]> {
    if !(2..=4).contains(&n) {
        return SmallVec::new();
    }
    let edges = if n == 2 { 1 } else { n };
    [OUTER_CURVES, INNER_CURVES]
        .iter()
        .flat_map(|curves| (0..edges).map(move |i| line(i, (i + 1) % n, curves[i])))
        .collect()
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QuadCurve {
    pub from: Vec2,
    pub control: Vec2,
    pub to: Vec2,
}

impl QuadCurve {
    pub fn to_svg_path(&self) -> String {
        let mut d = String::with_capacity(48);
        let _ = write!(
            d,
            "M{} {} Q{} {} {} {}",
            fmt_coord(self.from.x),
            fmt_coord(self.from.y),
            fmt_coord(self.control.x),
            fmt_coord(self.control.y),
            fmt_coord(self.to.x),
            fmt_coord(self.to.y)
        );
        d
    }

    /// Point on the curve at parameter `t` in [0, 1].
    pub fn point_at(&self, t: f32) -> Vec2 {
        let u = 1.0 - t;
        self.from * (u * u) + self.control * (2.0 * u * t) + self.to * (t * t)
    }
}

fn fmt_coord(v: f32) -> String {
    let rounded = (v * 100.0).round() / 100.0;
    if rounded == rounded.trunc() {
        format!("{}", rounded as i32)
    } else {
        format!("{rounded}")
    }
}

/// Chord midpoint offset by `(-dy, dx) * curve`.
#[inline]
pub fn control_point(from: Vec2, to: Vec2, curve: f32) -> Vec2 {
    let mid = (from + to) * 0.5;
    let d = to - from;
    mid + Vec2::new(-d.y, d.x) * curve
}

/// Push a control point away from the pointer, proportional to proximity
/// within the warp radius.
#[inline]
pub fn warp_control(control: Vec2, pointer: Vec2) -> Vec2 {
    let away = control - pointer;
    let dist = away.length();
    if dist >= FIELD_WARP_RADIUS {
        return control;
    }
    let warp = (1.0 - dist / FIELD_WARP_RADIUS) * FIELD_WARP_STRENGTH;
    let dir = if dist < MIN_DISTANCE {
        // Pointer sits on the control point; push straight up.
        Vec2::new(0.0, -1.0)
    } else {
        away / dist
    };
    control + dir * warp
}

pub fn build_field_path(from: Vec2, to: Vec2, curve: f32, pointer: Option<Vec2>) -> QuadCurve {
    let mut control = control_point(from, to, curve);
    if let Some(p) = pointer {
        control = warp_control(control, p);
    }
    QuadCurve { from, control, to }
}

#[derive(Clone, Debug)]
pub struct FieldLines {
    anchors: SmallVec<[Vec2; 4]>,
    lines: SmallVec<[FieldLine; 8]>,
    distort: bool,
}

impl FieldLines {
    pub fn new(anchors: &[Vec2], lines: &[FieldLine], distort: bool) -> FxResult<Self> {
        if !(2..=4).contains(&anchors.len()) {
            return Err(FxError::InvalidAnchors(anchors.len()));
        }
        if let Some(bad) = lines
            .iter()
            .find(|l| l.from >= anchors.len() || l.to >= anchors.len())
        {
            return Err(FxError::AnchorOutOfRange {
                index: bad.from.max(bad.to),
                len: anchors.len(),
            });
        }
        Ok(Self {
            anchors: SmallVec::from_slice(anchors),
            lines: SmallVec::from_slice(lines),
            distort,
        })
    }

    /// Anchors joined by `default_field_lines`.
    pub fn with_default_lines(anchors: &[Vec2], distort: bool) -> FxResult<Self> {
        Self::new(anchors, &default_field_lines(anchors.len()), distort)
    }

    /// Pointer distortion only on high-tier desktop.
    pub fn distortion_enabled(snapshot: &CapabilitySnapshot) -> bool {
        !snapshot.is_touch && snapshot.tier == Tier::High
    }

    pub fn anchors(&self) -> &[Vec2] {
        &self.anchors
    }

    pub fn curves(&self, pointer: Option<Vec2>) -> SmallVec<[QuadCurve; 8]> {
        let pointer = if self.distort { pointer } else { None };
        self.lines
            .iter()
            .map(|l| build_field_path(self.anchors[l.from], self.anchors[l.to], l.curve, pointer))
            .collect()
    }
}

/// Right-angle route between two points, PCB style.
pub fn trace_path(from: Vec2, to: Vec2) -> String {
    let mid_x = (from.x + to.x) * 0.5;
    format!(
        "M{} {} L{} {} L{} {} L{} {}",
        fmt_coord(from.x),
        fmt_coord(from.y),
        fmt_coord(mid_x),
        fmt_coord(from.y),
        fmt_coord(mid_x),
        fmt_coord(to.y),
        fmt_coord(to.x),
        fmt_coord(to.y)
    )
}

/// Traces between consecutive activated anchors (in anchor order), closing
/// the loop once three are active.
pub fn circuit_traces(anchors: &[Vec2], activated: &[bool]) -> Vec<String> {
    let on: SmallVec<[Vec2; 4]> = anchors
        .iter()
        .zip(activated.iter())
        .filter(|(_, &a)| a)
        .map(|(p, _)| *p)
        .collect();
    let mut out: Vec<String> = on.windows(2).map(|w| trace_path(w[0], w[1])).collect();
    if on.len() == 3 {
        out.push(trace_path(on[2], on[0]));
    }
    out
}

/// Animation state of a live illustration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum IllustrationState {
    #[default]
    Entrance,
    Idle,
    Active,
}

/// Illustration whose rendering (static vs animated) is fixed at mount.
#[derive(Clone, Copy, Debug)]
pub struct Illustration {
    variant: Variant,
    state: IllustrationState,
}

impl Illustration {
    pub fn new(snapshot: &CapabilitySnapshot) -> Self {
        Self {
            variant: Variant::for_motion_effect(snapshot),
            state: IllustrationState::Entrance,
        }
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn entered(&mut self) {
        if self.state == IllustrationState::Entrance {
            self.state = IllustrationState::Idle;
        }
    }

    pub fn set_active(&mut self, active: bool) {
        self.state = match (self.state, active) {
            (_, true) => IllustrationState::Active,
            (IllustrationState::Entrance, false) => IllustrationState::Entrance,
            (_, false) => IllustrationState::Idle,
        };
    }

    /// Value for the element's `data-fx-state` attribute.
    pub fn render_key(&self) -> &'static str {
        match (self.variant, self.state) {
            (Variant::Reduced, _) => "reduced",
            (Variant::Live, IllustrationState::Entrance) => "entrance",
            (Variant::Live, IllustrationState::Idle) => "idle",
            (Variant::Live, IllustrationState::Active) => "active",
        }
    }
}
