//! Scroll-linked mappings: element progress through the viewport, keyframed
//! transforms, and the velocity skew used by headline text.

use crate::anim::{Activity, Animate, EventKind};
use crate::capability::{CapabilitySnapshot, Variant};
use crate::constants::{
    SKEW_DECAY, SKEW_GAIN, SKEW_MAX_DEG, SKEW_STOP_EPS, STRETCH_GAIN, STRETCH_MAX,
};
use crate::error::{FxError, FxResult};
use crate::velocity::Decay;
use smallvec::SmallVec;

/// Which edges define progress 0 and 1.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScrollOffset {
    /// 0 when the element top meets the viewport bottom, 1 when its bottom
    /// leaves the viewport top.
    #[default]
    StartEndToEndStart,
    /// 0 when the element top is at the viewport top, 1 when its bottom is.
    StartStartToEndStart,
}

/// Progress of an element through its scroll range, clamped to [0, 1].
///
/// `top` and `height` are the element's client-rect values read in the same
/// frame; `viewport_h` is the window's inner height.
pub fn element_progress(offset: ScrollOffset, top: f32, height: f32, viewport_h: f32) -> f32 {
    let (start, span) = match offset {
        ScrollOffset::StartEndToEndStart => (viewport_h, viewport_h + height),
        ScrollOffset::StartStartToEndStart => (0.0, height),
    };
    if span <= 0.0 {
        return 0.0;
    }
    ((start - top) / span).clamp(0.0, 1.0)
}

/// Fraction of the scrollable document already scrolled.
#[inline]
pub fn scroll_depth(scroll_y: f64, scroll_height: f64, viewport_h: f64) -> f32 {
    let max = scroll_height - viewport_h;
    if max > 0.0 {
        (scroll_y / max).clamp(0.0, 1.0) as f32
    } else {
        0.0
    }
}

/// Piecewise-linear map from progress stops to output values, clamped at
/// both ends.
#[derive(Clone, Debug, PartialEq)]
pub struct Keyframes {
    stops: SmallVec<[(f32, f32); 4]>,
}

impl Keyframes {
    pub fn new(inputs: &[f32], outputs: &[f32]) -> FxResult<Self> {
        if inputs.is_empty() || inputs.len() != outputs.len() {
            return Err(FxError::InvalidKeyframes(format!(
                "{} inputs vs {} outputs",
                inputs.len(),
                outputs.len()
            )));
        }
        if inputs.windows(2).any(|w| w[1] < w[0]) {
            return Err(FxError::InvalidKeyframes(
                "inputs must be ascending".to_string(),
            ));
        }
        Ok(Self {
            stops: inputs.iter().copied().zip(outputs.iter().copied()).collect(),
        })
    }

    pub fn linear(from: f32, to: f32) -> Self {
        Self {
            stops: SmallVec::from_slice(&[(0.0, from), (1.0, to)]),
        }
    }

    pub fn sample(&self, t: f32) -> f32 {
        let first = self.stops[0];
        if t <= first.0 {
            return first.1;
        }
        for w in self.stops.windows(2) {
            let (x0, y0) = w[0];
            let (x1, y1) = w[1];
            if t <= x1 {
                let span = x1 - x0;
                if span <= 0.0 {
                    return y1;
                }
                return y0 + (y1 - y0) * ((t - x0) / span);
            }
        }
        self.stops[self.stops.len() - 1].1
    }
}

/// Visual parameters produced for one frame of a scroll-linked element.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrollVisual {
    pub translate_y: f32,
    pub opacity: f32,
    pub scale: f32,
    pub blur_px: f32,
}

impl Default for ScrollVisual {
    fn default() -> Self {
        Self {
            translate_y: 0.0,
            opacity: 1.0,
            scale: 1.0,
            blur_px: 0.0,
        }
    }
}

/// Parallax element: a scroll range plus optional keyframe tracks.
#[derive(Clone, Debug)]
pub struct ParallaxTrack {
    pub offset: ScrollOffset,
    pub translate_y: Option<Keyframes>,
    pub opacity: Option<Keyframes>,
    pub scale: Option<Keyframes>,
    pub blur: Option<Keyframes>,
    variant: Variant,
    last: Option<ScrollVisual>,
}

impl ParallaxTrack {
    pub fn new(snapshot: &CapabilitySnapshot, offset: ScrollOffset) -> Self {
        Self {
            offset,
            translate_y: None,
            opacity: None,
            scale: None,
            blur: None,
            variant: Variant::for_motion_effect(snapshot),
            last: None,
        }
    }

    /// Section header preset: drift by `±amplitude` px and fade at both ends.
    pub fn header(snapshot: &CapabilitySnapshot, amplitude: f32) -> Self {
        let mut t = Self::new(snapshot, ScrollOffset::StartEndToEndStart);
        t.translate_y = Some(Keyframes::linear(amplitude, -amplitude));
        t.opacity = Keyframes::new(&[0.0, 0.2, 0.8, 1.0], &[0.0, 1.0, 1.0, 0.0]).ok();
        t
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn events(&self) -> &'static [EventKind] {
        match self.variant {
            Variant::Live => &[EventKind::Scroll, EventKind::Resize],
            Variant::Reduced => &[],
        }
    }

    pub fn visual_at(&self, progress: f32) -> ScrollVisual {
        let sample = |k: &Option<Keyframes>, default: f32| {
            k.as_ref().map(|k| k.sample(progress)).unwrap_or(default)
        };
        ScrollVisual {
            translate_y: sample(&self.translate_y, 0.0),
            opacity: sample(&self.opacity, 1.0),
            scale: sample(&self.scale, 1.0),
            blur_px: sample(&self.blur, 0.0).max(0.0),
        }
    }

    /// Compute this frame's visual. Returns `None` when nothing changed since
    /// the last write, so the caller can skip touching the DOM.
    pub fn update(&mut self, top: f32, height: f32, viewport_h: f32) -> Option<ScrollVisual> {
        if !self.variant.is_live() {
            return None;
        }
        let progress = element_progress(self.offset, top, height, viewport_h);
        let visual = self.visual_at(progress);
        if self.last == Some(visual) {
            return None;
        }
        self.last = Some(visual);
        Some(visual)
    }
}

/// Skew and horizontal stretch driven by per-frame scroll delta.
#[derive(Clone, Debug)]
pub struct VelocitySkew {
    velocity: Decay,
    last_scroll: f64,
    max_skew: f32,
    max_scale: f32,
    variant: Variant,
}

impl VelocitySkew {
    pub fn new(snapshot: &CapabilitySnapshot, scroll_y: f64) -> Self {
        Self::with_limits(snapshot, scroll_y, SKEW_MAX_DEG, STRETCH_MAX)
    }

    pub fn with_limits(
        snapshot: &CapabilitySnapshot,
        scroll_y: f64,
        max_skew: f32,
        max_scale: f32,
    ) -> Self {
        Self {
            velocity: Decay::new(SKEW_DECAY, SKEW_STOP_EPS),
            last_scroll: scroll_y,
            max_skew: max_skew.abs(),
            max_scale: max_scale.max(1.0),
            variant: Variant::for_motion_effect(snapshot),
        }
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn events(&self) -> &'static [EventKind] {
        match self.variant {
            Variant::Live => &[EventKind::Scroll],
            Variant::Reduced => &[],
        }
    }

    /// Returns true when the loop has to be started.
    pub fn on_scroll(&mut self, scroll_y: f64) -> bool {
        if !self.variant.is_live() {
            return false;
        }
        let delta = (scroll_y - self.last_scroll) as f32;
        self.last_scroll = scroll_y;
        self.velocity.kick(delta)
    }

    pub fn skew_deg(&self) -> f32 {
        (self.velocity.value * SKEW_GAIN).clamp(-self.max_skew, self.max_skew)
    }

    pub fn scale_x(&self) -> f32 {
        (1.0 + self.velocity.value.abs() * STRETCH_GAIN * (self.max_scale - 1.0))
            .min(self.max_scale)
    }
}

impl Animate for VelocitySkew {
    fn step(&mut self) -> Activity {
        self.velocity.step()
    }
}
