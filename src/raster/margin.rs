use crate::effects::config::{Distortion, Effect, EffectStackConfig};
use crate::foundation::core::Rect;

/// Extra device pixels an effect stack needs on each side of its input.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Margin {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl Margin {
    pub const ZERO: Self = Self {
        left: 0,
        top: 0,
        right: 0,
        bottom: 0,
    };

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// Grow a page-space rectangle by this margin converted back to document units.
    pub fn expand(&self, rect: Rect, pixel_ratio: f64) -> Rect {
        let pr = sanitize_ratio(pixel_ratio);
        Rect::new(
            rect.x0 - f64::from(self.left) / pr,
            rect.y0 - f64::from(self.top) / pr,
            rect.x1 + f64::from(self.right) / pr,
            rect.y1 + f64::from(self.bottom) / pr,
        )
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct Extent {
    left: f64,
    top: f64,
    right: f64,
    bottom: f64,
}

impl Extent {
    fn grow_all(&mut self, d: f64) {
        self.left += d;
        self.top += d;
        self.right += d;
        self.bottom += d;
    }

    // A shadow is a copy of the current content moved by (ox, oy) and spread by `blur`.
    fn shadow(&mut self, ox: f64, oy: f64, blur: f64) {
        self.left = self.left.max(self.left + blur - ox);
        self.right = self.right.max(self.right + blur + ox);
        self.top = self.top.max(self.top + blur - oy);
        self.bottom = self.bottom.max(self.bottom + blur + oy);
    }
}

/// Margin required by `stack` at `pixel_ratio`, in device pixels.
///
/// Extents accumulate in stack order, so a blur after a shadow also widens the shadow. Glitch,
/// mosh, grain and doodle never move content outside the buffer they are given and contribute
/// nothing.
pub fn margin_for(stack: &EffectStackConfig, pixel_ratio: f64) -> Margin {
    let pr = sanitize_ratio(pixel_ratio);
    let stack = stack.normalized();
    let mut ext = Extent::default();

    for effect in &stack.effects {
        let p = match effect {
            Effect::DropShadow(p) | Effect::InnerShadow(p) => p,
        };
        if !(p.offset_x.is_finite() && p.offset_y.is_finite() && p.blur.is_finite()) {
            continue;
        }
        ext.shadow(p.offset_x, p.offset_y, p.blur.max(0.0));
    }

    for distortion in &stack.distortions {
        match distortion {
            Distortion::Blur { radius, .. } | Distortion::Bloom { radius, .. } => {
                if radius.is_finite() {
                    ext.grow_all(radius.max(0.0));
                }
            }
            Distortion::MotionBlur {
                angle, distance, ..
            } => {
                if angle.is_finite() && distance.is_finite() {
                    let rad = angle.to_radians();
                    let half = distance.max(0.0) / 2.0;
                    let dx = (rad.cos() * half).abs();
                    let dy = (rad.sin() * half).abs();
                    ext.left += dx;
                    ext.right += dx;
                    ext.top += dy;
                    ext.bottom += dy;
                }
            }
            Distortion::Glitch { .. }
            | Distortion::Mosh { .. }
            | Distortion::Grain { .. }
            | Distortion::Doodle { .. } => {}
        }
    }

    Margin {
        left: to_device(ext.left, pr),
        top: to_device(ext.top, pr),
        right: to_device(ext.right, pr),
        bottom: to_device(ext.bottom, pr),
    }
}

/// `margin_for` for an optional stack; absent or empty stacks need no margin.
pub fn margin_for_opt(stack: Option<&EffectStackConfig>, pixel_ratio: f64) -> Margin {
    stack.map_or(Margin::ZERO, |s| margin_for(s, pixel_ratio))
}

fn to_device(v: f64, pr: f64) -> u32 {
    // Small epsilon keeps exact products like 10.0 * 2.0 from rounding up after float noise.
    let px = (v * pr - 1e-9).ceil();
    if px.is_finite() && px > 0.0 {
        px.min(f64::from(u32::MAX)) as u32
    } else {
        0
    }
}

pub(crate) fn sanitize_ratio(pixel_ratio: f64) -> f64 {
    if pixel_ratio.is_finite() && pixel_ratio > 0.0 {
        pixel_ratio
    } else {
        1.0
    }
}

/// Device-pixel size of a document-space rectangle.
pub fn device_size(rect: Rect, pixel_ratio: f64) -> (u32, u32) {
    let pr = sanitize_ratio(pixel_ratio);
    let w = (rect.width() * pr - 1e-9).ceil().max(1.0);
    let h = (rect.height() * pr - 1e-9).ceil().max(1.0);
    (w.min(f64::from(u32::MAX)) as u32, h.min(f64::from(u32::MAX)) as u32)
}

#[cfg(test)]
#[path = "../../tests/unit/raster/margin.rs"]
mod tests;
