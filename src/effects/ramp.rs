use crate::effects::config::{Ramp, RampStop};

/// Per-pixel weights for a directional ramp over a `width x height` buffer.
///
/// Pixel centers are projected onto the ramp direction and normalised so the buffer's extreme
/// corners along that direction map to 0 and 1. The weight at a position is linearly
/// interpolated between the two surrounding stops and held constant past the first/last stop.
#[derive(Clone, Debug)]
pub(crate) struct RampField {
    dir: (f64, f64),
    origin: f64,
    span: f64,
    stops: Vec<RampStop>,
}

impl RampField {
    pub(crate) fn new(ramp: &Ramp, width: u32, height: u32) -> Self {
        let rad = ramp.angle.to_radians();
        let dir = (rad.cos(), rad.sin());
        let (w, h) = (f64::from(width), f64::from(height));
        let corners = [(0.0, 0.0), (w, 0.0), (0.0, h), (w, h)];
        let proj = |(x, y): (f64, f64)| x * dir.0 + y * dir.1;
        let min = corners.iter().copied().map(proj).fold(f64::INFINITY, f64::min);
        let max = corners
            .iter()
            .copied()
            .map(proj)
            .fold(f64::NEG_INFINITY, f64::max);

        let mut stops: Vec<RampStop> = ramp
            .stops
            .iter()
            .filter(|s| s.offset.is_finite() && s.weight.is_finite())
            .map(|s| RampStop {
                offset: s.offset.clamp(0.0, 1.0),
                weight: s.weight.clamp(0.0, 1.0),
            })
            .collect();
        stops.sort_by(|a, b| a.offset.total_cmp(&b.offset));

        Self {
            dir,
            origin: min,
            span: (max - min).max(f64::EPSILON),
            stops,
        }
    }

    /// Weight in `[0, 1]` for the pixel at `(x, y)`.
    pub(crate) fn weight_at(&self, x: u32, y: u32) -> f32 {
        let px = f64::from(x) + 0.5;
        let py = f64::from(y) + 0.5;
        let t = ((px * self.dir.0 + py * self.dir.1 - self.origin) / self.span).clamp(0.0, 1.0);
        weight_along(&self.stops, t) as f32
    }
}

fn weight_along(stops: &[RampStop], t: f64) -> f64 {
    let (Some(first), Some(last)) = (stops.first(), stops.last()) else {
        return 1.0;
    };
    if t <= first.offset {
        return first.weight;
    }
    if t >= last.offset {
        return last.weight;
    }
    for pair in stops.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if t >= a.offset && t <= b.offset {
            let len = b.offset - a.offset;
            if len <= f64::EPSILON {
                return b.weight;
            }
            let k = (t - a.offset) / len;
            return a.weight + (b.weight - a.weight) * k;
        }
    }
    last.weight
}

/// Optional ramp; `None` weighs every pixel at 1.
pub(crate) fn field_for(ramp: Option<&Ramp>, width: u32, height: u32) -> Option<RampField> {
    ramp.map(|r| RampField::new(r, width, height))
}

#[cfg(test)]
#[path = "../../tests/unit/effects/ramp.rs"]
mod tests;
