use std::fmt;

use xxhash_rust::xxh3::Xxh3;

use crate::document::shape::{Geometry, Shape, ShapeKind};
use crate::document::store::DocumentStore;
use crate::effects::config::active_stack;
use crate::foundation::core::{Rgba8, ShapeId};
use crate::raster::margin::sanitize_ratio;

const XXH3_SEED: u64 = 0x6a1f_3c5d_92e4_b807;
const OFFSET_QUANTUM: f64 = 1e6;

/// Fingerprint of everything that influences a source's rendered pixels.
///
/// Geometry is hashed relative to the source's page-space origin, so moving a source does not
/// change its signature; the proxy is simply repositioned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RenderSignature {
    pub hi: u64,
    pub lo: u64,
}

impl fmt::Display for RenderSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}{:016x}", self.hi, self.lo)
    }
}

/// Signature of `source` rendered at `pixel_ratio`, or `None` when the source does not exist.
///
/// The source's own `hidden` flag is skipped (the engine owns it while a proxy exists); hidden
/// descendants are hashed because they drop out of the render.
pub fn render_signature(
    store: &dyn DocumentStore,
    source: &ShapeId,
    pixel_ratio: f64,
) -> Option<RenderSignature> {
    store.shape(source)?;
    let origin = store.page_transform(source)?.as_coeffs();

    let mut h = StableHasher::new();
    h.write_f64(sanitize_ratio(pixel_ratio));

    // Subtree order is draw order, so reordering siblings changes the hash.
    let ids = store.subtree(source);
    h.write_u32(ids.len() as u32);
    for id in &ids {
        let Some(shape) = store.shape(id) else {
            continue;
        };
        if shape.is_proxy() {
            continue;
        }
        h.write_str(shape.id.as_str());
        if let Some(t) = store.page_transform(id) {
            let [a, b, c, d, e, f] = t.as_coeffs();
            for v in [a, b, c, d] {
                h.write_f64(v);
            }
            // Offsets are quantized so float noise from the subtraction does not leak in.
            h.write_f64(quantize(e - origin[4]));
            h.write_f64(quantize(f - origin[5]));
        }
        if id != source {
            h.write_bool(shape.meta.hidden);
        }
        write_kind(&mut h, &shape);
        match active_stack(shape.meta.effect_stack.as_ref()) {
            Some(stack) => match serde_json::to_vec(&stack) {
                Ok(bytes) => {
                    h.write_u8(1);
                    h.write_bytes(&bytes);
                }
                Err(e) => {
                    tracing::warn!(shape = %shape.id, error = %e, "effect stack not hashable");
                    h.write_u8(2);
                }
            },
            None => h.write_u8(0),
        }
    }
    Some(h.finish())
}

fn quantize(v: f64) -> f64 {
    (v * OFFSET_QUANTUM).round() / OFFSET_QUANTUM
}

fn write_kind(h: &mut StableHasher, shape: &Shape) {
    match &shape.kind {
        ShapeKind::Group => h.write_u8(0),
        ShapeKind::Proxy(_) => h.write_u8(1),
        ShapeKind::Leaf(leaf) => {
            h.write_u8(2);
            h.write_f64(leaf.width);
            h.write_f64(leaf.height);
            match &leaf.geometry {
                Geometry::Rect { corner_radius } => {
                    h.write_u8(0);
                    h.write_f64(*corner_radius);
                }
                Geometry::Ellipse => h.write_u8(1),
                Geometry::Path { d } => {
                    h.write_u8(2);
                    h.write_str(d);
                }
            }
            let style = &leaf.style;
            h.write_color(style.fill);
            h.write_color(style.stroke);
            h.write_f64(style.stroke_width);
            h.write_f64(style.opacity);
        }
    }
}

struct StableHasher {
    inner: Xxh3,
}

impl StableHasher {
    fn new() -> Self {
        Self {
            inner: Xxh3::with_seed(XXH3_SEED),
        }
    }

    fn write_bytes(&mut self, b: &[u8]) {
        self.inner.update(b);
    }

    fn write_u8(&mut self, v: u8) {
        self.write_bytes(&[v]);
    }

    fn write_bool(&mut self, v: bool) {
        self.write_u8(u8::from(v));
    }

    fn write_u32(&mut self, v: u32) {
        self.write_bytes(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.write_bytes(&v.to_le_bytes());
    }

    fn write_f64(&mut self, v: f64) {
        // Fold -0.0 into 0.0 so it hashes the same as the value it compares equal to.
        self.write_u64(if v == 0.0 { 0 } else { v.to_bits() });
    }

    fn write_str(&mut self, s: &str) {
        self.write_u32(s.len() as u32);
        self.write_bytes(s.as_bytes());
    }

    fn write_color(&mut self, c: Option<Rgba8>) {
        match c {
            Some(c) => self.write_bytes(&[1, c.r, c.g, c.b, c.a]),
            None => self.write_u8(0),
        }
    }

    fn finish(self) -> RenderSignature {
        let v = self.inner.digest128();
        RenderSignature {
            hi: (v >> 64) as u64,
            lo: v as u64,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/sync/signature.rs"]
mod tests;
