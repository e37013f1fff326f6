//! Reference export collaborators that read shapes straight from a [`DocumentStore`].
//!
//! [`SceneExporter`] implements both [`VectorExporter`] (SVG text) and [`NativeRasterizer`]
//! (tiny-skia, PNG bytes), so embedders without their own renderer get a working fallback
//! chain out of the box.

use std::fmt::Write as _;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use kurbo::{BezPath, PathEl, Shape as _};

use crate::document::shape::{Geometry, LeafShape, ShapeKind};
use crate::document::store::DocumentStore;
use crate::foundation::core::{Affine, Rect, Rgba8, ShapeId, Vec2};
use crate::foundation::error::{FxError, FxResult};
use crate::pixels::buffer::PixelBuffer;
use crate::pixels::codec::encode_png;
use crate::raster::margin::{device_size, sanitize_ratio};
use crate::raster::strategy::{NativeRasterizer, VectorExporter};

const PATH_TOLERANCE: f64 = 0.1;

/// Leaf ready to draw: page transform plus its local outline.
struct DrawItem {
    transform: Affine,
    path: BezPath,
    leaf: LeafShape,
}

pub struct SceneExporter {
    store: Arc<dyn DocumentStore>,
}

impl std::fmt::Debug for SceneExporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneExporter").finish_non_exhaustive()
    }
}

impl SceneExporter {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    // Leaves under `ids` in draw order. The requested roots are drawn even when hidden (the
    // engine hides sources while their proxy is shown); hidden descendants and proxies are not.
    fn collect(&self, ids: &[ShapeId]) -> FxResult<Vec<DrawItem>> {
        let mut out = Vec::new();
        for root in ids {
            let mut stack = vec![(root.clone(), true)];
            while let Some((id, is_root)) = stack.pop() {
                let Some(shape) = self.store.shape(&id) else {
                    continue;
                };
                if !is_root && shape.meta.hidden {
                    continue;
                }
                match &shape.kind {
                    ShapeKind::Proxy(_) => {}
                    ShapeKind::Group => {
                        for child in self.store.children(&id).into_iter().rev() {
                            stack.push((child.id, false));
                        }
                    }
                    ShapeKind::Leaf(leaf) => {
                        let Some(transform) = self.store.page_transform(&id) else {
                            continue;
                        };
                        out.push(DrawItem {
                            transform,
                            path: outline(leaf)?,
                            leaf: leaf.clone(),
                        });
                    }
                }
            }
        }
        Ok(out)
    }

    fn svg_for(&self, ids: &[ShapeId], bounds: Rect, pixel_ratio: f64) -> FxResult<Option<String>> {
        let items = self.collect(ids)?;
        if items.is_empty() {
            return Ok(None);
        }
        let pr = sanitize_ratio(pixel_ratio);
        let (w, h) = device_size(bounds, pr);
        let mut svg = String::new();
        // viewBox is sized from the rounded device surface so the scale is exactly `pr`.
        let _ = write!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="{} {} {} {}">"#,
            bounds.x0,
            bounds.y0,
            f64::from(w) / pr,
            f64::from(h) / pr
        );
        for item in &items {
            let [a, b, c, d, e, f] = item.transform.as_coeffs();
            let style = &item.leaf.style;
            let _ = write!(
                svg,
                r#"<path transform="matrix({a} {b} {c} {d} {e} {f})" d="{}" opacity="{}""#,
                item.path.to_svg(),
                style.opacity.clamp(0.0, 1.0)
            );
            match style.fill {
                Some(c) => {
                    let _ = write!(svg, r#" fill="{}" fill-opacity="{}""#, svg_rgb(c), alpha(c));
                }
                None => svg.push_str(r#" fill="none""#),
            }
            if let Some(c) = style.stroke
                && style.stroke_width > 0.0
            {
                let _ = write!(
                    svg,
                    r#" stroke="{}" stroke-opacity="{}" stroke-width="{}""#,
                    svg_rgb(c),
                    alpha(c),
                    style.stroke_width
                );
            }
            svg.push_str("/>");
        }
        svg.push_str("</svg>");
        Ok(Some(svg))
    }

    fn png_for(&self, ids: &[ShapeId], bounds: Rect, pixel_ratio: f64) -> FxResult<Vec<u8>> {
        let items = self.collect(ids)?;
        let pr = sanitize_ratio(pixel_ratio);
        let (w, h) = device_size(bounds, pr);
        let mut buffer = PixelBuffer::new(w, h)?;
        let to_device =
            Affine::scale(pr) * Affine::translate(Vec2::new(-bounds.x0, -bounds.y0));

        buffer.with_pixmap_mut(|pixmap| {
            for item in &items {
                let Some(path) = to_skia_path(&item.path) else {
                    continue;
                };
                let xform = to_skia_transform(to_device * item.transform);
                let style = &item.leaf.style;
                if let Some(c) = style.fill {
                    let paint = paint_for(c, style.opacity);
                    pixmap.fill_path(
                        &path,
                        &paint,
                        resvg::tiny_skia::FillRule::Winding,
                        xform,
                        None,
                    );
                }
                if let Some(c) = style.stroke
                    && style.stroke_width > 0.0
                {
                    let paint = paint_for(c, style.opacity);
                    let stroke = resvg::tiny_skia::Stroke {
                        width: style.stroke_width as f32,
                        ..Default::default()
                    };
                    pixmap.stroke_path(&path, &paint, &stroke, xform, None);
                }
            }
        })?;
        encode_png(&buffer)
    }
}

impl VectorExporter for SceneExporter {
    fn export_svg<'a>(
        &'a self,
        ids: &'a [ShapeId],
        bounds: Rect,
        pixel_ratio: f64,
    ) -> BoxFuture<'a, FxResult<Option<String>>> {
        async move { self.svg_for(ids, bounds, pixel_ratio) }.boxed()
    }
}

impl NativeRasterizer for SceneExporter {
    fn rasterize<'a>(
        &'a self,
        ids: &'a [ShapeId],
        bounds: Rect,
        pixel_ratio: f64,
    ) -> BoxFuture<'a, FxResult<Vec<u8>>> {
        async move { self.png_for(ids, bounds, pixel_ratio) }.boxed()
    }
}

/// Outline of a leaf in its local `width x height` box.
pub(crate) fn outline(leaf: &LeafShape) -> FxResult<BezPath> {
    let local = Rect::new(0.0, 0.0, leaf.width.max(0.0), leaf.height.max(0.0));
    Ok(match &leaf.geometry {
        Geometry::Rect { corner_radius } => {
            let r = corner_radius.max(0.0).min(local.width().min(local.height()) / 2.0);
            kurbo::RoundedRect::from_rect(local, r).to_path(PATH_TOLERANCE)
        }
        Geometry::Ellipse => kurbo::Ellipse::from_rect(local).to_path(PATH_TOLERANCE),
        Geometry::Path { d } => BezPath::from_svg(d)
            .map_err(|e| FxError::export(format!("invalid path data: {e}")))?,
    })
}

fn svg_rgb(c: Rgba8) -> String {
    format!("rgb({},{},{})", c.r, c.g, c.b)
}

fn alpha(c: Rgba8) -> f64 {
    f64::from(c.a) / 255.0
}

fn paint_for(c: Rgba8, opacity: f64) -> resvg::tiny_skia::Paint<'static> {
    let a = (f64::from(c.a) * opacity.clamp(0.0, 1.0)).round() as u8;
    let mut paint = resvg::tiny_skia::Paint::default();
    paint.set_color_rgba8(c.r, c.g, c.b, a);
    paint.anti_alias = true;
    paint
}

fn to_skia_transform(t: Affine) -> resvg::tiny_skia::Transform {
    let [a, b, c, d, e, f] = t.as_coeffs();
    resvg::tiny_skia::Transform::from_row(
        a as f32, b as f32, c as f32, d as f32, e as f32, f as f32,
    )
}

fn to_skia_path(path: &BezPath) -> Option<resvg::tiny_skia::Path> {
    let mut pb = resvg::tiny_skia::PathBuilder::new();
    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => pb.move_to(p.x as f32, p.y as f32),
            PathEl::LineTo(p) => pb.line_to(p.x as f32, p.y as f32),
            PathEl::QuadTo(p1, p2) => pb.quad_to(p1.x as f32, p1.y as f32, p2.x as f32, p2.y as f32),
            PathEl::CurveTo(p1, p2, p3) => pb.cubic_to(
                p1.x as f32,
                p1.y as f32,
                p2.x as f32,
                p2.y as f32,
                p3.x as f32,
                p3.y as f32,
            ),
            PathEl::ClosePath => pb.close(),
        }
    }
    pb.finish()
}

#[cfg(test)]
#[path = "../../tests/unit/raster/scene.rs"]
mod tests;
