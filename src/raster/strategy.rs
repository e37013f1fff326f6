use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;

use crate::foundation::core::{Rect, ShapeId};
use crate::foundation::error::{FxError, FxResult};
use crate::pixels::buffer::PixelBuffer;
use crate::pixels::codec::{decode_image, resize_to};
use crate::raster::sanitize::sanitize_svg;
use crate::raster::svg::SvgDecoder;

/// Exports a set of shapes as SVG text covering `bounds` (page space) at `pixel_ratio`.
///
/// `Ok(None)` means "nothing to export"; both outcomes are treated as recoverable.
pub trait VectorExporter: Send + Sync {
    fn export_svg<'a>(
        &'a self,
        ids: &'a [ShapeId],
        bounds: Rect,
        pixel_ratio: f64,
    ) -> BoxFuture<'a, FxResult<Option<String>>>;
}

/// Independent rasterization entry point returning encoded image bytes (PNG or any format the
/// `image` crate decodes).
pub trait NativeRasterizer: Send + Sync {
    fn rasterize<'a>(
        &'a self,
        ids: &'a [ShapeId],
        bounds: Rect,
        pixel_ratio: f64,
    ) -> BoxFuture<'a, FxResult<Vec<u8>>>;
}

/// One rasterization attempt for a set of shapes.
#[derive(Clone, Copy, Debug)]
pub struct RasterRequest<'a> {
    pub ids: &'a [ShapeId],
    pub bounds: Rect,
    pub pixel_ratio: f64,
    pub width: u32,
    pub height: u32,
}

/// A way of turning shapes into pixels; tried in order until one succeeds.
pub trait RasterStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn rasterize<'a>(&'a self, req: RasterRequest<'a>) -> BoxFuture<'a, FxResult<PixelBuffer>>;
}

/// Vector export, sanitize, decode, then probe for visible content.
pub struct VectorExportStrategy {
    exporter: Arc<dyn VectorExporter>,
    decoder: SvgDecoder,
    probe_grid: u32,
}

impl VectorExportStrategy {
    pub fn new(exporter: Arc<dyn VectorExporter>, decoder: SvgDecoder, probe_grid: u32) -> Self {
        Self {
            exporter,
            decoder,
            probe_grid,
        }
    }
}

impl RasterStrategy for VectorExportStrategy {
    fn name(&self) -> &'static str {
        "vector-export"
    }

    fn rasterize<'a>(&'a self, req: RasterRequest<'a>) -> BoxFuture<'a, FxResult<PixelBuffer>> {
        async move {
            let svg = self
                .exporter
                .export_svg(req.ids, req.bounds, req.pixel_ratio)
                .await?
                .filter(|s| !s.trim().is_empty())
                .ok_or_else(|| FxError::export("vector export returned nothing"))?;

            let (clean, report) = sanitize_svg(&svg)?;
            if report.removed_elements > 0 || report.removed_attributes > 0 {
                tracing::debug!(
                    removed_elements = report.removed_elements,
                    removed_attributes = report.removed_attributes,
                    "sanitized exported svg"
                );
            }

            let buffer = self.decoder.decode(&clean, req.width, req.height)?;
            ensure_visible(buffer, self.probe_grid)
        }
        .boxed()
    }
}

/// Native rasterizer bytes, decoded and resized to the requested surface.
pub struct NativeStrategy {
    native: Arc<dyn NativeRasterizer>,
    probe_grid: u32,
}

impl NativeStrategy {
    pub fn new(native: Arc<dyn NativeRasterizer>, probe_grid: u32) -> Self {
        Self { native, probe_grid }
    }
}

impl RasterStrategy for NativeStrategy {
    fn name(&self) -> &'static str {
        "native"
    }

    fn rasterize<'a>(&'a self, req: RasterRequest<'a>) -> BoxFuture<'a, FxResult<PixelBuffer>> {
        async move {
            let bytes = self
                .native
                .rasterize(req.ids, req.bounds, req.pixel_ratio)
                .await?;
            if bytes.is_empty() {
                return Err(FxError::export("native rasterizer returned no bytes"));
            }
            let mut buffer = decode_image(&bytes)?;
            if buffer.width() != req.width || buffer.height() != req.height {
                buffer = resize_to(buffer, req.width, req.height)?;
            }
            ensure_visible(buffer, self.probe_grid)
        }
        .boxed()
    }
}

fn ensure_visible(buffer: PixelBuffer, grid: u32) -> FxResult<PixelBuffer> {
    if buffer.has_visible_content(grid) {
        Ok(buffer)
    } else {
        Err(FxError::decode(format!(
            "decoded {}x{} surface has no visible content",
            buffer.width(),
            buffer.height()
        )))
    }
}

/// Try each strategy in order; `None` when all of them fail.
pub async fn rasterize_with_fallback(
    strategies: &[Arc<dyn RasterStrategy>],
    req: RasterRequest<'_>,
) -> Option<PixelBuffer> {
    for strategy in strategies {
        match strategy.rasterize(req).await {
            Ok(buffer) => {
                tracing::trace!(strategy = strategy.name(), "rasterized");
                return Some(buffer);
            }
            Err(err) => {
                tracing::warn!(strategy = strategy.name(), error = %err, "raster strategy failed");
            }
        }
    }
    None
}

#[cfg(test)]
#[path = "../../tests/unit/raster/strategy.rs"]
mod tests;
