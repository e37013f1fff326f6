use std::sync::Arc;

use anyhow::Context;

use crate::foundation::error::{FxError, FxResult};
use crate::pixels::buffer::PixelBuffer;

/// Parses sanitized SVG text and rasterizes it with `resvg`.
#[derive(Clone)]
pub struct SvgDecoder {
    fontdb: Arc<usvg::fontdb::Database>,
}

impl std::fmt::Debug for SvgDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SvgDecoder")
            .field("faces", &self.fontdb.len())
            .finish()
    }
}

impl Default for SvgDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl SvgDecoder {
    /// Decoder without fonts; text nodes render as nothing.
    pub fn new() -> Self {
        Self {
            fontdb: Arc::new(usvg::fontdb::Database::new()),
        }
    }

    /// Decoder with the host's system fonts loaded.
    pub fn with_system_fonts() -> Self {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();
        Self {
            fontdb: Arc::new(db),
        }
    }

    pub fn parse(&self, svg: &str) -> FxResult<usvg::Tree> {
        let opts = usvg::Options {
            fontdb: Arc::clone(&self.fontdb),
            ..Default::default()
        };
        usvg::Tree::from_str(svg, &opts)
            .context("parse svg tree")
            .map_err(|e| FxError::decode(format!("{e:#}")))
    }

    /// Rasterize `svg` stretched to exactly `width x height` device pixels.
    pub fn decode(&self, svg: &str, width: u32, height: u32) -> FxResult<PixelBuffer> {
        let tree = self.parse(svg)?;
        render_tree(&tree, width, height)
    }
}

pub(crate) fn render_tree(tree: &usvg::Tree, width: u32, height: u32) -> FxResult<PixelBuffer> {
    let size = tree.size();
    if !(size.width().is_finite() && size.height().is_finite())
        || size.width() <= 0.0
        || size.height() <= 0.0
    {
        return Err(FxError::decode("svg has invalid width/height"));
    }

    let mut buffer = PixelBuffer::new(width, height)?;
    let sx = (width as f32) / size.width();
    let sy = (height as f32) / size.height();
    let xform = resvg::tiny_skia::Transform::from_scale(sx, sy);
    buffer.with_pixmap_mut(|pixmap| resvg::render(tree, xform, pixmap))?;
    Ok(buffer)
}

#[cfg(test)]
#[path = "../../tests/unit/raster/svg.rs"]
mod tests;
