use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;

use crate::document::shape::{Shape, ShapeKind};
use crate::document::store::DocumentStore;
use crate::effects::config::active_stack;
use crate::effects::stack::apply_stack;
use crate::foundation::core::{Rect, ShapeId};
use crate::foundation::error::{FxError, FxResult};
use crate::pixels::buffer::PixelBuffer;
use crate::raster::margin::{device_size, margin_for_opt, sanitize_ratio};
use crate::raster::strategy::{
    NativeRasterizer, NativeStrategy, RasterRequest, RasterStrategy, VectorExportStrategy,
    VectorExporter, rasterize_with_fallback,
};
use crate::raster::svg::SvgDecoder;

/// Nesting depth at which recursion is treated as a malformed (cyclic) document.
const MAX_NESTING: usize = 64;

/// Rasterizer tuning.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RasterConfig {
    /// Groups with more direct children than this are exported in one shot.
    pub max_group_children: usize,
    /// Lattice size of the sparse emptiness probe.
    pub alpha_probe_grid: u32,
    /// Largest surface edge, in device pixels, the rasterizer will allocate.
    pub max_surface_dim: u32,
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self {
            max_group_children: 180,
            alpha_probe_grid: 24,
            max_surface_dim: 8192,
        }
    }
}

/// Turns a source shape (leaf or group) into an effect-applied pixel buffer.
pub struct SubtreeRasterizer {
    store: Arc<dyn DocumentStore>,
    strategies: Vec<Arc<dyn RasterStrategy>>,
    config: RasterConfig,
}

impl std::fmt::Debug for SubtreeRasterizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubtreeRasterizer")
            .field(
                "strategies",
                &self.strategies.iter().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .field("config", &self.config)
            .finish()
    }
}

impl SubtreeRasterizer {
    /// Vector export first, native rasterization as the fallback.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        exporter: Arc<dyn VectorExporter>,
        native: Arc<dyn NativeRasterizer>,
        config: RasterConfig,
    ) -> Self {
        let grid = config.alpha_probe_grid;
        let strategies: Vec<Arc<dyn RasterStrategy>> = vec![
            Arc::new(VectorExportStrategy::new(exporter, SvgDecoder::new(), grid)),
            Arc::new(NativeStrategy::new(native, grid)),
        ];
        Self::with_strategies(store, strategies, config)
    }

    pub fn with_strategies(
        store: Arc<dyn DocumentStore>,
        strategies: Vec<Arc<dyn RasterStrategy>>,
        config: RasterConfig,
    ) -> Self {
        Self {
            store,
            strategies,
            config,
        }
    }

    pub fn config(&self) -> &RasterConfig {
        &self.config
    }

    /// Page-space bounds of `id` grown to hold every effect in its subtree.
    ///
    /// For groups this is the union of the group's tight bounds and each child's expanded bounds,
    /// then grown by the group's own margin.
    pub fn expanded_bounds(&self, id: &ShapeId, pixel_ratio: f64) -> Option<Rect> {
        self.expanded_bounds_at(id, pixel_ratio, 0)
    }

    fn expanded_bounds_at(&self, id: &ShapeId, pixel_ratio: f64, depth: usize) -> Option<Rect> {
        if depth > MAX_NESTING {
            return None;
        }
        let shape = self.store.shape(id)?;
        let mut bounds = self.store.page_bounds(id)?;
        if shape.is_group() {
            let children = self.drawable_children(id);
            if children.len() <= self.config.max_group_children {
                for child in &children {
                    if let Some(r) = self.expanded_bounds_at(&child.id, pixel_ratio, depth + 1) {
                        bounds = bounds.union(r);
                    }
                }
            }
        }
        let stack = active_stack(shape.meta.effect_stack.as_ref());
        Some(margin_for_opt(stack.as_ref(), pixel_ratio).expand(bounds, pixel_ratio))
    }

    /// Rasterize `source` into a buffer covering `expanded_bounds` at `pixel_ratio`.
    ///
    /// `Ok(None)` means every strategy failed for some node; callers retry later.
    #[tracing::instrument(level = "debug", skip(self, source), fields(source = %source))]
    pub async fn rasterize(
        &self,
        source: &ShapeId,
        expanded_bounds: Rect,
        pixel_ratio: f64,
    ) -> FxResult<Option<PixelBuffer>> {
        let pr = sanitize_ratio(pixel_ratio);
        self.rasterize_node(source, expanded_bounds, pr, 0).await
    }

    fn rasterize_node<'a>(
        &'a self,
        id: &'a ShapeId,
        bounds: Rect,
        pr: f64,
        depth: usize,
    ) -> BoxFuture<'a, FxResult<Option<PixelBuffer>>> {
        async move {
            if depth > MAX_NESTING {
                return Err(FxError::validation(format!(
                    "shape '{id}' is nested deeper than {MAX_NESTING} levels"
                )));
            }
            let Some(shape) = self.store.shape(id) else {
                return Ok(None);
            };
            let (width, height) = device_size(bounds, pr);
            let max = self.config.max_surface_dim;
            if width > max || height > max {
                return Err(FxError::validation(format!(
                    "surface for '{id}' would be {width}x{height} (max {max})"
                )));
            }

            let base = match &shape.kind {
                ShapeKind::Proxy(_) => return Ok(None),
                ShapeKind::Leaf(_) => {
                    let ids = std::slice::from_ref(id);
                    let req = RasterRequest {
                        ids,
                        bounds,
                        pixel_ratio: pr,
                        width,
                        height,
                    };
                    match rasterize_with_fallback(&self.strategies, req).await {
                        Some(buf) => buf,
                        None => return Ok(None),
                    }
                }
                ShapeKind::Group => {
                    let children = self.drawable_children(id);
                    if children.len() > self.config.max_group_children {
                        tracing::debug!(
                            children = children.len(),
                            cap = self.config.max_group_children,
                            "group over child cap, exporting in one shot"
                        );
                        let ids = std::slice::from_ref(id);
                        let req = RasterRequest {
                            ids,
                            bounds,
                            pixel_ratio: pr,
                            width,
                            height,
                        };
                        match rasterize_with_fallback(&self.strategies, req).await {
                            Some(buf) => buf,
                            None => return Ok(None),
                        }
                    } else {
                        let mut canvas = PixelBuffer::new(width, height)?;
                        let mut drawn = 0usize;
                        for child in &children {
                            let Some(child_bounds) =
                                self.expanded_bounds_at(&child.id, pr, depth + 1)
                            else {
                                continue;
                            };
                            // Empty or failing children leave a gap; the rest still composite.
                            let buf = match self
                                .rasterize_node(&child.id, child_bounds, pr, depth + 1)
                                .await
                            {
                                Ok(Some(buf)) => buf,
                                Ok(None) => {
                                    tracing::debug!(child = %child.id, "child produced no pixels");
                                    continue;
                                }
                                Err(e) => {
                                    tracing::warn!(child = %child.id, error = %e, "child skipped");
                                    continue;
                                }
                            };
                            let dx = ((child_bounds.x0 - bounds.x0) * pr).round() as i32;
                            let dy = ((child_bounds.y0 - bounds.y0) * pr).round() as i32;
                            canvas.draw_over(&buf, dx, dy);
                            drawn += 1;
                        }
                        if drawn == 0 {
                            return Ok(None);
                        }
                        canvas
                    }
                }
            };

            match active_stack(shape.meta.effect_stack.as_ref()) {
                Some(stack) => Ok(Some(apply_stack(&base, &stack.scaled(pr))?)),
                None => Ok(Some(base)),
            }
        }
        .boxed()
    }

    // Children that contribute pixels: proxies and hidden shapes are skipped.
    fn drawable_children(&self, id: &ShapeId) -> Vec<Shape> {
        self.store
            .children(id)
            .into_iter()
            .filter(|c| !c.is_proxy() && !c.meta.hidden)
            .collect()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/raster/subtree.rs"]
mod tests;
