use std::time::Duration;

use crate::foundation::error::{FxError, FxResult};
use crate::raster::subtree::RasterConfig;

/// Largest pixel ratio the engine will render at.
const MAX_PIXEL_RATIO: f64 = 8.0;

/// Engine tuning. Every field has a default, so `{}` is a valid JSON config.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Device pixels per page unit for proxy rasters.
    pub pixel_ratio: f64,
    /// Quiet period after the last document mutation before a sync pass runs.
    pub resync_debounce_ms: u64,
    /// Quiet period after a pass marks sources dirty before renders are issued.
    pub render_debounce_ms: u64,
    /// Budget for one render call; exceeding it counts as a failed attempt.
    pub render_timeout_ms: u64,
    /// Renders allowed in flight at once.
    pub max_in_flight: usize,
    /// Failed attempts before a source is parked until it changes.
    pub max_render_attempts: u32,
    pub retry_delay_ms: u64,
    pub raster: RasterConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            pixel_ratio: 2.0,
            resync_debounce_ms: 120,
            render_debounce_ms: 250,
            render_timeout_ms: 8000,
            max_in_flight: 2,
            max_render_attempts: 5,
            retry_delay_ms: 1000,
            raster: RasterConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(s: &str) -> FxResult<Self> {
        let config: Self = serde_json::from_str(s)
            .map_err(|e| FxError::validation(format!("engine config json: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> FxResult<()> {
        if !self.pixel_ratio.is_finite() || self.pixel_ratio <= 0.0 {
            return Err(FxError::validation("pixelRatio must be finite and > 0"));
        }
        if self.pixel_ratio > MAX_PIXEL_RATIO {
            return Err(FxError::validation(format!(
                "pixelRatio must be <= {MAX_PIXEL_RATIO}"
            )));
        }
        if self.render_timeout_ms == 0 {
            return Err(FxError::validation("renderTimeoutMs must be > 0"));
        }
        if self.max_in_flight == 0 {
            return Err(FxError::validation("maxInFlight must be >= 1"));
        }
        if self.max_render_attempts == 0 {
            return Err(FxError::validation("maxRenderAttempts must be >= 1"));
        }
        if self.raster.max_group_children == 0 {
            return Err(FxError::validation("raster.maxGroupChildren must be >= 1"));
        }
        if self.raster.alpha_probe_grid == 0 {
            return Err(FxError::validation("raster.alphaProbeGrid must be >= 1"));
        }
        if self.raster.max_surface_dim == 0 {
            return Err(FxError::validation("raster.maxSurfaceDim must be >= 1"));
        }
        Ok(())
    }

    pub fn resync_debounce(&self) -> Duration {
        Duration::from_millis(self.resync_debounce_ms)
    }

    pub fn render_debounce(&self) -> Duration {
        Duration::from_millis(self.render_debounce_ms)
    }

    pub fn render_timeout(&self) -> Duration {
        Duration::from_millis(self.render_timeout_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/sync/config.rs"]
mod tests;
