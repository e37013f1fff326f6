//! fxproxy rasterizes effect-carrying shapes and keeps disposable "proxy" shapes in sync with
//! them inside a shared canvas document.
//!
//! The pieces, leaf first:
//!
//! - Pixel buffers and PNG/image codecs
//! - The effect stack executor ([`apply_stack`]) and its margin calculator ([`margin_for`])
//! - The [`SubtreeRasterizer`], which walks a source subtree through an ordered chain of
//!   rasterization strategies
//! - The [`ProxyEngine`], an async actor that watches a [`DocumentStore`] and owns proxy
//!   lifecycle, visibility and render scheduling
//! - The [`InteractionMonitor`], whose signal suspends renders while shapes are being dragged
#![forbid(unsafe_code)]

mod foundation;

pub(crate) mod document;
pub(crate) mod effects;
pub(crate) mod interaction;
pub(crate) mod pixels;
pub(crate) mod raster;
pub(crate) mod sync;

pub use crate::foundation::core::{Affine, Point, Rect, Rgba8, Rgba8Premul, ShapeId, Vec2};
pub use crate::foundation::error::{FxError, FxResult, StoreError};

pub use crate::pixels::buffer::PixelBuffer;
pub use crate::pixels::codec::{ImageHandle, decode_image, encode_png};

pub use crate::effects::bloom::bloom;
pub use crate::effects::blur::gaussian_blur;
pub use crate::effects::composite::{PremulRgba8, add, atop, atop_buffers, mix, over, over_buffers};
pub use crate::effects::config::{
    Distortion, Effect, EffectStackConfig, Ramp, RampStop, ShadowParams, active_stack,
};
pub use crate::effects::glitch::{GlitchParams, MoshParams, glitch, mosh};
pub use crate::effects::motion::motion_blur;
pub use crate::effects::noise::{doodle, grain};
pub use crate::effects::shadow::{drop_shadow, inner_shadow};
pub use crate::effects::stack::apply_stack;

pub use crate::raster::margin::{Margin, device_size, margin_for, margin_for_opt};
pub use crate::raster::sanitize::{SanitizeReport, sanitize, sanitize_svg};
pub use crate::raster::scene::SceneExporter;
pub use crate::raster::strategy::{
    NativeRasterizer, NativeStrategy, RasterRequest, RasterStrategy, VectorExportStrategy,
    VectorExporter, rasterize_with_fallback,
};
pub use crate::raster::subtree::{RasterConfig, SubtreeRasterizer};
pub use crate::raster::svg::SvgDecoder;

pub use crate::document::memory::InMemoryStore;
pub use crate::document::shape::{
    Geometry, LeafShape, ProxyShape, Shape, ShapeKind, ShapeMeta, ShapeStyle, ShapeUpdate,
};
pub use crate::document::store::{
    DocumentStore, Mutation, MutationBatch, MutationListener, Patch, PatchOp, SubscriptionId,
};

pub use crate::sync::cache::{RasterCache, RasterCacheEntry};
pub use crate::sync::config::EngineConfig;
pub use crate::sync::coverage::Coverage;
pub use crate::sync::engine::{EngineHandle, ProxyEngine};
pub use crate::sync::records::ProxyRecord;
pub use crate::sync::signature::{RenderSignature, render_signature};
pub use crate::sync::snapshot::{EngineSnapshot, EngineStats, SourceSnapshot};
pub use crate::sync::visibility::{SourceState, StateInputs, Visibility};

pub use crate::interaction::monitor::{
    DEFAULT_DRAG_THRESHOLD, Gesture, InteractionMonitor, InteractionSignal, PointerTarget,
};
