#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;

use fxproxy::{
    DocumentStore, Effect, EffectStackConfig, EngineConfig, EngineHandle, FxError, FxResult,
    InMemoryStore, NativeRasterizer, ProxyEngine, Rect, SceneExporter, Shape, ShapeId, ShapeKind,
    ShadowParams, SubtreeRasterizer, VectorExporter,
};

/// How an export call behaves, by call number.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Delegate to the scene exporter.
    Pass,
    /// Wait for [`ScriptedExporter::open`], then delegate.
    Gated,
    /// Never finish.
    Hang,
    /// Fail with an export error.
    Fail,
}

/// Scene exporter whose first calls follow a script; later calls pass through.
pub struct ScriptedExporter {
    inner: SceneExporter,
    script: parking_lot::Mutex<Vec<Mode>>,
    gate: tokio::sync::Notify,
    vector_calls: AtomicUsize,
    native_calls: AtomicUsize,
}

impl ScriptedExporter {
    pub fn new(store: Arc<dyn DocumentStore>, script: Vec<Mode>) -> Arc<Self> {
        Arc::new(Self {
            inner: SceneExporter::new(store),
            script: parking_lot::Mutex::new(script),
            gate: tokio::sync::Notify::new(),
            vector_calls: AtomicUsize::new(0),
            native_calls: AtomicUsize::new(0),
        })
    }

    pub fn passthrough(store: Arc<dyn DocumentStore>) -> Arc<Self> {
        Self::new(store, Vec::new())
    }

    /// Release every gated call, now and later.
    pub fn open(&self) {
        self.gate.notify_waiters();
        self.gate.notify_one();
    }

    pub fn vector_calls(&self) -> usize {
        self.vector_calls.load(Ordering::SeqCst)
    }

    pub fn native_calls(&self) -> usize {
        self.native_calls.load(Ordering::SeqCst)
    }

    fn next_mode(&self) -> Mode {
        let mut script = self.script.lock();
        if script.is_empty() {
            Mode::Pass
        } else {
            script.remove(0)
        }
    }
}

impl VectorExporter for ScriptedExporter {
    fn export_svg<'a>(
        &'a self,
        ids: &'a [ShapeId],
        bounds: Rect,
        pixel_ratio: f64,
    ) -> BoxFuture<'a, FxResult<Option<String>>> {
        self.vector_calls.fetch_add(1, Ordering::SeqCst);
        let mode = self.next_mode();
        async move {
            match mode {
                Mode::Pass => {}
                Mode::Gated => self.gate.notified().await,
                Mode::Hang => std::future::pending::<()>().await,
                Mode::Fail => return Err(FxError::export("scripted failure")),
            }
            self.inner.export_svg(ids, bounds, pixel_ratio).await
        }
        .boxed()
    }
}

impl NativeRasterizer for ScriptedExporter {
    fn rasterize<'a>(
        &'a self,
        ids: &'a [ShapeId],
        bounds: Rect,
        pixel_ratio: f64,
    ) -> BoxFuture<'a, FxResult<Vec<u8>>> {
        self.native_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.rasterize(ids, bounds, pixel_ratio)
    }
}

pub fn config() -> EngineConfig {
    EngineConfig {
        pixel_ratio: 1.0,
        ..EngineConfig::default()
    }
}

pub fn engine(store: Arc<InMemoryStore>, exporter: Arc<ScriptedExporter>) -> ProxyEngine {
    let cfg = config();
    let rasterizer = SubtreeRasterizer::new(
        store.clone(),
        exporter.clone(),
        exporter,
        cfg.raster.clone(),
    );
    ProxyEngine::new(store, Arc::new(rasterizer), cfg)
}

pub fn install(store: Arc<InMemoryStore>) -> EngineHandle {
    ProxyEngine::with_scene_exporter(store, config())
        .install()
        .expect("install engine")
}

/// Let debounces expire and in-flight renders land.
pub async fn settle() {
    tokio::time::sleep(Duration::from_secs(2)).await;
}

pub fn shadow(offset: f64, blur: f64) -> EffectStackConfig {
    EffectStackConfig {
        effects: vec![Effect::DropShadow(ShadowParams {
            offset_x: offset,
            offset_y: offset,
            blur,
            ..ShadowParams::default()
        })],
        distortions: vec![],
    }
}

pub fn id(s: &str) -> ShapeId {
    ShapeId::from(s)
}

pub fn proxy_id(source: &str) -> ShapeId {
    ShapeId::proxy_for(&id(source))
}

pub fn shape(store: &InMemoryStore, s: &ShapeId) -> Shape {
    store
        .shape(s)
        .unwrap_or_else(|| panic!("shape '{s}' missing"))
}

pub fn has_image(proxy: &Shape) -> bool {
    matches!(&proxy.kind, ShapeKind::Proxy(p) if p.image.is_some())
}

pub fn proxies(store: &InMemoryStore) -> Vec<Shape> {
    store.all_shapes().into_iter().filter(Shape::is_proxy).collect()
}
