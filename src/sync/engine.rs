//! The proxy synchronization actor.
//!
//! One task per installed document. It owns every piece of engine state, so nothing here is
//! behind a lock; the outside world talks to it through [`EngineHandle`] commands, the store
//! listener and the interaction `watch`.

use std::collections::{BTreeMap, BTreeSet};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tokio::time::{Duration, Instant};

use crate::document::shape::{ProxyShape, Shape, ShapeKind, ShapeMeta, ShapeUpdate};
use crate::document::store::{DocumentStore, MutationBatch, Patch, SubscriptionId};
use crate::effects::config::active_stack;
use crate::foundation::core::{Rect, ShapeId};
use crate::foundation::error::{FxError, FxResult, StoreError};
use crate::interaction::monitor::InteractionSignal;
use crate::pixels::codec::{ImageHandle, encode_png};
use crate::raster::scene::SceneExporter;
use crate::raster::subtree::SubtreeRasterizer;
use crate::sync::cache::{RasterCache, RasterCacheEntry};
use crate::sync::config::EngineConfig;
use crate::sync::coverage::Coverage;
use crate::sync::guard::WriteGuard;
use crate::sync::records::ProxyRecord;
use crate::sync::signature::{RenderSignature, render_signature};
use crate::sync::snapshot::{EngineSnapshot, EngineStats, SourceSnapshot};
use crate::sync::state::{Completion, Retry, SyncState};
use crate::sync::visibility::{SourceState, StateInputs, Visibility};

/// Geometry deltas below this are not worth a store write.
const GEOMETRY_EPSILON: f64 = 1e-6;

/// Engine builder: collaborators plus configuration, started with [`ProxyEngine::install`].
pub struct ProxyEngine {
    store: Arc<dyn DocumentStore>,
    rasterizer: Arc<SubtreeRasterizer>,
    interaction: Option<watch::Receiver<InteractionSignal>>,
    config: EngineConfig,
}

impl std::fmt::Debug for ProxyEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyEngine")
            .field("rasterizer", &self.rasterizer)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ProxyEngine {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        rasterizer: Arc<SubtreeRasterizer>,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            rasterizer,
            interaction: None,
            config,
        }
    }

    /// Engine whose vector and native strategies both draw straight from `store`.
    pub fn with_scene_exporter(store: Arc<dyn DocumentStore>, config: EngineConfig) -> Self {
        let exporter = Arc::new(SceneExporter::new(store.clone()));
        let rasterizer = SubtreeRasterizer::new(
            store.clone(),
            exporter.clone(),
            exporter,
            config.raster.clone(),
        );
        Self::new(store, Arc::new(rasterizer), config)
    }

    /// Suspend renders for manipulated sources while `signal` reports an active gesture.
    pub fn with_interaction(mut self, signal: watch::Receiver<InteractionSignal>) -> Self {
        self.interaction = Some(signal);
        self
    }

    /// Subscribe to the store and spawn the engine on the current Tokio runtime.
    ///
    /// The first synchronization pass runs immediately.
    pub fn install(self) -> FxResult<EngineHandle> {
        self.config.validate()?;
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| FxError::engine(format!("install needs a Tokio runtime: {e}")))?;

        let (tx, rx) = mpsc::unbounded_channel();
        let guard = WriteGuard::new();

        let listener_tx = tx.clone();
        let listener_guard = guard.clone();
        let subscription = self.store.subscribe(Arc::new(move |batch: &MutationBatch| {
            if listener_guard.is_armed() {
                return;
            }
            // Fails only once the engine has stopped.
            let _ = listener_tx.send(Command::Mutated(batch.mutations.len()));
        }));

        let store = self.store.clone();
        let actor = Actor::new(self, rx, guard);
        let task = runtime.spawn(actor.run());
        tracing::debug!(subscription, "proxy engine installed");

        Ok(EngineHandle {
            store,
            subscription,
            commands: tx,
            task: Some(task),
        })
    }
}

#[derive(Debug)]
enum EditMode {
    Set(bool),
    Toggle,
}

enum Command {
    Mutated(usize),
    Sync,
    EditMode {
        source: ShapeId,
        mode: EditMode,
        reply: oneshot::Sender<FxResult<bool>>,
    },
    Snapshot(oneshot::Sender<EngineSnapshot>),
    Shutdown,
}

/// Owner's handle on an installed engine. Dropping it uninstalls the engine without waiting.
pub struct EngineHandle {
    store: Arc<dyn DocumentStore>,
    subscription: SubscriptionId,
    commands: mpsc::UnboundedSender<Command>,
    task: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for EngineHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineHandle")
            .field("subscription", &self.subscription)
            .field("running", &self.is_running())
            .finish()
    }
}

impl EngineHandle {
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Run a synchronization pass now instead of waiting for the debounce.
    pub fn request_sync(&self) -> FxResult<()> {
        self.send(Command::Sync)
    }

    /// Force `source` into (or out of) content editing. Returns the new mode.
    pub async fn set_edit_mode(&self, source: &ShapeId, editing: bool) -> FxResult<bool> {
        self.edit_mode(source, EditMode::Set(editing)).await
    }

    /// Flip `source`'s content-editing mode. Returns the new mode.
    pub async fn toggle_edit_mode(&self, source: &ShapeId) -> FxResult<bool> {
        self.edit_mode(source, EditMode::Toggle).await
    }

    pub async fn snapshot(&self) -> FxResult<EngineSnapshot> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Snapshot(reply))?;
        rx.await.map_err(|_| not_running())
    }

    /// Stop listening to the store and wait for the engine task to finish.
    ///
    /// Proxies stay in the document; a later install picks them up again.
    pub async fn uninstall(mut self) -> FxResult<()> {
        self.store.unsubscribe(self.subscription);
        let _ = self.commands.send(Command::Shutdown);
        if let Some(task) = self.task.take() {
            task.await
                .map_err(|e| FxError::engine(format!("engine task failed: {e}")))?;
        }
        tracing::debug!(subscription = self.subscription, "proxy engine uninstalled");
        Ok(())
    }

    async fn edit_mode(&self, source: &ShapeId, mode: EditMode) -> FxResult<bool> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::EditMode {
            source: source.clone(),
            mode,
            reply,
        })?;
        rx.await.map_err(|_| not_running())?
    }

    fn send(&self, command: Command) -> FxResult<()> {
        self.commands.send(command).map_err(|_| not_running())
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            self.store.unsubscribe(self.subscription);
            task.abort();
        }
    }
}

fn not_running() -> FxError {
    FxError::engine("proxy engine is not running")
}

#[derive(Debug)]
struct RenderedRaster {
    handle: ImageHandle,
    width: u32,
    height: u32,
}

struct RenderOutcome {
    source: ShapeId,
    proxy: ShapeId,
    token: u64,
    signature: RenderSignature,
    result: FxResult<RenderedRaster>,
}

struct Actor {
    store: Arc<dyn DocumentStore>,
    rasterizer: Arc<SubtreeRasterizer>,
    config: EngineConfig,
    guard: WriteGuard,
    commands: mpsc::UnboundedReceiver<Command>,
    interaction_rx: Option<watch::Receiver<InteractionSignal>>,
    interaction: InteractionSignal,

    state: SyncState,
    records: ProxyRecord,
    coverage: Coverage,
    cache: RasterCache,
    stats: EngineStats,
    /// Sorted z of page-level shapes, refreshed every pass.
    page_z: Vec<f64>,

    renders: JoinSet<RenderOutcome>,
    resync_at: Option<Instant>,
    render_at: Option<Instant>,
}

impl Actor {
    fn new(
        engine: ProxyEngine,
        commands: mpsc::UnboundedReceiver<Command>,
        guard: WriteGuard,
    ) -> Self {
        Self {
            store: engine.store,
            rasterizer: engine.rasterizer,
            config: engine.config,
            guard,
            commands,
            interaction_rx: engine.interaction,
            interaction: InteractionSignal::idle(),
            state: SyncState::new(),
            records: ProxyRecord::default(),
            coverage: Coverage::default(),
            cache: RasterCache::new(),
            stats: EngineStats::default(),
            page_z: Vec::new(),
            renders: JoinSet::new(),
            resync_at: None,
            render_at: None,
        }
    }

    async fn run(mut self) {
        if let Some(rx) = &mut self.interaction_rx {
            self.interaction = rx.borrow_and_update().clone();
        }
        self.sync_pass();

        loop {
            tokio::select! {
                command = self.commands.recv() => {
                    let Some(command) = command else { break };
                    if !self.handle(command) {
                        break;
                    }
                }
                signal = next_signal(&mut self.interaction_rx) => self.on_interaction(signal),
                Some(joined) = self.renders.join_next() => self.on_joined(joined),
                () = sleep_until_opt(self.resync_at) => {
                    self.resync_at = None;
                    self.sync_pass();
                }
                () = sleep_until_opt(self.render_at) => {
                    self.render_at = None;
                    self.pump_renders();
                }
            }
        }

        self.renders.abort_all();
        tracing::debug!(
            passes = self.stats.sync_passes,
            applied = self.stats.renders_applied,
            "proxy engine stopped"
        );
    }

    /// Returns false when the engine should stop.
    fn handle(&mut self, command: Command) -> bool {
        match command {
            Command::Mutated(mutations) => {
                self.stats.mutation_batches += 1;
                tracing::trace!(mutations, "document changed, resync debounced");
                self.resync_at = Some(Instant::now() + self.config.resync_debounce());
            }
            Command::Sync => {
                self.resync_at = None;
                self.sync_pass();
            }
            Command::EditMode {
                source,
                mode,
                reply,
            } => {
                let result = self.apply_edit_mode(&source, mode);
                let _ = reply.send(result);
                self.resync_at = None;
                self.sync_pass();
            }
            Command::Snapshot(reply) => {
                let _ = reply.send(self.snapshot());
            }
            Command::Shutdown => return false,
        }
        true
    }

    fn apply_edit_mode(&mut self, source: &ShapeId, mode: EditMode) -> FxResult<bool> {
        let shape = self
            .store
            .shape(source)
            .ok_or_else(|| StoreError::NotFound(source.clone()))?;
        let editing = match mode {
            EditMode::Set(on) => on,
            EditMode::Toggle => !shape.meta.edit_mode,
        };
        if editing != shape.meta.edit_mode {
            let guard = self.guard.clone();
            let _scope = guard.arm();
            self.store.update(
                source,
                ShapeUpdate {
                    edit_mode: Some(editing),
                    ..ShapeUpdate::default()
                },
            )?;
            tracing::debug!(source = %source, editing, "edit mode changed");
        }
        Ok(editing)
    }

    fn on_interaction(&mut self, signal: Option<InteractionSignal>) {
        let signal = signal.unwrap_or_else(|| {
            // The monitor went away; nothing can be manipulated any more.
            self.interaction_rx = None;
            InteractionSignal::idle()
        });
        if signal == self.interaction {
            return;
        }
        tracing::debug!(
            active = signal.active,
            gesture = ?signal.gesture,
            "interaction changed"
        );
        self.interaction = signal;
        self.sync_pass();
    }

    #[tracing::instrument(level = "debug", skip(self), fields(pass = self.stats.sync_passes + 1))]
    fn sync_pass(&mut self) {
        self.stats.sync_passes += 1;
        let pr = self.config.pixel_ratio;
        let shapes = self.store.all_shapes();
        let by_id: BTreeMap<&ShapeId, &Shape> = shapes.iter().map(|s| (&s.id, s)).collect();
        self.page_z = shapes
            .iter()
            .filter(|s| s.parent.is_none() && !s.is_proxy())
            .map(|s| s.z_index)
            .collect();
        self.page_z.sort_by(f64::total_cmp);

        // 1. Proxy records from the document.
        self.records = ProxyRecord::scan(&shapes);

        // 2. Orphaned and duplicate proxies.
        for proxy in self.records.garbage().to_vec() {
            tracing::debug!(proxy = %proxy, "deleting orphaned proxy");
            self.cache.remove(&proxy);
            self.write(Patch::new().delete(proxy), "delete orphaned proxy");
        }

        let sources: BTreeSet<ShapeId> = shapes
            .iter()
            .filter(|s| !s.is_proxy() && active_stack(s.meta.effect_stack.as_ref()).is_some())
            .map(|s| s.id.clone())
            .collect();
        for gone in self.state.retain_only(&sources) {
            tracing::debug!(source = %gone, "source dropped");
        }

        // 3. Coverage.
        self.coverage = Coverage::compute(self.store.as_ref(), &sources);

        // 4. Proxy lifecycle.
        let unneeded: Vec<(ShapeId, ShapeId)> = self
            .records
            .iter()
            .filter(|(source, _)| !sources.contains(*source))
            .map(|(s, p)| (s.clone(), p.clone()))
            .collect();
        for (source, proxy) in unneeded {
            // Show the source before its proxy disappears.
            let mut patch = Patch::new();
            if by_id.get(&source).is_some_and(|s| s.meta.hidden) {
                patch = patch.update(source.clone(), ShapeUpdate::hidden(false));
            }
            patch = patch.delete(proxy.clone());
            if self.write(patch, "retire proxy") {
                tracing::debug!(source = %source, proxy = %proxy, "effect stack cleared, proxy deleted");
                self.records.remove(&source);
                self.cache.remove(&proxy);
            }
        }
        for source in &sources {
            if self.records.proxy_of(source).is_none() {
                self.create_proxy(source, &by_id);
            } else if self.coverage.is_covered(source) {
                // Settle covered sources before hashing so their ancestors see final flags.
                let covered = Visibility::for_state(SourceState::RenderPending, true);
                self.apply_visibility(source, covered);
            }
        }

        // 5. Signatures and the dirty set.
        for source in &sources {
            let covered = self.coverage.is_covered(source);
            let Some(signature) = render_signature(self.store.as_ref(), source, pr) else {
                continue;
            };
            if self.state.observe(source, signature, covered) {
                tracing::debug!(source = %source, %signature, covered, "signature changed");
            }
            let has_raster = self
                .records
                .proxy_of(source)
                .is_some_and(|p| self.cache.contains(p));
            if !has_raster {
                self.state.clear_rendered(source);
            }
        }

        // 6. State machine and visibility.
        let mut released = false;
        for source in &sources {
            released |= self.settle(source);
        }

        // 7. Hand the dirty set to the render loop.
        let delay = if released {
            Duration::ZERO
        } else {
            self.config.render_debounce()
        };
        self.schedule_renders(delay);
    }

    fn create_proxy(&mut self, source: &ShapeId, by_id: &BTreeMap<&ShapeId, &Shape>) {
        let pr = self.config.pixel_ratio;
        let Some(bounds) = self.rasterizer.expanded_bounds(source, pr) else {
            return;
        };
        let id = ShapeId::proxy_for(source);
        if by_id.get(&id).is_some_and(|s| !s.is_proxy()) {
            tracing::warn!(source = %source, proxy = %id, "proxy id already taken by another shape");
            return;
        }
        let proxy = Shape {
            id: id.clone(),
            parent: None,
            z_index: self.proxy_z(source),
            x: bounds.x0,
            y: bounds.y0,
            rotation: 0.0,
            kind: ShapeKind::Proxy(ProxyShape {
                source: source.clone(),
                width: bounds.width(),
                height: bounds.height(),
                image: None,
            }),
            meta: ShapeMeta {
                hidden: true,
                ..ShapeMeta::default()
            },
        };
        if self.write(Patch::new().create(proxy), "create proxy") {
            tracing::debug!(source = %source, proxy = %id, "proxy created");
            self.cache.remove(&id);
            self.records.insert(source.clone(), id);
            self.state.clear_rendered(source);
        }
    }

    /// Resolve `source`'s state and push the matching flags and bounds to the document.
    /// Returns whether the source just left a suspended state with a render owed.
    fn settle(&mut self, source: &ShapeId) -> bool {
        let Some(shape) = self.store.shape(source) else {
            return false;
        };
        let Some(entry) = self.state.get(source) else {
            return false;
        };
        let inputs = StateInputs {
            editing: shape.meta.edit_mode,
            interacting: self.is_interacting(source),
            raster_current: entry.raster_current(),
        };
        let next = SourceState::resolve(inputs);
        let mut released = false;
        if let Some(prev) = self.state.set_state(source, next)
            && prev != next
        {
            tracing::debug!(source = %source, from = ?prev, to = ?next, "source state changed");
            released = prev.is_suspended() && next == SourceState::RenderPending;
        }
        let covered = self.coverage.is_covered(source);
        self.apply_visibility(source, Visibility::for_state(next, covered));
        released
    }

    fn apply_visibility(&mut self, source: &ShapeId, vis: Visibility) {
        let Some(proxy_id) = self.records.proxy_of(source).cloned() else {
            return;
        };
        let (Some(src), Some(proxy)) = (self.store.shape(source), self.store.shape(&proxy_id))
        else {
            return;
        };
        let ShapeKind::Proxy(payload) = &proxy.kind else {
            return;
        };

        let mut proxy_update = ShapeUpdate::default();
        if let Some(b) = self.rasterizer.expanded_bounds(source, self.config.pixel_ratio) {
            if differs(proxy.x, b.x0) || differs(proxy.y, b.y0) {
                proxy_update.x = Some(b.x0);
                proxy_update.y = Some(b.y0);
            }
            if differs(payload.width, b.width()) || differs(payload.height, b.height()) {
                proxy_update.kind = Some(ShapeKind::Proxy(ProxyShape {
                    width: b.width(),
                    height: b.height(),
                    ..payload.clone()
                }));
            }
        }
        let z = self.proxy_z(source);
        if differs(proxy.z_index, z) {
            proxy_update.z_index = Some(z);
        }
        if proxy.meta.hidden != vis.proxy_hidden {
            proxy_update.hidden = Some(vis.proxy_hidden);
        }
        // Ready means "showing a raster for the current content".
        let ready = !vis.proxy_hidden;
        if proxy.meta.proxy_ready != ready {
            proxy_update.proxy_ready = Some(ready);
        }
        let source_update = if src.meta.hidden != vis.source_hidden {
            ShapeUpdate::hidden(vis.source_hidden)
        } else {
            ShapeUpdate::default()
        };

        // Whatever becomes visible goes first, so a partial reader never sees neither.
        let ordered = if vis.source_hidden {
            [(proxy_id, proxy_update), (source.clone(), source_update)]
        } else {
            [(source.clone(), source_update), (proxy_id, proxy_update)]
        };
        let mut patch = Patch::new();
        for (id, update) in ordered {
            if !update.is_empty() {
                patch = patch.update(id, update);
            }
        }
        self.write(patch, "sync proxy");
    }

    fn is_interacting(&self, source: &ShapeId) -> bool {
        if !self.interaction.active {
            return false;
        }
        if self.interaction.shapes.is_none() {
            return true;
        }
        let mut related = vec![ShapeId::proxy_for(source)];
        if let Some(p) = self.records.proxy_of(source) {
            related.push(p.clone());
        }
        related.extend(self.store.ancestors(source));
        related.extend(self.store.subtree(source));
        self.interaction.touches(related.iter())
    }

    /// Between the source's top-level ancestor and the next page-level shape above it.
    fn proxy_z(&self, source: &ShapeId) -> f64 {
        let top = self
            .store
            .ancestors(source)
            .pop()
            .unwrap_or_else(|| source.clone());
        let top_z = self.store.shape(&top).map_or(0.0, |s| s.z_index);
        match self.page_z.iter().copied().find(|z| *z > top_z) {
            Some(next) => top_z + (next - top_z) / 2.0,
            None => top_z + 1.0,
        }
    }

    fn schedule_renders(&mut self, delay: Duration) {
        let now = Instant::now();
        if !self.state.renderable(now).is_empty() {
            let at = now + delay;
            self.render_at = Some(match self.render_at {
                Some(cur) if delay.is_zero() => cur.min(at),
                _ => at,
            });
        } else if let Some(retry) = self.state.next_retry(now) {
            self.render_at = Some(self.render_at.map_or(retry, |cur| cur.min(retry)));
        }
    }

    fn pump_renders(&mut self) {
        let now = Instant::now();
        let pr = self.config.pixel_ratio;
        let mut capacity = self
            .config
            .max_in_flight
            .saturating_sub(self.state.in_flight_count());

        for source in self.state.renderable(now) {
            if capacity == 0 {
                break;
            }
            let Some(proxy) = self.records.proxy_of(&source).cloned() else {
                continue;
            };
            let Some(bounds) = self.rasterizer.expanded_bounds(&source, pr) else {
                continue;
            };
            let Some((token, signature)) = self.state.issue(&source) else {
                continue;
            };
            capacity -= 1;
            self.stats.renders_issued += 1;
            tracing::debug!(source = %source, token, "render issued");

            let rasterizer = self.rasterizer.clone();
            let timeout = self.config.render_timeout();
            self.renders.spawn(async move {
                let attempt = AssertUnwindSafe(render(&rasterizer, &source, bounds, pr));
                let result = match tokio::time::timeout(timeout, attempt.catch_unwind()).await {
                    Ok(Ok(result)) => result,
                    Ok(Err(_)) => Err(FxError::engine("render panicked")),
                    Err(_) => Err(FxError::Timeout(timeout)),
                };
                RenderOutcome {
                    source,
                    proxy,
                    token,
                    signature,
                    result,
                }
            });
        }

        if let Some(retry) = self.state.next_retry(now) {
            self.render_at = Some(self.render_at.map_or(retry, |cur| cur.min(retry)));
        }
    }

    fn on_joined(&mut self, joined: Result<RenderOutcome, JoinError>) {
        match joined {
            Ok(outcome) => self.on_render_done(outcome),
            Err(e) if e.is_cancelled() => {}
            Err(e) => tracing::warn!(error = %e, "render task failed"),
        }
    }

    fn on_render_done(&mut self, outcome: RenderOutcome) {
        let RenderOutcome {
            source,
            proxy,
            token,
            signature,
            result,
        } = outcome;

        if self.state.complete(&source, token) == Completion::Stale
            || self.records.proxy_of(&source) != Some(&proxy)
        {
            self.stats.renders_discarded += 1;
            tracing::debug!(source = %source, token, "stale render discarded");
            self.pump_renders();
            return;
        }

        let failure = match result {
            Ok(raster) => match self.attach(&source, &proxy, raster, signature) {
                Ok(()) => None,
                Err(e) => Some(e),
            },
            Err(e) => Some(e),
        };
        if let Some(err) = failure {
            self.record_failure(&source, err);
        }
        self.pump_renders();
    }

    fn attach(
        &mut self,
        source: &ShapeId,
        proxy: &ShapeId,
        raster: RenderedRaster,
        signature: RenderSignature,
    ) -> FxResult<()> {
        let shape = self
            .store
            .shape(proxy)
            .ok_or_else(|| StoreError::NotFound(proxy.clone()))?;
        let ShapeKind::Proxy(payload) = shape.kind else {
            return Err(FxError::engine(format!("'{proxy}' is no longer a proxy")));
        };
        let update = ShapeUpdate {
            kind: Some(ShapeKind::Proxy(ProxyShape {
                image: Some(raster.handle.clone()),
                ..payload
            })),
            ..ShapeUpdate::default()
        };
        {
            let guard = self.guard.clone();
            let _scope = guard.arm();
            self.store.apply(Patch::new().update(proxy.clone(), update))?;
        }

        self.cache.insert(
            proxy.clone(),
            RasterCacheEntry {
                handle: raster.handle,
                width: raster.width,
                height: raster.height,
                rendered_at: Instant::now(),
            },
        );
        self.state.mark_rendered(source, signature);
        self.stats.renders_applied += 1;
        tracing::debug!(
            source = %source,
            width = raster.width,
            height = raster.height,
            "raster applied"
        );
        self.settle(source);
        Ok(())
    }

    fn record_failure(&mut self, source: &ShapeId, err: FxError) {
        match err {
            FxError::Timeout(_) => self.stats.renders_timed_out += 1,
            FxError::Store(_) => {
                self.stats.renders_failed += 1;
                self.stats.writes_rejected += 1;
            }
            _ => self.stats.renders_failed += 1,
        }
        let retry = self.state.mark_failed(
            source,
            Instant::now(),
            self.config.retry_delay(),
            self.config.max_render_attempts,
        );
        match retry {
            Some(Retry::At(_)) => tracing::warn!(
                source = %source,
                error = %err,
                recoverable = err.is_recoverable(),
                retry_ms = self.config.retry_delay_ms,
                "render failed, will retry"
            ),
            Some(Retry::Parked) => tracing::warn!(
                source = %source,
                error = %err,
                attempts = self.config.max_render_attempts,
                "render keeps failing, parked until the source changes"
            ),
            None => {}
        }
    }

    /// Apply a patch as the engine. Rejections are logged and trigger a delayed resync.
    fn write(&mut self, patch: Patch, what: &'static str) -> bool {
        if patch.is_empty() {
            return true;
        }
        let guard = self.guard.clone();
        let _scope = guard.arm();
        match self.store.apply(patch) {
            Ok(()) => true,
            Err(e) => {
                self.stats.writes_rejected += 1;
                tracing::warn!(error = %e, what, "engine write rejected");
                let retry = Instant::now() + self.config.retry_delay();
                self.resync_at = Some(self.resync_at.map_or(retry, |cur| cur.min(retry)));
                false
            }
        }
    }

    fn snapshot(&self) -> EngineSnapshot {
        let sources = self
            .state
            .iter()
            .map(|(id, e)| {
                (
                    id.clone(),
                    SourceSnapshot {
                        state: e.state,
                        proxy: self.records.proxy_of(id).cloned(),
                        dirty: e.is_dirty(),
                        token: e.token,
                        in_flight: e.in_flight.is_some(),
                        attempts: e.attempts,
                        parked: e.parked,
                        covered_by: self.coverage.cover_of(id).cloned(),
                        signature: e.signature.map(|s| s.to_string()),
                    },
                )
            })
            .collect();
        EngineSnapshot {
            sources,
            dirty: self.state.dirty(),
            proxies: self
                .records
                .iter()
                .map(|(s, p)| (s.clone(), p.clone()))
                .collect(),
            covered: self.coverage.covered().clone(),
            ambiguous_coverage: self.coverage.ambiguous().clone(),
            cache: self.cache.summary(),
            interacting: self.interaction.active,
            stats: self.stats.clone(),
        }
    }
}

async fn render(
    rasterizer: &SubtreeRasterizer,
    source: &ShapeId,
    bounds: Rect,
    pixel_ratio: f64,
) -> FxResult<RenderedRaster> {
    let buffer = rasterizer
        .rasterize(source, bounds, pixel_ratio)
        .await?
        .ok_or_else(|| FxError::export(format!("no strategy produced pixels for '{source}'")))?;
    let png = encode_png(&buffer)?;
    Ok(RenderedRaster {
        handle: ImageHandle::from_png(&png),
        width: buffer.width(),
        height: buffer.height(),
    })
}

async fn next_signal(
    rx: &mut Option<watch::Receiver<InteractionSignal>>,
) -> Option<InteractionSignal> {
    match rx {
        Some(rx) => match rx.changed().await {
            Ok(()) => Some(rx.borrow_and_update().clone()),
            Err(_) => None,
        },
        None => std::future::pending().await,
    }
}

async fn sleep_until_opt(at: Option<Instant>) {
    match at {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

fn differs(a: f64, b: f64) -> bool {
    (a - b).abs() > GEOMETRY_EPSILON
}
