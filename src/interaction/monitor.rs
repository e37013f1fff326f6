use std::collections::BTreeSet;

use tokio::sync::watch;

use crate::foundation::core::{Point, ShapeId};

/// Pointer travel (page units) before a press on shapes turns into a drag.
pub const DEFAULT_DRAG_THRESHOLD: f64 = 3.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Gesture {
    Drag,
    Resize,
    Rotate,
}

/// What a pointer press landed on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PointerTarget {
    /// Shape bodies; becomes a drag once the pointer moves past the threshold.
    Shapes(BTreeSet<ShapeId>),
    ResizeHandle(BTreeSet<ShapeId>),
    RotateHandle(BTreeSet<ShapeId>),
    /// Empty canvas (marquee selection, panning): never an interaction.
    Canvas,
}

/// Published "interaction active" state.
///
/// `shapes: None` while active means the gesture is not scoped and every source counts as
/// manipulated.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InteractionSignal {
    pub active: bool,
    pub gesture: Option<Gesture>,
    pub shapes: Option<BTreeSet<ShapeId>>,
}

impl InteractionSignal {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn active(gesture: Gesture, shapes: Option<BTreeSet<ShapeId>>) -> Self {
        Self {
            active: true,
            gesture: Some(gesture),
            shapes,
        }
    }

    /// Whether any id in `related` is being manipulated.
    pub fn touches<'a>(&self, mut related: impl Iterator<Item = &'a ShapeId>) -> bool {
        if !self.active {
            return false;
        }
        match &self.shapes {
            None => true,
            Some(set) => related.any(|id| set.contains(id)),
        }
    }
}

#[derive(Debug)]
struct Press {
    shapes: BTreeSet<ShapeId>,
    origin: Point,
}

/// Turns pointer events into an [`InteractionSignal`] stream.
#[derive(Debug)]
pub struct InteractionMonitor {
    tx: watch::Sender<InteractionSignal>,
    pending: Option<Press>,
    drag_threshold: f64,
}

impl Default for InteractionMonitor {
    fn default() -> Self {
        Self::new(DEFAULT_DRAG_THRESHOLD)
    }
}

impl InteractionMonitor {
    pub fn new(drag_threshold: f64) -> Self {
        let (tx, _rx) = watch::channel(InteractionSignal::idle());
        Self {
            tx,
            pending: None,
            drag_threshold: if drag_threshold.is_finite() {
                drag_threshold.max(0.0)
            } else {
                DEFAULT_DRAG_THRESHOLD
            },
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<InteractionSignal> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> InteractionSignal {
        self.tx.borrow().clone()
    }

    pub fn is_active(&self) -> bool {
        self.tx.borrow().active
    }

    pub fn pointer_down(&mut self, target: PointerTarget, at: Point) {
        self.pending = None;
        match target {
            PointerTarget::Canvas => {}
            PointerTarget::Shapes(shapes) => {
                if !shapes.is_empty() {
                    self.pending = Some(Press { shapes, origin: at });
                }
            }
            PointerTarget::ResizeHandle(shapes) => {
                self.publish(InteractionSignal::active(Gesture::Resize, Some(shapes)));
            }
            PointerTarget::RotateHandle(shapes) => {
                self.publish(InteractionSignal::active(Gesture::Rotate, Some(shapes)));
            }
        }
    }

    pub fn pointer_move(&mut self, at: Point) {
        let Some(press) = &self.pending else {
            return;
        };
        if press.origin.distance(at) < self.drag_threshold {
            return;
        }
        if let Some(press) = self.pending.take() {
            tracing::trace!(shapes = press.shapes.len(), "drag started");
            self.publish(InteractionSignal::active(Gesture::Drag, Some(press.shapes)));
        }
    }

    pub fn pointer_up(&mut self) {
        self.pending = None;
        self.publish(InteractionSignal::idle());
    }

    pub fn cancel(&mut self) {
        self.pointer_up();
    }

    /// Publish a signal directly, for hosts with their own gesture recognizer.
    pub fn set(&self, signal: InteractionSignal) {
        self.publish(signal);
    }

    fn publish(&self, next: InteractionSignal) {
        self.tx.send_if_modified(|cur| {
            if *cur == next {
                false
            } else {
                *cur = next;
                true
            }
        });
    }
}

#[cfg(test)]
#[path = "../../tests/unit/interaction/monitor.rs"]
mod tests;
