use std::sync::Arc;
use std::thread::ThreadId;

use parking_lot::Mutex;

/// "The engine is writing" flag shared between the engine and its store listener.
///
/// Store listeners run synchronously on the writing thread, so the flag remembers which thread
/// armed it: batches produced by the engine's own writes are dropped, while a concurrent user
/// write from another thread still gets through.
#[derive(Clone, Debug, Default)]
pub(crate) struct WriteGuard {
    owner: Arc<Mutex<Option<(ThreadId, usize)>>>,
}

impl WriteGuard {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Arm for the current thread until the returned scope is dropped. Scopes nest.
    pub(crate) fn arm(&self) -> GuardScope<'_> {
        let me = std::thread::current().id();
        let mut owner = self.owner.lock();
        *owner = match *owner {
            Some((tid, depth)) if tid == me => Some((tid, depth + 1)),
            _ => Some((me, 1)),
        };
        GuardScope { guard: self }
    }

    /// Whether a write on the current thread is one of the engine's own.
    pub(crate) fn is_armed(&self) -> bool {
        let me = std::thread::current().id();
        matches!(*self.owner.lock(), Some((tid, _)) if tid == me)
    }
}

pub(crate) struct GuardScope<'a> {
    guard: &'a WriteGuard,
}

impl Drop for GuardScope<'_> {
    fn drop(&mut self) {
        let mut owner = self.guard.owner.lock();
        *owner = match *owner {
            Some((tid, depth)) if depth > 1 => Some((tid, depth - 1)),
            _ => None,
        };
    }
}

#[cfg(test)]
#[path = "../../tests/unit/sync/guard.rs"]
mod tests;
