//! Deferred reclamation for engine-side handles.
//!
//! Engine-owned memory is not freed the instant a handle drops: the handle
//! queues its buffers here, and a background sweeper thread releases them
//! when it gets scheduled. A tight drive loop can therefore out-pace
//! reclamation and watch the gauges climb — the exact effect the eager and
//! cooperative run modes exist to compare. The queue makes that lifetime
//! explicit instead of leaving it to whichever collector the host runtime
//! happens to have.
//!
//! Tests that need determinism call [`Reclaimer::drain_now`] instead of
//! racing the sweeper.

use memprobe_core::{ExternalAlloc, TrackedBuf};
use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, OnceLock, PoisonError};
use std::thread;
use tracing::warn;

/// One queued release: heap bytes or a native-side reservation.
#[derive(Debug)]
enum Reclaim {
    Heap(TrackedBuf),
    External(ExternalAlloc),
}

#[derive(Debug, Default)]
struct Shared {
    queue: Mutex<VecDeque<Reclaim>>,
    wake: Condvar,
}

fn lock(shared: &Shared) -> MutexGuard<'_, VecDeque<Reclaim>> {
    shared.queue.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Hands dropped buffers to a sweeper thread for later release.
#[derive(Debug)]
pub struct Reclaimer {
    shared: Arc<Shared>,
}

static GLOBAL: OnceLock<Reclaimer> = OnceLock::new();

impl Reclaimer {
    /// The process-wide reclaimer every engine-side handle defers into.
    ///
    /// The sweeper thread is started on first use and lives for the rest of
    /// the process.
    pub fn global() -> &'static Self {
        GLOBAL.get_or_init(Self::with_sweeper)
    }

    /// A reclaimer with a running background sweeper.
    #[must_use]
    fn with_sweeper() -> Self {
        let this = Self::detached();
        let worker = Arc::clone(&this.shared);
        let spawned = thread::Builder::new()
            .name("memprobe-sweeper".to_owned())
            .spawn(move || sweep_loop(&worker));
        if spawned.is_err() {
            // Queue still works; callers fall back to drain_now.
            warn!("failed to spawn reclamation sweeper; deferred memory will pool until drained");
        }
        this
    }

    /// A reclaimer with no sweeper thread: items pool until [`Self::drain_now`].
    ///
    /// Used by tests that must observe the queue deterministically.
    #[must_use]
    pub fn detached() -> Self {
        Self {
            shared: Arc::new(Shared::default()),
        }
    }

    /// Queue heap bytes for later release.
    pub fn defer_heap(&self, buf: TrackedBuf) {
        self.defer(Reclaim::Heap(buf));
    }

    /// Queue a native-side reservation for later release.
    pub fn defer_external(&self, reservation: ExternalAlloc) {
        self.defer(Reclaim::External(reservation));
    }

    fn defer(&self, item: Reclaim) {
        lock(&self.shared).push_back(item);
        self.shared.wake.notify_one();
    }

    /// Number of queued releases not yet swept.
    #[must_use]
    pub fn pending(&self) -> usize {
        lock(&self.shared).len()
    }

    /// Synchronously release everything queued; returns how many items.
    pub fn drain_now(&self) -> usize {
        let drained: Vec<Reclaim> = lock(&self.shared).drain(..).collect();
        let n = drained.len();
        drop(drained); // release outside the lock
        n
    }
}

fn sweep_loop(shared: &Shared) {
    loop {
        let item = {
            let mut q = lock(shared);
            loop {
                if let Some(item) = q.pop_front() {
                    break item;
                }
                q = shared
                    .wake
                    .wait(q)
                    .unwrap_or_else(PoisonError::into_inner);
            }
        };
        drop(item); // the actual free happens outside the lock
    }
}
