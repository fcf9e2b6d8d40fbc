//! Gauge-exact reclamation lifecycle checks.
//!
//! These run in their own test binary on purpose: the gauges are
//! process-wide, and the crate's unit-test binary churns them from several
//! modules at once. Here the only writers are the tests below, serialized
//! by one lock, so exact equalities hold.

use memprobe_core::{gauge, ExternalAlloc, ResourceFactory, TrackedBuf};
use memprobe_probes::{BasicFactory, Reclaimer, TensorFactory};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

static GAUGE_LOCK: Mutex<()> = Mutex::new(());

fn locked() -> MutexGuard<'static, ()> {
    GAUGE_LOCK.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Wait out the background sweeper until the heap gauge settles at
/// `baseline` (bounded; sweeping a handful of buffers is microseconds).
fn settle_heap_to(baseline: u64) {
    for _ in 0..1_000 {
        if gauge::snapshot().heap_used_bytes == baseline {
            return;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    panic!(
        "heap gauge did not settle to {baseline} (now {})",
        gauge::snapshot().heap_used_bytes
    );
}

#[test]
fn detached_queue_holds_bytes_until_drained() {
    let _guard = locked();
    let before = gauge::snapshot();

    let reclaimer = Reclaimer::detached();
    reclaimer.defer_heap(TrackedBuf::zeroed(10_000));
    reclaimer.defer_external(ExternalAlloc::reserve(5_000));

    // Still accounted: dropping the handles only queued the memory.
    let queued = gauge::snapshot();
    assert_eq!(queued.heap_used_bytes, before.heap_used_bytes + 10_000);
    assert_eq!(queued.external_bytes, before.external_bytes + 5_000);
    assert_eq!(reclaimer.pending(), 2);

    assert_eq!(reclaimer.drain_now(), 2);
    let after = gauge::snapshot();
    assert_eq!(after.heap_used_bytes, before.heap_used_bytes);
    assert_eq!(after.external_bytes, before.external_bytes);
    assert_eq!(reclaimer.pending(), 0);
}

#[test]
fn basic_frees_inline_tensor_defers() {
    let _guard = locked();
    let baseline = gauge::snapshot().heap_used_bytes;

    // Inline: a Basic handle's bytes are gone the moment it drops.
    let mut basic = BasicFactory;
    for _ in 0..50 {
        drop(basic.produce().unwrap());
    }
    assert_eq!(gauge::snapshot().heap_used_bytes, baseline);

    // Deferred: a tensor's bytes survive the drop until swept.
    let mut tensors = TensorFactory::f32_default();
    drop(tensors.produce().unwrap());
    let _ = Reclaimer::global().drain_now();
    settle_heap_to(baseline);

    // The buffers really existed: high-water mark covers the tensor.
    assert!(gauge::snapshot().heap_total_bytes >= baseline + 400_000);
}
