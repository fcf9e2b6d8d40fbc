//! Process-wide allocation gauges and RAII tracking guards.
//!
//! Probed resources account their memory through these gauges instead of
//! relying on ad-hoc heap polling: [`TrackedBuf`] owns heap bytes and
//! [`ExternalAlloc`] represents native/off-heap bytes, and both adjust the
//! counters on construction and drop. The sampler reads a [`GaugeSnapshot`]
//! per sample; the iteration-indexed sample contract is unaffected by who
//! updates the counters.
//!
//! Counters are monotone adjust-only atomics, safe to touch from the drive
//! loop, the reclamation sweeper, and the sampler concurrently.

use std::sync::atomic::{AtomicU64, Ordering};

static HEAP_USED: AtomicU64 = AtomicU64::new(0);
static HEAP_PEAK: AtomicU64 = AtomicU64::new(0);
static EXTERNAL: AtomicU64 = AtomicU64::new(0);

/// Point-in-time view of the gauges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GaugeSnapshot {
    /// Live tracked heap bytes.
    pub heap_used_bytes: u64,
    /// High-water mark of live tracked heap bytes.
    pub heap_total_bytes: u64,
    /// Live native/off-heap bytes.
    pub external_bytes: u64,
}

/// Read all gauges at once.
#[must_use]
pub fn snapshot() -> GaugeSnapshot {
    GaugeSnapshot {
        heap_used_bytes: HEAP_USED.load(Ordering::Relaxed),
        heap_total_bytes: HEAP_PEAK.load(Ordering::Relaxed),
        external_bytes: EXTERNAL.load(Ordering::Relaxed),
    }
}

fn record_alloc(bytes: u64) {
    let used = HEAP_USED.fetch_add(bytes, Ordering::Relaxed) + bytes;
    HEAP_PEAK.fetch_max(used, Ordering::Relaxed);
}

fn record_free(bytes: u64) {
    // Saturating so a stray double-account cannot wrap the gauge.
    let _ = HEAP_USED.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| {
        Some(v.saturating_sub(bytes))
    });
}

fn record_external_alloc(bytes: u64) {
    EXTERNAL.fetch_add(bytes, Ordering::Relaxed);
}

fn record_external_free(bytes: u64) {
    let _ = EXTERNAL.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| {
        Some(v.saturating_sub(bytes))
    });
}

/// A heap buffer whose bytes are accounted in the gauges for its lifetime.
///
/// The backing allocation is real (a `Vec<u8>`), so tracked bytes also show
/// up in RSS; dropping the buffer releases both.
#[derive(Debug)]
pub struct TrackedBuf {
    bytes: Vec<u8>,
}

impl TrackedBuf {
    /// Allocate `len` zeroed bytes.
    #[must_use]
    pub fn zeroed(len: usize) -> Self {
        Self::from_vec(vec![0u8; len])
    }

    /// Allocate `len` bytes filled with `fill`.
    #[must_use]
    pub fn filled(fill: u8, len: usize) -> Self {
        Self::from_vec(vec![fill; len])
    }

    /// Take ownership of an existing buffer and account it.
    #[must_use]
    pub fn from_vec(bytes: Vec<u8>) -> Self {
        record_alloc(bytes.len() as u64);
        Self { bytes }
    }

    /// Accounted length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the buffer is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Read access to the backing bytes.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }
}

impl Drop for TrackedBuf {
    fn drop(&mut self) {
        record_free(self.bytes.len() as u64);
    }
}

/// A native/off-heap reservation accounted in the external gauge.
///
/// No backing memory is held on the Rust side; this guard models bytes a
/// native engine allocated outside the tracked heap.
#[derive(Debug)]
pub struct ExternalAlloc {
    bytes: u64,
}

impl ExternalAlloc {
    /// Account `bytes` of native memory until the guard drops.
    #[must_use]
    pub fn reserve(bytes: u64) -> Self {
        record_external_alloc(bytes);
        Self { bytes }
    }

    /// Accounted size in bytes.
    #[must_use]
    pub const fn len(&self) -> u64 {
        self.bytes
    }

    /// Whether the reservation is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.bytes == 0
    }
}

impl Drop for ExternalAlloc {
    fn drop(&mut self) {
        record_external_free(self.bytes);
    }
}
