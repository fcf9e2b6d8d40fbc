//! Canonical core types used across the memprobe workspace.
//!
//! These live in `memprobe-core` and are broadly re-exported at the crate
//! root so other crates can import via `memprobe_core::MemorySample`, etc.
//!
//! The design aims to keep serialized forms conservative and portable (serde).

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ProbeError;

/// One decimal megabyte, the display unit for memory counters.
///
/// Decimal (not binary) so printed values line up with the counters the
/// probed runtime itself reports.
pub const BYTES_PER_MB: f64 = 1_000_000.0;

/// Convert a byte count to decimal megabytes for display.
#[inline]
#[must_use]
#[allow(clippy::cast_precision_loss)] // display-only conversion
pub fn megabytes(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_MB
}

/// Whether the drive loop relinquishes its scheduler turn between iterations.
///
/// Cooperative mode exists because some resource kinds are reclaimed by a
/// background sweeper that only makes progress when it gets scheduled; a
/// tight loop can out-pace it and show a misleadingly monotonic curve.
/// This is a configuration switch, not a behavioral guarantee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Iterate back-to-back with no voluntary suspension.
    Eager,
    /// Yield the scheduler turn after every factory invocation.
    Cooperative,
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eager => f.write_str("eager"),
            Self::Cooperative => f.write_str("cooperative"),
        }
    }
}

/// Parameters of one probe run.
///
/// **Invariants**
/// - `iterations > 0` and `sample_interval > 0`; enforced by [`ProbeSpec::validate`]
///   before the first factory invocation.
/// - `name` is diagnostic-only and never affects behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeSpec {
    /// Diagnostic label echoed in logs and summaries.
    pub name: String,
    /// Number of factory invocations to perform.
    pub iterations: u64,
    /// Iterations between memory samples (the first iteration is always sampled).
    pub sample_interval: u64,
    /// Drive-loop scheduling mode.
    pub mode: RunMode,
}

impl ProbeSpec {
    /// Construct a spec in [`RunMode::Eager`] (no validation; see [`Self::validate`]).
    #[must_use]
    pub fn new(name: impl Into<String>, iterations: u64, sample_interval: u64) -> Self {
        Self {
            name: name.into(),
            iterations,
            sample_interval,
            mode: RunMode::Eager,
        }
    }

    /// Same spec with the given run mode.
    #[must_use]
    pub fn with_mode(mut self, mode: RunMode) -> Self {
        self.mode = mode;
        self
    }

    /// Reject zero iteration counts and zero sample intervals.
    ///
    /// # Errors
    /// Returns [`ProbeError::InvalidSpec`] naming the offending field.
    pub fn validate(&self) -> Result<(), ProbeError> {
        if self.iterations == 0 {
            return Err(ProbeError::InvalidSpec(
                "iterations must be positive".to_owned(),
            ));
        }
        if self.sample_interval == 0 {
            return Err(ProbeError::InvalidSpec(
                "sample_interval must be positive".to_owned(),
            ));
        }
        Ok(())
    }

    /// Number of samples a completed run emits: `ceil(iterations / sample_interval)`.
    #[inline]
    #[must_use]
    pub const fn expected_samples(&self) -> u64 {
        self.iterations.div_ceil(self.sample_interval)
    }
}

/// An immutable snapshot of process memory counters.
///
/// Produced by the sampler, consumed by reporters; never mutated after
/// creation. Field meanings:
/// - `heap_used_bytes`: live bytes currently attributed to tracked heap buffers.
/// - `heap_total_bytes`: high-water mark of `heap_used_bytes` over the process lifetime.
/// - `external_bytes`: live bytes attributed to native/off-heap allocations.
/// - `rss_bytes`: resident set size reported by the OS (0 when unavailable).
/// - `iteration_index`: drive-loop index at capture time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemorySample {
    /// Live tracked heap bytes.
    pub heap_used_bytes: u64,
    /// Peak tracked heap bytes.
    pub heap_total_bytes: u64,
    /// Live native/off-heap bytes.
    pub external_bytes: u64,
    /// Resident set size in bytes.
    pub rss_bytes: u64,
    /// Iteration index at capture time.
    pub iteration_index: u64,
}

impl MemorySample {
    /// Construct a new sample.
    #[inline]
    #[must_use]
    pub const fn new(
        heap_used_bytes: u64,
        heap_total_bytes: u64,
        external_bytes: u64,
        rss_bytes: u64,
        iteration_index: u64,
    ) -> Self {
        Self {
            heap_used_bytes,
            heap_total_bytes,
            external_bytes,
            rss_bytes,
            iteration_index,
        }
    }
}
