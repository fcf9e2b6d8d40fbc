//! Factory capability and sample-sink abstractions.
//!
//! Implementors provide the two seams the harness is generic over: a
//! *factory* that allocates one opaque resource per call, and a *sink* that
//! receives memory samples in capture order.
//!
//! ## Contracts implementors should uphold
//! - `produce` must have no side effects other than the resource's
//!   allocation; the harness drops the returned resource immediately, so
//!   anything the resource must release belongs in its `Drop`.
//! - `produce` must not retry internally on allocator failure; return the
//!   [`AllocError`] and let the harness abort the run.
//! - `record` must not buffer or reorder: the diagnostic value of a sample
//!   series depends on the sequence being faithful to real time.

use crate::error::AllocError;
use crate::types::MemorySample;
use anyhow::Result;

/// Capability to produce one instance of an opaque resource on demand.
///
/// Any `FnMut() -> Result<R, AllocError>` closure is a factory, which keeps
/// call sites close to the scripts this tool replaces: per-run context (an
/// engine handle, a model source) is captured by the closure with an
/// explicit lifecycle rather than living in ambient process state.
pub trait ResourceFactory {
    /// The opaque resource type; the harness never inspects it.
    type Resource;

    /// Produce one resource.
    ///
    /// # Errors
    /// Returns [`AllocError`] when the resource cannot be allocated.
    fn produce(&mut self) -> Result<Self::Resource, AllocError>;
}

impl<R, F> ResourceFactory for F
where
    F: FnMut() -> Result<R, AllocError>,
{
    type Resource = R;

    fn produce(&mut self) -> Result<R, AllocError> {
        (self)()
    }
}

/// Receiver for the sample sequence a probe run emits.
///
/// Sinks are typically reporters (human-readable lines), recorders (capture
/// for file export), or test collectors.
pub trait SampleSink {
    /// Accept the next sample. Called in strict iteration order.
    ///
    /// # Errors
    /// Returns an error if the sink cannot accept the sample; the harness
    /// aborts the run and surfaces it.
    fn record(&mut self, sample: &MemorySample) -> Result<()>;
}

/// Forward through a mutable reference so callers can pass `&mut sink`.
impl<S: SampleSink + ?Sized> SampleSink for &mut S {
    fn record(&mut self, sample: &MemorySample) -> Result<()> {
        (**self).record(sample)
    }
}
