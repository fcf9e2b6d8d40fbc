//! Leak-probe drive loop.
//!
//! Goals:
//! - Invoke the factory exactly `iterations` times, dropping each resource
//!   the moment the call returns (the harness never retains a reference).
//! - Capture a memory sample whenever the iteration index is divisible by
//!   `sample_interval` and hand it to the sink **immediately** — ordering
//!   is part of the contract, so there is no buffering between capture and
//!   report.
//! - Fail fast: the first factory error aborts the remaining iterations and
//!   surfaces with the failing index. Probing a degraded allocator would
//!   only corrupt the measurement.
//!
//! The yield seam exists because some resources are reclaimed by a sweeper
//! that only runs between scheduling turns; [`ThreadYield`] hands the turn
//! over after every invocation, [`NoYield`] spins flat out. Pick per run
//! and compare the two curves.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(
    missing_docs,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::unwrap_used,
    clippy::expect_used
)]

use memprobe_core::{ProbeError, ProbeSpec, ResourceFactory, SampleSink};
use memprobe_sampler::Sampler;
use tracing::{debug, info};

/// Voluntary suspension point between iterations.
pub trait Yielder {
    /// Relinquish the scheduler turn (or don't; see [`NoYield`]).
    fn pause(&mut self);
}

/// Eager mode: no suspension, iterations run back-to-back.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoYield;

impl Yielder for NoYield {
    fn pause(&mut self) {}
}

/// Cooperative mode: yield the OS scheduler turn after every invocation.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadYield;

impl Yielder for ThreadYield {
    fn pause(&mut self) {
        std::thread::yield_now();
    }
}

/// Drives one probe run to completion.
///
/// Owns the sampler (one per run is cheap and keeps runs independent) and
/// the yielder; generic so eager and cooperative loops monomorphize
/// without a branch per iteration.
#[derive(Debug)]
pub struct ProbeHarness<Y: Yielder> {
    sampler: Sampler,
    yielder: Y,
}

impl ProbeHarness<NoYield> {
    /// Harness in eager mode.
    #[must_use]
    pub fn new() -> Self {
        Self::with_yielder(NoYield)
    }
}

impl Default for ProbeHarness<NoYield> {
    fn default() -> Self {
        Self::new()
    }
}

impl ProbeHarness<ThreadYield> {
    /// Harness in cooperative-yield mode.
    #[must_use]
    pub fn cooperative() -> Self {
        Self::with_yielder(ThreadYield)
    }
}

impl<Y: Yielder> ProbeHarness<Y> {
    /// Harness with a custom yield seam (mock schedulers in tests).
    #[must_use]
    pub fn with_yielder(yielder: Y) -> Self {
        Self {
            sampler: Sampler::new(),
            yielder,
        }
    }

    /// The yield seam, for inspection after a run.
    #[must_use]
    pub const fn yielder(&self) -> &Y {
        &self.yielder
    }

    /// Run the probe: validate, iterate, sample on cadence, yield.
    ///
    /// On success the side effect is the sample sequence delivered to
    /// `sink`, strictly ordered by iteration index.
    ///
    /// # Errors
    /// - [`ProbeError::InvalidSpec`] before any factory invocation.
    /// - [`ProbeError::Allocation`] with the failing index; iterations
    ///   after it are not attempted.
    /// - [`ProbeError::Report`] when the sink rejects a sample.
    #[must_use]
    pub fn run<F, S>(
        &mut self,
        spec: &ProbeSpec,
        factory: &mut F,
        sink: &mut S,
    ) -> Result<(), ProbeError>
    where
        F: ResourceFactory,
        S: SampleSink,
    {
        spec.validate()?;

        info!(
            name = %spec.name,
            iterations = spec.iterations,
            sample_interval = spec.sample_interval,
            mode = %spec.mode,
            "starting probe run"
        );

        for i in 0..spec.iterations {
            let resource = factory
                .produce()
                .map_err(|source| ProbeError::Allocation {
                    iteration: i,
                    source,
                })?;
            // Discard-after-use: eligibility for reclamation starts here.
            drop(resource);

            if i % spec.sample_interval == 0 {
                let sample = self.sampler.sample(i);
                debug!(iteration = i, heap_used = sample.heap_used_bytes, "sampled");
                sink.record(&sample).map_err(|source| ProbeError::Report {
                    iteration: i,
                    source,
                })?;
            }

            self.yielder.pause();
        }

        info!(name = %spec.name, iterations = spec.iterations, "probe run complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    // Compile-time checks: concurrent probe runs own independent harnesses,
    // so the harness must be movable to a worker thread.
    fn _assert_send<Y: Yielder + Send>() {
        fn assert_send<T: Send>() {}
        assert_send::<ProbeHarness<Y>>();
    }
}
