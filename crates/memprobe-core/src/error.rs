//! Typed error taxonomy for probe runs.
//!
//! Factories have exactly one failure category — [`AllocError`] — because a
//! leak probe must never retry or mask a failing allocator: doing so would
//! corrupt the measurement. The harness wraps a factory failure into
//! [`ProbeError::Allocation`] with the iteration index so callers can
//! correlate the failure point with the last captured sample.

use thiserror::Error;

/// A factory could not produce its resource.
///
/// This is the sole error a [`crate::ResourceFactory`] may raise; the reason
/// string is surfaced verbatim in the error chain.
#[derive(Debug, Clone, Error)]
#[error("resource allocation failed: {reason}")]
pub struct AllocError {
    reason: String,
}

impl AllocError {
    /// Construct from a human-readable reason.
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    /// The underlying reason string.
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// Errors a probe run can surface to its caller.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The spec failed validation; no factory invocation was attempted.
    #[error("invalid probe spec: {0}")]
    InvalidSpec(String),

    /// The factory failed at `iteration`; remaining iterations were aborted.
    /// Never retried.
    #[error("allocation failure at iteration {iteration}")]
    Allocation {
        /// Drive-loop index of the failing invocation.
        iteration: u64,
        /// The factory's error.
        #[source]
        source: AllocError,
    },

    /// The sample sink rejected a sample (e.g. a closed report stream).
    #[error("failed to report sample at iteration {iteration}")]
    Report {
        /// Drive-loop index of the sample being reported.
        iteration: u64,
        /// The sink's error.
        #[source]
        source: anyhow::Error,
    },
}

impl ProbeError {
    /// Iteration index the error is anchored to, when applicable.
    #[must_use]
    pub const fn iteration(&self) -> Option<u64> {
        match self {
            Self::InvalidSpec(_) => None,
            Self::Allocation { iteration, .. } | Self::Report { iteration, .. } => {
                Some(*iteration)
            }
        }
    }
}
