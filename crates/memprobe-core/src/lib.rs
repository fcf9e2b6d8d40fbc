//! memprobe-core — core types, gauges, and I/O for the leak-probe harness.
//!
//! This crate defines the **stable boundary** used across memprobe crates:
//! - canonical data types (`MemorySample`, `ProbeSpec`, …),
//! - the typed error taxonomy (`ProbeError`, `AllocError`),
//! - the factory capability and sample-sink traits,
//! - process-wide allocation gauges with RAII tracking guards, and
//! - JSON/CBOR sample-log I/O (with `.jsonl/.ndjson` streaming helpers).
//!
//! ```no_run
//! use memprobe_core::{AllocError, ResourceFactory};
//!
//! // A factory is any `FnMut` producing one resource per call; the harness
//! // drops the resource as soon as the call returns.
//! let mut factory = || -> Result<Vec<u8>, AllocError> { Ok(vec![0u8; 1024]) };
//! let _buf = factory.produce()?;
//! # Ok::<(), memprobe_core::AllocError>(())
//! ```

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
// Small, explicit allowlist to keep docs readable and APIs ergonomic.
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::doc_markdown
)]

/// Typed error taxonomy for probe runs.
pub mod error;
/// Factory capability and sample-sink traits.
pub mod factory;
/// Process-wide allocation gauges and RAII tracking guards.
pub mod gauge;
/// JSON/CBOR helpers and auto-detecting read/write APIs for sample logs.
pub mod io;
/// Streaming JSONL/NDJSON helpers for large sample logs.
pub mod io_jsonl;
/// Canonical core data types shared across the workspace.
pub mod types;

// ---- Re-exports for workspace compatibility ----
pub use error::*;
pub use factory::*;
pub use gauge::*;
pub use io::*;
pub use types::*;

/// Commonly-used items for quick imports.
///
/// ```rust
/// use memprobe_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        error::{AllocError, ProbeError},
        factory::{ResourceFactory, SampleSink},
        types::{MemorySample, ProbeSpec, RunMode},
    };
}
