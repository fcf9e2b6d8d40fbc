//! Named probe presets over synthetic engine resources.
//!
//! This crate provides the resource side of a probe run: handle types that
//! model the *allocation shape* of inference-engine objects (a core, a
//! tensor, a compiled model) without doing any inference, factories that
//! produce them, and the deferred-reclamation queue that gives engine-side
//! handles their collector-like lifetime.
//!
//! The presets replace the edit-source-between-runs workflow of the scratch
//! scripts this tool grew out of: pick one of [`ProbeKind`]'s variants
//! instead of commenting test functions in and out.
//!
//! Module split: `kind` names the presets, `handles` holds the cheap
//! wrappers, `tensor`/`model` hold the heavier resources, and `reclaim`
//! owns the background sweeper.

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

/// Basic and engine-core handles plus their factories.
pub mod handles;
/// The preset enumeration.
pub mod kind;
/// Synthetic model source, parser, and model factory.
pub mod model;
/// Deferred-reclamation queue with a background sweeper.
pub mod reclaim;
/// Tensor handle and factory.
pub mod tensor;

pub use handles::{Basic, BasicFactory, CoreFactory, EngineCore};
pub use kind::ProbeKind;
pub use model::{Model, ModelFactory, ModelSource};
pub use reclaim::Reclaimer;
pub use tensor::{ElementType, Tensor, TensorFactory};
