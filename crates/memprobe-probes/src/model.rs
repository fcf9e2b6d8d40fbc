//! Synthetic model source, parser, and model factory.
//!
//! The model preset re-reads the same source every iteration, the way the
//! original experiment re-read one model file in a loop. The source is
//! generated once, owned by the caller, and captured by the factory — an
//! explicit lifecycle instead of a module-level handle shared by every run
//! in the process.

use crate::reclaim::Reclaimer;
use memprobe_core::{AllocError, ResourceFactory, TrackedBuf};
use rand::{rngs::StdRng, Rng as _, SeedableRng};
use serde::{Deserialize, Serialize};

/// Serialized form of one synthetic op.
#[derive(Debug, Serialize, Deserialize)]
struct OpDoc {
    name: String,
    kind: u8,
    weight_bytes: u32,
}

/// Serialized form of a synthetic model.
#[derive(Debug, Serialize, Deserialize)]
struct ModelDoc {
    version: u16,
    name: String,
    ops: Vec<OpDoc>,
}

/// A caller-owned model description the factory parses per iteration.
#[derive(Debug, Clone)]
pub struct ModelSource {
    bytes: Vec<u8>,
}

impl ModelSource {
    /// Generate a deterministic synthetic model with `ops` operations:
    /// - `kind` is a small opcode id in `[0..=15]`
    /// - `weight_bytes` is drawn from `[256..=8192]`
    #[must_use]
    pub fn generate(ops: u32, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);

        let doc = ModelDoc {
            version: 1,
            name: format!("synthetic-{ops}x{seed}"),
            ops: (0..ops)
                .map(|i| OpDoc {
                    name: format!("op{i}"),
                    kind: rng.random_range(0u8..=15),
                    weight_bytes: rng.random_range(256u32..=8192),
                })
                .collect(),
        };

        // Serialization of a just-built private doc cannot fail.
        let bytes = serde_json::to_vec(&doc).unwrap_or_default();
        Self { bytes }
    }

    /// A source that no parser accepts; for exercising the failure path.
    #[must_use]
    pub fn corrupt() -> Self {
        Self {
            bytes: b"not a model".to_vec(),
        }
    }

    /// Serialized size in bytes.
    #[must_use]
    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }
}

/// A compiled-model handle with engine-owned weights.
#[derive(Debug)]
pub struct Model {
    op_count: usize,
    weights: Option<TrackedBuf>,
}

impl Model {
    /// Number of ops parsed from the source.
    #[must_use]
    pub const fn op_count(&self) -> usize {
        self.op_count
    }

    /// Total weight bytes held while the model is alive.
    #[must_use]
    pub fn weight_bytes(&self) -> usize {
        self.weights.as_ref().map_or(0, TrackedBuf::len)
    }
}

impl Drop for Model {
    fn drop(&mut self) {
        if let Some(weights) = self.weights.take() {
            Reclaimer::global().defer_heap(weights);
        }
    }
}

/// Parses the captured [`ModelSource`] into a fresh [`Model`] per call.
#[derive(Debug, Clone)]
pub struct ModelFactory {
    source: ModelSource,
}

impl ModelFactory {
    /// Capture a source for the lifetime of the factory.
    #[must_use]
    pub const fn new(source: ModelSource) -> Self {
        Self { source }
    }
}

impl ResourceFactory for ModelFactory {
    type Resource = Model;

    fn produce(&mut self) -> Result<Model, AllocError> {
        let doc: ModelDoc = serde_json::from_slice(&self.source.bytes)
            .map_err(|e| AllocError::new(format!("model parse failed: {e}")))?;

        let weight_bytes = doc
            .ops
            .iter()
            .try_fold(0usize, |acc, op| acc.checked_add(op.weight_bytes as usize))
            .ok_or_else(|| AllocError::new("model weights overflow addressable size"))?;

        Ok(Model {
            op_count: doc.ops.len(),
            weights: Some(TrackedBuf::zeroed(weight_bytes)),
        })
    }
}
