//! The preset enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which resource a probe run allocates and discards.
///
/// Each kind has its own factory type; the CLI and the benchmarks harness
/// match on the kind to construct one, so adding a variant is a compile
/// error until every driver handles it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeKind {
    /// Minimal wrapper handle, freed inline on drop.
    Basic,
    /// Engine-core handle: heap scratch plus a native-side reservation,
    /// released through the deferred queue.
    Core,
    /// `f32` data tensor, released through the deferred queue.
    Tensor,
    /// Compiled-model handle parsed from a caller-owned source, released
    /// through the deferred queue.
    Model,
}

impl ProbeKind {
    /// Every preset, in display order.
    pub const ALL: [Self; 4] = [Self::Basic, Self::Core, Self::Tensor, Self::Model];

    /// Stable lowercase name (also the serde wire form).
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Core => "core",
            Self::Tensor => "tensor",
            Self::Model => "model",
        }
    }

    /// One-line description for `presets` listings.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Basic => "minimal wrapper handle, freed inline",
            Self::Core => "engine core with native-side reservation, deferred reclaim",
            Self::Tensor => "f32 tensor [1, 100000] filled with ones, deferred reclaim",
            Self::Model => "compiled model parsed from a caller-owned source, deferred reclaim",
        }
    }
}

impl fmt::Display for ProbeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_match_wire_form() {
        for kind in ProbeKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{kind}\""));
        }
    }
}
