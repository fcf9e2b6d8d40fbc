//! Cheap wrapper handles: `Basic` and the engine core.

use crate::reclaim::Reclaimer;
use memprobe_core::{AllocError, ExternalAlloc, ResourceFactory, TrackedBuf};

/// Bytes behind one `Basic` wrapper.
const BASIC_BYTES: usize = 64;

/// Heap scratch an engine core keeps on our side of the boundary.
const CORE_SCRATCH_BYTES: usize = 64 * 1024;

/// Native-side bytes a core reserves (plugin registry, device context).
const CORE_NATIVE_BYTES: u64 = 4_000_000;

/// Minimal wrapper object with no engine-side state.
///
/// Freed inline on drop, which is why a tight loop over `Basic` handles
/// holds flat even without cooperative yields.
#[derive(Debug)]
pub struct Basic {
    _payload: TrackedBuf,
}

impl Basic {
    fn allocate() -> Self {
        Self {
            _payload: TrackedBuf::zeroed(BASIC_BYTES),
        }
    }
}

/// Produces [`Basic`] wrappers.
#[derive(Debug, Default, Clone, Copy)]
pub struct BasicFactory;

impl ResourceFactory for BasicFactory {
    type Resource = Basic;

    fn produce(&mut self) -> Result<Basic, AllocError> {
        Ok(Basic::allocate())
    }
}

/// Engine-core handle: heap scratch plus a native-side reservation.
///
/// Both halves are engine-owned, so dropping the handle queues them for the
/// sweeper instead of freeing inline.
#[derive(Debug)]
pub struct EngineCore {
    scratch: Option<TrackedBuf>,
    native: Option<ExternalAlloc>,
}

impl EngineCore {
    fn allocate() -> Self {
        Self {
            scratch: Some(TrackedBuf::zeroed(CORE_SCRATCH_BYTES)),
            native: Some(ExternalAlloc::reserve(CORE_NATIVE_BYTES)),
        }
    }

    /// Native-side bytes held while the core is alive.
    #[must_use]
    pub fn native_bytes(&self) -> u64 {
        self.native.as_ref().map_or(0, ExternalAlloc::len)
    }
}

impl Drop for EngineCore {
    fn drop(&mut self) {
        let reclaimer = Reclaimer::global();
        if let Some(scratch) = self.scratch.take() {
            reclaimer.defer_heap(scratch);
        }
        if let Some(native) = self.native.take() {
            reclaimer.defer_external(native);
        }
    }
}

/// Produces [`EngineCore`] handles.
#[derive(Debug, Default, Clone, Copy)]
pub struct CoreFactory;

impl ResourceFactory for CoreFactory {
    type Resource = EngineCore;

    fn produce(&mut self) -> Result<EngineCore, AllocError> {
        Ok(EngineCore::allocate())
    }
}
