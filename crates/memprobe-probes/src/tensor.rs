//! Tensor handle and factory.

use crate::reclaim::Reclaimer;
use memprobe_core::{AllocError, ResourceFactory, TrackedBuf};

/// Element count of the default probe tensor (`[1, DEFAULT_ELEMENTS]`).
pub const DEFAULT_ELEMENTS: usize = 100_000;

/// Fill byte for probe tensors; the data content is irrelevant to the
/// probe, it only has to be resident.
const FILL: u8 = 1;

/// Element type of a probe tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementType {
    /// 32-bit float.
    F32,
    /// 16-bit float.
    F16,
    /// Unsigned byte.
    U8,
}

impl ElementType {
    /// Size of one element in bytes.
    #[must_use]
    pub const fn byte_width(self) -> usize {
        match self {
            Self::F32 => 4,
            Self::F16 => 2,
            Self::U8 => 1,
        }
    }
}

/// A data tensor whose buffer is engine-owned.
///
/// Dropping the handle queues the buffer for the sweeper; the bytes stay
/// accounted until the sweeper runs.
#[derive(Debug)]
pub struct Tensor {
    element: ElementType,
    shape: Vec<usize>,
    data: Option<TrackedBuf>,
}

impl Tensor {
    /// Element type.
    #[must_use]
    pub const fn element(&self) -> ElementType {
        self.element
    }

    /// Shape as given at allocation.
    #[must_use]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Size of the backing buffer in bytes.
    #[must_use]
    pub fn byte_len(&self) -> usize {
        self.data.as_ref().map_or(0, TrackedBuf::len)
    }
}

impl Drop for Tensor {
    fn drop(&mut self) {
        if let Some(data) = self.data.take() {
            Reclaimer::global().defer_heap(data);
        }
    }
}

/// Produces [`Tensor`] handles of a fixed element type and shape.
#[derive(Debug, Clone)]
pub struct TensorFactory {
    element: ElementType,
    shape: Vec<usize>,
}

impl TensorFactory {
    /// The default probe tensor: `f32`, shape `[1, 100_000]` (400 000 bytes).
    #[must_use]
    pub fn f32_default() -> Self {
        Self::new(ElementType::F32, vec![1, DEFAULT_ELEMENTS])
    }

    /// A factory for the given element type and shape.
    #[must_use]
    pub const fn new(element: ElementType, shape: Vec<usize>) -> Self {
        Self { element, shape }
    }

    fn byte_len(&self) -> Result<usize, AllocError> {
        let elements = self
            .shape
            .iter()
            .try_fold(1usize, |acc, &d| acc.checked_mul(d))
            .ok_or_else(|| AllocError::new("tensor shape overflows addressable size"))?;
        elements
            .checked_mul(self.element.byte_width())
            .ok_or_else(|| AllocError::new("tensor byte size overflows addressable size"))
    }
}

impl ResourceFactory for TensorFactory {
    type Resource = Tensor;

    fn produce(&mut self) -> Result<Tensor, AllocError> {
        let len = self.byte_len()?;
        if len == 0 {
            return Err(AllocError::new("zero-element tensor"));
        }
        Ok(Tensor {
            element: self.element,
            shape: self.shape.clone(),
            data: Some(TrackedBuf::filled(FILL, len)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tensor_is_400_kb() {
        let mut factory = TensorFactory::f32_default();
        let tensor = factory.produce().unwrap();
        assert_eq!(tensor.byte_len(), 400_000);
        assert_eq!(tensor.shape(), &[1, DEFAULT_ELEMENTS]);
        assert_eq!(tensor.element(), ElementType::F32);
        drop(tensor);
        let _ = Reclaimer::global().drain_now();
    }

    #[test]
    fn zero_element_shape_is_an_alloc_error() {
        let mut factory = TensorFactory::new(ElementType::F32, vec![1, 0]);
        let err = factory.produce().unwrap_err();
        assert!(err.reason().contains("zero-element"));
    }

    #[test]
    fn overflowing_shape_is_an_alloc_error() {
        let mut factory = TensorFactory::new(ElementType::F32, vec![usize::MAX, 2]);
        assert!(factory.produce().is_err());
    }
}
