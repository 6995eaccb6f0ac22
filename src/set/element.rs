//! Set elements.

use crate::error::SomkitError;
use crate::vector::Vector;

/// One input/output example.
#[derive(Debug, Clone, PartialEq)]
pub struct TElement {
    pub(super) index: usize,
    pub(super) input: Vector,
    pub(super) output: Option<Vector>,
}

impl TElement {
    /// Creates a detached element.
    pub fn new(input: Vector, output: Option<Vector>) -> Self {
        Self {
            index: 0,
            input,
            output,
        }
    }

    /// 1-based position in the owning set, or 0 when detached.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Input vector.
    #[inline]
    pub fn input(&self) -> &Vector {
        &self.input
    }

    /// Mutable input vector.
    #[inline]
    pub fn input_mut(&mut self) -> &mut Vector {
        &mut self.input
    }

    /// Desired output, if supervised.
    #[inline]
    pub fn output(&self) -> Option<&Vector> {
        self.output.as_ref()
    }

    /// Mutable desired output.
    #[inline]
    pub fn output_mut(&mut self) -> Option<&mut Vector> {
        self.output.as_mut()
    }

    /// Output dimension, 0 when unsupervised.
    #[inline]
    pub fn output_dim(&self) -> usize {
        self.output.as_ref().map_or(0, Vector::dim)
    }
}

/// An element a set refused, handed back with the reason.
#[derive(Debug)]
pub struct AttachRejected {
    /// The element that was not attached.
    pub element: TElement,
    /// Why it was refused.
    pub error: SomkitError,
}
