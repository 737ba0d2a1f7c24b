//! Array regions.
//!
//! An [`ArrayRegion`] is the resolved form of an N-dimensional region descriptor: an `origin` and a `span` with one entry per dimension.

mod indices_iterator;

pub use indices_iterator::IndicesIterator;

use derive_more::Display;
use itertools::izip;
use thiserror::Error;

/// An N-dimensional region of an array.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Display, Default)]
#[display("origin {origin:?} span {span:?}")]
pub struct ArrayRegion {
    /// The origin of the region.
    origin: Vec<u64>,
    /// The span (size) of the region.
    span: Vec<u64>,
}

impl ArrayRegion {
    /// Create a new array region with `span` starting at the origin.
    #[must_use]
    pub fn new_with_span(span: Vec<u64>) -> Self {
        Self {
            origin: vec![0; span.len()],
            span,
        }
    }

    /// Create a new array region.
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if the length of `origin` and `span` do not match.
    pub fn new_with_origin_span(
        origin: Vec<u64>,
        span: Vec<u64>,
    ) -> Result<Self, IncompatibleDimensionalityError> {
        if origin.len() == span.len() {
            Ok(Self { origin, span })
        } else {
            Err(IncompatibleDimensionalityError::new(span.len(), origin.len()))
        }
    }

    /// Return the origin of the region.
    #[must_use]
    pub fn origin(&self) -> &[u64] {
        &self.origin
    }

    /// Return the span of the region.
    #[must_use]
    pub fn span(&self) -> &[u64] {
        &self.span
    }

    /// Return the dimensionality of the region.
    #[must_use]
    pub fn dimensionality(&self) -> usize {
        self.origin.len()
    }

    /// Return the end (exclusive) of the region.
    #[must_use]
    pub fn end_exc(&self) -> Vec<u64> {
        std::iter::zip(&self.origin, &self.span)
            .map(|(origin, span)| origin + span)
            .collect()
    }

    /// Return the number of elements of the region.
    ///
    /// Equal to the product of the components of its span.
    #[must_use]
    pub fn num_elements(&self) -> u64 {
        self.span.iter().product()
    }

    /// Returns true if the region is within the bounds of `array_shape`.
    #[must_use]
    pub fn inbounds(&self, array_shape: &[u64]) -> bool {
        if self.dimensionality() != array_shape.len() {
            return false;
        }
        izip!(&self.origin, &self.span, array_shape).all(|(&origin, &span, &shape)| {
            origin.checked_add(span).is_some_and(|end| end <= shape)
        })
    }

    /// Returns an iterator over the indices of elements within the region, in row-major order.
    #[must_use]
    pub fn iter_indices(&self) -> IndicesIterator {
        IndicesIterator::new(self.clone())
    }
}

/// An incompatible dimensionality error.
#[derive(Copy, Clone, Debug, Error)]
#[error("incompatible dimensionality {0}, expected {1}")]
pub struct IncompatibleDimensionalityError(usize, usize);

impl IncompatibleDimensionalityError {
    /// Create a new incompatible dimensionality error.
    #[must_use]
    pub const fn new(got: usize, expected: usize) -> Self {
        Self(got, expected)
    }
}
