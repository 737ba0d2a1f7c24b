//! Strided buffers.
//!
//! A [`StridedBuffer`] is a logical multidimensional view over a flat typed buffer, described by a shape, a signed per-dimension stride (in elements) and an offset (in elements) of the element at logical index `[0, 0, ...]`.
//! Strides can be negative and dimensions can be permuted, so row-major, column-major and reversed layouts are all representable.
//!
//! Construction never validates a buffer.
//! Use [`StridedBuffer::validate`] to check that the stride descriptor is coherent with the shape and that every addressable element lies inside the flat buffer.

use thiserror::Error;

use crate::data_type::{Element, ElementKind};

/// The flat typed storage of a [`StridedBuffer`].
#[derive(Clone, Debug, PartialEq)]
pub enum StridedData {
    /// `int8` elements.
    Int8(Vec<i8>),
    /// `uint8` elements.
    UInt8(Vec<u8>),
    /// `int16` elements.
    Int16(Vec<i16>),
    /// `uint16` elements.
    UInt16(Vec<u16>),
    /// `int32` elements.
    Int32(Vec<i32>),
    /// `uint32` elements.
    UInt32(Vec<u32>),
    /// `float32` elements.
    Float32(Vec<f32>),
    /// `float64` elements.
    Float64(Vec<f64>),
}

macro_rules! dispatch {
    ($data:expr, $elements:ident => $body:expr) => {
        match $data {
            StridedData::Int8($elements) => $body,
            StridedData::UInt8($elements) => $body,
            StridedData::Int16($elements) => $body,
            StridedData::UInt16($elements) => $body,
            StridedData::Int32($elements) => $body,
            StridedData::UInt32($elements) => $body,
            StridedData::Float32($elements) => $body,
            StridedData::Float64($elements) => $body,
        }
    };
}

impl StridedData {
    /// Create zero initialised storage of `len` elements of `kind`.
    #[must_use]
    pub fn new_zeroed(kind: ElementKind, len: usize) -> Self {
        match kind {
            ElementKind::Int8 => Self::Int8(vec![0; len]),
            ElementKind::UInt8 => Self::UInt8(vec![0; len]),
            ElementKind::Int16 => Self::Int16(vec![0; len]),
            ElementKind::UInt16 => Self::UInt16(vec![0; len]),
            ElementKind::Int32 => Self::Int32(vec![0; len]),
            ElementKind::UInt32 => Self::UInt32(vec![0; len]),
            ElementKind::Float32 => Self::Float32(vec![0.0; len]),
            ElementKind::Float64 => Self::Float64(vec![0.0; len]),
        }
    }

    /// Returns the element kind.
    #[must_use]
    pub const fn kind(&self) -> ElementKind {
        match self {
            Self::Int8(_) => ElementKind::Int8,
            Self::UInt8(_) => ElementKind::UInt8,
            Self::Int16(_) => ElementKind::Int16,
            Self::UInt16(_) => ElementKind::UInt16,
            Self::Int32(_) => ElementKind::Int32,
            Self::UInt32(_) => ElementKind::UInt32,
            Self::Float32(_) => ElementKind::Float32,
            Self::Float64(_) => ElementKind::Float64,
        }
    }

    /// Returns the number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        dispatch!(self, elements => elements.len())
    }

    /// Returns true if there are no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the elements as native endian bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        dispatch!(self, elements => bytemuck::cast_slice(elements))
    }

    /// Returns the elements as mutable native endian bytes.
    #[must_use]
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        dispatch!(self, elements => bytemuck::cast_slice_mut(elements))
    }
}

/// A strided buffer error.
#[derive(Debug, Error)]
pub enum StridedBufferError {
    /// No buffer was supplied.
    #[error("data is missing")]
    Missing,
    /// The stride does not describe every dimension of the shape.
    #[error("stride has {_0} dimensions but shape has {_1}")]
    IncompatibleStride(usize, usize),
    /// The buffer is too small for the shape, stride and offset.
    #[error("shape {shape:?} with stride {stride:?} and offset {offset} addresses elements outside of a buffer of length {len}")]
    OutOfBounds {
        /// The shape.
        shape: Vec<usize>,
        /// The stride.
        stride: Vec<isize>,
        /// The offset.
        offset: usize,
        /// The buffer length.
        len: usize,
    },
    /// The requested element type does not match the element kind of the buffer.
    #[error("expected elements of kind {expected}, got {got}")]
    IncompatibleElementKind {
        /// The requested element kind.
        expected: ElementKind,
        /// The element kind of the buffer.
        got: ElementKind,
    },
    /// An ndarray shape error.
    #[cfg(feature = "ndarray")]
    #[error(transparent)]
    NdarrayShape(#[from] ndarray::ShapeError),
}

/// Returns the default positive row-major stride of `shape`.
#[must_use]
#[allow(clippy::cast_possible_wrap)]
pub fn default_stride(shape: &[usize]) -> Vec<isize> {
    let mut stride = vec![0; shape.len()];
    let mut step = 1isize;
    for (stride, &size) in std::iter::zip(stride.iter_mut(), shape).rev() {
        *stride = step;
        step *= size as isize;
    }
    stride
}

/// Returns the offset of logical index `[0, 0, ...]` which keeps every element of a buffer with `shape` and `stride` at a non-negative index.
#[must_use]
pub fn default_offset(shape: &[usize], stride: &[isize]) -> usize {
    std::iter::zip(shape, stride)
        .filter(|(_, &stride)| stride < 0)
        .map(|(&size, &stride)| size.saturating_sub(1) * stride.unsigned_abs())
        .sum()
}

/// A strided buffer.
#[derive(Clone, Debug, PartialEq)]
pub struct StridedBuffer {
    data: StridedData,
    shape: Vec<usize>,
    stride: Vec<isize>,
    offset: usize,
}

impl StridedBuffer {
    /// Create a new strided buffer with a default positive row-major stride and a zero offset.
    #[must_use]
    pub fn new<T: Element>(elements: Vec<T>, shape: Vec<usize>) -> Self {
        let stride = default_stride(&shape);
        Self::from_parts(T::into_data(elements), shape, stride, 0)
    }

    /// Create a new strided buffer with `stride`.
    ///
    /// The offset is chosen so that negative strides traverse the buffer from its end, as in `scijs/ndarray`.
    #[must_use]
    pub fn with_strides<T: Element>(elements: Vec<T>, shape: Vec<usize>, stride: Vec<isize>) -> Self {
        let offset = default_offset(&shape, &stride);
        Self::from_parts(T::into_data(elements), shape, stride, offset)
    }

    /// Create a new strided buffer with `stride` and `offset`.
    #[must_use]
    pub fn with_strides_offset<T: Element>(
        elements: Vec<T>,
        shape: Vec<usize>,
        stride: Vec<isize>,
        offset: usize,
    ) -> Self {
        Self::from_parts(T::into_data(elements), shape, stride, offset)
    }

    /// Create a new strided buffer from its parts.
    #[must_use]
    pub fn from_parts(data: StridedData, shape: Vec<usize>, stride: Vec<isize>, offset: usize) -> Self {
        Self {
            data,
            shape,
            stride,
            offset,
        }
    }

    /// Create a zero initialised strided buffer of `kind` with a default positive row-major stride.
    #[must_use]
    pub fn zeros(kind: ElementKind, shape: Vec<usize>) -> Self {
        let stride = default_stride(&shape);
        let data = StridedData::new_zeroed(kind, shape.iter().product());
        Self::from_parts(data, shape, stride, 0)
    }

    /// Consume the strided buffer and return its parts.
    #[must_use]
    pub fn into_parts(self) -> (StridedData, Vec<usize>, Vec<isize>, usize) {
        (self.data, self.shape, self.stride, self.offset)
    }

    /// Return the flat storage.
    #[must_use]
    pub fn data(&self) -> &StridedData {
        &self.data
    }

    /// Return the flat storage mutably.
    #[must_use]
    pub fn data_mut(&mut self) -> &mut StridedData {
        &mut self.data
    }

    /// Return the shape.
    #[must_use]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Return the stride (in elements).
    #[must_use]
    pub fn stride(&self) -> &[isize] {
        &self.stride
    }

    /// Return the offset (in elements) of logical index `[0, 0, ...]`.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Return the number of dimensions.
    #[must_use]
    pub fn dimensionality(&self) -> usize {
        self.shape.len()
    }

    /// Return the element kind.
    #[must_use]
    pub fn element_kind(&self) -> ElementKind {
        self.data.kind()
    }

    /// Return the number of logical elements.
    #[must_use]
    pub fn num_elements(&self) -> usize {
        self.shape.iter().product()
    }

    /// Returns the flat elements if they are of type `T`.
    #[must_use]
    pub fn as_slice<T: Element>(&self) -> Option<&[T]> {
        T::data_slice(&self.data)
    }

    /// Validate the stride descriptor and the extent of the buffer.
    ///
    /// # Errors
    /// Returns a [`StridedBufferError`] if the stride does not match the shape or the buffer is too small.
    pub fn validate(&self) -> Result<(), StridedBufferError> {
        self.validate_stride()?;
        self.validate_extent()
    }

    /// Validate that there is one stride per dimension.
    ///
    /// # Errors
    /// Returns [`StridedBufferError::IncompatibleStride`] if the stride and shape dimensionality differ.
    pub fn validate_stride(&self) -> Result<(), StridedBufferError> {
        if self.stride.len() == self.shape.len() {
            Ok(())
        } else {
            Err(StridedBufferError::IncompatibleStride(
                self.stride.len(),
                self.shape.len(),
            ))
        }
    }

    /// Validate that every addressable element lies inside the flat buffer.
    ///
    /// # Errors
    /// Returns [`StridedBufferError::OutOfBounds`] if an element lies outside the buffer.
    pub fn validate_extent(&self) -> Result<(), StridedBufferError> {
        if self.num_elements() == 0 {
            return Ok(());
        }
        let (min, max) = self.index_bounds();
        if min < 0 || max >= self.data.len() as i128 {
            Err(StridedBufferError::OutOfBounds {
                shape: self.shape.clone(),
                stride: self.stride.clone(),
                offset: self.offset,
                len: self.data.len(),
            })
        } else {
            Ok(())
        }
    }

    /// The lowest and highest flat index addressed by a non-empty buffer.
    fn index_bounds(&self) -> (i128, i128) {
        let offset = self.offset as i128;
        std::iter::zip(&self.shape, &self.stride).fold(
            (offset, offset),
            |(min, max), (&size, &stride)| {
                let extent = (size as i128 - 1) * stride as i128;
                (min + extent.min(0), max + extent.max(0))
            },
        )
    }

    /// Returns the flat index of the element at logical `indices`.
    ///
    /// Returns [`None`] if the indices are out of bounds of the shape or address an element outside of the buffer.
    #[must_use]
    pub fn element_index(&self, indices: &[usize]) -> Option<usize> {
        if indices.len() != self.shape.len() || self.stride.len() != self.shape.len() {
            return None;
        }
        let mut index = self.offset as i128;
        for (&i, &size, &stride) in itertools::izip!(indices, &self.shape, &self.stride) {
            if i >= size {
                return None;
            }
            index += i as i128 * stride as i128;
        }
        usize::try_from(index)
            .ok()
            .filter(|&index| index < self.data.len())
    }

    /// Returns the element at logical `indices`.
    ///
    /// Returns [`None`] if `T` does not match the element kind or the indices are invalid.
    #[must_use]
    pub fn get<T: Element>(&self, indices: &[usize]) -> Option<T> {
        let index = self.element_index(indices)?;
        T::data_slice(&self.data)?.get(index).copied()
    }

    /// Returns a mutable reference to the element at logical `indices`.
    ///
    /// Returns [`None`] if `T` does not match the element kind or the indices are invalid.
    #[must_use]
    pub fn get_mut<T: Element>(&mut self, indices: &[usize]) -> Option<&mut T> {
        let index = self.element_index(indices)?;
        T::data_slice_mut(&mut self.data)?.get_mut(index)
    }

    /// Returns the logical elements in row-major order, independent of the stride layout.
    ///
    /// # Errors
    /// Returns a [`StridedBufferError`] if the buffer is invalid or `T` does not match the element kind.
    pub fn to_vec<T: Element>(&self) -> Result<Vec<T>, StridedBufferError> {
        self.validate()?;
        let elements =
            T::data_slice(&self.data).ok_or(StridedBufferError::IncompatibleElementKind {
                expected: T::KIND,
                got: self.element_kind(),
            })?;
        let num_elements = self.num_elements();
        let mut out = Vec::with_capacity(num_elements);
        let mut indices = vec![0usize; self.dimensionality()];
        for _ in 0..num_elements {
            if let Some(index) = self.element_index(&indices) {
                out.push(elements[index]);
            }
            for (i, &size) in std::iter::zip(indices.iter_mut(), &self.shape).rev() {
                *i += 1;
                if *i < size {
                    break;
                }
                *i = 0;
            }
        }
        Ok(out)
    }
}

#[cfg(feature = "ndarray")]
impl StridedBuffer {
    /// Create a strided buffer from an [`ndarray::Array`], keeping its strides and offset.
    #[must_use]
    pub fn from_ndarray<T: Element, D: ndarray::Dimension>(array: ndarray::Array<T, D>) -> Self {
        let shape = array.shape().to_vec();
        let stride = array.strides().to_vec();
        let (elements, offset) = array.into_raw_vec_and_offset();
        Self::from_parts(T::into_data(elements), shape, stride, offset.unwrap_or(0))
    }

    /// Return an [`ndarray::ArrayViewD`] of the buffer honouring its stride and offset.
    ///
    /// # Errors
    /// Returns a [`StridedBufferError`] if the buffer is invalid or `T` does not match the element kind.
    #[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
    pub fn ndarray_view<T: Element>(
        &self,
    ) -> Result<ndarray::ArrayViewD<'_, T>, StridedBufferError> {
        use ndarray::ShapeBuilder;

        self.validate()?;
        let elements =
            T::data_slice(&self.data).ok_or(StridedBufferError::IncompatibleElementKind {
                expected: T::KIND,
                got: self.element_kind(),
            })?;
        if self.num_elements() == 0 {
            return Ok(ndarray::ArrayViewD::from_shape(
                ndarray::IxDyn(&self.shape),
                &[],
            )?);
        }

        // Start from the lowest addressed element, then flip the reversed axes
        let mut base = self.offset as isize;
        for (&size, &stride) in std::iter::zip(&self.shape, &self.stride) {
            if stride < 0 {
                base += (size as isize - 1) * stride;
            }
        }
        let stride_abs: Vec<usize> = self.stride.iter().map(|s| s.unsigned_abs()).collect();
        let mut view = ndarray::ArrayViewD::from_shape(
            ndarray::IxDyn(&self.shape).strides(ndarray::IxDyn(&stride_abs)),
            &elements[base as usize..],
        )?;
        for (axis, &stride) in self.stride.iter().enumerate() {
            if stride < 0 {
                view.invert_axis(ndarray::Axis(axis));
            }
        }
        Ok(view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strided_buffer_default_stride() {
        assert_eq!(default_stride(&[3, 4, 5]), vec![20, 5, 1]);
        assert_eq!(default_stride(&[7]), vec![1]);
        assert!(default_stride(&[]).is_empty());
        let buffer = StridedBuffer::zeros(ElementKind::UInt16, vec![12, 16]);
        assert_eq!(buffer.stride(), &[16, 1]);
        assert_eq!(buffer.offset(), 0);
        assert_eq!(buffer.data().len(), 192);
        assert_eq!(buffer.data().as_bytes().len(), 384);
    }

    #[test]
    fn strided_buffer_default_offset() {
        assert_eq!(default_offset(&[3, 4], &[4, 1]), 0);
        assert_eq!(default_offset(&[3, 4], &[-4, 1]), 8);
        assert_eq!(default_offset(&[3, 4], &[1, -3]), 9);
        assert_eq!(default_offset(&[3, 4], &[-1, -3]), 11);
        let buffer = StridedBuffer::with_strides(vec![0u8; 12], vec![3, 4], vec![-4, 1]);
        assert_eq!(buffer.offset(), 8);
        assert!(buffer.validate().is_ok());
    }

    #[test]
    fn strided_buffer_validate() {
        let buffer = StridedBuffer::with_strides_offset(vec![0u8; 4], vec![2, 2], vec![2], 0);
        assert!(matches!(
            buffer.validate(),
            Err(StridedBufferError::IncompatibleStride(1, 2))
        ));
        let buffer = StridedBuffer::new(vec![0u8; 3], vec![2, 2]);
        assert!(matches!(
            buffer.validate(),
            Err(StridedBufferError::OutOfBounds { len: 3, .. })
        ));
        let buffer = StridedBuffer::with_strides_offset(vec![0u8; 4], vec![2, 2], vec![-2, 1], 0);
        assert!(buffer.validate().is_err());
        let buffer = StridedBuffer::new(Vec::<f32>::new(), vec![0, 5]);
        assert!(buffer.validate().is_ok());
    }

    #[test]
    fn strided_buffer_logical_access() -> Result<(), Box<dyn std::error::Error>> {
        // Logical [[0, 1, 2], [3, 4, 5]] in four layouts
        let row_major = StridedBuffer::new(vec![0i16, 1, 2, 3, 4, 5], vec![2, 3]);
        let column_major =
            StridedBuffer::with_strides(vec![0i16, 3, 1, 4, 2, 5], vec![2, 3], vec![1, 2]);
        let row_negative =
            StridedBuffer::with_strides(vec![3i16, 4, 5, 0, 1, 2], vec![2, 3], vec![-3, 1]);
        let column_negative =
            StridedBuffer::with_strides(vec![2i16, 5, 1, 4, 0, 3], vec![2, 3], vec![1, -2]);
        for buffer in [&row_major, &column_major, &row_negative, &column_negative] {
            assert_eq!(buffer.to_vec::<i16>()?, vec![0, 1, 2, 3, 4, 5]);
            assert_eq!(buffer.get::<i16>(&[1, 2]), Some(5));
            assert_eq!(buffer.get::<i16>(&[2, 0]), None);
            assert_eq!(buffer.get::<u16>(&[0, 0]), None);
        }
        assert!(row_major.to_vec::<f64>().is_err());

        let mut buffer = column_negative;
        *buffer.get_mut::<i16>(&[0, 1]).unwrap() = 10;
        assert_eq!(buffer.to_vec::<i16>()?, vec![0, 10, 2, 3, 4, 5]);
        Ok(())
    }

    #[test]
    fn strided_data_bytes() {
        let mut data = StridedData::new_zeroed(ElementKind::Float64, 2);
        assert_eq!(data.kind(), ElementKind::Float64);
        assert_eq!(data.as_bytes().len(), 16);
        data.as_bytes_mut()[..8].copy_from_slice(&1.5f64.to_ne_bytes());
        assert_eq!(data, StridedData::Float64(vec![1.5, 0.0]));
        assert!(StridedData::new_zeroed(ElementKind::Int8, 0).is_empty());
    }

    #[cfg(feature = "ndarray")]
    #[test]
    fn strided_buffer_ndarray() -> Result<(), Box<dyn std::error::Error>> {
        let array = ndarray::array![[1u32, 2, 3], [4, 5, 6]];
        let buffer = StridedBuffer::from_ndarray(array.clone().reversed_axes());
        assert_eq!(buffer.shape(), &[3, 2]);
        assert_eq!(buffer.stride(), &[1, 3]);
        assert_eq!(buffer.to_vec::<u32>()?, vec![1, 4, 2, 5, 3, 6]);

        let mut flipped = array.clone();
        flipped.invert_axis(ndarray::Axis(0));
        let buffer = StridedBuffer::from_ndarray(flipped.clone());
        assert_eq!(buffer.stride(), &[-3, 1]);
        assert_eq!(buffer.offset(), 3);
        assert_eq!(buffer.to_vec::<u32>()?, vec![4, 5, 6, 1, 2, 3]);
        assert_eq!(buffer.ndarray_view::<u32>()?, flipped.into_dyn());

        let buffer =
            StridedBuffer::with_strides(vec![3u32, 6, 2, 5, 1, 4], vec![2, 3], vec![1, -2]);
        assert_eq!(buffer.ndarray_view::<u32>()?, array.into_dyn());
        assert!(buffer.ndarray_view::<i32>().is_err());
        Ok(())
    }
}
