use crate::{
    array_region::{ArrayRegion, IncompatibleDimensionalityError},
    data_type::NativeDataType,
    engine::{MdArrayIoDescriptor, MdArrayIoTraits},
    strided_buffer::StridedBuffer,
};

use super::{allocate_buffer, validate_buffer, ArrayError};

/// Options for reading a region of a multidimensional array.
///
/// Every field is optional:
///  - `data`: the buffer to read into. A buffer of shape `span` is allocated if it is absent.
///  - `origin`: the origin of the region, default all zeros.
///  - `span`: the span of the region, default the array shape.
#[derive(Debug, Clone, Default)]
pub struct MdArrayOptions {
    data: Option<StridedBuffer>,
    origin: Option<Vec<u64>>,
    span: Option<Vec<u64>>,
}

impl MdArrayOptions {
    /// Create a new multidimensional array options builder.
    #[must_use]
    pub fn builder() -> MdArrayOptionsBuilder {
        MdArrayOptionsBuilder::new()
    }

    /// Return the buffer.
    #[must_use]
    pub fn data(&self) -> Option<&StridedBuffer> {
        self.data.as_ref()
    }

    /// Take the buffer, leaving [`None`].
    pub fn take_data(&mut self) -> Option<StridedBuffer> {
        self.data.take()
    }

    /// Set the buffer.
    pub fn set_data(&mut self, data: Option<StridedBuffer>) {
        self.data = data;
    }

    /// Return the origin of the region.
    #[must_use]
    pub fn origin(&self) -> Option<&[u64]> {
        self.origin.as_deref()
    }

    /// Set the origin of the region.
    pub fn set_origin(&mut self, origin: Option<Vec<u64>>) {
        self.origin = origin;
    }

    /// Return the span of the region.
    #[must_use]
    pub fn span(&self) -> Option<&[u64]> {
        self.span.as_deref()
    }

    /// Set the span of the region.
    pub fn set_span(&mut self, span: Option<Vec<u64>>) {
        self.span = span;
    }
}

/// Builder for [`MdArrayOptions`].
#[derive(Debug, Clone, Default)]
pub struct MdArrayOptionsBuilder {
    options: MdArrayOptions,
}

impl MdArrayOptionsBuilder {
    /// Create a new multidimensional array options builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build into multidimensional array options.
    #[must_use]
    pub fn build(self) -> MdArrayOptions {
        self.options
    }

    /// Set the buffer.
    #[must_use]
    pub fn data(mut self, data: StridedBuffer) -> Self {
        self.options.data = Some(data);
        self
    }

    /// Set the origin of the region.
    #[must_use]
    pub fn origin(mut self, origin: Vec<u64>) -> Self {
        self.options.origin = Some(origin);
        self
    }

    /// Set the span of the region.
    #[must_use]
    pub fn span(mut self, span: Vec<u64>) -> Self {
        self.options.span = Some(span);
        self
    }
}

/// A validated multidimensional array read.
pub(super) struct MdArrayRead {
    data: StridedBuffer,
    stride: Vec<isize>,
    region: ArrayRegion,
    data_type: NativeDataType,
}

impl MdArrayRead {
    /// Validate a read of an array with `dimensionality` dimensions and native data type `array_data_type`, allocating a buffer if required.
    ///
    /// `span` is the resolved span of the region.
    pub(super) fn new(
        array_data_type: NativeDataType,
        dimensionality: usize,
        mut options: MdArrayOptions,
        span: Vec<u64>,
    ) -> Result<Self, ArrayError> {
        let data = if let Some(data) = options.take_data() {
            data
        } else {
            let shape = span
                .iter()
                .map(|&size| usize::try_from(size).map_err(|_| ArrayError::ExtentOverflow(size)))
                .collect::<Result<Vec<_>, _>>()?;
            allocate_buffer(array_data_type, shape)?
        };
        let data_type = validate_buffer(&data, dimensionality)?;
        let origin = options
            .origin
            .take()
            .unwrap_or_else(|| vec![0; dimensionality]);
        let region = ArrayRegion::new_with_origin_span(origin, span)?;
        if region.dimensionality() != dimensionality {
            return Err(IncompatibleDimensionalityError::new(
                region.dimensionality(),
                dimensionality,
            )
            .into());
        }
        let shape_matches = data
            .shape()
            .iter()
            .zip(region.span())
            .all(|(&size, &span)| u64::try_from(size).is_ok_and(|size| size == span));
        if !shape_matches {
            return Err(ArrayError::ShapeMismatch {
                shape: data.shape().to_vec(),
                span: region.span().to_vec(),
            });
        }
        Ok(Self {
            stride: data.stride().to_vec(),
            data,
            region,
            data_type,
        })
    }

    /// Split into the engine descriptor and the raw buffer.
    pub(super) fn split(&mut self) -> (MdArrayIoDescriptor<'_>, &mut [u8]) {
        let descriptor = MdArrayIoDescriptor {
            origin: self.region.origin(),
            span: self.region.span(),
            stride: &self.stride,
            offset: self.data.offset(),
            data_type: self.data_type,
        };
        (descriptor, self.data.data_mut().as_bytes_mut())
    }

    pub(super) fn into_data(self) -> StridedBuffer {
        self.data
    }
}

/// Strided buffer reads for multidimensional arrays.
pub trait MdArrayReadExt: MdArrayIoTraits {
    /// Read a region of the array into a strided buffer.
    ///
    /// The array dimensionality `N` is queried from the engine, as are the dimension sizes if `options` has no span.
    /// If `options` has no buffer, a buffer of shape `span` with a default row-major stride is allocated with the element kind of the array data type.
    /// The buffer is returned populated.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - the buffer is not a coherent strided buffer,
    ///  - the buffer does not have `N` dimensions,
    ///  - the buffer element kind or array data type is not supported,
    ///  - the origin or span do not have `N` dimensions,
    ///  - the buffer shape is not the span, or
    ///  - an engine query or read fails.
    fn read_array(&self, options: MdArrayOptions) -> Result<StridedBuffer, ArrayError>;
}

impl<T: ?Sized + MdArrayIoTraits> MdArrayReadExt for T {
    fn read_array(&self, mut options: MdArrayOptions) -> Result<StridedBuffer, ArrayError> {
        let dimensionality = self.dimension_count()?;
        let span = if let Some(span) = options.span.take() {
            span
        } else {
            (0..dimensionality)
                .map(|index| self.dimension_size(index))
                .collect::<Result<Vec<_>, _>>()?
        };
        let mut read = MdArrayRead::new(self.data_type(), dimensionality, options, span)?;
        let (descriptor, buffer) = read.split();
        self.read(&descriptor, buffer)?;
        Ok(read.into_data())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn md_array_options_builder() {
        let options = MdArrayOptions::builder()
            .origin(vec![0, 1])
            .span(vec![2, 2])
            .build();
        assert_eq!(options.origin(), Some([0, 1].as_slice()));
        assert_eq!(options.span(), Some([2, 2].as_slice()));
        assert!(options.data().is_none());
    }

    #[test]
    fn md_array_read_validation() {
        let read = MdArrayRead::new(
            NativeDataType::Float32,
            3,
            MdArrayOptions::default(),
            vec![1, 10, 10],
        )
        .unwrap();
        assert_eq!(read.data.shape(), &[1, 10, 10]);
        assert_eq!(read.stride, vec![100, 10, 1]);
        assert_eq!(read.region.origin(), &[0, 0, 0]);

        let options = MdArrayOptions::builder().origin(vec![0, 0]).build();
        assert!(matches!(
            MdArrayRead::new(NativeDataType::Float32, 3, options, vec![1, 10, 10]),
            Err(ArrayError::IncompatibleDimensionality(_))
        ));
        assert!(matches!(
            MdArrayRead::new(NativeDataType::Float32, 3, MdArrayOptions::default(), vec![1, 10]),
            Err(ArrayError::DimensionMismatch { expected: 3, got: 2 })
        ));
        assert!(matches!(
            MdArrayRead::new(NativeDataType::CInt16, 1, MdArrayOptions::default(), vec![4]),
            Err(ArrayError::TypeNotSupported(_))
        ));

        let options = MdArrayOptions::builder()
            .data(StridedBuffer::new(vec![0f32; 100], vec![1, 10, 10]))
            .build();
        assert!(matches!(
            MdArrayRead::new(NativeDataType::Float32, 3, options, vec![1, 10, 9]),
            Err(ArrayError::ShapeMismatch { shape, span }) if shape == [1, 10, 10] && span == [1, 10, 9]
        ));
    }

    #[cfg(target_pointer_width = "32")]
    #[test]
    fn md_array_read_extent_overflow() {
        let span = vec![1, 1 << 33];
        assert!(matches!(
            MdArrayRead::new(NativeDataType::Byte, 2, MdArrayOptions::default(), span),
            Err(ArrayError::ExtentOverflow(extent)) if extent == 1 << 33
        ));
    }
}
