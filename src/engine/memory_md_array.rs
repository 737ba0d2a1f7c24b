//! An in-memory multidimensional array.

use parking_lot::RwLock;

use crate::{
    array_region::ArrayRegion,
    data_type::{Element, ElementKind, NativeDataType},
};

use super::{
    element_conversion::{read_element, write_element, BufferLayout},
    EngineError, MdArrayIoDescriptor, MdArrayIoTraits, MdArrayTraits,
};

#[cfg(feature = "async")]
use super::AsyncMdArrayIoTraits;

/// An in-memory multidimensional array.
///
/// Elements are stored row-major as native endian bytes of the array data type.
#[derive(Debug)]
pub struct MemoryMdArray {
    shape: Vec<u64>,
    data_type: NativeDataType,
    data: RwLock<Vec<u8>>,
}

fn num_elements(shape: &[u64]) -> Result<usize, EngineError> {
    shape
        .iter()
        .try_fold(1usize, |product, &size| {
            product.checked_mul(usize::try_from(size).ok()?)
        })
        .ok_or_else(|| {
            EngineError::InvalidDescriptor(format!("an array of shape {shape:?} is too large"))
        })
}

impl MemoryMdArray {
    /// Create a new zero initialised array.
    ///
    /// # Errors
    /// Returns an [`EngineError`] if the array would not fit in memory.
    pub fn new(shape: Vec<u64>, data_type: NativeDataType) -> Result<Self, EngineError> {
        let len = num_elements(&shape)? * data_type.size();
        Ok(Self {
            shape,
            data_type,
            data: RwLock::new(vec![0; len]),
        })
    }

    /// Create a new array from row-major `elements`.
    ///
    /// # Errors
    /// Returns an [`EngineError`] if `T` has no native data type or the number of elements does not match `shape`.
    pub fn from_elements<T: Element>(shape: Vec<u64>, elements: Vec<T>) -> Result<Self, EngineError> {
        let data_type = T::KIND.native_data_type().ok_or_else(|| {
            EngineError::Unsupported(format!("element kind {} has no native data type", T::KIND))
        })?;
        if elements.len() != num_elements(&shape)? {
            return Err(EngineError::InvalidDescriptor(format!(
                "{} elements cannot fill an array of shape {shape:?}",
                elements.len()
            )));
        }
        Ok(Self {
            shape,
            data_type,
            data: RwLock::new(bytemuck::cast_slice(&elements).to_vec()),
        })
    }

    /// Returns the shape of the array.
    #[must_use]
    pub fn shape(&self) -> &[u64] {
        &self.shape
    }

    fn element_kind(data_type: NativeDataType) -> Result<ElementKind, EngineError> {
        data_type.element_kind().ok_or_else(|| {
            EngineError::Unsupported(format!(
                "data type {data_type} is not supported by the memory engine"
            ))
        })
    }

    fn region(&self, descriptor: &MdArrayIoDescriptor<'_>) -> Result<ArrayRegion, EngineError> {
        let dimensionality = self.shape.len();
        if descriptor.origin.len() != dimensionality
            || descriptor.span.len() != dimensionality
            || descriptor.stride.len() != dimensionality
        {
            return Err(EngineError::InvalidDescriptor(format!(
                "expected {dimensionality} dimensions, got origin {:?} span {:?} stride {:?}",
                descriptor.origin, descriptor.span, descriptor.stride
            )));
        }
        let region =
            ArrayRegion::new_with_origin_span(descriptor.origin.to_vec(), descriptor.span.to_vec())
                .map_err(|err| EngineError::InvalidDescriptor(err.to_string()))?;
        if region.inbounds(&self.shape) {
            Ok(region)
        } else {
            Err(EngineError::RegionOutOfBounds {
                origin: descriptor.origin.to_vec(),
                span: descriptor.span.to_vec(),
                shape: self.shape.clone(),
            })
        }
    }
}

impl MdArrayTraits for MemoryMdArray {
    fn data_type(&self) -> NativeDataType {
        self.data_type
    }
}

impl MdArrayIoTraits for MemoryMdArray {
    fn dimension_count(&self) -> Result<usize, EngineError> {
        Ok(self.shape.len())
    }

    fn dimension_size(&self, index: usize) -> Result<u64, EngineError> {
        self.shape.get(index).copied().ok_or_else(|| {
            EngineError::InvalidDescriptor(format!(
                "dimension {index} does not exist in an array with {} dimensions",
                self.shape.len()
            ))
        })
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    fn read(
        &self,
        descriptor: &MdArrayIoDescriptor<'_>,
        buffer: &mut [u8],
    ) -> Result<(), EngineError> {
        let region = self.region(descriptor)?;
        let kind = Self::element_kind(self.data_type)?;
        let buffer_kind = Self::element_kind(descriptor.data_type)?;
        if region.num_elements() == 0 {
            return Ok(());
        }
        let span = region
            .span()
            .iter()
            .map(|&size| usize::try_from(size))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| EngineError::BufferOutOfBounds(buffer.len()))?;
        let spacing: Vec<isize> = descriptor
            .stride
            .iter()
            .map(|&stride| stride * buffer_kind.size() as isize)
            .collect();
        let layout = BufferLayout::new(buffer_kind, descriptor.offset, &span, &spacing, buffer.len())
            .ok_or(EngineError::BufferOutOfBounds(buffer.len()))?;

        let mut array_stride = vec![1u64; self.shape.len()];
        for dimension in (0..self.shape.len().saturating_sub(1)).rev() {
            array_stride[dimension] = array_stride[dimension + 1] * self.shape[dimension + 1];
        }

        let data = self.data.read();
        let mut buffer_indices = vec![0usize; span.len()];
        for indices in region.iter_indices() {
            let element: u64 = std::iter::zip(&indices, &array_stride)
                .map(|(index, stride)| index * stride)
                .sum();
            let value = read_element(kind, &data[element as usize * kind.size()..]);
            for ((buffer_index, index), origin) in
                buffer_indices.iter_mut().zip(&indices).zip(region.origin())
            {
                *buffer_index = (index - origin) as usize;
            }
            let index = layout.byte_index(&buffer_indices);
            write_element(buffer_kind, &mut buffer[index..], value);
        }
        Ok(())
    }
}

#[cfg(feature = "async")]
#[async_trait::async_trait]
impl AsyncMdArrayIoTraits for MemoryMdArray {
    async fn dimension_count(&self) -> Result<usize, EngineError> {
        MdArrayIoTraits::dimension_count(self)
    }

    async fn dimension_size(&self, index: usize) -> Result<u64, EngineError> {
        MdArrayIoTraits::dimension_size(self, index)
    }

    async fn read(
        &self,
        descriptor: &MdArrayIoDescriptor<'_>,
        buffer: &mut [u8],
    ) -> Result<(), EngineError> {
        MdArrayIoTraits::read(self, descriptor, buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::{
        EngineError, MdArrayIoDescriptor, MdArrayIoTraits, MdArrayTraits, MemoryMdArray,
        NativeDataType,
    };

    #[test]
    fn memory_md_array_dimensions() -> Result<(), Box<dyn std::error::Error>> {
        let array = MemoryMdArray::new(vec![2, 3, 4], NativeDataType::Float32)?;
        assert_eq!(array.dimension_count()?, 3);
        assert_eq!(array.dimension_size(1)?, 3);
        assert!(matches!(
            array.dimension_size(3),
            Err(EngineError::InvalidDescriptor(_))
        ));
        assert_eq!(array.data_type(), NativeDataType::Float32);
        assert!(MemoryMdArray::new(vec![u64::MAX, u64::MAX], NativeDataType::Byte).is_err());
        Ok(())
    }

    #[test]
    fn memory_md_array_read() -> Result<(), Box<dyn std::error::Error>> {
        let elements: Vec<u16> = (0..24).collect();
        let array = MemoryMdArray::from_elements(vec![2, 3, 4], elements)?;

        // [1, 1..3, 2..4] into a column-major f64 buffer
        let mut buffer = vec![0u8; 4 * 8];
        array.read(
            &MdArrayIoDescriptor {
                origin: &[1, 1, 2],
                span: &[1, 2, 2],
                stride: &[4, 1, 2],
                offset: 0,
                data_type: NativeDataType::Float64,
            },
            &mut buffer,
        )?;
        let values: Vec<f64> = bytemuck::pod_collect_to_vec(&buffer);
        assert_eq!(values, vec![18.0, 22.0, 19.0, 23.0]);
        Ok(())
    }

    #[test]
    fn memory_md_array_read_errors() -> Result<(), Box<dyn std::error::Error>> {
        let array = MemoryMdArray::from_elements(vec![2, 2], vec![1i32, 2, 3, 4])?;
        let mut buffer = vec![0u8; 16];
        let descriptor = MdArrayIoDescriptor {
            origin: &[1, 0],
            span: &[2, 2],
            stride: &[2, 1],
            offset: 0,
            data_type: NativeDataType::Int32,
        };
        assert!(matches!(
            array.read(&descriptor, &mut buffer),
            Err(EngineError::RegionOutOfBounds { .. })
        ));
        let descriptor = MdArrayIoDescriptor {
            origin: &[0, 0],
            span: &[2, 2],
            stride: &[-2, 1],
            ..descriptor
        };
        assert!(matches!(
            array.read(&descriptor, &mut buffer),
            Err(EngineError::BufferOutOfBounds(16))
        ));
        let descriptor = MdArrayIoDescriptor {
            offset: 2,
            ..descriptor
        };
        array.read(&descriptor, &mut buffer)?;
        let values: Vec<i32> = bytemuck::pod_collect_to_vec(&buffer);
        assert_eq!(values, vec![3, 4, 1, 2]);
        let descriptor = MdArrayIoDescriptor {
            stride: &[1],
            ..descriptor
        };
        assert!(matches!(
            array.read(&descriptor, &mut buffer),
            Err(EngineError::InvalidDescriptor(_))
        ));
        Ok(())
    }
}
