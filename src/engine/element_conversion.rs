//! Element conversion between data types for the in-memory engines.
//!
//! Values pass through `f64`, which holds every supported element exactly.
//! Integer targets round to the nearest value and saturate.

use crate::data_type::ElementKind;

pub(super) fn read_element(kind: ElementKind, bytes: &[u8]) -> f64 {
    let bytes = &bytes[..kind.size()];
    match kind {
        ElementKind::Int8 => f64::from(bytemuck::pod_read_unaligned::<i8>(bytes)),
        ElementKind::UInt8 => f64::from(bytemuck::pod_read_unaligned::<u8>(bytes)),
        ElementKind::Int16 => f64::from(bytemuck::pod_read_unaligned::<i16>(bytes)),
        ElementKind::UInt16 => f64::from(bytemuck::pod_read_unaligned::<u16>(bytes)),
        ElementKind::Int32 => f64::from(bytemuck::pod_read_unaligned::<i32>(bytes)),
        ElementKind::UInt32 => f64::from(bytemuck::pod_read_unaligned::<u32>(bytes)),
        ElementKind::Float32 => f64::from(bytemuck::pod_read_unaligned::<f32>(bytes)),
        ElementKind::Float64 => bytemuck::pod_read_unaligned::<f64>(bytes),
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(super) fn write_element(kind: ElementKind, bytes: &mut [u8], value: f64) {
    let bytes = &mut bytes[..kind.size()];
    match kind {
        ElementKind::Int8 => bytes.copy_from_slice(bytemuck::bytes_of(&(value.round() as i8))),
        ElementKind::UInt8 => bytes.copy_from_slice(bytemuck::bytes_of(&(value.round() as u8))),
        ElementKind::Int16 => bytes.copy_from_slice(bytemuck::bytes_of(&(value.round() as i16))),
        ElementKind::UInt16 => {
            bytes.copy_from_slice(bytemuck::bytes_of(&(value.round() as u16)));
        }
        ElementKind::Int32 => bytes.copy_from_slice(bytemuck::bytes_of(&(value.round() as i32))),
        ElementKind::UInt32 => {
            bytes.copy_from_slice(bytemuck::bytes_of(&(value.round() as u32)));
        }
        ElementKind::Float32 => bytes.copy_from_slice(bytemuck::bytes_of(&(value as f32))),
        ElementKind::Float64 => bytes.copy_from_slice(bytemuck::bytes_of(&value)),
    }
}

/// The byte layout of a strided buffer in a transfer, checked against the buffer length.
#[derive(Debug)]
pub(super) struct BufferLayout {
    pub(super) kind: ElementKind,
    base: i128,
    spacing: Vec<i128>,
}

impl BufferLayout {
    /// Create a buffer layout from an element offset and per-dimension byte spacings.
    ///
    /// Returns [`None`] if an element addressed by `shape` lies outside a buffer of `len` bytes.
    pub(super) fn new(
        kind: ElementKind,
        offset: usize,
        shape: &[usize],
        spacing: &[isize],
        len: usize,
    ) -> Option<Self> {
        let element_size = kind.size() as i128;
        let base = offset as i128 * element_size;
        let spacing: Vec<i128> = spacing.iter().map(|&s| s as i128).collect();
        if shape.iter().all(|&size| size > 0) {
            let (min, max) = std::iter::zip(shape, &spacing).fold(
                (base, base),
                |(min, max), (&size, &spacing)| {
                    let extent = (size as i128 - 1) * spacing;
                    (min + extent.min(0), max + extent.max(0))
                },
            );
            if min < 0 || max + element_size > len as i128 {
                return None;
            }
        }
        Some(Self {
            kind,
            base,
            spacing,
        })
    }

    /// The byte index of the element at `indices`, which must be within the shape the layout was created with.
    #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
    pub(super) fn byte_index(&self, indices: &[usize]) -> usize {
        let index = std::iter::zip(indices, &self.spacing)
            .fold(self.base, |index, (&i, &spacing)| index + i as i128 * spacing);
        index as usize
    }
}

/// The source index of destination index `dst` when resampling `src_len` elements to `dst_len` elements with nearest neighbour (pixel centre rule).
pub(super) fn nearest_index(dst: usize, dst_len: usize, src_len: usize) -> usize {
    ((2 * dst + 1) * src_len / (2 * dst_len)).min(src_len - 1)
}

/// The source index range contributing to destination index `dst` when averaging `src_len` elements to `dst_len` elements.
pub(super) fn average_range(dst: usize, dst_len: usize, src_len: usize) -> std::ops::Range<usize> {
    let start = dst * src_len / dst_len;
    let end = ((dst + 1) * src_len).div_ceil(dst_len);
    start..end.max(start + 1).min(src_len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_conversion() {
        let mut bytes = [0u8; 8];
        write_element(ElementKind::UInt8, &mut bytes, 300.0);
        assert_eq!(read_element(ElementKind::UInt8, &bytes), 255.0);
        write_element(ElementKind::Int16, &mut bytes, -2.6);
        assert_eq!(read_element(ElementKind::Int16, &bytes), -3.0);
        write_element(ElementKind::UInt32, &mut bytes, -1.0);
        assert_eq!(read_element(ElementKind::UInt32, &bytes), 0.0);
        write_element(ElementKind::Float32, &mut bytes, 0.5);
        assert_eq!(read_element(ElementKind::Float32, &bytes), 0.5);
        write_element(ElementKind::Float64, &mut bytes, f64::MAX);
        assert_eq!(read_element(ElementKind::Float64, &bytes), f64::MAX);
    }

    #[test]
    fn buffer_layout() {
        // 2x3 rows/columns of u16, row negative
        let layout = BufferLayout::new(ElementKind::UInt16, 3, &[2, 3], &[-6, 2], 12).unwrap();
        assert_eq!(layout.byte_index(&[0, 0]), 6);
        assert_eq!(layout.byte_index(&[1, 0]), 0);
        assert_eq!(layout.byte_index(&[1, 2]), 4);
        assert!(BufferLayout::new(ElementKind::UInt16, 3, &[2, 3], &[-6, 2], 11).is_none());
        assert!(BufferLayout::new(ElementKind::UInt16, 0, &[2, 3], &[-6, 2], 12).is_none());
        assert!(BufferLayout::new(ElementKind::UInt16, 100, &[0, 3], &[-6, 2], 12).is_some());
    }

    #[test]
    fn resampling_indices() {
        assert_eq!((0..4).map(|i| nearest_index(i, 4, 4)).collect::<Vec<_>>(), [0, 1, 2, 3]);
        assert_eq!((0..2).map(|i| nearest_index(i, 2, 4)).collect::<Vec<_>>(), [1, 3]);
        assert_eq!((0..4).map(|i| nearest_index(i, 4, 2)).collect::<Vec<_>>(), [0, 0, 1, 1]);
        assert_eq!(average_range(0, 2, 4), 0..2);
        assert_eq!(average_range(1, 2, 4), 2..4);
        assert_eq!(average_range(1, 3, 4), 1..3);
        assert_eq!(average_range(3, 4, 2), 1..2);
    }
}
