//! Element kinds and native data types.
//!
//! An [`ElementKind`] is the numeric representation of the elements of a [`StridedBuffer`](crate::strided_buffer::StridedBuffer).
//! A [`NativeDataType`] is the data type code of the underlying raster engine (GDAL numbering).
//!
//! The two are related by a single table: [`ElementKind::native_data_type`] is an exhaustive match and
//! [`NativeDataType::element_kind`] is its inverse, derived once at first use.

use std::sync::OnceLock;

use serde_repr::{Deserialize_repr, Serialize_repr};
use thiserror::Error;

use crate::strided_buffer::StridedData;

/// The element kind of a strided buffer.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[rustfmt::skip]
pub enum ElementKind {
    /// `int8` Integer in `[-2^7, 2^7-1]`.
    Int8,
    /// `uint8` Integer in `[0, 2^8-1]`.
    UInt8,
    /// `int16` Integer in `[-2^15, 2^15-1]`.
    Int16,
    /// `uint16` Integer in `[0, 2^16-1]`.
    UInt16,
    /// `int32` Integer in `[-2^31, 2^31-1]`.
    Int32,
    /// `uint32` Integer in `[0, 2^32-1]`.
    UInt32,
    /// `float32` IEEE 754 single-precision floating point.
    Float32,
    /// `float64` IEEE 754 double-precision floating point.
    Float64,
}

impl ElementKind {
    /// All element kinds.
    pub const ALL: [Self; 8] = [
        Self::Int8,
        Self::UInt8,
        Self::Int16,
        Self::UInt16,
        Self::Int32,
        Self::UInt32,
        Self::Float32,
        Self::Float64,
    ];

    /// Returns the identifier.
    #[must_use]
    pub const fn identifier(&self) -> &'static str {
        match self {
            Self::Int8 => "int8",
            Self::UInt8 => "uint8",
            Self::Int16 => "int16",
            Self::UInt16 => "uint16",
            Self::Int32 => "int32",
            Self::UInt32 => "uint32",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
        }
    }

    /// Returns the size of an element in bytes.
    #[must_use]
    pub const fn size(&self) -> usize {
        match self {
            Self::Int8 | Self::UInt8 => 1,
            Self::Int16 | Self::UInt16 => 2,
            Self::Int32 | Self::UInt32 | Self::Float32 => 4,
            Self::Float64 => 8,
        }
    }

    /// Returns the native data type of the element kind.
    ///
    /// Returns [`None`] if the raster engine cannot represent the element kind.
    #[must_use]
    pub const fn native_data_type(&self) -> Option<NativeDataType> {
        match self {
            Self::Int8 => None,
            Self::UInt8 => Some(NativeDataType::Byte),
            Self::Int16 => Some(NativeDataType::Int16),
            Self::UInt16 => Some(NativeDataType::UInt16),
            Self::Int32 => Some(NativeDataType::Int32),
            Self::UInt32 => Some(NativeDataType::UInt32),
            Self::Float32 => Some(NativeDataType::Float32),
            Self::Float64 => Some(NativeDataType::Float64),
        }
    }
}

impl core::fmt::Display for ElementKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.identifier())
    }
}

/// A native data type code of the raster engine.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
#[repr(u32)]
pub enum NativeDataType {
    /// Unknown or unspecified type.
    Unknown = 0,
    /// Eight bit unsigned integer.
    Byte = 1,
    /// Sixteen bit unsigned integer.
    UInt16 = 2,
    /// Sixteen bit signed integer.
    Int16 = 3,
    /// Thirty two bit unsigned integer.
    UInt32 = 4,
    /// Thirty two bit signed integer.
    Int32 = 5,
    /// Thirty two bit floating point.
    Float32 = 6,
    /// Sixty four bit floating point.
    Float64 = 7,
    /// Complex `Int16`.
    CInt16 = 8,
    /// Complex `Int32`.
    CInt32 = 9,
    /// Complex `Float32`.
    CFloat32 = 10,
    /// Complex `Float64`.
    CFloat64 = 11,
}

/// An unknown native data type code error.
#[derive(Debug, Error)]
#[error("unknown native data type code {_0}")]
pub struct UnknownNativeDataTypeError(u32);

const NATIVE_DATA_TYPE_COUNT: usize = 12;

static ELEMENT_KINDS: OnceLock<[Option<ElementKind>; NATIVE_DATA_TYPE_COUNT]> = OnceLock::new();

/// The inverse of [`ElementKind::native_data_type`], indexed by native code.
///
/// # Panics
/// Panics on first use if a native data type is mapped by more than one element kind.
fn element_kinds() -> &'static [Option<ElementKind>; NATIVE_DATA_TYPE_COUNT] {
    ELEMENT_KINDS.get_or_init(|| {
        let mut element_kinds = [None; NATIVE_DATA_TYPE_COUNT];
        for kind in ElementKind::ALL {
            if let Some(native) = kind.native_data_type() {
                let slot = &mut element_kinds[native.code() as usize];
                assert!(
                    slot.is_none(),
                    "native data type {native} is mapped by more than one element kind"
                );
                *slot = Some(kind);
            }
        }
        element_kinds
    })
}

impl NativeDataType {
    /// Returns the integer code.
    #[must_use]
    pub const fn code(&self) -> u32 {
        *self as u32
    }

    /// Returns the name of the data type.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::Byte => "Byte",
            Self::UInt16 => "UInt16",
            Self::Int16 => "Int16",
            Self::UInt32 => "UInt32",
            Self::Int32 => "Int32",
            Self::Float32 => "Float32",
            Self::Float64 => "Float64",
            Self::CInt16 => "CInt16",
            Self::CInt32 => "CInt32",
            Self::CFloat32 => "CFloat32",
            Self::CFloat64 => "CFloat64",
        }
    }

    /// Returns the size of an element of this data type in bytes.
    ///
    /// Returns zero for [`NativeDataType::Unknown`].
    #[must_use]
    pub const fn size(&self) -> usize {
        match self {
            Self::Unknown => 0,
            Self::Byte => 1,
            Self::UInt16 | Self::Int16 => 2,
            Self::UInt32 | Self::Int32 | Self::Float32 | Self::CInt16 => 4,
            Self::Float64 | Self::CInt32 | Self::CFloat32 => 8,
            Self::CFloat64 => 16,
        }
    }

    /// Returns the element kind corresponding to the native data type.
    ///
    /// Returns [`None`] if no element kind can hold this data type.
    ///
    /// # Panics
    /// Panics if the element kind mapping is not injective, which is checked once on first use.
    #[must_use]
    pub fn element_kind(&self) -> Option<ElementKind> {
        element_kinds()[self.code() as usize]
    }
}

impl core::fmt::Display for NativeDataType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<u32> for NativeDataType {
    type Error = UnknownNativeDataTypeError;

    fn try_from(code: u32) -> Result<Self, Self::Error> {
        Ok(match code {
            0 => Self::Unknown,
            1 => Self::Byte,
            2 => Self::UInt16,
            3 => Self::Int16,
            4 => Self::UInt32,
            5 => Self::Int32,
            6 => Self::Float32,
            7 => Self::Float64,
            8 => Self::CInt16,
            9 => Self::CInt32,
            10 => Self::CFloat32,
            11 => Self::CFloat64,
            _ => return Err(UnknownNativeDataTypeError(code)),
        })
    }
}

/// A trait representing a strided buffer element type.
pub trait Element: bytemuck::Pod + Send + Sync + 'static {
    /// The element kind.
    const KIND: ElementKind;

    /// Wrap a vector of elements.
    fn into_data(elements: Vec<Self>) -> StridedData;

    /// Returns the elements of `data` if `data` holds elements of this type.
    fn data_slice(data: &StridedData) -> Option<&[Self]>;

    /// Returns the elements of `data` mutably if `data` holds elements of this type.
    fn data_slice_mut(data: &mut StridedData) -> Option<&mut [Self]>;

    /// Unwrap the elements of `data`.
    ///
    /// # Errors
    /// Returns `data` unchanged if it does not hold elements of this type.
    fn from_data(data: StridedData) -> Result<Vec<Self>, StridedData>;
}

macro_rules! impl_element {
    ($raw_type:ty, $kind:ident) => {
        impl Element for $raw_type {
            const KIND: ElementKind = ElementKind::$kind;

            fn into_data(elements: Vec<Self>) -> StridedData {
                StridedData::$kind(elements)
            }

            fn data_slice(data: &StridedData) -> Option<&[Self]> {
                if let StridedData::$kind(elements) = data {
                    Some(elements)
                } else {
                    None
                }
            }

            fn data_slice_mut(data: &mut StridedData) -> Option<&mut [Self]> {
                if let StridedData::$kind(elements) = data {
                    Some(elements)
                } else {
                    None
                }
            }

            fn from_data(data: StridedData) -> Result<Vec<Self>, StridedData> {
                if let StridedData::$kind(elements) = data {
                    Ok(elements)
                } else {
                    Err(data)
                }
            }
        }
    };
}

impl_element!(i8, Int8);
impl_element!(u8, UInt8);
impl_element!(i16, Int16);
impl_element!(u16, UInt16);
impl_element!(i32, Int32);
impl_element!(u32, UInt32);
impl_element!(f32, Float32);
impl_element!(f64, Float64);
