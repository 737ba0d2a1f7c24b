//! Strided buffer adapters for raster engine entities.
//!
//! The adapters are extension traits implemented for every engine entity:
//!  - [`RasterBandPixelsExt`] / [`AsyncRasterBandPixelsExt`]: read and write a window of a raster band, and
//!  - [`MdArrayReadExt`] / [`AsyncMdArrayReadExt`]: read a region of a multidimensional array.
//!
//! Every transfer validates the strided buffer before the engine is called, in this order:
//!  1. the buffer must have a coherent stride descriptor ([`ArrayError::NotAnArray`]),
//!  2. the buffer must have the dimensionality of the entity ([`ArrayError::DimensionMismatch`]),
//!  3. the buffer element kind must have a native data type ([`ArrayError::TypeNotSupported`]).
//!
//! A multidimensional array read also requires a supplied buffer to have the shape of the region span ([`ArrayError::ShapeMismatch`]).
//!
//! Engine failures are passed through unchanged as [`ArrayError::EngineError`].
//! The async adapters perform the same validation inside the returned future, so every failure is observed when it is awaited.

mod md_array_read;
#[cfg(feature = "async")]
mod md_array_read_async;
mod raster_band_pixels;
#[cfg(feature = "async")]
mod raster_band_pixels_async;

use thiserror::Error;

pub use md_array_read::{MdArrayOptions, MdArrayOptionsBuilder, MdArrayReadExt};
pub use raster_band_pixels::{PixelArrayOptions, PixelArrayOptionsBuilder, RasterBandPixelsExt};

#[cfg(feature = "async")]
pub use md_array_read_async::AsyncMdArrayReadExt;
#[cfg(feature = "async")]
pub use raster_band_pixels_async::AsyncRasterBandPixelsExt;

use crate::{
    array_region::IncompatibleDimensionalityError,
    config::global_config,
    data_type::NativeDataType,
    engine::EngineError,
    strided_buffer::{StridedBuffer, StridedBufferError},
};

/// An adapter error.
#[derive(Debug, Error)]
pub enum ArrayError {
    /// The data is not a coherent strided buffer.
    #[error("data must be a strided array: {0}")]
    NotAnArray(StridedBufferError),
    /// The data does not have the dimensionality of the entity.
    #[error("data must have exactly {expected} dimensions, got {got}")]
    DimensionMismatch {
        /// The dimensionality of the entity.
        expected: usize,
        /// The dimensionality of the data.
        got: usize,
    },
    /// The element kind or native data type has no counterpart.
    #[error("type {0} is not supported by the raster engine")]
    TypeNotSupported(String),
    /// The operation is not supported.
    #[error("{0}")]
    UnsupportedOperation(String),
    /// The region does not have the dimensionality of the entity.
    #[error(transparent)]
    IncompatibleDimensionality(#[from] IncompatibleDimensionalityError),
    /// The data shape is not the span of the region.
    #[error("data shape {shape:?} does not match the region span {span:?}")]
    ShapeMismatch {
        /// The shape of the data.
        shape: Vec<usize>,
        /// The span of the region.
        span: Vec<u64>,
    },
    /// A region extent does not fit in `usize`.
    ///
    /// Only raised on targets where `usize` is narrower than 64 bits.
    #[error("extent {0} does not fit in memory")]
    ExtentOverflow(u64),
    /// An engine error.
    #[error(transparent)]
    EngineError(#[from] EngineError),
}

/// Validate `data` for a transfer with an entity of `dimensionality` and return its native data type.
fn validate_buffer(
    data: &StridedBuffer,
    dimensionality: usize,
) -> Result<NativeDataType, ArrayError> {
    data.validate_stride().map_err(ArrayError::NotAnArray)?;
    if global_config().validate_buffer_extent() {
        data.validate_extent().map_err(ArrayError::NotAnArray)?;
    }
    if data.dimensionality() != dimensionality {
        return Err(ArrayError::DimensionMismatch {
            expected: dimensionality,
            got: data.dimensionality(),
        });
    }
    let kind = data.element_kind();
    kind.native_data_type()
        .ok_or_else(|| ArrayError::TypeNotSupported(kind.to_string()))
}

/// Allocate a zero initialised buffer for an entity with native data type `data_type`.
fn allocate_buffer(
    data_type: NativeDataType,
    shape: Vec<usize>,
) -> Result<StridedBuffer, ArrayError> {
    let kind = data_type
        .element_kind()
        .ok_or_else(|| ArrayError::TypeNotSupported(data_type.to_string()))?;
    Ok(StridedBuffer::zeros(kind, shape))
}
