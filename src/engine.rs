//! The raster engine API.
//!
//! The adapters in this crate do not read or write data themselves, they translate strided buffers into the call shapes of a raster engine (e.g. GDAL).
//! An engine exposes two kinds of addressable units:
//!  - a raster band, a 2D grid of pixels read and written through a [`PixelWindow`] and a [`RasterIoGeometry`], and
//!  - a multidimensional array, read through a [`MdArrayIoDescriptor`].
//!
//! Each unit has a sync I/O trait and an async I/O trait (with the `async` feature).
//! Buffers are passed as raw native endian bytes, the layout of elements within them is fully described by the geometry or descriptor.
//!
//! This module includes in-memory engine implementations ([`MemoryRasterBand`], [`MemoryMdArray`]) and usage log adapters ([`UsageLogRasterBand`], [`UsageLogMdArray`]).

mod element_conversion;
mod memory_md_array;
mod memory_raster_band;
mod resample_alg;
mod usage_log;

use std::sync::Arc;

use derive_more::Display;
use thiserror::Error;

pub use memory_md_array::MemoryMdArray;
pub use memory_raster_band::MemoryRasterBand;
pub use resample_alg::{ResampleAlg, UnknownResampleAlgError};
pub use usage_log::{UsageLogMdArray, UsageLogRasterBand};

use crate::data_type::NativeDataType;

/// A progress callback, invoked by the engine with the completed fraction of a transfer in `[0, 1]`.
pub type ProgressCallback = Arc<dyn Fn(f64) + Send + Sync>;

/// A window of pixels in a raster band.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Display, Default)]
#[display("[{x}, {y}] {width}x{height}")]
pub struct PixelWindow {
    /// The column of the top left pixel.
    pub x: usize,
    /// The row of the top left pixel.
    pub y: usize,
    /// The number of columns.
    pub width: usize,
    /// The number of rows.
    pub height: usize,
}

impl PixelWindow {
    /// Create a new pixel window.
    #[must_use]
    pub const fn new(x: usize, y: usize, width: usize, height: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Returns true if the window is within a raster of `size` (columns, rows).
    #[must_use]
    pub fn inbounds(&self, size: (usize, usize)) -> bool {
        self.x.checked_add(self.width).is_some_and(|end| end <= size.0)
            && self.y.checked_add(self.height).is_some_and(|end| end <= size.1)
    }
}

/// The layout of a buffer in a raster band transfer.
///
/// Pixel `(column, row)` of the buffer starts at byte `offset * data_type.size() + row * line_space + column * pixel_space`.
/// Spacings are signed, a negative spacing traverses the buffer in reverse.
#[derive(Clone)]
pub struct RasterIoGeometry {
    /// The number of buffer columns.
    pub buffer_width: usize,
    /// The number of buffer rows.
    pub buffer_height: usize,
    /// The data type of the buffer elements.
    pub data_type: NativeDataType,
    /// The byte spacing between consecutive pixels of a row.
    pub pixel_space: isize,
    /// The byte spacing between consecutive rows.
    pub line_space: isize,
    /// The offset (in elements) of the first pixel.
    pub offset: usize,
    /// The resampling algorithm used if the buffer size differs from the window size.
    ///
    /// The engine default is used if [`None`].
    pub resampling: Option<ResampleAlg>,
    /// An optional progress callback.
    pub progress: Option<ProgressCallback>,
}

impl core::fmt::Debug for RasterIoGeometry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RasterIoGeometry")
            .field("buffer_width", &self.buffer_width)
            .field("buffer_height", &self.buffer_height)
            .field("data_type", &self.data_type)
            .field("pixel_space", &self.pixel_space)
            .field("line_space", &self.line_space)
            .field("offset", &self.offset)
            .field("resampling", &self.resampling)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

/// The region and buffer layout of a multidimensional array read.
///
/// The element at region-relative indices `i` is stored at element `offset + Σ i[d] * stride[d]` of the buffer.
#[derive(Copy, Clone, Debug)]
pub struct MdArrayIoDescriptor<'a> {
    /// The origin of the region.
    pub origin: &'a [u64],
    /// The span of the region.
    pub span: &'a [u64],
    /// The buffer stride (in elements) of every dimension.
    pub stride: &'a [isize],
    /// The offset (in elements) of the first element.
    pub offset: usize,
    /// The data type of the buffer elements.
    pub data_type: NativeDataType,
}

/// A raster engine error.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The window is not within the raster band.
    #[error("window {0} is out of bounds for a raster of size {1:?}")]
    WindowOutOfBounds(PixelWindow, (usize, usize)),
    /// The region is not within the array.
    #[error("region with origin {origin:?} and span {span:?} is out of bounds for an array of shape {shape:?}")]
    RegionOutOfBounds {
        /// The origin of the region.
        origin: Vec<u64>,
        /// The span of the region.
        span: Vec<u64>,
        /// The shape of the array.
        shape: Vec<u64>,
    },
    /// The transfer addresses bytes outside of the buffer.
    #[error("the transfer addresses bytes outside of a buffer of {0} bytes")]
    BufferOutOfBounds(usize),
    /// An invalid transfer descriptor.
    #[error("invalid descriptor: {0}")]
    InvalidDescriptor(String),
    /// A write operation was attempted on a read only unit.
    #[error("a write operation was attempted on a read only raster")]
    ReadOnly,
    /// An IO error.
    #[error(transparent)]
    IOError(#[from] std::io::Error),
    /// The requested operation is not supported.
    #[error("{0}")]
    Unsupported(String),
    /// Any other error.
    #[error("{0}")]
    Other(String),
}

impl From<&str> for EngineError {
    fn from(err: &str) -> Self {
        Self::Other(err.to_string())
    }
}

impl From<String> for EngineError {
    fn from(err: String) -> Self {
        Self::Other(err)
    }
}

/// Raster band traits.
pub trait RasterBandTraits: Send + Sync {
    /// Returns the native data type of the band.
    fn data_type(&self) -> NativeDataType;

    /// Returns the size of the band as (columns, rows).
    fn size(&self) -> (usize, usize);
}

/// Sync raster band I/O traits.
pub trait RasterBandIoTraits: RasterBandTraits {
    /// Read `window` into `buffer` with the layout described by `geometry`.
    ///
    /// # Errors
    /// Returns an [`EngineError`] if the window or geometry is invalid or there is an underlying engine error.
    fn read(
        &self,
        window: &PixelWindow,
        buffer: &mut [u8],
        geometry: &RasterIoGeometry,
    ) -> Result<(), EngineError>;

    /// Write `buffer` with the layout described by `geometry` into `window`.
    ///
    /// # Errors
    /// Returns an [`EngineError`] if the window or geometry is invalid or there is an underlying engine error.
    fn write(
        &self,
        window: &PixelWindow,
        buffer: &[u8],
        geometry: &RasterIoGeometry,
    ) -> Result<(), EngineError>;
}

/// Async raster band I/O traits.
#[cfg(feature = "async")]
#[async_trait::async_trait]
pub trait AsyncRasterBandIoTraits: RasterBandTraits {
    /// Read `window` into `buffer` with the layout described by `geometry`.
    ///
    /// # Errors
    /// Returns an [`EngineError`] if the window or geometry is invalid or there is an underlying engine error.
    async fn read(
        &self,
        window: &PixelWindow,
        buffer: &mut [u8],
        geometry: &RasterIoGeometry,
    ) -> Result<(), EngineError>;

    /// Write `buffer` with the layout described by `geometry` into `window`.
    ///
    /// # Errors
    /// Returns an [`EngineError`] if the window or geometry is invalid or there is an underlying engine error.
    async fn write(
        &self,
        window: &PixelWindow,
        buffer: &[u8],
        geometry: &RasterIoGeometry,
    ) -> Result<(), EngineError>;
}

/// Multidimensional array traits.
pub trait MdArrayTraits: Send + Sync {
    /// Returns the native data type of the array.
    fn data_type(&self) -> NativeDataType;
}

/// Sync multidimensional array I/O traits.
pub trait MdArrayIoTraits: MdArrayTraits {
    /// Returns the number of dimensions.
    ///
    /// # Errors
    /// Returns an [`EngineError`] if there is an underlying engine error.
    fn dimension_count(&self) -> Result<usize, EngineError>;

    /// Returns the size of dimension `index`.
    ///
    /// # Errors
    /// Returns an [`EngineError`] if `index` is not a dimension or there is an underlying engine error.
    fn dimension_size(&self, index: usize) -> Result<u64, EngineError>;

    /// Read the region described by `descriptor` into `buffer`.
    ///
    /// # Errors
    /// Returns an [`EngineError`] if the descriptor is invalid or there is an underlying engine error.
    fn read(&self, descriptor: &MdArrayIoDescriptor<'_>, buffer: &mut [u8])
        -> Result<(), EngineError>;
}

/// Async multidimensional array I/O traits.
#[cfg(feature = "async")]
#[async_trait::async_trait]
pub trait AsyncMdArrayIoTraits: MdArrayTraits {
    /// Returns the number of dimensions.
    ///
    /// # Errors
    /// Returns an [`EngineError`] if there is an underlying engine error.
    async fn dimension_count(&self) -> Result<usize, EngineError>;

    /// Returns the size of dimension `index`.
    ///
    /// # Errors
    /// Returns an [`EngineError`] if `index` is not a dimension or there is an underlying engine error.
    async fn dimension_size(&self, index: usize) -> Result<u64, EngineError>;

    /// Read the region described by `descriptor` into `buffer`.
    ///
    /// # Errors
    /// Returns an [`EngineError`] if the descriptor is invalid or there is an underlying engine error.
    async fn read(
        &self,
        descriptor: &MdArrayIoDescriptor<'_>,
        buffer: &mut [u8],
    ) -> Result<(), EngineError>;
}
