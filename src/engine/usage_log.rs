//! Usage log adapters which print engine calls.

use std::{io::Write, sync::Arc};

use itertools::Itertools;
use parking_lot::Mutex;

use crate::data_type::NativeDataType;

use super::{
    EngineError, MdArrayIoDescriptor, MdArrayIoTraits, MdArrayTraits, PixelWindow,
    RasterBandIoTraits, RasterBandTraits, RasterIoGeometry,
};

#[cfg(feature = "async")]
use super::{AsyncMdArrayIoTraits, AsyncRasterBandIoTraits};

/// The usage log raster band adapter. Logs raster band I/O calls.
///
/// It is intended to aid in debugging by revealing the exact windows and geometries passed to the engine.
///
/// ### Example (log to stdout)
/// ```rust
/// # use std::sync::Arc;
/// # use parking_lot::Mutex;
/// # use ndarray_gdal::data_type::NativeDataType;
/// # use ndarray_gdal::engine::{MemoryRasterBand, UsageLogRasterBand};
/// let band = Arc::new(MemoryRasterBand::new(16, 12, NativeDataType::Float32));
/// let log_writer = Arc::new(Mutex::new(std::io::stdout()));
/// let band = UsageLogRasterBand::new(band, log_writer, || {
///     chrono::Utc::now().format("[%T%.3f] ").to_string()
/// });
/// ```
///
/// Reading and writing through the above [`UsageLogRasterBand`] prints outputs like:
/// ```text
/// [10:02:41.318] write([0, 0] 8x6, len=192, Float32 8x6 pixel_space=4 line_space=32 offset=0) -> Ok(())
/// [10:02:41.318] read([0, 0] 16x12, len=384, UInt16 16x12 pixel_space=2 line_space=32 offset=0) -> Ok(())
/// ```
pub struct UsageLogRasterBand<TBand: ?Sized> {
    band: Arc<TBand>,
    handle: Arc<Mutex<dyn Write + Send>>,
    prefix_func: fn() -> String,
}

impl<TBand: ?Sized> core::fmt::Debug for UsageLogRasterBand<TBand> {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        writeln!(f, "usage log")
    }
}

impl<TBand: ?Sized> UsageLogRasterBand<TBand> {
    /// Create a new usage log raster band adapter.
    pub fn new(
        band: Arc<TBand>,
        handle: Arc<Mutex<dyn Write + Send>>,
        prefix_func: fn() -> String,
    ) -> Self {
        Self {
            band,
            handle,
            prefix_func,
        }
    }

    fn log(
        &self,
        method: &str,
        window: &PixelWindow,
        len: usize,
        geometry: &RasterIoGeometry,
        result: &Result<(), EngineError>,
    ) -> Result<(), EngineError> {
        writeln!(
            self.handle.lock(),
            "{}{method}({window}, len={len}, {}) -> {result:?}",
            (self.prefix_func)(),
            format_geometry(geometry),
        )?;
        Ok(())
    }
}

fn format_geometry(geometry: &RasterIoGeometry) -> String {
    let mut formatted = format!(
        "{} {}x{} pixel_space={} line_space={} offset={}",
        geometry.data_type,
        geometry.buffer_width,
        geometry.buffer_height,
        geometry.pixel_space,
        geometry.line_space,
        geometry.offset
    );
    if let Some(resampling) = geometry.resampling {
        formatted.push_str(&format!(" resampling={resampling}"));
    }
    formatted
}

impl<TBand: ?Sized + RasterBandTraits> RasterBandTraits for UsageLogRasterBand<TBand> {
    fn data_type(&self) -> NativeDataType {
        self.band.data_type()
    }

    fn size(&self) -> (usize, usize) {
        self.band.size()
    }
}

impl<TBand: ?Sized + RasterBandIoTraits> RasterBandIoTraits for UsageLogRasterBand<TBand> {
    fn read(
        &self,
        window: &PixelWindow,
        buffer: &mut [u8],
        geometry: &RasterIoGeometry,
    ) -> Result<(), EngineError> {
        let result = self.band.read(window, buffer, geometry);
        self.log("read", window, buffer.len(), geometry, &result)?;
        result
    }

    fn write(
        &self,
        window: &PixelWindow,
        buffer: &[u8],
        geometry: &RasterIoGeometry,
    ) -> Result<(), EngineError> {
        let result = self.band.write(window, buffer, geometry);
        self.log("write", window, buffer.len(), geometry, &result)?;
        result
    }
}

#[cfg(feature = "async")]
#[async_trait::async_trait]
impl<TBand: ?Sized + AsyncRasterBandIoTraits> AsyncRasterBandIoTraits for UsageLogRasterBand<TBand> {
    async fn read(
        &self,
        window: &PixelWindow,
        buffer: &mut [u8],
        geometry: &RasterIoGeometry,
    ) -> Result<(), EngineError> {
        let result = self.band.read(window, buffer, geometry).await;
        self.log("read", window, buffer.len(), geometry, &result)?;
        result
    }

    async fn write(
        &self,
        window: &PixelWindow,
        buffer: &[u8],
        geometry: &RasterIoGeometry,
    ) -> Result<(), EngineError> {
        let result = self.band.write(window, buffer, geometry).await;
        self.log("write", window, buffer.len(), geometry, &result)?;
        result
    }
}

/// The usage log multidimensional array adapter. Logs multidimensional array I/O calls.
pub struct UsageLogMdArray<TArray: ?Sized> {
    array: Arc<TArray>,
    handle: Arc<Mutex<dyn Write + Send>>,
    prefix_func: fn() -> String,
}

impl<TArray: ?Sized> core::fmt::Debug for UsageLogMdArray<TArray> {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        writeln!(f, "usage log")
    }
}

impl<TArray: ?Sized> UsageLogMdArray<TArray> {
    /// Create a new usage log multidimensional array adapter.
    pub fn new(
        array: Arc<TArray>,
        handle: Arc<Mutex<dyn Write + Send>>,
        prefix_func: fn() -> String,
    ) -> Self {
        Self {
            array,
            handle,
            prefix_func,
        }
    }

    fn log_read(
        &self,
        descriptor: &MdArrayIoDescriptor<'_>,
        len: usize,
        result: &Result<(), EngineError>,
    ) -> Result<(), EngineError> {
        writeln!(
            self.handle.lock(),
            "{}read(origin=[{}], span=[{}], stride=[{}], offset={}, {}, len={len}) -> {result:?}",
            (self.prefix_func)(),
            descriptor.origin.iter().format(", "),
            descriptor.span.iter().format(", "),
            descriptor.stride.iter().format(", "),
            descriptor.offset,
            descriptor.data_type,
        )?;
        Ok(())
    }
}

impl<TArray: ?Sized + MdArrayTraits> MdArrayTraits for UsageLogMdArray<TArray> {
    fn data_type(&self) -> NativeDataType {
        self.array.data_type()
    }
}

impl<TArray: ?Sized + MdArrayIoTraits> MdArrayIoTraits for UsageLogMdArray<TArray> {
    fn dimension_count(&self) -> Result<usize, EngineError> {
        let result = self.array.dimension_count();
        writeln!(
            self.handle.lock(),
            "{}dimension_count() -> {result:?}",
            (self.prefix_func)()
        )?;
        result
    }

    fn dimension_size(&self, index: usize) -> Result<u64, EngineError> {
        let result = self.array.dimension_size(index);
        writeln!(
            self.handle.lock(),
            "{}dimension_size({index}) -> {result:?}",
            (self.prefix_func)()
        )?;
        result
    }

    fn read(
        &self,
        descriptor: &MdArrayIoDescriptor<'_>,
        buffer: &mut [u8],
    ) -> Result<(), EngineError> {
        let result = self.array.read(descriptor, buffer);
        self.log_read(descriptor, buffer.len(), &result)?;
        result
    }
}

#[cfg(feature = "async")]
#[async_trait::async_trait]
impl<TArray: ?Sized + AsyncMdArrayIoTraits> AsyncMdArrayIoTraits for UsageLogMdArray<TArray> {
    async fn dimension_count(&self) -> Result<usize, EngineError> {
        let result = self.array.dimension_count().await;
        writeln!(
            self.handle.lock(),
            "{}dimension_count() -> {result:?}",
            (self.prefix_func)()
        )?;
        result
    }

    async fn dimension_size(&self, index: usize) -> Result<u64, EngineError> {
        let result = self.array.dimension_size(index).await;
        writeln!(
            self.handle.lock(),
            "{}dimension_size({index}) -> {result:?}",
            (self.prefix_func)()
        )?;
        result
    }

    async fn read(
        &self,
        descriptor: &MdArrayIoDescriptor<'_>,
        buffer: &mut [u8],
    ) -> Result<(), EngineError> {
        let result = self.array.read(descriptor, buffer).await;
        self.log_read(descriptor, buffer.len(), &result)?;
        result
    }
}
