use crate::{
    config::global_config,
    data_type::NativeDataType,
    engine::{
        PixelWindow, ProgressCallback, RasterBandIoTraits, RasterBandTraits, RasterIoGeometry,
        ResampleAlg,
    },
    strided_buffer::{StridedBuffer, StridedBufferError},
};

use super::{allocate_buffer, validate_buffer, ArrayError};

/// Options for reading or writing a window of a raster band.
///
/// Every field is optional:
///  - `data`: the buffer to read into or write from. A read allocates a buffer if it is absent, a write requires it.
///  - `x`, `y`: the top left pixel of the window, default `0`.
///  - `width`, `height`: the window size, defaulting to the shape of `data` or the band size if `data` is absent.
///  - `resampling`: the resampling algorithm used if the buffer shape differs from the window size (read only).
///  - `progress`: a progress callback invoked by the engine.
///
/// An explicit zero `x`, `y`, `width` or `height` is distinct from an absent one unless the [zero region is default](crate::config::Config#zero-region-is-default) option is enabled.
#[derive(Clone, Default)]
pub struct PixelArrayOptions {
    data: Option<StridedBuffer>,
    x: Option<usize>,
    y: Option<usize>,
    width: Option<usize>,
    height: Option<usize>,
    resampling: Option<ResampleAlg>,
    progress: Option<ProgressCallback>,
}

impl core::fmt::Debug for PixelArrayOptions {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PixelArrayOptions")
            .field("data", &self.data)
            .field("x", &self.x)
            .field("y", &self.y)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("resampling", &self.resampling)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

impl PixelArrayOptions {
    /// Create a new pixel array options builder.
    #[must_use]
    pub fn builder() -> PixelArrayOptionsBuilder {
        PixelArrayOptionsBuilder::new()
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

    /// Return the column of the top left pixel.
    #[must_use]
    pub fn x(&self) -> Option<usize> {
        self.x
    }

    /// Set the column of the top left pixel.
    pub fn set_x(&mut self, x: Option<usize>) {
        self.x = x;
    }

    /// Return the row of the top left pixel.
    #[must_use]
    pub fn y(&self) -> Option<usize> {
        self.y
    }

    /// Set the row of the top left pixel.
    pub fn set_y(&mut self, y: Option<usize>) {
        self.y = y;
    }

    /// Return the window width.
    #[must_use]
    pub fn width(&self) -> Option<usize> {
        self.width
    }

    /// Set the window width.
    pub fn set_width(&mut self, width: Option<usize>) {
        self.width = width;
    }

    /// Return the window height.
    #[must_use]
    pub fn height(&self) -> Option<usize> {
        self.height
    }

    /// Set the window height.
    pub fn set_height(&mut self, height: Option<usize>) {
        self.height = height;
    }

    /// Return the resampling algorithm.
    #[must_use]
    pub fn resampling(&self) -> Option<ResampleAlg> {
        self.resampling
    }

    /// Set the resampling algorithm.
    pub fn set_resampling(&mut self, resampling: Option<ResampleAlg>) {
        self.resampling = resampling;
    }

    /// Return the progress callback.
    #[must_use]
    pub fn progress(&self) -> Option<&ProgressCallback> {
        self.progress.as_ref()
    }

    /// Set the progress callback.
    pub fn set_progress(&mut self, progress: Option<ProgressCallback>) {
        self.progress = progress;
    }
}

/// Builder for [`PixelArrayOptions`].
#[derive(Debug, Clone, Default)]
pub struct PixelArrayOptionsBuilder {
    options: PixelArrayOptions,
}

impl PixelArrayOptionsBuilder {
    /// Create a new pixel array options builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build into pixel array options.
    #[must_use]
    pub fn build(self) -> PixelArrayOptions {
        self.options
    }

    /// Set the buffer.
    #[must_use]
    pub fn data(mut self, data: StridedBuffer) -> Self {
        self.options.data = Some(data);
        self
    }

    /// Set the column of the top left pixel.
    #[must_use]
    pub fn x(mut self, x: usize) -> Self {
        self.options.x = Some(x);
        self
    }

    /// Set the row of the top left pixel.
    #[must_use]
    pub fn y(mut self, y: usize) -> Self {
        self.options.y = Some(y);
        self
    }

    /// Set the window width.
    #[must_use]
    pub fn width(mut self, width: usize) -> Self {
        self.options.width = Some(width);
        self
    }

    /// Set the window height.
    #[must_use]
    pub fn height(mut self, height: usize) -> Self {
        self.options.height = Some(height);
        self
    }

    /// Set the resampling algorithm.
    #[must_use]
    pub fn resampling(mut self, resampling: ResampleAlg) -> Self {
        self.options.resampling = Some(resampling);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn progress(mut self, progress: ProgressCallback) -> Self {
        self.options.progress = Some(progress);
        self
    }
}

/// Resolve an optional window component.
fn resolve(value: Option<usize>, default: usize, zero_is_default: bool) -> usize {
    match value {
        Some(0) if zero_is_default => default,
        Some(value) => value,
        None => default,
    }
}

/// Resolve the window of a transfer with a validated 2D buffer.
///
/// `size` is the default window size as (columns, rows).
fn resolve_window(options: &PixelArrayOptions, size: (usize, usize)) -> PixelWindow {
    let zero_is_default = global_config().zero_region_is_default();
    PixelWindow::new(
        resolve(options.x, 0, zero_is_default),
        resolve(options.y, 0, zero_is_default),
        resolve(options.width, size.0, zero_is_default),
        resolve(options.height, size.1, zero_is_default),
    )
}

/// The engine geometry of a validated 2D buffer.
#[allow(clippy::cast_possible_wrap)]
fn raster_io_geometry(
    data: &StridedBuffer,
    data_type: NativeDataType,
    options: &PixelArrayOptions,
) -> RasterIoGeometry {
    let element_size = data.element_kind().size() as isize;
    RasterIoGeometry {
        buffer_width: data.shape()[1],
        buffer_height: data.shape()[0],
        data_type,
        pixel_space: data.stride()[1] * element_size,
        line_space: data.stride()[0] * element_size,
        offset: data.offset(),
        resampling: options.resampling,
        progress: options.progress.clone(),
    }
}

/// Validate a read, allocating a buffer if required.
pub(super) fn prepare_read(
    band: &(impl RasterBandTraits + ?Sized),
    mut options: PixelArrayOptions,
) -> Result<(StridedBuffer, PixelWindow, RasterIoGeometry), ArrayError> {
    let data = if let Some(data) = options.take_data() {
        data
    } else {
        let window = resolve_window(&options, band.size());
        allocate_buffer(band.data_type(), vec![window.height, window.width])?
    };
    let data_type = validate_buffer(&data, 2)?;
    let window = resolve_window(&options, (data.shape()[1], data.shape()[0]));
    let geometry = raster_io_geometry(&data, data_type, &options);
    Ok((data, window, geometry))
}

/// Validate a write.
pub(super) fn prepare_write(
    options: &PixelArrayOptions,
) -> Result<(&StridedBuffer, PixelWindow, RasterIoGeometry), ArrayError> {
    let data = options
        .data()
        .ok_or(ArrayError::NotAnArray(StridedBufferError::Missing))?;
    let data_type = validate_buffer(data, 2)?;
    if options.resampling.is_some() {
        return Err(ArrayError::UnsupportedOperation(
            "resampling when writing is not supported".to_string(),
        ));
    }
    let window = resolve_window(options, (data.shape()[1], data.shape()[0]));
    let geometry = raster_io_geometry(data, data_type, options);
    Ok((data, window, geometry))
}

/// Strided buffer I/O for raster bands.
pub trait RasterBandPixelsExt: RasterBandIoTraits {
    /// Read a window of the band into a strided buffer.
    ///
    /// If `options` has no buffer, a buffer of shape `[height, width]` with a default row-major stride is allocated with the element kind of the band data type.
    /// The buffer is returned populated.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - the buffer is not a coherent strided buffer,
    ///  - the buffer is not 2D,
    ///  - the buffer element kind or band data type is not supported, or
    ///  - the engine read fails.
    fn read_array(&self, options: PixelArrayOptions) -> Result<StridedBuffer, ArrayError>;

    /// Write a strided buffer into a window of the band.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - `options` has no buffer or the buffer is not a coherent strided buffer,
    ///  - the buffer is not 2D,
    ///  - the buffer element kind is not supported,
    ///  - `options` requests resampling, or
    ///  - the engine write fails.
    fn write_array(&self, options: &PixelArrayOptions) -> Result<(), ArrayError>;
}

impl<T: ?Sized + RasterBandIoTraits> RasterBandPixelsExt for T {
    fn read_array(&self, options: PixelArrayOptions) -> Result<StridedBuffer, ArrayError> {
        let (mut data, window, geometry) = prepare_read(self, options)?;
        self.read(&window, data.data_mut().as_bytes_mut(), &geometry)?;
        Ok(data)
    }

    fn write_array(&self, options: &PixelArrayOptions) -> Result<(), ArrayError> {
        let (data, window, geometry) = prepare_write(options)?;
        self.write(&window, data.data().as_bytes(), &geometry)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_array_options_builder() {
        let options = PixelArrayOptions::builder()
            .x(1)
            .y(2)
            .width(0)
            .resampling(ResampleAlg::Average)
            .build();
        assert_eq!(options.x(), Some(1));
        assert_eq!(options.y(), Some(2));
        assert_eq!(options.width(), Some(0));
        assert_eq!(options.height(), None);
        assert_eq!(options.resampling(), Some(ResampleAlg::Average));
        assert!(options.data().is_none());
        assert!(format!("{options:?}").contains("progress: false"));
    }

    #[test]
    fn pixel_array_resolve() {
        assert_eq!(resolve(None, 7, false), 7);
        assert_eq!(resolve(Some(0), 7, false), 0);
        assert_eq!(resolve(Some(0), 7, true), 7);
        assert_eq!(resolve(Some(3), 7, true), 3);
    }

    #[test]
    fn pixel_array_geometry() {
        let data = StridedBuffer::with_strides(vec![0u16; 6], vec![2, 3], vec![1, -2]);
        let geometry =
            raster_io_geometry(&data, NativeDataType::UInt16, &PixelArrayOptions::default());
        assert_eq!(geometry.buffer_width, 3);
        assert_eq!(geometry.buffer_height, 2);
        assert_eq!(geometry.data_type, NativeDataType::UInt16);
        assert_eq!(geometry.pixel_space, -4);
        assert_eq!(geometry.line_space, 2);
        assert_eq!(geometry.offset, 4);
    }

    #[test]
    fn pixel_array_prepare_write() {
        let options = PixelArrayOptions::default();
        assert!(matches!(
            prepare_write(&options),
            Err(ArrayError::NotAnArray(StridedBufferError::Missing))
        ));
        let options = PixelArrayOptions::builder()
            .data(StridedBuffer::new(vec![0f64; 6], vec![2, 3]))
            .y(4)
            .build();
        let (_, window, _) = prepare_write(&options).unwrap();
        assert_eq!(window, PixelWindow::new(0, 4, 3, 2));
    }
}
