use crate::{engine::AsyncRasterBandIoTraits, strided_buffer::StridedBuffer};

use super::{
    raster_band_pixels::{prepare_read, prepare_write},
    ArrayError, PixelArrayOptions,
};

/// Async strided buffer I/O for raster bands.
///
/// Validation failures are returned by the future rather than when it is created.
#[async_trait::async_trait]
pub trait AsyncRasterBandPixelsExt: AsyncRasterBandIoTraits {
    /// Async variant of [`read_array`](crate::adapter::RasterBandPixelsExt::read_array).
    #[allow(clippy::missing_errors_doc)]
    async fn async_read_array(
        &self,
        options: PixelArrayOptions,
    ) -> Result<StridedBuffer, ArrayError>;

    /// Async variant of [`write_array`](crate::adapter::RasterBandPixelsExt::write_array).
    #[allow(clippy::missing_errors_doc)]
    async fn async_write_array(&self, options: &PixelArrayOptions) -> Result<(), ArrayError>;
}

#[async_trait::async_trait]
impl<T: ?Sized + AsyncRasterBandIoTraits> AsyncRasterBandPixelsExt for T {
    async fn async_read_array(
        &self,
        options: PixelArrayOptions,
    ) -> Result<StridedBuffer, ArrayError> {
        let (mut data, window, geometry) = prepare_read(self, options)?;
        self.read(&window, data.data_mut().as_bytes_mut(), &geometry)
            .await?;
        Ok(data)
    }

    async fn async_write_array(&self, options: &PixelArrayOptions) -> Result<(), ArrayError> {
        let (data, window, geometry) = prepare_write(options)?;
        self.write(&window, data.data().as_bytes(), &geometry)
            .await?;
        Ok(())
    }
}
