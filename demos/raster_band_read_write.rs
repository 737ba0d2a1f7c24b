use std::sync::Arc;

fn raster_band_read_write() -> Result<(), Box<dyn std::error::Error>> {
    use ndarray_gdal::{
        adapter::{PixelArrayOptions, RasterBandPixelsExt},
        data_type::NativeDataType,
        engine::{MemoryRasterBand, RasterBandIoTraits, ResampleAlg, UsageLogRasterBand},
        strided_buffer::StridedBuffer,
    };

    // Create a raster band
    let band = Arc::new(MemoryRasterBand::new(8, 6, NativeDataType::Float32));
    let band: Arc<dyn RasterBandIoTraits> = if std::env::args().any(|arg| arg == "--usage-log") {
        let log_writer = Arc::new(parking_lot::Mutex::new(std::io::stdout()));
        Arc::new(UsageLogRasterBand::new(band, log_writer, || {
            chrono::Utc::now().format("[%T%.3f] ").to_string()
        }))
    } else {
        band
    };

    // Write an ndarray with reversed rows into the top left of the band
    let mut array = ndarray::Array2::<f32>::from_shape_fn((3, 4), |(row, column)| {
        (row * 4 + column) as f32
    });
    array.invert_axis(ndarray::Axis(0));
    let data = StridedBuffer::from_ndarray(array);
    println!("Writing a buffer with stride {:?}", data.stride());
    band.write_array(&PixelArrayOptions::builder().data(data).build())?;

    // Read the whole band
    let data = band.read_array(PixelArrayOptions::default())?;
    println!("The band is:\n{}\n", data.ndarray_view::<f32>()?);

    // Read the band downsampled into a column-major buffer
    let data = StridedBuffer::with_strides(vec![0f64; 12], vec![3, 4], vec![1, 3]);
    let options = PixelArrayOptions::builder()
        .data(data)
        .width(8)
        .height(6)
        .resampling(ResampleAlg::Average)
        .build();
    let data = band.read_array(options)?;
    println!("The band averaged to 3x4 is:\n{}", data.ndarray_view::<f64>()?);

    Ok(())
}

fn main() {
    if let Err(err) = raster_band_read_write() {
        println!("{}", err);
    }
}
