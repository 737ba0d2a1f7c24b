use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use ndarray_gdal::adapter::{ArrayError, PixelArrayOptions, RasterBandPixelsExt};
use ndarray_gdal::data_type::{Element, ElementKind, NativeDataType};
use ndarray_gdal::engine::{EngineError, MemoryRasterBand, RasterBandTraits, ResampleAlg};
use ndarray_gdal::strided_buffer::{default_offset, StridedBuffer, StridedBufferError};

const WIDTH: usize = 7;
const HEIGHT: usize = 5;

/// Lay out the row-major `logical` elements of a `[height, width]` array with `stride`.
#[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
fn layout<T: Element + Default>(logical: &[T], shape: [usize; 2], stride: [isize; 2]) -> StridedBuffer {
    let offset = default_offset(&shape, &stride);
    let mut elements = vec![T::default(); logical.len()];
    for row in 0..shape[0] {
        for column in 0..shape[1] {
            let index = offset as isize + row as isize * stride[0] + column as isize * stride[1];
            elements[index as usize] = logical[row * shape[1] + column];
        }
    }
    StridedBuffer::with_strides(elements, shape.to_vec(), stride.to_vec())
}

/// Row-major, column-major, row-negative and column-negative layouts of `logical`.
#[allow(clippy::cast_possible_wrap)]
fn layouts<T: Element + Default>(logical: &[T]) -> Vec<(&'static str, StridedBuffer)> {
    let (h, w) = (HEIGHT as isize, WIDTH as isize);
    let shape = [HEIGHT, WIDTH];
    vec![
        ("row_major", layout(logical, shape, [w, 1])),
        ("column_major", layout(logical, shape, [1, h])),
        ("row_negative", layout(logical, shape, [-w, 1])),
        ("column_negative", layout(logical, shape, [1, -h])),
    ]
}

fn logical<T: From<u8>>(len: usize) -> Vec<T> {
    (0..len).map(|i| T::from(u8::try_from(i * 7 % 251).unwrap())).collect()
}

fn round_trip<T>() -> Result<(), Box<dyn std::error::Error>>
where
    T: Element + Default + From<u8> + PartialEq + std::fmt::Debug,
{
    let native = T::KIND.native_data_type().unwrap();
    let logical: Vec<T> = logical(HEIGHT * WIDTH);

    // Write from each layout, read back with a default allocation
    for (name, data) in layouts(&logical) {
        let band = MemoryRasterBand::new(WIDTH + 3, HEIGHT + 2, native);
        band.write_array(&PixelArrayOptions::builder().data(data).x(3).y(2).build())?;
        let options = PixelArrayOptions::builder()
            .x(3)
            .y(2)
            .width(WIDTH)
            .height(HEIGHT)
            .build();
        let data = band.read_array(options)?;
        assert_eq!(data.shape(), &[HEIGHT, WIDTH]);
        assert_eq!(data.to_vec::<T>()?, logical, "{} write {name}", T::KIND);
    }

    // Read into each layout
    let band = MemoryRasterBand::from_elements(WIDTH, HEIGHT, logical.clone())?;
    let zeros = vec![T::default(); HEIGHT * WIDTH];
    for (name, data) in layouts(&zeros) {
        let stride = data.stride().to_vec();
        let data = band.read_array(PixelArrayOptions::builder().data(data).build())?;
        assert_eq!(data.stride(), stride);
        assert_eq!(data.to_vec::<T>()?, logical, "{} read {name}", T::KIND);
    }
    Ok(())
}

#[test]
fn raster_band_pixels_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    round_trip::<u8>()?;
    round_trip::<u16>()?;
    round_trip::<i16>()?;
    round_trip::<u32>()?;
    round_trip::<i32>()?;
    round_trip::<f32>()?;
    round_trip::<f64>()?;
    Ok(())
}

#[test]
fn raster_band_pixels_default_allocation() -> Result<(), Box<dyn std::error::Error>> {
    let elements: Vec<i32> = (0..16 * 12).collect();
    let band = MemoryRasterBand::from_elements(16, 12, elements.clone())?;

    let data = band.read_array(PixelArrayOptions::default())?;
    assert_eq!(data.element_kind(), ElementKind::Int32);
    assert_eq!(data.shape(), &[12, 16]);
    assert_eq!(data.stride(), &[16, 1]);
    assert_eq!(data.offset(), 0);
    assert_eq!(data.to_vec::<i32>()?, elements);

    let explicit = band.read_array(
        PixelArrayOptions::builder()
            .x(0)
            .y(0)
            .width(16)
            .height(12)
            .build(),
    )?;
    assert_eq!(explicit, data);
    Ok(())
}

#[test]
fn raster_band_pixels_zero_quadrant() -> Result<(), Box<dyn std::error::Error>> {
    // A raster of ones with a zero top left quadrant of extent (16, 12)
    let band = MemoryRasterBand::new(32, 24, NativeDataType::Byte);
    let ones = StridedBuffer::new(vec![1u8; 32 * 24], vec![24, 32]);
    band.write_array(&PixelArrayOptions::builder().data(ones).build())?;
    let zeros = StridedBuffer::new(vec![0u8; 16 * 12], vec![12, 16]);
    band.write_array(&PixelArrayOptions::builder().data(zeros).build())?;

    let data = band.read_array(PixelArrayOptions::builder().width(16).height(12).build())?;
    assert_eq!(data.shape(), &[12, 16]);
    assert!(data.to_vec::<u8>()?.iter().all(|&value| value == 0));

    let data = band.read_array(PixelArrayOptions::default())?;
    assert_eq!(data.to_vec::<u8>()?.iter().filter(|&&value| value == 0).count(), 16 * 12);
    Ok(())
}

#[test]
fn raster_band_pixels_window() -> Result<(), Box<dyn std::error::Error>> {
    let band = MemoryRasterBand::from_elements(6, 4, (0u16..24).collect())?;
    let options = PixelArrayOptions::builder()
        .x(2)
        .y(1)
        .width(3)
        .height(2)
        .build();
    let data = band.read_array(options)?;
    assert_eq!(data.to_vec::<u16>()?, vec![8, 9, 10, 14, 15, 16]);

    // The window defaults to the buffer shape
    let data = StridedBuffer::with_strides(vec![0f64; 4], vec![2, 2], vec![1, 2]);
    let data = band.read_array(PixelArrayOptions::builder().data(data).x(4).y(2).build())?;
    assert_eq!(data.to_vec::<f64>()?, vec![16.0, 17.0, 22.0, 23.0]);
    assert_eq!(data.as_slice::<f64>(), Some([16.0, 22.0, 17.0, 23.0].as_slice()));

    // An explicit zero width is passed to the engine
    let data = band.read_array(PixelArrayOptions::builder().width(0).build())?;
    assert_eq!(data.shape(), &[4, 0]);
    Ok(())
}

#[test]
fn raster_band_pixels_resampling() -> Result<(), Box<dyn std::error::Error>> {
    let band = MemoryRasterBand::from_elements(4, 4, (0u8..16).collect())?;
    let naive = band.read_array(PixelArrayOptions::builder().width(2).height(2).build())?;
    assert_eq!(naive.to_vec::<u8>()?, vec![0, 1, 4, 5]);

    let options = PixelArrayOptions::builder()
        .data(StridedBuffer::zeros(ElementKind::Float32, vec![2, 2]))
        .width(4)
        .height(4)
        .build();
    let nearest = band.read_array(options)?;
    assert_eq!(nearest.to_vec::<f32>()?, vec![5.0, 7.0, 13.0, 15.0]);

    let options = PixelArrayOptions::builder()
        .data(StridedBuffer::zeros(ElementKind::Float32, vec![2, 2]))
        .width(4)
        .height(4)
        .resampling(ResampleAlg::Average)
        .build();
    let average = band.read_array(options)?;
    assert_eq!(average.to_vec::<f32>()?, vec![2.5, 4.5, 10.5, 12.5]);
    Ok(())
}

#[test]
fn raster_band_pixels_validation() -> Result<(), Box<dyn std::error::Error>> {
    let band = MemoryRasterBand::new(4, 4, NativeDataType::Byte);

    // The stride is checked before the element kind
    let data = StridedBuffer::with_strides_offset(vec![0i8; 16], vec![4, 4], vec![1, 4, 16], 0);
    let result = band.read_array(PixelArrayOptions::builder().data(data).build());
    assert!(matches!(result, Err(ArrayError::NotAnArray(_))));

    let data = StridedBuffer::new(vec![0u8; 16], vec![16]);
    let error = band
        .read_array(PixelArrayOptions::builder().data(data).build())
        .unwrap_err();
    assert!(matches!(error, ArrayError::DimensionMismatch { expected: 2, got: 1 }));
    assert!(error.to_string().contains("2 dimensions"));

    let data = StridedBuffer::new(vec![0i8; 16], vec![4, 4]);
    let error = band
        .read_array(PixelArrayOptions::builder().data(data).build())
        .unwrap_err();
    assert!(matches!(error, ArrayError::TypeNotSupported(_)));
    assert!(error.to_string().contains("int8"));

    let complex = MemoryRasterBand::new(4, 4, NativeDataType::CFloat32);
    let error = complex.read_array(PixelArrayOptions::default()).unwrap_err();
    assert!(matches!(error, ArrayError::TypeNotSupported(_)));
    assert!(error.to_string().contains("CFloat32"));

    let data = StridedBuffer::new(vec![0u8; 4], vec![2, 2]);
    let short = StridedBuffer::new(vec![0u8; 3], vec![2, 2]);
    assert!(matches!(
        band.read_array(PixelArrayOptions::builder().data(short).build()),
        Err(ArrayError::NotAnArray(StridedBufferError::OutOfBounds { .. }))
    ));

    // Engine errors pass through
    let result = band.read_array(PixelArrayOptions::builder().data(data).x(3).build());
    assert!(matches!(
        result,
        Err(ArrayError::EngineError(EngineError::WindowOutOfBounds(..)))
    ));
    Ok(())
}

#[test]
fn raster_band_pixels_write_validation() {
    let band = MemoryRasterBand::new(4, 4, NativeDataType::Float64);

    let error = band.write_array(&PixelArrayOptions::default()).unwrap_err();
    assert!(matches!(error, ArrayError::NotAnArray(StridedBufferError::Missing)));

    let options = PixelArrayOptions::builder()
        .data(StridedBuffer::new(vec![0f64; 4], vec![2, 2]))
        .resampling(ResampleAlg::Bilinear)
        .build();
    let error = band.write_array(&options).unwrap_err();
    assert!(matches!(error, ArrayError::UnsupportedOperation(_)));
    assert_eq!(error.to_string(), "resampling when writing is not supported");

    // Dimensionality is checked before resampling
    let options = PixelArrayOptions::builder()
        .data(StridedBuffer::new(vec![0f64; 4], vec![4]))
        .resampling(ResampleAlg::Bilinear)
        .build();
    assert!(matches!(
        band.write_array(&options),
        Err(ArrayError::DimensionMismatch { .. })
    ));

    let options = PixelArrayOptions::builder()
        .data(StridedBuffer::new(vec![0f64; 4], vec![2, 2]))
        .x(3)
        .build();
    assert!(matches!(
        band.write_array(&options),
        Err(ArrayError::EngineError(EngineError::WindowOutOfBounds(..)))
    ));
}

#[test]
fn raster_band_pixels_progress() -> Result<(), Box<dyn std::error::Error>> {
    let band = MemoryRasterBand::new(8, 6, NativeDataType::UInt32);
    assert_eq!(band.size(), (8, 6));
    let calls = Arc::new(AtomicUsize::new(0));
    let options = PixelArrayOptions::builder()
        .progress(Arc::new({
            let calls = calls.clone();
            move |_: f64| {
                calls.fetch_add(1, Ordering::Relaxed);
            }
        }))
        .build();
    band.read_array(options)?;
    assert_eq!(calls.load(Ordering::Relaxed), 6);
    Ok(())
}
