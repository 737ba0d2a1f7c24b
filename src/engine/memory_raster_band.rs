//! An in-memory raster band.

use parking_lot::RwLock;

use crate::data_type::{Element, ElementKind, NativeDataType};

use super::{
    element_conversion::{average_range, nearest_index, read_element, write_element, BufferLayout},
    EngineError, PixelWindow, RasterBandIoTraits, RasterBandTraits, RasterIoGeometry, ResampleAlg,
};

#[cfg(feature = "async")]
use super::AsyncRasterBandIoTraits;

/// An in-memory raster band.
///
/// Pixels are stored row-major as native endian bytes of the band data type.
/// Reads convert to the buffer data type and support [`ResampleAlg::Nearest`] and [`ResampleAlg::Average`] resampling.
/// Writes convert from the buffer data type and map the buffer onto the window by nearest neighbour.
///
/// The band is locked one row at a time and is unlocked while the progress callback runs, so a callback may access the band.
#[derive(Debug)]
pub struct MemoryRasterBand {
    size: (usize, usize),
    data_type: NativeDataType,
    data: RwLock<Vec<u8>>,
    read_only: bool,
}

impl MemoryRasterBand {
    /// Create a new zero initialised raster band with `width` columns and `height` rows.
    #[must_use]
    pub fn new(width: usize, height: usize, data_type: NativeDataType) -> Self {
        Self {
            size: (width, height),
            data_type,
            data: RwLock::new(vec![0; width * height * data_type.size()]),
            read_only: false,
        }
    }

    /// Create a new raster band from row-major `elements`.
    ///
    /// # Errors
    /// Returns an [`EngineError`] if `T` has no native data type or the number of elements is not `width * height`.
    pub fn from_elements<T: Element>(
        width: usize,
        height: usize,
        elements: Vec<T>,
    ) -> Result<Self, EngineError> {
        let data_type = T::KIND.native_data_type().ok_or_else(|| {
            EngineError::Unsupported(format!("element kind {} has no native data type", T::KIND))
        })?;
        if elements.len() != width * height {
            return Err(EngineError::InvalidDescriptor(format!(
                "{} elements cannot fill a raster of size ({width}, {height})",
                elements.len()
            )));
        }
        Ok(Self {
            size: (width, height),
            data_type,
            data: RwLock::new(bytemuck::cast_slice(&elements).to_vec()),
            read_only: false,
        })
    }

    /// Set whether the band rejects writes.
    #[must_use]
    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Returns the pixels in row-major order.
    ///
    /// # Errors
    /// Returns an [`EngineError`] if `T` does not match the band data type.
    pub fn elements<T: Element>(&self) -> Result<Vec<T>, EngineError> {
        if T::KIND.native_data_type() != Some(self.data_type) {
            return Err(EngineError::Other(format!(
                "band data type {} cannot be viewed as {}",
                self.data_type,
                T::KIND
            )));
        }
        Ok(bytemuck::pod_collect_to_vec(&self.data.read()[..]))
    }

    fn element_kind(&self) -> Result<ElementKind, EngineError> {
        self.data_type.element_kind().ok_or_else(|| {
            EngineError::Unsupported(format!(
                "band data type {} is not supported by the memory engine",
                self.data_type
            ))
        })
    }

    fn check_window(&self, window: &PixelWindow) -> Result<(), EngineError> {
        if window.inbounds(self.size) {
            Ok(())
        } else {
            Err(EngineError::WindowOutOfBounds(*window, self.size))
        }
    }

    fn pixel_offset(&self, window: &PixelWindow, column: usize, row: usize, size: usize) -> usize {
        ((window.y + row) * self.size.0 + window.x + column) * size
    }
}

fn buffer_layout(geometry: &RasterIoGeometry, len: usize) -> Result<BufferLayout, EngineError> {
    let kind = geometry.data_type.element_kind().ok_or_else(|| {
        EngineError::Unsupported(format!(
            "buffer data type {} is not supported by the memory engine",
            geometry.data_type
        ))
    })?;
    BufferLayout::new(
        kind,
        geometry.offset,
        &[geometry.buffer_height, geometry.buffer_width],
        &[geometry.line_space, geometry.pixel_space],
        len,
    )
    .ok_or(EngineError::BufferOutOfBounds(len))
}

#[allow(clippy::cast_precision_loss)]
fn report_progress(geometry: &RasterIoGeometry, rows_done: usize, rows: usize) {
    if let Some(progress) = &geometry.progress {
        progress(rows_done as f64 / rows as f64);
    }
}

impl RasterBandTraits for MemoryRasterBand {
    fn data_type(&self) -> NativeDataType {
        self.data_type
    }

    fn size(&self) -> (usize, usize) {
        self.size
    }
}

impl RasterBandIoTraits for MemoryRasterBand {
    #[allow(clippy::cast_precision_loss)]
    fn read(
        &self,
        window: &PixelWindow,
        buffer: &mut [u8],
        geometry: &RasterIoGeometry,
    ) -> Result<(), EngineError> {
        self.check_window(window)?;
        let kind = self.element_kind()?;
        let layout = buffer_layout(geometry, buffer.len())?;
        let (buffer_width, buffer_height) = (geometry.buffer_width, geometry.buffer_height);
        if buffer_width == 0 || buffer_height == 0 {
            return Ok(());
        }
        if window.width == 0 || window.height == 0 {
            return Err(EngineError::InvalidDescriptor(format!(
                "cannot fill a {buffer_width}x{buffer_height} buffer from the empty window {window}"
            )));
        }
        let average = match geometry.resampling.unwrap_or_default() {
            ResampleAlg::Nearest => false,
            ResampleAlg::Average => true,
            resampling => {
                return Err(EngineError::Unsupported(format!(
                    "resampling algorithm {resampling} is not supported by the memory engine"
                )))
            }
        };

        for row in 0..buffer_height {
            let data = self.data.read();
            let pixel = |column: usize, row: usize| {
                let offset = self.pixel_offset(window, column, row, kind.size());
                read_element(kind, &data[offset..])
            };
            for column in 0..buffer_width {
                let value = if average {
                    let rows = average_range(row, buffer_height, window.height);
                    let columns = average_range(column, buffer_width, window.width);
                    let count = rows.len() * columns.len();
                    let sum: f64 = rows
                        .flat_map(|r| columns.clone().map(move |c| (c, r)))
                        .map(|(c, r)| pixel(c, r))
                        .sum();
                    sum / count as f64
                } else {
                    pixel(
                        nearest_index(column, buffer_width, window.width),
                        nearest_index(row, buffer_height, window.height),
                    )
                };
                let index = layout.byte_index(&[row, column]);
                write_element(layout.kind, &mut buffer[index..], value);
            }
            drop(data);
            report_progress(geometry, row + 1, buffer_height);
        }
        Ok(())
    }

    fn write(
        &self,
        window: &PixelWindow,
        buffer: &[u8],
        geometry: &RasterIoGeometry,
    ) -> Result<(), EngineError> {
        if self.read_only {
            return Err(EngineError::ReadOnly);
        }
        self.check_window(window)?;
        let kind = self.element_kind()?;
        let layout = buffer_layout(geometry, buffer.len())?;
        if let Some(resampling) = geometry.resampling {
            return Err(EngineError::Unsupported(format!(
                "resampling algorithm {resampling} is not supported when writing"
            )));
        }
        let (buffer_width, buffer_height) = (geometry.buffer_width, geometry.buffer_height);
        if window.width == 0 || window.height == 0 {
            return Ok(());
        }
        if buffer_width == 0 || buffer_height == 0 {
            return Err(EngineError::InvalidDescriptor(format!(
                "cannot fill the window {window} from a {buffer_width}x{buffer_height} buffer"
            )));
        }

        for row in 0..window.height {
            let mut data = self.data.write();
            let buffer_row = nearest_index(row, window.height, buffer_height);
            for column in 0..window.width {
                let buffer_column = nearest_index(column, window.width, buffer_width);
                let index = layout.byte_index(&[buffer_row, buffer_column]);
                let value = read_element(layout.kind, &buffer[index..]);
                let offset = self.pixel_offset(window, column, row, kind.size());
                write_element(kind, &mut data[offset..], value);
            }
            drop(data);
            report_progress(geometry, row + 1, window.height);
        }
        Ok(())
    }
}

#[cfg(feature = "async")]
#[async_trait::async_trait]
impl AsyncRasterBandIoTraits for MemoryRasterBand {
    async fn read(
        &self,
        window: &PixelWindow,
        buffer: &mut [u8],
        geometry: &RasterIoGeometry,
    ) -> Result<(), EngineError> {
        RasterBandIoTraits::read(self, window, buffer, geometry)
    }

    async fn write(
        &self,
        window: &PixelWindow,
        buffer: &[u8],
        geometry: &RasterIoGeometry,
    ) -> Result<(), EngineError> {
        RasterBandIoTraits::write(self, window, buffer, geometry)
    }
}
