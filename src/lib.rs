//! Read and write strided multidimensional arrays through the raster and multidimensional array I/O of a raster engine (e.g. [GDAL](https://gdal.org)).
//!
//! A [`StridedBuffer`](strided_buffer::StridedBuffer) is a flat typed buffer with a shape, a signed per-dimension stride and an offset, like an `ndarray`.
//! The adapters in [`adapter`] translate a strided buffer and an optional region into the call shape of the engine, so that a buffer of any stride layout (row-major, column-major, reversed) is filled or written in place without intermediate copies.
//!
//! ## Getting Started
//! - Implement the engine traits in [`engine`] for your raster band and multidimensional array types, or use the in-memory engine ([`MemoryRasterBand`](engine::MemoryRasterBand), [`MemoryMdArray`](engine::MemoryMdArray)).
//! - Bring [`RasterBandPixelsExt`](adapter::RasterBandPixelsExt) or [`MdArrayReadExt`](adapter::MdArrayReadExt) (or their async variants) into scope.
//!
//! ## Example
//! ```rust
//! # use ndarray_gdal::data_type::NativeDataType;
//! # use ndarray_gdal::engine::MemoryRasterBand;
//! # use ndarray_gdal::strided_buffer::StridedBuffer;
//! use ndarray_gdal::adapter::{PixelArrayOptions, RasterBandPixelsExt};
//!
//! let band = MemoryRasterBand::new(16, 12, NativeDataType::Float32);
//!
//! // Write a column-major 2x3 buffer at column 4, row 2
//! let data = StridedBuffer::with_strides(vec![1.0f32, 4.0, 2.0, 5.0, 3.0, 6.0], vec![2, 3], vec![1, 2]);
//! band.write_array(&PixelArrayOptions::builder().data(data).x(4).y(2).build())?;
//!
//! // Read the same window into a new row-major buffer
//! let options = PixelArrayOptions::builder().x(4).y(2).width(3).height(2).build();
//! let data = band.read_array(options)?;
//! assert_eq!(data.shape(), &[2, 3]);
//! assert_eq!(data.to_vec::<f32>()?, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Crate Features
//! #### Default
//!  - `ndarray`: [`ndarray`] interop for [`StridedBuffer`](strided_buffer::StridedBuffer).
//!  - `async`: the async engine traits and adapters.
//!
//! ## Licence
//! `ndarray_gdal` is licensed under either of
//!  - the Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> or
//!  - the MIT license <http://opensource.org/licenses/MIT>, at your option.

#![warn(unused_variables)]
#![warn(dead_code)]
#![deny(missing_docs)]
// #![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![deny(clippy::missing_panics_doc)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod adapter;
pub mod array_region;
pub mod config;
pub mod data_type;
pub mod engine;
pub mod strided_buffer;

pub use adapter::{ArrayError, MdArrayReadExt, RasterBandPixelsExt};
#[cfg(feature = "async")]
pub use adapter::{AsyncMdArrayReadExt, AsyncRasterBandPixelsExt};
pub use strided_buffer::StridedBuffer;
