//! Raster algebra and resampling for georeferenced, multi-band grids.
//!
//! A [`RasterDataset`] holds equally shaped bands of one [`PixelType`], an
//! affine [`GeoTransform`], an opaque [`ProjectionRef`] and an optional
//! no-data value with its load-time mask. On top of it the crate provides
//! cell-wise algebra, reclassification, cropping and zooming, all of which
//! return new datasets.
//!
//! ## Use
//!
//! ```
//! use ndarray::Array2;
//! use spa_raster::raster::BandArray;
//! use spa_raster::{math, GeoTransform, RasterDataset};
//!
//! // 100 x 100 cells where each column holds its own index
//! let columns = Array2::from_shape_fn((100, 100), |(_, col)| col as f32);
//! let raster = RasterDataset::from_bands(
//!     vec![BandArray::from(columns)],
//!     GeoTransform::new(0.0, 0.0, 1.0, -1.0),
//! )
//! .unwrap();
//!
//! let shifted = math::add(&raster, 10.0).unwrap();
//! assert_eq!(shifted.band(0).unwrap().get_f64(5, 7), Some(17.0));
//!
//! let east = math::greater_than(&raster, 50.0).unwrap();
//! assert_eq!(east.band(0).unwrap().get_f64(0, 51), Some(1.0));
//! ```
//!
//! Reading and writing files, reprojection and polygonizing are delegated to
//! the [`FileCodec`], [`ProjectionEngine`] and [`vector::VectorGeometry`]
//! collaborators. The `gdal` feature provides implementations of all three.

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod codec;
#[cfg(feature = "gdal")]
pub mod config;
pub mod errors;
mod geo_transform;
pub mod math;
pub mod raster;
pub mod spatial_ref;
mod test_utils;
#[cfg(feature = "gdal")]
mod utils;
pub mod vector;

pub use codec::{FileCodec, RasterFormat};
pub use errors::{RasterError, Result};
pub use geo_transform::{Bounds, GeoTransform};
pub use raster::{BandArray, PixelType, RasterDataset};
pub use spatial_ref::{ProjectionEngine, ProjectionRef};

#[cfg(feature = "gdal")]
pub use codec::GdalCodec;
#[cfg(feature = "gdal")]
pub use spatial_ref::GdalProjectionEngine;
#[cfg(feature = "gdal")]
pub use vector::GdalVectorGeometry;
