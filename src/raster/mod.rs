//! Raster data, algebra and resampling

mod algebra;
mod band;
mod dataset;
mod reclassify;
mod resample;
mod types;

pub use algebra::{ArithmeticOp, LogicalOp, Operand, OperandOrder, Operation, UnaryOp};
pub use band::BandArray;
pub(crate) use band::for_each_band;
pub use dataset::RasterDataset;
pub use reclassify::{reclassify_discrete, reclassify_range};
pub use resample::{
    crop_by_reference, extract_by_pixels, nearest_neighbor_resample, scale, Interpolation,
    NearestNeighborOptions, ScaleOptions,
};
pub use types::{Pixel, PixelType};
