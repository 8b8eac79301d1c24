use std::fmt::{Display, Formatter};

#[cfg(feature = "gdal")]
use gdal_sys::{CPLErr, OGRErr};
use thiserror::Error;

use crate::raster::PixelType;

pub type Result<T> = std::result::Result<T, RasterError>;

#[derive(Clone, Debug, Error)]
pub enum RasterError {
    #[error("Shape mismatch: left operand is {left}, right operand is {right}")]
    ShapeMismatch {
        left: RasterShape,
        right: RasterShape,
    },
    #[error("Unsupported operation '{operation}': {reason}")]
    UnsupportedOperation { operation: String, reason: String },
    #[error("Invalid operand: {0}")]
    InvalidOperand(String),
    #[error("Pixel window {window} exceeds raster extent of {width}x{height} pixels")]
    OutOfBounds {
        window: PixelWindow,
        width: usize,
        height: usize,
    },
    #[error("Band index {index} out of range for a raster with {num_bands} band(s)")]
    BandIndexOutOfRange { index: usize, num_bands: usize },
    #[error("No array type mapping for pixel type {0}")]
    UnmappedPixelType(String),
    #[error("Method '{method_name}' requires populated bands; call allocate_array or load first")]
    UninitializedData { method_name: &'static str },
    #[error("Invalid geo transform: {0}")]
    InvalidGeoTransform(String),
    #[error(transparent)]
    NdarrayShapeError(#[from] ndarray::ShapeError),

    #[cfg(feature = "gdal")]
    #[error(transparent)]
    FfiNulError(#[from] std::ffi::NulError),
    #[cfg(feature = "gdal")]
    #[error("CPL error class: '{class:?}', error number: '{number}', error msg: '{msg}'")]
    CplError {
        class: CPLErr::Type,
        number: i32,
        msg: String,
    },
    #[cfg(feature = "gdal")]
    #[error("GDAL method '{method_name}' returned a NULL pointer. Error msg: '{msg}'")]
    NullPointer {
        method_name: &'static str,
        msg: String,
    },
    #[cfg(feature = "gdal")]
    #[error("OGR method '{method_name}' returned error: '{err:?}'")]
    OgrError {
        err: OGRErr::Type,
        method_name: &'static str,
    },
}

impl RasterError {
    pub(crate) fn unsupported(operation: impl Display, reason: impl Into<String>) -> Self {
        RasterError::UnsupportedOperation {
            operation: operation.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn unmapped(pixel_type: Option<PixelType>) -> Self {
        match pixel_type {
            Some(t) => RasterError::UnmappedPixelType(t.name().to_string()),
            None => RasterError::UnmappedPixelType("<unset>".to_string()),
        }
    }
}

/// Band count and per-band array shape, as reported in [`RasterError::ShapeMismatch`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RasterShape {
    pub num_bands: usize,
    pub rows: usize,
    pub cols: usize,
}

impl Display for RasterShape {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} band(s) of {} rows x {} cols",
            self.num_bands, self.rows, self.cols
        )
    }
}

/// Inclusive pixel rectangle, in (column, row) order.
///
/// Components are signed because windows derived from reference coordinates
/// may fall left of or above the raster origin.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelWindow {
    pub start_col: i64,
    pub start_row: i64,
    pub end_col: i64,
    pub end_row: i64,
}

impl Display for PixelWindow {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "cols {}..={}, rows {}..={}",
            self.start_col, self.end_col, self.start_row, self.end_row
        )
    }
}
