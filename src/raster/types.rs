use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

use ndarray::Array2;
use num_complex::Complex32;
use num_traits::{Bounded, NumCast, ToPrimitive};

use crate::errors::{RasterError, Result};
use crate::raster::BandArray;

/// Cell types a [`crate::RasterDataset`] can hold.
///
/// Each variant maps to exactly one array element type:
///
/// | `PixelType`  | element       |
/// |--------------|---------------|
/// | `Byte`       | `u8`          |
/// | `UInt16`     | `u16`         |
/// | `Int16`      | `i16`         |
/// | `UInt32`     | `u32`         |
/// | `Int32`      | `i32`         |
/// | `Float32`    | `f32`         |
/// | `Float64`    | `f64`         |
/// | `Complex64`  | `Complex<f32>`|
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PixelType {
    Byte,
    UInt16,
    Int16,
    UInt32,
    Int32,
    Float32,
    Float64,
    Complex64,
}

impl PixelType {
    pub fn name(&self) -> &'static str {
        match self {
            PixelType::Byte => "Byte",
            PixelType::UInt16 => "UInt16",
            PixelType::Int16 => "Int16",
            PixelType::UInt32 => "UInt32",
            PixelType::Int32 => "Int32",
            PixelType::Float32 => "Float32",
            PixelType::Float64 => "Float64",
            PixelType::Complex64 => "Complex64",
        }
    }

    /// Get the cell size in **bits**.
    pub fn bits(&self) -> u8 {
        match self {
            PixelType::Byte => 8,
            PixelType::UInt16 | PixelType::Int16 => 16,
            PixelType::UInt32 | PixelType::Int32 | PixelType::Float32 => 32,
            PixelType::Float64 | PixelType::Complex64 => 64,
        }
    }

    /// Get the cell size in **bytes**.
    pub fn bytes(&self) -> u8 {
        self.bits() / 8
    }

    /// Returns `true` if the type is integral (non-floating point)
    pub fn is_integer(&self) -> bool {
        !self.is_floating() && !self.is_complex()
    }

    /// Returns `true` if the type is a real floating point type
    pub fn is_floating(&self) -> bool {
        matches!(self, PixelType::Float32 | PixelType::Float64)
    }

    pub fn is_complex(&self) -> bool {
        matches!(self, PixelType::Complex64)
    }

    /// Returns `true` if the type supports negative values.
    pub fn is_signed(&self) -> bool {
        !matches!(
            self,
            PixelType::Byte | PixelType::UInt16 | PixelType::UInt32
        )
    }

    pub fn available_types() -> &'static [PixelType] {
        use PixelType::*;
        &[
            Byte, UInt16, Int16, UInt32, Int32, Float32, Float64, Complex64,
        ]
    }
}

impl Display for PixelType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PixelType {
    type Err = RasterError;

    /// Accepts the type names used by raster drivers as well as array dtype
    /// spellings (`uint8`, `float32`, ...), case-insensitively.
    fn from_str(s: &str) -> Result<Self> {
        let parsed = match s.to_ascii_lowercase().as_str() {
            "byte" | "uint8" => PixelType::Byte,
            "uint16" => PixelType::UInt16,
            "int16" => PixelType::Int16,
            "uint32" => PixelType::UInt32,
            "int32" => PixelType::Int32,
            "float32" => PixelType::Float32,
            "float64" => PixelType::Float64,
            "complex64" | "cfloat32" => PixelType::Complex64,
            _ => return Err(RasterError::UnmappedPixelType(s.to_string())),
        };
        Ok(parsed)
    }
}

/// Type-level constraint for the real-valued cell types.
///
/// Algebra on real cells is evaluated in `f64`, which represents every value
/// of every implementing type exactly, and converted back with
/// [`Pixel::from_f64`].
pub trait Pixel: Copy + Debug + PartialEq + PartialOrd + Default + Send + Sync + 'static {
    const PIXEL_TYPE: PixelType;

    fn to_f64(self) -> f64;

    /// Convert back to the cell type.
    ///
    /// Integer types truncate toward zero and saturate at the type bounds;
    /// non-finite values become zero.
    fn from_f64(value: f64) -> Self;

    /// Like [`Pixel::from_f64`], but integer types round half to even first.
    fn from_f64_rounded(value: f64) -> Self {
        if Self::PIXEL_TYPE.is_integer() {
            Self::from_f64(value.round_ties_even())
        } else {
            Self::from_f64(value)
        }
    }

    fn into_band(array: Array2<Self>) -> BandArray;

    fn band_view(band: &BandArray) -> Option<&Array2<Self>>;
}

/// Checked cast that clamps out-of-range values to the bounds of `T`.
fn saturating_cast<T: NumCast + Bounded>(value: f64) -> T {
    <T as NumCast>::from(value).unwrap_or_else(|| {
        if value > 0.0 {
            T::max_value()
        } else {
            T::min_value()
        }
    })
}

macro_rules! impl_pixel {
    ($t:ty, $variant:ident, non_finite = $non_finite:expr) => {
        impl Pixel for $t {
            const PIXEL_TYPE: PixelType = PixelType::$variant;

            fn to_f64(self) -> f64 {
                ToPrimitive::to_f64(&self).unwrap_or(f64::NAN)
            }

            fn from_f64(value: f64) -> Self {
                if value.is_finite() {
                    saturating_cast(value)
                } else {
                    $non_finite(value)
                }
            }

            fn into_band(array: Array2<Self>) -> BandArray {
                BandArray::$variant(array)
            }

            fn band_view(band: &BandArray) -> Option<&Array2<Self>> {
                match band {
                    BandArray::$variant(array) => Some(array),
                    _ => None,
                }
            }
        }
    };
}

impl_pixel!(u8, Byte, non_finite = |_: f64| 0);
impl_pixel!(u16, UInt16, non_finite = |_: f64| 0);
impl_pixel!(i16, Int16, non_finite = |_: f64| 0);
impl_pixel!(u32, UInt32, non_finite = |_: f64| 0);
impl_pixel!(i32, Int32, non_finite = |_: f64| 0);
impl_pixel!(f32, Float32, non_finite = |v: f64| v as f32);
impl_pixel!(f64, Float64, non_finite = |v: f64| v);

impl From<Array2<Complex32>> for BandArray {
    fn from(array: Array2<Complex32>) -> Self {
        BandArray::Complex64(array)
    }
}
