use ndarray::{s, Array2};
use num_complex::Complex32;

use crate::errors::{RasterError, Result};
use crate::raster::{Pixel, PixelType};

/// One band of cells, stored in the array type its [`PixelType`] maps to.
///
/// Arrays are `(rows, cols)`; row 0 is the northernmost row.
#[derive(Clone, Debug, PartialEq)]
pub enum BandArray {
    Byte(Array2<u8>),
    UInt16(Array2<u16>),
    Int16(Array2<i16>),
    UInt32(Array2<u32>),
    Int32(Array2<i32>),
    Float32(Array2<f32>),
    Float64(Array2<f64>),
    Complex64(Array2<Complex32>),
}

/// Expand `$body` once per real variant with `$a` bound to the typed array,
/// and `$cbody` for the complex variant.
macro_rules! for_each_band {
    ($band:expr, $a:ident => $body:expr, $c:ident => $cbody:expr) => {
        match $band {
            BandArray::Byte($a) => $body,
            BandArray::UInt16($a) => $body,
            BandArray::Int16($a) => $body,
            BandArray::UInt32($a) => $body,
            BandArray::Int32($a) => $body,
            BandArray::Float32($a) => $body,
            BandArray::Float64($a) => $body,
            BandArray::Complex64($c) => $cbody,
        }
    };
}
pub(crate) use for_each_band;

impl BandArray {
    /// Zero-filled band of the array type mapped from `pixel_type`.
    pub fn zeros(pixel_type: PixelType, rows: usize, cols: usize) -> Self {
        let shape = (rows, cols);
        match pixel_type {
            PixelType::Byte => BandArray::Byte(Array2::zeros(shape)),
            PixelType::UInt16 => BandArray::UInt16(Array2::zeros(shape)),
            PixelType::Int16 => BandArray::Int16(Array2::zeros(shape)),
            PixelType::UInt32 => BandArray::UInt32(Array2::zeros(shape)),
            PixelType::Int32 => BandArray::Int32(Array2::zeros(shape)),
            PixelType::Float32 => BandArray::Float32(Array2::zeros(shape)),
            PixelType::Float64 => BandArray::Float64(Array2::zeros(shape)),
            PixelType::Complex64 => BandArray::Complex64(Array2::zeros(shape)),
        }
    }

    pub fn pixel_type(&self) -> PixelType {
        match self {
            BandArray::Byte(_) => PixelType::Byte,
            BandArray::UInt16(_) => PixelType::UInt16,
            BandArray::Int16(_) => PixelType::Int16,
            BandArray::UInt32(_) => PixelType::UInt32,
            BandArray::Int32(_) => PixelType::Int32,
            BandArray::Float32(_) => PixelType::Float32,
            BandArray::Float64(_) => PixelType::Float64,
            BandArray::Complex64(_) => PixelType::Complex64,
        }
    }

    /// `(rows, cols)`
    pub fn shape(&self) -> (usize, usize) {
        for_each_band!(self, a => a.dim(), c => c.dim())
    }

    pub fn rows(&self) -> usize {
        self.shape().0
    }

    pub fn cols(&self) -> usize {
        self.shape().1
    }

    /// Borrow the typed array, if this band holds `T` cells.
    pub fn as_array<T: Pixel>(&self) -> Option<&Array2<T>> {
        T::band_view(self)
    }

    pub fn as_complex(&self) -> Option<&Array2<Complex32>> {
        match self {
            BandArray::Complex64(c) => Some(c),
            _ => None,
        }
    }

    /// Cell value as `f64`; complex cells report their real part.
    pub fn get_f64(&self, row: usize, col: usize) -> Option<f64> {
        for_each_band!(
            self,
            a => a.get((row, col)).map(|v| v.to_f64()),
            c => c.get((row, col)).map(|v| v.re as f64)
        )
    }

    /// Copy the cells into an `f64` array.
    ///
    /// Complex bands have no real-valued interpretation and are rejected.
    pub fn to_f64_array(&self) -> Result<Array2<f64>> {
        for_each_band!(
            self,
            a => Ok(a.mapv(|v| v.to_f64())),
            _c => Err(RasterError::InvalidOperand(
                "complex cells cannot be used as real values".to_string()
            ))
        )
    }

    /// Copy the cells into a complex array; real cells get a zero imaginary part.
    pub fn to_complex_array(&self) -> Array2<Complex32> {
        for_each_band!(
            self,
            a => a.mapv(|v| Complex32::new(v.to_f64() as f32, 0.0)),
            c => c.clone()
        )
    }

    /// Inclusive rectangular copy of `rows.0..=rows.1`, `cols.0..=cols.1`.
    ///
    /// Callers validate the window against [`BandArray::shape`].
    pub(crate) fn window(&self, rows: (usize, usize), cols: (usize, usize)) -> BandArray {
        for_each_band!(
            self,
            a => a.slice(s![rows.0..=rows.1, cols.0..=cols.1]).to_owned().into(),
            c => BandArray::Complex64(c.slice(s![rows.0..=rows.1, cols.0..=cols.1]).to_owned())
        )
    }

    /// Cells equal to `value`. A NaN `value` matches NaN cells.
    pub fn equals_value(&self, value: f64) -> Array2<bool> {
        if value.is_nan() {
            return for_each_band!(
                self,
                a => a.mapv(|v| v.to_f64().is_nan()),
                c => c.mapv(|v| v.re.is_nan())
            );
        }
        for_each_band!(
            self,
            a => a.mapv(|v| v.to_f64() == value),
            c => c.mapv(|v| v.im == 0.0 && v.re as f64 == value)
        )
    }

    /// Copy with every `true` cell of `mask` replaced by `value`.
    pub fn fill_where(&self, mask: &Array2<bool>, value: f64) -> BandArray {
        fn fill<T: Pixel>(a: &Array2<T>, mask: &Array2<bool>, value: T) -> Array2<T> {
            let mut out = a.clone();
            out.zip_mut_with(mask, |v, &masked| {
                if masked {
                    *v = value
                }
            });
            out
        }
        for_each_band!(
            self,
            a => fill(a, mask, Pixel::from_f64(value)).into(),
            c => {
                let mut out = c.clone();
                out.zip_mut_with(mask, |v, &masked| {
                    if masked {
                        *v = Complex32::new(value as f32, 0.0)
                    }
                });
                BandArray::Complex64(out)
            }
        )
    }

    /// Smallest and largest finite cell values, skipping `true` cells of `mask`.
    pub fn min_max(&self, mask: Option<&Array2<bool>>) -> Result<Option<(f64, f64)>> {
        let values = self.to_f64_array()?;
        let mut range: Option<(f64, f64)> = None;
        for ((row, col), &v) in values.indexed_iter() {
            if !v.is_finite() || mask.is_some_and(|m| m[(row, col)]) {
                continue;
            }
            range = Some(match range {
                Some((lo, hi)) => (lo.min(v), hi.max(v)),
                None => (v, v),
            });
        }
        Ok(range)
    }
}

impl<T: Pixel> From<Array2<T>> for BandArray {
    fn from(array: Array2<T>) -> Self {
        T::into_band(array)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn zeros_follow_type_table() {
        for &pixel_type in PixelType::available_types() {
            let band = BandArray::zeros(pixel_type, 3, 4);
            assert_eq!(band.pixel_type(), pixel_type);
            assert_eq!(band.shape(), (3, 4));
            assert_eq!(band.get_f64(2, 3), Some(0.0));
        }
    }

    #[test]
    fn typed_access() {
        let band: BandArray = array![[1i16, -2], [3, 4]].into();
        assert_eq!(band.pixel_type(), PixelType::Int16);
        assert_eq!(band.as_array::<i16>().unwrap()[(0, 1)], -2);
        assert!(band.as_array::<u8>().is_none());
        assert!(band.as_complex().is_none());
    }

    #[test]
    fn window_is_inclusive() {
        let band: BandArray = Array2::from_shape_fn((5, 6), |(r, c)| (r * 10 + c) as u16).into();
        let sub = band.window((1, 3), (2, 2));
        assert_eq!(sub.shape(), (3, 1));
        assert_eq!(sub.as_array::<u16>().unwrap(), &array![[12u16], [22], [32]]);
    }

    #[test]
    fn nodata_helpers() {
        let band: BandArray = array![[-9999.0f32, 1.0], [2.0, -9999.0]].into();
        let mask = band.equals_value(-9999.0);
        assert_eq!(mask, array![[true, false], [false, true]]);
        let filled = band.fill_where(&mask, 0.0);
        assert_eq!(filled.as_array::<f32>().unwrap(), &array![[0.0f32, 1.0], [2.0, 0.0]]);
        assert_eq!(band.min_max(Some(&mask)).unwrap(), Some((1.0, 2.0)));
        assert_eq!(band.min_max(None).unwrap(), Some((-9999.0, 2.0)));

        let nan_band: BandArray = array![[f64::NAN, 1.0]].into();
        assert_eq!(nan_band.equals_value(f64::NAN), array![[true, false]]);
    }

    #[test]
    fn complex_band_is_not_real() {
        let band = BandArray::zeros(PixelType::Complex64, 2, 2);
        assert!(band.to_f64_array().is_err());
        assert!(band.min_max(None).is_err());
        assert_eq!(band.to_complex_array().dim(), (2, 2));
    }
}
