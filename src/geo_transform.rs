use std::fmt::{Display, Formatter};

use crate::errors::{RasterError, Result};

/// A north-up affine transform.
///
/// Maps pixel/line `(P, L)` (raster) space to `(Xp, Yp)` (reference) space
/// for rasters without rotation terms.
///
/// # Interpretation
///
///   * `x_min`: x-coordinate of the upper-left corner of the upper-left pixel.
///   * `pixel_width`: W-E pixel resolution.
///   * `y_max`: y-coordinate of the upper-left corner of the upper-left pixel.
///   * `pixel_height`: N-S pixel resolution, negative value for a north-up image.
///
/// The six-coefficient GDAL ordering is available through
/// [`GeoTransform::from_coefficients`] and [`GeoTransform::to_coefficients`]:
///
/// ```text
/// [x_min, pixel_width, 0, y_max, 0, pixel_height]
/// ```
///
/// # Example
///
/// ```rust
/// use spa_raster::GeoTransform;
///
/// let transform = GeoTransform::new(500_000.0, 4_100_000.0, 30.0, -30.0);
/// let x = transform.ref_x_from_pixel_x(10.0);
/// let y = transform.ref_y_from_pixel_y(4.0);
/// assert_eq!((x, y), (500_300.0, 4_099_880.0));
/// assert_eq!(transform.pixel_x_from_ref_x(x), 10);
/// assert_eq!(transform.pixel_y_from_ref_y(y), 4);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeoTransform {
    pub x_min: f64,
    pub y_max: f64,
    pub pixel_width: f64,
    pub pixel_height: f64,
}

impl Default for GeoTransform {
    fn default() -> Self {
        GeoTransform::new(0.0, 0.0, 1.0, -1.0)
    }
}

impl GeoTransform {
    pub fn new(x_min: f64, y_max: f64, pixel_width: f64, pixel_height: f64) -> Self {
        GeoTransform {
            x_min,
            y_max,
            pixel_width,
            pixel_height,
        }
    }

    /// Build from GDAL-ordered coefficients.
    ///
    /// Rotated transforms are rejected since pixel/reference conversions here
    /// treat both axes independently.
    pub fn from_coefficients(coefficients: [f64; 6]) -> Result<Self> {
        if coefficients[2] != 0.0 || coefficients[4] != 0.0 {
            return Err(RasterError::InvalidGeoTransform(format!(
                "rotation terms ({}, {}) are not supported",
                coefficients[2], coefficients[4]
            )));
        }
        let transform = GeoTransform::new(
            coefficients[0],
            coefficients[3],
            coefficients[1],
            coefficients[5],
        );
        transform.validate()?;
        Ok(transform)
    }

    pub fn to_coefficients(&self) -> [f64; 6] {
        [
            self.x_min,
            self.pixel_width,
            0.0,
            self.y_max,
            0.0,
            self.pixel_height,
        ]
    }

    /// Fails when either pixel dimension is zero or not finite.
    pub fn validate(&self) -> Result<()> {
        let usable = |v: f64| v != 0.0 && v.is_finite();
        if !usable(self.pixel_width) || !usable(self.pixel_height) {
            return Err(RasterError::InvalidGeoTransform(format!(
                "pixel size ({}, {}) must be finite and non-zero",
                self.pixel_width, self.pixel_height
            )));
        }
        Ok(())
    }

    pub fn ref_x_from_pixel_x(&self, pixel_x: f64) -> f64 {
        self.x_min + pixel_x * self.pixel_width
    }

    /// Moves `pixel_y` rows south of `y_max`; `pixel_height` carries the sign.
    pub fn ref_y_from_pixel_y(&self, pixel_y: f64) -> f64 {
        self.y_max + pixel_y * self.pixel_height
    }

    pub fn pixel_x_from_ref_x(&self, ref_x: f64) -> i64 {
        ((ref_x - self.x_min) / self.pixel_width).floor() as i64
    }

    /// Floor division of `(y_max - ref_y)` by the (negative) pixel height,
    /// negated. Exact row boundaries map back to their row; points strictly
    /// inside a row round up to the next row index.
    pub fn pixel_y_from_ref_y(&self, ref_y: f64) -> i64 {
        -((self.y_max - ref_y) / self.pixel_height).floor() as i64
    }

    /// Reference extent of a `width` x `height` pixel grid.
    pub fn bounds(&self, width: usize, height: usize) -> Bounds {
        let x_max = self.x_min + width as f64 * self.pixel_width;
        let y_min = self.y_max + height as f64 * self.pixel_height;
        Bounds {
            x_min: self.x_min,
            y_min,
            x_max,
            y_max: self.y_max,
        }
    }
}

/// Reference-space extent `(x_min, y_min, x_max, y_max)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
}

impl Bounds {
    pub fn new(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Self {
        Bounds {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }
}

impl Display for Bounds {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({}, {}, {}, {})",
            self.x_min, self.y_min, self.x_max, self.y_max
        )
    }
}

impl From<Bounds> for geo_types::Rect<f64> {
    fn from(bounds: Bounds) -> Self {
        geo_types::Rect::new(
            geo_types::coord! { x: bounds.x_min, y: bounds.y_min },
            geo_types::coord! { x: bounds.x_max, y: bounds.y_max },
        )
    }
}

impl From<geo_types::Rect<f64>> for Bounds {
    fn from(rect: geo_types::Rect<f64>) -> Self {
        let (min, max) = (rect.min(), rect.max());
        Bounds::new(min.x, min.y, max.x, max.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_near;

    fn north_up() -> GeoTransform {
        GeoTransform::new(100.0, 200.0, 2.0, -2.0)
    }

    #[test]
    fn pixel_ref_round_trip() {
        let transform = north_up();
        for n in 0..50 {
            let x = transform.ref_x_from_pixel_x(n as f64);
            let y = transform.ref_y_from_pixel_y(n as f64);
            assert_eq!(transform.pixel_x_from_ref_x(x), n);
            assert_eq!(transform.pixel_y_from_ref_y(y), n);
        }
    }

    #[test]
    fn ref_y_moves_south() {
        let transform = north_up();
        assert_near!(transform.ref_y_from_pixel_y(3.0), 194.0);
    }

    #[test]
    fn half_pixel_offsets_use_floor() {
        let transform = north_up();
        // Half a pixel east of column 4 stays in column 4.
        assert_eq!(transform.pixel_x_from_ref_x(109.0), 4);
        // Floor, not truncation, west of the origin.
        assert_eq!(transform.pixel_x_from_ref_x(99.0), -1);
        // Half a row south of row 4: floor on the mixed-sign division lands on row 5.
        assert_eq!(transform.pixel_y_from_ref_y(191.0), 5);
        // North of the origin.
        assert_eq!(transform.pixel_y_from_ref_y(201.0), 0);
        assert_eq!(transform.pixel_y_from_ref_y(203.0), -1);
    }

    #[test]
    fn bounds_follow_pixel_height_sign() {
        let bounds = north_up().bounds(10, 5);
        assert_eq!(bounds, Bounds::new(100.0, 190.0, 120.0, 200.0));
        let rect: geo_types::Rect<f64> = bounds.into();
        assert_near!(rect.width(), 20.0);
        assert_near!(rect.height(), 10.0);
    }

    #[test]
    fn coefficients() {
        let transform = GeoTransform::from_coefficients([1.0, 0.5, 0.0, 9.0, 0.0, -0.5]).unwrap();
        assert_eq!(transform, GeoTransform::new(1.0, 9.0, 0.5, -0.5));
        assert_eq!(
            transform.to_coefficients(),
            [1.0, 0.5, 0.0, 9.0, 0.0, -0.5]
        );
        assert!(GeoTransform::from_coefficients([0.0, 1.0, 0.2, 0.0, 0.0, -1.0]).is_err());
        assert!(GeoTransform::from_coefficients([0.0, 0.0, 0.0, 0.0, 0.0, -1.0]).is_err());
    }
}
