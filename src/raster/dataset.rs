use ndarray::Array2;

use crate::errors::{RasterError, RasterShape, Result};
use crate::geo_transform::{Bounds, GeoTransform};
use crate::raster::{BandArray, PixelType};
use crate::spatial_ref::ProjectionRef;

/// A georeferenced stack of equally shaped bands.
///
/// A dataset is either filled by a [`crate::FileCodec`] or built by hand:
///
/// ```rust
/// use spa_raster::{PixelType, RasterDataset};
///
/// let mut raster = RasterDataset::new();
/// raster.set_width_in_pixels(4);
/// raster.set_height_in_pixels(3);
/// raster.set_num_bands(2);
/// raster.set_pixel_type(PixelType::Int16);
/// raster.set_resolution(30.0, Some(-30.0));
/// raster.set_north_west_corner(500_000.0, 4_100_000.0);
/// raster.allocate_array().unwrap();
///
/// assert_eq!(raster.band(1).unwrap().shape(), (3, 4));
/// ```
///
/// Shape setters only describe the grid for the next [`RasterDataset::allocate_array`];
/// once bands exist, use [`RasterDataset::set_bands`] to change them.
///
/// # Mask
///
/// When a no-data value is present the mask marks (`true`) the cells of band 0
/// equal to it at load time. Algebra and resampling carry that mask along but
/// never recompute it from their results; call
/// [`RasterDataset::recompute_mask`] to refresh it explicitly.
#[derive(Debug, PartialEq)]
pub struct RasterDataset {
    width_in_pixels: usize,
    height_in_pixels: usize,
    num_bands: usize,
    pixel_type: Option<PixelType>,
    bands: Option<Vec<BandArray>>,
    no_data_value: Option<f64>,
    mask: Option<Array2<bool>>,
    geo_transform: GeoTransform,
    projection: Option<ProjectionRef>,
}

impl Default for RasterDataset {
    fn default() -> Self {
        RasterDataset::new()
    }
}

/// Deep copy with independent band storage. The mask is only kept when a
/// no-data value is set.
impl Clone for RasterDataset {
    fn clone(&self) -> Self {
        let mut dataset = self.properties_only();
        dataset.bands = self.bands.clone();
        if self.no_data_value.is_some() {
            dataset.mask = self.mask.clone();
        }
        dataset
    }
}

impl RasterDataset {
    /// An empty 100 x 100, single band description with unit pixels and no
    /// pixel type.
    pub fn new() -> Self {
        RasterDataset {
            width_in_pixels: 100,
            height_in_pixels: 100,
            num_bands: 1,
            pixel_type: None,
            bands: None,
            no_data_value: None,
            mask: None,
            geo_transform: GeoTransform::default(),
            projection: None,
        }
    }

    /// Build a populated dataset from `bands`; shape and pixel type come from the arrays.
    pub fn from_bands(bands: Vec<BandArray>, geo_transform: GeoTransform) -> Result<Self> {
        geo_transform.validate()?;
        let mut dataset = RasterDataset::new();
        dataset.geo_transform = geo_transform;
        dataset.set_bands(bands)?;
        Ok(dataset)
    }

    /// Copy every metadata field of `other` except bands and mask.
    pub fn copy_properties_but_not_data(&mut self, other: &RasterDataset) {
        self.width_in_pixels = other.width_in_pixels;
        self.height_in_pixels = other.height_in_pixels;
        self.num_bands = other.num_bands;
        self.pixel_type = other.pixel_type;
        self.bands = None;
        self.no_data_value = other.no_data_value;
        self.mask = None;
        self.geo_transform = other.geo_transform;
        self.projection = other.projection.clone();
    }

    /// A new dataset sharing `self`'s metadata and holding no data.
    pub fn properties_only(&self) -> RasterDataset {
        let mut dataset = RasterDataset::new();
        dataset.copy_properties_but_not_data(self);
        dataset
    }

    /// Replace the bands with zero-filled arrays for the configured shape and pixel type.
    pub fn allocate_array(&mut self) -> Result<&[BandArray]> {
        let pixel_type = self.pixel_type.ok_or(RasterError::unmapped(None))?;
        let bands = (0..self.num_bands)
            .map(|_| BandArray::zeros(pixel_type, self.height_in_pixels, self.width_in_pixels))
            .collect();
        Ok(self.bands.insert(bands).as_slice())
    }

    pub fn width_in_pixels(&self) -> usize {
        self.width_in_pixels
    }

    pub fn set_width_in_pixels(&mut self, width: usize) {
        self.width_in_pixels = width;
    }

    pub fn height_in_pixels(&self) -> usize {
        self.height_in_pixels
    }

    pub fn set_height_in_pixels(&mut self, height: usize) {
        self.height_in_pixels = height;
    }

    pub fn num_bands(&self) -> usize {
        self.num_bands
    }

    pub fn set_num_bands(&mut self, num_bands: usize) {
        self.num_bands = num_bands;
    }

    pub fn pixel_type(&self) -> Option<PixelType> {
        self.pixel_type
    }

    pub fn set_pixel_type(&mut self, pixel_type: PixelType) {
        self.pixel_type = Some(pixel_type);
    }

    /// `(pixel_width, pixel_height)`
    pub fn resolution(&self) -> (f64, f64) {
        (
            self.geo_transform.pixel_width,
            self.geo_transform.pixel_height,
        )
    }

    /// Set the pixel size; `pixel_height` defaults to `pixel_width`.
    pub fn set_resolution(&mut self, pixel_width: f64, pixel_height: Option<f64>) {
        self.geo_transform.pixel_width = pixel_width;
        self.geo_transform.pixel_height = pixel_height.unwrap_or(pixel_width);
    }

    pub fn set_north_west_corner(&mut self, x: f64, y: f64) {
        self.geo_transform.x_min = x;
        self.geo_transform.y_max = y;
    }

    pub fn geo_transform(&self) -> &GeoTransform {
        &self.geo_transform
    }

    pub fn set_geo_transform(&mut self, geo_transform: GeoTransform) -> Result<()> {
        geo_transform.validate()?;
        self.geo_transform = geo_transform;
        Ok(())
    }

    pub fn bounds(&self) -> Bounds {
        self.geo_transform
            .bounds(self.width_in_pixels, self.height_in_pixels)
    }

    pub fn ref_x_from_pixel_x(&self, pixel_x: f64) -> f64 {
        self.geo_transform.ref_x_from_pixel_x(pixel_x)
    }

    pub fn ref_y_from_pixel_y(&self, pixel_y: f64) -> f64 {
        self.geo_transform.ref_y_from_pixel_y(pixel_y)
    }

    pub fn pixel_x_from_ref_x(&self, ref_x: f64) -> i64 {
        self.geo_transform.pixel_x_from_ref_x(ref_x)
    }

    pub fn pixel_y_from_ref_y(&self, ref_y: f64) -> i64 {
        self.geo_transform.pixel_y_from_ref_y(ref_y)
    }

    pub fn projection(&self) -> Option<&ProjectionRef> {
        self.projection.as_ref()
    }

    pub fn set_projection(&mut self, projection: Option<ProjectionRef>) {
        self.projection = projection;
    }

    pub fn set_projection_wkt(&mut self, wkt: &str) {
        self.projection = Some(ProjectionRef::Wkt(wkt.to_string()));
    }

    /// Describe the raster as UTM `zone` on the WGS84 geographic coordinate system.
    pub fn set_utm(&mut self, zone: u8, south: bool) {
        self.projection = Some(ProjectionRef::utm(zone, south));
    }

    pub fn no_data_value(&self) -> Option<f64> {
        self.no_data_value
    }

    /// Set the no-data value. The mask is left untouched.
    pub fn set_no_data_value(&mut self, no_data_value: Option<f64>) {
        self.no_data_value = no_data_value;
    }

    pub fn mask(&self) -> Option<&Array2<bool>> {
        self.mask.as_ref()
    }

    pub fn set_mask(&mut self, mask: Option<Array2<bool>>) -> Result<()> {
        if let Some(m) = &mask {
            let expected = (self.height_in_pixels, self.width_in_pixels);
            if m.dim() != expected {
                return Err(RasterError::ShapeMismatch {
                    left: self.shape(),
                    right: RasterShape {
                        num_bands: 1,
                        rows: m.nrows(),
                        cols: m.ncols(),
                    },
                });
            }
        }
        self.mask = mask;
        Ok(())
    }

    /// Rebuild the mask from band 0 and the current no-data value.
    ///
    /// Clears the mask when no no-data value is set.
    pub fn recompute_mask(&mut self) -> Result<()> {
        self.mask = match self.no_data_value {
            Some(no_data) => Some(self.band(0)?.equals_value(no_data)),
            None => None,
        };
        Ok(())
    }

    pub fn has_data(&self) -> bool {
        self.bands.is_some()
    }

    pub fn bands(&self) -> Result<&[BandArray]> {
        self.bands
            .as_deref()
            .ok_or(RasterError::UninitializedData {
                method_name: "bands",
            })
    }

    pub fn band(&self, index: usize) -> Result<&BandArray> {
        let bands = self.bands()?;
        bands.get(index).ok_or(RasterError::BandIndexOutOfRange {
            index,
            num_bands: bands.len(),
        })
    }

    pub fn band_mut(&mut self, index: usize) -> Result<&mut BandArray> {
        let bands = self
            .bands
            .as_deref_mut()
            .ok_or(RasterError::UninitializedData {
                method_name: "band_mut",
            })?;
        let num_bands = bands.len();
        bands
            .get_mut(index)
            .ok_or(RasterError::BandIndexOutOfRange { index, num_bands })
    }

    /// Replace all bands.
    ///
    /// Every band must share one shape and one pixel type; the dataset's
    /// width, height, band count and pixel type are taken from them.
    /// A mask that no longer matches the new shape is dropped.
    pub fn set_bands(&mut self, bands: Vec<BandArray>) -> Result<()> {
        let first = bands.first().ok_or_else(|| {
            RasterError::InvalidOperand("a raster needs at least one band".to_string())
        })?;
        let (rows, cols) = first.shape();
        let pixel_type = first.pixel_type();
        if rows == 0 || cols == 0 {
            return Err(RasterError::InvalidOperand(format!(
                "band shape ({rows}, {cols}) has no cells"
            )));
        }
        for band in &bands[1..] {
            if band.shape() != (rows, cols) {
                return Err(RasterError::ShapeMismatch {
                    left: RasterShape {
                        num_bands: 1,
                        rows,
                        cols,
                    },
                    right: RasterShape {
                        num_bands: 1,
                        rows: band.rows(),
                        cols: band.cols(),
                    },
                });
            }
            if band.pixel_type() != pixel_type {
                return Err(RasterError::InvalidOperand(format!(
                    "bands mix pixel types {} and {}",
                    pixel_type,
                    band.pixel_type()
                )));
            }
        }
        if self.mask.as_ref().is_some_and(|m| m.dim() != (rows, cols)) {
            log::warn!("dropping mask that does not match new band shape ({rows}, {cols})");
            self.mask = None;
        }
        self.height_in_pixels = rows;
        self.width_in_pixels = cols;
        self.num_bands = bands.len();
        self.pixel_type = Some(pixel_type);
        self.bands = Some(bands);
        Ok(())
    }

    /// Take the bands out, leaving the dataset uninitialized.
    pub fn take_bands(&mut self) -> Option<Vec<BandArray>> {
        self.bands.take()
    }

    /// Smallest and largest finite values of band `index`, ignoring masked cells.
    pub fn min_max(&self, index: usize) -> Result<Option<(f64, f64)>> {
        self.band(index)?.min_max(self.mask.as_ref())
    }

    pub fn shape(&self) -> RasterShape {
        RasterShape {
            num_bands: self.num_bands,
            rows: self.height_in_pixels,
            cols: self.width_in_pixels,
        }
    }
}
