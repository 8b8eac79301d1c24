//! Raster to vector conversion.
//!
//! Polygonizing groups each connected area of equal cells of a single-band
//! raster into one polygon carrying the cell value. The crate does not trace
//! polygons itself; a [`VectorGeometry`] does, and with the `gdal` feature
//! [`GdalVectorGeometry`] is provided.

use geo_types::Polygon;

use crate::errors::{RasterError, Result};
use crate::raster::RasterDataset;
use crate::spatial_ref::ProjectionRef;

#[cfg(feature = "gdal")]
mod gdal;

#[cfg(feature = "gdal")]
pub use self::gdal::GdalVectorGeometry;

/// Name of the attribute holding the band value of each polygon.
pub const VALUE_FIELD: &str = "band1";

/// One polygon and the value of the cells it covers.
#[derive(Clone, Debug, PartialEq)]
pub struct PolygonFeature {
    pub geometry: Polygon<f64>,
    pub value: f64,
}

/// Polygons traced from a raster, in the raster's reference coordinates.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PolygonLayer {
    pub projection: Option<ProjectionRef>,
    pub features: Vec<PolygonFeature>,
}

impl PolygonLayer {
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Features whose value equals `value`.
    pub fn with_value(&self, value: f64) -> impl Iterator<Item = &PolygonFeature> {
        self.features.iter().filter(move |f| f.value == value)
    }
}

/// Turns rasters into vector features.
pub trait VectorGeometry {
    /// Trace every connected area of equal cells of a single-band raster.
    fn polygonize(&self, input: &RasterDataset) -> Result<PolygonLayer>;
}

/// Polygonizing needs exactly one populated, real-valued band.
pub(crate) fn validate_polygonize(input: &RasterDataset) -> Result<()> {
    let bands = input.bands()?;
    if bands.len() != 1 {
        return Err(RasterError::InvalidOperand(format!(
            "polygonize needs a single band raster, got {} bands",
            bands.len()
        )));
    }
    if bands[0].pixel_type().is_complex() {
        return Err(RasterError::unsupported(
            "polygonize",
            "complex cells cannot be grouped by value",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::BandArray;
    use crate::GeoTransform;
    use geo_types::polygon;
    use ndarray::{array, Array2};
    use num_complex::Complex32;

    #[test]
    fn polygonize_inputs_are_checked() {
        assert!(matches!(
            validate_polygonize(&RasterDataset::new()),
            Err(RasterError::UninitializedData { .. })
        ));

        let bands: Vec<BandArray> = vec![array![[1u8]].into(), array![[2u8]].into()];
        let two_bands = RasterDataset::from_bands(bands, GeoTransform::default()).unwrap();
        assert!(matches!(
            validate_polygonize(&two_bands),
            Err(RasterError::InvalidOperand(_))
        ));

        let complex = RasterDataset::from_bands(
            vec![Array2::from_elem((2, 2), Complex32::new(0.0, 1.0)).into()],
            GeoTransform::default(),
        )
        .unwrap();
        assert!(matches!(
            validate_polygonize(&complex),
            Err(RasterError::UnsupportedOperation { .. })
        ));

        let single = RasterDataset::from_bands(vec![array![[1i16]].into()], GeoTransform::default())
            .unwrap();
        assert!(validate_polygonize(&single).is_ok());
    }

    #[test]
    fn select_by_value() {
        let square = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: -1.0), (x: 0.0, y: -1.0)];
        let layer = PolygonLayer {
            projection: None,
            features: vec![
                PolygonFeature {
                    geometry: square.clone(),
                    value: 1.0,
                },
                PolygonFeature {
                    geometry: square,
                    value: 2.0,
                },
            ],
        };
        assert_eq!(layer.len(), 2);
        assert_eq!(layer.with_value(2.0).count(), 1);
        assert_eq!(layer.with_value(3.0).count(), 0);
    }
}
