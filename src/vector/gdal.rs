use std::ffi::{c_int, CString};
use std::ptr;

use gdal_sys::{
    CPLErr, GDALDataType, OGRErr, OGRFeatureH, OGRFieldType, OGRGeometryH, OGRLayerH,
    OGRwkbGeometryType,
};
use geo_types::{Coord, LineString, Polygon};

use crate::codec::{bands_for_save, GdalDataset};
use crate::errors::{RasterError, Result};
use crate::raster::{PixelType, RasterDataset};
use crate::spatial_ref::SpatialRef;
use crate::utils::{_last_cpl_err, _last_null_pointer_err, _register_drivers};
use crate::vector::{validate_polygonize, PolygonFeature, PolygonLayer, VectorGeometry, VALUE_FIELD};

/// Feature read from a layer, destroyed on drop.
struct Feature(OGRFeatureH);

impl Drop for Feature {
    fn drop(&mut self) {
        unsafe { gdal_sys::OGR_F_Destroy(self.0) };
    }
}

/// [`VectorGeometry`] backed by `GDALPolygonize`.
///
/// Integer bands are traced with integer values; floating point bands are
/// traced with `GDALFPolygonize` and keep their fractional values.
#[derive(Clone, Copy, Debug, Default)]
pub struct GdalVectorGeometry;

impl GdalVectorGeometry {
    pub fn new() -> Self {
        GdalVectorGeometry
    }
}

impl VectorGeometry for GdalVectorGeometry {
    fn polygonize(&self, input: &RasterDataset) -> Result<PolygonLayer> {
        validate_polygonize(input)?;
        let pixel_type = input.band(0)?.pixel_type();
        let bands = bands_for_save(input)?;
        let raster = GdalDataset::from_raster(input, &bands)?;
        let vector = in_memory_vector_dataset()?;

        let srs = input
            .projection()
            .map(SpatialRef::from_projection_ref)
            .transpose()?;
        let c_name = CString::new("polygons")?;
        let c_layer = unsafe {
            gdal_sys::GDALDatasetCreateLayer(
                vector.c_dataset(),
                c_name.as_ptr(),
                srs.as_ref().map_or(ptr::null_mut(), |s| s.to_c_hsrs()),
                OGRwkbGeometryType::wkbPolygon,
                ptr::null_mut(),
            )
        };
        if c_layer.is_null() {
            return Err(_last_null_pointer_err("GDALDatasetCreateLayer"));
        }
        create_value_field(c_layer, pixel_type)?;

        let c_band = raster.band(0)?;
        let rv = unsafe {
            if pixel_type.is_floating() {
                gdal_sys::GDALFPolygonize(
                    c_band,
                    ptr::null_mut(),
                    c_layer,
                    0,
                    ptr::null_mut(),
                    None,
                    ptr::null_mut(),
                )
            } else {
                gdal_sys::GDALPolygonize(
                    c_band,
                    ptr::null_mut(),
                    c_layer,
                    0,
                    ptr::null_mut(),
                    None,
                    ptr::null_mut(),
                )
            }
        };
        if rv != CPLErr::CE_None {
            return Err(_last_cpl_err(rv));
        }

        let features = read_features(c_layer)?;
        log::debug!(
            "polygonized {}x{} raster into {} feature(s)",
            input.width_in_pixels(),
            input.height_in_pixels(),
            features.len()
        );
        Ok(PolygonLayer {
            projection: input.projection().cloned(),
            features,
        })
    }
}

/// Vector-only dataset from the OGR "Memory" driver, or "MEM" where the
/// former has been folded into it.
fn in_memory_vector_dataset() -> Result<GdalDataset> {
    _register_drivers();
    let c_driver = ["Memory", "MEM"]
        .into_iter()
        .filter_map(|name| CString::new(name).ok())
        .map(|c_name| unsafe { gdal_sys::GDALGetDriverByName(c_name.as_ptr()) })
        .find(|driver| !driver.is_null())
        .ok_or_else(|| _last_null_pointer_err("GDALGetDriverByName"))?;
    let c_name = CString::new("polygons")?;
    let c_dataset = unsafe {
        gdal_sys::GDALCreate(
            c_driver,
            c_name.as_ptr(),
            0,
            0,
            0,
            GDALDataType::GDT_Unknown,
            ptr::null_mut(),
        )
    };
    GdalDataset::from_c_dataset(c_dataset, "GDALCreate")
}

fn create_value_field(c_layer: OGRLayerH, pixel_type: PixelType) -> Result<()> {
    let field_type = if pixel_type.is_floating() {
        OGRFieldType::OFTReal
    } else {
        OGRFieldType::OFTInteger
    };
    let c_name = CString::new(VALUE_FIELD)?;
    let rv = unsafe {
        let c_field = gdal_sys::OGR_Fld_Create(c_name.as_ptr(), field_type);
        let rv = gdal_sys::OGR_L_CreateField(c_layer, c_field, 1);
        gdal_sys::OGR_Fld_Destroy(c_field);
        rv
    };
    if rv != OGRErr::OGRERR_NONE {
        return Err(RasterError::OgrError {
            err: rv,
            method_name: "OGR_L_CreateField",
        });
    }
    Ok(())
}

fn read_features(c_layer: OGRLayerH) -> Result<Vec<PolygonFeature>> {
    let mut features = Vec::new();
    unsafe { gdal_sys::OGR_L_ResetReading(c_layer) };
    loop {
        let c_feature = unsafe { gdal_sys::OGR_L_GetNextFeature(c_layer) };
        if c_feature.is_null() {
            break;
        }
        let feature = Feature(c_feature);
        let c_geometry = unsafe { gdal_sys::OGR_F_GetGeometryRef(feature.0) };
        if c_geometry.is_null() {
            continue;
        }
        let value = unsafe { gdal_sys::OGR_F_GetFieldAsDouble(feature.0, 0) };
        match to_polygon(c_geometry) {
            Some(geometry) => features.push(PolygonFeature { geometry, value }),
            None => log::warn!("skipping non-polygon feature with value {value}"),
        }
    }
    Ok(features)
}

fn to_polygon(c_geometry: OGRGeometryH) -> Option<Polygon<f64>> {
    let geometry_type = unsafe { gdal_sys::OGR_G_GetGeometryType(c_geometry) };
    if geometry_type != OGRwkbGeometryType::wkbPolygon
        && geometry_type != OGRwkbGeometryType::wkbPolygon25D
    {
        return None;
    }
    let ring_count = unsafe { gdal_sys::OGR_G_GetGeometryCount(c_geometry) };
    let ring = |n: c_int| ring_to_line_string(unsafe { gdal_sys::OGR_G_GetGeometryRef(c_geometry, n) });
    if ring_count < 1 {
        return None;
    }
    let outer = ring(0);
    let holes = (1..ring_count).map(ring).collect();
    Some(Polygon::new(outer, holes))
}

fn ring_to_line_string(c_ring: OGRGeometryH) -> LineString<f64> {
    let point_count = unsafe { gdal_sys::OGR_G_GetPointCount(c_ring) };
    let coords = (0..point_count)
        .map(|i| {
            let (mut x, mut y, mut z) = (0.0, 0.0, 0.0);
            unsafe { gdal_sys::OGR_G_GetPoint(c_ring, i, &mut x, &mut y, &mut z) };
            Coord { x, y }
        })
        .collect();
    LineString(coords)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo_transform::GeoTransform;
    use geo_types::Rect;
    use ndarray::array;

    fn area(polygon: &Polygon<f64>) -> f64 {
        // Shoelace over the exterior ring minus the holes.
        let ring_area = |ring: &LineString<f64>| {
            ring.0
                .windows(2)
                .map(|w| w[0].x * w[1].y - w[1].x * w[0].y)
                .sum::<f64>()
                .abs()
                / 2.0
        };
        ring_area(polygon.exterior()) - polygon.interiors().iter().map(ring_area).sum::<f64>()
    }

    #[test]
    fn polygonize_integer_band() {
        let band = array![[1u8, 1, 2], [1, 1, 2], [3, 3, 3]];
        let mut raster =
            RasterDataset::from_bands(vec![band.into()], GeoTransform::new(10.0, 20.0, 1.0, -1.0))
                .unwrap();
        raster.set_utm(33, false);
        let layer = GdalVectorGeometry::new().polygonize(&raster).unwrap();

        assert_eq!(layer.len(), 3);
        assert_eq!(layer.projection, raster.projection().cloned());
        let ones: Vec<_> = layer.with_value(1.0).collect();
        assert_eq!(ones.len(), 1);
        assert_eq!(area(&ones[0].geometry), 4.0);
        let rect: Rect<f64> = raster.bounds().into();
        assert_eq!(area(&layer.with_value(3.0).next().unwrap().geometry), 3.0);
        assert!(ones[0]
            .geometry
            .exterior()
            .coords()
            .all(|c| c.x >= rect.min().x && c.y <= rect.max().y));
    }

    #[test]
    fn polygonize_float_band_keeps_fractions() {
        let band = array![[0.5f32, 0.5], [2.25, 0.5]];
        let raster =
            RasterDataset::from_bands(vec![band.into()], GeoTransform::default()).unwrap();
        let layer = GdalVectorGeometry::new().polygonize(&raster).unwrap();
        assert_eq!(layer.with_value(0.5).count(), 1);
        assert_eq!(layer.with_value(2.25).count(), 1);
        assert!(layer.projection.is_none());
    }
}
