use std::ffi::{c_int, CString};
use std::ptr;

use gdal_sys::{CPLErr, GDALResampleAlg, OGRCoordinateTransformationH};

use crate::codec::{bands_for_save, GdalDataset};
use crate::errors::{RasterError, Result};
use crate::raster::{Interpolation, RasterDataset};
use crate::spatial_ref::{
    validate_coords, validate_reprojection, ProjectionEngine, ProjectionRef, SpatialRef,
};
use crate::utils::{_last_cpl_err, _last_null_pointer_err};

/// Coordinate transformation between two [`SpatialRef`]s.
#[derive(Debug)]
pub struct CoordTransform {
    inner: OGRCoordinateTransformationH,
}

impl Drop for CoordTransform {
    fn drop(&mut self) {
        unsafe { gdal_sys::OCTDestroyCoordinateTransformation(self.inner) };
    }
}

impl CoordTransform {
    pub fn new(source: &SpatialRef, target: &SpatialRef) -> Result<CoordTransform> {
        let c_obj = unsafe {
            gdal_sys::OCTNewCoordinateTransformation(source.to_c_hsrs(), target.to_c_hsrs())
        };
        if c_obj.is_null() {
            return Err(_last_null_pointer_err("OCTNewCoordinateTransformation"));
        }
        Ok(CoordTransform { inner: c_obj })
    }

    /// Transform the points in place. `x` and `y` must have equal lengths.
    pub fn transform_coords(&self, x: &mut [f64], y: &mut [f64]) -> Result<()> {
        validate_coords(x, y)?;
        let ok = unsafe {
            gdal_sys::OCTTransform(
                self.inner,
                x.len() as c_int,
                x.as_mut_ptr(),
                y.as_mut_ptr(),
                ptr::null_mut(),
            ) == 1
        };
        if ok {
            Ok(())
        } else {
            Err(_last_cpl_err(CPLErr::CE_Failure))
        }
    }
}

/// [`ProjectionEngine`] backed by OGR and the GDAL warper.
///
/// Rasters are reprojected through an automatically sized warped VRT; the
/// warper picks the output grid and georeference.
#[derive(Clone, Debug)]
pub struct GdalProjectionEngine {
    interpolation: Interpolation,
    max_error: f64,
}

impl Default for GdalProjectionEngine {
    fn default() -> Self {
        GdalProjectionEngine::new()
    }
}

impl GdalProjectionEngine {
    /// Nearest neighbour, exact transformation.
    pub fn new() -> Self {
        GdalProjectionEngine {
            interpolation: Interpolation::Nearest,
            max_error: 0.0,
        }
    }

    pub fn with_interpolation(&mut self, interpolation: Interpolation) -> &mut Self {
        self.interpolation = interpolation;
        self
    }

    /// Maximum error in pixels of the approximate transformer; 0 is exact.
    pub fn with_max_error(&mut self, max_error: f64) -> &mut Self {
        self.max_error = max_error;
        self
    }

    pub fn interpolation(&self) -> Interpolation {
        self.interpolation
    }

    pub fn max_error(&self) -> f64 {
        self.max_error
    }

    fn resample_alg(&self) -> GDALResampleAlg::Type {
        match self.interpolation {
            Interpolation::Nearest => GDALResampleAlg::GRA_NearestNeighbour,
            Interpolation::Bilinear => GDALResampleAlg::GRA_Bilinear,
            Interpolation::Cubic => GDALResampleAlg::GRA_Cubic,
        }
    }
}

impl ProjectionEngine for GdalProjectionEngine {
    fn transform_coords(
        &self,
        source: &ProjectionRef,
        target: &ProjectionRef,
        xs: &mut [f64],
        ys: &mut [f64],
    ) -> Result<()> {
        validate_coords(xs, ys)?;
        let transform = CoordTransform::new(
            &SpatialRef::from_projection_ref(source)?,
            &SpatialRef::from_projection_ref(target)?,
        )?;
        transform.transform_coords(xs, ys)
    }

    fn reproject(&self, input: &RasterDataset, target: &ProjectionRef) -> Result<RasterDataset> {
        let source = validate_reprojection(input, target)?;
        if !self.max_error.is_finite() || self.max_error < 0.0 {
            return Err(RasterError::InvalidOperand(format!(
                "maximum warp error {} must be finite and non-negative",
                self.max_error
            )));
        }
        let c_source_wkt = CString::new(SpatialRef::from_projection_ref(source)?.to_wkt()?)?;
        let c_target_wkt = CString::new(SpatialRef::from_projection_ref(target)?.to_wkt()?)?;

        let bands = bands_for_save(input)?;
        let src = GdalDataset::from_raster(input, &bands)?;
        let c_vrt = unsafe {
            gdal_sys::GDALAutoCreateWarpedVRT(
                src.c_dataset(),
                c_source_wkt.as_ptr(),
                c_target_wkt.as_ptr(),
                self.resample_alg(),
                self.max_error,
                ptr::null(),
            )
        };
        // The VRT references `src` and is dropped first.
        let vrt = GdalDataset::from_c_dataset(c_vrt, "GDALAutoCreateWarpedVRT")?;
        let mut output = vrt.to_raster()?;
        output.set_projection(Some(target.clone()));
        log::debug!(
            "reprojected {}x{} raster from {source} to {target}: {}x{}",
            input.width_in_pixels(),
            input.height_in_pixels(),
            output.width_in_pixels(),
            output.height_in_pixels()
        );
        Ok(output)
    }
}
