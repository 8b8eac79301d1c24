use std::ffi::{c_char, c_int, CString};
use std::ptr;

use gdal_sys::{OGRErr, OGRSpatialReferenceH, OSRAxisMappingStrategy};

use crate::errors::{RasterError, Result};
use crate::spatial_ref::ProjectionRef;
use crate::utils::{_last_null_pointer_err, _string};

/// Owned OGR spatial reference.
///
/// Every instance uses the traditional GIS axis order (x = easting or
/// longitude, y = northing or latitude), whatever the authority says.
#[derive(Debug)]
pub struct SpatialRef(OGRSpatialReferenceH);

impl Drop for SpatialRef {
    fn drop(&mut self) {
        unsafe { gdal_sys::OSRRelease(self.0) };
        self.0 = ptr::null_mut();
    }
}

impl SpatialRef {
    fn empty() -> Result<SpatialRef> {
        let c_obj = unsafe { gdal_sys::OSRNewSpatialReference(ptr::null()) };
        if c_obj.is_null() {
            return Err(_last_null_pointer_err("OSRNewSpatialReference"));
        }
        let srs = SpatialRef(c_obj);
        unsafe {
            gdal_sys::OSRSetAxisMappingStrategy(
                srs.0,
                OSRAxisMappingStrategy::OAMS_TRADITIONAL_GIS_ORDER,
            )
        };
        Ok(srs)
    }

    /// Anything `OSRSetFromUserInput` understands: WKT, `EPSG:n`, PROJ strings.
    pub fn from_definition(definition: &str) -> Result<SpatialRef> {
        let srs = SpatialRef::empty()?;
        let c_definition = CString::new(definition)?;
        let rv = unsafe { gdal_sys::OSRSetFromUserInput(srs.0, c_definition.as_ptr()) };
        if rv != OGRErr::OGRERR_NONE {
            return Err(RasterError::OgrError {
                err: rv,
                method_name: "OSRSetFromUserInput",
            });
        }
        Ok(srs)
    }

    pub fn from_epsg(epsg_code: u32) -> Result<SpatialRef> {
        let srs = SpatialRef::empty()?;
        let rv = unsafe { gdal_sys::OSRImportFromEPSG(srs.0, epsg_code as c_int) };
        if rv != OGRErr::OGRERR_NONE {
            return Err(RasterError::OgrError {
                err: rv,
                method_name: "OSRImportFromEPSG",
            });
        }
        Ok(srs)
    }

    /// UTM `zone` over the well known geographic coordinate system `geographic_cs`.
    pub fn from_utm(zone: u8, south: bool, geographic_cs: &str) -> Result<SpatialRef> {
        let srs = SpatialRef::empty()?;
        let c_gcs = CString::new(geographic_cs)?;
        let rv = unsafe { gdal_sys::OSRSetWellKnownGeogCS(srs.0, c_gcs.as_ptr()) };
        if rv != OGRErr::OGRERR_NONE {
            return Err(RasterError::OgrError {
                err: rv,
                method_name: "OSRSetWellKnownGeogCS",
            });
        }
        let north = c_int::from(!south);
        let rv = unsafe { gdal_sys::OSRSetUTM(srs.0, zone as c_int, north) };
        if rv != OGRErr::OGRERR_NONE {
            return Err(RasterError::OgrError {
                err: rv,
                method_name: "OSRSetUTM",
            });
        }
        Ok(srs)
    }

    pub fn from_projection_ref(projection: &ProjectionRef) -> Result<SpatialRef> {
        projection.validate()?;
        match projection {
            ProjectionRef::Epsg(code) => SpatialRef::from_epsg(*code),
            ProjectionRef::Utm {
                zone,
                south,
                geographic_cs,
            } => SpatialRef::from_utm(*zone, *south, geographic_cs),
            other => SpatialRef::from_definition(&other.definition()),
        }
    }

    pub fn to_wkt(&self) -> Result<String> {
        let mut c_wkt: *mut c_char = ptr::null_mut();
        let rv = unsafe { gdal_sys::OSRExportToWkt(self.0, &mut c_wkt) };
        let res = if rv != OGRErr::OGRERR_NONE {
            Err(RasterError::OgrError {
                err: rv,
                method_name: "OSRExportToWkt",
            })
        } else {
            Ok(_string(c_wkt))
        };
        unsafe { gdal_sys::VSIFree(c_wkt.cast()) };
        res
    }

    pub(crate) fn to_c_hsrs(&self) -> OGRSpatialReferenceH {
        self.0
    }
}
