use std::ffi::{c_int, c_uint, c_void, CString};
use std::path::Path;
use std::ptr;

use bitflags::bitflags;
use gdal_sys::{CPLErr, GDALDataType, GDALDatasetH, GDALRWFlag, GDALRasterBandH};
use ndarray::Array2;
use num_complex::Complex32;

use crate::codec::{bands_for_save, FileCodec, RasterFormat};
use crate::errors::{RasterError, Result};
use crate::geo_transform::GeoTransform;
use crate::raster::{for_each_band, BandArray, PixelType, RasterDataset};
use crate::spatial_ref::{ProjectionRef, SpatialRef};
use crate::utils::{_last_cpl_err, _last_null_pointer_err, _path_to_c_string, _register_drivers, _string};

bitflags! {
    /// Subset of the `nOpenFlags` argument to `GDALOpenEx` used for loading.
    #[derive(Debug)]
    #[allow(clippy::assign_op_pattern)]
    pub(crate) struct GdalOpenFlags: c_uint {
        const GDAL_OF_READONLY = 0x00;
        const GDAL_OF_RASTER = 0x02;
        const GDAL_OF_VERBOSE_ERROR = 0x40;
    }
}

/// Cell types with a matching GDAL data type.
pub trait GdalType: Copy + Default {
    fn gdal_ordinal() -> GDALDataType::Type;
}

impl GdalType for u8 {
    fn gdal_ordinal() -> GDALDataType::Type {
        GDALDataType::GDT_Byte
    }
}

impl GdalType for u16 {
    fn gdal_ordinal() -> GDALDataType::Type {
        GDALDataType::GDT_UInt16
    }
}

impl GdalType for i16 {
    fn gdal_ordinal() -> GDALDataType::Type {
        GDALDataType::GDT_Int16
    }
}

impl GdalType for u32 {
    fn gdal_ordinal() -> GDALDataType::Type {
        GDALDataType::GDT_UInt32
    }
}

impl GdalType for i32 {
    fn gdal_ordinal() -> GDALDataType::Type {
        GDALDataType::GDT_Int32
    }
}

impl GdalType for f32 {
    fn gdal_ordinal() -> GDALDataType::Type {
        GDALDataType::GDT_Float32
    }
}

impl GdalType for f64 {
    fn gdal_ordinal() -> GDALDataType::Type {
        GDALDataType::GDT_Float64
    }
}

/// Two interleaved `f32`, which is the memory layout of [`Complex32`].
impl GdalType for Complex32 {
    fn gdal_ordinal() -> GDALDataType::Type {
        GDALDataType::GDT_CFloat32
    }
}

impl PixelType {
    pub fn to_gdal(&self) -> GDALDataType::Type {
        match self {
            PixelType::Byte => GDALDataType::GDT_Byte,
            PixelType::UInt16 => GDALDataType::GDT_UInt16,
            PixelType::Int16 => GDALDataType::GDT_Int16,
            PixelType::UInt32 => GDALDataType::GDT_UInt32,
            PixelType::Int32 => GDALDataType::GDT_Int32,
            PixelType::Float32 => GDALDataType::GDT_Float32,
            PixelType::Float64 => GDALDataType::GDT_Float64,
            PixelType::Complex64 => GDALDataType::GDT_CFloat32,
        }
    }

    /// Fails with [`RasterError::UnmappedPixelType`] for GDAL types without
    /// an array mapping (64-bit integers, complex integers, ...).
    pub fn from_gdal(gdal_type: GDALDataType::Type) -> Result<Self> {
        let pixel_type = match gdal_type {
            GDALDataType::GDT_Byte => PixelType::Byte,
            GDALDataType::GDT_UInt16 => PixelType::UInt16,
            GDALDataType::GDT_Int16 => PixelType::Int16,
            GDALDataType::GDT_UInt32 => PixelType::UInt32,
            GDALDataType::GDT_Int32 => PixelType::Int32,
            GDALDataType::GDT_Float32 => PixelType::Float32,
            GDALDataType::GDT_Float64 => PixelType::Float64,
            GDALDataType::GDT_CFloat32 => PixelType::Complex64,
            other => {
                let name = _string(unsafe { gdal_sys::GDALGetDataTypeName(other) });
                return Err(RasterError::UnmappedPixelType(name));
            }
        };
        Ok(pixel_type)
    }
}

/// Owned GDAL dataset handle, closed on drop.
#[derive(Debug)]
pub(crate) struct GdalDataset(GDALDatasetH);

impl Drop for GdalDataset {
    fn drop(&mut self) {
        unsafe {
            gdal_sys::GDALClose(self.0);
        }
    }
}

impl GdalDataset {
    /// Take ownership of `c_dataset`, failing on NULL.
    pub(crate) fn from_c_dataset(c_dataset: GDALDatasetH, method_name: &'static str) -> Result<Self> {
        if c_dataset.is_null() {
            return Err(_last_null_pointer_err(method_name));
        }
        Ok(GdalDataset(c_dataset))
    }

    pub(crate) fn open(path: &Path) -> Result<Self> {
        _register_drivers();
        let c_path = _path_to_c_string(path)?;
        let flags = GdalOpenFlags::GDAL_OF_READONLY
            | GdalOpenFlags::GDAL_OF_RASTER
            | GdalOpenFlags::GDAL_OF_VERBOSE_ERROR;
        let c_dataset = unsafe {
            gdal_sys::GDALOpenEx(
                c_path.as_ptr(),
                flags.bits(),
                ptr::null(),
                ptr::null(),
                ptr::null(),
            )
        };
        GdalDataset::from_c_dataset(c_dataset, "GDALOpenEx")
    }

    /// In-memory copy of `dataset` with `bands` as cell data.
    pub(crate) fn from_raster(dataset: &RasterDataset, bands: &[BandArray]) -> Result<Self> {
        _register_drivers();
        let first = bands.first().ok_or(RasterError::UninitializedData {
            method_name: "GdalDataset::from_raster",
        })?;
        let (rows, cols) = first.shape();
        let driver = driver_by_name("MEM")?;
        let c_name = CString::new("")?;
        let c_dataset = unsafe {
            gdal_sys::GDALCreate(
                driver,
                c_name.as_ptr(),
                cols as c_int,
                rows as c_int,
                bands.len() as c_int,
                first.pixel_type().to_gdal(),
                ptr::null_mut(),
            )
        };
        let mem = GdalDataset::from_c_dataset(c_dataset, "GDALCreate")?;

        let mut coefficients = dataset.geo_transform().to_coefficients();
        let rv = unsafe { gdal_sys::GDALSetGeoTransform(mem.0, coefficients.as_mut_ptr()) };
        if rv != CPLErr::CE_None {
            return Err(_last_cpl_err(rv));
        }
        if let Some(projection) = dataset.projection() {
            mem.set_projection(projection)?;
        }

        for (index, band) in bands.iter().enumerate() {
            let c_band = mem.band(index)?;
            for_each_band!(band, a => write_band(c_band, a)?, c => write_band(c_band, c)?);
            if let Some(no_data) = dataset.no_data_value() {
                let rv = unsafe { gdal_sys::GDALSetRasterNoDataValue(c_band, no_data) };
                if rv != CPLErr::CE_None {
                    return Err(_last_cpl_err(rv));
                }
            }
        }
        Ok(mem)
    }

    pub(crate) fn c_dataset(&self) -> GDALDatasetH {
        self.0
    }

    pub(crate) fn set_projection(&self, projection: &ProjectionRef) -> Result<()> {
        let wkt = SpatialRef::from_projection_ref(projection)?.to_wkt()?;
        let c_wkt = CString::new(wkt)?;
        let rv = unsafe { gdal_sys::GDALSetProjection(self.0, c_wkt.as_ptr()) };
        if rv != CPLErr::CE_None {
            return Err(_last_cpl_err(rv));
        }
        Ok(())
    }

    /// Zero-based band handle.
    pub(crate) fn band(&self, index: usize) -> Result<GDALRasterBandH> {
        let c_band = unsafe { gdal_sys::GDALGetRasterBand(self.0, index as c_int + 1) };
        if c_band.is_null() {
            return Err(_last_null_pointer_err("GDALGetRasterBand"));
        }
        Ok(c_band)
    }

    pub(crate) fn create_copy(&self, driver_name: &str, path: &Path) -> Result<GdalDataset> {
        let driver = driver_by_name(driver_name)?;
        let c_path = _path_to_c_string(path)?;
        let c_dataset = unsafe {
            gdal_sys::GDALCreateCopy(
                driver,
                c_path.as_ptr(),
                self.0,
                0,
                ptr::null_mut(),
                None,
                ptr::null_mut(),
            )
        };
        GdalDataset::from_c_dataset(c_dataset, "GDALCreateCopy")
    }

    /// Read every band plus georeference, projection and no-data value.
    pub(crate) fn to_raster(&self) -> Result<RasterDataset> {
        let (cols, rows, num_bands) = unsafe {
            (
                gdal_sys::GDALGetRasterXSize(self.0) as usize,
                gdal_sys::GDALGetRasterYSize(self.0) as usize,
                gdal_sys::GDALGetRasterCount(self.0) as usize,
            )
        };
        if num_bands == 0 {
            return Err(RasterError::InvalidOperand(
                "the dataset has no raster bands".to_string(),
            ));
        }

        let mut bands = Vec::with_capacity(num_bands);
        for index in 0..num_bands {
            let c_band = self.band(index)?;
            let pixel_type = PixelType::from_gdal(unsafe { gdal_sys::GDALGetRasterDataType(c_band) })?;
            let band: BandArray = match pixel_type {
                PixelType::Byte => read_band::<u8>(c_band, rows, cols)?.into(),
                PixelType::UInt16 => read_band::<u16>(c_band, rows, cols)?.into(),
                PixelType::Int16 => read_band::<i16>(c_band, rows, cols)?.into(),
                PixelType::UInt32 => read_band::<u32>(c_band, rows, cols)?.into(),
                PixelType::Int32 => read_band::<i32>(c_band, rows, cols)?.into(),
                PixelType::Float32 => read_band::<f32>(c_band, rows, cols)?.into(),
                PixelType::Float64 => read_band::<f64>(c_band, rows, cols)?.into(),
                PixelType::Complex64 => read_band::<Complex32>(c_band, rows, cols)?.into(),
            };
            bands.push(band);
        }

        let mut raster = RasterDataset::from_bands(bands, self.geo_transform()?)?;
        raster.set_projection(self.projection());
        let no_data = self.no_data_value(self.band(0)?);
        raster.set_no_data_value(no_data);
        raster.recompute_mask()?;
        Ok(raster)
    }

    fn geo_transform(&self) -> Result<GeoTransform> {
        let mut coefficients = [0.0; 6];
        let rv = unsafe { gdal_sys::GDALGetGeoTransform(self.0, coefficients.as_mut_ptr()) };
        if rv != CPLErr::CE_None {
            log::debug!("dataset has no geotransform, using unit pixels at the origin");
            unsafe { gdal_sys::CPLErrorReset() };
            return Ok(GeoTransform::default());
        }
        GeoTransform::from_coefficients(coefficients)
    }

    fn projection(&self) -> Option<ProjectionRef> {
        let wkt = _string(unsafe { gdal_sys::GDALGetProjectionRef(self.0) });
        if wkt.is_empty() {
            None
        } else {
            Some(ProjectionRef::Wkt(wkt))
        }
    }

    fn no_data_value(&self, c_band: GDALRasterBandH) -> Option<f64> {
        let mut success: c_int = 0;
        let value = unsafe { gdal_sys::GDALGetRasterNoDataValue(c_band, &mut success) };
        (success != 0).then_some(value)
    }
}

fn driver_by_name(name: &str) -> Result<gdal_sys::GDALDriverH> {
    _register_drivers();
    let c_name = CString::new(name)?;
    let c_driver = unsafe { gdal_sys::GDALGetDriverByName(c_name.as_ptr()) };
    if c_driver.is_null() {
        return Err(_last_null_pointer_err("GDALGetDriverByName"));
    }
    Ok(c_driver)
}

fn read_band<T: GdalType>(c_band: GDALRasterBandH, rows: usize, cols: usize) -> Result<Array2<T>> {
    let mut data: Vec<T> = vec![T::default(); rows * cols];
    let rv = unsafe {
        gdal_sys::GDALRasterIO(
            c_band,
            GDALRWFlag::GF_Read,
            0,
            0,
            cols as c_int,
            rows as c_int,
            data.as_mut_ptr() as *mut c_void,
            cols as c_int,
            rows as c_int,
            T::gdal_ordinal(),
            0,
            0,
        )
    };
    if rv != CPLErr::CE_None {
        return Err(_last_cpl_err(rv));
    }
    Ok(Array2::from_shape_vec((rows, cols), data)?)
}

fn write_band<T: GdalType>(c_band: GDALRasterBandH, array: &Array2<T>) -> Result<()> {
    let (rows, cols) = array.dim();
    let mut data: Vec<T> = array.iter().copied().collect();
    let rv = unsafe {
        gdal_sys::GDALRasterIO(
            c_band,
            GDALRWFlag::GF_Write,
            0,
            0,
            cols as c_int,
            rows as c_int,
            data.as_mut_ptr() as *mut c_void,
            cols as c_int,
            rows as c_int,
            T::gdal_ordinal(),
            0,
            0,
        )
    };
    if rv != CPLErr::CE_None {
        return Err(_last_cpl_err(rv));
    }
    Ok(())
}

/// [`FileCodec`] backed by the GDAL drivers.
///
/// Saving goes through an in-memory dataset copied to the target driver, so
/// formats without direct creation support (PNG, JPEG) are written as well.
#[derive(Clone, Copy, Debug, Default)]
pub struct GdalCodec;

impl GdalCodec {
    pub fn new() -> Self {
        GdalCodec
    }
}

impl FileCodec for GdalCodec {
    fn load(&self, path: &Path) -> Result<RasterDataset> {
        let raster = GdalDataset::open(path)?.to_raster()?;
        log::debug!(
            "loaded {} ({}x{}, {} band(s) of {:?})",
            path.display(),
            raster.width_in_pixels(),
            raster.height_in_pixels(),
            raster.num_bands(),
            raster.pixel_type()
        );
        Ok(raster)
    }

    fn save(&self, path: &Path, dataset: &RasterDataset) -> Result<()> {
        let bands = bands_for_save(dataset)?;
        let format = RasterFormat::from_path(path);
        let existed = path.exists();

        let result = GdalDataset::from_raster(dataset, &bands)
            .and_then(|mem| mem.create_copy(format.driver_name(), path))
            .map(drop);

        match &result {
            Ok(()) => log::debug!("saved {} as {format}", path.display()),
            Err(_) if !existed && path.exists() => {
                if let Err(e) = std::fs::remove_file(path) {
                    log::warn!("could not remove partial output {}: {e}", path.display());
                }
            }
            Err(_) => {}
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TempFixture;
    use ndarray::array;

    #[test]
    fn pixel_types_map_both_ways() {
        for &pixel_type in PixelType::available_types() {
            assert_eq!(PixelType::from_gdal(pixel_type.to_gdal()).unwrap(), pixel_type);
        }
        assert!(matches!(
            PixelType::from_gdal(GDALDataType::GDT_CInt16),
            Err(RasterError::UnmappedPixelType(name)) if name == "CInt16"
        ));
    }

    #[test]
    fn save_and_load_geotiff() {
        let fixture = TempFixture::empty("cells.tif");
        let mut raster = RasterDataset::from_bands(
            vec![array![[1i16, -2, 3], [4, -9999, 6]].into(), array![[0i16, 0, 0], [1, 1, 1]].into()],
            GeoTransform::new(500_000.0, 4_100_000.0, 30.0, -30.0),
        )
        .unwrap();
        raster.set_utm(12, false);
        raster.set_no_data_value(Some(-9999.0));
        raster.recompute_mask().unwrap();

        GdalCodec::new().save(fixture.path(), &raster).unwrap();
        let loaded = GdalCodec::new().load(fixture.path()).unwrap();

        assert_eq!(loaded.bands().unwrap(), raster.bands().unwrap());
        assert_eq!(loaded.geo_transform(), raster.geo_transform());
        assert_eq!(loaded.no_data_value(), Some(-9999.0));
        assert_eq!(loaded.mask(), raster.mask());
        assert!(matches!(loaded.projection(), Some(ProjectionRef::Wkt(wkt)) if wkt.contains("UTM")));
    }

    #[test]
    fn failed_save_leaves_no_file() {
        let fixture = TempFixture::empty("missing");
        let path = fixture.path().join("cells.tif");
        let raster =
            RasterDataset::from_bands(vec![array![[1u8]].into()], GeoTransform::default()).unwrap();
        assert!(GdalCodec::new().save(&path, &raster).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn missing_file() {
        assert!(matches!(
            GdalCodec::new().load(Path::new("/no/such/dir/raster.tif")),
            Err(RasterError::NullPointer { method_name: "GDALOpenEx", .. })
        ));
    }
}
