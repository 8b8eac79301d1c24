//! Reading and writing raster files.
//!
//! The crate does not decode any file format itself. A [`FileCodec`] does,
//! and with the `gdal` feature [`GdalCodec`] is provided. The driver is picked
//! from the file extension through [`RasterFormat`].

use std::fmt::{Display, Formatter};
use std::path::Path;

use crate::errors::Result;
use crate::raster::{BandArray, RasterDataset};

#[cfg(feature = "gdal")]
mod gdal;

#[cfg(feature = "gdal")]
pub use gdal::{GdalCodec, GdalType};
#[cfg(feature = "gdal")]
pub(crate) use gdal::GdalDataset;

/// Loads and saves [`RasterDataset`]s.
pub trait FileCodec {
    /// Read every band, the georeference, the projection and the no-data
    /// value; the mask is derived from band 0.
    fn load(&self, path: &Path) -> Result<RasterDataset>;

    /// Write `dataset` in the format implied by the extension of `path`.
    ///
    /// Masked cells are written as the no-data value.
    fn save(&self, path: &Path, dataset: &RasterDataset) -> Result<()>;
}

/// Output formats, keyed by file extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RasterFormat {
    GeoTiff,
    Png,
    Jpeg,
    AsciiGrid,
    ErdasImagine,
}

impl RasterFormat {
    /// Format for `path`'s extension, case-insensitively; GeoTIFF for
    /// unknown or missing extensions.
    pub fn from_path(path: &Path) -> Self {
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase());
        match extension.as_deref() {
            Some("png") => RasterFormat::Png,
            Some("jpg") | Some("jpeg") => RasterFormat::Jpeg,
            Some("asc") => RasterFormat::AsciiGrid,
            Some("img") => RasterFormat::ErdasImagine,
            _ => RasterFormat::GeoTiff,
        }
    }

    /// Short name of the GDAL driver writing this format.
    pub fn driver_name(&self) -> &'static str {
        match self {
            RasterFormat::GeoTiff => "GTiff",
            RasterFormat::Png => "PNG",
            RasterFormat::Jpeg => "JPEG",
            RasterFormat::AsciiGrid => "AAIGrid",
            RasterFormat::ErdasImagine => "HFA",
        }
    }
}

impl Display for RasterFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.driver_name())
    }
}

/// Bands as they should be written: masked cells replaced by the no-data value.
pub(crate) fn bands_for_save(dataset: &RasterDataset) -> Result<Vec<BandArray>> {
    dataset.geo_transform().validate()?;
    let bands = dataset.bands()?;
    match (dataset.no_data_value(), dataset.mask()) {
        (Some(no_data), Some(mask)) => Ok(bands
            .iter()
            .map(|band| band.fill_where(mask, no_data))
            .collect()),
        _ => Ok(bands.to_vec()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::RasterError;
    use crate::GeoTransform;
    use ndarray::array;

    #[test]
    fn format_from_extension() {
        let cases = [
            ("dem.tif", RasterFormat::GeoTiff, "GTiff"),
            ("dem.TIF", RasterFormat::GeoTiff, "GTiff"),
            ("image.png", RasterFormat::Png, "PNG"),
            ("photo.jpg", RasterFormat::Jpeg, "JPEG"),
            ("grid.asc", RasterFormat::AsciiGrid, "AAIGrid"),
            ("scene.img", RasterFormat::ErdasImagine, "HFA"),
            ("no_extension", RasterFormat::GeoTiff, "GTiff"),
            ("archive.zip", RasterFormat::GeoTiff, "GTiff"),
        ];
        for (name, format, driver) in cases {
            assert_eq!(RasterFormat::from_path(Path::new(name)), format, "{name}");
            assert_eq!(format.driver_name(), driver);
        }
    }

    #[test]
    fn masked_cells_are_written_as_no_data() {
        let band: BandArray = array![[1i16, 2], [3, 4]].into();
        let mut raster = RasterDataset::from_bands(vec![band], GeoTransform::default()).unwrap();
        raster.set_no_data_value(Some(-1.0));
        raster
            .set_mask(Some(array![[false, true], [false, false]]))
            .unwrap();
        let bands = bands_for_save(&raster).unwrap();
        assert_eq!(bands[0].as_array::<i16>().unwrap(), &array![[1i16, -1], [3, 4]]);

        // The caller's bands stay untouched.
        assert_eq!(raster.band(0).unwrap().get_f64(0, 1), Some(2.0));
    }

    #[test]
    fn nothing_to_save() {
        assert!(matches!(
            bands_for_save(&RasterDataset::new()),
            Err(RasterError::UninitializedData { .. })
        ));
    }
}
