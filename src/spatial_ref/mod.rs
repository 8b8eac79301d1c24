//! Spatial reference descriptors and the projection collaborator.
//!
//! A [`ProjectionRef`] is carried opaquely by every [`crate::RasterDataset`];
//! only a [`ProjectionEngine`] interprets it. With the `gdal` feature enabled,
//! [`GdalProjectionEngine`] provides coordinate transformation and dataset
//! reprojection through OGR and the GDAL warper.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use crate::errors::{RasterError, Result};
use crate::raster::RasterDataset;

#[cfg(feature = "gdal")]
mod srs;
#[cfg(feature = "gdal")]
mod transform;

#[cfg(feature = "gdal")]
pub use srs::SpatialRef;
#[cfg(feature = "gdal")]
pub use transform::{CoordTransform, GdalProjectionEngine};

/// Geographic coordinate system used by [`ProjectionRef::utm`].
pub const DEFAULT_GEOGRAPHIC_CS: &str = "WGS84";

/// Description of a spatial reference system.
#[derive(Clone, Debug, PartialEq)]
pub enum ProjectionRef {
    /// Well known text, as read from a raster file.
    Wkt(String),
    /// A UTM zone on a well known geographic coordinate system
    /// (`WGS84`, `WGS72`, `NAD27` or `NAD83`).
    Utm {
        zone: u8,
        south: bool,
        geographic_cs: String,
    },
    /// An EPSG code.
    Epsg(u32),
    /// Named PROJ parameters.
    Proj(ProjParameters),
}

impl ProjectionRef {
    /// UTM `zone` on [`DEFAULT_GEOGRAPHIC_CS`].
    pub fn utm(zone: u8, south: bool) -> Self {
        ProjectionRef::Utm {
            zone,
            south,
            geographic_cs: DEFAULT_GEOGRAPHIC_CS.to_string(),
        }
    }

    /// Fails for UTM zones outside `1..=60` and empty descriptors.
    pub fn validate(&self) -> Result<()> {
        match self {
            ProjectionRef::Wkt(wkt) if wkt.trim().is_empty() => Err(RasterError::InvalidOperand(
                "empty WKT projection".to_string(),
            )),
            ProjectionRef::Utm { zone, .. } if !(1..=60).contains(zone) => Err(
                RasterError::InvalidOperand(format!("UTM zone {zone} is not in 1..=60")),
            ),
            ProjectionRef::Proj(params) if params.is_empty() => Err(RasterError::InvalidOperand(
                "PROJ parameters are empty".to_string(),
            )),
            _ => Ok(()),
        }
    }

    /// Text accepted by `OSRSetFromUserInput` for every variant.
    pub fn definition(&self) -> String {
        match self {
            ProjectionRef::Wkt(wkt) => wkt.clone(),
            ProjectionRef::Utm {
                zone,
                south,
                geographic_cs,
            } => {
                let south = if *south { " +south" } else { "" };
                let datum = match geographic_cs.to_ascii_uppercase().as_str() {
                    "WGS72" => "+ellps=WGS72".to_string(),
                    other => format!("+datum={other}"),
                };
                format!("+proj=utm +zone={zone}{south} {datum} +units=m +no_defs")
            }
            ProjectionRef::Epsg(code) => format!("EPSG:{code}"),
            ProjectionRef::Proj(params) => params.to_proj_string(),
        }
    }
}

impl Display for ProjectionRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ProjectionRef::Wkt(_) => f.write_str("WKT projection"),
            ProjectionRef::Utm {
                zone,
                south,
                geographic_cs,
            } => write!(
                f,
                "UTM zone {zone}{} ({geographic_cs})",
                if *south { "S" } else { "N" }
            ),
            ProjectionRef::Epsg(code) => write!(f, "EPSG:{code}"),
            ProjectionRef::Proj(params) => f.write_str(&params.to_proj_string()),
        }
    }
}

impl From<ProjParameters> for ProjectionRef {
    fn from(params: ProjParameters) -> Self {
        ProjectionRef::Proj(params)
    }
}

/// Key/value PROJ parameters, e.g. `proj=ortho`, `lat_0=40`.
///
/// `no_defs` is always emitted. A new pole latitude other than 90 turns the
/// projection into its oblique `ob_tran` form.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProjParameters {
    params: BTreeMap<String, String>,
    lat_new_pole: Option<f64>,
}

impl ProjParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key` to `value`; `value` is formatted with [`Display`].
    pub fn with_param(&mut self, key: &str, value: impl Display) -> &mut Self {
        self.params.insert(key.to_string(), value.to_string());
        self
    }

    /// Set a flag parameter such as `south` or `over`.
    pub fn with_flag(&mut self, key: &str) -> &mut Self {
        self.params.insert(key.to_string(), String::new());
        self
    }

    pub fn with_lat_new_pole(&mut self, lat_new_pole: f64) -> &mut Self {
        self.lat_new_pole = Some(lat_new_pole);
        self
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn lat_new_pole(&self) -> Option<f64> {
        self.lat_new_pole
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// `+key=value` pairs in key order.
    pub fn to_proj_string(&self) -> String {
        let mut params = self.params.clone();
        if let Some(lat) = self.lat_new_pole.filter(|lat| *lat != 90.0) {
            if let Some(proj) = params.remove("proj") {
                params.insert("o_proj".to_string(), proj);
            }
            params.insert("proj".to_string(), "ob_tran".to_string());
            params.insert("o_lat_p".to_string(), lat.to_string());
        }
        params.entry("no_defs".to_string()).or_default();

        // proj first, the rest in key order
        let mut parts = Vec::with_capacity(params.len());
        if let Some(proj) = params.remove("proj") {
            parts.push(format!("+proj={proj}"));
        }
        parts.extend(params.iter().map(|(key, value)| {
            if value.is_empty() {
                format!("+{key}")
            } else {
                format!("+{key}={value}")
            }
        }));
        parts.join(" ")
    }
}

/// Collaborator that owns all projection mathematics.
pub trait ProjectionEngine {
    /// Transform coordinate pairs in place from `source` to `target`.
    fn transform_coords(
        &self,
        source: &ProjectionRef,
        target: &ProjectionRef,
        xs: &mut [f64],
        ys: &mut [f64],
    ) -> Result<()>;

    /// Reproject `input` into `target`.
    ///
    /// The engine computes the output grid and georeference; `input` must
    /// carry a projection.
    fn reproject(&self, input: &RasterDataset, target: &ProjectionRef) -> Result<RasterDataset>;
}

/// Input checks shared by [`ProjectionEngine`] implementations, run before
/// anything is handed to the engine.
pub(crate) fn validate_coords(xs: &[f64], ys: &[f64]) -> Result<()> {
    if xs.len() != ys.len() {
        return Err(RasterError::InvalidOperand(format!(
            "coordinate arrays differ in length ({} x values, {} y values)",
            xs.len(),
            ys.len()
        )));
    }
    Ok(())
}

pub(crate) fn validate_reprojection<'a>(
    input: &'a RasterDataset,
    target: &ProjectionRef,
) -> Result<&'a ProjectionRef> {
    input.bands()?;
    target.validate()?;
    let source = input.projection().ok_or_else(|| {
        RasterError::InvalidOperand("the input raster has no projection".to_string())
    })?;
    source.validate()?;
    Ok(source)
}

#[cfg(test)]
mod tests;
