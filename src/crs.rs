//! Target coordinate reference system identifiers.
//!
//! A [`CrsSpec`] is what a user types to name a CRS: an EPSG code, a PROJ
//! string, a WKT definition, or `utm` for "the UTM zone of the data".

use std::fmt;
use std::str::FromStr;

use gdal::spatial_ref::{AxisMappingStrategy, SpatialRef};

use crate::error::{GeoError, Result};
use crate::model::{GeoPoint, ZoneCode};
use crate::zone;

const WKT_PREFIXES: [&str; 6] = [
    "GEOGCS[", "PROJCS[", "GEOGCRS[", "PROJCRS[", "COMPD_CS[", "COMPOUNDCRS[",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrsSpec {
    Epsg(u32),
    Proj(String),
    Wkt(String),
    /// UTM zone resolved from the location of the data.
    LocalUtm,
}

impl CrsSpec {
    /// Builds a GDAL spatial reference in traditional GIS (x, y) axis order.
    ///
    /// `LocalUtm` needs a `hint` point to resolve its zone.
    pub fn to_spatial_ref(&self, hint: Option<GeoPoint>) -> Result<SpatialRef> {
        let mut srs = match self {
            CrsSpec::Epsg(code) => SpatialRef::from_epsg(*code)?,
            CrsSpec::Proj(proj) => SpatialRef::from_proj4(proj)?,
            CrsSpec::Wkt(wkt) => SpatialRef::from_wkt(wkt)?,
            CrsSpec::LocalUtm => {
                let point = hint.ok_or_else(|| {
                    GeoError::InvalidArgument(
                        "a reference point is required to choose a UTM zone".to_string(),
                    )
                })?;
                let code = zone::resolve(point)?;
                tracing::info!("Selected {} for {}", code.description(), point);
                SpatialRef::from_epsg(code.epsg())?
            }
        };
        srs.set_axis_mapping_strategy(AxisMappingStrategy::TraditionalGisOrder);
        Ok(srs)
    }

    pub fn is_local_utm(&self) -> bool {
        matches!(self, CrsSpec::LocalUtm)
    }
}

impl From<ZoneCode> for CrsSpec {
    fn from(code: ZoneCode) -> Self {
        CrsSpec::Epsg(code.epsg())
    }
}

impl FromStr for CrsSpec {
    type Err = GeoError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let upper = trimmed.to_uppercase();

        if upper == "UTM" {
            return Ok(CrsSpec::LocalUtm);
        }
        if let Some(code) = upper.strip_prefix("EPSG:") {
            return code
                .trim()
                .parse::<u32>()
                .map(CrsSpec::Epsg)
                .map_err(|_| GeoError::InvalidArgument(format!("invalid EPSG code: {}", code)));
        }
        if let Ok(code) = trimmed.parse::<u32>() {
            return Ok(CrsSpec::Epsg(code));
        }
        if trimmed.starts_with("+proj=") {
            return Ok(CrsSpec::Proj(trimmed.to_string()));
        }
        if WKT_PREFIXES.iter().any(|p| upper.starts_with(p)) {
            return Ok(CrsSpec::Wkt(trimmed.to_string()));
        }

        Err(GeoError::InvalidArgument(format!(
            "unrecognised CRS: '{}'",
            trimmed
        )))
    }
}

impl fmt::Display for CrsSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrsSpec::Epsg(code) => write!(f, "EPSG:{}", code),
            CrsSpec::Proj(proj) => write!(f, "{}", proj),
            CrsSpec::Wkt(_) => write!(f, "WKT definition"),
            CrsSpec::LocalUtm => write!(f, "local UTM zone"),
        }
    }
}
