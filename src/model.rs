use std::fmt;
use std::str::FromStr;

use crate::error::{GeoError, Result};

const NORTH_BASE: u32 = 32600;
const SOUTH_BASE: u32 = 32700;

/// A WGS84 longitude/latitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lon: f64,
    pub lat: f64,
}

impl GeoPoint {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Fails unless longitude is in [-180, 180] and latitude in [-90, 90].
    pub fn validate(&self) -> Result<()> {
        if !(-180.0..=180.0).contains(&self.lon) {
            return Err(GeoError::InvalidArgument(format!(
                "longitude {} is outside [-180, 180]",
                self.lon
            )));
        }
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(GeoError::InvalidArgument(format!(
                "latitude {} is outside [-90, 90]",
                self.lat
            )));
        }
        Ok(())
    }
}

impl From<(f64, f64)> for GeoPoint {
    fn from((lon, lat): (f64, f64)) -> Self {
        Self::new(lon, lat)
    }
}

impl FromStr for GeoPoint {
    type Err = GeoError;

    /// Parses `"lon,lat"`.
    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split(',').collect();
        if parts.len() != 2 {
            return Err(GeoError::InvalidArgument(format!(
                "expected 'lon,lat', got '{}'",
                s
            )));
        }

        let lon = parts[0]
            .trim()
            .parse::<f64>()
            .map_err(|_| GeoError::InvalidArgument(format!("invalid longitude '{}'", parts[0])))?;
        let lat = parts[1]
            .trim()
            .parse::<f64>()
            .map_err(|_| GeoError::InvalidArgument(format!("invalid latitude '{}'", parts[1])))?;

        Ok(Self::new(lon, lat))
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lon, self.lat)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hemisphere {
    North,
    South,
}

impl Hemisphere {
    pub fn suffix(&self) -> char {
        match self {
            Hemisphere::North => 'N',
            Hemisphere::South => 'S',
        }
    }
}

/// EPSG code of a WGS84 UTM zone: 32601..=32660 north, 32701..=32760 south.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ZoneCode(u32);

impl ZoneCode {
    pub(crate) fn new(zone: u8, hemisphere: Hemisphere) -> Self {
        debug_assert!((1..=60).contains(&zone));
        let base = match hemisphere {
            Hemisphere::North => NORTH_BASE,
            Hemisphere::South => SOUTH_BASE,
        };
        ZoneCode(base + zone as u32)
    }

    pub fn from_epsg(epsg: u32) -> Result<Self> {
        match epsg {
            32601..=32660 | 32701..=32760 => Ok(ZoneCode(epsg)),
            _ => Err(GeoError::InvalidArgument(format!(
                "EPSG:{} is not a WGS84 UTM zone",
                epsg
            ))),
        }
    }

    pub fn epsg(&self) -> u32 {
        self.0
    }

    pub fn zone(&self) -> u8 {
        (self.0 % 100) as u8
    }

    pub fn hemisphere(&self) -> Hemisphere {
        if self.0 < SOUTH_BASE {
            Hemisphere::North
        } else {
            Hemisphere::South
        }
    }

    pub fn proj_string(&self) -> String {
        let south = match self.hemisphere() {
            Hemisphere::North => "",
            Hemisphere::South => " +south",
        };
        format!(
            "+proj=utm +zone={}{} +datum=WGS84 +units=m +no_defs",
            self.zone(),
            south
        )
    }

    /// e.g. "UTM zone 30N (EPSG:32630)"
    pub fn description(&self) -> String {
        format!(
            "UTM zone {}{} (EPSG:{})",
            self.zone(),
            self.hemisphere().suffix(),
            self.0
        )
    }
}

impl fmt::Display for ZoneCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.0)
    }
}

impl From<ZoneCode> for u32 {
    fn from(code: ZoneCode) -> Self {
        code.0
    }
}
