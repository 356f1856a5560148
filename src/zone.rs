use rayon::prelude::*;

use crate::error::{GeoError, Result};
use crate::model::{GeoPoint, Hemisphere, ZoneCode};

const ZONE_WIDTH: f64 = 6.0;
const ZONE_COUNT: i64 = 60;

/// UTM zone number (1..=60) for a longitude in [-180, 180].
///
/// 180 wraps around to zone 1, the same zone as -180.
///
/// The zone is computed in `f64`, so a longitude within an ulp or so below a
/// zone edge can round up onto the edge: 5.999999999999999 gives zone 32 and
/// 179.99999999999997 gives zone 1.
pub fn zone_number(lon: f64) -> Result<u8> {
    if !(-180.0..=180.0).contains(&lon) {
        return Err(GeoError::InvalidArgument(format!(
            "longitude {} is outside [-180, 180]",
            lon
        )));
    }

    let index = ((lon + 180.0) / ZONE_WIDTH).floor() as i64;
    Ok((index.rem_euclid(ZONE_COUNT) + 1) as u8)
}

/// Resolves the WGS84 UTM zone containing `point`.
///
/// The equator (latitude 0) is assigned to the northern range.
pub fn resolve(point: GeoPoint) -> Result<ZoneCode> {
    point.validate()?;

    let zone = zone_number(point.lon)?;
    let hemisphere = if point.lat >= 0.0 {
        Hemisphere::North
    } else {
        Hemisphere::South
    };

    Ok(ZoneCode::new(zone, hemisphere))
}

pub fn resolve_lon_lat(lon: f64, lat: f64) -> Result<ZoneCode> {
    resolve(GeoPoint::new(lon, lat))
}

/// Resolves every point in parallel. Results keep the input order.
pub fn resolve_all(points: &[GeoPoint]) -> Vec<Result<ZoneCode>> {
    points.par_iter().map(|p| resolve(*p)).collect()
}

/// Resolves the zone of the center of a lon/lat bounding box.
pub fn resolve_envelope(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Result<ZoneCode> {
    if min_x > max_x || min_y > max_y {
        return Err(GeoError::InvalidArgument(format!(
            "inverted envelope ({}, {}, {}, {})",
            min_x, min_y, max_x, max_y
        )));
    }

    let center = GeoPoint::new((min_x + max_x) / 2.0, (min_y + max_y) / 2.0);
    tracing::debug!("Envelope center: {}", center);
    resolve(center)
}
