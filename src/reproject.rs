//! Coordinate transformation of points, feature collections and rasters.
//!
//! The transformations themselves are done by GDAL/PROJ. This module only
//! picks the target CRS, including the local UTM zone of the data.

use gdal::spatial_ref::{AxisMappingStrategy, CoordTransform, SpatialRef};
use gdal::DriverManager;

use crate::crs::CrsSpec;
use crate::error::{GeoError, Result};
use crate::io::raster::{fill_dataset, from_dataset};
use crate::io::{Feature, FeatureCollection, RasterGrid};
use crate::model::{GeoPoint, ZoneCode};
use crate::zone;

/// Densification points per edge when transforming raster bounds.
const BOUNDS_DENSIFY_PTS: i32 = 21;

fn wgs84() -> Result<SpatialRef> {
    let mut srs = SpatialRef::from_epsg(4326)?;
    srs.set_axis_mapping_strategy(AxisMappingStrategy::TraditionalGisOrder);
    Ok(srs)
}

fn source_ref(crs_wkt: Option<&str>, what: &str) -> Result<SpatialRef> {
    let wkt = crs_wkt.ok_or_else(|| GeoError::MissingCrs(what.to_string()))?;
    let mut srs = SpatialRef::from_wkt(wkt)?;
    srs.set_axis_mapping_strategy(AxisMappingStrategy::TraditionalGisOrder);
    Ok(srs)
}

/// Center of `extent` (in `source` coordinates) as a WGS84 lon/lat point.
fn center_lon_lat(extent: [f64; 4], source: &SpatialRef) -> Result<GeoPoint> {
    let transform = CoordTransform::new(source, &wgs84()?)?;
    let mut x = [(extent[0] + extent[2]) / 2.0];
    let mut y = [(extent[1] + extent[3]) / 2.0];
    let mut z = [0.0];
    transform.transform_coords(&mut x, &mut y, &mut z)?;
    Ok(GeoPoint::new(x[0], y[0]))
}

pub fn transform_points(
    points: &[(f64, f64)],
    source: &CrsSpec,
    target: &CrsSpec,
) -> Result<Vec<(f64, f64)>> {
    if source.is_local_utm() {
        return Err(GeoError::InvalidArgument(
            "the source CRS must be explicit".to_string(),
        ));
    }
    if points.is_empty() {
        return Ok(Vec::new());
    }

    let source_srs = source.to_spatial_ref(None)?;
    let hint = if target.is_local_utm() {
        let extent = points.iter().fold(
            [f64::MAX, f64::MAX, f64::MIN, f64::MIN],
            |e, &(x, y)| [e[0].min(x), e[1].min(y), e[2].max(x), e[3].max(y)],
        );
        Some(center_lon_lat(extent, &source_srs)?)
    } else {
        None
    };
    let target_srs = target.to_spatial_ref(hint)?;
    let transform = CoordTransform::new(&source_srs, &target_srs)?;

    let mut xs: Vec<f64> = points.iter().map(|p| p.0).collect();
    let mut ys: Vec<f64> = points.iter().map(|p| p.1).collect();
    let mut zs = vec![0.0; points.len()];
    transform.transform_coords(&mut xs, &mut ys, &mut zs)?;

    Ok(xs.into_iter().zip(ys).collect())
}

pub fn reproject_collection(
    collection: &FeatureCollection,
    target: &CrsSpec,
) -> Result<FeatureCollection> {
    let source_srs = source_ref(collection.crs_wkt.as_deref(), &collection.name)?;

    let hint = if target.is_local_utm() {
        let extent = collection.extent().ok_or_else(|| {
            GeoError::InvalidArgument(format!(
                "layer '{}' has no geometries to locate a UTM zone",
                collection.name
            ))
        })?;
        Some(center_lon_lat(extent, &source_srs)?)
    } else {
        None
    };
    let target_srs = target.to_spatial_ref(hint)?;
    let transform = CoordTransform::new(&source_srs, &target_srs)?;

    let features = collection
        .features
        .iter()
        .map(|f| {
            let geometry = f
                .geometry
                .as_ref()
                .map(|g| g.transform(&transform))
                .transpose()?;
            Ok(Feature {
                geometry,
                attributes: f.attributes.clone(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    tracing::info!(
        "Reprojected {} features of '{}' to {}",
        features.len(),
        collection.name,
        target
    );

    Ok(FeatureCollection {
        name: collection.name.clone(),
        crs_wkt: Some(target_srs.to_wkt()?),
        driver: None,
        fields: collection.fields.clone(),
        features,
    })
}

/// UTM zone of the center of `extent`, given in the CRS described by `crs_wkt`.
pub fn locate_zone(extent: [f64; 4], crs_wkt: Option<&str>) -> Result<ZoneCode> {
    let source_srs = source_ref(crs_wkt, "extent")?;
    zone::resolve(center_lon_lat(extent, &source_srs)?)
}

/// Reprojects into the UTM zone containing the center of the collection.
pub fn to_local_utm(collection: &FeatureCollection) -> Result<(ZoneCode, FeatureCollection)> {
    let extent = collection.extent().ok_or_else(|| {
        GeoError::InvalidArgument(format!("layer '{}' is empty", collection.name))
    })?;
    let code = locate_zone(extent, collection.crs_wkt.as_deref())?;
    let projected = reproject_collection(collection, &CrsSpec::from(code))?;
    Ok((code, projected))
}

/// Warps `grid` into `target`, keeping its pixel dimensions.
pub fn reproject_raster(grid: &RasterGrid, target: &CrsSpec) -> Result<RasterGrid> {
    grid.validate()?;
    let source_srs = source_ref(grid.crs_wkt.as_deref(), "raster")?;
    let bounds = grid.bounds();

    let hint = if target.is_local_utm() {
        Some(center_lon_lat(bounds, &source_srs)?)
    } else {
        None
    };
    let target_srs = target.to_spatial_ref(hint)?;
    let target_wkt = target_srs.to_wkt()?;

    let transform = CoordTransform::new(&source_srs, &target_srs)?;
    let [min_x, min_y, max_x, max_y] = transform.transform_bounds(&bounds, BOUNDS_DENSIFY_PTS)?;

    let (width, height) = (grid.width, grid.height);
    let fill = grid.nodata.unwrap_or(0.0);
    let mut template = RasterGrid::new(
        width,
        height,
        [
            min_x,
            (max_x - min_x) / width as f64,
            0.0,
            max_y,
            0.0,
            -(max_y - min_y) / height as f64,
        ],
        vec![vec![fill; width * height]; grid.bands.len()],
    )?
    .with_crs(target_wkt);
    template.nodata = grid.nodata;

    let mem = DriverManager::get_driver_by_name("MEM")?;
    let bands = grid.bands.len();
    let mut src_ds = mem.create_with_band_type::<f64, _>("", width, height, bands)?;
    fill_dataset(&mut src_ds, grid)?;
    let mut dst_ds = mem.create_with_band_type::<f64, _>("", width, height, bands)?;
    fill_dataset(&mut dst_ds, &template)?;

    gdal::raster::reproject(&src_ds, &dst_ds)?;

    let mut warped = from_dataset(&dst_ds)?;
    warped.nodata = grid.nodata;
    // Warped in memory, not read from a file.
    warped.driver = None;
    tracing::info!(
        "Warped {} x {} raster to {}",
        width,
        height,
        target
    );
    Ok(warped)
}
