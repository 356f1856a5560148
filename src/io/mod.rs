//! Reading and writing vector and raster data through GDAL.
//!
//! Data is copied into plain in-memory values ([`FeatureCollection`],
//! [`RasterGrid`]) so that callers never hold GDAL dataset handles.

pub(crate) mod raster;
mod vector;

use std::fs;
use std::path::Path;

use gdal::Dataset;

use crate::driver::{DataKind, DriverRegistry};
use crate::error::{GeoError, Result};

pub use raster::{read_raster, write_raster, RasterGrid};
pub use vector::{read_vector, write_vector, Feature, FeatureCollection};

#[derive(Debug, Clone)]
pub enum GeoData {
    Vector(FeatureCollection),
    Raster(RasterGrid),
}

impl GeoData {
    pub fn kind(&self) -> DataKind {
        match self {
            GeoData::Vector(_) => DataKind::Vector,
            GeoData::Raster(_) => DataKind::Raster,
        }
    }

    pub fn crs_wkt(&self) -> Option<&str> {
        match self {
            GeoData::Vector(c) => c.crs_wkt.as_deref(),
            GeoData::Raster(r) => r.crs_wkt.as_deref(),
        }
    }

    /// Driver the data was read with; `None` for data built in memory.
    pub fn driver(&self) -> Option<&str> {
        match self {
            GeoData::Vector(c) => c.driver.as_deref(),
            GeoData::Raster(r) => r.driver.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReadOptions {
    /// Layer to read from a multi-layer vector source. Defaults to the first.
    pub layer: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct WriteOptions {
    /// GDAL short name. When unset the driver is chosen from the extension.
    pub driver: Option<String>,
    /// Replace an existing destination instead of failing.
    pub overwrite: bool,
}

/// Opens `path` and reads it as raster if it has bands, otherwise as vector.
pub fn read(path: &Path, options: &ReadOptions) -> Result<GeoData> {
    let dataset = Dataset::open(path)?;
    tracing::info!(
        "Opened {:?} with driver {}",
        path,
        dataset.driver().short_name()
    );

    if dataset.raster_count() > 0 {
        Ok(GeoData::Raster(raster::from_dataset(&dataset)?))
    } else {
        Ok(GeoData::Vector(vector::from_dataset(
            &dataset,
            options.layer.as_deref(),
        )?))
    }
}

pub fn write(data: &GeoData, path: &Path, options: &WriteOptions) -> Result<()> {
    match data {
        GeoData::Vector(collection) => write_vector(collection, path, options),
        GeoData::Raster(grid) => write_raster(grid, path, options),
    }
}

/// Picks the output driver and clears the destination when allowed.
pub(crate) fn prepare_output(path: &Path, kind: DataKind, options: &WriteOptions) -> Result<String> {
    let driver = match &options.driver {
        Some(name) => name.clone(),
        None => DriverRegistry::from_gdal()
            .for_output(path, kind)?
            .short_name
            .clone(),
    };

    if path.exists() {
        if !options.overwrite {
            return Err(GeoError::AlreadyExists(path.to_path_buf()));
        }
        remove_existing(path)?;
    }

    tracing::debug!("Writing {:?} with driver {}", path, driver);
    Ok(driver)
}

fn remove_existing(path: &Path) -> Result<()> {
    if path.is_dir() {
        fs::remove_dir_all(path)?;
        return Ok(());
    }
    fs::remove_file(path)?;

    // A shapefile is a set of files sharing one stem.
    let is_shapefile = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.eq_ignore_ascii_case("shp"))
        .unwrap_or(false);
    if is_shapefile {
        for ext in ["shx", "dbf", "prj", "cpg", "qix"] {
            let sidecar = path.with_extension(ext);
            if sidecar.exists() {
                fs::remove_file(&sidecar)?;
            }
        }
    }
    Ok(())
}
