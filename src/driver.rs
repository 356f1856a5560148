//! Format drivers and the extension -> driver registry.

use std::collections::HashMap;
use std::path::Path;

use gdal::{DriverManager, Metadata};

use crate::error::{GeoError, Result};

/// Drivers preferred when several claim the same extension.
const PREFERRED: [(&str, &str); 12] = [
    ("tif", "GTiff"),
    ("tiff", "GTiff"),
    ("gpkg", "GPKG"),
    ("shp", "ESRI Shapefile"),
    ("geojson", "GeoJSON"),
    ("json", "GeoJSON"),
    ("csv", "CSV"),
    ("kml", "KML"),
    ("gml", "GML"),
    ("nc", "netCDF"),
    ("png", "PNG"),
    ("vrt", "VRT"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataKind {
    Vector,
    Raster,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub raster: bool,
    pub vector: bool,
    pub create: bool,
    pub virtual_io: bool,
}

impl Capabilities {
    pub fn supports(&self, kind: DataKind) -> bool {
        match kind {
            DataKind::Vector => self.vector,
            DataKind::Raster => self.raster,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverDescriptor {
    pub short_name: String,
    pub long_name: String,
    pub extensions: Vec<String>,
    pub capabilities: Capabilities,
}

impl DriverDescriptor {
    fn from_gdal(driver: &gdal::Driver) -> Self {
        let flag = |key: &str| {
            driver
                .metadata_item(key, "")
                .map(|v| v.eq_ignore_ascii_case("YES"))
                .unwrap_or(false)
        };

        let extensions = driver
            .metadata_item("DMD_EXTENSIONS", "")
            .or_else(|| driver.metadata_item("DMD_EXTENSION", ""))
            .map(|s| {
                s.split_whitespace()
                    .map(|e| e.trim_start_matches('.').to_lowercase())
                    .collect()
            })
            .unwrap_or_default();

        Self {
            short_name: driver.short_name(),
            long_name: driver.long_name(),
            extensions,
            capabilities: Capabilities {
                raster: flag("DCAP_RASTER"),
                vector: flag("DCAP_VECTOR"),
                create: flag("DCAP_CREATE"),
                virtual_io: flag("DCAP_VIRTUALIO"),
            },
        }
    }
}

/// Every driver registered with GDAL.
pub fn list_drivers() -> Vec<DriverDescriptor> {
    DriverManager::register_all();
    let count = DriverManager::count();
    let mut drivers = Vec::with_capacity(count);

    for index in 0..count {
        match DriverManager::get_driver(index) {
            Ok(driver) => drivers.push(DriverDescriptor::from_gdal(&driver)),
            Err(e) => tracing::warn!("Skipping driver #{}: {}", index, e),
        }
    }

    tracing::debug!("Found {} GDAL drivers", drivers.len());
    drivers
}

pub struct DriverRegistry {
    drivers: Vec<DriverDescriptor>,
    by_extension: HashMap<String, Vec<usize>>,
}

impl DriverRegistry {
    pub fn new(drivers: Vec<DriverDescriptor>) -> Self {
        let mut by_extension: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, d) in drivers.iter().enumerate() {
            for ext in &d.extensions {
                by_extension.entry(ext.clone()).or_default().push(i);
            }
        }
        Self {
            drivers,
            by_extension,
        }
    }

    pub fn from_gdal() -> Self {
        Self::new(list_drivers())
    }

    pub fn drivers(&self) -> &[DriverDescriptor] {
        &self.drivers
    }

    pub fn get(&self, short_name: &str) -> Option<&DriverDescriptor> {
        self.drivers
            .iter()
            .find(|d| d.short_name.eq_ignore_ascii_case(short_name))
    }

    pub fn filter(&self, kind: DataKind) -> impl Iterator<Item = &DriverDescriptor> {
        self.drivers
            .iter()
            .filter(move |d| d.capabilities.supports(kind))
    }

    /// Driver able to read `kind` data from a file with this extension.
    pub fn for_path(&self, path: &Path, kind: DataKind) -> Result<&DriverDescriptor> {
        self.lookup(path, kind, false)
    }

    /// Like [`for_path`](Self::for_path), but the driver must also create files.
    pub fn for_output(&self, path: &Path, kind: DataKind) -> Result<&DriverDescriptor> {
        self.lookup(path, kind, true)
    }

    fn lookup(&self, path: &Path, kind: DataKind, create: bool) -> Result<&DriverDescriptor> {
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_lowercase())
            .ok_or_else(|| {
                GeoError::UnsupportedFormat(format!("{} has no file extension", path.display()))
            })?;

        let candidates: Vec<&DriverDescriptor> = self
            .by_extension
            .get(&ext)
            .into_iter()
            .flatten()
            .map(|&i| &self.drivers[i])
            .filter(|d| d.capabilities.supports(kind) && (!create || d.capabilities.create))
            .collect();

        let preferred = PREFERRED
            .iter()
            .find(|(e, _)| *e == ext)
            .and_then(|(_, name)| candidates.iter().find(|d| d.short_name == *name));

        preferred
            .or_else(|| candidates.first())
            .copied()
            .ok_or_else(|| {
                GeoError::UnsupportedFormat(format!(
                    "no {:?} driver{} for '.{}'",
                    kind,
                    if create { " with create support" } else { "" },
                    ext
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(name: &str, exts: &[&str], caps: Capabilities) -> DriverDescriptor {
        DriverDescriptor {
            short_name: name.to_string(),
            long_name: format!("{} driver", name),
            extensions: exts.iter().map(|s| s.to_string()).collect(),
            capabilities: caps,
        }
    }

    fn synthetic_registry() -> DriverRegistry {
        let vector_rw = Capabilities {
            vector: true,
            create: true,
            ..Default::default()
        };
        let raster_rw = Capabilities {
            raster: true,
            create: true,
            ..Default::default()
        };
        let both_rw = Capabilities {
            raster: true,
            vector: true,
            create: true,
            ..Default::default()
        };
        let raster_ro = Capabilities {
            raster: true,
            ..Default::default()
        };

        DriverRegistry::new(vec![
            descriptor("COG", &["tif", "tiff"], raster_rw),
            descriptor("GTiff", &["tif", "tiff"], raster_rw),
            descriptor("GPKG", &["gpkg", "gpkg.zip"], both_rw),
            descriptor("ESRI Shapefile", &["shp", "dbf", "shz"], vector_rw),
            descriptor("GeoJSON", &["json", "geojson"], vector_rw),
            descriptor("JP2OpenJPEG", &["jp2"], raster_ro),
        ])
    }

    #[test]
    fn test_preferred_driver_wins() {
        let registry = synthetic_registry();
        let d = registry
            .for_path(Path::new("dem.TIF"), DataKind::Raster)
            .unwrap();
        assert_eq!(d.short_name, "GTiff");

        let d = registry
            .for_path(Path::new("world.gpkg"), DataKind::Vector)
            .unwrap();
        assert_eq!(d.short_name, "GPKG");
    }

    #[test]
    fn test_kind_mismatch_is_unsupported() {
        let registry = synthetic_registry();
        assert!(matches!(
            registry.for_path(Path::new("roads.shp"), DataKind::Raster),
            Err(GeoError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            registry.for_path(Path::new("no_extension"), DataKind::Vector),
            Err(GeoError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_output_requires_create() {
        let registry = synthetic_registry();
        assert!(registry
            .for_path(Path::new("scene.jp2"), DataKind::Raster)
            .is_ok());
        assert!(registry
            .for_output(Path::new("scene.jp2"), DataKind::Raster)
            .is_err());
    }

    #[test]
    fn test_filter_and_get() {
        let registry = synthetic_registry();
        let vector: Vec<_> = registry
            .filter(DataKind::Vector)
            .map(|d| d.short_name.as_str())
            .collect();
        assert_eq!(vector, vec!["GPKG", "ESRI Shapefile", "GeoJSON"]);
        assert_eq!(registry.get("gtiff").unwrap().short_name, "GTiff");
        assert!(registry.get("netCDF").is_none());
    }

    #[test]
    fn test_list_drivers_from_gdal() {
        let drivers = list_drivers();
        if drivers.is_empty() {
            eprintln!("Skipping test: no GDAL drivers registered");
            return;
        }
        let registry = DriverRegistry::new(drivers);
        if let Some(gtiff) = registry.get("GTiff") {
            assert!(gtiff.capabilities.raster);
            assert!(gtiff.extensions.iter().any(|e| e == "tif"));
        }
    }
}
