use std::path::Path;

use gdal::spatial_ref::SpatialRef;
use gdal::vector::{
    FieldValue, Geometry, LayerAccess, LayerOptions, OGRFieldType, OGRwkbGeometryType,
};
use gdal::{Dataset, DriverManager};

use super::{prepare_output, WriteOptions};
use crate::driver::DataKind;
use crate::error::{GeoError, Result};

#[derive(Debug, Clone)]
pub struct Feature {
    pub geometry: Option<Geometry>,
    /// Non-null attribute values, by field name.
    pub attributes: Vec<(String, FieldValue)>,
}

#[derive(Debug, Clone)]
pub struct FeatureCollection {
    pub name: String,
    pub crs_wkt: Option<String>,
    /// Short name of the GDAL driver the layer was read with.
    pub driver: Option<String>,
    pub fields: Vec<(String, OGRFieldType::Type)>,
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(name: &str, crs_wkt: Option<String>) -> Self {
        Self {
            name: name.to_string(),
            crs_wkt,
            driver: None,
            fields: Vec::new(),
            features: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// `[min_x, min_y, max_x, max_y]` over all geometries, in the collection's CRS.
    pub fn extent(&self) -> Option<[f64; 4]> {
        self.features
            .iter()
            .filter_map(|f| f.geometry.as_ref())
            .filter(|g| !g.is_empty())
            .map(|g| {
                let env = g.envelope();
                [env.MinX, env.MinY, env.MaxX, env.MaxY]
            })
            .reduce(|a, b| {
                [
                    a[0].min(b[0]),
                    a[1].min(b[1]),
                    a[2].max(b[2]),
                    a[3].max(b[3]),
                ]
            })
    }

    pub fn spatial_ref(&self) -> Result<Option<SpatialRef>> {
        Ok(self
            .crs_wkt
            .as_deref()
            .map(SpatialRef::from_wkt)
            .transpose()?)
    }
}

pub fn read_vector(path: &Path, layer: Option<&str>) -> Result<FeatureCollection> {
    let dataset = Dataset::open(path)?;
    from_dataset(&dataset, layer)
}

pub(super) fn from_dataset(dataset: &Dataset, layer: Option<&str>) -> Result<FeatureCollection> {
    if dataset.layer_count() == 0 {
        return Err(GeoError::LayerNotFound(
            "dataset has no vector layers".to_string(),
        ));
    }

    let mut layer = match layer {
        Some(name) => dataset
            .layer_by_name(name)
            .map_err(|_| GeoError::LayerNotFound(name.to_string()))?,
        None => dataset.layer(0)?,
    };

    let crs_wkt = layer.spatial_ref().map(|s| s.to_wkt()).transpose()?;
    let mut collection = FeatureCollection::new(&layer.name(), crs_wkt);
    collection.driver = Some(dataset.driver().short_name());
    collection.fields = layer
        .defn()
        .fields()
        .map(|f| (f.name(), f.field_type()))
        .collect();

    for feature in layer.features() {
        let attributes = feature
            .fields()
            .filter_map(|(name, value)| value.map(|v| (name, v)))
            .collect();
        collection.features.push(Feature {
            geometry: feature.geometry().cloned(),
            attributes,
        });
    }

    tracing::info!(
        "Read layer '{}': {} features, {} fields",
        collection.name,
        collection.len(),
        collection.fields.len()
    );
    Ok(collection)
}

pub fn write_vector(
    collection: &FeatureCollection,
    path: &Path,
    options: &WriteOptions,
) -> Result<()> {
    let driver_name = prepare_output(path, DataKind::Vector, options)?;
    let driver = DriverManager::get_driver_by_name(&driver_name)?;

    let mut dataset = driver.create_vector_only(path)?;
    let srs = collection.spatial_ref()?;
    let mut layer = dataset.create_layer(LayerOptions {
        name: &collection.name,
        srs: srs.as_ref(),
        ty: OGRwkbGeometryType::wkbUnknown,
        ..Default::default()
    })?;

    let field_defs: Vec<(&str, OGRFieldType::Type)> = collection
        .fields
        .iter()
        .map(|(name, ty)| (name.as_str(), *ty))
        .collect();
    layer.create_defn_fields(&field_defs)?;

    let mut skipped = 0;
    for feature in &collection.features {
        let Some(geometry) = &feature.geometry else {
            skipped += 1;
            continue;
        };
        let names: Vec<&str> = feature.attributes.iter().map(|(n, _)| n.as_str()).collect();
        let values: Vec<FieldValue> = feature.attributes.iter().map(|(_, v)| v.clone()).collect();
        layer.create_feature_fields(geometry.clone(), &names, &values)?;
    }

    if skipped > 0 {
        tracing::warn!("Skipped {} features without geometry", skipped);
    }
    tracing::info!(
        "Written {} features to {:?}",
        collection.len() - skipped,
        path
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn geojson_available() -> bool {
        DriverManager::get_driver_by_name("GeoJSON").is_ok()
    }

    fn create_test_collection() -> FeatureCollection {
        let wgs84 = SpatialRef::from_epsg(4326).unwrap().to_wkt().unwrap();
        let mut collection = FeatureCollection::new("cities", Some(wgs84));
        collection.fields = vec![
            ("name".to_string(), OGRFieldType::OFTString),
            ("population".to_string(), OGRFieldType::OFTInteger64),
        ];
        for (name, pop, wkt) in [
            ("London", 8_900_000, "POINT (-0.1 51.5)"),
            ("Reading", 174_000, "POINT (-0.97 51.45)"),
        ] {
            collection.features.push(Feature {
                geometry: Some(Geometry::from_wkt(wkt).unwrap()),
                attributes: vec![
                    ("name".to_string(), FieldValue::StringValue(name.to_string())),
                    ("population".to_string(), FieldValue::Integer64Value(pop)),
                ],
            });
        }
        collection
    }

    #[test]
    fn test_extent() {
        if !geojson_available() {
            eprintln!("Skipping test: GeoJSON driver not available");
            return;
        }
        let collection = create_test_collection();
        let extent = collection.extent().unwrap();
        assert_eq!(extent, [-0.97, 51.45, -0.1, 51.5]);

        let empty = FeatureCollection::new("empty", None);
        assert!(empty.extent().is_none());
    }

    #[test]
    fn test_geojson_round_trip() {
        if !geojson_available() {
            eprintln!("Skipping test: GeoJSON driver not available");
            return;
        }
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("cities.geojson");

        let collection = create_test_collection();
        write_vector(&collection, &path, &WriteOptions::default()).unwrap();
        assert!(path.exists());

        let read_back = read_vector(&path, None).unwrap();
        assert_eq!(read_back.len(), 2);
        assert!(read_back.crs_wkt.is_some());
        assert_eq!(read_back.driver.as_deref(), Some("GeoJSON"));
        assert!(collection.driver.is_none());
        assert!(read_back.fields.iter().any(|(n, _)| n == "name"));

        let first = &read_back.features[0];
        let name = first
            .attributes
            .iter()
            .find(|(n, _)| n == "name")
            .map(|(_, v)| v.clone());
        assert_eq!(name, Some(FieldValue::StringValue("London".to_string())));
        assert_eq!(
            first.geometry.as_ref().unwrap().get_point(0),
            (-0.1, 51.5, 0.0)
        );
    }

    #[test]
    fn test_missing_layer() {
        if !geojson_available() {
            eprintln!("Skipping test: GeoJSON driver not available");
            return;
        }
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("cities.geojson");
        write_vector(&create_test_collection(), &path, &WriteOptions::default()).unwrap();

        assert!(matches!(
            read_vector(&path, Some("rivers")),
            Err(GeoError::LayerNotFound(_))
        ));
    }
}
