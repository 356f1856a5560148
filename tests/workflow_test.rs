use gdal::spatial_ref::SpatialRef;
use gdal::vector::{FieldValue, Geometry, OGRFieldType};
use gdal::DriverManager;
use geocompute::io::{self, Feature, GeoData, ReadOptions, WriteOptions};
use geocompute::reproject::{reproject_collection, to_local_utm};
use geocompute::{CrsSpec, FeatureCollection};
use tempfile::TempDir;

fn gdal_ready() -> bool {
    DriverManager::get_driver_by_name("GeoJSON").is_ok()
        && DriverManager::get_driver_by_name("GPKG").is_ok()
        && SpatialRef::from_epsg(32630).is_ok()
}

fn london_boroughs() -> FeatureCollection {
    let wgs84 = SpatialRef::from_epsg(4326).unwrap().to_wkt().unwrap();
    let mut collection = FeatureCollection::new("boroughs", Some(wgs84));
    collection.fields = vec![("name".to_string(), OGRFieldType::OFTString)];
    for (name, wkt) in [
        ("Camden", "POLYGON ((-0.21 51.51, -0.10 51.51, -0.10 51.57, -0.21 51.57, -0.21 51.51))"),
        ("Southwark", "POLYGON ((-0.11 51.42, -0.03 51.42, -0.03 51.51, -0.11 51.51, -0.11 51.42))"),
    ] {
        collection.features.push(Feature {
            geometry: Some(Geometry::from_wkt(wkt).unwrap()),
            attributes: vec![("name".to_string(), FieldValue::StringValue(name.to_string()))],
        });
    }
    collection
}

#[test]
fn test_read_reproject_write() -> anyhow::Result<()> {
    if !gdal_ready() {
        eprintln!("Skipping test: GeoJSON/GPKG drivers or PROJ database not available");
        return Ok(());
    }
    let temp_dir = TempDir::new()?;
    let source = temp_dir.path().join("boroughs.geojson");
    let target = temp_dir.path().join("boroughs_utm.gpkg");

    io::write_vector(&london_boroughs(), &source, &WriteOptions::default())?;

    let data = io::read(&source, &ReadOptions::default())?;
    assert_eq!(data.driver(), Some("GeoJSON"));
    let GeoData::Vector(collection) = data else {
        panic!("expected vector data");
    };
    assert_eq!(collection.len(), 2);

    let (code, projected) = to_local_utm(&collection)?;
    assert_eq!(code.epsg(), 32630);
    io::write(&GeoData::Vector(projected), &target, &WriteOptions::default())?;

    let written = io::read_vector(&target, None)?;
    assert_eq!(written.len(), 2);
    assert_eq!(written.driver.as_deref(), Some("GPKG"));
    let srs = written.spatial_ref()?.expect("written layer has a CRS");
    assert_eq!(srs.auth_code()?, 32630);

    let [min_x, min_y, max_x, max_y] = written.extent().expect("non-empty extent");
    assert!(min_x > 600_000.0 && max_x < 800_000.0);
    assert!(min_y > 5_600_000.0 && max_y < 5_800_000.0);

    // A second write without overwrite must not clobber the file.
    assert!(io::write_vector(&written, &target, &WriteOptions::default()).is_err());
    Ok(())
}

#[test]
fn test_explicit_crs_string() -> anyhow::Result<()> {
    if !gdal_ready() {
        eprintln!("Skipping test: GeoJSON/GPKG drivers or PROJ database not available");
        return Ok(());
    }
    let target: CrsSpec = "+proj=utm +zone=30 +datum=WGS84 +units=m +no_defs".parse()?;
    let by_proj = reproject_collection(&london_boroughs(), &target)?;
    let by_epsg = reproject_collection(&london_boroughs(), &CrsSpec::Epsg(32630))?;

    let a = by_proj.extent().expect("extent");
    let b = by_epsg.extent().expect("extent");
    for i in 0..4 {
        assert!((a[i] - b[i]).abs() < 1e-3, "{:?} vs {:?}", a, b);
    }
    Ok(())
}
