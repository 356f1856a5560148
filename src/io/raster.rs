use std::path::Path;

use gdal::raster::Buffer;
use gdal::spatial_ref::SpatialRef;
use gdal::{Dataset, DriverManager, GeoTransform};

use super::{prepare_output, WriteOptions};
use crate::driver::DataKind;
use crate::error::{GeoError, Result};

const IDENTITY_TRANSFORM: GeoTransform = [0.0, 1.0, 0.0, 0.0, 0.0, 1.0];

/// A raster held in memory as `f64` bands in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterGrid {
    pub width: usize,
    pub height: usize,
    pub geo_transform: GeoTransform,
    pub crs_wkt: Option<String>,
    pub nodata: Option<f64>,
    /// Short name of the GDAL driver the raster was read with.
    pub driver: Option<String>,
    pub bands: Vec<Vec<f64>>,
}

impl RasterGrid {
    pub fn new(
        width: usize,
        height: usize,
        geo_transform: GeoTransform,
        bands: Vec<Vec<f64>>,
    ) -> Result<Self> {
        let grid = Self {
            width,
            height,
            geo_transform,
            crs_wkt: None,
            nodata: None,
            driver: None,
            bands,
        };
        grid.validate()?;
        Ok(grid)
    }

    pub fn with_crs(mut self, crs_wkt: String) -> Self {
        self.crs_wkt = Some(crs_wkt);
        self
    }

    pub fn with_nodata(mut self, nodata: f64) -> Self {
        self.nodata = Some(nodata);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 || self.bands.is_empty() {
            return Err(GeoError::InvalidArgument(format!(
                "empty raster ({} x {}, {} bands)",
                self.width,
                self.height,
                self.bands.len()
            )));
        }
        let expected = self.width * self.height;
        if let Some(i) = self.bands.iter().position(|b| b.len() != expected) {
            return Err(GeoError::InvalidArgument(format!(
                "band {} has {} values, expected {}",
                i + 1,
                self.bands[i].len(),
                expected
            )));
        }
        Ok(())
    }

    /// `[min_x, min_y, max_x, max_y]` of the grid's outer edges.
    ///
    /// Assumes a north-up transform (no rotation terms).
    pub fn bounds(&self) -> [f64; 4] {
        let gt = &self.geo_transform;
        let x0 = gt[0];
        let x1 = gt[0] + gt[1] * self.width as f64;
        let y0 = gt[3];
        let y1 = gt[3] + gt[5] * self.height as f64;
        [x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1)]
    }

    pub fn spatial_ref(&self) -> Result<Option<SpatialRef>> {
        Ok(self
            .crs_wkt
            .as_deref()
            .map(SpatialRef::from_wkt)
            .transpose()?)
    }
}

pub fn read_raster(path: &Path) -> Result<RasterGrid> {
    let dataset = Dataset::open(path)?;
    from_dataset(&dataset)
}

pub(crate) fn from_dataset(dataset: &Dataset) -> Result<RasterGrid> {
    let (width, height) = dataset.raster_size();
    let geo_transform = dataset.geo_transform().unwrap_or_else(|_| {
        tracing::warn!("Dataset has no geo transform, using pixel coordinates");
        IDENTITY_TRANSFORM
    });
    let crs_wkt = match dataset.spatial_ref() {
        Ok(srs) => Some(srs.to_wkt()?),
        Err(_) => None,
    };

    let mut nodata = None;
    let mut bands = Vec::with_capacity(dataset.raster_count());
    for index in 1..=dataset.raster_count() {
        let band = dataset.rasterband(index)?;
        if nodata.is_none() {
            nodata = band.no_data_value();
        }
        let buffer = band.read_as::<f64>((0, 0), (width, height), (width, height), None)?;
        let (_, data) = buffer.into_shape_and_vec();
        bands.push(data);
    }

    tracing::info!(
        "Read raster: {} x {} pixels, {} bands",
        width,
        height,
        bands.len()
    );

    Ok(RasterGrid {
        width,
        height,
        geo_transform,
        crs_wkt,
        nodata,
        driver: Some(dataset.driver().short_name()),
        bands,
    })
}

pub fn write_raster(grid: &RasterGrid, path: &Path, options: &WriteOptions) -> Result<()> {
    grid.validate()?;
    let driver_name = prepare_output(path, DataKind::Raster, options)?;
    let driver = DriverManager::get_driver_by_name(&driver_name)?;

    let mut dataset =
        driver.create_with_band_type::<f64, _>(path, grid.width, grid.height, grid.bands.len())?;
    fill_dataset(&mut dataset, grid)?;

    tracing::info!("Written raster to {:?}", path);
    Ok(())
}

/// Copies geo-referencing and band values of `grid` into an already sized dataset.
pub(crate) fn fill_dataset(dataset: &mut Dataset, grid: &RasterGrid) -> Result<()> {
    dataset.set_geo_transform(&grid.geo_transform)?;
    if let Some(wkt) = &grid.crs_wkt {
        dataset.set_projection(wkt)?;
    }

    for (i, values) in grid.bands.iter().enumerate() {
        let mut band = dataset.rasterband(i + 1)?;
        if let Some(nodata) = grid.nodata {
            band.set_no_data_value(Some(nodata))?;
        }
        let mut buffer = Buffer::new((grid.width, grid.height), values.clone());
        band.write((0, 0), (grid.width, grid.height), &mut buffer)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn gtiff_available() -> bool {
        DriverManager::get_driver_by_name("GTiff").is_ok()
    }

    fn create_test_grid() -> RasterGrid {
        RasterGrid::new(
            3,
            2,
            [-0.5, 0.25, 0.0, 51.75, 0.0, -0.25],
            vec![vec![100.0, 101.0, 102.0, 103.0, -9999.0, 105.0]],
        )
        .unwrap()
        .with_nodata(-9999.0)
    }

    #[test]
    fn test_validate_band_length() {
        let err = RasterGrid::new(2, 2, IDENTITY_TRANSFORM, vec![vec![1.0; 3]]);
        assert!(matches!(err, Err(GeoError::InvalidArgument(_))));
        let err = RasterGrid::new(0, 2, IDENTITY_TRANSFORM, vec![vec![]]);
        assert!(matches!(err, Err(GeoError::InvalidArgument(_))));
    }

    #[test]
    fn test_bounds() {
        let grid = create_test_grid();
        assert_eq!(grid.bounds(), [-0.5, 51.25, 0.25, 51.75]);
    }

    #[test]
    fn test_geotiff_round_trip() {
        if !gtiff_available() {
            eprintln!("Skipping test: GTiff driver not available in bundled GDAL");
            return;
        }
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("grid.tif");

        let wgs84 = SpatialRef::from_epsg(4326).unwrap().to_wkt().unwrap();
        let grid = create_test_grid().with_crs(wgs84);
        write_raster(&grid, &path, &WriteOptions::default()).unwrap();

        let read_back = read_raster(&path).unwrap();
        assert_eq!((read_back.width, read_back.height), (3, 2));
        assert_eq!(read_back.geo_transform, grid.geo_transform);
        assert_eq!(read_back.nodata, Some(-9999.0));
        assert_eq!(read_back.driver.as_deref(), Some("GTiff"));
        assert_eq!(read_back.bands, grid.bands);
        assert!(read_back.crs_wkt.is_some());
    }
}
