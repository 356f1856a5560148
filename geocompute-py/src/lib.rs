use geocompute_rs::model::ZoneCode;
use geocompute_rs::{list_drivers as gdal_drivers, zone, GeoError};
use pyo3::exceptions::{PyIOError, PyValueError};
use pyo3::prelude::*;

#[pymodule]
fn geocompute(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyZoneCode>()?;
    m.add_function(wrap_pyfunction!(resolve_utm, m)?)?;
    m.add_function(wrap_pyfunction!(utm_zone, m)?)?;
    m.add_function(wrap_pyfunction!(utm_proj_string, m)?)?;
    m.add_function(wrap_pyfunction!(list_drivers, m)?)?;
    Ok(())
}

fn to_py_err(e: GeoError) -> PyErr {
    match e {
        GeoError::InvalidArgument(msg) => PyValueError::new_err(msg),
        other => PyIOError::new_err(other.to_string()),
    }
}

#[pyclass(name = "ZoneCode")]
#[derive(Clone)]
pub struct PyZoneCode {
    #[pyo3(get)]
    pub epsg: u32,
    #[pyo3(get)]
    pub zone: u8,
    #[pyo3(get)]
    pub north: bool,
}

impl From<ZoneCode> for PyZoneCode {
    fn from(code: ZoneCode) -> Self {
        PyZoneCode {
            epsg: code.epsg(),
            zone: code.zone(),
            north: code.hemisphere() == geocompute_rs::Hemisphere::North,
        }
    }
}

#[pymethods]
impl PyZoneCode {
    fn __repr__(&self) -> String {
        format!(
            "ZoneCode(epsg={}, zone={}, north={})",
            self.epsg,
            self.zone,
            if self.north { "True" } else { "False" }
        )
    }
}

/// EPSG code of the UTM zone containing (lon, lat).
#[pyfunction]
pub fn resolve_utm(lon: f64, lat: f64) -> PyResult<u32> {
    zone::resolve_lon_lat(lon, lat)
        .map(|c| c.epsg())
        .map_err(to_py_err)
}

#[pyfunction]
pub fn utm_zone(lon: f64, lat: f64) -> PyResult<PyZoneCode> {
    zone::resolve_lon_lat(lon, lat)
        .map(PyZoneCode::from)
        .map_err(to_py_err)
}

#[pyfunction]
pub fn utm_proj_string(lon: f64, lat: f64) -> PyResult<String> {
    zone::resolve_lon_lat(lon, lat)
        .map(|c| c.proj_string())
        .map_err(to_py_err)
}

/// (short_name, long_name, is_raster, is_vector) for every GDAL driver.
#[pyfunction]
pub fn list_drivers() -> Vec<(String, String, bool, bool)> {
    gdal_drivers()
        .into_iter()
        .map(|d| {
            (
                d.short_name,
                d.long_name,
                d.capabilities.raster,
                d.capabilities.vector,
            )
        })
        .collect()
}
