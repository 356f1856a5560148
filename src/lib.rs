pub mod crs;
pub mod driver;
pub mod error;
pub mod io;
pub mod model;
pub mod reproject;
pub mod zone;

pub use crs::CrsSpec;
pub use driver::{list_drivers, DataKind, DriverDescriptor, DriverRegistry};
pub use error::{GeoError, Result};
pub use io::{FeatureCollection, GeoData, RasterGrid, ReadOptions, WriteOptions};
pub use model::{GeoPoint, Hemisphere, ZoneCode};
pub use zone::{resolve, resolve_all};
