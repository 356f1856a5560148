use std::path::PathBuf;

use gdal::errors::GdalError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeoError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("dataset has no coordinate reference system: {0}")]
    MissingCrs(String),

    #[error("destination already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("layer not found: {0}")]
    LayerNotFound(String),

    #[error("GDAL error: {0}")]
    Gdal(#[from] GdalError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, GeoError>;
