//! Pipeline error types
//!
//! Setup and I/O failures carry the file and stage they happened in.
//! Points dropped by the height filter and empty results are not errors
//! and never surface here.

use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::tiff::errors::TiffError;

/// Errors raised by the detection pipeline and its exporters
#[derive(Debug)]
pub enum TreeKitError {
    /// A raster could not be opened or decoded
    Raster { path: PathBuf, source: TiffError },
    /// A raster has no usable affine transform or CRS
    Georeference { path: PathBuf, reason: String },
    /// A raster exceeds the configured pixel limit
    RasterTooLarge { path: PathBuf, pixels: u64, limit: u64 },
    /// The detector failed on a tile
    Detector { tile_x: u32, tile_y: u32, message: String },
    /// Writing or re-reading an output artifact failed
    Export { path: PathBuf, source: io::Error },
    /// Packaging the shapefile components failed
    Archive { path: PathBuf, message: String },
    /// Coordinate reprojection failed or is unsupported
    Projection(String),
    /// Invalid configuration value or file
    Config(String),
    /// Unattributed TIFF error
    Tiff(TiffError),
    /// Unattributed I/O error
    Io(io::Error),
}

impl fmt::Display for TreeKitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeKitError::Raster { path, source } => {
                write!(f, "Failed to read raster {}: {}", path.display(), source)
            },
            TreeKitError::Georeference { path, reason } => {
                write!(f, "Raster {} is not usable: {}", path.display(), reason)
            },
            TreeKitError::RasterTooLarge { path, pixels, limit } => {
                write!(f, "Raster {} has {} pixels, above the configured limit of {}",
                       path.display(), pixels, limit)
            },
            TreeKitError::Detector { tile_x, tile_y, message } => {
                write!(f, "Detector failed on tile at ({}, {}): {}", tile_x, tile_y, message)
            },
            TreeKitError::Export { path, source } => {
                write!(f, "Failed to write {}: {}", path.display(), source)
            },
            TreeKitError::Archive { path, message } => {
                write!(f, "Failed to package {}: {}", path.display(), message)
            },
            TreeKitError::Projection(msg) => write!(f, "Projection error: {}", msg),
            TreeKitError::Config(msg) => write!(f, "Configuration error: {}", msg),
            TreeKitError::Tiff(e) => write!(f, "{}", e),
            TreeKitError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for TreeKitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TreeKitError::Raster { source, .. } => Some(source),
            TreeKitError::Export { source, .. } => Some(source),
            TreeKitError::Tiff(e) => Some(e),
            TreeKitError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for TreeKitError {
    fn from(error: io::Error) -> Self {
        TreeKitError::Io(error)
    }
}

impl From<TiffError> for TreeKitError {
    fn from(error: TiffError) -> Self {
        TreeKitError::Tiff(error)
    }
}

impl TreeKitError {
    /// Wraps an I/O error with the artifact path it concerns
    pub fn export(path: impl Into<PathBuf>, source: io::Error) -> Self {
        TreeKitError::Export { path: path.into(), source }
    }

    /// Wraps a TIFF error with the raster path it concerns
    pub fn raster(path: impl Into<PathBuf>, source: TiffError) -> Self {
        TreeKitError::Raster { path: path.into(), source }
    }
}

/// Result type for pipeline operations
pub type TreeKitResult<T> = Result<T, TreeKitError>;
