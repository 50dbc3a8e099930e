//! TIFF file format parsing module
//!
//! This module provides structures and functions for reading
//! TIFF and BigTIFF directory structures and GeoTIFF keys.

pub mod errors;
pub mod ifd;
pub mod types;
pub mod reader;
pub mod constants;
pub mod geo_keys;

pub use crate::io::byte_order::{BigEndianHandler, ByteOrder, ByteOrderHandler, LittleEndianHandler};
pub use errors::{TiffError, TiffResult};
pub use geo_keys::{GeoKeyDirectory, GeoKeyEntry};
pub use ifd::{IFD, IFDEntry};
pub use reader::TiffReader;
pub use types::TIFF;
