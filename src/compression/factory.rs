//! Factory for creating compression handlers

use crate::tiff::constants::compression;
use crate::tiff::errors::{TiffError, TiffResult};
use super::deflate::DeflateHandler;
use super::handler::CompressionHandler;
use super::uncompressed::UncompressedHandler;
use super::zstd::ZstdHandler;

/// Factory for creating compression handlers
pub struct CompressionFactory;

impl CompressionFactory {
    /// Create a handler for the given TIFF compression code
    pub fn create_handler(code: u64) -> TiffResult<Box<dyn CompressionHandler>> {
        match code {
            compression::NONE => Ok(Box::new(UncompressedHandler)),
            compression::DEFLATE | compression::DEFLATE_LEGACY => Ok(Box::new(DeflateHandler::new(code))),
            compression::ZSTD => Ok(Box::new(ZstdHandler)),
            _ => Err(TiffError::UnsupportedCompression(code)),
        }
    }

    /// Display name for a compression code, including ones we cannot decode
    pub fn describe(code: u64) -> String {
        match Self::create_handler(code) {
            Ok(handler) => handler.name().to_string(),
            Err(_) => match code {
                5 => "LZW (unsupported)".to_string(),
                7 => "JPEG (unsupported)".to_string(),
                32773 => "PackBits (unsupported)".to_string(),
                other => format!("Unknown ({})", other),
            },
        }
    }
}
