//! Handler for Deflate compressed data

use std::io::Read;
use flate2::read::ZlibDecoder;
use log::warn;

use crate::tiff::constants::compression;
use crate::tiff::errors::{TiffError, TiffResult};
use super::handler::CompressionHandler;

/// Deflate (zlib stream) handler
///
/// Serves both the Adobe code 8 and the legacy code 32946; the payload
/// format is identical.
pub struct DeflateHandler {
    code: u64,
}

impl DeflateHandler {
    /// Create a handler that reports the given compression code
    pub fn new(code: u64) -> Self {
        DeflateHandler { code }
    }
}

impl Default for DeflateHandler {
    fn default() -> Self {
        Self::new(compression::DEFLATE)
    }
}

impl CompressionHandler for DeflateHandler {
    fn decompress(&self, data: &[u8], expected_len: usize) -> TiffResult<Vec<u8>> {
        let mut decoder = ZlibDecoder::new(data);
        let mut decompressed = Vec::with_capacity(expected_len);
        decoder.read_to_end(&mut decompressed).map_err(|e| {
            warn!("Deflate decompression error: {}", e);
            TiffError::IoError(e)
        })?;
        Ok(decompressed)
    }

    fn name(&self) -> &'static str {
        "Deflate"
    }

    fn code(&self) -> u64 {
        self.code
    }
}
