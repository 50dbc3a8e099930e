//! Handler for ZSTD compressed data

use log::{debug, warn};

use crate::tiff::constants::compression;
use crate::tiff::errors::{TiffError, TiffResult};
use super::handler::CompressionHandler;

/// ZSTD compression handler (compression code 14)
pub struct ZstdHandler;

impl CompressionHandler for ZstdHandler {
    fn decompress(&self, data: &[u8], expected_len: usize) -> TiffResult<Vec<u8>> {
        if data.is_empty() {
            return Ok(Vec::new());
        }

        match zstd::bulk::decompress(data, expected_len) {
            Ok(decompressed) => {
                debug!("ZSTD decompressed {} -> {} bytes", data.len(), decompressed.len());
                Ok(decompressed)
            },
            Err(_) => {
                // Frames without a content size or larger than the hint
                zstd::decode_all(data).map_err(|e| {
                    warn!("ZSTD decompression error: {}", e);
                    TiffError::GenericError(format!("ZSTD decompression error: {}", e))
                })
            }
        }
    }

    fn name(&self) -> &'static str {
        "ZSTD"
    }

    fn code(&self) -> u64 {
        compression::ZSTD
    }
}
