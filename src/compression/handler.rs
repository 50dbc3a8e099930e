//! Compression handler trait definition

use crate::tiff::errors::TiffResult;

/// Strategy trait for decoding one compression method
pub trait CompressionHandler: Send + Sync {
    /// Decompress one strip or tile
    ///
    /// `expected_len` is the decoded size implied by the block geometry; it
    /// is a capacity hint, the caller validates the actual length.
    fn decompress(&self, data: &[u8], expected_len: usize) -> TiffResult<Vec<u8>>;

    /// Get the name of this compression method
    fn name(&self) -> &'static str;

    /// Get the compression code
    fn code(&self) -> u64;
}
