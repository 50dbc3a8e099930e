//! Decompression of TIFF strips and tiles
//!
//! One [`CompressionHandler`] per supported method, selected by
//! [`CompressionFactory`] from the directory's Compression tag.

mod handler;
mod uncompressed;
mod deflate;
mod factory;
mod zstd;

pub use handler::CompressionHandler;
pub use uncompressed::UncompressedHandler;
pub use deflate::DeflateHandler;
pub use factory::CompressionFactory;
pub use self::zstd::ZstdHandler;
