//! Pixel extraction from TIFF strips and tiles
//!
//! [`PixelLayout`] describes where blocks live and how samples are encoded;
//! [`BlockReader`] decodes the blocks intersecting a [`Region`].

mod region;
mod sample;
mod predictor;
mod layout;
mod block_reader;
#[cfg(test)]
mod tests;

pub use region::Region;
pub use sample::{SampleFormat, SampleType};
pub use layout::PixelLayout;
pub use block_reader::BlockReader;
