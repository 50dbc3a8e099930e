//! Pixel layout of an image directory
//!
//! Strips and tiles are handled uniformly as "blocks": a strip is a block
//! as wide as the image and `RowsPerStrip` tall, where the last strip may
//! be shorter. Tiles always have their full declared size, with padding
//! past the image edge.

use log::debug;

use crate::io::seekable::SeekableReader;
use crate::tiff::constants::{planar_config, predictor, sample_format, tags};
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::ifd::IFD;
use crate::tiff::reader::TiffReader;

use super::sample::{SampleFormat, SampleType};

/// Everything needed to locate and decode pixel blocks
#[derive(Debug, Clone)]
pub struct PixelLayout {
    pub width: u32,
    pub height: u32,
    pub samples_per_pixel: usize,
    pub sample_type: SampleType,
    pub compression: u64,
    pub predictor: u64,
    pub tiled: bool,
    pub block_width: u32,
    pub block_height: u32,
    pub offsets: Vec<u64>,
    pub byte_counts: Vec<u64>,
}

impl PixelLayout {
    /// Reads and validates the layout tags of a directory
    ///
    /// # Arguments
    /// * `tiff` - Reader bound to the file's byte order
    /// * `reader` - Stream over the same file
    /// * `ifd` - Directory describing the image
    ///
    /// # Returns
    /// The layout, or an error naming the first unsupported property
    pub fn from_ifd(tiff: &TiffReader, reader: &mut dyn SeekableReader, ifd: &IFD) -> TiffResult<Self> {
        let (width, height) = ifd.get_dimensions().ok_or(TiffError::MissingDimensions)?;
        let width = u32::try_from(width)
            .map_err(|_| TiffError::UnsupportedLayout(format!("width {}", width)))?;
        let height = u32::try_from(height)
            .map_err(|_| TiffError::UnsupportedLayout(format!("height {}", height)))?;
        let samples_per_pixel = ifd.get_samples_per_pixel().max(1) as usize;

        let planar = ifd.get_tag_value(tags::PLANAR_CONFIGURATION).unwrap_or(planar_config::CHUNKY);
        if planar != planar_config::CHUNKY && samples_per_pixel > 1 {
            return Err(TiffError::UnsupportedLayout("separate sample planes".to_string()));
        }

        let sample_type = Self::read_sample_type(tiff, reader, ifd)?;

        let compression = ifd.get_tag_value(tags::COMPRESSION).unwrap_or(1);
        let predictor = ifd.get_tag_value(tags::PREDICTOR).unwrap_or(predictor::NONE);
        match predictor {
            predictor::NONE | predictor::HORIZONTAL_DIFFERENCING => {},
            predictor::FLOATING_POINT if sample_type.format == SampleFormat::Float => {},
            other => {
                return Err(TiffError::UnsupportedLayout(
                    format!("predictor {} for {} samples", other, sample_type.format.name())));
            },
        }

        let tiled = ifd.is_tiled();
        let (block_width, block_height, offsets_tag, counts_tag) = if tiled {
            let tile_width = ifd.get_tag_value(tags::TILE_WIDTH).ok_or(TiffError::TagNotFound(tags::TILE_WIDTH))?;
            let tile_height = ifd.get_tag_value(tags::TILE_LENGTH).ok_or(TiffError::TagNotFound(tags::TILE_LENGTH))?;
            (tile_width as u32, tile_height as u32, tags::TILE_OFFSETS, tags::TILE_BYTE_COUNTS)
        } else {
            let rows_per_strip = ifd.get_tag_value(tags::ROWS_PER_STRIP)
                .unwrap_or(height as u64)
                .min(height as u64) as u32;
            (width, rows_per_strip, tags::STRIP_OFFSETS, tags::STRIP_BYTE_COUNTS)
        };

        if block_width == 0 || block_height == 0 {
            return Err(TiffError::UnsupportedLayout(
                format!("block size {}x{}", block_width, block_height)));
        }

        let offsets = tiff.read_tag_values(reader, ifd, offsets_tag)?;
        let byte_counts = tiff.read_tag_values(reader, ifd, counts_tag)?;

        let layout = PixelLayout {
            width,
            height,
            samples_per_pixel,
            sample_type,
            compression,
            predictor,
            tiled,
            block_width,
            block_height,
            offsets,
            byte_counts,
        };

        let blocks = layout.block_count();
        if layout.offsets.len() < blocks || layout.byte_counts.len() < blocks {
            return Err(TiffError::GenericError(format!(
                "Expected {} blocks, found {} offsets and {} byte counts",
                blocks, layout.offsets.len(), layout.byte_counts.len())));
        }

        debug!("Pixel layout: {}x{}, {} x {}-bit {}, {} {}x{} blocks, compression {}, predictor {}",
               width, height, samples_per_pixel, sample_type.bits, sample_type.format.name(),
               blocks, block_width, block_height, compression, predictor);

        Ok(layout)
    }

    /// Reads BitsPerSample and SampleFormat, which must agree across bands
    fn read_sample_type(tiff: &TiffReader, reader: &mut dyn SeekableReader, ifd: &IFD) -> TiffResult<SampleType> {
        let bits = if ifd.has_tag(tags::BITS_PER_SAMPLE) {
            tiff.read_tag_values(reader, ifd, tags::BITS_PER_SAMPLE)?
        } else {
            vec![1]
        };
        let formats = if ifd.has_tag(tags::SAMPLE_FORMAT) {
            tiff.read_tag_values(reader, ifd, tags::SAMPLE_FORMAT)?
        } else {
            vec![sample_format::UNSIGNED]
        };

        if bits.windows(2).any(|w| w[0] != w[1]) || formats.windows(2).any(|w| w[0] != w[1]) {
            return Err(TiffError::UnsupportedLayout("mixed sample types across bands".to_string()));
        }

        let format = SampleFormat::from_code(formats[0])?;
        SampleType::new(format, bits[0] as u16)
    }

    /// Blocks per block row
    pub fn blocks_across(&self) -> u32 {
        self.width.div_ceil(self.block_width)
    }

    /// Block rows
    pub fn blocks_down(&self) -> u32 {
        self.height.div_ceil(self.block_height)
    }

    /// Total number of blocks
    pub fn block_count(&self) -> usize {
        self.blocks_across() as usize * self.blocks_down() as usize
    }

    /// Rows stored in blocks of the given block row
    pub fn block_rows(&self, block_row: u32) -> u32 {
        if self.tiled {
            self.block_height
        } else {
            let start = block_row * self.block_height;
            self.block_height.min(self.height - start)
        }
    }

    /// Decoded size in bytes of a block with the given row count
    pub fn block_bytes(&self, rows: u32) -> usize {
        self.block_width as usize * rows as usize * self.samples_per_pixel * self.sample_type.bytes()
    }
}
