//! Windowed pixel extraction
//!
//! Reads only the strips or tiles that intersect a requested region,
//! decompresses them, undoes the predictor and hands every sample inside
//! the region to a visitor callback. Uncompressed blocks are read row-wise,
//! so a single-strip image only loads the rows a window covers.

use log::debug;
use std::io::{Read, Seek, SeekFrom};
use std::ops::Range;

use crate::compression::{CompressionFactory, CompressionHandler};
use crate::io::byte_order::{ByteOrder, ByteOrderHandler};
use crate::io::seekable::SeekableReader;
use crate::tiff::constants::{compression, predictor};
use crate::tiff::errors::{TiffError, TiffResult};

use super::layout::PixelLayout;
use super::predictor::{undo_floating_point, undo_horizontal};
use super::region::Region;

/// Decoded rows of one block
struct CachedBlock {
    index: usize,
    /// First block row held in `data`
    first_row: u32,
    rows: u32,
    data: Vec<u8>,
}

impl CachedBlock {
    fn covers(&self, index: usize, wanted: &Range<u32>) -> bool {
        self.index == index && self.first_row <= wanted.start && wanted.end <= self.first_row + self.rows
    }
}

/// Decodes pixel windows from one image directory
pub struct BlockReader<R: SeekableReader> {
    reader: R,
    layout: PixelLayout,
    byte_order: ByteOrder,
    handler: Box<dyn ByteOrderHandler>,
    decompressor: Box<dyn CompressionHandler>,
    /// Last decoded block
    cached: Option<CachedBlock>,
}

impl<R: SeekableReader> BlockReader<R> {
    /// Create a block reader
    ///
    /// # Arguments
    /// * `reader` - Stream over the TIFF file
    /// * `layout` - Layout of the directory to read
    /// * `byte_order` - Byte order declared in the file header
    ///
    /// # Returns
    /// The reader, or an error for unsupported compression
    pub fn new(reader: R, layout: PixelLayout, byte_order: ByteOrder) -> TiffResult<Self> {
        let decompressor = CompressionFactory::create_handler(layout.compression)?;
        debug!("Block reader using {} decompression", decompressor.name());

        Ok(BlockReader {
            reader,
            layout,
            byte_order,
            handler: byte_order.create_handler(),
            decompressor,
            cached: None,
        })
    }

    /// The layout being decoded
    pub fn layout(&self) -> &PixelLayout {
        &self.layout
    }

    /// Visits every sample of the first `bands` bands inside `region`
    ///
    /// The region is cropped to the image first; a region entirely outside
    /// the image visits nothing. Samples are visited block by block, so the
    /// visitor must not assume row-major order across the whole region.
    ///
    /// # Arguments
    /// * `region` - Pixel window to read
    /// * `bands` - Number of leading bands to decode
    /// * `visit` - Called with `(x, y, band, value)` in image coordinates
    pub fn read_region<F>(&mut self, region: Region, bands: usize, mut visit: F) -> TiffResult<()>
    where
        F: FnMut(u32, u32, usize, f64),
    {
        let region = match region.clamp_to(self.layout.width, self.layout.height) {
            Some(region) => region,
            None => return Ok(()),
        };

        let bands = bands.min(self.layout.samples_per_pixel);
        let block_width = self.layout.block_width;
        let block_height = self.layout.block_height;
        let blocks_across = self.layout.blocks_across();

        for block_row in region.y / block_height..=(region.end_y() - 1) / block_height {
            let rows = self.layout.block_rows(block_row);
            let block_y0 = block_row * block_height;

            let y_start = region.y.max(block_y0);
            let y_end = region.end_y().min(block_y0 + rows);

            for block_col in region.x / block_width..=(region.end_x() - 1) / block_width {
                let index = (block_row * blocks_across + block_col) as usize;
                self.load_block(index, rows, y_start - block_y0..y_end - block_y0)?;

                let block = match &self.cached {
                    Some(block) => block,
                    None => continue,
                };

                let block_x0 = block_col * block_width;
                let x_end = region.end_x().min(block_x0 + block_width);
                let spp = self.layout.samples_per_pixel;
                let bytes = self.layout.sample_type.bytes();

                for y in y_start..y_end {
                    let row_start = (y - block_y0 - block.first_row) as usize * block_width as usize;
                    for x in region.x.max(block_x0)..x_end {
                        let pixel = (row_start + (x - block_x0) as usize) * spp;
                        for band in 0..bands {
                            let offset = (pixel + band) * bytes;
                            let value = self.layout.sample_type.decode(&block.data[offset..], self.handler.as_ref());
                            visit(x, y, band, value);
                        }
                    }
                }
            }
        }

        Ok(())
    }

    /// Decodes the `wanted` rows of a block into the cache unless they are already there
    ///
    /// Compressed blocks are always decoded whole.
    fn load_block(&mut self, index: usize, rows: u32, wanted: Range<u32>) -> TiffResult<()> {
        if self.cached.as_ref().is_some_and(|cached| cached.covers(index, &wanted)) {
            return Ok(());
        }

        let expected = self.layout.block_bytes(rows);
        let offset = self.layout.offsets[index];
        let byte_count = self.layout.byte_counts[index];

        // Sparse block: nothing stored, reads as zero
        if offset == 0 || byte_count == 0 {
            self.cached = Some(CachedBlock { index, first_row: 0, rows, data: vec![0u8; expected] });
            return Ok(());
        }

        let (first_row, rows, mut block) = if self.layout.compression == compression::NONE {
            let row_bytes = self.layout.block_bytes(1);
            let start = wanted.start as usize * row_bytes;
            let end = wanted.end as usize * row_bytes;
            if (byte_count as usize) < end {
                return Err(TiffError::TruncatedBlock { index, expected, actual: byte_count as usize });
            }

            self.reader.seek(SeekFrom::Start(offset + start as u64))?;
            let mut data = vec![0u8; end - start];
            self.reader.read_exact(&mut data)?;
            (wanted.start, wanted.end - wanted.start, data)
        } else {
            self.reader.seek(SeekFrom::Start(offset))?;
            let mut compressed = vec![0u8; byte_count as usize];
            self.reader.read_exact(&mut compressed)?;

            let mut data = self.decompressor.decompress(&compressed, expected)?;
            if data.len() < expected {
                return Err(TiffError::TruncatedBlock { index, expected, actual: data.len() });
            }
            data.truncate(expected);
            (0, rows, data)
        };

        // Predictors work within a row, so a partial block decodes the same way
        let row_samples = self.layout.block_width as usize * self.layout.samples_per_pixel;
        let spp = self.layout.samples_per_pixel;
        let bytes = self.layout.sample_type.bytes();
        match self.layout.predictor {
            predictor::HORIZONTAL_DIFFERENCING => {
                undo_horizontal(&mut block, row_samples, spp, bytes, self.handler.as_ref())?;
            },
            predictor::FLOATING_POINT => {
                undo_floating_point(&mut block, row_samples, spp, bytes, self.byte_order)?;
            },
            _ => {},
        }

        self.cached = Some(CachedBlock { index, first_row, rows, data: block });
        Ok(())
    }
}
