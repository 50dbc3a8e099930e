//! TIFF/BigTIFF structure reader
//!
//! Parses the file header and the chain of image directories, and decodes
//! tag payloads on demand. Pixel data is not touched here; see
//! [`crate::extractor`] for block decoding.

use log::{debug, info, warn};
use std::collections::HashSet;
use std::io::SeekFrom;

use crate::io::byte_order::{ByteOrder, ByteOrderHandler};
use crate::io::seekable::SeekableReader;
use crate::tiff::constants::{field_types, header};
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::ifd::{IFD, IFDEntry};
use crate::tiff::types::TIFF;

/// Upper bound on directories followed in one file
const MAX_IFDS: usize = 1024;

/// Reader for TIFF and BigTIFF files
///
/// Created from the file header; holds the byte order strategy and the
/// offset geometry (classic or BigTIFF) every later read depends on.
pub struct TiffReader {
    byte_order: ByteOrder,
    handler: Box<dyn ByteOrderHandler>,
    is_big_tiff: bool,
    first_ifd_offset: u64,
}

impl TiffReader {
    /// Reads and validates the file header
    ///
    /// # Arguments
    /// * `reader` - Stream positioned anywhere; the header is read from offset 0
    ///
    /// # Returns
    /// A reader bound to the file's byte order and offset size
    pub fn from_header(reader: &mut dyn SeekableReader) -> TiffResult<Self> {
        reader.seek(SeekFrom::Start(0))?;
        let byte_order = ByteOrder::detect(reader)?;
        let handler = byte_order.create_handler();

        let version = handler.read_u16(reader)?;
        let (is_big_tiff, first_ifd_offset) = match version {
            header::TIFF_VERSION => (false, handler.read_u32(reader)? as u64),
            header::BIG_TIFF_VERSION => {
                let offset_size = handler.read_u16(reader)?;
                let reserved = handler.read_u16(reader)?;
                if offset_size != header::BIGTIFF_OFFSET_SIZE || reserved != 0 {
                    return Err(TiffError::InvalidBigTIFFHeader);
                }
                (true, handler.read_u64(reader)?)
            },
            other => return Err(TiffError::UnsupportedVersion(other)),
        };

        debug!("TIFF header: {}, BigTIFF: {}, first IFD at {}",
               byte_order.name(), is_big_tiff, first_ifd_offset);

        Ok(TiffReader {
            byte_order,
            handler,
            is_big_tiff,
            first_ifd_offset,
        })
    }

    /// Reads the header and every directory in the chain
    ///
    /// # Arguments
    /// * `reader` - Any struct implementing the SeekableReader trait
    ///
    /// # Returns
    /// The reader together with the parsed directory structure
    pub fn read(reader: &mut dyn SeekableReader) -> TiffResult<(Self, TIFF)> {
        let tiff_reader = Self::from_header(reader)?;
        let ifds = tiff_reader.read_ifd_chain(reader)?;
        if ifds.is_empty() {
            return Err(TiffError::NoImageDirectory);
        }

        info!("Read {} IFDs ({})", ifds.len(), if tiff_reader.is_big_tiff { "BigTIFF" } else { "TIFF" });
        let tiff = TIFF {
            ifds,
            is_big_tiff: tiff_reader.is_big_tiff,
            byte_order: tiff_reader.byte_order,
        };
        Ok((tiff_reader, tiff))
    }

    /// Follows the next-IFD links starting at the header's first offset
    fn read_ifd_chain(&self, reader: &mut dyn SeekableReader) -> TiffResult<Vec<IFD>> {
        let file_size = reader.seek(SeekFrom::End(0))?;
        let mut ifds = Vec::new();
        let mut visited = HashSet::new();
        let mut offset = self.first_ifd_offset;

        while offset != 0 && ifds.len() < MAX_IFDS {
            if offset >= file_size {
                if ifds.is_empty() {
                    return Err(TiffError::GenericError(format!(
                        "First IFD offset {} exceeds file size {}", offset, file_size)));
                }
                warn!("IFD offset {} exceeds file size {}, stopping IFD chain", offset, file_size);
                break;
            }
            if !visited.insert(offset) {
                warn!("IFD chain loops back to offset {}, stopping", offset);
                break;
            }

            let (ifd, next) = self.read_ifd(reader, offset, ifds.len())?;
            ifds.push(ifd);
            offset = next;
        }

        Ok(ifds)
    }

    /// Reads one IFD and the offset of the next one
    ///
    /// # Arguments
    /// * `reader` - The seekable reader to use
    /// * `offset` - Offset in the file where the IFD starts
    /// * `number` - The index of this IFD in the file
    ///
    /// # Returns
    /// The parsed IFD and the next IFD offset (0 when last)
    pub fn read_ifd(&self, reader: &mut dyn SeekableReader, offset: u64, number: usize) -> TiffResult<(IFD, u64)> {
        reader.seek(SeekFrom::Start(offset))?;

        let entry_count = if self.is_big_tiff {
            self.handler.read_u64(reader)?
        } else {
            self.handler.read_u16(reader)? as u64
        };
        debug!("IFD #{} at {} has {} entries", number, offset, entry_count);

        let mut ifd = IFD::new(number, offset);
        for _ in 0..entry_count {
            let entry = self.read_ifd_entry(reader)?;
            ifd.add_entry(entry);
        }

        let next = if self.is_big_tiff {
            self.handler.read_u64(reader)?
        } else {
            self.handler.read_u32(reader)? as u64
        };

        Ok((ifd, next))
    }

    /// Reads a single 12-byte (or 20-byte BigTIFF) directory entry
    fn read_ifd_entry(&self, reader: &mut dyn SeekableReader) -> TiffResult<IFDEntry> {
        let tag = self.handler.read_u16(reader)?;
        let field_type = self.handler.read_u16(reader)?;

        let mut raw_value = [0u8; 8];
        let (count, value_offset) = if self.is_big_tiff {
            let count = self.handler.read_u64(reader)?;
            reader.read_exact(&mut raw_value)?;
            (count, self.handler.u64_at(&raw_value))
        } else {
            let count = self.handler.read_u32(reader)? as u64;
            reader.read_exact(&mut raw_value[..4])?;
            (count, self.handler.u32_at(&raw_value) as u64)
        };

        let mut entry = IFDEntry::new(tag, field_type, count, value_offset, raw_value, None);
        if count >= 1 && entry.is_value_inline(self.is_big_tiff) {
            entry.scalar = self.decode_unsigned(field_type, &raw_value);
        }

        Ok(entry)
    }

    /// Decodes the first unsigned integer of the given type from a buffer
    fn decode_unsigned(&self, field_type: u16, bytes: &[u8]) -> Option<u64> {
        match field_type {
            field_types::BYTE | field_types::UNDEFINED => bytes.first().map(|&b| b as u64),
            field_types::SHORT => Some(self.handler.u16_at(bytes) as u64),
            field_types::LONG | field_types::IFD => Some(self.handler.u32_at(bytes) as u64),
            field_types::LONG8 | field_types::IFD8 => Some(self.handler.u64_at(bytes)),
            _ => None,
        }
    }

    /// Reads the raw payload bytes of an entry
    ///
    /// # Arguments
    /// * `reader` - The seekable reader to use
    /// * `entry` - The directory entry whose payload to fetch
    ///
    /// # Returns
    /// Exactly `count * size_of(field_type)` bytes
    pub fn read_entry_bytes(&self, reader: &mut dyn SeekableReader, entry: &IFDEntry) -> TiffResult<Vec<u8>> {
        let len = entry.payload_len()
            .ok_or(TiffError::UnsupportedFieldType(entry.field_type))? as usize;

        if entry.is_value_inline(self.is_big_tiff) {
            return Ok(entry.raw_value[..len].to_vec());
        }

        reader.seek(SeekFrom::Start(entry.value_offset))?;
        let mut buffer = vec![0u8; len];
        reader.read_exact(&mut buffer)?;
        Ok(buffer)
    }

    /// Reads a tag's values as unsigned integers
    ///
    /// # Arguments
    /// * `reader` - The seekable reader to use
    /// * `ifd` - The IFD containing the tag
    /// * `tag` - The tag number to read
    ///
    /// # Returns
    /// One u64 per stored value
    pub fn read_tag_values(&self, reader: &mut dyn SeekableReader, ifd: &IFD, tag: u16) -> TiffResult<Vec<u64>> {
        let entry = ifd.get_entry(tag).ok_or(TiffError::TagNotFound(tag))?;
        let size = field_types::size_of(entry.field_type)
            .ok_or(TiffError::UnsupportedFieldType(entry.field_type))?;
        let bytes = self.read_entry_bytes(reader, entry)?;

        bytes.chunks_exact(size)
            .map(|chunk| self.decode_unsigned(entry.field_type, chunk)
                .ok_or(TiffError::UnsupportedFieldType(entry.field_type)))
            .collect()
    }

    /// Reads a tag's values as doubles
    ///
    /// Accepts DOUBLE and FLOAT payloads, which is how the GeoTIFF model
    /// tags and GeoDoubleParams are stored.
    pub fn read_tag_doubles(&self, reader: &mut dyn SeekableReader, ifd: &IFD, tag: u16) -> TiffResult<Vec<f64>> {
        let entry = ifd.get_entry(tag).ok_or(TiffError::TagNotFound(tag))?;
        let bytes = self.read_entry_bytes(reader, entry)?;

        match entry.field_type {
            field_types::DOUBLE => Ok(bytes.chunks_exact(8).map(|c| self.handler.f64_at(c)).collect()),
            field_types::FLOAT => Ok(bytes.chunks_exact(4).map(|c| self.handler.f32_at(c) as f64).collect()),
            other => Err(TiffError::UnsupportedFieldType(other)),
        }
    }

    /// Reads an ASCII tag, trimming the trailing NUL terminator(s)
    pub fn read_tag_ascii(&self, reader: &mut dyn SeekableReader, ifd: &IFD, tag: u16) -> TiffResult<String> {
        let entry = ifd.get_entry(tag).ok_or(TiffError::TagNotFound(tag))?;
        let mut bytes = self.read_entry_bytes(reader, entry)?;
        while bytes.last() == Some(&0) {
            bytes.pop();
        }

        String::from_utf8(bytes)
            .map_err(|e| TiffError::GenericError(format!("Invalid ASCII in tag {}: {}", tag, e)))
    }

    /// The byte order strategy for this file
    pub fn handler(&self) -> &dyn ByteOrderHandler {
        self.handler.as_ref()
    }

    /// The byte order declared in the header
    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    /// Returns whether the current file is a BigTIFF
    pub fn is_big_tiff(&self) -> bool {
        self.is_big_tiff
    }
}
