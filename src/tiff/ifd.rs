//! Image File Directory (IFD) structures
//!
//! An IFD is a flat list of tag entries describing one image. Entries whose
//! payload fits into the entry's value field carry it inline; the rest point
//! at an offset elsewhere in the file.

use std::collections::HashMap;
use std::fmt;
use log::trace;

use crate::tiff::constants::{field_types, tags};

/// Represents an Image File Directory (IFD) in a TIFF file
#[derive(Debug, Clone)]
pub struct IFD {
    /// Entries in this IFD, in file order
    pub entries: Vec<IFDEntry>,
    /// IFD number (0-based)
    pub number: usize,
    /// Offset to this IFD in the file
    pub offset: u64,
    /// Index into `entries` by tag
    tag_map: HashMap<u16, usize>,
}

/// Represents an entry in an Image File Directory (IFD)
#[derive(Debug, Clone)]
pub struct IFDEntry {
    /// TIFF tag identifier
    pub tag: u16,
    /// Field type
    pub field_type: u16,
    /// Number of values
    pub count: u64,
    /// Value field interpreted as an offset
    pub value_offset: u64,
    /// Raw bytes of the value field (4 used for classic TIFF, 8 for BigTIFF)
    pub raw_value: [u8; 8],
    /// Decoded value for single unsigned integer entries
    pub scalar: Option<u64>,
}

impl IFDEntry {
    /// Creates a new IFD entry
    pub fn new(tag: u16, field_type: u16, count: u64, value_offset: u64, raw_value: [u8; 8], scalar: Option<u64>) -> Self {
        IFDEntry {
            tag,
            field_type,
            count,
            value_offset,
            raw_value,
            scalar,
        }
    }

    /// Total payload size in bytes, if the field type is known
    pub fn payload_len(&self) -> Option<u64> {
        field_types::size_of(self.field_type).map(|size| size as u64 * self.count)
    }

    /// Whether the payload is stored in the value field itself
    pub fn is_value_inline(&self, is_big_tiff: bool) -> bool {
        let inline_size = if is_big_tiff { 8 } else { 4 };
        let inline = self.payload_len().map(|len| len <= inline_size).unwrap_or(false);
        trace!("Tag {} payload {:?} bytes, inline: {}", self.tag, self.payload_len(), inline);
        inline
    }
}

impl IFD {
    /// Creates a new, empty IFD
    pub fn new(number: usize, offset: u64) -> Self {
        IFD {
            entries: Vec::new(),
            number,
            offset,
            tag_map: HashMap::new(),
        }
    }

    /// Adds an entry and indexes it by tag
    pub fn add_entry(&mut self, entry: IFDEntry) {
        self.tag_map.insert(entry.tag, self.entries.len());
        self.entries.push(entry);
    }

    /// Gets an IFD entry by tag
    pub fn get_entry(&self, tag: u16) -> Option<&IFDEntry> {
        self.tag_map.get(&tag).map(|&index| &self.entries[index])
    }

    /// Checks if this IFD has a specific tag
    pub fn has_tag(&self, tag: u16) -> bool {
        self.tag_map.contains_key(&tag)
    }

    /// Value of a single-valued unsigned integer tag
    ///
    /// Multi-valued tags (for example a per-sample BitsPerSample) report
    /// their first value when it fits inline; use
    /// [`TiffReader::read_tag_values`](crate::tiff::TiffReader::read_tag_values)
    /// for the full array.
    pub fn get_tag_value(&self, tag: u16) -> Option<u64> {
        self.get_entry(tag).and_then(|entry| entry.scalar)
    }

    /// Gets the dimensions of the image described by this IFD
    pub fn get_dimensions(&self) -> Option<(u64, u64)> {
        let width = self.get_tag_value(tags::IMAGE_WIDTH)?;
        let height = self.get_tag_value(tags::IMAGE_LENGTH)?;
        Some((width, height))
    }

    /// Returns number of samples per pixel (default 1 if not specified)
    pub fn get_samples_per_pixel(&self) -> u64 {
        self.get_tag_value(tags::SAMPLES_PER_PIXEL).unwrap_or(1)
    }

    /// Whether pixel data is organised in tiles rather than strips
    pub fn is_tiled(&self) -> bool {
        self.has_tag(tags::TILE_WIDTH) && self.has_tag(tags::TILE_OFFSETS)
    }
}

impl fmt::Display for IFD {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "IFD #{} (offset: {})", self.number, self.offset)?;
        writeln!(f, "  Number of entries: {}", self.entries.len())?;

        if let Some((width, height)) = self.get_dimensions() {
            writeln!(f, "  Dimensions: {}x{}", width, height)?;
        }

        writeln!(f, "  Samples per pixel: {}", self.get_samples_per_pixel())?;
        writeln!(f, "  Layout: {}", if self.is_tiled() { "tiled" } else { "stripped" })
    }
}
