//! GeoKey directory parsing
//!
//! The GeoKeyDirectoryTag is an array of SHORTs: a four-value header
//! (version, revision, minor revision, key count) followed by one
//! four-value entry per key (id, TIFF tag location, count, value/offset).
//! Keys with location 0 store their value inline; others index into
//! GeoDoubleParams or GeoAsciiParams.

use log::debug;

use crate::tiff::constants::{geo_keys, tags};
use crate::tiff::errors::{TiffError, TiffResult};

/// One key of the GeoKey directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeoKeyEntry {
    pub key_id: u16,
    pub tiff_tag_location: u16,
    pub count: u16,
    pub value_offset: u16,
}

impl GeoKeyEntry {
    /// Human-readable name of the keys this crate interprets
    pub fn name(&self) -> &'static str {
        match self.key_id {
            geo_keys::GT_MODEL_TYPE => "GTModelTypeGeoKey",
            geo_keys::GT_RASTER_TYPE => "GTRasterTypeGeoKey",
            geo_keys::GT_CITATION => "GTCitationGeoKey",
            geo_keys::GEOGRAPHIC_TYPE => "GeographicTypeGeoKey",
            geo_keys::PROJECTED_CS_TYPE => "ProjectedCSTypeGeoKey",
            _ => "Unknown",
        }
    }
}

/// Parsed GeoKey directory
#[derive(Debug, Clone, Default)]
pub struct GeoKeyDirectory {
    entries: Vec<GeoKeyEntry>,
}

impl GeoKeyDirectory {
    /// Parses the directory from the tag's SHORT values
    ///
    /// # Arguments
    /// * `values` - The GeoKeyDirectoryTag payload, one element per SHORT
    ///
    /// # Returns
    /// The parsed directory, or an error when the header or key table is cut short
    pub fn parse(values: &[u64]) -> TiffResult<Self> {
        if values.len() < 4 {
            return Err(TiffError::GenericError("Invalid GeoKey directory header".to_string()));
        }

        let key_count = values[3] as usize;
        if values.len() < 4 + key_count * 4 {
            return Err(TiffError::GenericError(format!(
                "GeoKey directory declares {} keys but holds {} values", key_count, values.len())));
        }

        debug!("GeoKey directory: version={}, revision={}.{}, keys={}",
               values[0], values[1], values[2], key_count);

        let entries = values[4..4 + key_count * 4]
            .chunks_exact(4)
            .map(|key| GeoKeyEntry {
                key_id: key[0] as u16,
                tiff_tag_location: key[1] as u16,
                count: key[2] as u16,
                value_offset: key[3] as u16,
            })
            .collect();

        Ok(GeoKeyDirectory { entries })
    }

    /// All keys in directory order
    pub fn entries(&self) -> &[GeoKeyEntry] {
        &self.entries
    }

    /// Looks up a key by id
    pub fn get(&self, key_id: u16) -> Option<&GeoKeyEntry> {
        self.entries.iter().find(|entry| entry.key_id == key_id)
    }

    /// Value of a key stored inline as a SHORT
    pub fn short_value(&self, key_id: u16) -> Option<u16> {
        self.get(key_id)
            .filter(|entry| entry.tiff_tag_location == 0)
            .map(|entry| entry.value_offset)
    }

    /// EPSG code of the raster's CRS
    ///
    /// A projected CRS code wins over the geographic one; user-defined
    /// (32767) and zero codes are ignored.
    pub fn epsg_code(&self) -> Option<u32> {
        let usable = |code: u16| code != 0 && code != geo_keys::USER_DEFINED;

        self.short_value(geo_keys::PROJECTED_CS_TYPE)
            .filter(|&code| usable(code))
            .or_else(|| self.short_value(geo_keys::GEOGRAPHIC_TYPE).filter(|&code| usable(code)))
            .map(u32::from)
    }

    /// Whether the tiepoint refers to pixel centres rather than corners
    pub fn is_pixel_is_point(&self) -> bool {
        self.short_value(geo_keys::GT_RASTER_TYPE) == Some(geo_keys::RASTER_PIXEL_IS_POINT)
    }

    /// Citation text, resolved against the GeoAsciiParams payload
    pub fn citation(&self, ascii_params: &str) -> Option<String> {
        let entry = self.get(geo_keys::GT_CITATION)?;
        if entry.tiff_tag_location != tags::GEO_ASCII_PARAMS_TAG {
            return None;
        }

        let start = entry.value_offset as usize;
        let end = start + entry.count as usize;
        ascii_params.get(start..end)
            .map(|text| text.trim_end_matches(['|', '\0']).to_string())
    }
}
