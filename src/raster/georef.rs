//! GeoTIFF georeferencing
//!
//! Reads the affine transform from ModelTransformation, or from
//! ModelPixelScale + ModelTiepoint, and the CRS from the GeoKey directory.
//! A GDAL_NODATA tag, when present, is parsed alongside.

use log::{debug, warn};

use crate::coordinate::CoordinateSystem;
use crate::io::seekable::SeekableReader;
use crate::tiff::constants::tags;
use crate::tiff::errors::TiffResult;
use crate::tiff::geo_keys::GeoKeyDirectory;
use crate::tiff::ifd::IFD;
use crate::tiff::reader::TiffReader;

use super::transform::GeoTransform;

/// Georeferencing read from one image directory
#[derive(Debug, Clone)]
pub struct GeoReference {
    /// Pixel-to-world transform (corner-based)
    pub transform: Option<GeoTransform>,
    /// EPSG code from the GeoKeys
    pub epsg: Option<u32>,
    /// NoData marker value
    pub nodata: Option<f64>,
    /// Whether the file declared RasterPixelIsPoint
    pub pixel_is_point: bool,
    /// GTCitationGeoKey text
    pub citation: Option<String>,
}

impl GeoReference {
    /// Reads all georeferencing tags of a directory
    ///
    /// Missing tags are reported as `None`; only malformed payloads fail.
    pub fn read(tiff: &TiffReader, reader: &mut dyn SeekableReader, ifd: &IFD) -> TiffResult<Self> {
        let keys = if ifd.has_tag(tags::GEO_KEY_DIRECTORY_TAG) {
            GeoKeyDirectory::parse(&tiff.read_tag_values(reader, ifd, tags::GEO_KEY_DIRECTORY_TAG)?)?
        } else {
            GeoKeyDirectory::default()
        };

        let pixel_is_point = keys.is_pixel_is_point();
        let transform = Self::read_transform(tiff, reader, ifd)?
            .map(|t| if pixel_is_point { Self::shift_to_corner(t) } else { t });

        let citation = if ifd.has_tag(tags::GEO_ASCII_PARAMS_TAG) {
            let ascii = tiff.read_tag_ascii(reader, ifd, tags::GEO_ASCII_PARAMS_TAG)?;
            keys.citation(&ascii)
        } else {
            None
        };

        let nodata = if ifd.has_tag(tags::GDAL_NODATA) {
            let text = tiff.read_tag_ascii(reader, ifd, tags::GDAL_NODATA)?;
            match text.trim().parse::<f64>() {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!("Ignoring unparsable GDAL_NODATA value {:?}", text);
                    None
                },
            }
        } else {
            None
        };

        let georef = GeoReference {
            transform,
            epsg: keys.epsg_code(),
            nodata,
            pixel_is_point,
            citation,
        };
        debug!("Georeference: {:?}", georef);
        Ok(georef)
    }

    /// CRS derived from the EPSG code
    pub fn crs(&self) -> Option<CoordinateSystem> {
        self.epsg.map(CoordinateSystem::from_epsg)
    }

    fn read_transform(tiff: &TiffReader, reader: &mut dyn SeekableReader, ifd: &IFD) -> TiffResult<Option<GeoTransform>> {
        if ifd.has_tag(tags::MODEL_TRANSFORMATION_TAG) {
            let m = tiff.read_tag_doubles(reader, ifd, tags::MODEL_TRANSFORMATION_TAG)?;
            if m.len() >= 16 {
                return Ok(Some(GeoTransform::new([m[3], m[0], m[1], m[7], m[4], m[5]])));
            }
            warn!("ModelTransformationTag has {} values, expected 16", m.len());
        }

        if ifd.has_tag(tags::MODEL_PIXEL_SCALE_TAG) && ifd.has_tag(tags::MODEL_TIEPOINT_TAG) {
            let scale = tiff.read_tag_doubles(reader, ifd, tags::MODEL_PIXEL_SCALE_TAG)?;
            let tie = tiff.read_tag_doubles(reader, ifd, tags::MODEL_TIEPOINT_TAG)?;
            if scale.len() >= 2 && tie.len() >= 6 {
                let (i, j, x, y) = (tie[0], tie[1], tie[3], tie[4]);
                let (sx, sy) = (scale[0], scale[1]);
                return Ok(Some(GeoTransform::new([x - i * sx, sx, 0.0, y + j * sy, 0.0, -sy])));
            }
            warn!("Pixel scale / tiepoint tags are too short ({} / {} values)", scale.len(), tie.len());
        }

        Ok(None)
    }

    /// Moves a pixel-centre referenced transform to the pixel corner
    fn shift_to_corner(transform: GeoTransform) -> GeoTransform {
        let [c, a, b, f, d, e] = transform.coefficients;
        GeoTransform::new([c - 0.5 * a - 0.5 * b, a, b, f - 0.5 * d - 0.5 * e, d, e])
    }
}
