//! Read-only GeoTIFF dataset
//!
//! Opening parses the directory and georeferencing once; pixel windows are
//! decoded on demand so only one tile is resident at a time.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use image::{Rgb, RgbImage};
use log::{debug, info};

use crate::coordinate::CoordinateSystem;
use crate::errors::{TreeKitError, TreeKitResult};
use crate::extractor::{BlockReader, PixelLayout, Region, SampleType};
use crate::io::byte_order::ByteOrder;
use crate::tiff::reader::TiffReader;

use super::georef::GeoReference;
use super::transform::GeoTransform;

/// Limits checked when a raster is opened
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RasterLimits {
    /// Maximum width * height; `None` means unlimited
    pub max_pixels: Option<u64>,
}

/// An opened GeoTIFF
pub struct GeoRaster {
    path: PathBuf,
    blocks: BlockReader<BufReader<File>>,
    georef: GeoReference,
    transform: GeoTransform,
    is_big_tiff: bool,
    byte_order: ByteOrder,
    ifd_count: usize,
}

impl GeoRaster {
    /// Opens a raster and validates its georeferencing
    ///
    /// # Arguments
    /// * `path` - GeoTIFF file
    /// * `limits` - Size limit to enforce
    ///
    /// # Returns
    /// The dataset, or an error when the file is unreadable, too large, or
    /// has no invertible affine transform
    pub fn open(path: &Path, limits: &RasterLimits) -> TreeKitResult<Self> {
        info!("Opening raster {}", path.display());
        let file = File::open(path).map_err(|e| TreeKitError::raster(path, e.into()))?;
        let mut reader = BufReader::with_capacity(1024 * 1024, file);

        let (tiff_reader, tiff) = TiffReader::read(&mut reader)
            .map_err(|e| TreeKitError::raster(path, e))?;
        let ifd = tiff.main_ifd()
            .ok_or_else(|| TreeKitError::raster(path, crate::tiff::TiffError::NoImageDirectory))?;

        let layout = PixelLayout::from_ifd(&tiff_reader, &mut reader, ifd)
            .map_err(|e| TreeKitError::raster(path, e))?;

        let pixels = layout.width as u64 * layout.height as u64;
        if let Some(limit) = limits.max_pixels {
            if pixels > limit {
                return Err(TreeKitError::RasterTooLarge { path: path.to_path_buf(), pixels, limit });
            }
        }

        let georef = GeoReference::read(&tiff_reader, &mut reader, ifd)
            .map_err(|e| TreeKitError::raster(path, e))?;
        let transform = georef.transform.ok_or_else(|| TreeKitError::Georeference {
            path: path.to_path_buf(),
            reason: "no affine transform (ModelTransformation or PixelScale+Tiepoint)".to_string(),
        })?;
        if !transform.is_invertible() {
            return Err(TreeKitError::Georeference {
                path: path.to_path_buf(),
                reason: format!("affine transform {:?} is not invertible", transform.coefficients),
            });
        }

        let byte_order = tiff_reader.byte_order();
        let blocks = BlockReader::new(reader, layout, byte_order)
            .map_err(|e| TreeKitError::raster(path, e))?;

        let raster = GeoRaster {
            path: path.to_path_buf(),
            blocks,
            georef,
            transform,
            is_big_tiff: tiff.is_big_tiff,
            byte_order,
            ifd_count: tiff.ifd_count(),
        };
        info!("Raster {}: {}x{}, {} band(s), CRS {}",
              path.display(), raster.width(), raster.height(), raster.band_count(),
              raster.crs().map(|c| c.description()).unwrap_or_else(|| "unknown".to_string()));
        Ok(raster)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn width(&self) -> u32 {
        self.blocks.layout().width
    }

    pub fn height(&self) -> u32 {
        self.blocks.layout().height
    }

    pub fn band_count(&self) -> usize {
        self.blocks.layout().samples_per_pixel
    }

    pub fn layout(&self) -> &PixelLayout {
        self.blocks.layout()
    }

    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    pub fn georeference(&self) -> &GeoReference {
        &self.georef
    }

    pub fn crs(&self) -> Option<CoordinateSystem> {
        self.georef.crs()
    }

    pub fn nodata(&self) -> Option<f64> {
        self.georef.nodata
    }

    pub fn is_big_tiff(&self) -> bool {
        self.is_big_tiff
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    pub fn ifd_count(&self) -> usize {
        self.ifd_count
    }

    /// Reads a window as an 8-bit RGB image
    ///
    /// The window is cropped to the raster, so border windows come back
    /// smaller than requested. Single-band rasters are replicated into
    /// gray; rasters with three or more bands use the first three.
    /// Wider unsigned types are scaled into 0..=255; signed and float
    /// samples are clamped.
    ///
    /// Only the strips or tiles the window touches are read. Uncompressed
    /// strips are read row by row; a compressed strip is decoded whole, so
    /// a compressed single-strip raster holds its full image once per call.
    pub fn read_rgb(&mut self, region: Region) -> TreeKitResult<RgbImage> {
        let region = match region.clamp_to(self.width(), self.height()) {
            Some(region) => region,
            None => return Ok(RgbImage::new(0, 0)),
        };

        let sample_type = self.blocks.layout().sample_type;
        let scale = sample_type.unsigned_max().map(|max| 255.0 / max).unwrap_or(1.0);
        let bands = if self.band_count() >= 3 { 3 } else { 1 };
        let mut image = RgbImage::new(region.width, region.height);

        debug!("Reading RGB window {:?} from {}", region, self.path.display());
        let path = self.path.clone();
        self.blocks.read_region(region, bands, |x, y, band, value| {
            let byte = (value * scale).round().clamp(0.0, 255.0) as u8;
            let pixel: &mut Rgb<u8> = image.get_pixel_mut(x - region.x, y - region.y);
            if bands == 1 {
                *pixel = Rgb([byte, byte, byte]);
            } else {
                pixel.0[band] = byte;
            }
        }).map_err(|e| TreeKitError::raster(path, e))?;

        Ok(image)
    }

    /// Sample type of the pixel data
    pub fn sample_type(&self) -> SampleType {
        self.blocks.layout().sample_type
    }

    /// Reads a whole band as `f64`, row-major
    pub fn read_band(&mut self, band: usize) -> TreeKitResult<Vec<f64>> {
        self.read_band_with(band, f64::NAN, |value| value)
    }

    /// Reads a whole band as `f32`, row-major
    ///
    /// Lossless only for 32-bit float and narrow integer rasters.
    pub fn read_band_f32(&mut self, band: usize) -> TreeKitResult<Vec<f32>> {
        self.read_band_with(band, f32::NAN, |value| value as f32)
    }

    fn read_band_with<T, F>(&mut self, band: usize, fill: T, convert: F) -> TreeKitResult<Vec<T>>
    where
        T: Copy,
        F: Fn(f64) -> T,
    {
        if band >= self.band_count() {
            return Err(TreeKitError::Georeference {
                path: self.path.clone(),
                reason: format!("band {} requested, raster has {}", band + 1, self.band_count()),
            });
        }

        let width = self.width() as usize;
        let region = Region::new(0, 0, self.width(), self.height());
        let mut data = vec![fill; width * self.height() as usize];

        let path = self.path.clone();
        self.blocks.read_region(region, band + 1, |x, y, sample_band, value| {
            if sample_band == band {
                data[y as usize * width + x as usize] = convert(value);
            }
        }).map_err(|e| TreeKitError::raster(path, e))?;

        Ok(data)
    }
}
