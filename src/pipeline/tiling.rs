//! Tile enumeration over a raster's pixel grid
//!
//! Windows are generated row-major from the top-left corner. A window may
//! reach past the right or bottom edge; the [`TileSource`] crops it, so
//! border tiles come back smaller than the nominal window.

use image::RgbImage;

use crate::errors::{TreeKitError, TreeKitResult};
use crate::extractor::Region;
use crate::raster::GeoRaster;

/// Anything that can produce the RGB pixels of a window
pub trait TileSource {
    /// Reads `region`, cropped to the source's extent
    fn read_tile(&mut self, region: Region) -> TreeKitResult<RgbImage>;
}

impl TileSource for GeoRaster {
    fn read_tile(&mut self, region: Region) -> TreeKitResult<RgbImage> {
        self.read_rgb(region)
    }
}

/// One window of the primary raster, ready for the detector
#[derive(Debug, Clone)]
pub struct Tile {
    /// Column of the window's top-left pixel
    pub origin_x: u32,
    /// Row of the window's top-left pixel
    pub origin_y: u32,
    /// Cropped tile pixels
    pub image: RgbImage,
}

impl Tile {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Tiling geometry for a raster of known size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileGrid {
    raster_width: u32,
    raster_height: u32,
    step: u32,
    window_width: u32,
    window_height: u32,
}

impl TileGrid {
    /// Create a tiling
    ///
    /// # Arguments
    /// * `raster_width`, `raster_height` - Pixel grid size
    /// * `step` - Distance between consecutive window origins
    /// * `window_width`, `window_height` - Nominal window size
    ///
    /// # Returns
    /// The grid, or a configuration error if the step or window is zero
    pub fn new(raster_width: u32, raster_height: u32, step: u32, window_width: u32, window_height: u32) -> TreeKitResult<Self> {
        if step == 0 || window_width == 0 || window_height == 0 {
            return Err(TreeKitError::Config(format!(
                "tile step ({}) and window ({}x{}) must be positive", step, window_width, window_height)));
        }

        Ok(TileGrid { raster_width, raster_height, step, window_width, window_height })
    }

    /// Square, non-overlapping tiles of `size` pixels
    pub fn square(raster_width: u32, raster_height: u32, size: u32) -> TreeKitResult<Self> {
        Self::new(raster_width, raster_height, size, size, size)
    }

    /// Number of tiles along each axis, `(across, down)`
    pub fn dimensions(&self) -> (u32, u32) {
        (self.raster_width.div_ceil(self.step), self.raster_height.div_ceil(self.step))
    }

    /// Total number of tiles
    pub fn tile_count(&self) -> usize {
        let (across, down) = self.dimensions();
        across as usize * down as usize
    }

    /// Enumerates the nominal windows without reading pixels
    ///
    /// Each call starts a fresh pass over the grid.
    pub fn regions(&self) -> impl Iterator<Item = Region> + '_ {
        (0..self.raster_height).step_by(self.step as usize).flat_map(move |y| {
            (0..self.raster_width).step_by(self.step as usize)
                .map(move |x| Region::new(x, y, self.window_width, self.window_height))
        })
    }

    /// Pairs every window with its pixels, one tile at a time
    pub fn tiles<'a, S: TileSource + ?Sized>(&'a self, source: &'a mut S) -> Tiles<'a, S> {
        Tiles {
            regions: Box::new(self.regions()),
            source,
        }
    }
}

/// Lazy iterator over the tiles of a [`TileGrid`]
pub struct Tiles<'a, S: TileSource + ?Sized> {
    regions: Box<dyn Iterator<Item = Region> + 'a>,
    source: &'a mut S,
}

impl<S: TileSource + ?Sized> Iterator for Tiles<'_, S> {
    type Item = TreeKitResult<Tile>;

    fn next(&mut self) -> Option<Self::Item> {
        let region = self.regions.next()?;
        Some(self.source.read_tile(region).map(|image| Tile {
            origin_x: region.x,
            origin_y: region.y,
            image,
        }))
    }
}
