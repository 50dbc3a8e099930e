//! Region structure for defining a pixel window
//!
//! Coordinates are in pixels with (0,0) at the top-left corner of the
//! image. A region may extend past the image; [`Region::clamp_to`] crops
//! it before any data is read.

/// Rectangular pixel window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    /// X-coordinate of the top-left corner (pixels from left)
    pub x: u32,

    /// Y-coordinate of the top-left corner (pixels from top)
    pub y: u32,

    /// Width of the region in pixels
    pub width: u32,

    /// Height of the region in pixels
    pub height: u32,
}

impl Region {
    /// Create a new region
    ///
    /// # Arguments
    /// * `x` - X-coordinate of the top-left corner
    /// * `y` - Y-coordinate of the top-left corner
    /// * `width` - Width of the region in pixels
    /// * `height` - Height of the region in pixels
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Region { x, y, width, height }
    }

    /// Get the rightmost X coordinate (exclusive)
    pub fn end_x(&self) -> u32 {
        self.x.saturating_add(self.width)
    }

    /// Get the bottommost Y coordinate (exclusive)
    pub fn end_y(&self) -> u32 {
        self.y.saturating_add(self.height)
    }

    /// Number of pixels covered
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Whether the region covers no pixels
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Crops the region to an image of the given size
    ///
    /// # Returns
    /// The intersection, or `None` when the region lies entirely outside
    pub fn clamp_to(&self, image_width: u32, image_height: u32) -> Option<Region> {
        if self.x >= image_width || self.y >= image_height {
            return None;
        }

        let region = Region {
            x: self.x,
            y: self.y,
            width: self.end_x().min(image_width) - self.x,
            height: self.end_y().min(image_height) - self.y,
        };

        if region.is_empty() { None } else { Some(region) }
    }

    /// Whether the pixel lies inside the region
    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && x < self.end_x() && y >= self.y && y < self.end_y()
    }
}
