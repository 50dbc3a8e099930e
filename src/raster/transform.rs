//! Affine pixel-to-world transform
//!
//! Coefficients follow the GDAL order `[c, a, b, f, d, e]`:
//!
//! ```text
//! x = c + a * col + b * row
//! y = f + d * col + e * row
//! ```

use crate::coordinate::Point;

/// Affine georeferencing of a raster grid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform {
    pub coefficients: [f64; 6],
}

impl GeoTransform {
    pub fn new(coefficients: [f64; 6]) -> Self {
        GeoTransform { coefficients }
    }

    /// North-up transform from the top-left corner and positive pixel sizes
    pub fn from_origin(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        GeoTransform::new([origin_x, pixel_width, 0.0, origin_y, 0.0, -pixel_height])
    }

    /// Maps fractional pixel coordinates to world coordinates
    pub fn apply(&self, col: f64, row: f64) -> Point {
        let [c, a, b, f, d, e] = self.coefficients;
        Point::new(c + a * col + b * row, f + d * col + e * row)
    }

    fn determinant(&self) -> f64 {
        let [_, a, b, _, d, e] = self.coefficients;
        a * e - b * d
    }

    /// Whether all coefficients are finite and the matrix is invertible
    pub fn is_invertible(&self) -> bool {
        let det = self.determinant();
        self.coefficients.iter().all(|c| c.is_finite()) && det.is_finite() && det != 0.0
    }

    /// The world-to-pixel transform, if one exists
    pub fn inverse(&self) -> Option<GeoTransform> {
        if !self.is_invertible() {
            return None;
        }

        let [c, a, b, f, d, e] = self.coefficients;
        let det = self.determinant();
        let ia = e / det;
        let ib = -b / det;
        let id = -d / det;
        let ie = a / det;

        Some(GeoTransform::new([
            -c * ia - f * ib, ia, ib,
            -c * id - f * ie, id, ie,
        ]))
    }

    /// Row and column of the cell containing a world point
    ///
    /// `inverse` must be the result of [`GeoTransform::inverse`]. Indices are
    /// floored, so points left of or above the grid give negative values.
    /// Returns `None` when the point maps to a non-finite pixel position.
    pub fn cell_index(inverse: &GeoTransform, point: &Point) -> Option<(i64, i64)> {
        let pixel = inverse.apply(point.x, point.y);
        if !pixel.x.is_finite() || !pixel.y.is_finite() {
            return None;
        }
        Some((pixel.y.floor() as i64, pixel.x.floor() as i64))
    }
}
