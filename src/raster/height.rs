//! Canopy height lookup grid

use log::info;

use crate::coordinate::Point;
use crate::errors::{TreeKitError, TreeKitResult};

use crate::extractor::SampleFormat;

use super::dataset::GeoRaster;
use super::transform::GeoTransform;

/// Height cells in the precision the raster stores them
#[derive(Debug, Clone, PartialEq)]
pub enum HeightCells {
    Single(Vec<f32>),
    Double(Vec<f64>),
}

impl HeightCells {
    pub fn len(&self) -> usize {
        match self {
            HeightCells::Single(values) => values.len(),
            HeightCells::Double(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Vec<f32>> for HeightCells {
    fn from(values: Vec<f32>) -> Self {
        HeightCells::Single(values)
    }
}

impl From<Vec<f64>> for HeightCells {
    fn from(values: Vec<f64>) -> Self {
        HeightCells::Double(values)
    }
}

/// A single-band height raster held in memory for point lookups
pub struct HeightGrid {
    width: usize,
    height: usize,
    data: HeightCells,
    inverse: GeoTransform,
    nodata: Option<f64>,
}

impl HeightGrid {
    /// Loads band 1 of an opened raster
    ///
    /// 32-bit float rasters stay `f32`; every other sample type is held as
    /// `f64` so 64-bit floats and wide integers keep their precision.
    pub fn from_raster(raster: &mut GeoRaster) -> TreeKitResult<Self> {
        let sample_type = raster.sample_type();
        let data = if sample_type.format == SampleFormat::Float && sample_type.bits == 32 {
            HeightCells::Single(raster.read_band_f32(0)?)
        } else {
            HeightCells::Double(raster.read_band(0)?)
        };
        info!("Loaded height grid {}x{} from {}", raster.width(), raster.height(), raster.path().display());
        Self::from_parts(raster.width() as usize, raster.height() as usize, data, *raster.transform(), raster.nodata())
    }

    /// Builds a grid from raw row-major values
    ///
    /// # Returns
    /// The grid, or an error if the value count does not match or the
    /// transform cannot be inverted
    pub fn from_parts(
        width: usize,
        height: usize,
        data: impl Into<HeightCells>,
        transform: GeoTransform,
        nodata: Option<f64>,
    ) -> TreeKitResult<Self> {
        let data = data.into();
        if data.len() != width * height {
            return Err(TreeKitError::Config(format!(
                "height grid holds {} values for {}x{} cells", data.len(), width, height)));
        }

        let inverse = transform.inverse().ok_or_else(|| TreeKitError::Projection(
            format!("height raster transform {:?} is not invertible", transform.coefficients)))?;

        Ok(HeightGrid { width, height, data, inverse, nodata })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn cells(&self) -> &HeightCells {
        &self.data
    }

    /// `value` rounded to the precision the cells are stored in
    ///
    /// Comparing a rounded threshold against `f32` cells lets a cell that
    /// holds the threshold value exactly compare equal.
    pub fn cell_precision(&self, value: f64) -> f64 {
        match self.data {
            HeightCells::Single(_) => value as f32 as f64,
            HeightCells::Double(_) => value,
        }
    }

    /// Row and column of the cell containing `point`, if inside the grid
    ///
    /// Non-finite coordinates are never inside.
    pub fn index(&self, point: &Point) -> Option<(usize, usize)> {
        let (row, col) = GeoTransform::cell_index(&self.inverse, point)?;
        if row < 0 || col < 0 || row >= self.height as i64 || col >= self.width as i64 {
            return None;
        }
        Some((row as usize, col as usize))
    }

    /// Height at `point`; `None` outside the grid, on NoData or NaN cells
    pub fn sample(&self, point: &Point) -> Option<f64> {
        let (row, col) = self.index(point)?;
        let cell = row * self.width + col;

        let value = match &self.data {
            HeightCells::Single(values) => {
                let value = values[cell];
                // NoData is parsed as f64, these cells are f32
                if self.nodata.is_some_and(|nodata| value as f64 == nodata || value == nodata as f32) {
                    return None;
                }
                value as f64
            },
            HeightCells::Double(values) => {
                let value = values[cell];
                if self.nodata == Some(value) {
                    return None;
                }
                value
            },
        };

        if value.is_nan() {
            return None;
        }
        Some(value)
    }
}
