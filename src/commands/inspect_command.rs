//! Raster inspection command
//!
//! Prints the layout and georeferencing of a GeoTIFF as the pipeline
//! sees it, which is the first thing to check when a run is rejected.

use std::fmt::Write;
use std::path::PathBuf;

use clap::ArgMatches;

use crate::commands::command_traits::Command;
use crate::compression::CompressionFactory;
use crate::errors::{TreeKitError, TreeKitResult};
use crate::raster::{GeoRaster, RasterLimits};

/// Command describing one raster
#[derive(Debug)]
pub struct InspectCommand {
    /// Path to the input file
    input: PathBuf,
}

impl InspectCommand {
    pub fn new(args: &ArgMatches) -> TreeKitResult<Self> {
        let input = args.get_one::<String>("raster")
            .ok_or_else(|| TreeKitError::Config("Missing raster".to_string()))?;
        Ok(InspectCommand { input: PathBuf::from(input) })
    }
}

/// Multi-line summary of an opened raster
pub fn describe(raster: &GeoRaster) -> String {
    let layout = raster.layout();
    let mut text = String::new();

    let _ = writeln!(text, "Raster: {}", raster.path().display());
    let _ = writeln!(text, "  Format: {} ({})",
                     if raster.is_big_tiff() { "BigTIFF" } else { "TIFF" }, raster.byte_order().name());
    let _ = writeln!(text, "  IFDs: {}", raster.ifd_count());
    let _ = writeln!(text, "  Dimensions: {}x{}", raster.width(), raster.height());
    let _ = writeln!(text, "  Bands: {}", raster.band_count());
    let _ = writeln!(text, "  Sample type: {}-bit {}", layout.sample_type.bits, layout.sample_type.format.name());
    let _ = writeln!(text, "  Layout: {} {}x{}",
                     if layout.tiled { "tiles" } else { "strips" }, layout.block_width, layout.block_height);
    let _ = writeln!(text, "  Compression: {}", CompressionFactory::describe(layout.compression));
    let _ = writeln!(text, "  Predictor: {}", layout.predictor);

    let [c, a, b, f, d, e] = raster.transform().coefficients;
    let _ = writeln!(text, "  Geotransform: [{}, {}, {}, {}, {}, {}]", c, a, b, f, d, e);
    let crs = raster.crs().map(|crs| crs.to_string()).unwrap_or_else(|| "none".to_string());
    let _ = writeln!(text, "  CRS: {}", crs);
    let nodata = raster.nodata().map(|value| value.to_string()).unwrap_or_else(|| "none".to_string());
    let _ = writeln!(text, "  NoData: {}", nodata);

    text
}

impl Command for InspectCommand {
    fn execute(&self) -> TreeKitResult<()> {
        let raster = GeoRaster::open(&self.input, &RasterLimits::default())?;
        print!("{}", describe(&raster));
        Ok(())
    }
}
