//! Tree detection command
//!
//! Runs the full pipeline with boxes replayed from a detections file and
//! prints the produced artifacts.

use std::path::PathBuf;

use clap::ArgMatches;
use log::info;

use crate::api::TreeKit;
use crate::commands::command_traits::Command;
use crate::config::PipelineConfig;
use crate::detector::ReplayDetector;
use crate::errors::{TreeKitError, TreeKitResult};
use crate::utils::progress::ProgressTracker;

/// Command running detection over an orthophoto and its height raster
#[derive(Debug)]
pub struct DetectCommand {
    /// Orthophoto GeoTIFF
    image: PathBuf,
    /// Canopy height GeoTIFF
    chm: PathBuf,
    /// JSON file of per-tile boxes
    detections: PathBuf,
    /// Directory receiving the artifacts
    output_dir: PathBuf,
    /// File configuration with CLI overrides applied
    config: PipelineConfig,
    /// Whether to draw a progress bar
    show_progress: bool,
}

impl DetectCommand {
    /// Create a new detect command
    ///
    /// # Arguments
    /// * `args` - Matches of the `detect` subcommand
    ///
    /// # Returns
    /// A new DetectCommand instance or an error
    pub fn new(args: &ArgMatches) -> TreeKitResult<Self> {
        let path = |name: &str| -> TreeKitResult<PathBuf> {
            args.get_one::<String>(name)
                .map(PathBuf::from)
                .ok_or_else(|| TreeKitError::Config(format!("Missing argument: {}", name)))
        };

        let mut config = match args.get_one::<String>("config") {
            Some(file) => PipelineConfig::from_file(&PathBuf::from(file))?,
            None => PipelineConfig::default(),
        };
        apply_overrides(&mut config, args);
        config.validate()?;

        Ok(DetectCommand {
            image: path("image")?,
            chm: path("chm")?,
            detections: path("detections")?,
            output_dir: path("output")?,
            config,
            show_progress: !args.get_flag("no-progress"),
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }
}

/// Copies flags given on the command line over the file configuration
pub fn apply_overrides(config: &mut PipelineConfig, args: &ArgMatches) {
    if let Some(&value) = args.get_one::<f64>("height-threshold") {
        config.height_threshold = value;
    }
    if let Some(&value) = args.get_one::<f64>("confidence") {
        config.confidence = value;
    }
    if let Some(&value) = args.get_one::<f64>("iou") {
        config.iou = value;
    }
    if let Some(&value) = args.get_one::<f64>("cluster-eps") {
        config.cluster_eps = value;
    }
    if let Some(&value) = args.get_one::<usize>("min-points") {
        config.min_points = value;
    }
    if let Some(&value) = args.get_one::<u32>("tile-size") {
        config.tile_size = value;
        config.tile_step = None;
    }
    if let Some(&value) = args.get_one::<u64>("max-pixels") {
        config.max_raster_pixels = Some(value);
    }
    if let Some(crs) = args.get_one::<String>("crs") {
        config.assume_crs = Some(crs.clone());
    }
    if args.get_flag("no-geojson") {
        config.write_geojson = false;
    }
}

impl Command for DetectCommand {
    fn execute(&self) -> TreeKitResult<()> {
        let detector = ReplayDetector::from_file(&self.detections)?;
        info!("Loaded {} replayed detections from {}", detector.len(), self.detections.display());

        let treekit = TreeKit::new(self.config.clone())?;
        let mut tracker: Option<ProgressTracker> = None;
        let output = treekit.process(&self.image, &self.chm, &detector, &self.output_dir, |done, total| {
            if !self.show_progress {
                return;
            }
            let bar = tracker.get_or_insert_with(|| ProgressTracker::new(total as u64, "Detecting trees"));
            bar.set_position(done as u64);
        })?;
        if let Some(bar) = tracker {
            bar.finish();
        }

        println!("Archive: {}", output.archive.display());
        println!("Trees: {}", output.tree_count);
        println!("OSM: {}", output.osm.display());
        if let Some(path) = &output.geojson_path {
            println!("GeoJSON: {}", path.display());
        }
        Ok(())
    }
}
