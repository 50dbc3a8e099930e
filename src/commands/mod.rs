//! CLI command implementations
//!
//! This module contains the subcommands of the `treekit` binary, built
//! with the Command pattern.

pub mod command_traits;
pub mod detect_command;
pub mod inspect_command;

pub use command_traits::{Command, CommandFactory};
pub use detect_command::DetectCommand;
pub use inspect_command::InspectCommand;

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command as ClapCommand};

use crate::errors::{TreeKitError, TreeKitResult};

/// Argument definitions of the `treekit` binary
pub fn build_cli() -> ClapCommand {
    ClapCommand::new("treekit")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Detect trees in GeoTIFF orthophotos and export them as shapefile, OSM and GeoJSON")
        .subcommand_required(true)
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable debug output")
                .global(true)
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("log-file")
                .long("log-file")
                .help("Also write log records to this file")
                .value_name("FILE")
                .global(true)
                .required(false),
        )
        .subcommand(
            ClapCommand::new("detect")
                .about("Run tiled detection, height filtering, clustering and export")
                .arg(Arg::new("image").help("Orthophoto GeoTIFF").required(true).index(1))
                .arg(Arg::new("chm").help("Canopy height GeoTIFF").required(true).index(2))
                .arg(
                    Arg::new("detections")
                        .long("detections")
                        .help("JSON file of per-tile detector boxes")
                        .value_name("FILE")
                        .required(true),
                )
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .help("Output directory")
                        .value_name("DIR")
                        .default_value("."),
                )
                .arg(
                    Arg::new("config")
                        .long("config")
                        .help("TOML configuration file")
                        .value_name("FILE")
                        .required(false),
                )
                .arg(number_arg("height-threshold", "Minimum canopy height, inclusive", "H")
                    .value_parser(value_parser!(f64)))
                .arg(number_arg("confidence", "Detector confidence threshold", "C")
                    .value_parser(value_parser!(f64)))
                .arg(number_arg("iou", "Detector overlap-suppression threshold", "I")
                    .value_parser(value_parser!(f64)))
                .arg(number_arg("cluster-eps", "Clustering radius in CRS units", "E")
                    .value_parser(value_parser!(f64)))
                .arg(number_arg("min-points", "Neighbours needed for a core point", "N")
                    .value_parser(value_parser!(usize)))
                .arg(number_arg("tile-size", "Tile width and height in pixels", "S")
                    .value_parser(value_parser!(u32)))
                .arg(number_arg("max-pixels", "Reject rasters with more pixels than this", "N")
                    .value_parser(value_parser!(u64)))
                .arg(
                    Arg::new("crs")
                        .long("crs")
                        .help("CRS to assume when the image declares none (e.g. EPSG:32632)")
                        .value_name("EPSG")
                        .required(false),
                )
                .arg(
                    Arg::new("no-geojson")
                        .long("no-geojson")
                        .help("Skip writing the GeoJSON file")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("no-progress")
                        .long("no-progress")
                        .help("Do not draw a progress bar")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            ClapCommand::new("inspect")
                .about("Print a raster's layout and georeferencing")
                .arg(Arg::new("raster").help("GeoTIFF file").required(true).index(1)),
        )
}

fn number_arg(name: &'static str, help: &'static str, value_name: &'static str) -> Arg {
    Arg::new(name)
        .long(name)
        .help(help)
        .value_name(value_name)
        .required(false)
}

/// Factory for creating command instances based on CLI arguments
#[derive(Debug, Default)]
pub struct TreekitCommandFactory;

impl TreekitCommandFactory {
    /// Create a new factory instance
    pub fn new() -> Self {
        TreekitCommandFactory
    }
}

impl CommandFactory for TreekitCommandFactory {
    fn create_command(&self, args: &ArgMatches) -> TreeKitResult<Box<dyn Command>> {
        match args.subcommand() {
            Some(("detect", sub)) => Ok(Box::new(DetectCommand::new(sub)?)),
            Some(("inspect", sub)) => Ok(Box::new(InspectCommand::new(sub)?)),
            Some((other, _)) => Err(TreeKitError::Config(format!("Unknown command: {}", other))),
            None => Err(TreeKitError::Config("No command given".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;

    #[test]
    fn test_cli_definition_is_consistent() {
        build_cli().debug_assert();
    }

    #[test]
    fn test_detect_overrides_defaults() {
        let matches = build_cli().get_matches_from([
            "treekit", "detect", "ortho.tif", "chm.tif", "--detections", "boxes.json",
            "--height-threshold", "4", "--cluster-eps", "1.5", "--tile-size", "1024",
            "--crs", "EPSG:25832", "--no-geojson",
        ]);
        let (name, sub) = matches.subcommand().unwrap();
        std::assert_eq!(name, "detect");

        let command = DetectCommand::new(sub).unwrap();
        let config = command.config();
        std::assert_eq!(config.height_threshold, 4.0);
        std::assert_eq!(config.cluster_eps, 1.5);
        std::assert_eq!(config.step(), 1024);
        std::assert_eq!(config.confidence, 0.05);
        std::assert_eq!(config.assume_crs.as_deref(), Some("EPSG:25832"));
        std::assert!(!config.write_geojson);
    }

    #[test]
    fn test_invalid_override_rejected() {
        let matches = build_cli().get_matches_from([
            "treekit", "detect", "ortho.tif", "chm.tif", "--detections", "boxes.json",
            "--min-points", "0",
        ]);
        let factory = TreekitCommandFactory::new();
        std::assert!(matches!(factory.create_command(&matches), Err(TreeKitError::Config(_))));
    }

    #[test]
    fn test_detections_flag_required() {
        let result = build_cli().try_get_matches_from(["treekit", "detect", "ortho.tif", "chm.tif"]);
        std::assert!(result.is_err());
    }

    #[test]
    fn test_factory_dispatches_inspect() {
        let matches = build_cli().get_matches_from(["treekit", "-v", "inspect", "chm.tif"]);
        std::assert!(matches.get_flag("verbose"));
        std::assert!(TreekitCommandFactory::new().create_command(&matches).is_ok());
    }
}
