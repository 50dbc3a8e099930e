//! Coordinate Reference System handling
//!
//! Rasters identify their CRS by EPSG code. This module turns codes into
//! proj definitions for reprojection and into ESRI WKT for `.prj` files.

use std::collections::HashMap;
use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;

use crate::errors::{TreeKitError, TreeKitResult};

lazy_static! {
    /// Accepts "EPSG:32632", "epsg:32632" or a bare "32632"
    static ref EPSG_PATTERN: Regex = Regex::new(r"^(?i:epsg:)?\s*(\d{4,6})$")
        .expect("EPSG pattern is a valid regex");

    /// Proj definitions for common national grids not covered by the enum
    static ref EXTRA_PROJ_DEFINITIONS: HashMap<u32, &'static str> = {
        let mut m = HashMap::new();
        m.insert(4258, "+proj=longlat +ellps=GRS80 +towgs84=0,0,0,0,0,0,0 +no_defs");
        m.insert(2154, "+proj=lcc +lat_0=46.5 +lon_0=3 +lat_1=49 +lat_2=44 +x_0=700000 +y_0=6600000 +ellps=GRS80 +towgs84=0,0,0,0,0,0,0 +units=m +no_defs");
        m.insert(3035, "+proj=laea +lat_0=52 +lon_0=10 +x_0=4321000 +y_0=3210000 +ellps=GRS80 +towgs84=0,0,0,0,0,0,0 +units=m +no_defs");
        m.insert(27700, "+proj=tmerc +lat_0=49 +lon_0=-2 +k=0.9996012717 +x_0=400000 +y_0=-100000 +ellps=airy +towgs84=446.448,-125.157,542.06,0.15,0.247,0.842,-20.489 +units=m +no_defs");
        m.insert(28992, "+proj=sterea +lat_0=52.15616055555555 +lon_0=5.38763888888889 +k=0.9999079 +x_0=155000 +y_0=463000 +ellps=bessel +towgs84=565.417,50.3319,465.552,-0.398957,0.343988,-1.8774,4.0725 +units=m +no_defs");
        m
    };
}

const WGS84_GEOGCS: &str = "GEOGCS[\"GCS_WGS_1984\",DATUM[\"D_WGS_1984\",SPHEROID[\"WGS_1984\",6378137.0,298.257223563]],PRIMEM[\"Greenwich\",0.0],UNIT[\"Degree\",0.0174532925199433]]";
const ETRS89_GEOGCS: &str = "GEOGCS[\"GCS_ETRS_1989\",DATUM[\"D_ETRS_1989\",SPHEROID[\"GRS_1980\",6378137.0,298.257222101]],PRIMEM[\"Greenwich\",0.0],UNIT[\"Degree\",0.0174532925199433]]";

/// Identifier for the coordinate systems this crate understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoordinateSystem {
    /// WGS 84 (EPSG:4326)
    WGS84,
    /// Web Mercator (EPSG:3857)
    WebMercator,
    /// WGS 84 / UTM zone (EPSG:326xx north, 327xx south)
    UTM(u8, bool),
    /// ETRS89 / UTM zone (EPSG:258xx, northern hemisphere only)
    EtrsUTM(u8),
    /// Other EPSG code
    Other(u32),
}

impl CoordinateSystem {
    /// Create a coordinate system from an EPSG code
    pub fn from_epsg(epsg: u32) -> Self {
        match epsg {
            4326 => CoordinateSystem::WGS84,
            3857 | 900913 => CoordinateSystem::WebMercator,
            32601..=32660 => CoordinateSystem::UTM((epsg - 32600) as u8, true),
            32701..=32760 => CoordinateSystem::UTM((epsg - 32700) as u8, false),
            25828..=25838 => CoordinateSystem::EtrsUTM((epsg - 25800) as u8),
            _ => CoordinateSystem::Other(epsg),
        }
    }

    /// Parse a coordinate system from a string such as "EPSG:4326"
    pub fn from_string(crs_str: &str) -> TreeKitResult<Self> {
        let trimmed = crs_str.trim();
        let captures = EPSG_PATTERN.captures(trimmed)
            .ok_or_else(|| TreeKitError::Config(format!("Unsupported CRS format: {}", trimmed)))?;

        captures[1].parse::<u32>()
            .map(Self::from_epsg)
            .map_err(|_| TreeKitError::Config(format!("Invalid EPSG code: {}", trimmed)))
    }

    /// Get the EPSG code for this coordinate system
    pub fn epsg_code(&self) -> u32 {
        match self {
            CoordinateSystem::WGS84 => 4326,
            CoordinateSystem::WebMercator => 3857,
            CoordinateSystem::UTM(zone, true) => 32600 + *zone as u32,
            CoordinateSystem::UTM(zone, false) => 32700 + *zone as u32,
            CoordinateSystem::EtrsUTM(zone) => 25800 + *zone as u32,
            CoordinateSystem::Other(code) => *code,
        }
    }

    /// Whether coordinates are longitude/latitude degrees
    pub fn is_geographic(&self) -> bool {
        matches!(self, CoordinateSystem::WGS84 | CoordinateSystem::Other(4258))
    }

    /// Proj definition string, if this system can be reprojected
    pub fn proj_string(&self) -> Option<String> {
        match self {
            CoordinateSystem::WGS84 => Some("+proj=longlat +datum=WGS84 +no_defs".to_string()),
            CoordinateSystem::WebMercator => Some(
                "+proj=merc +a=6378137 +b=6378137 +lat_ts=0 +lon_0=0 +x_0=0 +y_0=0 +k=1 +units=m +nadgrids=@null +no_defs".to_string()),
            CoordinateSystem::UTM(zone, north) => Some(format!(
                "+proj=utm +zone={}{} +datum=WGS84 +units=m +no_defs",
                zone, if *north { "" } else { " +south" })),
            CoordinateSystem::EtrsUTM(zone) => Some(format!(
                "+proj=utm +zone={} +ellps=GRS80 +towgs84=0,0,0,0,0,0,0 +units=m +no_defs", zone)),
            CoordinateSystem::Other(code) => EXTRA_PROJ_DEFINITIONS.get(code).map(|s| s.to_string()),
        }
    }

    /// ESRI-flavoured WKT, the dialect `.prj` files use
    ///
    /// Returns `None` for systems without a built-in definition.
    pub fn esri_wkt(&self) -> Option<String> {
        match self {
            CoordinateSystem::WGS84 => Some(WGS84_GEOGCS.to_string()),
            CoordinateSystem::WebMercator => Some(format!(
                "PROJCS[\"WGS_1984_Web_Mercator_Auxiliary_Sphere\",{},PROJECTION[\"Mercator_Auxiliary_Sphere\"],\
                 PARAMETER[\"False_Easting\",0.0],PARAMETER[\"False_Northing\",0.0],\
                 PARAMETER[\"Central_Meridian\",0.0],PARAMETER[\"Standard_Parallel_1\",0.0],\
                 PARAMETER[\"Auxiliary_Sphere_Type\",0.0],UNIT[\"Meter\",1.0]]",
                WGS84_GEOGCS)),
            CoordinateSystem::UTM(zone, north) => Some(Self::utm_wkt(
                &format!("WGS_1984_UTM_Zone_{}{}", zone, if *north { "N" } else { "S" }),
                WGS84_GEOGCS, *zone, *north)),
            CoordinateSystem::EtrsUTM(zone) => Some(Self::utm_wkt(
                &format!("ETRS_1989_UTM_Zone_{}N", zone), ETRS89_GEOGCS, *zone, true)),
            CoordinateSystem::Other(_) => None,
        }
    }

    fn utm_wkt(name: &str, geogcs: &str, zone: u8, north: bool) -> String {
        let central_meridian = zone as f64 * 6.0 - 183.0;
        let false_northing = if north { 0.0 } else { 10_000_000.0 };
        format!(
            "PROJCS[\"{}\",{},PROJECTION[\"Transverse_Mercator\"],\
             PARAMETER[\"False_Easting\",500000.0],PARAMETER[\"False_Northing\",{:.1}],\
             PARAMETER[\"Central_Meridian\",{:.1}],PARAMETER[\"Scale_Factor\",0.9996],\
             PARAMETER[\"Latitude_Of_Origin\",0.0],UNIT[\"Meter\",1.0]]",
            name, geogcs, false_northing, central_meridian)
    }

    /// Get a description of this coordinate system
    pub fn description(&self) -> String {
        match self {
            CoordinateSystem::WGS84 => "WGS 84 (EPSG:4326)".to_string(),
            CoordinateSystem::WebMercator => "Web Mercator (EPSG:3857)".to_string(),
            CoordinateSystem::UTM(zone, north) => format!(
                "WGS 84 / UTM Zone {}{} (EPSG:{})", zone, if *north { "N" } else { "S" }, self.epsg_code()),
            CoordinateSystem::EtrsUTM(zone) => format!(
                "ETRS89 / UTM Zone {}N (EPSG:{})", zone, self.epsg_code()),
            CoordinateSystem::Other(code) => format!("EPSG:{}", code),
        }
    }
}

impl fmt::Display for CoordinateSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}
