//! OSM XML output
//!
//! Every vertex becomes a `<node>` with a fresh negative id, which OSM
//! editors treat as a new object, and one `<tag>` per attribute field.

use std::error::Error;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use log::{debug, info};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::Writer;

use crate::coordinate::{CoordinateTransformer, Point};
use crate::errors::{TreeKitError, TreeKitResult};

use super::dataset::FieldValue;

pub const OSM_VERSION: &str = "0.6";
pub const GENERATOR: &str = "treekit";

/// One node to write: WGS84 position and its tags
#[derive(Debug, Clone, PartialEq)]
pub struct OsmNode {
    pub id: i64,
    pub lon: f64,
    pub lat: f64,
    pub tags: Vec<(String, String)>,
}

/// Assigns ids `-1, -2, ...` in the order nodes are requested
#[derive(Debug, Default)]
pub struct NodeIdCounter {
    issued: i64,
}

impl NodeIdCounter {
    pub fn next_id(&mut self) -> i64 {
        self.issued += 1;
        -self.issued
    }
}

/// Reprojects shapes and pairs each vertex with its record's tags
///
/// # Arguments
/// * `shapes` - Vertices per record
/// * `field_names` - Attribute column names
/// * `records` - Attribute values per record
/// * `transformer` - Reprojection from the source CRS to WGS84
pub fn build_nodes(
    shapes: &[Vec<Point>],
    field_names: &[String],
    records: &[Vec<FieldValue>],
    transformer: &CoordinateTransformer,
) -> TreeKitResult<Vec<OsmNode>> {
    let mut ids = NodeIdCounter::default();
    let mut nodes = Vec::new();

    for (index, shape) in shapes.iter().enumerate() {
        let tags: Vec<(String, String)> = match records.get(index) {
            Some(values) => field_names.iter()
                .zip(values)
                .map(|(name, value)| (name.clone(), value.to_string()))
                .collect(),
            None => Vec::new(),
        };

        for vertex in shape {
            let wgs84 = transformer.transform(vertex)?;
            nodes.push(OsmNode { id: ids.next_id(), lon: wgs84.x, lat: wgs84.y, tags: tags.clone() });
        }
    }

    Ok(nodes)
}

/// Writes an OSM XML document
pub fn write_osm<W: Write>(out: W, nodes: &[OsmNode]) -> io::Result<()> {
    let mut writer = Writer::new_with_indent(out, b' ', 2);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None))).map_err(xml_error)?;

    let mut root = BytesStart::new("osm");
    root.push_attribute(("version", OSM_VERSION));
    root.push_attribute(("generator", GENERATOR));

    if nodes.is_empty() {
        writer.write_event(Event::Empty(root)).map_err(xml_error)?;
    } else {
        writer.write_event(Event::Start(root)).map_err(xml_error)?;
        for node in nodes {
            write_node(&mut writer, node)?;
        }
        writer.write_event(Event::End(BytesEnd::new("osm"))).map_err(xml_error)?;
    }

    let mut out = writer.into_inner();
    out.write_all(b"\n")?;
    out.flush()
}

fn write_node<W: Write>(writer: &mut Writer<W>, node: &OsmNode) -> io::Result<()> {
    let id = node.id.to_string();
    let lat = node.lat.to_string();
    let lon = node.lon.to_string();

    let mut element = BytesStart::new("node");
    element.push_attribute(("id", id.as_str()));
    element.push_attribute(("lat", lat.as_str()));
    element.push_attribute(("lon", lon.as_str()));

    if node.tags.is_empty() {
        return writer.write_event(Event::Empty(element)).map_err(xml_error);
    }

    writer.write_event(Event::Start(element)).map_err(xml_error)?;
    for (key, value) in &node.tags {
        let mut tag = BytesStart::new("tag");
        tag.push_attribute(("k", key.as_str()));
        tag.push_attribute(("v", value.as_str()));
        writer.write_event(Event::Empty(tag)).map_err(xml_error)?;
    }
    writer.write_event(Event::End(BytesEnd::new("node"))).map_err(xml_error)
}

/// Writes nodes to a file
pub fn write_osm_file(path: &Path, nodes: &[OsmNode]) -> TreeKitResult<()> {
    debug!("Writing {} OSM nodes to {}", nodes.len(), path.display());
    let file = File::create(path).map_err(|e| TreeKitError::export(path, e))?;
    let mut out = BufWriter::new(file);
    write_osm(&mut out, nodes).map_err(|e| TreeKitError::export(path, e))?;
    out.into_inner()
        .map_err(|e| TreeKitError::export(path, e.into_error()))?
        .sync_all()
        .map_err(|e| TreeKitError::export(path, e))?;

    info!("Wrote OSM XML with {} nodes to {}", nodes.len(), path.display());
    Ok(())
}

fn xml_error<E: Error + Send + Sync + 'static>(error: E) -> io::Error {
    io::Error::new(io::ErrorKind::Other, error)
}
