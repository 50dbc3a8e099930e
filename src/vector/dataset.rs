//! Final point set with attributes and CRS

use std::fmt;

use crate::coordinate::{CoordinateSystem, Point};
use crate::pipeline::Cluster;

/// Name of the zero-based feature index attribute
pub const FID_FIELD: &str = "FID";
/// Name of the merged detection count attribute
pub const MEMBERS_FIELD: &str = "MEMBERS";

/// An attribute value as stored in, or read back from, a `.dbf` file
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Integer(i64),
    Float(f64),
    Text(String),
    Null,
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Integer(v) => write!(f, "{}", v),
            FieldValue::Float(v) => write!(f, "{}", v),
            FieldValue::Text(v) => write!(f, "{}", v),
            FieldValue::Null => Ok(()),
        }
    }
}

/// One exported point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreePoint {
    pub position: Point,
    pub members: usize,
}

/// Ordered representative points in the primary raster's CRS
#[derive(Debug, Clone, PartialEq)]
pub struct VectorDataset {
    crs: CoordinateSystem,
    points: Vec<TreePoint>,
}

impl VectorDataset {
    pub fn new(crs: CoordinateSystem, points: Vec<TreePoint>) -> Self {
        VectorDataset { crs, points }
    }

    /// Builds the dataset from clustering output, keeping cluster order
    pub fn from_clusters(crs: CoordinateSystem, clusters: &[Cluster]) -> Self {
        let points = clusters.iter()
            .map(|cluster| TreePoint { position: cluster.centroid, members: cluster.members })
            .collect();
        Self::new(crs, points)
    }

    pub fn crs(&self) -> CoordinateSystem {
        self.crs
    }

    pub fn points(&self) -> &[TreePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Attribute names in column order
    pub fn field_names() -> [&'static str; 2] {
        [FID_FIELD, MEMBERS_FIELD]
    }

    /// Attribute values of feature `index`, in [`VectorDataset::field_names`] order
    pub fn attributes(&self, index: usize) -> [FieldValue; 2] {
        [
            FieldValue::Integer(index as i64),
            FieldValue::Integer(self.points[index].members as i64),
        ]
    }

    /// Extent as `(min_x, min_y, max_x, max_y)`; zeros when empty
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        if self.points.is_empty() {
            return (0.0, 0.0, 0.0, 0.0);
        }

        self.points.iter().fold(
            (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
            |(min_x, min_y, max_x, max_y), p| (
                min_x.min(p.position.x),
                min_y.min(p.position.y),
                max_x.max(p.position.x),
                max_y.max(p.position.y),
            ),
        )
    }
}
