//! Detector that replays boxes from a previous model run
//!
//! The input is a JSON array of records, one per box, keyed by the origin
//! of the tile that produced it:
//!
//! ```json
//! [{"tile_x": 0, "tile_y": 2048, "x1": 10.0, "y1": 12.5, "x2": 30.0, "y2": 33.0, "confidence": 0.81}]
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use log::{debug, info};
use serde::Deserialize;

use crate::errors::{TreeKitError, TreeKitResult};
use crate::pipeline::Tile;

use super::detection::{Detection, DetectionParams};
use super::nms::non_max_suppression;
use super::{Detector, DetectorResult};

#[derive(Debug, Deserialize)]
struct Record {
    tile_x: u32,
    tile_y: u32,
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
    confidence: f64,
}

/// Serves recorded boxes for each tile origin
#[derive(Debug, Clone, Default)]
pub struct ReplayDetector {
    boxes: HashMap<(u32, u32), Vec<Detection>>,
}

impl ReplayDetector {
    /// Loads recorded boxes from a JSON file
    pub fn from_file(path: &Path) -> TreeKitResult<Self> {
        info!("Loading recorded detections from {}", path.display());
        let text = fs::read_to_string(path).map_err(|e| TreeKitError::Config(
            format!("cannot read detections file {}: {}", path.display(), e)))?;
        Self::from_json(&text)
    }

    /// Parses recorded boxes from JSON text
    pub fn from_json(text: &str) -> TreeKitResult<Self> {
        let records: Vec<Record> = serde_json::from_str(text)
            .map_err(|e| TreeKitError::Config(format!("invalid detections JSON: {}", e)))?;

        let mut boxes: HashMap<(u32, u32), Vec<Detection>> = HashMap::new();
        for (index, record) in records.iter().enumerate() {
            let detection = Detection::new(record.x1, record.y1, record.x2, record.y2, record.confidence);
            if !detection.bbox.is_finite() || !detection.confidence.is_finite() {
                return Err(TreeKitError::Config(format!("detection record {} has non-finite values", index)));
            }
            boxes.entry((record.tile_x, record.tile_y)).or_default().push(detection);
        }

        debug!("Replay detector holds {} boxes over {} tiles", records.len(), boxes.len());
        Ok(ReplayDetector { boxes })
    }

    /// Adds a box for the tile at the given origin
    pub fn insert(&mut self, tile_x: u32, tile_y: u32, detection: Detection) {
        self.boxes.entry((tile_x, tile_y)).or_default().push(detection);
    }

    /// Number of recorded boxes across all tiles
    pub fn len(&self) -> usize {
        self.boxes.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Detector for ReplayDetector {
    fn name(&self) -> &str {
        "replay"
    }

    fn detect(&self, tile: &Tile, params: &DetectionParams) -> DetectorResult {
        let recorded = match self.boxes.get(&(tile.origin_x, tile.origin_y)) {
            Some(recorded) => recorded,
            None => return Ok(Vec::new()),
        };

        let confident: Vec<Detection> = recorded.iter()
            .filter(|d| d.confidence > params.confidence)
            .copied()
            .collect();

        Ok(non_max_suppression(&confident, params.iou))
    }
}
