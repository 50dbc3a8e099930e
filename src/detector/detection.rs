//! Detector output records

use serde::Deserialize;

/// Axis-aligned box in tile-local pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct BoundingBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl BoundingBox {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        BoundingBox { x1, y1, x2, y2 }
    }

    /// Box centre, `((x1 + x2) / 2, (y1 + y2) / 2)`
    pub fn center(&self) -> (f64, f64) {
        ((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }

    /// Area, zero for inverted or degenerate boxes
    pub fn area(&self) -> f64 {
        (self.x2 - self.x1).max(0.0) * (self.y2 - self.y1).max(0.0)
    }

    /// Intersection over union with another box
    pub fn iou(&self, other: &BoundingBox) -> f64 {
        let width = (self.x2.min(other.x2) - self.x1.max(other.x1)).max(0.0);
        let height = (self.y2.min(other.y2) - self.y1.max(other.y1)).max(0.0);
        let intersection = width * height;
        let union = self.area() + other.area() - intersection;

        if union <= 0.0 { 0.0 } else { intersection / union }
    }

    pub fn is_finite(&self) -> bool {
        self.x1.is_finite() && self.y1.is_finite() && self.x2.is_finite() && self.y2.is_finite()
    }
}

/// One detected object
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub bbox: BoundingBox,
    pub confidence: f64,
}

impl Detection {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64, confidence: f64) -> Self {
        Detection { bbox: BoundingBox::new(x1, y1, x2, y2), confidence }
    }
}

/// Thresholds passed to the detector on every call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionParams {
    /// Boxes scoring at or below this are discarded
    pub confidence: f64,
    /// Overlap above which the weaker of two boxes is suppressed
    pub iou: f64,
}

impl Default for DetectionParams {
    fn default() -> Self {
        DetectionParams { confidence: 0.05, iou: 0.1 }
    }
}
