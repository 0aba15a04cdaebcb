//! Geometry handed over by the host for overlay placement
//!
//! All values are CSS pixels; `top` is measured from the top of the viewport.

use serde::{Deserialize, Serialize};

/// Bounding box of the anchor element
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub top: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(top: f64, height: f64) -> Self {
        Self { top, height }
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

/// Rendered size of the overlay
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlacementSide {
    Above,
    Below,
}

/// Where the overlay goes relative to its anchor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementResult {
    pub side: PlacementSide,
    /// Offset from the anchor's top edge; negative values are above it
    pub vertical_offset: f64,
    pub max_height: f64,
}

/// Everything one placement computation looks at
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementRequest {
    pub anchor: Rect,
    pub overlay: Size,
    pub viewport_height: f64,
    pub buffer_spacing: f64,
}
