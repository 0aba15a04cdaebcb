//! Overlay positioning
//!
//! Places the metadata overlay below or above its anchor, whichever side has
//! room, and caps its height so it never runs past the viewport.

use crate::models::{PlacementRequest, PlacementResult, PlacementSide, Rect, Size};

/// Gap between the anchor and the overlay, in pixels
pub const OVERLAY_SPACING: f64 = 8.0;

/// Host-supplied replacement for the default placement
pub type PlacementOverride = Box<dyn Fn(&PlacementRequest) -> PlacementResult + Send>;

/// Overlay placement calculator
pub struct OverlayPositioner;

impl OverlayPositioner {
    /// Default placement
    pub fn place(anchor: Rect, overlay: Size, viewport_height: f64, buffer_spacing: f64) -> PlacementResult {
        let space_above = anchor.top.max(0.0);
        let space_below = (viewport_height - anchor.bottom()).max(0.0);

        if space_below >= overlay.height || space_below >= space_above {
            PlacementResult {
                side: PlacementSide::Below,
                vertical_offset: anchor.height + OVERLAY_SPACING,
                max_height: (space_below - OVERLAY_SPACING - buffer_spacing).max(0.0),
            }
        } else {
            PlacementResult {
                side: PlacementSide::Above,
                vertical_offset: -overlay.height.min(space_above) - OVERLAY_SPACING,
                max_height: (space_above - OVERLAY_SPACING - buffer_spacing).max(0.0),
            }
        }
    }

    /// Placement for `request`, deferring entirely to `custom` when given
    pub fn place_with(request: &PlacementRequest, custom: Option<&PlacementOverride>) -> PlacementResult {
        match custom {
            Some(custom) => custom(request),
            None => Self::place(
                request.anchor,
                request.overlay,
                request.viewport_height,
                request.buffer_spacing,
            ),
        }
    }
}
