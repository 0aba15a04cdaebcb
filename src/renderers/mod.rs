//! Renderers for annotation output
//!
//! - `references`: numbered reference markers
//! - `overlay`: placement of the metadata overlay

pub mod overlay;
pub mod references;

pub use overlay::{OverlayPositioner, PlacementOverride, OVERLAY_SPACING};
pub use references::{label, Marker, ReferenceMap, ReferenceNumberer};
