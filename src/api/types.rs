//! Shared types for the WASM API
//!
//! Every call that touches the document answers with an `ApiResult` so the
//! host can patch the editor and replay queued commands in one step.

use crate::renderers::ReferenceMap;
use crate::tool::{HostCommand, OverlayView};
use serde::Serialize;

/// Result of a tool operation
#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ApiResult {
    /// Sanitized inner HTML of the document root
    pub html: String,
    /// Host requests queued by the operation, in order
    pub commands: Vec<HostCommand>,
    /// The open overlay, if any
    pub overlay: Option<OverlayView>,
    pub references: ReferenceMap,
    /// Lifecycle state name after the operation
    pub state: &'static str,
    /// False when Save was rejected by validation
    pub accepted: bool,
}
