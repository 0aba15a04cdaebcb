//! Annotation Tool WASM Module
//!
//! Inline citation tool for a block editor: wraps selected text in an
//! annotation node, edits its bibliographic metadata in an overlay, and renders
//! every annotation as a deduplicated `[n]` reference marker.

pub mod dom;
pub mod models;
pub mod renderers;
pub mod tool;
pub mod validation;
pub mod api;

// Re-export commonly used types
pub use dom::{Document, NodeData, NodeId, Range, Selection};
pub use models::{AnnotationMetadata, Field, MetadataForm};
pub use tool::{AnnotationTool, LifecycleError, ToolConfig};

use wasm_bindgen::prelude::*;

// This is like the `main` function, but for WASM modules.
#[wasm_bindgen(start)]
pub fn main() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();

    #[cfg(feature = "console_log")]
    if let Err(e) = console_log::init_with_level(log::Level::Debug) {
        wasm_warn!("Logger already initialized: {}", e);
    }

    log::info!("Annotation tool WASM module initialized");
}
