//! Annotation tool WASM API
//!
//! # Module Structure
//!
//! - `helpers`: console logging macros, serialization and error conversion
//! - `types`: the `ApiResult` returned to JavaScript
//! - `core`: the exported functions and the tool instance they share

pub mod helpers;
pub mod types;
pub mod core;

pub use core::*;
pub use types::ApiResult;
