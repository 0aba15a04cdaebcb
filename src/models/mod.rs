//! Data models for the annotation tool
//!
//! This module contains the annotation node helpers, the metadata record and
//! form, and the geometry types used for overlay placement.

pub mod annotation;
pub mod geometry;
pub mod metadata;

// Re-export commonly used types
pub use annotation::*;
pub use geometry::*;
pub use metadata::*;
