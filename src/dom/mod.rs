//! Document tree substrate
//!
//! A small in-memory model of the live document the annotation tool edits:
//! element and text nodes, DOM-style ranges, HTML serialization and a log of
//! child-list removals.
//!
//! ## Modules
//!
//! - `node`: arena storage, attributes, tree queries
//! - `range`: ranges, selections, extract/insert/delete
//! - `html`: serialization and sanitize rules
//! - `mutation`: removal records drained in batches

pub mod html;
pub mod mutation;
pub mod node;
pub mod range;

pub use html::SanitizeRules;
pub use mutation::{MutationBatch, MutationRecord};
pub use node::{Document, DomError, ElementData, Node, NodeData, NodeId, NodeKind};
pub use range::{Boundary, Range, Selection};
