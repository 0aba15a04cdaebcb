//! Annotation nodes inside the document tree
//!
//! An annotation is an `annotation` element with the tool's class. Its
//! metadata lives in `data-*` attributes; the node itself is its identity.

use super::metadata::{unescape, Field, MetadataForm};
use crate::dom::{Document, NodeId};
use serde::{Deserialize, Serialize};

pub const ANNOTATION_TAG: &str = "annotation";
pub const ANNOTATION_CLASS: &str = "afl-annotation-tool";

/// Set once a click listener has been attached to a node
pub const LISTENER_MARKER: &str = "at-has-data-listener";

/// Dedup key: (publication, author) as stored, missing distinct from empty
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ReferenceKey {
    pub publication: Option<String>,
    pub author: Option<String>,
}

pub fn is_annotation(doc: &Document, id: NodeId) -> bool {
    doc.tag(id)
        .map(|t| t.eq_ignore_ascii_case(ANNOTATION_TAG))
        .unwrap_or(false)
        && doc.has_class(id, ANNOTATION_CLASS)
}

/// Whether any metadata attribute holds a non-empty value
pub fn has_metadata(doc: &Document, id: NodeId) -> bool {
    Field::ALL.iter().any(|field| {
        doc.attribute(id, field.attribute())
            .map(|v| !v.is_empty())
            .unwrap_or(false)
    })
}

pub fn reference_key(doc: &Document, id: NodeId) -> ReferenceKey {
    ReferenceKey {
        publication: doc.attribute(id, Field::Publication.attribute()).map(str::to_string),
        author: doc.attribute(id, Field::Author.attribute()).map(str::to_string),
    }
}

/// Overlay values for a node: stored attributes, with the node's own text
/// standing in for a missing publication title
pub fn form_from_node(doc: &Document, id: NodeId) -> MetadataForm {
    let mut form = MetadataForm::default();
    for field in Field::ALL {
        let value = doc
            .attribute(id, field.attribute())
            .map(|v| unescape(v).into_owned())
            .unwrap_or_default();
        form.set(field, value);
    }
    if form.publication.is_empty() {
        form.publication = doc.direct_text(id);
    }
    form
}
