//! Reference numbering
//!
//! Every annotation is rendered as a bracketed ordinal. Annotations sharing a
//! (publication, author) pair share an ordinal; new pairs get the next number
//! in document order.

use crate::dom::{Document, NodeId};
use crate::models::{has_metadata, is_annotation, reference_key, ReferenceKey};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One rendered marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Marker {
    pub node: NodeId,
    pub ordinal: usize,
}

/// Ordinals assigned during one numbering pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReferenceMap {
    keys: Vec<ReferenceKey>,
    #[serde(skip)]
    ordinals: HashMap<ReferenceKey, usize>,
    pub markers: Vec<Marker>,
}

impl ReferenceMap {
    /// Ordinal for `key`, assigning the next one on first sight
    fn assign(&mut self, key: ReferenceKey) -> usize {
        if let Some(ordinal) = self.ordinals.get(&key) {
            return *ordinal;
        }
        let ordinal = self.keys.len() + 1;
        self.keys.push(key.clone());
        self.ordinals.insert(key, ordinal);
        ordinal
    }

    pub fn ordinal(&self, key: &ReferenceKey) -> Option<usize> {
        self.ordinals.get(key).copied()
    }

    pub fn ordinal_for_node(&self, node: NodeId) -> Option<usize> {
        self.markers
            .iter()
            .find(|m| m.node == node)
            .map(|m| m.ordinal)
    }

    /// Distinct references, in ordinal order
    pub fn keys(&self) -> &[ReferenceKey] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

pub fn label(ordinal: usize) -> String {
    format!("[{}]", ordinal)
}

/// Renders annotation markers
pub struct ReferenceNumberer;

impl ReferenceNumberer {
    /// Number every annotation under `scope` and replace its content with the label
    ///
    /// Annotations without any metadata are still being created (or are about
    /// to be unwrapped) and keep their content.
    pub fn renumber(doc: &mut Document, scope: NodeId) -> ReferenceMap {
        let mut map = ReferenceMap::default();
        let annotations: Vec<NodeId> = doc
            .descendants(scope)
            .into_iter()
            .filter(|id| is_annotation(doc, *id) && has_metadata(doc, *id))
            .collect();

        for node in annotations {
            // Nested annotations drop out when their outer label is written
            if !doc.is_inclusive_ancestor(scope, node) {
                continue;
            }
            let ordinal = map.assign(reference_key(doc, node));
            map.markers.push(Marker { node, ordinal });

            let text = label(ordinal);
            if Self::shows(doc, node, &text) {
                continue;
            }
            let label_node = doc.create_text(&text);
            if let Err(err) = doc.replace_children(node, vec![label_node]) {
                log::warn!("Could not render reference {} on {}: {}", text, node, err);
            }
        }

        log::debug!(
            "Renumbered {} annotations into {} references",
            map.markers.len(),
            map.len()
        );
        map
    }

    /// Whether `node` already holds exactly `text`
    fn shows(doc: &Document, node: NodeId, text: &str) -> bool {
        match doc.children(node) {
            [only] => doc.text(*only) == Some(text),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ANNOTATION_CLASS, ANNOTATION_TAG};

    fn renumber(doc: &mut Document) -> ReferenceMap {
        let root = doc.root();
        ReferenceNumberer::renumber(doc, root)
    }

    fn cite(doc: &mut Document, publication: &str, author: &str) -> NodeId {
        let el = doc.create_element(ANNOTATION_TAG);
        doc.add_class(el, ANNOTATION_CLASS).unwrap();
        doc.set_attribute(el, "data-publication", publication).unwrap();
        doc.set_attribute(el, "data-author", author).unwrap();
        let text = doc.create_text(publication);
        doc.append_child(el, text).unwrap();
        doc.append_child(doc.root(), el).unwrap();
        el
    }

    #[test]
    fn test_duplicates_share_ordinal() {
        let mut doc = Document::new();
        let a = cite(&mut doc, "P1", "A1");
        let b = cite(&mut doc, "P2", "A2");
        let c = cite(&mut doc, "P1", "A1");
        let d = cite(&mut doc, "P3", "A1");

        let map = renumber(&mut doc);

        assert_eq!(map.ordinal_for_node(a), Some(1));
        assert_eq!(map.ordinal_for_node(b), Some(2));
        assert_eq!(map.ordinal_for_node(c), Some(1));
        assert_eq!(map.ordinal_for_node(d), Some(3));
        assert_eq!(map.len(), 3);
        assert_eq!(doc.text_content(c), "[1]");
        assert_eq!(doc.text_content(d), "[3]");
    }

    #[test]
    fn test_renumber_is_idempotent() {
        let mut doc = Document::new();
        cite(&mut doc, "P1", "A1");
        cite(&mut doc, "P2", "A2");

        let first = renumber(&mut doc);
        let html = doc.inner_html(doc.root());
        doc.take_mutations();
        let second = renumber(&mut doc);

        assert_eq!(first, second);
        assert_eq!(doc.inner_html(doc.root()), html);
        assert!(doc.take_mutations().is_empty());
    }

    #[test]
    fn test_key_is_literal_pair() {
        let mut doc = Document::new();
        let a = cite(&mut doc, "P", "");
        let b = cite(&mut doc, "P", " ");
        let c = cite(&mut doc, "p", "");

        let map = renumber(&mut doc);

        assert_eq!(map.ordinal_for_node(a), Some(1));
        assert_eq!(map.ordinal_for_node(b), Some(2));
        assert_eq!(map.ordinal_for_node(c), Some(3));
    }

    #[test]
    fn test_annotations_without_metadata_keep_content() {
        let mut doc = Document::new();
        let pending = doc.create_element(ANNOTATION_TAG);
        doc.add_class(pending, ANNOTATION_CLASS).unwrap();
        let text = doc.create_text("still typing");
        doc.append_child(pending, text).unwrap();
        doc.append_child(doc.root(), pending).unwrap();
        let saved = cite(&mut doc, "P", "A");

        let map = renumber(&mut doc);

        assert_eq!(map.ordinal_for_node(pending), None);
        assert_eq!(map.ordinal_for_node(saved), Some(1));
        assert_eq!(doc.text_content(pending), "still typing");
    }
}
