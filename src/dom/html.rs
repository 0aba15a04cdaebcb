//! HTML serialization and sanitize rules

use super::node::{Document, NodeId, NodeKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-tag attribute allow list, in the shape the host editor's sanitizer reads
///
/// Tags that are not listed keep all their attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SanitizeRules {
    pub tags: BTreeMap<String, BTreeMap<String, bool>>,
}

impl SanitizeRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow `attributes` on `tag`
    pub fn allow(mut self, tag: &str, attributes: &[&str]) -> Self {
        let entry = self.tags.entry(tag.to_ascii_lowercase()).or_default();
        for attr in attributes {
            entry.insert(attr.to_string(), true);
        }
        self
    }

    pub fn allows(&self, tag: &str, attribute: &str) -> bool {
        match self.tags.get(&tag.to_ascii_lowercase()) {
            Some(allowed) => allowed.get(attribute).copied().unwrap_or(false),
            None => true,
        }
    }
}

impl Document {
    /// Serialize `id` and its subtree
    pub fn to_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_html(id, None, &mut out);
        out
    }

    /// Serialize the children of `id`
    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        for child in self.children(id) {
            self.write_html(*child, None, &mut out);
        }
        out
    }

    /// Serialize the children of `id`, dropping attributes the rules disallow
    pub fn sanitized_inner_html(&self, id: NodeId, rules: &SanitizeRules) -> String {
        let mut out = String::new();
        for child in self.children(id) {
            self.write_html(*child, Some(rules), &mut out);
        }
        out
    }

    fn write_html(&self, id: NodeId, rules: Option<&SanitizeRules>, out: &mut String) {
        let Ok(node) = self.node(id) else {
            return;
        };
        match &node.kind {
            NodeKind::Text(text) => out.push_str(&html_escape::encode_text(text)),
            NodeKind::Element(el) => {
                out.push('<');
                out.push_str(&el.tag);
                for (name, value) in &el.attributes {
                    if rules.map(|r| r.allows(&el.tag, name)).unwrap_or(true) {
                        out.push(' ');
                        out.push_str(name);
                        out.push_str("=\"");
                        out.push_str(&html_escape::encode_double_quoted_attribute(value));
                        out.push('"');
                    }
                }
                out.push('>');
                for child in node.children() {
                    self.write_html(*child, rules, out);
                }
                out.push_str("</");
                out.push_str(&el.tag);
                out.push('>');
            }
        }
    }
}
