//! Arena-backed document tree
//!
//! Nodes live in a flat arena and are addressed by `NodeId`. Detached nodes stay
//! in the arena so mutation records can still be inspected after removal.

use super::mutation::{MutationBatch, MutationRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Handle to a node in a `Document`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Errors raised by tree and range operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomError {
    #[error("unknown node {0}")]
    UnknownNode(NodeId),

    #[error("node {0} is not an element")]
    NotAnElement(NodeId),

    #[error("node {0} is detached from the document")]
    Detached(NodeId),

    #[error("offset {offset} out of bounds for node {node} (max: {max})")]
    OffsetOutOfBounds { node: NodeId, offset: usize, max: usize },

    #[error("node {child} cannot be inserted under its own descendant {parent}")]
    HierarchyRequest { parent: NodeId, child: NodeId },

    #[error("document root must be an element")]
    RootNotElement,
}

/// Element payload: lowercase tag plus attributes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
    pub tag: String,
    pub attributes: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Element(ElementData),
    Text(String),
}

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_element(&self) -> bool {
        matches!(self.kind, NodeKind::Element(_))
    }
}

/// Serializable node tree, the shape documents are loaded from and exported to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NodeData {
    Element {
        tag: String,
        #[serde(default)]
        attributes: BTreeMap<String, String>,
        #[serde(default)]
        children: Vec<NodeData>,
    },
    Text {
        text: String,
    },
}

impl NodeData {
    pub fn element(tag: &str, children: Vec<NodeData>) -> Self {
        NodeData::Element {
            tag: tag.to_string(),
            attributes: BTreeMap::new(),
            children,
        }
    }

    pub fn text(text: &str) -> Self {
        NodeData::Text {
            text: text.to_string(),
        }
    }
}

/// The live document tree
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
    pending: Vec<MutationRecord>,
}

impl Document {
    /// Create a document with an empty `body` root
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            root: NodeId(0),
            pending: Vec::new(),
        };
        doc.root = doc.create_element("body");
        doc
    }

    /// Build a document from a serialized tree; the root must be an element
    pub fn from_data(data: &NodeData) -> Result<Self, DomError> {
        let mut doc = Self {
            nodes: Vec::new(),
            root: NodeId(0),
            pending: Vec::new(),
        };
        if !matches!(data, NodeData::Element { .. }) {
            return Err(DomError::RootNotElement);
        }
        doc.root = doc.build(data);
        Ok(doc)
    }

    fn build(&mut self, data: &NodeData) -> NodeId {
        match data {
            NodeData::Text { text } => self.create_text(text),
            NodeData::Element {
                tag,
                attributes,
                children,
            } => {
                let id = self.create_element(tag);
                if let NodeKind::Element(el) = &mut self.nodes[id.0].kind {
                    el.attributes = attributes.clone();
                }
                for child in children {
                    let child_id = self.build(child);
                    self.nodes[child_id.0].parent = Some(id);
                    self.nodes[id.0].children.push(child_id);
                }
                id
            }
        }
    }

    /// Export a subtree back into its serializable form
    pub fn to_data(&self, id: NodeId) -> Result<NodeData, DomError> {
        let node = self.node(id)?;
        Ok(match &node.kind {
            NodeKind::Text(text) => NodeData::Text { text: text.clone() },
            NodeKind::Element(el) => NodeData::Element {
                tag: el.tag.clone(),
                attributes: el.attributes.clone(),
                children: node
                    .children
                    .iter()
                    .map(|c| self.to_data(*c))
                    .collect::<Result<Vec<_>, _>>()?,
            },
        })
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeKind::Element(ElementData {
            tag: tag.to_ascii_lowercase(),
            attributes: BTreeMap::new(),
        }))
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeKind::Text(text.to_string()))
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(kind));
        id
    }

    pub fn node(&self, id: NodeId) -> Result<&Node, DomError> {
        self.nodes.get(id.0).ok_or(DomError::UnknownNode(id))
    }

    fn element_mut(&mut self, id: NodeId) -> Result<&mut ElementData, DomError> {
        match self.nodes.get_mut(id.0) {
            Some(Node {
                kind: NodeKind::Element(el),
                ..
            }) => Ok(el),
            Some(_) => Err(DomError::NotAnElement(id)),
            None => Err(DomError::UnknownNode(id)),
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(id.0).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match self.nodes.get(id.0).map(|n| &n.kind) {
            Some(NodeKind::Element(el)) => Some(el.tag.as_str()),
            _ => None,
        }
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.nodes.get(id.0).map(|n| &n.kind) {
            Some(NodeKind::Text(text)) => Some(text.as_str()),
            _ => None,
        }
    }

    pub(crate) fn set_text(&mut self, id: NodeId, value: String) {
        if let Some(Node {
            kind: NodeKind::Text(text),
            ..
        }) = self.nodes.get_mut(id.0)
        {
            *text = value;
        }
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        match self.nodes.get(id.0).map(|n| &n.kind) {
            Some(NodeKind::Element(el)) => el.attributes.get(name).map(String::as_str),
            _ => None,
        }
    }

    pub fn attributes(&self, id: NodeId) -> Option<&BTreeMap<String, String>> {
        match self.nodes.get(id.0).map(|n| &n.kind) {
            Some(NodeKind::Element(el)) => Some(&el.attributes),
            _ => None,
        }
    }

    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        self.element_mut(id)?
            .attributes
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    /// Write several attributes at once; nothing is written unless `id` is an element
    pub fn set_attributes<'a, I>(&mut self, id: NodeId, attributes: I) -> Result<(), DomError>
    where
        I: IntoIterator<Item = (&'a str, String)>,
    {
        let el = self.element_mut(id)?;
        for (name, value) in attributes {
            el.attributes.insert(name.to_string(), value);
        }
        Ok(())
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.attribute(id, "class")
            .map(|classes| classes.split_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    pub fn add_class(&mut self, id: NodeId, class: &str) -> Result<(), DomError> {
        if self.has_class(id, class) {
            return Ok(());
        }
        let el = self.element_mut(id)?;
        let classes = el.attributes.entry("class".to_string()).or_default();
        if !classes.is_empty() {
            classes.push(' ');
        }
        classes.push_str(class);
        Ok(())
    }

    /// Position of `id` among its parent's children
    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|c| *c == id)
    }

    /// Whether `id` is reachable from the document root
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == self.root {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    /// Whether `ancestor` is `id` or one of its ancestors
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.insert_before(parent, child, None)
    }

    /// Insert `child` under `parent` before `reference` (or at the end)
    ///
    /// A child that is already attached somewhere is moved, which is recorded
    /// as a removal from its old parent.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), DomError> {
        self.element_mut(parent)?;
        self.node(child)?;
        if self.is_inclusive_ancestor(child, parent) {
            return Err(DomError::HierarchyRequest { parent, child });
        }
        self.detach(child);

        let index = match reference {
            Some(reference) => self
                .children(parent)
                .iter()
                .position(|c| *c == reference)
                .ok_or(DomError::UnknownNode(reference))?,
            None => self.children(parent).len(),
        };
        self.insert_at(parent, index, child);
        Ok(())
    }

    pub(crate) fn insert_at(&mut self, parent: NodeId, index: usize, child: NodeId) {
        self.detach(child);
        let index = index.min(self.nodes[parent.0].children.len());
        self.nodes[parent.0].children.insert(index, child);
        self.nodes[child.0].parent = Some(parent);
    }

    /// Remove `id` from its parent; a no-op for detached nodes
    pub fn remove(&mut self, id: NodeId) -> Result<(), DomError> {
        self.node(id)?;
        self.detach(id);
        Ok(())
    }

    pub(crate) fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.nodes[id.0].parent.take() else {
            return;
        };
        self.nodes[parent.0].children.retain(|c| *c != id);
        self.pending.push(MutationRecord {
            target: parent,
            removed: vec![id],
        });
    }

    /// Replace every child of `id` with `children`, recorded as one mutation
    pub fn replace_children(&mut self, id: NodeId, children: Vec<NodeId>) -> Result<(), DomError> {
        self.element_mut(id)?;
        let old = std::mem::take(&mut self.nodes[id.0].children);
        for child in &old {
            self.nodes[child.0].parent = None;
        }
        if !old.is_empty() {
            self.pending.push(MutationRecord {
                target: id,
                removed: old,
            });
        }
        for child in children {
            self.insert_at(id, usize::MAX, child);
        }
        Ok(())
    }

    /// Shallow copy of an element (tag and attributes, no children)
    pub(crate) fn clone_shallow(&mut self, id: NodeId) -> Result<NodeId, DomError> {
        let kind = self.node(id)?.kind.clone();
        Ok(self.push(kind))
    }

    /// All nodes under `scope` (inclusive) in document order
    pub fn descendants(&self, scope: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![scope];
        while let Some(id) = stack.pop() {
            if self.nodes.get(id.0).is_none() {
                continue;
            }
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    /// Elements under `scope` with the given tag and class, in document order
    pub fn elements_by_tag_and_class(&self, scope: NodeId, tag: &str, class: &str) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|id| {
                self.tag(*id)
                    .map(|t| t.eq_ignore_ascii_case(tag))
                    .unwrap_or(false)
                    && self.has_class(*id, class)
            })
            .collect()
    }

    /// Nearest inclusive ancestor element matching `predicate`
    pub fn closest<F>(&self, id: NodeId, predicate: F) -> Option<NodeId>
    where
        F: Fn(&Self, NodeId) -> bool,
    {
        let mut current = Some(id);
        while let Some(node) = current {
            if self.node(node).map(Node::is_element).unwrap_or(false) && predicate(self, node) {
                return Some(node);
            }
            current = self.parent(node);
        }
        None
    }

    /// Nearest inclusive ancestor element with tag `tag` (case-insensitive)
    pub fn find_parent_tag(&self, id: NodeId, tag: &str) -> Option<NodeId> {
        self.closest(id, |doc, node| {
            doc.tag(node)
                .map(|t| t.eq_ignore_ascii_case(tag))
                .unwrap_or(false)
        })
    }

    /// Concatenated text of all descendant text nodes
    pub fn text_content(&self, id: NodeId) -> String {
        self.descendants(id)
            .into_iter()
            .filter_map(|n| self.text(n))
            .collect()
    }

    /// Concatenated text of the direct text children only
    pub fn direct_text(&self, id: NodeId) -> String {
        self.children(id)
            .iter()
            .filter_map(|n| self.text(*n))
            .collect()
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?;
        index.checked_sub(1).map(|i| self.children(parent)[i])
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?;
        self.children(parent).get(index + 1).copied()
    }

    /// Join `left` with its next sibling when both are text, or both are
    /// elements with the same tag and attributes
    ///
    /// Joined elements are merged recursively at the seam, so this undoes the
    /// splits made by `extract_contents`. Returns whether anything was joined.
    pub fn merge_with_next(&mut self, left: NodeId) -> Result<bool, DomError> {
        self.node(left)?;
        let Some(right) = self.next_sibling(left) else {
            return Ok(false);
        };

        match (&self.nodes[left.0].kind, &self.nodes[right.0].kind) {
            (NodeKind::Text(head), NodeKind::Text(tail)) => {
                let joined = format!("{}{}", head, tail);
                self.set_text(left, joined);
                self.detach(right);
            }
            (NodeKind::Element(a), NodeKind::Element(b)) if a == b => {
                let seam = self.children(left).last().copied();
                let moved = self.children(right).to_vec();
                for child in moved {
                    self.insert_at(left, usize::MAX, child);
                }
                self.detach(right);
                if let Some(seam) = seam {
                    self.merge_with_next(seam)?;
                }
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    /// Drain the mutation records collected since the last call
    pub fn take_mutations(&mut self) -> MutationBatch {
        MutationBatch {
            records: std::mem::take(&mut self.pending),
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
