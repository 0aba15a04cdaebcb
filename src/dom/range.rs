//! Ranges and selections over the document tree
//!
//! A boundary is either a character offset inside a text node or a child index
//! inside an element, the same convention the browser uses.

use super::node::{Document, DomError, NodeId, NodeKind};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Boundary {
    pub node: NodeId,
    pub offset: usize,
}

impl Boundary {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

/// A range from start (inclusive) to end (exclusive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub start: Boundary,
    pub end: Boundary,
}

impl Range {
    pub fn new(start: Boundary, end: Boundary) -> Self {
        Self { start, end }
    }

    pub fn collapsed(at: Boundary) -> Self {
        Self { start: at, end: at }
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }
}

/// The host's current selection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    #[serde(default)]
    pub ranges: Vec<Range>,
}

impl Selection {
    pub fn new(range: Range) -> Self {
        Self { ranges: vec![range] }
    }

    pub fn range_count(&self) -> usize {
        self.ranges.len()
    }

    pub fn first_range(&self) -> Option<&Range> {
        self.ranges.first()
    }

    /// Node where the selection started
    pub fn anchor_node(&self) -> Option<NodeId> {
        self.ranges.first().map(|r| r.start.node)
    }
}

/// A position between two children of `parent`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Point {
    parent: NodeId,
    index: usize,
}

/// Result of splitting a text node: `head` keeps the first `at` characters
#[derive(Debug, Clone, Copy)]
struct TextSplit {
    head: NodeId,
    tail: NodeId,
    at: usize,
}

impl Document {
    fn boundary_len(&self, id: NodeId) -> Result<usize, DomError> {
        let node = self.node(id)?;
        Ok(match &node.kind {
            NodeKind::Text(text) => text.chars().count(),
            NodeKind::Element(_) => node.children().len(),
        })
    }

    fn check_boundary(&self, boundary: Boundary) -> Result<(), DomError> {
        let max = self.boundary_len(boundary.node)?;
        if boundary.offset > max {
            return Err(DomError::OffsetOutOfBounds {
                node: boundary.node,
                offset: boundary.offset,
                max,
            });
        }
        Ok(())
    }

    /// Split a text node at a character offset, returning the new tail node
    fn split_text(&mut self, id: NodeId, offset: usize) -> Result<NodeId, DomError> {
        let parent = self.parent(id).ok_or(DomError::Detached(id))?;
        let index = self.index_in_parent(id).ok_or(DomError::Detached(id))?;
        let text = self.text(id).unwrap_or_default().to_string();
        let byte = text
            .char_indices()
            .nth(offset)
            .map(|(i, _)| i)
            .unwrap_or(text.len());
        let (head, tail) = text.split_at(byte);

        let tail_id = self.create_text(tail);
        self.set_text(id, head.to_string());
        self.insert_at(parent, index + 1, tail_id);
        Ok(tail_id)
    }

    /// Split an element so children from `at` onwards move into a shallow clone
    /// placed right after it
    fn split_element(&mut self, id: NodeId, at: usize) -> Result<NodeId, DomError> {
        let parent = self.parent(id).ok_or(DomError::Detached(id))?;
        let index = self.index_in_parent(id).ok_or(DomError::Detached(id))?;
        let clone = self.clone_shallow(id)?;
        let moved: Vec<NodeId> = self.children(id)[at..].to_vec();
        for child in moved {
            self.insert_at(clone, usize::MAX, child);
        }
        self.insert_at(parent, index + 1, clone);
        Ok(clone)
    }

    /// Turn a boundary into an element-level point, splitting a text node when
    /// the offset falls inside it
    fn to_point(&mut self, boundary: Boundary) -> Result<(Point, Option<TextSplit>), DomError> {
        self.check_boundary(boundary)?;
        if self.text(boundary.node).is_none() {
            return Ok((
                Point {
                    parent: boundary.node,
                    index: boundary.offset,
                },
                None,
            ));
        }

        let parent = self
            .parent(boundary.node)
            .ok_or(DomError::Detached(boundary.node))?;
        let index = self
            .index_in_parent(boundary.node)
            .ok_or(DomError::Detached(boundary.node))?;
        let len = self.boundary_len(boundary.node)?;

        if boundary.offset == 0 {
            return Ok((Point { parent, index }, None));
        }
        if boundary.offset == len {
            return Ok((Point { parent, index: index + 1 }, None));
        }

        let tail = self.split_text(boundary.node, boundary.offset)?;
        Ok((
            Point { parent, index: index + 1 },
            Some(TextSplit {
                head: boundary.node,
                tail,
                at: boundary.offset,
            }),
        ))
    }

    /// Move a point one level up, splitting its parent if the point is inside it.
    /// Returns the new point and whether a clone was inserted at that point.
    fn lift(&mut self, point: Point) -> Result<(Point, bool), DomError> {
        let el = point.parent;
        let grandparent = self.parent(el).ok_or(DomError::Detached(el))?;
        let index = self.index_in_parent(el).ok_or(DomError::Detached(el))?;
        let len = self.children(el).len();

        if point.index == 0 {
            return Ok((Point { parent: grandparent, index }, false));
        }
        if point.index >= len {
            return Ok((Point { parent: grandparent, index: index + 1 }, false));
        }
        self.split_element(el, point.index)?;
        Ok((Point { parent: grandparent, index: index + 1 }, true))
    }

    fn common_ancestor(&self, a: NodeId, b: NodeId) -> Option<NodeId> {
        let mut current = Some(b);
        while let Some(node) = current {
            if self.is_inclusive_ancestor(node, a) {
                return Some(node);
            }
            current = self.parent(node);
        }
        None
    }

    /// Detach the contents of `range` and return them in document order
    ///
    /// Text nodes and elements that are only partly selected are split, so the
    /// returned fragment holds exactly the selected content. On return `range`
    /// is collapsed to where the contents used to be.
    pub fn extract_contents(&mut self, range: &mut Range) -> Result<Vec<NodeId>, DomError> {
        self.check_boundary(range.end)?;
        let (mut start, split) = self.to_point(range.start)?;

        let mut end_boundary = range.end;
        if let Some(split) = split {
            if end_boundary.node == split.head {
                end_boundary = Boundary::new(split.tail, end_boundary.offset.saturating_sub(split.at));
            } else if end_boundary.node == start.parent && end_boundary.offset >= start.index {
                end_boundary.offset += 1;
            }
        }
        let (mut end, _) = self.to_point(end_boundary)?;

        let ancestor = self
            .common_ancestor(start.parent, end.parent)
            .ok_or(DomError::Detached(range.start.node))?;

        // End first: clones it inserts always land after the start side.
        while end.parent != ancestor {
            end = self.lift(end)?.0;
        }
        while start.parent != ancestor {
            let (lifted, inserted) = self.lift(start)?;
            if inserted && lifted.parent == ancestor && end.index >= lifted.index {
                end.index += 1;
            }
            start = lifted;
        }

        let children = self.children(ancestor);
        let to = end.index.min(children.len()).max(start.index);
        let nodes: Vec<NodeId> = children[start.index.min(to)..to].to_vec();
        for node in &nodes {
            self.detach(*node);
        }

        *range = Range::collapsed(Boundary::new(ancestor, start.index));
        Ok(nodes)
    }

    /// Insert `node` at the start of `range`
    pub fn insert_node(&mut self, range: &Range, node: NodeId) -> Result<(), DomError> {
        self.node(node)?;
        let (point, _) = self.to_point(range.start)?;
        if self.is_inclusive_ancestor(node, point.parent) {
            return Err(DomError::HierarchyRequest {
                parent: point.parent,
                child: node,
            });
        }

        let mut index = point.index;
        if self.parent(node) == Some(point.parent) {
            if let Some(current) = self.index_in_parent(node) {
                if current < index {
                    index -= 1;
                }
            }
        }
        self.insert_at(point.parent, index, node);
        Ok(())
    }

    /// Remove the contents of `range` from the document
    pub fn delete_contents(&mut self, range: &Range) -> Result<(), DomError> {
        let mut range = *range;
        self.extract_contents(&mut range)?;
        Ok(())
    }
}
