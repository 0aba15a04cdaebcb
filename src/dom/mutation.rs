//! Child-list mutation records
//!
//! The document collects one record per removal; the host drains them as a
//! batch after each edit and hands the batch to whoever subscribed.

use super::node::{Document, NodeId};
use serde::{Deserialize, Serialize};

/// Nodes removed from `target` in one operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationRecord {
    pub target: NodeId,
    pub removed: Vec<NodeId>,
}

/// All records produced by one logical edit
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationBatch {
    pub records: Vec<MutationRecord>,
}

impl MutationBatch {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Every removed node across the batch, in record order
    pub fn removed_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.records.iter().flat_map(|r| r.removed.iter().copied())
    }

    /// Whether any removed subtree contains a node matching `predicate`
    pub fn removed_any<F>(&self, doc: &Document, predicate: F) -> bool
    where
        F: Fn(&Document, NodeId) -> bool,
    {
        self.removed_nodes()
            .any(|root| doc.descendants(root).into_iter().any(|n| predicate(doc, n)))
    }
}
