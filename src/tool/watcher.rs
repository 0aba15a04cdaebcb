//! Deletion watcher
//!
//! Listens to the host's mutation batches and reports whether a batch took an
//! annotation out of the document. One batch yields at most one renumber,
//! however many annotations it removed.

use super::host::{EditorHost, SubscriptionId};
use crate::dom::{Document, MutationBatch, NodeId};
use crate::models::is_annotation;

#[derive(Debug, Default)]
pub struct DeletionWatcher {
    subscription: Option<SubscriptionId>,
    triggers: usize,
}

impl DeletionWatcher {
    pub fn subscribe(host: &mut dyn EditorHost, scope: NodeId) -> Self {
        Self {
            subscription: Some(host.subscribe_mutations(scope)),
            triggers: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.subscription.is_some()
    }

    /// Whether `batch` calls for renumbering
    pub fn observe(&mut self, doc: &Document, batch: &MutationBatch) -> bool {
        if !self.is_active() || batch.is_empty() {
            return false;
        }
        let removed = batch.removed_any(doc, is_annotation);
        if removed {
            self.triggers += 1;
            log::debug!("Annotation removed externally, renumbering");
        }
        removed
    }

    /// Batches that triggered renumbering so far
    pub fn triggers(&self) -> usize {
        self.triggers
    }

    /// Release the subscription; later calls do nothing
    pub fn teardown(&mut self, host: &mut dyn EditorHost) {
        if let Some(subscription) = self.subscription.take() {
            host.unsubscribe_mutations(subscription);
        }
    }
}
