//! Interface to the host editor
//!
//! Everything the tool needs from the surrounding editor goes through
//! `EditorHost`. `CommandQueue` records the requests so the WASM bridge can hand
//! them to JavaScript after each call.

use crate::dom::NodeId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObserverId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriptionId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeStyle {
    Error,
}

/// A user-facing message for the host's notifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub message: String,
    pub style: NoticeStyle,
}

impl Notice {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            style: NoticeStyle::Error,
        }
    }
}

pub trait EditorHost {
    /// Widen the active selection to cover `node`
    fn expand_to_tag(&mut self, node: NodeId);

    /// Route clicks on `node` back to the tool
    fn attach_click_listener(&mut self, node: NodeId);

    /// Start reporting size changes of `anchor` and the open overlay
    fn observe_resize(&mut self, anchor: NodeId) -> ObserverId;

    fn disconnect_resize(&mut self, observer: ObserverId);

    /// Start delivering child-list mutation batches under `scope`
    fn subscribe_mutations(&mut self, scope: NodeId) -> SubscriptionId;

    fn unsubscribe_mutations(&mut self, subscription: SubscriptionId);

    fn open_overlay(&mut self, anchor: NodeId);

    fn close_overlay(&mut self, anchor: NodeId);

    fn notify(&mut self, notice: Notice);
}

/// A recorded host request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum HostCommand {
    ExpandToTag { node: NodeId },
    AttachClickListener { node: NodeId },
    ObserveResize { node: NodeId, observer: ObserverId },
    DisconnectResize { observer: ObserverId },
    Subscribe { scope: NodeId, subscription: SubscriptionId },
    Unsubscribe { subscription: SubscriptionId },
    OpenOverlay { anchor: NodeId },
    CloseOverlay { anchor: NodeId },
    Notify { notice: Notice },
}

/// `EditorHost` that queues every request
#[derive(Debug, Clone, Default)]
pub struct CommandQueue {
    commands: Vec<HostCommand>,
    next_id: u32,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[HostCommand] {
        &self.commands
    }

    /// Take everything queued so far
    pub fn drain(&mut self) -> Vec<HostCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Number of queued commands matching `predicate`
    pub fn count<F>(&self, predicate: F) -> usize
    where
        F: Fn(&HostCommand) -> bool,
    {
        self.commands.iter().filter(|c| predicate(c)).count()
    }

    fn next_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }
}

impl EditorHost for CommandQueue {
    fn expand_to_tag(&mut self, node: NodeId) {
        self.commands.push(HostCommand::ExpandToTag { node });
    }

    fn attach_click_listener(&mut self, node: NodeId) {
        self.commands.push(HostCommand::AttachClickListener { node });
    }

    fn observe_resize(&mut self, anchor: NodeId) -> ObserverId {
        let observer = ObserverId(self.next_id());
        self.commands.push(HostCommand::ObserveResize {
            node: anchor,
            observer,
        });
        observer
    }

    fn disconnect_resize(&mut self, observer: ObserverId) {
        self.commands.push(HostCommand::DisconnectResize { observer });
    }

    fn subscribe_mutations(&mut self, scope: NodeId) -> SubscriptionId {
        let subscription = SubscriptionId(self.next_id());
        self.commands.push(HostCommand::Subscribe {
            scope,
            subscription,
        });
        subscription
    }

    fn unsubscribe_mutations(&mut self, subscription: SubscriptionId) {
        self.commands.push(HostCommand::Unsubscribe { subscription });
    }

    fn open_overlay(&mut self, anchor: NodeId) {
        self.commands.push(HostCommand::OpenOverlay { anchor });
    }

    fn close_overlay(&mut self, anchor: NodeId) {
        self.commands.push(HostCommand::CloseOverlay { anchor });
    }

    fn notify(&mut self, notice: Notice) {
        self.commands.push(HostCommand::Notify { notice });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique_across_kinds() {
        let mut queue = CommandQueue::new();
        let observer = queue.observe_resize(NodeId(1));
        let subscription = queue.subscribe_mutations(NodeId(0));
        assert_ne!(observer.0, subscription.0);
        assert_eq!(queue.commands().len(), 2);
    }

    #[test]
    fn test_drain_empties_queue() {
        let mut queue = CommandQueue::new();
        queue.notify(Notice::error("not saved"));
        let drained = queue.drain();
        assert_eq!(
            drained,
            vec![HostCommand::Notify {
                notice: Notice::error("not saved")
            }]
        );
        assert!(queue.commands().is_empty());
    }

    #[test]
    fn test_commands_serialize_with_kind_tag() {
        let json = serde_json::to_string(&HostCommand::ExpandToTag { node: NodeId(3) }).unwrap();
        assert_eq!(json, r#"{"kind":"expandToTag","node":3}"#);
    }
}
