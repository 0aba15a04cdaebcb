//! Lifecycle state and the editing session
//!
//! `Session` is a plain value: transitions consume it and hand back a new one
//! (or nothing, once the overlay closes).

use super::host::ObserverId;
use crate::dom::{Document, NodeId, Range};
use crate::models::{form_from_node, Field, MetadataForm, PlacementResult};
use crate::validation::ValidationError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How the annotation under edit came to be
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionOrigin {
    /// Wrapped from a fresh selection
    Created,
    /// An existing annotation was clicked
    Reopened,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    anchor: NodeId,
    origin: SessionOrigin,
    committed: bool,
    observer: ObserverId,
}

impl Session {
    pub(crate) fn open(anchor: NodeId, origin: SessionOrigin, observer: ObserverId) -> Self {
        Self {
            anchor,
            origin,
            committed: false,
            observer,
        }
    }

    pub fn anchor(&self) -> NodeId {
        self.anchor
    }

    pub fn origin(&self) -> SessionOrigin {
        self.origin
    }

    pub fn is_committed(&self) -> bool {
        self.committed
    }

    pub fn observer(&self) -> ObserverId {
        self.observer
    }

    pub(crate) fn commit(self) -> Self {
        Self {
            committed: true,
            ..self
        }
    }
}

/// The editing surface: form values, inline errors, last placement
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overlay {
    pub form: MetadataForm,
    pub errors: BTreeMap<Field, ValidationError>,
    pub placement: Option<PlacementResult>,
}

impl Overlay {
    pub fn populate(doc: &Document, anchor: NodeId) -> Self {
        Self {
            form: form_from_node(doc, anchor),
            ..Self::default()
        }
    }

    pub fn view(&self, anchor: NodeId) -> OverlayView {
        OverlayView {
            anchor,
            fields: Field::ALL
                .iter()
                .map(|field| FieldView {
                    field: *field,
                    input_id: field.input_id(),
                    label: field.label(),
                    input_type: field.input_type(),
                    value: self.form.get(*field).to_string(),
                    error: self.errors.get(field).map(|e| e.to_string()),
                })
                .collect(),
            placement: self.placement,
        }
    }
}

/// One overlay input as the host renders it
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldView {
    pub field: Field,
    pub input_id: &'static str,
    pub label: &'static str,
    pub input_type: &'static str,
    pub value: String,
    pub error: Option<String>,
}

/// Serializable description of the open overlay
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayView {
    pub anchor: NodeId,
    pub fields: Vec<FieldView>,
    pub placement: Option<PlacementResult>,
}

/// Where the lifecycle stands
///
/// Committing and Cancelling happen inside a single call and never persist.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum LifecycleState {
    #[default]
    Idle,
    Selecting(Range),
    Editing {
        session: Session,
        overlay: Overlay,
    },
}

impl LifecycleState {
    pub fn name(&self) -> &'static str {
        match self {
            LifecycleState::Idle => "Idle",
            LifecycleState::Selecting(_) => "Selecting",
            LifecycleState::Editing { .. } => "Editing",
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, LifecycleState::Idle)
    }

    pub fn session(&self) -> Option<&Session> {
        match self {
            LifecycleState::Editing { session, .. } => Some(session),
            _ => None,
        }
    }

    pub fn overlay(&self) -> Option<&Overlay> {
        match self {
            LifecycleState::Editing { overlay, .. } => Some(overlay),
            _ => None,
        }
    }
}
