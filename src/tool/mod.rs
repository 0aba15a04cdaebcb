//! Annotation lifecycle
//!
//! `AnnotationTool` drives one annotation at a time through
//! `Idle → Selecting → Editing → {Committing | Cancelling} → Idle`:
//!
//! - `surround` wraps a selection in a new annotation and opens the overlay
//! - `edit_annotation` reopens the overlay for a clicked annotation
//! - `save` validates, writes the metadata and closes
//! - `close` / `remove` end the session, unwrapping nodes left without metadata
//!
//! Every way out of `Editing` goes through `finish`, which disconnects the
//! resize observer, drops the session and renumbers the references.

pub mod config;
pub mod error;
pub mod host;
pub mod session;
pub mod watcher;

pub use config::{ToolConfig, SANITIZE_RULES};
pub use error::LifecycleError;
pub use host::{CommandQueue, EditorHost, HostCommand, Notice, NoticeStyle, ObserverId, SubscriptionId};
pub use session::{FieldView, LifecycleState, Overlay, OverlayView, Session, SessionOrigin};
pub use watcher::DeletionWatcher;

use crate::dom::{Document, DomError, MutationBatch, NodeId, Range, SanitizeRules, Selection};
use crate::models::{
    has_metadata, is_annotation, unescape, Field, PlacementRequest, PlacementResult, Rect, Size,
    ANNOTATION_CLASS, ANNOTATION_TAG, LISTENER_MARKER,
};
use crate::renderers::{OverlayPositioner, PlacementOverride, ReferenceMap, ReferenceNumberer};
use crate::validation::{MetadataValidator, ValidationError};
use error::dom_failure;
use serde::Serialize;

pub const TOOLBAR_CLASSES: [&str; 2] = ["ce-inline-tool", "ce-inline-tool-annotation"];
pub const TOOLBAR_ACTIVE_CLASS: &str = "ce-inline-tool--active";

/// The toolbar control the host mounts for this tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolbarButton {
    pub classes: Vec<&'static str>,
    pub active: bool,
}

impl ToolbarButton {
    fn new() -> Self {
        Self {
            classes: TOOLBAR_CLASSES.to_vec(),
            active: false,
        }
    }

    /// Classes to apply, including the active marker when set
    pub fn class_list(&self) -> Vec<&'static str> {
        let mut classes = self.classes.clone();
        if self.active {
            classes.push(TOOLBAR_ACTIVE_CLASS);
        }
        classes
    }
}

/// How a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CloseOutcome {
    /// The annotation stays in the document
    Kept,
    /// The annotation was removed and its content put back
    Unwrapped,
}

pub struct AnnotationTool {
    config: ToolConfig,
    placement_override: Option<PlacementOverride>,
    state: LifecycleState,
    watcher: DeletionWatcher,
    button: ToolbarButton,
    references: ReferenceMap,
    renumber_passes: usize,
}

impl AnnotationTool {
    /// Register the tool against `doc`: existing annotations get their click
    /// listener and the deletion watcher subscribes to the document
    pub fn new(config: ToolConfig, doc: &mut Document, host: &mut dyn EditorHost) -> Self {
        let mut tool = Self {
            config,
            placement_override: None,
            state: LifecycleState::Idle,
            watcher: DeletionWatcher::subscribe(host, doc.root()),
            button: ToolbarButton::new(),
            references: ReferenceMap::default(),
            renumber_passes: 0,
        };
        tool.attach_listeners_to_all(doc, host);
        tool
    }

    /// Replace the default overlay placement
    pub fn with_placement_override(mut self, placement: PlacementOverride) -> Self {
        self.placement_override = Some(placement);
        self
    }

    pub fn set_placement_override(&mut self, placement: Option<PlacementOverride>) {
        self.placement_override = placement;
    }

    /// Attributes the host sanitizer must keep on annotation nodes
    pub fn sanitize() -> &'static SanitizeRules {
        &SANITIZE_RULES
    }

    pub fn config(&self) -> &ToolConfig {
        &self.config
    }

    pub fn state(&self) -> &LifecycleState {
        &self.state
    }

    pub fn session(&self) -> Option<&Session> {
        self.state.session()
    }

    pub fn overlay_view(&self) -> Option<OverlayView> {
        match &self.state {
            LifecycleState::Editing { session, overlay } => Some(overlay.view(session.anchor())),
            _ => None,
        }
    }

    /// Result of the latest numbering pass
    pub fn references(&self) -> &ReferenceMap {
        &self.references
    }

    pub fn renumber_passes(&self) -> usize {
        self.renumber_passes
    }

    pub fn watcher(&self) -> &DeletionWatcher {
        &self.watcher
    }

    pub fn render(&self) -> ToolbarButton {
        self.button.clone()
    }

    /// Toggle the toolbar's active state from the host selection
    pub fn check_state(&mut self, doc: &Document, selection: &Selection) -> bool {
        let Some(anchor) = selection.anchor_node() else {
            return self.button.active;
        };
        self.button.active = doc.closest(anchor, is_annotation).is_some();
        self.button.active
    }

    /// Wrap `range` in a new annotation and open the overlay for it
    pub fn surround(
        &mut self,
        doc: &mut Document,
        host: &mut dyn EditorHost,
        range: Option<Range>,
    ) -> Result<(), LifecycleError> {
        let range = range.ok_or(LifecycleError::MissingAnchor)?;
        if !self.state.is_idle() {
            log::debug!("surround ignored: overlay already open");
            return Ok(());
        }
        if range.is_collapsed() {
            return Err(LifecycleError::MissingAnchor);
        }

        self.state = LifecycleState::Selecting(range);
        log::debug!("Idle -> Selecting");

        let wrapper = match Self::wrap(doc, range) {
            Ok(wrapper) => wrapper,
            Err(err) => {
                self.state = LifecycleState::Idle;
                return Err(dom_failure(err));
            }
        };
        self.attach_listener(doc, host, wrapper);
        host.expand_to_tag(wrapper);
        self.open(doc, host, wrapper, SessionOrigin::Created);
        Ok(())
    }

    fn wrap(doc: &mut Document, mut range: Range) -> Result<NodeId, DomError> {
        let fragment = doc.extract_contents(&mut range)?;

        let wrapper = doc.create_element(ANNOTATION_TAG);
        doc.add_class(wrapper, ANNOTATION_CLASS)?;
        doc.set_attribute(wrapper, "contenteditable", "false")?;
        for node in fragment {
            doc.append_child(wrapper, node)?;
        }
        doc.insert_node(&range, wrapper)?;
        Ok(wrapper)
    }

    /// Reopen the overlay for an existing annotation (click handler)
    pub fn edit_annotation(
        &mut self,
        doc: &mut Document,
        host: &mut dyn EditorHost,
        node: NodeId,
    ) -> Result<(), LifecycleError> {
        if !is_annotation(doc, node) || !doc.is_attached(node) {
            return Err(LifecycleError::MissingAnchor);
        }
        if !self.state.is_idle() {
            log::debug!("edit of {} ignored: overlay already open", node);
            return Ok(());
        }
        self.open(doc, host, node, SessionOrigin::Reopened);
        Ok(())
    }

    fn open(&mut self, doc: &Document, host: &mut dyn EditorHost, anchor: NodeId, origin: SessionOrigin) {
        let observer = host.observe_resize(anchor);
        host.open_overlay(anchor);
        self.state = LifecycleState::Editing {
            session: Session::open(anchor, origin, observer),
            overlay: Overlay::populate(doc, anchor),
        };
        log::debug!("-> Editing {} ({:?})", anchor, origin);
    }

    /// Store a field edit and validate it immediately
    pub fn update_field(&mut self, field: Field, value: &str) -> Result<Option<ValidationError>, LifecycleError> {
        let LifecycleState::Editing { overlay, .. } = &mut self.state else {
            return Err(LifecycleError::MissingAnchor);
        };
        overlay.form.set(field, value);
        let error = MetadataValidator::validate(field, value);
        match &error {
            Some(err) => {
                overlay.errors.insert(field, err.clone());
            }
            None => {
                overlay.errors.remove(&field);
            }
        }
        Ok(error)
    }

    /// Validate the overlay and commit its metadata to the annotation
    ///
    /// On rejection the overlay stays open with its errors and the document is
    /// untouched. On success the overlay closes.
    pub fn save(&mut self, doc: &mut Document, host: &mut dyn EditorHost) -> Result<(), LifecycleError> {
        let (session, mut overlay) = match std::mem::take(&mut self.state) {
            LifecycleState::Editing { session, overlay } => (session, overlay),
            other => {
                self.state = other;
                return Err(LifecycleError::MissingAnchor);
            }
        };
        log::debug!("Editing -> Committing");

        let metadata = match MetadataValidator::parse(&overlay.form) {
            Ok(metadata) => metadata,
            Err(report) => {
                if let Some(first) = report.first() {
                    host.notify(Notice::error(first.to_string()));
                }
                overlay.errors = report.errors.clone();
                self.state = LifecycleState::Editing { session, overlay };
                log::debug!("Committing rejected, back to Editing");
                return Err(LifecycleError::Validation(report));
            }
        };

        let anchor = session.anchor();
        if !doc.is_attached(anchor) {
            self.finish(doc, host, session);
            return Err(LifecycleError::MissingAnchor);
        }
        if let Err(err) = doc.set_attributes(anchor, metadata.to_attributes()) {
            self.finish(doc, host, session);
            return Err(dom_failure(err));
        }

        self.finish(doc, host, session.commit());
        Ok(())
    }

    /// Close the overlay (close button or a click outside it)
    pub fn close(&mut self, doc: &mut Document, host: &mut dyn EditorHost) -> Result<CloseOutcome, LifecycleError> {
        match std::mem::take(&mut self.state) {
            LifecycleState::Editing { session, .. } => Ok(self.finish(doc, host, session)),
            other => {
                self.state = other;
                Err(LifecycleError::MissingAnchor)
            }
        }
    }

    /// Remove the annotation under edit, keeping its publication title as text
    pub fn remove(&mut self, doc: &mut Document, host: &mut dyn EditorHost) -> Result<(), LifecycleError> {
        let session = match std::mem::take(&mut self.state) {
            LifecycleState::Editing { session, .. } => session,
            other => {
                self.state = other;
                return Err(LifecycleError::MissingAnchor);
            }
        };
        if let Err(err) = Self::unwrap(doc, session.anchor()) {
            log::warn!("Could not unwrap {}: {}", session.anchor(), err);
        }
        self.finish(doc, host, session);
        Ok(())
    }

    /// Common exit from `Editing`; the state has already been taken
    fn finish(&mut self, doc: &mut Document, host: &mut dyn EditorHost, session: Session) -> CloseOutcome {
        let anchor = session.anchor();
        if !session.is_committed() {
            log::debug!("Editing -> Cancelling");
        }
        host.disconnect_resize(session.observer());
        host.close_overlay(anchor);

        let mut outcome = if doc.is_attached(anchor) {
            CloseOutcome::Kept
        } else {
            CloseOutcome::Unwrapped
        };
        if !session.is_committed() && doc.is_attached(anchor) {
            if let Err(LifecycleError::EmptyAnnotation) = Self::require_metadata(doc, anchor) {
                match Self::unwrap(doc, anchor) {
                    Ok(()) => outcome = CloseOutcome::Unwrapped,
                    Err(err) => log::warn!("Could not unwrap {}: {}", anchor, err),
                }
            }
        }

        self.state = LifecycleState::Idle;
        self.renumber(doc);
        log::debug!("-> Idle ({:?})", outcome);
        outcome
    }

    fn require_metadata(doc: &Document, node: NodeId) -> Result<(), LifecycleError> {
        if has_metadata(doc, node) {
            Ok(())
        } else {
            Err(LifecycleError::EmptyAnnotation)
        }
    }

    /// Replace the annotation with its publication title, or with its own
    /// content when there is no title
    fn unwrap(doc: &mut Document, node: NodeId) -> Result<(), DomError> {
        let Some(parent) = doc.parent(node) else {
            return Ok(());
        };
        let title = doc
            .attribute(node, Field::Publication.attribute())
            .filter(|p| !p.is_empty())
            .map(|p| unescape(p).into_owned());

        let replacement = match title {
            Some(title) => vec![doc.create_text(&title)],
            None => doc.children(node).to_vec(),
        };
        let before = doc.previous_sibling(node);
        for child in &replacement {
            doc.insert_before(parent, *child, Some(node))?;
        }
        doc.remove(node)?;

        // Rejoin the pieces the selection split apart, right seam first
        if let Some(last) = replacement.last() {
            Self::rejoin(doc, *last)?;
        }
        match before {
            Some(before) => Self::rejoin(doc, before),
            None => Ok(()),
        }
    }

    fn rejoin(doc: &mut Document, left: NodeId) -> Result<(), DomError> {
        let Some(right) = doc.next_sibling(left) else {
            return Ok(());
        };
        if is_annotation(doc, left) || is_annotation(doc, right) {
            return Ok(());
        }
        doc.merge_with_next(left).map(|_| ())
    }

    /// Placement inputs for the open overlay
    pub fn placement_request(&self, anchor: Rect, overlay: Size, viewport_height: f64) -> PlacementRequest {
        PlacementRequest {
            anchor,
            overlay,
            viewport_height,
            buffer_spacing: self.config.buffer_spacing,
        }
    }

    /// Recompute the overlay placement after the anchor or overlay resized
    pub fn reposition(&mut self, anchor: Rect, overlay_size: Size, viewport_height: f64) -> Option<PlacementResult> {
        if self.session().is_none() {
            return None;
        }
        let request = self.placement_request(anchor, overlay_size, viewport_height);
        let placement = OverlayPositioner::place_with(&request, self.placement_override.as_ref());
        self.apply_placement(placement)
    }

    /// Record a placement computed outside the tool
    pub fn apply_placement(&mut self, placement: PlacementResult) -> Option<PlacementResult> {
        let LifecycleState::Editing { overlay, .. } = &mut self.state else {
            return None;
        };
        overlay.placement = Some(placement);
        Some(placement)
    }

    /// Feed a mutation batch from the host; returns whether it renumbered
    pub fn handle_mutations(
        &mut self,
        doc: &mut Document,
        host: &mut dyn EditorHost,
        batch: &MutationBatch,
    ) -> bool {
        let affected = self.watcher.observe(doc, batch);

        let anchor_gone = self
            .session()
            .map(|s| !doc.is_attached(s.anchor()))
            .unwrap_or(false);
        if anchor_gone {
            if let LifecycleState::Editing { session, .. } = std::mem::take(&mut self.state) {
                log::debug!("Anchor {} vanished, closing overlay", session.anchor());
                self.finish(doc, host, session);
                return true;
            }
        }

        if affected {
            self.renumber(doc);
        }
        affected
    }

    /// Drop the document subscription; closes any open overlay first
    pub fn destroy(&mut self, doc: &mut Document, host: &mut dyn EditorHost) {
        if let LifecycleState::Editing { session, .. } = std::mem::take(&mut self.state) {
            self.finish(doc, host, session);
        }
        self.watcher.teardown(host);
    }

    fn renumber(&mut self, doc: &mut Document) {
        let root = doc.root();
        self.references = ReferenceNumberer::renumber(doc, root);
        self.renumber_passes += 1;
    }

    fn attach_listener(&self, doc: &mut Document, host: &mut dyn EditorHost, node: NodeId) {
        if doc.attribute(node, LISTENER_MARKER).is_some() {
            return;
        }
        host.attach_click_listener(node);
        if let Err(err) = doc.set_attribute(node, LISTENER_MARKER, "true") {
            log::warn!("Could not mark listener on {}: {}", node, err);
        }
    }

    /// Attach click listeners to every annotation not yet carrying one
    pub fn attach_listeners_to_all(&self, doc: &mut Document, host: &mut dyn EditorHost) {
        let root = doc.root();
        for node in doc.elements_by_tag_and_class(root, ANNOTATION_TAG, ANNOTATION_CLASS) {
            self.attach_listener(doc, host, node);
        }
    }
}
