//! Lifecycle error types
//!
//! None of these are fatal: validation keeps the overlay open, an empty
//! annotation is unwrapped, and a missing anchor turns the call into a no-op.

use crate::dom::DomError;
use crate::validation::ValidationReport;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    /// Save rejected; the overlay stays open with field errors
    #[error("{} field(s) failed validation", .0.errors.len())]
    Validation(ValidationReport),

    /// Closed without any metadata; resolved by unwrapping the node
    #[error("annotation has no metadata")]
    EmptyAnnotation,

    /// No active range or annotation to operate on
    #[error("no active selection or annotation")]
    MissingAnchor,
}

impl LifecycleError {
    /// Whether the caller should treat this as a silent no-op
    pub fn is_silent(&self) -> bool {
        matches!(self, LifecycleError::EmptyAnnotation | LifecycleError::MissingAnchor)
    }
}

/// Tree failures during a transition leave nothing to act on
pub(crate) fn dom_failure(err: DomError) -> LifecycleError {
    log::warn!("Document operation failed: {}", err);
    LifecycleError::MissingAnchor
}
