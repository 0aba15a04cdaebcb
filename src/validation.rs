//! Metadata validation rules
//!
//! One rule table serves both the live per-keystroke check and the final
//! check on Save, so the two can never disagree.

use crate::models::{AnnotationMetadata, Field, MetadataForm};
use std::collections::BTreeMap;
use std::ops::RangeInclusive;
use thiserror::Error;

pub const YEAR_RANGE: RangeInclusive<i64> = 1000..=2100;

/// A single field failing its rule
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{} is required", .field.short_label())]
    Required { field: Field },

    #[error("{} must be at most {max} characters", .field.short_label())]
    TooLong { field: Field, max: usize },

    #[error("Year of Publication must be a whole number")]
    NotAnInteger,

    #[error("Year of Publication must be between {min} and {max}")]
    OutOfRange { min: i64, max: i64 },
}

/// Constraints for one field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRule {
    pub required: bool,
    pub max_len: Option<usize>,
    pub range: Option<RangeInclusive<i64>>,
}

/// Outcome of validating a whole form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: BTreeMap<Field, ValidationError>,
}

impl ValidationReport {
    /// Error text per field, as shown next to the inputs
    pub fn messages(&self) -> BTreeMap<Field, String> {
        self.errors
            .iter()
            .map(|(field, err)| (*field, err.to_string()))
            .collect()
    }

    /// First error in display order
    pub fn first(&self) -> Option<&ValidationError> {
        self.errors.values().next()
    }
}

/// Stateless validator for annotation metadata
pub struct MetadataValidator;

impl MetadataValidator {
    pub fn rule(field: Field) -> FieldRule {
        let (required, max_len, range) = match field {
            Field::Author | Field::Publication => (true, Some(500), None),
            Field::Year => (false, None, Some(YEAR_RANGE)),
            Field::Journal => (false, Some(200), None),
            Field::Volume => (false, Some(50), None),
            Field::VolumeInitialPage | Field::VolumeLastPage => (false, Some(20), None),
        };
        FieldRule {
            required,
            max_len,
            range,
        }
    }

    /// Check one value; `None` means valid
    pub fn validate(field: Field, value: &str) -> Option<ValidationError> {
        let rule = Self::rule(field);
        let trimmed = value.trim();

        if trimmed.is_empty() {
            return rule.required.then_some(ValidationError::Required { field });
        }

        if let Some(max) = rule.max_len {
            if value.chars().count() > max {
                return Some(ValidationError::TooLong { field, max });
            }
        }

        if let Some(range) = rule.range {
            return match trimmed.parse::<i64>() {
                Err(_) => Some(ValidationError::NotAnInteger),
                Ok(n) if !range.contains(&n) => Some(ValidationError::OutOfRange {
                    min: *range.start(),
                    max: *range.end(),
                }),
                Ok(_) => None,
            };
        }

        None
    }

    pub fn validate_all(form: &MetadataForm) -> ValidationReport {
        let errors: BTreeMap<Field, ValidationError> = Field::ALL
            .iter()
            .filter_map(|field| Self::validate(*field, form.get(*field)).map(|e| (*field, e)))
            .collect();
        ValidationReport {
            valid: errors.is_empty(),
            errors,
        }
    }

    /// Validate and convert raw input into the record stored on a node
    pub fn parse(form: &MetadataForm) -> Result<AnnotationMetadata, ValidationReport> {
        let report = Self::validate_all(form);
        if !report.valid {
            return Err(report);
        }

        let optional = |field: Field| {
            let value = form.get(field);
            (!value.trim().is_empty()).then(|| value.to_string())
        };

        Ok(AnnotationMetadata {
            author: form.author.clone(),
            publication: form.publication.clone(),
            year: form.year.trim().parse::<u16>().ok(),
            journal: optional(Field::Journal),
            volume: optional(Field::Volume),
            volume_initial_page: optional(Field::VolumeInitialPage),
            volume_last_page: optional(Field::VolumeLastPage),
        })
    }
}
