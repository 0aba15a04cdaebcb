//! Bibliographic metadata carried by an annotation
//!
//! `MetadataForm` holds the raw strings typed into the overlay. Once the
//! validator accepts a form it becomes an `AnnotationMetadata`, the only shape
//! that is ever written back onto a node.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Metadata fields, in overlay display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    Publication,
    Author,
    Year,
    Journal,
    Volume,
    VolumeInitialPage,
    VolumeLastPage,
}

impl Field {
    pub const ALL: [Field; 7] = [
        Field::Publication,
        Field::Author,
        Field::Year,
        Field::Journal,
        Field::Volume,
        Field::VolumeInitialPage,
        Field::VolumeLastPage,
    ];

    /// Attribute name on the annotation node
    pub fn attribute(self) -> &'static str {
        match self {
            Field::Publication => "data-publication",
            Field::Author => "data-author",
            Field::Year => "data-year",
            Field::Journal => "data-journal",
            Field::Volume => "data-volume",
            Field::VolumeInitialPage => "data-volume-initial-page",
            Field::VolumeLastPage => "data-volume-last-page",
        }
    }

    /// Id of the overlay input element
    pub fn input_id(self) -> &'static str {
        match self {
            Field::Publication => "annotation-publication",
            Field::Author => "annotation-author",
            Field::Year => "annotation-year",
            Field::Journal => "annotation-journal",
            Field::Volume => "annotation-volume",
            Field::VolumeInitialPage => "annotation-volume-initial-page",
            Field::VolumeLastPage => "annotation-volume-last-page",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Field::Publication => "Publication Title",
            Field::Author => "Authors (new authors separated by comma, e.g. Doe J., Smith J.)",
            Field::Year => "Year of Publication",
            Field::Journal => "Journal Name (abbreviated)",
            Field::Volume => "Volume",
            Field::VolumeInitialPage => "Initial Page",
            Field::VolumeLastPage => "Last Page",
        }
    }

    /// Short name used in validation messages
    pub fn short_label(self) -> &'static str {
        match self {
            Field::Publication => "Publication Title",
            Field::Author => "Authors",
            Field::Year => "Year of Publication",
            Field::Journal => "Journal Name",
            Field::Volume => "Volume",
            Field::VolumeInitialPage => "Initial Page",
            Field::VolumeLastPage => "Last Page",
        }
    }

    /// HTML input type for the overlay
    pub fn input_type(self) -> &'static str {
        match self {
            Field::Year => "number",
            _ => "text",
        }
    }
}

/// Raw overlay input, one string per field
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MetadataForm {
    pub publication: String,
    pub author: String,
    pub year: String,
    pub journal: String,
    pub volume: String,
    pub volume_initial_page: String,
    pub volume_last_page: String,
}

impl MetadataForm {
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Publication => &self.publication,
            Field::Author => &self.author,
            Field::Year => &self.year,
            Field::Journal => &self.journal,
            Field::Volume => &self.volume,
            Field::VolumeInitialPage => &self.volume_initial_page,
            Field::VolumeLastPage => &self.volume_last_page,
        }
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let value = value.into();
        match field {
            Field::Publication => self.publication = value,
            Field::Author => self.author = value,
            Field::Year => self.year = value,
            Field::Journal => self.journal = value,
            Field::Volume => self.volume = value,
            Field::VolumeInitialPage => self.volume_initial_page = value,
            Field::VolumeLastPage => self.volume_last_page = value,
        }
    }

    /// Builder-style `set`, handy when assembling a form in one expression
    pub fn with(mut self, field: Field, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }
}

/// Validated metadata, ready to be stored on a node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationMetadata {
    pub author: String,
    pub publication: String,
    pub year: Option<u16>,
    pub journal: Option<String>,
    pub volume: Option<String>,
    pub volume_initial_page: Option<String>,
    pub volume_last_page: Option<String>,
}

impl AnnotationMetadata {
    /// All seven attributes, escaped for storage
    ///
    /// Absent optional fields are written as empty strings so a save always
    /// replaces every attribute.
    pub fn to_attributes(&self) -> Vec<(&'static str, String)> {
        let year = self.year.map(|y| y.to_string());
        let optional = |v: &Option<String>| escape(v.as_deref().unwrap_or_default());

        vec![
            (Field::Author.attribute(), escape(&self.author)),
            (Field::Year.attribute(), year.unwrap_or_default()),
            (Field::Publication.attribute(), escape(&self.publication)),
            (Field::Journal.attribute(), optional(&self.journal)),
            (Field::Volume.attribute(), optional(&self.volume)),
            (Field::VolumeInitialPage.attribute(), optional(&self.volume_initial_page)),
            (Field::VolumeLastPage.attribute(), optional(&self.volume_last_page)),
        ]
    }
}

/// Neutralize markup before a value is stored in an attribute
pub fn escape(value: &str) -> String {
    html_escape::encode_safe(value).into_owned()
}

/// Inverse of `escape`, used when stored values are shown or restored as text
pub fn unescape(value: &str) -> Cow<'_, str> {
    html_escape::decode_html_entities(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_get_set_cover_all_fields() {
        let mut form = MetadataForm::default();
        for (i, field) in Field::ALL.iter().enumerate() {
            form.set(*field, format!("v{}", i));
        }
        for (i, field) in Field::ALL.iter().enumerate() {
            assert_eq!(form.get(*field), format!("v{}", i));
        }
    }

    #[test]
    fn test_attributes_escape_markup() {
        let metadata = AnnotationMetadata {
            author: "Doe J.".to_string(),
            publication: "<script>alert(1)</script>".to_string(),
            year: Some(1999),
            journal: None,
            volume: Some("4".to_string()),
            volume_initial_page: None,
            volume_last_page: None,
        };

        let attrs = metadata.to_attributes();

        assert_eq!(attrs.len(), 7);
        let publication = attrs
            .iter()
            .find(|(name, _)| *name == "data-publication")
            .map(|(_, v)| v.clone())
            .unwrap();
        assert!(!publication.contains('<'));
        assert_eq!(unescape(&publication), "<script>alert(1)</script>");
        assert!(attrs.contains(&("data-year", "1999".to_string())));
        assert!(attrs.contains(&("data-journal", String::new())));
    }

    #[test]
    fn test_form_deserializes_camel_case_with_defaults() {
        let form: MetadataForm =
            serde_json::from_str(r#"{"author":"A","volumeInitialPage":"12"}"#).unwrap();
        assert_eq!(form.author, "A");
        assert_eq!(form.volume_initial_page, "12");
        assert_eq!(form.publication, "");
    }
}
