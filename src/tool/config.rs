//! Tool configuration passed in by the host at registration

use crate::dom::SanitizeRules;
use crate::models::{Field, ANNOTATION_TAG};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ToolConfig {
    /// Space kept free between the overlay and the viewport edge, in pixels
    pub buffer_spacing: f64,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            buffer_spacing: 16.0,
        }
    }
}

/// Attributes that survive the host's sanitizer on annotation nodes
pub static SANITIZE_RULES: Lazy<SanitizeRules> = Lazy::new(|| {
    let mut allowed = vec!["class", "contenteditable", "style", "encoding"];
    allowed.extend(Field::ALL.iter().map(|f| f.attribute()));
    SanitizeRules::new().allow(ANNOTATION_TAG, &allowed)
});
