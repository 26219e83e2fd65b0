//! Value Synthesizer
//!
//! Produces a concrete input value for direct-fill controls. Values are
//! deterministic so that assertions and debug screenshots can be traced
//! back to the field that received them.

use crate::markers::ControlKind;
use serde::{Deserialize, Serialize};

/// Placeholder in [`ValueSynthesizer::text_template`] replaced by the field id
pub const ID_PLACEHOLDER: &str = "{id}";

/// Literal values used when filling
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValueSynthesizer {
    /// Value for email-like text fields
    pub email: String,
    /// Template for other text fields
    pub text_template: String,
    /// Value for numeric fields
    pub number: String,
    /// Value for paragraph fields
    pub paragraph: String,
    /// Value typed into an "other" free-text box
    pub other_text: String,
}

impl Default for ValueSynthesizer {
    fn default() -> Self {
        Self {
            email: "test@example.com".to_string(),
            text_template: format!("Test input for {ID_PLACEHOLDER}"),
            number: "42".to_string(),
            paragraph: "This is a sample long answer for paragraph text. \
                        It contains multiple sentences to test the textarea functionality."
                .to_string(),
            other_text: "Other response text".to_string(),
        }
    }
}

impl ValueSynthesizer {
    /// Value for a field of `kind`, or `None` when the protocol picks
    /// from rendered options instead.
    #[must_use]
    pub fn synthesize(
        &self,
        field_id: &str,
        kind: ControlKind,
        placeholder: Option<&str>,
    ) -> Option<String> {
        match kind {
            ControlKind::Text if wants_email(field_id, placeholder) => Some(self.email.clone()),
            ControlKind::Text => Some(self.text_template.replace(ID_PLACEHOLDER, field_id)),
            ControlKind::Textarea => Some(self.paragraph.clone()),
            ControlKind::Number => Some(self.number.clone()),
            _ => None,
        }
    }
}

fn wants_email(field_id: &str, placeholder: Option<&str>) -> bool {
    let hit = |s: &str| s.to_lowercase().contains("email");
    hit(field_id) || placeholder.is_some_and(hit)
}
