//! Result and error types for Formprobe.

use thiserror::Error;

/// Result type for Formprobe operations
pub type FormResult<T> = Result<T, FormError>;

/// Errors that can occur while driving a form
///
/// Field-level failures are absorbed by the dispatcher and recorded as
/// outcomes. Only the run-fatal variants (`RequiredFieldUnfillable`,
/// `SubmitControlNotFound`, `FormNotReady`) are expected to escape a
/// [`crate::FormSession`] run.
#[derive(Debug, Error)]
pub enum FormError {
    /// Browser launch error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunchError {
        /// Error message
        message: String,
    },

    /// Page error
    #[error("Page error: {message}")]
    PageError {
        /// Error message
        message: String,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    NavigationError {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// A bounded wait ran out
    #[error("Timed out after {ms}ms waiting for {waited_for}")]
    Timeout {
        /// What was being waited for
        waited_for: String,
        /// Timeout in milliseconds
        ms: u64,
    },

    /// Element handle does not refer to a live element
    #[error("Unknown element handle #{index}")]
    StaleElement {
        /// Arena index of the handle
        index: usize,
    },

    /// Element exists but cannot be clicked or filled
    #[error("Element not interactable: {message}")]
    NotInteractable {
        /// Error message
        message: String,
    },

    /// The form-ready marker never appeared
    #[error("Form not ready at {url}: {message}")]
    FormNotReady {
        /// URL of the page
        url: String,
        /// Error message
        message: String,
    },

    /// A required field could not be filled
    #[error("Failed to fill required field {field}: {reason}")]
    RequiredFieldUnfillable {
        /// Field identifier
        field: String,
        /// Underlying reason
        reason: String,
    },

    /// No submit-control selector resolved to a visible element
    #[error("Submit control not found (tried {})", tried.join(", "))]
    SubmitControlNotFound {
        /// Selectors that were tried, in priority order
        tried: Vec<String>,
    },

    /// Invalid state error (operation called in wrong state)
    #[error("Invalid state: {message}")]
    InvalidState {
        /// Error message
        message: String,
    },

    /// Screenshot error
    #[error("Screenshot failed: {message}")]
    ScreenshotError {
        /// Error message
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl FormError {
    /// Create a page error
    #[must_use]
    pub fn page(message: impl Into<String>) -> Self {
        Self::PageError {
            message: message.into(),
        }
    }

    /// Create a not-interactable error
    #[must_use]
    pub fn not_interactable(message: impl Into<String>) -> Self {
        Self::NotInteractable {
            message: message.into(),
        }
    }

    /// Create an invalid state error
    #[must_use]
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether this error aborts the whole run
    #[must_use]
    pub const fn is_run_fatal(&self) -> bool {
        matches!(
            self,
            Self::RequiredFieldUnfillable { .. }
                | Self::SubmitControlNotFound { .. }
                | Self::FormNotReady { .. }
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_required_field_message_names_field() {
        let err = FormError::RequiredFieldUnfillable {
            field: "q-7".to_string(),
            reason: "no options".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to fill required field q-7: no options"
        );
        assert!(err.is_run_fatal());
    }

    #[test]
    fn test_submit_not_found_lists_selectors() {
        let err = FormError::SubmitControlNotFound {
            tried: vec!["[data-testid=\"submit-button\"]".into(), "button".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("submit-button"));
        assert!(msg.contains(", button"));
        assert!(err.is_run_fatal());
    }

    #[test]
    fn test_field_level_errors_are_not_fatal() {
        assert!(!FormError::not_interactable("hidden").is_run_fatal());
        assert!(!FormError::Timeout {
            waited_for: "options".into(),
            ms: 10
        }
        .is_run_fatal());
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: FormError = io.into();
        assert!(err.to_string().starts_with("I/O error"));
    }
}
