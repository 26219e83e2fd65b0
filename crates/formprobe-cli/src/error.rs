//! Error types for the CLI

use thiserror::Error;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Errors that can occur in the CLI
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Invalid argument
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Error message
        message: String,
    },

    /// IO error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Engine error outside a form run
    #[error("Formprobe error: {0}")]
    Form(#[from] formprobe::FormError),

    /// Runs finished but at least one did not pass
    #[error("{failed} of {total} form run(s) failed")]
    RunsFailed {
        /// Runs that did not pass
        failed: usize,
        /// Runs attempted
        total: usize,
    },

    /// Live runs need the `browser` feature
    #[error("formprobe was built without the `browser` feature")]
    BrowserUnavailable,
}

impl CliError {
    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid argument error
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }
}
