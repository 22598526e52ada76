//! Errors raised by record validation and configuration loading.

/// Error type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors that can occur in the core crate.
///
/// The progress engine itself never fails; these cover the edges around it.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A record failed validation
    #[error("Invalid {field}: {reason}")]
    Validation {
        /// Offending field
        field: &'static str,
        /// What was wrong with it
        reason: String,
    },

    /// I/O error while reading configuration
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be parsed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    pub(crate) fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation { field, reason: reason.into() }
    }
}
