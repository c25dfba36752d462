//! Unified error hierarchy for liftcoach
//!
//! Only genuinely fatal conditions live here: unreadable or malformed input,
//! API failures and export failures. Insufficient history is never an error;
//! the analysis stages express it by omitting the exercise.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for all liftcoach operations
#[derive(Debug, Error)]
pub enum CoachError {
    /// The workout log could not be read or understood
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] InputError),

    /// Hevy API errors
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Report export errors
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while normalizing the workout event log
#[derive(Debug, Error)]
pub enum InputError {
    /// Event file not found at the specified path
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Event file is not valid JSON or does not match the event schema
    #[error("Malformed event file {path}: {reason}")]
    Malformed { path: PathBuf, reason: String },

    /// A workout carries a start time that cannot be parsed
    #[error("Invalid start time in workout '{workout}': {value}")]
    InvalidStartTime { workout: String, value: String },
}

/// Errors raised by the Hevy API client
#[derive(Debug, Error)]
pub enum FetchError {
    /// No API key configured
    #[error("HEVY_API_KEY is not set")]
    MissingApiKey,

    /// Transport-level failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// API answered with a non-success status
    #[error("API returned {status}: {body}")]
    Status { status: u16, body: String },
}

/// Errors raised while writing reports
#[derive(Debug, Error)]
pub enum ExportError {
    /// Unsupported format name
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Serialization failure
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Write failure
    #[error("Export failed to {path}: {reason}")]
    WriteFailed { path: PathBuf, reason: String },

    /// IO errors while writing
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for liftcoach operations
pub type Result<T> = std::result::Result<T, CoachError>;

impl CoachError {
    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CoachError::Fetch(FetchError::Http(_)) | CoachError::Io(_)
        ) || matches!(self, CoachError::Fetch(FetchError::Status { status, .. }) if *status >= 500)
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            CoachError::InvalidInput(_) => ErrorSeverity::Critical,
            CoachError::Fetch(FetchError::MissingApiKey) => ErrorSeverity::Error,
            CoachError::Fetch(_) => ErrorSeverity::Error,
            CoachError::Configuration(_) => ErrorSeverity::Error,
            CoachError::Export(_) => ErrorSeverity::Warning,
            CoachError::Io(_) => ErrorSeverity::Error,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            CoachError::InvalidInput(InputError::FileNotFound { path }) => {
                format!(
                    "Could not find workout log {}. Run `liftcoach fetch` first.",
                    path.display()
                )
            }
            CoachError::InvalidInput(InputError::Malformed { path, .. }) => {
                format!("Workout log {} is not valid Hevy event JSON", path.display())
            }
            CoachError::Fetch(FetchError::MissingApiKey) => {
                "HEVY_API_KEY is not set. Export it or add it to a .env file.".to_string()
            }
            _ => self.to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// No output can be produced
    Critical,
    /// Operation failed
    Error,
    /// Operation partially succeeded
    Warning,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_severity() {
        let err = CoachError::InvalidInput(InputError::FileNotFound {
            path: PathBuf::from("hevy_events.json"),
        });
        assert_eq!(err.severity(), ErrorSeverity::Critical);

        let err = CoachError::Export(ExportError::UnsupportedFormat("pdf".to_string()));
        assert_eq!(err.severity(), ErrorSeverity::Warning);
    }

    #[test]
    fn test_error_retryable() {
        let err = CoachError::Fetch(FetchError::Status {
            status: 503,
            body: "unavailable".to_string(),
        });
        assert!(err.is_retryable());

        let err = CoachError::Fetch(FetchError::Status {
            status: 401,
            body: "unauthorized".to_string(),
        });
        assert!(!err.is_retryable());

        let err = CoachError::Configuration("bad".to_string());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_user_messages() {
        let err = CoachError::InvalidInput(InputError::FileNotFound {
            path: PathBuf::from("events.json"),
        });
        assert!(err.user_message().contains("Could not find"));

        let err = CoachError::Fetch(FetchError::MissingApiKey);
        assert!(err.user_message().contains("HEVY_API_KEY"));
    }
}
