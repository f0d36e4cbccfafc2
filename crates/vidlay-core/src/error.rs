//! Error types for Vidlay Core

use thiserror::Error;

/// Result type alias for widget operations
pub type Result<T> = std::result::Result<T, Error>;

/// Widget error types
///
/// None of these are fatal to the page: each one degrades a single
/// instance's feature and is reported as a diagnostic.
#[derive(Error, Debug)]
pub enum Error {
    // Mount errors
    #[error("Missing required element: {role}")]
    MissingElement { role: &'static str },

    #[error("Player surface is detached from the document")]
    Detached,

    #[error("Template clone failed: {0}")]
    Template(String),

    // Playback errors
    #[error("Playback request rejected: {0}")]
    PlaybackRejected(String),

    #[error("Media duration is not finite")]
    IndeterminateDuration,

    // Async enhancement errors
    #[error("Poster generation failed: {0}")]
    PosterGeneration(String),

    #[error("Subtitle attachment failed: {0}")]
    Subtitles(String),

    // Configuration errors
    #[error("Invalid aspect ratio: {0}")]
    InvalidAspect(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a missing-element error for the given role
    pub fn missing(role: &'static str) -> Self {
        Error::MissingElement { role }
    }

    /// Returns true if the instance can keep running without the failed feature
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::PlaybackRejected(_)
                | Error::IndeterminateDuration
                | Error::PosterGeneration(_)
                | Error::Subtitles(_)
                | Error::InvalidAspect(_)
        )
    }

    /// Returns the error code used in diagnostics
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::MissingElement { .. } => "MISSING_ELEMENT",
            Error::Detached => "DETACHED",
            Error::Template(_) => "TEMPLATE",
            Error::PlaybackRejected(_) => "PLAYBACK_REJECTED",
            Error::IndeterminateDuration => "INDETERMINATE_DURATION",
            Error::PosterGeneration(_) => "POSTER",
            Error::Subtitles(_) => "SUBTITLES",
            Error::InvalidAspect(_) => "INVALID_ASPECT",
            Error::InvalidConfig(_) => "INVALID_CONFIG",
            Error::Json(_) => "JSON",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_classification() {
        assert!(Error::PosterGeneration("tainted canvas".into()).is_recoverable());
        assert!(Error::IndeterminateDuration.is_recoverable());
        assert!(!Error::missing("video").is_recoverable());
        assert!(!Error::Detached.is_recoverable());
    }

    #[test]
    fn test_error_display() {
        let err = Error::missing("wrapper");
        assert_eq!(err.to_string(), "Missing required element: wrapper");
        assert_eq!(err.error_code(), "MISSING_ELEMENT");
    }

    #[test]
    fn test_playback_and_config_errors() {
        let rejected = Error::PlaybackRejected("NotAllowedError".into());
        assert!(rejected.is_recoverable());
        assert_eq!(rejected.to_string(), "Playback request rejected: NotAllowedError");
        assert_eq!(rejected.error_code(), "PLAYBACK_REJECTED");

        let config = Error::InvalidConfig("invalid type: string, expected a boolean".into());
        assert!(!config.is_recoverable());
        assert_eq!(config.error_code(), "INVALID_CONFIG");
        assert!(config.to_string().starts_with("Invalid configuration: "));
    }
}
