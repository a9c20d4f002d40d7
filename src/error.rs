//! Error types for the docconv library.
//!
//! Every failure a request can hit is one of five kinds, and the kind alone
//! decides how the outer surface reacts:
//!
//! * [`ConvertError::Validation`]: the upload itself is wrong (missing,
//!   empty, disallowed extension). Client-caused; HTTP 400.
//! * [`ConvertError::Environment`]: a deployment precondition is missing
//!   (conversion engine or pdfium not installed). HTTP 500; resubmitting the
//!   same or another file will not help.
//! * [`ConvertError::Conversion`]: the engine ran but failed on this
//!   particular content. HTTP 500; a corrected file may succeed.
//! * [`ConvertError::Resource`]: the filesystem refused an allocation
//!   (disk full, permission denied). HTTP 500.
//! * [`ConvertError::Internal`]: anything outside the typed set, including
//!   panics caught by the orchestrator. HTTP 500.
//!
//! Messages never contain filesystem paths: workspace locations are an
//! implementation detail of the service and are kept out of responses.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation message for a missing or empty upload.
pub const NO_FILE: &str = "no file";
/// Validation message for an extension outside the allow-list.
pub const DISALLOWED_TYPE: &str = "disallowed type";
/// Validation message for an upload above `max_upload_bytes`.
pub const FILE_TOO_LARGE: &str = "file too large";
/// Environment message when the external engine cannot be executed.
pub const ENGINE_UNAVAILABLE: &str = "conversion engine unavailable";
/// Environment message when pdfium cannot be bound.
pub const PDF_LIBRARY_UNAVAILABLE: &str = "pdf library unavailable";
/// Conversion message when a strategy finished without an artifact.
pub const NO_OUTPUT: &str = "no output produced";
/// Conversion message when the external engine exceeded its time bound.
pub const TIMED_OUT: &str = "conversion timed out";
/// Internal message for faults outside the typed error set.
pub const UNEXPECTED_FAULT: &str = "unexpected fault";

/// All errors returned by a conversion request.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConvertError {
    /// Bad, missing or disallowed input.
    #[error("validation error: {0}")]
    Validation(String),

    /// A required external dependency is missing from the environment.
    #[error("environment error: {0}")]
    Environment(String),

    /// The conversion backend failed on this content.
    #[error("conversion error: {0}")]
    Conversion(String),

    /// Filesystem allocation failed.
    #[error("resource error: {0}")]
    Resource(String),

    /// Unexpected internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Serializable discriminant of [`ConvertError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    #[serde(rename = "ValidationError")]
    Validation,
    #[serde(rename = "EnvironmentError")]
    Environment,
    #[serde(rename = "ConversionError")]
    Conversion,
    #[serde(rename = "ResourceError")]
    Resource,
    #[serde(rename = "InternalError")]
    Internal,
}

impl ConvertError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn environment(msg: impl Into<String>) -> Self {
        Self::Environment(msg.into())
    }

    pub fn conversion(msg: impl Into<String>) -> Self {
        Self::Conversion(msg.into())
    }

    /// Wrap an I/O failure from workspace allocation.
    ///
    /// Only the error kind is kept: `io::Error` messages from some platforms
    /// embed the offending path.
    pub fn resource(err: &std::io::Error) -> Self {
        Self::Resource(format!("filesystem unavailable ({})", err.kind()))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Environment(_) => ErrorKind::Environment,
            Self::Conversion(_) => ErrorKind::Conversion,
            Self::Resource(_) => ErrorKind::Resource,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// The bare detail message, without the kind prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::Validation(m)
            | Self::Environment(m)
            | Self::Conversion(m)
            | Self::Resource(m)
            | Self::Internal(m) => m,
        }
    }

    /// HTTP status code for this error: 400 for client faults, 500 otherwise.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            _ => 500,
        }
    }

    /// Whether the caller may reasonably retry with a different file.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Conversion(_))
    }

    /// Structured body for the HTTP boundary.
    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            error: self.kind(),
            message: self.message().to_string(),
        }
    }
}

/// JSON error payload returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorKind,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_maps_to_400() {
        let e = ConvertError::validation(NO_FILE);
        assert_eq!(e.status_code(), 400);
        assert_eq!(e.kind(), ErrorKind::Validation);
        assert!(!e.is_retryable());
    }

    #[test]
    fn server_side_kinds_map_to_500() {
        for e in [
            ConvertError::environment(ENGINE_UNAVAILABLE),
            ConvertError::conversion(TIMED_OUT),
            ConvertError::Internal(UNEXPECTED_FAULT.into()),
            ConvertError::Resource("disk full".into()),
        ] {
            assert_eq!(e.status_code(), 500, "{e}");
        }
    }

    #[test]
    fn only_conversion_is_retryable() {
        assert!(ConvertError::conversion(NO_OUTPUT).is_retryable());
        assert!(!ConvertError::environment(ENGINE_UNAVAILABLE).is_retryable());
    }

    #[test]
    fn resource_error_does_not_echo_paths() {
        let io = std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "/var/tmp/secret-place: permission denied",
        );
        let e = ConvertError::resource(&io);
        assert!(!e.to_string().contains("/var/tmp"), "got: {e}");
    }

    #[test]
    fn error_body_serialises_kind_names() {
        let body = ConvertError::validation(DISALLOWED_TYPE).to_body();
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["error"], "ValidationError");
        assert_eq!(json["message"], "disallowed type");
    }
}
