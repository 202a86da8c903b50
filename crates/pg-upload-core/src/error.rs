//! Error types module
//!
//! This module provides the error type used throughout the upload plugin.
//! Schema-build errors (configuration bugs) and per-call errors (a single
//! mutation failing) are unified under the `UploadError` enum; the
//! `ErrorMetadata` trait tells callers which of the two they are holding.

use thiserror::Error;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like invalid client input
    Debug,
    /// Warning level - for failures of caller-supplied code
    Warn,
    /// Error level - for configuration bugs that halt schema construction
    Error,
}

/// When an error can occur.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPhase {
    /// Raised while the schema is being built; halts construction
    Build,
    /// Raised while executing a single mutation call; fails that call only
    Request,
}

/// Metadata describing how an error should be surfaced
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "AMBIGUOUS_UPLOAD_DEFINITION")
    fn error_code(&self) -> &'static str;

    /// Whether the error halts schema construction or fails a single call
    fn phase(&self) -> ErrorPhase;

    /// Whether the error was caused by the client's request
    fn is_client_error(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

/// Failure of a deferred upload to materialize into a payload.
///
/// Cloneable because the pending value it comes from is shared.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Upload failed to materialize: {message}")]
pub struct PayloadError {
    pub message: String,
}

impl PayloadError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Upload field definitions are ambiguous: {count} definitions match column {attribute}")]
    AmbiguousUploadDefinition { attribute: String, count: usize },

    #[error("Upload value invalid.")]
    InvalidUploadValue,

    #[error("Upload literal unsupported.")]
    UnsupportedLiteral,

    #[error("Upload serialization unsupported.")]
    UnsupportedSerialization,

    #[error("Two columns produce the same GraphQL field name '{field_name}' on class '{table}'; one of them is '{column}'. {hint}")]
    DuplicateFieldName {
        table: String,
        field_name: String,
        column: String,
        hint: String,
    },

    #[error(transparent)]
    Transform(anyhow::Error),

    #[error(transparent)]
    Resolver(anyhow::Error),

    #[error(transparent)]
    Payload(#[from] PayloadError),

    #[error("Type not found: {0}")]
    TypeNotFound(String),

    #[error("Inflection '{0}' is already registered")]
    InflectionAlreadyRegistered(String),

    #[error("Upload transform not found: {0}")]
    TransformNotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for UploadError {
    fn from(err: serde_json::Error) -> Self {
        UploadError::Config(format!("JSON parsing error: {}", err))
    }
}

/// Static metadata for each variant: (error_code, phase, client_error, log_level).
fn upload_error_static_metadata(
    err: &UploadError,
) -> (&'static str, ErrorPhase, bool, LogLevel) {
    match err {
        UploadError::AmbiguousUploadDefinition { .. } => (
            "AMBIGUOUS_UPLOAD_DEFINITION",
            ErrorPhase::Build,
            false,
            LogLevel::Error,
        ),
        UploadError::InvalidUploadValue => (
            "INVALID_UPLOAD_VALUE",
            ErrorPhase::Request,
            true,
            LogLevel::Debug,
        ),
        UploadError::UnsupportedLiteral => (
            "UNSUPPORTED_LITERAL",
            ErrorPhase::Request,
            true,
            LogLevel::Debug,
        ),
        UploadError::UnsupportedSerialization => (
            "UNSUPPORTED_SERIALIZATION",
            ErrorPhase::Request,
            false,
            LogLevel::Error,
        ),
        UploadError::DuplicateFieldName { .. } => (
            "DUPLICATE_FIELD_NAME",
            ErrorPhase::Build,
            false,
            LogLevel::Error,
        ),
        UploadError::Transform(_) => (
            "UPLOAD_TRANSFORM_FAILED",
            ErrorPhase::Request,
            false,
            LogLevel::Warn,
        ),
        UploadError::Resolver(_) => (
            "RESOLVER_FAILED",
            ErrorPhase::Request,
            false,
            LogLevel::Warn,
        ),
        UploadError::Payload(_) => (
            "UPLOAD_PAYLOAD_FAILED",
            ErrorPhase::Request,
            true,
            LogLevel::Debug,
        ),
        UploadError::TypeNotFound(_) => (
            "TYPE_NOT_FOUND",
            ErrorPhase::Build,
            false,
            LogLevel::Error,
        ),
        UploadError::InflectionAlreadyRegistered(_) => (
            "INFLECTION_ALREADY_REGISTERED",
            ErrorPhase::Build,
            false,
            LogLevel::Error,
        ),
        UploadError::TransformNotFound(_) => (
            "TRANSFORM_NOT_FOUND",
            ErrorPhase::Build,
            false,
            LogLevel::Error,
        ),
        UploadError::Config(_) => (
            "CONFIG_ERROR",
            ErrorPhase::Build,
            false,
            LogLevel::Error,
        ),
    }
}

impl ErrorMetadata for UploadError {
    fn error_code(&self) -> &'static str {
        upload_error_static_metadata(self).0
    }

    fn phase(&self) -> ErrorPhase {
        upload_error_static_metadata(self).1
    }

    fn is_client_error(&self) -> bool {
        upload_error_static_metadata(self).2
    }

    fn log_level(&self) -> LogLevel {
        upload_error_static_metadata(self).3
    }
}

pub type UploadResult<T> = Result<T, UploadError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_metadata_ambiguous_definition() {
        let err = UploadError::AmbiguousUploadDefinition {
            attribute: "public.documents.content".to_string(),
            count: 2,
        };
        assert_eq!(err.error_code(), "AMBIGUOUS_UPLOAD_DEFINITION");
        assert_eq!(err.phase(), ErrorPhase::Build);
        assert!(!err.is_client_error());
        assert_eq!(err.log_level(), LogLevel::Error);
        assert!(err.to_string().contains("public.documents.content"));
    }

    #[test]
    fn test_error_metadata_invalid_upload_value() {
        let err = UploadError::InvalidUploadValue;
        assert_eq!(err.error_code(), "INVALID_UPLOAD_VALUE");
        assert_eq!(err.phase(), ErrorPhase::Request);
        assert!(err.is_client_error());
        assert_eq!(err.to_string(), "Upload value invalid.");
    }

    #[test]
    fn test_duplicate_field_name_message() {
        let err = UploadError::DuplicateFieldName {
            table: "public.documents".to_string(),
            field_name: "contentUpload".to_string(),
            column: "content".to_string(),
            hint: "Rename one of them".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("'contentUpload'"));
        assert!(message.contains("'public.documents'"));
        assert!(message.contains("'content'"));
        assert!(message.ends_with("Rename one of them"));
    }

    #[test]
    fn test_transform_error_is_verbatim() {
        let err = UploadError::Transform(anyhow::anyhow!("disk full"));
        assert_eq!(err.to_string(), "disk full");
        assert_eq!(err.phase(), ErrorPhase::Request);
    }

    #[test]
    fn test_payload_error_converts() {
        let err: UploadError = PayloadError::new("stream closed").into();
        assert_eq!(err.error_code(), "UPLOAD_PAYLOAD_FAILED");
        assert!(err.to_string().contains("stream closed"));
    }
}
