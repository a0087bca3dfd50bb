//! Domain-level error taxonomy.
//!
//! These errors are transport agnostic. Every failure raised by the domain is
//! tagged with exactly one [`ErrorKind`]; inbound adapters translate the kind's
//! status code and the [`ErrorPayload`] into protocol-specific envelopes.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

/// Stable machine-readable error category.
///
/// Serialised as `SCREAMING_SNAKE_CASE` (for example `"RATE_LIMITED"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Uploaded bytes are not a readable PDF document.
    InvalidPdf,
    /// Upload exceeds the configured size limit.
    FileTooLarge,
    /// Upload MIME type is not accepted.
    UnsupportedFileType,
    /// Stored file could not be read back.
    FileCorrupted,
    /// Stored file is missing.
    FileNotFound,
    /// The same file was already uploaded by this user.
    DuplicateFile,
    /// Upstream API asked us to slow down.
    RateLimited,
    /// Upstream call did not complete in time.
    Timeout,
    /// Upstream API returned an unexpected failure.
    ApiError,
    /// Authentication failed or is missing.
    AuthError,
    /// Usage quota has been exhausted.
    QuotaExceeded,
    /// Generic database failure.
    DbError,
    /// Database connection could not be established or was lost.
    DbConnectionError,
    /// Database transaction failed to commit.
    DbTransactionError,
    /// Requested record does not exist.
    RecordNotFound,
    /// Record violates a uniqueness constraint.
    DuplicateRecord,
    /// Document text could not be extracted.
    ParsingError,
    /// Summary or mindmap generation failed.
    GenerationError,
    /// Request input failed validation.
    ValidationError,
    /// Background processing exceeded its deadline.
    ProcessingTimeout,
    /// Document has not finished processing.
    DocumentNotReady,
    /// Operation is not valid in the current state.
    InvalidState,
    /// Caller is not permitted to perform the operation.
    OperationNotAllowed,
    /// Unexpected internal failure.
    InternalError,
    /// Failure that could not be categorised.
    UnknownError,
    /// Server configuration is invalid.
    ConfigurationError,
}

impl ErrorKind {
    /// Every declared kind, in declaration order.
    pub const ALL: [Self; 26] = [
        Self::InvalidPdf,
        Self::FileTooLarge,
        Self::UnsupportedFileType,
        Self::FileCorrupted,
        Self::FileNotFound,
        Self::DuplicateFile,
        Self::RateLimited,
        Self::Timeout,
        Self::ApiError,
        Self::AuthError,
        Self::QuotaExceeded,
        Self::DbError,
        Self::DbConnectionError,
        Self::DbTransactionError,
        Self::RecordNotFound,
        Self::DuplicateRecord,
        Self::ParsingError,
        Self::GenerationError,
        Self::ValidationError,
        Self::ProcessingTimeout,
        Self::DocumentNotReady,
        Self::InvalidState,
        Self::OperationNotAllowed,
        Self::InternalError,
        Self::UnknownError,
        Self::ConfigurationError,
    ];

    /// Wire representation of the kind.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidPdf => "INVALID_PDF",
            Self::FileTooLarge => "FILE_TOO_LARGE",
            Self::UnsupportedFileType => "UNSUPPORTED_FILE_TYPE",
            Self::FileCorrupted => "FILE_CORRUPTED",
            Self::FileNotFound => "FILE_NOT_FOUND",
            Self::DuplicateFile => "DUPLICATE_FILE",
            Self::RateLimited => "RATE_LIMITED",
            Self::Timeout => "TIMEOUT",
            Self::ApiError => "API_ERROR",
            Self::AuthError => "AUTH_ERROR",
            Self::QuotaExceeded => "QUOTA_EXCEEDED",
            Self::DbError => "DB_ERROR",
            Self::DbConnectionError => "DB_CONNECTION_ERROR",
            Self::DbTransactionError => "DB_TRANSACTION_ERROR",
            Self::RecordNotFound => "RECORD_NOT_FOUND",
            Self::DuplicateRecord => "DUPLICATE_RECORD",
            Self::ParsingError => "PARSING_ERROR",
            Self::GenerationError => "GENERATION_ERROR",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::ProcessingTimeout => "PROCESSING_TIMEOUT",
            Self::DocumentNotReady => "DOCUMENT_NOT_READY",
            Self::InvalidState => "INVALID_STATE",
            Self::OperationNotAllowed => "OPERATION_NOT_ALLOWED",
            Self::InternalError => "INTERNAL_ERROR",
            Self::UnknownError => "UNKNOWN_ERROR",
            Self::ConfigurationError => "CONFIGURATION_ERROR",
        }
    }

    /// Parse a wire code, falling back to [`ErrorKind::UnknownError`] for
    /// codes this build does not recognise.
    ///
    /// # Examples
    /// ```
    /// use ebook_summary::domain::ErrorKind;
    ///
    /// assert_eq!(ErrorKind::from_code("TIMEOUT"), ErrorKind::Timeout);
    /// assert_eq!(ErrorKind::from_code("NOPE"), ErrorKind::UnknownError);
    /// ```
    pub fn from_code(code: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == code)
            .unwrap_or(Self::UnknownError)
    }

    /// HTTP status associated with the kind.
    pub const fn status_code(self) -> u16 {
        match self {
            Self::InvalidPdf
            | Self::FileTooLarge
            | Self::UnsupportedFileType
            | Self::FileCorrupted
            | Self::DuplicateFile
            | Self::ValidationError
            | Self::InvalidState
            | Self::OperationNotAllowed => 400,
            Self::AuthError => 401,
            Self::FileNotFound | Self::RecordNotFound => 404,
            Self::DuplicateRecord | Self::DocumentNotReady => 409,
            Self::RateLimited | Self::QuotaExceeded => 429,
            Self::DbError
            | Self::DbTransactionError
            | Self::ParsingError
            | Self::GenerationError
            | Self::InternalError
            | Self::UnknownError
            | Self::ConfigurationError => 500,
            Self::ApiError => 502,
            Self::DbConnectionError => 503,
            Self::Timeout | Self::ProcessingTimeout => 504,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status code for `kind`.
pub const fn status_for(kind: ErrorKind) -> u16 {
    kind.status_code()
}

/// Status code for a raw wire code; unmapped codes resolve to 500.
pub fn status_for_code(code: &str) -> u16 {
    ErrorKind::from_code(code).status_code()
}

/// Structured application failure.
///
/// Construction never fails. `status_code` defaults to the kind's status and
/// `is_retryable` defaults to `false`.
///
/// # Examples
/// ```
/// use ebook_summary::domain::{AppError, ErrorKind};
///
/// let err = AppError::new(ErrorKind::RecordNotFound, "document 7 not found")
///     .with_detail("document_id", 7);
/// assert_eq!(err.status_code(), 404);
/// assert!(!err.is_retryable());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct AppError {
    kind: ErrorKind,
    message: String,
    details: Map<String, Value>,
    status_code: u16,
    retryable: bool,
}

impl AppError {
    /// Create an error with empty details and the kind's default status.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: Map::new(),
            status_code: kind.status_code(),
            retryable: false,
        }
    }

    /// Convenience constructor for [`ErrorKind::ValidationError`].
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ValidationError, message)
    }

    /// Convenience constructor for [`ErrorKind::RecordNotFound`].
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RecordNotFound, message)
    }

    /// Convenience constructor for [`ErrorKind::InternalError`].
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InternalError, message)
    }

    /// Replace the structured details.
    pub fn with_details(mut self, details: Map<String, Value>) -> Self {
        self.details = details;
        self
    }

    /// Insert a single detail entry, overwriting any previous value.
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    /// Override the HTTP status derived from the kind.
    pub fn with_status(mut self, status_code: u16) -> Self {
        self.status_code = status_code;
        self
    }

    /// Set the retry hint.
    pub fn with_retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }

    /// Error category.
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Human-readable message.
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Diagnostic context.
    pub const fn details(&self) -> &Map<String, Value> {
        &self.details
    }

    /// HTTP status for transport adapters.
    pub const fn status_code(&self) -> u16 {
        self.status_code
    }

    /// Whether the caller explicitly marked this failure as retryable.
    pub const fn is_retryable(&self) -> bool {
        self.retryable
    }

    /// Serialisable view with exactly `error_code`, `message`, and `details`.
    pub fn to_payload(&self) -> ErrorPayload {
        ErrorPayload {
            error_code: self.kind,
            message: self.message.clone(),
            details: self.details.clone(),
        }
    }

    /// Drop the named detail keys, returning whether any were present.
    pub(crate) fn strip_details(&mut self, keys: &[&str]) -> bool {
        let before = self.details.len();
        self.details.retain(|key, _| !keys.contains(&key.as_str()));
        before != self.details.len()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)?;
        if !self.details.is_empty() {
            write!(f, ", details={}", Value::Object(self.details.clone()))?;
        }
        Ok(())
    }
}

impl std::error::Error for AppError {}

/// Stable wire form of an [`AppError`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct ErrorPayload {
    /// Error category.
    #[schema(example = "RATE_LIMITED")]
    pub error_code: ErrorKind,
    /// Human-readable message.
    #[schema(example = "Rate limit exceeded")]
    pub message: String,
    /// Diagnostic context; never contains secrets.
    #[schema(value_type = Object)]
    pub details: Map<String, Value>,
}

impl From<&AppError> for ErrorPayload {
    fn from(value: &AppError) -> Self {
        value.to_payload()
    }
}

#[cfg(test)]
mod tests;
