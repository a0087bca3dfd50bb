//! HTTP adapter mapping for [`AppError`].
//!
//! Purpose: keep the domain error type HTTP-agnostic while giving Actix
//! handlers a single conversion point into the JSON error body
//! `{error_code, message, details, is_retryable}`.
//!
//! Outside debug exposure, diagnostic detail keys ([`DIAGNOSTIC_DETAIL_KEYS`])
//! are removed before the body is rendered so driver text and exception
//! output never reach clients.

use std::fmt;

use actix_web::error::JsonPayloadError;
use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, ResponseError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::{error, warn};
use utoipa::ToSchema;

use crate::domain::{AppError, ErrorKind};
use crate::middleware::RequestId;

/// Detail keys that only debug exposure may return.
pub const DIAGNOSTIC_DETAIL_KEYS: [&str; 3] = ["db_error", "exception", "exception_type"];

/// Convenient result alias for HTTP handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// How much internal context error responses reveal.
///
/// Registered as plain app data (`App::app_data(ErrorExposure::...)`); when
/// absent, responses are redacted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorExposure {
    /// Strip diagnostic details.
    #[default]
    Redacted,
    /// Return details untouched.
    Debug,
}

impl ErrorExposure {
    /// `Debug` when `debug` is set.
    pub const fn from_debug(debug: bool) -> Self {
        if debug { Self::Debug } else { Self::Redacted }
    }

    fn of(req: &HttpRequest) -> Self {
        req.app_data::<Self>().copied().unwrap_or_default()
    }
}

/// JSON error body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct ErrorResponse {
    /// Error category.
    #[schema(example = "RECORD_NOT_FOUND")]
    pub error_code: ErrorKind,
    /// Human-readable message.
    #[schema(example = "Document not found")]
    pub message: String,
    /// Structured context.
    #[schema(value_type = Object)]
    pub details: Map<String, Value>,
    /// Whether retrying the request may succeed.
    pub is_retryable: bool,
}

impl From<&AppError> for ErrorResponse {
    fn from(error: &AppError) -> Self {
        let payload = error.to_payload();
        Self {
            error_code: payload.error_code,
            message: payload.message,
            details: payload.details,
            is_retryable: error.is_retryable(),
        }
    }
}

/// [`AppError`] prepared for an HTTP response.
#[derive(Debug, Clone)]
pub struct ApiError {
    error: AppError,
}

impl ApiError {
    /// Wrap `error`, stripping diagnostic details unless `exposure` is
    /// [`ErrorExposure::Debug`].
    pub fn new(mut error: AppError, exposure: ErrorExposure) -> Self {
        if exposure == ErrorExposure::Redacted {
            error.strip_details(&DIAGNOSTIC_DETAIL_KEYS);
        }
        Self { error }
    }

    /// Wrap `error` using the exposure registered on the request's app.
    pub fn for_request(error: AppError, req: &HttpRequest) -> Self {
        Self::new(error, ErrorExposure::of(req))
    }

    /// Convert a failure outside the taxonomy into `INTERNAL_ERROR`.
    ///
    /// The failure's text and type are kept as `exception` and
    /// `exception_type` details, so they only survive debug exposure.
    pub fn unexpected<E>(failure: &E, exposure: ErrorExposure) -> Self
    where
        E: std::error::Error + ?Sized,
    {
        error!(error = %failure, "unhandled failure reached the HTTP boundary");
        let error = AppError::internal("An unexpected error occurred")
            .with_detail("exception", failure.to_string())
            .with_detail("exception_type", std::any::type_name::<E>());
        Self::new(error, exposure)
    }

    /// The wrapped error, after redaction.
    pub fn app_error(&self) -> &AppError {
        &self.error
    }
}

impl From<AppError> for ApiError {
    fn from(error: AppError) -> Self {
        Self::new(error, ErrorExposure::Redacted)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.error, f)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let request_id = RequestId::current().map(|id| id.to_string());
        if status.is_server_error() {
            error!(
                error_code = %self.error.kind(),
                status = status.as_u16(),
                retryable = self.error.is_retryable(),
                request_id = request_id.as_deref(),
                "request failed: {}",
                self.error.message()
            );
        } else {
            warn!(
                error_code = %self.error.kind(),
                status = status.as_u16(),
                request_id = request_id.as_deref(),
                "request rejected: {}",
                self.error.message()
            );
        }
        HttpResponse::build(status).json(ErrorResponse::from(&self.error))
    }
}

/// Error kind for a bare HTTP status raised by the framework.
pub fn kind_for_status(status: StatusCode) -> ErrorKind {
    match status.as_u16() {
        400 => ErrorKind::ValidationError,
        401 => ErrorKind::AuthError,
        403 => ErrorKind::OperationNotAllowed,
        404 => ErrorKind::RecordNotFound,
        413 => ErrorKind::FileTooLarge,
        429 => ErrorKind::RateLimited,
        500 => ErrorKind::InternalError,
        503 => ErrorKind::ApiError,
        _ => ErrorKind::UnknownError,
    }
}

impl From<actix_web::Error> for ApiError {
    fn from(err: actix_web::Error) -> Self {
        let status = err.as_response_error().status_code();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            return Self::unexpected(&err, ErrorExposure::Redacted);
        }
        let message = status.canonical_reason().unwrap_or("Request failed");
        let error = AppError::new(kind_for_status(status), message)
            .with_status(status.as_u16())
            .with_retryable(matches!(status.as_u16(), 429 | 500 | 503));
        Self::from(error)
    }
}

/// `JsonConfig` error handler: malformed bodies become a 422
/// `VALIDATION_ERROR` listing the problem under `validation_errors`.
pub fn json_error_handler(err: JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    let problem = json!({
        "field": "body",
        "message": err.to_string(),
        "type": json_error_type(&err),
    });
    let error = AppError::validation("Request validation failed")
        .with_status(422)
        .with_detail("validation_errors", Value::Array(vec![problem]));
    ApiError::for_request(error, req).into()
}

fn json_error_type(err: &JsonPayloadError) -> &'static str {
    match err {
        JsonPayloadError::ContentType => "content_type",
        JsonPayloadError::Deserialize(_) => "value_error",
        JsonPayloadError::Overflow { .. } | JsonPayloadError::OverflowKnownLength { .. } => {
            "payload_too_large"
        }
        _ => "json_invalid",
    }
}

/// Default service: unknown routes answer `RECORD_NOT_FOUND`.
pub async fn not_found(req: HttpRequest) -> ApiResult<HttpResponse> {
    let error = AppError::not_found(format!("No route matches {}", req.path()));
    Err(ApiError::for_request(error, &req))
}

/// Fallback for known paths hit with an unsupported method.
pub async fn method_not_allowed(req: HttpRequest) -> ApiResult<HttpResponse> {
    let status = StatusCode::METHOD_NOT_ALLOWED;
    let error = AppError::new(
        kind_for_status(status),
        format!("Method {} is not allowed on {}", req.method(), req.path()),
    )
    .with_status(status.as_u16());
    Err(ApiError::for_request(error, &req))
}
