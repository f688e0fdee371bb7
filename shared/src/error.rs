use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorSeverity {
    Transient,
    Permanent,
    Fatal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Network,
    Timeout,
    Authentication,
    Authorization,
    Validation,
    NotFound,
    Conflict,
    RateLimited,
    Server,
    Storage,
    Serialization,
    InvalidState,
    Unknown,
}

impl ErrorKind {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Network => "NETWORK_ERROR",
            Self::Timeout => "TIMEOUT",
            Self::Authentication => "AUTH_ERROR",
            Self::Authorization => "FORBIDDEN",
            Self::Validation => "VALIDATION_ERROR",
            Self::NotFound => "NOT_FOUND",
            Self::Conflict => "CONFLICT",
            Self::RateLimited => "RATE_LIMITED",
            Self::Server => "SERVER_ERROR",
            Self::Storage => "STORAGE_ERROR",
            Self::Serialization => "SERIALIZATION_ERROR",
            Self::InvalidState => "INVALID_STATE",
            Self::Unknown => "UNKNOWN_ERROR",
        }
    }

    #[must_use]
    pub const fn default_severity(self) -> ErrorSeverity {
        match self {
            Self::Network
            | Self::Timeout
            | Self::Conflict
            | Self::RateLimited
            | Self::Server
            | Self::Storage => ErrorSeverity::Transient,

            Self::Serialization | Self::InvalidState => ErrorSeverity::Fatal,

            Self::Authentication
            | Self::Authorization
            | Self::Validation
            | Self::NotFound
            | Self::Unknown => ErrorSeverity::Permanent,
        }
    }

    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(
            self,
            Self::Network | Self::Timeout | Self::RateLimited | Self::Server | Self::Conflict
        )
    }

    #[must_use]
    pub fn from_http_status(status: u16) -> Self {
        match status {
            400 | 422 => Self::Validation,
            401 => Self::Authentication,
            403 => Self::Authorization,
            404 => Self::NotFound,
            408 => Self::Timeout,
            409 => Self::Conflict,
            429 => Self::RateLimited,
            500..=599 => Self::Server,
            _ => Self::Unknown,
        }
    }
}

/// Error surfaced to the user as a toast or a dismissible banner.
///
/// `message` is what the backend (or a validator) said; `user_facing_message`
/// is what the shell shows. `internal_message` never leaves the core except
/// through `Display`, which is only used for logging.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppError {
    pub kind: ErrorKind,
    pub severity: ErrorSeverity,
    pub message: String,
    pub internal_message: Option<String>,
    pub context: HashMap<String, String>,
}

impl AppError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: kind.default_severity(),
            message: message.into(),
            internal_message: None,
            context: HashMap::new(),
        }
    }

    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    #[must_use]
    pub fn with_internal(mut self, internal: impl Into<String>) -> Self {
        self.internal_message = Some(internal.into());
        self
    }

    #[must_use]
    pub fn with_severity(mut self, severity: ErrorSeverity) -> Self {
        self.severity = severity;
        self
    }

    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.kind.code()
    }

    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.kind.is_retryable() && !matches!(self.severity, ErrorSeverity::Fatal)
    }

    #[must_use]
    pub const fn is_auth_failure(&self) -> bool {
        matches!(self.kind, ErrorKind::Authentication)
    }

    #[must_use]
    pub fn user_facing_message(&self) -> String {
        match self.kind {
            ErrorKind::Network => {
                "Unable to connect. Please check your internet connection and try again.".into()
            }
            ErrorKind::Timeout => "The request timed out. Please try again.".into(),
            ErrorKind::Authentication => "Your session has expired. Please sign in again.".into(),
            ErrorKind::Authorization => "You don't have permission to perform this action.".into(),
            ErrorKind::Validation | ErrorKind::Conflict if !self.message.is_empty() => {
                self.message.clone()
            }
            ErrorKind::Validation => "Please fill all required fields.".into(),
            ErrorKind::NotFound => "The requested complaint could not be found.".into(),
            ErrorKind::Conflict => {
                "This complaint was changed by someone else. Please refresh and try again.".into()
            }
            ErrorKind::RateLimited => "Too many requests. Please wait a moment and try again.".into(),
            ErrorKind::Server if !self.message.is_empty() => self.message.clone(),
            ErrorKind::Server => "The server could not complete the request.".into(),
            ErrorKind::Storage => "Unable to save data on this device.".into(),
            ErrorKind::Serialization => {
                "A data error occurred. Please contact support if this persists.".into()
            }
            ErrorKind::InvalidState => "The app is in an invalid state. Please restart.".into(),
            ErrorKind::Unknown => {
                "An unexpected error occurred. Please try again or contact support.".into()
            }
        }
    }

    /// Builds an error from a non-2xx status, preferring the backend's
    /// `message` field when the body is a JSON envelope.
    #[must_use]
    pub fn from_http_status(status: u16, body: Option<&[u8]>) -> Self {
        let kind = ErrorKind::from_http_status(status);

        let message = body
            .and_then(|b| serde_json::from_slice::<ApiErrorResponse>(b).ok())
            .and_then(|e| e.message)
            .unwrap_or_else(|| format!("HTTP error: {status}"));

        Self::new(kind, message).with_context("http_status", status.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code(), self.message)?;
        if let Some(internal) = &self.internal_message {
            write!(f, " (internal: {internal})")?;
        }
        Ok(())
    }
}

impl std::error::Error for AppError {}

/// Form input rejected before any request is made.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    Required(&'static str),

    #[error("{field} is too long ({len} > {max})")]
    TooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("invalid email address")]
    InvalidEmail,

    #[error("OTP must be 6 digits")]
    InvalidOtp,

    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        let message = match &err {
            ValidationError::Required(_) => "Please fill all required fields.".to_string(),
            ValidationError::InvalidEmail => "Please enter a valid email address.".to_string(),
            ValidationError::InvalidOtp => "Please enter a valid 6-digit OTP.".to_string(),
            ValidationError::TooLong { .. } | ValidationError::Invalid { .. } => err.to_string(),
        };
        AppError::validation(message).with_internal(err.to_string())
    }
}

pub(crate) fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::Required(field))
    } else {
        Ok(())
    }
}

pub(crate) fn require_max(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    require(field, value)?;
    let len = value.trim().chars().count();
    if len > max {
        return Err(ValidationError::TooLong { field, len, max });
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize)]
struct ApiErrorResponse {
    #[serde(default)]
    message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_new() {
        let error = AppError::new(ErrorKind::Network, "offline");
        assert_eq!(error.kind, ErrorKind::Network);
        assert_eq!(error.severity, ErrorSeverity::Transient);
        assert_eq!(error.code(), "NETWORK_ERROR");
        assert!(error.is_retryable());
    }

    #[test]
    fn test_app_error_with_context() {
        let error = AppError::new(ErrorKind::NotFound, "missing")
            .with_context("complaint_id", "abc")
            .with_internal("lookup failed");
        assert_eq!(error.context.get("complaint_id").map(String::as_str), Some("abc"));
        assert_eq!(error.to_string(), "[NOT_FOUND] missing (internal: lookup failed)");
    }

    #[test]
    fn test_app_error_from_http_status() {
        assert_eq!(AppError::from_http_status(401, None).kind, ErrorKind::Authentication);
        assert_eq!(AppError::from_http_status(403, None).kind, ErrorKind::Authorization);
        assert_eq!(AppError::from_http_status(404, None).kind, ErrorKind::NotFound);
        assert_eq!(AppError::from_http_status(409, None).kind, ErrorKind::Conflict);
        assert_eq!(AppError::from_http_status(503, None).kind, ErrorKind::Server);
        assert_eq!(AppError::from_http_status(418, None).kind, ErrorKind::Unknown);
    }

    #[test]
    fn test_from_http_status_prefers_backend_message() {
        let body = br#"{"success":false,"message":"Complaint already resolved"}"#;
        let error = AppError::from_http_status(409, Some(body));
        assert_eq!(error.message, "Complaint already resolved");
        assert_eq!(error.user_facing_message(), "Complaint already resolved");
        assert_eq!(error.context.get("http_status").map(String::as_str), Some("409"));
    }

    #[test]
    fn test_from_http_status_with_garbage_body() {
        let error = AppError::from_http_status(500, Some(b"<html>oops</html>"));
        assert_eq!(error.message, "HTTP error: 500");
    }

    #[test]
    fn test_user_facing_message_for_auth() {
        let error = AppError::new(ErrorKind::Authentication, "jwt expired");
        assert!(error.is_auth_failure());
        assert_eq!(
            error.user_facing_message(),
            "Your session has expired. Please sign in again."
        );
    }

    #[test]
    fn test_validation_falls_back_to_generic_message() {
        assert_eq!(
            AppError::validation("").user_facing_message(),
            "Please fill all required fields."
        );
        assert_eq!(AppError::validation("Title is required").user_facing_message(), "Title is required");
    }

    #[test]
    fn test_validation_error_conversion() {
        let error: AppError = ValidationError::Required("title").into();
        assert_eq!(error.kind, ErrorKind::Validation);
        assert_eq!(error.user_facing_message(), "Please fill all required fields.");
        assert_eq!(error.internal_message.as_deref(), Some("title is required"));
    }

    #[test]
    fn test_require_max() {
        assert_eq!(require_max("title", "  ", 10), Err(ValidationError::Required("title")));
        assert!(require_max("title", "short", 10).is_ok());
        assert_eq!(
            require_max("title", "far too long", 3),
            Err(ValidationError::TooLong { field: "title", len: 12, max: 3 })
        );
    }

    #[test]
    fn test_fatal_severity_is_not_retryable() {
        let error = AppError::new(ErrorKind::Network, "x").with_severity(ErrorSeverity::Fatal);
        assert!(!error.is_retryable());
    }
}
