use crux_http::Response;

use crate::error::{AppError, ErrorKind};

pub use crux_http::HttpError;

/// What a backend call resolves to. The body stays raw bytes; `api`
/// decodes the envelope.
pub type HttpResult = crux_http::Result<Response<Vec<u8>>>;

/// Splits a result into status and body. Non-2xx responses reported as
/// `HttpError::Http` come back as a status too, so callers see the
/// backend's message either way.
pub fn into_parts(result: HttpResult) -> Result<(u16, Vec<u8>), HttpError> {
    match result {
        Ok(mut response) => {
            let status = response.status() as u16;
            Ok((status, response.take_body().unwrap_or_default()))
        }
        Err(HttpError::Http { code, body, .. }) => Ok((code as u16, body.unwrap_or_default())),
        Err(e) => Err(e),
    }
}

impl From<HttpError> for AppError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::Http { code, body, .. } => {
                AppError::from_http_status(code as u16, body.as_deref())
            }
            HttpError::Timeout => AppError::new(ErrorKind::Timeout, "request timed out"),
            HttpError::Io(message) => {
                AppError::new(ErrorKind::Network, "connection failed").with_internal(message)
            }
            HttpError::Json(message) => {
                AppError::new(ErrorKind::Serialization, "malformed JSON").with_internal(message)
            }
            HttpError::Url(message) => {
                AppError::new(ErrorKind::InvalidState, "invalid URL").with_internal(message)
            }
        }
    }
}
