use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Message shown to clients whenever the real cause is internal.
pub const GENERIC_ERROR_MESSAGE: &str = "Please try again!";

#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    AlreadyExists(String),
    Unauthorized(String),
    InvalidOperation(String),
    NotLoggedIn(String),
    Database(String),
    Timeout(String),
    Other(String),
}

/// Error kinds as seen by callers. `Database` and `Timeout` collapse into `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    AlreadyExists,
    Unauthorized,
    InvalidOperation,
    NotLoggedIn,
    Other,
}

impl ErrorKind {
    /// Numeric code carried in the response envelope.
    pub fn code(self) -> u8 {
        match self {
            ErrorKind::Other => 1,
            ErrorKind::NotLoggedIn => 3,
            ErrorKind::Unauthorized => 5,
            ErrorKind::NotFound => 6,
            ErrorKind::InvalidOperation => 7,
            ErrorKind::AlreadyExists => 8,
        }
    }

    pub fn status(self) -> StatusCode {
        match self {
            ErrorKind::NotFound | ErrorKind::AlreadyExists => StatusCode::NOT_FOUND,
            ErrorKind::Unauthorized | ErrorKind::NotLoggedIn | ErrorKind::InvalidOperation => {
                StatusCode::FORBIDDEN
            }
            ErrorKind::Other => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::AlreadyExists(_) => ErrorKind::AlreadyExists,
            AppError::Unauthorized(_) => ErrorKind::Unauthorized,
            AppError::InvalidOperation(_) => ErrorKind::InvalidOperation,
            AppError::NotLoggedIn(_) => ErrorKind::NotLoggedIn,
            AppError::Database(_) | AppError::Timeout(_) | AppError::Other(_) => ErrorKind::Other,
        }
    }

    pub fn is_internal(&self) -> bool {
        self.kind() == ErrorKind::Other
    }

    /// Builds the client-facing descriptor. Internal detail is logged here and
    /// never copied into the message.
    pub fn descriptor(&self) -> ErrorDescriptor {
        let kind = self.kind();
        let message = match self {
            AppError::NotFound(msg)
            | AppError::AlreadyExists(msg)
            | AppError::Unauthorized(msg)
            | AppError::InvalidOperation(msg)
            | AppError::NotLoggedIn(msg) => msg.clone(),
            AppError::Database(msg) => {
                tracing::error!("Database error: {}", msg);
                GENERIC_ERROR_MESSAGE.to_string()
            }
            AppError::Timeout(msg) => {
                tracing::error!("Timeout error: {}", msg);
                GENERIC_ERROR_MESSAGE.to_string()
            }
            AppError::Other(msg) => {
                tracing::error!("Internal error: {}", msg);
                GENERIC_ERROR_MESSAGE.to_string()
            }
        };

        ErrorDescriptor {
            error_code: kind.code(),
            error_msg: message,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::AlreadyExists(msg) => write!(f, "Already exists: {}", msg),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::InvalidOperation(msg) => write!(f, "Invalid operation: {}", msg),
            AppError::NotLoggedIn(msg) => write!(f, "Not logged in: {}", msg),
            AppError::Database(msg) => write!(f, "Database error: {}", msg),
            AppError::Timeout(msg) => write!(f, "Timeout error: {}", msg),
            AppError::Other(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Other(err.to_string())
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;

/// `{ errorCode, errorMsg }` as carried in the `error` slot of the envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDescriptor {
    pub error_code: u8,
    pub error_msg: String,
}

/// Response envelope shared by every endpoint. Exactly one slot is populated,
/// except for successful calls that return nothing.
#[derive(Debug, Serialize, Deserialize)]
pub struct Envelope<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<T>,
}

impl<T> Envelope<T> {
    pub fn content(content: T) -> Self {
        Self {
            error: None,
            content: Some(content),
        }
    }

    pub fn empty() -> Self {
        Self {
            error: None,
            content: None,
        }
    }
}

/// An `AppError` bound to the HTTP status it will be reported with.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    error: AppError,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn error(&self) -> &AppError {
        &self.error
    }

    /// Reports every non-internal failure with `status`. Internal failures keep 500.
    pub fn wrap_client_errors(self, status: StatusCode) -> Self {
        if self.error.is_internal() {
            self
        } else {
            Self { status, ..self }
        }
    }
}

impl From<AppError> for ApiError {
    fn from(error: AppError) -> Self {
        Self {
            status: error.kind().status(),
            error,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Envelope::<()> {
            error: Some(self.error.descriptor()),
            content: None,
        };

        (self.status, Json(body)).into_response()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_errors_hide_detail() {
        let err = AppError::Database("no such table: followers".to_string());
        let descriptor = err.descriptor();
        assert_eq!(descriptor.error_code, 1);
        assert_eq!(descriptor.error_msg, GENERIC_ERROR_MESSAGE);
        assert_eq!(err.kind().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_client_errors_keep_message() {
        let err = AppError::AlreadyExists("Already following!".to_string());
        let descriptor = err.descriptor();
        assert_eq!(descriptor.error_code, 8);
        assert_eq!(descriptor.error_msg, "Already following!");
    }

    #[test]
    fn test_wrap_client_errors() {
        let wrapped = ApiError::from(AppError::InvalidOperation("Cannot follow yourself!".into()))
            .wrap_client_errors(StatusCode::NOT_FOUND);
        assert_eq!(wrapped.status(), StatusCode::NOT_FOUND);

        let internal = ApiError::from(AppError::Timeout("db".into()))
            .wrap_client_errors(StatusCode::NOT_FOUND);
        assert_eq!(internal.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_envelope_omits_empty_slots() {
        let body = serde_json::to_value(Envelope::<()>::empty()).unwrap();
        assert_eq!(body, serde_json::json!({}));

        let body = serde_json::to_value(Envelope::content(vec![1, 2])).unwrap();
        assert_eq!(body, serde_json::json!({ "content": [1, 2] }));
    }
}
