use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// ApiError
///
/// Every failure the core reports to its immediate caller. Handlers return these as values;
/// the numeric status code is chosen only here, at the HTTP boundary.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ApiError {
    /// Unknown username and wrong password share this variant so callers cannot
    /// tell which half of the credential was wrong.
    #[error("Username or password is incorrect.")]
    InvalidCredentials,

    #[error("Username already exists")]
    DuplicateUsername,

    #[error("Error while registering...")]
    RegistrationFailed,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0} Exists!")]
    Conflict(&'static str),

    #[error("Something went wrong when {0}")]
    Persistence(String),

    #[error("{0}")]
    BadRequest(String),

    /// Missing, malformed, wrongly signed or expired token.
    #[error("unauthorized")]
    Unauthorized,

    /// Valid token, insufficient role.
    #[error("forbidden")]
    Forbidden,

    #[error("internal error")]
    Internal,
}

/// ErrorResponse
///
/// JSON body shared by every error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub message: String,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidCredentials
            | ApiError::DuplicateUsername
            | ApiError::RegistrationFailed
            | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Persistence(_) | ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorResponse {
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
