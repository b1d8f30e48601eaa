//! API error handling

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use domain_case::CaseError;

use crate::auth::AuthError;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Case(#[from] CaseError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Case(err) => match err {
                CaseError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                CaseError::Duplicate(_) => StatusCode::CONFLICT,
                CaseError::ReferenceViolation(_) => StatusCode::CONFLICT,
                CaseError::NotFound(_) => StatusCode::NOT_FOUND,
                CaseError::ConfirmationRequired(_) => StatusCode::PRECONDITION_REQUIRED,
                CaseError::InvalidState { .. } => StatusCode::CONFLICT,
                CaseError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Auth(AuthError::MissingPermission(_)) => StatusCode::FORBIDDEN,
            ApiError::Auth(_) => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::Case(err) => err.code(),
            ApiError::Auth(AuthError::MissingPermission(_)) => "FORBIDDEN",
            ApiError::Auth(_) => "UNAUTHORIZED",
            ApiError::BadRequest(_) => "BAD_REQUEST",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        }

        let field = match &self {
            ApiError::Case(CaseError::Validation { field, .. }) => field.clone(),
            _ => None,
        };

        let body = ErrorResponse {
            error: self.code().to_string(),
            message: self.to_string(),
            field,
        };

        (status, Json(body)).into_response()
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

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}
