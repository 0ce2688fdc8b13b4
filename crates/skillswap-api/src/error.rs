use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{debug, error, warn};

use skillswap_db::StoreError;
use skillswap_types::api::ErrorResponse;

/// Error returned by every handler. Carries a stable machine-readable code
/// plus optional human-readable details.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    details: Option<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str) -> Self {
        Self {
            status,
            code,
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn validation(details: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "validation_error").with_details(details)
    }

    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &'static str {
        self.code
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        let (status, code) = match &err {
            StoreError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            StoreError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
            StoreError::InvalidTransition(_) | StoreError::AlreadyCompleted(_) => {
                (StatusCode::CONFLICT, "invalid_transition")
            }
            StoreError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            StoreError::Forbidden { .. } => (StatusCode::FORBIDDEN, "forbidden"),
            StoreError::AlreadyExists(_) => (StatusCode::CONFLICT, "already_exists"),
            StoreError::Storage(_) | StoreError::Internal(_) => {
                // Storage details stay in the log, not in the response.
                error!("Store failure: {}", err);
                return Self::internal();
            }
        };

        match status {
            StatusCode::FORBIDDEN => warn!("Rejected request: {}", err),
            _ => debug!("Rejected request: {}", err),
        }

        Self::new(status, code).with_details(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        debug!("Rejected body: {}", rejection.body_text());
        Self::validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let body = Json(ErrorResponse {
            error: self.code.to_string(),
            details: self.details,
        });
        (self.status, body).into_response()
    }
}
