use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use thiserror::Error;

use crate::identity::IdentityError;
use crate::services::MaterializeError;
use crate::store::StoreError;

/// Errors surfaced by the HTTP endpoints.
///
/// Provider failures keep the underlying message, clients get it verbatim.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Identity(#[from] IdentityError),

    #[error("{0}")]
    Store(#[from] StoreError),

    #[error("{0}")]
    Materialize(#[from] MaterializeError),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Identity(_) | AppError::Store(_) | AppError::Materialize(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_maps_to_bad_request() {
        let err = AppError::validation("Email is required.");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Email is required.");
    }

    #[test]
    fn provider_errors_keep_their_message() {
        let err = AppError::from(IdentityError::EmailExists);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            err.to_string(),
            "The email address is already in use by another account."
        );
    }

    #[test]
    fn materializer_failures_are_server_errors() {
        let err = AppError::from(MaterializeError::MissingField {
            request_id: "r1".to_string(),
            field: "endDate",
        });
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Leave request r1 has no endDate");
    }
}
