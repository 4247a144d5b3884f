use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use validator::ValidationErrors;

use crate::{auth::error::AuthError, content::ContentError};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Auth error")]
    Auth(AuthError),

    #[error("Validation error")]
    Validation(ValidationErrors),

    #[error("Content error")]
    Content(#[from] ContentError),

    #[error("Other error: {0}")]
    Other(anyhow::Error),
}

impl From<AuthError> for Error {
    fn from(value: AuthError) -> Self {
        Self::Auth(value)
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::Auth(auth_error) => match auth_error {
                AuthError::JwtError(error) => {
                    tracing::info!(err.msg = %error, "Rejected bearer token");

                    StatusCode::UNAUTHORIZED.into_response()
                }
                AuthError::Unauthenticated => StatusCode::UNAUTHORIZED.into_response(),
                AuthError::GuestNotAllowed => {
                    (StatusCode::FORBIDDEN, "Guest access is disabled").into_response()
                }
                AuthError::InvalidGuestId => {
                    (StatusCode::BAD_REQUEST, "Missing or invalid x-guest-id header").into_response()
                }
            },
            Error::Validation(validation_error) => {
                tracing::error!(err.msg = %validation_error, err.details = ?validation_error, "Validation Error");

                (StatusCode::BAD_REQUEST, validation_error.to_string()).into_response()
            }
            Error::Content(content_error) => match content_error {
                ContentError::Status { status, body } => {
                    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);

                    (status, Json(body)).into_response()
                }
                ContentError::InvalidPath => {
                    (StatusCode::BAD_REQUEST, "Invalid upstream path").into_response()
                }
                ContentError::Request(error) => {
                    tracing::error!(err.msg = %error, err.details = ?error, "Upstream Error");

                    StatusCode::BAD_GATEWAY.into_response()
                }
            },
            Error::Other(error) => {
                tracing::error!(err.msg = %error, err.details = ?error, "Other Error");

                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}
