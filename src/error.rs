use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use tracing::error;

use crate::{
    auth::AuthError, oracle::OracleError, photo::CaptureError, session::SessionError,
    store::StoreError,
};

/// Everything a handler can fail with, mapped to a status and a
/// `{"message": ...}` body.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<CaptureError> for AppError {
    fn from(e: CaptureError) -> Self {
        AppError::Session(SessionError::Capture(e))
    }
}

impl From<OracleError> for AppError {
    fn from(e: OracleError) -> Self {
        AppError::Session(SessionError::Oracle(e))
    }
}

fn store_status(e: &StoreError) -> StatusCode {
    match e {
        StoreError::DuplicateStudent(_) | StoreError::DuplicateOperator(_) => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Auth(AuthError::Internal(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::Session(e) => match e {
                SessionError::Busy(_)
                | SessionError::NotRunning
                | SessionError::NoPendingVerification
                | SessionError::UnknownStudent(_) => StatusCode::CONFLICT,
                SessionError::Capture(_) => StatusCode::UNPROCESSABLE_ENTITY,
                SessionError::Oracle(_) => StatusCode::BAD_GATEWAY,
                SessionError::Store(e) => store_status(e),
            },
            AppError::Store(e) => store_status(e),
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
            return HttpResponse::build(status).json(json!({
                "message": "Something went wrong, Contact with system admin"
            }));
        }

        HttpResponse::build(status).json(json!({
            "message": self.to_string()
        }))
    }
}
