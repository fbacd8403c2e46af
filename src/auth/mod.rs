pub mod auth;
pub mod handlers;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod revocation;

use actix_web::http::header::{AUTHORIZATION, HeaderMap};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing Authorization header")]
    MissingToken,

    #[error("Authorization header must start with Bearer")]
    MalformedHeader,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Wrong token type")]
    WrongTokenType,

    #[error("Token has been revoked")]
    Revoked,

    #[error("Invalid email or password. Please try again.")]
    InvalidCredentials,

    #[error("auth internals failed: {0}")]
    Internal(String),
}

/// Pulls the raw token out of `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?
        .to_str()
        .map_err(|_| AuthError::MalformedHeader)?;

    value
        .strip_prefix("Bearer ")
        .ok_or(AuthError::MalformedHeader)
}
