use crate::{
    auth::{AuthError, bearer_token, jwt::verify_token},
    config::Config,
    error::AppError,
    models::TokenType,
};
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, web::Data};
use futures::future::{Ready, ready};

/// The operator behind an access token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub operator_id: String,
    pub email: String,
}

impl AuthUser {
    /// Validates an access token against `secret`.
    pub fn from_access_token(token: &str, secret: &str) -> Result<Self, AuthError> {
        let claims = verify_token(token, secret)?;
        if claims.token_type != TokenType::Access {
            return Err(AuthError::WrongTokenType);
        }

        Ok(AuthUser {
            operator_id: claims.sub,
            email: claims.email,
        })
    }
}

impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // already validated by the auth middleware
        if let Some(user) = req.extensions().get::<AuthUser>() {
            return ready(Ok(user.clone()));
        }

        let Some(config) = req.app_data::<Data<Config>>() else {
            return ready(Err(AuthError::Internal("App config missing".into()).into()));
        };

        ready(
            bearer_token(req.headers())
                .and_then(|token| AuthUser::from_access_token(token, &config.jwt_secret))
                .map_err(AppError::from),
        )
    }
}
