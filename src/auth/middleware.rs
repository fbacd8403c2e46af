use crate::{
    auth::{AuthError, auth::AuthUser, bearer_token},
    config::Config,
    error::AppError,
};
use actix_web::{
    Error, HttpMessage, ResponseError,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    middleware::Next,
    web::Data,
};
use tracing::debug;

pub async fn auth_middleware(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let verified = match req.app_data::<Data<Config>>() {
        Some(config) => bearer_token(req.headers())
            .and_then(|token| AuthUser::from_access_token(token, &config.jwt_secret)),
        None => Err(AuthError::Internal("App config missing".into())),
    };

    match verified {
        Ok(user) => {
            req.extensions_mut().insert(user);
            next.call(req).await
        }
        Err(e) => {
            debug!(path = %req.path(), error = %e, "Rejected unauthenticated request");
            let resp = AppError::from(e).error_response();
            Ok(req.into_response(resp))
        }
    }
}
