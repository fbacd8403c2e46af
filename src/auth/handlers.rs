use crate::{
    auth::{
        AuthError, bearer_token,
        jwt::{generate_access_token, generate_refresh_token, verify_token},
        password::{hash_password, verify_password},
        revocation,
    },
    config::Config,
    error::AppError,
    model::operator::Operator,
    models::{Claims, CredentialsReq, TokenPair, TokenType},
    store::kv::SqliteStore,
};
use actix_web::{HttpRequest, HttpResponse, web};
use chrono::Utc;
use serde_json::json;
use tracing::{debug, info, instrument};
use uuid::Uuid;

const MIN_PASSWORD_LEN: usize = 6;

fn issue_pair(operator_id: &str, email: &str, config: &Config) -> Result<TokenPair, AuthError> {
    let access_token =
        generate_access_token(operator_id, email, &config.jwt_secret, config.access_token_ttl)?;
    let (refresh_token, refresh_claims) =
        generate_refresh_token(operator_id, email, &config.jwt_secret, config.refresh_token_ttl)?;
    debug!(jti = %refresh_claims.jti, "Issued refresh token");

    Ok(TokenPair {
        access_token,
        refresh_token,
    })
}

fn refresh_claims(req: &HttpRequest, config: &Config) -> Result<Claims, AuthError> {
    let token = bearer_token(req.headers())?;
    let claims = verify_token(token, &config.jwt_secret)?;
    if claims.token_type != TokenType::Refresh {
        return Err(AuthError::WrongTokenType);
    }
    Ok(claims)
}

/// Operator registration handler
pub async fn register(
    payload: web::Json<CredentialsReq>,
    store: web::Data<SqliteStore>,
) -> Result<HttpResponse, AppError> {
    let email = payload.email.trim().to_lowercase();

    if email.is_empty() || !email.contains('@') {
        return Err(AppError::BadRequest("A valid email is required".into()));
    }
    if payload.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::BadRequest(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    let operator = Operator {
        id: Uuid::new_v4().to_string(),
        email,
        password_hash: hash_password(&payload.password)?,
        created_at: Utc::now(),
    };
    store.add_operator(operator).await?;

    Ok(HttpResponse::Created().json(json!({
        "message": "Operator registered successfully"
    })))
}

#[instrument(
    name = "auth_login",
    skip(store, config, payload),
    fields(email = %payload.email)
)]
pub async fn login(
    payload: web::Json<CredentialsReq>,
    store: web::Data<SqliteStore>,
    config: web::Data<Config>,
) -> Result<HttpResponse, AppError> {
    info!("Login request received");

    if payload.email.trim().is_empty() || payload.password.is_empty() {
        info!("Validation failed: empty email or password");
        return Err(AppError::BadRequest("Email and password required".into()));
    }

    let Some(operator) = store.find_operator(&payload.email).await? else {
        info!("Invalid credentials: operator not found");
        return Err(AuthError::InvalidCredentials.into());
    };

    verify_password(&payload.password, &operator.password_hash).inspect_err(|e| {
        info!(error = %e, "Invalid credentials: password mismatch");
    })?;

    let tokens = issue_pair(&operator.id, &operator.email, &config)?;
    info!(operator_id = %operator.id, "Login successful");

    Ok(HttpResponse::Ok().json(tokens))
}

/// Rotates a refresh token: the presented one is revoked and a new pair issued.
pub async fn refresh_token(
    req: HttpRequest,
    store: web::Data<SqliteStore>,
    config: web::Data<Config>,
) -> Result<HttpResponse, AppError> {
    let claims = refresh_claims(&req, &config)?;

    if revocation::is_revoked(&claims.jti).await {
        info!(jti = %claims.jti, "Refresh with revoked token");
        return Err(AuthError::Revoked.into());
    }
    revocation::revoke(&claims.jti).await;

    // the operator may have been removed since the token was issued
    if store.find_operator(&claims.email).await?.is_none() {
        return Err(AuthError::InvalidCredentials.into());
    }

    let tokens = issue_pair(&claims.sub, &claims.email, &config)?;
    Ok(HttpResponse::Ok().json(tokens))
}

/// Always succeeds; a valid refresh token is revoked on the way.
pub async fn logout(req: HttpRequest, config: web::Data<Config>) -> HttpResponse {
    if let Ok(claims) = refresh_claims(&req, &config) {
        revocation::revoke(&claims.jti).await;
        info!(operator_id = %claims.sub, "Operator logged out");
    }

    HttpResponse::NoContent().finish()
}
