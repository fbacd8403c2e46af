use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use super::AuthError;
use crate::models::{Claims, TokenType};

fn now() -> usize {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as usize)
        .unwrap_or_default()
}

fn issue(
    operator_id: &str,
    email: &str,
    token_type: TokenType,
    secret: &str,
    ttl: usize,
) -> Result<(String, Claims), AuthError> {
    let claims = Claims {
        sub: operator_id.to_string(),
        email: email.to_string(),
        exp: now() + ttl,
        jti: Uuid::new_v4().to_string(),
        token_type,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AuthError::Internal(e.to_string()))?;

    Ok((token, claims))
}

pub fn generate_access_token(
    operator_id: &str,
    email: &str,
    secret: &str,
    ttl: usize,
) -> Result<String, AuthError> {
    issue(operator_id, email, TokenType::Access, secret, ttl).map(|(token, _)| token)
}

pub fn generate_refresh_token(
    operator_id: &str,
    email: &str,
    secret: &str,
    ttl: usize,
) -> Result<(String, Claims), AuthError> {
    issue(operator_id, email, TokenType::Refresh, secret, ttl)
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AuthError::InvalidToken)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn tokens_carry_their_type() {
        let access = generate_access_token("op-1", "a@b.c", SECRET, 900).unwrap();
        let (refresh, refresh_claims) = generate_refresh_token("op-1", "a@b.c", SECRET, 900).unwrap();

        let decoded = verify_token(&access, SECRET).unwrap();
        assert_eq!(decoded.sub, "op-1");
        assert_eq!(decoded.token_type, TokenType::Access);

        let decoded = verify_token(&refresh, SECRET).unwrap();
        assert_eq!(decoded.token_type, TokenType::Refresh);
        assert_eq!(decoded.jti, refresh_claims.jti);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = generate_access_token("op-1", "a@b.c", SECRET, 900).unwrap();
        assert!(matches!(
            verify_token(&token, "other"),
            Err(AuthError::InvalidToken)
        ));
    }
}
