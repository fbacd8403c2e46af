use moka::future::Cache;
use once_cell::sync::Lazy;
use std::time::Duration;

/// Upper bound on refresh token lifetime; entries outliving it are useless.
const MAX_REFRESH_TTL: Duration = Duration::from_secs(30 * 86400);

/// jti of every refresh token that was rotated or logged out.
static REVOKED_REFRESH_TOKENS: Lazy<Cache<String, ()>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(100_000)
        .time_to_live(MAX_REFRESH_TTL)
        .build()
});

pub async fn revoke(jti: &str) {
    REVOKED_REFRESH_TOKENS.insert(jti.to_string(), ()).await;
}

pub async fn is_revoked(jti: &str) -> bool {
    REVOKED_REFRESH_TOKENS.contains_key(jti)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_web::test]
    async fn revoked_tokens_are_remembered() {
        let jti = uuid::Uuid::new_v4().to_string();
        assert!(!is_revoked(&jti).await);
        revoke(&jti).await;
        assert!(is_revoked(&jti).await);
    }
}
