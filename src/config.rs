use anyhow::{Context, bail};
use std::{env, str::FromStr, time::Duration};

use crate::session::controller::SessionTiming;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub access_token_ttl: usize,
    pub refresh_token_ttl: usize,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_register_per_min: u32,
    pub rate_refresh_per_min: u32,
    pub rate_protected_per_min: u32,

    pub api_prefix: String,

    // Verification oracle
    pub oracle_url: String,
    pub oracle_api_key: Option<String>,

    // Attendance session
    pub verification_probability: f64,
    pub scan_delay_ms: u64,
    pub inter_student_delay_ms: u64,
    pub prompt_wait_secs: u64,

    pub seed_demo_data: bool,
    pub log_dir: String,
}

fn required(key: &str) -> anyhow::Result<String> {
    env::var(key).with_context(|| format!("{key} must be set"))
}

fn or_default<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw:?}")),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let verification_probability = or_default("VERIFICATION_PROBABILITY", 0.4)?;
        if !(0.0..=1.0).contains(&verification_probability) {
            bail!("VERIFICATION_PROBABILITY must be between 0 and 1, got {verification_probability}");
        }

        Ok(Self {
            server_addr: env::var("SERVER_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string()),
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://guardian.db".to_string()),
            jwt_secret: required("JWT_SECRET")?,
            access_token_ttl: or_default("ACCESS_TOKEN_TTL", 900)?, // 15 min
            refresh_token_ttl: or_default("REFRESH_TOKEN_TTL", 604_800)?, // 7 days

            rate_login_per_min: or_default("RATE_LOGIN_PER_MIN", 60)?,
            rate_register_per_min: or_default("RATE_REGISTER_PER_MIN", 30)?,
            rate_refresh_per_min: or_default("RATE_REFRESH_PER_MIN", 30)?,
            rate_protected_per_min: or_default("RATE_PROTECTED_PER_MIN", 1000)?,

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),

            oracle_url: required("ORACLE_URL")?,
            oracle_api_key: env::var("ORACLE_API_KEY").ok().filter(|k| !k.is_empty()),

            verification_probability,
            scan_delay_ms: or_default("SCAN_DELAY_MS", 1000)?,
            inter_student_delay_ms: or_default("INTER_STUDENT_DELAY_MS", 500)?,
            prompt_wait_secs: or_default("PROMPT_WAIT_SECS", 25)?,

            seed_demo_data: or_default("SEED_DEMO_DATA", true)?,
            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),
        })
    }

    pub fn session_timing(&self) -> SessionTiming {
        SessionTiming {
            scan: Duration::from_millis(self.scan_delay_ms),
            between_students: Duration::from_millis(self.inter_student_delay_ms),
        }
    }

    /// How long `GET /session/verification` holds the request open.
    pub fn prompt_wait(&self) -> Duration {
        Duration::from_secs(self.prompt_wait_secs)
    }
}

#[cfg(test)]
impl Config {
    pub fn for_tests() -> Self {
        Self {
            database_url: "sqlite::memory:".into(),
            jwt_secret: "test-secret".into(),
            server_addr: "127.0.0.1:0".into(),
            access_token_ttl: 900,
            refresh_token_ttl: 3600,
            rate_login_per_min: 1000,
            rate_register_per_min: 1000,
            rate_refresh_per_min: 1000,
            rate_protected_per_min: 1000,
            api_prefix: "/api".into(),
            oracle_url: "http://127.0.0.1:9".into(),
            oracle_api_key: None,
            verification_probability: 0.0,
            scan_delay_ms: 0,
            inter_student_delay_ms: 0,
            prompt_wait_secs: 0,
            seed_demo_data: false,
            log_dir: "logs".into(),
        }
    }
}
