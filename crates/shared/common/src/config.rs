//! Shared configuration structures.
//!
//! Each service owns its own config struct; the pieces both services need
//! (token settings, env helpers) live here so the two processes read the
//! same variables the same way.

use std::env;
use std::str::FromStr;

use domain::{
    DEFAULT_ACCESS_TOKEN_TTL_MINUTES, DEFAULT_REFRESH_TOKEN_TTL_DAYS, MIN_JWT_SECRET_LENGTH,
};
use thiserror::Error;

/// Configuration loading failures.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{key} is invalid: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Read the first variable that is set.
pub fn env_any(keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| env::var(k).ok())
}

/// Read a variable with a fallback default.
pub fn env_or(keys: &[&str], default: &str) -> String {
    env_any(keys).unwrap_or_else(|| default.to_string())
}

/// Parse a variable, falling back to `default` when unset.
pub fn env_parse<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

/// Token signing and lifetime settings. Both services must load the same
/// secret for access tokens to verify across them.
#[derive(Clone)]
pub struct TokenConfig {
    secret: String,
    pub access_ttl_minutes: i64,
    pub refresh_ttl_days: i64,
    /// Kill the whole session when a consumed refresh token is replayed
    pub revoke_session_on_reuse: bool,
}

impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"[REDACTED]")
            .field("access_ttl_minutes", &self.access_ttl_minutes)
            .field("refresh_ttl_days", &self.refresh_ttl_days)
            .field("revoke_session_on_reuse", &self.revoke_session_on_reuse)
            .finish()
    }
}

impl TokenConfig {
    /// Build a config after validating the secret.
    pub fn new(secret: impl Into<String>) -> Result<Self, ConfigError> {
        let secret = secret.into();
        if secret.len() < MIN_JWT_SECRET_LENGTH {
            return Err(ConfigError::Invalid {
                key: "JWT_SECRET",
                reason: format!("must be at least {} characters", MIN_JWT_SECRET_LENGTH),
            });
        }
        Ok(Self {
            secret,
            access_ttl_minutes: DEFAULT_ACCESS_TOKEN_TTL_MINUTES,
            refresh_ttl_days: DEFAULT_REFRESH_TOKEN_TTL_DAYS,
            revoke_session_on_reuse: true,
        })
    }

    /// Load from `JWT_SECRET`, `ACCESS_TOKEN_TTL_MINUTES`,
    /// `REFRESH_TOKEN_TTL_DAYS` and `AUTH_REVOKE_SESSION_ON_REUSE`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let secret = env_any(&["JWT_SECRET"]).ok_or(ConfigError::Missing("JWT_SECRET"))?;
        let mut config = Self::new(secret)?;
        config.access_ttl_minutes =
            env_parse("ACCESS_TOKEN_TTL_MINUTES", DEFAULT_ACCESS_TOKEN_TTL_MINUTES)?;
        config.refresh_ttl_days = env_parse("REFRESH_TOKEN_TTL_DAYS", DEFAULT_REFRESH_TOKEN_TTL_DAYS)?;
        config.revoke_session_on_reuse = env_parse("AUTH_REVOKE_SESSION_ON_REUSE", true)?;

        if config.access_ttl_minutes <= 0 {
            return Err(ConfigError::Invalid {
                key: "ACCESS_TOKEN_TTL_MINUTES",
                reason: "must be positive".to_string(),
            });
        }
        if config.refresh_ttl_days <= 0 {
            return Err(ConfigError::Invalid {
                key: "REFRESH_TOKEN_TTL_DAYS",
                reason: "must be positive".to_string(),
            });
        }
        Ok(config)
    }

    /// Get secret as bytes for signing/verification.
    pub fn secret_bytes(&self) -> &[u8] {
        self.secret.as_bytes()
    }

    pub fn access_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.access_ttl_minutes)
    }

    pub fn refresh_ttl(&self) -> chrono::Duration {
        chrono::Duration::days(self.refresh_ttl_days)
    }
}
