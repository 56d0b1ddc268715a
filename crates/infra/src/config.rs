//! Configuration loading and representation.
//!
//! Built once at startup and injected into the components that need it; there
//! is no global configuration.

use std::env;

use thiserror::Error;

pub const DEFAULT_PORT: u16 = 5000;
/// 30 days.
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 30 * 24 * 60 * 60;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Process configuration.
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    /// HS256 signing secret for bearer tokens.
    pub jwt_secret: String,
    /// PostgreSQL connection string.
    pub database_url: String,
    pub port: u16,
    /// Lifetime of tokens minted by this process.
    pub token_ttl_secs: i64,
}

impl Config {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load from an arbitrary variable source (tests pass a map).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        let jwt_secret = required("JWT_SECRET")?;
        let database_url = required("DATABASE_URL")?;

        let port = match lookup("PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|e| ConfigError::Invalid {
                name: "PORT",
                reason: e.to_string(),
            })?,
            None => DEFAULT_PORT,
        };

        let token_ttl_secs = match lookup("TOKEN_TTL_SECS") {
            Some(raw) => {
                let secs = raw.trim().parse::<i64>().map_err(|e| ConfigError::Invalid {
                    name: "TOKEN_TTL_SECS",
                    reason: e.to_string(),
                })?;
                if secs <= 0 {
                    return Err(ConfigError::Invalid {
                        name: "TOKEN_TTL_SECS",
                        reason: "must be positive".to_string(),
                    });
                }
                secs
            }
            None => DEFAULT_TOKEN_TTL_SECS,
        };

        Ok(Self {
            jwt_secret,
            database_url,
            port,
            token_ttl_secs,
        })
    }
}

impl core::fmt::Debug for Config {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Config")
            .field("jwt_secret", &"<redacted>")
            .field("database_url", &"<redacted>")
            .field("port", &self.port)
            .field("token_ttl_secs", &self.token_ttl_secs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_optional_vars_absent() {
        let cfg = load(&[("JWT_SECRET", "s3cret"), ("DATABASE_URL", "postgres://localhost/books")]).unwrap();
        assert_eq!(cfg.port, DEFAULT_PORT);
        assert_eq!(cfg.token_ttl_secs, DEFAULT_TOKEN_TTL_SECS);
    }

    #[test]
    fn missing_secret_is_fatal() {
        let err = load(&[("DATABASE_URL", "postgres://localhost/books")]).unwrap_err();
        assert_eq!(err, ConfigError::Missing("JWT_SECRET"));
    }

    #[test]
    fn blank_database_url_is_missing() {
        let err = load(&[("JWT_SECRET", "s3cret"), ("DATABASE_URL", "  ")]).unwrap_err();
        assert_eq!(err, ConfigError::Missing("DATABASE_URL"));
    }

    #[test]
    fn bad_port_is_invalid() {
        let err = load(&[
            ("JWT_SECRET", "s3cret"),
            ("DATABASE_URL", "postgres://localhost/books"),
            ("PORT", "eighty"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "PORT", .. }));
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let cfg = load(&[("JWT_SECRET", "s3cret"), ("DATABASE_URL", "postgres://u:pw@db/books")]).unwrap();
        let rendered = format!("{cfg:?}");
        assert!(!rendered.contains("s3cret"));
        assert!(!rendered.contains("pw@db"));
    }
}
