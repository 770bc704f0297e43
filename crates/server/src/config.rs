use std::{fmt::Display, net::IpAddr, str::FromStr, sync::Arc};

use secrecy::SecretString;
use thiserror::Error;
use tracing::{info, warn};

pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_DATABASE_URL: &str = "sqlite://invoicez.db";
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 3600;
const DEV_JWT_SECRET: &str = "invoicez-dev-secret";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {key} value {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: Arc<SecretString>,
    pub token_ttl_secs: i64,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let jwt_secret = match get("JWT_SECRET") {
            Some(secret) => secret,
            None => {
                warn!("JWT_SECRET not set, using the development secret");
                DEV_JWT_SECRET.to_string()
            }
        };
        let token_ttl_secs = parse("TOKEN_TTL_SECS", get("TOKEN_TTL_SECS"), DEFAULT_TOKEN_TTL_SECS)?;
        if token_ttl_secs <= 0 {
            return Err(ConfigError::Invalid {
                key: "TOKEN_TTL_SECS",
                value: token_ttl_secs.to_string(),
                reason: "must be positive".to_string(),
            });
        }

        Ok(Self {
            host: parse("HOST", get("HOST"), IpAddr::from([0, 0, 0, 0]))?,
            port: parse("PORT", get("PORT"), DEFAULT_PORT)?,
            database_url: get("DATABASE_URL").unwrap_or_else(|| {
                info!("DATABASE_URL not set, using default: {DEFAULT_DATABASE_URL}");
                DEFAULT_DATABASE_URL.to_string()
            }),
            jwt_secret: Arc::new(SecretString::from(jwt_secret)),
            token_ttl_secs,
        })
    }
}

fn parse<T>(key: &'static str, value: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match value {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
            value: raw,
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = load(&[]).unwrap();
        assert_eq!(config.port, 3001);
        assert_eq!(config.host.to_string(), "0.0.0.0");
        assert_eq!(config.database_url, "sqlite://invoicez.db");
        assert_eq!(config.token_ttl_secs, 3600);
        assert_eq!(config.jwt_secret.expose_secret(), DEV_JWT_SECRET);
    }

    #[test]
    fn values_are_read_and_validated() {
        let config = load(&[
            ("PORT", "8080"),
            ("HOST", "127.0.0.1"),
            ("JWT_SECRET", "s3cret"),
            ("DATABASE_URL", "sqlite::memory:"),
            ("TOKEN_TTL_SECS", " "),
        ])
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.jwt_secret.expose_secret(), "s3cret");
        assert_eq!(config.token_ttl_secs, 3600);

        assert!(matches!(
            load(&[("PORT", "abc")]),
            Err(ConfigError::Invalid { key: "PORT", .. })
        ));
        assert!(matches!(
            load(&[("TOKEN_TTL_SECS", "0")]),
            Err(ConfigError::Invalid { key: "TOKEN_TTL_SECS", .. })
        ));
    }
}
