use axum::http::HeaderValue;
use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

/// 10 MiB
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

/// Runtime configuration, read from the environment (and `.env` if present)
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    /// PostgreSQL connection string. Unset means the in-memory store.
    pub database_url: Option<String>,
    pub upload_dir: PathBuf,
    /// Base URL clients use to reach this server, for attachment links
    pub public_url: String,
    pub max_upload_bytes: usize,
    /// Allowed CORS origin. Unset allows any origin.
    pub cors_origin: Option<String>,
    /// Also emit `message_status_updated` for seen transitions
    pub legacy_status_event: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 5000)),
            database_url: None,
            upload_dir: PathBuf::from("./uploads"),
            public_url: "http://localhost:5000".to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            cors_origin: None,
            legacy_status_event: false,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!(path = ?path, "Loaded .env file");
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a config from any variable source; unset variables keep defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let bind_addr = match var("ROOMCHAT_BIND_ADDR") {
            Some(value) => value.parse::<SocketAddr>().map_err(|_| ConfigError::InvalidValue {
                name: "ROOMCHAT_BIND_ADDR",
                value,
            })?,
            None => defaults.bind_addr,
        };

        let max_upload_bytes = match var("ROOMCHAT_MAX_UPLOAD_BYTES") {
            Some(value) => match value.parse::<usize>() {
                Ok(bytes) if bytes > 0 => bytes,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        name: "ROOMCHAT_MAX_UPLOAD_BYTES",
                        value,
                    })
                }
            },
            None => defaults.max_upload_bytes,
        };

        let legacy_status_event = match var("ROOMCHAT_LEGACY_STATUS_EVENT") {
            Some(value) => parse_flag(&value).ok_or(ConfigError::InvalidValue {
                name: "ROOMCHAT_LEGACY_STATUS_EVENT",
                value,
            })?,
            None => defaults.legacy_status_event,
        };

        let cors_origin = match var("ROOMCHAT_CORS_ORIGIN") {
            Some(value) if HeaderValue::from_str(value.trim()).is_ok() => {
                Some(value.trim().to_string())
            }
            Some(value) => {
                return Err(ConfigError::InvalidValue {
                    name: "ROOMCHAT_CORS_ORIGIN",
                    value,
                })
            }
            None => None,
        };

        Ok(Self {
            bind_addr,
            database_url: var("DATABASE_URL"),
            upload_dir: var("ROOMCHAT_UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            public_url: var("ROOMCHAT_PUBLIC_URL").unwrap_or(defaults.public_url),
            max_upload_bytes,
            cors_origin,
            legacy_status_event,
        })
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.bind_addr.port(), 5000);
        assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
        assert!(config.database_url.is_none());
        assert!(!config.legacy_status_event);
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            ("ROOMCHAT_BIND_ADDR", "127.0.0.1:8080"),
            ("DATABASE_URL", "postgres://localhost/chat"),
            ("ROOMCHAT_MAX_UPLOAD_BYTES", "1024"),
            ("ROOMCHAT_LEGACY_STATUS_EVENT", "yes"),
            ("ROOMCHAT_CORS_ORIGIN", "https://chat.example"),
        ]))
        .unwrap();

        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/chat"));
        assert_eq!(config.max_upload_bytes, 1024);
        assert!(config.legacy_status_event);
        assert_eq!(config.cors_origin.as_deref(), Some("https://chat.example"));
    }

    #[test]
    fn test_blank_values_fall_back_to_defaults() {
        let config = AppConfig::from_lookup(lookup(&[("DATABASE_URL", "  ")])).unwrap();
        assert!(config.database_url.is_none());
    }

    #[rstest]
    #[case("ROOMCHAT_BIND_ADDR", "not-an-addr")]
    #[case("ROOMCHAT_MAX_UPLOAD_BYTES", "0")]
    #[case("ROOMCHAT_MAX_UPLOAD_BYTES", "ten")]
    #[case("ROOMCHAT_LEGACY_STATUS_EVENT", "maybe")]
    #[case("ROOMCHAT_CORS_ORIGIN", "https://bad\norigin")]
    fn test_invalid_values_are_rejected(#[case] name: &str, #[case] value: &str) {
        let result = AppConfig::from_lookup(lookup(&[(name, value)]));
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }
}
