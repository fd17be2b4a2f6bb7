//! Runtime settings read from the environment.
//!
//! A `.env` file in the working directory is loaded by the binary before any
//! of these are read.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use axum::http::HeaderValue;

use crate::error::ConfigError;

pub const DEFAULT_PORT: u16 = 5001;
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:5173";
pub const DEFAULT_API_URL: &str = "http://localhost:5001/api";
pub const DEFAULT_CACHE_PATH: &str = "tasks.json";
pub const DEFAULT_LOG_PATH: &str = "tasktrack.log";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub address: SocketAddr,
    pub cors_origin: HeaderValue,
    pub seed_samples: bool,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from any variable source; `from_env` passes the
    /// process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = match lookup("PORT") {
            Some(value) => value.trim().parse::<u16>().map_err(|_| ConfigError::InvalidValue {
                name: "PORT",
                value,
            })?,
            None => DEFAULT_PORT,
        };
        let address = format!("{host}:{port}")
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidValue {
                name: "HOST",
                value: host,
            })?;

        let origin =
            lookup("TASKTRACK_CORS_ORIGIN").unwrap_or_else(|| DEFAULT_CORS_ORIGIN.to_string());
        let cors_origin = HeaderValue::from_str(&origin).map_err(|_| ConfigError::InvalidValue {
            name: "TASKTRACK_CORS_ORIGIN",
            value: origin,
        })?;

        let seed_samples = match lookup("TASKTRACK_SEED_SAMPLES") {
            Some(value) => parse_flag(&value).ok_or(ConfigError::InvalidValue {
                name: "TASKTRACK_SEED_SAMPLES",
                value,
            })?,
            None => true,
        };

        Ok(Self {
            address,
            cors_origin,
            seed_samples,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_url: String,
    pub cache_path: PathBuf,
    pub log_path: PathBuf,
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let api_url = lookup("TASKTRACK_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            cache_path: lookup("TASKTRACK_CACHE_PATH")
                .unwrap_or_else(|| DEFAULT_CACHE_PATH.to_string())
                .into(),
            log_path: lookup("TASKTRACK_LOG_PATH")
                .unwrap_or_else(|| DEFAULT_LOG_PATH.to_string())
                .into(),
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn server_defaults() {
        let config = ServerConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.address.port(), DEFAULT_PORT);
        assert_eq!(config.cors_origin, DEFAULT_CORS_ORIGIN);
        assert!(config.seed_samples);
    }

    #[test]
    fn server_overrides() {
        let config = ServerConfig::from_lookup(lookup_from(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "8080"),
            ("TASKTRACK_SEED_SAMPLES", "no"),
        ]))
        .unwrap();
        assert_eq!(config.address.to_string(), "127.0.0.1:8080");
        assert!(!config.seed_samples);
    }

    #[rstest]
    #[case("PORT", "eighty")]
    #[case("HOST", "not a host")]
    #[case("TASKTRACK_SEED_SAMPLES", "maybe")]
    #[case("TASKTRACK_CORS_ORIGIN", "bad\norigin")]
    fn server_rejects_invalid_values(#[case] name: &str, #[case] value: &str) {
        let error = ServerConfig::from_lookup(lookup_from(&[(name, value)])).unwrap_err();
        let ConfigError::InvalidValue { name: reported, .. } = error;
        assert_eq!(reported, name);
    }

    #[test]
    fn client_trims_trailing_slash() {
        let config = ClientConfig::from_lookup(lookup_from(&[(
            "TASKTRACK_API_URL",
            "http://example.test/api/",
        )]));
        assert_eq!(config.api_url, "http://example.test/api");
        assert_eq!(config.cache_path, PathBuf::from(DEFAULT_CACHE_PATH));
    }
}
