// ABOUTME: Server configuration loaded from QUADBASE_* environment variables
// ABOUTME: Applies defaults under the data directory and rejects malformed values

use quadbase_config as keys;
use quadbase_core::constants::{
    default_database_path, default_media_dir, DEFAULT_MAX_UPLOAD_BYTES,
};
use std::env;
use std::net::IpAddr;
use std::num::ParseIntError;
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 4100;
pub const DEFAULT_HOST: &str = "127.0.0.1";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid port number: {0}")]
    InvalidPort(#[from] ParseIntError),
    #[error("Port {0} is out of valid range (1-65535)")]
    PortOutOfRange(u16),
    #[error("Invalid host address: {0}")]
    InvalidHost(String),
    #[error("Invalid upload limit: {0}")]
    InvalidUploadLimit(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub database_path: PathBuf,
    pub media_dir: PathBuf,
    /// Allowed browser origin; `None` disables cross-origin access.
    pub cors_origin: Option<String>,
    pub max_upload_bytes: usize,
}

impl Config {
    /// Read configuration from the process environment (after `.env`).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_source(|key| env::var(key).ok())
    }

    /// Build a configuration from any key lookup.
    pub fn from_source<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let port = match read(keys::QUADBASE_PORT).or_else(|| read(keys::PORT)) {
            Some(raw) => raw.parse::<u16>()?,
            None => DEFAULT_PORT,
        };
        if port == 0 {
            return Err(ConfigError::PortOutOfRange(port));
        }

        let host_raw = read(keys::QUADBASE_HOST).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let host = host_raw
            .parse::<IpAddr>()
            .map_err(|_| ConfigError::InvalidHost(host_raw.clone()))?;

        let max_upload_bytes = match read(keys::QUADBASE_MAX_UPLOAD_BYTES) {
            Some(raw) => match raw.parse::<usize>() {
                Ok(bytes) if bytes > 0 => bytes,
                _ => return Err(ConfigError::InvalidUploadLimit(raw)),
            },
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };

        Ok(Config {
            host,
            port,
            database_path: read(keys::QUADBASE_DATABASE_PATH)
                .map(PathBuf::from)
                .unwrap_or_else(default_database_path),
            media_dir: read(keys::QUADBASE_MEDIA_DIR)
                .map(PathBuf::from)
                .unwrap_or_else(default_media_dir),
            cors_origin: read(keys::QUADBASE_CORS_ORIGIN),
            max_upload_bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_source(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.host.to_string(), DEFAULT_HOST);
        assert_eq!(config.database_path, default_database_path());
        assert_eq!(config.media_dir, default_media_dir());
        assert_eq!(config.cors_origin, None);
        assert_eq!(config.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
    }

    #[test]
    fn test_custom_values() {
        let config = config_from(&[
            ("QUADBASE_PORT", "8080"),
            ("QUADBASE_HOST", "0.0.0.0"),
            ("QUADBASE_DATABASE_PATH", "/srv/quadbase/db.sqlite"),
            ("QUADBASE_MEDIA_DIR", "/srv/quadbase/media"),
            ("QUADBASE_CORS_ORIGIN", "https://quadbase.example"),
            ("QUADBASE_MAX_UPLOAD_BYTES", "2048"),
        ])
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.host.to_string(), "0.0.0.0");
        assert_eq!(config.database_path, PathBuf::from("/srv/quadbase/db.sqlite"));
        assert_eq!(config.media_dir, PathBuf::from("/srv/quadbase/media"));
        assert_eq!(
            config.cors_origin.as_deref(),
            Some("https://quadbase.example")
        );
        assert_eq!(config.max_upload_bytes, 2048);
    }

    #[test]
    fn test_legacy_port_is_fallback() {
        let config = config_from(&[("PORT", "5000")]).unwrap();
        assert_eq!(config.port, 5000);

        let config = config_from(&[("PORT", "5000"), ("QUADBASE_PORT", "6000")]).unwrap();
        assert_eq!(config.port, 6000);
    }

    #[rstest]
    #[case("QUADBASE_PORT", "not-a-number")]
    #[case("QUADBASE_PORT", "70000")]
    #[case("QUADBASE_PORT", "0")]
    #[case("QUADBASE_HOST", "localhost:80")]
    #[case("QUADBASE_MAX_UPLOAD_BYTES", "0")]
    #[case("QUADBASE_MAX_UPLOAD_BYTES", "ten")]
    fn test_invalid_values_rejected(#[case] key: &str, #[case] value: &str) {
        assert!(config_from(&[(key, value)]).is_err());
    }

    #[test]
    fn test_blank_values_use_defaults() {
        let config = config_from(&[("QUADBASE_CORS_ORIGIN", "  "), ("QUADBASE_PORT", "")]).unwrap();
        assert_eq!(config.cors_origin, None);
        assert_eq!(config.port, DEFAULT_PORT);
    }
}
