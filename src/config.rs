//! Server configuration, read from the environment.

use std::path::PathBuf;

use tracing::warn;

use crate::error::{ConfigError, Result};

/// Runtime settings for the HTTP server and its store.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Interface to bind.
    pub host: String,
    /// TCP port to listen on.
    pub port: u16,
    /// SQLite database file.
    pub db_path: PathBuf,
    /// Jobs per dashboard page.
    pub page_size: usize,
    /// Directory served under `/static`.
    pub static_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            db_path: PathBuf::from("./data/work-hours.db"),
            page_size: 10,
            static_dir: PathBuf::from("./static"),
        }
    }
}

impl ServerConfig {
    /// Build the configuration from `WORK_HOURS_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    ///
    /// Unparseable numbers fall back to their defaults with a warning.
    /// A page size of zero is rejected outright.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let host = lookup("WORK_HOURS_HOST").unwrap_or(defaults.host);
        let port = parse_or_default(&lookup, "WORK_HOURS_PORT", defaults.port);
        let db_path = lookup("WORK_HOURS_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.db_path);
        let page_size = parse_or_default(&lookup, "WORK_HOURS_PAGE_SIZE", defaults.page_size);
        let static_dir = lookup("WORK_HOURS_STATIC_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.static_dir);

        if page_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "WORK_HOURS_PAGE_SIZE".to_string(),
                message: "page size must be at least 1".to_string(),
            }
            .into());
        }

        Ok(Self {
            host,
            port,
            db_path,
            page_size,
            static_dir,
        })
    }

    /// `host:port` string suitable for `TcpListener::bind`.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or_default<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy + std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, fallback = %default, "Ignoring invalid numeric setting");
            default
        }),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::error::Error;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = ServerConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.port, 8000);
        assert_eq!(config.page_size, 10);
        assert_eq!(config.bind_addr(), "0.0.0.0:8000");
        assert_eq!(config.db_path, PathBuf::from("./data/work-hours.db"));
    }

    #[test]
    fn reads_overrides() {
        let config = ServerConfig::from_lookup(lookup_from(&[
            ("WORK_HOURS_HOST", "127.0.0.1"),
            ("WORK_HOURS_PORT", "9100"),
            ("WORK_HOURS_DB_PATH", "/tmp/hours.db"),
            ("WORK_HOURS_PAGE_SIZE", "25"),
        ]))
        .unwrap();
        assert_eq!(config.bind_addr(), "127.0.0.1:9100");
        assert_eq!(config.db_path, PathBuf::from("/tmp/hours.db"));
        assert_eq!(config.page_size, 25);
    }

    #[test]
    fn invalid_port_falls_back() {
        let config =
            ServerConfig::from_lookup(lookup_from(&[("WORK_HOURS_PORT", "not-a-port")])).unwrap();
        assert_eq!(config.port, 8000);
    }

    #[test]
    fn zero_page_size_rejected() {
        let err = ServerConfig::from_lookup(lookup_from(&[("WORK_HOURS_PAGE_SIZE", "0")]))
            .unwrap_err();
        assert!(matches!(
            &err,
            Error::Config(ConfigError::InvalidValue { key, .. }) if key == "WORK_HOURS_PAGE_SIZE"
        ));
        assert!(err.to_string().starts_with("Configuration error: "));
    }
}
