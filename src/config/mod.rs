//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Allowed client origins for CORS (comma-separated, `*` for any)
    pub client_origin: String,
    /// Directory holding the client application
    pub static_dir: PathBuf,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Hosting platforms provide PORT, fall back to SERVER_ADDR or default
        let server_addr = match lookup("PORT") {
            Some(port) => format!("0.0.0.0:{}", port),
            None => lookup("SERVER_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
        };

        Ok(Self {
            server_addr: server_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress(server_addr.clone()))?,

            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),

            client_origin: lookup("CLIENT_ORIGIN").unwrap_or_else(|| "*".to_string()),

            static_dir: lookup("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("public")),
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid server address format: {0}")]
    InvalidAddress(String),
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = tokio_test::assert_ok!(Config::from_lookup(lookup_from(&[])));
        assert_eq!(config.server_addr, "0.0.0.0:3000".parse().unwrap());
        assert_eq!(config.log_level, "info");
        assert_eq!(config.client_origin, "*");
        assert_eq!(config.static_dir, PathBuf::from("public"));
    }

    #[test]
    fn port_takes_precedence_over_server_addr() {
        let config = Config::from_lookup(lookup_from(&[
            ("PORT", "4100"),
            ("SERVER_ADDR", "127.0.0.1:9000"),
        ]))
        .unwrap();
        assert_eq!(config.server_addr, "0.0.0.0:4100".parse().unwrap());
    }

    #[test]
    fn server_addr_is_used_without_port() {
        let config =
            Config::from_lookup(lookup_from(&[("SERVER_ADDR", "127.0.0.1:9000")])).unwrap();
        assert_eq!(config.server_addr, "127.0.0.1:9000".parse().unwrap());
    }

    #[test]
    fn rejects_malformed_address() {
        let err = tokio_test::assert_err!(Config::from_lookup(lookup_from(&[(
            "PORT",
            "not-a-port"
        )])));
        assert!(matches!(err, ConfigError::InvalidAddress(addr) if addr == "0.0.0.0:not-a-port"));
    }
}
