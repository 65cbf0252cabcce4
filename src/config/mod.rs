//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::game::arena::{ArenaError, StaticArena};

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Allowed client origins for CORS; empty allows any
    pub client_origins: Vec<String>,
    /// Arena file; the built-in duel arena when unset
    pub arena_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        // Hosting platforms provide PORT, fall back to SERVER_ADDR or default
        let server_addr = match lookup("PORT") {
            Some(port) => format!("0.0.0.0:{}", port),
            None => lookup("SERVER_ADDR").unwrap_or_else(|| "0.0.0.0:8080".to_string()),
        };

        let client_origins = lookup("CLIENT_ORIGIN")
            .map(|origins| {
                origins
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            server_addr: server_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress(server_addr.clone()))?,
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            client_origins,
            arena_path: lookup("ARENA_PATH").map(PathBuf::from),
        })
    }

    /// Load the configured arena
    pub fn load_arena(&self) -> Result<StaticArena, ConfigError> {
        match &self.arena_path {
            Some(path) => Ok(StaticArena::load(path)?),
            None => Ok(StaticArena::duel()),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid server address: {0}")]
    InvalidAddress(String),

    #[error("Invalid arena: {0}")]
    Arena(#[from] ArenaError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.server_addr, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(cfg.log_level, "info");
        assert!(cfg.client_origins.is_empty());
        assert!(cfg.arena_path.is_none());
        assert_eq!(cfg.load_arena().unwrap().width(), 16);
    }

    #[test]
    fn port_wins_over_server_addr() {
        let cfg = config(&[("PORT", "9000"), ("SERVER_ADDR", "127.0.0.1:1")]).unwrap();
        assert_eq!(cfg.server_addr.port(), 9000);
    }

    #[test]
    fn origins_are_split_and_trimmed() {
        let cfg = config(&[("CLIENT_ORIGIN", "http://a.test, http://b.test,")]).unwrap();
        assert_eq!(cfg.client_origins, vec!["http://a.test", "http://b.test"]);
    }

    #[test]
    fn bad_address_is_an_error() {
        assert!(matches!(
            config(&[("SERVER_ADDR", "nowhere")]),
            Err(ConfigError::InvalidAddress(_))
        ));
    }

    #[test]
    fn missing_arena_file_is_an_error() {
        let cfg = config(&[("ARENA_PATH", "/definitely/not/here.json")]).unwrap();
        assert!(matches!(cfg.load_arena(), Err(ConfigError::Arena(ArenaError::Io { .. }))));
    }
}
