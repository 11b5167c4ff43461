use std::net::SocketAddr;

use thiserror::Error;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://officehours.db?mode=rwc";
pub const DEFAULT_BIND: &str = "127.0.0.1:7870";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} is not a valid socket address: {value}")]
    InvalidBind { name: &'static str, value: String },
    #[error("{name} must be a positive integer, got {value}")]
    InvalidMaxConnections { name: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database_url: String,
    pub bind: SocketAddr,
    pub max_connections: u32,
}

impl Config {
    /// Reads `OFFICEHOURS_*` variables from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("OFFICEHOURS_DATABASE_URL")
            .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        let bind_raw = lookup("OFFICEHOURS_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind_raw.parse().map_err(|_| ConfigError::InvalidBind {
            name: "OFFICEHOURS_BIND",
            value: bind_raw.clone(),
        })?;

        let max_connections = match lookup("OFFICEHOURS_MAX_CONNECTIONS") {
            None => DEFAULT_MAX_CONNECTIONS,
            Some(raw) => match raw.parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::InvalidMaxConnections {
                        name: "OFFICEHOURS_MAX_CONNECTIONS",
                        value: raw,
                    })
                }
            },
        };

        Ok(Self {
            database_url,
            bind,
            max_connections,
        })
    }
}
