use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use thiserror::Error;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DATABASE: &str = "memo.db";
const DEFAULT_PUBLIC_DIR: &str = "public";
const DEFAULT_CORS_ORIGIN: &str = "http://localhost:5173";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} is not a valid port: {value:?}")]
    Port { name: &'static str, value: String },
    #[error("{name} is not a valid address: {value:?}")]
    Host { name: &'static str, value: String },
}

/// Server settings, read from `MEMO_*` environment variables.
#[derive(Debug, Clone)]
pub struct Settings {
    pub host: IpAddr,
    pub port: u16,
    pub database: PathBuf,
    pub public_dir: PathBuf,
    pub cors_origin: String,
    pub base_path: String,
}

impl Settings {
    /// Load a `.env` file if there is one, then read the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host = match lookup("MEMO_HOST") {
            Some(value) => value.parse().map_err(|_| ConfigError::Host {
                name: "MEMO_HOST",
                value,
            })?,
            None => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        };

        let port = match lookup("MEMO_PORT") {
            Some(value) => value.parse().map_err(|_| ConfigError::Port {
                name: "MEMO_PORT",
                value,
            })?,
            None => DEFAULT_PORT,
        };

        Ok(Settings {
            host,
            port,
            database: lookup("MEMO_DATABASE")
                .unwrap_or_else(|| DEFAULT_DATABASE.to_string())
                .into(),
            public_dir: lookup("MEMO_PUBLIC_DIR")
                .unwrap_or_else(|| DEFAULT_PUBLIC_DIR.to_string())
                .into(),
            cors_origin: lookup("MEMO_CORS_ORIGIN")
                .unwrap_or_else(|| DEFAULT_CORS_ORIGIN.to_string()),
            base_path: lookup("MEMO_BASE_PATH")
                .map(|path| normalize_base_path(&path))
                .unwrap_or_default(),
        })
    }
}

/// Leading slash, no trailing slash; `/` alone means no prefix.
pub fn normalize_base_path(path: &str) -> String {
    let path = path.trim().trim_end_matches('/');
    if path.is_empty() {
        String::new()
    } else if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}
