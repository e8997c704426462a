use std::env;
use std::path::PathBuf;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub catalog_path: Option<PathBuf>,
    pub catalog_refresh_secs: u64,
    pub query_timeout_ms: u64,
    pub substitutes_enabled: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", 3000)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            catalog_path: env::var("CATALOG_PATH").ok().map(PathBuf::from),
            catalog_refresh_secs: parse_or_default("CATALOG_REFRESH_SECS", 0)?,
            query_timeout_ms: parse_or_default("QUERY_TIMEOUT_MS", 2000)?,
            substitutes_enabled: parse_or_default("SUBSTITUTES_ENABLED", true)?,
        })
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}
