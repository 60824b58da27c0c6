//! Runtime settings.
//!
//! Read from the environment (a `.env` file is loaded by the binary through
//! `dotenvy`). Every variable is optional; unset variables fall back to the
//! defaults below, malformed ones are a [`ConfigError`].

use std::env;
use std::str::FromStr;

use crate::error::ConfigError;

/// HTTP port.
pub const DEFAULT_PORT: u16 = 3000;

/// Largest accepted upload (10 MB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Largest accepted import, in data rows.
pub const DEFAULT_MAX_IMPORT_ROWS: usize = 10_000;

/// Buffered log entries per SSE subscriber.
pub const DEFAULT_LOG_CAPACITY: usize = 100;

/// Server and engine settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub port: u16,
    pub max_upload_bytes: usize,
    pub max_import_rows: usize,
    pub log_capacity: usize,
    pub log_json: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            max_import_rows: DEFAULT_MAX_IMPORT_ROWS,
            log_capacity: DEFAULT_LOG_CAPACITY,
            log_json: false,
        }
    }
}

impl Settings {
    /// Load settings from `PHARMPLUS_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load settings through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Ok(Self {
            port: read(&lookup, "PHARMPLUS_PORT", defaults.port)?,
            max_upload_bytes: read(&lookup, "PHARMPLUS_MAX_UPLOAD_BYTES", defaults.max_upload_bytes)?,
            max_import_rows: read(&lookup, "PHARMPLUS_MAX_IMPORT_ROWS", defaults.max_import_rows)?,
            log_capacity: read(&lookup, "PHARMPLUS_LOG_CAPACITY", defaults.log_capacity)?,
            log_json: read(&lookup, "PHARMPLUS_LOG_JSON", defaults.log_json)?,
        })
    }
}

fn read<T, F>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) if raw.trim().is_empty() => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.max_upload_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn test_overrides() {
        let settings = Settings::from_lookup(lookup(&[
            ("PHARMPLUS_PORT", "8080"),
            ("PHARMPLUS_MAX_IMPORT_ROWS", " 50 "),
            ("PHARMPLUS_LOG_JSON", "true"),
        ]))
        .unwrap();

        assert_eq!(settings.port, 8080);
        assert_eq!(settings.max_import_rows, 50);
        assert!(settings.log_json);
    }

    #[test]
    fn test_invalid_value() {
        let err = Settings::from_lookup(lookup(&[("PHARMPLUS_PORT", "http")])).unwrap_err();
        assert!(err.to_string().contains("PHARMPLUS_PORT"));
    }
}
