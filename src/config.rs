//! Configuration types.

use std::time::Duration;

use crate::error::ConfigError;
use crate::mail::gmail::GMAIL_API_BASE;

/// Default HTTP listen port.
const DEFAULT_PORT: u16 = 8888;

/// Search parameters for a single scan.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Trailing window in days (`newer_than:Nd`).
    pub window_days: u32,
    /// Maximum number of message ids requested from the provider.
    pub max_results: u32,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            window_days: 7,
            max_results: 50,
        }
    }
}

/// Server configuration, built from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    pub gmail_api_base: String,
    pub http_timeout: Duration,
    /// OAuth client id embedded in the browser page. Empty disables sign-in.
    pub google_client_id: String,
    pub scan: ScanConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            gmail_api_base: GMAIL_API_BASE.to_string(),
            http_timeout: Duration::from_secs(30),
            google_client_id: String::new(),
            scan: ScanConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Build config from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let port = parse_or(&lookup, "DISPATCH_PORT", defaults.port)?;
        let window_days = parse_or(&lookup, "DISPATCH_SCAN_WINDOW_DAYS", defaults.scan.window_days)?;
        let max_results = parse_or(&lookup, "DISPATCH_SCAN_MAX_RESULTS", defaults.scan.max_results)?;
        let timeout_secs = parse_or(
            &lookup,
            "DISPATCH_HTTP_TIMEOUT_SECS",
            defaults.http_timeout.as_secs(),
        )?;

        // Gmail rejects maxResults above 500.
        if !(1..=500).contains(&max_results) {
            return Err(ConfigError::InvalidValue {
                key: "DISPATCH_SCAN_MAX_RESULTS".into(),
                message: format!("{max_results} is outside 1..=500"),
            });
        }
        if window_days == 0 {
            return Err(ConfigError::InvalidValue {
                key: "DISPATCH_SCAN_WINDOW_DAYS".into(),
                message: "must be at least 1".into(),
            });
        }

        Ok(Self {
            bind: lookup("DISPATCH_BIND").unwrap_or(defaults.bind),
            port,
            gmail_api_base: lookup("DISPATCH_GMAIL_API_BASE")
                .map(|s| s.trim_end_matches('/').to_string())
                .unwrap_or(defaults.gmail_api_base),
            http_timeout: Duration::from_secs(timeout_secs),
            google_client_id: lookup("GOOGLE_CLIENT_ID").unwrap_or_default(),
            scan: ScanConfig {
                window_days,
                max_results,
            },
        })
    }

    /// Socket address string for the listener.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("{raw:?}: {e}"),
        }),
    }
}
