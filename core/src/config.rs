//! Client configuration resolved from the environment.

use std::env;

use tracing::{debug, info};

/// Environment variable overriding the backend base URL.
pub const BASE_URL_ENV: &str = "CATALOG_API_URL";

/// Local development backend.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Read `CATALOG_API_URL`, falling back to `DEFAULT_BASE_URL`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same resolution as `from_env`, over an injected lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        match lookup(BASE_URL_ENV).filter(|v| !v.trim().is_empty()) {
            Some(url) => {
                debug!("{BASE_URL_ENV} set, using {url}");
                Self::new(url.trim())
            }
            None => {
                info!("{BASE_URL_ENV} not set, using default: {DEFAULT_BASE_URL}");
                Self::new(DEFAULT_BASE_URL)
            }
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}
