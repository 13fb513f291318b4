use std::{env, fmt::Display, str::FromStr};

use tracing::{info, warn};

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_ADMIN_TOKEN: &str = "admin";

/// Runtime settings for the mock backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    /// Shared secret expected as `Authorization: Bearer <token>` on admin
    /// routes. Test fixture only.
    pub admin_token: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            admin_token: DEFAULT_ADMIN_TOKEN.to_string(),
        }
    }
}

impl Config {
    pub fn load() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            port: try_load(&lookup, "PORT", DEFAULT_PORT),
            admin_token: try_load(&lookup, "ADMIN_TOKEN", DEFAULT_ADMIN_TOKEN.to_string()),
        }
    }
}

fn try_load<T, F>(lookup: &F, key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        info!("{key} not set, using default: {default}");
        return default;
    };
    raw.trim().parse().unwrap_or_else(|e| {
        warn!("Invalid {key} value: {e}, using default: {default}");
        default
    })
}
