use crate::error::{RelayError, Result};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_BROADCAST_EVENT: &str = "watch.messages";
pub const DEFAULT_CACHE_TTL_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelaySettings {
    pub broadcast: BroadcastConfig,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastConfig {
    /// Database-level change notification is running and will emit the
    /// broadcast itself, so the relay must stay silent.
    pub change_notification_active: bool,
    pub event_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    pub ttl_secs: u64,
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            broadcast: BroadcastConfig {
                change_notification_active: true,
                event_name: DEFAULT_BROADCAST_EVENT.to_string(),
            },
            cache: CacheConfig {
                ttl_secs: DEFAULT_CACHE_TTL_SECS,
            },
        }
    }
}

/// Load settings from the process environment (after reading `.env` if present)
pub fn load_settings() -> Result<RelaySettings> {
    dotenvy::dotenv().ok();
    settings_from_lookup(|key| std::env::var(key).ok())
}

/// Load settings from a `.env` style file without touching the process environment
pub fn load_settings_from_file(path: impl AsRef<Path>) -> Result<RelaySettings> {
    let path = path.as_ref();
    let iter = dotenvy::from_path_iter(path).map_err(|e| {
        RelayError::Config(format!("Cannot read {}: {}", path.display(), e))
    })?;

    let mut vars = HashMap::new();
    for item in iter {
        let (key, value) = item.map_err(|e| {
            RelayError::Config(format!("Invalid entry in {}: {}", path.display(), e))
        })?;
        vars.insert(key, value);
    }

    settings_from_lookup(|key| vars.get(key).cloned())
}

fn settings_from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<RelaySettings> {
    let watchers_disabled = parse_bool(
        "DISABLE_DB_WATCHERS",
        &lookup("DISABLE_DB_WATCHERS").unwrap_or_else(|| "false".to_string()),
    )?;

    let broadcast = BroadcastConfig {
        change_notification_active: !watchers_disabled,
        event_name: lookup("BROADCAST_EVENT_NAME")
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BROADCAST_EVENT.to_string()),
    };

    let ttl_secs: u64 = lookup("RELAY_CACHE_TTL_SECS")
        .unwrap_or_else(|| DEFAULT_CACHE_TTL_SECS.to_string())
        .parse()
        .map_err(|_| RelayError::Config("Invalid RELAY_CACHE_TTL_SECS".to_string()))?;
    if ttl_secs == 0 {
        return Err(RelayError::Config(
            "RELAY_CACHE_TTL_SECS must be greater than zero".to_string(),
        ));
    }

    Ok(RelaySettings {
        broadcast,
        cache: CacheConfig { ttl_secs },
    })
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(RelayError::Config(format!("Invalid {}", key))),
    }
}
