mod settings;

pub use settings::{
    BroadcastConfig, CacheConfig, DEFAULT_BROADCAST_EVENT, DEFAULT_CACHE_TTL_SECS, RelaySettings,
    load_settings, load_settings_from_file,
};
