//! Read-through cached access to the settings the relay depends on

use crate::cache::TtlCache;
use crate::error::Result;
use crate::store::SettingsStore;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Setting holding the list of system message types hidden from clients
pub const HIDE_SYSTEM_MESSAGES: &str = "Hide_System_Messages";

/// Setting that swaps usernames for real names in broadcast payloads
pub const USE_REAL_NAME: &str = "UI_Use_Real_Name";

/// Settings values memoized for one cache window, so they are eventually
/// consistent with the store.
pub struct CachedSettings {
    values: TtlCache<String, Option<Value>>,
}

impl CachedSettings {
    pub fn new(store: Arc<dyn SettingsStore>, ttl: Duration) -> Self {
        let values = TtlCache::with_ttl("settings", ttl, move |setting_id: String| {
            let store = Arc::clone(&store);
            async move { store.get_value_by_id(&setting_id).await }
        });

        Self { values }
    }

    pub async fn value(&self, setting_id: &str) -> Result<Option<Value>> {
        self.values.get(setting_id.to_string()).await
    }

    /// System message types that must not reach clients.
    ///
    /// Anything other than a list of strings counts as an empty list.
    pub async fn hidden_system_message_types(&self) -> Result<Vec<String>> {
        let types = match self.value(HIDE_SYSTEM_MESSAGES).await? {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect(),
            Some(Value::Null) | None => Vec::new(),
            Some(other) => {
                tracing::warn!(
                    setting = HIDE_SYSTEM_MESSAGES,
                    value = %other,
                    "Unexpected setting value, treating as empty list"
                );
                Vec::new()
            }
        };
        Ok(types)
    }

    /// Only the JSON boolean `true` enables real names.
    pub async fn use_real_name(&self) -> Result<bool> {
        Ok(matches!(
            self.value(USE_REAL_NAME).await?,
            Some(Value::Bool(true))
        ))
    }

    pub fn cache(&self) -> &TtlCache<String, Option<Value>> {
        &self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::DEFAULT_TTL;
    use crate::store::InMemorySettingsStore;
    use serde_json::json;

    fn settings_with(values: &[(&str, Value)]) -> (Arc<InMemorySettingsStore>, CachedSettings) {
        let store = Arc::new(InMemorySettingsStore::new());
        for (id, value) in values {
            store.set(*id, value.clone());
        }
        let cached = CachedSettings::new(store.clone(), DEFAULT_TTL);
        (store, cached)
    }

    #[tokio::test]
    async fn test_hidden_types_list() {
        let (_, settings) = settings_with(&[(HIDE_SYSTEM_MESSAGES, json!(["au", "ru", 3, null]))]);

        assert_eq!(
            settings.hidden_system_message_types().await.unwrap(),
            vec!["au".to_string(), "ru".to_string()]
        );
    }

    #[tokio::test]
    async fn test_hidden_types_fallbacks() {
        let (_, settings) = settings_with(&[]);
        assert!(settings.hidden_system_message_types().await.unwrap().is_empty());

        let (_, settings) = settings_with(&[(HIDE_SYSTEM_MESSAGES, json!("au"))]);
        assert!(settings.hidden_system_message_types().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_use_real_name_requires_true() {
        let (_, settings) = settings_with(&[(USE_REAL_NAME, json!(true))]);
        assert!(settings.use_real_name().await.unwrap());

        let (_, settings) = settings_with(&[(USE_REAL_NAME, json!("true"))]);
        assert!(!settings.use_real_name().await.unwrap());

        let (_, settings) = settings_with(&[(USE_REAL_NAME, json!(1))]);
        assert!(!settings.use_real_name().await.unwrap());

        let (_, settings) = settings_with(&[]);
        assert!(!settings.use_real_name().await.unwrap());
    }

    #[tokio::test]
    async fn test_values_are_memoized() {
        let (store, settings) = settings_with(&[(USE_REAL_NAME, json!(true))]);

        for _ in 0..5 {
            assert!(settings.use_real_name().await.unwrap());
        }
        assert_eq!(store.lookup_count(), 1);

        // Store changes are not visible until the window elapses
        store.set(USE_REAL_NAME, json!(false));
        assert!(settings.use_real_name().await.unwrap());
    }
}
