//! Real-name enrichment for message authors and mentions

use crate::cache::TtlCache;
use crate::error::Result;
use crate::model::{Message, UserId, UserRef};
use crate::relay::CachedSettings;
use crate::store::UserStore;
use std::sync::Arc;
use std::time::Duration;

/// Rewrites display names on a message when `UI_Use_Real_Name` is on.
///
/// One user-name cache lives for the lifetime of the enricher, so a user
/// resolved for one message is not fetched again for the next within the window.
pub struct NameEnricher {
    settings: Arc<CachedSettings>,
    user_names: TtlCache<UserId, Option<String>>,
}

impl NameEnricher {
    pub fn new(settings: Arc<CachedSettings>, users: Arc<dyn UserStore>, ttl: Duration) -> Self {
        let user_names = TtlCache::with_ttl("user_names", ttl, move |user_id: UserId| {
            let users = Arc::clone(&users);
            async move { users.find_name(&user_id).await }
        });

        Self {
            settings,
            user_names,
        }
    }

    /// Display name for `user_id`, memoized; `None` for unknown or unnamed users
    pub async fn user_name(&self, user_id: &UserId) -> Result<Option<String>> {
        self.user_names.get(user_id.clone()).await
    }

    /// Apply real names in place if the setting is enabled
    pub async fn enrich(&self, message: &mut Message) -> Result<()> {
        if !self.settings.use_real_name().await? {
            return Ok(());
        }

        self.apply_real_names(message).await
    }

    /// Overwrite author and mention names with the users' current names.
    ///
    /// Mentions are processed one by one in their original order; a user that
    /// cannot be resolved keeps its existing name.
    pub async fn apply_real_names(&self, message: &mut Message) -> Result<()> {
        if let Some(author) = message.author.as_mut() {
            self.rename(author).await?;
        }

        if let Some(mentions) = message.mentions.as_mut() {
            for mention in mentions.iter_mut() {
                self.rename(mention).await?;
            }
        }

        Ok(())
    }

    async fn rename(&self, user: &mut UserRef) -> Result<()> {
        if user.id.is_empty() {
            return Ok(());
        }

        match self.user_name(&user.id).await? {
            Some(name) if !name.is_empty() => {
                tracing::trace!(user_id = %user.id, "Applying real name");
                user.name = Some(name);
            }
            _ => {
                tracing::trace!(user_id = %user.id, "No real name found, keeping existing");
            }
        }

        Ok(())
    }

    pub fn cache(&self) -> &TtlCache<UserId, Option<String>> {
        &self.user_names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::DEFAULT_TTL;
    use crate::relay::USE_REAL_NAME;
    use crate::store::{InMemorySettingsStore, InMemoryUserStore};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Fixture {
        users: Arc<InMemoryUserStore>,
        enricher: NameEnricher,
    }

    fn fixture(real_name: bool) -> Fixture {
        let settings_store = Arc::new(InMemorySettingsStore::new());
        settings_store.set(USE_REAL_NAME, json!(real_name));
        let settings = Arc::new(CachedSettings::new(settings_store, DEFAULT_TTL));

        let users = Arc::new(InMemoryUserStore::new());
        users.insert("u1", Some("Alice".to_string()));
        users.insert("u3", Some("Carol".to_string()));
        users.insert("u4", Some(String::new()));

        let enricher = NameEnricher::new(settings, users.clone(), DEFAULT_TTL);
        Fixture { users, enricher }
    }

    fn names(message: &Message) -> Vec<Option<String>> {
        message
            .mentions
            .iter()
            .flatten()
            .map(|m| m.name.clone())
            .collect()
    }

    #[tokio::test]
    async fn test_author_and_mentions_renamed() {
        let Fixture { enricher, .. } = fixture(true);
        let mut message = Message::new("m1")
            .with_author(UserRef::new("u1", "old"))
            .with_mentions(vec![
                UserRef::new("u2", "old2"),
                UserRef::new("u3", "old3"),
                UserRef::new("u4", "old4"),
            ]);

        enricher.enrich(&mut message).await.unwrap();

        assert_eq!(message.author.unwrap().name.as_deref(), Some("Alice"));
        let mentions = message.mentions.unwrap();
        let ids: Vec<&str> = mentions.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["u2", "u3", "u4"]);
        assert_eq!(mentions[0].name.as_deref(), Some("old2"));
        assert_eq!(mentions[1].name.as_deref(), Some("Carol"));
        // Empty names never overwrite
        assert_eq!(mentions[2].name.as_deref(), Some("old4"));
    }

    #[tokio::test]
    async fn test_disabled_setting_leaves_names() {
        let Fixture { users, enricher } = fixture(false);
        let mut message = Message::new("m1")
            .with_author(UserRef::new("u1", "old"))
            .with_mentions(vec![UserRef::new("u3", "old3")]);

        enricher.enrich(&mut message).await.unwrap();

        assert_eq!(message.author.as_ref().unwrap().name.as_deref(), Some("old"));
        assert_eq!(names(&message), vec![Some("old3".to_string())]);
        assert_eq!(users.lookup_count(), 0);
    }

    #[tokio::test]
    async fn test_author_without_id_is_skipped() {
        let Fixture { users, enricher } = fixture(true);
        let mut message = Message::new("m1").with_author(UserRef {
            name: Some("anonymous".to_string()),
            ..Default::default()
        });

        enricher.enrich(&mut message).await.unwrap();

        assert_eq!(message.author.unwrap().name.as_deref(), Some("anonymous"));
        assert_eq!(users.lookup_count(), 0);
    }

    #[tokio::test]
    async fn test_users_shared_across_messages() {
        let Fixture { users, enricher } = fixture(true);

        for id in ["m1", "m2", "m3"] {
            let mut message = Message::new(id)
                .with_author(UserRef::new("u1", "old"))
                .with_mentions(vec![UserRef::new("u1", "old"), UserRef::new("u2", "old2")]);
            enricher.enrich(&mut message).await.unwrap();
        }

        // u1 and u2 (not found) each resolved once
        assert_eq!(users.lookup_count(), 2);
    }

    struct SlowUsers {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl UserStore for SlowUsers {
        async fn find_name(&self, id: &UserId) -> Result<Option<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok(Some(format!("Real {}", id)))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_lookups_hit_store_once() {
        let settings = Arc::new(CachedSettings::new(
            Arc::new(InMemorySettingsStore::new()),
            DEFAULT_TTL,
        ));
        let users = Arc::new(SlowUsers {
            calls: AtomicUsize::new(0),
        });
        let enricher = NameEnricher::new(settings, users.clone(), DEFAULT_TTL);

        let u1 = UserId::new("u1");
        let (a, b) = tokio::join!(enricher.user_name(&u1), enricher.user_name(&u1));

        assert_eq!(a.unwrap().as_deref(), Some("Real u1"));
        assert_eq!(b.unwrap().as_deref(), Some("Real u1"));
        assert_eq!(users.calls.load(Ordering::SeqCst), 1);
    }
}
