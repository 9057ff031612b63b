use crate::config::RelaySettings;
use crate::error::{RelayError, Result};
use crate::logging::{Timer, log_error};
use crate::model::{BroadcastPayload, Message, MessageId};
use crate::relay::{CachedSettings, NameEnricher, suppression_reason};
use crate::store::{Broadcaster, MessageStore, SettingsStore, UserStore};
use std::sync::Arc;

/// A message that was just mutated, optionally with the document already in hand
#[derive(Debug, Clone)]
pub struct BroadcastRequest {
    pub id: MessageId,
    pub data: Option<Message>,
}

impl BroadcastRequest {
    pub fn by_id(id: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(id),
            data: None,
        }
    }

    pub fn with_data(message: Message) -> Self {
        Self {
            id: message.id.clone(),
            data: Some(message),
        }
    }
}

/// Decides whether a mutated message is relayed to real-time subscribers,
/// enriches it and publishes it.
pub struct BroadcastGate {
    messages: Arc<dyn MessageStore>,
    broadcaster: Arc<dyn Broadcaster>,
    settings: Arc<CachedSettings>,
    enricher: NameEnricher,
    change_notification_active: bool,
    event_name: String,
}

impl BroadcastGate {
    pub fn new(
        config: &RelaySettings,
        messages: Arc<dyn MessageStore>,
        users: Arc<dyn UserStore>,
        settings_store: Arc<dyn SettingsStore>,
        broadcaster: Arc<dyn Broadcaster>,
    ) -> Self {
        let ttl = config.cache.ttl();
        let settings = Arc::new(CachedSettings::new(settings_store, ttl));
        let enricher = NameEnricher::new(Arc::clone(&settings), users, ttl);

        tracing::info!(
            change_notification_active = config.broadcast.change_notification_active,
            event = %config.broadcast.event_name,
            cache_ttl_secs = config.cache.ttl_secs,
            "Broadcast gate initialized"
        );

        Self {
            messages,
            broadcaster,
            settings,
            enricher,
            change_notification_active: config.broadcast.change_notification_active,
            event_name: config.broadcast.event_name.clone(),
        }
    }

    /// Load, filter and enrich the message; `None` means nothing to broadcast.
    ///
    /// Visibility is decided before enrichment, so suppressed messages never
    /// warm the user-name cache.
    pub async fn resolve_broadcast_candidate(
        &self,
        request: BroadcastRequest,
    ) -> Result<Option<Message>> {
        let _timer = Timer::new("resolve_broadcast_candidate");
        let BroadcastRequest { id, data } = request;

        let mut message = match data {
            Some(message) => message,
            None => match self.messages.find_one_by_id(&id).await? {
                Some(message) => message,
                None => {
                    tracing::debug!(message_id = %id, "Message not found, nothing to broadcast");
                    return Ok(None);
                }
            },
        };

        // Untyped messages never need the hidden-types setting
        let hidden_types = if message.message_type.is_some() {
            self.settings.hidden_system_message_types().await?
        } else {
            Vec::new()
        };

        if let Some(reason) = suppression_reason(&message, &hidden_types) {
            tracing::debug!(
                message_id = %message.id,
                reason = %reason,
                "Message suppressed from broadcast"
            );
            return Ok(None);
        }

        self.enricher.enrich(&mut message).await?;
        Ok(Some(message))
    }

    /// Publish the message unless database change notification already does it.
    ///
    /// Must run inside a tokio runtime: the publish is spawned and never
    /// awaited, and its failures are logged and dropped on purpose since the
    /// underlying mutation has already succeeded.
    pub async fn broadcast_if_needed(&self, request: BroadcastRequest) -> Result<()> {
        if self.change_notification_active {
            tracing::trace!(
                message_id = %request.id,
                "Change notification active, skipping direct broadcast"
            );
            return Ok(());
        }

        let Some(message) = self.resolve_broadcast_candidate(request).await? else {
            return Ok(());
        };

        let broadcaster = Arc::clone(&self.broadcaster);
        let event = self.event_name.clone();
        let message_id = message.id.clone();

        tokio::spawn(async move {
            match broadcaster
                .publish(&event, BroadcastPayload { message })
                .await
            {
                Ok(()) => tracing::trace!(message_id = %message_id, event = %event, "Message broadcast"),
                Err(e) => log_error("publish", &RelayError::Publish(format!("{:#}", e))),
            }
        });

        Ok(())
    }

    pub fn settings(&self) -> &CachedSettings {
        &self.settings
    }

    pub fn enricher(&self) -> &NameEnricher {
        &self.enricher
    }

    /// Prune expired entries from both caches (for periodic cleanup)
    pub fn cleanup_stale(&self) -> usize {
        self.settings.cache().cleanup_stale() + self.enricher.cache().cleanup_stale()
    }

    /// Log cache statistics (for periodic monitoring)
    pub async fn log_stats(&self) {
        self.settings.cache().log_stats().await;
        self.enricher.cache().log_stats().await;
    }
}
