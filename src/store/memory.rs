//! In-process collaborators backed by concurrent maps

use crate::error::Result;
use crate::model::{BroadcastPayload, Message, MessageId, UserId};
use crate::store::{Broadcaster, MessageStore, SettingsStore, UserStore};
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;

#[derive(Default)]
pub struct InMemoryMessageStore {
    messages: DashMap<MessageId, Message>,
    lookups: AtomicU64,
}

impl InMemoryMessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, message: Message) {
        self.messages.insert(message.id.clone(), message);
    }

    pub fn remove(&self, id: &MessageId) -> Option<Message> {
        self.messages.remove(id).map(|(_, message)| message)
    }

    /// Number of `find_one_by_id` calls served so far
    pub fn lookup_count(&self) -> u64 {
        self.lookups.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn find_one_by_id(&self, id: &MessageId) -> Result<Option<Message>> {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        // Callers get their own copy to mutate
        Ok(self.messages.get(id).map(|entry| entry.value().clone()))
    }
}

#[derive(Default)]
pub struct InMemoryUserStore {
    names: DashMap<UserId, Option<String>>,
    lookups: AtomicU64,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, id: impl Into<String>, name: Option<String>) {
        self.names.insert(UserId::new(id), name);
    }

    pub fn remove(&self, id: &UserId) {
        self.names.remove(id);
    }

    pub fn lookup_count(&self) -> u64 {
        self.lookups.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_name(&self, id: &UserId) -> Result<Option<String>> {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        Ok(self.names.get(id).and_then(|entry| entry.value().clone()))
    }
}

#[derive(Default)]
pub struct InMemorySettingsStore {
    values: DashMap<String, Value>,
    lookups: AtomicU64,
}

impl InMemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, setting_id: impl Into<String>, value: Value) {
        self.values.insert(setting_id.into(), value);
    }

    pub fn lookup_count(&self) -> u64 {
        self.lookups.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl SettingsStore for InMemorySettingsStore {
    async fn get_value_by_id(&self, setting_id: &str) -> Result<Option<Value>> {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        Ok(self.values.get(setting_id).map(|entry| entry.value().clone()))
    }
}

/// Event as delivered to in-process subscribers
#[derive(Debug, Clone, PartialEq)]
pub struct BroadcastEvent {
    pub name: String,
    pub payload: BroadcastPayload,
}

/// Fans published events out to in-process subscribers over a tokio broadcast channel
pub struct ChannelBroadcaster {
    sender: broadcast::Sender<BroadcastEvent>,
    published: AtomicU64,
}

impl ChannelBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            published: AtomicU64::new(0),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BroadcastEvent> {
        self.sender.subscribe()
    }

    /// Number of `publish` calls, delivered or not
    pub fn publish_count(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Broadcaster for ChannelBroadcaster {
    async fn publish(&self, event: &str, payload: BroadcastPayload) -> anyhow::Result<()> {
        self.published.fetch_add(1, Ordering::Relaxed);

        let receivers = self
            .sender
            .send(BroadcastEvent {
                name: event.to_string(),
                payload,
            })
            .map_err(|_| anyhow::anyhow!("No subscribers for event {}", event))?;

        tracing::trace!(event = %event, receivers = receivers, "Event delivered");
        Ok(())
    }
}
