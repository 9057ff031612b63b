use crate::error::Result;
use crate::model::{BroadcastPayload, Message, MessageId, UserId};
use async_trait::async_trait;
use serde_json::Value;

/// Read access to persisted messages.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Fetch one message by id; `Ok(None)` when it does not exist.
    async fn find_one_by_id(&self, id: &MessageId) -> Result<Option<Message>>;
}

/// Read access to user records, projected to the display name.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Display name of the user; `Ok(None)` when the user is unknown or has no name.
    async fn find_name(&self, id: &UserId) -> Result<Option<String>>;
}

/// Read access to workspace settings.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Raw JSON value of a setting; `Ok(None)` when the setting is not defined.
    async fn get_value_by_id(&self, setting_id: &str) -> Result<Option<Value>>;
}

/// Delivery side of the real-time channel.
///
/// Implementations report transport failures, but the relay never waits on
/// or propagates them: publishing is advisory.
#[async_trait]
pub trait Broadcaster: Send + Sync {
    async fn publish(&self, event: &str, payload: BroadcastPayload) -> anyhow::Result<()>;
}
