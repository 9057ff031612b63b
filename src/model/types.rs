use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl MessageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reference to a user embedded in a message (author or mention)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserRef {
    #[serde(rename = "_id", default)]
    pub id: UserId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Display name, rewritten in place when real names are enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserRef {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: UserId::new(id),
            name: Some(name.into()),
            ..Default::default()
        }
    }
}

/// A chat message document.
///
/// Only the fields the relay reasons about are typed; everything else rides
/// along in `extra` and is serialized back unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "_id")]
    pub id: MessageId,

    /// System message type tag; absent for regular user messages
    #[serde(rename = "t", default, skip_serializing_if = "Option::is_none")]
    pub message_type: Option<String>,

    #[serde(rename = "_hidden", default, skip_serializing_if = "Option::is_none")]
    pub hidden: Option<bool>,

    /// Import-origin marker; any non-null value means the message came from a bulk import
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imported: Option<Value>,

    #[serde(rename = "u", default, skip_serializing_if = "Option::is_none")]
    pub author: Option<UserRef>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mentions: Option<Vec<UserRef>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Message {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(id),
            ..Default::default()
        }
    }

    pub fn with_type(mut self, message_type: impl Into<String>) -> Self {
        self.message_type = Some(message_type.into());
        self
    }

    pub fn with_author(mut self, author: UserRef) -> Self {
        self.author = Some(author);
        self
    }

    pub fn with_mentions(mut self, mentions: Vec<UserRef>) -> Self {
        self.mentions = Some(mentions);
        self
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden == Some(true)
    }

    pub fn is_imported(&self) -> bool {
        matches!(&self.imported, Some(marker) if !marker.is_null())
    }
}

/// Payload published on the broadcast channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BroadcastPayload {
    pub message: Message,
}
