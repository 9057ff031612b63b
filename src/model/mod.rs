//! Message documents as they travel from the store to the broadcast channel

mod types;

pub use types::{BroadcastPayload, Message, MessageId, UserId, UserRef};
