//! Gate-and-enrich pipeline run once per mutated message
//!
//! Order of operations for a direct broadcast:
//! 1. Skip entirely while database change notification is active
//! 2. Load the message unless the caller already has it
//! 3. Suppress hidden system types, hidden messages and imports
//! 4. Rewrite author/mention names when real names are enabled
//! 5. Publish without waiting for delivery

mod gate;
mod names;
mod settings;
mod visibility;

pub use gate::{BroadcastGate, BroadcastRequest};
pub use names::NameEnricher;
pub use settings::{CachedSettings, HIDE_SYSTEM_MESSAGES, USE_REAL_NAME};
pub use visibility::{
    SuppressReason, is_hidden_system_message, should_broadcast, suppression_reason,
};
