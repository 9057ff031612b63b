//! External collaborators: message/user/settings stores and the broadcast channel
//!
//! The relay only depends on the traits. The in-memory implementations back
//! tests and embedders that keep their data in process.

mod memory;
mod traits;

pub use memory::{
    BroadcastEvent, ChannelBroadcaster, InMemoryMessageStore, InMemorySettingsStore,
    InMemoryUserStore,
};
pub use traits::{Broadcaster, MessageStore, SettingsStore, UserStore};
