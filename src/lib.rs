pub mod cache;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod relay;
pub mod store;

pub use error::{RelayError, Result};
pub use relay::{BroadcastGate, BroadcastRequest};
