//! Logging utilities for structured tracing

use std::time::Instant;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "message_relay=info";

/// Install a global fmt subscriber.
///
/// `RUST_LOG` wins over the built-in `message_relay=info` filter. Returns
/// quietly if a subscriber is already installed (embedders often bring their own).
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_line_number(true);

    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    if result.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}

/// Track operation timing and log on drop
pub struct Timer {
    start: Instant,
    operation: String,
}

impl Timer {
    /// Create a new timer for an operation
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            operation: operation.into(),
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        let duration_us = self.start.elapsed().as_micros() as u64;
        tracing::trace!(
            operation = %self.operation,
            duration_us = duration_us,
            "Operation completed"
        );
    }
}

/// Concrete type name of an error, for the `error_kind` log field
pub fn error_kind<E: std::error::Error>(error: &E) -> &'static str {
    std::any::type_name_of_val(error)
}

/// Log an error with structured context
pub fn log_error(operation: &str, error: &impl std::error::Error) {
    tracing::warn!(
        operation = %operation,
        error = %error,
        error_kind = error_kind(error),
        "Operation failed"
    );
}
