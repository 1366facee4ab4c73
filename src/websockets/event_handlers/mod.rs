pub mod chat_events;
pub mod connection_events;
pub mod message_events;
pub mod room_events;
pub mod shared;

pub use chat_events::ChatEventHandlers;
pub use connection_events::ConnectionEventHandlers;
pub use message_events::MessageEventHandlers;
pub use room_events::RoomEventHandlers;

use thiserror::Error;

use crate::shared::AppError;

/// Why an inbound event produced no broadcast
#[derive(Debug, Error)]
pub enum EventError {
    /// Reported to the originating connection only
    #[error("{0}")]
    Validation(String),

    /// Dropped silently
    #[error("Not found: {0}")]
    NotFound(String),

    /// Logged and dropped
    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<AppError> for EventError {
    fn from(e: AppError) -> Self {
        match e {
            AppError::NotFound(msg) => EventError::NotFound(msg),
            AppError::Validation(msg)
            | AppError::MissingPayload(msg)
            | AppError::PayloadTooLarge(msg) => EventError::Validation(msg),
            other => EventError::Storage(other.to_string()),
        }
    }
}

/// Trims and rejects empty required fields
pub(crate) fn required<'a>(value: &'a str, field: &str) -> Result<&'a str, EventError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(EventError::Validation(format!("{} is required", field)))
    } else {
        Ok(trimmed)
    }
}
