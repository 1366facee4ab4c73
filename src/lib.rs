// Library crate for the room chat server
// This file exposes the public API for the binary and integration tests

pub mod blob;
pub mod config;
pub mod locks;
pub mod message;
pub mod presence;
pub mod routes;
pub mod shared;
pub mod websockets;

// Re-export commonly used types for easier access in tests
pub use blob::{BlobStore, InMemoryBlobStore, LocalBlobStore};
pub use config::AppConfig;
pub use message::{
    models::{MessageKind, MessageModel, MessageStatus, Reaction},
    repository::{InMemoryMessageRepository, MessageRepository, PostgresMessageRepository},
};
pub use presence::PresenceRegistry;
pub use routes::build_router;
pub use shared::{AppError, AppState};
pub use websockets::{
    ClientEvent, ConnectionManager, InMemoryConnectionManager, MessageHandler, ServerEvent,
    WebsocketReceiveHandler,
};
