// Public API
pub use broadcaster::RoomBroadcaster;
pub use connection_manager::{ConnectionManager, InMemoryConnectionManager};
pub use handler::{websocket_handler, WebsocketReceiveHandler};
pub use messages::{ChatEntry, ClientEvent, ServerEvent};
pub use socket::{Connection, MessageHandler, SocketError, SocketWrapper};

// Internal modules
pub mod broadcaster;
mod connection_manager;
pub mod event_handlers;
mod handler;
pub mod messages;
mod socket;
