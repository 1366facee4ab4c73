use async_trait::async_trait;
use axum::{
    extract::{State, WebSocketUpgrade},
    response::Response,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::shared::AppState;
use crate::websockets::{
    broadcaster::RoomBroadcaster,
    connection_manager::ConnectionManager,
    event_handlers::{
        ChatEventHandlers, ConnectionEventHandlers, EventError, MessageEventHandlers,
        RoomEventHandlers,
    },
    messages::{ClientEvent, ServerEvent},
};

use super::socket::{Connection, MessageHandler};

/// Decodes client frames and routes them to the event handlers
pub struct WebsocketReceiveHandler {
    connection_manager: Arc<dyn ConnectionManager>,
    broadcaster: RoomBroadcaster,
    room_events: RoomEventHandlers,
    chat_events: ChatEventHandlers,
    message_events: MessageEventHandlers,
    connection_events: ConnectionEventHandlers,
}

impl WebsocketReceiveHandler {
    pub fn from_state(state: &AppState) -> Self {
        let presence = Arc::clone(&state.presence);
        let broadcaster = state.broadcaster.clone();
        let message_service = Arc::clone(&state.message_service);

        Self {
            connection_manager: Arc::clone(&state.connection_manager),
            room_events: RoomEventHandlers::new(
                Arc::clone(&presence),
                broadcaster.clone(),
                Arc::clone(&message_service),
            ),
            chat_events: ChatEventHandlers::new(
                Arc::clone(&presence),
                broadcaster.clone(),
                Arc::clone(&message_service),
            ),
            message_events: MessageEventHandlers::new(
                broadcaster.clone(),
                message_service,
                state.config.legacy_status_event,
            ),
            connection_events: ConnectionEventHandlers::new(presence, broadcaster.clone()),
            broadcaster,
        }
    }

    async fn dispatch(&self, connection_id: &str, event: ClientEvent) -> Result<(), EventError> {
        match event {
            ClientEvent::JoinRoom(payload) => {
                self.room_events.handle_join(connection_id, payload).await
            }
            ClientEvent::ChatMessage(payload) => {
                self.chat_events
                    .handle_chat_message(connection_id, payload)
                    .await
            }
            ClientEvent::MessageSeen(reference) => {
                self.message_events
                    .handle_message_seen(connection_id, reference)
                    .await
            }
            ClientEvent::MessageReacted(payload) => {
                self.message_events
                    .handle_message_reacted(connection_id, payload)
                    .await
            }
            ClientEvent::TypingStart(payload) => {
                self.chat_events
                    .handle_typing(connection_id, payload, true)
                    .await
            }
            ClientEvent::TypingStop(payload) => {
                self.chat_events
                    .handle_typing(connection_id, payload, false)
                    .await
            }
        }
    }
}

#[async_trait]
impl MessageHandler for WebsocketReceiveHandler {
    async fn handle_message(&self, connection_id: &str, message: String) {
        debug!(
            connection_id = %connection_id,
            message = %message,
            "Received message"
        );

        let event = match serde_json::from_str::<ClientEvent>(&message) {
            Ok(event) => event,
            Err(e) => {
                warn!(
                    connection_id = %connection_id,
                    error = %e,
                    "Failed to parse WebSocket message"
                );
                self.broadcaster
                    .send_to(connection_id, &ServerEvent::error(format!("Invalid event: {}", e)))
                    .await;
                return;
            }
        };

        let event_name = event.event_name();
        match self.dispatch(connection_id, event).await {
            Ok(()) => {}
            Err(EventError::Validation(reason)) => {
                warn!(
                    connection_id = %connection_id,
                    event = event_name,
                    reason = %reason,
                    "Rejected event"
                );
                self.broadcaster
                    .send_to(connection_id, &ServerEvent::error(reason))
                    .await;
            }
            Err(EventError::NotFound(what)) => {
                debug!(
                    connection_id = %connection_id,
                    event = event_name,
                    what = %what,
                    "Dropping event for unknown target"
                );
            }
            Err(EventError::Storage(e)) => {
                error!(
                    connection_id = %connection_id,
                    event = event_name,
                    error = %e,
                    "Dropping event after storage failure"
                );
            }
        }
    }

    async fn handle_disconnect(&self, connection_id: &str) {
        self.connection_manager
            .remove_connection(connection_id)
            .await;
        self.connection_events.handle_disconnect(connection_id).await;
    }
}

/// WebSocket endpoint
/// GET /ws, every connection gets a fresh id and starts out of any room
pub async fn websocket_handler(ws: WebSocketUpgrade, State(app_state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_websocket_connection(socket, app_state))
}

async fn handle_websocket_connection(socket: axum::extract::ws::WebSocket, app_state: AppState) {
    let connection_id = Uuid::new_v4().to_string();
    info!(connection_id = %connection_id, "WebSocket connection established");

    // Create the outbound channel (app -> client)
    let (outbound_sender, outbound_receiver) = mpsc::unbounded_channel::<String>();

    app_state
        .connection_manager
        .add_connection(connection_id.clone(), outbound_sender)
        .await;

    let message_handler = Arc::new(WebsocketReceiveHandler::from_state(&app_state));
    let connection = Connection::new(
        connection_id.clone(),
        Box::new(socket),
        outbound_receiver,
        message_handler,
    );

    match connection.run().await {
        Ok(()) => {
            info!(connection_id = %connection_id, "WebSocket connection closed cleanly");
        }
        Err(e) => {
            warn!(
                connection_id = %connection_id,
                error = ?e,
                "WebSocket connection error"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_utils::AppStateBuilder;
    use crate::websockets::event_handlers::test_support::CollectingConnMgr;
    use serde_json::json;

    fn setup() -> (WebsocketReceiveHandler, Arc<CollectingConnMgr>) {
        let outbox = Arc::new(CollectingConnMgr::default());
        let state = AppStateBuilder::new()
            .with_connection_manager(outbox.clone())
            .build();
        (WebsocketReceiveHandler::from_state(&state), outbox)
    }

    #[tokio::test]
    async fn test_undecodable_frame_errors_to_sender_only() {
        let (handler, outbox) = setup();
        handler
            .handle_message(
                "c1",
                json!({"event": "join_room", "data": {"username": "alice", "room": "r1"}})
                    .to_string(),
            )
            .await;
        outbox.clear();

        handler.handle_message("c2", "not json".to_string()).await;

        assert!(outbox.events_for("c1").is_empty());
        let events = outbox.events_for("c2");
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], ServerEvent::Error(_)));
    }

    #[tokio::test]
    async fn test_chat_before_join_is_reported() {
        let (handler, outbox) = setup();

        handler
            .handle_message(
                "c1",
                json!({"event": "chat message", "data": {"text": "hi"}}).to_string(),
            )
            .await;

        let events = outbox.events_for("c1");
        let ServerEvent::Error(payload) = &events[0] else {
            panic!("expected error, got {:?}", events[0]);
        };
        assert!(payload.message.contains("Join a room"));
    }

    #[tokio::test]
    async fn test_unknown_message_seen_is_silent() {
        let (handler, outbox) = setup();

        handler
            .handle_message(
                "c1",
                json!({"event": "message_seen", "data": "no-such-id"}).to_string(),
            )
            .await;

        assert!(outbox.events_for("c1").is_empty());
    }
}
