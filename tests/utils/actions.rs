use serde_json::{json, Value};

use roomchat::websockets::{ConnectionManager, MessageHandler};

use super::setup::TestSetup;

// ============================================================================
// Action Helpers
// ============================================================================

impl TestSetup {
    /// Deliver one raw text frame from `connection_id`
    pub async fn send_raw(&self, connection_id: &str, frame: &str) {
        self.input_handler
            .handle_message(connection_id, frame.to_string())
            .await;
    }

    /// Deliver one `{"event", "data"}` frame from `connection_id`
    pub async fn send_event(&self, connection_id: &str, event: &str, data: Value) {
        let frame = json!({ "event": event, "data": data }).to_string();
        self.send_raw(connection_id, &frame).await;
    }

    /// Clear all recorded messages
    pub async fn clear_messages(&self) {
        self.mock_conn_manager.clear_messages().await;
    }

    // ============================================================================
    // Convenience Action Methods
    // ============================================================================

    /// Register the connection the way the upgrade handler does, then join
    pub async fn connect_and_join(&self, connection_id: &str, username: &str, room: &str) {
        let (sender, _receiver) = tokio::sync::mpsc::unbounded_channel();
        self.state
            .connection_manager
            .add_connection(connection_id.to_string(), sender)
            .await;
        self.join(connection_id, username, room).await;
    }

    pub async fn join(&self, connection_id: &str, username: &str, room: &str) {
        self.send_event(
            connection_id,
            "join_room",
            json!({ "username": username, "room": room }),
        )
        .await;
    }

    pub async fn send_chat(&self, connection_id: &str, text: &str) {
        self.send_event(connection_id, "chat message", json!({ "text": text }))
            .await;
    }

    pub async fn send_seen(&self, connection_id: &str, message_id: &str) {
        self.send_event(connection_id, "message_seen", json!(message_id))
            .await;
    }

    pub async fn send_reaction(&self, connection_id: &str, message_id: &str, emoji: &str, user: &str) {
        self.send_event(
            connection_id,
            "message_reacted",
            json!({ "messageId": message_id, "reaction": { "emoji": emoji, "user": user } }),
        )
        .await;
    }

    pub async fn send_typing(&self, connection_id: &str, started: bool, room: &str, username: &str) {
        let event = if started { "typing_start" } else { "typing_stop" };
        self.send_event(connection_id, event, json!({ "room": room, "username": username }))
            .await;
    }

    pub async fn disconnect(&self, connection_id: &str) {
        self.input_handler.handle_disconnect(connection_id).await;
    }
}
