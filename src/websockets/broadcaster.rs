use std::sync::Arc;
use tracing::{debug, error};

use crate::presence::PresenceRegistry;

use super::{connection_manager::ConnectionManager, messages::ServerEvent};

/// Fans events out to the connections currently in a room
///
/// Delivery is fire-and-forget: nothing is acknowledged and a connection that
/// is mid-disconnect simply misses the event.
#[derive(Clone)]
pub struct RoomBroadcaster {
    presence: Arc<PresenceRegistry>,
    connection_manager: Arc<dyn ConnectionManager>,
}

impl RoomBroadcaster {
    pub fn new(
        presence: Arc<PresenceRegistry>,
        connection_manager: Arc<dyn ConnectionManager>,
    ) -> Self {
        Self {
            presence,
            connection_manager,
        }
    }

    /// Sends `event` to every connection in `room_id` except `exclude`
    pub async fn broadcast(&self, room_id: &str, event: &ServerEvent, exclude: Option<&str>) {
        let Some(message_json) = Self::encode(event) else {
            return;
        };

        let targets: Vec<String> = self
            .presence
            .connections_in(room_id)
            .await
            .into_iter()
            .filter(|id| Some(id.as_str()) != exclude)
            .collect();

        self.connection_manager
            .send_to_connections(&targets, &message_json)
            .await;

        debug!(
            room_id = %room_id,
            event = event.event_name(),
            recipients = targets.len(),
            "Broadcast to room"
        );
    }

    pub async fn broadcast_to_room(&self, room_id: &str, event: &ServerEvent) {
        self.broadcast(room_id, event, None).await;
    }

    pub async fn broadcast_except(&self, room_id: &str, event: &ServerEvent, sender: &str) {
        self.broadcast(room_id, event, Some(sender)).await;
    }

    /// Sends `event` to a single connection
    pub async fn send_to(&self, connection_id: &str, event: &ServerEvent) {
        if let Some(message_json) = Self::encode(event) {
            self.connection_manager
                .send_to_connection(connection_id, &message_json)
                .await;
        }
    }

    fn encode(event: &ServerEvent) -> Option<String> {
        match serde_json::to_string(event) {
            Ok(json) => Some(json),
            Err(e) => {
                error!(event = event.event_name(), error = %e, "Failed to serialize event");
                None
            }
        }
    }
}
