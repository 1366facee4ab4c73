use std::sync::Arc;
use tracing::{debug, error, info};

use crate::{
    message::{models::SystemMessage, service::MessageService},
    presence::PresenceRegistry,
    websockets::{
        broadcaster::RoomBroadcaster,
        messages::{JoinRoomPayload, ServerEvent},
    },
};

use super::{required, shared::RoomAnnouncements, EventError};

pub struct RoomEventHandlers {
    presence: Arc<PresenceRegistry>,
    broadcaster: RoomBroadcaster,
    message_service: Arc<MessageService>,
}

impl RoomEventHandlers {
    pub fn new(
        presence: Arc<PresenceRegistry>,
        broadcaster: RoomBroadcaster,
        message_service: Arc<MessageService>,
    ) -> Self {
        Self {
            presence,
            broadcaster,
            message_service,
        }
    }

    pub async fn handle_join(
        &self,
        connection_id: &str,
        payload: JoinRoomPayload,
    ) -> Result<(), EventError> {
        let display_name = required(&payload.username, "username")?;
        let room_id = required(&payload.room, "room")?;

        debug!(
            connection_id = %connection_id,
            room_id = %room_id,
            display_name = %display_name,
            "Handling join room event"
        );

        let previous = {
            // No message can land in the room between membership and history
            let _room_guard = self.message_service.lock_room(room_id).await;

            let previous = self
                .presence
                .join(connection_id, room_id, display_name)
                .await;

            match self.message_service.history(room_id).await {
                Ok(history) => {
                    debug!(
                        room_id = %room_id,
                        messages = history.len(),
                        "Sending chat history"
                    );
                    self.broadcaster
                        .send_to(connection_id, &ServerEvent::ChatHistory(history))
                        .await;
                }
                Err(e) => {
                    error!(room_id = %room_id, error = %e, "Failed to load chat history");
                    self.broadcaster
                        .send_to(connection_id, &ServerEvent::error("Failed to load chat history"))
                        .await;
                }
            }

            previous
        };

        if let Some(previous) = previous {
            info!(
                connection_id = %connection_id,
                from_room = %previous.room_id,
                to_room = %room_id,
                "Connection switched rooms"
            );
            RoomAnnouncements::departure(&self.presence, &self.broadcaster, &previous).await;
        }

        RoomAnnouncements::room_users(&self.presence, &self.broadcaster, room_id).await;
        self.broadcaster
            .broadcast_except(
                room_id,
                &ServerEvent::system(SystemMessage::joined(display_name)),
                connection_id,
            )
            .await;

        info!(
            connection_id = %connection_id,
            room_id = %room_id,
            display_name = %display_name,
            "Joined room"
        );

        Ok(())
    }
}
