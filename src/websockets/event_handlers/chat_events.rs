use std::sync::Arc;
use tracing::{debug, info};

use crate::{
    message::service::MessageService,
    presence::PresenceRegistry,
    websockets::{
        broadcaster::RoomBroadcaster,
        messages::{ChatMessagePayload, ServerEvent, TypingPayload},
    },
};

use super::{required, EventError};

pub struct ChatEventHandlers {
    presence: Arc<PresenceRegistry>,
    broadcaster: RoomBroadcaster,
    message_service: Arc<MessageService>,
}

impl ChatEventHandlers {
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

    /// Stores a message from a joined connection and relays it to the room
    ///
    /// The author is always the display name the connection joined with.
    pub async fn handle_chat_message(
        &self,
        connection_id: &str,
        payload: ChatMessagePayload,
    ) -> Result<(), EventError> {
        let Some(membership) = self.presence.membership_of(connection_id).await else {
            return Err(EventError::Validation(
                "Join a room before sending messages".to_string(),
            ));
        };

        if let Some(room) = payload.room.as_deref() {
            if room.trim() != membership.room_id {
                return Err(EventError::Validation(format!(
                    "Not a member of room {}",
                    room.trim()
                )));
            }
        }

        if payload.text.trim().is_empty() {
            return Err(EventError::Validation("text is required".to_string()));
        }

        info!(
            connection_id = %connection_id,
            room_id = %membership.room_id,
            "Handling chat message event"
        );

        let _room_guard = self.message_service.lock_room(&membership.room_id).await;

        let message = self
            .message_service
            .create_message(
                &membership.room_id,
                &membership.display_name,
                &payload.text,
                payload.kind,
                None,
            )
            .await?;

        self.broadcaster
            .broadcast_to_room(&membership.room_id, &ServerEvent::stored(message))
            .await;

        Ok(())
    }

    /// Relays a typing indicator to everyone else in the room
    pub async fn handle_typing(
        &self,
        connection_id: &str,
        payload: TypingPayload,
        started: bool,
    ) -> Result<(), EventError> {
        let room_id = required(&payload.room, "room")?;
        let display_name = required(&payload.username, "username")?.to_string();

        debug!(
            connection_id = %connection_id,
            room_id = %room_id,
            started,
            "Relaying typing indicator"
        );

        let event = if started {
            ServerEvent::TypingStart(display_name)
        } else {
            ServerEvent::TypingStop(display_name)
        };

        self.broadcaster
            .broadcast_except(room_id, &event, connection_id)
            .await;

        Ok(())
    }
}
