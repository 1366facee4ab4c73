use std::sync::Arc;
use tracing::debug;

use crate::{
    message::service::MessageService,
    websockets::{
        broadcaster::RoomBroadcaster,
        messages::{MessageReactedPayload, MessageRef, ServerEvent},
    },
};

use super::{required, EventError};

pub struct MessageEventHandlers {
    broadcaster: RoomBroadcaster,
    message_service: Arc<MessageService>,
    legacy_status_event: bool,
}

impl MessageEventHandlers {
    pub fn new(
        broadcaster: RoomBroadcaster,
        message_service: Arc<MessageService>,
        legacy_status_event: bool,
    ) -> Self {
        Self {
            broadcaster,
            message_service,
            legacy_status_event,
        }
    }

    pub async fn handle_message_seen(
        &self,
        connection_id: &str,
        reference: MessageRef,
    ) -> Result<(), EventError> {
        let message_id = required(reference.id(), "messageId")?;

        debug!(
            connection_id = %connection_id,
            message_id = %message_id,
            "Handling message seen event"
        );

        let Some(message) = self.message_service.mark_seen(message_id).await? else {
            return Err(EventError::NotFound(format!("message {}", message_id)));
        };

        let room_id = message.room_id.clone();
        if self.legacy_status_event {
            self.broadcaster
                .broadcast_to_room(&room_id, &ServerEvent::MessageUpdated(message.clone()))
                .await;
            self.broadcaster
                .broadcast_to_room(&room_id, &ServerEvent::MessageStatusUpdated(message))
                .await;
        } else {
            self.broadcaster
                .broadcast_to_room(&room_id, &ServerEvent::MessageUpdated(message))
                .await;
        }

        Ok(())
    }

    pub async fn handle_message_reacted(
        &self,
        connection_id: &str,
        payload: MessageReactedPayload,
    ) -> Result<(), EventError> {
        let message_id = required(&payload.message_id, "messageId")?;
        let emoji = required(&payload.reaction.emoji, "emoji")?;
        let author = required(&payload.reaction.user, "user")?;

        debug!(
            connection_id = %connection_id,
            message_id = %message_id,
            author = %author,
            "Handling message reacted event"
        );

        let Some(message) = self
            .message_service
            .react(message_id, emoji, author)
            .await?
        else {
            return Err(EventError::NotFound(format!("message {}", message_id)));
        };

        let room_id = message.room_id.clone();
        self.broadcaster
            .broadcast_to_room(&room_id, &ServerEvent::MessageUpdated(message))
            .await;

        Ok(())
    }
}
