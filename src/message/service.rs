use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use super::{
    models::{FileMeta, MessageKind, MessageModel, MessageStatus, NewMessage},
    repository::MessageRepository,
};
use crate::locks::{KeyGuard, KeyedLocks};
use crate::presence::PresenceRegistry;
use crate::shared::AppError;

/// Owns message creation, status transitions and reactions
///
/// Mutations are read, modify, write against the repository. Writers to the
/// same message id are serialized here so concurrent `seen`/`reaction` events
/// cannot overwrite each other.
pub struct MessageService {
    repository: Arc<dyn MessageRepository + Send + Sync>,
    presence: Arc<PresenceRegistry>,
    message_locks: KeyedLocks,
    room_locks: KeyedLocks,
}

impl MessageService {
    pub fn new(
        repository: Arc<dyn MessageRepository + Send + Sync>,
        presence: Arc<PresenceRegistry>,
    ) -> Self {
        Self {
            repository,
            presence,
            message_locks: KeyedLocks::new(),
            room_locks: KeyedLocks::new(),
        }
    }

    /// Serializes work on one room's timeline.
    ///
    /// Hold it across create + broadcast of a new message, and across
    /// history load + delivery on join, so a joiner sees every message
    /// exactly once and history always first.
    pub async fn lock_room(&self, room_id: &str) -> KeyGuard<'_> {
        self.room_locks.lock(room_id).await
    }

    /// Persists a new message. It starts as `seen` when more than one
    /// connection is in the room at this instant, `sent` otherwise.
    #[instrument(skip(self, text, file))]
    pub async fn create_message(
        &self,
        room_id: &str,
        author: &str,
        text: &str,
        kind: MessageKind,
        file: Option<FileMeta>,
    ) -> Result<MessageModel, AppError> {
        let present = self.presence.count_of(room_id).await;
        let status = if present > 1 {
            MessageStatus::Seen
        } else {
            MessageStatus::Sent
        };

        let message = self
            .repository
            .insert_message(NewMessage {
                room_id: room_id.to_string(),
                author: author.to_string(),
                text: text.to_string(),
                kind,
                file,
                status,
                created_at: Utc::now(),
            })
            .await?;

        info!(
            room_id = %room_id,
            message_id = %message.id,
            status = %message.status,
            present,
            "Message created"
        );

        Ok(message)
    }

    /// Room history ascending by creation time
    #[instrument(skip(self))]
    pub async fn history(&self, room_id: &str) -> Result<Vec<MessageModel>, AppError> {
        self.repository.find_by_room(room_id).await
    }

    /// Marks a message as seen. `None` when the id does not resolve.
    #[instrument(skip(self))]
    pub async fn mark_seen(&self, message_id: &str) -> Result<Option<MessageModel>, AppError> {
        let _guard = self.message_locks.lock(message_id).await;

        let Some(mut message) = self.repository.find_message(message_id).await? else {
            debug!(message_id = %message_id, "Seen for unknown message");
            return Ok(None);
        };

        if !message.mark_seen() {
            debug!(message_id = %message_id, "Message already seen");
            return Ok(Some(message));
        }

        match self.repository.update_message(&message).await {
            Ok(()) => {
                info!(message_id = %message_id, room_id = %message.room_id, "Message marked seen");
                Ok(Some(message))
            }
            // removed between read and write
            Err(AppError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Applies `author`'s reaction with toggle semantics. `None` when the id
    /// does not resolve.
    #[instrument(skip(self))]
    pub async fn react(
        &self,
        message_id: &str,
        emoji: &str,
        author: &str,
    ) -> Result<Option<MessageModel>, AppError> {
        let _guard = self.message_locks.lock(message_id).await;

        let Some(mut message) = self.repository.find_message(message_id).await? else {
            debug!(message_id = %message_id, "Reaction for unknown message");
            return Ok(None);
        };

        let change = message.apply_reaction(emoji, author);

        match self.repository.update_message(&message).await {
            Ok(()) => {
                info!(
                    message_id = %message_id,
                    author = %author,
                    change = ?change,
                    reactions = message.reactions.len(),
                    "Reaction applied"
                );
                Ok(Some(message))
            }
            Err(AppError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
