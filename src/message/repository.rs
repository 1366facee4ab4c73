use async_trait::async_trait;
use sqlx::{postgres::PgRow, types::Json, PgPool, Row};
use std::collections::HashMap;
use std::str::FromStr;
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use super::models::{MessageKind, MessageModel, MessageStatus, NewMessage, Reaction};
use crate::shared::AppError;

/// Document-style storage for chat messages
///
/// Every method is a single-document operation: implementations must make
/// `update_message` atomic for one record, nothing more.
#[async_trait]
pub trait MessageRepository {
    /// Stores a new message and returns it with its assigned id
    async fn insert_message(&self, message: NewMessage) -> Result<MessageModel, AppError>;
    async fn find_message(&self, message_id: &str) -> Result<Option<MessageModel>, AppError>;
    /// All messages of a room, ascending by creation time
    async fn find_by_room(&self, room_id: &str) -> Result<Vec<MessageModel>, AppError>;
    /// Replaces the whole stored record with `message`
    async fn update_message(&self, message: &MessageModel) -> Result<(), AppError>;
}

#[derive(Default)]
struct MessageTable {
    messages: HashMap<String, MessageModel>,
    // room_id -> message ids in insertion order
    rooms: HashMap<String, Vec<String>>,
}

/// In-memory implementation of MessageRepository for development and testing
///
/// Data lives only as long as the process.
pub struct InMemoryMessageRepository {
    table: Mutex<MessageTable>,
}

impl Default for InMemoryMessageRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryMessageRepository {
    pub fn new() -> Self {
        Self {
            table: Mutex::new(MessageTable::default()),
        }
    }

    pub async fn message_count(&self) -> usize {
        self.table.lock().await.messages.len()
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    #[instrument(skip(self, message), fields(room_id = %message.room_id))]
    async fn insert_message(&self, message: NewMessage) -> Result<MessageModel, AppError> {
        let model = message.into_model(Uuid::new_v4().to_string());

        let mut table = self.table.lock().await;
        table
            .rooms
            .entry(model.room_id.clone())
            .or_default()
            .push(model.id.clone());
        table.messages.insert(model.id.clone(), model.clone());

        debug!(message_id = %model.id, "Message stored in memory");
        Ok(model)
    }

    #[instrument(skip(self))]
    async fn find_message(&self, message_id: &str) -> Result<Option<MessageModel>, AppError> {
        let table = self.table.lock().await;
        let message = table.messages.get(message_id).cloned();

        if message.is_none() {
            debug!(message_id = %message_id, "Message not found in memory");
        }
        Ok(message)
    }

    #[instrument(skip(self))]
    async fn find_by_room(&self, room_id: &str) -> Result<Vec<MessageModel>, AppError> {
        let table = self.table.lock().await;
        let mut messages: Vec<MessageModel> = table
            .rooms
            .get(room_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| table.messages.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default();

        // stable: equal timestamps keep insertion order
        messages.sort_by_key(|m| m.created_at);

        debug!(room_id = %room_id, count = messages.len(), "Room history read from memory");
        Ok(messages)
    }

    #[instrument(skip(self, message), fields(message_id = %message.id))]
    async fn update_message(&self, message: &MessageModel) -> Result<(), AppError> {
        let mut table = self.table.lock().await;
        match table.messages.get_mut(&message.id) {
            Some(stored) => {
                *stored = message.clone();
                Ok(())
            }
            None => {
                warn!(message_id = %message.id, "Message not found for update in memory");
                Err(AppError::NotFound("Message not found".to_string()))
            }
        }
    }
}

const MESSAGE_COLUMNS: &str = "id, room_id, author, text, kind, file_url, file_name, file_size, status, reactions, created_at";

/// PostgreSQL implementation of message repository
///
/// Reactions are kept in a JSONB array so their order round-trips unchanged.
pub struct PostgresMessageRepository {
    pool: PgPool,
}

impl PostgresMessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the messages table and its room index if they do not exist yet
    pub async fn ensure_schema(&self) -> Result<(), AppError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS messages (
                id UUID PRIMARY KEY,
                seq BIGSERIAL NOT NULL,
                room_id TEXT NOT NULL,
                author TEXT NOT NULL,
                text TEXT NOT NULL,
                kind TEXT NOT NULL DEFAULT 'text',
                file_url TEXT,
                file_name TEXT,
                file_size BIGINT,
                status TEXT NOT NULL,
                reactions JSONB NOT NULL DEFAULT '[]'::jsonb,
                created_at TIMESTAMPTZ NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        // tables created before the insertion sequence existed
        sqlx::query("ALTER TABLE messages ADD COLUMN IF NOT EXISTS seq BIGSERIAL")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS messages_room_seq_idx ON messages (room_id, created_at, seq)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(())
    }

    fn parse_row(row: &PgRow) -> Result<MessageModel, AppError> {
        let db_err = |e: sqlx::Error| AppError::DatabaseError(e.to_string());

        let id: Uuid = row.try_get("id").map_err(db_err)?;
        let kind: String = row.try_get("kind").map_err(db_err)?;
        let status: String = row.try_get("status").map_err(db_err)?;
        let file_size: Option<i64> = row.try_get("file_size").map_err(db_err)?;
        let Json(reactions): Json<Vec<Reaction>> = row.try_get("reactions").map_err(db_err)?;

        Ok(MessageModel {
            id: id.to_string(),
            room_id: row.try_get("room_id").map_err(db_err)?,
            author: row.try_get("author").map_err(db_err)?,
            text: row.try_get("text").map_err(db_err)?,
            kind: MessageKind::from_str(&kind)
                .map_err(|_| AppError::DatabaseError(format!("Unknown message kind: {}", kind)))?,
            file_url: row.try_get("file_url").map_err(db_err)?,
            file_name: row.try_get("file_name").map_err(db_err)?,
            file_size_bytes: file_size.map(|size| size.max(0) as u64),
            status: MessageStatus::from_str(&status).map_err(|_| {
                AppError::DatabaseError(format!("Unknown message status: {}", status))
            })?,
            reactions,
            created_at: row.try_get("created_at").map_err(db_err)?,
        })
    }

    /// Equal timestamps fall back to insertion order via `seq`
    fn room_history_query() -> String {
        format!(
            "SELECT {} FROM messages WHERE room_id = $1 ORDER BY created_at ASC, seq ASC",
            MESSAGE_COLUMNS
        )
    }

    fn parse_id(message_id: &str) -> Option<Uuid> {
        Uuid::parse_str(message_id).ok()
    }
}

#[async_trait]
impl MessageRepository for PostgresMessageRepository {
    #[instrument(skip(self, message), fields(room_id = %message.room_id))]
    async fn insert_message(&self, message: NewMessage) -> Result<MessageModel, AppError> {
        let id = Uuid::new_v4();
        let model = message.into_model(id.to_string());

        sqlx::query(
            "INSERT INTO messages (id, room_id, author, text, kind, file_url, file_name, file_size, status, reactions, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(id)
        .bind(&model.room_id)
        .bind(&model.author)
        .bind(&model.text)
        .bind(model.kind.as_ref())
        .bind(&model.file_url)
        .bind(&model.file_name)
        .bind(model.file_size_bytes.map(|size| size as i64))
        .bind(model.status.as_ref())
        .bind(Json(&model.reactions))
        .bind(model.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to insert message into database");
            AppError::DatabaseError(e.to_string())
        })?;

        debug!(message_id = %model.id, "Message stored in database");
        Ok(model)
    }

    #[instrument(skip(self))]
    async fn find_message(&self, message_id: &str) -> Result<Option<MessageModel>, AppError> {
        // ids that are not UUIDs cannot exist in this table
        let Some(id) = Self::parse_id(message_id) else {
            debug!(message_id = %message_id, "Message id is not a UUID");
            return Ok(None);
        };

        let row = sqlx::query(&format!("SELECT {} FROM messages WHERE id = $1", MESSAGE_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, message_id = %message_id, "Failed to fetch message from database");
                AppError::DatabaseError(e.to_string())
            })?;

        row.as_ref().map(Self::parse_row).transpose()
    }

    #[instrument(skip(self))]
    async fn find_by_room(&self, room_id: &str) -> Result<Vec<MessageModel>, AppError> {
        let rows = sqlx::query(&Self::room_history_query())
        .bind(room_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, room_id = %room_id, "Failed to fetch room history from database");
            AppError::DatabaseError(e.to_string())
        })?;

        rows.iter().map(Self::parse_row).collect()
    }

    #[instrument(skip(self, message), fields(message_id = %message.id))]
    async fn update_message(&self, message: &MessageModel) -> Result<(), AppError> {
        let Some(id) = Self::parse_id(&message.id) else {
            return Err(AppError::NotFound("Message not found".to_string()));
        };

        let result = sqlx::query(
            "UPDATE messages SET text = $2, kind = $3, file_url = $4, file_name = $5, file_size = $6, \
             status = $7, reactions = $8 WHERE id = $1",
        )
        .bind(id)
        .bind(&message.text)
        .bind(message.kind.as_ref())
        .bind(&message.file_url)
        .bind(&message.file_name)
        .bind(message.file_size_bytes.map(|size| size as i64))
        .bind(message.status.as_ref())
        .bind(Json(&message.reactions))
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, message_id = %message.id, "Failed to update message in database");
            AppError::DatabaseError(e.to_string())
        })?;

        if result.rows_affected() == 0 {
            warn!(message_id = %message.id, "Message not found for update");
            return Err(AppError::NotFound("Message not found".to_string()));
        }

        Ok(())
    }
}
