use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::blob::BlobStore;
use crate::config::AppConfig;
use crate::message::{repository::MessageRepository, service::MessageService};
use crate::presence::PresenceRegistry;
use crate::websockets::{ConnectionManager, RoomBroadcaster};

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub presence: Arc<PresenceRegistry>,
    pub connection_manager: Arc<dyn ConnectionManager>,
    pub broadcaster: RoomBroadcaster,
    pub message_service: Arc<MessageService>,
    pub blob_store: Arc<dyn BlobStore + Send + Sync>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        message_repository: Arc<dyn MessageRepository + Send + Sync>,
        connection_manager: Arc<dyn ConnectionManager>,
        blob_store: Arc<dyn BlobStore + Send + Sync>,
    ) -> Self {
        let presence = Arc::new(PresenceRegistry::new());
        let broadcaster = RoomBroadcaster::new(Arc::clone(&presence), Arc::clone(&connection_manager));
        let message_service = Arc::new(MessageService::new(
            message_repository,
            Arc::clone(&presence),
        ));

        Self {
            config: Arc::new(config),
            presence,
            connection_manager,
            broadcaster,
            message_service,
            blob_store,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Missing payload: {0}")]
    MissingPayload(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::MissingPayload(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg),
            AppError::DatabaseError(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Database error: {}", msg),
            ),
            AppError::StorageError(msg) => (
                StatusCode::BAD_GATEWAY,
                format!("Storage error: {}", msg),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
pub mod test_utils {
    use super::*;
    use crate::blob::InMemoryBlobStore;
    use crate::message::repository::InMemoryMessageRepository;
    use crate::websockets::InMemoryConnectionManager;

    /// Builder for creating AppState with overrides for testing
    pub struct AppStateBuilder {
        config: AppConfig,
        message_repository: Option<Arc<dyn MessageRepository + Send + Sync>>,
        connection_manager: Option<Arc<dyn ConnectionManager>>,
        blob_store: Option<Arc<dyn BlobStore + Send + Sync>>,
    }

    impl AppStateBuilder {
        pub fn new() -> Self {
            Self {
                config: AppConfig::default(),
                message_repository: None,
                connection_manager: None,
                blob_store: None,
            }
        }

        pub fn with_config(mut self, config: AppConfig) -> Self {
            self.config = config;
            self
        }

        pub fn with_message_repository(
            mut self,
            repo: Arc<dyn MessageRepository + Send + Sync>,
        ) -> Self {
            self.message_repository = Some(repo);
            self
        }

        pub fn with_connection_manager(mut self, manager: Arc<dyn ConnectionManager>) -> Self {
            self.connection_manager = Some(manager);
            self
        }

        pub fn with_blob_store(mut self, store: Arc<dyn BlobStore + Send + Sync>) -> Self {
            self.blob_store = Some(store);
            self
        }

        pub fn build(self) -> AppState {
            AppState::new(
                self.config,
                self.message_repository
                    .unwrap_or_else(|| Arc::new(InMemoryMessageRepository::new())),
                self.connection_manager
                    .unwrap_or_else(|| Arc::new(InMemoryConnectionManager::new())),
                self.blob_store
                    .unwrap_or_else(|| Arc::new(InMemoryBlobStore::new())),
            )
        }
    }

    impl Default for AppStateBuilder {
        fn default() -> Self {
            Self::new()
        }
    }
}
