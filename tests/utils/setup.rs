use std::sync::Arc;

use roomchat::{
    AppConfig, AppState, InMemoryBlobStore, InMemoryMessageRepository, WebsocketReceiveHandler,
};

use super::mocks::MockConnectionManager;

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub struct TestSetup {
    pub state: AppState,
    pub mock_conn_manager: Arc<MockConnectionManager>,
    pub message_repository: Arc<InMemoryMessageRepository>,
    pub input_handler: WebsocketReceiveHandler,
}

pub struct TestSetupBuilder {
    config: AppConfig,
}

impl TestSetupBuilder {
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
        }
    }

    pub fn with_legacy_status_event(mut self) -> Self {
        self.config.legacy_status_event = true;
        self
    }

    pub async fn build(self) -> TestSetup {
        let mock_conn_manager = Arc::new(MockConnectionManager::new());
        let message_repository = Arc::new(InMemoryMessageRepository::new());

        let state = AppState::new(
            self.config,
            message_repository.clone(),
            mock_conn_manager.clone(),
            Arc::new(InMemoryBlobStore::new()),
        );
        let input_handler = WebsocketReceiveHandler::from_state(&state);

        TestSetup {
            state,
            mock_conn_manager,
            message_repository,
            input_handler,
        }
    }
}
