use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};

use roomchat::websockets::ConnectionManager;

// ============================================================================
// Mock Infrastructure
// ============================================================================

/// Records every frame sent to each connection instead of writing to a socket
#[derive(Clone, Default)]
pub struct MockConnectionManager {
    sent_messages: Arc<RwLock<HashMap<String, Vec<String>>>>,
    connected: Arc<RwLock<Vec<String>>>,
}

impl MockConnectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_messages_for(&self, connection_id: &str) -> Vec<String> {
        self.sent_messages
            .read()
            .await
            .get(connection_id)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn is_connected(&self, connection_id: &str) -> bool {
        self.connected
            .read()
            .await
            .iter()
            .any(|id| id == connection_id)
    }

    pub async fn clear_messages(&self) {
        self.sent_messages.write().await.clear();
    }
}

#[async_trait]
impl ConnectionManager for MockConnectionManager {
    async fn add_connection(&self, connection_id: String, _sender: mpsc::UnboundedSender<String>) {
        self.connected.write().await.push(connection_id);
    }

    async fn remove_connection(&self, connection_id: &str) {
        self.connected
            .write()
            .await
            .retain(|id| id != connection_id);
    }

    async fn send_to_connection(&self, connection_id: &str, message: &str) {
        self.sent_messages
            .write()
            .await
            .entry(connection_id.to_string())
            .or_default()
            .push(message.to_string());
    }

    async fn send_to_connections(&self, connection_ids: &[String], message: &str) {
        for connection_id in connection_ids {
            self.send_to_connection(connection_id, message).await;
        }
    }

    async fn count_connections(&self) -> usize {
        self.connected.read().await.len()
    }
}
