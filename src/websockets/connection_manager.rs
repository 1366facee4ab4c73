use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing::debug;

/// Outbound half of every live connection, keyed by connection id
#[async_trait]
pub trait ConnectionManager: Send + Sync {
    async fn add_connection(&self, connection_id: String, sender: mpsc::UnboundedSender<String>);

    async fn remove_connection(&self, connection_id: &str);

    /// Best effort: unknown or closed connections are skipped silently
    async fn send_to_connection(&self, connection_id: &str, message: &str);

    async fn send_to_connections(&self, connection_ids: &[String], message: &str);

    async fn count_connections(&self) -> usize;
}

pub struct InMemoryConnectionManager {
    // connection_id -> sender
    connections: Arc<RwLock<HashMap<String, mpsc::UnboundedSender<String>>>>,
}

impl Default for InMemoryConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryConnectionManager {
    pub fn new() -> Self {
        Self {
            connections: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl ConnectionManager for InMemoryConnectionManager {
    async fn add_connection(&self, connection_id: String, sender: mpsc::UnboundedSender<String>) {
        let mut connections = self.connections.write().await;
        connections.insert(connection_id, sender);
    }

    async fn remove_connection(&self, connection_id: &str) {
        let mut connections = self.connections.write().await;
        connections.remove(connection_id);
    }

    async fn send_to_connection(&self, connection_id: &str, message: &str) {
        let connections = self.connections.read().await;
        if let Some(sender) = connections.get(connection_id) {
            if sender.send(message.to_string()).is_err() {
                debug!(connection_id = %connection_id, "Dropped message for closing connection");
            }
        }
    }

    async fn send_to_connections(&self, connection_ids: &[String], message: &str) {
        let connections = self.connections.read().await;
        for connection_id in connection_ids {
            if let Some(sender) = connections.get(connection_id) {
                let _ = sender.send(message.to_string());
            }
        }
    }

    async fn count_connections(&self) -> usize {
        self.connections.read().await.len()
    }
}
