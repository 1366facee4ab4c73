//! Test assertion helpers - fluent API for verifying test expectations
#![allow(dead_code)] // Test utilities may not all be used in every test

use roomchat::{
    websockets::{messages::ChatEntry, ServerEvent},
    MessageModel,
};

use super::setup::TestSetup;

// ============================================================================
// Assertion Helpers
// ============================================================================

pub struct MessageAssertion<'a> {
    setup: &'a TestSetup,
    connections: Vec<&'a str>,
}

impl<'a> MessageAssertion<'a> {
    /// Create an assertion for specific connections
    pub fn for_connections(setup: &'a TestSetup, connections: Vec<&'a str>) -> Self {
        Self { setup, connections }
    }

    async fn events_for(&self, connection_id: &str) -> Vec<ServerEvent> {
        self.setup
            .mock_conn_manager
            .get_messages_for(connection_id)
            .await
            .iter()
            .enumerate()
            .map(|(i, frame)| {
                serde_json::from_str(frame).unwrap_or_else(|e| {
                    panic!("Failed to parse frame {} for {}: {}", i, connection_id, e)
                })
            })
            .collect()
    }

    /// Assert that every connection received exactly these event names, in order
    pub async fn received_event_sequence(self, expected: Vec<&str>) -> Vec<ServerEvent> {
        let mut first = vec![];

        for (index, connection_id) in self.connections.iter().enumerate() {
            let events = self.events_for(connection_id).await;
            let names: Vec<&str> = events.iter().map(|e| e.event_name()).collect();
            assert_eq!(
                names, expected,
                "{} received the wrong event sequence",
                connection_id
            );
            if index == 0 {
                first = events;
            }
        }

        first
    }

    /// Assert that connections received no messages
    pub async fn received_no_messages(self) {
        for connection_id in &self.connections {
            let messages = self
                .setup
                .mock_conn_manager
                .get_messages_for(connection_id)
                .await;
            assert!(
                messages.is_empty(),
                "{} should not have received any messages, got {:?}",
                connection_id,
                messages
            );
        }
    }
}

// ============================================================================
// Event Content Helpers
// ============================================================================

pub fn stored_message(event: &ServerEvent) -> &MessageModel {
    match event {
        ServerEvent::ChatMessage(ChatEntry::Stored(message)) => message,
        other => panic!("expected a stored chat message, got {:?}", other),
    }
}

pub fn system_text(event: &ServerEvent) -> &str {
    match event {
        ServerEvent::ChatMessage(ChatEntry::System(notice)) => &notice.text,
        other => panic!("expected a system message, got {:?}", other),
    }
}

pub fn updated_message(event: &ServerEvent) -> &MessageModel {
    match event {
        ServerEvent::MessageUpdated(message) | ServerEvent::MessageStatusUpdated(message) => {
            message
        }
        other => panic!("expected message_updated, got {:?}", other),
    }
}

pub fn room_users(event: &ServerEvent) -> Vec<&str> {
    match event {
        ServerEvent::RoomUsers(users) => users.iter().map(String::as_str).collect(),
        other => panic!("expected room_users, got {:?}", other),
    }
}
