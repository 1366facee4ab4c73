use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

/// Where a connection currently is and who it is acting as
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Membership {
    pub room_id: String,
    pub display_name: String,
}

#[derive(Default)]
struct PresenceState {
    // connection_id -> membership
    connections: HashMap<String, Membership>,
    // room_id -> connection ids in join order
    rooms: HashMap<String, Vec<String>>,
}

impl PresenceState {
    fn detach(&mut self, connection_id: &str) -> Option<Membership> {
        let membership = self.connections.remove(connection_id)?;

        if let Some(members) = self.rooms.get_mut(&membership.room_id) {
            members.retain(|id| id != connection_id);
            if members.is_empty() {
                self.rooms.remove(&membership.room_id);
            }
        }

        Some(membership)
    }
}

/// Ephemeral room membership for live connections
///
/// Nothing here is ever persisted. All mutations take the single write lock,
/// so a connection is in at most one room at any instant.
#[derive(Default)]
pub struct PresenceRegistry {
    state: RwLock<PresenceState>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Puts the connection in `room_id` under `display_name`, leaving any other room.
    ///
    /// Returns the previous membership when the connection moved out of a
    /// different room; re-joining the same room returns `None`.
    pub async fn join(
        &self,
        connection_id: &str,
        room_id: &str,
        display_name: &str,
    ) -> Option<Membership> {
        let mut state = self.state.write().await;

        let next = Membership {
            room_id: room_id.to_string(),
            display_name: display_name.to_string(),
        };

        if let Some(current) = state.connections.get_mut(connection_id) {
            if current.room_id == room_id {
                current.display_name = next.display_name;
                return None;
            }
        }

        let previous = state.detach(connection_id);
        state
            .rooms
            .entry(room_id.to_string())
            .or_default()
            .push(connection_id.to_string());
        state.connections.insert(connection_id.to_string(), next);

        debug!(
            connection_id = %connection_id,
            room_id = %room_id,
            previous_room = ?previous.as_ref().map(|m| &m.room_id),
            "Connection joined room"
        );

        previous
    }

    /// Removes the connection from its room, returning where it was
    pub async fn leave(&self, connection_id: &str) -> Option<Membership> {
        let left = self.state.write().await.detach(connection_id);

        if let Some(membership) = &left {
            debug!(
                connection_id = %connection_id,
                room_id = %membership.room_id,
                "Connection left room"
            );
        }

        left
    }

    pub async fn membership_of(&self, connection_id: &str) -> Option<Membership> {
        self.state.read().await.connections.get(connection_id).cloned()
    }

    /// Display names present in the room, deduplicated, in order of first join
    pub async fn members_of(&self, room_id: &str) -> Vec<String> {
        let state = self.state.read().await;
        let mut names: Vec<String> = Vec::new();

        for connection_id in state.rooms.get(room_id).into_iter().flatten() {
            if let Some(membership) = state.connections.get(connection_id) {
                if !names.contains(&membership.display_name) {
                    names.push(membership.display_name.clone());
                }
            }
        }

        names
    }

    /// Connection ids in the room, in join order
    pub async fn connections_in(&self, room_id: &str) -> Vec<String> {
        self.state
            .read()
            .await
            .rooms
            .get(room_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of connections (not distinct names) in the room
    pub async fn count_of(&self, room_id: &str) -> usize {
        self.state
            .read()
            .await
            .rooms
            .get(room_id)
            .map(Vec::len)
            .unwrap_or(0)
    }
}
