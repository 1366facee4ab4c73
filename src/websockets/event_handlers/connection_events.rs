use std::sync::Arc;
use tracing::{debug, info};

use crate::{presence::PresenceRegistry, websockets::broadcaster::RoomBroadcaster};

use super::shared::RoomAnnouncements;

pub struct ConnectionEventHandlers {
    presence: Arc<PresenceRegistry>,
    broadcaster: RoomBroadcaster,
}

impl ConnectionEventHandlers {
    pub fn new(presence: Arc<PresenceRegistry>, broadcaster: RoomBroadcaster) -> Self {
        Self {
            presence,
            broadcaster,
        }
    }

    /// Drops the connection's membership and tells the room it left
    pub async fn handle_disconnect(&self, connection_id: &str) {
        let Some(membership) = self.presence.leave(connection_id).await else {
            debug!(connection_id = %connection_id, "Disconnected before joining a room");
            return;
        };

        info!(
            connection_id = %connection_id,
            room_id = %membership.room_id,
            display_name = %membership.display_name,
            "Left room on disconnect"
        );

        RoomAnnouncements::departure(&self.presence, &self.broadcaster, &membership).await;
    }
}
