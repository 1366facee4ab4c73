use crate::{
    message::models::SystemMessage,
    presence::{Membership, PresenceRegistry},
    websockets::{broadcaster::RoomBroadcaster, messages::ServerEvent},
};

pub struct RoomAnnouncements;

impl RoomAnnouncements {
    /// Current occupants to everyone in the room
    pub async fn room_users(
        presence: &PresenceRegistry,
        broadcaster: &RoomBroadcaster,
        room_id: &str,
    ) {
        let users = presence.members_of(room_id).await;
        broadcaster
            .broadcast_to_room(room_id, &ServerEvent::RoomUsers(users))
            .await;
    }

    /// Fresh `room_users`, then a "has left" notice, to whoever is still there
    pub async fn departure(
        presence: &PresenceRegistry,
        broadcaster: &RoomBroadcaster,
        membership: &Membership,
    ) {
        Self::room_users(presence, broadcaster, &membership.room_id).await;
        broadcaster
            .broadcast_to_room(
                &membership.room_id,
                &ServerEvent::system(SystemMessage::left(&membership.display_name)),
            )
            .await;
    }
}
