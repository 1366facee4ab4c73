use serde::{Deserialize, Serialize};

use crate::message::models::{MessageKind, MessageModel, SystemMessage};

/// Client -> Server events.
///
/// Each frame is `{"event": <name>, "data": <payload>}`. Missing string fields
/// decode as empty so the router can report them as validation failures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientEvent {
    #[serde(rename = "join_room")]
    JoinRoom(JoinRoomPayload),
    #[serde(rename = "chat message")]
    ChatMessage(ChatMessagePayload),
    #[serde(rename = "message_seen")]
    MessageSeen(MessageRef),
    #[serde(rename = "message_reacted")]
    MessageReacted(MessageReactedPayload),
    #[serde(rename = "typing_start")]
    TypingStart(TypingPayload),
    #[serde(rename = "typing_stop")]
    TypingStop(TypingPayload),
}

impl ClientEvent {
    pub fn event_name(&self) -> &'static str {
        match self {
            ClientEvent::JoinRoom(_) => "join_room",
            ClientEvent::ChatMessage(_) => "chat message",
            ClientEvent::MessageSeen(_) => "message_seen",
            ClientEvent::MessageReacted(_) => "message_reacted",
            ClientEvent::TypingStart(_) => "typing_start",
            ClientEvent::TypingStop(_) => "typing_stop",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JoinRoomPayload {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub room: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatMessagePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default, alias = "type")]
    pub kind: MessageKind,
}

/// A message id, sent either bare or as `{"messageId": ...}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageRef {
    Id(String),
    Object {
        #[serde(rename = "messageId")]
        message_id: String,
    },
}

impl MessageRef {
    pub fn id(&self) -> &str {
        match self {
            MessageRef::Id(id) => id,
            MessageRef::Object { message_id } => message_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageReactedPayload {
    #[serde(rename = "messageId")]
    pub message_id: String,
    pub reaction: ReactionPayload,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReactionPayload {
    #[serde(default)]
    pub emoji: String,
    #[serde(default)]
    pub user: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TypingPayload {
    #[serde(default)]
    pub room: String,
    #[serde(default)]
    pub username: String,
}

/// Server -> Client events, same `{"event", "data"}` envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    #[serde(rename = "chat_history")]
    ChatHistory(Vec<MessageModel>),
    #[serde(rename = "chat message")]
    ChatMessage(ChatEntry),
    #[serde(rename = "room_users")]
    RoomUsers(Vec<String>),
    #[serde(rename = "message_updated")]
    MessageUpdated(MessageModel),
    #[serde(rename = "message_status_updated")]
    MessageStatusUpdated(MessageModel),
    #[serde(rename = "typing_start")]
    TypingStart(String),
    #[serde(rename = "typing_stop")]
    TypingStop(String),
    #[serde(rename = "error")]
    Error(ErrorPayload),
}

/// What a `chat message` event carries: a stored message or a system notice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatEntry {
    Stored(MessageModel),
    System(SystemMessage),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub message: String,
}

impl ServerEvent {
    pub fn stored(message: MessageModel) -> Self {
        ServerEvent::ChatMessage(ChatEntry::Stored(message))
    }

    pub fn system(message: SystemMessage) -> Self {
        ServerEvent::ChatMessage(ChatEntry::System(message))
    }

    pub fn error(message: impl Into<String>) -> Self {
        ServerEvent::Error(ErrorPayload {
            message: message.into(),
        })
    }

    pub fn event_name(&self) -> &'static str {
        match self {
            ServerEvent::ChatHistory(_) => "chat_history",
            ServerEvent::ChatMessage(_) => "chat message",
            ServerEvent::RoomUsers(_) => "room_users",
            ServerEvent::MessageUpdated(_) => "message_updated",
            ServerEvent::MessageStatusUpdated(_) => "message_status_updated",
            ServerEvent::TypingStart(_) => "typing_start",
            ServerEvent::TypingStop(_) => "typing_stop",
            ServerEvent::Error(_) => "error",
        }
    }
}
