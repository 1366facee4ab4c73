use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Author name used for synthetic join/leave notices
pub const SYSTEM_AUTHOR: &str = "System";

/// What a message carries
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MessageKind {
    #[default]
    Text,
    Image,
    File,
}

impl MessageKind {
    /// Uploads with an `image/*` mime type render inline, everything else is a file
    pub fn from_mime(mime: &str) -> Self {
        if mime.trim().to_ascii_lowercase().starts_with("image/") {
            MessageKind::Image
        } else {
            MessageKind::File
        }
    }
}

/// Delivery status. `Seen` is terminal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MessageStatus {
    Sent,
    Seen,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    pub emoji: String,
    #[serde(rename = "user")]
    pub author: String,
}

/// Outcome of applying one author's reaction to a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionChange {
    Added,
    Replaced,
    Removed,
}

/// Attachment metadata for image/file messages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMeta {
    pub url: String,
    pub name: String,
    pub size_bytes: u64,
}

/// Persisted chat message. Field names on the wire match what the web client reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageModel {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "room")]
    pub room_id: String,
    pub author: String,
    pub text: String,
    #[serde(rename = "type", default)]
    pub kind: MessageKind,
    #[serde(rename = "fileUrl", default, skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    #[serde(rename = "fileName", default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(rename = "fileSize", default, skip_serializing_if = "Option::is_none")]
    pub file_size_bytes: Option<u64>,
    pub status: MessageStatus,
    #[serde(default)]
    pub reactions: Vec<Reaction>,
    #[serde(rename = "timestamp")]
    pub created_at: DateTime<Utc>,
}

impl MessageModel {
    /// Moves the status to `Seen`. Returns false when it already was.
    pub fn mark_seen(&mut self) -> bool {
        if self.status == MessageStatus::Seen {
            return false;
        }
        self.status = MessageStatus::Seen;
        true
    }

    /// Toggle semantics keyed by author: same emoji removes, different emoji
    /// replaces in place, no prior reaction appends.
    pub fn apply_reaction(&mut self, emoji: &str, author: &str) -> ReactionChange {
        match self.reactions.iter().position(|r| r.author == author) {
            Some(index) if self.reactions[index].emoji == emoji => {
                self.reactions.remove(index);
                ReactionChange::Removed
            }
            Some(index) => {
                self.reactions[index].emoji = emoji.to_string();
                ReactionChange::Replaced
            }
            None => {
                self.reactions.push(Reaction {
                    emoji: emoji.to_string(),
                    author: author.to_string(),
                });
                ReactionChange::Added
            }
        }
    }

    pub fn reaction_by(&self, author: &str) -> Option<&Reaction> {
        self.reactions.iter().find(|r| r.author == author)
    }
}

/// A message that has not been stored yet; the repository assigns the id
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub room_id: String,
    pub author: String,
    pub text: String,
    pub kind: MessageKind,
    pub file: Option<FileMeta>,
    pub status: MessageStatus,
    pub created_at: DateTime<Utc>,
}

impl NewMessage {
    pub fn into_model(self, id: String) -> MessageModel {
        let (file_url, file_name, file_size_bytes) = match self.file {
            Some(file) => (Some(file.url), Some(file.name), Some(file.size_bytes)),
            None => (None, None, None),
        };

        MessageModel {
            id,
            room_id: self.room_id,
            author: self.author,
            text: self.text,
            kind: self.kind,
            file_url,
            file_name,
            file_size_bytes,
            status: self.status,
            reactions: Vec::new(),
            created_at: self.created_at,
        }
    }
}

/// Join/leave notice broadcast as a `chat message` but never stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemMessage {
    pub author: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl SystemMessage {
    pub fn joined(display_name: &str) -> Self {
        Self::new(format!("{} has joined the chat.", display_name))
    }

    pub fn left(display_name: &str) -> Self {
        Self::new(format!("{} has left the chat.", display_name))
    }

    fn new(text: String) -> Self {
        Self {
            author: SYSTEM_AUTHOR.to_string(),
            text,
            timestamp: Utc::now(),
        }
    }
}
