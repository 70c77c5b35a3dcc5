use serde::{Deserialize, Serialize};

use super::store::{PrivateMessage, RoomMessage};

/// Anything that fails to parse is skipped.
#[derive(Debug, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientEvent {
    #[serde(rename = "room:join")]
    JoinRoom { room: String },
    #[serde(rename = "room:leave")]
    LeaveRoom { room: String },
    #[serde(rename = "room:message")]
    RoomMessage { room: String, text: String },
    #[serde(rename = "room:typing")]
    RoomTyping { room: String, is_typing: bool },
    #[serde(rename = "pm:message")]
    PrivateMessage { target: String, text: String },
    #[serde(rename = "pm:typing")]
    PrivateTyping { target: String, is_typing: bool },
}

/// `rooms:list` is always the first frame a freshly admitted connection
/// sees.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    #[serde(rename = "rooms:list")]
    RoomList { rooms: Vec<String> },
    #[serde(rename = "room:members")]
    RoomMembers { room: String, members: Vec<String> },
    #[serde(rename = "room:system")]
    RoomSystem { room: String, message: String },
    #[serde(rename = "room:message")]
    RoomMessage(RoomMessage),
    #[serde(rename = "room:typing")]
    RoomTyping {
        room: String,
        sender: String,
        is_typing: bool,
    },
    #[serde(rename = "pm:message")]
    PrivateMessage(PrivateMessage),
    #[serde(rename = "pm:typing")]
    PrivateTyping {
        sender: String,
        target: String,
        is_typing: bool,
    },
}
