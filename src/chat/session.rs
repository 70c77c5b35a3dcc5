use super::ChatState;
use super::event::ServerEvent;
use super::registry::ConnId;

/// Per-connection room coordinator: `unbound` or joined to exactly one
/// room. Owned by the socket task, never shared.
pub struct RoomSession {
    conn: ConnId,
    identity: String,
    joined: Option<String>,
}

impl RoomSession {
    pub fn new(conn: ConnId, identity: String) -> Self {
        Self {
            conn,
            identity,
            joined: None,
        }
    }

    pub fn joined_room(&self) -> Option<&str> {
        self.joined.as_deref()
    }

    /// Unconfigured room names are ignored. Any currently joined room
    /// (the target itself included) is implicitly left first.
    pub fn join(&mut self, chat: &ChatState, room: &str) {
        if !chat.rooms().contains(room) {
            return;
        }
        if let Some(old) = self.joined.take() {
            self.depart(chat, &old);
        }

        let members = chat.presence_join(room, &self.identity);
        chat.broadcast_to_room(
            room,
            &ServerEvent::RoomSystem {
                room: room.to_owned(),
                message: format!("{} joined the room.", self.identity),
            },
        );
        chat.broadcast_to_room(
            room,
            &ServerEvent::RoomMembers {
                room: room.to_owned(),
                members,
            },
        );
        self.joined = Some(room.to_owned());
    }

    /// Fires its broadcasts on every call, member or not.
    pub fn leave(&mut self, chat: &ChatState, room: &str) {
        if room.is_empty() {
            return;
        }
        if self.joined.as_deref() == Some(room) {
            self.joined = None;
        }
        self.depart(chat, room);
    }

    /// Remaining members get a membership snapshot but no "left the
    /// room" notice; that notice only accompanies leaves.
    pub fn disconnect(mut self, chat: &ChatState) {
        if let Some(room) = self.joined.take() {
            let members = chat.presence_leave(&room, &self.identity);
            chat.broadcast_to_room(
                &room,
                &ServerEvent::RoomMembers {
                    room: room.clone(),
                    members,
                },
            );
        }
        chat.unregister(&self.identity, self.conn);
    }

    // Leave order: snapshot first, then the notice (joins are reversed).
    fn depart(&self, chat: &ChatState, room: &str) {
        let members = chat.presence_leave(room, &self.identity);
        chat.broadcast_to_room(
            room,
            &ServerEvent::RoomMembers {
                room: room.to_owned(),
                members,
            },
        );
        chat.broadcast_to_room(
            room,
            &ServerEvent::RoomSystem {
                room: room.to_owned(),
                message: format!("{} left the room.", self.identity),
            },
        );
    }
}
