use std::collections::{BTreeSet, HashMap};

/// Room name -> identities currently joined. An entry exists iff the room
/// has members; absence means empty, never invalid. Members are kept
/// sorted so snapshots are deterministic on the wire.
#[derive(Default)]
pub struct RoomPresence {
    rooms: HashMap<String, BTreeSet<String>>,
}

impl RoomPresence {
    // Set semantics: re-joining is not a duplicate. Callers still fire
    // their notifications on every call.
    pub fn join(&mut self, room: &str, identity: &str) {
        self.rooms
            .entry(room.to_owned())
            .or_default()
            .insert(identity.to_owned());
    }

    // Removing the last member drops the entry; the room stays joinable.
    pub fn leave(&mut self, room: &str, identity: &str) {
        if let Some(members) = self.rooms.get_mut(room) {
            members.remove(identity);
            if members.is_empty() {
                self.rooms.remove(room);
            }
        }
    }

    pub fn members_of(&self, room: &str) -> Vec<String> {
        self.rooms
            .get(room)
            .map(|members| members.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn is_tracked(&self, room: &str) -> bool {
        self.rooms.contains_key(room)
    }
}
