pub mod event;
pub mod presence;
pub mod registry;
pub mod session;
pub mod store;
mod ws;

use std::sync::{Mutex, MutexGuard, PoisonError};

use axum::{Router, routing::get};

use crate::AppState;
use crate::config::RoomConfig;
use self::event::ServerEvent;
use self::presence::RoomPresence;
use self::registry::{ConnId, ConnectionRegistry, OutboundSender};
use self::store::HistoryStore;

pub fn router() -> Router<AppState> {
    Router::new().route("/ws", get(ws::chat_ws))
}

/// Shared chat core: connection registry, room presence, and the fanout
/// that persists and routes. The mutexes guard short non-suspending
/// sections only; the durable write is the sole await point and always
/// happens with both locks released.
pub struct ChatState {
    rooms: RoomConfig,
    registry: Mutex<ConnectionRegistry>,
    presence: Mutex<RoomPresence>,
    history: HistoryStore,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ChatState {
    pub fn new(rooms: RoomConfig, history: HistoryStore) -> Self {
        Self {
            rooms,
            registry: Mutex::new(ConnectionRegistry::default()),
            presence: Mutex::new(RoomPresence::default()),
            history,
        }
    }

    pub fn rooms(&self) -> &RoomConfig {
        &self.rooms
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn register(&self, identity: &str, conn: ConnId, sender: OutboundSender) {
        lock(&self.registry).register(identity, conn, sender);
    }

    pub fn unregister(&self, identity: &str, conn: ConnId) {
        lock(&self.registry).unregister(identity, conn);
    }

    pub fn is_registered(&self, identity: &str) -> bool {
        lock(&self.registry).contains(identity)
    }

    // Snapshot is taken right after the mutation, under the same lock.
    pub(crate) fn presence_join(&self, room: &str, identity: &str) -> Vec<String> {
        let mut presence = lock(&self.presence);
        presence.join(room, identity);
        presence.members_of(room)
    }

    pub(crate) fn presence_leave(&self, room: &str, identity: &str) -> Vec<String> {
        let mut presence = lock(&self.presence);
        presence.leave(room, identity);
        presence.members_of(room)
    }

    pub fn members_of(&self, room: &str) -> Vec<String> {
        lock(&self.presence).members_of(room)
    }

    pub fn is_room_tracked(&self, room: &str) -> bool {
        lock(&self.presence).is_tracked(room)
    }

    fn room_audience(&self, room: &str, except: Option<&str>) -> Vec<OutboundSender> {
        let members = lock(&self.presence).members_of(room);
        let registry = lock(&self.registry);
        members
            .iter()
            .filter(|member| except != Some(member.as_str()))
            .flat_map(|member| registry.connections_of(member))
            .collect()
    }

    fn identity_audience(&self, identity: &str) -> Vec<OutboundSender> {
        lock(&self.registry).connections_of(identity)
    }

    fn deliver(audience: Vec<OutboundSender>, event: &ServerEvent) {
        for sender in audience {
            // A closed channel is a connection that died mid-fanout.
            let _ = sender.send(event.clone());
        }
    }

    pub(crate) fn broadcast_to_room(&self, room: &str, event: &ServerEvent) {
        Self::deliver(self.room_audience(room, None), event);
    }

    /// Write first, broadcast second; nothing goes out on a failed write.
    /// The sender's own connections are part of the room audience.
    pub async fn send_room_message(&self, sender: &str, room: &str, text: &str) -> sqlx::Result<()> {
        if room.is_empty() || text.is_empty() {
            return Ok(());
        }
        let message = self.history.append_room_message(room, sender, text).await?;
        self.broadcast_to_room(room, &ServerEvent::RoomMessage(message));
        Ok(())
    }

    /// The two registry lookups are deliberate: a self-addressed message
    /// arrives twice.
    pub async fn send_private_message(
        &self,
        sender: &str,
        target: &str,
        text: &str,
    ) -> sqlx::Result<()> {
        if target.is_empty() || text.is_empty() {
            return Ok(());
        }
        let message = self.history.append_private_message(sender, target, text).await?;
        let event = ServerEvent::PrivateMessage(message);
        Self::deliver(self.identity_audience(sender), &event);
        Self::deliver(self.identity_audience(target), &event);
        Ok(())
    }

    /// Ephemeral; the originator's connections never hear it.
    pub fn room_typing(&self, sender: &str, room: &str, is_typing: bool) {
        if room.is_empty() {
            return;
        }
        let event = ServerEvent::RoomTyping {
            room: room.to_owned(),
            sender: sender.to_owned(),
            is_typing,
        };
        Self::deliver(self.room_audience(room, Some(sender)), &event);
    }

    /// Ephemeral; target's connections only.
    pub fn private_typing(&self, sender: &str, target: &str, is_typing: bool) {
        if target.is_empty() {
            return;
        }
        let event = ServerEvent::PrivateTyping {
            sender: sender.to_owned(),
            target: target.to_owned(),
            is_typing,
        };
        Self::deliver(self.identity_audience(target), &event);
    }
}
