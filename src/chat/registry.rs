use std::collections::HashMap;

use tokio::sync::mpsc;
use uuid::Uuid;

use super::event::ServerEvent;

/// Outbound half of one live socket; unbounded so fanout never blocks a
/// critical section.
pub type OutboundSender = mpsc::UnboundedSender<ServerEvent>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnId(Uuid);

impl ConnId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for ConnId {
    fn default() -> Self {
        Self::new()
    }
}

/// Identity -> its live connections. An entry exists iff at least one
/// connection is live.
#[derive(Default)]
pub struct ConnectionRegistry {
    conns: HashMap<String, HashMap<ConnId, OutboundSender>>,
}

impl ConnectionRegistry {
    pub fn register(&mut self, identity: &str, conn: ConnId, sender: OutboundSender) {
        self.conns
            .entry(identity.to_owned())
            .or_default()
            .insert(conn, sender);
    }

    // Removing an unknown pair is a no-op.
    pub fn unregister(&mut self, identity: &str, conn: ConnId) {
        if let Some(set) = self.conns.get_mut(identity) {
            set.remove(&conn);
            if set.is_empty() {
                self.conns.remove(identity);
            }
        }
    }

    pub fn connections_of(&self, identity: &str) -> Vec<OutboundSender> {
        self.conns
            .get(identity)
            .map(|set| set.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.conns.contains_key(identity)
    }
}
