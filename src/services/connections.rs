use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tokio::sync::mpsc::UnboundedSender;

/// One live socket. `identity` stays empty until the client authenticates;
/// the id asserted there is trusted (the caller authenticated upstream).
#[derive(Debug)]
pub struct Connection {
    pub user_id: Option<String>,
    pub display_name: Option<String>,
    sender: UnboundedSender<String>,
}

/// Tracks live connections and their asserted identities, and carries the
/// per-connection direct-reply handles. Broadcast traffic goes over the
/// session-wide channel instead; this map is only for messages addressed to
/// a single participant.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    next_id: u64,
    connections: HashMap<u64, Connection>,
}

pub type SharedConnections = Arc<RwLock<ConnectionRegistry>>;

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fresh connection and hand back its id.
    pub fn register(&mut self, sender: UnboundedSender<String>) -> u64 {
        self.next_id += 1;
        let id = self.next_id;
        self.connections.insert(
            id,
            Connection {
                user_id: None,
                display_name: None,
                sender,
            },
        );
        id
    }

    /// Attach an identity to a connection. Later auths overwrite earlier
    /// ones, which covers a client re-authenticating after a token refresh.
    pub fn authenticate(&mut self, conn_id: u64, user_id: String, display_name: String) -> bool {
        match self.connections.get_mut(&conn_id) {
            Some(conn) => {
                conn.user_id = Some(user_id);
                conn.display_name = Some(display_name);
                true
            }
            None => false,
        }
    }

    /// Drop a connection, returning whoever was attached to it.
    pub fn remove(&mut self, conn_id: u64) -> Option<Connection> {
        self.connections.remove(&conn_id)
    }

    pub fn user_id(&self, conn_id: u64) -> Option<&str> {
        self.connections
            .get(&conn_id)
            .and_then(|c| c.user_id.as_deref())
    }

    pub fn display_name(&self, conn_id: u64) -> Option<&str> {
        self.connections
            .get(&conn_id)
            .and_then(|c| c.display_name.as_deref())
    }

    /// Deliver a message to one connection. A dead receiver is ignored;
    /// cleanup happens when its socket task exits.
    pub fn send_to(&self, conn_id: u64, payload: String) {
        if let Some(conn) = self.connections.get(&conn_id) {
            let _ = conn.sender.send(payload);
        }
    }

    /// Distinct display names of authenticated participants, for the
    /// connected-users broadcast. A user with two tabs open shows up once.
    pub fn display_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .connections
            .values()
            .filter_map(|c| c.display_name.clone())
            .collect();
        names.sort();
        names.dedup();
        names
    }
}
