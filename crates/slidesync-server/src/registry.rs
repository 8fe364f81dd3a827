//! Membership registry: which connection sits in which role-room, plus the
//! outbound queue used to reach it.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use slidesync_common::{ConnectionId, Role, ServerMessage};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// A connection that has declared its role.
#[derive(Debug, Clone)]
pub struct ClientSession {
    pub connection: ConnectionId,
    pub role: Role,
    pub joined_at: Instant,
}

/// Result of a `join-room` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// First join on this connection; a snapshot is owed.
    Joined,
    /// Same role requested again; nothing changes.
    AlreadyJoined,
    /// The connection already holds the other role.
    RoleConflict { current: Role },
    /// The connection was never attached or is already gone.
    UnknownConnection,
}

struct Peer {
    tx: mpsc::Sender<ServerMessage>,
    session: Option<ClientSession>,
}

#[derive(Default)]
pub struct MembershipRegistry {
    peers: HashMap<ConnectionId, Peer>,
    rooms: HashMap<Role, HashSet<ConnectionId>>,
}

impl MembershipRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a freshly opened transport connection. It belongs to no
    /// room until it joins.
    pub fn attach(&mut self, connection: ConnectionId, tx: mpsc::Sender<ServerMessage>) {
        self.peers.insert(connection, Peer { tx, session: None });
    }

    pub fn join(&mut self, connection: ConnectionId, role: Role) -> JoinOutcome {
        let Some(peer) = self.peers.get_mut(&connection) else {
            return JoinOutcome::UnknownConnection;
        };
        match &peer.session {
            Some(session) if session.role == role => JoinOutcome::AlreadyJoined,
            Some(session) => JoinOutcome::RoleConflict {
                current: session.role,
            },
            None => {
                peer.session = Some(ClientSession {
                    connection,
                    role,
                    joined_at: Instant::now(),
                });
                self.rooms.entry(role).or_default().insert(connection);
                JoinOutcome::Joined
            }
        }
    }

    /// Forget a connection and drop it from its room.
    pub fn detach(&mut self, connection: ConnectionId) -> Option<ClientSession> {
        let session = self.peers.remove(&connection)?.session?;
        if let Some(room) = self.rooms.get_mut(&session.role) {
            room.remove(&connection);
        }
        Some(session)
    }

    pub fn session(&self, connection: ConnectionId) -> Option<&ClientSession> {
        self.peers.get(&connection)?.session.as_ref()
    }

    pub fn role_of(&self, connection: ConnectionId) -> Option<Role> {
        self.session(connection).map(|s| s.role)
    }

    pub fn room_size(&self, role: Role) -> usize {
        self.rooms.get(&role).map_or(0, HashSet::len)
    }

    /// Number of attached connections, joined or not.
    pub fn connection_count(&self) -> usize {
        self.peers.len()
    }

    /// Queue a message for one connection. Never waits: a full queue drops
    /// the message.
    pub fn send_to(&self, connection: ConnectionId, message: ServerMessage) -> bool {
        match self.peers.get(&connection) {
            Some(peer) => deliver(connection, &peer.tx, message),
            None => false,
        }
    }

    /// Queue a message for every member of a room. Returns the number of
    /// deliveries that were queued.
    pub fn send_to_room(&self, role: Role, message: &ServerMessage) -> usize {
        let Some(room) = self.rooms.get(&role) else {
            return 0;
        };
        let mut delivered = 0;
        for conn in room {
            if let Some(peer) = self.peers.get(conn) {
                if deliver(*conn, &peer.tx, message.clone()) {
                    delivered += 1;
                }
            }
        }
        delivered
    }
}

fn deliver(connection: ConnectionId, tx: &mpsc::Sender<ServerMessage>, message: ServerMessage) -> bool {
    match tx.try_send(message) {
        Ok(()) => true,
        Err(TrySendError::Full(_)) => {
            tracing::warn!(conn = %connection, "Outbound queue full, dropping message");
            false
        }
        Err(TrySendError::Closed(_)) => {
            tracing::debug!(conn = %connection, "Outbound queue closed");
            false
        }
    }
}
