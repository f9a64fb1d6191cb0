//! The membership registry: who is in which room.

use std::collections::{HashMap, HashSet};

use roomcast_protocol::RoomId;
use roomcast_transport::ConnectionId;

/// Tracks the bidirectional mapping between connections and rooms.
///
/// Rooms are created implicitly on first join and vanish when their last
/// member leaves, so every room in the map has at least one member.
///
/// # Concurrency note
///
/// `RoomRegistry` is NOT thread-safe by itself — plain `HashMap`s, not
/// concurrent ones. This is intentional: the owner wraps it in a single
/// `tokio::sync::Mutex`, which is exactly the mutual-exclusion discipline
/// the membership maps need. One lock guarding both maps is also what
/// makes the bidirectional invariant easy to keep: no caller can ever
/// observe one side updated without the other.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    /// Member sets, keyed by room. Never contains an empty set.
    members: HashMap<RoomId, HashSet<ConnectionId>>,

    /// The rooms each connection has joined. Mirror of `members`.
    joined: HashMap<ConnectionId, HashSet<RoomId>>,
}

impl RoomRegistry {
    /// Creates a new, empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a connection to a room, creating the room entry if this is
    /// its first member.
    ///
    /// Idempotent: joining a room twice has no additional effect.
    /// Returns `true` if membership actually changed.
    pub fn join(&mut self, conn_id: ConnectionId, room_id: RoomId) -> bool {
        let inserted = self
            .members
            .entry(room_id.clone())
            .or_default()
            .insert(conn_id);
        if inserted {
            self.joined
                .entry(conn_id)
                .or_default()
                .insert(room_id.clone());
            tracing::debug!(
                %conn_id,
                %room_id,
                members = self.members[&room_id].len(),
                "joined room"
            );
        }
        inserted
    }

    /// Removes a connection from a room.
    ///
    /// Idempotent: a no-op if the connection is not a member. Returns
    /// `true` if membership actually changed.
    pub fn leave(&mut self, conn_id: ConnectionId, room_id: &RoomId) -> bool {
        let removed = match self.members.get_mut(room_id) {
            Some(set) => set.remove(&conn_id),
            None => false,
        };
        if removed {
            // Drop empty entries so rooms only exist while populated.
            if self.members[room_id].is_empty() {
                self.members.remove(room_id);
            }
            if let Some(rooms) = self.joined.get_mut(&conn_id) {
                rooms.remove(room_id);
                if rooms.is_empty() {
                    self.joined.remove(&conn_id);
                }
            }
            tracing::debug!(%conn_id, %room_id, "left room");
        }
        removed
    }

    /// Removes a connection from every room it belongs to and returns
    /// the rooms it left. Used on disconnect.
    ///
    /// Each removal is independent — the whole sweep always runs to
    /// completion.
    pub fn leave_all(&mut self, conn_id: ConnectionId) -> Vec<RoomId> {
        let rooms: Vec<RoomId> = self
            .joined
            .get(&conn_id)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();

        for room_id in &rooms {
            self.leave(conn_id, room_id);
        }
        rooms
    }

    /// Returns a point-in-time snapshot of a room's members.
    ///
    /// A copy, not a live view — callers iterate it freely while other
    /// connections join and leave.
    pub fn members_of(&self, room_id: &RoomId) -> Vec<ConnectionId> {
        self.members
            .get(room_id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Returns a snapshot of the rooms a connection has joined.
    pub fn rooms_of(&self, conn_id: ConnectionId) -> Vec<RoomId> {
        self.joined
            .get(&conn_id)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Returns `true` if the connection is a member of the room.
    pub fn is_member(&self, conn_id: ConnectionId, room_id: &RoomId) -> bool {
        self.members
            .get(room_id)
            .is_some_and(|set| set.contains(&conn_id))
    }

    /// Number of rooms that currently have at least one member.
    pub fn room_count(&self) -> usize {
        self.members.len()
    }

    /// Number of members in a room (0 if it has none).
    pub fn member_count(&self, room_id: &RoomId) -> usize {
        self.members.get(room_id).map_or(0, HashSet::len)
    }
}

// =========================================================================
// Tests
// =========================================================================
