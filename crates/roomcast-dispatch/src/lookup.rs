//! Room existence lookup — the dispatcher's external collaborator.

use std::collections::HashSet;

use roomcast_protocol::RoomId;

/// Answers "does this room canonically exist?".
///
/// Consulted once per inbound message, before persistence. The check is
/// best-effort: a room deleted concurrently with a send may still
/// receive that one message (documented, accepted race — there is no
/// transactional guarantee across collaborators).
pub trait RoomLookup: Send + Sync + 'static {
    /// Returns `true` if the room exists as a relay target.
    fn exists(
        &self,
        room_id: &RoomId,
    ) -> impl std::future::Future<Output = bool> + Send;
}

/// A lookup that accepts every room id.
///
/// For development and for deployments where rooms are purely ad hoc.
/// Unlike the registry's implicit membership entries, this is an
/// explicit policy choice, not a skipped check.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenRooms;

impl RoomLookup for OpenRooms {
    async fn exists(&self, _room_id: &RoomId) -> bool {
        true
    }
}

/// A lookup backed by a fixed set of known rooms.
///
/// Useful in tests and for deployments with a static room roster.
#[derive(Debug, Clone, Default)]
pub struct StaticRooms {
    rooms: HashSet<RoomId>,
}

impl StaticRooms {
    /// Creates a lookup knowing exactly the given rooms.
    pub fn new(rooms: impl IntoIterator<Item = RoomId>) -> Self {
        Self {
            rooms: rooms.into_iter().collect(),
        }
    }
}

impl RoomLookup for StaticRooms {
    async fn exists(&self, room_id: &RoomId) -> bool {
        self.rooms.contains(room_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_rooms_accepts_anything() {
        assert!(OpenRooms.exists(&RoomId::new("whatever")).await);
    }

    #[tokio::test]
    async fn test_static_rooms_knows_only_its_roster() {
        let lookup = StaticRooms::new([RoomId::new("r1")]);

        assert!(lookup.exists(&RoomId::new("r1")).await);
        assert!(!lookup.exists(&RoomId::new("ghost")).await);
    }
}
