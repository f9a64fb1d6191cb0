//! The connection manager: tracks every live connection.
//!
//! Responsibilities:
//! - Tracking each connection under its transport-assigned id
//! - Holding each connection's outbound event channel
//! - Attaching the authenticated identity once verification succeeds
//! - Unregistering on disconnect and sweeping room memberships
//!
//! # Concurrency note
//!
//! `ConnectionManager` is NOT thread-safe by itself — it uses a plain
//! `HashMap`, not a concurrent one. This is intentional: the gateway
//! wraps it in a `tokio::sync::Mutex` and never holds that lock across
//! an await on an external collaborator, so auth or store latency can
//! never stall other connections' bookkeeping.

use std::collections::HashMap;

use roomcast_protocol::{ServerEvent, UserId};
use roomcast_registry::RoomRegistry;
use roomcast_transport::ConnectionId;
use tokio::sync::mpsc;

use crate::SessionError;

/// Channel sender for pushing outbound events to one connection's
/// writer task. Unbounded so fan-out never blocks on a slow member;
/// the writer applies its own per-write deadline.
pub type EventSink = mpsc::UnboundedSender<ServerEvent>;

/// One live connection's bookkeeping entry.
struct ConnectionEntry {
    /// Verified identity, `None` until authentication succeeds.
    user_id: Option<UserId>,
    /// Handle for delivering events to this connection.
    outbound: EventSink,
}

/// Tracks all live connections and their authenticated identity.
#[derive(Default)]
pub struct ConnectionManager {
    connections: HashMap<ConnectionId, ConnectionEntry>,
}

impl ConnectionManager {
    /// Creates a new, empty manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new connection under its transport-assigned id.
    ///
    /// The transport is the sole mint of connection ids and never
    /// reuses one for the life of the process, so the same client logs
    /// under one id from accept to teardown. Never fails; the
    /// connection starts anonymous.
    pub fn register(&mut self, conn_id: ConnectionId, outbound: EventSink) {
        self.connections.insert(
            conn_id,
            ConnectionEntry {
                user_id: None,
                outbound,
            },
        );
        tracing::info!(%conn_id, live = self.connections.len(), "connection registered");
    }

    /// Attaches a verified identity to a connection.
    ///
    /// Called after the auth collaborator accepted the credential (the
    /// verification itself runs outside the manager lock, see the
    /// crate-level concurrency note).
    ///
    /// # Errors
    /// Returns [`SessionError::NotFound`] if the connection was already
    /// unregistered — verification raced with a disconnect.
    pub fn attach_user(
        &mut self,
        conn_id: ConnectionId,
        user_id: UserId,
    ) -> Result<(), SessionError> {
        let entry = self
            .connections
            .get_mut(&conn_id)
            .ok_or(SessionError::NotFound(conn_id))?;
        entry.user_id = Some(user_id.clone());
        tracing::info!(%conn_id, %user_id, "connection authenticated");
        Ok(())
    }

    /// Unregisters a connection and removes it from every room it had
    /// joined.
    ///
    /// Idempotent — the second call is a no-op and returns `false`.
    /// Always runs to completion: the registry sweep removes each room
    /// membership independently.
    pub fn unregister(
        &mut self,
        conn_id: ConnectionId,
        rooms: &mut RoomRegistry,
    ) -> bool {
        if self.connections.remove(&conn_id).is_none() {
            return false;
        }
        let left = rooms.leave_all(conn_id);
        tracing::info!(
            %conn_id,
            rooms_left = left.len(),
            live = self.connections.len(),
            "connection unregistered"
        );
        true
    }

    /// Returns the connection's authenticated identity, if any.
    pub fn user_of(&self, conn_id: ConnectionId) -> Option<UserId> {
        self.connections
            .get(&conn_id)
            .and_then(|entry| entry.user_id.clone())
    }

    /// Returns a handle for delivering events to the connection.
    ///
    /// `None` if the connection is gone — callers treat that as a
    /// per-member delivery failure.
    pub fn outbound(&self, conn_id: ConnectionId) -> Option<EventSink> {
        self.connections
            .get(&conn_id)
            .map(|entry| entry.outbound.clone())
    }

    /// Returns `true` if the connection is live.
    pub fn contains(&self, conn_id: ConnectionId) -> bool {
        self.connections.contains_key(&conn_id)
    }

    /// Number of live connections.
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Returns `true` if there are no live connections.
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! Unit tests for `ConnectionManager`, following the
    //! `test_{function}_{scenario}_{expected}` naming convention.

    use super::*;
    use roomcast_protocol::RoomId;

    fn sink() -> EventSink {
        mpsc::unbounded_channel().0
    }

    fn cid(n: u64) -> ConnectionId {
        ConnectionId::new(n)
    }

    // =====================================================================
    // register()
    // =====================================================================

    #[test]
    fn test_register_tracks_under_the_given_id() {
        // The transport-assigned id is the one identity a connection
        // has; the manager never mints its own.
        let mut mgr = ConnectionManager::new();

        mgr.register(cid(7), sink());
        mgr.register(cid(8), sink());

        assert!(mgr.contains(cid(7)));
        assert!(mgr.contains(cid(8)));
        assert_eq!(mgr.len(), 2);
    }

    #[test]
    fn test_register_starts_anonymous() {
        let mut mgr = ConnectionManager::new();

        mgr.register(cid(1), sink());

        assert!(mgr.user_of(cid(1)).is_none());
        assert!(mgr.contains(cid(1)));
    }

    // =====================================================================
    // attach_user()
    // =====================================================================

    #[test]
    fn test_attach_user_records_identity() {
        let mut mgr = ConnectionManager::new();
        mgr.register(cid(1), sink());

        mgr.attach_user(cid(1), UserId::new("alice")).unwrap();

        assert_eq!(mgr.user_of(cid(1)), Some(UserId::new("alice")));
    }

    #[test]
    fn test_attach_user_unknown_connection_returns_not_found() {
        let mut mgr = ConnectionManager::new();

        let result =
            mgr.attach_user(ConnectionId::new(u64::MAX), UserId::new("x"));

        assert!(matches!(result, Err(SessionError::NotFound(_))));
    }

    #[test]
    fn test_attach_user_twice_keeps_latest_identity() {
        // Re-authenticating with a different credential replaces the
        // identity; the relay has no session-resumption semantics.
        let mut mgr = ConnectionManager::new();
        mgr.register(cid(1), sink());

        mgr.attach_user(cid(1), UserId::new("alice")).unwrap();
        mgr.attach_user(cid(1), UserId::new("bob")).unwrap();

        assert_eq!(mgr.user_of(cid(1)), Some(UserId::new("bob")));
    }

    // =====================================================================
    // unregister()
    // =====================================================================

    #[test]
    fn test_unregister_removes_connection() {
        let mut mgr = ConnectionManager::new();
        let mut reg = RoomRegistry::new();
        mgr.register(cid(1), sink());

        assert!(mgr.unregister(cid(1), &mut reg));

        assert!(!mgr.contains(cid(1)));
        assert!(mgr.outbound(cid(1)).is_none());
    }

    #[test]
    fn test_unregister_twice_is_noop() {
        let mut mgr = ConnectionManager::new();
        let mut reg = RoomRegistry::new();
        mgr.register(cid(1), sink());

        assert!(mgr.unregister(cid(1), &mut reg));
        assert!(!mgr.unregister(cid(1), &mut reg), "second call is a no-op");
    }

    #[test]
    fn test_unregister_sweeps_all_room_memberships() {
        let mut mgr = ConnectionManager::new();
        let mut reg = RoomRegistry::new();
        mgr.register(cid(1), sink());
        reg.join(cid(1), RoomId::new("r1"));
        reg.join(cid(1), RoomId::new("r2"));

        mgr.unregister(cid(1), &mut reg);

        assert!(reg.members_of(&RoomId::new("r1")).is_empty());
        assert!(reg.members_of(&RoomId::new("r2")).is_empty());
        assert!(reg.rooms_of(cid(1)).is_empty());
    }

    #[test]
    fn test_unregister_leaves_other_connections_alone() {
        let mut mgr = ConnectionManager::new();
        let mut reg = RoomRegistry::new();
        mgr.register(cid(1), sink());
        mgr.register(cid(2), sink());
        reg.join(cid(1), RoomId::new("r1"));
        reg.join(cid(2), RoomId::new("r1"));

        mgr.unregister(cid(1), &mut reg);

        assert!(mgr.contains(cid(2)));
        assert_eq!(reg.members_of(&RoomId::new("r1")), vec![cid(2)]);
    }

    // =====================================================================
    // outbound()
    // =====================================================================

    #[test]
    fn test_outbound_delivers_to_the_registered_channel() {
        let mut mgr = ConnectionManager::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        mgr.register(cid(1), tx);

        let sink = mgr.outbound(cid(1)).expect("connection is live");
        sink.send(ServerEvent::Joined {
            room_id: RoomId::new("r1"),
        })
        .unwrap();

        assert!(matches!(
            rx.try_recv(),
            Ok(ServerEvent::Joined { .. })
        ));
    }

    #[test]
    fn test_outbound_unknown_connection_returns_none() {
        let mgr = ConnectionManager::new();

        assert!(mgr.outbound(ConnectionId::new(u64::MAX)).is_none());
    }
}
