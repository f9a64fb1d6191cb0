//! The dispatcher: one message in, validated, persisted, fanned out.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use roomcast_protocol::{NewMessage, RoomId, ServerEvent, StoredMessage};
use roomcast_registry::RoomRegistry;
use roomcast_session::ConnectionManager;
use roomcast_store::{MessageStore, StoreError};
use roomcast_transport::ConnectionId;
use tokio::sync::Mutex;
use tokio::time::timeout;

use crate::{DispatchConfig, DispatchError, RoomLookup};

/// The outcome of a successful dispatch.
#[derive(Debug, Clone)]
pub struct DispatchReceipt {
    /// The durably recorded message that was fanned out.
    pub message: StoredMessage,
    /// Members whose outbound channel accepted the event.
    pub delivered: usize,
    /// Members that could not be reached (gone mid-broadcast). Counted
    /// internally, never surfaced to the sender.
    pub failed: usize,
}

/// Routes one inbound message to its room: validate, persist, fan out.
///
/// Holds shared handles to the connection manager and room registry and
/// owns the store and lookup collaborators. Cheap to share behind an
/// `Arc`; every connection handler calls into the same instance.
pub struct Dispatcher<S: MessageStore, L: RoomLookup> {
    connections: Arc<Mutex<ConnectionManager>>,
    rooms: Arc<Mutex<RoomRegistry>>,
    store: S,
    lookup: L,
    config: DispatchConfig,

    /// Per-room sequencing locks. Holding a room's lock across
    /// validate → persist → fan out is what makes persisted order equal
    /// broadcast order within that room; unrelated rooms proceed in
    /// parallel. Entries are created on first use and discarded once no
    /// dispatch is using them, so the map tracks rooms with in-flight
    /// traffic rather than every room id ever sent to. The outer std
    /// mutex only guards the map itself and is never held across an
    /// await.
    room_locks: std::sync::Mutex<HashMap<RoomId, Arc<Mutex<()>>>>,
}

impl<S: MessageStore, L: RoomLookup> Dispatcher<S, L> {
    /// Creates a dispatcher over the given shared state and collaborators.
    pub fn new(
        connections: Arc<Mutex<ConnectionManager>>,
        rooms: Arc<Mutex<RoomRegistry>>,
        store: S,
        lookup: L,
        config: DispatchConfig,
    ) -> Self {
        Self {
            connections,
            rooms,
            store,
            lookup,
            config,
            room_locks: std::sync::Mutex::new(HashMap::new()),
        }
    }

    /// Relays one message from `sender` to every member of `room_id`.
    ///
    /// Persistence success is a precondition for delivery: on any `Err`
    /// nothing was stored and nobody received anything. On `Ok`, the
    /// receipt carries the stored record and the delivery tally.
    pub async fn dispatch(
        &self,
        sender: ConnectionId,
        room_id: RoomId,
        payload: String,
    ) -> Result<DispatchReceipt, DispatchError> {
        let room_lock = self.room_lock(&room_id);
        let result = {
            let _ordering_guard = room_lock.lock().await;
            self.relay(sender, &room_id, payload).await
        };
        drop(room_lock);
        self.discard_idle_lock(&room_id);
        result
    }

    /// The guarded section of [`dispatch`](Self::dispatch). Runs with
    /// the room's sequencing lock held.
    async fn relay(
        &self,
        sender: ConnectionId,
        room_id: &RoomId,
        payload: String,
    ) -> Result<DispatchReceipt, DispatchError> {
        // Phase 1: the room must exist per the canonical lookup.
        let exists = timeout(
            self.config.lookup_timeout,
            self.lookup.exists(room_id),
        )
        .await
        .map_err(|_| DispatchError::LookupUnavailable(room_id.clone()))?;
        if !exists {
            tracing::debug!(%sender, %room_id, "dropping message for unknown room");
            return Err(DispatchError::RoomNotFound(room_id.clone()));
        }

        // Phase 2: persist before any delivery.
        let sender_user = self.connections.lock().await.user_of(sender);
        let message = NewMessage {
            room_id: room_id.clone(),
            sender: sender_user,
            payload,
            timestamp_ms: now_ms(),
        };
        let stored = match timeout(
            self.config.store_timeout,
            self.store.append(message),
        )
        .await
        {
            Ok(Ok(stored)) => stored,
            Ok(Err(e)) => return Err(DispatchError::Store(e)),
            Err(_) => {
                return Err(DispatchError::Store(StoreError::Timeout));
            }
        };

        // Phase 3: fan out to a membership snapshot, sender included.
        let members = self.rooms.lock().await.members_of(room_id);
        let (delivered, failed) =
            self.fan_out(&members, &stored).await;

        tracing::debug!(
            message_id = %stored.id,
            %room_id,
            delivered,
            failed,
            "message relayed"
        );

        Ok(DispatchReceipt {
            message: stored,
            delivered,
            failed,
        })
    }

    /// Reads a room's recent history (late-join catch-up).
    ///
    /// Goes straight to the store: reading an empty history for a room
    /// the lookup would reject is harmless.
    pub async fn history(
        &self,
        room_id: &RoomId,
        limit: usize,
    ) -> Result<Vec<StoredMessage>, DispatchError> {
        match timeout(
            self.config.store_timeout,
            self.store.history(room_id, limit),
        )
        .await
        {
            Ok(Ok(messages)) => Ok(messages),
            Ok(Err(e)) => Err(DispatchError::Store(e)),
            Err(_) => Err(DispatchError::Store(StoreError::Timeout)),
        }
    }

    /// Pushes the stored record to every member. Each delivery is
    /// independent: a member that disconnected mid-broadcast is counted
    /// as failed and skipped, the rest still receive.
    async fn fan_out(
        &self,
        members: &[ConnectionId],
        stored: &StoredMessage,
    ) -> (usize, usize) {
        let connections = self.connections.lock().await;
        let mut delivered = 0;
        let mut failed = 0;

        for &member in members {
            let sent = connections
                .outbound(member)
                .is_some_and(|sink| {
                    sink.send(ServerEvent::Delivered {
                        message: stored.clone(),
                    })
                    .is_ok()
                });
            if sent {
                delivered += 1;
            } else {
                failed += 1;
                tracing::warn!(
                    %member,
                    message_id = %stored.id,
                    room_id = %stored.room_id,
                    "delivery failed, member gone"
                );
            }
        }

        (delivered, failed)
    }

    /// Returns the sequencing lock for a room, creating it on first use.
    fn room_lock(&self, room_id: &RoomId) -> Arc<Mutex<()>> {
        let mut locks = self
            .room_locks
            .lock()
            .expect("room lock map poisoned");
        locks.entry(room_id.clone()).or_default().clone()
    }

    /// Drops a room's sequencing lock if no dispatch currently holds a
    /// handle to it. Without this sweep the map would retain an entry
    /// for every room id ever sent to, known or not, and a client
    /// spraying made-up room names could grow it without bound.
    ///
    /// The strong count is read under the map lock: a concurrent
    /// dispatch clones the `Arc` under that same lock, so a count of
    /// one means nobody else can be using or awaiting this entry.
    fn discard_idle_lock(&self, room_id: &RoomId) {
        let mut locks = self
            .room_locks
            .lock()
            .expect("room lock map poisoned");
        if locks
            .get(room_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(room_id);
        }
    }
}

/// Server-assigned message timestamp: wall-clock milliseconds since the
/// Unix epoch.
fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{OpenRooms, StaticRooms};
    use roomcast_store::MemoryStore;
    use tokio::sync::mpsc;

    fn dispatcher_with<L: crate::RoomLookup>(
        lookup: L,
    ) -> Dispatcher<MemoryStore, L> {
        Dispatcher::new(
            Arc::new(Mutex::new(ConnectionManager::new())),
            Arc::new(Mutex::new(RoomRegistry::new())),
            MemoryStore::new(),
            lookup,
            DispatchConfig::default(),
        )
    }

    async fn register(
        dispatcher: &Dispatcher<MemoryStore, impl crate::RoomLookup>,
        id: u64,
    ) -> mpsc::UnboundedReceiver<ServerEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        dispatcher
            .connections
            .lock()
            .await
            .register(ConnectionId::new(id), tx);
        rx
    }

    fn lock_entries(
        dispatcher: &Dispatcher<MemoryStore, impl crate::RoomLookup>,
    ) -> usize {
        dispatcher.room_locks.lock().unwrap().len()
    }

    #[tokio::test]
    async fn test_dispatch_rejected_rooms_leave_no_lock_entries() {
        let dispatcher =
            dispatcher_with(StaticRooms::new([RoomId::new("real")]));
        let _rx = register(&dispatcher, 1).await;

        for i in 0..100 {
            let result = dispatcher
                .dispatch(
                    ConnectionId::new(1),
                    RoomId::new(format!("ghost-{i}")),
                    "hi".into(),
                )
                .await;
            assert!(matches!(result, Err(DispatchError::RoomNotFound(_))));
        }

        assert_eq!(
            lock_entries(&dispatcher),
            0,
            "rejected rooms must not retain sequencing locks"
        );
    }

    #[tokio::test]
    async fn test_dispatch_releases_lock_entry_after_relay() {
        let dispatcher = dispatcher_with(OpenRooms);
        let mut rx = register(&dispatcher, 2).await;
        dispatcher
            .rooms
            .lock()
            .await
            .join(ConnectionId::new(2), RoomId::new("r1"));

        let receipt = dispatcher
            .dispatch(ConnectionId::new(2), RoomId::new("r1"), "hi".into())
            .await
            .unwrap();

        assert_eq!(receipt.delivered, 1);
        assert!(rx.try_recv().is_ok());
        assert_eq!(
            lock_entries(&dispatcher),
            0,
            "an idle room keeps no sequencing lock"
        );
    }
}
