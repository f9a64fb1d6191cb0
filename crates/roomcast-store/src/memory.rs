//! In-memory reference implementation of [`MessageStore`].

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use roomcast_protocol::{MessageId, NewMessage, RoomId, StoredMessage};
use tokio::sync::Mutex;

use crate::{MessageStore, StoreError};

/// An in-process, append-only message log.
///
/// Cheap to clone — clones share the same underlying log, so the server
/// and tests can hold handles to one store. Ids are process-wide
/// monotonic; within a room, log order is append order.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    rooms: Mutex<HashMap<RoomId, Vec<StoredMessage>>>,
    next_id: AtomicU64,
}

impl MemoryStore {
    /// Creates a new, empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of stored messages across all rooms.
    pub async fn len(&self) -> usize {
        self.inner.rooms.lock().await.values().map(Vec::len).sum()
    }

    /// Returns `true` if nothing has been stored yet.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl MessageStore for MemoryStore {
    async fn append(
        &self,
        message: NewMessage,
    ) -> Result<StoredMessage, StoreError> {
        let id = MessageId(
            self.inner.next_id.fetch_add(1, Ordering::Relaxed) + 1,
        );
        let stored = StoredMessage {
            id,
            room_id: message.room_id.clone(),
            sender: message.sender,
            payload: message.payload,
            timestamp_ms: message.timestamp_ms,
        };

        // Single lock around the push keeps the append atomic: the
        // record is either in the log or it isn't.
        let mut rooms = self.inner.rooms.lock().await;
        rooms
            .entry(message.room_id)
            .or_default()
            .push(stored.clone());

        tracing::trace!(message_id = %stored.id, room_id = %stored.room_id, "message appended");
        Ok(stored)
    }

    async fn history(
        &self,
        room_id: &RoomId,
        limit: usize,
    ) -> Result<Vec<StoredMessage>, StoreError> {
        let rooms = self.inner.rooms.lock().await;
        let log = match rooms.get(room_id) {
            Some(log) => log,
            None => return Ok(Vec::new()),
        };
        let skip = log.len().saturating_sub(limit);
        Ok(log[skip..].to_vec())
    }
}

// =========================================================================
// Tests
// =========================================================================
