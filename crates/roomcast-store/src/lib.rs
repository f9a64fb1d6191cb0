//! Durable message storage for Roomcast.
//!
//! The relay treats persistence as an external collaborator behind a
//! narrow trait: [`MessageStore`] can append one message and read a
//! room's history, nothing else. The dispatcher only cares that `append`
//! is atomic — a message is either fully durable or not recorded at all.
//!
//! [`MemoryStore`] is the in-process reference implementation, good for
//! development and tests; production deployments adapt their database
//! behind the same trait.

#![allow(async_fn_in_trait)]

mod error;
mod memory;

pub use error::StoreError;
pub use memory::MemoryStore;

use roomcast_protocol::{NewMessage, RoomId, StoredMessage};

/// Append-only durable log of messages, keyed by room.
///
/// # Trait bounds
///
/// `Send + Sync + 'static` — the store is shared by every connection's
/// handler task for the lifetime of the server.
pub trait MessageStore: Send + Sync + 'static {
    /// Makes the message durable and returns the enriched record with
    /// its persistence-assigned id.
    ///
    /// Must be atomic: on `Err` nothing was recorded, there are no
    /// partial records.
    fn append(
        &self,
        message: NewMessage,
    ) -> impl std::future::Future<Output = Result<StoredMessage, StoreError>> + Send;

    /// Returns up to `limit` of the room's most recent messages,
    /// oldest first. An unknown room is an empty history, not an error.
    fn history(
        &self,
        room_id: &RoomId,
        limit: usize,
    ) -> impl std::future::Future<Output = Result<Vec<StoredMessage>, StoreError>> + Send;
}
