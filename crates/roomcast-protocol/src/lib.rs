//! Wire protocol for Roomcast.
//!
//! This crate defines the language clients and the relay speak:
//!
//! - **Types** ([`ClientEvent`], [`ServerEvent`], [`StoredMessage`],
//!   identity newtypes) — the structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how they become bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong in between.
//!
//! The protocol layer sits between transport (raw frames) and the relay
//! core (connections, rooms). It knows nothing about either — it only
//! serializes and deserializes.

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    ClientEvent, ErrorReason, MessageId, NewMessage, RoomId, ServerEvent,
    StoredMessage, UserId,
};
