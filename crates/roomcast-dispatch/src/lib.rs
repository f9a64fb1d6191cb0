//! The broadcast dispatcher: Roomcast's core relay algorithm.
//!
//! One inbound message goes through a strict two-phase contract:
//!
//! 1. **Validate** — the target room must exist per the external
//!    room-lookup collaborator, or the message is dropped with
//!    `RoomNotFound` and nothing else happens.
//! 2. **Persist** — the message store's append must succeed before any
//!    delivery. Every delivered message is durably recorded; a store
//!    failure aborts the whole operation with `StoreUnavailable`.
//! 3. **Fan out** — the finalized record (persisted id and timestamp
//!    included) is pushed to every current member of the room, the
//!    sender included. Per-member failures are counted, never fatal.
//!
//! Within one room, accept order, persisted order, and broadcast order
//! are the same; different rooms relay in parallel.

#![allow(async_fn_in_trait)]

mod config;
mod dispatcher;
mod error;
mod lookup;

pub use config::DispatchConfig;
pub use dispatcher::{DispatchReceipt, Dispatcher};
pub use error::DispatchError;
pub use lookup::{OpenRooms, RoomLookup, StaticRooms};
