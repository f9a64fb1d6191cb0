//! Room membership tracking for Roomcast.
//!
//! A room here is nothing more than a named set of live connections —
//! there is no lifecycle, no capacity, no game state. The registry's one
//! job is keeping the bidirectional connection↔room mapping consistent:
//! a connection's joined-room set and the rooms' member sets always agree.
//!
//! Whether a room *canonically* exists (in whatever system of record the
//! deployment has) is not the registry's business; the dispatcher asks
//! its room-lookup collaborator about that before relaying.

mod registry;

pub use registry::RoomRegistry;
