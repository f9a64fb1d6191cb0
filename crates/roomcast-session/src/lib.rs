//! Connection lifecycle management for Roomcast.
//!
//! This crate owns the live-connection set:
//!
//! 1. **Registration** — every accepted transport connection is tracked
//!    under its transport-assigned id, with an outbound event channel
//!    ([`ConnectionManager`])
//! 2. **Authentication** — validating who a connection belongs to
//!    ([`Authenticator`] trait, bounded by a timeout)
//! 3. **Teardown** — unregistering a connection and sweeping it out of
//!    every room it had joined
//!
//! # How it fits in the stack
//!
//! ```text
//! Dispatch layer (above)   ← resolves member ids to outbound channels
//!     ↕
//! Session layer (this crate) ← connection identity and lifecycle
//!     ↕
//! Registry layer (below)   ← which connection is in which room
//! ```

#![allow(async_fn_in_trait)]

mod auth;
mod config;
mod error;
mod manager;

pub use auth::{Authenticator, verify_with_timeout};
pub use config::SessionConfig;
pub use error::{AuthError, SessionError};
pub use manager::{ConnectionManager, EventSink};
