//! # Roomcast
//!
//! Room-scoped real-time message relay over WebSockets.
//!
//! Roomcast accepts client connections, groups them into named rooms,
//! and fans each accepted message out to every room member after durably
//! recording it. Deployments plug in three collaborators: an
//! [`Authenticator`] for identity, a [`MessageStore`] for persistence,
//! and a [`RoomLookup`] for room validation.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use roomcast::prelude::*;
//!
//! # struct MyAuth;
//! # impl Authenticator for MyAuth {
//! #     async fn verify(&self, t: &str) -> Result<UserId, AuthError> {
//! #         Ok(UserId::new(t))
//! #     }
//! # }
//! # async fn run() -> Result<(), RoomcastError> {
//! let server = RoomcastServerBuilder::new()
//!     .bind("0.0.0.0:8080")
//!     .build(MyAuth, MemoryStore::new(), OpenRooms)
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
mod server;

pub use error::RoomcastError;
pub use server::{RoomcastServer, RoomcastServerBuilder};

// Re-export the sub-crates so downstream code needs one dependency.
pub use roomcast_dispatch as dispatch;
pub use roomcast_protocol as protocol;
pub use roomcast_registry as registry;
pub use roomcast_session as session;
pub use roomcast_store as store;
pub use roomcast_transport as transport;

/// Everything needed to stand up and talk to a relay.
pub mod prelude {
    pub use crate::error::RoomcastError;
    pub use crate::server::{RoomcastServer, RoomcastServerBuilder};
    pub use roomcast_dispatch::{
        DispatchConfig, DispatchError, OpenRooms, RoomLookup, StaticRooms,
    };
    pub use roomcast_protocol::{
        ClientEvent, Codec, ErrorReason, JsonCodec, MessageId, RoomId,
        ServerEvent, StoredMessage, UserId,
    };
    pub use roomcast_session::{
        AuthError, Authenticator, SessionConfig,
    };
    pub use roomcast_store::{MemoryStore, MessageStore, StoreError};
    pub use roomcast_transport::ConnectionId;
}

/// Installs a process-wide `tracing` subscriber.
///
/// Filtering comes from `RUST_LOG`, falling back to `info`. Safe to call
/// more than once; only the first call installs.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
