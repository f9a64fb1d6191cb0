//! `RoomcastServer` builder and accept loop.
//!
//! This is the entry point for running a Roomcast relay. It ties
//! together all the layers: transport → protocol → session → dispatch.

use std::sync::Arc;
use std::time::Duration;

use roomcast_dispatch::{DispatchConfig, Dispatcher, RoomLookup};
use roomcast_protocol::{Codec, JsonCodec};
use roomcast_registry::RoomRegistry;
use roomcast_session::{Authenticator, ConnectionManager, SessionConfig};
use roomcast_store::MessageStore;
use roomcast_transport::{Transport, WebSocketTransport};
use tokio::sync::Mutex;

use crate::RoomcastError;
use crate::handler::handle_connection;

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks. The
/// connection and room maps live behind `Mutex`es shared with the
/// dispatcher; the collaborators are immutable after build.
pub(crate) struct ServerState<S, L, A, C>
where
    S: MessageStore,
    L: RoomLookup,
    A: Authenticator,
    C: Codec,
{
    pub(crate) connections: Arc<Mutex<ConnectionManager>>,
    pub(crate) rooms: Arc<Mutex<RoomRegistry>>,
    pub(crate) dispatcher: Dispatcher<S, L>,
    pub(crate) auth: A,
    pub(crate) codec: C,
    pub(crate) session_config: SessionConfig,
    pub(crate) write_timeout: Duration,
}

/// Builder for configuring and starting a Roomcast relay.
///
/// # Example
///
/// ```rust,ignore
/// use roomcast::prelude::*;
///
/// let server = RoomcastServer::builder()
///     .bind("0.0.0.0:8080")
///     .build(my_auth, MemoryStore::new(), OpenRooms)
///     .await?;
/// server.run().await
/// ```
pub struct RoomcastServerBuilder {
    bind_addr: String,
    session_config: SessionConfig,
    dispatch_config: DispatchConfig,
    write_timeout: Duration,
}

impl RoomcastServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            session_config: SessionConfig::default(),
            dispatch_config: DispatchConfig::default(),
            write_timeout: Duration::from_secs(5),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the session configuration.
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    /// Sets the dispatch configuration.
    pub fn dispatch_config(mut self, config: DispatchConfig) -> Self {
        self.dispatch_config = config;
        self
    }

    /// Sets the deadline for one socket write to a client.
    ///
    /// A write that misses the deadline is dropped for that client only;
    /// everyone else's delivery is unaffected.
    pub fn write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Builds and starts the server with the given collaborators.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport` as defaults.
    pub async fn build<S, L>(
        self,
        auth: impl Authenticator,
        store: S,
        lookup: L,
    ) -> Result<
        RoomcastServer<S, L, impl Authenticator, JsonCodec>,
        RoomcastError,
    >
    where
        S: MessageStore,
        L: RoomLookup,
    {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let connections = Arc::new(Mutex::new(ConnectionManager::new()));
        let rooms = Arc::new(Mutex::new(RoomRegistry::new()));
        let dispatcher = Dispatcher::new(
            Arc::clone(&connections),
            Arc::clone(&rooms),
            store,
            lookup,
            self.dispatch_config,
        );

        let state = Arc::new(ServerState {
            connections,
            rooms,
            dispatcher,
            auth,
            codec: JsonCodec,
            session_config: self.session_config,
            write_timeout: self.write_timeout,
        });

        Ok(RoomcastServer { transport, state })
    }
}

impl Default for RoomcastServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Roomcast relay.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct RoomcastServer<S, L, A, C>
where
    S: MessageStore,
    L: RoomLookup,
    A: Authenticator,
    C: Codec,
{
    transport: WebSocketTransport,
    state: Arc<ServerState<S, L, A, C>>,
}

impl<S, L, A, C> RoomcastServer<S, L, A, C>
where
    S: MessageStore,
    L: RoomLookup,
    A: Authenticator,
    C: Codec,
{
    /// Creates a new builder.
    pub fn builder() -> RoomcastServerBuilder {
        RoomcastServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the server accept loop.
    ///
    /// Accepts incoming connections and spawns a handler task for each
    /// client. Runs until the process is terminated.
    pub async fn run(mut self) -> Result<(), RoomcastError> {
        tracing::info!("Roomcast relay running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await
                        {
                            tracing::debug!(
                                error = %e,
                                "connection ended with error"
                            );
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
