//! Per-connection handler: registration, event routing, teardown.
//!
//! Each accepted connection gets its own Tokio task running this handler,
//! plus a writer task that drains the connection's outbound queue. The
//! flow is:
//!   1. Register with the connection manager → get a relay id and queue
//!   2. Loop: receive client events → route to auth, registry, dispatch
//!   3. On exit (clean close, error, or panic) → unregister everywhere

use std::sync::Arc;

use roomcast_dispatch::{DispatchError, RoomLookup};
use roomcast_protocol::{ClientEvent, Codec, ErrorReason, ServerEvent};
use roomcast_session::{
    AuthError, Authenticator, EventSink, verify_with_timeout,
};
use roomcast_store::MessageStore;
use roomcast_transport::{
    Connection, ConnectionId, WebSocketConnection,
};

use crate::RoomcastError;
use crate::server::ServerState;

/// Largest history page a client can request. Bigger requests are
/// served this many records, not rejected.
const MAX_HISTORY_LIMIT: usize = 500;

/// Drop guard that unregisters a connection when the handler exits.
///
/// This ensures cleanup happens even if the handler panics. Since `Drop`
/// is synchronous, we spawn a fire-and-forget task for the async locks.
struct ConnectionGuard<S, L, A, C>
where
    S: MessageStore,
    L: RoomLookup,
    A: Authenticator,
    C: Codec,
{
    conn_id: ConnectionId,
    state: Arc<ServerState<S, L, A, C>>,
}

impl<S, L, A, C> Drop for ConnectionGuard<S, L, A, C>
where
    S: MessageStore,
    L: RoomLookup,
    A: Authenticator,
    C: Codec,
{
    fn drop(&mut self) {
        let conn_id = self.conn_id;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            // Lock order: connections before rooms, everywhere.
            let mut connections = state.connections.lock().await;
            let mut rooms = state.rooms.lock().await;
            connections.unregister(conn_id, &mut rooms);
            tracing::debug!(%conn_id, "connection unregistered");
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<S, L, A, C>(
    conn: WebSocketConnection,
    state: Arc<ServerState<S, L, A, C>>,
) -> Result<(), RoomcastError>
where
    S: MessageStore,
    L: RoomLookup,
    A: Authenticator,
    C: Codec,
{
    let conn = Arc::new(conn);
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    // Register first so fan-out can reach this client immediately. The
    // transport-assigned id identifies the connection everywhere.
    let (outbound, inbound) = tokio::sync::mpsc::unbounded_channel();
    {
        let mut connections = state.connections.lock().await;
        connections.register(conn_id, outbound.clone());
    }
    let _guard = ConnectionGuard {
        conn_id,
        state: Arc::clone(&state),
    };

    // Writer task: the only place that writes to this socket. It drains
    // the outbound queue so dispatch never waits on a slow client.
    tokio::spawn(write_loop(
        Arc::clone(&conn),
        Arc::clone(&state),
        conn_id,
        inbound,
    ));

    loop {
        let data = match conn.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::info!(%conn_id, "connection closed cleanly");
                break;
            }
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "recv error");
                break;
            }
        };

        let event: ClientEvent = match state.codec.decode(&data) {
            Ok(event) => event,
            Err(e) => {
                tracing::debug!(
                    %conn_id, error = %e, "failed to decode event"
                );
                reply(
                    &outbound,
                    ServerEvent::Error {
                        reason: ErrorReason::BadRequest,
                        detail: "malformed event".into(),
                    },
                );
                continue;
            }
        };

        if handle_event(&state, conn_id, &outbound, event).await? {
            break;
        }
    }

    // _guard drops here → unregistration fires; the writer task ends
    // once the manager releases its queue handle.
    Ok(())
}

/// Routes one decoded client event. Returns `true` if the connection
/// should close.
async fn handle_event<S, L, A, C>(
    state: &Arc<ServerState<S, L, A, C>>,
    conn_id: ConnectionId,
    outbound: &EventSink,
    event: ClientEvent,
) -> Result<bool, RoomcastError>
where
    S: MessageStore,
    L: RoomLookup,
    A: Authenticator,
    C: Codec,
{
    match event {
        ClientEvent::Authenticate { token } => {
            let verified = verify_with_timeout(
                &state.auth,
                &token,
                state.session_config.auth_timeout,
            )
            .await;

            match verified {
                Ok(user_id) => {
                    // A failed race with teardown means the client is
                    // already gone; nothing left to confirm.
                    let mut connections = state.connections.lock().await;
                    connections.attach_user(conn_id, user_id.clone())?;
                    drop(connections);

                    tracing::info!(%conn_id, %user_id, "authenticated");
                    reply(outbound, ServerEvent::Authenticated { user_id });
                }
                Err(e) => {
                    tracing::debug!(%conn_id, error = %e, "auth failed");
                    reply(
                        outbound,
                        ServerEvent::Error {
                            reason: auth_reason(&e),
                            detail: e.to_string(),
                        },
                    );
                }
            }
        }

        ClientEvent::Join { room_id } => {
            {
                let mut rooms = state.rooms.lock().await;
                rooms.join(conn_id, room_id.clone());
            }
            tracing::debug!(%conn_id, %room_id, "joined room");
            reply(outbound, ServerEvent::Joined { room_id });
        }

        ClientEvent::Send { room_id, payload } => {
            // Delivery to this client comes back through the fan-out
            // like everyone else's; only failures are answered here.
            match state.dispatcher.dispatch(conn_id, room_id, payload).await
            {
                Ok(receipt) => {
                    tracing::debug!(
                        %conn_id,
                        message_id = %receipt.message.id,
                        delivered = receipt.delivered,
                        "message dispatched"
                    );
                }
                Err(e) => {
                    tracing::debug!(%conn_id, error = %e, "dispatch failed");
                    reply(
                        outbound,
                        ServerEvent::Error {
                            reason: dispatch_reason(&e),
                            detail: e.to_string(),
                        },
                    );
                }
            }
        }

        ClientEvent::History { room_id, limit } => {
            let limit = limit.min(MAX_HISTORY_LIMIT);
            match state.dispatcher.history(&room_id, limit).await {
                Ok(messages) => {
                    reply(
                        outbound,
                        ServerEvent::History { room_id, messages },
                    );
                }
                Err(e) => {
                    tracing::debug!(%conn_id, error = %e, "history failed");
                    reply(
                        outbound,
                        ServerEvent::Error {
                            reason: dispatch_reason(&e),
                            detail: e.to_string(),
                        },
                    );
                }
            }
        }

        ClientEvent::Disconnect => {
            tracing::info!(%conn_id, "client disconnected");
            return Ok(true);
        }
    }

    Ok(false)
}

/// Drains a connection's outbound queue onto its socket.
///
/// Each write is bounded by the configured deadline. A client that
/// can't keep up misses events instead of stalling the relay; a broken
/// socket ends the task.
async fn write_loop<S, L, A, C>(
    conn: Arc<WebSocketConnection>,
    state: Arc<ServerState<S, L, A, C>>,
    conn_id: ConnectionId,
    mut inbound: tokio::sync::mpsc::UnboundedReceiver<ServerEvent>,
) where
    S: MessageStore,
    L: RoomLookup,
    A: Authenticator,
    C: Codec,
{
    while let Some(event) = inbound.recv().await {
        let bytes = match state.codec.encode(&event) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(%conn_id, error = %e, "failed to encode event");
                continue;
            }
        };

        match tokio::time::timeout(state.write_timeout, conn.send(&bytes))
            .await
        {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::debug!(%conn_id, error = %e, "socket write failed");
                break;
            }
            Err(_) => {
                tracing::warn!(
                    %conn_id,
                    "write deadline missed, dropping event for this client"
                );
            }
        }
    }

    let _ = conn.close().await;
}

/// Queues an event for the connection's writer task.
///
/// A closed queue means the writer is gone and teardown is underway;
/// nothing useful is lost by dropping the event.
fn reply(outbound: &EventSink, event: ServerEvent) {
    let _ = outbound.send(event);
}

fn auth_reason(error: &AuthError) -> ErrorReason {
    match error {
        AuthError::InvalidCredentials => ErrorReason::AuthInvalid,
        AuthError::Expired => ErrorReason::AuthExpired,
        AuthError::Timeout => ErrorReason::AuthTimeout,
    }
}

fn dispatch_reason(error: &DispatchError) -> ErrorReason {
    match error {
        DispatchError::RoomNotFound(_) => ErrorReason::RoomNotFound,
        DispatchError::Store(_) => ErrorReason::StoreUnavailable,
        DispatchError::LookupUnavailable(_) => {
            ErrorReason::LookupUnavailable
        }
    }
}
