//! Unified error type for the Roomcast relay.

use roomcast_dispatch::DispatchError;
use roomcast_protocol::ProtocolError;
use roomcast_session::SessionError;
use roomcast_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `roomcast` meta-crate, you deal with this single
/// error type instead of importing errors from each sub-crate.
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum RoomcastError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid event).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error (connection bookkeeping).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A dispatch-level error (room validation, persistence).
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}
