//! Error types for the session layer.

use roomcast_transport::ConnectionId;

/// Why a credential verification failed.
///
/// Reported to the connecting client only; an auth failure never closes
/// the connection by itself (forced-close is a gateway policy decision).
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The token was rejected by the auth collaborator.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The token was once valid but has expired.
    #[error("credentials expired")]
    Expired,

    /// The auth collaborator did not answer within the deadline.
    #[error("authentication timed out")]
    Timeout,
}

/// Errors from connection bookkeeping.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// No live connection with this id. Happens when an operation races
    /// with the connection's own teardown.
    #[error("connection {0} not found")]
    NotFound(ConnectionId),
}
