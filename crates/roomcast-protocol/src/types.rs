//! Core protocol types for Roomcast's wire format.
//!
//! Everything a client and the relay exchange is defined here: identity
//! newtypes, the message records the store hands back, and the two closed
//! event enums that make up the transport contract. Events are a tagged
//! union on purpose — the relay dispatches on enum variants, never on
//! string-keyed event names.

use serde::{Deserialize, Serialize};

use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A room identifier: an opaque string chosen by clients.
///
/// Rooms come into being in the registry the first time someone joins
/// them; whether a room *canonically* exists is the room-lookup
/// collaborator's call, made by the dispatcher before any relay.
///
/// `#[serde(transparent)]` keeps the JSON shape a plain string, so
/// `RoomId("lobby")` serializes as `"lobby"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl RoomId {
    /// Convenience constructor from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a `&str`.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RoomId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// An authenticated user identity, as issued by the auth collaborator.
///
/// Opaque to the relay — it only attaches this to connections and stamps
/// it on stored messages.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A persistence-assigned message identifier.
///
/// Only the message store mints these; a message without one has not been
/// made durable yet.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct MessageId(pub u64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "M-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Message records
// ---------------------------------------------------------------------------

/// A message as the dispatcher builds it on receipt, before persistence.
///
/// `sender` is the authenticated identity of the sending connection, or
/// `None` for an anonymous connection. `timestamp_ms` is server-assigned
/// wall-clock milliseconds since the Unix epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMessage {
    pub room_id: RoomId,
    pub sender: Option<UserId>,
    pub payload: String,
    pub timestamp_ms: u64,
}

/// A durably recorded message, as returned by the store's append.
///
/// This is what gets fanned out to room members: the original content
/// plus the persistence-assigned id, so every recipient (including the
/// sender's own echo) sees server-confirmed state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub id: MessageId,
    pub room_id: RoomId,
    pub sender: Option<UserId>,
    pub payload: String,
    pub timestamp_ms: u64,
}

// ---------------------------------------------------------------------------
// Events — the transport contract
// ---------------------------------------------------------------------------

/// Events a client sends to the relay.
///
/// `#[serde(tag = "type")]` produces internally tagged JSON:
/// `{ "type": "Join", "room_id": "lobby" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    /// Present a credential token for verification. The connection stays
    /// open (and anonymous) if verification fails.
    Authenticate { token: String },

    /// Join a room, creating its membership entry if needed. Idempotent.
    Join { room_id: RoomId },

    /// Relay a message to every member of the room.
    Send { room_id: RoomId, payload: String },

    /// Request the most recent messages of a room (late-join catch-up).
    History { room_id: RoomId, limit: usize },

    /// Explicitly close the connection.
    Disconnect,
}

/// Events the relay emits to a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// Credential verification succeeded; the connection now carries
    /// this identity.
    Authenticated { user_id: UserId },

    /// Join acknowledged.
    Joined { room_id: RoomId },

    /// A message relayed to this connection's room. Sent to every member
    /// of the target room, the sender included.
    Delivered { message: StoredMessage },

    /// Reply to a `History` request, oldest first.
    History {
        room_id: RoomId,
        messages: Vec<StoredMessage>,
    },

    /// Something went wrong with this connection's own request. Errors
    /// are always local to the requester — a failure here never implies
    /// anyone else was affected.
    Error { reason: ErrorReason, detail: String },
}

/// The closed set of failure signals a client can receive.
///
/// Per-member delivery failures are deliberately absent: they are logged
/// and counted server-side, never surfaced to the sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorReason {
    /// The credential token was rejected.
    AuthInvalid,
    /// The credential token has expired.
    AuthExpired,
    /// The auth collaborator did not answer within the deadline.
    AuthTimeout,
    /// The target room does not exist per the canonical lookup.
    RoomNotFound,
    /// The message store failed or timed out; nothing was recorded.
    StoreUnavailable,
    /// The room lookup did not answer within the deadline.
    LookupUnavailable,
    /// The request itself was malformed.
    BadRequest,
}

impl fmt::Display for ErrorReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::AuthInvalid => "AuthInvalid",
            Self::AuthExpired => "AuthExpired",
            Self::AuthTimeout => "AuthTimeout",
            Self::RoomNotFound => "RoomNotFound",
            Self::StoreUnavailable => "StoreUnavailable",
            Self::LookupUnavailable => "LookupUnavailable",
            Self::BadRequest => "BadRequest",
        };
        write!(f, "{s}")
    }
}

// =========================================================================
// Tests
// =========================================================================
