//! Error types for the protocol layer.

/// Errors that can occur in the protocol layer.
///
/// Seeing a `ProtocolError` always means a serialization or framing
/// problem, never networking or room state.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed. Common causes: malformed JSON, missing
    /// required fields, an unknown event tag, or truncated frames.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The event passed deserialization but violates a protocol rule,
    /// e.g. a history request with a zero limit.
    #[error("invalid event: {0}")]
    InvalidEvent(String),
}
