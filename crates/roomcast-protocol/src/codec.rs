//! Codec trait and implementations for serializing events.
//!
//! The protocol layer doesn't care how events become bytes — anything
//! implementing [`Codec`] will do. [`JsonCodec`] is the default; a binary
//! codec can be swapped in later without touching the rest of the stack.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Encodes Rust types to bytes and decodes bytes back.
///
/// `Send + Sync + 'static` so a codec can live inside long-running tasks
/// and be shared across threads. The methods are generic: any serde type
/// works, which lets one codec handle both event enums and message
/// records.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// Human-readable, inspectable in browser DevTools, and what the relay's
/// web clients speak natively. Behind the `json` feature flag (enabled
/// by default).
///
/// ## Example
///
/// ```rust
/// use roomcast_protocol::{ClientEvent, Codec, JsonCodec, RoomId};
///
/// let codec = JsonCodec;
/// let event = ClientEvent::Join { room_id: RoomId::new("lobby") };
///
/// let bytes = codec.encode(&event).unwrap();
/// let decoded: ClientEvent = codec.decode(&bytes).unwrap();
/// assert_eq!(event, decoded);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;
    use crate::{ErrorReason, RoomId, ServerEvent};

    #[test]
    fn test_json_codec_round_trips_server_event() {
        let codec = JsonCodec;
        let event = ServerEvent::Error {
            reason: ErrorReason::BadRequest,
            detail: "unparseable frame".into(),
        };

        let bytes = codec.encode(&event).unwrap();
        let decoded: ServerEvent = codec.decode(&bytes).unwrap();
        assert_eq!(event, decoded);
    }

    #[test]
    fn test_json_codec_decode_rejects_truncated_input() {
        let codec = JsonCodec;
        let bytes = codec
            .encode(&ServerEvent::Joined {
                room_id: RoomId::new("r1"),
            })
            .unwrap();

        let truncated = &bytes[..bytes.len() - 2];
        let result: Result<ServerEvent, _> = codec.decode(truncated);
        assert!(result.is_err());
    }
}
