//! Error types for the dispatch layer.

use roomcast_protocol::RoomId;
use roomcast_store::StoreError;

/// Why a message could not be relayed.
///
/// Every variant is reported to the sender only and has no side effects
/// beyond its own operation — in particular, nothing was persisted and
/// nothing was delivered. Per-member delivery failures are NOT errors;
/// they are counted in the [`DispatchReceipt`](crate::DispatchReceipt).
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The target room does not exist per the canonical lookup.
    #[error("room {0} not found")]
    RoomNotFound(RoomId),

    /// The store rejected, failed, or timed out the append. No retry is
    /// attempted here — retrying an ambiguous failure risks duplicate
    /// records, so that policy belongs to the caller.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The room lookup did not answer within the deadline. Distinct
    /// from `RoomNotFound`: "couldn't check" is not "doesn't exist".
    #[error("room lookup timed out for {0}")]
    LookupUnavailable(RoomId),
}
