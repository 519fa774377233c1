//! Error types for the protocol layer.

/// Something went wrong turning events into bytes or back.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Malformed frame, unknown event name, or a payload of the wrong
    /// shape. Reported to the client as `BAD_REQUEST`; never fatal.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The frame decoded but cannot be used, e.g. a binary frame that is
    /// not valid UTF-8 text.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
