//! Error types for the protocol layer.

/// Errors that can occur in the protocol layer.
///
/// When you see a `ProtocolError`, the problem is in serialization or
/// message validity — not networking, not game rules.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed. Common causes: malformed JSON, missing
    /// required fields, wrong data types, truncated messages.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The message is valid JSON but violates protocol rules — e.g. a
    /// handshake with an unsupported version, or a first message that
    /// isn't a handshake at all.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
