//! Unified error type for the Forkhook server.

use forkhook_protocol::ProtocolError;
use forkhook_room::RoomError;
use forkhook_transport::TransportError;

/// Top-level error that wraps the layer-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so `?` converts layer errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum ForkhookError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room-level error (full, not found, rejected).
    #[error(transparent)]
    Room(#[from] RoomError),
}
