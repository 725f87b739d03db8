//! Error types for the room layer.

use forkhook_protocol::{PlayerId, RoomId};

/// Errors that can occur during room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room does not exist.
    #[error("room {0} not found")]
    NotFound(RoomId),

    /// The room is full — no more player slots available.
    #[error("room {0} is full")]
    RoomFull(RoomId),

    /// The player is already in this room.
    #[error("player {0} already in room {1}")]
    AlreadyInRoom(PlayerId, RoomId),

    /// The player is not in this room.
    #[error("player {0} not in room {1}")]
    NotInRoom(PlayerId, RoomId),

    /// The game turned the player away (table full, game running, ...).
    #[error("cannot join: {0}")]
    Rejected(String),

    /// The player is not in any room.
    #[error("player {0} is not in any room")]
    NotInAnyRoom(PlayerId),

    /// The room's command channel is full or closed.
    #[error("room {0} is unavailable")]
    Unavailable(RoomId),
}
