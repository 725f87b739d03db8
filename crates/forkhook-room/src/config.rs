//! Room configuration.

use serde::{Deserialize, Serialize};

/// Room-level limits, independent of game rules.
///
/// The game itself may be stricter (e.g. refuse to start below its own
/// minimum); this only caps how many players the actor seats at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Maximum players allowed in the room.
    pub max_players: usize,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self { max_players: 8 }
    }
}
