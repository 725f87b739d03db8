//! Room manager: creates, tracks, and routes players to rooms.

use std::collections::HashMap;

use forkhook_protocol::{PlayerId, RoomId};
use rand::Rng;

use crate::room::spawn_room;
use crate::{GameLogic, PlayerSender, RoomError, RoomHandle, RoomInfo};

/// Default command channel size for room actors.
const DEFAULT_CHANNEL_SIZE: usize = 64;

/// Room codes are four digits so players can read them to each other.
const CODE_RANGE: std::ops::Range<u64> = 1000..10_000;

/// Manages all active rooms and tracks which player is in which room.
///
/// This is the entry point for room operations from the connection
/// handlers. The game engine itself knows nothing about this registry —
/// it can be instantiated and tested one table at a time.
pub struct RoomManager<G: GameLogic> {
    /// Active rooms, keyed by join code.
    rooms: HashMap<RoomId, RoomHandle<G>>,

    /// Maps each player to the room they're currently in.
    /// A player can be in at most ONE room at a time (key invariant).
    player_rooms: HashMap<PlayerId, RoomId>,
}

impl<G: GameLogic> RoomManager<G> {
    /// Creates a new, empty room manager.
    pub fn new() -> Self {
        Self {
            rooms: HashMap::new(),
            player_rooms: HashMap::new(),
        }
    }

    /// Creates a new room and returns its join code.
    pub fn create_room(&mut self, game_config: G::Config) -> RoomId {
        let room_id = self.fresh_code();
        let config = G::room_config();
        let handle = spawn_room::<G>(
            room_id,
            config,
            game_config,
            DEFAULT_CHANNEL_SIZE,
        );
        self.rooms.insert(room_id, handle);
        tracing::info!(%room_id, "room created");
        room_id
    }

    /// Picks a random unused four-digit code.
    fn fresh_code(&self) -> RoomId {
        let mut rng = rand::rng();
        loop {
            let code = RoomId(rng.random_range(CODE_RANGE));
            if !self.rooms.contains_key(&code) {
                return code;
            }
        }
    }

    /// Seats a player in a room.
    ///
    /// Enforces the "one room at a time" invariant.
    pub async fn join_room(
        &mut self,
        player_id: PlayerId,
        room_id: RoomId,
        sender: PlayerSender<G>,
    ) -> Result<(), RoomError> {
        if let Some(current) = self.player_rooms.get(&player_id) {
            return Err(RoomError::AlreadyInRoom(player_id, *current));
        }

        let handle = self
            .rooms
            .get(&room_id)
            .ok_or(RoomError::NotFound(room_id))?;

        handle.join(player_id, sender).await?;
        self.player_rooms.insert(player_id, room_id);
        Ok(())
    }

    /// Removes a player from their current room. Empty rooms are
    /// destroyed on the spot — a code with nobody behind it is useless.
    pub async fn leave_room(
        &mut self,
        player_id: PlayerId,
    ) -> Result<(), RoomError> {
        let room_id = self
            .player_rooms
            .get(&player_id)
            .copied()
            .ok_or(RoomError::NotInAnyRoom(player_id))?;

        let mut remaining = None;
        if let Some(handle) = self.rooms.get(&room_id) {
            remaining = Some(handle.leave(player_id).await?);
        }
        self.player_rooms.remove(&player_id);

        if remaining == Some(0) {
            self.destroy_room(room_id).await?;
        }
        Ok(())
    }

    /// Routes a game intent from a player to their current room.
    pub async fn route_message(
        &self,
        player_id: PlayerId,
        msg: G::ClientMessage,
    ) -> Result<(), RoomError> {
        let room_id = self
            .player_rooms
            .get(&player_id)
            .ok_or(RoomError::NotInAnyRoom(player_id))?;

        let handle = self
            .rooms
            .get(room_id)
            .ok_or(RoomError::NotFound(*room_id))?;

        handle.send_message(player_id, msg).await
    }

    /// Returns info about a specific room.
    pub async fn get_room_info(
        &self,
        room_id: RoomId,
    ) -> Result<RoomInfo, RoomError> {
        let handle = self
            .rooms
            .get(&room_id)
            .ok_or(RoomError::NotFound(room_id))?;
        handle.get_info().await
    }

    /// Shuts down a room and removes all its players from the index.
    pub async fn destroy_room(
        &mut self,
        room_id: RoomId,
    ) -> Result<(), RoomError> {
        let handle = self
            .rooms
            .remove(&room_id)
            .ok_or(RoomError::NotFound(room_id))?;

        let _ = handle.shutdown().await;

        // Remove all players that were in this room.
        self.player_rooms.retain(|_, rid| *rid != room_id);

        tracing::info!(%room_id, "room destroyed");
        Ok(())
    }

    /// Returns the room a player is currently in, if any.
    pub fn player_room(&self, player_id: &PlayerId) -> Option<RoomId> {
        self.player_rooms.get(player_id).copied()
    }

    /// Lists all rooms that still have a free seat.
    ///
    /// Queries each room actor for its current info. Rooms that fail to
    /// respond (e.g. shutting down) are silently skipped.
    pub async fn list_rooms(&self) -> Vec<RoomInfo> {
        let mut infos = Vec::with_capacity(self.rooms.len());
        for handle in self.rooms.values() {
            if let Ok(info) = handle.get_info().await {
                if info.has_free_seat() {
                    infos.push(info);
                }
            }
        }
        infos
    }

    /// Returns the number of active rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Lists all active room codes.
    pub fn room_ids(&self) -> Vec<RoomId> {
        self.rooms.keys().copied().collect()
    }
}

impl<G: GameLogic> Default for RoomManager<G> {
    fn default() -> Self {
        Self::new()
    }
}
