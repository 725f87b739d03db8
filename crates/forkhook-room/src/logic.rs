//! The `GameLogic` trait — the seam between the room plumbing and the
//! actual game rules.
//!
//! The room layer owns delivery: actors, channels, membership, snapshot
//! fan-out. The game crate owns rules: what an intent does to the table.
//! This trait is the whole surface between them.

use forkhook_protocol::{PlayerId, Recipient};
use serde::{de::DeserializeOwned, Serialize};

use crate::RoomConfig;

/// What handling one intent produced: zero or more addressed events, plus
/// whether the state actually changed.
///
/// The room actor broadcasts fresh per-viewer snapshots only when
/// `state_changed` is set — a rejected play reaches the acting player as
/// an event and nobody else sees anything.
pub struct Outcome<M> {
    /// Events to deliver, each with its recipient.
    pub events: Vec<(Recipient, M)>,
    /// Whether the game state was mutated.
    pub state_changed: bool,
}

impl<M> Outcome<M> {
    /// The state changed; broadcast snapshots after delivering `events`.
    pub fn changed(events: Vec<(Recipient, M)>) -> Self {
        Self {
            events,
            state_changed: true,
        }
    }

    /// Nothing was mutated (typically a rejection sent back to the actor).
    pub fn unchanged(events: Vec<(Recipient, M)>) -> Self {
        Self {
            events,
            state_changed: false,
        }
    }
}

/// The trait a game implements to run inside a room.
///
/// Each associated type defines the shape of the game's data:
/// - `Config` — per-room settings chosen at creation (deck count, ...)
/// - `State` — the authoritative table state; lives only inside the actor
/// - `ClientMessage` — intents players send (play, pass, rename, ...)
/// - `ServerMessage` — discrete events the game emits back
/// - `Snapshot` — the per-viewer projection of the state; this is what
///   actually gets broadcast, so hidden information (other players'
///   hands) never leaves the actor
pub trait GameLogic: Send + Sync + 'static {
    /// Per-room settings chosen when the room is created.
    type Config: Send + Sync + Clone + Default;

    /// The authoritative game state. Never serialized or cloned out of
    /// the actor; clients only ever see `Snapshot`s of it.
    type State: Send + Sync;

    /// Intents players send to the room.
    type ClientMessage: Send + Sync + Clone + Serialize + DeserializeOwned;

    /// Events the game sends to players.
    type ServerMessage: Send + Sync + Clone + Serialize + DeserializeOwned;

    /// The per-viewer projection of the state.
    type Snapshot: Send + Sync + Clone + Serialize + DeserializeOwned;

    /// Creates the empty table when the room is created. Players arrive
    /// afterwards through [`on_join`](Self::on_join).
    fn init(config: &Self::Config) -> Self::State;

    /// A player asks for a seat. Return `Err(reason)` to turn them away
    /// (table full, game already running, ...).
    fn on_join(
        state: &mut Self::State,
        player: PlayerId,
    ) -> Result<(), String>;

    /// A player left the room (voluntarily or by disconnect).
    fn on_leave(
        state: &mut Self::State,
        player: PlayerId,
    ) -> Outcome<Self::ServerMessage>;

    /// Processes an intent from a seated player. This is where game rules
    /// live.
    fn handle_message(
        state: &mut Self::State,
        sender: PlayerId,
        msg: Self::ClientMessage,
    ) -> Outcome<Self::ServerMessage>;

    /// Projects the state as seen by one player. Called for every seated
    /// player after each state-changing intent.
    fn snapshot(state: &Self::State, viewer: PlayerId) -> Self::Snapshot;

    /// Room-level limits for this game type.
    fn room_config() -> RoomConfig {
        RoomConfig::default()
    }
}
