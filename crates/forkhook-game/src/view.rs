//! Per-viewer snapshots and game results.
//!
//! A [`TableView`] is what actually leaves the room actor: it carries the
//! viewing player's own hand and only card *counts* for everyone else, so
//! hidden information never crosses the wire.

use forkhook_cards::{Card, ComboKind};
use forkhook_protocol::PlayerId;
use serde::{Deserialize, Serialize};

/// The combination currently in play, as shown to players.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayView {
    pub cards: Vec<Card>,
    pub kind: ComboKind,
    pub owner: PlayerId,
}

/// One seat as seen from outside: everything public about a player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerView {
    pub id: PlayerId,
    pub name: String,
    pub cards_left: usize,
    pub passed: bool,
    pub score: i32,
}

/// The interrupt sub-state and its exposed card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum InterruptView {
    Idle,
    Fork { exposed: Card },
    Hook { exposed: Card, forker: PlayerId },
}

/// The table as seen by one player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableView {
    pub started: bool,
    /// The viewer's own hand — the only hand ever revealed.
    pub hand: Vec<Card>,
    /// Whose turn it is (the acting player during an interrupt window).
    pub turn: Option<PlayerId>,
    pub last_play: Option<PlayView>,
    pub interrupt: InterruptView,
    /// The "giving light" flag: the next play is unconstrained.
    pub giving_light: bool,
    /// Whether the viewer may fork right now.
    pub can_fork: bool,
    /// Whether the viewer may hook right now.
    pub can_hook: bool,
    /// All seats in order, public data only.
    pub players: Vec<PlayerView>,
    /// Players in the order their hands first emptied.
    pub finished: Vec<PlayerId>,
}

/// One player's line in the final scoring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreLine {
    pub player: PlayerId,
    /// Points gained or lost this game.
    pub delta: i32,
    /// Cumulative score for the life of the room.
    pub total: i32,
}

/// How a finished game came out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameResult {
    pub winners: Vec<PlayerId>,
    pub loser: PlayerId,
    pub scores: Vec<ScoreLine>,
}
