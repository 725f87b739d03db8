//! The fork/hook trick-taking game: turn engine plus room glue.
//!
//! - [`Table`] — the authoritative per-room game state: deal, turns,
//!   passing, the fork/hook interrupt machine, scoring.
//! - [`ForkGame`] — the [`forkhook_room::GameLogic`] implementation that
//!   plugs the table into a room actor: token parsing at the boundary,
//!   events out, per-viewer [`TableView`] snapshots.
//! - [`PlayError`] — every reason an intent can be refused.
//!
//! The engine is synchronous and self-contained; all concurrency lives
//! in the room layer above it.

mod error;
mod logic;
mod table;
mod view;

pub use error::PlayError;
pub use logic::{ClientIntent, ForkGame, GameConfig, GameEvent};
pub use table::{
    PassOutcome, PlayOutcome, Table, MAX_PLAYERS, MIN_PLAYERS,
};
pub use view::{
    GameResult, InterruptView, PlayView, PlayerView, ScoreLine, TableView,
};
