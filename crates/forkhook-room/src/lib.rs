//! Room lifecycle management for Forkhook.
//!
//! Each room runs as an isolated Tokio task (actor model) with its own
//! table state and player list. Intents from different players are
//! serialized by the actor's channel, so the game engine never sees two
//! mutations at once and rooms run fully in parallel.
//!
//! # Key types
//!
//! - [`GameLogic`] — the trait the game implements
//! - [`RoomManager`] — creates/destroys rooms, routes players
//! - [`RoomHandle`] — send commands to a running room actor
//! - [`RoomConfig`] — room-level limits

mod config;
mod error;
mod logic;
mod manager;
mod room;

pub use config::RoomConfig;
pub use error::RoomError;
pub use logic::{GameLogic, Outcome};
pub use manager::RoomManager;
pub use room::{PlayerSender, RoomHandle, RoomInfo, RoomOutbound};
