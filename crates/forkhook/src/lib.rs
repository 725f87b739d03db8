//! # Forkhook
//!
//! WebSocket server for a multiplayer trick-taking card game with fork
//! and hook interrupts.
//!
//! The server is layered the same way the workspace is:
//!
//! ```text
//! forkhook (this crate)  — accept loop, handshake, message routing
//!     ↕
//! forkhook-room          — one actor per table, snapshot fan-out
//!     ↕
//! forkhook-game          — the turn engine and rules
//!     ↕
//! forkhook-protocol / forkhook-transport — envelopes and sockets
//! ```
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use forkhook::prelude::*;
//! use forkhook_game::{ForkGame, GameConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ForkhookError> {
//!     let server = ServerBuilder::new()
//!         .bind("0.0.0.0:8080")
//!         .build::<ForkGame>(|deck_count| GameConfig {
//!             deck_count,
//!             seed: None,
//!         })
//!         .await?;
//!     server.run().await
//! }
//! ```

mod error;
mod handler;
mod server;

pub use error::ForkhookError;
pub use server::{Server, ServerBuilder, PROTOCOL_VERSION};

/// The common imports for building and talking to a Forkhook server.
pub mod prelude {
    pub use crate::{
        ForkhookError, Server, ServerBuilder, PROTOCOL_VERSION,
    };
    pub use forkhook_protocol::{
        Codec, Envelope, GameFrame, JsonCodec, Payload, PlayerId,
        Recipient, RoomId, RoomListEntry, SystemMessage,
    };
    pub use forkhook_room::{
        GameLogic, Outcome, RoomConfig, RoomManager,
    };
}
