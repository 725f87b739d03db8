//! Wire protocol for Forkhook.
//!
//! This crate defines the "language" that the card-game client and server
//! speak:
//!
//! - **Types** ([`Envelope`], [`SystemMessage`], [`GameFrame`], etc.) —
//!   the message structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those messages are
//!   converted to/from bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong doing that.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (raw bytes) and the room
//! layer (player intents). It doesn't know about connections, rooms, or
//! card rules — it only knows how to serialize and deserialize messages.
//!
//! ```text
//! Transport (bytes) → Protocol (Envelope) → Room (intents/snapshots)
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    Envelope, GameFrame, Payload, PlayerId, Recipient, RoomId,
    RoomListEntry, SystemMessage,
};
