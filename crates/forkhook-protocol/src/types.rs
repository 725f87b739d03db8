//! Core protocol types for Forkhook's wire format.
//!
//! Everything in this module travels "on the wire": these are the structures
//! that get serialized, sent over a WebSocket, and deserialized on the other
//! side. Game-specific payloads (intents, snapshots) are opaque bytes at this
//! layer — only the game crate knows their shape.

use serde::{Deserialize, Serialize};

use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a player.
///
/// Newtype over `u64` so a `PlayerId` can never be confused with a `RoomId`
/// even though both are plain numbers underneath. `#[serde(transparent)]`
/// makes it serialize as the bare number, so `PlayerId(42)` is just `42` in
/// JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// A unique identifier for a room.
///
/// Room ids double as the join code players type to find each other, so the
/// manager keeps them short (four digits) rather than sequential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub u64);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Recipient — who should receive a message?
// ---------------------------------------------------------------------------

/// Specifies who should receive a server event.
///
/// Game logic returns `(Recipient, ServerMessage)` pairs; this enum tells
/// the room actor where to deliver each one. Rule rejections go to the
/// acting player only, table-wide events to everyone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recipient {
    /// Send to every player in the room.
    All,

    /// Send to one specific player.
    Player(PlayerId),

    /// Send to everyone except the specified player.
    AllExcept(PlayerId),
}

// ---------------------------------------------------------------------------
// SystemMessage — framework-level messages
// ---------------------------------------------------------------------------

/// A summary of a room returned in room listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomListEntry {
    /// The room's join code.
    pub room_id: RoomId,
    /// Number of players currently seated.
    pub player_count: usize,
    /// Maximum players allowed.
    pub max_players: usize,
}

/// Messages used by the framework itself (not game-specific).
///
/// These handle the plumbing: connecting, heartbeats, and room lifecycle.
/// `#[serde(tag = "type")]` produces internally tagged JSON —
/// `{ "type": "Handshake", "version": 1 }` — which is what the browser
/// client expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SystemMessage {
    // -- Connection lifecycle --

    /// Client → Server: "Hello, I want to connect."
    /// `version` lets the server reject incompatible clients.
    Handshake { version: u32 },

    /// Server → Client: "Welcome, you're connected."
    /// The server assigns the `player_id`; there is no account system —
    /// a connection is an identity.
    HandshakeAck {
        player_id: PlayerId,
        server_time: u64,
    },

    /// Either direction: "I'm disconnecting."
    Disconnect { reason: String },

    // -- Heartbeat (keep-alive) --

    /// Client → Server: "I'm still here." `client_time` is echoed back
    /// so the client can measure round-trip time.
    Heartbeat { client_time: u64 },

    /// Server → Client: heartbeat echo with timing info.
    HeartbeatAck {
        client_time: u64,
        server_time: u64,
    },

    // -- Room lifecycle --

    /// Client → Server: "Open a new table." `deck_count` is 1 for a
    /// 54-card game or 2 for the 108-card variant (four jokers, re-forks).
    CreateRoom { deck_count: u8 },

    /// Server → Client: "Room opened, here's the join code."
    RoomCreated { room_id: RoomId },

    /// Client → Server: "Seat me in this room."
    JoinRoom { room_id: RoomId },

    /// Server → Client: "You're seated."
    RoomJoined { room_id: RoomId },

    /// Client → Server: "I'm leaving the room."
    LeaveRoom,

    /// Client → Server: "Show me open tables."
    ListRooms,

    /// Server → Client: "Here are the open tables."
    RoomList { rooms: Vec<RoomListEntry> },

    // -- Errors --

    /// Server → Client: "Something went wrong." `code` follows HTTP-style
    /// conventions (400 bad request, 404 not found, 409 conflict).
    Error { code: u16, message: String },
}

// ---------------------------------------------------------------------------
// Payload / Envelope — the top-level wire format
// ---------------------------------------------------------------------------

/// The content of a message: either a system message or game data.
///
/// `#[serde(tag = "type", content = "data")]` produces adjacently tagged
/// JSON, so the framework can check "is this plumbing I handle, or game
/// bytes I pass through?" without touching the inner value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Payload {
    /// A framework-level message (handshake, heartbeat, room lifecycle).
    System(SystemMessage),

    /// Game-specific data, opaque to the framework. These bytes are the
    /// game's intent, event, or snapshot, serialized by the codec.
    Game(Vec<u8>),
}

/// The top-level message wrapper. Every message on the wire is an Envelope:
/// a little metadata on the outside, the payload inside.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Auto-incrementing sequence number. Each side keeps its own counter;
    /// used to spot missing or reordered messages while debugging.
    pub seq: u64,

    /// Milliseconds since the connection was established.
    pub timestamp: u64,

    /// The actual message content (system or game data).
    pub payload: Payload,
}

// ---------------------------------------------------------------------------
// GameFrame — what the server puts inside Payload::Game
// ---------------------------------------------------------------------------

/// Server → client game payloads come in two flavors: a per-viewer state
/// snapshot (sent after every state-changing intent) or a discrete event.
///
/// Generic so the protocol layer stays ignorant of the concrete game types;
/// the server instantiates it with the game's snapshot and event types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum GameFrame<S, M> {
    /// The full table as seen by the receiving player.
    Snapshot(S),
    /// A discrete game event (rejection, fork window, game over, ...).
    Event(M),
}

// =========================================================================
// Tests
// =========================================================================
