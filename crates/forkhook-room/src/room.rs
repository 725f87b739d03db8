//! Room actor: an isolated Tokio task that owns one table.
//!
//! Each room runs in its own task, communicating with the outside world
//! through an mpsc channel. Commands are applied strictly in arrival
//! order, and snapshots are computed from post-mutation state before the
//! next command is taken — that channel IS the room's mutual exclusion,
//! so turn-order correctness never depends on a lock.

use std::collections::HashMap;

use forkhook_protocol::{PlayerId, Recipient, RoomId};
use tokio::sync::{mpsc, oneshot};

use crate::{GameLogic, RoomConfig, RoomError};

/// An outbound message from the room actor to a player's connection
/// handler.
pub enum RoomOutbound<G: GameLogic> {
    /// The table as seen by the receiving player. Sent to every seated
    /// player after each state-changing intent.
    Snapshot(G::Snapshot),
    /// A discrete game event.
    Message(G::ServerMessage),
}

impl<G: GameLogic> Clone for RoomOutbound<G> {
    fn clone(&self) -> Self {
        match self {
            Self::Snapshot(s) => Self::Snapshot(s.clone()),
            Self::Message(m) => Self::Message(m.clone()),
        }
    }
}

/// Channel sender for delivering outbound messages to a player.
pub type PlayerSender<G> = mpsc::UnboundedSender<RoomOutbound<G>>;

/// Commands sent to a room actor through its channel.
pub(crate) enum RoomCommand<G: GameLogic> {
    /// Seat a player in the room.
    Join {
        player_id: PlayerId,
        sender: PlayerSender<G>,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    /// Remove a player from the room. Replies with the number of players
    /// left so the manager can destroy empty rooms.
    Leave {
        player_id: PlayerId,
        reply: oneshot::Sender<Result<usize, RoomError>>,
    },

    /// Deliver a game intent from a player.
    Message {
        sender: PlayerId,
        msg: G::ClientMessage,
    },

    /// Request the current room metadata.
    GetInfo { reply: oneshot::Sender<RoomInfo> },

    /// Shut down the room.
    Shutdown,
}

/// A snapshot of room metadata (not the game state itself).
#[derive(Debug, Clone)]
pub struct RoomInfo {
    /// The room's join code.
    pub room_id: RoomId,
    /// Number of players currently seated.
    pub player_count: usize,
    /// Maximum players allowed.
    pub max_players: usize,
}

impl RoomInfo {
    /// Whether the room has a free seat. The game may still turn a
    /// joiner away (e.g. mid-game); this is only the actor-level check.
    pub fn has_free_seat(&self) -> bool {
        self.player_count < self.max_players
    }
}

/// Handle to a running room actor. Cheap to clone — it's just an
/// `mpsc::Sender` wrapper. The `RoomManager` holds one per room.
#[derive(Clone)]
pub struct RoomHandle<G: GameLogic> {
    room_id: RoomId,
    sender: mpsc::Sender<RoomCommand<G>>,
}

impl<G: GameLogic> RoomHandle<G> {
    /// Returns the room's join code.
    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    /// Sends a join request to the room.
    pub async fn join(
        &self,
        player_id: PlayerId,
        sender: PlayerSender<G>,
    ) -> Result<(), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Join {
                player_id,
                sender,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))?
    }

    /// Sends a leave request to the room. On success returns the number
    /// of players remaining.
    pub async fn leave(
        &self,
        player_id: PlayerId,
    ) -> Result<usize, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Leave {
                player_id,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))?
    }

    /// Sends a game intent to the room (fire-and-forget).
    pub async fn send_message(
        &self,
        sender: PlayerId,
        msg: G::ClientMessage,
    ) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Message { sender, msg })
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))
    }

    /// Requests the current room info.
    pub async fn get_info(&self) -> Result<RoomInfo, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::GetInfo { reply: reply_tx })
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))
    }

    /// Tells the room to shut down.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Shutdown)
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))
    }
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor<G: GameLogic> {
    room_id: RoomId,
    config: RoomConfig,
    /// Seated players in join order.
    players: Vec<PlayerId>,
    /// Per-player outbound channels.
    senders: HashMap<PlayerId, PlayerSender<G>>,
    state: G::State,
    receiver: mpsc::Receiver<RoomCommand<G>>,
}

impl<G: GameLogic> RoomActor<G> {
    /// Runs the actor loop, processing commands until shutdown.
    async fn run(mut self) {
        tracing::info!(room_id = %self.room_id, "room actor started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                RoomCommand::Join {
                    player_id,
                    sender,
                    reply,
                } => {
                    let result = self.handle_join(player_id, sender);
                    let _ = reply.send(result);
                }
                RoomCommand::Leave { player_id, reply } => {
                    let result = self.handle_leave(player_id);
                    let _ = reply.send(result);
                }
                RoomCommand::Message { sender, msg } => {
                    self.handle_message(sender, msg);
                }
                RoomCommand::GetInfo { reply } => {
                    let _ = reply.send(self.info());
                }
                RoomCommand::Shutdown => {
                    tracing::info!(room_id = %self.room_id, "room shutting down");
                    break;
                }
            }
        }

        tracing::info!(room_id = %self.room_id, "room actor stopped");
    }

    fn handle_join(
        &mut self,
        player_id: PlayerId,
        sender: PlayerSender<G>,
    ) -> Result<(), RoomError> {
        if self.players.contains(&player_id) {
            return Err(RoomError::AlreadyInRoom(player_id, self.room_id));
        }
        if self.players.len() >= self.config.max_players {
            return Err(RoomError::RoomFull(self.room_id));
        }
        G::on_join(&mut self.state, player_id)
            .map_err(RoomError::Rejected)?;

        self.players.push(player_id);
        self.senders.insert(player_id, sender);
        tracing::info!(
            room_id = %self.room_id,
            %player_id,
            players = self.players.len(),
            "player joined"
        );

        // Everyone (including the newcomer) sees the new seating.
        self.broadcast_snapshots();
        Ok(())
    }

    fn handle_leave(
        &mut self,
        player_id: PlayerId,
    ) -> Result<usize, RoomError> {
        let Some(pos) =
            self.players.iter().position(|p| *p == player_id)
        else {
            return Err(RoomError::NotInRoom(player_id, self.room_id));
        };
        self.players.remove(pos);
        self.senders.remove(&player_id);

        tracing::info!(
            room_id = %self.room_id,
            %player_id,
            players = self.players.len(),
            "player left"
        );

        let outcome = G::on_leave(&mut self.state, player_id);
        self.dispatch(outcome.events);
        if outcome.state_changed {
            self.broadcast_snapshots();
        }

        Ok(self.players.len())
    }

    fn handle_message(&mut self, sender: PlayerId, msg: G::ClientMessage) {
        if !self.players.contains(&sender) {
            tracing::warn!(
                room_id = %self.room_id,
                %sender,
                "message from non-member, ignoring"
            );
            return;
        }

        let outcome = G::handle_message(&mut self.state, sender, msg);
        self.dispatch(outcome.events);
        if outcome.state_changed {
            self.broadcast_snapshots();
        }
    }

    /// Sends every seated player their own view of the table.
    fn broadcast_snapshots(&self) {
        for pid in &self.players {
            let view = G::snapshot(&self.state, *pid);
            self.send_to(*pid, RoomOutbound::Snapshot(view));
        }
    }

    /// Dispatches outbound events to the correct recipients.
    fn dispatch(&self, events: Vec<(Recipient, G::ServerMessage)>) {
        for (recipient, msg) in events {
            let outbound = RoomOutbound::Message(msg);
            match recipient {
                Recipient::All => {
                    for pid in &self.players {
                        self.send_to(*pid, outbound.clone());
                    }
                }
                Recipient::Player(pid) => {
                    self.send_to(pid, outbound);
                }
                Recipient::AllExcept(excluded) => {
                    for pid in &self.players {
                        if *pid != excluded {
                            self.send_to(*pid, outbound.clone());
                        }
                    }
                }
            }
        }
    }

    /// Sends an outbound message to a single player. Silently drops if
    /// the receiver is gone (player disconnected).
    fn send_to(&self, player_id: PlayerId, msg: RoomOutbound<G>) {
        if let Some(sender) = self.senders.get(&player_id) {
            let _ = sender.send(msg);
        }
    }

    fn info(&self) -> RoomInfo {
        RoomInfo {
            room_id: self.room_id,
            player_count: self.players.len(),
            max_players: self.config.max_players,
        }
    }
}

/// Spawns a new room actor task and returns a handle to communicate with
/// it. `channel_size` bounds the command queue — if it fills up, senders
/// wait.
pub(crate) fn spawn_room<G: GameLogic>(
    room_id: RoomId,
    config: RoomConfig,
    game_config: G::Config,
    channel_size: usize,
) -> RoomHandle<G> {
    let (tx, rx) = mpsc::channel(channel_size);

    let actor = RoomActor::<G> {
        room_id,
        config,
        players: Vec::new(),
        senders: HashMap::new(),
        state: G::init(&game_config),
        receiver: rx,
    };

    tokio::spawn(actor.run());

    RoomHandle {
        room_id,
        sender: tx,
    }
}
