//! Per-connection handler: handshake, identity, and message routing.
//!
//! Each accepted connection gets its own Tokio task running this
//! handler. The flow is:
//!   1. Receive Handshake → validate version
//!   2. Assign a guest PlayerId (a connection IS an identity — there are
//!      no accounts)
//!   3. Send HandshakeAck → player is connected
//!   4. Loop: receive envelopes → dispatch system or game messages
//!
//! Room traffic flows the other way through a per-join pump task that
//! drains the room's outbound channel onto the socket.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};

use forkhook_protocol::{
    Codec, Envelope, GameFrame, Payload, PlayerId, RoomListEntry,
    SystemMessage,
};
use forkhook_room::{GameLogic, RoomError, RoomOutbound};
use forkhook_transport::WsConnection;
use tokio::sync::mpsc;

use crate::server::{ServerState, PROTOCOL_VERSION};
use crate::ForkhookError;

/// Drop guard that removes the player from their room when the handler
/// exits. Cleanup happens even if the handler errors out; since `Drop`
/// is synchronous, the async work runs in a fire-and-forget task.
struct RoomGuard<G: GameLogic, C: Codec> {
    player_id: PlayerId,
    state: Arc<ServerState<G, C>>,
}

impl<G: GameLogic, C: Codec> Drop for RoomGuard<G, C> {
    fn drop(&mut self) {
        let player_id = self.player_id;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            let mut rooms = state.rooms.lock().await;
            match rooms.leave_room(player_id).await {
                Ok(()) | Err(RoomError::NotInAnyRoom(_)) => {}
                Err(e) => {
                    tracing::debug!(%player_id, error = %e, "cleanup leave failed");
                }
            }
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<G, C>(
    conn: WsConnection,
    state: Arc<ServerState<G, C>>,
) -> Result<(), ForkhookError>
where
    G: GameLogic,
    C: Codec,
{
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    let start = Instant::now();
    let player_id = perform_handshake(&conn, &state, &start).await?;

    tracing::info!(%conn_id, %player_id, "player connected");

    let _guard = RoomGuard {
        player_id,
        state: Arc::clone(&state),
    };

    let mut seq: u64 = 1;

    loop {
        let data = match tokio::time::timeout(
            Duration::from_secs(15),
            conn.recv(),
        )
        .await
        {
            Ok(Ok(Some(data))) => data,
            Ok(Ok(None)) => {
                tracing::info!(%player_id, "connection closed cleanly");
                break;
            }
            Ok(Err(e)) => {
                tracing::debug!(%player_id, error = %e, "recv error");
                break;
            }
            Err(_) => {
                tracing::info!(%player_id, "connection timed out");
                break;
            }
        };

        let envelope: Envelope = match state.codec.decode(&data) {
            Ok(env) => env,
            Err(e) => {
                tracing::debug!(
                    %player_id, error = %e, "failed to decode envelope"
                );
                continue;
            }
        };

        match envelope.payload {
            Payload::System(sys_msg) => {
                let should_close = handle_system_message(
                    &conn, &state, player_id, sys_msg, &mut seq, &start,
                )
                .await?;
                if should_close {
                    break;
                }
            }
            Payload::Game(game_data) => {
                handle_game_message::<G, C>(
                    &conn, &state, player_id, game_data, &mut seq, &start,
                )
                .await?;
            }
        }
    }

    // _guard drops here → the player leaves their room.
    Ok(())
}

/// Performs the initial handshake: receive Handshake, validate, assign
/// an identity, send Ack.
async fn perform_handshake<G, C>(
    conn: &WsConnection,
    state: &Arc<ServerState<G, C>>,
    start: &Instant,
) -> Result<PlayerId, ForkhookError>
where
    G: GameLogic,
    C: Codec,
{
    let data = match tokio::time::timeout(
        Duration::from_secs(5),
        conn.recv(),
    )
    .await
    {
        Ok(Ok(Some(data))) => data,
        Ok(Ok(None)) => {
            return Err(ForkhookError::Protocol(
                forkhook_protocol::ProtocolError::InvalidMessage(
                    "connection closed before handshake".into(),
                ),
            ));
        }
        Ok(Err(e)) => return Err(ForkhookError::Transport(e)),
        Err(_) => {
            return Err(ForkhookError::Protocol(
                forkhook_protocol::ProtocolError::InvalidMessage(
                    "handshake timed out".into(),
                ),
            ));
        }
    };

    let envelope: Envelope = state.codec.decode(&data)?;

    let version = match envelope.payload {
        Payload::System(SystemMessage::Handshake { version }) => version,
        _ => {
            send_error(conn, &state.codec, 400, "expected Handshake", 0, start)
                .await?;
            return Err(ForkhookError::Protocol(
                forkhook_protocol::ProtocolError::InvalidMessage(
                    "first message must be Handshake".into(),
                ),
            ));
        }
    };

    if version != PROTOCOL_VERSION {
        send_error(
            conn,
            &state.codec,
            400,
            &format!(
                "version mismatch: expected {PROTOCOL_VERSION}, got {version}"
            ),
            0,
            start,
        )
        .await?;
        return Err(ForkhookError::Protocol(
            forkhook_protocol::ProtocolError::InvalidMessage(
                "protocol version mismatch".into(),
            ),
        ));
    }

    let player_id = PlayerId(
        state.next_player_id.fetch_add(1, Ordering::Relaxed),
    );

    let ack = Envelope {
        seq: 0,
        timestamp: start.elapsed().as_millis() as u64,
        payload: Payload::System(SystemMessage::HandshakeAck {
            player_id,
            server_time: start.elapsed().as_millis() as u64,
        }),
    };
    let ack_bytes = state.codec.encode(&ack)?;
    conn.send(&ack_bytes).await.map_err(ForkhookError::Transport)?;

    Ok(player_id)
}

/// Handles a system message. Returns `true` if the connection should
/// close.
async fn handle_system_message<G, C>(
    conn: &WsConnection,
    state: &Arc<ServerState<G, C>>,
    player_id: PlayerId,
    msg: SystemMessage,
    seq: &mut u64,
    start: &Instant,
) -> Result<bool, ForkhookError>
where
    G: GameLogic,
    C: Codec,
{
    match msg {
        SystemMessage::Heartbeat { client_time } => {
            let ack = Envelope {
                seq: next_seq(seq),
                timestamp: start.elapsed().as_millis() as u64,
                payload: Payload::System(SystemMessage::HeartbeatAck {
                    client_time,
                    server_time: start.elapsed().as_millis() as u64,
                }),
            };
            let bytes = state.codec.encode(&ack)?;
            conn.send(&bytes).await.map_err(ForkhookError::Transport)?;
        }

        SystemMessage::CreateRoom { deck_count } => {
            let config = (state.config_for)(deck_count);
            let room_id = state.rooms.lock().await.create_room(config);

            let resp = Envelope {
                seq: next_seq(seq),
                timestamp: start.elapsed().as_millis() as u64,
                payload: Payload::System(SystemMessage::RoomCreated {
                    room_id,
                }),
            };
            let bytes = state.codec.encode(&resp)?;
            conn.send(&bytes).await.map_err(ForkhookError::Transport)?;
        }

        SystemMessage::JoinRoom { room_id } => {
            // The room delivers snapshots and events on this channel;
            // the pump task moves them onto the socket.
            let (tx, rx) = mpsc::unbounded_channel();

            let join_result = {
                let mut rooms = state.rooms.lock().await;
                rooms.join_room(player_id, room_id, tx).await
            };

            match join_result {
                Ok(()) => {
                    spawn_outbound_pump::<G, C>(
                        conn.clone(),
                        Arc::clone(state),
                        rx,
                    );
                    let resp = Envelope {
                        seq: next_seq(seq),
                        timestamp: start.elapsed().as_millis() as u64,
                        payload: Payload::System(
                            SystemMessage::RoomJoined { room_id },
                        ),
                    };
                    let bytes = state.codec.encode(&resp)?;
                    conn.send(&bytes)
                        .await
                        .map_err(ForkhookError::Transport)?;
                }
                Err(e) => {
                    let code = match e {
                        RoomError::NotFound(_) => 404,
                        _ => 409,
                    };
                    send_error(
                        conn,
                        &state.codec,
                        code,
                        &e.to_string(),
                        next_seq(seq),
                        start,
                    )
                    .await?;
                }
            }
        }

        SystemMessage::LeaveRoom => {
            let mut rooms = state.rooms.lock().await;
            if let Err(e) = rooms.leave_room(player_id).await {
                tracing::debug!(
                    %player_id, error = %e, "leave room failed"
                );
            }
        }

        SystemMessage::ListRooms => {
            let entries: Vec<RoomListEntry> = {
                let rooms = state.rooms.lock().await;
                rooms
                    .list_rooms()
                    .await
                    .into_iter()
                    .map(|info| RoomListEntry {
                        room_id: info.room_id,
                        player_count: info.player_count,
                        max_players: info.max_players,
                    })
                    .collect()
            };

            let resp = Envelope {
                seq: next_seq(seq),
                timestamp: start.elapsed().as_millis() as u64,
                payload: Payload::System(SystemMessage::RoomList {
                    rooms: entries,
                }),
            };
            let bytes = state.codec.encode(&resp)?;
            conn.send(&bytes).await.map_err(ForkhookError::Transport)?;
        }

        SystemMessage::Disconnect { reason } => {
            tracing::info!(%player_id, %reason, "client disconnected");
            return Ok(true);
        }

        _ => {
            tracing::debug!(
                %player_id, "ignoring unexpected system message"
            );
        }
    }

    Ok(false)
}

/// Handles a game payload: decode the intent, route it to the player's
/// room.
async fn handle_game_message<G, C>(
    conn: &WsConnection,
    state: &Arc<ServerState<G, C>>,
    player_id: PlayerId,
    game_data: Vec<u8>,
    seq: &mut u64,
    start: &Instant,
) -> Result<(), ForkhookError>
where
    G: GameLogic,
    C: Codec,
{
    let client_msg: G::ClientMessage = match state.codec.decode(&game_data)
    {
        Ok(msg) => msg,
        Err(e) => {
            send_error(
                conn,
                &state.codec,
                400,
                &format!("invalid game message: {e}"),
                next_seq(seq),
                start,
            )
            .await?;
            return Ok(());
        }
    };

    let result = state
        .rooms
        .lock()
        .await
        .route_message(player_id, client_msg)
        .await;

    if let Err(e) = result {
        send_error(
            conn,
            &state.codec,
            400,
            &e.to_string(),
            next_seq(seq),
            start,
        )
        .await?;
    }

    Ok(())
}

/// Spawns the task that drains a room's outbound channel onto the
/// socket. Ends when the room drops the channel (player left, room
/// destroyed) or the socket dies.
fn spawn_outbound_pump<G, C>(
    conn: WsConnection,
    state: Arc<ServerState<G, C>>,
    mut rx: mpsc::UnboundedReceiver<RoomOutbound<G>>,
) where
    G: GameLogic,
    C: Codec,
{
    let start = Instant::now();
    tokio::spawn(async move {
        let mut seq: u64 = 1;
        while let Some(outbound) = rx.recv().await {
            let frame: GameFrame<G::Snapshot, G::ServerMessage> =
                match outbound {
                    RoomOutbound::Snapshot(s) => GameFrame::Snapshot(s),
                    RoomOutbound::Message(m) => GameFrame::Event(m),
                };
            let bytes = match state.codec.encode(&frame) {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::warn!(error = %e, "failed to encode game frame");
                    continue;
                }
            };
            let envelope = Envelope {
                seq: next_seq(&mut seq),
                timestamp: start.elapsed().as_millis() as u64,
                payload: Payload::Game(bytes),
            };
            let env_bytes = match state.codec.encode(&envelope) {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::warn!(error = %e, "failed to encode envelope");
                    continue;
                }
            };
            if conn.send(&env_bytes).await.is_err() {
                break;
            }
        }
        tracing::debug!(conn_id = %conn.id(), "outbound pump stopped");
    });
}

/// Sends a SystemMessage::Error envelope to the client.
async fn send_error(
    conn: &WsConnection,
    codec: &impl Codec,
    code: u16,
    message: &str,
    seq: u64,
    start: &Instant,
) -> Result<(), ForkhookError> {
    let envelope = Envelope {
        seq,
        timestamp: start.elapsed().as_millis() as u64,
        payload: Payload::System(SystemMessage::Error {
            code,
            message: message.to_string(),
        }),
    };
    let bytes = codec.encode(&envelope)?;
    conn.send(&bytes).await.map_err(ForkhookError::Transport)?;
    Ok(())
}

/// Increments and returns the next sequence number.
fn next_seq(seq: &mut u64) -> u64 {
    let current = *seq;
    *seq += 1;
    current
}
