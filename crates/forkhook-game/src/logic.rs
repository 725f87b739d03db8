//! Room-boundary glue: wire intents, game events, and the [`GameLogic`]
//! implementation that plugs the table into the room layer.
//!
//! The boundary owns validation of player-supplied card tokens: intents
//! carry raw strings, and nothing reaches the engine until every token
//! parses into a known card. Engine rejections come back as [`GameEvent::
//! Rejected`] addressed to the acting player only.

use forkhook_cards::Card;
use forkhook_protocol::{PlayerId, Recipient};
use forkhook_room::{GameLogic, Outcome, RoomConfig};
use serde::{Deserialize, Serialize};

use crate::error::PlayError;
use crate::table::{PassOutcome, PlayOutcome, Table, MAX_PLAYERS};
use crate::view::{GameResult, TableView};

/// Per-room game settings, chosen at room creation.
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// 1 for a 54-card game, 2 for the 108-card variant.
    pub deck_count: u8,
    /// Deal seed for reproducible games; `None` draws from the OS.
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            deck_count: 1,
            seed: None,
        }
    }
}

/// Intents players send to the table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientIntent {
    /// Deal a new game (also starts the rematch after one ends).
    Start,
    /// Play cards: a lead, a beat, a fork, or a hook, depending on the
    /// table state. Cards travel as raw display tokens (`"♥4"`).
    Play { cards: Vec<String> },
    /// Pass the turn, or abstain during a fork/hook window.
    Pass,
    /// Change the sender's display name.
    Rename { name: String },
}

/// Discrete events the game emits (snapshots travel separately).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    /// The sender's intent was refused. Sent only to the sender; state
    /// did not change.
    Rejected { reason: String },
    /// A fresh game was dealt.
    Started,
    /// A single is exposed; holders of a pair of its rank may fork.
    ForkWindow { exposed: Card },
    /// A fork seized the exposed card; hooks are open.
    Forked { by: PlayerId, exposed: Card },
    /// A hook answered the fork.
    Hooked { by: PlayerId, exposed: Card },
    /// `player` may now play anything.
    FreeLead { player: PlayerId },
    /// The game ended.
    GameOver { result: GameResult },
}

/// The fork/hook game, plugged into the room layer.
pub struct ForkGame;

impl GameLogic for ForkGame {
    type Config = GameConfig;
    type State = Table;
    type ClientMessage = ClientIntent;
    type ServerMessage = GameEvent;
    type Snapshot = TableView;

    fn init(config: &GameConfig) -> Table {
        Table::new(config.deck_count, config.seed)
    }

    fn on_join(state: &mut Table, player: PlayerId) -> Result<(), String> {
        state.add_player(player).map_err(|e| e.to_string())
    }

    fn on_leave(state: &mut Table, player: PlayerId) -> Outcome<GameEvent> {
        match state.remove_player(player) {
            Some(result) => Outcome::changed(vec![(
                Recipient::All,
                GameEvent::GameOver { result },
            )]),
            None => Outcome::changed(vec![]),
        }
    }

    fn handle_message(
        state: &mut Table,
        sender: PlayerId,
        msg: ClientIntent,
    ) -> Outcome<GameEvent> {
        match msg {
            ClientIntent::Start => match state.start() {
                Ok(()) => Outcome::changed(vec![(
                    Recipient::All,
                    GameEvent::Started,
                )]),
                Err(e) => reject(sender, &e),
            },

            ClientIntent::Play { cards } => {
                let parsed: Result<Vec<Card>, _> =
                    cards.iter().map(|t| t.parse()).collect();
                let cards = match parsed {
                    Ok(cards) => cards,
                    Err(e) => {
                        return Outcome::unchanged(vec![(
                            Recipient::Player(sender),
                            GameEvent::Rejected {
                                reason: e.to_string(),
                            },
                        )]);
                    }
                };
                match state.play(sender, &cards) {
                    Ok(outcome) => {
                        Outcome::changed(play_events(sender, outcome))
                    }
                    Err(e) => reject(sender, &e),
                }
            }

            ClientIntent::Pass => match state.pass(sender) {
                Ok(outcome) => Outcome::changed(pass_events(outcome)),
                Err(e) => reject(sender, &e),
            },

            ClientIntent::Rename { name } => {
                match state.rename(sender, &name) {
                    Ok(()) => Outcome::changed(vec![]),
                    Err(e) => reject(sender, &e),
                }
            }
        }
    }

    fn snapshot(state: &Table, viewer: PlayerId) -> TableView {
        state.snapshot(viewer)
    }

    fn room_config() -> RoomConfig {
        RoomConfig {
            max_players: MAX_PLAYERS,
        }
    }
}

fn reject(sender: PlayerId, err: &PlayError) -> Outcome<GameEvent> {
    tracing::debug!(player = %sender, %err, "intent rejected");
    Outcome::unchanged(vec![(
        Recipient::Player(sender),
        GameEvent::Rejected {
            reason: err.to_string(),
        },
    )])
}

fn play_events(
    sender: PlayerId,
    outcome: PlayOutcome,
) -> Vec<(Recipient, GameEvent)> {
    match outcome {
        PlayOutcome::Played => vec![],
        PlayOutcome::ForkWindow { exposed } => {
            vec![(Recipient::All, GameEvent::ForkWindow { exposed })]
        }
        PlayOutcome::Forked { exposed } => vec![(
            Recipient::All,
            GameEvent::Forked { by: sender, exposed },
        )],
        PlayOutcome::Hooked { exposed, refork } => {
            let mut events = vec![(
                Recipient::All,
                GameEvent::Hooked { by: sender, exposed },
            )];
            if refork {
                events.push((
                    Recipient::All,
                    GameEvent::ForkWindow { exposed },
                ));
            } else {
                events.push((
                    Recipient::All,
                    GameEvent::FreeLead { player: sender },
                ));
            }
            events
        }
        PlayOutcome::Finished(result) => {
            vec![(Recipient::All, GameEvent::GameOver { result })]
        }
    }
}

fn pass_events(outcome: PassOutcome) -> Vec<(Recipient, GameEvent)> {
    match outcome {
        PassOutcome::Passed
        | PassOutcome::Abstained
        | PassOutcome::ForkWindowClosed => vec![],
        PassOutcome::InterruptWon { leader } => {
            vec![(Recipient::All, GameEvent::FreeLead { player: leader })]
        }
        PassOutcome::FreeLead { player } => {
            vec![(Recipient::All, GameEvent::FreeLead { player })]
        }
        PassOutcome::Finished(result) => {
            vec![(Recipient::All, GameEvent::GameOver { result })]
        }
    }
}
