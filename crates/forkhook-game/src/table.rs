//! The turn engine: one table's authoritative game state.
//!
//! The table owns player order, hands, the combination in play, pass
//! tracking, the fork/hook interrupt machine, and scoring. It is pure
//! synchronous state — no I/O, no channels — so one table can be driven
//! and inspected in isolation. The room actor serializes access to it.
//!
//! Interrupt flow, the one non-local part of the rules:
//!
//! ```text
//!            single played, someone else holds a pair of it
//! awaiting ───────────────────────────────────────────────▶ fork-pending
//!     ▲                                                          │
//!     │ everyone declines: the single resolves,                  │ pair of the
//!     │ turn advances                                            │ exposed rank
//!     │                                                          ▼
//!     │        everyone declines: forker takes a free lead  hook-pending
//!     └──────────────────────────────────────────────────────────┤
//!                │ one card of the exposed rank                  │
//!                ▼                                               │
//!        two decks & someone can fork again ──▶ fork-pending     │
//!        otherwise: hooker takes a free lead ────────────────────┘
//! ```

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use forkhook_cards::{
    arrange_hand, can_fork, can_hook, full_deck, Card, Combo, ComboKind,
    Rank, Suit,
};
use forkhook_protocol::PlayerId;

use crate::error::PlayError;
use crate::view::{
    GameResult, InterruptView, PlayView, PlayerView, ScoreLine, TableView,
};

/// Seat limits for one table.
pub const MIN_PLAYERS: usize = 2;
pub const MAX_PLAYERS: usize = 6;

/// One seated player.
struct Seat {
    id: PlayerId,
    name: String,
    hand: Vec<Card>,
    score: i32,
    /// Left mid-game; the seat is kept so ids and scores stay resolvable,
    /// and purged before the next deal.
    departed: bool,
}

/// The combination currently in play.
struct PlayedCombo {
    cards: Vec<Card>,
    combo: Combo,
    owner: PlayerId,
}

/// The fork/hook interrupt machine. Exactly one variant holds at a time,
/// which is the mutual-exclusion invariant by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Interrupt {
    Idle,
    /// A single is exposed and may be forked by anyone but `owner`.
    /// `after_hook` distinguishes the re-fork window of two-deck games:
    /// when it closes unanswered, `owner` (the hooker) takes a free lead
    /// instead of the turn advancing.
    ForkPending {
        exposed: Card,
        owner: PlayerId,
        after_hook: bool,
    },
    /// A fork has been answered; anyone but `forker` may hook.
    HookPending { exposed: Card, forker: PlayerId },
}

/// What a successful play did to the table.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayOutcome {
    /// A normal play; the turn advanced.
    Played,
    /// A single was played and is now exposed to forks.
    ForkWindow { exposed: Card },
    /// A fork seized the exposed card; hooks are now open.
    Forked { exposed: Card },
    /// A hook answered the fork. With `refork` the fight continues in a
    /// new fork window; otherwise the hooker takes a free lead.
    Hooked { exposed: Card, refork: bool },
    /// This play ended the game.
    Finished(GameResult),
}

/// What a pass did to the table.
#[derive(Debug, Clone, PartialEq)]
pub enum PassOutcome {
    /// A normal pass; the turn advanced.
    Passed,
    /// An abstention during an interrupt window; the window stays open.
    Abstained,
    /// Everyone declined to fork; the single resolved and the turn
    /// advanced.
    ForkWindowClosed,
    /// An interrupt was settled: `leader` takes a free lead (the forker
    /// after an unanswered fork, or the hooker after a closed re-fork
    /// window).
    InterruptWon { leader: PlayerId },
    /// Every other active player has passed on a round whose winner
    /// already emptied their hand: `player` may play anything.
    FreeLead { player: PlayerId },
    /// This pass ended the game (only one player still held cards).
    Finished(GameResult),
}

/// Decision half of turn advancement, kept pure so it can be tested
/// without a table: from `current`, the next seat holding cards, or
/// `Wrapped` if the scan comes all the way around.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NextActor {
    Seat(usize),
    Wrapped,
}

pub(crate) fn next_actor(hand_sizes: &[usize], current: usize) -> NextActor {
    let n = hand_sizes.len();
    let mut idx = current;
    loop {
        idx = (idx + 1) % n;
        if idx == current {
            return NextActor::Wrapped;
        }
        if hand_sizes[idx] > 0 {
            return NextActor::Seat(idx);
        }
    }
}

/// One table's full game state.
pub struct Table {
    deck_count: u8,
    /// Optional deal seed for reproducible games; successive deals in the
    /// same room still differ.
    seed: Option<u64>,
    games_played: u64,
    seats: Vec<Seat>,
    started: bool,
    current: Option<usize>,
    last_play: Option<PlayedCombo>,
    /// Players who have passed (or abstained) since the last reset.
    passed: Vec<PlayerId>,
    interrupt: Interrupt,
    giving_light: bool,
    /// The player whose hand most recently emptied; arms the free-lead
    /// rule until consumed.
    last_empty: Option<PlayerId>,
    /// Players in the order their hands first emptied.
    finished: Vec<PlayerId>,
    /// Everything dealt this game, for the conservation check.
    dealt: Vec<Card>,
    /// Cards played out of hands this game.
    discards: Vec<Card>,
    result: Option<GameResult>,
}

impl Table {
    /// Creates an empty table. `deck_count` outside 1..=2 is clamped.
    pub fn new(deck_count: u8, seed: Option<u64>) -> Self {
        Self {
            deck_count: deck_count.clamp(1, 2),
            seed,
            games_played: 0,
            seats: Vec::new(),
            started: false,
            current: None,
            last_play: None,
            passed: Vec::new(),
            interrupt: Interrupt::Idle,
            giving_light: false,
            last_empty: None,
            finished: Vec::new(),
            dealt: Vec::new(),
            discards: Vec::new(),
            result: None,
        }
    }

    // -----------------------------------------------------------------
    // Seating
    // -----------------------------------------------------------------

    /// Seats a player with a default name. Refused while a game is
    /// running or when the table is full.
    pub fn add_player(&mut self, id: PlayerId) -> Result<(), PlayError> {
        if self.started {
            return Err(PlayError::AlreadyStarted);
        }
        if self.seats.iter().filter(|s| !s.departed).count()
            >= MAX_PLAYERS
        {
            return Err(PlayError::TableFull);
        }
        self.seats.retain(|s| !s.departed);
        self.seats.push(Seat {
            id,
            name: format!("player {}", self.seats.len() + 1),
            hand: Vec::new(),
            score: 0,
            departed: false,
        });
        Ok(())
    }

    /// Sets a player's display name.
    pub fn rename(
        &mut self,
        id: PlayerId,
        name: &str,
    ) -> Result<(), PlayError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(PlayError::EmptyName);
        }
        let seat = self
            .seats
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(PlayError::NotSeated)?;
        seat.name = name.to_string();
        Ok(())
    }

    /// Removes a player. Before a game this frees the seat; mid-game the
    /// seat stays (so ids and scores keep resolving) but its cards are
    /// abandoned, which can end the game — the result is returned when it
    /// does.
    pub fn remove_player(&mut self, id: PlayerId) -> Option<GameResult> {
        let idx = self.seats.iter().position(|s| s.id == id)?;
        if !self.started {
            self.seats.remove(idx);
            return None;
        }

        let abandoned = std::mem::take(&mut self.seats[idx].hand);
        self.discards.extend(abandoned);
        self.seats[idx].departed = true;
        tracing::info!(player = %id, "player abandoned a running game");

        if self.holders() <= 1 {
            // The deserter takes the loss: any remaining holder counts
            // as finished ahead of them.
            let holders: Vec<PlayerId> = self
                .seats
                .iter()
                .filter(|s| !s.hand.is_empty())
                .map(|s| s.id)
                .collect();
            for h in holders {
                if !self.finished.contains(&h) {
                    self.finished.push(h);
                }
            }
            if !self.finished.contains(&id) {
                self.finished.push(id);
            }
            return Some(self.finalize());
        }
        if self.current == Some(idx) {
            match self.interrupt {
                Interrupt::Idle => self.advance_turn(),
                // An interrupt window stays open; the empty seat just
                // stops counting toward the tally.
                _ => {}
            }
        }
        None
    }

    // -----------------------------------------------------------------
    // Starting a game
    // -----------------------------------------------------------------

    /// Deals a fresh game. Scores persist across games in the same room;
    /// everything else resets.
    pub fn start(&mut self) -> Result<(), PlayError> {
        if self.started {
            return Err(PlayError::AlreadyStarted);
        }
        self.seats.retain(|s| !s.departed);
        if self.seats.len() < MIN_PLAYERS {
            return Err(PlayError::NotEnoughPlayers);
        }

        self.last_play = None;
        self.passed.clear();
        self.interrupt = Interrupt::Idle;
        self.giving_light = false;
        self.last_empty = None;
        self.finished.clear();
        self.discards.clear();
        self.result = None;

        let mut deck = full_deck(self.deck_count);
        let mut rng: StdRng = match self.seed {
            Some(s) => {
                StdRng::seed_from_u64(s.wrapping_add(self.games_played))
            }
            None => StdRng::from_os_rng(),
        };
        deck.shuffle(&mut rng);
        self.dealt = deck.clone();
        self.games_played += 1;

        // Split as evenly as possible, remainder to the earliest seats.
        let n = self.seats.len();
        let base = deck.len() / n;
        let extra = deck.len() % n;
        let mut cursor = 0;
        for (i, seat) in self.seats.iter_mut().enumerate() {
            let take = base + usize::from(i < extra);
            seat.hand = deck[cursor..cursor + take].to_vec();
            cursor += take;
            arrange_hand(&mut seat.hand);
        }

        // The holder of the heart 4 opens.
        let sentinel = Card::suited(Suit::Hearts, Rank::Four);
        self.current = Some(
            self.seats
                .iter()
                .position(|s| s.hand.contains(&sentinel))
                .unwrap_or(0),
        );
        self.started = true;
        tracing::info!(
            players = n,
            deck_count = self.deck_count,
            "game started"
        );
        Ok(())
    }

    // -----------------------------------------------------------------
    // Playing
    // -----------------------------------------------------------------

    /// Applies a play: a normal combination, a fork, or a hook, depending
    /// on the interrupt state. Rejections never mutate anything.
    pub fn play(
        &mut self,
        player: PlayerId,
        cards: &[Card],
    ) -> Result<PlayOutcome, PlayError> {
        let idx =
            self.seat_index(player).ok_or(PlayError::NotSeated)?;
        if !self.started {
            return Err(PlayError::NotStarted);
        }

        match self.interrupt {
            Interrupt::ForkPending { exposed, owner, .. } => {
                return self.play_fork(idx, exposed, owner, cards);
            }
            Interrupt::HookPending { exposed, forker } => {
                return self.play_hook(idx, exposed, forker, cards);
            }
            Interrupt::Idle => {}
        }

        if self.current != Some(idx) {
            return Err(PlayError::NotYourTurn);
        }

        // Validate before touching anything.
        let remaining = self.hand_without(idx, cards)?;
        let combo =
            Combo::classify(cards).ok_or(PlayError::InvalidCombo)?;
        if let Some(lp) = &self.last_play {
            if !combo.beats(&lp.combo) {
                return Err(PlayError::CannotBeat);
            }
        }

        // Commit.
        self.seats[idx].hand = remaining;
        self.discards.extend_from_slice(cards);
        self.giving_light = false;
        self.passed.clear();
        self.last_play = Some(PlayedCombo {
            cards: cards.to_vec(),
            combo,
            owner: player,
        });
        self.note_emptied(idx);
        self.assert_conserved()?;

        if self.holders() <= 1 {
            return Ok(PlayOutcome::Finished(self.finalize()));
        }

        // A lone single invites forks when another player holds a pair
        // of its rank.
        if combo.kind() == ComboKind::Single {
            let exposed = cards[0];
            let fork_possible =
                self.seats.iter().enumerate().any(|(i, s)| {
                    i != idx
                        && !s.hand.is_empty()
                        && can_fork(exposed, &s.hand)
                });
            if fork_possible {
                self.interrupt = Interrupt::ForkPending {
                    exposed,
                    owner: player,
                    after_hook: false,
                };
                return Ok(PlayOutcome::ForkWindow { exposed });
            }
        }

        self.advance_turn();
        Ok(PlayOutcome::Played)
    }

    fn play_fork(
        &mut self,
        idx: usize,
        exposed: Card,
        owner: PlayerId,
        cards: &[Card],
    ) -> Result<PlayOutcome, PlayError> {
        let player = self.seats[idx].id;
        if cards.len() != 2 {
            return Err(PlayError::InterruptOnly);
        }
        if player == owner {
            return Err(PlayError::SelfCannotFork);
        }
        if !cards[0].matches_rank(exposed)
            || !cards[1].matches_rank(exposed)
        {
            return Err(PlayError::WrongForkRank);
        }
        let remaining = self.hand_without(idx, cards)?;

        self.seats[idx].hand = remaining;
        self.discards.extend_from_slice(cards);
        self.passed.clear();
        self.interrupt = Interrupt::HookPending {
            exposed: cards[0],
            forker: player,
        };
        self.note_emptied(idx);
        self.assert_conserved()?;

        if self.holders() <= 1 {
            return Ok(PlayOutcome::Finished(self.finalize()));
        }
        Ok(PlayOutcome::Forked { exposed: cards[0] })
    }

    fn play_hook(
        &mut self,
        idx: usize,
        exposed: Card,
        forker: PlayerId,
        cards: &[Card],
    ) -> Result<PlayOutcome, PlayError> {
        let player = self.seats[idx].id;
        if cards.len() != 1 {
            return Err(PlayError::InterruptOnly);
        }
        if player == forker {
            return Err(PlayError::ForkerCannotHook);
        }
        if !cards[0].matches_rank(exposed) {
            return Err(PlayError::WrongHookRank);
        }
        let remaining = self.hand_without(idx, cards)?;

        self.seats[idx].hand = remaining;
        self.discards.extend_from_slice(cards);
        self.passed.clear();
        // The hook settles the round; whatever follows starts fresh.
        self.last_play = None;
        self.note_emptied(idx);
        self.assert_conserved()?;

        if self.holders() <= 1 {
            self.interrupt = Interrupt::Idle;
            return Ok(PlayOutcome::Finished(self.finalize()));
        }

        let hooked = cards[0];
        // Two-deck games let the fight continue: another player may fork
        // the hooked rank.
        if self.deck_count >= 2 {
            let refork = self.seats.iter().any(|s| {
                s.id != player
                    && !s.hand.is_empty()
                    && can_fork(hooked, &s.hand)
            });
            if refork {
                self.interrupt = Interrupt::ForkPending {
                    exposed: hooked,
                    owner: player,
                    after_hook: true,
                };
                self.current = Some(idx);
                return Ok(PlayOutcome::Hooked {
                    exposed: hooked,
                    refork: true,
                });
            }
        }

        // The hooker takes the lead with a clean slate.
        self.interrupt = Interrupt::Idle;
        self.current = Some(idx);
        self.ensure_actor_holds_cards();
        Ok(PlayOutcome::Hooked {
            exposed: hooked,
            refork: false,
        })
    }

    // -----------------------------------------------------------------
    // Passing
    // -----------------------------------------------------------------

    /// Applies a pass. During an interrupt window this only records an
    /// abstention (and may close the window); otherwise it advances the
    /// turn, possibly resetting the round, granting a free lead, or
    /// ending the game.
    pub fn pass(
        &mut self,
        player: PlayerId,
    ) -> Result<PassOutcome, PlayError> {
        let idx =
            self.seat_index(player).ok_or(PlayError::NotSeated)?;
        if !self.started {
            return Err(PlayError::NotStarted);
        }

        match self.interrupt {
            Interrupt::ForkPending {
                exposed,
                owner,
                after_hook,
            } => {
                return Ok(
                    self.abstain_fork(player, exposed, owner, after_hook)
                );
            }
            Interrupt::HookPending { exposed, forker } => {
                return Ok(self.abstain_hook(player, exposed, forker));
            }
            Interrupt::Idle => {}
        }

        if self.current != Some(idx) {
            return Err(PlayError::NotYourTurn);
        }
        if self.last_play.is_none() {
            return Err(PlayError::OpeningLeadCannotPass);
        }

        self.mark_passed(player);
        self.advance_turn();

        // The round winner already left the game: either it's over, or
        // once everyone else has passed the turn holder gets a free lead.
        if let Some(le) = self.last_empty {
            if self.holders() <= 1 {
                return Ok(PassOutcome::Finished(self.finalize()));
            }
            let all_passed = self.seats.iter().all(|s| {
                s.id == le
                    || s.hand.is_empty()
                    || self.passed.contains(&s.id)
            });
            if all_passed {
                self.giving_light = true;
                self.last_play = None;
                self.passed.clear();
                self.last_empty = None;
                let player = self
                    .current
                    .map_or(player, |i| self.seats[i].id);
                return Ok(PassOutcome::FreeLead { player });
            }
        }

        // Everyone else passed on the leader's combination: the turn
        // reverts to them and the round resets.
        if let Some(lp) = &self.last_play {
            let owner = lp.owner;
            let all_passed = self
                .seats
                .iter()
                .all(|s| s.id == owner || self.passed.contains(&s.id));
            if all_passed {
                if let Some(owner_idx) = self.seat_index(owner) {
                    self.current = Some(owner_idx);
                }
                self.round_reset();
            }
        }

        Ok(PassOutcome::Passed)
    }

    fn abstain_fork(
        &mut self,
        player: PlayerId,
        exposed: Card,
        owner: PlayerId,
        after_hook: bool,
    ) -> PassOutcome {
        self.mark_passed(player);
        // Everyone who could fork must explicitly decline; seats that
        // can't are counted out automatically.
        let undecided = self.seats.iter().any(|s| {
            s.id != owner
                && !s.hand.is_empty()
                && can_fork(exposed, &s.hand)
                && !self.passed.contains(&s.id)
        });
        if undecided {
            return PassOutcome::Abstained;
        }

        self.interrupt = Interrupt::Idle;
        if after_hook {
            // Nobody answered the re-fork: the hooker keeps the lead.
            self.passed.clear();
            if let Some(owner_idx) = self.seat_index(owner) {
                self.current = Some(owner_idx);
            }
            self.ensure_actor_holds_cards();
            PassOutcome::InterruptWon { leader: owner }
        } else {
            // The single resolves as a normal play.
            self.advance_turn();
            self.passed.clear();
            PassOutcome::ForkWindowClosed
        }
    }

    fn abstain_hook(
        &mut self,
        player: PlayerId,
        exposed: Card,
        forker: PlayerId,
    ) -> PassOutcome {
        self.mark_passed(player);
        let undecided = self.seats.iter().any(|s| {
            s.id != forker
                && !s.hand.is_empty()
                && can_hook(exposed, &s.hand)
                && !self.passed.contains(&s.id)
        });
        if undecided {
            return PassOutcome::Abstained;
        }

        // Nobody contested: the forker takes a free lead.
        self.interrupt = Interrupt::Idle;
        self.passed.clear();
        self.last_play = None;
        if let Some(forker_idx) = self.seat_index(forker) {
            self.current = Some(forker_idx);
        }
        self.ensure_actor_holds_cards();
        PassOutcome::InterruptWon { leader: forker }
    }

    // -----------------------------------------------------------------
    // Turn advancement
    // -----------------------------------------------------------------

    fn advance_turn(&mut self) {
        let Some(cur) = self.current else { return };
        let sizes: Vec<usize> =
            self.seats.iter().map(|s| s.hand.len()).collect();
        match next_actor(&sizes, cur) {
            NextActor::Wrapped => self.round_reset(),
            NextActor::Seat(next) => {
                // Every empty seat skipped over counts as having passed.
                let n = sizes.len();
                let mut i = (cur + 1) % n;
                while i != next {
                    if sizes[i] == 0 {
                        let id = self.seats[i].id;
                        self.mark_passed(id);
                    }
                    i = (i + 1) % n;
                }
                self.current = Some(next);
                // Landing back on the leader means the round is over:
                // they lead fresh.
                if self
                    .last_play
                    .as_ref()
                    .is_some_and(|lp| lp.owner == self.seats[next].id)
                {
                    self.round_reset();
                }
            }
        }
    }

    /// An empty-handed seat can never act; if one ends up with the turn
    /// (e.g. the winner of an interrupt emptied their hand), move on.
    fn ensure_actor_holds_cards(&mut self) {
        if let Some(idx) = self.current {
            if self.seats[idx].hand.is_empty() {
                self.advance_turn();
            }
        }
    }

    fn round_reset(&mut self) {
        self.passed.clear();
        self.last_play = None;
    }

    // -----------------------------------------------------------------
    // Termination and scoring
    // -----------------------------------------------------------------

    fn finalize(&mut self) -> GameResult {
        // Whoever never emptied joins the tail of the finished order —
        // abandoned (empty) seats first, actual holders last — so the
        // last entry is always the loser.
        let mut unfinished: Vec<PlayerId> = self
            .seats
            .iter()
            .filter(|s| !self.finished.contains(&s.id))
            .map(|s| s.id)
            .collect();
        unfinished.sort_by_key(|id| {
            self.seat_index(*id)
                .map_or(0, |i| self.seats[i].hand.len())
        });
        self.finished.extend(unfinished);

        let n = self.seats.len() as i32;
        let loser = *self
            .finished
            .last()
            .expect("a started game has at least two seats");

        let mut deltas: HashMap<PlayerId, i32> = HashMap::new();
        for (i, pid) in self.finished.iter().enumerate() {
            deltas.insert(*pid, n - 1 - i as i32);
        }
        if let Some(loser_idx) = self.seat_index(loser) {
            *deltas.entry(loser).or_insert(0) -=
                self.seats[loser_idx].hand.len() as i32;
        }

        let mut scores = Vec::with_capacity(self.seats.len());
        for seat in &mut self.seats {
            // A seat that abandoned the game collects nothing.
            let delta = if seat.departed {
                0
            } else {
                deltas.get(&seat.id).copied().unwrap_or(0)
            };
            seat.score += delta;
            scores.push(ScoreLine {
                player: seat.id,
                delta,
                total: seat.score,
            });
        }

        let winners = self
            .seats
            .iter()
            .filter(|s| s.id != loser && !s.departed)
            .map(|s| s.id)
            .collect();
        let result = GameResult {
            winners,
            loser,
            scores,
        };

        self.started = false;
        self.current = None;
        self.last_play = None;
        self.passed.clear();
        self.interrupt = Interrupt::Idle;
        self.giving_light = false;
        self.result = Some(result.clone());
        tracing::info!(loser = %loser, "game over");
        result
    }

    /// Whether the last game ended, and who won it.
    pub fn game_over(&self) -> (bool, Vec<PlayerId>) {
        match &self.result {
            Some(r) => (true, r.winners.clone()),
            None => (false, Vec::new()),
        }
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn player_count(&self) -> usize {
        self.seats.iter().filter(|s| !s.departed).count()
    }

    // -----------------------------------------------------------------
    // Snapshots
    // -----------------------------------------------------------------

    /// The table as seen by `viewer`: their own hand, everyone else's
    /// card counts. Pure — repeated calls without intervening mutation
    /// return identical views.
    pub fn snapshot(&self, viewer: PlayerId) -> TableView {
        let hand = self
            .seats
            .iter()
            .find(|s| s.id == viewer)
            .map(|s| s.hand.clone())
            .unwrap_or_default();

        let (interrupt, can_fork_now, can_hook_now) = match self.interrupt
        {
            Interrupt::Idle => (InterruptView::Idle, false, false),
            Interrupt::ForkPending { exposed, owner, .. } => (
                InterruptView::Fork { exposed },
                viewer != owner && can_fork(exposed, &hand),
                false,
            ),
            Interrupt::HookPending { exposed, forker } => (
                InterruptView::Hook { exposed, forker },
                false,
                viewer != forker && can_hook(exposed, &hand),
            ),
        };

        TableView {
            started: self.started,
            hand,
            turn: self
                .current
                .filter(|_| self.started)
                .map(|i| self.seats[i].id),
            last_play: self.last_play.as_ref().map(|lp| PlayView {
                cards: lp.cards.clone(),
                kind: lp.combo.kind(),
                owner: lp.owner,
            }),
            interrupt,
            giving_light: self.giving_light,
            can_fork: can_fork_now,
            can_hook: can_hook_now,
            players: self
                .seats
                .iter()
                .map(|s| PlayerView {
                    id: s.id,
                    name: s.name.clone(),
                    cards_left: s.hand.len(),
                    passed: self.passed.contains(&s.id),
                    score: s.score,
                })
                .collect(),
            finished: self.finished.clone(),
        }
    }

    // -----------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------

    fn seat_index(&self, id: PlayerId) -> Option<usize> {
        self.seats.iter().position(|s| s.id == id)
    }

    fn holders(&self) -> usize {
        self.seats.iter().filter(|s| !s.hand.is_empty()).count()
    }

    /// The player's hand minus `cards`, or `UnknownCards` if any are
    /// missing (duplicates require duplicate holdings).
    fn hand_without(
        &self,
        idx: usize,
        cards: &[Card],
    ) -> Result<Vec<Card>, PlayError> {
        let mut remaining = self.seats[idx].hand.clone();
        for card in cards {
            let Some(pos) = remaining.iter().position(|c| c == card)
            else {
                return Err(PlayError::UnknownCards);
            };
            remaining.remove(pos);
        }
        Ok(remaining)
    }

    fn mark_passed(&mut self, id: PlayerId) {
        if !self.passed.contains(&id) {
            self.passed.push(id);
        }
    }

    fn note_emptied(&mut self, idx: usize) {
        if self.seats[idx].hand.is_empty() {
            let id = self.seats[idx].id;
            if !self.finished.contains(&id) {
                self.finished.push(id);
                self.last_empty = Some(id);
                tracing::debug!(player = %id, "hand emptied");
            }
        }
    }

    /// No card is ever created or lost: hands plus discards always equal
    /// the dealt set. Checked after every mutation; a breach is a defect
    /// of the engine, not of any player, hence `Internal`.
    fn conserved(&self) -> bool {
        let mut counts: HashMap<Card, isize> = HashMap::new();
        for card in &self.dealt {
            *counts.entry(*card).or_default() += 1;
        }
        for card in self
            .seats
            .iter()
            .flat_map(|s| s.hand.iter())
            .chain(self.discards.iter())
        {
            *counts.entry(*card).or_default() -= 1;
        }
        counts.values().all(|c| *c == 0)
    }

    fn assert_conserved(&self) -> Result<(), PlayError> {
        if self.conserved() {
            Ok(())
        } else {
            Err(PlayError::Internal(
                "card conservation violated".into(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(n: u64) -> PlayerId {
        PlayerId(n)
    }

    fn cards(tokens: &[&str]) -> Vec<Card> {
        tokens.iter().map(|t| t.parse().unwrap()).collect()
    }

    /// A started single-deck table with hand-crafted hands; player N+1
    /// holds `hands[N]` and player 1 opens.
    fn rigged(hands: &[&[&str]]) -> Table {
        rigged_decks(1, hands)
    }

    fn rigged_decks(deck_count: u8, hands: &[&[&str]]) -> Table {
        let mut t = Table::new(deck_count, None);
        for i in 0..hands.len() {
            t.add_player(pid(i as u64 + 1)).unwrap();
        }
        t.started = true;
        t.current = Some(0);
        let mut dealt = Vec::new();
        for (i, hand) in hands.iter().enumerate() {
            t.seats[i].hand = cards(hand);
            dealt.extend(t.seats[i].hand.iter().copied());
        }
        t.dealt = dealt;
        t
    }

    // -----------------------------------------------------------------
    // Dealing
    // -----------------------------------------------------------------

    #[test]
    fn test_deal_conserves_every_card() {
        for deck_count in 1..=2u8 {
            for players in 2..=6usize {
                let mut t = Table::new(deck_count, Some(7));
                for i in 0..players {
                    t.add_player(pid(i as u64 + 1)).unwrap();
                }
                t.start().unwrap();

                assert!(t.conserved());
                let total = 54 * deck_count as usize;
                let sizes: Vec<usize> =
                    t.seats.iter().map(|s| s.hand.len()).collect();
                assert_eq!(sizes.iter().sum::<usize>(), total);
                // Remainder goes to the earliest seats: sizes are
                // non-increasing and differ by at most one.
                for w in sizes.windows(2) {
                    assert!(w[0] == w[1] || w[0] == w[1] + 1);
                }
                assert_eq!(sizes[0], total / players + usize::from(total % players > 0));
            }
        }
    }

    #[test]
    fn test_deal_is_reproducible_with_a_seed() {
        let deal = |seed| {
            let mut t = Table::new(1, Some(seed));
            t.add_player(pid(1)).unwrap();
            t.add_player(pid(2)).unwrap();
            t.start().unwrap();
            (t.snapshot(pid(1)).hand, t.snapshot(pid(2)).hand)
        };
        assert_eq!(deal(42), deal(42));
        assert_ne!(deal(42), deal(43));
    }

    #[test]
    fn test_heart_four_holder_opens() {
        let mut t = Table::new(1, Some(9));
        t.add_player(pid(1)).unwrap();
        t.add_player(pid(2)).unwrap();
        t.add_player(pid(3)).unwrap();
        t.start().unwrap();

        let opener = t.snapshot(pid(1)).turn.unwrap();
        let sentinel = Card::suited(Suit::Hearts, Rank::Four);
        let idx = t.seat_index(opener).unwrap();
        assert!(t.seats[idx].hand.contains(&sentinel));
    }

    #[test]
    fn test_start_requires_two_players() {
        let mut t = Table::new(1, None);
        t.add_player(pid(1)).unwrap();
        assert_eq!(t.start(), Err(PlayError::NotEnoughPlayers));
    }

    #[test]
    fn test_start_twice_rejected() {
        let mut t = Table::new(1, Some(1));
        t.add_player(pid(1)).unwrap();
        t.add_player(pid(2)).unwrap();
        t.start().unwrap();
        assert_eq!(t.start(), Err(PlayError::AlreadyStarted));
    }

    #[test]
    fn test_join_rejected_mid_game_and_when_full() {
        let mut t = Table::new(1, Some(1));
        for i in 1..=6 {
            t.add_player(pid(i)).unwrap();
        }
        assert_eq!(t.add_player(pid(7)), Err(PlayError::TableFull));
        t.start().unwrap();
        assert_eq!(t.add_player(pid(8)), Err(PlayError::AlreadyStarted));
    }

    // -----------------------------------------------------------------
    // Normal play
    // -----------------------------------------------------------------

    #[test]
    fn test_actions_before_start_are_rejected() {
        let mut t = Table::new(1, None);
        t.add_player(pid(1)).unwrap();
        t.add_player(pid(2)).unwrap();
        assert_eq!(
            t.play(pid(1), &cards(&["♥5"])),
            Err(PlayError::NotStarted)
        );
        assert_eq!(t.pass(pid(1)), Err(PlayError::NotStarted));
    }

    #[test]
    fn test_play_rejects_out_of_turn() {
        let mut t = rigged(&[&["♥5", "♥6"], &["♠7", "♠4"]]);
        assert_eq!(
            t.play(pid(2), &cards(&["♠7"])),
            Err(PlayError::NotYourTurn)
        );
    }

    #[test]
    fn test_play_rejects_cards_not_held_without_mutating() {
        let mut t = rigged(&[&["♥5", "♥6"], &["♠7", "♠4"]]);
        let before = t.snapshot(pid(1));
        assert_eq!(
            t.play(pid(1), &cards(&["♦K"])),
            Err(PlayError::UnknownCards)
        );
        // Holding one copy is not holding two.
        assert_eq!(
            t.play(pid(1), &cards(&["♥5", "♥5"])),
            Err(PlayError::UnknownCards)
        );
        assert_eq!(t.snapshot(pid(1)), before);
    }

    #[test]
    fn test_play_rejects_invalid_combination() {
        let mut t = rigged(&[&["♥5", "♥6"], &["♠7", "♠4"]]);
        assert_eq!(
            t.play(pid(1), &cards(&["♥5", "♥6"])),
            Err(PlayError::InvalidCombo)
        );
        assert_eq!(t.play(pid(1), &[]), Err(PlayError::InvalidCombo));
    }

    #[test]
    fn test_play_rejects_weaker_combination() {
        let mut t = rigged(&[&["♥9", "♥6"], &["♠7", "♠4"]]);
        assert_eq!(t.play(pid(1), &cards(&["♥9"])), Ok(PlayOutcome::Played));
        assert_eq!(
            t.play(pid(2), &cards(&["♠7"])),
            Err(PlayError::CannotBeat)
        );
    }

    #[test]
    fn test_two_player_game_runs_to_scoring() {
        let mut t = rigged(&[&["♥5", "♥6"], &["♠7", "♠4"]]);

        // Free lead accepted.
        assert_eq!(t.play(pid(1), &cards(&["♥5"])), Ok(PlayOutcome::Played));
        // Single beats single, 7 > 5.
        assert_eq!(t.play(pid(2), &cards(&["♠7"])), Ok(PlayOutcome::Played));
        // 6 cannot answer 7; player 1 passes, lead reverts to player 2.
        assert_eq!(t.pass(pid(1)), Ok(PassOutcome::Passed));
        let view = t.snapshot(pid(1));
        assert_eq!(view.turn, Some(pid(2)));
        assert!(view.last_play.is_none(), "round should have reset");

        // Player 2 empties on a free lead: game over.
        match t.play(pid(2), &cards(&["♠4"])).unwrap() {
            PlayOutcome::Finished(result) => {
                assert_eq!(result.winners, vec![pid(2)]);
                assert_eq!(result.loser, pid(1));
                let p1 = result.scores.iter().find(|l| l.player == pid(1)).unwrap();
                let p2 = result.scores.iter().find(|l| l.player == pid(2)).unwrap();
                assert_eq!(p2.delta, 1, "winner gains players - position");
                assert_eq!(p1.delta, -1, "loser drops remaining hand size");
            }
            other => panic!("expected Finished, got {other:?}"),
        }
        let (over, winners) = t.game_over();
        assert!(over);
        assert_eq!(winners, vec![pid(2)]);
        assert!(!t.is_started());
    }

    #[test]
    fn test_emptying_play_that_ends_game_skips_fork_window() {
        // Player 2 could fork the 9, but the game is already decided.
        let mut t = rigged(&[&["♥9"], &["♠9", "♦9", "♣K"]]);
        match t.play(pid(1), &cards(&["♥9"])).unwrap() {
            PlayOutcome::Finished(result) => {
                assert_eq!(result.winners, vec![pid(1)]);
                assert_eq!(result.loser, pid(2));
            }
            other => panic!("expected Finished, got {other:?}"),
        }
    }

    #[test]
    fn test_triple_cannot_be_answered_by_dragon() {
        let mut t = rigged(&[
            &["♥7", "♠7", "♦7", "♥3"],
            &["♥5", "♠6", "♦7", "♣8", "♥9", "♠3"],
        ]);
        assert_eq!(
            t.play(pid(1), &cards(&["♥7", "♠7", "♦7"])),
            Ok(PlayOutcome::Played)
        );
        assert_eq!(
            t.play(pid(2), &cards(&["♥5", "♠6", "♦7", "♣8", "♥9"])),
            Err(PlayError::CannotBeat)
        );
    }

    #[test]
    fn test_double_dragon_only_falls_to_equal_length() {
        let mut t = rigged(&[
            &["♥4", "♠4", "♦5", "♣5", "♥6", "♠6", "♥3"],
            &["♥5", "♠5", "♦6", "♣6", "♥7", "♠7", "♦8", "♣8", "♠3"],
        ]);
        assert_eq!(
            t.play(pid(1), &cards(&["♥4", "♠4", "♦5", "♣5", "♥6", "♠6"])),
            Ok(PlayOutcome::Played)
        );
        // A longer run is rejected regardless of rank...
        assert_eq!(
            t.play(
                pid(2),
                &cards(&["♥5", "♠5", "♦6", "♣6", "♥7", "♠7", "♦8", "♣8"])
            ),
            Err(PlayError::CannotBeat)
        );
        // ...while the same length and a higher top is accepted.
        assert_eq!(
            t.play(pid(2), &cards(&["♥5", "♠5", "♦6", "♣6", "♥7", "♠7"])),
            Ok(PlayOutcome::Played)
        );
    }

    // -----------------------------------------------------------------
    // Passing and round resets
    // -----------------------------------------------------------------

    #[test]
    fn test_opening_lead_cannot_pass() {
        let mut t = rigged(&[&["♥5", "♥6"], &["♠7", "♠4"]]);
        assert_eq!(t.pass(pid(1)), Err(PlayError::OpeningLeadCannotPass));
        assert_eq!(t.pass(pid(2)), Err(PlayError::NotYourTurn));
    }

    #[test]
    fn test_all_passing_returns_lead_to_owner() {
        let mut t = rigged(&[
            &["♥5", "♠5", "♥K"],
            &["♦8", "♣9", "♦10"],
            &["♠J", "♣Q", "♠K"],
        ]);
        assert_eq!(
            t.play(pid(1), &cards(&["♥5", "♠5"])),
            Ok(PlayOutcome::Played)
        );
        assert_eq!(t.pass(pid(2)), Ok(PassOutcome::Passed));
        assert_eq!(t.pass(pid(3)), Ok(PassOutcome::Passed));

        let view = t.snapshot(pid(1));
        assert_eq!(view.turn, Some(pid(1)), "lead reverts to the owner");
        assert!(view.last_play.is_none());
        assert!(view.players.iter().all(|p| !p.passed));
        // The fresh lead accepts anything.
        assert_eq!(t.play(pid(1), &cards(&["♥K"])), Ok(PlayOutcome::Played));
    }

    #[test]
    fn test_emptied_hands_are_skipped_and_giving_light_arms() {
        let mut t = rigged(&[
            &["♥5", "♥6"],
            &["♠9"],
            &["♣7", "♣8"],
        ]);
        assert_eq!(t.play(pid(1), &cards(&["♥5"])), Ok(PlayOutcome::Played));
        // Player 2 empties; play passes over their seat from now on.
        assert_eq!(t.play(pid(2), &cards(&["♠9"])), Ok(PlayOutcome::Played));
        assert_eq!(t.snapshot(pid(1)).turn, Some(pid(3)));

        assert_eq!(t.pass(pid(3)), Ok(PassOutcome::Passed));
        assert_eq!(t.snapshot(pid(1)).turn, Some(pid(1)));

        // Everyone else has now passed on the finished player's round:
        // the turn holder is given light.
        assert_eq!(
            t.pass(pid(1)),
            Ok(PassOutcome::FreeLead { player: pid(3) })
        );
        let view = t.snapshot(pid(3));
        assert_eq!(view.turn, Some(pid(3)));
        assert!(view.giving_light);
        assert!(view.last_play.is_none());

        // The free lead really is unconstrained: a 7 after a 9.
        assert_eq!(t.play(pid(3), &cards(&["♣7"])), Ok(PlayOutcome::Played));
        assert!(!t.snapshot(pid(3)).giving_light);
    }

    #[test]
    fn test_pass_with_one_holder_left_ends_game() {
        let mut t = rigged(&[&[], &["♠9", "♠10"], &[]]);
        t.finished = vec![pid(1), pid(3)];
        t.last_empty = Some(pid(3));
        t.current = Some(1);
        let combo_cards = cards(&["♣8"]);
        t.last_play = Some(PlayedCombo {
            combo: Combo::classify(&combo_cards).unwrap(),
            cards: combo_cards,
            owner: pid(3),
        });

        match t.pass(pid(2)).unwrap() {
            PassOutcome::Finished(result) => {
                assert_eq!(result.loser, pid(2));
                assert_eq!(result.winners, vec![pid(1), pid(3)]);
                let p2 = result.scores.iter().find(|l| l.player == pid(2)).unwrap();
                assert_eq!(p2.delta, -2);
            }
            other => panic!("expected Finished, got {other:?}"),
        }
    }

    // -----------------------------------------------------------------
    // Fork and hook
    // -----------------------------------------------------------------

    #[test]
    fn test_single_opens_fork_window() {
        let mut t = rigged(&[
            &["♥4", "♥9"],
            &["♠4", "♦4", "♠8", "♦8"],
            &["♣K"],
        ]);
        assert_eq!(
            t.play(pid(1), &cards(&["♥4"])),
            Ok(PlayOutcome::ForkWindow { exposed: "♥4".parse().unwrap() })
        );

        // Turn has not advanced; the single is in play; hints are
        // viewer-specific.
        let v1 = t.snapshot(pid(1));
        assert_eq!(v1.turn, Some(pid(1)));
        assert!(matches!(v1.interrupt, InterruptView::Fork { .. }));
        assert!(!v1.can_fork, "the owner cannot fork their own card");
        assert!(t.snapshot(pid(2)).can_fork);
        assert!(!t.snapshot(pid(3)).can_fork);
    }

    #[test]
    fn test_pair_without_fork_candidates_advances_normally() {
        let mut t = rigged(&[&["♥4", "♥9"], &["♠8", "♦8"], &["♣K"]]);
        // Nobody holds two 4s: no window, turn advances.
        assert_eq!(t.play(pid(1), &cards(&["♥4"])), Ok(PlayOutcome::Played));
        assert_eq!(t.snapshot(pid(1)).turn, Some(pid(2)));
    }

    #[test]
    fn test_fork_rules_are_enforced() {
        let mut t = rigged(&[
            &["♥4", "♦4", "♣4", "♥9"],
            &["♠4", "♠5", "♦5", "♠8"],
            &["♣K", "♣Q"],
        ]);
        assert!(matches!(
            t.play(pid(1), &cards(&["♥4"])),
            Ok(PlayOutcome::ForkWindow { .. })
        ));

        // Wrong rank, wrong size, self-fork, and normal plays are all
        // rejected while the window is open.
        assert_eq!(
            t.play(pid(2), &cards(&["♠5", "♦5"])),
            Err(PlayError::WrongForkRank)
        );
        assert_eq!(
            t.play(pid(2), &cards(&["♠4"])),
            Err(PlayError::InterruptOnly)
        );
        assert_eq!(
            t.play(pid(3), &cards(&["♣K"])),
            Err(PlayError::InterruptOnly)
        );
        assert_eq!(
            t.play(pid(1), &cards(&["♦4", "♣4"])),
            Err(PlayError::SelfCannotFork)
        );
    }

    #[test]
    fn test_fork_window_closes_when_all_decline() {
        let mut t = rigged(&[
            &["♥4", "♥9"],
            &["♠4", "♦4", "♠8"],
            &["♣K"],
        ]);
        assert!(matches!(
            t.play(pid(1), &cards(&["♥4"])),
            Ok(PlayOutcome::ForkWindow { .. })
        ));

        // Only player 2 can fork; their abstention closes the window
        // and the single resolves as a normal play.
        assert_eq!(t.pass(pid(2)), Ok(PassOutcome::ForkWindowClosed));
        let view = t.snapshot(pid(2));
        assert!(matches!(view.interrupt, InterruptView::Idle));
        assert_eq!(view.turn, Some(pid(2)));
        assert_eq!(
            view.last_play.as_ref().map(|lp| lp.kind),
            Some(ComboKind::Single),
            "the single stays in play"
        );
    }

    #[test]
    fn test_fork_then_hook_resolves_to_hooker_free_lead() {
        let mut t = rigged(&[
            &["♥4", "♥9"],
            &["♠4", "♦4", "♠8"],
            &["♣4", "♣K"],
        ]);
        assert!(matches!(
            t.play(pid(1), &cards(&["♥4"])),
            Ok(PlayOutcome::ForkWindow { .. })
        ));

        // Fork seizes the card; state moves to hook-pending.
        assert_eq!(
            t.play(pid(2), &cards(&["♠4", "♦4"])),
            Ok(PlayOutcome::Forked { exposed: "♠4".parse().unwrap() })
        );
        let view = t.snapshot(pid(3));
        assert!(matches!(view.interrupt, InterruptView::Hook { .. }));
        assert!(view.can_hook);

        // Hook rules while the window is open.
        assert_eq!(
            t.play(pid(2), &cards(&["♠8"])),
            Err(PlayError::ForkerCannotHook)
        );
        assert_eq!(
            t.play(pid(1), &cards(&["♥9"])),
            Err(PlayError::WrongHookRank)
        );

        // The hook lands; single-deck games settle immediately: the
        // hooker leads anything.
        assert_eq!(
            t.play(pid(3), &cards(&["♣4"])),
            Ok(PlayOutcome::Hooked {
                exposed: "♣4".parse().unwrap(),
                refork: false
            })
        );
        let view = t.snapshot(pid(3));
        assert!(matches!(view.interrupt, InterruptView::Idle));
        assert_eq!(view.turn, Some(pid(3)));
        assert!(view.last_play.is_none());
        assert_eq!(t.play(pid(3), &cards(&["♣K"])), Ok(PlayOutcome::Played));
    }

    #[test]
    fn test_unanswered_fork_gives_forker_the_lead() {
        let mut t = rigged(&[
            &["♥4", "♥9"],
            &["♠4", "♦4", "♠8"],
            &["♣K"],
        ]);
        t.play(pid(1), &cards(&["♥4"])).unwrap();
        t.play(pid(2), &cards(&["♠4", "♦4"])).unwrap();

        // Nobody holds a 4 to hook with: the first abstention closes
        // the window and the forker takes a free lead.
        assert_eq!(
            t.pass(pid(1)),
            Ok(PassOutcome::InterruptWon { leader: pid(2) })
        );
        let view = t.snapshot(pid(2));
        assert_eq!(view.turn, Some(pid(2)));
        assert!(view.last_play.is_none());
        assert_eq!(t.play(pid(2), &cards(&["♠8"])), Ok(PlayOutcome::Played));
    }

    #[test]
    fn test_two_deck_hook_reopens_fork_window() {
        let mut t = rigged_decks(2, &[
            &["♥4", "♥9"],
            &["♠4", "♦4", "♠8"],
            &["♣4", "♣K"],
            &["♥4", "♦4", "♠K"],
        ]);
        t.play(pid(1), &cards(&["♥4"])).unwrap();
        t.play(pid(2), &cards(&["♠4", "♦4"])).unwrap();

        // Player 4 still holds two 4s, so the hook re-opens the fight.
        assert_eq!(
            t.play(pid(3), &cards(&["♣4"])),
            Ok(PlayOutcome::Hooked {
                exposed: "♣4".parse().unwrap(),
                refork: true
            })
        );
        assert!(matches!(
            t.snapshot(pid(4)).interrupt,
            InterruptView::Fork { .. }
        ));
        assert!(t.snapshot(pid(4)).can_fork);

        // If the only candidate declines, the hooker keeps the lead.
        assert_eq!(
            t.pass(pid(4)),
            Ok(PassOutcome::InterruptWon { leader: pid(3) })
        );
        let view = t.snapshot(pid(3));
        assert_eq!(view.turn, Some(pid(3)));
        assert!(view.last_play.is_none());
    }

    #[test]
    fn test_two_deck_refork_can_be_taken() {
        let mut t = rigged_decks(2, &[
            &["♥4", "♥9"],
            &["♠4", "♦4", "♠8"],
            &["♣4", "♣K"],
            &["♥4", "♦4", "♠K"],
        ]);
        t.play(pid(1), &cards(&["♥4"])).unwrap();
        t.play(pid(2), &cards(&["♠4", "♦4"])).unwrap();
        t.play(pid(3), &cards(&["♣4"])).unwrap();

        assert_eq!(
            t.play(pid(4), &cards(&["♥4", "♦4"])),
            Ok(PlayOutcome::Forked { exposed: "♥4".parse().unwrap() })
        );
        // Nobody can hook (no 4s left anywhere): first abstention
        // settles it for the new forker.
        assert_eq!(
            t.pass(pid(1)),
            Ok(PassOutcome::InterruptWon { leader: pid(4) })
        );
        assert_eq!(t.snapshot(pid(4)).turn, Some(pid(4)));
    }

    #[test]
    fn test_single_deck_hook_never_reforks() {
        let mut t = rigged(&[
            &["♥4", "♥9"],
            &["♠4", "♦4", "♠8"],
            &["♣4", "♣K"],
            &["♥4", "♦4", "♠K"],
        ]);
        t.play(pid(1), &cards(&["♥4"])).unwrap();
        t.play(pid(2), &cards(&["♠4", "♦4"])).unwrap();

        // Even though player 4 holds two 4s, one-deck rules settle on
        // the hook.
        assert_eq!(
            t.play(pid(3), &cards(&["♣4"])),
            Ok(PlayOutcome::Hooked {
                exposed: "♣4".parse().unwrap(),
                refork: false
            })
        );
    }

    // -----------------------------------------------------------------
    // Scoring, rematch, departures
    // -----------------------------------------------------------------

    #[test]
    fn test_scoring_follows_finish_order() {
        let mut t = rigged(&[
            &["♥5"],
            &["♠6"],
            &["♦7"],
            &["♣8", "♣9", "♣10"],
        ]);
        assert_eq!(t.play(pid(1), &cards(&["♥5"])), Ok(PlayOutcome::Played));
        assert_eq!(t.play(pid(2), &cards(&["♠6"])), Ok(PlayOutcome::Played));
        match t.play(pid(3), &cards(&["♦7"])).unwrap() {
            PlayOutcome::Finished(result) => {
                assert_eq!(result.loser, pid(4));
                assert_eq!(result.winners, vec![pid(1), pid(2), pid(3)]);
                let deltas: Vec<i32> = [1, 2, 3, 4]
                    .iter()
                    .map(|n| {
                        result
                            .scores
                            .iter()
                            .find(|l| l.player == pid(*n))
                            .unwrap()
                            .delta
                    })
                    .collect();
                assert_eq!(deltas, vec![3, 2, 1, -3]);
            }
            other => panic!("expected Finished, got {other:?}"),
        }
    }

    #[test]
    fn test_rematch_keeps_scores_and_redeals() {
        let mut t = rigged(&[&["♥5"], &["♠6", "♠7"]]);
        match t.play(pid(1), &cards(&["♥5"])).unwrap() {
            PlayOutcome::Finished(_) => {}
            other => panic!("expected Finished, got {other:?}"),
        }

        t.start().unwrap();
        let view = t.snapshot(pid(1));
        assert!(view.started);
        assert_eq!(view.hand.len(), 27);
        assert!(view.finished.is_empty());
        let scores: Vec<i32> =
            view.players.iter().map(|p| p.score).collect();
        assert_eq!(scores, vec![1, -2], "scores persist across games");
    }

    #[test]
    fn test_remove_player_before_start_frees_the_seat() {
        let mut t = Table::new(1, None);
        t.add_player(pid(1)).unwrap();
        t.add_player(pid(2)).unwrap();
        assert!(t.remove_player(pid(1)).is_none());
        assert_eq!(t.player_count(), 1);
        assert_eq!(t.start(), Err(PlayError::NotEnoughPlayers));
    }

    #[test]
    fn test_deserter_loses_a_two_player_game() {
        let mut t = rigged(&[&["♥5", "♥6"], &["♠7", "♠4"]]);
        match t.remove_player(pid(2)) {
            Some(result) => {
                assert_eq!(result.loser, pid(2));
                assert_eq!(result.winners, vec![pid(1)]);
                let p2 = result.scores.iter().find(|l| l.player == pid(2)).unwrap();
                assert_eq!(p2.delta, 0, "deserters collect nothing");
            }
            None => panic!("departure should end a two-player game"),
        }
    }

    #[test]
    fn test_departure_mid_game_keeps_playing_and_purges_on_rematch() {
        let mut t = rigged(&[
            &["♥5", "♥6"],
            &["♠6", "♠7"],
            &["♣K", "♣Q"],
        ]);
        assert!(t.remove_player(pid(3)).is_none());
        // The deserted seat is skipped; the game plays out 1v1.
        assert_eq!(t.play(pid(1), &cards(&["♥5"])), Ok(PlayOutcome::Played));
        assert_eq!(t.snapshot(pid(2)).turn, Some(pid(2)));
        assert_eq!(t.play(pid(2), &cards(&["♠6"])), Ok(PlayOutcome::Played));
        assert_eq!(t.pass(pid(1)), Ok(PassOutcome::Passed));
        match t.play(pid(2), &cards(&["♠7"])).unwrap() {
            PlayOutcome::Finished(result) => {
                assert_eq!(result.loser, pid(1));
                assert_eq!(result.winners, vec![pid(2)], "deserter never wins");
            }
            other => panic!("unexpected {other:?}"),
        }

        t.start().unwrap();
        assert_eq!(t.player_count(), 2, "departed seat purged on rematch");
        assert_eq!(t.snapshot(pid(1)).hand.len(), 27);
    }

    #[test]
    fn test_removing_current_player_advances_the_turn() {
        let mut t = rigged(&[
            &["♥5", "♥6"],
            &["♠7", "♠8"],
            &["♣K", "♣Q"],
        ]);
        assert!(t.remove_player(pid(1)).is_none());
        assert_eq!(t.snapshot(pid(2)).turn, Some(pid(2)));
    }

    // -----------------------------------------------------------------
    // Snapshots and invariants
    // -----------------------------------------------------------------

    #[test]
    fn test_snapshot_is_idempotent() {
        let mut t = rigged(&[&["♥5", "♥6"], &["♠7", "♠4"]]);
        t.play(pid(1), &cards(&["♥5"])).unwrap();
        assert_eq!(t.snapshot(pid(1)), t.snapshot(pid(1)));
        assert_eq!(t.snapshot(pid(2)), t.snapshot(pid(2)));
    }

    #[test]
    fn test_snapshot_reveals_only_the_viewers_hand() {
        let t = rigged(&[&["♥5", "♥6"], &["♠7", "♠4"]]);
        let v1 = t.snapshot(pid(1));
        assert_eq!(v1.hand, cards(&["♥5", "♥6"]));
        let counts: Vec<usize> =
            v1.players.iter().map(|p| p.cards_left).collect();
        assert_eq!(counts, vec![2, 2]);
        // A non-player sees no hand at all.
        assert!(t.snapshot(pid(99)).hand.is_empty());
    }

    #[test]
    fn test_rename_propagates_and_rejects_empty() {
        let mut t = rigged(&[&["♥5"], &["♠7"]]);
        assert_eq!(t.snapshot(pid(1)).players[0].name, "player 1");
        t.rename(pid(1), "lena").unwrap();
        assert_eq!(t.snapshot(pid(2)).players[0].name, "lena");
        assert_eq!(t.rename(pid(1), "   "), Err(PlayError::EmptyName));
        assert_eq!(t.rename(pid(9), "x"), Err(PlayError::NotSeated));
    }

    #[test]
    fn test_cards_are_conserved_through_interrupts() {
        let mut t = rigged(&[
            &["♥4", "♥9"],
            &["♠4", "♦4", "♠8"],
            &["♣4", "♣K"],
        ]);
        t.play(pid(1), &cards(&["♥4"])).unwrap();
        assert!(t.conserved());
        t.play(pid(2), &cards(&["♠4", "♦4"])).unwrap();
        assert!(t.conserved());
        t.play(pid(3), &cards(&["♣4"])).unwrap();
        assert!(t.conserved());
        t.play(pid(3), &cards(&["♣K"])).unwrap();
        assert!(t.conserved());
    }

    #[test]
    fn test_next_actor_decision() {
        assert_eq!(next_actor(&[3, 0, 2], 0), NextActor::Seat(2));
        assert_eq!(next_actor(&[3, 2, 2], 0), NextActor::Seat(1));
        assert_eq!(next_actor(&[3, 0, 0], 0), NextActor::Wrapped);
        assert_eq!(next_actor(&[0, 1, 1], 1), NextActor::Seat(2));
        assert_eq!(next_actor(&[1, 1], 1), NextActor::Seat(0));
    }
}
