//! The card model: suits, ranks, jokers, and the strength order.
//!
//! Strength is a fixed total order, lowest to highest:
//! 4 5 6 7 8 9 10 J Q K A 2 3, then the minor joker, then the major joker.
//! Suit never affects strength — with one exception, the rocket-vs-rocket
//! tie-break, which ranks suits clubs < spades < diamonds < hearts.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// The four suits, declared in tie-break order (lowest first).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
pub enum Suit {
    Clubs,
    Spades,
    Diamonds,
    Hearts,
}

impl Suit {
    /// All four suits in tie-break order.
    pub const ALL: [Suit; 4] = [
        Suit::Clubs,
        Suit::Spades,
        Suit::Diamonds,
        Suit::Hearts,
    ];

    fn symbol(self) -> char {
        match self {
            Suit::Clubs => '♣',
            Suit::Spades => '♠',
            Suit::Diamonds => '♦',
            Suit::Hearts => '♥',
        }
    }

    fn from_symbol(c: char) -> Option<Self> {
        match c {
            '♣' => Some(Suit::Clubs),
            '♠' => Some(Suit::Spades),
            '♦' => Some(Suit::Diamonds),
            '♥' => Some(Suit::Hearts),
            _ => None,
        }
    }
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// The thirteen ordinary ranks, declared in strength order (lowest first).
///
/// 4 is the weakest card and 3 the strongest ordinary one; 2 and 3 outrank
/// the ace.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
pub enum Rank {
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
    Ace,
    Two,
    Three,
}

impl Rank {
    /// All ranks in strength order.
    pub const ALL: [Rank; 13] = [
        Rank::Four,
        Rank::Five,
        Rank::Six,
        Rank::Seven,
        Rank::Eight,
        Rank::Nine,
        Rank::Ten,
        Rank::Jack,
        Rank::Queen,
        Rank::King,
        Rank::Ace,
        Rank::Two,
        Rank::Three,
    ];

    /// Numeric strength value: 3 for the 4 up through 15 for the 3.
    /// Joker values (16, 17) sit directly above.
    pub fn value(self) -> u16 {
        self as u16 + 3
    }

    fn token(self) -> &'static str {
        match self {
            Rank::Four => "4",
            Rank::Five => "5",
            Rank::Six => "6",
            Rank::Seven => "7",
            Rank::Eight => "8",
            Rank::Nine => "9",
            Rank::Ten => "10",
            Rank::Jack => "J",
            Rank::Queen => "Q",
            Rank::King => "K",
            Rank::Ace => "A",
            Rank::Two => "2",
            Rank::Three => "3",
        }
    }

    fn from_token(s: &str) -> Option<Self> {
        Rank::ALL.into_iter().find(|r| r.token() == s)
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// The two joker identities. The minor joker sits above every ordinary
/// rank, the major joker above the minor.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
pub enum Joker {
    Minor,
    Major,
}

/// A single card: an ordinary suit+rank card, or one of the two jokers.
/// Immutable once constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Card {
    Suited { suit: Suit, rank: Rank },
    Joker(Joker),
}

impl Card {
    /// Constructs an ordinary card.
    pub fn suited(suit: Suit, rank: Rank) -> Self {
        Card::Suited { suit, rank }
    }

    /// Numeric strength value (3..=17, jokers highest).
    pub fn value(self) -> u16 {
        match self {
            Card::Suited { rank, .. } => rank.value(),
            Card::Joker(Joker::Minor) => 16,
            Card::Joker(Joker::Major) => 17,
        }
    }

    /// The card's rank, if it has one (jokers don't).
    pub fn rank(self) -> Option<Rank> {
        match self {
            Card::Suited { rank, .. } => Some(rank),
            Card::Joker(_) => None,
        }
    }

    /// The card's suit, if it has one (jokers don't).
    pub fn suit(self) -> Option<Suit> {
        match self {
            Card::Suited { suit, .. } => Some(suit),
            Card::Joker(_) => None,
        }
    }

    pub fn is_joker(self) -> bool {
        matches!(self, Card::Joker(_))
    }

    /// Two cards "match" for fork/hook purposes when they share a strength
    /// value — i.e. the same rank, or the same joker identity.
    pub fn matches_rank(self, other: Card) -> bool {
        self.value() == other.value()
    }
}

/// Cards order by strength; within equal strength, by suit (tie-break
/// order) so sorting a hand is deterministic.
impl Ord for Card {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.value(), self.suit()).cmp(&(other.value(), other.suit()))
    }
}

impl PartialOrd for Card {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Card::Suited { suit, rank } => write!(f, "{suit}{rank}"),
            Card::Joker(Joker::Minor) => f.write_str("joker"),
            Card::Joker(Joker::Major) => f.write_str("JOKER"),
        }
    }
}

/// Failure to parse a player-supplied card token.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown card: {0:?}")]
pub struct ParseCardError(pub String);

impl FromStr for Card {
    type Err = ParseCardError;

    /// Parses the canonical display form: a suit symbol followed by a rank
    /// token (`♥4`, `♠10`), or `joker` / `JOKER` for the jokers.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "joker" => return Ok(Card::Joker(Joker::Minor)),
            "JOKER" => return Ok(Card::Joker(Joker::Major)),
            _ => {}
        }
        let mut chars = s.chars();
        let suit = chars
            .next()
            .and_then(Suit::from_symbol)
            .ok_or_else(|| ParseCardError(s.to_string()))?;
        let rank = Rank::from_token(chars.as_str())
            .ok_or_else(|| ParseCardError(s.to_string()))?;
        Ok(Card::Suited { suit, rank })
    }
}

// Cards travel on the wire as their display string ("♥4"), which is what
// the client renders and sends back.
impl Serialize for Card {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Card {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
