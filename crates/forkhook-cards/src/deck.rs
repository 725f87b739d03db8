//! Deck construction and hand presentation helpers.

use crate::card::{Card, Joker, Rank, Suit};

/// Cards in one physical deck: 13 ranks x 4 suits plus the two jokers.
pub const DECK_SIZE: usize = 54;

/// Builds the full (unshuffled) dealing set for `deck_count` physical
/// decks. The game is played with one deck (54 cards) or two (108 cards,
/// four jokers in play).
pub fn full_deck(deck_count: u8) -> Vec<Card> {
    let mut cards =
        Vec::with_capacity(DECK_SIZE * deck_count as usize);
    for _ in 0..deck_count {
        for suit in Suit::ALL {
            for rank in Rank::ALL {
                cards.push(Card::suited(suit, rank));
            }
        }
        cards.push(Card::Joker(Joker::Major));
        cards.push(Card::Joker(Joker::Minor));
    }
    cards
}

/// Sorts cards ascending by strength (suit as a deterministic tie-break).
pub fn sort_by_strength(cards: &mut [Card]) {
    cards.sort_unstable();
}

/// Removes the first occurrence of `card` from `hand`. Returns `false`
/// if the hand doesn't hold it.
pub fn remove_first(hand: &mut Vec<Card>, card: Card) -> bool {
    match hand.iter().position(|c| *c == card) {
        Some(i) => {
            hand.remove(i);
            true
        }
        None => false,
    }
}

/// Sorts a hand and relocates any rocket-eligible groups (two 4s plus an
/// ace) so they sit together right after the hand's jokers, or at the end
/// if there are none.
///
/// Pure presentation: the player sees their rockets pre-assembled, but
/// nothing about legality changes.
pub fn arrange_hand(hand: &mut Vec<Card>) {
    sort_by_strength(hand);

    let mut fours: Vec<Card> = hand
        .iter()
        .copied()
        .filter(|c| c.rank() == Some(Rank::Four))
        .collect();
    let mut aces: Vec<Card> = hand
        .iter()
        .copied()
        .filter(|c| c.rank() == Some(Rank::Ace))
        .collect();

    // Assemble as many rockets as the hand supports.
    let mut rockets: Vec<[Card; 3]> = Vec::new();
    while fours.len() >= 2 && !aces.is_empty() {
        rockets.push([fours[0], fours[1], aces[0]]);
        fours.drain(..2);
        aces.remove(0);
    }
    if rockets.is_empty() {
        return;
    }

    for group in &rockets {
        for card in group {
            remove_first(hand, *card);
        }
    }

    let mut pos = hand
        .iter()
        .rposition(|c| c.is_joker())
        .map_or(hand.len(), |i| i + 1);
    for group in rockets {
        for card in group {
            hand.insert(pos, card);
            pos += 1;
        }
    }
}
