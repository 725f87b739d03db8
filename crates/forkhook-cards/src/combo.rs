//! Combination classification and the beat precedence table.
//!
//! A played set of cards classifies into exactly one [`ComboKind`] (or
//! nothing). Strength values are tier-offset so same-kind comparisons are
//! a plain integer compare, but cross-kind legality is decided by an
//! explicit precedence table — NOT by comparing strengths across kinds.
//! Some high-strength kinds are deliberately barred from beating certain
//! low-strength ones (a triple never beats a double-dragon; a dragon beats
//! nothing but an equal-length dragon).

use serde::{Deserialize, Serialize};

use crate::card::{Card, Rank, Suit};

/// Every combination kind a play can classify as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComboKind {
    /// One card.
    Single,
    /// Two cards of one rank.
    Pair,
    /// Three cards of one rank.
    Triple,
    /// Four cards of one rank.
    Bomb,
    /// Five cards of one rank.
    BigTriple,
    /// Six cards of one rank.
    BigBomb,
    /// Seven cards of one rank.
    HugeTriple,
    /// Eight cards of one rank.
    HugeBomb,
    /// A run of consecutive singles, length >= 3.
    Dragon,
    /// A run of consecutive pairs, >= 6 cards.
    DoubleDragon,
    /// Two jokers (identities irrelevant).
    DoubleJoker,
    /// Three jokers.
    TripleJoker,
    /// Four jokers (two-deck games only).
    FourJoker,
    /// Two 4s plus an ace — outranks every ordinary bomb.
    Rocket,
}

// Tier offsets: each kind owns a disjoint strength band.
const TRIPLE_OFFSET: u16 = 200;
const BOMB_OFFSET: u16 = 300;
const DOUBLE_JOKER_STRENGTH: u16 = 400;
const BIG_TRIPLE_OFFSET: u16 = 500;
const BIG_BOMB_OFFSET: u16 = 600;
const TRIPLE_JOKER_STRENGTH: u16 = 800;
const HUGE_TRIPLE_OFFSET: u16 = 900;
const HUGE_BOMB_OFFSET: u16 = 1100;
const FOUR_JOKER_STRENGTH: u16 = 1300;
const ROCKET_STRENGTH: u16 = 1500;

impl ComboKind {
    /// Precedence class for the cross-kind allow/deny table. A higher tier
    /// beats every lower tier unconditionally; tier 0 kinds only ever beat
    /// their own kind.
    fn tier(self) -> u8 {
        match self {
            ComboKind::Single
            | ComboKind::Pair
            | ComboKind::Dragon
            | ComboKind::DoubleDragon => 0,
            ComboKind::Triple => 1,
            ComboKind::Bomb => 2,
            ComboKind::DoubleJoker => 3,
            ComboKind::BigTriple => 4,
            ComboKind::BigBomb => 5,
            ComboKind::TripleJoker => 6,
            ComboKind::HugeTriple => 7,
            ComboKind::HugeBomb => 8,
            ComboKind::FourJoker => 9,
            ComboKind::Rocket => 10,
        }
    }
}

/// A classified combination: kind plus tier-relative strength.
///
/// Ephemeral — always derived from a set of cards, never stored on its
/// own. `size` is kept for the dragon length rule, `rocket_suit` for the
/// rocket-vs-rocket tie-break (the uniform suit of the two 4s, if any).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Combo {
    kind: ComboKind,
    strength: u16,
    size: usize,
    rocket_suit: Option<Suit>,
}

impl Combo {
    /// Classifies an unordered set of cards, or `None` if no rule matches.
    ///
    /// Total and deterministic: input order never changes the result.
    /// Rules are checked from most to least specific, so e.g. three jokers
    /// are a triple-joker before they could be mistaken for anything else.
    pub fn classify(cards: &[Card]) -> Option<Combo> {
        if cards.is_empty() {
            return None;
        }

        let n = cards.len();
        let jokers = cards.iter().filter(|c| c.is_joker()).count();
        let uniform = uniform_rank(cards);

        // Rocket: exactly two 4s and one ace.
        if n == 3 {
            let fours: Vec<Card> = cards
                .iter()
                .copied()
                .filter(|c| c.rank() == Some(Rank::Four))
                .collect();
            let aces = cards
                .iter()
                .filter(|c| c.rank() == Some(Rank::Ace))
                .count();
            if fours.len() == 2 && aces == 1 {
                let rocket_suit = match (fours[0].suit(), fours[1].suit()) {
                    (Some(a), Some(b)) if a == b => Some(a),
                    _ => None,
                };
                return Some(Combo {
                    kind: ComboKind::Rocket,
                    strength: ROCKET_STRENGTH,
                    size: n,
                    rocket_suit,
                });
            }
        }

        // Joker groups: only the count matters, never the identities.
        if jokers == n {
            let (kind, strength) = match n {
                2 => (ComboKind::DoubleJoker, DOUBLE_JOKER_STRENGTH),
                3 => (ComboKind::TripleJoker, TRIPLE_JOKER_STRENGTH),
                4 => (ComboKind::FourJoker, FOUR_JOKER_STRENGTH),
                _ => return single_or_none(cards),
            };
            return Some(Combo::plain(kind, strength, n));
        }

        // Uniform-rank groups, strongest size first.
        if let Some(rank) = uniform {
            let v = rank.value();
            let (kind, strength) = match n {
                8 => (ComboKind::HugeBomb, v + HUGE_BOMB_OFFSET),
                7 => (ComboKind::HugeTriple, v + HUGE_TRIPLE_OFFSET),
                6 => (ComboKind::BigBomb, v + BIG_BOMB_OFFSET),
                5 => (ComboKind::BigTriple, v + BIG_TRIPLE_OFFSET),
                4 => (ComboKind::Bomb, v + BOMB_OFFSET),
                3 => (ComboKind::Triple, v + TRIPLE_OFFSET),
                2 => (ComboKind::Pair, v),
                _ => return single_or_none(cards),
            };
            return Some(Combo::plain(kind, strength, n));
        }

        if n == 1 {
            return single_or_none(cards);
        }

        // Runs: jokers never participate.
        if jokers == 0 {
            let mut values: Vec<u16> =
                cards.iter().map(|c| c.value()).collect();
            values.sort_unstable();

            // Dragon: strictly consecutive singles, length >= 3.
            if n >= 3 && consecutive(&values) {
                return Some(Combo::plain(
                    ComboKind::Dragon,
                    values[values.len() - 1],
                    n,
                ));
            }

            // Double-dragon: every rank exactly twice, consecutive run.
            if n >= 6 && n % 2 == 0 {
                let mut distinct = values.clone();
                distinct.dedup();
                let all_pairs = distinct.len() * 2 == n
                    && distinct
                        .iter()
                        .all(|v| values.iter().filter(|x| *x == v).count() == 2);
                if all_pairs && consecutive(&distinct) {
                    return Some(Combo::plain(
                        ComboKind::DoubleDragon,
                        values[values.len() - 1],
                        n,
                    ));
                }
            }
        }

        None
    }

    fn plain(kind: ComboKind, strength: u16, size: usize) -> Combo {
        Combo {
            kind,
            strength,
            size,
            rocket_suit: None,
        }
    }

    pub fn kind(&self) -> ComboKind {
        self.kind
    }

    pub fn strength(&self) -> u16 {
        self.strength
    }

    /// Number of cards in the combination.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Whether this combination may legally be played on top of `last`.
    ///
    /// Cross-kind legality follows the tier table; same-kind always needs
    /// strictly greater strength, so an identical-strength combination can
    /// never be beaten by its twin. Free-lead acceptance (no combination
    /// in play) is the turn engine's business, not decided here.
    pub fn beats(&self, last: &Combo) -> bool {
        // Rocket vs rocket: decided by the suit of the paired 4s.
        // Mixed-suit 4s never beat; uniform beats mixed; uniform vs
        // uniform by the fixed suit order.
        if self.kind == ComboKind::Rocket && last.kind == ComboKind::Rocket
        {
            return match (self.rocket_suit, last.rocket_suit) {
                (None, _) => false,
                (Some(_), None) => true,
                (Some(mine), Some(theirs)) => mine > theirs,
            };
        }

        if self.kind == last.kind {
            // Dragons additionally demand an exact length match.
            if matches!(
                self.kind,
                ComboKind::Dragon | ComboKind::DoubleDragon
            ) && self.size != last.size
            {
                return false;
            }
            return self.strength > last.strength;
        }

        let (mine, theirs) = (self.kind.tier(), last.kind.tier());
        if mine > 0 || theirs > 0 {
            // A triple outranks the bottom tier, except that it may never
            // answer a double-dragon.
            if self.kind == ComboKind::Triple
                && last.kind == ComboKind::DoubleDragon
            {
                return false;
            }
            return mine > theirs;
        }

        // Bottom-tier kinds never beat across kinds: a pair can't answer
        // a single, a dragon can't answer a pair.
        false
    }
}

fn single_or_none(cards: &[Card]) -> Option<Combo> {
    if cards.len() == 1 {
        Some(Combo::plain(ComboKind::Single, cards[0].value(), 1))
    } else {
        None
    }
}

/// The shared rank if every card is an ordinary card of one rank.
fn uniform_rank(cards: &[Card]) -> Option<Rank> {
    let first = cards.first().and_then(|c| c.rank())?;
    cards
        .iter()
        .all(|c| c.rank() == Some(first))
        .then_some(first)
}

/// True when sorted values climb by exactly one at each step.
fn consecutive(sorted: &[u16]) -> bool {
    sorted.windows(2).all(|w| w[0] + 1 == w[1])
}

/// Whether a hand can fork the exposed card: at least two cards of the
/// exposed card's rank.
pub fn can_fork(exposed: Card, hand: &[Card]) -> bool {
    hand.iter().filter(|c| c.matches_rank(exposed)).count() >= 2
}

/// Whether a hand can hook the exposed card: at least one card of the
/// exposed card's rank.
pub fn can_hook(exposed: Card, hand: &[Card]) -> bool {
    hand.iter().any(|c| c.matches_rank(exposed))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cards(tokens: &[&str]) -> Vec<Card> {
        tokens.iter().map(|t| t.parse().unwrap()).collect()
    }

    fn classify(tokens: &[&str]) -> Combo {
        Combo::classify(&cards(tokens))
            .unwrap_or_else(|| panic!("{tokens:?} should classify"))
    }

    fn kind_of(tokens: &[&str]) -> ComboKind {
        classify(tokens).kind()
    }

    fn beats(a: &[&str], b: &[&str]) -> bool {
        classify(a).beats(&classify(b))
    }

    // -----------------------------------------------------------------
    // Classification
    // -----------------------------------------------------------------

    #[test]
    fn test_classify_basic_kinds() {
        assert_eq!(kind_of(&["♥7"]), ComboKind::Single);
        assert_eq!(kind_of(&["♥7", "♠7"]), ComboKind::Pair);
        assert_eq!(kind_of(&["♥7", "♠7", "♦7"]), ComboKind::Triple);
        assert_eq!(kind_of(&["♥7", "♠7", "♦7", "♣7"]), ComboKind::Bomb);
    }

    #[test]
    fn test_classify_multi_deck_stacks() {
        assert_eq!(
            kind_of(&["♥7", "♠7", "♦7", "♣7", "♥7"]),
            ComboKind::BigTriple
        );
        assert_eq!(
            kind_of(&["♥7", "♠7", "♦7", "♣7", "♥7", "♠7"]),
            ComboKind::BigBomb
        );
        assert_eq!(
            kind_of(&["♥7", "♠7", "♦7", "♣7", "♥7", "♠7", "♦7"]),
            ComboKind::HugeTriple
        );
        assert_eq!(
            kind_of(&["♥7", "♠7", "♦7", "♣7", "♥7", "♠7", "♦7", "♣7"]),
            ComboKind::HugeBomb
        );
    }

    #[test]
    fn test_classify_joker_groups_ignore_identity() {
        assert_eq!(kind_of(&["joker", "JOKER"]), ComboKind::DoubleJoker);
        assert_eq!(kind_of(&["joker", "joker"]), ComboKind::DoubleJoker);
        assert_eq!(
            kind_of(&["joker", "JOKER", "JOKER"]),
            ComboKind::TripleJoker
        );
        assert_eq!(
            kind_of(&["joker", "joker", "JOKER", "JOKER"]),
            ComboKind::FourJoker
        );
    }

    #[test]
    fn test_classify_single_joker() {
        let minor = classify(&["joker"]);
        let major = classify(&["JOKER"]);
        assert_eq!(minor.kind(), ComboKind::Single);
        assert!(major.strength() > minor.strength());
    }

    #[test]
    fn test_classify_rocket() {
        assert_eq!(kind_of(&["♥4", "♠4", "♦A"]), ComboKind::Rocket);
        // Order never matters.
        assert_eq!(kind_of(&["♦A", "♥4", "♠4"]), ComboKind::Rocket);
        // Rocket wins over any other reading of three cards.
        assert_eq!(classify(&["♥4", "♠4", "♦A"]).strength(), 1500);
    }

    #[test]
    fn test_classify_dragon() {
        assert_eq!(kind_of(&["♥4", "♠5", "♦6"]), ComboKind::Dragon);
        assert_eq!(
            kind_of(&["♥9", "♠10", "♦J", "♣Q", "♥K"]),
            ComboKind::Dragon
        );
        // The run may cross the face cards into 2 and 3.
        assert_eq!(kind_of(&["♥A", "♠2", "♦3"]), ComboKind::Dragon);
        // Strength is the top of the run.
        assert_eq!(classify(&["♥4", "♠5", "♦6"]).strength(), 5);
    }

    #[test]
    fn test_classify_double_dragon() {
        assert_eq!(
            kind_of(&["♥4", "♠4", "♦5", "♣5", "♥6", "♠6"]),
            ComboKind::DoubleDragon
        );
        assert_eq!(
            classify(&["♥4", "♠4", "♦5", "♣5", "♥6", "♠6"]).strength(),
            5
        );
    }

    #[test]
    fn test_classify_rejects_nonsense() {
        for bad in [
            vec!["♥4", "♠6"],                       // gap pair
            vec!["♥4", "♠5"],                       // two-card "run"
            vec!["♥4", "♠4", "♦5"],                 // pair plus stray
            vec!["♥4", "♠5", "♦7"],                 // gapped run
            vec!["♥4", "♠5", "joker"],              // joker in a run
            vec!["♥4", "♠4", "♦5", "♣5"],           // four-card pair run
            vec!["♥4", "♠4", "♦5", "♣5", "♥7", "♠7"], // gapped pair run
            vec!["♥4", "♠4", "♦4", "♣5", "♥5", "♠5"], // triples, not pairs
        ] {
            let cs = cards(&bad);
            assert!(Combo::classify(&cs).is_none(), "{bad:?}");
        }
        assert!(Combo::classify(&[]).is_none());
    }

    #[test]
    fn test_classification_is_order_independent() {
        let a = classify(&["♥4", "♠4", "♦5", "♣5", "♥6", "♠6"]);
        let b = classify(&["♠6", "♦5", "♥4", "♣5", "♠4", "♥6"]);
        assert_eq!(a, b);
    }

    // -----------------------------------------------------------------
    // Beat resolution: same kind
    // -----------------------------------------------------------------

    #[test]
    fn test_same_kind_needs_strictly_greater_strength() {
        assert!(beats(&["♥6"], &["♥5"]));
        assert!(!beats(&["♥5"], &["♥6"]));
        assert!(beats(&["♥8", "♠8"], &["♥6", "♠6"]));
        assert!(beats(
            &["♥8", "♠8", "♦8", "♣8"],
            &["♥6", "♠6", "♦6", "♣6"]
        ));
    }

    #[test]
    fn test_same_kind_equal_strength_never_beats() {
        // Two-deck games can produce identical combinations; neither
        // beats the other.
        assert!(!beats(&["♥6"], &["♦6"]));
        assert!(!beats(&["♥6", "♠6"], &["♦6", "♣6"]));
        assert!(!beats(&["joker", "JOKER"], &["joker", "joker"]));
        assert!(!beats(
            &["joker", "JOKER", "JOKER"],
            &["joker", "joker", "JOKER"]
        ));
    }

    #[test]
    fn test_beat_is_irreflexive() {
        for combo in [
            vec!["♥9"],
            vec!["♥9", "♠9"],
            vec!["♥9", "♠9", "♦9"],
            vec!["♥9", "♠9", "♦9", "♣9"],
            vec!["♥4", "♠5", "♦6"],
            vec!["joker", "JOKER"],
        ] {
            let c = classify(&combo);
            assert!(!c.beats(&c), "{combo:?} must not beat itself");
        }
    }

    // -----------------------------------------------------------------
    // Beat resolution: the tier ladder
    // -----------------------------------------------------------------

    #[test]
    fn test_tier_ladder_descends() {
        let ladder: Vec<Vec<&str>> = vec![
            vec!["♥4", "♠4", "♦A"],                                   // rocket
            vec!["joker", "joker", "JOKER", "JOKER"],                 // four-joker
            vec!["♥5", "♠5", "♦5", "♣5", "♥5", "♠5", "♦5", "♣5"],     // huge-bomb
            vec!["♥5", "♠5", "♦5", "♣5", "♥5", "♠5", "♦5"],           // huge-triple
            vec!["joker", "joker", "JOKER"],                          // triple-joker
            vec!["♥5", "♠5", "♦5", "♣5", "♥5", "♠5"],                 // big-bomb
            vec!["♥5", "♠5", "♦5", "♣5", "♥5"],                       // big-triple
            vec!["joker", "JOKER"],                                   // double-joker
            vec!["♥5", "♠5", "♦5", "♣5"],                             // bomb
            vec!["♥5", "♠5", "♦5"],                                   // triple
        ];
        for (i, high) in ladder.iter().enumerate() {
            for low in ladder.iter().skip(i + 1) {
                assert!(
                    beats(high, low),
                    "{high:?} should beat {low:?}"
                );
                assert!(
                    !beats(low, high),
                    "{low:?} should not beat {high:?}"
                );
            }
        }
    }

    #[test]
    fn test_ladder_kinds_beat_bottom_kinds() {
        let triple = vec!["♥5", "♠5", "♦5"];
        assert!(beats(&triple, &["♥K"]));
        assert!(beats(&triple, &["♥K", "♠K"]));
        assert!(beats(&triple, &["♥J", "♠Q", "♦K"])); // dragon
        let bomb = vec!["♥5", "♠5", "♦5", "♣5"];
        assert!(beats(
            &bomb,
            &["♥J", "♠J", "♦Q", "♣Q", "♥K", "♠K"] // double-dragon
        ));
    }

    #[test]
    fn test_triple_never_beats_double_dragon() {
        let triple = vec!["♥3", "♠3", "♦3"]; // strongest possible triple
        let dd = vec!["♥4", "♠4", "♦5", "♣5", "♥6", "♠6"];
        assert!(!beats(&triple, &dd));
        // ...while a plain bomb still does.
        assert!(beats(&["♥4", "♠4", "♦4", "♣4"], &dd));
        // The double-dragon can't answer a triple either.
        assert!(!beats(&dd, &triple));
    }

    #[test]
    fn test_bottom_kinds_only_beat_their_own_kind() {
        assert!(!beats(&["♥9", "♠9"], &["♥5"])); // pair vs single
        assert!(!beats(&["♥9"], &["♥5", "♠5"])); // single vs pair
        assert!(!beats(&["♥4", "♠5", "♦6"], &["♥3"])); // dragon vs single
        assert!(!beats(&["♥4", "♠5", "♦6"], &["♥3", "♠3"])); // dragon vs pair
        assert!(!beats(
            &["♥4", "♠4", "♦5", "♣5", "♥6", "♠6"],
            &["♥K", "♠K"]
        )); // double-dragon vs pair
    }

    #[test]
    fn test_dragons_require_exact_length_match() {
        let five_long = vec!["♥5", "♠6", "♦7", "♣8", "♥9"];
        let five_higher = vec!["♥6", "♠7", "♦8", "♣9", "♥10"];
        let seven_long = vec!["♥5", "♠6", "♦7", "♣8", "♥9", "♠10", "♦J"];
        assert!(beats(&five_higher, &five_long));
        assert!(!beats(&seven_long, &five_long));
        assert!(!beats(&five_higher, &seven_long));

        let dd6 = vec!["♥4", "♠4", "♦5", "♣5", "♥6", "♠6"];
        let dd6_higher = vec!["♥5", "♠5", "♦6", "♣6", "♥7", "♠7"];
        let dd8 = vec![
            "♥5", "♠5", "♦6", "♣6", "♥7", "♠7", "♦8", "♣8",
        ];
        assert!(beats(&dd6_higher, &dd6));
        assert!(!beats(&dd8, &dd6), "length-8 attempt must lose");
        assert!(!beats(&dd6, &dd6_higher));
    }

    // -----------------------------------------------------------------
    // Rocket tie-break
    // -----------------------------------------------------------------

    #[test]
    fn test_rocket_beats_everything_else() {
        let rocket = vec!["♥4", "♠4", "♦A"];
        assert!(beats(&rocket, &["♥3"]));
        assert!(beats(&rocket, &["♥5", "♠5", "♦5", "♣5"]));
        assert!(beats(&rocket, &["joker", "joker", "JOKER", "JOKER"]));
        assert!(!beats(
            &["joker", "joker", "JOKER", "JOKER"],
            &rocket
        ));
    }

    #[test]
    fn test_rocket_vs_rocket_suit_tiebreak() {
        let clubs = vec!["♣4", "♣4", "♦A"];
        let spades = vec!["♠4", "♠4", "♦A"];
        let hearts = vec!["♥4", "♥4", "♦A"];
        let mixed = vec!["♥4", "♠4", "♦A"];

        // clubs < spades < diamonds < hearts
        assert!(beats(&spades, &clubs));
        assert!(beats(&hearts, &spades));
        assert!(!beats(&clubs, &spades));
        assert!(!beats(&hearts, &hearts.clone()));

        // Mixed-suit 4s never beat another rocket; uniform beats mixed.
        assert!(!beats(&mixed, &clubs));
        assert!(beats(&clubs, &mixed));
        assert!(!beats(&mixed, &mixed.clone()));
    }

    // -----------------------------------------------------------------
    // Fork / hook eligibility
    // -----------------------------------------------------------------

    #[test]
    fn test_can_fork_needs_two_of_rank() {
        let exposed: Card = "♥4".parse().unwrap();
        assert!(can_fork(exposed, &cards(&["♠4", "♦4", "♥K"])));
        assert!(!can_fork(exposed, &cards(&["♠4", "♥K"])));
        assert!(!can_fork(exposed, &cards(&[])));
    }

    #[test]
    fn test_can_hook_needs_one_of_rank() {
        let exposed: Card = "♥4".parse().unwrap();
        assert!(can_hook(exposed, &cards(&["♠4", "♥K"])));
        assert!(!can_hook(exposed, &cards(&["♥K", "♠Q"])));
    }
}
