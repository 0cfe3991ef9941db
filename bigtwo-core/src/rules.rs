//! The Big-Two rules engine: play shapes, five-card classification, and
//! legality of a candidate play against the current table.

use crate::cards::{Card, OPENING_CARD};
use crate::GameError;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// The classes a five-card play can fall into, weakest first. `Invalid`
/// means the five cards make no playable combination at all. The variant
/// order IS the strength order; comparisons rely on it.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, derive_more::Display, Serialize, Deserialize,
)]
pub enum FiveCardClass {
    Invalid,
    Straight,
    Flush,
    FullHouse,
    Quadra,
    StraightFlush,
}

/// A candidate move: 1, 2, 3, or 5 distinct cards. Construction is the only
/// place sizes and duplicates are checked, so the rest of the engine can
/// assume a well-formed shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Card>", into = "Vec<Card>")]
pub struct Play(Vec<Card>);

impl Play {
    pub fn new(cards: Vec<Card>) -> Result<Self, GameError> {
        match cards.len() {
            0 => return Err(GameError::EmptyPlay),
            1 | 2 | 3 | 5 => {}
            4 => return Err(GameError::UnplayableSize),
            _ => return Err(GameError::OversizedPlay),
        }
        if cards.iter().unique().count() != cards.len() {
            return Err(GameError::DuplicateCard);
        }
        Ok(Self(cards))
    }

    pub fn cards(&self) -> &[Card] {
        &self.0
    }

    pub fn size(&self) -> usize {
        self.0.len()
    }
}

impl TryFrom<Vec<Card>> for Play {
    type Error = GameError;

    fn try_from(cards: Vec<Card>) -> Result<Self, Self::Error> {
        Play::new(cards)
    }
}

impl From<Play> for Vec<Card> {
    fn from(p: Play) -> Self {
        p.0
    }
}

/// A classified five-card play: its class plus the deciding sub-group used
/// to break ties against another play of the same class. For a full house
/// that is the triple, for a quadra the quad; kickers are discarded. For
/// straights and flushes the whole (sorted) hand decides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
    pub class: FiveCardClass,
    deciding: Vec<Card>,
}

impl Classified {
    pub fn deciding_group(&self) -> &[Card] {
        &self.deciding
    }
}

/// Classify five cards. Deterministic and insensitive to input order. A
/// hand that is both a straight and a flush always comes back as
/// `StraightFlush`; neither plain class can shadow it.
pub fn classify(cards: &[Card]) -> Classified {
    if cards.len() != 5 {
        return Classified {
            class: FiveCardClass::Invalid,
            deciding: Vec::new(),
        };
    }
    let sorted: Vec<Card> = cards.iter().copied().sorted_unstable().collect();
    let straight = is_straight(&sorted);
    let flush = is_flush(&sorted);
    if straight || flush {
        let class = match (straight, flush) {
            (true, true) => FiveCardClass::StraightFlush,
            (true, false) => FiveCardClass::Straight,
            (false, true) => FiveCardClass::Flush,
            (false, false) => unreachable!(),
        };
        return Classified {
            class,
            deciding: sorted,
        };
    }
    // Split the sorted hand into the run of the lowest rank and the run of
    // the highest rank. If the two runs are disjoint and cover all five
    // cards, their sizes decide between full house ({3,2}) and quadra
    // ({4,1}).
    let (left, right) = split_by_rank(&sorted);
    if sorted[0].rank != sorted[4].rank && left.len() + right.len() == 5 {
        match (left.len(), right.len()) {
            (3, 2) => {
                return Classified {
                    class: FiveCardClass::FullHouse,
                    deciding: left,
                }
            }
            (2, 3) => {
                return Classified {
                    class: FiveCardClass::FullHouse,
                    deciding: right,
                }
            }
            (4, 1) => {
                return Classified {
                    class: FiveCardClass::Quadra,
                    deciding: left,
                }
            }
            (1, 4) => {
                return Classified {
                    class: FiveCardClass::Quadra,
                    deciding: right,
                }
            }
            _ => {}
        }
    }
    Classified {
        class: FiveCardClass::Invalid,
        deciding: Vec::new(),
    }
}

/// The run of cards sharing the lowest rank and the run sharing the highest
/// rank of a sorted hand.
fn split_by_rank(sorted: &[Card]) -> (Vec<Card>, Vec<Card>) {
    let lo = sorted[0].rank;
    let hi = sorted[sorted.len() - 1].rank;
    let left = sorted.iter().copied().filter(|c| c.rank == lo).collect();
    let right = sorted.iter().copied().filter(|c| c.rank == hi).collect();
    (left, right)
}

/// Consecutive rank ordinals with no duplicates. Two sits above Ace, never
/// below Three, so there is no wraparound to consider.
fn is_straight(sorted: &[Card]) -> bool {
    sorted
        .windows(2)
        .all(|w| w[1].rank.value() == w[0].rank.value() + 1)
}

fn is_flush(sorted: &[Card]) -> bool {
    sorted.iter().map(|c| c.suit).all_equal()
}

fn same_rank(cards: &[Card]) -> bool {
    cards.iter().map(|c| c.rank).all_equal()
}

/// Whether the candidate's highest card strictly outranks the table's
/// highest card. Rank decides; suit breaks rank ties; a dead tie loses.
fn outranks(candidate: &[Card], table: &[Card]) -> bool {
    match (candidate.iter().max(), table.iter().max()) {
        (Some(c), Some(t)) => c > t,
        _ => false,
    }
}

/// The table state a candidate play is judged against. `is_free_turn` is
/// resolved by the room (`last_drop_by == turn_of`); the validator only
/// consumes it.
#[derive(Debug, Clone, Copy)]
pub struct TableContext<'a> {
    pub last_dropped: &'a [Card],
    pub is_free_turn: bool,
}

/// Decide whether `candidate` may be dropped on this table. Pure: no side
/// effects, no hidden state, so the same check can run as a client
/// pre-check and as the server's authoritative check.
///
/// The opening-hand constraint (first play of a fresh table must include
/// the three of clubs) is the room policy's business, not this function's;
/// see [`contains_opening_card`].
pub fn is_legal(table: &TableContext<'_>, candidate: &Play) -> bool {
    let cards = candidate.cards();
    if !table.is_free_turn && cards.len() != table.last_dropped.len() {
        return false;
    }
    match cards.len() {
        1 => table.is_free_turn || outranks(cards, table.last_dropped),
        2 | 3 => {
            if !same_rank(cards) {
                return false;
            }
            table.is_free_turn || outranks(cards, table.last_dropped)
        }
        5 => {
            let picked = classify(cards);
            if picked.class == FiveCardClass::Invalid {
                return false;
            }
            if table.is_free_turn {
                return true;
            }
            let dropped = classify(table.last_dropped);
            match picked.class.cmp(&dropped.class) {
                Ordering::Less => false,
                Ordering::Greater => true,
                Ordering::Equal => outranks(picked.deciding_group(), dropped.deciding_group()),
            }
        }
        // Play::new makes other sizes unrepresentable
        _ => false,
    }
}

/// Whether the play carries the three of clubs. The room policy demands
/// this of the very first play on a fresh table.
pub fn contains_opening_card(play: &Play) -> bool {
    play.cards().contains(&OPENING_CARD)
}
