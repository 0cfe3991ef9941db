use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub const CLUB: char = 'c';
pub const SPADE: char = 's';
pub const HEART: char = 'h';
pub const DIAMOND: char = 'd';

pub const ALL_SUITS: [Suit; 4] = [Suit::Club, Suit::Spade, Suit::Heart, Suit::Diamond];
pub const ALL_RANKS: [Rank; 13] = [
    Rank::Three,
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
];

/// The lowest card in the deck. A fresh table's first play must include it.
pub const OPENING_CARD: Card = Card::new(Suit::Club, Rank::Three);

/// Big-Two rank order. Three is the weakest rank and Two the strongest,
/// one above Ace. The variant order here IS the game order; everything
/// that compares ranks relies on it.
#[derive(
    Hash, Clone, Copy, Debug, PartialEq, PartialOrd, Eq, Ord, Serialize, Deserialize,
)]
pub enum Rank {
    Three,
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
}

impl Rank {
    /// Ordinal position in the game order, 0 (Three) through 12 (Two).
    pub fn value(&self) -> u8 {
        use Rank::*;
        match *self {
            Three => 0,
            Four => 1,
            Five => 2,
            Six => 3,
            Seven => 4,
            Eight => 5,
            Nine => 6,
            Ten => 7,
            Jack => 8,
            Queen => 9,
            King => 10,
            Ace => 11,
            Two => 12,
        }
    }
}

impl std::fmt::Display for Rank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Three => write!(f, "3"),
            Self::Four => write!(f, "4"),
            Self::Five => write!(f, "5"),
            Self::Six => write!(f, "6"),
            Self::Seven => write!(f, "7"),
            Self::Eight => write!(f, "8"),
            Self::Nine => write!(f, "9"),
            Self::Ten => write!(f, "T"),
            Self::Jack => write!(f, "J"),
            Self::Queen => write!(f, "Q"),
            Self::King => write!(f, "K"),
            Self::Ace => write!(f, "A"),
            Self::Two => write!(f, "2"),
        }
    }
}

impl TryFrom<char> for Rank {
    type Error = String;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        match c {
            '3' => Ok(Rank::Three),
            '4' => Ok(Rank::Four),
            '5' => Ok(Rank::Five),
            '6' => Ok(Rank::Six),
            '7' => Ok(Rank::Seven),
            '8' => Ok(Rank::Eight),
            '9' => Ok(Rank::Nine),
            'T' => Ok(Rank::Ten),
            'J' => Ok(Rank::Jack),
            'Q' => Ok(Rank::Queen),
            'K' => Ok(Rank::King),
            'A' => Ok(Rank::Ace),
            '2' => Ok(Rank::Two),
            _ => Err(format!("Bad rank char {c:?}")),
        }
    }
}

/// Suits only break ties between cards of equal rank. Clubs is the weakest
/// suit and Diamonds the strongest; the variant order IS the game order.
#[derive(
    Hash, Clone, Copy, Debug, PartialEq, PartialOrd, Eq, Ord, Serialize, Deserialize,
)]
pub enum Suit {
    Club,
    Spade,
    Heart,
    Diamond,
}

impl std::fmt::Display for Suit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Club => write!(f, "{}", CLUB),
            Self::Spade => write!(f, "{}", SPADE),
            Self::Heart => write!(f, "{}", HEART),
            Self::Diamond => write!(f, "{}", DIAMOND),
        }
    }
}

impl TryFrom<char> for Suit {
    type Error = String;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        match c {
            CLUB => Ok(Self::Club),
            SPADE => Ok(Self::Spade),
            HEART => Ok(Self::Heart),
            DIAMOND => Ok(Self::Diamond),
            _ => Err(format!("Bad suit char {c:?}")),
        }
    }
}

#[derive(Hash, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
}

impl std::fmt::Display for Card {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.rank, self.suit)
    }
}

impl FromStr for Card {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut i = s.chars();
        let r = i.next().ok_or(String::from("Failed to parse card"))?;
        let u = i.next().ok_or(String::from("Failed to parse card"))?;
        if i.next().is_some() {
            return Err(String::from("Trailing input after card"));
        }
        Ok(Card {
            rank: r.try_into()?,
            suit: u.try_into()?,
        })
    }
}

/// Rank decides order; suit breaks ties between equal ranks.
impl std::cmp::PartialOrd for Card {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Rank decides order; suit breaks ties between equal ranks.
impl std::cmp::Ord for Card {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.rank.cmp(&other.rank).then(self.suit.cmp(&other.suit))
    }
}

impl Card {
    pub const fn new(suit: Suit, rank: Rank) -> Self {
        Card { rank, suit }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// The sort order of ranks is used as game logic, so this test exists to
    /// highlight when it breaks: Three weakest, Two strongest, above Ace.
    #[test]
    fn rank_order() {
        for (i, r) in ALL_RANKS.into_iter().enumerate() {
            assert_eq!(r.value(), i as u8);
        }
        assert!(Rank::Two > Rank::Ace);
        assert!(Rank::Three < Rank::Four);
    }

    #[test]
    fn suit_order() {
        assert!(Suit::Club < Suit::Spade);
        assert!(Suit::Spade < Suit::Heart);
        assert!(Suit::Heart < Suit::Diamond);
    }

    #[test]
    fn card_order_breaks_ties_by_suit() {
        let c1: Card = "7c".parse().unwrap();
        let c2: Card = "7d".parse().unwrap();
        let c3: Card = "8c".parse().unwrap();
        assert!(c1 < c2);
        assert!(c2 < c3);
        assert_eq!(c1, "7c".parse().unwrap());
    }

    #[test]
    fn string_single() {
        let c: Card = "Th".parse().unwrap();
        assert_eq!(c.rank, Rank::Ten);
        assert_eq!(c.suit, Suit::Heart);
        assert_eq!(c.to_string(), "Th");
    }

    #[test]
    fn bad_strings() {
        assert!("".parse::<Card>().is_err());
        assert!("T".parse::<Card>().is_err());
        assert!("1h".parse::<Card>().is_err());
        assert!("Tx".parse::<Card>().is_err());
        assert!("Thh".parse::<Card>().is_err());
    }

    #[test]
    fn opening_card_is_lowest() {
        for s in ALL_SUITS {
            for r in ALL_RANKS {
                let c = Card::new(s, r);
                assert!(c >= OPENING_CARD);
            }
        }
    }
}
