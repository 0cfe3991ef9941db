pub mod card;

pub use card::{Card, Rank, Suit, OPENING_CARD};
