pub mod cards;
pub mod room;
pub mod rules;

pub use cards::{Card, Rank, Suit};
pub use rules::Play;

pub type SeatIdx = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum GameError {
    EmptyPlay,
    UnplayableSize,
    OversizedPlay,
    DuplicateCard,
    InvalidSeat,
    NoPlayers,
    HandUnderflow,
}
