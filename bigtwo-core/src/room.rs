//! Authoritative per-room state as one client sees it: seats, turn order,
//! what sits on the table, hand sizes, presence. Pure state and mutation
//! operations; no I/O. Every operation validates its preconditions before
//! the first field write, so a failed call leaves the state untouched.

use crate::cards::Card;
use crate::rules::{self, Play, TableContext};
use crate::{GameError, SeatIdx};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// The next seat in seat order, wrapping around the table.
pub fn next_seat(turn_of: SeatIdx, seat_count: usize) -> SeatIdx {
    (turn_of + 1) % seat_count
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub name: String,
    pub seat: SeatIdx,
}

/// The full-state payload served on join and on every reconnect resync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    #[serde(default)]
    pub my_hand: Vec<Card>,
    pub turn_of: SeatIdx,
    pub my_seat: SeatIdx,
    pub player_names: Vec<String>,
    #[serde(default)]
    pub last_dropped_cards: Vec<Card>,
    pub last_drop_by: SeatIdx,
    #[serde(default)]
    pub hand_size_by_seat: BTreeMap<SeatIdx, usize>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomState {
    players: Vec<PlayerInfo>,
    turn_of: SeatIdx,
    last_dropped: Vec<Card>,
    last_drop_by: SeatIdx,
    hand_size_by_seat: BTreeMap<SeatIdx, usize>,
    online_seats: BTreeSet<SeatIdx>,
    my_seat: Option<SeatIdx>,
    my_hand: Vec<Card>,
}

impl RoomState {
    pub fn players(&self) -> &[PlayerInfo] {
        &self.players
    }

    pub fn turn_of(&self) -> SeatIdx {
        self.turn_of
    }

    pub fn last_dropped(&self) -> &[Card] {
        &self.last_dropped
    }

    pub fn last_drop_by(&self) -> SeatIdx {
        self.last_drop_by
    }

    pub fn hand_size(&self, seat: SeatIdx) -> usize {
        self.hand_size_by_seat.get(&seat).copied().unwrap_or(0)
    }

    pub fn online_seats(&self) -> &BTreeSet<SeatIdx> {
        &self.online_seats
    }

    pub fn my_seat(&self) -> Option<SeatIdx> {
        self.my_seat
    }

    pub fn my_hand(&self) -> &[Card] {
        &self.my_hand
    }

    /// A free turn carries no table constraint: either the table is fresh,
    /// or everyone passed back around to whoever dropped last.
    pub fn is_free_turn(&self) -> bool {
        self.last_dropped.is_empty() || self.last_drop_by == self.turn_of
    }

    pub fn is_my_turn(&self) -> bool {
        self.my_seat == Some(self.turn_of)
    }

    pub fn table_context(&self) -> TableContext<'_> {
        TableContext {
            last_dropped: &self.last_dropped,
            is_free_turn: self.is_free_turn(),
        }
    }

    /// The composed room policy for the local player: validator legality,
    /// plus the opening-card constraint on the very first play of a fresh
    /// table.
    pub fn drop_allowed(&self, candidate: &Play) -> bool {
        let free = self.is_free_turn();
        if free && self.last_dropped.is_empty() && !rules::contains_opening_card(candidate) {
            return false;
        }
        rules::is_legal(&self.table_context(), candidate)
    }

    /// A seat dropped a play: it lands on the table attributed to that
    /// seat, the seat's hand shrinks, and the turn advances.
    pub fn apply_drop(&mut self, seat: SeatIdx, play: &Play) -> Result<(), GameError> {
        if self.players.is_empty() {
            return Err(GameError::NoPlayers);
        }
        if seat >= self.players.len() {
            return Err(GameError::InvalidSeat);
        }
        let remaining = self.hand_size(seat);
        if remaining < play.size() {
            // dropping more cards than the seat holds is a protocol
            // violation, rejected rather than clamped
            return Err(GameError::HandUnderflow);
        }
        self.last_dropped = play.cards().to_vec();
        self.last_drop_by = seat;
        self.hand_size_by_seat.insert(seat, remaining - play.size());
        self.turn_of = next_seat(self.turn_of, self.players.len());
        Ok(())
    }

    /// A seat passed: only the turn pointer moves. The last drop stays put
    /// so the free-turn check resolves once the turn returns to the
    /// dropper.
    pub fn apply_pass(&mut self, seat: SeatIdx) -> Result<(), GameError> {
        if self.players.is_empty() {
            return Err(GameError::NoPlayers);
        }
        if seat >= self.players.len() {
            return Err(GameError::InvalidSeat);
        }
        self.turn_of = next_seat(self.turn_of, self.players.len());
        Ok(())
    }

    /// Replace the whole room wholesale from a snapshot. Used after join
    /// and after every reconnect; nothing from before survives except
    /// presence, which PLAYERS_INFO refreshes on its own.
    pub fn apply_snapshot(&mut self, snapshot: &RoomSnapshot) {
        self.players = snapshot
            .player_names
            .iter()
            .enumerate()
            .map(|(seat, name)| PlayerInfo {
                name: name.clone(),
                seat,
            })
            .collect();
        self.turn_of = snapshot.turn_of;
        self.last_dropped = snapshot.last_dropped_cards.clone();
        self.last_drop_by = snapshot.last_drop_by;
        self.hand_size_by_seat = snapshot.hand_size_by_seat.clone();
        self.my_seat = Some(snapshot.my_seat);
        self.my_hand = snapshot.my_hand.clone();
    }

    /// Record a drop broadcast by the server. The cards are attributed to
    /// the seat whose turn it currently is; callers advance the turn with
    /// [`RoomState::set_turn_of`] afterwards.
    pub fn record_drop(&mut self, cards: Vec<Card>) {
        self.last_drop_by = self.turn_of;
        self.last_dropped = cards;
    }

    /// Move the turn pointer to the seat the server named.
    pub fn set_turn_of(&mut self, seat: SeatIdx) {
        self.turn_of = seat;
    }

    /// Replace every seat's remaining-card count from the server's map.
    pub fn replace_hand_sizes(&mut self, sizes: BTreeMap<SeatIdx, usize>) {
        self.hand_size_by_seat = sizes;
    }

    pub fn mark_online(&mut self, seat: SeatIdx) {
        self.online_seats.insert(seat);
    }

    pub fn mark_offline(&mut self, seat: SeatIdx) {
        self.online_seats.remove(&seat);
    }

    /// Replace the presence set wholesale (PLAYERS_INFO).
    pub fn set_online_seats<I: IntoIterator<Item = SeatIdx>>(&mut self, seats: I) {
        self.online_seats = seats.into_iter().collect();
    }

    /// Replace the local player's cards wholesale (DECK_UPDATE).
    pub fn replace_hand(&mut self, cards: Vec<Card>) {
        self.my_hand = cards;
    }

    /// Remove played cards from the local hand.
    pub fn drop_from_hand(&mut self, played: &[Card]) {
        self.my_hand.retain(|c| !played.contains(c));
    }

    /// Swap two cards of the local hand. Rearranging is cosmetic, so
    /// out-of-range indices are ignored.
    pub fn swap_cards(&mut self, a: usize, b: usize) {
        if a < self.my_hand.len() && b < self.my_hand.len() {
            self.my_hand.swap(a, b);
        }
    }
}
