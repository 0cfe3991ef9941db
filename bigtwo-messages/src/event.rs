//! Server --> Client events pushed over the room's duplex channel.

use bigtwo_core::cards::Card;
use bigtwo_core::SeatIdx;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Wrapper for every inbound event type to help de/serialize. A message
/// whose `type` tag is unknown (or whose payload is malformed, e.g. a
/// PLAYERS_INFO whose seats aren't a list) fails to parse; the session
/// drops such messages without error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// A turn resolved: who acts next, what (if anything) just landed on
    /// the table, and every seat's remaining-card count. The hand-size map
    /// is required; a NEXT_TURN without one fails to parse rather than
    /// zeroing every count. A set error flag suppresses all effects of the
    /// message.
    #[serde(rename = "NEXT_TURN", rename_all = "camelCase")]
    NextTurn {
        next_seat: SeatIdx,
        #[serde(default)]
        dropped_cards: Vec<Card>,
        #[serde(with = "seat_map")]
        hand_size_by_seat: BTreeMap<SeatIdx, usize>,
        #[serde(default)]
        error: bool,
    },

    /// Full replacement of the local player's hand.
    #[serde(rename = "DECK_UPDATE")]
    DeckUpdate { hand: Vec<Card> },

    /// Full replacement of the online-presence set.
    #[serde(rename = "PLAYERS_INFO", rename_all = "camelCase")]
    PlayersInfo { online_seats: Vec<SeatIdx> },
}

/// JSON object keys are strings, and the tagged-enum buffering inside
/// serde won't turn "0" back into a seat index on its own, so the
/// hand-size map goes through string keys explicitly.
mod seat_map {
    use bigtwo_core::SeatIdx;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<S: Serializer>(
        m: &BTreeMap<SeatIdx, usize>,
        s: S,
    ) -> Result<S::Ok, S::Error> {
        s.collect_map(m.iter().map(|(k, v)| (k.to_string(), *v)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<BTreeMap<SeatIdx, usize>, D::Error> {
        let raw = BTreeMap::<String, usize>::deserialize(d)?;
        raw.into_iter()
            .map(|(k, v)| {
                k.parse::<SeatIdx>()
                    .map(|k| (k, v))
                    .map_err(D::Error::custom)
            })
            .collect()
    }
}

impl ServerEvent {
    /// The wire tag, also used as the per-type debounce key.
    pub fn kind(&self) -> &'static str {
        match self {
            ServerEvent::NextTurn { .. } => "NEXT_TURN",
            ServerEvent::DeckUpdate { .. } => "DECK_UPDATE",
            ServerEvent::PlayersInfo { .. } => "PLAYERS_INFO",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(s: &str) -> Card {
        s.parse().unwrap()
    }

    #[test]
    fn next_turn_parses() {
        let s = r#"{
            "type": "NEXT_TURN",
            "nextSeat": 2,
            "droppedCards": [{"rank":"Seven","suit":"Club"}],
            "handSizeBySeat": {"0": 12, "1": 13, "2": 13, "3": 13}
        }"#;
        let ev: ServerEvent = serde_json::from_str(s).unwrap();
        match ev {
            ServerEvent::NextTurn {
                next_seat,
                dropped_cards,
                hand_size_by_seat,
                error,
            } => {
                assert_eq!(next_seat, 2);
                assert_eq!(dropped_cards, vec![c("7c")]);
                assert_eq!(hand_size_by_seat[&0], 12);
                assert!(!error);
            }
            other => panic!("parsed into {other:?}"),
        }
    }

    #[test]
    fn next_turn_error_flag() {
        let s = r#"{"type": "NEXT_TURN", "nextSeat": 0, "error": true, "handSizeBySeat": {}}"#;
        let ev: ServerEvent = serde_json::from_str(s).unwrap();
        match ev {
            ServerEvent::NextTurn {
                error,
                dropped_cards,
                ..
            } => {
                assert!(error);
                assert!(dropped_cards.is_empty());
            }
            other => panic!("parsed into {other:?}"),
        }
    }

    #[test]
    fn deck_update_parses() {
        let s = r#"{"type": "DECK_UPDATE", "hand": [{"rank":"Two","suit":"Diamond"}]}"#;
        let ev: ServerEvent = serde_json::from_str(s).unwrap();
        assert_eq!(
            ev,
            ServerEvent::DeckUpdate {
                hand: vec![c("2d")]
            }
        );
        assert_eq!(ev.kind(), "DECK_UPDATE");
    }

    #[test]
    fn players_info_parses() {
        let s = r#"{"type": "PLAYERS_INFO", "onlineSeats": [0, 2, 3]}"#;
        let ev: ServerEvent = serde_json::from_str(s).unwrap();
        assert_eq!(
            ev,
            ServerEvent::PlayersInfo {
                online_seats: vec![0, 2, 3]
            }
        );
    }

    #[test]
    fn next_turn_requires_hand_sizes() {
        let s = r#"{"type": "NEXT_TURN", "nextSeat": 2}"#;
        assert!(serde_json::from_str::<ServerEvent>(s).is_err());
        let s = r#"{"type": "NEXT_TURN", "nextSeat": 2, "droppedCards": []}"#;
        assert!(serde_json::from_str::<ServerEvent>(s).is_err());
    }

    #[test]
    fn malformed_players_info_fails() {
        // non-list presence payloads never make it past parsing
        let s = r#"{"type": "PLAYERS_INFO", "onlineSeats": 3}"#;
        assert!(serde_json::from_str::<ServerEvent>(s).is_err());
        let s = r#"{"type": "PLAYERS_INFO", "onlineSeats": {"0": true}}"#;
        assert!(serde_json::from_str::<ServerEvent>(s).is_err());
    }

    #[test]
    fn unknown_type_fails() {
        let s = r#"{"type": "SURPRISE", "whatever": 1}"#;
        assert!(serde_json::from_str::<ServerEvent>(s).is_err());
    }
}
