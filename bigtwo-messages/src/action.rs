//! Client --> Server actions: dropping cards or passing the turn.

use bigtwo_core::cards::Card;
use serde::{Deserialize, Serialize};

/// Wrapper for the two player intents to help de/serialize. On the wire a
/// drop is `{"action":"DROP_CARD","payload":[...cards]}` and a pass is
/// `{"action":"PASS"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "payload")]
pub enum ClientAction {
    #[serde(rename = "DROP_CARD")]
    DropCard(Vec<Card>),
    #[serde(rename = "PASS")]
    Pass,
}
