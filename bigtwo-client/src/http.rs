//! The room-setup collaborator: plain request/response calls for creating
//! a room, joining it, and fetching the full room snapshot used on join
//! and on every reconnect resync.

use bigtwo_core::room::RoomSnapshot;
pub(crate) use reqwest::Client;
use reqwest::{IntoUrl, Result};
use serde::{Deserialize, Serialize};

/// Make a GET request to the given URL, expect a JSON response, parse the
/// JSON response into the appropriate type, and return it. Returns
/// reqwest::Error if anything fails.
pub async fn get_json<T: for<'de> Deserialize<'de>, U: IntoUrl>(c: &Client, url: U) -> Result<T> {
    c.get(url).send().await?.json::<T>().await
}

/// POST a JSON body and parse the JSON response.
pub async fn post_json<T: for<'de> Deserialize<'de>, B: Serialize + ?Sized, U: IntoUrl>(
    c: &Client,
    url: U,
    body: &B,
) -> Result<T> {
    c.post(url).json(body).send().await?.json::<T>().await
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewRoom {
    #[serde(rename = "roomID")]
    pub room_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JoinedRoom {
    #[serde(rename = "myID")]
    pub my_id: String,
    #[serde(rename = "roomID")]
    pub room_id: String,
}

/// Handle on the room-setup endpoints at one base address.
#[derive(Debug, Clone)]
pub struct RoomApi {
    client: Client,
    base: String,
}

impl RoomApi {
    pub fn new<S: Into<String>>(base: S) -> Self {
        Self {
            client: Client::new(),
            base: base.into(),
        }
    }

    fn uri(&self, parts: &[&str]) -> String {
        let mut s = self.base.trim_end_matches('/').to_string();
        for p in parts {
            s.push('/');
            s.push_str(p);
        }
        s
    }

    pub async fn create_room(&self) -> Result<NewRoom> {
        post_json(&self.client, self.uri(&["new-room"]), &serde_json::json!({})).await
    }

    pub async fn join_room(&self, room_id: &str, player_name: &str) -> Result<JoinedRoom> {
        let body = serde_json::json!({ "roomID": room_id, "playerName": player_name });
        post_json(&self.client, self.uri(&["enter-room"]), &body).await
    }

    pub async fn fetch_room_snapshot(
        &self,
        room_id: &str,
        player_id: &str,
    ) -> Result<RoomSnapshot> {
        get_json(&self.client, self.uri(&["my-room", room_id, player_id])).await
    }
}
