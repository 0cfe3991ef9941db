//! Connection lifecycle for one (room, player) pair: heartbeat staleness
//! detection, reconnect with a full room resync, duplicate suppression,
//! and dispatch of inbound events into the room state.
//!
//! One driver task owns the socket, the heartbeat deadline, and the
//! debounce table, all inside a single `select!` loop. That makes the
//! deadline reset and the forced close mutually exclusive by construction:
//! a stale timer can never fire against a channel that was already
//! replaced.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use bigtwo_core::cards::Card;
use bigtwo_core::room::RoomState;
use bigtwo_messages::action::ClientAction;
use bigtwo_messages::event::ServerEvent;

use crate::debounce::DebounceFilter;
use crate::http::RoomApi;

/// The server pings every 30 seconds; allow 1 second of slack before
/// declaring the channel stale and closing it ourselves.
pub const HEARTBEAT_WINDOW: Duration = Duration::from_secs(30 + 1);

/// Pause between reconnect attempts. Backoff/give-up policy beyond this is
/// the caller's concern.
const RECONNECT_PAUSE: Duration = Duration::from_secs(1);

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Where the session currently is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SessionState {
    Disconnected = 0,
    Connecting = 1,
    Open = 2,
    Stale = 3,
    Closed = 4,
    Errored = 5,
    Reconnecting = 6,
}

impl SessionState {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => Self::Connecting,
            2 => Self::Open,
            3 => Self::Stale,
            4 => Self::Closed,
            5 => Self::Errored,
            6 => Self::Reconnecting,
            _ => Self::Disconnected,
        }
    }
}

#[derive(Debug, Default)]
struct SharedState(AtomicU8);

impl SharedState {
    fn set(&self, s: SessionState) {
        self.0.store(s as u8, Ordering::Release);
    }

    fn get(&self) -> SessionState {
        SessionState::from_u8(self.0.load(Ordering::Acquire))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("session is not connected")]
    NotConnected,
    #[error("failed to serialize action: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Everything needed to reach one room as one player.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Base address of the duplex channel endpoint, e.g. `ws://host:port`.
    pub ws_base: String,
    /// Base address of the room-setup collaborator.
    pub api_base: String,
    pub room_id: String,
    pub player_id: String,
}

impl SessionConfig {
    fn ws_url(&self) -> String {
        format!(
            "{}/play/{}/{}",
            self.ws_base.trim_end_matches('/'),
            self.room_id,
            self.player_id
        )
    }
}

enum Command {
    Send(String),
    Shutdown,
}

/// Handle held by the caller. Reads go through [`SessionHandle::room`];
/// sends go through [`SessionHandle::send`] and friends; dropping the
/// room view calls [`SessionHandle::close`].
pub struct SessionHandle {
    cmd_tx: mpsc::UnboundedSender<Command>,
    shared: Arc<SharedState>,
    room: Arc<RwLock<RoomState>>,
    task: JoinHandle<()>,
}

impl SessionHandle {
    pub fn state(&self) -> SessionState {
        self.shared.get()
    }

    /// The room state this session keeps in sync. Only the session's
    /// dispatch path ever writes it; everyone else is a read-only
    /// observer.
    pub fn room(&self) -> Arc<RwLock<RoomState>> {
        Arc::clone(&self.room)
    }

    /// Transmit an already-shaped action. While the channel is anything
    /// but open this is a no-op failure, never a crash; retry policy is
    /// the caller's.
    pub fn send(&self, action: &ClientAction) -> Result<(), SendError> {
        if self.shared.get() != SessionState::Open {
            return Err(SendError::NotConnected);
        }
        let text = serde_json::to_string(action)?;
        self.cmd_tx
            .send(Command::Send(text))
            .map_err(|_| SendError::NotConnected)
    }

    /// Send a DROP_CARD and take the cards out of the local hand. The
    /// server's DECK_UPDATE remains authoritative.
    pub fn drop_cards(&self, cards: Vec<Card>) -> Result<(), SendError> {
        self.send(&ClientAction::DropCard(cards.clone()))?;
        if let Ok(mut room) = self.room.write() {
            room.drop_from_hand(&cards);
        }
        Ok(())
    }

    pub fn pass(&self) -> Result<(), SendError> {
        self.send(&ClientAction::Pass)
    }

    /// Deterministic teardown: the channel closes, the driver exits, and
    /// no timer or callback fires afterwards.
    pub async fn close(self) {
        let _ = self.cmd_tx.send(Command::Shutdown);
        let _ = self.task.await;
    }
}

/// Start the session driver for one (room, player) pair. The room state
/// starts empty and is populated by the first resync once the channel
/// opens.
pub fn connect(config: SessionConfig) -> SessionHandle {
    let room = Arc::new(RwLock::new(RoomState::default()));
    let shared = Arc::new(SharedState::default());
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let driver = Driver {
        api: RoomApi::new(config.api_base.clone()),
        config,
        room: Arc::clone(&room),
        shared: Arc::clone(&shared),
        debounce: DebounceFilter::default(),
        resync_gen: 0,
    };
    let task = tokio::spawn(driver.run(cmd_rx));
    SessionHandle {
        cmd_tx,
        shared,
        room,
        task,
    }
}

/// Apply one inbound event to the room. All writes for one event happen
/// under the caller's single lock acquisition, so observers never see a
/// half-applied update (e.g. hand counts moved but the turn pointer not).
pub fn apply_event(room: &mut RoomState, event: &ServerEvent) {
    match event {
        ServerEvent::NextTurn {
            next_seat,
            dropped_cards,
            hand_size_by_seat,
            error,
        } => {
            if *error {
                return;
            }
            if !dropped_cards.is_empty() {
                // attributed to the seat whose turn it was, before the
                // pointer moves on
                room.record_drop(dropped_cards.clone());
            }
            room.set_turn_of(*next_seat);
            room.replace_hand_sizes(hand_size_by_seat.clone());
        }
        ServerEvent::DeckUpdate { hand } => room.replace_hand(hand.clone()),
        ServerEvent::PlayersInfo { online_seats } => {
            room.set_online_seats(online_seats.iter().copied())
        }
    }
}

enum Exit {
    Shutdown,
    Closed,
    Errored,
    Stale,
}

struct Driver {
    config: SessionConfig,
    api: RoomApi,
    room: Arc<RwLock<RoomState>>,
    shared: Arc<SharedState>,
    debounce: DebounceFilter,
    resync_gen: u64,
}

impl Driver {
    async fn run(mut self, mut cmd_rx: mpsc::UnboundedReceiver<Command>) {
        let url = self.config.ws_url();
        self.shared.set(SessionState::Connecting);
        loop {
            let stream = match connect_async(url.as_str()).await {
                Ok((stream, _resp)) => stream,
                Err(e) => {
                    tracing::warn!(error = %e, "websocket connect failed");
                    self.shared.set(SessionState::Reconnecting);
                    if !pause_or_shutdown(&mut cmd_rx).await {
                        break;
                    }
                    continue;
                }
            };
            self.shared.set(SessionState::Open);
            tracing::info!(room = %self.config.room_id, "channel open");

            // Full resync before trusting anything incremental: messages
            // lost while we were away cannot be replayed.
            if !self.resync().await {
                self.shared.set(SessionState::Errored);
                self.shared.set(SessionState::Reconnecting);
                if !pause_or_shutdown(&mut cmd_rx).await {
                    break;
                }
                continue;
            }

            match self.drive(stream, &mut cmd_rx).await {
                Exit::Shutdown => break,
                Exit::Closed => self.shared.set(SessionState::Closed),
                Exit::Errored => self.shared.set(SessionState::Errored),
                Exit::Stale => {
                    self.shared.set(SessionState::Stale);
                    self.shared.set(SessionState::Closed);
                }
            }
            self.shared.set(SessionState::Reconnecting);
            if !pause_or_shutdown(&mut cmd_rx).await {
                break;
            }
        }
        self.debounce.clear();
        self.shared.set(SessionState::Disconnected);
        tracing::debug!(room = %self.config.room_id, "session driver stopped");
    }

    /// Fetch and apply a fresh snapshot. Only the response matching the
    /// most recent request may be applied; anything older is discarded so
    /// an out-of-order response can't clobber newer state.
    async fn resync(&mut self) -> bool {
        self.resync_gen += 1;
        let gen = self.resync_gen;
        let resp = self
            .api
            .fetch_room_snapshot(&self.config.room_id, &self.config.player_id)
            .await;
        match resp {
            Ok(snapshot) if gen == self.resync_gen => {
                if let Ok(mut room) = self.room.write() {
                    room.apply_snapshot(&snapshot);
                }
                tracing::debug!(room = %self.config.room_id, "room state resynced");
                true
            }
            Ok(_) => {
                tracing::debug!("discarding superseded resync response");
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, "room resync failed");
                false
            }
        }
    }

    async fn drive(
        &mut self,
        stream: WsStream,
        cmd_rx: &mut mpsc::UnboundedReceiver<Command>,
    ) -> Exit {
        let (mut sink, mut source) = stream.split();
        let mut deadline = Instant::now() + HEARTBEAT_WINDOW;
        loop {
            tokio::select! {
                _ = tokio::time::sleep_until(deadline) => {
                    tracing::warn!("no heartbeat within {:?}; closing channel", HEARTBEAT_WINDOW);
                    let _ = sink.close().await;
                    return Exit::Stale;
                }
                cmd = cmd_rx.recv() => match cmd {
                    Some(Command::Send(text)) => {
                        if let Err(e) = sink.send(Message::Text(text)).await {
                            tracing::warn!(error = %e, "send failed");
                            return Exit::Errored;
                        }
                    }
                    Some(Command::Shutdown) | None => {
                        let _ = sink.close().await;
                        return Exit::Shutdown;
                    }
                },
                msg = source.next() => match msg {
                    Some(Ok(Message::Ping(_))) => {
                        deadline = Instant::now() + HEARTBEAT_WINDOW;
                    }
                    Some(Ok(Message::Text(text))) => self.on_text(&text),
                    Some(Ok(Message::Close(_))) | None => {
                        tracing::info!("connection closed");
                        return Exit::Closed;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "socket error");
                        return Exit::Errored;
                    }
                },
            }
        }
    }

    /// Parse, debounce, dispatch. A message that fails to parse (unknown
    /// type, malformed payload) is dropped here with no state change and
    /// no error to the caller.
    fn on_text(&mut self, text: &str) {
        let event: ServerEvent = match serde_json::from_str(text) {
            Ok(ev) => ev,
            Err(e) => {
                tracing::debug!(error = %e, "dropping unparseable message");
                return;
            }
        };
        if !self.debounce.admit(event.kind(), Instant::now()) {
            tracing::debug!(kind = event.kind(), "suppressing duplicate message");
            return;
        }
        if let Ok(mut room) = self.room.write() {
            apply_event(&mut room, &event);
        }
    }
}

/// Wait out the reconnect pause. Answers false if the session was told to
/// shut down in the meantime; queued sends are dropped (the caller was
/// already told the session isn't connected).
async fn pause_or_shutdown(cmd_rx: &mut mpsc::UnboundedReceiver<Command>) -> bool {
    let wait = tokio::time::sleep(RECONNECT_PAUSE);
    tokio::pin!(wait);
    loop {
        tokio::select! {
            _ = &mut wait => return true,
            cmd = cmd_rx.recv() => match cmd {
                Some(Command::Send(_)) => continue,
                Some(Command::Shutdown) | None => return false,
            },
        }
    }
}
