//! Loopback coverage for the reconnect path: a channel that closes or goes
//! silent ends with a fresh connection to the same (room, player) endpoint
//! and a full snapshot resync before any incremental message is trusted.
//!
//! Time is paused, so the 31 second heartbeat window and the reconnect
//! pause elapse instantly once every task is waiting.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::handshake::server::{Request, Response};
use tokio_tungstenite::WebSocketStream;

use bigtwo_client::{connect, SessionConfig};

const SNAPSHOT: &str = r#"{"myHand":[],"turnOf":1,"mySeat":0,"playerNames":["ana","bob"],"lastDroppedCards":[],"lastDropBy":1,"handSizeBySeat":{"0":13,"1":13}}"#;

/// One-shot HTTP responder: every connection gets the canned snapshot, and
/// every connection counts as one resync fetch.
async fn serve_snapshots(listener: TcpListener, fetches: Arc<AtomicUsize>) {
    loop {
        let (mut sock, _) = match listener.accept().await {
            Ok(x) => x,
            Err(_) => return,
        };
        fetches.fetch_add(1, Ordering::SeqCst);
        let mut buf = [0u8; 1024];
        let _ = sock.read(&mut buf).await;
        let resp = format!(
            "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            SNAPSHOT.len(),
            SNAPSHOT
        );
        let _ = sock.write_all(resp.as_bytes()).await;
        let _ = sock.shutdown().await;
    }
}

async fn accept_ws(
    listener: &TcpListener,
    paths: &Arc<Mutex<Vec<String>>>,
) -> WebSocketStream<TcpStream> {
    let (sock, _) = listener.accept().await.unwrap();
    let paths = Arc::clone(paths);
    tokio_tungstenite::accept_hdr_async(sock, move |req: &Request, resp: Response| {
        paths.lock().unwrap().push(req.uri().path().to_string());
        Ok(resp)
    })
    .await
    .unwrap()
}

struct Loopback {
    ws: TcpListener,
    paths: Arc<Mutex<Vec<String>>>,
    fetches: Arc<AtomicUsize>,
    config: SessionConfig,
}

async fn loopback() -> Loopback {
    let ws = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let api = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let config = SessionConfig {
        ws_base: format!("ws://{}", ws.local_addr().unwrap()),
        api_base: format!("http://{}", api.local_addr().unwrap()),
        room_id: "r1".into(),
        player_id: "p1".into(),
    };
    let fetches = Arc::new(AtomicUsize::new(0));
    tokio::spawn(serve_snapshots(api, Arc::clone(&fetches)));
    Loopback {
        ws,
        paths: Arc::new(Mutex::new(Vec::new())),
        fetches,
        config,
    }
}

async fn wait_for_fetches(fetches: &AtomicUsize, n: usize) {
    for _ in 0..1000 {
        if fetches.load(Ordering::SeqCst) >= n {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("resync count never reached {n}");
}

#[tokio::test(start_paused = true)]
async fn forced_close_reopens_same_endpoint_and_resyncs() {
    let lb = loopback().await;
    let handle = connect(lb.config.clone());

    let mut ws = accept_ws(&lb.ws, &lb.paths).await;
    wait_for_fetches(&lb.fetches, 1).await;
    let _ = ws.close(None).await;

    // the session comes back on its own, to the same (room, player) path,
    // and fetches a fresh snapshot before anything else
    let _ws2 = accept_ws(&lb.ws, &lb.paths).await;
    wait_for_fetches(&lb.fetches, 2).await;

    let paths = lb.paths.lock().unwrap().clone();
    assert!(paths.len() >= 2);
    assert!(paths.iter().all(|p| p == "/play/r1/p1"));
    assert_eq!(handle.room().read().unwrap().turn_of(), 1);
    handle.close().await;
}

#[tokio::test(start_paused = true)]
async fn silent_channel_goes_stale_then_reconnects() {
    let lb = loopback().await;
    let handle = connect(lb.config.clone());

    // first channel never pings; the heartbeat deadline runs out, the
    // session forces the close itself and opens a replacement
    let _first = accept_ws(&lb.ws, &lb.paths).await;
    let _second = accept_ws(&lb.ws, &lb.paths).await;
    wait_for_fetches(&lb.fetches, 2).await;

    let paths = lb.paths.lock().unwrap().clone();
    assert!(paths.len() >= 2);
    assert!(paths.iter().all(|p| p == "/play/r1/p1"));
    assert_eq!(handle.room().read().unwrap().turn_of(), 1);
    handle.close().await;
}
