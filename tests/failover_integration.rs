//! End-to-end tests over a loopback socket: real server, real channel.

use std::time::Duration;

use futures_util::SinkExt;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;

use snakeshift::arbiter::ModeArbiter;
use snakeshift::game::state::{Direction, GameState};
use snakeshift::net::channel::{ChannelEvent, RemoteChannel};
use snakeshift::net::server::GameServer;

const WAIT: Duration = Duration::from_secs(5);

async fn next_event(events: &mut UnboundedReceiver<ChannelEvent>) -> ChannelEvent {
    timeout(WAIT, events.recv())
        .await
        .expect("event within the deadline")
        .expect("channel task alive")
}

async fn next_snapshot(events: &mut UnboundedReceiver<ChannelEvent>) -> GameState {
    loop {
        if let ChannelEvent::Snapshot(state) = next_event(events).await {
            return state;
        }
    }
}

#[tokio::test]
async fn reset_mid_game_returns_to_the_canonical_start() {
    let server = GameServer::bind("127.0.0.1:0").await.expect("bind");
    let addr = server.local_addr().expect("local addr");
    tokio::spawn(server.serve());

    let (channel, mut events) = RemoteChannel::connect(format!("ws://{addr}/ws"));

    assert!(matches!(next_event(&mut events).await, ChannelEvent::Opened));
    let first = next_snapshot(&mut events).await;
    assert_eq!(first.score, 0);
    assert!(!first.game_over);
    assert_eq!(first.snake.len(), 3);

    // steer, let a few server ticks land, then reset mid-game
    channel.send_direction(Direction::Up);
    let mut steered = false;
    for _ in 0..4 {
        if next_snapshot(&mut events).await.direction == Direction::Up {
            steered = true;
        }
    }
    assert!(steered, "the direction intent never reached the server");

    channel.send_reset();
    // one tick snapshot may already be in flight ahead of the reset one
    let mut reset_state = None;
    for _ in 0..5 {
        let snap = next_snapshot(&mut events).await;
        if snap.snake == vec![(10, 8), (9, 8), (8, 8)] && snap.score == 0 && !snap.game_over {
            reset_state = Some(snap);
            break;
        }
    }
    let reset_state = reset_state.expect("canonical snapshot after reset");
    assert_eq!(reset_state.direction, Direction::Right);
}

#[tokio::test]
async fn malformed_snapshots_are_discarded_silently() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("accept");
        let mut ws_stream = tokio_tungstenite::accept_async(stream).await.expect("handshake");
        ws_stream
            .send(Message::Text("definitely not a snapshot".into()))
            .await
            .expect("send garbage");
        let valid = serde_json::json!({
            "gridWidth": 20, "gridHeight": 16,
            "snake": [[10, 8], [9, 8], [8, 8]],
            "food": [1, 1],
            "direction": "right", "nextDirection": "right",
            "score": 40, "gameOver": false, "speedMs": 130
        });
        ws_stream
            .send(Message::Text(valid.to_string()))
            .await
            .expect("send snapshot");
        tokio::time::sleep(Duration::from_millis(500)).await;
    });

    let (_channel, mut events) = RemoteChannel::connect(format!("ws://{addr}/"));
    assert!(matches!(next_event(&mut events).await, ChannelEvent::Opened));
    // the garbage frame never surfaces; the first snapshot is the valid one
    let snap = next_snapshot(&mut events).await;
    assert_eq!(snap.score, 40);
    assert_eq!(snap.speed_ms, 130);
}

#[tokio::test]
async fn unreachable_server_reports_closed() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);

    let (_channel, mut events) = RemoteChannel::connect(format!("ws://{addr}/ws"));
    assert!(matches!(next_event(&mut events).await, ChannelEvent::Closed));
}

#[tokio::test(start_paused = true)]
async fn arbiter_falls_back_when_no_server_answers() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);

    let (channel, events) = RemoteChannel::connect(format!("ws://{addr}/ws"));
    let mut arbiter = ModeArbiter::new(channel, events);
    for _ in 0..256 {
        if arbiter.is_using_fallback() {
            break;
        }
        arbiter.drive().await;
    }
    assert!(arbiter.is_using_fallback());
    let local = arbiter.game_state().expect("local state");
    assert_eq!(local.score, 0);
    assert!(!local.game_over);
}
