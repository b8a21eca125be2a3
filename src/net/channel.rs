use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use crate::config::{BACKOFF_BASE_MS, BACKOFF_CAP_MS};
use crate::game::state::{Direction, GameState};
use crate::net::codec::{decode_snapshot, encode_intent};
use crate::net::messages::Intent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
}

#[derive(Debug, Clone)]
pub enum ChannelEvent {
    Opened,
    Closed,
    Snapshot(GameState),
}

/// Handle to the single logical server connection. The IO task behind it
/// redials forever with capped exponential backoff; the underlying socket is
/// replaced wholesale on every attempt, so at most one live connection
/// exists at a time.
pub struct RemoteChannel {
    intent_tx: UnboundedSender<Intent>,
    state: Arc<Mutex<ConnectionState>>,
}

impl RemoteChannel {
    /// Spawns the IO task and starts the first connection attempt
    /// immediately. Events arrive on the returned receiver in the order the
    /// connection produced them.
    pub fn connect(url: String) -> (Self, UnboundedReceiver<ChannelEvent>) {
        let (intent_tx, intent_rx) = unbounded_channel();
        let (event_tx, event_rx) = unbounded_channel();
        let state = Arc::new(Mutex::new(ConnectionState::Connecting));
        tokio::spawn(run(url, state.clone(), event_tx, intent_rx));
        (Self { intent_tx, state }, event_rx)
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.state
            .lock()
            .map(|guard| *guard)
            .unwrap_or(ConnectionState::Closed)
    }

    pub fn send_direction(&self, direction: Direction) {
        self.send(Intent::Direction { direction });
    }

    pub fn send_reset(&self) {
        self.send(Intent::Reset);
    }

    // Dropped, not queued, unless the connection is open; the next
    // authoritative snapshot reflects reality once reconnected.
    fn send(&self, intent: Intent) {
        if self.connection_state() != ConnectionState::Open {
            return;
        }
        let _ = self.intent_tx.send(intent);
    }

    #[cfg(test)]
    pub(crate) fn detached(state: ConnectionState) -> (Self, UnboundedReceiver<Intent>) {
        let (intent_tx, intent_rx) = unbounded_channel();
        let channel = Self {
            intent_tx,
            state: Arc::new(Mutex::new(state)),
        };
        (channel, intent_rx)
    }

    #[cfg(test)]
    pub(crate) fn set_connection_state(&self, next: ConnectionState) {
        set_state(&self.state, next);
    }
}

pub fn backoff_delay(attempt: u32) -> Duration {
    let ms = BACKOFF_BASE_MS
        .saturating_mul(2u64.saturating_pow(attempt))
        .min(BACKOFF_CAP_MS);
    Duration::from_millis(ms)
}

fn set_state(slot: &Mutex<ConnectionState>, next: ConnectionState) {
    if let Ok(mut guard) = slot.lock() {
        *guard = next;
    }
}

async fn run(
    url: String,
    state: Arc<Mutex<ConnectionState>>,
    event_tx: UnboundedSender<ChannelEvent>,
    mut intent_rx: UnboundedReceiver<Intent>,
) {
    let mut attempt: u32 = 0;
    loop {
        set_state(&state, ConnectionState::Connecting);
        match connect_async(&url).await {
            Ok((ws_stream, _)) => {
                attempt = 0;
                set_state(&state, ConnectionState::Open);
                tracing::info!("connected to {url}");
                if event_tx.send(ChannelEvent::Opened).is_err() {
                    return;
                }

                let (mut ws_sender, mut ws_receiver) = ws_stream.split();
                loop {
                    tokio::select! {
                        outbound = intent_rx.recv() => {
                            let Some(intent) = outbound else { return };
                            if let Ok(text) = encode_intent(&intent) {
                                if ws_sender.send(Message::Text(text)).await.is_err() {
                                    break;
                                }
                            }
                        }
                        inbound = ws_receiver.next() => {
                            match inbound {
                                Some(Ok(Message::Text(text))) => {
                                    match decode_snapshot(text.as_bytes()) {
                                        Ok(snapshot) => {
                                            let _ = event_tx.send(ChannelEvent::Snapshot(snapshot));
                                        }
                                        Err(err) => {
                                            tracing::warn!("discarding malformed snapshot: {err}");
                                        }
                                    }
                                }
                                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => {
                                    break;
                                }
                                _ => {}
                            }
                        }
                    }
                }
            }
            Err(err) => {
                tracing::debug!("connect to {url} failed: {err}");
            }
        }

        set_state(&state, ConnectionState::Closed);
        if event_tx.send(ChannelEvent::Closed).is_err() {
            return;
        }

        let delay = backoff_delay(attempt);
        attempt = attempt.saturating_add(1);
        tracing::info!("reconnecting in {delay:?} (attempt {attempt})");

        // Intents arriving while disconnected are drained and dropped, never
        // queued for the next connection.
        let sleep = tokio::time::sleep(delay);
        tokio::pin!(sleep);
        loop {
            tokio::select! {
                _ = &mut sleep => break,
                dropped = intent_rx.recv() => {
                    if dropped.is_none() {
                        return;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_is_capped_exponential() {
        let delays: Vec<u64> = (0..6).map(|a| backoff_delay(a).as_millis() as u64).collect();
        assert_eq!(delays, vec![1000, 2000, 4000, 8000, 10000, 10000]);
        // never overflows, stays at the cap
        assert_eq!(backoff_delay(400).as_millis() as u64, BACKOFF_CAP_MS);
    }

    #[test]
    fn intents_are_dropped_unless_open() {
        let (channel, mut intent_rx) = RemoteChannel::detached(ConnectionState::Closed);
        channel.send_direction(Direction::Up);
        channel.send_reset();
        assert!(intent_rx.try_recv().is_err());

        channel.set_connection_state(ConnectionState::Open);
        channel.send_direction(Direction::Up);
        assert_eq!(
            intent_rx.try_recv().unwrap(),
            Intent::Direction {
                direction: Direction::Up
            }
        );
    }
}
