use std::net::SocketAddr;

use futures_util::{SinkExt, StreamExt};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::{sleep_until, Duration, Instant};
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

use crate::error::Result;
use crate::game::engine;
use crate::net::codec::{decode_intent, encode_snapshot};
use crate::net::messages::Intent;

/// Authoritative game server: one independent game per connection, pushed
/// as full snapshots at the game's own tick cadence.
pub struct GameServer {
    listener: TcpListener,
}

impl GameServer {
    pub async fn bind(addr: &str) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub async fn serve(self) -> Result<()> {
        loop {
            let (stream, peer) = self.listener.accept().await?;
            tokio::spawn(async move {
                tracing::info!("client connected: {peer}");
                if let Err(err) = handle_connection(stream).await {
                    tracing::debug!("session {peer} ended: {err}");
                }
                tracing::info!("client disconnected: {peer}");
            });
        }
    }
}

async fn handle_connection(stream: TcpStream) -> Result<()> {
    let ws_stream = accept_async(stream).await?;
    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    let mut rng = StdRng::from_entropy();
    let mut state = engine::initial_state(&mut rng);
    ws_sender.send(Message::Text(encode_snapshot(&state)?)).await?;
    let mut next_tick = Instant::now() + Duration::from_millis(state.speed_ms);

    loop {
        tokio::select! {
            // pushing pauses while the game is over; intents still flow and
            // a reset resumes it
            _ = sleep_until(next_tick), if !state.game_over => {
                state = engine::tick(&state, &mut rng);
                ws_sender.send(Message::Text(encode_snapshot(&state)?)).await?;
                next_tick = Instant::now() + Duration::from_millis(state.speed_ms);
            }
            inbound = ws_receiver.next() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => match decode_intent(text.as_bytes()) {
                        Ok(Intent::Direction { direction }) => {
                            if !state.game_over {
                                state.next_direction = engine::apply_direction(&state, direction);
                            }
                        }
                        Ok(Intent::Reset) => {
                            state = engine::initial_state(&mut rng);
                            ws_sender.send(Message::Text(encode_snapshot(&state)?)).await?;
                            next_tick = Instant::now() + Duration::from_millis(state.speed_ms);
                        }
                        Err(err) => {
                            tracing::debug!("ignoring malformed intent: {err}");
                        }
                    },
                    Some(Ok(Message::Close(_))) | None | Some(Err(_)) => {
                        break;
                    }
                    _ => {}
                }
            }
        }
    }
    Ok(())
}
