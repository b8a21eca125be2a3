use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::{Duration, Instant};

use crate::config::GRACE_PERIOD_MS;
use crate::game::engine::LocalEngine;
use crate::game::state::{Direction, GameState};
use crate::net::channel::{ChannelEvent, RemoteChannel};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveSource {
    Remote,
    Local,
}

/// Decides, at every instant, whether the remote feed or the local
/// simulation drives the displayed state.
///
/// The two timers (fallback grace period, local tick) live here as plain
/// deadlines; every transition clears the deadline belonging to the path it
/// leaves, so a stale timer can never mutate state after a switch. Leaving
/// remote is debounced by the grace period; coming back is immediate on the
/// first snapshot of an open connection.
pub struct ModeArbiter {
    channel: RemoteChannel,
    events: UnboundedReceiver<ChannelEvent>,
    events_done: bool,
    engine: LocalEngine,
    source: ActiveSource,
    remote: Option<GameState>,
    connected: bool,
    grace_deadline: Option<Instant>,
    next_tick: Option<Instant>,
}

impl ModeArbiter {
    pub fn new(channel: RemoteChannel, events: UnboundedReceiver<ChannelEvent>) -> Self {
        Self::starting_at(channel, events, Instant::now())
    }

    // The grace timer is armed from the start: the channel begins in
    // Connecting, which already counts as "non-Open".
    pub(crate) fn starting_at(
        channel: RemoteChannel,
        events: UnboundedReceiver<ChannelEvent>,
        now: Instant,
    ) -> Self {
        Self {
            channel,
            events,
            events_done: false,
            engine: LocalEngine::new(),
            source: ActiveSource::Remote,
            remote: None,
            connected: false,
            grace_deadline: Some(now + grace_period()),
            next_tick: None,
        }
    }

    pub fn on_open(&mut self, _now: Instant) {
        // Open alone is not proof of a live feed; the grace timer keeps
        // running until the first snapshot lands.
        self.connected = true;
    }

    pub fn on_close(&mut self, now: Instant) {
        self.connected = false;
        if self.source == ActiveSource::Remote && self.grace_deadline.is_none() {
            self.grace_deadline = Some(now + grace_period());
        }
    }

    pub fn on_snapshot(&mut self, snapshot: GameState, _now: Instant) {
        self.remote = Some(snapshot);
        self.grace_deadline = None;
        if self.source == ActiveSource::Local {
            self.next_tick = None;
            self.source = ActiveSource::Remote;
            tracing::info!("authoritative feed recovered, leaving local mode");
        }
    }

    pub fn on_timer(&mut self, now: Instant) {
        if let Some(deadline) = self.grace_deadline {
            if now >= deadline {
                self.grace_deadline = None;
                self.enter_local(now);
                return;
            }
        }
        if self.source == ActiveSource::Local {
            if let Some(deadline) = self.next_tick {
                if now >= deadline {
                    self.engine.tick();
                    self.next_tick = if self.engine.state().game_over {
                        None
                    } else {
                        Some(now + Duration::from_millis(self.engine.state().speed_ms))
                    };
                }
            }
        }
    }

    fn enter_local(&mut self, now: Instant) {
        self.source = ActiveSource::Local;
        // local play always starts fresh, never resuming remote state
        self.engine.reset();
        self.next_tick = Some(now + Duration::from_millis(self.engine.state().speed_ms));
        tracing::info!("no authoritative feed for {:?}, switching to local simulation", grace_period());
    }

    /// Earliest pending deadline, if any; feeds the driver's sleep.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.grace_deadline, self.next_tick) {
            (Some(grace), Some(tick)) => Some(grace.min(tick)),
            (grace, tick) => grace.or(tick),
        }
    }

    /// Waits for the next channel event or timer expiry and applies it.
    pub async fn drive(&mut self) {
        let deadline = self.next_deadline();
        if self.events_done && deadline.is_none() {
            std::future::pending::<()>().await;
        }
        tokio::select! {
            event = self.events.recv(), if !self.events_done => {
                let now = Instant::now();
                match event {
                    Some(ChannelEvent::Opened) => self.on_open(now),
                    Some(ChannelEvent::Closed) => self.on_close(now),
                    Some(ChannelEvent::Snapshot(snapshot)) => self.on_snapshot(snapshot, now),
                    None => {
                        self.events_done = true;
                        self.on_close(now);
                    }
                }
            }
            _ = sleep_until_or_forever(deadline) => {
                self.on_timer(Instant::now());
            }
        }
    }

    /// None only before the first remote data has arrived.
    pub fn game_state(&self) -> Option<&GameState> {
        match self.source {
            ActiveSource::Remote => self.remote.as_ref(),
            ActiveSource::Local => Some(self.engine.state()),
        }
    }

    pub fn is_using_fallback(&self) -> bool {
        self.source == ActiveSource::Local
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn send_direction(&mut self, direction: Direction) {
        match self.source {
            ActiveSource::Remote => self.channel.send_direction(direction),
            ActiveSource::Local => self.engine.apply_direction(direction),
        }
    }

    pub fn send_reset(&mut self, now: Instant) {
        match self.source {
            ActiveSource::Remote => self.channel.send_reset(),
            ActiveSource::Local => {
                self.engine.reset();
                self.next_tick = Some(now + Duration::from_millis(self.engine.state().speed_ms));
            }
        }
    }
}

fn grace_period() -> Duration {
    Duration::from_millis(GRACE_PERIOD_MS)
}

async fn sleep_until_or_forever(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
