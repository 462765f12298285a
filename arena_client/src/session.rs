//! Session loop.
//!
//! The session owns the entity store, the input sampler, and both cadences:
//! a render tick at display pacing and a fixed-rate input tick. Everything
//! runs on one task, so every store mutation is serialized with every render
//! read — a render tick observes the pre- or post-replacement state in full,
//! never a partial mix.
//!
//! Inbound frames are read and validated on a dedicated reader task and
//! forwarded as tagged messages. The select loop must never cancel a frame
//! read halfway (length-prefix framing would desync), which is why the
//! socket itself stays off the loop.

use std::time::Duration;

use anyhow::Context;
use arena_shared::{
    config::ClientConfig,
    net::{FrameConn, FrameReader, FrameWriter},
    protocol::{decode_frame, ClientMsg, Inbound},
};
use tokio::{
    sync::mpsc,
    time::{self, MissedTickBehavior},
};
use tracing::{debug, info};

use crate::{
    input::{build_intent, InputBindings, InputSampler, KeyEvent},
    render::RenderSink,
    world::World,
};

/// Transport availability as seen by the input tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Open,
    Closed,
}

/// Handle for feeding and tearing down a running session.
///
/// The handle is the scoped-acquisition side of the session: key observation
/// and the session itself last exactly as long as handles exist. Dropping
/// every clone tears the session down.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    keys: mpsc::UnboundedSender<KeyEvent>,
    shutdown: mpsc::Sender<()>,
}

impl SessionHandle {
    pub fn press(&self, key: &str) {
        let _ = self.keys.send(KeyEvent::Down(key.to_string()));
    }

    pub fn release(&self, key: &str) {
        let _ = self.keys.send(KeyEvent::Up(key.to_string()));
    }

    /// A raw sender for a platform key source. Dropping every sender closes
    /// the feed, which the session treats as detach.
    pub fn key_sender(&self) -> mpsc::UnboundedSender<KeyEvent> {
        self.keys.clone()
    }

    /// Ends the session. Idempotent; safe to call while teardown is already
    /// underway.
    pub fn shutdown(&self) {
        let _ = self.shutdown.try_send(());
    }
}

/// High-level client session.
pub struct ClientSession {
    cfg: ClientConfig,
    writer: FrameWriter,
    inbound: mpsc::UnboundedReceiver<Inbound>,
    keys: mpsc::UnboundedReceiver<KeyEvent>,
    shutdown: mpsc::Receiver<()>,
    world: World,
    sampler: InputSampler,
    state: SessionState,
}

impl ClientSession {
    /// Connects to the server and announces itself. The welcome is handled
    /// by the normal inbound path once [`run`](Self::run) drives the loop.
    pub async fn connect(cfg: &ClientConfig) -> anyhow::Result<(Self, SessionHandle)> {
        Self::connect_with(cfg, InputBindings::default()).await
    }

    /// Connects with custom action bindings.
    pub async fn connect_with(
        cfg: &ClientConfig,
        bindings: InputBindings,
    ) -> anyhow::Result<(Self, SessionHandle)> {
        let addr = cfg.server_addr.parse().context("parse server_addr")?;

        info!(server = %cfg.server_addr, "connecting");
        let mut conn = FrameConn::connect(addr).await?;
        conn.send(&ClientMsg::Hello).await?;

        let (reader, writer) = conn.into_split();
        let inbound = spawn_reader(reader);

        let (keys_tx, keys_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let session = Self {
            cfg: cfg.clone(),
            writer,
            inbound,
            keys: keys_rx,
            shutdown: shutdown_rx,
            world: World::new(),
            sampler: InputSampler::new(bindings),
            state: SessionState::Open,
        };
        let handle = SessionHandle {
            keys: keys_tx,
            shutdown: shutdown_tx,
        };
        Ok((session, handle))
    }

    /// Drives the session until torn down via its handle.
    ///
    /// The render tick and the input tick are mutually independent in
    /// cadence. A closed transport stops intent emission but keeps the
    /// render tick serving the (now stale) store; only teardown ends the
    /// loop, and once it breaks no further tick fires.
    pub async fn run<R: RenderSink>(mut self, renderer: &mut R) -> anyhow::Result<()> {
        let mut render_tick = time::interval(tick_period(self.cfg.render_hz));
        let mut input_tick = time::interval(tick_period(self.cfg.input_hz));
        // No catch-up bursts: a run of stale intents is worthless to the server.
        input_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut keys_attached = true;
        loop {
            tokio::select! {
                _ = render_tick.tick() => {
                    let snapshot = self.world.all();
                    renderer.draw(&snapshot, self.world.local_id());
                }
                _ = input_tick.tick() => {
                    self.send_intent().await;
                }
                msg = self.inbound.recv(), if self.state == SessionState::Open => {
                    match msg {
                        Some(msg) => route_inbound(&mut self.world, msg),
                        None => {
                            info!("transport closed");
                            self.state = SessionState::Closed;
                        }
                    }
                }
                ev = self.keys.recv(), if keys_attached => {
                    match ev {
                        Some(ev) => self.sampler.apply(&ev),
                        None => {
                            // Feed detached; nothing may stay stuck down.
                            self.sampler.release_all();
                            keys_attached = false;
                        }
                    }
                }
                _ = self.shutdown.recv() => break,
            }
        }

        info!("session torn down");
        Ok(())
    }

    /// Fixed-cadence intent emission. The tick is a silent no-op, not an
    /// error, while the transport is closed or the designated local entity
    /// is absent from the current snapshot (it resumes if a later snapshot
    /// reintroduces the id).
    async fn send_intent(&mut self) {
        if self.state != SessionState::Open {
            return;
        }
        let Some(local) = self.world.local_player() else {
            return;
        };
        let msg = build_intent(&local.id, self.sampler.directions());
        if let Err(error) = self.writer.send(&msg).await {
            debug!(%error, "intent send failed");
            self.state = SessionState::Closed;
        }
    }
}

/// Applies one validated inbound message to the store.
///
/// `welcome` designates the local entity and installs its snapshot in the
/// same step; `state` replaces the snapshot; anything else is dropped.
fn route_inbound(world: &mut World, msg: Inbound) {
    match msg {
        Inbound::Welcome(welcome) => {
            info!(id = %welcome.id, players = welcome.world.players.len(), "welcome");
            world.set_local_player(welcome.id);
            world.replace_all(&welcome.world.players);
        }
        Inbound::State(state) => world.replace_all(&state.players),
        Inbound::Invalid => debug!("dropping unrecognized frame"),
    }
}

/// Reads frames until the transport fails, validating each and forwarding
/// the tagged result. Classification happens here so the session task only
/// ever sees data; the channel closing is the close signal.
fn spawn_reader(mut reader: FrameReader) -> mpsc::UnboundedReceiver<Inbound> {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        loop {
            match reader.recv().await {
                Ok(text) => {
                    if tx.send(decode_frame(&text)).is_err() {
                        break;
                    }
                }
                Err(error) => {
                    debug!(%error, "frame read ended");
                    break;
                }
            }
        }
    });
    rx
}

fn tick_period(hz: u32) -> Duration {
    Duration::from_millis(u64::from(1_000 / hz.max(1)))
}
