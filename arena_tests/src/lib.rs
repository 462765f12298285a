//! Test support for the arena client.
//!
//! `StubServer` is a scripted frame feeder: it speaks the wire protocol but
//! simulates nothing. Tests decide exactly which frames to send and observe
//! what the client does with them, so there is no movement integration and
//! no randomness here.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use anyhow::Context;
use arena_client::render::RenderSink;
use arena_shared::{
    config::{PLAYER_SIZE, WORLD_HEIGHT, WORLD_WIDTH},
    entity::Entity,
    net::{FrameConn, FrameListener},
    protocol::{ClientMsg, WirePlayer},
};
use serde_json::json;
use tokio::sync::mpsc;
use tracing::debug;

/// A scripted stand-in for the authoritative server.
pub struct StubServer {
    listener: FrameListener,
}

impl StubServer {
    /// Binds to an ephemeral local port; returns the address to dial.
    pub async fn bind() -> anyhow::Result<(Self, String)> {
        let bind = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0);
        let listener = FrameListener::bind(bind).await?;
        let addr = listener.local_addr()?.to_string();
        Ok((Self { listener }, addr))
    }

    /// Accepts one client connection.
    pub async fn accept(&self) -> anyhow::Result<StubPeer> {
        let (conn, addr) = self.listener.accept().await?;
        debug!(%addr, "stub accepted client");
        Ok(StubPeer { conn })
    }
}

/// One accepted client connection, driven frame by frame.
pub struct StubPeer {
    conn: FrameConn,
}

impl StubPeer {
    /// Sends raw frame text, valid JSON or not.
    pub async fn send_text(&mut self, text: &str) -> anyhow::Result<()> {
        self.conn.send_text(text).await
    }

    pub async fn send_welcome(&mut self, id: &str, players: &[WirePlayer]) -> anyhow::Result<()> {
        self.conn.send_text(&welcome_frame(id, players)).await
    }

    pub async fn send_state(&mut self, players: &[WirePlayer]) -> anyhow::Result<()> {
        self.conn.send_text(&state_frame(players)).await
    }

    /// Receives and decodes the next client message.
    pub async fn recv_msg(&mut self) -> anyhow::Result<ClientMsg> {
        let text = self.conn.recv().await?;
        serde_json::from_str(&text).with_context(|| format!("client frame: {text}"))
    }

    /// Receives the next `input` message, skipping the opening `hello`.
    pub async fn recv_intent(&mut self) -> anyhow::Result<ClientMsg> {
        loop {
            match self.recv_msg().await? {
                ClientMsg::Hello => continue,
                msg @ ClientMsg::Input { .. } => return Ok(msg),
            }
        }
    }
}

/// Builds a `welcome` frame.
pub fn welcome_frame(id: &str, players: &[WirePlayer]) -> String {
    json!({
        "type": "welcome",
        "id": id,
        "world": {"type": "state", "players": players},
    })
    .to_string()
}

/// Builds a `state` frame.
pub fn state_frame(players: &[WirePlayer]) -> String {
    json!({"type": "state", "players": players}).to_string()
}

/// A bare wire player at an exact position.
pub fn player(id: &str, x: f32, y: f32) -> WirePlayer {
    WirePlayer {
        id: id.to_string(),
        x,
        y,
        label: None,
        color: None,
    }
}

/// A decorated wire player parked inside the world bounds, the way the real
/// server spawns one.
pub fn spawn_player(id: &str, x: f32, y: f32) -> WirePlayer {
    WirePlayer {
        id: id.to_string(),
        x: x.min(WORLD_WIDTH - PLAYER_SIZE),
        y: y.min(WORLD_HEIGHT - PLAYER_SIZE),
        label: Some(format!("P{}", id.to_ascii_uppercase())),
        color: Some("#2563eb".to_string()),
    }
}

/// One observed render tick.
#[derive(Debug, Clone)]
pub struct RenderFrame {
    pub entities: Vec<Entity>,
    pub local_id: Option<String>,
}

/// A render sink that forwards every frame to a channel, letting tests
/// observe exactly what the render tick saw.
pub struct CaptureRender {
    tx: mpsc::UnboundedSender<RenderFrame>,
}

impl CaptureRender {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<RenderFrame>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl RenderSink for CaptureRender {
    fn draw(&mut self, entities: &[Entity], local_id: Option<&str>) {
        let _ = self.tx.send(RenderFrame {
            entities: entities.to_vec(),
            local_id: local_id.map(str::to_string),
        });
    }
}
