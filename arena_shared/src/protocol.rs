//! Wire protocol.
//!
//! Goals:
//! - Keep the message vocabulary explicit and versionable.
//! - Treat everything inbound as untrusted: a frame either classifies as a
//!   known message or it is `Invalid`, never an error and never a partial
//!   application.
//! - Keep the wire-to-domain mapping a pure transform.
//!
//! Inbound frames (server -> client), JSON text, one message per frame:
//!
//! ```text
//! {"type":"welcome","id":"<id>","world":{"type":"state","players":[...]}}
//! {"type":"state","players":[{"id":"...","x":0,"y":0,"label":"...","color":"..."}]}
//! ```
//!
//! Unknown `type` values (the server also emits `join`/`leave` notices) are
//! classified `Invalid` and dropped by the caller; they do not affect render
//! state.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entity::{Entity, KIND_PLAYER};
use crate::math::Vec2;

/// Flat player representation as it appears on the wire.
///
/// Position components are inlined, not nested; client code must never
/// assume a nested position on wire data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WirePlayer {
    pub id: String,
    pub x: f32,
    pub y: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Body of a `state` message: the complete authoritative snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct StateMsg {
    pub players: Vec<WirePlayer>,
}

/// Body of a `welcome` message, sent once per connection. `id` designates
/// which entity in `world` this client controls.
#[derive(Debug, Clone, PartialEq)]
pub struct WelcomeMsg {
    pub id: String,
    pub world: StateMsg,
}

/// Client -> server messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientMsg {
    /// Optional socket-opening message; the server answers with `welcome`.
    Hello,
    /// Currently held directional actions, sent every input tick.
    Input {
        id: String,
        up: bool,
        down: bool,
        left: bool,
        right: bool,
    },
}

/// Classification of one inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Welcome(WelcomeMsg),
    State(StateMsg),
    /// Unparseable JSON, unknown `type`, or a malformed known message.
    Invalid,
}

/// Decodes one frame of JSON text into a tagged message.
///
/// Never fails: callers match exhaustively and drop `Invalid`.
pub fn decode_frame(raw: &str) -> Inbound {
    let value: Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(_) => return Inbound::Invalid,
    };
    if let Some(msg) = parse_welcome(&value) {
        return Inbound::Welcome(msg);
    }
    if let Some(msg) = parse_state(&value) {
        return Inbound::State(msg);
    }
    Inbound::Invalid
}

/// True iff `value` is a well-formed `state` message: `type == "state"` and
/// `players` is an array where every element carries a text `id` and numeric
/// `x`/`y`.
pub fn is_state_message(value: &Value) -> bool {
    parse_state(value).is_some()
}

/// True iff `value` is a well-formed `welcome` message: `type == "welcome"`,
/// `id` is text, and `world` is itself a well-formed `state` message.
pub fn is_welcome_message(value: &Value) -> bool {
    parse_welcome(value).is_some()
}

/// Maps wire players to entities, preserving order.
///
/// `kind` is fixed to [`KIND_PLAYER`]; `color`/`label` pass through only
/// when present on the source. Defaulting is a renderer concern.
pub fn map_wire_to_entities(players: &[WirePlayer]) -> Vec<Entity> {
    players
        .iter()
        .map(|p| Entity {
            id: p.id.clone(),
            kind: KIND_PLAYER.to_string(),
            position: Vec2::new(p.x, p.y),
            color: p.color.clone(),
            label: p.label.clone(),
        })
        .collect()
}

fn parse_state(value: &Value) -> Option<StateMsg> {
    if value.get("type")?.as_str()? != "state" {
        return None;
    }
    let raw_players = value.get("players")?.as_array()?;
    let mut players = Vec::with_capacity(raw_players.len());
    for p in raw_players {
        players.push(parse_wire_player(p)?);
    }
    Some(StateMsg { players })
}

fn parse_welcome(value: &Value) -> Option<WelcomeMsg> {
    if value.get("type")?.as_str()? != "welcome" {
        return None;
    }
    let id = value.get("id")?.as_str()?.to_string();
    let world = parse_state(value.get("world")?)?;
    Some(WelcomeMsg { id, world })
}

// Strict on `id`/`x`/`y`; a non-string decoration field reads as absent.
fn parse_wire_player(value: &Value) -> Option<WirePlayer> {
    Some(WirePlayer {
        id: value.get("id")?.as_str()?.to_string(),
        x: value.get("x")?.as_f64()? as f32,
        y: value.get("y")?.as_f64()? as f32,
        label: value.get("label").and_then(Value::as_str).map(str::to_string),
        color: value.get("color").and_then(Value::as_str).map(str::to_string),
    })
}
