//! Entity model.
//!
//! The client's world is a flat set of uniquely identified entities with a
//! position and optional rendering hints. Entities are replaced wholesale by
//! server snapshots; nothing mutates them field-by-field outside the store.

use serde::{Deserialize, Serialize};

use crate::math::Vec2;

/// The only `kind` the render collaborator treats specially.
pub const KIND_PLAYER: &str = "player";

/// A uniquely identified object in the world.
///
/// `id` is the stable join key across snapshots. `kind` discriminates
/// renderable behavior. `color` and `label` are pass-through hints; defaults
/// are a renderer concern, not applied here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    pub kind: String,
    pub position: Vec2,
    pub color: Option<String>,
    pub label: Option<String>,
}
