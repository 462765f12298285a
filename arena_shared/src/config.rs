//! Configuration and world constants.
//!
//! Loads client configuration from JSON strings/files (file IO left to app).
//! The geometry constants mirror the authoritative server's world and are
//! consumed by the render collaborator.

use serde::{Deserialize, Serialize};

/// Tile edge length in pixels.
pub const TILE_SIZE: u32 = 48;
/// Grid width in tiles.
pub const MAP_COLS: u32 = 20;
/// Grid height in tiles.
pub const MAP_ROWS: u32 = 12;
/// World width in pixels.
pub const WORLD_WIDTH: f32 = (MAP_COLS * TILE_SIZE) as f32;
/// World height in pixels.
pub const WORLD_HEIGHT: f32 = (MAP_ROWS * TILE_SIZE) as f32;
/// Rendered entity diameter in pixels.
pub const PLAYER_SIZE: f32 = 30.0;
/// Default entity speed in px/s.
pub const DEFAULT_PLAYER_SPEED: f32 = 220.0;

/// Client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Server address, e.g. `127.0.0.1:40000`.
    pub server_addr: String,
    /// Fixed intent sampling rate.
    #[serde(default = "default_input_hz")]
    pub input_hz: u32,
    /// Nominal frame pacing for the render tick.
    #[serde(default = "default_render_hz")]
    pub render_hz: u32,
}

fn default_input_hz() -> u32 {
    20
}

fn default_render_hz() -> u32 {
    60
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_addr: "127.0.0.1:40000".to_string(),
            input_hz: default_input_hz(),
            render_hz: default_render_hz(),
        }
    }
}

impl ClientConfig {
    /// Parses config from JSON.
    pub fn from_json_str(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }
}
