//! `arena_client`
//!
//! Client-side systems:
//! - Entity store holding the last authoritative snapshot
//! - Input sampling and intent generation
//! - Rendering abstraction wiring
//! - Dual-cadence session loop and connection lifecycle

pub mod input;
pub mod render;
pub mod session;
pub mod world;

pub use session::{ClientSession, SessionHandle};
pub use world::World;
